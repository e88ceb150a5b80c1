//! The `kumo` binary.

use std::process::ExitCode;

use clap::Parser;
use eyre::{Context, Result};
use kumo::Registry;
use kumo::config::MapConfiguration;
use tracing::info;

use kumo_cli::cli::{self, Cli};
use kumo_cli::config::CliConfig;
use kumo_cli::logging::init_logging;

fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    let config = CliConfig::from_env()
        .wrap_err("invalid KUMO_LOG_LEVEL")?
        .apply_overrides(args.log_level);
    init_logging(&config);
    info!(version = env!("CARGO_PKG_VERSION"), "starting kumo");

    let mut builder = Registry::builder();
    builder.with_contributions();
    let succeeded = args
        .execute(&MapConfiguration::from_env(), builder, &mut cli::stdout())
        .wrap_err("kumo failed")?;
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
