//! Command definitions and dispatch for the `kumo` binary.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use kumo::config::{EngineConfig, MapConfiguration};
use kumo::gherkin::Document;
use kumo::reporting::{self, json};
use kumo::{Engine, NodeResult, PlanNode, RegistryBuilder, RunError};
use tracing::info;

use crate::config::LogLevel;
use crate::discovery::{FeatureSource, read_features};
use crate::error::CliError;

/// Parse, compile and run Gherkin documents.
#[derive(Parser, Debug)]
#[command(name = "kumo", version, about)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse and compile documents, reporting every diagnostic.
    Check(EngineArgs),
    /// Write the compiled plan as JSON.
    Plan(OutputArgs),
    /// Execute the plan and write the result tree as JSON.
    Run(OutputArgs),
}

/// Documents and engine options shared by every command.
#[derive(Args, Debug)]
pub struct EngineArgs {
    /// Feature files or directories searched recursively for `*.feature`.
    #[arg(required = true)]
    pub paths: Vec<Utf8PathBuf>,
    /// Language of documents without a `# language:` directive.
    #[arg(long)]
    pub language: Option<String>,
    /// Tag expression selecting scenarios, such as `@smoke and not @slow`.
    #[arg(long)]
    pub tag_filter: Option<String>,
    /// Keep scenarios rejected by the tag filter as skipped nodes.
    #[arg(long)]
    pub include_filtered: bool,
}

/// Engine options plus an output destination.
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Documents and engine options.
    #[command(flatten)]
    pub engine: EngineArgs,
    /// File receiving the JSON output instead of stdout.
    #[arg(long, short)]
    pub output: Option<Utf8PathBuf>,
}

impl EngineArgs {
    /// Layer the flags over `environment` and read the engine settings.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::EngineConfig`] when a setting is malformed.
    pub fn engine_config(&self, environment: &MapConfiguration) -> Result<EngineConfig, CliError> {
        let mut config = environment.clone();
        if let Some(language) = &self.language {
            config.set("kumo.language", language);
        }
        if let Some(filter) = &self.tag_filter {
            config.set("kumo.tag-filter", filter);
        }
        if self.include_filtered {
            config.set("kumo.include-filtered", "true");
        }
        Ok(EngineConfig::from_configuration(&config)?)
    }
}

impl Cli {
    /// Execute the command with `builder`'s definitions, writing to `stdout`
    /// unless an output file was requested.
    ///
    /// Returns whether the command succeeded: no diagnostics for `check`,
    /// a `PASSED` plan for `run`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] when documents cannot be read, parsed or
    /// compiled (outside `check`) or when output cannot be written.
    pub fn execute(
        &self,
        environment: &MapConfiguration,
        builder: RegistryBuilder,
        stdout: &mut dyn Write,
    ) -> Result<bool, CliError> {
        match &self.command {
            Command::Check(args) => {
                let engine = Engine::new(args.engine_config(environment)?, builder)?;
                check(&engine, &read_features(&args.paths)?, stdout)
            }
            Command::Plan(args) => {
                let engine = Engine::new(args.engine.engine_config(environment)?, builder)?;
                let plan = compile(&engine, &read_features(&args.engine.paths)?)?;
                write_output(args.output.as_deref(), stdout, |writer| {
                    serde_json::to_writer_pretty(writer, &plan)
                })?;
                Ok(true)
            }
            Command::Run(args) => {
                let engine = Engine::new(args.engine.engine_config(environment)?, builder)?;
                let plan = compile(&engine, &read_features(&args.engine.paths)?)?;
                let table = engine.run(&plan)?;
                write_output(args.output.as_deref(), stdout, |writer| {
                    json::write_pretty(writer, &plan, &table)
                })?;
                let result = table.result(plan.id);
                let counts = reporting::summary(&plan, &table);
                info!(
                    result = result.map_or("NONE", NodeResult::as_str),
                    test_cases = counts.total(),
                    passed = counts.get(NodeResult::Passed),
                    failed = counts.get(NodeResult::Failed),
                    errors = counts.get(NodeResult::Error),
                    "run finished"
                );
                Ok(result == Some(NodeResult::Passed))
            }
        }
    }
}

fn compile(engine: &Engine, sources: &[FeatureSource]) -> Result<PlanNode, CliError> {
    Ok(engine.compile_sources(
        sources
            .iter()
            .map(|source| (source.path.as_str(), source.text.as_str())),
    )?)
}

fn check(
    engine: &Engine,
    sources: &[FeatureSource],
    stdout: &mut dyn Write,
) -> Result<bool, CliError> {
    let io_error = |source: io::Error| CliError::Io {
        path: "stdout".to_string(),
        source,
    };
    let mut documents: Vec<(&str, Document)> = Vec::new();
    let mut diagnostics = 0_usize;
    for source in sources {
        match engine.parse(source.path.as_str(), &source.text) {
            Ok(document) => documents.push((source.path.as_str(), document)),
            Err(RunError::Parse { path, errors }) => {
                for error in errors.iter() {
                    writeln!(stdout, "{path}: {error}").map_err(io_error)?;
                }
                diagnostics += errors.len();
            }
            Err(error) => return Err(error.into()),
        }
    }
    if diagnostics == 0 {
        match engine.compile(documents.iter().map(|(path, document)| (*path, document))) {
            Ok(plan) => {
                let test_cases = plan.descendants().filter(|node| node.is_test_case()).count();
                writeln!(
                    stdout,
                    "{} documents, {test_cases} test cases, no problems found",
                    sources.len()
                )
                .map_err(io_error)?;
            }
            Err(error @ (RunError::Compile(_) | RunError::Property(_))) => {
                writeln!(stdout, "{error}").map_err(io_error)?;
                diagnostics += 1;
            }
            Err(error) => return Err(error.into()),
        }
    }
    Ok(diagnostics == 0)
}

fn write_output(
    path: Option<&Utf8Path>,
    stdout: &mut dyn Write,
    write: impl FnOnce(&mut dyn Write) -> serde_json::Result<()>,
) -> Result<(), CliError> {
    let io_error = |path: &str| {
        let path = path.to_string();
        move |source: io::Error| CliError::Io { path, source }
    };
    match path {
        Some(path) => {
            let file = File::create(path).map_err(io_error(path.as_str()))?;
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            writeln!(writer).map_err(io_error(path.as_str()))?;
            writer.flush().map_err(io_error(path.as_str()))?;
            info!(path = %path, "output written");
        }
        None => {
            write(stdout)?;
            writeln!(stdout).map_err(io_error("stdout"))?;
            stdout.flush().map_err(io_error("stdout"))?;
        }
    }
    Ok(())
}

/// Standard output for [`Cli::execute`].
#[must_use]
pub fn stdout() -> impl Write {
    io::stdout().lock()
}
