//! Command line front end for the `kumo` engine.
//!
//! The `kumo` binary checks, compiles and runs Gherkin documents:
//!
//! - `kumo check <paths>` parses and compiles, printing every diagnostic;
//! - `kumo plan <paths> [--output FILE]` writes the compiled plan as JSON;
//! - `kumo run <paths> [--output FILE]` executes the plan with the step
//!   definitions linked into the binary and writes the result tree.
//!
//! Projects link their own definitions by building a binary around
//! [`cli::Cli::execute`] with a [`kumo::RegistryBuilder`] of their choice.
//!
//! # Configuration
//!
//! - `KUMO_LOG_LEVEL`: log verbosity (trace, debug, info, warn, error)
//! - `KUMO_*`: engine settings, such as `KUMO_TAG_FILTER` or
//!   `KUMO_PROPERTY__HOST`; command line flags win over them.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
