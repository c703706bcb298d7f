//! Smokeprobe CLI Library
//!
//! Command-line front end for the login smoke scenario.
//!
//! ```bash
//! smokeprobe run                                  # BASE_URL, TEST_USER, TEST_PASS from env
//! smokeprobe run --base-url http://staging:8080 --expect-title Archtool
//! smokeprobe config --json                        # resolved settings, password redacted
//! ```

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
pub mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, EnvArgs, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{FailureReport, Reporter};
