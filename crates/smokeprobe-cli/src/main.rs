//! Smokeprobe CLI: login smoke test for web applications
//!
//! ## Usage
//!
//! ```bash
//! smokeprobe run                      # Run against BASE_URL (default http://localhost:5173)
//! smokeprobe run --json               # Print the run report as JSON
//! smokeprobe config                   # Show resolved configuration
//! ```

use clap::Parser;
use smokeprobe_cli::{
    logging::init_logging,
    runner::{run_smoke, show_config},
    Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !e.is_reported() {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_logging(&config);

    match cli.command {
        Commands::Run(args) => run_smoke(&config, &args),
        Commands::Config(args) => show_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
}
