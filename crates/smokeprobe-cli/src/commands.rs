//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use smokeprobe::DEFAULT_SIGN_IN_TEXT;
use std::path::PathBuf;

/// Smokeprobe: login smoke test for web applications
#[derive(Parser, Debug)]
#[command(name = "smokeprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the login smoke scenario
    Run(RunArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),
}

/// Settings shared by every subcommand, each with an environment fallback
#[derive(Args, Debug, Clone, Default)]
pub struct EnvArgs {
    /// Application root URL
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Chrome DevTools endpoint of a remote browser, `ws://...` or
    /// `http://host:9222` (launch locally when unset). WebDriver hubs such
    /// as `/wd/hub` are not supported
    #[arg(long, env = "SELENIUM_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Login user
    #[arg(long, env = "TEST_USER")]
    pub user: Option<String>,

    /// Login password
    #[arg(long, env = "TEST_PASS", hide_env_values = true)]
    pub password: Option<String>,

    /// Directory for failure artifacts
    #[arg(long, env = "ARTIFACTS_DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Chromium executable
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<String>,
}

impl EnvArgs {
    /// Value for a configuration variable, as given on the command line or in the environment
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "BASE_URL" => self.base_url.clone(),
            "SELENIUM_REMOTE_URL" => self.remote_url.clone(),
            "TEST_USER" => self.user.clone(),
            "TEST_PASS" => self.password.clone(),
            "ARTIFACTS_DIR" => self
                .artifacts_dir
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            "CHROME_PATH" => self.chrome_path.clone(),
            _ => None,
        }
    }
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Connection and credential settings
    #[command(flatten)]
    pub env: EnvArgs,

    /// Text the post-login landmark must contain
    #[arg(long)]
    pub expect_title: Option<String>,

    /// Label of the sign-in link and button
    #[arg(long, default_value = DEFAULT_SIGN_IN_TEXT)]
    pub sign_in_text: String,

    /// Per-candidate locate timeout in milliseconds
    #[arg(long, default_value = "10000")]
    pub timeout: u64,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Connection and credential settings
    #[command(flatten)]
    pub env: EnvArgs,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
