//! Subcommand implementations

use std::time::Duration;

use smokeprobe::{
    ScenarioReport, SessionFixture, SessionProvider, SmokeConfig, SmokeError, SmokeScenario,
};

use crate::commands::{ConfigArgs, EnvArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{FailureReport, Reporter};

fn reporter(config: &CliConfig) -> Reporter {
    Reporter::new(config.color.should_color(), config.verbosity.is_quiet())
}

fn base_config(env: &EnvArgs) -> CliResult<SmokeConfig> {
    Ok(SmokeConfig::from_lookup(|key| env.lookup(key))?)
}

/// Resolve the smoke configuration for `run`
pub fn smoke_config(args: &RunArgs) -> CliResult<SmokeConfig> {
    let mut config = base_config(&args.env)?
        .with_sign_in_text(args.sign_in_text.clone())
        .with_headless(!args.headed);
    if args.timeout == 0 {
        return Err(CliError::config("--timeout must be greater than zero"));
    }
    config.timeouts.locate = Duration::from_millis(args.timeout);
    config.timeouts.landmark = Duration::from_millis(args.timeout);
    if let Some(title) = &args.expect_title {
        config = config.with_expect_title(title.clone());
    }
    Ok(config)
}

/// Run the scenario on a session from `provider` and report the outcome
pub fn execute<P: SessionProvider>(
    provider: P,
    smoke: &SmokeConfig,
    reporter: &Reporter,
    json: bool,
) -> CliResult<ScenarioReport> {
    let scenario = SmokeScenario::new(smoke.clone());
    let mut fixture = SessionFixture::new(provider, smoke.capture());
    reporter.info(&format!("smoke testing {}", smoke.login_url()));

    match fixture.run(|session| scenario.run(session)) {
        Ok(report) => {
            reporter.verified(&report);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(report)
        }
        Err(SmokeError::FlowFailure { state, source }) => {
            let message = format!("login smoke failed while {state}: {source}");
            reporter.failure(&message);
            if let Some(set) = fixture.last_artifacts() {
                reporter.artifacts(set);
            }
            if json {
                let body = FailureReport {
                    status: "failed",
                    state: state.to_string(),
                    error: source.to_string(),
                    artifacts: fixture.last_artifacts(),
                };
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            Err(CliError::SmokeFailed { state })
        }
        Err(other) => Err(other.into()),
    }
}

/// `smokeprobe run`
pub fn run_smoke(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let smoke = smoke_config(args)?;
    let reporter = reporter(config);

    #[cfg(feature = "browser")]
    {
        let provider = smokeprobe::CdpProvider::new(smokeprobe::BrowserConfig::from_smoke(&smoke));
        execute(provider, &smoke, &reporter, args.json).map(|_| ())
    }

    #[cfg(not(feature = "browser"))]
    {
        let _ = (&smoke, &reporter);
        Err(CliError::config(
            "smokeprobe was built without the `browser` feature",
        ))
    }
}

/// `smokeprobe config`
pub fn show_config(args: &ConfigArgs) -> CliResult<()> {
    let smoke = base_config(&args.env)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&smoke)?);
        return Ok(());
    }

    println!("Base URL:       {}", smoke.base_url);
    println!("Login URL:      {}", smoke.login_url());
    println!(
        "Browser:        {}",
        smoke.remote_url.as_deref().unwrap_or("local chromium")
    );
    println!("User:           {}", smoke.credentials.username);
    println!("Password:       ***");
    println!("Artifacts:      {}", smoke.artifacts_dir.display());
    println!(
        "Context file:   {}",
        if smoke.base_url_supplied { "yes" } else { "no" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use smokeprobe::{MockNode, MockPage, MockSession, ScenarioState, SmokeResult, Timeouts};

    struct OneApp {
        login: MockPage,
    }

    impl SessionProvider for OneApp {
        type Session = MockSession;

        fn acquire(&mut self) -> SmokeResult<MockSession> {
            Ok(MockSession::new()
                .with_page("http://app/login", self.login.clone())
                .with_page(
                    "http://app/home",
                    MockPage::new("Home").node(
                        MockNode::new("div")
                            .attr("class", "app-title")
                            .text("Archtool"),
                    ),
                ))
        }

        fn release(&mut self, _session: MockSession) -> SmokeResult<()> {
            Ok(())
        }
    }

    fn full_login() -> MockPage {
        MockPage::new("Login")
            .node(MockNode::new("input").attr("name", "username"))
            .node(MockNode::new("input").attr("name", "password"))
            .node(
                MockNode::new("button")
                    .attr("type", "submit")
                    .navigates_to("http://app/home"),
            )
    }

    fn smoke(dir: &std::path::Path) -> SmokeConfig {
        SmokeConfig::new()
            .with_base_url("http://app")
            .unwrap()
            .with_artifacts_dir(dir)
            .with_timeouts(Timeouts::instant())
    }

    fn quiet() -> Reporter {
        Reporter::new(false, true)
    }

    #[test]
    fn test_execute_verified() {
        let dir = tempfile::tempdir().unwrap();
        let report = execute(
            OneApp {
                login: full_login(),
            },
            &smoke(dir.path()),
            &quiet(),
            false,
        )
        .unwrap();
        assert_eq!(report.final_state(), ScenarioState::Verified);
    }

    #[test]
    fn test_execute_failure_maps_to_smoke_failed() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(
            OneApp {
                login: MockPage::new("Login"),
            },
            &smoke(dir.path()),
            &quiet(),
            true,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CliError::SmokeFailed {
                state: ScenarioState::Authenticating
            }
        ));
        assert!(std::fs::read_dir(dir.path()).unwrap().count() >= 2);
    }

    #[test]
    fn test_smoke_config_applies_flags() {
        let args = RunArgs {
            env: EnvArgs {
                base_url: Some("http://app/".to_string()),
                ..EnvArgs::default()
            },
            expect_title: Some("Archtool".to_string()),
            sign_in_text: "Sign in".to_string(),
            timeout: 1500,
            headed: true,
            json: false,
        };
        let config = smoke_config(&args).unwrap();
        assert_eq!(config.base_url, "http://app");
        assert_eq!(config.sign_in_text, "Sign in");
        assert_eq!(config.timeouts.locate, Duration::from_millis(1500));
        assert_eq!(config.timeouts.landmark, Duration::from_millis(1500));
        assert!(!config.headless);
        assert_eq!(config.expect_title.as_deref(), Some("Archtool"));
    }

    #[test]
    fn test_smoke_config_rejects_bad_url() {
        let args = RunArgs {
            env: EnvArgs {
                base_url: Some("ftp://app".to_string()),
                ..EnvArgs::default()
            },
            expect_title: None,
            sign_in_text: "Войти".to_string(),
            timeout: 10_000,
            headed: false,
            json: false,
        };
        assert!(matches!(smoke_config(&args), Err(CliError::Config { .. })));
    }
}
