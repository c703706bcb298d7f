//! Login smoke scenario.
//!
//! ```text
//! Start ──► OnLoginPage ───┐
//!   │                      ├──► Authenticating ──► Verified
//!   └─────► OnLandingPage ─┘
//!
//! any state ──► Failed
//! ```
//!
//! The login route is opened first. If the server answers with a not-found
//! page the scenario falls back to the application root, exactly once. From
//! either page a sign-in entry is clicked when one shows up, the login form is
//! submitted and the post-login landmark must render.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use crate::config::SmokeConfig;
use crate::locator::Locator;
use crate::login::{LoginFlow, LoginForm};
use crate::result::{SmokeError, SmokeResult};
use crate::selector::SelectorList;
use crate::session::{Element, Session};

/// Scenario states, in visiting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    /// Nothing done yet
    Start,
    /// The login route rendered
    OnLoginPage,
    /// The login route was not found; sitting on the application root
    OnLandingPage,
    /// Filling and submitting the login form
    Authenticating,
    /// The post-login landmark rendered
    Verified,
    /// Terminal failure
    Failed,
}

impl ScenarioState {
    /// Whether the scenario stops in this state
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::Failed)
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "starting",
            Self::OnLoginPage => "on the login page",
            Self::OnLandingPage => "on the landing page",
            Self::Authenticating => "authenticating",
            Self::Verified => "verified",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a verified run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Unique id of this run, also attached to its tracing span
    pub run_id: Uuid,
    /// States visited, ending in [`ScenarioState::Verified`]
    pub states: Vec<ScenarioState>,
    /// Trimmed text of the post-login landmark
    pub landmark_text: String,
    /// Optional steps that were skipped, with the reason
    pub skipped: Vec<String>,
    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u64,
}

impl ScenarioReport {
    /// Last state visited
    #[must_use]
    pub fn final_state(&self) -> ScenarioState {
        self.states.last().copied().unwrap_or(ScenarioState::Start)
    }

    /// Whether the run fell back from the login route to the root
    #[must_use]
    pub fn used_landing_page(&self) -> bool {
        self.states.contains(&ScenarioState::OnLandingPage)
    }
}

/// Whether the current page is a not-found page
pub fn looks_not_found<S: Session>(session: &S) -> SmokeResult<bool> {
    let title = session.title()?.to_lowercase();
    if title.contains("404") || title.contains("not found") {
        return Ok(true);
    }
    Ok(session.page_source()?.to_lowercase().contains("not found"))
}

struct Trail {
    states: Vec<ScenarioState>,
    skipped: Vec<String>,
}

impl Trail {
    fn new() -> Self {
        Self {
            states: vec![ScenarioState::Start],
            skipped: Vec::new(),
        }
    }

    fn current(&self) -> ScenarioState {
        self.states.last().copied().unwrap_or(ScenarioState::Start)
    }

    fn enter(&mut self, next: ScenarioState) {
        tracing::info!(from = %self.current(), to = %next, "scenario transition");
        self.states.push(next);
    }
}

/// Drives one login smoke run against a session
#[derive(Debug, Clone)]
pub struct SmokeScenario {
    config: SmokeConfig,
}

impl SmokeScenario {
    /// Scenario using `config`
    #[must_use]
    pub const fn new(config: SmokeConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &SmokeConfig {
        &self.config
    }

    /// Run the scenario to a terminal state.
    ///
    /// # Errors
    ///
    /// Any failure is returned as [`SmokeError::FlowFailure`] carrying the
    /// state the scenario was in. Locate failures have already written an
    /// artifact set by the time this returns.
    pub fn run<S: Session>(&self, session: &S) -> SmokeResult<ScenarioReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("smoke", %run_id, base_url = %self.config.base_url);
        let _guard = span.enter();

        let start = Instant::now();
        let mut trail = Trail::new();

        match self.drive(session, &mut trail) {
            Ok(landmark_text) => {
                trail.enter(ScenarioState::Verified);
                let report = ScenarioReport {
                    run_id,
                    states: trail.states,
                    landmark_text,
                    skipped: trail.skipped,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                };
                tracing::info!(elapsed_ms = report.elapsed_ms, "smoke run verified");
                Ok(report)
            }
            Err(source) => {
                let state = trail.current();
                trail.enter(ScenarioState::Failed);
                tracing::error!(%state, error = %source, "smoke run failed");
                Err(SmokeError::FlowFailure {
                    state,
                    source: Box::new(source),
                })
            }
        }
    }

    fn drive<S: Session>(&self, session: &S, trail: &mut Trail) -> SmokeResult<String> {
        let timeouts = &self.config.timeouts;
        let locator = Locator::new(session)
            .with_capture(self.config.capture())
            .with_poll_interval(timeouts.poll_interval);

        session.navigate(&self.config.login_url())?;
        settle(timeouts.settle_after_navigation);

        if looks_not_found(session)? {
            tracing::info!(url = %self.config.login_url(), "login route not found, opening root");
            session.navigate(self.config.root_url())?;
            settle(timeouts.settle_after_navigation);
            trail.enter(ScenarioState::OnLandingPage);
        } else {
            trail.enter(ScenarioState::OnLoginPage);
        }

        self.follow_sign_in_entry(&locator, trail)?;

        trail.enter(ScenarioState::Authenticating);
        let credentials = &self.config.credentials;
        LoginFlow::new(LoginForm::new(&self.config.sign_in_text))
            .with_timeout(timeouts.locate)
            .login_with(&locator, &credentials.username, &credentials.password)?;

        let landmark = locator.locate(&SelectorList::app_landmark(), timeouts.landmark)?;
        let text = landmark.text()?;
        self.check_landmark(&text)?;
        Ok(text.trim().to_string())
    }

    /// Click the sign-in entry if one shows up. Only a locate timeout is
    /// tolerated here.
    fn follow_sign_in_entry<S: Session>(
        &self,
        locator: &Locator<'_, S>,
        trail: &mut Trail,
    ) -> SmokeResult<()> {
        let list = SelectorList::sign_in_entry(&self.config.sign_in_text);
        match locator.probe(&list, self.config.timeouts.sign_in_entry) {
            Ok(entry) => {
                entry.click()?;
                settle(self.config.timeouts.settle_after_click);
                tracing::info!("followed sign-in entry");
                Ok(())
            }
            Err(e) if e.is_locate_timeout() => {
                let skipped = SmokeError::OptionalStepFailure {
                    step: list.name().to_string(),
                    source: Box::new(e),
                };
                tracing::info!(reason = %skipped, "optional step skipped");
                trail.skipped.push(skipped.to_string());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn check_landmark(&self, text: &str) -> SmokeResult<()> {
        match &self.config.expect_title {
            Some(expected) if !text.contains(expected.as_str()) => {
                Err(SmokeError::AssertionFailed {
                    message: format!(
                        "landmark text {:?} does not contain {expected:?}",
                        text.trim()
                    ),
                })
            }
            Some(_) => Ok(()),
            None if text.trim().is_empty() => Err(SmokeError::AssertionFailed {
                message: "landmark is visible but has no text".to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn settle(pause: Duration) {
    if !pause.is_zero() {
        thread::sleep(pause);
    }
}
