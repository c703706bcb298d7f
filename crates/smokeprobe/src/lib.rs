//! Smokeprobe: login smoke testing through a real browser session
//!
//! Opens the login route of a web application, signs in with configured
//! credentials and checks that a post-login landmark renders. Element lookup
//! tolerates UI drift: every control is described by an ordered list of
//! fallback selectors, each polled until it becomes visible or its timeout
//! runs out. When lookup fails, the page is dumped to an artifact directory.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────┐   ┌─────────────┐
//! │ SmokeScenario│──►│  LoginFlow   │──►│ Locator  │──►│  Session    │
//! │ (state mach.)│   │ (form driver)│   │ (polling)│   │ (CDP / mock)│
//! └──────────────┘   └──────────────┘   └────┬─────┘   └─────────────┘
//!                                            │ on failure
//!                                            ▼
//!                                   ┌──────────────────┐
//!                                   │DiagnosticCapture │
//!                                   │ fail_<ts>.png    │
//!                                   │ fail_<ts>.html   │
//!                                   └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use smokeprobe::{MockNode, MockPage, MockSession, SmokeConfig, SmokeScenario, Timeouts};
//!
//! let session = MockSession::new()
//!     .with_page(
//!         "http://localhost:5173/login",
//!         MockPage::new("Login")
//!             .node(MockNode::new("input").attr("data-testid", "login-username"))
//!             .node(MockNode::new("input").attr("data-testid", "login-password"))
//!             .node(
//!                 MockNode::new("button")
//!                     .attr("data-testid", "login-submit")
//!                     .navigates_to("http://localhost:5173/"),
//!             ),
//!     )
//!     .with_page(
//!         "http://localhost:5173/",
//!         MockPage::new("Home").node(MockNode::new("h1").attr("data-testid", "app-title").text("Archtool")),
//!     );
//!
//! let dir = std::env::temp_dir().join("smokeprobe-doc");
//! let config = SmokeConfig::new()
//!     .with_artifacts_dir(dir)
//!     .with_timeouts(Timeouts::instant());
//! let report = SmokeScenario::new(config).run(&session)?;
//! assert_eq!(report.landmark_text, "Archtool");
//! # Ok::<(), smokeprobe::SmokeError>(())
//! ```

#![warn(missing_docs)]

mod browser;
mod capture;
mod config;
mod fixture;
mod locator;
mod login;
mod result;
mod scenario;
mod selector;
mod session;
mod wait;

pub use browser::BrowserConfig;
#[cfg(feature = "browser")]
pub use browser::{CdpElement, CdpProvider, CdpSession};
pub use capture::{ArtifactSet, DiagnosticCapture, DEFAULT_ARTIFACTS_DIR};
pub use config::{
    Credentials, SmokeConfig, Timeouts, DEFAULT_BASE_URL, DEFAULT_PASS, DEFAULT_USER,
};
pub use fixture::{SessionFixture, SessionProvider};
pub use locator::Locator;
pub use login::{LoginFlow, LoginForm};
pub use result::{SmokeError, SmokeResult};
pub use scenario::{looks_not_found, ScenarioReport, ScenarioState, SmokeScenario};
pub use selector::{Selector, SelectorList, DEFAULT_SIGN_IN_TEXT};
pub use session::{Element, MockElement, MockNode, MockPage, MockSession, Session, PNG_MAGIC};
pub use wait::{
    poll_until, Probe, WaitOptions, Waited, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS,
};
