//! Smoke run configuration.
//!
//! Read once, at scenario start, from environment-style variables:
//!
//! | Variable              | Default                 |
//! |-----------------------|-------------------------|
//! | `BASE_URL`            | `http://localhost:5173` |
//! | `SELENIUM_REMOTE_URL` | unset (local browser)   |
//! | `TEST_USER`           | `admin`                 |
//! | `TEST_PASS`           | `123`                   |
//! | `ARTIFACTS_DIR`       | `artifacts`             |
//! | `CHROME_PATH`         | unset (auto-detect)     |

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::capture::{DiagnosticCapture, DEFAULT_ARTIFACTS_DIR};
use crate::result::{SmokeError, SmokeResult};
use crate::selector::DEFAULT_SIGN_IN_TEXT;
use crate::wait::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};

/// Application URL used when `BASE_URL` is unset (Vite dev server)
pub const DEFAULT_BASE_URL: &str = "http://localhost:5173";

/// Login used when `TEST_USER` is unset
pub const DEFAULT_USER: &str = "admin";

/// Password used when `TEST_PASS` is unset
pub const DEFAULT_PASS: &str = "123";

/// Login credentials. The password never appears in `Debug` or serialized output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Serialize for Credentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Credentials", 2)?;
        state.serialize_field("username", &self.username)?;
        state.serialize_field("password", "***")?;
        state.end()
    }
}

fn as_millis<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(d.as_millis() as u64)
}

/// Timing knobs for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timeouts {
    /// Per-candidate timeout for login controls
    #[serde(rename = "locate_ms", serialize_with = "as_millis")]
    pub locate: Duration,
    /// Per-candidate timeout for the optional sign-in entry
    #[serde(rename = "sign_in_entry_ms", serialize_with = "as_millis")]
    pub sign_in_entry: Duration,
    /// Per-candidate timeout for the post-login landmark
    #[serde(rename = "landmark_ms", serialize_with = "as_millis")]
    pub landmark: Duration,
    /// Pause between polls
    #[serde(rename = "poll_interval_ms", serialize_with = "as_millis")]
    pub poll_interval: Duration,
    /// Pause after navigating before inspecting the page
    #[serde(rename = "settle_after_navigation_ms", serialize_with = "as_millis")]
    pub settle_after_navigation: Duration,
    /// Pause after clicking the sign-in entry
    #[serde(rename = "settle_after_click_ms", serialize_with = "as_millis")]
    pub settle_after_click: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            locate: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            sign_in_entry: Duration::from_secs(2),
            landmark: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            settle_after_navigation: Duration::from_millis(500),
            settle_after_click: Duration::from_millis(300),
        }
    }
}

impl Timeouts {
    /// Millisecond-scale timings for tests against in-memory pages
    #[must_use]
    pub fn instant() -> Self {
        Self {
            locate: Duration::from_millis(20),
            sign_in_entry: Duration::from_millis(5),
            landmark: Duration::from_millis(20),
            poll_interval: Duration::from_millis(2),
            settle_after_navigation: Duration::ZERO,
            settle_after_click: Duration::ZERO,
        }
    }
}

/// Configuration for one smoke run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmokeConfig {
    /// Application root, without trailing slash
    pub base_url: String,
    /// Whether the base URL was supplied rather than defaulted
    pub base_url_supplied: bool,
    /// Remote browser endpoint; local launch when `None`
    pub remote_url: Option<String>,
    /// Login credentials
    pub credentials: Credentials,
    /// Where failure artifacts go
    pub artifacts_dir: PathBuf,
    /// Local browser executable override
    pub chrome_path: Option<String>,
    /// Run the local browser without a window
    pub headless: bool,
    /// Label of the sign-in link/button
    pub sign_in_text: String,
    /// Text the landmark must contain; any non-empty text when `None`
    pub expect_title: Option<String>,
    /// Timing knobs
    pub timeouts: Timeouts,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            base_url_supplied: false,
            remote_url: None,
            credentials: Credentials::new(DEFAULT_USER, DEFAULT_PASS),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            chrome_path: None,
            headless: true,
            sign_in_text: DEFAULT_SIGN_IN_TEXT.to_string(),
            expect_title: None,
            timeouts: Timeouts::default(),
        }
    }
}

impl SmokeConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the process environment
    pub fn from_env() -> SmokeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> SmokeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(base) = lookup("BASE_URL") {
            config = config.with_base_url(&base)?;
        }
        config.remote_url = set("SELENIUM_REMOTE_URL");
        if let Some(user) = lookup("TEST_USER") {
            config.credentials.username = user;
        }
        if let Some(pass) = lookup("TEST_PASS") {
            config.credentials.password = pass;
        }
        if let Some(dir) = set("ARTIFACTS_DIR") {
            config.artifacts_dir = PathBuf::from(dir);
        }
        config.chrome_path = set("CHROME_PATH");
        Ok(config)
    }

    /// Set the application root; a trailing slash is stripped
    pub fn with_base_url(mut self, base_url: &str) -> SmokeResult<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(SmokeError::Config {
                message: format!("BASE_URL must be an http(s) URL, got {base_url:?}"),
            });
        }
        self.base_url = trimmed.to_string();
        self.base_url_supplied = true;
        Ok(self)
    }

    /// Connect to a remote browser's Chrome DevTools endpoint
    #[must_use]
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    /// Set credentials
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the artifact directory
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the sign-in label
    #[must_use]
    pub fn with_sign_in_text(mut self, text: impl Into<String>) -> Self {
        self.sign_in_text = text.into();
        self
    }

    /// Require the landmark text to contain `text`
    #[must_use]
    pub fn with_expect_title(mut self, text: impl Into<String>) -> Self {
        self.expect_title = Some(text.into());
        self
    }

    /// Set timings
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// `<base>/login`
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url)
    }

    /// Application root
    #[must_use]
    pub fn root_url(&self) -> &str {
        &self.base_url
    }

    /// Diagnostic capture writing into the artifact directory. The context
    /// file is only written when the base URL was supplied.
    #[must_use]
    pub fn capture(&self) -> DiagnosticCapture {
        DiagnosticCapture::new(&self.artifacts_dir).with_context(self.base_url_supplied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod from_lookup_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = SmokeConfig::from_lookup(lookup(&[])).unwrap();
            assert_eq!(config.base_url, "http://localhost:5173");
            assert!(!config.base_url_supplied);
            assert!(config.remote_url.is_none());
            assert_eq!(config.credentials, Credentials::new("admin", "123"));
            assert_eq!(config.artifacts_dir, PathBuf::from("artifacts"));
            assert_eq!(config.login_url(), "http://localhost:5173/login");
            assert!(!config.capture().includes_context());
        }

        #[test]
        fn test_trailing_slash_is_stripped() {
            let config =
                SmokeConfig::from_lookup(lookup(&[("BASE_URL", "https://arch.example.com/")]))
                    .unwrap();
            assert_eq!(config.root_url(), "https://arch.example.com");
            assert_eq!(config.login_url(), "https://arch.example.com/login");
            assert!(config.base_url_supplied);
            assert!(config.capture().includes_context());
        }

        #[test]
        fn test_all_variables() {
            let config = SmokeConfig::from_lookup(lookup(&[
                ("BASE_URL", "http://localhost:8080"),
                ("SELENIUM_REMOTE_URL", "http://grid:9222"),
                ("TEST_USER", "qa"),
                ("TEST_PASS", "s3cret"),
                ("ARTIFACTS_DIR", "/tmp/smoke"),
                ("CHROME_PATH", "/usr/bin/chromium"),
            ]))
            .unwrap();
            assert_eq!(config.remote_url.as_deref(), Some("http://grid:9222"));
            assert_eq!(config.credentials, Credentials::new("qa", "s3cret"));
            assert_eq!(config.artifacts_dir, PathBuf::from("/tmp/smoke"));
            assert_eq!(config.chrome_path.as_deref(), Some("/usr/bin/chromium"));
        }

        #[test]
        fn test_empty_remote_url_means_local() {
            let config =
                SmokeConfig::from_lookup(lookup(&[("SELENIUM_REMOTE_URL", "  ")])).unwrap();
            assert!(config.remote_url.is_none());
        }

        #[test]
        fn test_invalid_base_url() {
            let err = SmokeConfig::from_lookup(lookup(&[("BASE_URL", "localhost:5173")]))
                .unwrap_err();
            assert!(matches!(err, SmokeError::Config { .. }));
        }
    }

    mod redaction_tests {
        use super::*;

        #[test]
        fn test_debug_hides_password() {
            let creds = Credentials::new("admin", "hunter2");
            let text = format!("{creds:?}");
            assert!(text.contains("admin"));
            assert!(!text.contains("hunter2"));
        }

        #[test]
        fn test_serialized_config_hides_password_and_uses_millis() {
            let config = SmokeConfig::new()
                .with_credentials(Credentials::new("admin", "hunter2"))
                .with_expect_title("Archtool");
            let json = serde_json::to_value(&config).unwrap();
            assert_eq!(json["credentials"]["password"], "***");
            assert_eq!(json["timeouts"]["locate_ms"], 10_000);
            assert_eq!(json["timeouts"]["sign_in_entry_ms"], 2_000);
            assert_eq!(json["expect_title"], "Archtool");
        }
    }

    #[test]
    fn test_instant_timeouts_are_small() {
        let t = Timeouts::instant();
        assert!(t.locate < Duration::from_millis(100));
        assert_eq!(t.settle_after_navigation, Duration::ZERO);
    }
}
