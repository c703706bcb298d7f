//! Failure diagnostics.
//!
//! When a locate call exhausts its candidates, or a scenario fails for any
//! other reason, the page state is dumped next to each other under one unix
//! timestamp:
//!
//! ```text
//! artifacts/
//!   fail_<ts>.png      screenshot of the viewport
//!   fail_<ts>.html     rendered markup
//!   context_<ts>.txt   URL and title (only when BASE_URL was supplied)
//! ```
//!
//! Capture never fails. Each file is written independently and a failure is
//! logged and skipped. Files are never overwritten: when the locator and the
//! fixture both capture within the same second, the locator's files are kept.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::session::Session;

/// Default artifact directory, relative to the working directory
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Files written by one capture, keyed by a shared timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSet {
    /// Unix timestamp (seconds) shared by every file in the set
    pub timestamp: i64,
    /// `fail_<ts>.png`, if written
    pub screenshot: Option<PathBuf>,
    /// `fail_<ts>.html`, if written
    pub markup: Option<PathBuf>,
    /// `context_<ts>.txt`, if written
    pub context: Option<PathBuf>,
}

impl ArtifactSet {
    fn empty(timestamp: i64) -> Self {
        Self {
            timestamp,
            screenshot: None,
            markup: None,
            context: None,
        }
    }

    /// Paths of the files that were actually written
    #[must_use]
    pub fn paths(&self) -> Vec<&Path> {
        [&self.screenshot, &self.markup, &self.context]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect()
    }

    /// True when no file could be written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths().is_empty()
    }
}

/// Writes [`ArtifactSet`]s into a destination directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticCapture {
    dir: PathBuf,
    include_context: bool,
}

impl Default for DiagnosticCapture {
    fn default() -> Self {
        Self::new(DEFAULT_ARTIFACTS_DIR)
    }
}

impl DiagnosticCapture {
    /// Capture into `dir`, which is created on demand
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            include_context: false,
        }
    }

    /// Also write the URL/title context file
    #[must_use]
    pub const fn with_context(mut self, include: bool) -> Self {
        self.include_context = include;
        self
    }

    /// Destination directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the context file is written
    #[must_use]
    pub const fn includes_context(&self) -> bool {
        self.include_context
    }

    /// Dump the session's current state. Best-effort: never fails.
    pub fn capture<S: Session>(&self, session: &S) -> ArtifactSet {
        self.capture_at(session, chrono::Utc::now().timestamp())
    }

    fn capture_at<S: Session>(&self, session: &S, timestamp: i64) -> ArtifactSet {
        let mut set = ArtifactSet::empty(timestamp);

        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "cannot create artifact directory");
        }

        let path = self.dir.join(format!("fail_{timestamp}.png"));
        match session.screenshot() {
            Ok(png) => set.screenshot = write_artifact(&path, &png),
            Err(e) => tracing::warn!(error = %e, "screenshot unavailable for diagnostics"),
        }

        let path = self.dir.join(format!("fail_{timestamp}.html"));
        match session.page_source() {
            Ok(html) => set.markup = write_artifact(&path, html.as_bytes()),
            Err(e) => tracing::warn!(error = %e, "page source unavailable for diagnostics"),
        }

        if self.include_context {
            let url = session
                .current_url()
                .unwrap_or_else(|e| format!("<unavailable: {e}>"));
            let title = session
                .title()
                .unwrap_or_else(|e| format!("<unavailable: {e}>"));
            let path = self.dir.join(format!("context_{timestamp}.txt"));
            set.context = write_artifact(&path, format!("URL: {url}\nTITLE: {title}\n").as_bytes());
        }

        tracing::info!(
            timestamp,
            files = set.paths().len(),
            dir = %self.dir.display(),
            "captured failure artifacts"
        );
        set
    }
}

fn write_artifact(path: &Path, contents: &[u8]) -> Option<PathBuf> {
    let written = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .and_then(|mut file| file.write_all(contents));
    match written {
        Ok(()) => Some(path.to_path_buf()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            tracing::debug!(path = %path.display(), "keeping artifact from earlier capture");
            Some(path.to_path_buf())
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to write artifact");
            None
        }
    }
}
