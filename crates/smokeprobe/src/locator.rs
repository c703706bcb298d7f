//! Fallback-selector locator with bounded polling.
//!
//! Candidates are tried strictly in list order. Each candidate gets the full
//! per-candidate timeout before the next one is considered; the first one to
//! become visible wins and the rest are never queried.
//!
//! A candidate the driver cannot evaluate (invalid syntax) can never match, so
//! it is abandoned immediately and the chain moves on. Any other session error
//! aborts the search.

use std::time::Duration;

use crate::capture::DiagnosticCapture;
use crate::result::{SmokeError, SmokeResult};
use crate::selector::{Selector, SelectorList};
use crate::session::{Element, Session};
use crate::wait::{poll_until, Probe, WaitOptions, Waited, DEFAULT_POLL_INTERVAL_MS};

/// Finds the first visible element of a [`SelectorList`].
#[derive(Debug)]
pub struct Locator<'s, S: Session> {
    session: &'s S,
    capture: Option<DiagnosticCapture>,
    poll_interval: Duration,
}

impl<'s, S: Session> Locator<'s, S> {
    /// Locator over `session` that does not write diagnostics
    #[must_use]
    pub fn new(session: &'s S) -> Self {
        Self {
            session,
            capture: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Write an artifact set whenever [`locate`](Self::locate) fails
    #[must_use]
    pub fn with_capture(mut self, capture: DiagnosticCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Set the pause between polls of one candidate
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The session being searched
    #[must_use]
    pub const fn session(&self) -> &'s S {
        self.session
    }

    /// Find the first candidate that becomes visible within `timeout`.
    ///
    /// On failure the diagnostic capture (if configured) runs before the
    /// error is returned. An empty list fails immediately without capture.
    pub fn locate(&self, list: &SelectorList, timeout: Duration) -> SmokeResult<S::Element> {
        match self.search(list, timeout) {
            Ok(element) => Ok(element),
            Err(e @ SmokeError::EmptySelectorList { .. }) => Err(e),
            Err(e) => {
                tracing::warn!(list = list.name(), error = %e, "locate failed");
                if let Some(capture) = &self.capture {
                    let _ = capture.capture(self.session);
                }
                Err(e)
            }
        }
    }

    /// Same search as [`locate`](Self::locate) but never writes diagnostics.
    ///
    /// For best-effort steps whose failure the caller recovers from.
    pub fn probe(&self, list: &SelectorList, timeout: Duration) -> SmokeResult<S::Element> {
        self.search(list, timeout)
    }

    fn search(&self, list: &SelectorList, timeout: Duration) -> SmokeResult<S::Element> {
        let options = WaitOptions::new()
            .with_timeout(timeout)
            .with_poll_interval(self.poll_interval);
        let mut last: Option<(&Selector, String)> = None;

        for (index, selector) in list.iter().enumerate() {
            match poll_until(&options, || self.poll_candidate(selector))? {
                Waited::Ready { value, elapsed } => {
                    tracing::debug!(
                        list = list.name(),
                        candidate = index,
                        %selector,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "located element"
                    );
                    return Ok(value);
                }
                Waited::TimedOut { reason, .. } | Waited::Abandoned { reason, .. } => {
                    tracing::debug!(
                        list = list.name(),
                        candidate = index,
                        %selector,
                        reason = reason.as_str(),
                        "candidate exhausted"
                    );
                    last = Some((selector, reason));
                }
            }
        }

        match last {
            Some((selector, reason)) => Err(SmokeError::LocateTimeout {
                list: list.name().to_string(),
                attempted: list.len(),
                timeout_ms: options.timeout_ms(),
                last_selector: selector.clone(),
                last_error: reason,
            }),
            None => Err(SmokeError::empty_list(list)),
        }
    }

    fn poll_candidate(&self, selector: &Selector) -> SmokeResult<Probe<S::Element>> {
        match self.session.query(selector) {
            Ok(Some(element)) => match element.is_visible() {
                Ok(true) => Ok(Probe::Ready(element)),
                Ok(false) => Ok(Probe::Pending("element present but not visible".to_string())),
                // element detached between query and check; query again
                Err(e) => Ok(Probe::Pending(e.to_string())),
            },
            Ok(None) => Ok(Probe::Pending("no matching element".to_string())),
            Err(SmokeError::InvalidSelector { message, .. }) => {
                Ok(Probe::GiveUp(format!("selector not supported by driver: {message}")))
            }
            Err(e) => Err(e),
        }
    }
}
