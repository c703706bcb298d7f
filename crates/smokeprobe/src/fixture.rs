//! Scoped session acquisition.
//!
//! A [`SessionFixture`] acquires a session from its [`SessionProvider`], runs
//! one body against it and releases it on every exit path: success, error
//! and panic. When the body fails the session state is captured before the
//! release, which is the outer of the two capture sites (the locator being
//! the inner one).

use std::panic::{self, AssertUnwindSafe};

use crate::capture::{ArtifactSet, DiagnosticCapture};
use crate::result::{SmokeError, SmokeResult};
use crate::session::Session;

/// Creates and destroys browser sessions
pub trait SessionProvider {
    /// Session type handed to the body
    type Session: Session;

    /// Start a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser cannot be launched or reached.
    fn acquire(&mut self) -> SmokeResult<Self::Session>;

    /// Shut a session down.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser did not close cleanly.
    fn release(&mut self, session: Self::Session) -> SmokeResult<()>;

    /// Provider name for logging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Releases the leased session when dropped, including during unwinding
struct Lease<'p, P: SessionProvider> {
    provider: &'p mut P,
    session: Option<P::Session>,
}

impl<P: SessionProvider> Lease<'_, P> {
    fn finish(mut self) -> SmokeResult<()> {
        match self.session.take() {
            Some(session) => self.provider.release(session),
            None => Ok(()),
        }
    }
}

impl<P: SessionProvider> Drop for Lease<'_, P> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::warn!(provider = self.provider.name(), "releasing session after panic");
            if let Err(e) = self.provider.release(session) {
                tracing::warn!(error = %e, "session release failed");
            }
        }
    }
}

/// Runs bodies against sessions from a provider
#[derive(Debug)]
pub struct SessionFixture<P> {
    provider: P,
    capture: DiagnosticCapture,
    last_artifacts: Option<ArtifactSet>,
}

impl<P: SessionProvider> SessionFixture<P> {
    /// Fixture over `provider`, capturing failures with `capture`
    #[must_use]
    pub const fn new(provider: P, capture: DiagnosticCapture) -> Self {
        Self {
            provider,
            capture,
            last_artifacts: None,
        }
    }

    /// The provider
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Artifacts written by the last failed run, if any
    #[must_use]
    pub const fn last_artifacts(&self) -> Option<&ArtifactSet> {
        self.last_artifacts.as_ref()
    }

    /// Acquire a session, run `body`, release the session.
    ///
    /// A panicking body is captured like a failing one; the panic then
    /// resumes and the session is released while unwinding.
    ///
    /// # Errors
    ///
    /// Returns the acquire error, the body's error (after capturing the page),
    /// or the release error when the body itself succeeded.
    pub fn run<T, F>(&mut self, body: F) -> SmokeResult<T>
    where
        F: FnOnce(&P::Session) -> SmokeResult<T>,
    {
        self.last_artifacts = None;
        let session = self.provider.acquire()?;
        tracing::debug!(provider = self.provider.name(), "session acquired");

        let lease = Lease {
            provider: &mut self.provider,
            session: Some(session),
        };
        let outcome = match lease.session.as_ref() {
            Some(session) => match panic::catch_unwind(AssertUnwindSafe(|| body(session))) {
                Ok(outcome) => {
                    if outcome.is_err() {
                        self.last_artifacts = Some(self.capture.capture(session));
                    }
                    outcome
                }
                Err(payload) => {
                    self.last_artifacts = Some(self.capture.capture(session));
                    panic::resume_unwind(payload)
                }
            },
            None => Err(SmokeError::session("session already released")),
        };

        match (outcome, lease.finish()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(release)) => Err(release),
            (Err(e), release) => {
                if let Err(release) = release {
                    tracing::warn!(error = %release, "session release failed");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MockPage, MockSession};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Counting {
        acquired: Rc<Cell<u32>>,
        released: Rc<Cell<u32>>,
        fail_acquire: bool,
        fail_release: bool,
    }

    impl SessionProvider for Counting {
        type Session = MockSession;

        fn acquire(&mut self) -> SmokeResult<MockSession> {
            if self.fail_acquire {
                return Err(SmokeError::BrowserLaunch {
                    message: "no chromium".to_string(),
                });
            }
            self.acquired.set(self.acquired.get() + 1);
            let session = MockSession::new().with_page("http://app/", MockPage::new("Home"));
            session.navigate("http://app/")?;
            Ok(session)
        }

        fn release(&mut self, _session: MockSession) -> SmokeResult<()> {
            self.released.set(self.released.get() + 1);
            if self.fail_release {
                return Err(SmokeError::session("close failed"));
            }
            Ok(())
        }
    }

    fn fixture(dir: &std::path::Path) -> (SessionFixture<Counting>, Rc<Cell<u32>>) {
        let provider = Counting::default();
        let released = Rc::clone(&provider.released);
        (
            SessionFixture::new(provider, DiagnosticCapture::new(dir)),
            released,
        )
    }

    #[test]
    fn test_success_releases_without_capture() {
        let dir = tempfile::tempdir().unwrap();
        let (mut fx, released) = fixture(dir.path());
        let title = fx.run(|s| s.title()).unwrap();
        assert_eq!(title, "Home");
        assert_eq!(released.get(), 1);
        assert!(fx.last_artifacts().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failure_captures_then_releases() {
        let dir = tempfile::tempdir().unwrap();
        let (mut fx, released) = fixture(dir.path());
        let err = fx
            .run(|_| -> SmokeResult<()> { Err(SmokeError::session("step failed")) })
            .unwrap_err();
        assert!(matches!(err, SmokeError::Session { .. }));
        assert_eq!(released.get(), 1);
        let set = fx.last_artifacts().unwrap();
        assert!(set.screenshot.is_some());
        assert!(set.markup.is_some());
    }

    #[test]
    fn test_panic_captures_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let (mut fx, released) = fixture(dir.path());
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: SmokeResult<()> = fx.run(|_| panic!("body blew up"));
        }));
        assert!(result.is_err());
        assert_eq!(released.get(), 1);

        let set = fx.last_artifacts().unwrap();
        assert!(set.screenshot.as_ref().unwrap().exists());
        assert!(set.markup.as_ref().unwrap().exists());
        assert!(std::fs::read_dir(dir.path()).unwrap().count() >= 2);
    }

    #[test]
    fn test_acquire_failure_skips_body() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Counting {
            fail_acquire: true,
            ..Counting::default()
        };
        let released = Rc::clone(&provider.released);
        let mut fx = SessionFixture::new(provider, DiagnosticCapture::new(dir.path()));
        let mut ran = false;
        let err = fx
            .run(|_| {
                ran = true;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, SmokeError::BrowserLaunch { .. }));
        assert!(!ran);
        assert_eq!(released.get(), 0);
    }

    #[test]
    fn test_release_error_surfaces_only_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Counting {
            fail_release: true,
            ..Counting::default()
        };
        let mut fx = SessionFixture::new(provider, DiagnosticCapture::new(dir.path()));
        assert!(fx.run(|_| Ok(())).is_err());

        let err = fx
            .run(|_| -> SmokeResult<()> { Err(SmokeError::input("typing failed")) })
            .unwrap_err();
        assert!(matches!(err, SmokeError::Input { .. }));
        assert_eq!(fx.provider().acquired.get(), 2);
    }
}
