//! Deadline-bounded polling.
//!
//! Every wait in Smokeprobe is a sleep loop against a wall-clock deadline.
//! There is no external cancel signal: a wait ends when its probe succeeds,
//! when the probe gives up, or when the deadline passes.

use std::time::{Duration, Instant};

use crate::result::SmokeResult;

/// Default per-candidate timeout (10 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// How long to keep polling
    pub timeout: Duration,
    /// Pause between polls
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Timeout in whole milliseconds
    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

/// What a single poll observed
#[derive(Debug)]
pub enum Probe<T> {
    /// Condition satisfied
    Ready(T),
    /// Not yet; keep polling
    Pending(String),
    /// Can never succeed; stop without waiting out the deadline
    GiveUp(String),
}

/// How a wait ended
#[derive(Debug)]
pub enum Waited<T> {
    /// The probe succeeded
    Ready {
        /// Value produced by the probe
        value: T,
        /// Time spent waiting
        elapsed: Duration,
    },
    /// The deadline passed
    TimedOut {
        /// Time spent waiting
        elapsed: Duration,
        /// Reason reported by the last poll
        reason: String,
    },
    /// The probe gave up early
    Abandoned {
        /// Time spent waiting
        elapsed: Duration,
        /// Reason the probe gave
        reason: String,
    },
}

impl<T> Waited<T> {
    /// The value if the wait succeeded
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Time spent waiting
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Ready { elapsed, .. }
            | Self::TimedOut { elapsed, .. }
            | Self::Abandoned { elapsed, .. } => *elapsed,
        }
    }
}

/// Poll `probe` until it is ready, gives up, or `options.timeout` elapses.
///
/// The probe runs at least once. A timed-out wait has always spent the full
/// timeout. Errors from the probe abort the wait and propagate.
pub fn poll_until<T, F>(options: &WaitOptions, mut probe: F) -> SmokeResult<Waited<T>>
where
    F: FnMut() -> SmokeResult<Probe<T>>,
{
    let start = Instant::now();
    let deadline = start + options.timeout;
    let mut reason: String;

    loop {
        match probe()? {
            Probe::Ready(value) => {
                return Ok(Waited::Ready {
                    value,
                    elapsed: start.elapsed(),
                })
            }
            Probe::GiveUp(why) => {
                return Ok(Waited::Abandoned {
                    elapsed: start.elapsed(),
                    reason: why,
                })
            }
            Probe::Pending(why) => reason = why,
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(options.poll_interval.min(deadline - now));
    }

    Ok(Waited::TimedOut {
        elapsed: start.elapsed(),
        reason,
    })
}
