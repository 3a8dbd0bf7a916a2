//! Typing indicator debounce.
//!
//! A burst of keystrokes produces one `typing: true`; one `typing: false`
//! follows once input has been quiet for the configured period. The quiet
//! timer is a deadline owned by the instance, refreshed by every keystroke
//! and cleared on reset, so no timer survives its owner.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

/// Quiet period after the last keystroke before typing is considered over.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(1);

/// Local typing state with a single refreshable quiet timer.
#[derive(Debug, Clone)]
pub struct TypingDebounce<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    quiet_period: Duration,
    /// Time of the latest keystroke in the current burst. `None` when idle.
    last_input: Option<I>,
}

impl<I> TypingDebounce<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create an idle debouncer.
    pub fn new(quiet_period: Duration) -> Self {
        Self { quiet_period, last_input: None }
    }

    /// Whether the local user is currently marked as typing.
    pub fn is_typing(&self) -> bool {
        self.last_input.is_some()
    }

    /// Record a keystroke. Returns `Some(true)` when a burst starts.
    pub fn keystroke(&mut self, now: I) -> Option<bool> {
        let started = self.last_input.is_none();
        self.last_input = Some(now);
        started.then_some(true)
    }

    /// Returns `Some(false)` once the quiet period has elapsed.
    pub fn tick(&mut self, now: I) -> Option<bool> {
        let last = self.last_input?;
        if now - last >= self.quiet_period {
            self.last_input = None;
            Some(false)
        } else {
            None
        }
    }

    /// End the burst immediately and cancel the quiet timer.
    pub fn reset(&mut self) {
        self.last_input = None;
    }

    /// Time left until the quiet timer fires. `None` when idle.
    pub fn time_until_quiet(&self, now: I) -> Option<Duration> {
        self.last_input.map(|last| self.quiet_period.saturating_sub(now - last))
    }
}

impl<I> Default for TypingDebounce<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}
