//! Reconnect backoff schedule.

use std::time::Duration;

/// Delay multiplied by `2^attempt` for each retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Upper bound on any single retry delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);

/// Automatic reconnects allowed before the connection gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Capped exponential backoff with a bounded number of attempts.
///
/// Attempts are 1-indexed: the first retry after a close is attempt 1 and
/// waits `base * 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Base delay.
    pub base_delay: Duration,
    /// Cap applied after doubling.
    pub max_delay: Duration,
    /// Retries before the connection closes for good.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt`: `min(base * 2^attempt, max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.checked_mul(factor).map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Whether another retry fits in the budget after `attempts` retries.
    pub fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}
