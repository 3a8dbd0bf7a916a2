//! Production Environment implementation using system time.
//!
//! `SystemEnv` reads the monotonic system clock and sleeps on the tokio timer.
//! Behavior is therefore wall-clock driven; tests of the state machines use
//! synthetic instants instead.

use std::time::Duration;

use chatwire_core::env::Environment;

/// Production environment using system time.
///
/// Uses `std::time::Instant::now()` for time and `tokio::time::sleep()` for
/// async sleeping.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
