//! Environment abstraction for deterministic testing.
//!
//! Decouples drivers from the system clock. State machines never call this
//! trait themselves; drivers read `now()` and pass it in, which lets tests
//! feed synthetic instants.

use std::time::Duration;

/// Abstract environment providing time and async sleep.
///
/// Implementations MUST guarantee that `now()` never goes backwards.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; tests can use any
    /// monotonic type that subtracts to a `Duration`.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code sleeps. Protocol logic expresses waits as deadlines.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
