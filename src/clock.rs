//! Injectable wall-clock abstraction.
//!
//! Silence detection is a pure function of `(now, last_active_at, timeout)`
//! recomputed on every tick — there are no OS timers to cancel or reschedule.
//! [`Clock`] makes `now` injectable so that every timing decision in the
//! engine can be driven deterministically from tests.
//!
//! [`SystemClock`] is the production implementation; [`ManualClock`] is an
//! advanceable clock for tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// ---------------------------------------------------------------------------
// Clock trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe source of the current time in milliseconds.
///
/// Held behind an `Arc<dyn Clock>` by the engine.  Implementations must be
/// `Send + Sync`.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds.  For [`SystemClock`] this is Unix epoch
    /// time; for [`ManualClock`] it is whatever the test has set.
    fn now_ms(&self) -> u64;
}

// Compile-time assertion: Box<dyn Clock> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Clock>) {}
};

// ---------------------------------------------------------------------------
// SystemClock
// ---------------------------------------------------------------------------

/// Production clock backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

/// Manually advanced clock for deterministic tests.
///
/// # Example
///
/// ```rust
/// use meeting_copilot::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_000);
/// assert_eq!(clock.now_ms(), 1_000);
///
/// clock.advance(700);
/// assert_eq!(clock.now_ms(), 1_700);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    /// Move the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Jump the clock to an absolute time.
    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }

    #[test]
    fn manual_clock_starts_at_given_time() {
        let clock = ManualClock::new(42);
        assert_eq!(clock.now_ms(), 42);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(100);
        clock.advance(500);
        clock.advance(200);
        assert_eq!(clock.now_ms(), 800);
    }

    #[test]
    fn manual_clock_set_overrides() {
        let clock = ManualClock::new(100);
        clock.set(5);
        assert_eq!(clock.now_ms(), 5);
    }

    #[test]
    fn clock_is_object_safe() {
        let clock: Box<dyn Clock> = Box::new(ManualClock::new(0));
        assert_eq!(clock.now_ms(), 0);
    }
}
