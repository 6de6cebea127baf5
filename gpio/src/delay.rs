//! Pacing of timed bus signals.
//!
//! Drivers never sleep on their own; they ask a [Delay] to wait, so tests can swap in
//! [MockDelay](crate::mock::MockDelay) and run without real elapsed time.
use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;

pub trait Delay: Debug {
    /// Suspends the caller for at least `duration`.
    fn delay(&mut self, duration: Duration);
}

/// Delay that suspends the current thread.
///
/// Uses [sleep], so the CPU is handed to other threads instead of spinning.
#[derive(Copy, Clone, Debug, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay(&mut self, duration: Duration) {
        sleep(duration);
    }
}
