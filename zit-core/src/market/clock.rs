use std::time::{Duration, Instant};

/// Monotonic time source for period deadlines.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// `Instant::now()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deadline fixed once at period start. A timeout too large to represent
/// never expires.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    start: Instant,
    at: Option<Instant>,
}

impl Deadline {
    pub fn start<C: Clock>(clock: &C, timeout: Duration) -> Self {
        let start = clock.now();
        Self {
            start,
            at: start.checked_add(timeout),
        }
    }

    pub fn expired<C: Clock>(&self, clock: &C) -> bool {
        self.at.is_some_and(|at| clock.now() >= at)
    }

    pub fn elapsed<C: Clock>(&self, clock: &C) -> Duration {
        clock.now().saturating_duration_since(self.start)
    }
}
