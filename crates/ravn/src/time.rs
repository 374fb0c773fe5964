//! Clocks and loop timing.
//!
//! The loop driver never calls `Instant::now()` directly. It asks a [`Clock`],
//! so tests can swap in a [`ManualClock`] and step virtual time exactly:
//!
//! ```ignore
//! let clock = ManualClock::new();
//! let mut engine = Engine::with_clock(EngineConfig::default(), clock.clone());
//! clock.advance(Duration::from_millis(10));
//! engine.tick()?;
//! ```
//!
//! The [`Time`] resource is registered by the engine and updated every tick.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of monotonic time for the loop driver.
pub trait Clock {
    /// Time since the clock's origin.
    fn now(&self) -> Duration;
    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant`] and `thread::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock. Clones share the same time; `sleep` advances it instantly.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Loop timing resource. Registered by the engine and updated every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Time {
    /// Time since the previous tick (the Update delta).
    delta: Duration,
    /// Time between the two most recent FixedUpdate passes.
    fixed_delta: Duration,
    /// Time since the loop started.
    elapsed: Duration,
    updates: u64,
    fixed_updates: u64,
}

impl Time {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn record_update(&mut self, delta: Duration, elapsed: Duration) {
        self.delta = delta;
        self.elapsed = elapsed;
        self.updates += 1;
    }

    pub(crate) fn record_fixed_update(&mut self, fixed_delta: Duration) {
        self.fixed_delta = fixed_delta;
        self.fixed_updates += 1;
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Update delta in seconds (f32), the most common way to use it.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn fixed_delta(&self) -> Duration {
        self.fixed_delta
    }

    pub fn fixed_delta_secs(&self) -> f32 {
        self.fixed_delta.as_secs_f32()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of Update passes since the loop started.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Number of FixedUpdate passes since the loop started.
    pub fn fixed_updates(&self) -> u64 {
        self.fixed_updates
    }
}
