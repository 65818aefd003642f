//! CPU Clock.
use std::{
    thread,
    time::{Duration, Instant},
};

use crate::{devices::TickSource, vm::Hz};

/// Timer to synchronize thread with the software clock of the virtual CPU.
///
/// It is designed to work with the yielding cooperative pattern
/// of the interpreter loop. When the VM yields control back to the
/// caller, time elapses until it is resumed. Once the interpreter
/// is resumed, the elapsed time is taken into account when determining
/// the next cycle.
pub struct Clock {
    last: Instant,
    /// Time a single CPU cycle takes. Zero runs unthrottled.
    cycle_time: Duration,
}

impl Clock {
    /// Creates a new clock with the current time as internal state.
    pub fn new(frequency: Hz) -> Self {
        Self {
            last: Instant::now(),
            cycle_time: frequency.into(),
        }
    }

    /// Block the current thread until the next clock cycle.
    fn wait(&self) {
        while self.last.elapsed() < self.cycle_time {
            // Sleep does not have enough resolution for the
            // cycle times of the CPU clock.
            //
            // Spinning a loop causes high CPU usage and fan madness.
            //
            // Yielding in a loop is the best alternative.
            thread::yield_now();
        }
    }
}

impl TickSource for Clock {
    fn tick(&mut self) -> f64 {
        self.wait();

        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;

        elapsed.as_secs_f64() * 1000.0
    }
}

/// Virtual clock where every cycle takes the same amount of time.
///
/// Useful for running programs deterministically, without
/// relation to the wall clock.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    millis: f64,
}

impl FixedClock {
    pub fn new(millis: f64) -> Self {
        Self { millis }
    }

    /// Clock that advances by one CPU cycle at the given frequency.
    pub fn from_frequency(frequency: Hz) -> Self {
        let cycle_time: Duration = frequency.into();
        Self::new(cycle_time.as_secs_f64() * 1000.0)
    }
}

impl TickSource for FixedClock {
    fn tick(&mut self) -> f64 {
        self.millis
    }
}
