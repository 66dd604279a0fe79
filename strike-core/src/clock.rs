//! Time sources for the scan loop.
//!
//! The scan loop never reads a wall clock on its own. Callers inject a
//! [`Clock`] so peak windows can be driven by the embassy monotonic timer on
//! the MCU and by a deterministic [`SteppedClock`] in tests and the emulator.

use core::{ops::Add, time::Duration};

use crate::telemetry::TelemetryInstant;

/// Source of monotonic timestamps consumed once per scan cycle.
pub trait Clock {
    /// Instant type produced by this clock.
    type Instant: TelemetryInstant + Ord;

    /// Returns the current instant.
    fn now(&mut self) -> Self::Instant;
}

/// Blocks between scan cycles.
///
/// This is the only suspension point of the loop and it is unconditional.
pub trait Pacer {
    fn pause(&mut self, interval: Duration);
}

/// Pacer that returns immediately, used when stepping the loop by hand.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopPacer;

impl Pacer for NoopPacer {
    fn pause(&mut self, _: Duration) {}
}

/// Logical timestamp counted in microseconds from an arbitrary origin.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Micros(u64);

impl Micros {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(micros: u64) -> Self {
        Self(micros)
    }

    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }
}

impl Add<Duration> for Micros {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let delta = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(delta))
    }
}

impl TelemetryInstant for Micros {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

/// Deterministic clock that only moves when told to.
///
/// [`SteppedClock::with_auto_advance`] makes every [`Clock::now`] call move the
/// clock forward by a fixed step, which models one scan cycle per call.
#[derive(Copy, Clone, Debug)]
pub struct SteppedClock {
    now: Micros,
    auto_advance: Duration,
}

impl SteppedClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub const fn new(start: Micros) -> Self {
        Self {
            now: start,
            auto_advance: Duration::ZERO,
        }
    }

    /// Creates a clock that advances by `step` after every reading.
    #[must_use]
    pub const fn with_auto_advance(start: Micros, step: Duration) -> Self {
        Self {
            now: start,
            auto_advance: step,
        }
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&mut self, delta: Duration) {
        self.now = self.now + delta;
    }

    /// Returns the current reading without advancing.
    #[must_use]
    pub const fn peek(&self) -> Micros {
        self.now
    }
}

impl Clock for SteppedClock {
    type Instant = Micros;

    fn now(&mut self) -> Micros {
        let current = self.now;
        self.now = self.now + self.auto_advance;
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepped_clock_auto_advances_after_each_read() {
        let mut clock = SteppedClock::with_auto_advance(Micros::ZERO, Duration::from_millis(40));
        assert_eq!(clock.now(), Micros::ZERO);
        assert_eq!(clock.now(), Micros::from_millis(40));
        assert_eq!(clock.peek(), Micros::from_millis(80));
    }

    #[test]
    fn frozen_clock_moves_only_when_advanced() {
        let mut clock = SteppedClock::new(Micros::new(5));
        assert_eq!(clock.now(), Micros::new(5));
        clock.advance(Duration::from_micros(10));
        assert_eq!(clock.now(), Micros::new(15));
        assert_eq!(clock.now(), Micros::new(15));
    }

    #[test]
    fn micros_duration_saturates_backwards() {
        let first = Micros::new(100);
        let second = Micros::new(250);
        assert_eq!(first.saturating_duration_since(second), Duration::ZERO);
        assert_eq!(
            second.saturating_duration_since(first),
            Duration::from_micros(150)
        );
    }
}
