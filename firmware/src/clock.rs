#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Embassy-backed instants for the scan loop.

use core::time::Duration;

use embassy_time::Instant;
use strike_core::telemetry::TelemetryInstant;

/// Monotonic timestamp wrapper so `embassy_time::Instant` can drive
/// `strike-core` generics.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(Instant::from_micros(micros))
    }

    #[must_use]
    pub fn as_micros(self) -> u64 {
        self.0.as_micros()
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl TelemetryInstant for FirmwareInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.as_micros().saturating_sub(earlier.as_micros()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_saturates_when_clock_goes_backwards() {
        let early = FirmwareInstant::from_micros(1_000);
        let late = FirmwareInstant::from_micros(41_000);
        assert_eq!(
            late.saturating_duration_since(early),
            Duration::from_millis(40)
        );
        assert_eq!(early.saturating_duration_since(late), Duration::ZERO);
    }
}
