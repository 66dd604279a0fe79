//! Windowed peak-hold aggregation used for calibration.
//!
//! Every tracked channel keeps the loudest reading seen since the window
//! opened. When a window has elapsed the tracker hands a snapshot to the
//! sink, zeroes every peak and reopens the window at the current instant.
//! A stall that spans several windows still produces a single reset.

use core::time::Duration;

use heapless::Vec;

use crate::channels::{ChannelId, MAX_CHANNELS};
use crate::config::ConfigError;
use crate::sampler::SampleReading;
use crate::telemetry::{EventSink, TelemetryInstant};

/// Peak-hold record for one channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PeakRecord {
    pub channel: ChannelId,
    pub max_value: u16,
}

/// Tracks the per-channel maximum within a fixed time window.
pub struct PeakTracker<TInstant, const N: usize = MAX_CHANNELS> {
    records: Vec<PeakRecord, N>,
    window: Duration,
    window_start: TInstant,
}

impl<TInstant, const N: usize> PeakTracker<TInstant, N>
where
    TInstant: TelemetryInstant,
{
    /// Opens the first window at `start`.
    #[must_use]
    pub const fn new(window: Duration, start: TInstant) -> Self {
        Self {
            records: Vec::new(),
            window,
            window_start: start,
        }
    }

    /// Adds a channel with a zeroed peak. Records keep insertion order.
    pub fn track(&mut self, channel: ChannelId) -> Result<(), ConfigError> {
        if self.position(channel).is_some() {
            return Err(ConfigError::DuplicateChannel(channel));
        }
        self.records
            .push(PeakRecord {
                channel,
                max_value: 0,
            })
            .map_err(|_| ConfigError::TooManyChannels { capacity: N })
    }

    /// Folds a reading into its channel's peak. Untracked channels are ignored.
    pub fn observe(&mut self, reading: &SampleReading) {
        if let Some(index) = self.position(reading.channel) {
            let record = &mut self.records[index];
            record.max_value = record.max_value.max(reading.value);
        }
    }

    /// Closes the window if it has run its full length.
    ///
    /// Returns `true` when a snapshot was emitted and the peaks were reset.
    pub fn tick<S>(&mut self, now: TInstant, sink: &mut S) -> bool
    where
        S: EventSink<TInstant> + ?Sized,
    {
        if now.saturating_duration_since(self.window_start) < self.window {
            return false;
        }

        sink.on_peaks(&self.records, now);
        for record in &mut self.records {
            record.max_value = 0;
        }
        self.window_start = now;
        true
    }

    /// Current peak for `channel`, `None` when the channel is not tracked.
    #[must_use]
    pub fn peak(&self, channel: ChannelId) -> Option<u16> {
        self.position(channel)
            .map(|index| self.records[index].max_value)
    }

    /// Peaks in tracking order.
    #[must_use]
    pub fn records(&self) -> &[PeakRecord] {
        &self.records
    }

    #[must_use]
    pub fn window_start(&self) -> TInstant {
        self.window_start
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    fn position(&self, channel: ChannelId) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.channel == channel)
    }
}
