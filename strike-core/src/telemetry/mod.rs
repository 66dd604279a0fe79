//! Event sink seam and the in-memory telemetry ring.
//!
//! The scan loop reports strike edges and closed peak windows to an
//! [`EventSink`]. Delivery is fire-and-forget: sinks must not block the cycle.
//! [`TelemetryRecorder`] is a sink that keeps the most recent events in a
//! fixed-size ring together with per-channel strike statistics.

use core::{fmt, time::Duration};

use heapless::{HistoryBuf, OldestOrdered};

use crate::channels::{ChannelId, MAX_CHANNELS};
use crate::peaks::PeakRecord;
use crate::sampler::Cycle;
use crate::trigger::TriggerEdge;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 128;

/// Sequential identifier assigned to each recorded event.
pub type EventId = u32;

/// Trait implemented by monotonic instant wrappers used for telemetry tracking.
pub trait TelemetryInstant: Copy {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// Strike edge produced by one channel's trigger state machine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StrikeEvent {
    pub channel: ChannelId,
    pub edge: TriggerEdge,
    /// Reading that caused the edge.
    pub value: u16,
    pub cycle: Cycle,
}

impl fmt::Display for StrikeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} value={} cycle={}",
            self.edge, self.channel, self.value, self.cycle
        )
    }
}

/// Consumer of scan-loop output.
pub trait EventSink<TInstant> {
    /// Called once per onset or offset, in scan order.
    fn on_strike(&mut self, event: &StrikeEvent, at: TInstant);

    /// Called once per closed peak window, before the peaks are zeroed.
    fn on_peaks(&mut self, peaks: &[PeakRecord], at: TInstant);
}

impl<TInstant, S> EventSink<TInstant> for &mut S
where
    S: EventSink<TInstant> + ?Sized,
{
    fn on_strike(&mut self, event: &StrikeEvent, at: TInstant) {
        (**self).on_strike(event, at);
    }

    fn on_peaks(&mut self, peaks: &[PeakRecord], at: TInstant) {
        (**self).on_peaks(peaks, at);
    }
}

/// Fans every event out to both sinks, first `A` then `B`.
impl<TInstant, A, B> EventSink<TInstant> for (A, B)
where
    TInstant: Copy,
    A: EventSink<TInstant>,
    B: EventSink<TInstant>,
{
    fn on_strike(&mut self, event: &StrikeEvent, at: TInstant) {
        self.0.on_strike(event, at);
        self.1.on_strike(event, at);
    }

    fn on_peaks(&mut self, peaks: &[PeakRecord], at: TInstant) {
        self.0.on_peaks(peaks, at);
        self.1.on_peaks(peaks, at);
    }
}

/// Sink that drops everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl<TInstant> EventSink<TInstant> for NullSink {
    fn on_strike(&mut self, _: &StrikeEvent, _: TInstant) {}

    fn on_peaks(&mut self, _: &[PeakRecord], _: TInstant) {}
}

/// Discriminated telemetry events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEventKind {
    Onset(ChannelId),
    Offset(ChannelId),
    PeakWindowClosed,
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEventKind::Onset(channel) => write!(f, "onset {channel}"),
            TelemetryEventKind::Offset(channel) => write!(f, "offset {channel}"),
            TelemetryEventKind::PeakWindowClosed => f.write_str("peak-window-closed"),
        }
    }
}

/// Payloads carried alongside telemetry events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TelemetryPayload {
    Strike(StrikeTelemetry),
    Peaks(PeakTelemetry),
}

/// Strike edge payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StrikeTelemetry {
    pub value: u16,
    pub cycle: Cycle,
    /// For onsets, the time since the channel's previous onset. For offsets,
    /// how long the strike rang.
    pub elapsed: Option<Duration>,
}

/// Summary of a closed peak window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PeakTelemetry {
    /// Channels with a non-zero peak.
    pub active_channels: u8,
    /// Loudest channel of the window, if any channel was non-zero.
    pub loudest: Option<PeakRecord>,
}

impl PeakTelemetry {
    #[must_use]
    pub fn summarize(peaks: &[PeakRecord]) -> Self {
        let active = peaks.iter().filter(|record| record.max_value > 0).count();
        let loudest = peaks
            .iter()
            .filter(|record| record.max_value > 0)
            .fold(None::<PeakRecord>, |best, record| match best {
                Some(best) if best.max_value >= record.max_value => Some(best),
                _ => Some(*record),
            });

        Self {
            active_channels: truncate_count(active),
            loudest,
        }
    }
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TelemetryRecord<TInstant>
where
    TInstant: Copy,
{
    pub id: EventId,
    pub timestamp: TInstant,
    pub event: TelemetryEventKind,
    pub details: TelemetryPayload,
}

/// Telemetry ring buffer type alias.
pub type TelemetryRing<TInstant, const CAPACITY: usize = TELEMETRY_RING_CAPACITY> =
    HistoryBuf<TelemetryRecord<TInstant>, CAPACITY>;

/// Records scan-loop output into a fixed-size ring buffer.
///
/// Per-channel counters are indexed by [`ChannelId::as_index`]; channels past
/// `CHANNELS` are still recorded in the ring but not counted.
pub struct TelemetryRecorder<
    TInstant,
    const CAPACITY: usize = TELEMETRY_RING_CAPACITY,
    const CHANNELS: usize = MAX_CHANNELS,
> where
    TInstant: Copy,
{
    ring: TelemetryRing<TInstant, CAPACITY>,
    last_onset: [Option<TInstant>; CHANNELS],
    strike_counts: [u32; CHANNELS],
    next_event_id: EventId,
}

impl<TInstant, const CAPACITY: usize, const CHANNELS: usize>
    TelemetryRecorder<TInstant, CAPACITY, CHANNELS>
where
    TInstant: TelemetryInstant,
{
    /// Creates a new telemetry recorder with an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            last_onset: [None; CHANNELS],
            strike_counts: [0; CHANNELS],
            next_event_id: 0,
        }
    }

    /// Returns an iterator over the recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord<TInstant>> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent telemetry record, if available.
    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord<TInstant>> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no telemetry records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Onsets seen on `channel` since the recorder was created.
    #[must_use]
    pub fn strike_count(&self, channel: ChannelId) -> u32 {
        self.strike_counts
            .get(channel.as_index())
            .copied()
            .unwrap_or(0)
    }

    /// Onsets seen across every counted channel.
    #[must_use]
    pub fn total_strikes(&self) -> u32 {
        self.strike_counts
            .iter()
            .fold(0u32, |total, count| total.saturating_add(*count))
    }

    /// Records an onset or offset and derives its timing.
    pub fn record_strike(&mut self, event: &StrikeEvent, timestamp: TInstant) -> EventId {
        let slot = event.channel.as_index();
        let previous_onset = self.last_onset.get(slot).copied().flatten();
        let elapsed = previous_onset.map(|onset| timestamp.saturating_duration_since(onset));

        let kind = match event.edge {
            TriggerEdge::Onset => {
                if let Some(last) = self.last_onset.get_mut(slot) {
                    *last = Some(timestamp);
                }
                if let Some(count) = self.strike_counts.get_mut(slot) {
                    *count = count.saturating_add(1);
                }
                TelemetryEventKind::Onset(event.channel)
            }
            TriggerEdge::Offset => TelemetryEventKind::Offset(event.channel),
        };

        self.record(
            kind,
            TelemetryPayload::Strike(StrikeTelemetry {
                value: event.value,
                cycle: event.cycle,
                elapsed,
            }),
            timestamp,
        )
    }

    /// Records the summary of a closed peak window.
    pub fn record_peaks(&mut self, peaks: &[PeakRecord], timestamp: TInstant) -> EventId {
        self.record(
            TelemetryEventKind::PeakWindowClosed,
            TelemetryPayload::Peaks(PeakTelemetry::summarize(peaks)),
            timestamp,
        )
    }

    /// Records an arbitrary telemetry event with the supplied payload.
    pub fn record(
        &mut self,
        event: TelemetryEventKind,
        payload: TelemetryPayload,
        timestamp: TInstant,
    ) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
            details: payload,
        });

        id
    }
}

impl<TInstant, const CAPACITY: usize, const CHANNELS: usize> Default
    for TelemetryRecorder<TInstant, CAPACITY, CHANNELS>
where
    TInstant: TelemetryInstant,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<TInstant, const CAPACITY: usize, const CHANNELS: usize> EventSink<TInstant>
    for TelemetryRecorder<TInstant, CAPACITY, CHANNELS>
where
    TInstant: TelemetryInstant,
{
    fn on_strike(&mut self, event: &StrikeEvent, at: TInstant) {
        self.record_strike(event, at);
    }

    fn on_peaks(&mut self, peaks: &[PeakRecord], at: TInstant) {
        self.record_peaks(peaks, at);
    }
}

fn truncate_count(count: usize) -> u8 {
    match u8::try_from(count) {
        Ok(value) => value,
        Err(_) => u8::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
    struct MicrosInstant(u64);

    impl TelemetryInstant for MicrosInstant {
        fn saturating_duration_since(&self, earlier: Self) -> Duration {
            Duration::from_micros(self.0.saturating_sub(earlier.0))
        }
    }

    fn strike(channel: u8, edge: TriggerEdge, cycle: Cycle) -> StrikeEvent {
        StrikeEvent {
            channel: ChannelId::new(channel),
            edge,
            value: 100,
            cycle,
        }
    }

    #[derive(Default)]
    struct Counter {
        strikes: u8,
        windows: u8,
    }

    impl EventSink<MicrosInstant> for Counter {
        fn on_strike(&mut self, _: &StrikeEvent, _: MicrosInstant) {
            self.strikes += 1;
        }

        fn on_peaks(&mut self, _: &[PeakRecord], _: MicrosInstant) {
            self.windows += 1;
        }
    }

    #[test]
    fn onset_measures_interval_since_previous_onset() {
        let mut recorder = TelemetryRecorder::<MicrosInstant>::new();

        let first = recorder.record_strike(&strike(3, TriggerEdge::Onset, 2), MicrosInstant(100));
        assert_eq!(first, 0);
        let details = recorder.latest().copied().unwrap().details;
        assert_eq!(
            details,
            TelemetryPayload::Strike(StrikeTelemetry {
                value: 100,
                cycle: 2,
                elapsed: None,
            })
        );

        recorder.record_strike(&strike(3, TriggerEdge::Offset, 5), MicrosInstant(220));
        match recorder.latest().copied().unwrap().details {
            TelemetryPayload::Strike(details) => {
                assert_eq!(details.elapsed, Some(Duration::from_micros(120)));
            }
            TelemetryPayload::Peaks(_) => panic!("expected strike payload"),
        }

        recorder.record_strike(&strike(3, TriggerEdge::Onset, 9), MicrosInstant(600));
        match recorder.latest().copied().unwrap().details {
            TelemetryPayload::Strike(details) => {
                assert_eq!(details.elapsed, Some(Duration::from_micros(500)));
            }
            TelemetryPayload::Peaks(_) => panic!("expected strike payload"),
        }

        assert_eq!(recorder.strike_count(ChannelId::new(3)), 2);
        assert_eq!(recorder.strike_count(ChannelId::new(4)), 0);
        assert_eq!(recorder.total_strikes(), 2);
    }

    #[test]
    fn ring_keeps_most_recent_entries() {
        let mut recorder = TelemetryRecorder::<MicrosInstant, 2>::new();
        for cycle in 0..3 {
            recorder.record_strike(&strike(0, TriggerEdge::Onset, cycle), MicrosInstant(cycle));
        }

        assert_eq!(recorder.len(), 2);
        let ids: heapless::Vec<EventId, 2> = recorder.oldest_first().map(|record| record.id).collect();
        assert_eq!(ids.as_slice(), &[1, 2]);
    }

    #[test]
    fn peak_summary_reports_loudest_channel() {
        let peaks = [
            PeakRecord {
                channel: ChannelId::new(0),
                max_value: 0,
            },
            PeakRecord {
                channel: ChannelId::new(1),
                max_value: 512,
            },
            PeakRecord {
                channel: ChannelId::new(2),
                max_value: 90,
            },
        ];
        let summary = PeakTelemetry::summarize(&peaks);
        assert_eq!(summary.active_channels, 2);
        assert_eq!(summary.loudest, Some(peaks[1]));

        assert_eq!(
            PeakTelemetry::summarize(&peaks[..1]),
            PeakTelemetry {
                active_channels: 0,
                loudest: None,
            }
        );
    }

    #[test]
    fn tuple_sink_forwards_to_both() {
        let mut sinks = (Counter::default(), TelemetryRecorder::<MicrosInstant>::new());
        sinks.on_strike(&strike(1, TriggerEdge::Onset, 0), MicrosInstant(0));
        sinks.on_peaks(&[], MicrosInstant(10));

        assert_eq!(sinks.0.strikes, 1);
        assert_eq!(sinks.0.windows, 1);
        assert_eq!(sinks.1.len(), 2);
        assert_eq!(
            sinks.1.latest().map(|record| record.event),
            Some(TelemetryEventKind::PeakWindowClosed)
        );
    }
}
