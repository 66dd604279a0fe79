#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Fire-and-forget hand-off from the scan task to the diagnostics task.
//!
//! The scan loop must never block on a slow consumer, so the sink uses
//! `try_send` and counts what it had to drop.

use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};
use heapless::Vec;
use strike_core::channels::MAX_CHANNELS;
use strike_core::peaks::PeakRecord;
use strike_core::telemetry::{EventSink, StrikeEvent};

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;

use crate::clock::FirmwareInstant;
use crate::status;

/// Depth of the queue between the scan and diagnostics tasks.
pub const EVENT_QUEUE_DEPTH: usize = 16;

#[cfg(target_os = "none")]
type EventMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type EventMutex = NoopRawMutex;

/// Message carried across the queue.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScanEvent {
    Strike {
        event: StrikeEvent,
        at: FirmwareInstant,
    },
    PeakWindow {
        peaks: Vec<PeakRecord, MAX_CHANNELS>,
        at: FirmwareInstant,
    },
}

pub type EventQueue = Channel<EventMutex, ScanEvent, EVENT_QUEUE_DEPTH>;
pub type EventSender<'a> = Sender<'a, EventMutex, ScanEvent, EVENT_QUEUE_DEPTH>;
pub type EventReceiver<'a> = Receiver<'a, EventMutex, ScanEvent, EVENT_QUEUE_DEPTH>;

/// Scan-loop sink that forwards into the event queue.
pub struct QueueSink<'a> {
    sender: EventSender<'a>,
}

impl<'a> QueueSink<'a> {
    pub fn new(sender: EventSender<'a>) -> Self {
        Self { sender }
    }

    fn forward(&mut self, message: ScanEvent) {
        if let Err(TrySendError::Full(_)) = self.sender.try_send(message) {
            status::record_drop();
        }
    }
}

impl EventSink<FirmwareInstant> for QueueSink<'_> {
    fn on_strike(&mut self, event: &StrikeEvent, at: FirmwareInstant) {
        self.forward(ScanEvent::Strike { event: *event, at });
    }

    fn on_peaks(&mut self, peaks: &[PeakRecord], at: FirmwareInstant) {
        let peaks = peaks.iter().take(MAX_CHANNELS).copied().collect();
        self.forward(ScanEvent::PeakWindow { peaks, at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strike_core::channels::ChannelId;
    use strike_core::trigger::TriggerEdge;

    fn onset(channel: u8) -> StrikeEvent {
        StrikeEvent {
            channel: ChannelId::new(channel),
            edge: TriggerEdge::Onset,
            value: 200,
            cycle: 1,
        }
    }

    #[test]
    fn forwards_strikes_and_windows_in_order() {
        let queue = EventQueue::new();
        let mut sink = QueueSink::new(queue.sender());
        let at = FirmwareInstant::from_micros(40_000);

        sink.on_strike(&onset(4), at);
        sink.on_peaks(
            &[PeakRecord {
                channel: ChannelId::new(4),
                max_value: 700,
            }],
            at,
        );

        let receiver = queue.receiver();
        assert_eq!(
            receiver.try_receive().ok(),
            Some(ScanEvent::Strike {
                event: onset(4),
                at,
            })
        );
        match receiver.try_receive() {
            Ok(ScanEvent::PeakWindow { peaks, .. }) => {
                assert_eq!(peaks.len(), 1);
                assert_eq!(peaks[0].max_value, 700);
            }
            other => panic!("expected peak window, got {other:?}"),
        }
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let queue = EventQueue::new();
        let mut sink = QueueSink::new(queue.sender());
        let before = status::snapshot().dropped;

        for channel in 0..=EVENT_QUEUE_DEPTH {
            let channel = u8::try_from(channel).unwrap();
            sink.on_strike(&onset(channel), FirmwareInstant::from_micros(0));
        }

        assert_eq!(queue.len(), EVENT_QUEUE_DEPTH);
        assert!(status::snapshot().dropped > before);
    }
}
