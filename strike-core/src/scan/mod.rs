//! The scan loop: one sequential pass over every channel per cycle.
//!
//! Channels are sampled strictly in configuration order. Each reading feeds
//! the channel's trigger state machine and the peak tracker, edges go to the
//! sink as soon as they happen, and the peak window is checked once after the
//! pass. The loop owns all per-channel state; nothing else writes to it.

use core::time::Duration;

use heapless::Vec;

use crate::addressing::MuxAddressing;
use crate::channels::{ChannelConfig, ChannelId, MAX_CHANNELS};
use crate::clock::{Clock, Pacer};
use crate::config::{ConfigError, ScanConfig};
use crate::peaks::PeakTracker;
use crate::sampler::{AnalogReader, Cycle, Sampler, SettleDelay};
use crate::telemetry::{EventSink, StrikeEvent, TelemetryInstant};
use crate::trigger::{TriggerEdge, TriggerState, TriggerStateMachine};

struct ChannelSlot {
    config: ChannelConfig,
    trigger: Option<TriggerStateMachine>,
    last_value: Option<u16>,
}

/// Outcome of one scan cycle.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CycleReport {
    pub cycle: Cycle,
    pub onsets: u16,
    pub offsets: u16,
    /// A peak window closed at the end of this cycle.
    pub window_closed: bool,
}

impl CycleReport {
    fn absorb(&mut self, other: &CycleReport) {
        self.cycle = other.cycle;
        self.onsets = self.onsets.saturating_add(other.onsets);
        self.offsets = self.offsets.saturating_add(other.offsets);
        self.window_closed |= other.window_closed;
    }
}

/// Point-in-time view of one channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChannelStatus {
    pub channel: ChannelId,
    pub label: &'static str,
    /// `None` for peak-only channels.
    pub state: Option<TriggerState>,
    pub low_count: u16,
    /// `None` until the channel has been sampled once.
    pub last_value: Option<u16>,
    /// `None` for trigger-only channels.
    pub peak: Option<u16>,
}

/// Owns the configured channels and their detector state.
pub struct ScanLoop<TInstant, const N: usize = MAX_CHANNELS> {
    config: ScanConfig,
    slots: Vec<ChannelSlot, N>,
    peaks: PeakTracker<TInstant, N>,
    cycle: Cycle,
}

impl<TInstant, const N: usize> ScanLoop<TInstant, N>
where
    TInstant: TelemetryInstant + Ord,
{
    /// Validates the configuration and builds idle detector state for every
    /// channel. The first peak window opens at `start`.
    pub fn new(
        config: ScanConfig,
        channels: &[ChannelConfig],
        start: TInstant,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if channels.len() > N {
            return Err(ConfigError::TooManyChannels { capacity: N });
        }

        let mut slots: Vec<ChannelSlot, N> = Vec::new();
        let mut peaks = PeakTracker::new(config.peak_window, start);

        for channel in channels {
            if channel.id.as_index() >= N {
                return Err(ConfigError::ChannelOutOfRange {
                    channel: channel.id,
                    capacity: N,
                });
            }
            if slots.iter().any(|slot| slot.config.id == channel.id) {
                return Err(ConfigError::DuplicateChannel(channel.id));
            }

            let trigger = if channel.role.triggers() {
                channel.trigger.validate(channel.id, config.max_sample)?;
                Some(TriggerStateMachine::new(channel.trigger))
            } else {
                None
            };
            if channel.role.tracks_peaks() {
                peaks.track(channel.id)?;
            }

            slots
                .push(ChannelSlot {
                    config: *channel,
                    trigger,
                    last_value: None,
                })
                .map_err(|_| ConfigError::TooManyChannels { capacity: N })?;
        }

        Ok(Self {
            config,
            slots,
            peaks,
            cycle: 0,
        })
    }

    /// Runs one full pass over every channel, then checks the peak window.
    ///
    /// The clock is read once, before the first sample; that instant stamps
    /// every edge of the cycle and drives the window check.
    pub fn scan_cycle<M, R, D, S, C>(
        &mut self,
        sampler: &mut Sampler<M, R, D>,
        sink: &mut S,
        clock: &mut C,
    ) -> CycleReport
    where
        M: MuxAddressing,
        R: AnalogReader,
        D: SettleDelay,
        S: EventSink<TInstant> + ?Sized,
        C: Clock<Instant = TInstant> + ?Sized,
    {
        let now = clock.now();
        let mut report = CycleReport {
            cycle: self.cycle,
            ..CycleReport::default()
        };

        for slot in &mut self.slots {
            let reading = sampler.read(&slot.config, self.cycle);
            slot.last_value = Some(reading.value);

            if slot.config.role.tracks_peaks() {
                self.peaks.observe(&reading);
            }

            let Some(trigger) = slot.trigger.as_mut() else {
                continue;
            };
            if let Some(edge) = trigger.update(reading.value) {
                match edge {
                    TriggerEdge::Onset => report.onsets = report.onsets.saturating_add(1),
                    TriggerEdge::Offset => report.offsets = report.offsets.saturating_add(1),
                }
                sink.on_strike(
                    &StrikeEvent {
                        channel: reading.channel,
                        edge,
                        value: reading.value,
                        cycle: reading.cycle,
                    },
                    now,
                );
            }
        }

        report.window_closed = self.peaks.tick(now, sink);
        self.cycle = self.cycle.wrapping_add(1);
        report
    }

    /// Runs `cycles` passes, pausing the configured delay after each one.
    pub fn run_cycles<M, R, D, S, C, P>(
        &mut self,
        cycles: u32,
        sampler: &mut Sampler<M, R, D>,
        sink: &mut S,
        clock: &mut C,
        pacer: &mut P,
    ) -> CycleReport
    where
        M: MuxAddressing,
        R: AnalogReader,
        D: SettleDelay,
        S: EventSink<TInstant> + ?Sized,
        C: Clock<Instant = TInstant> + ?Sized,
        P: Pacer + ?Sized,
    {
        let mut total = CycleReport {
            cycle: self.cycle,
            ..CycleReport::default()
        };
        for _ in 0..cycles {
            let report = self.scan_cycle(sampler, sink, clock);
            total.absorb(&report);
            pacer.pause(self.config.cycle_delay);
        }
        total
    }

    /// Scans forever. The pause after each pass is the only suspension point.
    pub fn run<M, R, D, S, C, P>(
        &mut self,
        sampler: &mut Sampler<M, R, D>,
        sink: &mut S,
        clock: &mut C,
        pacer: &mut P,
    ) -> !
    where
        M: MuxAddressing,
        R: AnalogReader,
        D: SettleDelay,
        S: EventSink<TInstant> + ?Sized,
        C: Clock<Instant = TInstant> + ?Sized,
        P: Pacer + ?Sized,
    {
        loop {
            self.scan_cycle(sampler, sink, clock);
            pacer.pause(self.config.cycle_delay);
        }
    }

    /// Per-channel view in scan order.
    pub fn channel_status(&self) -> impl Iterator<Item = ChannelStatus> + '_ {
        self.slots.iter().map(|slot| ChannelStatus {
            channel: slot.config.id,
            label: slot.config.label,
            state: slot.trigger.as_ref().map(TriggerStateMachine::state),
            low_count: slot
                .trigger
                .as_ref()
                .map_or(0, TriggerStateMachine::low_count),
            last_value: slot.last_value,
            peak: self.peaks.peak(slot.config.id),
        })
    }

    /// Configured channels in scan order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelConfig> + '_ {
        self.slots.iter().map(|slot| &slot.config)
    }

    /// Ordinal of the next cycle to run.
    #[must_use]
    pub const fn cycle(&self) -> Cycle {
        self.cycle
    }

    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    #[must_use]
    pub fn inter_cycle_delay(&self) -> Duration {
        self.config.cycle_delay
    }

    #[must_use]
    pub fn peaks(&self) -> &PeakTracker<TInstant, N> {
        &self.peaks
    }
}
