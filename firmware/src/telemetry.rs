#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Logging helpers for scan output.
//!
//! Lines follow a `scope:topic key=value` shape. On the MCU they go out over
//! defmt; host builds print them so unit tests exercise the same formatting
//! paths.

use strike_core::channels::{ChannelId, XYLOPHONE_CHANNELS, channel_by_id};
use strike_core::keymap::{XYLOPHONE_KEYMAP, binding_for};
use strike_core::peaks::PeakRecord;
use strike_core::scan::ChannelStatus;
use strike_core::telemetry::StrikeEvent;
use strike_core::trigger::{TriggerEdge, TriggerState};

use crate::clock::FirmwareInstant;
use crate::status::ScanStats;

/// Short label of a board channel, `?` for unknown identities.
#[must_use]
pub fn channel_label(channel: ChannelId) -> &'static str {
    channel_by_id(&XYLOPHONE_CHANNELS, channel).map_or("?", |config| config.label)
}

/// Key bound to a board channel, space when unbound.
#[must_use]
pub fn channel_key(channel: ChannelId) -> char {
    binding_for(&XYLOPHONE_KEYMAP, channel).map_or(' ', |binding| binding.key)
}

const fn edge_label(edge: TriggerEdge) -> &'static str {
    match edge {
        TriggerEdge::Onset => "onset",
        TriggerEdge::Offset => "offset",
    }
}

pub fn log_strike(event: &StrikeEvent, at: FirmwareInstant) {
    emit_strike(
        edge_label(event.edge),
        channel_label(event.channel),
        channel_key(event.channel),
        event.value,
        event.cycle,
        at.as_micros(),
    );
}

pub fn log_peaks(peaks: &[PeakRecord], at: FirmwareInstant) {
    emit_window(at.as_micros(), peaks.len());
    for record in peaks {
        emit_peak(channel_label(record.channel), record.max_value);
    }
}

/// Logs a channel that is still ringing when its peak window closes.
pub fn log_held(status: &ChannelStatus) {
    if status.state != Some(TriggerState::Triggered) {
        return;
    }
    emit_held(
        status.label,
        channel_key(status.channel),
        status.low_count,
        status.last_value.unwrap_or(0),
    );
}

pub fn log_stats(stats: &ScanStats) {
    emit_stats(stats.cycles, stats.onsets, stats.windows, stats.dropped);
}

#[cfg(target_os = "none")]
fn emit_strike(edge: &'static str, label: &'static str, key: char, value: u16, cycle: u64, t: u64) {
    defmt::info!(
        "scan:{} {} key={} value={} cycle={} t={}us",
        edge,
        label,
        key,
        value,
        cycle,
        t
    );
}

#[cfg(not(target_os = "none"))]
fn emit_strike(edge: &'static str, label: &'static str, key: char, value: u16, cycle: u64, t: u64) {
    println!("scan:{edge} {label} key={key} value={value} cycle={cycle} t={t}us");
}

#[cfg(target_os = "none")]
fn emit_window(t: u64, channels: usize) {
    defmt::info!("scan:peaks t={}us channels={}", t, channels);
}

#[cfg(not(target_os = "none"))]
fn emit_window(t: u64, channels: usize) {
    println!("scan:peaks t={t}us channels={channels}");
}

#[cfg(target_os = "none")]
fn emit_peak(label: &'static str, peak: u16) {
    defmt::info!("{}:\t{}", label, peak);
}

#[cfg(not(target_os = "none"))]
fn emit_peak(label: &'static str, peak: u16) {
    println!("{label}:\t{peak}");
}

#[cfg(target_os = "none")]
fn emit_held(label: &'static str, key: char, low_count: u16, last: u16) {
    defmt::debug!("scan:held {} key={} low={} last={}", label, key, low_count, last);
}

#[cfg(not(target_os = "none"))]
fn emit_held(label: &'static str, key: char, low_count: u16, last: u16) {
    println!("scan:held {label} key={key} low={low_count} last={last}");
}

#[cfg(target_os = "none")]
fn emit_stats(cycles: u32, onsets: u32, windows: u32, dropped: u32) {
    if dropped > 0 {
        defmt::warn!(
            "scan:stats cycles={} onsets={} windows={} dropped={}",
            cycles,
            onsets,
            windows,
            dropped
        );
    } else {
        defmt::info!(
            "scan:stats cycles={} onsets={} windows={}",
            cycles,
            onsets,
            windows
        );
    }
}

#[cfg(not(target_os = "none"))]
fn emit_stats(cycles: u32, onsets: u32, windows: u32, dropped: u32) {
    println!("scan:stats cycles={cycles} onsets={onsets} windows={windows} dropped={dropped}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_board_catalog() {
        assert_eq!(channel_label(ChannelId::new(0)), "D0");
        assert_eq!(channel_label(ChannelId::new(24)), "A15");
        assert_eq!(channel_label(ChannelId::new(31)), "?");
        assert_eq!(channel_key(ChannelId::new(0)), 'z');
        assert_eq!(channel_key(ChannelId::new(31)), ' ');
    }

    #[test]
    fn log_helpers_accept_board_events() {
        let at = FirmwareInstant::from_micros(1_000_000);
        log_strike(
            &StrikeEvent {
                channel: ChannelId::new(12),
                edge: TriggerEdge::Onset,
                value: 612,
                cycle: 88,
            },
            at,
        );
        log_peaks(
            &[PeakRecord {
                channel: ChannelId::new(12),
                max_value: 612,
            }],
            at,
        );
        log_stats(&ScanStats::default());
        log_held(&ChannelStatus {
            channel: ChannelId::new(3),
            label: "D3",
            state: Some(TriggerState::Triggered),
            low_count: 1,
            last_value: Some(24),
            peak: Some(640),
        });
    }
}
