#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared scan counters for the firmware target.
//!
//! Lightweight atomics let the diagnostics task report loop health without
//! touching the scan task's state.

use portable_atomic::{AtomicU32, Ordering};
use strike_core::scan::CycleReport;

static CYCLES: AtomicU32 = AtomicU32::new(0);
static ONSETS: AtomicU32 = AtomicU32::new(0);
static WINDOWS: AtomicU32 = AtomicU32::new(0);
/// Events discarded because the diagnostics queue was full.
static DROPPED: AtomicU32 = AtomicU32::new(0);

/// Copy of the counters at one point in time.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ScanStats {
    pub cycles: u32,
    pub onsets: u32,
    pub windows: u32,
    pub dropped: u32,
}

pub fn record_cycle(report: &CycleReport) {
    CYCLES.fetch_add(1, Ordering::Relaxed);
    if report.onsets > 0 {
        ONSETS.fetch_add(u32::from(report.onsets), Ordering::Relaxed);
    }
    if report.window_closed {
        WINDOWS.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_drop() {
    DROPPED.fetch_add(1, Ordering::Relaxed);
}

#[must_use]
pub fn snapshot() -> ScanStats {
    ScanStats {
        cycles: CYCLES.load(Ordering::Relaxed),
        onsets: ONSETS.load(Ordering::Relaxed),
        windows: WINDOWS.load(Ordering::Relaxed),
        dropped: DROPPED.load(Ordering::Relaxed),
    }
}
