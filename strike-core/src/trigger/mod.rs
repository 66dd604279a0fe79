//! Per-channel strike detection.
//!
//! A piezo strike rings: the signal decays through several oscillations that
//! would re-cross a single threshold many times. The state machine uses two
//! thresholds plus a run of consecutive quiet samples, so each strike yields
//! exactly one onset and one offset.
//!
//! Rules, evaluated in order for every sample:
//!
//! 1. `Idle`, `value > trigger` and `low_count >= required`: emit
//!    [`TriggerEdge::Onset`], enter `Triggered`, clear `low_count`.
//! 2. `value <= reset`: bump `low_count` (saturating at `required`). A
//!    `Triggered` channel whose count reaches `required` emits
//!    [`TriggerEdge::Offset`] and returns to `Idle`.
//! 3. Anything else clears `low_count`.

use core::fmt;

use crate::config::TriggerConfig;

/// Detector state for one channel.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum TriggerState {
    #[default]
    Idle,
    Triggered,
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerState::Idle => f.write_str("idle"),
            TriggerState::Triggered => f.write_str("triggered"),
        }
    }
}

/// Discrete edge emitted by the detector.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TriggerEdge {
    /// Strike started.
    Onset,
    /// Strike ended and the channel is quiet again.
    Offset,
}

impl fmt::Display for TriggerEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerEdge::Onset => f.write_str("onset"),
            TriggerEdge::Offset => f.write_str("offset"),
        }
    }
}

/// Hysteresis state machine for one channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TriggerStateMachine {
    config: TriggerConfig,
    state: TriggerState,
    low_count: u16,
}

impl TriggerStateMachine {
    /// Starts `Idle` with an empty quiet run, so a fresh channel must see
    /// `low_count_required` quiet samples before its first onset.
    #[must_use]
    pub const fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            state: TriggerState::Idle,
            low_count: 0,
        }
    }

    /// Feeds one sample and returns the edge it produced, if any.
    pub fn update(&mut self, value: u16) -> Option<TriggerEdge> {
        let required = self.config.low_count_required;

        if self.state == TriggerState::Idle
            && value > self.config.trigger_threshold
            && self.low_count >= required
        {
            self.state = TriggerState::Triggered;
            self.low_count = 0;
            return Some(TriggerEdge::Onset);
        }

        if value <= self.config.reset_threshold {
            self.low_count = self.low_count.saturating_add(1).min(required);
            if self.state == TriggerState::Triggered && self.low_count >= required {
                self.state = TriggerState::Idle;
                return Some(TriggerEdge::Offset);
            }
            return None;
        }

        self.low_count = 0;
        None
    }

    #[must_use]
    pub const fn state(&self) -> TriggerState {
        self.state
    }

    #[must_use]
    pub const fn low_count(&self) -> u16 {
        self.low_count
    }

    #[must_use]
    pub const fn config(&self) -> &TriggerConfig {
        &self.config
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.state == TriggerState::Triggered
    }
}
