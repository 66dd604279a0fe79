//! Channel identities and routing metadata shared by firmware and host targets.
//!
//! A channel is one piezo sensor. It is either wired straight to a sampling
//! pin or routed through the 16-way analog multiplexer that shares a single
//! sampling pin. Channel definitions are immutable once the scan loop is built.

use core::fmt;

use crate::config::{ConfigError, TriggerConfig};

pub mod calibration;
pub mod xylophone;

pub use calibration::CALIBRATION_CHANNELS;
pub use xylophone::XYLOPHONE_CHANNELS;

/// Number of select lines driven by the multiplexer address.
pub const MUX_SELECT_LINES: usize = 4;
/// Number of inputs reachable through the multiplexer.
pub const MUX_CHANNELS: u8 = 1 << MUX_SELECT_LINES;
/// Default capacity of per-channel state tables; holds the full calibration
/// harness.
pub const MAX_CHANNELS: usize = 40;

/// Logical identity of a sensor channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ChannelId(u8);

impl ChannelId {
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Deterministic index for lookups into per-channel tables.
    #[must_use]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Index into the board's bank of directly wired sampling pins.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PinId(u8);

impl PinId {
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }
}

/// Multiplexer input selected by the four address lines.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct MuxCode(u8);

impl MuxCode {
    /// Validates a raw multiplexer code.
    pub const fn new(code: u8) -> Result<Self, ConfigError> {
        if code < MUX_CHANNELS {
            Ok(Self(code))
        } else {
            Err(ConfigError::MuxCodeOutOfRange { code })
        }
    }

    /// Builds a code for a compile-time table, failing the build when out of range.
    #[must_use]
    pub const fn expect_valid(code: u8) -> Self {
        match Self::new(code) {
            Ok(code) => code,
            Err(_) => panic!("multiplexer code out of range"),
        }
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

/// How a channel reaches the sampling device.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AddressingMode {
    Direct(PinId),
    Multiplexed(MuxCode),
}

impl AddressingMode {
    #[must_use]
    pub const fn is_multiplexed(self) -> bool {
        matches!(self, AddressingMode::Multiplexed(_))
    }
}

/// Which detectors consume a channel's readings.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChannelRole {
    /// Strike detection only.
    Trigger,
    /// Peak-hold diagnostics only.
    Peak,
    /// Both detectors see every reading.
    TriggerAndPeak,
}

impl ChannelRole {
    #[must_use]
    pub const fn triggers(self) -> bool {
        matches!(self, ChannelRole::Trigger | ChannelRole::TriggerAndPeak)
    }

    #[must_use]
    pub const fn tracks_peaks(self) -> bool {
        matches!(self, ChannelRole::Peak | ChannelRole::TriggerAndPeak)
    }
}

/// Immutable description of one sensor channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChannelConfig {
    pub id: ChannelId,
    /// Short label used on diagnostic rows, e.g. `D3` or `A12`.
    pub label: &'static str,
    pub addressing: AddressingMode,
    pub role: ChannelRole,
    pub trigger: TriggerConfig,
}

impl ChannelConfig {
    #[must_use]
    pub const fn new(
        id: ChannelId,
        label: &'static str,
        addressing: AddressingMode,
        role: ChannelRole,
        trigger: TriggerConfig,
    ) -> Self {
        Self {
            id,
            label,
            addressing,
            role,
            trigger,
        }
    }

    /// Returns a copy with a different role.
    #[must_use]
    pub const fn with_role(mut self, role: ChannelRole) -> Self {
        self.role = role;
        self
    }

    /// Returns a copy with different hysteresis parameters.
    #[must_use]
    pub const fn with_trigger(mut self, trigger: TriggerConfig) -> Self {
        self.trigger = trigger;
        self
    }
}

/// Finds a channel definition by identity.
#[must_use]
pub fn channel_by_id(channels: &[ChannelConfig], id: ChannelId) -> Option<&ChannelConfig> {
    channels.iter().find(|channel| channel.id == id)
}
