//! Startup configuration for the scan loop.
//!
//! Everything here is fixed before the first scan cycle. Validation happens
//! once, when the [`ScanLoop`](crate::scan::ScanLoop) is built, and any
//! violation is reported as a [`ConfigError`] so firmware can fail fast.

use core::{fmt, time::Duration};

use crate::channels::ChannelId;

/// Full-scale reading of a 10-bit converter.
pub const DEFAULT_MAX_SAMPLE: u16 = 1_023;
/// Length of one peak-hold window.
pub const DEFAULT_PEAK_WINDOW: Duration = Duration::from_millis(1_000);
/// Busy-wait after a multiplexer address change before sampling the shared pin.
pub const DEFAULT_MUX_SETTLE: Duration = Duration::from_micros(100);
/// Sleep between two full scan passes.
pub const DEFAULT_CYCLE_DELAY: Duration = Duration::from_millis(40);

/// Reading that must be exceeded to register a strike.
pub const DEFAULT_TRIGGER_THRESHOLD: u16 = 50;
/// Reading at or below which a sample counts as quiet.
pub const DEFAULT_RESET_THRESHOLD: u16 = 30;
/// Consecutive quiet samples needed before a channel may re-arm.
pub const DEFAULT_LOW_COUNT_REQUIRED: u16 = 2;

/// Hysteresis parameters for one channel's trigger state machine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TriggerConfig {
    pub trigger_threshold: u16,
    pub reset_threshold: u16,
    pub low_count_required: u16,
}

impl TriggerConfig {
    #[must_use]
    pub const fn new(trigger_threshold: u16, reset_threshold: u16, low_count_required: u16) -> Self {
        Self {
            trigger_threshold,
            reset_threshold,
            low_count_required,
        }
    }

    /// Plain two-threshold hysteresis without the consecutive-sample gate.
    #[must_use]
    pub const fn hysteresis_only(trigger_threshold: u16, reset_threshold: u16) -> Self {
        Self::new(trigger_threshold, reset_threshold, 0)
    }

    /// Checks the thresholds against each other and the converter range.
    pub fn validate(&self, channel: ChannelId, max_sample: u16) -> Result<(), ConfigError> {
        if self.trigger_threshold <= self.reset_threshold {
            return Err(ConfigError::ThresholdsInverted {
                channel,
                trigger: self.trigger_threshold,
                reset: self.reset_threshold,
            });
        }
        if self.trigger_threshold >= max_sample {
            return Err(ConfigError::TriggerUnreachable {
                channel,
                trigger: self.trigger_threshold,
                max_sample,
            });
        }
        Ok(())
    }
}

/// Thresholds shared by every bar of the stock catalogs.
pub const DEFAULT_TRIGGER: TriggerConfig = TriggerConfig::new(
    DEFAULT_TRIGGER_THRESHOLD,
    DEFAULT_RESET_THRESHOLD,
    DEFAULT_LOW_COUNT_REQUIRED,
);

impl Default for TriggerConfig {
    fn default() -> Self {
        DEFAULT_TRIGGER
    }
}

/// Loop-wide timing and converter parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScanConfig {
    pub max_sample: u16,
    pub peak_window: Duration,
    pub mux_settle: Duration,
    pub cycle_delay: Duration,
}

impl ScanConfig {
    #[must_use]
    pub const fn new(
        max_sample: u16,
        peak_window: Duration,
        mux_settle: Duration,
        cycle_delay: Duration,
    ) -> Self {
        Self {
            max_sample,
            peak_window,
            mux_settle,
            cycle_delay,
        }
    }

    /// Overrides the peak window length.
    #[must_use]
    pub const fn with_peak_window(mut self, peak_window: Duration) -> Self {
        self.peak_window = peak_window;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peak_window.is_zero() {
            return Err(ConfigError::EmptyPeakWindow);
        }
        if self.max_sample == 0 {
            return Err(ConfigError::ZeroSampleRange);
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_SAMPLE,
            DEFAULT_PEAK_WINDOW,
            DEFAULT_MUX_SETTLE,
            DEFAULT_CYCLE_DELAY,
        )
    }
}

/// Startup configuration failures. None of these can occur once scanning runs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// Multiplexer code does not fit the four select lines.
    MuxCodeOutOfRange { code: u8 },
    /// Channel identity does not fit the per-channel state table.
    ChannelOutOfRange { channel: ChannelId, capacity: usize },
    /// The same channel identity was configured twice.
    DuplicateChannel(ChannelId),
    /// More channels than the state table can hold.
    TooManyChannels { capacity: usize },
    /// `trigger <= reset`, so hysteresis has no dead zone.
    ThresholdsInverted {
        channel: ChannelId,
        trigger: u16,
        reset: u16,
    },
    /// The trigger threshold can never be exceeded by a reading.
    TriggerUnreachable {
        channel: ChannelId,
        trigger: u16,
        max_sample: u16,
    },
    /// The peak window has zero length.
    EmptyPeakWindow,
    /// The converter range is empty.
    ZeroSampleRange,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MuxCodeOutOfRange { code } => {
                write!(f, "multiplexer code {code} is outside 0..=15")
            }
            ConfigError::ChannelOutOfRange { channel, capacity } => {
                write!(f, "{channel} does not fit a table of {capacity} channels")
            }
            ConfigError::DuplicateChannel(channel) => write!(f, "{channel} configured twice"),
            ConfigError::TooManyChannels { capacity } => {
                write!(f, "more than {capacity} channels configured")
            }
            ConfigError::ThresholdsInverted {
                channel,
                trigger,
                reset,
            } => write!(
                f,
                "{channel}: trigger threshold {trigger} must exceed reset threshold {reset}"
            ),
            ConfigError::TriggerUnreachable {
                channel,
                trigger,
                max_sample,
            } => write!(
                f,
                "{channel}: trigger threshold {trigger} is not below full scale {max_sample}"
            ),
            ConfigError::EmptyPeakWindow => f.write_str("peak window must be non-zero"),
            ConfigError::ZeroSampleRange => f.write_str("maximum sample must be non-zero"),
        }
    }
}
