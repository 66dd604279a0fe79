//! Peak-hold calibration catalog for the full 34-input sensor harness.
//!
//! Every input is peak-only; the pass reports per-sensor maxima once per
//! window so thresholds can be tuned by hand. Direct inputs are labelled by
//! board pin number and keep the harness wiring order. The shared
//! multiplexer inputs follow as `A0`..`A15`.

use super::xylophone::MUX_BARS;
use super::{AddressingMode, ChannelConfig, ChannelId, ChannelRole, MuxCode, PinId};
use crate::config::DEFAULT_TRIGGER;

/// Board pin numbers of the direct inputs, in scan order.
pub const CALIBRATION_DIRECT_PINS: [u8; CALIBRATION_DIRECT] = [
    25, 26, 27, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 38, 39, 40, 41,
];
/// Number of direct inputs on the harness.
pub const CALIBRATION_DIRECT: usize = 18;
/// Total number of harness inputs.
pub const CALIBRATION_INPUTS: usize = CALIBRATION_DIRECT + MUX_BARS;

const FIRST_MUX_ID: u8 = 18;
const _: () = assert!(FIRST_MUX_ID as usize == CALIBRATION_DIRECT);

const fn direct(index: u8, label: &'static str) -> ChannelConfig {
    ChannelConfig::new(
        ChannelId::new(index),
        label,
        AddressingMode::Direct(PinId::new(index)),
        ChannelRole::Peak,
        DEFAULT_TRIGGER,
    )
}

const fn muxed(code: u8, label: &'static str) -> ChannelConfig {
    ChannelConfig::new(
        ChannelId::new(FIRST_MUX_ID + code),
        label,
        AddressingMode::Multiplexed(MuxCode::expect_valid(code)),
        ChannelRole::Peak,
        DEFAULT_TRIGGER,
    )
}

/// Every harness input, direct bank first.
pub const CALIBRATION_CHANNELS: [ChannelConfig; CALIBRATION_INPUTS] = [
    direct(0, "D25"),
    direct(1, "D26"),
    direct(2, "D27"),
    direct(3, "D13"),
    direct(4, "D14"),
    direct(5, "D15"),
    direct(6, "D16"),
    direct(7, "D17"),
    direct(8, "D18"),
    direct(9, "D19"),
    direct(10, "D20"),
    direct(11, "D21"),
    direct(12, "D22"),
    direct(13, "D23"),
    direct(14, "D38"),
    direct(15, "D39"),
    direct(16, "D40"),
    direct(17, "D41"),
    muxed(0, "A0"),
    muxed(1, "A1"),
    muxed(2, "A2"),
    muxed(3, "A3"),
    muxed(4, "A4"),
    muxed(5, "A5"),
    muxed(6, "A6"),
    muxed(7, "A7"),
    muxed(8, "A8"),
    muxed(9, "A9"),
    muxed(10, "A10"),
    muxed(11, "A11"),
    muxed(12, "A12"),
    muxed(13, "A13"),
    muxed(14, "A14"),
    muxed(15, "A15"),
];
