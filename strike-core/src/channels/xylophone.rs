//! Channel catalog for the 25-bar xylophone board.
//!
//! Bars 0 through 8 are wired to dedicated converter pins (bank indices
//! `D0`..`D8`). Bars 9 through 24 share the multiplexer signal pin and are
//! selected with codes `A0`..`A15`. Scan order follows the catalog order.

use crate::config::DEFAULT_TRIGGER;

use super::{AddressingMode, ChannelConfig, ChannelId, ChannelRole, MuxCode, PinId};

/// Number of directly wired bars.
pub const DIRECT_BARS: usize = 9;
/// Number of bars behind the multiplexer.
pub const MUX_BARS: usize = 16;
/// Total number of bars on the board.
pub const XYLOPHONE_BARS: usize = DIRECT_BARS + MUX_BARS;

const FIRST_MUX_ID: u8 = 9;
const _: () = assert!(FIRST_MUX_ID as usize == DIRECT_BARS);

const fn direct(index: u8, label: &'static str) -> ChannelConfig {
    ChannelConfig::new(
        ChannelId::new(index),
        label,
        AddressingMode::Direct(PinId::new(index)),
        ChannelRole::TriggerAndPeak,
        DEFAULT_TRIGGER,
    )
}

const fn muxed(code: u8, label: &'static str) -> ChannelConfig {
    ChannelConfig::new(
        // Multiplexed bars follow the direct bank in channel numbering.
        ChannelId::new(FIRST_MUX_ID + code),
        label,
        AddressingMode::Multiplexed(MuxCode::expect_valid(code)),
        ChannelRole::TriggerAndPeak,
        DEFAULT_TRIGGER,
    )
}

/// Compile-time catalog of every bar, in scan order.
pub const XYLOPHONE_CHANNELS: [ChannelConfig; XYLOPHONE_BARS] = [
    direct(0, "D0"),
    direct(1, "D1"),
    direct(2, "D2"),
    direct(3, "D3"),
    direct(4, "D4"),
    direct(5, "D5"),
    direct(6, "D6"),
    direct(7, "D7"),
    direct(8, "D8"),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_follow_scan_order() {
        for (index, channel) in XYLOPHONE_CHANNELS.iter().enumerate() {
            assert_eq!(channel.id.as_index(), index);
        }
    }

    #[test]
    fn direct_bank_precedes_multiplexer() {
        let first_mux = &XYLOPHONE_CHANNELS[DIRECT_BARS];
        assert_eq!(first_mux.label, "A0");
        assert_eq!(
            first_mux.addressing,
            AddressingMode::Multiplexed(MuxCode::expect_valid(0))
        );

        let last_direct = &XYLOPHONE_CHANNELS[DIRECT_BARS - 1];
        assert_eq!(last_direct.addressing, AddressingMode::Direct(PinId::new(8)));

        let muxed_count = XYLOPHONE_CHANNELS
            .iter()
            .filter(|channel| channel.addressing.is_multiplexed())
            .count();
        assert_eq!(muxed_count, MUX_BARS);
    }
}
