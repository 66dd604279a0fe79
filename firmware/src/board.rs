#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Pin assignments for the STM32G0B1 sensor board.
//!
//! The direct bank lists the converter inputs in bar order, so
//! `DIRECT_BANK[pin.as_index()]` is the pin wired to that bar. The remaining
//! bars share `MUX_SIGNAL` through the 16-way multiplexer whose select lines
//! are `MUX_SELECT[0]` (bit 0) through `MUX_SELECT[3]` (bit 3).

use strike_core::channels::MUX_SELECT_LINES;
use strike_core::channels::xylophone::DIRECT_BARS;

/// Analog-capable pin and its ADC input number.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AnalogPin {
    pub name: &'static str,
    pub adc_input: u8,
}

impl AnalogPin {
    const fn new(name: &'static str, adc_input: u8) -> Self {
        Self { name, adc_input }
    }
}

/// Directly wired bars, indexed by `PinId`.
pub const DIRECT_BANK: [AnalogPin; DIRECT_BARS] = [
    AnalogPin::new("PA0", 0),
    AnalogPin::new("PA1", 1),
    AnalogPin::new("PA2", 2),
    AnalogPin::new("PA3", 3),
    AnalogPin::new("PA5", 5),
    AnalogPin::new("PA6", 6),
    AnalogPin::new("PA7", 7),
    AnalogPin::new("PB0", 8),
    AnalogPin::new("PB1", 9),
];

/// Shared multiplexer output.
pub const MUX_SIGNAL: AnalogPin = AnalogPin::new("PA4", 4);

/// Multiplexer select lines, least-significant bit first.
pub const MUX_SELECT: [&str; MUX_SELECT_LINES] = ["PB3", "PB4", "PB5", "PB6"];

/// Converter resolution the thresholds are calibrated for.
pub const ADC_BITS: u8 = 10;
