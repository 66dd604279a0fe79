//! Multiplexer channel addressing.
//!
//! The analog multiplexer exposes sixteen inputs on one shared sampling pin.
//! Four binary select lines pick the input; line `n` carries bit `n` of the
//! code, least-significant bit first.

use crate::channels::{MUX_SELECT_LINES, MuxCode};

/// One binary select line of the multiplexer address bus.
pub trait SelectLine {
    /// Drives the line high (`true`) or low (`false`).
    fn set_level(&mut self, high: bool);
}

/// Anything that can route a multiplexer code onto the shared analog bus.
pub trait MuxAddressing {
    fn set_address(&mut self, code: MuxCode);
}

impl<T> MuxAddressing for &mut T
where
    T: MuxAddressing + ?Sized,
{
    fn set_address(&mut self, code: MuxCode) {
        (**self).set_address(code);
    }
}

/// Line levels for `code`, ordered from select line 0 to select line 3.
#[must_use]
pub const fn select_levels(code: MuxCode) -> [bool; MUX_SELECT_LINES] {
    let raw = code.raw();
    [
        raw & 0b0001 != 0,
        raw & 0b0010 != 0,
        raw & 0b0100 != 0,
        raw & 0b1000 != 0,
    ]
}

/// Drives four select lines from a multiplexer code.
pub struct ChannelAddressing<L> {
    lines: [L; MUX_SELECT_LINES],
    current: Option<MuxCode>,
}

impl<L> ChannelAddressing<L>
where
    L: SelectLine,
{
    /// Wraps the select lines, ordered from least to most significant bit.
    #[must_use]
    pub const fn new(lines: [L; MUX_SELECT_LINES]) -> Self {
        Self {
            lines,
            current: None,
        }
    }

    /// Code most recently driven onto the bus, `None` before the first call.
    #[must_use]
    pub const fn current(&self) -> Option<MuxCode> {
        self.current
    }

    /// Returns the select lines for inspection.
    pub fn lines(&self) -> &[L; MUX_SELECT_LINES] {
        &self.lines
    }
}

impl<L> MuxAddressing for ChannelAddressing<L>
where
    L: SelectLine,
{
    fn set_address(&mut self, code: MuxCode) {
        for (line, high) in self.lines.iter_mut().zip(select_levels(code)) {
            line.set_level(high);
        }
        self.current = Some(code);
    }
}
