//! Simulated 25-bar sensor board.
//!
//! The four select lines write bits of one shared address register, exactly
//! like the GPIO pins feeding a 16:1 analog multiplexer. Reading the mux
//! signal samples whichever piezo that register currently selects.

use std::cell::Cell;
use std::rc::Rc;

use strike_core::addressing::{ChannelAddressing, SelectLine};
use strike_core::channels::xylophone::{DIRECT_BARS, MUX_BARS};
use strike_core::channels::{AddressingMode, MUX_SELECT_LINES};
use strike_core::config::ScanConfig;
use strike_core::sampler::{AnalogInput, AnalogReader, NoSettle, Sampler};

/// Envelope multiplier applied on every read after a strike.
pub const RING_DECAY: f32 = 0.55;
/// Relative height of the trough between two ringing crests.
pub const RING_DIP: f32 = 0.7;

/// Address register shared by the select lines and the multiplexer.
pub type AddressRegister = Rc<Cell<u8>>;

/// Sampler over the simulated board; settling is instantaneous.
pub type SimSampler = Sampler<ChannelAddressing<SimSelectLine>, SimBoard, NoSettle>;

/// One select line, driving bit `bit` of the address register.
pub struct SimSelectLine {
    register: AddressRegister,
    bit: u8,
}

impl SelectLine for SimSelectLine {
    fn set_level(&mut self, high: bool) {
        let mask = 1_u8 << self.bit;
        let current = self.register.get();
        self.register
            .set(if high { current | mask } else { current & !mask });
    }
}

/// Builds the four select lines, least significant bit first.
pub fn select_lines(register: &AddressRegister) -> [SimSelectLine; MUX_SELECT_LINES] {
    core::array::from_fn(|bit| SimSelectLine {
        register: Rc::clone(register),
        bit: u8::try_from(bit).unwrap_or(0),
    })
}

/// Rectified output of a struck piezo disc.
///
/// Each read advances the waveform by one scan cycle: the envelope decays by
/// [`RING_DECAY`] and odd reads land in a trough at [`RING_DIP`] of the crest.
#[derive(Copy, Clone, Debug, Default)]
pub struct Piezo {
    velocity: u16,
    age: Option<i32>,
}

impl Piezo {
    pub fn strike(&mut self, velocity: u16) {
        self.velocity = velocity;
        self.age = Some(0);
    }

    pub fn is_ringing(&self) -> bool {
        self.age.is_some()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn sample(&mut self) -> u16 {
        let Some(age) = self.age else {
            return 0;
        };

        let envelope = f32::from(self.velocity) * RING_DECAY.powi(age);
        let value = if age % 2 == 0 {
            envelope
        } else {
            envelope * RING_DIP
        };

        self.age = if value < 1.0 { None } else { Some(age + 1) };
        value.round().min(f32::from(u16::MAX)) as u16
    }
}

/// Piezo bank plus the multiplexer that fronts the upper sixteen bars.
pub struct SimBoard {
    register: AddressRegister,
    direct: [Piezo; DIRECT_BARS],
    muxed: [Piezo; MUX_BARS],
    conversions: u64,
}

impl SimBoard {
    pub fn new(register: AddressRegister) -> Self {
        Self {
            register,
            direct: [Piezo::default(); DIRECT_BARS],
            muxed: [Piezo::default(); MUX_BARS],
            conversions: 0,
        }
    }

    /// Excites the piezo wired at `addressing`. Returns `false` if nothing is
    /// wired there.
    pub fn strike(&mut self, addressing: AddressingMode, velocity: u16) -> bool {
        match self.piezo_mut(addressing) {
            Some(piezo) => {
                piezo.strike(velocity);
                true
            }
            None => false,
        }
    }

    pub fn ringing(&self) -> usize {
        self.direct
            .iter()
            .chain(self.muxed.iter())
            .filter(|piezo| piezo.is_ringing())
            .count()
    }

    /// Number of conversions performed so far.
    pub fn conversions(&self) -> u64 {
        self.conversions
    }

    /// Value currently latched in the address register.
    pub fn selected(&self) -> u8 {
        self.register.get()
    }

    fn piezo_mut(&mut self, addressing: AddressingMode) -> Option<&mut Piezo> {
        match addressing {
            AddressingMode::Direct(pin) => self.direct.get_mut(pin.as_index()),
            AddressingMode::Multiplexed(code) => self.muxed.get_mut(usize::from(code.raw())),
        }
    }
}

impl AnalogReader for SimBoard {
    fn read_raw(&mut self, input: AnalogInput) -> u16 {
        self.conversions += 1;
        match input {
            AnalogInput::Pin(pin) => self.direct.get_mut(pin.as_index()).map_or(0, Piezo::sample),
            AnalogInput::MuxSignal => {
                let selected = usize::from(self.register.get()) % MUX_BARS;
                self.muxed[selected].sample()
            }
        }
    }
}

/// Wires a fresh board to a sampler.
pub fn sampler(config: &ScanConfig) -> SimSampler {
    let register = AddressRegister::default();
    Sampler::new(
        ChannelAddressing::new(select_lines(&register)),
        SimBoard::new(register),
        NoSettle,
        config,
    )
}
