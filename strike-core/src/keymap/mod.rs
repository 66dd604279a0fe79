//! Bar-to-note and bar-to-key bindings for the 25-bar board.
//!
//! Bar `i` plays MIDI note `55 + i`, so the board spans G3 to G5. Each bar is
//! also bound to one keystroke on a tracker-style layout: the lower octave
//! sits on the `z` row with sharps on the `s` row, the upper notes on the
//! `q` row with sharps on the digit row.

use core::fmt;

use crate::channels::ChannelId;
use crate::channels::xylophone::XYLOPHONE_BARS;
use crate::peaks::PeakRecord;
use crate::telemetry::{EventSink, StrikeEvent};
use crate::trigger::TriggerEdge;

/// MIDI note played by bar 0.
pub const LOWEST_MIDI_NOTE: u8 = 55;

/// Keys bound to bars 0 through 24, in bar order.
pub const KEY_LAYOUT: &[u8; XYLOPHONE_BARS] = b"zsxdcvgbhnmjq2w3er5t6yu7i";

/// Pitch class within an octave.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NoteName {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

const PITCH_CLASSES: [NoteName; 12] = [
    NoteName::C,
    NoteName::CSharp,
    NoteName::D,
    NoteName::DSharp,
    NoteName::E,
    NoteName::F,
    NoteName::FSharp,
    NoteName::G,
    NoteName::GSharp,
    NoteName::A,
    NoteName::ASharp,
    NoteName::B,
];

impl NoteName {
    #[must_use]
    pub const fn from_midi(midi: u8) -> Self {
        PITCH_CLASSES[(midi % 12) as usize]
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
        }
    }

    #[must_use]
    pub const fn is_sharp(self) -> bool {
        matches!(
            self,
            NoteName::CSharp
                | NoteName::DSharp
                | NoteName::FSharp
                | NoteName::GSharp
                | NoteName::ASharp
        )
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Note and keystroke bound to one bar.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KeyBinding {
    pub channel: ChannelId,
    pub midi: u8,
    pub note: NoteName,
    pub key: char,
}

impl KeyBinding {
    /// Scientific-pitch octave number; MIDI 60 is C4.
    #[must_use]
    pub fn octave(&self) -> i8 {
        i8::try_from(self.midi / 12).unwrap_or(i8::MAX) - 1
    }

    #[must_use]
    pub fn frequency_hz(&self) -> f32 {
        note_frequency_hz(self.midi)
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.note, self.octave())
    }
}

const fn bind(bar: u8) -> KeyBinding {
    let midi = LOWEST_MIDI_NOTE + bar;
    KeyBinding {
        channel: ChannelId::new(bar),
        midi,
        note: NoteName::from_midi(midi),
        key: KEY_LAYOUT[bar as usize] as char,
    }
}

const fn build_keymap() -> [KeyBinding; XYLOPHONE_BARS] {
    let mut keymap = [bind(0); XYLOPHONE_BARS];
    let mut bar: u8 = 1;
    while (bar as usize) < XYLOPHONE_BARS {
        keymap[bar as usize] = bind(bar);
        bar += 1;
    }
    keymap
}

/// Bindings for every bar, indexed by channel.
pub const XYLOPHONE_KEYMAP: [KeyBinding; XYLOPHONE_BARS] = build_keymap();

/// Finds the binding for `channel`.
#[must_use]
pub fn binding_for(keymap: &[KeyBinding], channel: ChannelId) -> Option<&KeyBinding> {
    keymap.iter().find(|binding| binding.channel == channel)
}

/// Finds the binding that emits `key`.
#[must_use]
pub fn binding_for_key(keymap: &[KeyBinding], key: char) -> Option<&KeyBinding> {
    keymap.iter().find(|binding| binding.key == key)
}

/// `2^(k/12)` for `k` in `0..12`.
const SEMITONE_RATIOS: [f32; 12] = [
    1.0,
    1.059_463_1,
    1.122_462,
    1.189_207_1,
    1.259_921,
    1.334_839_9,
    1.414_213_5,
    1.498_307,
    1.587_401,
    1.681_792_8,
    1.781_797_4,
    1.887_748_6,
];

/// Equal-tempered frequency of a MIDI note, tuned to A4 = 440 Hz.
#[must_use]
pub fn note_frequency_hz(midi: u8) -> f32 {
    let offset = i32::from(midi) - 69;
    let octaves = offset.div_euclid(12);
    let semitone = usize::try_from(offset.rem_euclid(12)).unwrap_or(0);

    let mut frequency = 440.0 * SEMITONE_RATIOS[semitone];
    if octaves >= 0 {
        for _ in 0..octaves {
            frequency *= 2.0;
        }
    } else {
        for _ in octaves..0 {
            frequency *= 0.5;
        }
    }
    frequency
}

/// Keystroke emission service.
pub trait KeyEmitter {
    fn press(&mut self, key: char);
    fn release(&mut self, key: char);
}

/// Sink that turns strike edges into key presses and releases.
///
/// Onsets press the bar's key, offsets release it. Channels without a
/// binding and peak snapshots are ignored.
pub struct KeystrokeSink<E> {
    keymap: &'static [KeyBinding],
    emitter: E,
}

impl<E> KeystrokeSink<E>
where
    E: KeyEmitter,
{
    #[must_use]
    pub const fn new(keymap: &'static [KeyBinding], emitter: E) -> Self {
        Self { keymap, emitter }
    }

    /// Uses [`XYLOPHONE_KEYMAP`].
    #[must_use]
    pub const fn xylophone(emitter: E) -> Self {
        Self::new(&XYLOPHONE_KEYMAP, emitter)
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    pub fn emitter_mut(&mut self) -> &mut E {
        &mut self.emitter
    }
}

impl<TInstant, E> EventSink<TInstant> for KeystrokeSink<E>
where
    E: KeyEmitter,
{
    fn on_strike(&mut self, event: &StrikeEvent, _: TInstant) {
        let Some(binding) = binding_for(self.keymap, event.channel) else {
            return;
        };
        match event.edge {
            TriggerEdge::Onset => self.emitter.press(binding.key),
            TriggerEdge::Offset => self.emitter.release(binding.key),
        }
    }

    fn on_peaks(&mut self, _: &[PeakRecord], _: TInstant) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f32, expected: f32) -> bool {
        let error = actual - expected;
        error > -0.01 && error < 0.01
    }

    #[test]
    fn board_spans_g3_to_g5() {
        let first = XYLOPHONE_KEYMAP[0];
        let last = XYLOPHONE_KEYMAP[XYLOPHONE_BARS - 1];

        assert_eq!(first.midi, 55);
        assert_eq!(first.note, NoteName::G);
        assert_eq!(first.octave(), 3);
        assert_eq!(first.key, 'z');

        assert_eq!(last.midi, 79);
        assert_eq!(last.note, NoteName::G);
        assert_eq!(last.octave(), 5);
        assert_eq!(last.key, 'i');
    }

    #[test]
    fn sharps_sit_on_the_upper_row() {
        for binding in &XYLOPHONE_KEYMAP {
            let upper_row = binding.key.is_ascii_digit() || "sdghj".contains(binding.key);
            assert_eq!(binding.note.is_sharp(), upper_row, "{binding}");
        }
    }

    #[test]
    fn keys_are_unique() {
        for (index, binding) in XYLOPHONE_KEYMAP.iter().enumerate() {
            assert_eq!(
                binding_for_key(&XYLOPHONE_KEYMAP, binding.key).map(|found| found.channel),
                Some(ChannelId::new(u8::try_from(index).unwrap()))
            );
        }
    }

    #[test]
    fn frequencies_follow_equal_temperament() {
        assert!(close(note_frequency_hz(69), 440.0));
        assert!(close(note_frequency_hz(81), 880.0));
        assert!(close(note_frequency_hz(57), 220.0));
        assert!(close(note_frequency_hz(55), 196.0));
        assert!(close(note_frequency_hz(60), 261.63));
        assert!(close(XYLOPHONE_KEYMAP[24].frequency_hz(), 783.99));
    }

    #[test]
    fn octave_and_semitone_hold_at_the_midi_extremes() {
        let lowest = KeyBinding {
            midi: 0,
            ..XYLOPHONE_KEYMAP[0]
        };
        let highest = KeyBinding {
            midi: 127,
            ..XYLOPHONE_KEYMAP[0]
        };
        assert_eq!(lowest.octave(), -1);
        assert_eq!(highest.octave(), 9);
        assert!(close(note_frequency_hz(0), 8.18));
        assert!(close(note_frequency_hz(68), 415.30));
        assert_eq!(NoteName::from_midi(127), NoteName::G);
    }

    #[test]
    fn display_uses_scientific_pitch() {
        use core::fmt::Write;

        let mut text: heapless::String<8> = heapless::String::new();
        write!(text, "{} {}", XYLOPHONE_KEYMAP[0], XYLOPHONE_KEYMAP[6]).unwrap();
        assert_eq!(text.as_str(), "G3 C#4");
        assert_eq!(binding_for(&XYLOPHONE_KEYMAP, ChannelId::new(99)), None);
    }
}
