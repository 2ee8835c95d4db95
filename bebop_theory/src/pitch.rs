// Pitch arithmetic: degree labels, pitch names, and register wrapping.
//
// MIDI numbers are carried as `i32` while they are being computed (approach
// offsets can push them below zero before wrapping) and only narrowed once
// they have been wrapped into a register.

use crate::error::TheoryError;
use serde::{Deserialize, Serialize};

/// Pitch-class spellings used for output names. Flats for the black keys
/// except C# and F#, which read better in jazz charts.
const PC_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// Semitones above the chord root for every degree label the chord
/// dictionary may use.
const DEGREE_SEMITONES: &[(&str, i32)] = &[
    ("1", 0),
    ("♭2", 1),
    ("2", 2),
    ("♭3", 3),
    ("3", 4),
    ("4", 5),
    ("♯4", 6),
    ("♭5", 6),
    ("5", 7),
    ("♯5", 8),
    ("6", 9),
    ("♭♭7", 9),
    ("♭7", 10),
    ("7M", 11),
];

/// Rewrite ASCII accidentals (`b`, `#`) into the `♭`/`♯` forms used as keys.
pub fn normalize_degree(label: &str) -> String {
    label.replace('b', "♭").replace('#', "♯")
}

/// Semitone offset of a degree label above the root, or `None` if unknown.
pub fn degree_semitones(label: &str) -> Option<i32> {
    let label = normalize_degree(label);
    DEGREE_SEMITONES
        .iter()
        .find(|(name, _)| *name == label)
        .map(|&(_, semis)| semis)
}

/// Pitch class (0 = C) of a root spelling such as `F#`, `Bb`, `E♭`.
pub fn pitch_class(root: &str) -> Option<u8> {
    let mut chars = root.chars();
    let base: i32 = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let mut shift = 0;
    for c in chars {
        match c {
            '#' | '♯' => shift += 1,
            'b' | '♭' => shift -= 1,
            _ => return None,
        }
    }
    Some((base + shift).rem_euclid(12) as u8)
}

/// Scientific pitch name, with middle C (60) as `C4`.
pub fn midi_to_pitch(midi: i32) -> String {
    let pc = midi.rem_euclid(12) as usize;
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", PC_NAMES[pc], octave)
}

/// Shift `midi` by octaves until it lies in `[min, max]`, then hard-clamp.
///
/// The clamp only matters for registers narrower than an octave, where an
/// octave shift can jump over the whole band.
pub fn wrap_midi_to_range(midi: i32, min: i32, max: i32) -> i32 {
    let mut m = midi;
    while m < min {
        m += 12;
    }
    while m > max {
        m -= 12;
    }
    m.clamp(min, max)
}

/// An inclusive MIDI register `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    low: i32,
    high: i32,
}

impl Register {
    /// The fixed output register every realized note is wrapped into.
    pub const FIXED: Register = Register { low: 60, high: 84 };

    /// Slider steps map to at most this many semitones of padding per side.
    const SLIDER_PADDING: f64 = 8.0;

    pub fn new(low: i32, high: i32) -> Result<Self, TheoryError> {
        if low > high {
            return Err(TheoryError::InvalidRegister { low, high });
        }
        Ok(Register { low, high })
    }

    /// Narrow the fixed register symmetrically from a 0..1 slider.
    ///
    /// 0 keeps [60, 84]; 1 pads 8 semitones on each side, leaving [68, 76].
    /// Out-of-range sliders are clamped first.
    pub fn from_slider(slider: f64) -> Self {
        let slider = if slider.is_nan() { 0.0 } else { slider.clamp(0.0, 1.0) };
        let padding = (slider * Self::SLIDER_PADDING).round() as i32;
        let fixed = Self::FIXED;
        let low = (fixed.low + padding).min(fixed.high);
        let high = (fixed.high - padding).max(low);
        Register { low, high }
    }

    pub fn low(&self) -> i32 {
        self.low
    }

    pub fn high(&self) -> i32 {
        self.high
    }

    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) as f64 / 2.0
    }

    pub fn contains(&self, midi: i32) -> bool {
        (self.low..=self.high).contains(&midi)
    }

    pub fn wrap(&self, midi: i32) -> i32 {
        wrap_midi_to_range(midi, self.low, self.high)
    }
}
