// Contour generation: which chord degree (and which octave of it) each chord
// targets.
//
// The generator aims at an anchor pitch: the register midpoint for the first
// chord, then the top of the register while ascending or the bottom while
// descending. For every degree of the chord it takes the in-register
// transposition nearest the anchor and scores it as
// `distance + priority_index * 0.1`, so priority only breaks near-ties.
// Lowest score wins.
//
// Direction after each pick: within 2 semitones of the top turns downward,
// within 2 of the bottom turns upward, and anything in between flips the
// current direction. The result is a zigzag between the two anchors rather
// than a sweep that holds its course until it hits a boundary.

use crate::error::ScheduleError;
use bebop_theory::pitch::midi_to_pitch;
use bebop_theory::{ChordProfile, Register};
use serde::Serialize;

/// Degree preference used to break near-ties. Unlisted degrees rank after
/// all of these, alphabetically.
pub const DEGREE_PRIORITY: [&str; 11] = [
    "3", "5", "1", "7M", "♭7", "4", "6", "♭3", "♯5", "♭5", "♭♭7",
];

/// Score units added per step down the priority list.
const PRIORITY_STEP: f64 = 0.1;

/// Distances closer than this count as equal.
const EPSILON: f64 = 1e-3;

/// How close to a register edge a pick must be to force a turn.
const EDGE_SEMITONES: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn flipped(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

/// The harmonic target chosen for one chord window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContourTarget {
    pub degree: String,
    pub midi: u8,
    pub pitch: String,
}

/// Position of `degree` in `DEGREE_PRIORITY`, or its length when unlisted.
pub fn priority_index(degree: &str) -> usize {
    DEGREE_PRIORITY
        .iter()
        .position(|&d| d == degree)
        .unwrap_or(DEGREE_PRIORITY.len())
}

/// Every MIDI pitch in `register` with the given pitch class, ascending.
fn transpositions(register: &Register, pitch_class: i32) -> impl Iterator<Item = i32> + '_ {
    (register.low()..=register.high()).filter(move |m| m.rem_euclid(12) == pitch_class)
}

/// Stateful target chooser for one scheduling run.
#[derive(Debug, Clone)]
pub struct ContourGenerator {
    register: Register,
    last_midi: Option<u8>,
    direction: Direction,
}

impl ContourGenerator {
    pub fn new(register: Register) -> Self {
        ContourGenerator {
            register,
            last_midi: None,
            direction: Direction::Ascending,
        }
    }

    /// Build from the 0..1 register slider.
    pub fn from_slider(slider: f64) -> Self {
        Self::new(Register::from_slider(slider))
    }

    pub fn register(&self) -> Register {
        self.register
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn last_midi(&self) -> Option<u8> {
        self.last_midi
    }

    /// Pitch the next pick is pulled toward.
    fn anchor(&self) -> f64 {
        match (self.last_midi, self.direction) {
            (None, _) => self.register.midpoint(),
            (Some(_), Direction::Ascending) => self.register.high() as f64,
            (Some(_), Direction::Descending) => self.register.low() as f64,
        }
    }

    /// Choose the target for the next chord and advance the direction.
    pub fn next_target(
        &mut self,
        chord_symbol: &str,
        profile: &ChordProfile,
    ) -> Result<ContourTarget, ScheduleError> {
        let anchor = self.anchor();

        let mut degrees: Vec<(&str, i32)> = profile
            .targets
            .iter()
            .map(|(degree, spec)| (degree.as_str(), spec.semitones))
            .collect();
        degrees.sort_by(|a, b| {
            priority_index(a.0)
                .cmp(&priority_index(b.0))
                .then_with(|| a.0.cmp(b.0))
        });

        let mut best: Option<(f64, &str, i32)> = None;
        for (degree, semitones) in degrees {
            let pc = (profile.root_pc as i32 + semitones).rem_euclid(12);
            let Some(nearest) = nearest_to(transpositions(&self.register, pc), anchor) else {
                continue;
            };
            let score = (nearest as f64 - anchor).abs()
                + priority_index(degree) as f64 * PRIORITY_STEP;
            let better = match best {
                None => true,
                Some((best_score, _, _)) => score < best_score - EPSILON,
            };
            if better {
                best = Some((score, degree, nearest));
            }
        }

        let (_, degree, midi) =
            best.ok_or_else(|| ScheduleError::NoContourCandidate(chord_symbol.to_string()))?;
        let midi = self.register.wrap(midi);
        self.update_direction(midi);
        let midi = midi as u8;
        self.last_midi = Some(midi);

        Ok(ContourTarget {
            degree: degree.to_string(),
            midi,
            pitch: midi_to_pitch(midi as i32),
        })
    }

    fn update_direction(&mut self, midi: i32) {
        self.direction = if midi >= self.register.high() - EDGE_SEMITONES {
            Direction::Descending
        } else if midi <= self.register.low() + EDGE_SEMITONES {
            Direction::Ascending
        } else {
            self.direction.flipped()
        };
    }
}

/// The candidate closest to `anchor`; the first one wins within `EPSILON`.
fn nearest_to(candidates: impl Iterator<Item = i32>, anchor: f64) -> Option<i32> {
    let mut best: Option<(i32, f64)> = None;
    for candidate in candidates {
        let distance = (candidate as f64 - anchor).abs();
        let closer = match best {
            None => true,
            Some((_, best_distance)) => distance < best_distance - EPSILON,
        };
        if closer {
            best = Some((candidate, distance));
        }
    }
    best.map(|(candidate, _)| candidate)
}
