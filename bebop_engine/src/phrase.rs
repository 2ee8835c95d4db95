// The generated line: a time-ordered list of single notes on an eighth grid.
//
// Every note carries its role (`src`) so renderers can accent targets or
// label approaches. Times are absolute eighths from the top of the
// progression; durations are in eighths and are always 1 today, with swing
// and articulation left to whatever plays the line back.

use bebop_theory::pitch::midi_to_pitch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Eighths per 4/4 bar, for the text grid.
const BAR_EIGHTHS: i32 = 8;

/// Why a note is in the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteSource {
    /// Part of an approach figure leading into a target.
    Approach,
    /// The chord tone landing on an offbeat.
    Target,
    /// Parity filler in front of an approach figure; no harmonic label.
    Isolated,
    /// The single resolving note after the last target.
    Closure,
}

impl NoteSource {
    fn grid_char(self) -> char {
        match self {
            NoteSource::Approach => 'a',
            NoteSource::Target => 'T',
            NoteSource::Isolated => 'i',
            NoteSource::Closure => 'c',
        }
    }

    /// Which role wins a grid cell shared by several notes.
    fn display_rank(self) -> u8 {
        match self {
            NoteSource::Target => 3,
            NoteSource::Closure => 2,
            NoteSource::Approach => 1,
            NoteSource::Isolated => 0,
        }
    }
}

impl fmt::Display for NoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoteSource::Approach => "approach",
            NoteSource::Target => "target",
            NoteSource::Isolated => "isolated",
            NoteSource::Closure => "closure",
        };
        f.pad(name)
    }
}

/// One note of the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledNote {
    /// Onset in absolute eighths.
    pub t: i32,
    pub dur: u32,
    pub midi: u8,
    pub pitch: String,
    pub src: NoteSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
}

impl ScheduledNote {
    /// An eighth-note with its pitch name filled in and no labels.
    pub fn new(t: i32, midi: u8, src: NoteSource) -> Self {
        ScheduledNote {
            t,
            dur: 1,
            midi,
            pitch: midi_to_pitch(midi as i32),
            src,
            chord: None,
            degree: None,
        }
    }

    pub fn with_chord(mut self, chord: impl Into<String>) -> Self {
        self.chord = Some(chord.into());
        self
    }

    pub fn with_degree(mut self, degree: impl Into<String>) -> Self {
        self.degree = Some(degree.into());
        self
    }

    pub fn end(&self) -> i32 {
        self.t + self.dur as i32
    }
}

/// Pretty JSON for a line.
pub fn to_json(notes: &[ScheduledNote]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(notes)
}

/// Human-readable listing plus a one-line role grid (`|` every bar).
pub fn render_text(notes: &[ScheduledNote]) -> String {
    let mut out = String::new();
    out.push_str("   t  pitch  midi  role      chord     degree\n");
    for note in notes {
        out.push_str(&format!(
            "{:>4}  {:<5}  {:>4}  {:<8}  {:<8}  {}\n",
            note.t,
            note.pitch,
            note.midi,
            note.src,
            note.chord.as_deref().unwrap_or("-"),
            note.degree.as_deref().unwrap_or("-"),
        ));
    }

    let (Some(first), Some(last)) = (
        notes.iter().map(|n| n.t).min(),
        notes.iter().map(ScheduledNote::end).max(),
    ) else {
        return out;
    };
    let first = first.min(0);
    let mut cells: Vec<Option<NoteSource>> = vec![None; (last - first) as usize];
    for note in notes {
        let cell = &mut cells[(note.t - first) as usize];
        let replace = cell.is_none_or(|held| note.src.display_rank() > held.display_rank());
        if replace {
            *cell = Some(note.src);
        }
    }

    for (i, cell) in cells.iter().enumerate() {
        let beat = first + i as i32;
        if beat > first && beat.rem_euclid(BAR_EIGHTHS) == 0 {
            out.push('|');
        }
        out.push(cell.map_or('.', NoteSource::grid_char));
    }
    out.push('\n');
    out
}
