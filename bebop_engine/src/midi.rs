// MIDI output for generated lines.
//
// Writes a Standard MIDI File with a tempo track and one melody track. Note
// times are eighths on the line's grid; the earliest note is shifted to
// tick 0 if anything sits before the downbeat. Targets are played a little
// louder than their approach notes so the line's skeleton is audible.
//
// Uses the `midly` crate. Output is SMF Format 1 (tempo track + melody).

use crate::phrase::{NoteSource, ScheduledNote};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Ticks per eighth note (half a quarter note).
const TICKS_PER_EIGHTH: u32 = TICKS_PER_QUARTER as u32 / 2;

const CHANNEL: u8 = 0;

/// General MIDI tenor sax.
const PROGRAM: u8 = 66;

/// Slowest tempo whose microseconds-per-quarter fits the 24-bit meta field.
pub const MIN_TEMPO_BPM: u16 = 4;

fn velocity(src: NoteSource) -> u8 {
    match src {
        NoteSource::Target => 100,
        NoteSource::Closure => 90,
        NoteSource::Approach => 80,
        NoteSource::Isolated => 72,
    }
}

/// Convert a line to MIDI and write it to a file.
pub fn write_midi(notes: &[ScheduledNote], tempo_bpm: u16, path: &Path) -> std::io::Result<()> {
    let smf = notes_to_smf(notes, tempo_bpm);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    std::fs::write(path, &buf)
}

/// Build an in-memory SMF for a line. Tempos below `MIN_TEMPO_BPM` are
/// written as `MIN_TEMPO_BPM`.
pub fn notes_to_smf(notes: &[ScheduledNote], tempo_bpm: u16) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let tempo_microseconds = 60_000_000 / tempo_bpm.max(MIN_TEMPO_BPM) as u32;
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    smf.tracks.push(melody_track(notes));
    smf
}

/// A timed on/off event before delta encoding.
struct Timed {
    tick: u32,
    /// Offs sort before ons at the same tick so repeated pitches re-attack.
    is_on: bool,
    key: u8,
    vel: u8,
}

fn melody_track(notes: &[ScheduledNote]) -> Track<'static> {
    let channel = u4::new(CHANNEL);
    let mut track: Track<'static> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(b"Bebop line")),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(PROGRAM),
                },
            },
        },
    ];

    let origin = notes.iter().map(|n| n.t).min().unwrap_or(0).min(0);
    let mut events: Vec<Timed> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let start = (note.t - origin) as u32 * TICKS_PER_EIGHTH;
        let key = note.midi.min(127);
        events.push(Timed {
            tick: start,
            is_on: true,
            key,
            vel: velocity(note.src),
        });
        events.push(Timed {
            tick: start + note.dur * TICKS_PER_EIGHTH,
            is_on: false,
            key,
            vel: 0,
        });
    }
    events.sort_by_key(|e| (e.tick, e.is_on));

    let mut last_tick = 0;
    for event in events {
        let message = if event.is_on {
            MidiMessage::NoteOn {
                key: u7::new(event.key),
                vel: u7::new(event.vel),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(event.key),
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::new(event.tick - last_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = event.tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_ons(track: &Track<'_>) -> Vec<(u32, u8)> {
        let mut tick = 0;
        let mut out = Vec::new();
        for event in track {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, .. },
                ..
            } = event.kind
            {
                out.push((tick, key.as_int()));
            }
        }
        out
    }

    #[test]
    fn tempo_and_melody_tracks() {
        let notes = vec![
            ScheduledNote::new(0, 62, NoteSource::Approach),
            ScheduledNote::new(1, 64, NoteSource::Target),
        ];
        let smf = notes_to_smf(&notes, 120);
        assert_eq!(smf.tracks.len(), 2);
        assert_eq!(note_ons(&smf.tracks[1]), vec![(0, 62), (240, 64)]);
    }

    #[test]
    fn repeated_pitch_releases_before_reattack() {
        let notes = vec![
            ScheduledNote::new(0, 64, NoteSource::Isolated),
            ScheduledNote::new(1, 64, NoteSource::Approach),
        ];
        let smf = notes_to_smf(&notes, 120);
        let kinds: Vec<bool> = smf.tracks[1]
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi { message: MidiMessage::NoteOn { .. }, .. } => Some(true),
                TrackEventKind::Midi { message: MidiMessage::NoteOff { .. }, .. } => Some(false),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![true, false, true, false]);
    }

    #[test]
    fn early_notes_shift_to_zero() {
        let notes = vec![
            ScheduledNote::new(-2, 60, NoteSource::Approach),
            ScheduledNote::new(1, 64, NoteSource::Target),
        ];
        let smf = notes_to_smf(&notes, 120);
        assert_eq!(note_ons(&smf.tracks[1]), vec![(0, 60), (720, 64)]);
    }

    fn tempo(smf: &Smf<'_>) -> Option<u32> {
        smf.tracks[0].iter().find_map(|e| match e.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
            _ => None,
        })
    }

    #[test]
    fn tempo_meta_is_microseconds_per_quarter() {
        let notes = vec![ScheduledNote::new(1, 64, NoteSource::Target)];
        assert_eq!(tempo(&notes_to_smf(&notes, 120)), Some(500_000));
        assert_eq!(tempo(&notes_to_smf(&notes, 4)), Some(15_000_000));
    }

    #[test]
    fn very_slow_tempo_is_clamped_not_truncated() {
        let notes = vec![ScheduledNote::new(1, 64, NoteSource::Target)];
        let slowest = 60_000_000 / MIN_TEMPO_BPM as u32;
        assert!(slowest < 1 << 24);
        for bpm in [0, 1, 2, 3] {
            assert_eq!(tempo(&notes_to_smf(&notes, bpm)), Some(slowest), "bpm {bpm}");
        }
    }

    #[test]
    fn smf_serializes() {
        let notes = vec![ScheduledNote::new(1, 64, NoteSource::Target)];
        let mut buf = Vec::new();
        notes_to_smf(&notes, 200).write_std(&mut buf).unwrap();
        assert_eq!(&buf[..4], b"MThd");
    }
}
