// Bebop line engine
//
// Turns a chord progression into a "bebop targeting" line: every chord gets
// a chord tone landing on an offbeat, approached by a short chromatic or
// diatonic figure that may start inside the previous chord, and the phrase
// ends with one resolving closure note.
//
// Architecture:
// - rhythm.rs: legal landing offsets, approach start, parity (isolated) note
// - formula.rs: `FormulaPolicy` weighting and the stateful `FormulaSelector`
// - contour.rs: `ContourGenerator`, the register-bounded zigzag of targets
// - scheduler.rs: per-window orchestration, fit-shrinking, closure synthesis
// - phrase.rs: `ScheduledNote` (the output) plus text/JSON rendering
// - midi.rs: MIDI file output via `midly`
// - config.rs: `GenerationConfig` loaded from JSON
// - error.rs: `ScheduleError`
//
// Chord theory, formula catalogs and progression parsing live in
// `bebop_theory`; randomness comes only from `bebop_prng::LineRng`.
//
// The generator is deterministic: the same seed, progression and slider give
// byte-identical output.

pub mod config;
pub mod contour;
pub mod error;
pub mod formula;
pub mod midi;
pub mod phrase;
pub mod rhythm;
pub mod scheduler;

pub use config::GenerationConfig;
pub use error::ScheduleError;
pub use phrase::{NoteSource, ScheduledNote};
pub use scheduler::{ScheduleOptions, schedule_progression};

use bebop_prng::LineRng;
use bebop_theory::{TheoryStore, parse_progression};

/// Parse `progression` and schedule it with a fresh RNG seeded from `config`.
pub fn generate_line(
    progression: &str,
    store: &TheoryStore,
    config: &GenerationConfig,
) -> Result<Vec<ScheduledNote>, ScheduleError> {
    let windows = parse_progression(progression)?;
    let mut rng = LineRng::new(config.seed);
    schedule_progression(&windows, store, &mut rng, &config.schedule_options())
}
