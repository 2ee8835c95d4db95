// Bebop theory crate: the harmonic knowledge the line scheduler consults.
//
// Architecture:
// - `pitch.rs`: degree labels, pitch classes, pitch names, `Register` wrapping
// - `chord.rs`: chord-symbol parsing and the quality -> target-degree table
// - `formula.rs`: `FormulaType` and the grouped approach-formula catalog
// - `progression.rs`: `| Dm9 G13 | C∆ |` text into `ChordWindow`s
// - `error.rs`: `TheoryError`
// - `lib.rs` (this file): `TheoryStore`, bundling dictionary and catalog
//
// Both tables are JSON (`data/`), parsed with `from_json()`; the defaults are
// embedded with `include_str!`. Nothing here is random and nothing is
// mutable after load, so one store can serve any number of scheduling runs.

pub mod chord;
pub mod error;
pub mod formula;
pub mod pitch;
pub mod progression;

pub use chord::{ChordDictionary, ChordProfile, TargetSpec};
pub use error::TheoryError;
pub use formula::{FormulaCatalog, FormulaGroups, FormulaType};
pub use pitch::Register;
pub use progression::{ChordWindow, parse_progression};

/// Chord dictionary and formula catalog, loaded together.
#[derive(Debug, Clone)]
pub struct TheoryStore {
    chords: ChordDictionary,
    formulas: FormulaCatalog,
}

impl TheoryStore {
    pub fn new(chords: ChordDictionary, formulas: FormulaCatalog) -> Self {
        TheoryStore { chords, formulas }
    }

    /// Parse both tables from JSON strings.
    pub fn from_json(chords_json: &str, formulas_json: &str) -> Result<Self, TheoryError> {
        Ok(TheoryStore {
            chords: ChordDictionary::from_json(chords_json)?,
            formulas: FormulaCatalog::from_json(formulas_json)?,
        })
    }

    /// Profile for a chord symbol; `UnknownChord` if the quality is not known.
    pub fn chord_profile(&self, symbol: &str) -> Result<ChordProfile, TheoryError> {
        self.chords.profile(symbol)
    }

    /// The grouped catalog for one formula type.
    pub fn formulas(&self, formula_type: FormulaType) -> &FormulaGroups {
        self.formulas.groups(formula_type)
    }

    pub fn dictionary(&self) -> &ChordDictionary {
        &self.chords
    }
}

/// Load the store embedded at compile time.
///
/// Panics if the embedded JSON is malformed, which the tests below rule out.
pub fn default_store() -> TheoryStore {
    let chords = include_str!("../data/chord_qualities.json");
    let formulas = include_str!("../data/formulas.json");
    TheoryStore::from_json(chords, formulas).expect("embedded theory data is valid")
}
