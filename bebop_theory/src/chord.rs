// Chord-theory dictionary: chord symbols to target-degree tables.
//
// Qualities are data (`data/chord_qualities.json`). Each quality names a
// canonical suffix, the aliases that spell it in lead sheets (`∆`, `m9`,
// `13`, `ø`, ...), and which degrees may be targeted over it together with
// the formula-type code each degree calls for. Type codes are kept raw here;
// turning them into `FormulaType` (and rejecting bad codes) is the formula
// selector's job, so a profile with an odd code still loads.
//
// Symbol parsing is deliberately small: root letter, one optional
// accidental, suffix, optional slash bass. Extensions fold into their
// quality through aliases, so `G13` and `G9` both resolve to `G7`.

use crate::error::TheoryError;
use crate::pitch::{degree_semitones, normalize_degree, pitch_class};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One quality as written in the JSON file.
#[derive(Debug, Clone, Deserialize)]
struct QualityDef {
    name: String,
    aliases: Vec<String>,
    targets: BTreeMap<String, u8>,
}

#[derive(Debug, Deserialize)]
struct QualityFile {
    qualities: Vec<QualityDef>,
}

/// What the dictionary says about one targetable degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetSpec {
    /// Raw formula-type code from the data (1 or 2 when well formed).
    pub type_code: u8,
    /// Semitones above the root.
    pub semitones: i32,
}

/// Resolved theory for one chord symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChordProfile {
    /// Canonical spelling, e.g. `Cmaj7` for `C∆`.
    pub symbol: String,
    pub root_pc: u8,
    /// Canonical quality suffix (`maj7`, `m7`, `7`, ...).
    pub quality: String,
    /// Degree label -> spec, keyed by normalized labels (`♭7`, `7M`, ...).
    pub targets: BTreeMap<String, TargetSpec>,
}

impl ChordProfile {
    pub fn target(&self, degree: &str) -> Option<&TargetSpec> {
        self.targets.get(degree)
    }
}

/// Validated lookup from chord suffixes to qualities.
#[derive(Debug, Clone)]
pub struct ChordDictionary {
    qualities: Vec<QualityDef>,
    aliases: BTreeMap<String, usize>,
}

impl ChordDictionary {
    /// Parse and validate the quality table.
    ///
    /// Degree labels are normalized and must be known to `pitch`; an alias
    /// (the canonical name counts as one) may belong to one quality only.
    pub fn from_json(json: &str) -> Result<Self, TheoryError> {
        let file: QualityFile = serde_json::from_str(json)?;
        let mut qualities = Vec::with_capacity(file.qualities.len());
        let mut aliases = BTreeMap::new();

        for (idx, def) in file.qualities.into_iter().enumerate() {
            let mut targets = BTreeMap::new();
            for (degree, code) in def.targets {
                let label = normalize_degree(&degree);
                if degree_semitones(&label).is_none() {
                    return Err(TheoryError::UnknownDegree {
                        quality: def.name.clone(),
                        degree,
                    });
                }
                targets.insert(label, code);
            }

            let spellings = std::iter::once(&def.name).chain(def.aliases.iter());
            for alias in spellings {
                if aliases.get(alias).is_some_and(|&other| other != idx) {
                    return Err(TheoryError::DuplicateAlias(alias.clone()));
                }
                aliases.insert(alias.clone(), idx);
            }

            qualities.push(QualityDef { targets, ..def });
        }

        Ok(ChordDictionary { qualities, aliases })
    }

    /// Canonical quality names, in file order.
    pub fn quality_names(&self) -> impl Iterator<Item = &str> {
        self.qualities.iter().map(|q| q.name.as_str())
    }

    /// Resolve a chord symbol into its profile.
    pub fn profile(&self, symbol: &str) -> Result<ChordProfile, TheoryError> {
        let unknown = || TheoryError::UnknownChord(symbol.to_string());
        // `C#5` is C augmented, not C# with suffix `5`: fall back to a bare
        // root letter when the accidental reading has no matching suffix.
        let (root, idx) = [true, false]
            .into_iter()
            .filter_map(|accidental| split_symbol(symbol, accidental))
            .find_map(|(root, suffix)| self.aliases.get(suffix).map(|&idx| (root, idx)))
            .ok_or_else(unknown)?;
        let root_pc = pitch_class(root).ok_or_else(unknown)?;
        let quality = &self.qualities[idx];

        let targets = quality
            .targets
            .iter()
            .filter_map(|(degree, &type_code)| {
                degree_semitones(degree).map(|semitones| {
                    (degree.clone(), TargetSpec { type_code, semitones })
                })
            })
            .collect();

        let root_name = root.replace('♯', "#").replace('♭', "b");
        Ok(ChordProfile {
            symbol: format!("{root_name}{}", quality.name),
            root_pc,
            quality: quality.name.clone(),
            targets,
        })
    }
}

/// Split `symbol` into (root, suffix), dropping a slash bass such as `/E`.
/// With `take_accidental` a `#`/`b` after the letter belongs to the root.
///
/// `6/9` stays intact because `9` is not a pitch name.
fn split_symbol(symbol: &str, take_accidental: bool) -> Option<(&str, &str)> {
    let symbol = symbol.trim();
    let mut chars = symbol.char_indices();
    let (_, letter) = chars.next()?;
    if !('A'..='G').contains(&letter) {
        return None;
    }
    let mut root_end = letter.len_utf8();
    let accidental = chars
        .next()
        .filter(|&(_, c)| take_accidental && matches!(c, '#' | '♯' | 'b' | '♭'));
    if let Some((i, c)) = accidental {
        root_end = i + c.len_utf8();
    }

    let (root, mut suffix) = symbol.split_at(root_end);
    let bass_slash = suffix
        .rfind('/')
        .filter(|&slash| pitch_class(&suffix[slash + 1..]).is_some());
    if let Some(slash) = bass_slash {
        suffix = &suffix[..slash];
    }
    Some((root, suffix))
}
