// Approach-formula catalog.
//
// A formula is a short run of semitone offsets relative to a target pitch;
// the last entry is always 0 (the target itself) and everything before it is
// an approach note. Formulas are grouped by the "type" a chord degree calls
// for (Type1: whole-step upper neighbour, Type2: half-step upper neighbour)
// and then by a stylistic group label ("enclosure", "chromatic", ...).
//
// The catalog is loaded from JSON (`data/formulas.json`) and validated at
// load time so the scheduler never sees an empty or unterminated pattern.

use crate::error::TheoryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which approach family a chord degree takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormulaType {
    /// Degree whose diatonic upper neighbour is a whole step away.
    Type1,
    /// Degree whose diatonic upper neighbour is a half step away.
    Type2,
}

impl FormulaType {
    pub const ALL: [FormulaType; 2] = [FormulaType::Type1, FormulaType::Type2];

    /// Map the numeric code used in chord data (1 or 2). Anything else is
    /// not a formula type.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(FormulaType::Type1),
            2 => Some(FormulaType::Type2),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            FormulaType::Type1 => 1,
            FormulaType::Type2 => 2,
        }
    }
}

impl fmt::Display for FormulaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {}", self.code())
    }
}

/// Group label -> patterns, iterated in sorted group order.
pub type FormulaGroups = BTreeMap<String, Vec<Vec<i8>>>;

/// Top-level shape of `formulas.json`.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    type1: FormulaGroups,
    type2: FormulaGroups,
}

/// Validated formula catalog for both types.
#[derive(Debug, Clone)]
pub struct FormulaCatalog {
    type1: FormulaGroups,
    type2: FormulaGroups,
}

impl FormulaCatalog {
    /// Parse and validate a catalog. Patterns must be non-empty and end on 0.
    pub fn from_json(json: &str) -> Result<Self, TheoryError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        for groups in [&file.type1, &file.type2] {
            validate_groups(groups)?;
        }
        Ok(FormulaCatalog {
            type1: file.type1,
            type2: file.type2,
        })
    }

    /// All groups for one formula type.
    pub fn groups(&self, formula_type: FormulaType) -> &FormulaGroups {
        match formula_type {
            FormulaType::Type1 => &self.type1,
            FormulaType::Type2 => &self.type2,
        }
    }
}

fn validate_groups(groups: &FormulaGroups) -> Result<(), TheoryError> {
    for (group, patterns) in groups {
        for pattern in patterns {
            let reason = match pattern.last() {
                None => Some("pattern is empty"),
                Some(&last) if last != 0 => Some("pattern must end on the target (0)"),
                Some(_) => None,
            };
            if let Some(reason) = reason {
                return Err(TheoryError::MalformedFormula {
                    group: group.clone(),
                    pattern: pattern.clone(),
                    reason,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_enum() {
        for ty in FormulaType::ALL {
            assert_eq!(FormulaType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(FormulaType::from_code(0), None);
        assert_eq!(FormulaType::from_code(3), None);
    }

    #[test]
    fn catalog_groups_by_type() {
        let json = r#"{
            "type1": { "enclosure": [[2, -1, 0]], "chromatic": [[-2, -1, 0]] },
            "type2": { "enclosure": [[1, -1, 0]] }
        }"#;
        let catalog = FormulaCatalog::from_json(json).unwrap();
        let names: Vec<&str> = catalog
            .groups(FormulaType::Type1)
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, ["chromatic", "enclosure"]);
        assert_eq!(catalog.groups(FormulaType::Type2)["enclosure"], vec![vec![1, -1, 0]]);
    }

    #[test]
    fn unterminated_pattern_rejected() {
        let json = r#"{ "type1": { "bad": [[2, 1]] }, "type2": {} }"#;
        let err = FormulaCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, TheoryError::MalformedFormula { ref group, .. } if group == "bad"));
    }

    #[test]
    fn empty_pattern_rejected() {
        let json = r#"{ "type1": {}, "type2": { "bad": [[]] } }"#;
        assert!(FormulaCatalog::from_json(json).is_err());
    }
}
