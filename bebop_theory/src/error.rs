// Errors raised by the theory store, pitch helpers and progression parser.
//
// Every variant carries enough context to be shown to a user as-is. The
// scheduler in `bebop_engine` wraps these in its own error type.

/// Failures from theory lookups, data loading and progression parsing.
#[derive(Debug, thiserror::Error)]
pub enum TheoryError {
    #[error("unknown chord symbol '{0}'")]
    UnknownChord(String),

    #[error("invalid register: low {low} is above high {high}")]
    InvalidRegister { low: i32, high: i32 },

    #[error("chord quality '{quality}' uses unknown degree '{degree}'")]
    UnknownDegree { quality: String, degree: String },

    #[error("chord alias '{0}' is defined by more than one quality")]
    DuplicateAlias(String),

    #[error("malformed formula {pattern:?} in group '{group}': {reason}")]
    MalformedFormula {
        group: String,
        pattern: Vec<i8>,
        reason: &'static str,
    },

    #[error("progression syntax error in bar {bar}: {reason}")]
    ProgressionSyntax { bar: usize, reason: String },

    #[error("progression contains no chords")]
    EmptyProgression,

    #[error("theory data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
