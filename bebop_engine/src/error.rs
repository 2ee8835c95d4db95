// Scheduling errors.
//
// Any of these aborts the whole run: the scheduler never returns a partial
// line. Retrying (say, with another seed) is up to the caller.

use bebop_theory::TheoryError;
use bebop_theory::formula::FormulaType;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Unknown chord, bad register, malformed data, progression syntax.
    #[error(transparent)]
    Theory(#[from] TheoryError),

    #[error("chord {chord} has no usable target data for degree '{degree}': {reason}")]
    MissingTargetData {
        chord: String,
        degree: String,
        reason: String,
    },

    #[error("no formulas available for {0}")]
    EmptyCatalog(FormulaType),

    #[error("rhythm placement needs at least one note, got {0}")]
    InvalidFormulaLength(usize),

    #[error("no degree of chord {0} has a pitch inside the register")]
    NoContourCandidate(String),

    #[error("cannot read config {path}: {source}")]
    ConfigIo {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
