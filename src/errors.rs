//! Error types shared by the symbolic and numerical layers.
use thiserror::Error;

/// All failure modes of the toolbox. Parse and construction errors abort the
/// single operation they belong to; the analysis harness catches per-case
/// errors and attaches them to the case report instead of aborting a batch.
#[derive(Error, Debug)]
pub enum OdeError {
    /// Malformed or unresolvable expression, detected at parse time.
    #[error("failed to parse expression '{expression}': invalid fragment '{fragment}'")]
    Parse { expression: String, fragment: String },

    /// Runtime failure while evaluating a parsed expression or combining
    /// state values (division by zero, variant or length mismatch).
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Invalid integration grid: non-positive or non-finite step size,
    /// t_bound below t0.
    #[error("invalid solver input: {0}")]
    SolverInput(String),

    /// Missing or malformed field in an external test-case record.
    #[error("malformed test-case record, field '{field}': {reason}")]
    RecordFormat { field: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl OdeError {
    /// Short kind tag used in per-case reports and summary tables.
    pub fn kind(&self) -> &'static str {
        match self {
            OdeError::Parse { .. } => "ParseError",
            OdeError::Evaluation(_) => "EvaluationError",
            OdeError::SolverInput(_) => "SolverInputError",
            OdeError::RecordFormat { .. } => "RecordFormatError",
            OdeError::Io(_) => "IoError",
            OdeError::Csv(_) => "CsvError",
        }
    }
}
