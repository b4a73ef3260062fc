//! Error taxonomy for the encoder/solver engine.
use std::path::PathBuf;

/// Instance parsing or validation failed. Fatal for that invocation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read instance file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line 1 must contain two positive integers H and W, got {line:?}")]
    BadDimensions { line: String },
    #[error("grid dimensions must be positive, got {height}x{width}")]
    NonPositiveDimensions { height: i64, width: i64 },
    #[error("row {row} has {found} tokens, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("instance declares {declared} rows but only {found} were present")]
    RowCountMismatch { declared: usize, found: usize },
    #[error("invalid clue {token:?} at row {row}, col {col}: must be 0-3 or '.'")]
    InvalidClue {
        row: usize,
        col: usize,
        token: String,
    },
}

/// The external SAT solver could not be run or its output could not be parsed.
#[derive(thiserror::Error, Debug)]
pub enum OracleError {
    #[error("failed to spawn SAT solver {solver:?}: {source}")]
    Spawn {
        solver: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write DIMACS CNF to temporary file: {0}")]
    WriteCnf(#[source] std::io::Error),
    #[error("solver exited with status {status} and no 's' outcome line")]
    NoOutcomeLine { status: String },
    #[error("solver reported outcome {outcome:?}, which is neither SATISFIABLE nor UNSATISFIABLE")]
    UnknownOutcome { outcome: String },
    #[error("solver model line contained unparseable literal {token:?}")]
    UnparseableLiteral { token: String },
    #[error("solve was cancelled before the solver produced a result")]
    Cancelled,
    #[error("solver did not finish within {elapsed:?}")]
    Timeout { elapsed: std::time::Duration },
}

/// An invariant the encoder assumes was violated. Should be unreachable.
#[derive(thiserror::Error, Debug)]
pub enum InternalError {
    #[error("edge id {0} has no entry in the variable registry")]
    DanglingEdgeId(u32),
    #[error("point ({row}, {col}) has {count} incident edges, expected 2, 3 or 4")]
    BadPointDegree { row: usize, col: usize, count: usize },
}

/// Top-level error returned by the CEGAR driver's non-solved paths.
#[derive(thiserror::Error, Debug)]
pub enum SolveError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}
