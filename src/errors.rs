//! Crate-wide error types.
//!
//! Expected game outcomes (checkmate, stalemate, draws) are never errors;
//! they are reported through scores and result flags. Errors cover invalid
//! inputs and invariant violations only.

use std::error::Error;
use std::fmt;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The FEN string could not be turned into a legal position. The engine
    /// state is untouched when this is returned.
    ParseError(String),
    /// Search limits were rejected before any work started.
    LimitsError(String),
    /// A position invariant was violated mid-search. The search is aborted
    /// and the position unwound before this surfaces.
    InternalError(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ParseError(msg) => write!(f, "invalid FEN: {msg}"),
            EngineError::LimitsError(msg) => write!(f, "invalid search limits: {msg}"),
            EngineError::InternalError(msg) => write!(f, "internal engine error: {msg}"),
        }
    }
}

impl Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::EngineError;

    #[test]
    fn display_includes_detail_message() {
        let err = EngineError::ParseError("missing side-to-move".to_owned());
        assert!(err.to_string().contains("missing side-to-move"));
    }
}
