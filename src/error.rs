//! Error handling for the deimos matching engine
//!
//! Per-record syntax errors in the OS database are recovered locally by the
//! parser (logged and skipped); the variants here are the fatal conditions
//! the scoring invariants depend on, plus I/O and emitter failures.

use thiserror::Error;

/// Main error type for database and matching operations
#[derive(Debug, Error)]
pub enum OsDbError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Found MatchPoints directive on line {0} even though it has previously been seen in the file")]
    DuplicateMatchPoints(usize),

    #[error("OS database has no MatchPoints directive")]
    MissingMatchPoints,

    #[error("\"CPE\" line without preceding \"Class\" at line {0}")]
    CpeWithoutClass(usize),

    #[error("Parse error on line {line} of fingerprint: {text}")]
    FingerprintParse { line: usize, text: String },

    #[error("Failed to find point amount for test {test}.{attribute}")]
    MissingPoints { test: String, attribute: String },

    #[error("Got bogus point amount ({value}) for test {test}.{attribute}")]
    BogusPoints {
        test: String,
        attribute: String,
        value: String,
    },

    #[error("Failed to locate test {0} in MatchPoints directive of fingerprint file")]
    MissingPointsTest(String),

    #[error("Unorderable range in expression ({0}): upper bound must exceed lower bound")]
    BadRange(String),

    #[error("Unknown test name \"{0}\" in display ordering")]
    UnknownTest(String),

    #[error("The test {0} was somehow lost while merging fingerprints")]
    TestLost(String),

    #[error("Output error: {0}")]
    OutputError(String),
}

/// Result type alias for database and matching operations
pub type OsDbResult<T> = Result<T, OsDbError>;
