//! The reference OS fingerprint database

pub mod parser;

pub use parser::parse_single_fingerprint;

use std::fs;
use std::path::Path;

use crate::error::OsDbResult;
use crate::fingerprint::FingerPrint;

/// A parsed OS database: reference entries in file order plus the single
/// point-budget entry. Immutable after parsing and safe to share across
/// threads.
#[derive(Debug, Clone)]
pub struct FingerPrintDb {
    /// Reference fingerprints, in the order they appear in the file.
    pub prints: Vec<FingerPrint>,
    /// The `MatchPoints` entry: integer weight per test attribute.
    pub match_points: FingerPrint,
}

impl FingerPrintDb {
    /// Read and parse a database file.
    pub fn open(path: impl AsRef<Path>) -> OsDbResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse database text.
    pub fn parse(text: &str) -> OsDbResult<Self> {
        let (prints, match_points) = parser::parse_db(text)?;
        Ok(Self {
            prints,
            match_points,
        })
    }

    /// Number of reference entries.
    pub fn len(&self) -> usize {
        self.prints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prints.is_empty()
    }

    /// Entry by the stable index carried in ranked results.
    pub fn get(&self, index: usize) -> Option<&FingerPrint> {
        self.prints.get(index)
    }
}
