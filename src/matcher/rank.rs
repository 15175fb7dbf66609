//! Ranked top-K selection over the whole reference database
//!
//! Candidates are insertion-sorted by accuracy into a bounded list with
//! same-OS deduplication. Once the list is full the acceptance floor
//! tightens to just above the lowest surviving accuracy, so latecomers
//! must strictly beat it. Perfect matches are always admitted; a perfect
//! candidate arriving with the list already full of perfect matches ends
//! the scan as ambiguous.

use std::sync::Arc;

use crate::config::{MATCH_FLOOR_EPSILON, MAX_OS_MATCHES};
use crate::db::FingerPrintDb;
use crate::error::OsDbResult;
use crate::fingerprint::FingerPrint;
use crate::matcher::score::compare_fingerprints;

/// Terminal state of a ranking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// At least one candidate was admitted.
    Success,
    /// No reference entry cleared the threshold.
    NoMatches,
    /// More perfect matches than the list can hold; the result is
    /// ambiguous and ranking stopped early.
    TooManyPerfect,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchStatus::Success => "success",
            MatchStatus::NoMatches => "no matches",
            MatchStatus::TooManyPerfect => "too many perfect matches",
        };
        write!(f, "{}", s)
    }
}

/// One admitted candidate: a stable index into the database's entry list,
/// its display name, and the comparison accuracy.
#[derive(Debug, Clone, PartialEq)]
pub struct OsMatch {
    pub index: usize,
    pub name: Arc<str>,
    pub accuracy: f64,
}

/// Bounded, accuracy-sorted, name-deduplicated list of candidates.
#[derive(Debug, Clone)]
pub struct RankedMatches {
    capacity: usize,
    floor: f64,
    matches: Vec<OsMatch>,
    pub num_perfect_matches: usize,
    pub status: MatchStatus,
}

impl RankedMatches {
    /// List with the default capacity and the given acceptance threshold.
    pub fn new(threshold: f64) -> Self {
        Self::with_capacity(MAX_OS_MATCHES, threshold)
    }

    pub fn with_capacity(capacity: usize, threshold: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&threshold));
        debug_assert!(capacity > 0);
        Self {
            capacity,
            floor: threshold,
            matches: Vec::with_capacity(capacity),
            num_perfect_matches: 0,
            status: MatchStatus::Success,
        }
    }

    /// Offer one candidate. Returns false once ranking should stop
    /// (too many perfect matches).
    pub fn offer(&mut self, index: usize, name: &Arc<str>, accuracy: f64) -> bool {
        if accuracy < self.floor && accuracy < 1.0 {
            return true;
        }

        // There can only be one entry per OS name in the list: keep
        // whichever scored higher.
        if let Some(pos) = self.matches.iter().position(|m| m.name == *name) {
            if self.matches[pos].accuracy >= accuracy {
                return true;
            }
            self.matches.remove(pos);
        }

        if accuracy == 1.0 {
            if self.num_perfect_matches == self.capacity {
                self.status = MatchStatus::TooManyPerfect;
                return false;
            }
            self.num_perfect_matches += 1;
        }

        // Insert after existing entries of equal accuracy, so ties keep
        // database order.
        let pos = self
            .matches
            .iter()
            .position(|m| m.accuracy < accuracy)
            .unwrap_or(self.matches.len());
        self.matches.insert(
            pos,
            OsMatch {
                index,
                name: Arc::clone(name),
                accuracy,
            },
        );
        self.matches.truncate(self.capacity);

        if self.matches.len() == self.capacity {
            self.floor = self.matches[self.capacity - 1].accuracy + MATCH_FLOOR_EPSILON;
        }
        true
    }

    /// Settle the terminal status after the last candidate was offered.
    fn finish(&mut self) {
        if self.matches.is_empty() && self.status == MatchStatus::Success {
            self.status = MatchStatus::NoMatches;
        }
    }

    pub fn matches(&self) -> &[OsMatch] {
        &self.matches
    }

    pub fn best(&self) -> Option<&OsMatch> {
        self.matches.first()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Score an observed fingerprint against every entry of the reference
/// database and return the ranked best candidates.
///
/// Candidates below `threshold` are not admitted (perfect matches always
/// are). The observed fingerprint is canonicalized on a working copy, so
/// callers may pass it in any order.
pub fn match_fingerprint(
    observed: &FingerPrint,
    db: &FingerPrintDb,
    threshold: f64,
) -> OsDbResult<RankedMatches> {
    let mut observed = observed.clone();
    observed.sort();

    let mut results = RankedMatches::new(threshold);
    for (index, reference) in db.prints.iter().enumerate() {
        let accuracy = compare_fingerprints(reference, &observed, &db.match_points, false)?;
        let name = reference
            .name
            .clone()
            .unwrap_or_else(|| Arc::from(""));
        if !results.offer(index, &name, accuracy) {
            return Ok(results);
        }
    }
    results.finish();
    Ok(results)
}
