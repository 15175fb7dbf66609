//! Fingerprint matching: weighted scoring and ranked selection

pub mod rank;
pub mod score;

pub use rank::{match_fingerprint, MatchStatus, OsMatch, RankedMatches};
pub use score::{compare_fingerprints, compare_fingerprints_counts, Score};
