//! Weighted comparison of a reference fingerprint against an observed one
//!
//! Both fingerprints and the point-budget entry are walked as sorted
//! streams: tests merged by name, attributes merged by name within each
//! shared test. Only the intersection contributes. The walk is O(n+m) per
//! comparison, which keeps ranking a whole database linear in its size.

use log::debug;

use crate::error::{OsDbError, OsDbResult};
use crate::expr::expr_match;
use crate::fingerprint::{FingerPrint, FingerTest};

/// Weighted subtest totals for one comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub subtests: u64,
    pub subtests_succeeded: u64,
}

impl Score {
    pub fn accuracy(&self) -> f64 {
        if self.subtests == 0 {
            0.0
        } else {
            self.subtests_succeeded as f64 / self.subtests as f64
        }
    }

    /// A perfect score needs every weighted subtest to pass *and* a
    /// positive total weight; an empty intersection is not perfect.
    pub fn is_perfect(&self) -> bool {
        self.subtests > 0 && self.subtests == self.subtests_succeeded
    }

    fn add(&mut self, other: Score) {
        self.subtests += other.subtests;
        self.subtests_succeeded += other.subtests_succeeded;
    }
}

/// Walk one matched test pair attribute by attribute, weighting each
/// shared attribute by the point budget.
///
/// With `shortcircuit`, returns at the first failing attribute with the
/// weight tallied so far and zero passed weight; callers in that mode only
/// consume the perfect/not-perfect bit. The boolean is true when the walk
/// was cut short that way. With `verbose`, failing attributes are logged
/// individually.
fn match_avals(
    reference: &FingerTest,
    observed: &FingerTest,
    points: &FingerTest,
    shortcircuit: bool,
    verbose: bool,
) -> OsDbResult<(Score, bool)> {
    let mut score = Score::default();
    let (mut ri, mut oi, mut pi) = (0, 0, 0);

    // Relies on AVals being sorted by attribute.
    while ri < reference.results.len() && oi < observed.results.len() {
        let rv = &reference.results[ri];
        let ov = &observed.results[oi];
        let d = rv.attribute.cmp(&ov.attribute);

        if d == std::cmp::Ordering::Equal {
            // The points cursor only moves forward; both sides are sorted.
            while pi < points.results.len() && points.results[pi].attribute != rv.attribute {
                pi += 1;
            }
            let Some(pv) = points.results.get(pi) else {
                return Err(OsDbError::MissingPoints {
                    test: reference.name.to_string(),
                    attribute: rv.attribute.to_string(),
                });
            };
            let worth: u64 = pv.value.parse().map_err(|_| OsDbError::BogusPoints {
                test: reference.name.to_string(),
                attribute: rv.attribute.to_string(),
                value: pv.value.to_string(),
            })?;
            score.subtests += worth;

            if expr_match(&ov.value, &rv.value) {
                score.subtests_succeeded += worth;
            } else {
                if shortcircuit {
                    score.subtests_succeeded = 0;
                    return Ok((score, true));
                }
                if verbose {
                    debug!(
                        "{}.{}: \"{}\" NOMATCH \"{}\" ({} {})",
                        reference.name,
                        rv.attribute,
                        ov.value,
                        rv.value,
                        worth,
                        if worth == 1 { "point" } else { "points" }
                    );
                }
            }
        }

        if d <= std::cmp::Ordering::Equal {
            ri += 1;
        }
        if d >= std::cmp::Ordering::Equal {
            oi += 1;
        }
    }

    Ok((score, false))
}

/// Compare two fingerprints and return the weighted subtest totals.
///
/// `reference` may carry expression values; `observed` carries literals;
/// `points` is the database's point-budget entry supplying the integer
/// weight of every attribute. All three must be in canonical sorted form.
pub fn compare_fingerprints_counts(
    reference: &FingerPrint,
    observed: &FingerPrint,
    points: &FingerPrint,
    shortcircuit: bool,
    verbose: bool,
) -> OsDbResult<Score> {
    let mut total = Score::default();
    let (mut ri, mut oi, mut pi) = (0, 0, 0);

    // Relies on tests being sorted by name.
    while ri < reference.tests.len() && oi < observed.tests.len() {
        let rt = &reference.tests[ri];
        let ot = &observed.tests[oi];
        let d = rt.name.cmp(&ot.name);

        if d == std::cmp::Ordering::Equal {
            while pi < points.tests.len() && points.tests[pi].name != rt.name {
                pi += 1;
            }
            let Some(pt) = points.tests.get(pi) else {
                return Err(OsDbError::MissingPointsTest(rt.name.to_string()));
            };
            let (test_score, failed) = match_avals(rt, ot, pt, shortcircuit, verbose)?;
            total.add(test_score);
            if failed {
                return Ok(total);
            }
        }

        if d <= std::cmp::Ordering::Equal {
            ri += 1;
        }
        if d >= std::cmp::Ordering::Equal {
            oi += 1;
        }
    }

    Ok(total)
}

/// Comparison accuracy in [0, 1]; zero when the weighted intersection is
/// empty.
pub fn compare_fingerprints(
    reference: &FingerPrint,
    observed: &FingerPrint,
    points: &FingerPrint,
    verbose: bool,
) -> OsDbResult<f64> {
    let score = compare_fingerprints_counts(reference, observed, points, false, verbose)?;
    debug_assert!(score.subtests_succeeded <= score.subtests);
    Ok(score.accuracy())
}
