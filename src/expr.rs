//! Expression matching for OS database values
//!
//! Reference fingerprints describe acceptable observed values with a small
//! expression language: literals, alternation (`|`), inclusive hex ranges
//! (`a-b`) and open comparisons (`<n`, `>n`). No parentheses; `|` binds
//! loosest. Expressions are compiled once and evaluated against observed
//! literal tokens.

use crate::error::{OsDbError, OsDbResult};

/// How a single `|`-separated alternative matches a numeric observed value.
///
/// Every alternative also keeps its raw text: when the observed value does
/// not parse as hex, alternatives are compared as whole literals no matter
/// what they compile to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Term {
    /// Exact byte equality.
    Literal,
    /// `<n`: observed value strictly below n.
    Lt(u64),
    /// `>n`: observed value strictly above n.
    Gt(u64),
    /// `a-b`: inclusive, with b > a enforced at compile time.
    Range(u64, u64),
    /// Malformed numeric alternative; never matches a numeric value.
    Broken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Alternative {
    raw: Box<str>,
    term: Term,
}

/// A compiled OS database expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    alternatives: Vec<Alternative>,
}

/// Full-token unsigned hex parse. Empty input is not numeric.
fn parse_hex(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }
    u64::from_str_radix(s, 16).ok()
}

/// Compile one alternative. The only rejectable shape is a range whose
/// bounds parse but do not satisfy `hi > lo`.
fn compile_alternative(raw: &str) -> OsDbResult<Alternative> {
    let term = if let Some(rest) = raw.strip_prefix('<') {
        match parse_hex(rest) {
            Some(n) => Term::Lt(n),
            None => Term::Broken,
        }
    } else if let Some(rest) = raw.strip_prefix('>') {
        match parse_hex(rest) {
            Some(n) => Term::Gt(n),
            None => Term::Broken,
        }
    } else if let Some(dash) = raw.find('-') {
        let lo = parse_hex(&raw[..dash]);
        let hi = parse_hex(&raw[dash + 1..]);
        match (lo, hi) {
            (Some(lo), Some(hi)) if hi > lo => Term::Range(lo, hi),
            (Some(_), Some(_)) => return Err(OsDbError::BadRange(raw.to_string())),
            _ => Term::Broken,
        }
    } else {
        Term::Literal
    };

    Ok(Alternative {
        raw: raw.into(),
        term,
    })
}

impl Expr {
    /// Compile an expression, rejecting unorderable ranges. Used while
    /// parsing the OS database, where a range with `hi <= lo` is a fatal
    /// semantic error.
    pub fn parse(expr: &str) -> OsDbResult<Self> {
        let alternatives = expr
            .split('|')
            .map(compile_alternative)
            .collect::<OsDbResult<Vec<_>>>()?;
        Ok(Self { alternatives })
    }

    /// Compile an expression without failing: malformed numeric
    /// alternatives degrade to never-matching terms. The matcher must not
    /// abort on database values at match time.
    pub fn parse_lenient(expr: &str) -> Self {
        let alternatives = expr
            .split('|')
            .map(|alt| {
                compile_alternative(alt).unwrap_or(Alternative {
                    raw: alt.into(),
                    term: Term::Broken,
                })
            })
            .collect();
        Self { alternatives }
    }

    /// Does the observed literal `val` satisfy this expression?
    pub fn matches(&self, val: &str) -> bool {
        let numeric = parse_hex(val);

        for alt in &self.alternatives {
            if alt.raw.is_empty() {
                // Empty alternatives never match.
                continue;
            }
            let hit = match numeric {
                Some(v) => match alt.term {
                    Term::Literal => *alt.raw == *val,
                    Term::Lt(n) => v < n,
                    Term::Gt(n) => v > n,
                    Term::Range(lo, hi) => v >= lo && v <= hi,
                    Term::Broken => false,
                },
                // Non-numeric observed values fall back to whole-token
                // literal comparison against the alternative text.
                None => *alt.raw == *val,
            };
            if hit {
                return true;
            }
        }
        false
    }
}

/// Compare an observed value (e.g. `"45"`) against a database expression
/// (e.g. `"3B-47"`, `"8|A"`, `">10"`). Returns true iff any alternative
/// matches. Never aborts on malformed expressions.
pub fn expr_match(val: &str, expr: &str) -> bool {
    Expr::parse_lenient(expr).matches(val)
}
