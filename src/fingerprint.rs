//! In-memory fingerprint model
//!
//! A fingerprint is an ordered collection of probe tests, each carrying
//! attribute/value pairs, plus OS classification metadata. Matching and
//! serialization both rely on the canonical form produced by
//! [`FingerPrint::sort`]: tests sorted by name, attributes sorted within
//! each test.

use std::sync::Arc;

/// One attribute/value pair inside a test.
///
/// Observed fingerprints carry literal values (usually hex tokens);
/// reference fingerprints carry match expressions; the point-budget
/// fingerprint carries decimal weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AVal {
    pub attribute: Arc<str>,
    pub value: Arc<str>,
}

impl AVal {
    pub fn new(attribute: Arc<str>, value: Arc<str>) -> Self {
        Self { attribute, value }
    }
}

/// Results of one probe: a named, attribute-sorted list of [`AVal`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerTest {
    pub name: Arc<str>,
    pub results: Vec<AVal>,
}

impl FingerTest {
    pub fn new(name: Arc<str>) -> Self {
        Self {
            name,
            results: Vec::new(),
        }
    }

    /// Stable sort of the attribute/value pairs by attribute name.
    pub fn sort_attrs(&mut self) {
        self.results
            .sort_by(|a, b| a.attribute.cmp(&b.attribute));
    }

    /// Look up a value by attribute name. Assumes nothing about ordering.
    pub fn value_of(&self, attribute: &str) -> Option<&Arc<str>> {
        self.results
            .iter()
            .find(|av| &*av.attribute == attribute)
            .map(|av| &av.value)
    }
}

/// Structured OS metadata attached to a reference fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsClassification {
    pub vendor: Arc<str>,
    pub family: Arc<str>,
    /// Absent generation is recorded as `None`, not an empty string.
    pub generation: Option<Arc<str>>,
    pub device_type: Arc<str>,
    /// Common Platform Enumeration URIs, in file order.
    pub cpe: Vec<Arc<str>>,
}

/// A named collection of probe tests characterizing a network stack.
///
/// Reference entries have a display name; the point-budget fingerprint
/// does not. `line` records the line the entry began on in its source
/// file (zero when constructed in memory).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FingerPrint {
    pub name: Option<Arc<str>>,
    pub line: usize,
    pub tests: Vec<FingerTest>,
    pub classes: Vec<OsClassification>,
}

impl FingerPrint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize: sort attributes within every test, then stable-sort
    /// the tests by name. Matching and emission assume this form.
    pub fn sort(&mut self) {
        for test in &mut self.tests {
            test.sort_attrs();
        }
        self.tests.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Display name, or the empty string for the point-budget entry.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
