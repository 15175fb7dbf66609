//! String interning for fingerprint attributes and values
//!
//! The OS database repeats a small vocabulary of attribute names (`GCD`,
//! `ISR`, `O1`, ...) and short values tens of thousands of times. The pool
//! hands out `Arc<str>` handles so equal content is stored once and the
//! parsed database stays cheaply shareable across threads.

use std::collections::HashSet;
use std::sync::Arc;

/// Deduplicating store of immutable strings.
///
/// Handles compare by content (`str` comparison through the `Arc`), so
/// handles from different pools interoperate; `Arc::ptr_eq` is only valid
/// as a fast path between handles from the same pool.
#[derive(Debug, Default)]
pub struct StringPool {
    strings: HashSet<Arc<str>>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning the shared handle for its content.
    pub fn intern(&mut self, s: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(s) {
            return Arc::clone(existing);
        }
        let stored: Arc<str> = Arc::from(s);
        self.strings.insert(Arc::clone(&stored));
        stored
    }

    /// Intern with surrounding whitespace stripped.
    pub fn intern_trimmed(&mut self, s: &str) -> Arc<str> {
        self.intern(s.trim())
    }

    /// Intern the first whitespace-separated word, skipping leading
    /// whitespace. Used for fields that may carry trailing flags.
    pub fn intern_first_word(&mut self, s: &str) -> Arc<str> {
        let word = s.split_whitespace().next().unwrap_or("");
        self.intern(word)
    }

    /// Number of distinct strings stored.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
