//! Interning for component names, references and entity names
//!
//! The same references show up in declarations, bindings, listener edges
//! and data scopes. Interning keeps one allocation per distinct string and
//! makes clones O(1).

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

static INTERNER: Lazy<Interner> = Lazy::new(Interner::new);

/// Thread-safe string interner
pub struct Interner {
    strings: DashMap<Arc<str>, ()>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            strings: DashMap::new(),
        }
    }

    /// Intern a string, returning the shared `Arc<str>` for its content
    pub fn intern(&self, s: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(s) {
            return Arc::clone(existing.key());
        }

        // entry() holds the shard lock, so racing callers settle on one Arc
        let entry = self.strings.entry(Arc::from(s)).or_insert(());
        Arc::clone(entry.key())
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

/// Intern using the process-wide interner
#[inline]
pub fn intern(s: &str) -> Arc<str> {
    INTERNER.intern(s)
}
