//! Company-name resolution by CNPJ.
//!
//! Lookups are best effort: a resolver answers `None` on any failure and the
//! caller falls back to the name printed in the document.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::trace;

use crate::extract::rules::cnpj_digits;

/// Resolves a formatted CNPJ to a company display name.
pub trait NameResolver {
    fn resolve(&self, cnpj: &str) -> Option<String>;
}

/// Resolver that never knows any name.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLookup;

impl NameResolver for NoLookup {
    fn resolve(&self, _cnpj: &str) -> Option<String> {
        None
    }
}

impl<R: NameResolver + ?Sized> NameResolver for &R {
    fn resolve(&self, cnpj: &str) -> Option<String> {
        (**self).resolve(cnpj)
    }
}

impl<R: NameResolver + ?Sized> NameResolver for Box<R> {
    fn resolve(&self, cnpj: &str) -> Option<String> {
        (**self).resolve(cnpj)
    }
}

/// Memoizing wrapper, scoped to one batch.
///
/// Keys are digits-only CNPJs, so differently punctuated spellings share an
/// entry. Misses are remembered too. No eviction.
pub struct NameCache<R> {
    inner: R,
    entries: RefCell<HashMap<String, Option<String>>>,
}

impl<R: NameResolver> NameCache<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Number of cached CNPJs (hits and misses).
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: NameResolver> NameResolver for NameCache<R> {
    fn resolve(&self, cnpj: &str) -> Option<String> {
        let key = cnpj_digits(cnpj);
        if key.is_empty() {
            return None;
        }

        if let Some(cached) = self.entries.borrow().get(&key) {
            trace!("Name cache hit for {}", key);
            return cached.clone();
        }

        let resolved = self
            .inner
            .resolve(cnpj)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        self.entries.borrow_mut().insert(key, resolved.clone());
        resolved
    }
}

/// Fixed CNPJ-to-name table, keyed by digits.
#[derive(Debug, Default, Clone)]
pub struct StaticNames {
    names: HashMap<String, String>,
}

impl StaticNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, cnpj: &str, name: impl Into<String>) -> Self {
        self.names.insert(cnpj_digits(cnpj), name.into());
        self
    }
}

impl NameResolver for StaticNames {
    fn resolve(&self, cnpj: &str) -> Option<String> {
        self.names.get(&cnpj_digits(cnpj)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counting<'a> {
        calls: &'a Cell<usize>,
    }

    impl NameResolver for Counting<'_> {
        fn resolve(&self, cnpj: &str) -> Option<String> {
            self.calls.set(self.calls.get() + 1);
            (cnpj_digits(cnpj) == "12345678000190").then(|| " ACME LTDA ".to_string())
        }
    }

    #[test]
    fn test_cache_memoizes_hits_and_misses() {
        let calls = Cell::new(0);
        let cache = NameCache::new(Counting { calls: &calls });

        assert_eq!(cache.resolve("12.345.678/0001-90"), Some("ACME LTDA".to_string()));
        assert_eq!(cache.resolve("12345678000190"), Some("ACME LTDA".to_string()));
        assert_eq!(cache.resolve("98.765.432/0001-10"), None);
        assert_eq!(cache.resolve("98.765.432/0001-10"), None);

        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_static_names() {
        let names = StaticNames::new().with("12.345.678/0001-90", "ACME");
        assert_eq!(names.resolve("12345678000190"), Some("ACME".to_string()));
        assert_eq!(NoLookup.resolve("12345678000190"), None);
    }
}
