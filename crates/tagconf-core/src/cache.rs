//! Thread-safe cache of compiled validation rules.

use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::error::DecodeError;
use crate::record::FieldDescriptor;
use crate::validate::{CompiledRules, ValidatorRegistry};

type CacheKey = (TypeId, &'static str);

/// Compiled rules per `(record type, field name)`.
///
/// Entries are compiled on first use and never invalidated. Concurrent
/// first lookups of one key may both compile, but only the first insert is
/// kept and returned to every later caller.
pub struct ValidatorCache {
    registry: Arc<ValidatorRegistry>,
    entries: DashMap<CacheKey, Arc<CompiledRules>>,
}

impl ValidatorCache {
    /// Creates an empty cache over the built-in registry.
    pub fn new() -> Self {
        Self::with_registry(ValidatorRegistry::new())
    }

    /// Creates an empty cache over a custom registry.
    pub fn with_registry(registry: impl Into<Arc<ValidatorRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            entries: DashMap::new(),
        }
    }

    /// The process-wide cache used by default decoders.
    pub fn global() -> &'static Arc<Self> {
        static GLOBAL: OnceLock<Arc<ValidatorCache>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Self::new()))
    }

    /// The registry rules are compiled with.
    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    /// Returns the cached rules for a field, compiling them on a miss.
    ///
    /// Compilation errors are not cached.
    pub fn get_or_compile(
        &self,
        record: TypeId,
        record_name: &str,
        desc: &FieldDescriptor,
    ) -> Result<Arc<CompiledRules>, DecodeError> {
        let key = (record, desc.name);
        if let Some(rules) = self.entries.get(&key) {
            return Ok(Arc::clone(rules.value()));
        }

        tracing::debug!(record = record_name, field = desc.name, "validator cache miss");
        let compiled = Arc::new(self.registry.compile_rules(desc)?);

        let entry = self.entries.entry(key).or_insert(compiled);
        Ok(Arc::clone(entry.value()))
    }

    /// Number of cached fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for ValidatorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidatorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorCache")
            .field("registry", &self.registry)
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    #[test]
    fn test_second_lookup_returns_same_rules() {
        let cache = ValidatorCache::new();
        let desc = FieldDescriptor::new::<u32>("age", "u32").with_validate("required,>1");
        let id = TypeId::of::<Marker>();

        let first = cache.get_or_compile(id, "Marker", &desc).unwrap();
        let second = cache.get_or_compile(id, "Marker", &desc).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first.validators()[0], &second.validators()[0]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = ValidatorCache::new();
        let desc = FieldDescriptor::new::<u32>("age", "u32").with_validate("bogus");

        assert!(cache
            .get_or_compile(TypeId::of::<Marker>(), "Marker", &desc)
            .is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keys_include_record_type() {
        let cache = ValidatorCache::new();
        let desc = FieldDescriptor::new::<u32>("age", "u32").with_validate(">1");

        cache.get_or_compile(TypeId::of::<Marker>(), "Marker", &desc).unwrap();
        cache.get_or_compile(TypeId::of::<u8>(), "u8", &desc).unwrap();
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_first_use_keeps_one_entry() {
        let cache = ValidatorCache::new();
        let desc = FieldDescriptor::new::<i64>("offset", "i64").with_validate(">-10");
        let id = TypeId::of::<Marker>();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.get_or_compile(id, "Marker", &desc).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.len(), 1);
        let stored = cache.get_or_compile(id, "Marker", &desc).unwrap();
        // Every caller that raced after the winner inserted sees the winner.
        assert!(results.iter().any(|rules| Arc::ptr_eq(rules, &stored)));
        for rules in &results {
            assert_eq!(rules.validators().len(), 1);
        }
    }
}
