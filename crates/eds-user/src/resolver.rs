//! Per-field resolution against a response document.
//!
//! A field with a registered override is resolved by that override alone.
//! Every other field is looked up through the attribute mapping, returning
//! either the first value or all values.
//!
//! Overrides always produce a single value, even when the caller asked for
//! every value. Callers that need lists for `name`, `first_name` or
//! `last_name` must remove those overrides.

use crate::mapping::AttributeMapping;
use crate::record::{DirectoryRecord, FieldValue};
use eds_dsml::ResponseDocument;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Resolver that replaces the mapping-based lookup for one field.
pub type FieldOverride = Arc<dyn Fn(&ResponseDocument) -> Option<String> + Send + Sync>;

/// `(logical field, preferred attribute, fallback attribute)` triples
/// registered by [`OverrideRegistry::builtin`].
pub const BUILTIN_OVERRIDES: &[(&str, &str, &str)] = &[
    ("name", "preferredCn", "cn"),
    ("first_name", "preferredGivenname", "givenName"),
    ("last_name", "preferredSn", "sn"),
];

/// Builds an override that returns the first value of `preferred`, or the
/// first value of `fallback` when `preferred` has none.
pub fn preferred_with_fallback(
    preferred: impl Into<String>,
    fallback: impl Into<String>,
) -> FieldOverride {
    let preferred = preferred.into();
    let fallback = fallback.into();
    Arc::new(move |document: &ResponseDocument| {
        document
            .query_first_value(&preferred)
            .or_else(|| document.query_first_value(&fallback))
    })
}

/// Overrides keyed by logical field name.
#[derive(Clone, Default)]
pub struct OverrideRegistry {
    overrides: HashMap<String, FieldOverride>,
}

impl OverrideRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The preferred-name overrides for `name`, `first_name` and `last_name`.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (field, preferred, fallback) in BUILTIN_OVERRIDES {
            registry.register(*field, preferred_with_fallback(*preferred, *fallback));
        }
        registry
    }

    /// Registers `resolver` for `field`, returning any override it replaces.
    pub fn register(
        &mut self,
        field: impl Into<String>,
        resolver: FieldOverride,
    ) -> Option<FieldOverride> {
        self.overrides.insert(field.into(), resolver)
    }

    /// Removes the override for `field`.
    pub fn remove(&mut self, field: &str) -> Option<FieldOverride> {
        self.overrides.remove(field)
    }

    /// Override registered for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldOverride> {
        self.overrides.get(field)
    }

    /// Returns true if `field` has an override.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.overrides.contains_key(field)
    }

    /// Number of registered overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Returns true if no overrides are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl fmt::Debug for OverrideRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&str> = self.overrides.keys().map(String::as_str).collect();
        fields.sort_unstable();
        f.debug_struct("OverrideRegistry")
            .field("fields", &fields)
            .finish()
    }
}

/// Resolves logical fields against one document.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'a> {
    document: &'a ResponseDocument,
    mapping: &'a AttributeMapping,
    overrides: &'a OverrideRegistry,
}

impl<'a> FieldResolver<'a> {
    /// Creates a resolver over borrowed state.
    #[must_use]
    pub const fn new(
        document: &'a ResponseDocument,
        mapping: &'a AttributeMapping,
        overrides: &'a OverrideRegistry,
    ) -> Self {
        Self {
            document,
            mapping,
            overrides,
        }
    }

    /// Resolves `field`, or `None` if it is neither overridden nor mapped.
    #[must_use]
    pub fn resolve(&self, field: &str, first_only: bool) -> Option<FieldValue> {
        if let Some(resolver) = self.overrides.get(field) {
            return Some(FieldValue::Single(resolver(self.document)));
        }
        self.mapping
            .get(field)
            .map(|attribute| self.lookup(attribute, first_only))
    }

    /// Resolves every mapped field, in mapping order.
    #[must_use]
    pub fn resolve_all(&self, first_only: bool) -> DirectoryRecord {
        let mut record = DirectoryRecord::with_capacity(self.mapping.len());
        for (field, attribute) in self.mapping.entries() {
            let value = match self.overrides.get(field) {
                Some(resolver) => FieldValue::Single(resolver(self.document)),
                None => self.lookup(attribute, first_only),
            };
            debug!(field = %field, attribute = %attribute, missing = value.is_missing(), "resolved field");
            record.push(field.as_str(), value);
        }
        record
    }

    fn lookup(&self, attribute: &str, first_only: bool) -> FieldValue {
        if first_only {
            FieldValue::Single(self.document.query_first_value(attribute))
        } else {
            FieldValue::Multiple(self.document.query_values(attribute))
        }
    }
}
