//! Resolved person records.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Value resolved for one logical field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// First-value extraction; `None` when the attribute is absent.
    Single(Option<String>),
    /// Every value in document order; empty when the attribute is absent.
    Multiple(Vec<String>),
}

impl FieldValue {
    /// The single value, if this is a present first-value result.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(value) => value.as_deref(),
            Self::Multiple(_) => None,
        }
    }

    /// The value list, if this is a multi-value result.
    #[must_use]
    pub fn as_slice(&self) -> Option<&[String]> {
        match self {
            Self::Single(_) => None,
            Self::Multiple(values) => Some(values),
        }
    }

    /// Returns true when the directory had nothing for this field.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Single(value) => value.is_none(),
            Self::Multiple(values) => values.is_empty(),
        }
    }
}

/// Flat `logical name -> value` record in mapping order.
///
/// Produced fresh by every resolve; nothing here is cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryRecord {
    fields: Vec<(String, FieldValue)>,
}

impl DirectoryRecord {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.push((field.into(), value));
    }

    /// Value resolved for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Shorthand for a present single value.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    /// Fields and values in mapping order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Field names in mapping order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for DirectoryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DirectoryRecord {
        let mut record = DirectoryRecord::with_capacity(3);
        record.push("netid", FieldValue::Single(Some("jdavis".into())));
        record.push("phone", FieldValue::Single(None));
        record.push(
            "affiliations",
            FieldValue::Multiple(vec!["staff".into(), "member".into()]),
        );
        record
    }

    #[test]
    fn lookups_by_field() {
        let record = sample();
        assert_eq!(record.len(), 3);
        assert_eq!(record.get_str("netid"), Some("jdavis"));
        assert!(record.get("phone").unwrap().is_missing());
        assert_eq!(
            record.get("affiliations").and_then(FieldValue::as_slice),
            Some(&["staff".to_string(), "member".to_string()][..])
        );
        assert!(record.get("unknown").is_none());
    }

    #[test]
    fn serializes_in_field_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"netid":"jdavis","phone":null,"affiliations":["staff","member"]}"#
        );
    }

    #[test]
    fn field_order_is_preserved() {
        let record = sample();
        let names: Vec<&str> = record.fields().collect();
        assert_eq!(names, vec!["netid", "phone", "affiliations"]);
    }

    #[test]
    fn missing_values() {
        assert!(FieldValue::Multiple(Vec::new()).is_missing());
        assert!(!FieldValue::Single(Some(String::new())).is_missing());
    }
}
