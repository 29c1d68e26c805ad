//! Logical field name to directory attribute name mapping.

/// Default fields resolved for a person, in output order.
pub const DEFAULT_ATTRIBUTES: &[(&str, &str)] = &[
    ("netid", "uid"),
    ("name", "preferredCn"),
    ("first_name", "preferredGivenname"),
    ("last_name", "preferredSn"),
    ("emplid", "emplId"),
    ("affiliation", "eduPersonPrimaryAffiliation"),
    ("email", "mail"),
    ("title", "employeeTitle"),
    ("ferpa", "employeeIsFerpaTrained"),
    ("dept_name", "employeePrimaryDeptName"),
    ("dept", "employeePrimaryDept"),
    ("building_number", "employeeBldgNum"),
    ("building_name", "employeeBldgName"),
    ("room_number", "employeeRoomNum"),
    ("phone", "employeePhone"),
    ("employee_type", "employeeType"),
];

/// Ordered `logical name -> directory attribute` pairs with unique keys.
///
/// Order is observable: records list their fields in mapping order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMapping {
    entries: Vec<(String, String)>,
}

impl AttributeMapping {
    /// Creates a mapping from `defaults`, collapsing repeated keys in place.
    pub fn new<I, K, V>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut mapping = Self {
            entries: Vec::new(),
        };
        mapping.initialize(defaults);
        mapping
    }

    /// Replaces the whole mapping with `defaults`.
    pub fn initialize<I, K, V>(&mut self, defaults: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.entries.clear();
        self.extend(defaults);
    }

    /// Adds or overwrites entries.
    ///
    /// An existing key keeps its position and takes the new attribute name; a
    /// new key is appended. Keys not mentioned in `entries` are untouched.
    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in entries {
            let key = key.into();
            let value = value.into();
            match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, attribute)) => *attribute = value,
                None => self.entries.push((key, value)),
            }
        }
    }

    /// The ordered `(logical name, directory attribute)` pairs.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Directory attribute mapped to `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, attribute)| attribute.as_str())
    }

    /// Returns true if `field` is mapped.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Number of mapped fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Logical field names in order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl Default for AttributeMapping {
    fn default() -> Self {
        Self::new(DEFAULT_ATTRIBUTES.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(mapping: &AttributeMapping, field: &str) -> Option<usize> {
        mapping.fields().position(|f| f == field)
    }

    #[test]
    fn default_mapping_covers_person_fields() {
        let mapping = AttributeMapping::default();
        for field in [
            "netid",
            "name",
            "first_name",
            "last_name",
            "emplid",
            "affiliation",
            "email",
            "title",
            "dept_name",
            "dept",
            "phone",
        ] {
            assert!(mapping.contains(field), "missing {field}");
        }
        assert_eq!(mapping.len(), DEFAULT_ATTRIBUTES.len());
        assert_eq!(mapping.fields().next(), Some("netid"));
        assert_eq!(mapping.get("email"), Some("mail"));
    }

    #[test]
    fn extend_appends_new_keys_last() {
        let mut mapping = AttributeMapping::default();
        mapping.extend([("status_history", "studentStatusHistory")]);

        assert_eq!(mapping.len(), DEFAULT_ATTRIBUTES.len() + 1);
        assert_eq!(
            mapping.entries().last(),
            Some(&(
                "status_history".to_string(),
                "studentStatusHistory".to_string()
            ))
        );
        assert_eq!(position(&mapping, "netid"), Some(0));
    }

    #[test]
    fn extend_overwrites_in_place() {
        let mut mapping = AttributeMapping::default();
        let before = position(&mapping, "email").unwrap();

        mapping.extend([("email", "mailAlternateAddress")]);

        assert_eq!(position(&mapping, "email"), Some(before));
        assert_eq!(mapping.get("email"), Some("mailAlternateAddress"));
        assert_eq!(mapping.len(), DEFAULT_ATTRIBUTES.len());
    }

    #[test]
    fn extend_mixes_overwrites_and_appends() {
        let mut mapping = AttributeMapping::new([("a", "attrA"), ("b", "attrB")]);
        mapping.extend([("c", "attrC"), ("a", "attrA2")]);

        let entries: Vec<(&str, &str)> = mapping
            .entries()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(entries, vec![("a", "attrA2"), ("b", "attrB"), ("c", "attrC")]);
    }

    #[test]
    fn initialize_replaces_everything() {
        let mut mapping = AttributeMapping::default();
        mapping.initialize([("netid", "uid")]);
        assert_eq!(mapping.len(), 1);
        assert!(!mapping.contains("email"));
    }

    #[test]
    fn duplicate_defaults_collapse() {
        let mapping = AttributeMapping::new([("a", "one"), ("b", "two"), ("a", "three")]);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get("a"), Some("three"));
        assert_eq!(position(&mapping, "a"), Some(0));
    }

    #[test]
    fn empty_mapping() {
        let mapping = AttributeMapping::new(Vec::<(String, String)>::new());
        assert!(mapping.is_empty());
        assert_eq!(mapping.get("netid"), None);
    }
}
