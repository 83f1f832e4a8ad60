use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::StorageRecord;

/// A field as declared by the form definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub identifier: String,
    #[serde(default)]
    pub element_type: Option<String>,
}

impl FormField {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            element_type: None,
        }
    }

    pub fn with_element_type(mut self, element_type: impl Into<String>) -> Self {
        self.element_type = Some(element_type.into());
        self
    }
}

/// Which field keys never reach storage, tables or exports.
///
/// A key listed in `allow` is always kept, even if a deny rule matches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreRules {
    pub keys: Vec<String>,
    pub prefixes: Vec<String>,
    pub element_types: Vec<String>,
    pub allow: Vec<String>,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            keys: vec!["databaseStorageIdentifier".to_string()],
            prefixes: vec!["__".to_string()],
            element_types: vec![
                "StaticText".to_string(),
                "Honeypot".to_string(),
                "Captcha".to_string(),
                "Section".to_string(),
            ],
            allow: Vec::new(),
        }
    }
}

impl IgnoreRules {
    /// Rules that ignore nothing.
    pub fn none() -> Self {
        Self {
            keys: Vec::new(),
            prefixes: Vec::new(),
            element_types: Vec::new(),
            allow: Vec::new(),
        }
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        if self.allow.iter().any(|allowed| allowed == key) {
            return false;
        }

        self.keys.iter().any(|ignored| ignored == key)
            || self.prefixes.iter().any(|prefix| key.starts_with(prefix.as_str()))
    }

    pub fn is_ignored_field(&self, field: &FormField) -> bool {
        if self.allow.iter().any(|allowed| *allowed == field.identifier) {
            return false;
        }

        let ignored_type = field
            .element_type
            .as_deref()
            .map(|element_type| self.element_types.iter().any(|t| t == element_type))
            .unwrap_or(false);

        ignored_type || self.is_ignored(&field.identifier)
    }
}

/// Derives table/export columns from stored records.
///
/// Built per call from borrowed rules; it keeps no state between requests.
#[derive(Debug, Clone, Copy)]
pub struct FieldLabelResolver<'a> {
    rules: &'a IgnoreRules,
}

impl<'a> FieldLabelResolver<'a> {
    pub fn new(rules: &'a IgnoreRules) -> Self {
        Self { rules }
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.rules.is_ignored(key)
    }

    /// Union of all property keys in first-seen order, minus ignored keys.
    pub fn resolve_labels<'r, I>(&self, records: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'r StorageRecord>,
    {
        let mut labels: IndexSet<&str> = IndexSet::new();

        for record in records {
            for key in record.properties.keys() {
                if !self.is_ignored(key) {
                    labels.insert(key.as_str());
                }
            }
        }

        labels.into_iter().map(str::to_string).collect()
    }

    /// Labels from a form's declared fields.
    pub fn resolve_declared(&self, fields: &[FormField]) -> Vec<String> {
        let mut labels: IndexSet<&str> = IndexSet::new();

        for field in fields {
            if !self.rules.is_ignored_field(field) {
                labels.insert(field.identifier.as_str());
            }
        }

        labels.into_iter().map(str::to_string).collect()
    }

    /// Display value of `key`, empty when the record has no such property.
    pub fn value_of(&self, record: &StorageRecord, key: &str) -> String {
        record
            .get(key)
            .map(|value| value.display_value())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Properties, PropertyValue};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(pairs: &[(&str, serde_json::Value)]) -> StorageRecord {
        let properties: Properties = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), PropertyValue::from(v.clone())))
            .collect();
        StorageRecord::new("test-form", properties).unwrap()
    }

    #[test]
    fn test_labels_are_union_in_first_seen_order() {
        let rules = IgnoreRules::none();
        let resolver = FieldLabelResolver::new(&rules);
        let records = vec![
            record(&[("a", json!(1)), ("b", json!(2))]),
            record(&[("b", json!(3)), ("c", json!(4))]),
        ];

        assert_eq!(resolver.resolve_labels(&records), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ignored_keys_are_dropped() {
        let rules = IgnoreRules::default();
        let resolver = FieldLabelResolver::new(&rules);
        let records = vec![record(&[
            ("__trustedProperties", json!("x")),
            ("name", json!("Jo")),
            ("databaseStorageIdentifier", json!("abc")),
            ("email", json!("jo@example.com")),
        ])];

        assert_eq!(resolver.resolve_labels(&records), vec!["name", "email"]);
    }

    #[test]
    fn test_allow_overrides_deny() {
        let mut rules = IgnoreRules::default();
        rules.allow.push("__keep".to_string());

        assert!(!rules.is_ignored("__keep"));
        assert!(rules.is_ignored("__csrfToken"));
    }

    #[test]
    fn test_declared_fields_skip_ignored_element_types() {
        let rules = IgnoreRules::default();
        let resolver = FieldLabelResolver::new(&rules);
        let fields = vec![
            FormField::new("intro").with_element_type("StaticText"),
            FormField::new("name").with_element_type("SingleLineText"),
            FormField::new("trap").with_element_type("Honeypot"),
            FormField::new("message"),
        ];

        assert_eq!(resolver.resolve_declared(&fields), vec!["name", "message"]);
    }

    #[test]
    fn test_value_of_missing_key_is_empty() {
        let rules = IgnoreRules::none();
        let resolver = FieldLabelResolver::new(&rules);
        let entry = record(&[("a", json!("x"))]);

        assert_eq!(resolver.value_of(&entry, "a"), "x");
        assert_eq!(resolver.value_of(&entry, "missing"), "");
    }

    #[test]
    fn test_no_records_no_labels() {
        let rules = IgnoreRules::default();
        let resolver = FieldLabelResolver::new(&rules);

        assert!(resolver.resolve_labels(&Vec::<StorageRecord>::new()).is_empty());
    }
}
