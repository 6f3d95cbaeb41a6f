//! Allow/deny list shared by the whitelist and blacklist plugins

use serde::{Deserialize, Serialize};
use std::fmt;

/// A list entry: a numeric peer id or a free-form name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListEntry {
    Id(i64),
    Name(String),
}

impl ListEntry {
    /// Numeric input becomes an id, anything else a trimmed name
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(id) => ListEntry::Id(id),
            Err(_) => ListEntry::Name(trimmed.to_string()),
        }
    }

    /// Lower-cased string form used for every comparison
    pub fn canonical(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListEntry::Id(id) => write!(f, "{}", id),
            ListEntry::Name(name) => f.write_str(name),
        }
    }
}

/// Persisted list shape. The field is called `allow` for both list kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessList {
    pub enabled: bool,
    pub allow: Vec<ListEntry>,
}

impl AccessList {
    /// Case-insensitive match on the canonical string form, so `"42"` and `42` are equal
    pub fn contains(&self, candidate: impl fmt::Display) -> bool {
        let candidate = candidate.to_string().trim().to_lowercase();
        self.allow.iter().any(|e| e.canonical() == candidate)
    }

    /// Add entries that are not already present, returning how many were added
    pub fn add<'a>(&mut self, raw: impl IntoIterator<Item = &'a str>) -> usize {
        let mut added = 0;
        for value in raw {
            let entry = ListEntry::parse(value);
            if !self.contains(&entry) {
                self.allow.push(entry);
                added += 1;
            }
        }
        added
    }

    /// Remove matching entries, returning how many were removed
    pub fn remove<'a>(&mut self, raw: impl IntoIterator<Item = &'a str>) -> usize {
        let targets: Vec<String> = raw.into_iter().map(|v| ListEntry::parse(v).canonical()).collect();
        let before = self.allow.len();
        self.allow.retain(|e| !targets.contains(&e.canonical()));
        before - self.allow.len()
    }

    pub fn len(&self) -> usize {
        self.allow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allow.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_entry_matches_numeric_candidate() {
        let list: AccessList = serde_json::from_str(r#"{"enabled": true, "allow": ["42"]}"#).unwrap();
        assert!(list.contains(42));
        assert!(!list.contains(43));
    }

    #[test]
    fn test_numeric_entry_matches_string_candidate() {
        let list: AccessList = serde_json::from_str(r#"{"enabled": true, "allow": [42, "Alice"]}"#).unwrap();
        assert!(list.contains("42"));
        assert!(list.contains("alice"));
        assert_eq!(list.allow[0], ListEntry::Id(42));
    }

    #[test]
    fn test_add_skips_duplicates_case_insensitively() {
        let mut list = AccessList::default();
        assert_eq!(list.add(["Bob", "7", "bob", "7"]), 2);
        assert_eq!(list.allow, vec![ListEntry::Name("Bob".into()), ListEntry::Id(7)]);
    }

    #[test]
    fn test_remove_case_insensitive() {
        let mut list = AccessList::default();
        list.add(["Bob", "7", "carol"]);
        assert_eq!(list.remove(["BOB", "8"]), 1);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_missing_fields_default() {
        let list: AccessList = serde_json::from_str("{}").unwrap();
        assert!(!list.enabled);
        assert!(list.is_empty());
    }
}
