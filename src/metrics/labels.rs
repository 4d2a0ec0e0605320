// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Label sets identifying histogram series.
//!
//! Label values are expected to be low-cardinality, enum-like strings
//! (controller names, action names, module names). Nothing here checks that:
//! the code choosing the labels owns the cardinality budget.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An immutable mapping from label name to label value.
///
/// Backed by an ordered map, so equality, hashing and [`LabelSet::key`] do not
/// depend on the order labels were inserted in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeMap<String, String>);

impl LabelSet {
    /// An empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with one extra label; an existing value for `name` is replaced.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Right-biased merge: on a key collision the value from `other` wins.
    pub fn merge(&self, other: &LabelSet) -> LabelSet {
        let mut merged = self.0.clone();
        merged.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        LabelSet(merged)
    }

    /// Look up a label value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no labels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate labels in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Stable string key, e.g. `action="show",controller="Commits"`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{name}={value:?}")?;
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for LabelSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for LabelSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = LabelSet::new().with("controller", "Commits").with("action", "show");
        let b = LabelSet::new().with("action", "show").with("controller", "Commits");
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_merge_is_right_biased() {
        let left = LabelSet::from([("controller", "Commits"), ("action", "show")]);
        let right = LabelSet::from([("action", "diff_for_path"), ("module", "Commit")]);

        let merged = left.merge(&right);
        assert_eq!(merged.get("controller"), Some("Commits"));
        assert_eq!(merged.get("action"), Some("diff_for_path"));
        assert_eq!(merged.get("module"), Some("Commit"));
        assert_eq!(merged.len(), 3);

        // Operands are untouched
        assert_eq!(left.get("action"), Some("show"));
        assert_eq!(right.len(), 2);
    }

    #[test]
    fn test_key_format() {
        let labels = LabelSet::from([("method", "sign_in"), ("module", "User")]);
        assert_eq!(labels.key(), r#"method="sign_in",module="User""#);
        assert_eq!(LabelSet::new().key(), "");
    }

    #[test]
    fn test_serializes_as_map() {
        let labels = LabelSet::from([("module", "User")]);
        let json = serde_json::to_string(&labels).unwrap();
        assert_eq!(json, r#"{"module":"User"}"#);

        let parsed: LabelSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, labels);
    }
}
