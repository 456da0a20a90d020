//! Two-level answer-key hierarchy.
//!
//! Troubleshooting keys form a parent/child grouping: a first-level key
//! like `noise` groups second-level specializations like `noise during
//! spin`. The normalizer uses this to expand a lone L1 survivor into all
//! its L2 siblings.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HierarchyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parent/children lookup over answer keys.
#[derive(Debug, Clone, Default)]
pub struct KeyHierarchy {
    parent_of: HashMap<String, String>,
    children_of: HashMap<String, Vec<String>>,
}

impl KeyHierarchy {
    /// Builds a hierarchy from `parent -> children` groups.
    pub fn from_groups(groups: HashMap<String, Vec<String>>) -> Self {
        let mut parent_of = HashMap::new();
        for (parent, children) in &groups {
            for child in children {
                parent_of.insert(child.clone(), parent.clone());
            }
        }
        Self {
            parent_of,
            children_of: groups,
        }
    }

    /// Loads a hierarchy from a JSON file of shape
    /// `{ "noise": ["noise during spin", "noise when draining"], ... }`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, HierarchyError> {
        let raw = std::fs::read_to_string(path)?;
        let groups: HashMap<String, Vec<String>> = serde_json::from_str(&raw)?;
        Ok(Self::from_groups(groups))
    }

    pub fn parent(&self, key: &str) -> Option<&str> {
        self.parent_of.get(key).map(String::as_str)
    }

    pub fn children(&self, parent: &str) -> &[String] {
        self.children_of
            .get(parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All keys sharing the given key's parent (including the key itself).
    /// A key that is itself a parent returns its children. Keys outside the
    /// hierarchy return an empty slice.
    pub fn siblings(&self, key: &str) -> &[String] {
        if let Some(parent) = self.parent(key) {
            return self.children(parent);
        }
        self.children(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KeyHierarchy {
        let mut groups = HashMap::new();
        groups.insert(
            "noise".to_string(),
            vec![
                "noise during spin".to_string(),
                "noise when draining".to_string(),
            ],
        );
        KeyHierarchy::from_groups(groups)
    }

    #[test]
    fn siblings_of_child() {
        let h = sample();
        assert_eq!(h.siblings("noise during spin").len(), 2);
    }

    #[test]
    fn siblings_of_parent_are_children() {
        let h = sample();
        assert_eq!(h.siblings("noise").len(), 2);
    }

    #[test]
    fn unknown_key_has_no_siblings() {
        let h = sample();
        assert!(h.siblings("door lock").is_empty());
    }
}
