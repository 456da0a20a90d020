//! Device registry: per-product-family lists of known identifiers.
//!
//! Identifiers may carry a trailing `*` wildcard standing for "any suffix"
//! (e.g. `WM4500H*A` covers every color/revision code in that position).
//! The registry is immutable after load; hot reload is owned by an external
//! loader that swaps the whole value.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Mapping from product family to its known device identifiers.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    families: HashMap<String, Vec<String>>,
}

impl DeviceRegistry {
    /// Builds a registry from an in-memory map (tests, embedded defaults).
    pub fn from_map(families: HashMap<String, Vec<String>>) -> Self {
        Self { families }
    }

    /// Loads a registry from a JSON file of shape
    /// `{ "washer": ["WM4500H*A", ...], ... }`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path)?;
        let families: HashMap<String, Vec<String>> = serde_json::from_str(&raw)?;
        Ok(Self { families })
    }

    /// Identifiers registered for one family, empty when unknown.
    pub fn identifiers(&self, family: &str) -> &[String] {
        self.families.get(family).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All known family names.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }

    /// Reverse lookup: the family whose registry contains the identifier,
    /// honoring wildcards. Used when identity resolution found a device but
    /// no product family.
    pub fn family_of(&self, identifier: &str) -> Option<&str> {
        for (family, ids) in &self.families {
            for id in ids {
                if id == identifier {
                    return Some(family);
                }
                if id.contains('*') {
                    if let Some(re) = wildcard_pattern(id) {
                        if re.is_match(identifier) {
                            return Some(family);
                        }
                    }
                }
            }
        }
        None
    }
}

/// Turns a wildcarded registry identifier into an anchored matches-any-suffix
/// pattern. Returns `None` only when the escaped identifier somehow fails to
/// compile, which callers treat as a non-match.
pub(crate) fn wildcard_pattern(identifier: &str) -> Option<Regex> {
    let escaped = regex::escape(identifier).replace(r"\*", ".*");
    Regex::new(&format!("(?i)^{}$", escaped)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DeviceRegistry {
        let mut m = HashMap::new();
        m.insert(
            "washer".to_string(),
            vec!["WM4500H*A".to_string(), "WT7900HBA".to_string()],
        );
        m.insert("dryer".to_string(), vec!["DLEX3900W".to_string()]);
        DeviceRegistry::from_map(m)
    }

    #[test]
    fn family_of_exact() {
        assert_eq!(sample().family_of("DLEX3900W"), Some("dryer"));
    }

    #[test]
    fn family_of_wildcard() {
        assert_eq!(sample().family_of("WM4500HBA"), Some("washer"));
    }

    #[test]
    fn family_of_unknown_is_none() {
        assert_eq!(sample().family_of("XYZ000"), None);
    }
}
