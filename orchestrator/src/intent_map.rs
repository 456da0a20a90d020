//! Intent-mapping table: static per-section, per-product mapping from an
//! answer key to the knowledge-store relation/intent used to query it.
//!
//! Scopes keyed by (section, family, optional sub-family); a sub-family
//! lookup falls back to the family-wide scope when no narrower entry
//! exists.

use std::collections::HashMap;
use std::path::Path;

use qa_core::Section;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntentMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Relation/intent pair for one answer key.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentEntry {
    pub relation: String,
    pub intent: Option<String>,
}

/// One (section, family, sub-family) scope of the table.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentScope {
    pub section: Section,
    pub family: String,
    #[serde(default)]
    pub sub_family: Option<String>,
    pub entries: HashMap<String, IntentEntry>,
}

/// The whole intent-mapping table.
#[derive(Debug, Clone, Default)]
pub struct IntentMap {
    scopes: Vec<IntentScope>,
}

impl IntentMap {
    pub fn from_scopes(scopes: Vec<IntentScope>) -> Self {
        Self { scopes }
    }

    /// Loads the table from a JSON array of scopes.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IntentMapError> {
        let raw = std::fs::read_to_string(path)?;
        let scopes: Vec<IntentScope> = serde_json::from_str(&raw)?;
        Ok(Self { scopes })
    }

    /// Looks up the relation/intent for an answer key.
    ///
    /// Tries the exact (section, family, sub-family) scope first, then the
    /// family-wide scope without a sub-family.
    pub fn lookup(
        &self,
        section: Section,
        family: &str,
        sub_family: Option<&str>,
        key: &str,
    ) -> Option<&IntentEntry> {
        if sub_family.is_some() {
            let narrow = self
                .scopes
                .iter()
                .find(|s| {
                    s.section == section
                        && s.family == family
                        && s.sub_family.as_deref() == sub_family
                })
                .and_then(|s| s.entries.get(key));
            if narrow.is_some() {
                return narrow;
            }
        }
        self.scopes
            .iter()
            .find(|s| s.section == section && s.family == family && s.sub_family.is_none())
            .and_then(|s| s.entries.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> IntentMap {
        let mut family_wide = HashMap::new();
        family_wide.insert(
            "net weight".to_string(),
            IntentEntry {
                relation: "has_spec_net_weight".to_string(),
                intent: Some("spec_lookup".to_string()),
            },
        );
        let mut front_load = HashMap::new();
        front_load.insert(
            "net weight".to_string(),
            IntentEntry {
                relation: "has_spec_net_weight_front".to_string(),
                intent: Some("spec_lookup".to_string()),
            },
        );
        IntentMap::from_scopes(vec![
            IntentScope {
                section: Section::Specification,
                family: "washer".to_string(),
                sub_family: None,
                entries: family_wide,
            },
            IntentScope {
                section: Section::Specification,
                family: "washer".to_string(),
                sub_family: Some("front_load".to_string()),
                entries: front_load,
            },
        ])
    }

    #[test]
    fn sub_family_scope_wins() {
        let m = table();
        let e = m
            .lookup(Section::Specification, "washer", Some("front_load"), "net weight")
            .unwrap();
        assert_eq!(e.relation, "has_spec_net_weight_front");
    }

    #[test]
    fn falls_back_to_family_scope() {
        let m = table();
        let e = m
            .lookup(Section::Specification, "washer", Some("top_load"), "net weight")
            .unwrap();
        assert_eq!(e.relation, "has_spec_net_weight");
    }

    #[test]
    fn unknown_key_is_none() {
        let m = table();
        assert!(m
            .lookup(Section::Specification, "washer", None, "spin speed")
            .is_none());
    }
}
