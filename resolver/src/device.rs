//! Device-identifier extraction and fuzzy resolution.
//!
//! Extraction pulls a model/part-shaped token out of free text; resolution
//! matches it against the registry in two passes (wildcard pattern match,
//! then a bounded edit-distance fallback). "No match" is a normal answer,
//! not an error: the caller decides whether a turn can proceed without it.

use qa_core::text::levenshtein;
use regex::Regex;
use tracing::debug;

use crate::registry::{wildcard_pattern, DeviceRegistry};

/// Identifiers this close (Levenshtein) to a registry entry still resolve.
const MAX_EDIT_DISTANCE: usize = 2;

/// Extracts and resolves device identifiers.
pub struct DeviceResolver {
    extract_re: Regex,
}

impl DeviceResolver {
    pub fn new() -> Self {
        // letters + digits + (letter | wildcard | digits) + optional suffix,
        // e.g. WM4500H*A, DLEX3900W, LFXS26973S, WT7900HBA.
        let extract_re =
            Regex::new(r"[A-Za-z]{1,4}[0-9]{2,6}[A-Za-z0-9*][A-Za-z0-9*./-]*").expect("static regex");
        Self { extract_re }
    }

    /// Extracts a device identifier from free text.
    ///
    /// When the text contains several identifier-shaped tokens, the longest
    /// one wins provided it is longer than 6 characters. Empty input
    /// returns `None`.
    pub fn extract(&self, text: &str) -> Option<String> {
        let mut matches: Vec<&str> = self.extract_re.find_iter(text).map(|m| m.as_str()).collect();
        if matches.is_empty() {
            return None;
        }
        if matches.len() == 1 {
            return Some(matches[0].to_uppercase());
        }
        matches.sort_by_key(|m| std::cmp::Reverse(m.len()));
        let longest = matches[0];
        if longest.len() > 6 {
            Some(longest.to_uppercase())
        } else {
            // No clearly dominant token; keep the first occurrence.
            self.extract_re
                .find(text)
                .map(|m| m.as_str().to_uppercase())
        }
    }

    /// Resolves a raw identifier against the registry.
    ///
    /// Pass 1: registry identifiers of the same character length, wildcard
    /// suffixes expanded to matches-any-suffix patterns; first match wins
    /// with confidence 1.0. Pass 2: Levenshtein over the same length group,
    /// minimum distance wins when the distance is at most 2, with
    /// confidence `1 - dist/len`. Families are scanned in sorted name
    /// order, so overlapping patterns resolve the same way every run.
    ///
    /// Returns `None` when the identifier is unknown.
    pub fn resolve(&self, raw: &str, registry: &DeviceRegistry) -> Option<(String, f64)> {
        if raw.is_empty() {
            return None;
        }
        let raw_len = raw.chars().count();

        let mut families: Vec<&str> = registry.families().collect();
        families.sort_unstable();
        let length_group: Vec<&String> = families
            .iter()
            .flat_map(|f| registry.identifiers(f).iter())
            .filter(|id| id.chars().count() == raw_len)
            .collect();

        // Pass 1: wildcard-aware exact pattern match.
        for id in &length_group {
            if let Some(re) = wildcard_pattern(id) {
                if re.is_match(raw) {
                    debug!(raw = %raw, matched = %id, "device resolved by pattern");
                    return Some((id.to_string(), 1.0));
                }
            }
        }

        // Pass 2: edit-distance fallback over the same group.
        let best = length_group
            .iter()
            .map(|id| (id, levenshtein(&raw.to_uppercase(), &id.to_uppercase())))
            .min_by_key(|(_, dist)| *dist)?;
        if best.1 <= MAX_EDIT_DISTANCE {
            let confidence = 1.0 - best.1 as f64 / raw_len as f64;
            debug!(raw = %raw, matched = %best.0, distance = best.1, "device resolved by edit distance");
            return Some((best.0.to_string(), confidence));
        }

        None
    }
}

impl Default for DeviceResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn registry() -> DeviceRegistry {
        let mut m = HashMap::new();
        m.insert(
            "washer".to_string(),
            vec!["WM4500H*A".to_string(), "WT7900HBA".to_string()],
        );
        m.insert("dryer".to_string(), vec!["DLEX3900W".to_string()]);
        DeviceRegistry::from_map(m)
    }

    #[test]
    fn extract_from_sentence() {
        let r = DeviceResolver::new();
        assert_eq!(
            r.extract("my washer model is wm4500hba and it leaks"),
            Some("WM4500HBA".to_string())
        );
    }

    #[test]
    fn extract_empty_is_none() {
        let r = DeviceResolver::new();
        assert_eq!(r.extract(""), None);
        assert_eq!(r.extract("the spin cycle is loud"), None);
    }

    #[test]
    fn extract_longest_of_many() {
        let r = DeviceResolver::new();
        assert_eq!(
            r.extract("is WM4500HBA the same as WT79?"),
            Some("WM4500HBA".to_string())
        );
    }

    #[test]
    fn extract_is_idempotent() {
        let r = DeviceResolver::new();
        let first = r.extract("model DLEX3900W please").unwrap();
        assert_eq!(r.extract(&first), Some(first.clone()));
    }

    #[test]
    fn resolve_wildcard_match() {
        let r = DeviceResolver::new();
        let (id, conf) = r.resolve("WM4500HBA", &registry()).unwrap();
        assert_eq!(id, "WM4500H*A");
        assert_eq!(conf, 1.0);
    }

    #[test]
    fn resolve_registry_roundtrip_is_exact() {
        let r = DeviceResolver::new();
        let reg = registry();
        for family in ["washer", "dryer"] {
            for id in reg.identifiers(family) {
                let (resolved, conf) = r.resolve(id, &reg).unwrap();
                assert_eq!(&resolved, id);
                assert_eq!(conf, 1.0);
            }
        }
    }

    #[test]
    fn resolve_overlapping_wildcards_is_deterministic() {
        // Both patterns match the raw id; the sorted-first family wins
        // regardless of map iteration order.
        let mut m = HashMap::new();
        m.insert("dryer".to_string(), vec!["DL123*A".to_string()]);
        m.insert("washer".to_string(), vec!["DL12*9A".to_string()]);
        let reg = DeviceRegistry::from_map(m);

        let r = DeviceResolver::new();
        for _ in 0..10 {
            let (id, conf) = r.resolve("DL1239A", &reg).unwrap();
            assert_eq!(id, "DL123*A");
            assert_eq!(conf, 1.0);
        }
    }

    #[test]
    fn resolve_typo_within_edit_distance() {
        let r = DeviceResolver::new();
        let (id, conf) = r.resolve("DLEX3900V", &registry()).unwrap();
        assert_eq!(id, "DLEX3900W");
        assert!(conf < 1.0 && conf > 0.8);
    }

    #[test]
    fn resolve_unknown_is_none() {
        let r = DeviceResolver::new();
        assert!(r.resolve("XYZ000", &registry()).is_none());
    }
}
