//! Candidate score normalization and re-ranking.

use qa_core::text::token_set_ratio;
use qa_core::{CandidateKey, RankedCandidate, Section};
use tracing::debug;

use crate::hierarchy::KeyHierarchy;

/// Combined score floor applied when the semantic service reports an exact
/// match. Keeps a perfect upstream match from sinking on a weak lexical
/// ratio without letting the service's optimistic 100 dominate outright.
/// Empirically tuned; treat as a tunable, not an invariant.
pub const EXACT_MATCH_FLOOR: f64 = 80.0;

/// Normalizer settings.
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Candidates with a semantic score below this are dropped outright
    /// (unless the semantic score is exactly 100).
    pub threshold: f64,
    /// Upper bound on the returned candidate list.
    pub max_predictions: usize,
    /// Enables second-level expansion of a lone troubleshooting key.
    pub expand_second_level: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            threshold: 20.0,
            max_predictions: 3,
            expand_second_level: true,
        }
    }
}

/// Combines lexical and semantic scores into ranked candidate keys.
pub struct ScoreNormalizer {
    config: NormalizerConfig,
    hierarchy: KeyHierarchy,
}

impl ScoreNormalizer {
    pub fn new(config: NormalizerConfig, hierarchy: KeyHierarchy) -> Self {
        Self { config, hierarchy }
    }

    /// Normalizes raw candidates from the similarity service.
    ///
    /// For each candidate: the lexical score is the token-set ratio between
    /// question and key text. A semantic score of exactly 100 (upstream
    /// exact string match) yields `max(lexical, 80)`; otherwise candidates
    /// below the threshold are dropped and the combined score is the
    /// semantic score rounded to two decimals. The result is sorted
    /// descending by combined score and bounded by `max_predictions`.
    pub fn normalize(
        &self,
        question: &str,
        raw: &[RankedCandidate],
        section: Section,
    ) -> Vec<CandidateKey> {
        let mut candidates: Vec<CandidateKey> = raw
            .iter()
            .filter_map(|c| {
                let lexical = token_set_ratio(question, &c.key);
                let combined = if (c.semantic_score - 100.0).abs() < f64::EPSILON {
                    lexical.max(EXACT_MATCH_FLOOR)
                } else if c.semantic_score >= self.config.threshold {
                    round2(c.semantic_score)
                } else {
                    debug!(key = %c.key, semantic = c.semantic_score, "candidate below threshold, dropped");
                    return None;
                };
                Some(CandidateKey {
                    key: c.key.clone(),
                    lexical_score: round2(lexical),
                    semantic_score: c.semantic_score,
                    combined_score: combined,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(self.config.max_predictions);

        if self.should_expand(&candidates, section) {
            candidates = self.expand_second_level(&candidates[0]);
        }

        candidates
    }

    /// Expansion applies only when exactly one distinct key survived for a
    /// troubleshooting question and the feature is enabled.
    fn should_expand(&self, candidates: &[CandidateKey], section: Section) -> bool {
        if !self.config.expand_second_level || section != Section::Troubleshooting {
            return false;
        }
        let keys: std::collections::BTreeSet<&str> =
            candidates.iter().map(|c| c.key.as_str()).collect();
        keys.len() == 1
            && !self
                .hierarchy
                .siblings(keys.iter().next().copied().unwrap_or_default())
                .is_empty()
    }

    /// Converts an L1 survivor into all its L2 specializations, each
    /// inheriting the survivor's scores, for the caller to disambiguate.
    fn expand_second_level(&self, survivor: &CandidateKey) -> Vec<CandidateKey> {
        let siblings = self.hierarchy.siblings(&survivor.key);
        debug!(key = %survivor.key, count = siblings.len(), "second-level expansion");
        // The sibling set may exceed max_predictions; the whole point is to
        // hand every L2 specialization to the caller for disambiguation.
        siblings
            .iter()
            .map(|key| CandidateKey {
                key: key.clone(),
                lexical_score: survivor.lexical_score,
                semantic_score: survivor.semantic_score,
                combined_score: survivor.combined_score,
            })
            .collect()
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn normalizer(expand: bool) -> ScoreNormalizer {
        let mut groups = HashMap::new();
        groups.insert(
            "noise".to_string(),
            vec![
                "noise during spin".to_string(),
                "noise when draining".to_string(),
            ],
        );
        ScoreNormalizer::new(
            NormalizerConfig {
                expand_second_level: expand,
                ..Default::default()
            },
            KeyHierarchy::from_groups(groups),
        )
    }

    fn raw(key: &str, semantic: f64) -> RankedCandidate {
        RankedCandidate {
            key: key.to_string(),
            semantic_score: semantic,
        }
    }

    #[test]
    fn sorted_descending_and_bounded() {
        let n = normalizer(false);
        let out = n.normalize(
            "what is the net weight",
            &[
                raw("net weight", 95.0),
                raw("drum capacity", 40.0),
                raw("spin speed", 60.0),
                raw("door diameter", 35.0),
            ],
            Section::Specification,
        );
        assert_eq!(out.len(), 3);
        assert!(out.windows(2).all(|w| w[0].combined_score >= w[1].combined_score));
        assert_eq!(out[0].key, "net weight");
    }

    #[test]
    fn below_threshold_is_dropped_not_deprioritized() {
        let n = normalizer(false);
        let out = n.normalize(
            "weird question",
            &[raw("net weight", 12.0), raw("spin speed", 25.0)],
            Section::Specification,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "spin speed");
    }

    #[test]
    fn exact_semantic_match_floors_at_80() {
        let n = normalizer(false);
        // Single short token: lexical mismatch would otherwise tank the score.
        let out = n.normalize("rpm", &[raw("maximum spin speed", 100.0)], Section::Specification);
        assert_eq!(out.len(), 1);
        assert!(out[0].combined_score >= EXACT_MATCH_FLOOR);
    }

    #[test]
    fn exact_semantic_match_keeps_higher_lexical() {
        let n = normalizer(false);
        let out = n.normalize("net weight", &[raw("net weight", 100.0)], Section::Specification);
        assert_eq!(out[0].combined_score, 100.0);
    }

    #[test]
    fn lone_troubleshooting_key_expands_to_siblings() {
        let n = normalizer(true);
        let out = n.normalize(
            "my washer is making noise",
            &[raw("noise", 70.0)],
            Section::Troubleshooting,
        );
        let keys: Vec<&str> = out.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["noise during spin", "noise when draining"]);
        assert!(out.iter().all(|c| (c.combined_score - 70.0).abs() < 1e-9));
    }

    #[test]
    fn no_expansion_for_specification_section() {
        let n = normalizer(true);
        let out = n.normalize(
            "my washer is making noise",
            &[raw("noise", 70.0)],
            Section::Specification,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "noise");
    }

    #[test]
    fn no_expansion_when_disabled() {
        let n = normalizer(false);
        let out = n.normalize(
            "my washer is making noise",
            &[raw("noise", 70.0)],
            Section::Troubleshooting,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "noise");
    }

    #[test]
    fn no_expansion_with_two_distinct_keys() {
        let n = normalizer(true);
        let out = n.normalize(
            "noise and leaking",
            &[raw("noise", 70.0), raw("leak", 60.0)],
            Section::Troubleshooting,
        );
        assert_eq!(out.len(), 2);
    }
}
