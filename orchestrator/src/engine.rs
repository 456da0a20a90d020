//! # Dialogue engine
//!
//! Runs one conversational turn: resolves device/product identity, merges
//! stored context, ranks candidate answer keys, queries the knowledge store
//! per candidate in rank order, escalates through the fixed fallback chain,
//! and commits context only once a terminal state is reached. "No answer
//! found" is a normal terminal outcome carried in the result, never an
//! error.

use std::sync::Arc;
use std::time::Duration;

use preference::{ContextPatch, ConversationContext, PreferenceStore};
use qa_core::{
    CandidateKey, ClassificationResult, Classifier, CandidateRanker, EngineError, ExtractiveQa,
    KnowledgeStore, PhraseParser, QueryMethod, ResponseCode, RetrievalQuery, RetrievalResult,
    Section,
};
use ranking::{KeyHierarchy, NormalizerConfig, ScoreNormalizer};
use regex::Regex;
use resolver::{DeviceRegistry, DeviceResolver, ProductClassifier};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use units::convert::normalize_unit;
use units::{ExtractedValue, ValueExtractor, ValueKind};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::intent_map::IntentMap;
use crate::state::TurnState;

/// One incoming request: question text plus an optional caller-supplied
/// device identifier. Stored context is read from the preference store.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub question: String,
    pub device_id: Option<String>,
}

/// Response shape handed to the (external) template renderer.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub result: RetrievalResult,
    pub state: TurnState,
    pub section: Option<Section>,
    /// The answer key that produced the result, when there is one.
    pub answer_key: Option<String>,
    /// Post-processed measurement for specification answers.
    pub extracted: Option<ExtractedValue>,
}

impl TurnOutcome {
    fn terminal(state: TurnState, code: ResponseCode) -> Self {
        Self {
            result: RetrievalResult::empty(code),
            state,
            section: None,
            answer_key: None,
            extracted: None,
        }
    }
}

/// Deferred context write, applied only after the turn reached a terminal
/// state inside its time budget.
struct Commit {
    family: String,
    patch: ContextPatch,
}

/// The retrieval orchestration engine. All collaborators are injected; the
/// engine itself holds no global state.
pub struct DialogEngine {
    classifier: Arc<dyn Classifier>,
    ranker: Arc<dyn CandidateRanker>,
    knowledge: Arc<dyn KnowledgeStore>,
    extractive_qa: Arc<dyn ExtractiveQa>,
    phrase_parser: Arc<dyn PhraseParser>,
    preferences: Arc<dyn PreferenceStore>,
    registry: DeviceRegistry,
    intent_map: IntentMap,
    device_resolver: DeviceResolver,
    product_classifier: ProductClassifier,
    normalizer: ScoreNormalizer,
    extractor: ValueExtractor,
    unit_hint_re: Regex,
    turn_timeout: Duration,
}

impl DialogEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        classifier: Arc<dyn Classifier>,
        ranker: Arc<dyn CandidateRanker>,
        knowledge: Arc<dyn KnowledgeStore>,
        extractive_qa: Arc<dyn ExtractiveQa>,
        phrase_parser: Arc<dyn PhraseParser>,
        preferences: Arc<dyn PreferenceStore>,
        registry: DeviceRegistry,
        intent_map: IntentMap,
        hierarchy: KeyHierarchy,
        config: &EngineConfig,
    ) -> Self {
        let normalizer = ScoreNormalizer::new(
            NormalizerConfig {
                threshold: config.score_threshold,
                max_predictions: config.max_predictions,
                expand_second_level: config.second_level_expansion,
            },
            hierarchy,
        );
        Self {
            classifier,
            ranker,
            knowledge,
            extractive_qa,
            phrase_parser,
            preferences,
            registry,
            intent_map,
            device_resolver: DeviceResolver::new(),
            product_classifier: ProductClassifier::new(),
            normalizer,
            extractor: ValueExtractor::new(),
            unit_hint_re: Regex::new(
                r"(?i)\bin\s+(cm|centimeters?|millimeters?|mm|inch(?:es)?|kg|kilograms?|lbs?|pounds?|celsius|fahrenheit|cu\.?\s*ft\.?)\b",
            )
            .expect("static regex"),
            turn_timeout: Duration::from_millis(config.turn_timeout_ms),
        }
    }

    /// Serves one conversational turn.
    ///
    /// The whole state machine runs under a single timeout; on elapse the
    /// turn ends with an internal-error result and context stays untouched.
    /// Transport failures from collaborators surface the same way. Every
    /// other outcome, including "not found", is a normal terminal result.
    #[instrument(skip(self, request), fields(turn_id = %Uuid::new_v4()))]
    pub async fn handle_turn(&self, request: &TurnRequest) -> TurnOutcome {
        match timeout(self.turn_timeout, self.run_turn(request)).await {
            Ok(Ok((outcome, commit))) => {
                if let Some(commit) = commit {
                    if let Err(e) = self.apply_commit(commit).await {
                        warn!(error = %e, "context commit failed after terminal state");
                    }
                }
                info!(state = %outcome.state, code = ?outcome.result.response_code, "step: turn finished");
                outcome
            }
            Ok(Err(e)) => {
                warn!(error = %e, "turn failed on collaborator transport");
                TurnOutcome::terminal(TurnState::Exhausted, ResponseCode::InternalError)
            }
            Err(_) => {
                let e = EngineError::Timeout(self.turn_timeout.as_millis() as u64);
                warn!(error = %e, "turn timed out");
                TurnOutcome::terminal(TurnState::Exhausted, ResponseCode::InternalError)
            }
        }
    }

    async fn apply_commit(&self, commit: Commit) -> Result<(), EngineError> {
        self.preferences
            .update(&commit.family, commit.patch)
            .await
            .map_err(|e| EngineError::Preference(e.to_string()))?;
        self.preferences
            .set_previous_family(&commit.family)
            .await
            .map_err(|e| EngineError::Preference(e.to_string()))?;
        Ok(())
    }

    async fn run_turn(
        &self,
        request: &TurnRequest,
    ) -> Result<(TurnOutcome, Option<Commit>), EngineError> {
        let question = request.question.trim();
        let mut state = TurnState::Init;
        info!(state = %state, "step: turn started");

        // Identity: in-question identifier > request-supplied > stored.
        let extracted_id = self.device_resolver.extract(question);
        let (q_family, q_sub) = self.product_classifier.classify(question);

        let prev_family = self
            .preferences
            .previous_family()
            .await
            .map_err(|e| EngineError::Preference(e.to_string()))?;
        let context_family = q_family.clone().or(prev_family);
        let stored: Option<ConversationContext> = match &context_family {
            Some(f) => Some(
                self.preferences
                    .get(f)
                    .await
                    .map_err(|e| EngineError::Preference(e.to_string()))?,
            ),
            None => None,
        };

        let raw_id = extracted_id
            .or_else(|| request.device_id.clone())
            .or_else(|| stored.as_ref().and_then(|c| c.device_id.clone()));
        let Some(raw_id) = raw_id else {
            info!("step: no device identifier anywhere, turn over");
            return Ok((
                TurnOutcome::terminal(TurnState::MissingIdentifier, ResponseCode::MissingIdentifier),
                None,
            ));
        };

        // Unknown identifiers stay raw; family derivation may still fail.
        let device_id = match self.device_resolver.resolve(&raw_id, &self.registry) {
            Some((id, confidence)) => {
                debug!(raw = %raw_id, resolved = %id, confidence, "device resolved");
                id
            }
            None => raw_id.clone(),
        };
        state = TurnState::IdentityResolved;
        info!(state = %state, device_id = %device_id, "step: identity resolved");

        // Product family: question > stored context > registry reverse lookup.
        let family = q_family
            .or_else(|| context_family.clone())
            .or_else(|| self.registry.family_of(&device_id).map(str::to_string));
        let Some(family) = family else {
            info!("step: no product family derivable, turn over");
            return Ok((
                TurnOutcome::terminal(TurnState::MissingProduct, ResponseCode::MissingProduct),
                None,
            ));
        };
        let sub_family = q_sub.or_else(|| stored.as_ref().and_then(|c| c.product_sub_family.clone()));
        state = TurnState::ContextValid;
        info!(state = %state, family = %family, sub_family = ?sub_family, "step: context valid");

        // Classification happens before any store call: fail fast, save cost.
        let classification = self
            .classifier
            .classify(question)
            .await
            .map_err(|e| EngineError::Classifier(e.to_string()))?;

        if classification.is_reset() {
            info!("step: reset command, clearing all contexts");
            self.preferences
                .reset()
                .await
                .map_err(|e| EngineError::Preference(e.to_string()))?;
            let mut outcome =
                TurnOutcome::terminal(TurnState::Success, ResponseCode::Success);
            outcome.result.found = true;
            return Ok((outcome, None));
        }

        if let Err(missing) = classification.validate() {
            warn!(section = %classification.section, missing = %missing, "invalid classification");
            let outcome = TurnOutcome {
                section: Some(classification.section),
                ..TurnOutcome::terminal(TurnState::Exhausted, ResponseCode::InvalidClassification)
            };
            return Ok((outcome, None));
        }
        let section = classification.section;

        let raw_candidates = self
            .ranker
            .rank(question, section, &family)
            .await
            .map_err(|e| EngineError::Similarity(e.to_string()))?;
        let candidates = self.normalizer.normalize(question, &raw_candidates, section);
        if candidates.is_empty() {
            info!("step: no candidates above threshold, turn over");
            let outcome = TurnOutcome {
                section: Some(section),
                ..TurnOutcome::terminal(TurnState::Exhausted, ResponseCode::NoCandidates)
            };
            let commit = self.build_commit(
                &family,
                &device_id,
                sub_family.as_deref(),
                question,
                None,
                None,
                None,
            );
            return Ok((outcome, Some(commit)));
        }

        // Candidate loop: strictly sequential, first valid result wins.
        state = TurnState::Querying;
        let mut best_paragraph: Option<String> = None;
        let mut success: Option<(RetrievalResult, String)> = None;

        for candidate in &candidates {
            info!(state = %state, key = %candidate.key, score = candidate.combined_score, "step: querying candidate");
            let query = self.build_query(
                candidate,
                section,
                &family,
                sub_family.as_deref(),
                &device_id,
                &classification,
            );
            let result = self
                .knowledge
                .query(&query)
                .await
                .map_err(|e| EngineError::Store(e.to_string()))?;

            if result.is_valid_for(section) {
                success = Some((result, candidate.key.clone()));
                break;
            }
            if section == Section::Operation {
                if let Some(first) = result.values.first() {
                    best_paragraph.get_or_insert_with(|| first.clone());
                }
            }
            debug!(key = %candidate.key, "candidate result insufficient, trying next");
        }

        // Escalation: operation-only full-text fallback, one retry.
        if success.is_none() && section == Section::Operation {
            state = TurnState::Escalating;
            info!(state = %state, "step: escalating through full-text fallback");
            success = self
                .escalate(question, sub_family.as_deref(), &device_id, &classification)
                .await?;

            if success.is_none() {
                if let Some(paragraph) = &best_paragraph {
                    success = self
                        .extractive_answer(paragraph, question, &classification)
                        .await;
                }
            }
        }

        let Some((mut result, answer_key)) = success else {
            info!("step: all candidates and fallbacks exhausted");
            let outcome = TurnOutcome {
                section: Some(section),
                ..TurnOutcome::terminal(TurnState::Exhausted, ResponseCode::NotFound)
            };
            let commit = self.build_commit(
                &family,
                &device_id,
                sub_family.as_deref(),
                question,
                None,
                None,
                None,
            );
            return Ok((outcome, Some(commit)));
        };

        result.response_code = ResponseCode::Success;

        // Specification answers get the unit post-pass.
        let unit_hint = self.detect_unit_hint(question);
        let preferred_unit = unit_hint
            .clone()
            .or_else(|| stored.as_ref().and_then(|c| c.preferred_unit.clone()));
        let extracted = if section == Section::Specification {
            self.post_process_units(&mut result, &answer_key, preferred_unit.as_deref())
        } else {
            None
        };

        let active_spec_key = (section == Section::Specification).then(|| answer_key.clone());
        let commit = self.build_commit(
            &family,
            &device_id,
            sub_family.as_deref(),
            question,
            summary_of(&result),
            active_spec_key,
            unit_hint,
        );

        let outcome = TurnOutcome {
            result,
            state: TurnState::Success,
            section: Some(section),
            answer_key: Some(answer_key),
            extracted,
        };
        Ok((outcome, Some(commit)))
    }

    fn build_query(
        &self,
        candidate: &CandidateKey,
        section: Section,
        family: &str,
        sub_family: Option<&str>,
        device_id: &str,
        classification: &ClassificationResult,
    ) -> RetrievalQuery {
        let (relation, intent) =
            match self.intent_map.lookup(section, family, sub_family, &candidate.key) {
                Some(entry) => (entry.relation.clone(), entry.intent.clone()),
                // Unmapped keys query by the key itself rather than being
                // skipped; the store treats unknown relations as misses.
                None => (candidate.key.clone(), classification.intent.clone()),
            };
        RetrievalQuery {
            answer_key: candidate.key.clone(),
            relation,
            section,
            device_id: device_id.to_string(),
            intent,
            product_sub_type: sub_family.map(str::to_string),
            query_method: QueryMethod::Default,
        }
    }

    /// Full-text fallback: derive a related key from noun/verb phrases,
    /// remap the relation from the hit's node type, retry exactly once.
    async fn escalate(
        &self,
        question: &str,
        sub_family: Option<&str>,
        device_id: &str,
        classification: &ClassificationResult,
    ) -> Result<Option<(RetrievalResult, String)>, EngineError> {
        // A parser outage only disables the fallback, not the turn.
        let phrases = match self.phrase_parser.parse(question).await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "phrase parser unavailable, skipping full-text fallback");
                return Ok(None);
            }
        };

        let hit = self
            .knowledge
            .full_text_search(device_id, question, &phrases.verb_phrases, &phrases.noun_phrases)
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?;
        let Some(hit) = hit else {
            return Ok(None);
        };

        let query = RetrievalQuery {
            answer_key: hit.related_key.clone(),
            relation: relation_for_node(&hit.node_type).to_string(),
            section: Section::Operation,
            device_id: device_id.to_string(),
            intent: classification.intent.clone(),
            product_sub_type: sub_family.map(str::to_string),
            query_method: QueryMethod::FullText,
        };
        let result = self
            .knowledge
            .query(&query)
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?;

        if result.is_valid_for(Section::Operation) {
            return Ok(Some((result, hit.related_key)));
        }
        Ok(None)
    }

    /// Extractive-QA last resort for how/what operation questions when the
    /// graph had only an unvalidated description paragraph to offer.
    async fn extractive_answer(
        &self,
        paragraph: &str,
        question: &str,
        classification: &ClassificationResult,
    ) -> Option<(RetrievalResult, String)> {
        let qt = classification.question_type.as_deref()?;
        if !matches!(qt, "how" | "what") {
            return None;
        }
        match self.extractive_qa.answer(paragraph, question).await {
            Ok(Some(answer)) if !answer.trim().is_empty() => {
                info!("step: extractive QA produced a span answer");
                let mut result = RetrievalResult::empty(ResponseCode::Success);
                result.found = true;
                result.values.push(answer);
                Some((result, "related description".to_string()))
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "extractive QA unavailable");
                None
            }
        }
    }

    /// Extracts and, when the context prefers another unit, converts the
    /// first specification value. Unrecognized units leave the original
    /// text unmodified.
    fn post_process_units(
        &self,
        result: &mut RetrievalResult,
        spec_key: &str,
        preferred_unit: Option<&str>,
    ) -> Option<ExtractedValue> {
        let first = result.values.first()?.clone();
        let extracted = self.extractor.extract(spec_key, &first)?;

        let Some(pref) = preferred_unit else {
            return Some(extracted);
        };
        let pref = normalize_unit(pref);
        if pref == extracted.unit {
            return Some(extracted);
        }
        match extracted.convert_to(&pref) {
            Ok(converted) => {
                result.values[0] = format_extracted(&converted);
                Some(converted)
            }
            Err(e) => {
                debug!(error = %e, "unit conversion skipped, keeping original text");
                Some(extracted)
            }
        }
    }

    fn detect_unit_hint(&self, question: &str) -> Option<String> {
        self.unit_hint_re
            .captures(question)
            .and_then(|c| c.get(1))
            .map(|m| normalize_unit(m.as_str()))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_commit(
        &self,
        family: &str,
        device_id: &str,
        sub_family: Option<&str>,
        question: &str,
        last_answer: Option<String>,
        active_spec_key: Option<String>,
        preferred_unit: Option<String>,
    ) -> Commit {
        Commit {
            family: family.to_string(),
            patch: ContextPatch {
                device_id: Some(device_id.to_string()),
                product_sub_family: sub_family.map(str::to_string),
                preferred_unit,
                active_spec_key,
                last_answer,
                last_question: Some(question.to_string()),
            },
        }
    }
}

/// Relation remap for full-text hits, driven by the node type of the hit.
fn relation_for_node(node_type: &str) -> &'static str {
    match node_type {
        "problem" => "has_solution",
        "feature" => "has_feature",
        "part" => "has_part_info",
        _ => "has_description",
    }
}

/// One-line summary of a result for the context's `last_answer` field.
fn summary_of(result: &RetrievalResult) -> Option<String> {
    result
        .values
        .first()
        .cloned()
        .or_else(|| result.solutions.first().cloned())
        .or_else(|| result.reasons.first().cloned())
        .or_else(|| result.features.first().map(|f| f.name.clone()))
}

/// Renders a converted measurement back into answer text.
fn format_extracted(value: &ExtractedValue) -> String {
    let nums: Vec<String> = value.numeric_values.iter().map(|v| format_num(*v)).collect();
    match value.kind {
        ValueKind::Dimension => format!("{} {}", nums.join(" x "), value.unit),
        ValueKind::Range => format!("{} {}", nums.join(" - "), value.unit),
        ValueKind::Single => format!("{} {}", nums.join(" "), value.unit),
    }
}

fn format_num(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_remap_covers_known_node_types() {
        assert_eq!(relation_for_node("problem"), "has_solution");
        assert_eq!(relation_for_node("feature"), "has_feature");
        assert_eq!(relation_for_node("part"), "has_part_info");
        assert_eq!(relation_for_node("anything else"), "has_description");
    }

    #[test]
    fn format_extracted_dimension() {
        let v = ExtractedValue {
            kind: ValueKind::Dimension,
            numeric_values: vec![68.58, 84.46, 99.06],
            unit: "cm".to_string(),
            spec_key: "product dimensions".to_string(),
        };
        assert_eq!(format_extracted(&v), "68.58 x 84.46 x 99.06 cm");
    }

    #[test]
    fn format_num_drops_trailing_zeroes_for_integers() {
        assert_eq!(format_num(27.0), "27");
        assert_eq!(format_num(33.25), "33.25");
    }
}
