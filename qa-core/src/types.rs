//! Core types: classification output, candidate keys, the knowledge-store
//! query/result contract, and response codes.

use serde::{Deserialize, Serialize};

/// Manual section a question was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Specification,
    Troubleshooting,
    Operation,
    General,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Specification => "specification",
            Self::Troubleshooting => "troubleshooting",
            Self::Operation => "operation",
            Self::General => "general",
        };
        write!(f, "{}", s)
    }
}

/// Typed output of the external topic/intent classifier.
///
/// The upstream service is free-form; this struct is the validated boundary.
/// Mandatory fields depend on the section, see [`ClassificationResult::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub section: Section,
    /// Intent label within the section (e.g. `spec_lookup`, `reset`).
    pub intent: Option<String>,
    /// Finer-grained section, used by troubleshooting queries.
    pub sub_section: Option<String>,
    /// Surface question type (e.g. `how`, `what`, `yes_no`).
    pub question_type: Option<String>,
    /// Answer-key category hint for specification questions.
    pub category: Option<String>,
}

impl ClassificationResult {
    /// Checks that the fields mandatory for this section are present.
    ///
    /// - `Specification` needs `category`
    /// - `Troubleshooting` needs `sub_section`
    /// - `Operation` needs `intent`
    ///
    /// Returns the name of the first missing field.
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        match self.section {
            Section::Specification if self.category.is_none() => Err("category"),
            Section::Troubleshooting if self.sub_section.is_none() => Err("sub_section"),
            Section::Operation if self.intent.is_none() => Err("intent"),
            _ => Ok(()),
        }
    }

    /// True when the classifier labelled the turn as a context-reset command.
    pub fn is_reset(&self) -> bool {
        self.intent.as_deref() == Some("reset")
    }
}

/// A ranked answer-key candidate after score normalization.
///
/// Lists of candidates are ordered descending by `combined_score` and bounded
/// by the configured `max_predictions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateKey {
    pub key: String,
    /// Token-set overlap with the question, 0-100.
    pub lexical_score: f64,
    /// Score supplied by the external similarity service, 0-100.
    pub semantic_score: f64,
    pub combined_score: f64,
}

/// Lookup strategy the knowledge store should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMethod {
    Default,
    FullText,
}

/// The query contract issued to the knowledge store, one per candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub answer_key: String,
    pub relation: String,
    pub section: Section,
    pub device_id: String,
    pub intent: Option<String>,
    pub product_sub_type: Option<String>,
    pub query_method: QueryMethod,
}

/// A named feature returned for operation questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureItem {
    pub name: String,
    pub description: Option<String>,
}

/// Terminal outcome code for one conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCode {
    Success,
    /// No device identifier in question, request, or stored context.
    MissingIdentifier,
    /// Identifier known but no product family could be derived.
    MissingProduct,
    /// Classifier output missing a mandatory field for its section.
    InvalidClassification,
    /// Similarity service returned no candidates above threshold.
    NoCandidates,
    /// Store reachable, query valid, no matching data. Not an error.
    NotFound,
    /// Transport/connection failure or timeout. Context is not updated.
    InternalError,
}

/// Result of one knowledge-store query (or of a whole exhausted turn).
///
/// `found == false` with `response_code == NotFound` is a normal terminal
/// state, distinct from an empty-but-successful result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub found: bool,
    pub values: Vec<String>,
    pub reasons: Vec<String>,
    pub solutions: Vec<String>,
    pub features: Vec<FeatureItem>,
    pub response_code: ResponseCode,
}

impl RetrievalResult {
    /// An empty result carrying only a terminal response code.
    pub fn empty(code: ResponseCode) -> Self {
        Self {
            found: false,
            values: Vec::new(),
            reasons: Vec::new(),
            solutions: Vec::new(),
            features: Vec::new(),
            response_code: code,
        }
    }

    /// Section-specific validation: does this result actually answer the
    /// question for the given section?
    ///
    /// - troubleshooting: a reason OR a solution
    /// - operation: a feature OR a description value
    /// - specification: a non-empty value list
    pub fn is_valid_for(&self, section: Section) -> bool {
        if !self.found {
            return false;
        }
        match section {
            Section::Troubleshooting => !self.reasons.is_empty() || !self.solutions.is_empty(),
            Section::Operation => !self.features.is_empty() || !self.values.is_empty(),
            Section::Specification => !self.values.is_empty(),
            Section::General => !self.values.is_empty(),
        }
    }
}
