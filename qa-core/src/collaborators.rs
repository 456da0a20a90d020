//! Collaborator traits: the external NLP and storage services the
//! orchestrator consumes. All calls are synchronous request/response from
//! the orchestrator's point of view; implementations are injected at
//! construction (no process-wide singletons).

use async_trait::async_trait;

use crate::types::{ClassificationResult, RetrievalQuery, RetrievalResult, Section};

/// Topic/intent/section classifier.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifies a question into section, intent, and related labels.
    async fn classify(&self, question: &str) -> Result<ClassificationResult, anyhow::Error>;
}

/// A raw candidate from the semantic similarity service, before
/// normalization and re-ranking.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub key: String,
    /// Similarity score 0-100 as reported by the service. 100 means the
    /// service saw an exact string match upstream.
    pub semantic_score: f64,
}

/// Semantic-similarity candidate ranker.
#[async_trait]
pub trait CandidateRanker: Send + Sync {
    /// Returns candidate answer keys for a question, ordered by the service.
    async fn rank(
        &self,
        question: &str,
        section: Section,
        product_family: &str,
    ) -> Result<Vec<RankedCandidate>, anyhow::Error>;
}

/// Hit returned by the knowledge store's full-text fallback search.
#[derive(Debug, Clone)]
pub struct FullTextHit {
    pub related_key: String,
    /// Graph node type of the hit (e.g. `problem`, `feature`, `part`).
    pub node_type: String,
}

/// The knowledge store the orchestrator queries per candidate.
///
/// Transport failures surface as `Err`; "no matching data" is a successful
/// `RetrievalResult { found: false, .. }`, never an error.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Executes one retrieval query.
    async fn query(&self, query: &RetrievalQuery) -> Result<RetrievalResult, anyhow::Error>;

    /// Full-text fallback: searches by extracted phrases instead of an
    /// exact key. Returns `None` when nothing related was found.
    async fn full_text_search(
        &self,
        device_id: &str,
        question: &str,
        verb_phrases: &[String],
        noun_phrases: &[String],
    ) -> Result<Option<FullTextHit>, anyhow::Error>;
}

/// Extractive question-answering fallback, used only when graph retrieval
/// is exhausted for certain question types.
#[async_trait]
pub trait ExtractiveQa: Send + Sync {
    /// Extracts a span answer from a paragraph, or `None` when the model
    /// finds nothing.
    async fn answer(
        &self,
        paragraph: &str,
        question: &str,
    ) -> Result<Option<String>, anyhow::Error>;
}

/// Noun/verb phrases derived from a question by the external parser.
#[derive(Debug, Clone, Default)]
pub struct Phrases {
    pub noun_phrases: Vec<String>,
    pub verb_phrases: Vec<String>,
}

/// Constituency/SRL phrase parser, consumed only by the full-text fallback.
#[async_trait]
pub trait PhraseParser: Send + Sync {
    async fn parse(&self, question: &str) -> Result<Phrases, anyhow::Error>;
}
