//! # QA Core
//!
//! Core types and contracts for the manual-QA dialogue engine: classification
//! and retrieval types, the collaborator traits the orchestrator depends on,
//! the shared error taxonomy, text-similarity helpers, and tracing setup.

pub mod collaborators;
pub mod error;
pub mod logger;
pub mod text;
pub mod types;

pub use collaborators::{
    CandidateRanker, Classifier, ExtractiveQa, FullTextHit, KnowledgeStore, PhraseParser, Phrases,
    RankedCandidate,
};
pub use error::{EngineError, Result};
pub use types::{
    CandidateKey, ClassificationResult, FeatureItem, QueryMethod, ResponseCode, RetrievalQuery,
    RetrievalResult, Section,
};
