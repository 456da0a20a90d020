//! # Ranking
//!
//! Score normalization for answer-key candidates: combines the lexical
//! token-set score with the externally supplied semantic score, drops
//! candidates below threshold, and expands a lone troubleshooting key into
//! its second-level siblings for downstream disambiguation.

pub mod hierarchy;
pub mod normalizer;

pub use hierarchy::{HierarchyError, KeyHierarchy};
pub use normalizer::{NormalizerConfig, ScoreNormalizer};
