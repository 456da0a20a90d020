//! # Orchestrator
//!
//! The per-turn retrieval state machine: identity resolution, context
//! merging, candidate iteration with ordered fallback escalation, unit
//! post-processing, and context commit. Collaborators (classifier,
//! similarity ranker, knowledge store, extractive QA, phrase parser,
//! preference store) are injected at construction.

pub mod config;
pub mod engine;
pub mod intent_map;
pub mod state;

pub use config::EngineConfig;
pub use engine::{DialogEngine, TurnOutcome, TurnRequest};
pub use intent_map::{IntentEntry, IntentMap, IntentMapError, IntentScope};
pub use state::TurnState;
