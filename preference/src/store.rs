//! The preference store interface.

use async_trait::async_trait;
use thiserror::Error;

use crate::context::{ContextPatch, ConversationContext};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Durable per-product-family key/value state.
///
/// Implementations must serialize writes per family key while allowing
/// concurrent reads of other keys; the orchestrator relies on this when
/// turns for different families run concurrently.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Context for one family. Unknown families yield an empty context
    /// rather than an error.
    async fn get(&self, family: &str) -> Result<ConversationContext, StoreError>;

    /// Applies a batched field update and writes it through immediately.
    async fn update(&self, family: &str, patch: ContextPatch) -> Result<(), StoreError>;

    /// Clears all fields of all known families. Family keys stay present;
    /// the previous-family pointer record survives.
    async fn reset(&self) -> Result<(), StoreError>;

    /// Known family keys, in no particular order.
    async fn families(&self) -> Result<Vec<String>, StoreError>;

    /// The family whose context is "current".
    async fn previous_family(&self) -> Result<Option<String>, StoreError>;

    /// Marks a family's context as the current one.
    async fn set_previous_family(&self, family: &str) -> Result<(), StoreError>;
}
