//! In-memory preference store for testing and development.
//!
//! Same contract as the SQLite backend without I/O; data is lost on
//! restart. Uses `Arc<RwLock<_>>` for thread-safe concurrent access.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::context::{ContextPatch, ConversationContext};
use crate::store::{PreferenceStore, StoreError};

/// In-memory preference store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPreferenceStore {
    contexts: Arc<RwLock<HashMap<String, ConversationContext>>>,
    previous_family: Arc<RwLock<Option<String>>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a context, for test setup.
    pub async fn seed(&self, ctx: ConversationContext) {
        let mut contexts = self.contexts.write().await;
        contexts.insert(ctx.product_family.clone(), ctx);
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn get(&self, family: &str) -> Result<ConversationContext, StoreError> {
        let contexts = self.contexts.read().await;
        Ok(contexts
            .get(family)
            .cloned()
            .unwrap_or_else(|| ConversationContext::empty(family)))
    }

    async fn update(&self, family: &str, patch: ContextPatch) -> Result<(), StoreError> {
        let mut contexts = self.contexts.write().await;
        let ctx = contexts
            .entry(family.to_string())
            .or_insert_with(|| ConversationContext::empty(family));
        ctx.apply(&patch);
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut contexts = self.contexts.write().await;
        for ctx in contexts.values_mut() {
            ctx.clear();
        }
        Ok(())
    }

    async fn families(&self) -> Result<Vec<String>, StoreError> {
        let contexts = self.contexts.read().await;
        Ok(contexts.keys().cloned().collect())
    }

    async fn previous_family(&self) -> Result<Option<String>, StoreError> {
        Ok(self.previous_family.read().await.clone())
    }

    async fn set_previous_family(&self, family: &str) -> Result<(), StoreError> {
        let mut prev = self.previous_family.write().await;
        *prev = Some(family.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_unknown_family_is_empty() {
        let store = InMemoryPreferenceStore::new();
        let ctx = store.get("washer").await.unwrap();
        assert_eq!(ctx.product_family, "washer");
        assert!(ctx.device_id.is_none());
    }

    #[tokio::test]
    async fn update_then_get() {
        let store = InMemoryPreferenceStore::new();
        store
            .update(
                "washer",
                ContextPatch {
                    device_id: Some("WM4500H*A".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let ctx = store.get("washer").await.unwrap();
        assert_eq!(ctx.device_id.as_deref(), Some("WM4500H*A"));
    }

    #[tokio::test]
    async fn reset_clears_fields_but_keeps_keys() {
        let store = InMemoryPreferenceStore::new();
        store
            .update(
                "dryer",
                ContextPatch {
                    preferred_unit: Some("cm".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store.set_previous_family("dryer").await.unwrap();
        store.reset().await.unwrap();

        assert_eq!(store.families().await.unwrap(), vec!["dryer".to_string()]);
        assert!(store.get("dryer").await.unwrap().preferred_unit.is_none());
        assert_eq!(
            store.previous_family().await.unwrap().as_deref(),
            Some("dryer")
        );
    }
}
