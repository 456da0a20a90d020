//! Conversational context: one record per product family.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-product-family conversational state.
///
/// At most one context is "current" at a time; the store's previous-family
/// pointer names which one. A context is created empty, mutated on every
/// successful turn, and cleared (fields only, the row stays) on reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub product_family: String,
    /// May be partial/truncated with a trailing wildcard.
    pub device_id: Option<String>,
    pub product_sub_family: Option<String>,
    pub preferred_unit: Option<String>,
    pub active_spec_key: Option<String>,
    pub last_answer: Option<String>,
    pub last_question: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationContext {
    /// An empty context for a family that has no stored state yet.
    pub fn empty(family: &str) -> Self {
        Self {
            product_family: family.to_string(),
            device_id: None,
            product_sub_family: None,
            preferred_unit: None,
            active_spec_key: None,
            last_answer: None,
            last_question: None,
            updated_at: Utc::now(),
        }
    }

    /// Clears every field except the family key.
    pub fn clear(&mut self) {
        self.device_id = None;
        self.product_sub_family = None;
        self.preferred_unit = None;
        self.active_spec_key = None;
        self.last_answer = None;
        self.last_question = None;
        self.updated_at = Utc::now();
    }

    /// Applies a patch; `None` fields are left untouched.
    pub fn apply(&mut self, patch: &ContextPatch) {
        if let Some(v) = &patch.device_id {
            self.device_id = Some(v.clone());
        }
        if let Some(v) = &patch.product_sub_family {
            self.product_sub_family = Some(v.clone());
        }
        if let Some(v) = &patch.preferred_unit {
            self.preferred_unit = Some(v.clone());
        }
        if let Some(v) = &patch.active_spec_key {
            self.active_spec_key = Some(v.clone());
        }
        if let Some(v) = &patch.last_answer {
            self.last_answer = Some(v.clone());
        }
        if let Some(v) = &patch.last_question {
            self.last_question = Some(v.clone());
        }
        self.updated_at = Utc::now();
    }
}

/// Batched field update for one family.
///
/// Every store `update` call is one durable write, so callers coalesce all
/// field changes of a turn into a single patch.
#[derive(Debug, Clone, Default)]
pub struct ContextPatch {
    pub device_id: Option<String>,
    pub product_sub_family: Option<String>,
    pub preferred_unit: Option<String>,
    pub active_spec_key: Option<String>,
    pub last_answer: Option<String>,
    pub last_question: Option<String>,
}

impl ContextPatch {
    pub fn is_empty(&self) -> bool {
        self.device_id.is_none()
            && self.product_sub_family.is_none()
            && self.preferred_unit.is_none()
            && self.active_spec_key.is_none()
            && self.last_answer.is_none()
            && self.last_question.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_leaves_unset_fields_alone() {
        let mut ctx = ConversationContext::empty("washer");
        ctx.device_id = Some("WM4500H*A".to_string());
        let patch = ContextPatch {
            active_spec_key: Some("net weight".to_string()),
            ..Default::default()
        };
        ctx.apply(&patch);
        assert_eq!(ctx.device_id.as_deref(), Some("WM4500H*A"));
        assert_eq!(ctx.active_spec_key.as_deref(), Some("net weight"));
    }

    #[test]
    fn clear_keeps_family() {
        let mut ctx = ConversationContext::empty("dryer");
        ctx.preferred_unit = Some("cm".to_string());
        ctx.clear();
        assert_eq!(ctx.product_family, "dryer");
        assert_eq!(ctx.preferred_unit, None);
    }
}
