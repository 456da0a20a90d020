//! Turn states. Each transition is a pure function of (context, candidates,
//! collaborator responses); the engine logs every transition so a turn can
//! be replayed deterministically from its trace.

use serde::{Deserialize, Serialize};

/// States of one conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Init,
    IdentityResolved,
    ContextValid,
    Querying,
    Escalating,
    /// Terminal: a validated result was found.
    Success,
    /// Terminal: all candidates and fallbacks yielded nothing. Normal.
    Exhausted,
    /// Terminal: no device identifier in question, request, or context.
    MissingIdentifier,
    /// Terminal: identifier present but no product family derivable.
    MissingProduct,
}

impl TurnState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Exhausted | Self::MissingIdentifier | Self::MissingProduct
        )
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::IdentityResolved => "identity_resolved",
            Self::ContextValid => "context_valid",
            Self::Querying => "querying",
            Self::Escalating => "escalating",
            Self::Success => "success",
            Self::Exhausted => "exhausted",
            Self::MissingIdentifier => "missing_identifier",
            Self::MissingProduct => "missing_product",
        };
        write!(f, "{}", s)
    }
}
