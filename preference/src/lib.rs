//! # Preference
//!
//! Durable per-product-family conversational state: the active device
//! identifier, preferred measurement unit, active specification key, and the
//! last question/answer pair. The store is the single source of truth
//! recoverable after a crash: every update is written through immediately.

pub mod context;
pub mod inmemory_store;
pub mod sqlite_store;
pub mod store;

pub use context::{ContextPatch, ConversationContext};
pub use inmemory_store::InMemoryPreferenceStore;
pub use sqlite_store::SqlitePreferenceStore;
pub use store::{PreferenceStore, StoreError};
