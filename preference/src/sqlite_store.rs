//! # SQLite Preference Store
//!
//! Persistent backend for conversational state. Every `update` is a single
//! read-modify-write cycle under a per-family lock, so a crash can lose at
//! most the turn in flight and concurrent turns for different families
//! never block each other.
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE contexts (
//!     family TEXT PRIMARY KEY,
//!     device_id TEXT,
//!     product_sub_family TEXT,
//!     preferred_unit TEXT,
//!     active_spec_key TEXT,
//!     last_answer TEXT,
//!     last_question TEXT,
//!     updated_at TEXT NOT NULL
//! );
//! CREATE TABLE meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);
//! ```

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use tokio::sync::Mutex;
use tracing::debug;

use crate::context::{ContextPatch, ConversationContext};
use crate::store::{PreferenceStore, StoreError};

const PREVIOUS_FAMILY_KEY: &str = "previous_family";

/// SQLite-backed preference store.
#[derive(Clone)]
pub struct SqlitePreferenceStore {
    pool: SqlitePool,
    /// One write lock per family key, created lazily.
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl SqlitePreferenceStore {
    /// Opens (creating if missing) the database and initializes the schema.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(db_err)?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await.map_err(db_err)?;

        let store = Self {
            pool,
            locks: Arc::new(Mutex::new(HashMap::new())),
        };
        store.init_schema().await?;

        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contexts (
                family TEXT PRIMARY KEY,
                device_id TEXT,
                product_sub_family TEXT,
                preferred_unit TEXT,
                active_spec_key TEXT,
                last_answer TEXT,
                last_question TEXT,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn family_lock(&self, family: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(family.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn fetch(&self, family: &str) -> Result<Option<ConversationContext>, StoreError> {
        let row = sqlx::query(
            "SELECT family, device_id, product_sub_family, preferred_unit, active_spec_key, \
             last_answer, last_question, updated_at FROM contexts WHERE family = ?",
        )
        .bind(family)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|row| ConversationContext {
            product_family: row.get("family"),
            device_id: row.get("device_id"),
            product_sub_family: row.get("product_sub_family"),
            preferred_unit: row.get("preferred_unit"),
            active_spec_key: row.get("active_spec_key"),
            last_answer: row.get("last_answer"),
            last_question: row.get("last_question"),
            updated_at: row
                .get::<String, _>("updated_at")
                .parse::<DateTime<Utc>>()
                .unwrap_or_else(|_| Utc::now()),
        }))
    }

    async fn write(&self, ctx: &ConversationContext) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO contexts
                (family, device_id, product_sub_family, preferred_unit,
                 active_spec_key, last_answer, last_question, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&ctx.product_family)
        .bind(&ctx.device_id)
        .bind(&ctx.product_sub_family)
        .bind(&ctx.preferred_unit)
        .bind(&ctx.active_spec_key)
        .bind(&ctx.last_answer)
        .bind(&ctx.last_question)
        .bind(ctx.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    async fn get(&self, family: &str) -> Result<ConversationContext, StoreError> {
        Ok(self
            .fetch(family)
            .await?
            .unwrap_or_else(|| ConversationContext::empty(family)))
    }

    async fn update(&self, family: &str, patch: ContextPatch) -> Result<(), StoreError> {
        let lock = self.family_lock(family).await;
        let _guard = lock.lock().await;

        let mut ctx = self
            .fetch(family)
            .await?
            .unwrap_or_else(|| ConversationContext::empty(family));
        ctx.apply(&patch);
        self.write(&ctx).await?;
        debug!(family = %family, "preference context written through");
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        // Field-level clear: family rows survive, the previous-family
        // pointer in meta is untouched.
        sqlx::query(
            r#"
            UPDATE contexts SET
                device_id = NULL,
                product_sub_family = NULL,
                preferred_unit = NULL,
                active_spec_key = NULL,
                last_answer = NULL,
                last_question = NULL,
                updated_at = ?
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn families(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT family FROM contexts ORDER BY family")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.iter().map(|r| r.get("family")).collect())
    }

    async fn previous_family(&self) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM meta WHERE key = ?")
            .bind(PREVIOUS_FAMILY_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn set_previous_family(&self, family: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO meta (key, value) VALUES (?, ?)")
            .bind(PREVIOUS_FAMILY_KEY)
            .bind(family)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

fn db_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Database(e.to_string())
}
