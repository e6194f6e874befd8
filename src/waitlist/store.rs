//! Waitlist storage.
//!
//! # Design Decisions
//! - The store is built explicitly at startup and injected through
//!   `AppState`; there is no process-wide pool
//! - Every Postgres operation acquires one pooled connection for its own
//!   scope; dropping the guard returns it on every exit path, errors included
//! - Insertion is idempotent on the unique `email` column

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::DatabaseConfig;

/// One waitlist row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct WaitlistEntry {
    pub id: i32,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait WaitlistStore: Send + Sync {
    /// Create the waitlist table if it does not exist.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Insert `email`. Returns `true` when a row was created and `false`
    /// when the email was already present.
    async fn insert(&self, email: &str) -> Result<bool, StoreError>;

    /// All entries, newest first.
    async fn list(&self) -> Result<Vec<WaitlistEntry>, StoreError>;

    /// Current time as seen by the store; doubles as a connectivity probe.
    async fn now(&self) -> Result<DateTime<Utc>, StoreError>;

    /// Short label for logs.
    fn kind(&self) -> &'static str;
}

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS waitlist (
    id SERIAL PRIMARY KEY,
    email VARCHAR(255) UNIQUE NOT NULL,
    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Postgres-backed waitlist.
#[derive(Debug, Clone)]
pub struct PgWaitlist {
    pool: PgPool,
}

impl PgWaitlist {
    /// Open a bounded pool against `url`.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await?;

        tracing::info!(max_connections = config.max_connections, "Waitlist database pool ready");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WaitlistStore for PgWaitlist {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(CREATE_TABLE).execute(&mut *conn).await?;
        Ok(())
    }

    async fn insert(&self, email: &str) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query(
            "INSERT INTO waitlist (email) VALUES ($1) ON CONFLICT (email) DO NOTHING",
        )
        .bind(email)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list(&self) -> Result<Vec<WaitlistEntry>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let entries = sqlx::query_as::<_, WaitlistEntry>(
            "SELECT id, email, created_at FROM waitlist ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(entries)
    }

    async fn now(&self) -> Result<DateTime<Utc>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let now = sqlx::query_scalar::<_, DateTime<Utc>>("SELECT NOW()")
            .fetch_one(&mut *conn)
            .await?;
        Ok(now)
    }

    fn kind(&self) -> &'static str {
        "postgres"
    }
}

/// In-process waitlist for development and tests. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryWaitlist {
    entries: Mutex<Vec<WaitlistEntry>>,
}

impl MemoryWaitlist {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WaitlistStore for MemoryWaitlist {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(&self, email: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().await;
        if entries.iter().any(|e| e.email == email) {
            return Ok(false);
        }

        let id = entries.len() as i32 + 1;
        entries.push(WaitlistEntry {
            id,
            email: email.to_string(),
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<WaitlistEntry>, StoreError> {
        let mut entries = self.entries.lock().await.clone();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn now(&self) -> Result<DateTime<Utc>, StoreError> {
        Ok(Utc::now())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
