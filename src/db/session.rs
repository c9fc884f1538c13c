use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use tracing::{debug, info};

/// Keys the scorer persists under
pub mod keys {
    pub const MATCH: &str = "match";
    pub const TEAM1_NAME: &str = "team1Name";
    pub const TEAM2_NAME: &str = "team2Name";
    pub const BATTING_STATS: &str = "battingStats";
    pub const BOWLING_STATS: &str = "bowlingStats";
}

/// SQLite store of named JSON values, scoped to one scoring session
#[derive(Clone)]
pub struct SessionStore {
    pool: Pool<Sqlite>,
    session_id: String,
}

impl SessionStore {
    /// Open the store and initialize the database
    pub async fn new(database_url: &str, session_id: &str) -> Result<Self> {
        // Create data directory if needed
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() && !path.contains(":memory:") {
                    std::fs::create_dir_all(parent)
                        .context("Failed to create database directory")?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .create_if_missing(true);

        // Every connection to an in-memory database is a separate database
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self {
            pool,
            session_id: session_id.to_string(),
        };
        store.init_schema().await?;

        info!("Session store initialized (session {})", session_id);
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_values (
                session_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (session_id, key)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create session_values table")?;

        Ok(())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Same database, different session
    pub fn for_session(&self, session_id: &str) -> Self {
        Self {
            pool: self.pool.clone(),
            session_id: session_id.to_string(),
        }
    }

    /// Load and decode a value, `None` when the key was never saved
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT value FROM session_values
            WHERE session_id = ? AND key = ?
            "#,
        )
        .bind(&self.session_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to fetch session value {}", key))?;

        row.map(|(value,)| {
            serde_json::from_str(&value)
                .with_context(|| format!("Failed to decode session value {}", key))
        })
        .transpose()
    }

    /// Encode and save a value, replacing any previous one
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)
            .with_context(|| format!("Failed to encode session value {}", key))?;

        sqlx::query(
            r#"
            INSERT INTO session_values (session_id, key, value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (session_id, key)
            DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.session_id)
        .bind(key)
        .bind(&json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save session value {}", key))?;

        debug!("Saved {} ({} bytes)", key, json.len());
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM session_values WHERE session_id = ? AND key = ?")
            .bind(&self.session_id)
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete session value {}", key))?;

        Ok(())
    }

    /// Drop every value of the session
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session_values WHERE session_id = ?")
            .bind(&self.session_id)
            .execute(&self.pool)
            .await
            .context("Failed to clear session")?;

        info!(
            "Cleared {} values from session {}",
            result.rows_affected(),
            self.session_id
        );
        Ok(result.rows_affected())
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT key FROM session_values
            WHERE session_id = ?
            ORDER BY key
            "#,
        )
        .bind(&self.session_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list session keys")?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    /// Sessions with anything saved, most recently updated first
    pub async fn sessions(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT session_id FROM session_values
            GROUP BY session_id
            ORDER BY MAX(updated_at) DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list sessions")?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
