#![deny(warnings)]

//! Persistence layer: a durable key-value slot holding the game snapshot.
//!
//! The whole [`GameState`] is stored as one JSON document under a fixed,
//! versioned key. Reading never fails past this boundary: a missing,
//! unreadable, unparsable or invalid snapshot is reported as absent.

use anyhow::{Context, Result};
use sim_core::{initial_state, validate_state, Catalog, GameState, Millis, SimConfig};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Slot key for the current snapshot schema. Bump the suffix on breaking changes.
pub const SAVE_KEY: &str = "idleTycoonSave_v2";

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/idle.db"
}

/// A durable string slot addressed by key.
pub trait SnapshotSlot: Send + Sync + 'static {
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;
    /// Overwrites any prior value under `key`.
    fn write(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send;
}

/// Slot backed by a single SQLite table.
#[derive(Clone, Debug)]
pub struct SqliteSlot {
    pool: SqlitePool,
}

impl SqliteSlot {
    /// Open (creating if needed) the database at `url` and run migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid sqlite url {url}"))?
            .create_if_missing(true);
        // One long-lived connection keeps `sqlite::memory:` databases alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .with_context(|| format!("failed to open {url}"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(url, "snapshot database ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl SnapshotSlot for SqliteSlot {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM snapshots WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: String) -> Result<()> {
        sqlx::query(
            "INSERT INTO snapshots (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE \
             SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Process-local slot, used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemorySlot {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value under `key`, bypassing the codec.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store a raw value under `key`, bypassing the codec.
    pub fn put_raw(&self, key: &str, value: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.into());
    }
}

impl SnapshotSlot for MemorySlot {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_raw(key))
    }

    async fn write(&self, key: &str, value: String) -> Result<()> {
        self.put_raw(key, value);
        Ok(())
    }
}

/// Serialize a state to its snapshot document.
pub fn encode(state: &GameState) -> Result<String> {
    serde_json::to_string(state).context("failed to serialize snapshot")
}

/// Parse and validate a snapshot document.
pub fn decode(text: &str) -> Result<GameState> {
    let state: GameState = serde_json::from_str(text).context("snapshot is not valid JSON")?;
    validate_state(&state).context("snapshot violates invariants")?;
    Ok(state)
}

/// Write `state` to the slot under [`SAVE_KEY`].
pub async fn save<S: SnapshotSlot>(slot: &S, state: &GameState) -> Result<()> {
    let text = encode(state)?;
    let bytes = text.len();
    slot.write(SAVE_KEY, text).await?;
    debug!(cash = state.cash, bytes, "snapshot saved");
    Ok(())
}

/// Read the snapshot, treating every failure as "no snapshot".
pub async fn load<S: SnapshotSlot>(slot: &S) -> Option<GameState> {
    let text = match slot.read(SAVE_KEY).await {
        Ok(Some(text)) => text,
        Ok(None) => {
            debug!("no snapshot stored");
            return None;
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "failed to read snapshot");
            return None;
        }
    };
    match decode(&text) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "discarding unreadable snapshot");
            None
        }
    }
}

/// Restore the stored snapshot or fall back to a fresh game built from `catalog`.
pub async fn load_or_default<S: SnapshotSlot>(
    slot: &S,
    catalog: &Catalog,
    config: &SimConfig,
    now: Millis,
) -> GameState {
    match load(slot).await {
        Some(state) => {
            info!(cash = state.cash, "resumed saved game");
            state
        }
        None => {
            info!("starting new game");
            initial_state(catalog, config, now)
        }
    }
}

/// Create the directory holding a file-backed SQLite URL, if any.
pub fn ensure_sqlite_dir(url: &str) -> Result<()> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"));
    if let Some(path) = path {
        if path.starts_with(":memory:") || path.is_empty() {
            return Ok(());
        }
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
    }
    Ok(())
}
