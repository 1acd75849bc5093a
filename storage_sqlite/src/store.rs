//! `SqliteParentChainStore` (§4.5 expansion): a concrete `ParentChainStore` backed by `diesel` +
//! `diesel_migrations` against SQLite, modelled on the teacher's `GlobalDb<SqliteGlobalDbAdapter<_>>`
//! single-connection-behind-a-mutex shape. `diesel::SqliteConnection` is synchronous, so every
//! operation is dispatched to a blocking thread via `tokio::task::spawn_blocking` rather than
//! held across an `.await` point.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use diesel::{prelude::*, sqlite::SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::*;
use parent_chain_tracker::{
    store::ParentChainStore, DelegateTrees, Hash32, ParentBlock, PersistedTrackerState, StoreError,
};

use crate::{
    error::SqliteStoreError,
    models::{ParentBlockRow, ParentBlockStateRow, ParentStateRow},
    schema,
};

const LOG_TARGET: &str = "parent_chain_tracker::storage_sqlite";

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub struct SqliteParentChainStore {
    conn: Arc<Mutex<SqliteConnection>>,
}

impl SqliteParentChainStore {
    /// Opens (or creates) the SQLite database at `path` and runs any pending migrations.
    /// Pass `":memory:"` for an ephemeral, per-process store (used by this crate's own tests).
    pub fn connect(path: &str) -> Result<Self, SqliteStoreError> {
        debug!(target: LOG_TARGET, "Opening parent chain tracker store at {path}");
        let mut conn = SqliteConnection::establish(path)?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(SqliteStoreError::Migration)?;
        if !applied.is_empty() {
            info!(target: LOG_TARGET, "Applied {} pending migration(s) to {path}", applied.len());
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run_blocking<F, T>(&self, f: F) -> Result<T, SqliteStoreError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, SqliteStoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&mut conn)
        })
        .await?
    }
}

fn decode<T: serde::de::DeserializeOwned>(key: &str, data: &str) -> Result<T, SqliteStoreError> {
    serde_json::from_str(data).map_err(|source| SqliteStoreError::Corrupt {
        key: key.to_string(),
        source,
    })
}

#[async_trait]
impl ParentChainStore for SqliteParentChainStore {
    async fn get_parent_state(&self, pointer: Hash32) -> Result<Option<PersistedTrackerState>, StoreError> {
        let key = pointer.to_hex();
        self.run_blocking(move |conn| {
            let row: Option<ParentStateRow> = schema::parent_state::table
                .find(&key)
                .first(conn)
                .optional()?;
            row.map(|row| decode(&row.pointer, &row.data)).transpose()
        })
        .await
        .map_err(Into::into)
    }

    async fn write_parent_state(&self, pointer: Hash32, state: &PersistedTrackerState) -> Result<(), StoreError> {
        let key = pointer.to_hex();
        let data = serde_json::to_string(state).expect("PersistedTrackerState is always serializable");
        self.run_blocking(move |conn| {
            // `replace_into` gives the last-writer-wins overwrite semantics §4.5 requires, in a
            // single atomic statement rather than a select-then-insert-or-update round trip.
            diesel::replace_into(schema::parent_state::table)
                .values(ParentStateRow { pointer: key, data })
                .execute(conn)?;
            Ok(())
        })
        .await
        .map_err(Into::into)
    }

    async fn get_parent_block(&self, hash: Hash32) -> Result<Option<ParentBlock>, StoreError> {
        let key = hash.to_hex();
        self.run_blocking(move |conn| {
            let row: Option<ParentBlockRow> = schema::parent_block::table
                .find(&key)
                .first(conn)
                .optional()?;
            row.map(|row| decode(&row.hash, &row.data)).transpose()
        })
        .await
        .map_err(Into::into)
    }

    async fn write_parent_block(&self, block: &ParentBlock, trees: &DelegateTrees) -> Result<(), StoreError> {
        let hash = block.hash().to_hex();
        let block_data = serde_json::to_string(block).expect("ParentBlock is always serializable");
        let trees_data = serde_json::to_string(trees).expect("DelegateTrees is always serializable");
        let trees_key = hash.clone();
        self.run_blocking(move |conn| {
            conn.transaction(|conn| {
                diesel::replace_into(schema::parent_block::table)
                    .values(ParentBlockRow {
                        hash: hash.clone(),
                        data: block_data,
                    })
                    .execute(conn)?;
                diesel::replace_into(schema::parent_block_state::table)
                    .values(ParentBlockStateRow {
                        hash: trees_key,
                        data: trees_data,
                    })
                    .execute(conn)?;
                Ok::<(), SqliteStoreError>(())
            })?;
            Ok(())
        })
        .await
        .map_err(Into::into)
    }

    async fn get_parent_block_state(&self, hash: Hash32) -> Result<Option<DelegateTrees>, StoreError> {
        let key = hash.to_hex();
        self.run_blocking(move |conn| {
            let row: Option<ParentBlockStateRow> = schema::parent_block_state::table
                .find(&key)
                .first(conn)
                .optional()?;
            row.map(|row| decode(&row.hash, &row.data)).transpose()
        })
        .await
        .map_err(Into::into)
    }
}
