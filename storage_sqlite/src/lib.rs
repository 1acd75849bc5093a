//! A concrete, `diesel` + `diesel_migrations`-backed [`ParentChainStore`](parent_chain_tracker::store::ParentChainStore)
//! implementation against SQLite, one table per keyspace (§4.5).

mod error;
mod models;
mod schema;
mod store;

pub use error::SqliteStoreError;
pub use store::{SqliteParentChainStore, MIGRATIONS};
