use parent_chain_tracker::StoreError;

/// Failures specific to this adapter; always folded into [`StoreError::Backend`] before crossing
/// the `ParentChainStore` trait boundary, so callers never need to know this crate exists.
#[derive(Debug, thiserror::Error)]
pub enum SqliteStoreError {
    #[error("diesel error: {0}")]
    Diesel(#[from] diesel::result::Error),
    #[error("diesel connection error: {0}")]
    Connection(#[from] diesel::result::ConnectionError),
    #[error("failed to run pending migrations: {0}")]
    Migration(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("value stored under key {key} is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("background database task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<SqliteStoreError> for StoreError {
    fn from(err: SqliteStoreError) -> Self {
        StoreError::Backend(anyhow::anyhow!(err))
    }
}
