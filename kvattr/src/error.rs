use std::sync::PoisonError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttrError {

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Identity not ready: {model} has no `{field}` value yet")]
    IdentityNotReady { model: String, field: String },

    #[error("Pool exhausted: `{pool}` gave no connection within {timeout:?}: {reason}")]
    PoolExhausted { pool: String, timeout: Duration, reason: String },

    #[error("Pool closed: {0}")]
    PoolClosed(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AttrError {
    pub fn config(msg: impl Into<String>) -> Self {
        AttrError::Configuration(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        AttrError::StoreUnavailable(msg.into())
    }

    /// Pool exhaustion is the only failure a caller may sensibly retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AttrError::PoolExhausted { .. })
    }
}

macro_rules! store_error_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for AttrError {
                fn from(e: $t) -> Self {
                    AttrError::StoreUnavailable(e.to_string())
                }
            }
        )*
    };
}

store_error_from!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl From<std::io::Error> for AttrError {
    fn from(e: std::io::Error) -> Self {
        AttrError::Configuration(format!("io error: {}", e))
    }
}

impl From<serde_json::Error> for AttrError {
    fn from(e: serde_json::Error) -> Self {
        AttrError::Configuration(format!("invalid config: {}", e))
    }
}

impl<T> From<PoisonError<T>> for AttrError
{
    fn from(e: PoisonError<T>) -> Self {
        AttrError::StoreUnavailable(format!("Poison error: {:?}", e.to_string()))
    }
}
