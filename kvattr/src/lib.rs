//! kvattr keeps selected fields of a host model in an external key-value store instead of the
//! host's primary database.
//!
//! Fields are declared with `#[derive(KvAttrs)]` and typed `Attr<String>` or `Attr<i64>`. They load
//! lazily on first read, track their own dirty state, and are flushed in one batch once the host
//! reports a successful commit. Every value lives under `{namespace}:{identity}:{field}` and is
//! reached through a named, bounded connection pool.
//!
//! ```ignore
//! kvattr::configure(None, &StoreConfig::Memory, PoolOptions::default())?;
//! let sync = SyncEngine::global();
//! post.set_title("draft", &sync)?;
//! repo.insert(&mut post)?;          // assigns the identity
//! post.after_create(&sync)?;        // writes posts:{id}:title
//! ```

extern crate self as kvattr;

pub mod binding;
pub mod codec;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logger;
pub mod pool;
pub mod proxy;
pub mod store;
pub mod sync;
pub mod utils;

pub use binding::{model_binding, models, AttrModel, BindingBuilder, ClassBinding, FieldDecl, IdentityValue, ModelInfo};
pub use codec::{AttrValue, Scalar, ScalarKind};
pub use config::{AttrConfig, PoolConfig, StoreConfig};
pub use error::AttrError;
pub use inventory;
pub use lifecycle::{AttrCallbacks, LifecycleEvent};
pub use macros::KvAttrs;
pub use once_cell;
pub use pool::{AttrPool, PoolOptions, PoolRegistry, DEFAULT_POOL};
pub use proxy::{Attr, AttrSlot, ChangeSet, FieldChange};
pub use store::{KvConnection, MemoryStore, RedbStore};
pub use sync::{FieldLoader, SyncEngine};

/// Registers a pool on the process-wide registry. Must run before the first attribute access
/// that goes through [`SyncEngine::global`].
pub fn configure(name: Option<&str>, store: &StoreConfig, options: PoolOptions) -> Result<(), AttrError> {
    PoolRegistry::global().configure(name, store, options)
}

pub fn configure_from(config: &AttrConfig) -> Result<(), AttrError> {
    PoolRegistry::global().apply(config)
}

/// Closes every pool of the process-wide registry; later checkouts fail with [`AttrError::PoolClosed`].
pub fn shutdown() {
    PoolRegistry::global().shutdown()
}
