//! The primitive key-value surface the engine relies on. Anything that can answer these five
//! calls can hold declared attributes.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::AttrError;

pub trait KvConnection: Send {
    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, AttrError>;

    /// Positional: the result has one entry per requested key, `None` where the key is absent.
    fn mget(&mut self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, AttrError>;

    fn mset(&mut self, pairs: &[(String, Vec<u8>)]) -> Result<(), AttrError>;

    /// Returns how many keys existed; absent keys are not an error.
    fn del(&mut self, keys: &[String]) -> Result<usize, AttrError>;

    fn exists(&mut self, key: &str) -> Result<bool, AttrError>;

    /// Broken connections are discarded instead of being returned to the pool.
    fn is_broken(&self) -> bool {
        false
    }
}
