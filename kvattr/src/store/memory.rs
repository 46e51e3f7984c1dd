use crate::store::KvConnection;
use crate::AttrError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Process-local store; clones share the same map, so every pooled connection sees one dataset.
#[derive(Clone, Default, Debug)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    commands: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of commands issued through [`KvConnection`] so far.
    pub fn commands(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }

    /// Direct read that bypasses command accounting.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().ok().and_then(|map| map.get(key).cloned())
    }

    pub fn raw_text(&self, key: &str) -> Option<String> {
        self.raw(key).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn put_raw(&self, key: &str, value: &[u8]) -> Result<(), AttrError> {
        self.entries.lock()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn command(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, AttrError> {
        self.commands.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.lock()?)
    }
}

impl KvConnection for MemoryStore {
    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, AttrError> {
        Ok(self.command()?.get(key).cloned())
    }

    fn mget(&mut self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, AttrError> {
        let map = self.command()?;
        Ok(keys.iter().map(|k| map.get(k).cloned()).collect())
    }

    fn mset(&mut self, pairs: &[(String, Vec<u8>)]) -> Result<(), AttrError> {
        let mut map = self.command()?;
        for (key, value) in pairs {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn del(&mut self, keys: &[String]) -> Result<usize, AttrError> {
        let mut map = self.command()?;
        Ok(keys.iter().filter(|k| map.remove(k.as_str()).is_some()).count())
    }

    fn exists(&mut self, key: &str) -> Result<bool, AttrError> {
        Ok(self.command()?.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let store = MemoryStore::new();
        let mut conn = store.clone();
        conn.mset(&[("posts:1:title".into(), b"foobar".to_vec()), ("posts:1:version".into(), b"4".to_vec())]).unwrap();
        assert_eq!(store.raw_text("posts:1:title").as_deref(), Some("foobar"));
        assert_eq!(store.commands(), 1);
    }

    #[test]
    fn mget_is_positional() {
        let mut store = MemoryStore::new();
        store.put_raw("b", b"2").unwrap();
        let values = store.mget(&["a".into(), "b".into(), "c".into()]).unwrap();
        assert_eq!(values, vec![None, Some(b"2".to_vec()), None]);
    }

    #[test]
    fn del_tolerates_absent_keys() {
        let mut store = MemoryStore::new();
        store.put_raw("a", b"1").unwrap();
        assert_eq!(store.del(&["a".into(), "b".into()]).unwrap(), 1);
        assert_eq!(store.del(&["a".into(), "b".into()]).unwrap(), 0);
        assert!(!store.exists("a").unwrap());
        assert!(store.is_empty());
    }
}
