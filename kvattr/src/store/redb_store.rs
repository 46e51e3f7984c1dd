use crate::store::KvConnection;
use crate::AttrError;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

const ATTRS: TableDefinition<&str, &[u8]> = TableDefinition::new("kvattr_attrs");

/// Embedded store backed by a single redb table. Batched calls run in one transaction each.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, AttrError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        Self::from_database(Arc::new(Database::create(path)?))
    }

    pub fn from_database(db: Arc<Database>) -> Result<Self, AttrError> {
        let tx = db.begin_write()?;
        {
            tx.open_table(ATTRS)?;
        }
        tx.commit()?;
        Ok(RedbStore { db })
    }
}

impl KvConnection for RedbStore {
    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, AttrError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(ATTRS)?;
        let value = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn mget(&mut self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, AttrError> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(ATTRS)?;
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(table.get(key.as_str())?.map(|guard| guard.value().to_vec()));
        }
        Ok(values)
    }

    fn mset(&mut self, pairs: &[(String, Vec<u8>)]) -> Result<(), AttrError> {
        let tx = self.db.begin_write()?;
        {
            let mut table = tx.open_table(ATTRS)?;
            for (key, value) in pairs {
                table.insert(key.as_str(), value.as_slice())?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn del(&mut self, keys: &[String]) -> Result<usize, AttrError> {
        let tx = self.db.begin_write()?;
        let mut removed = 0;
        {
            let mut table = tx.open_table(ATTRS)?;
            for key in keys {
                if table.remove(key.as_str())?.is_some() {
                    removed += 1;
                }
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    fn exists(&mut self, key: &str) -> Result<bool, AttrError> {
        Ok(self.get(key)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> RedbStore {
        let dir = std::env::temp_dir().join("kvattr").join("test");
        RedbStore::create(dir.join(format!("{}_{}.redb", name, rand::random::<u64>()))).expect("Failed to create test database")
    }

    #[test]
    fn batched_roundtrip() {
        let mut store = temp_store("batched_roundtrip");
        store.mset(&[("posts:1:title".into(), b"foobar".to_vec()), ("posts:1:version".into(), b"4".to_vec())]).unwrap();
        let values = store.mget(&["posts:1:title".into(), "posts:1:content".into(), "posts:1:version".into()]).unwrap();
        assert_eq!(values, vec![Some(b"foobar".to_vec()), None, Some(b"4".to_vec())]);
        assert_eq!(store.get("posts:1:title").unwrap(), Some(b"foobar".to_vec()));
    }

    #[test]
    fn delete_is_idempotent() {
        let mut store = temp_store("delete_is_idempotent");
        store.mset(&[("posts:2:title".into(), b"x".to_vec())]).unwrap();
        assert_eq!(store.del(&["posts:2:title".into(), "posts:2:version".into()]).unwrap(), 1);
        assert_eq!(store.del(&["posts:2:title".into()]).unwrap(), 0);
        assert!(!store.exists("posts:2:title").unwrap());
    }

    #[test]
    fn empty_value_is_present() {
        let mut store = temp_store("empty_value_is_present");
        store.mset(&[("posts:3:title".into(), Vec::new())]).unwrap();
        assert!(store.exists("posts:3:title").unwrap());
        assert_eq!(store.get("posts:3:title").unwrap(), Some(Vec::new()));
    }
}
