use crate::pool::{Connection, ConnectionFactory, PoolOptions, DEFAULT_POOL};
use crate::store::{MemoryStore, RedbStore};
use crate::AttrError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_pool_name() -> String {
    DEFAULT_POOL.to_string()
}

fn default_capacity() -> u32 {
    PoolOptions::default().capacity
}

fn default_timeout_ms() -> u64 {
    PoolOptions::default().timeout.as_millis() as u64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process-local map, every connection of the pool shares it.
    Memory,
    Redb { path: PathBuf },
}

impl StoreConfig {
    /// Opens the backing store once; the returned factory hands out connections to it.
    pub fn factory(&self) -> Result<ConnectionFactory, AttrError> {
        match self {
            StoreConfig::Memory => {
                let store = MemoryStore::new();
                Ok(Box::new(move || Ok(Box::new(store.clone()) as Connection)))
            }
            StoreConfig::Redb { path } => {
                let store = RedbStore::create(path)?;
                Ok(Box::new(move || Ok(Box::new(store.clone()) as Connection)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_pool_name")]
    pub name: String,
    pub store: StoreConfig,
    #[serde(default = "default_capacity")]
    pub pool: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl PoolConfig {
    pub fn new(name: &str, store: StoreConfig) -> Self {
        PoolConfig { name: name.to_string(), store, pool: default_capacity(), timeout_ms: default_timeout_ms() }
    }

    pub fn options(&self) -> PoolOptions {
        PoolOptions::new(self.pool, Duration::from_millis(self.timeout_ms))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrConfig {
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

impl AttrConfig {
    pub fn from_json(json: &str) -> Result<Self, AttrError> {
        let config: AttrConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AttrError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, AttrError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), AttrError> {
        for (i, pool) in self.pools.iter().enumerate() {
            if self.pools[..i].iter().any(|p| p.name == pool.name) {
                return Err(AttrError::config(format!("pool `{}` configured twice", pool.name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolRegistry;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = AttrConfig::from_json(r#"{ "pools": [ { "store": { "kind": "memory" } } ] }"#).unwrap();
        let pool = &config.pools[0];
        assert_eq!(pool.name, "default");
        assert_eq!(pool.options(), PoolOptions::new(1, Duration::from_secs(2)));
        assert_eq!(AttrConfig::from_json("{}").unwrap(), AttrConfig::default());
    }

    #[test]
    fn named_redb_pool_parses() {
        let json = r#"{ "pools": [
            { "name": "foo_pool", "store": { "kind": "redb", "path": "/tmp/attrs.redb" }, "pool": 4, "timeout_ms": 50 }
        ] }"#;
        let config = AttrConfig::from_json(json).unwrap();
        assert_eq!(config.pools[0].store, StoreConfig::Redb { path: PathBuf::from("/tmp/attrs.redb") });
        assert_eq!(config.pools[0].options(), PoolOptions::new(4, Duration::from_millis(50)));
        assert_eq!(AttrConfig::from_json(&config.to_json().unwrap()).unwrap(), config);
    }

    #[test]
    fn malformed_config_is_a_configuration_error() {
        assert!(matches!(AttrConfig::from_json(r#"{ "pools": [ { "store": { "kind": "ssdb" } } ] }"#), Err(AttrError::Configuration(_))));
        let twice = r#"{ "pools": [ { "store": { "kind": "memory" } }, { "name": "default", "store": { "kind": "memory" } } ] }"#;
        assert!(matches!(AttrConfig::from_json(twice), Err(AttrError::Configuration(_))));
        assert!(matches!(AttrConfig::from_path("/nonexistent/kvattr.json"), Err(AttrError::Configuration(_))));
    }

    #[test]
    fn registry_from_config() {
        let config = AttrConfig { pools: vec![PoolConfig::new("default", StoreConfig::Memory), PoolConfig::new("foo_pool", StoreConfig::Memory)] };
        let registry = PoolRegistry::from_config(&config).unwrap();
        assert_eq!(registry.names(), vec!["default".to_string(), "foo_pool".to_string()]);
        registry.with(Some("foo_pool"), |conn| conn.mset(&[("k".into(), b"v".to_vec())])).unwrap();
        assert!(registry.with(Some("foo_pool"), |conn| conn.exists("k")).unwrap());
        assert!(!registry.with(None, |conn| conn.exists("k")).unwrap());
    }
}
