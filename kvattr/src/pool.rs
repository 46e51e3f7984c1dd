//! Named, bounded connection pools over [`KvConnection`]s.
//!
//! Each pool is an `r2d2` pool whose capacity and checkout timeout come from [`PoolOptions`].
//! Connections are created lazily and a checkout never outlives a single [`AttrPool::with`]
//! call, so a slow caller cannot pin a connection across operations.

use crate::config::{AttrConfig, StoreConfig};
use crate::store::KvConnection;
use crate::AttrError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

pub const DEFAULT_POOL: &str = "default";

pub type Connection = Box<dyn KvConnection>;
pub type ConnectionFactory = Box<dyn Fn() -> Result<Connection, AttrError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    pub capacity: u32,
    pub timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        PoolOptions { capacity: 1, timeout: Duration::from_secs(2) }
    }
}

impl PoolOptions {
    pub fn new(capacity: u32, timeout: Duration) -> Self {
        PoolOptions { capacity, timeout }
    }

    fn validate(&self, name: &str) -> Result<(), AttrError> {
        if self.capacity == 0 {
            return Err(AttrError::config(format!("pool `{}` needs a capacity of at least 1", name)));
        }
        if self.timeout.is_zero() {
            return Err(AttrError::config(format!("pool `{}` needs a non-zero checkout timeout", name)));
        }
        Ok(())
    }
}

/// Last failure of the connection factory, so a checkout that timed out because the store is
/// unreachable is not mistaken for a busy pool.
#[derive(Default)]
struct ConnectFailures {
    last: Mutex<Option<(Instant, String)>>,
}

impl ConnectFailures {
    fn record(&self, error: &AttrError) {
        let reason = match error {
            AttrError::StoreUnavailable(reason) => reason.clone(),
            other => other.to_string(),
        };
        if let Ok(mut last) = self.last.lock() {
            *last = Some((Instant::now(), reason));
        }
    }

    fn clear(&self) {
        if let Ok(mut last) = self.last.lock() {
            *last = None;
        }
    }

    fn since(&self, started: Instant) -> Option<String> {
        let last = self.last.lock().ok()?;
        last.as_ref().filter(|(at, _)| *at >= started).map(|(_, reason)| reason.clone())
    }
}

pub struct ConnectionManager {
    factory: ConnectionFactory,
    failures: Arc<ConnectFailures>,
}

impl r2d2::ManageConnection for ConnectionManager {
    type Connection = Connection;
    type Error = AttrError;

    fn connect(&self) -> Result<Connection, AttrError> {
        match (self.factory)() {
            Ok(conn) => {
                self.failures.clear();
                Ok(conn)
            }
            Err(e) => {
                self.failures.record(&e);
                Err(e)
            }
        }
    }

    fn is_valid(&self, conn: &mut Connection) -> Result<(), AttrError> {
        if conn.is_broken() { Err(AttrError::store("connection is broken")) } else { Ok(()) }
    }

    fn has_broken(&self, conn: &mut Connection) -> bool {
        conn.is_broken()
    }
}

#[derive(Debug)]
struct PoolErrorLogger {
    pool: String,
}

impl r2d2::HandleError<AttrError> for PoolErrorLogger {
    fn handle_error(&self, error: AttrError) {
        crate::warn!("pool {} failed to open a connection: {}", self.pool, error);
    }
}

#[derive(Clone)]
pub struct AttrPool {
    name: String,
    options: PoolOptions,
    inner: r2d2::Pool<ConnectionManager>,
    failures: Arc<ConnectFailures>,
    closed: Arc<AtomicBool>,
}

impl AttrPool {
    pub fn new(name: &str, factory: ConnectionFactory, options: PoolOptions) -> Result<Self, AttrError> {
        options.validate(name)?;
        let failures = Arc::new(ConnectFailures::default());
        let inner = r2d2::Pool::builder()
            .max_size(options.capacity)
            .min_idle(Some(0))
            .connection_timeout(options.timeout)
            .error_handler(Box::new(PoolErrorLogger { pool: name.to_string() }))
            .build_unchecked(ConnectionManager { factory, failures: failures.clone() });
        Ok(AttrPool { name: name.to_string(), options, inner, failures, closed: Arc::new(AtomicBool::new(false)) })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> PoolOptions {
        self.options
    }

    /// `(open connections, idle connections)`
    pub fn state(&self) -> (u32, u32) {
        let state = self.inner.state();
        (state.connections, state.idle_connections)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Checks a connection out for the duration of `op`. The connection goes back to the pool
    /// on every exit path, including when `op` fails or panics.
    ///
    /// A checkout that times out while the factory keeps failing is `StoreUnavailable`; only a
    /// timeout against a healthy but busy pool is `PoolExhausted`.
    pub fn with<R, F>(&self, op: F) -> Result<R, AttrError>
    where
        F: FnOnce(&mut dyn KvConnection) -> Result<R, AttrError>,
    {
        if self.is_closed() {
            return Err(AttrError::PoolClosed(self.name.clone()));
        }
        let started = Instant::now();
        let mut conn = self.inner.get().map_err(|e| match self.failures.since(started) {
            Some(reason) => AttrError::StoreUnavailable(format!("pool `{}` cannot connect: {}", self.name, reason)),
            None => AttrError::PoolExhausted {
                pool: self.name.clone(),
                timeout: self.options.timeout,
                reason: e.to_string(),
            },
        })?;
        op(&mut **conn)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

static GLOBAL: Lazy<Arc<PoolRegistry>> = Lazy::new(|| Arc::new(PoolRegistry::new()));

#[derive(Default)]
pub struct PoolRegistry {
    pools: RwLock<HashMap<String, AttrPool>>,
    shut_down: AtomicBool,
}

impl PoolRegistry {
    pub fn new() -> Self {
        PoolRegistry::default()
    }

    /// Process-wide registry used by [`crate::configure`] and [`crate::shutdown`].
    pub fn global() -> Arc<PoolRegistry> {
        GLOBAL.clone()
    }

    pub fn from_config(config: &AttrConfig) -> Result<Self, AttrError> {
        let registry = PoolRegistry::new();
        registry.apply(config)?;
        Ok(registry)
    }

    pub fn apply(&self, config: &AttrConfig) -> Result<(), AttrError> {
        for pool in &config.pools {
            self.configure(Some(&pool.name), &pool.store, pool.options())?;
        }
        Ok(())
    }

    /// Registers a pool under `name`, or the default pool when `name` is `None`.
    /// Registering an existing name replaces that pool; checkouts in flight finish on the old one.
    pub fn register<F>(&self, name: Option<&str>, factory: F, options: PoolOptions) -> Result<(), AttrError>
    where
        F: Fn() -> Result<Connection, AttrError> + Send + Sync + 'static,
    {
        let name = name.unwrap_or(DEFAULT_POOL);
        if self.is_shut_down() {
            return Err(AttrError::PoolClosed(format!("registry shut down, cannot register `{}`", name)));
        }
        let pool = AttrPool::new(name, Box::new(factory), options)?;
        let replaced = self.pools.write()?.insert(name.to_string(), pool);
        match replaced {
            Some(old) => {
                old.close();
                crate::warn!("pool {} replaced (capacity {}, timeout {:?})", name, options.capacity, options.timeout);
            }
            None => crate::info!("pool {} registered (capacity {}, timeout {:?})", name, options.capacity, options.timeout),
        }
        Ok(())
    }

    /// Every connection of the pool is a clone of `store`.
    pub fn register_store<S>(&self, name: Option<&str>, store: S, options: PoolOptions) -> Result<(), AttrError>
    where
        S: KvConnection + Clone + Sync + 'static,
    {
        self.register(name, move || Ok(Box::new(store.clone()) as Connection), options)
    }

    pub fn configure(&self, name: Option<&str>, store: &StoreConfig, options: PoolOptions) -> Result<(), AttrError> {
        let factory = store.factory()?;
        self.register(name, factory, options)
    }

    pub fn pool(&self, name: Option<&str>) -> Result<AttrPool, AttrError> {
        let name = name.unwrap_or(DEFAULT_POOL);
        if self.is_shut_down() {
            return Err(AttrError::PoolClosed(format!("registry shut down, no checkout from `{}`", name)));
        }
        self.pools
            .read()?
            .get(name)
            .cloned()
            .ok_or_else(|| AttrError::config(format!("pool `{}` is not registered", name)))
    }

    pub fn with<R, F>(&self, name: Option<&str>, op: F) -> Result<R, AttrError>
    where
        F: FnOnce(&mut dyn KvConnection) -> Result<R, AttrError>,
    {
        self.pool(name)?.with(op)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pools.read().map(|pools| pools.keys().cloned().collect()).unwrap_or_default();
        names.sort();
        names
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Rejects every later checkout. Idle connections close with their pool; checkouts already
    /// in flight complete and release before their pool is dropped.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        let drained: Vec<AttrPool> = match self.pools.write() {
            Ok(mut pools) => pools.drain().map(|(_, pool)| pool).collect(),
            Err(poisoned) => poisoned.into_inner().drain().map(|(_, pool)| pool).collect(),
        };
        for pool in &drained {
            pool.close();
        }
        crate::info!("pool registry shut down, {} pool(s) closed", drained.len());
    }
}
