//! Moves declared attributes between hosts and the store.
//!
//! Every operation resolves its keys first, then checks out exactly one pooled connection for a
//! single batched command. Nothing is retried and nothing is swallowed: a failed checkout or store
//! call is logged and returned to the caller.

use crate::binding::{AttrModel, ClassBinding, FieldDecl};
use crate::codec::{self, Scalar};
use crate::pool::PoolRegistry;
use crate::proxy::ChangeSet;
use crate::AttrError;
use std::sync::Arc;

#[derive(Clone)]
pub struct SyncEngine {
    registry: Arc<PoolRegistry>,
}

impl SyncEngine {
    pub fn new(registry: Arc<PoolRegistry>) -> Self {
        SyncEngine { registry }
    }

    /// Engine over the process-wide registry.
    pub fn global() -> Self {
        SyncEngine::new(PoolRegistry::global())
    }

    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    pub fn attr_key<H: AttrModel>(&self, host: &H, field: &str) -> Result<String, AttrError> {
        H::attr_binding()?.key(host.attr_identity().as_deref(), field)
    }

    pub fn load_one<H: AttrModel>(&self, host: &H, field: &str) -> Result<Scalar, AttrError> {
        let binding = H::attr_binding()?;
        let decl = binding.require_field(field)?;
        self.fetch(binding, host.attr_identity().as_deref(), decl)
    }

    /// Lazy read handle for one field. Holds no borrow of `host`, so it can feed
    /// [`crate::Attr::get_or_load`] while the host's field is borrowed mutably.
    pub fn loader<'a, H: AttrModel>(&'a self, host: &H, field: &'a str) -> Result<FieldLoader<'a>, AttrError> {
        Ok(FieldLoader { engine: self, binding: H::attr_binding()?, identity: host.attr_identity(), field })
    }

    /// Overwrites every declared field with the stored value, pending edits included.
    pub fn load_all<H: AttrModel>(&self, host: &mut H) -> Result<(), AttrError> {
        let binding = H::attr_binding()?;
        let keys = binding.keys(host.attr_identity().as_deref())?;
        let raws = self.registry.with(binding.pool_name(), |conn| conn.mget(&keys)).map_err(|e| {
            crate::error!("reload of {} ({} keys) failed: {}", binding.model(), keys.len(), e);
            e
        })?;
        if raws.len() != keys.len() {
            return Err(AttrError::store(format!("asked for {} keys, store answered {}", keys.len(), raws.len())));
        }
        for (decl, raw) in binding.fields().iter().zip(raws) {
            let value = codec::decode(raw.as_deref(), decl.kind, decl.default.as_ref());
            host.attr_slot_mut(&decl.name)
                .ok_or_else(|| AttrError::config(format!("`{}` has no slot for `{}`", binding.model(), decl.name)))?
                .replace_loaded(value);
        }
        Ok(())
    }

    /// Writes the reported new values of declared fields in one batch and returns the names written,
    /// in declaration order. Reports about undeclared names are ignored. An empty report writes nothing.
    pub fn flush_changed<H: AttrModel>(&self, host: &H, changes: &ChangeSet) -> Result<Vec<String>, AttrError> {
        let binding = H::attr_binding()?;
        let identity = host.attr_identity();
        let mut pairs = Vec::new();
        let mut flushed = Vec::new();
        for decl in binding.fields() {
            if let Some(change) = changes.get(&decl.name) {
                let key = binding.key(identity.as_deref(), &decl.name)?;
                pairs.push((key, codec::encode(&change.current.clone().coerce(decl.kind))));
                flushed.push(decl.name.clone());
            }
        }
        if pairs.is_empty() {
            return Ok(flushed);
        }
        self.registry.with(binding.pool_name(), |conn| conn.mset(&pairs)).map_err(|e| {
            crate::error!("flush of {} {:?} failed: {}", binding.model(), flushed, e);
            e
        })?;
        Ok(flushed)
    }

    /// Deletes the key of every declared field whether or not it was ever loaded or written.
    pub fn delete_all<H: AttrModel>(&self, host: &H) -> Result<usize, AttrError> {
        let binding = H::attr_binding()?;
        let keys = binding.keys(host.attr_identity().as_deref())?;
        if keys.is_empty() {
            return Ok(0);
        }
        self.registry.with(binding.pool_name(), |conn| conn.del(&keys)).map_err(|e| {
            crate::error!("delete of {} ({} keys) failed: {}", binding.model(), keys.len(), e);
            e
        })
    }

    pub fn stored<H: AttrModel>(&self, host: &H, field: &str) -> Result<bool, AttrError> {
        let binding = H::attr_binding()?;
        let key = binding.key(host.attr_identity().as_deref(), field)?;
        self.registry.with(binding.pool_name(), |conn| conn.exists(&key))
    }

    fn fetch(&self, binding: &ClassBinding, identity: Option<&str>, decl: &FieldDecl) -> Result<Scalar, AttrError> {
        let key = binding.key(identity, &decl.name)?;
        let raw = self.registry.with(binding.pool_name(), |conn| conn.get(&key))?;
        Ok(codec::decode(raw.as_deref(), decl.kind, decl.default.as_ref()))
    }
}

pub struct FieldLoader<'a> {
    engine: &'a SyncEngine,
    binding: &'static ClassBinding,
    identity: Option<String>,
    field: &'a str,
}

impl FieldLoader<'_> {
    /// A host without identity has nothing stored yet and reads its defaults without a round trip.
    pub fn load(self) -> Result<Scalar, AttrError> {
        let decl = self.binding.require_field(self.field)?;
        match self.identity.as_deref() {
            None | Some("") => Ok(codec::decode(None, decl.kind, decl.default.as_ref())),
            Some(identity) => self.engine.fetch(self.binding, Some(identity), decl),
        }
    }
}
