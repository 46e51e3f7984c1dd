//! Host framework events mapped onto engine operations.
//!
//! Hosts call these only after their own commit has succeeded. A failed commit must never reach
//! here, so no flush happens for it.

use crate::binding::AttrModel;
use crate::sync::SyncEngine;
use crate::AttrError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Created,
    Updated,
    Destroyed,
    Reload,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleEvent::Created => "created",
            LifecycleEvent::Updated => "updated",
            LifecycleEvent::Destroyed => "destroyed",
            LifecycleEvent::Reload => "reload",
        };
        f.write_str(name)
    }
}

impl SyncEngine {
    /// Created and Updated flush pending changes, Destroyed deletes every declared key, Reload
    /// overwrites the host with the stored values. Fields are marked clean only once the write
    /// went through.
    pub fn notify<H: AttrModel>(&self, host: &mut H, event: LifecycleEvent) -> Result<(), AttrError> {
        match event {
            LifecycleEvent::Created | LifecycleEvent::Updated => {
                let changes = host.attr_changes()?;
                let flushed = self.flush_changed(host, &changes)?;
                for field in &flushed {
                    if let Some(slot) = host.attr_slot_mut(field) {
                        slot.mark_flushed();
                    }
                }
                Ok(())
            }
            LifecycleEvent::Destroyed => self.delete_all(host).map(|_| ()),
            LifecycleEvent::Reload => self.load_all(host),
        }
    }
}

/// Callback surface for host models, available on every [`AttrModel`].
pub trait AttrCallbacks: AttrModel + Sized {
    fn after_create(&mut self, sync: &SyncEngine) -> Result<(), AttrError> {
        sync.notify(self, LifecycleEvent::Created)
    }

    fn after_update(&mut self, sync: &SyncEngine) -> Result<(), AttrError> {
        sync.notify(self, LifecycleEvent::Updated)
    }

    fn after_destroy(&mut self, sync: &SyncEngine) -> Result<(), AttrError> {
        sync.notify(self, LifecycleEvent::Destroyed)
    }

    fn reload_attrs(&mut self, sync: &SyncEngine) -> Result<(), AttrError> {
        sync.notify(self, LifecycleEvent::Reload)
    }
}

impl<H: AttrModel> AttrCallbacks for H {}
