//! In-memory state of declared attributes.
//!
//! Every declared field of a host is an [`Attr<T>`]: a lazily materialized value plus the
//! dirty bookkeeping needed for `was`/`change`/`restore`. Loading is delegated to a closure so
//! the attribute never needs to know about keys, pools or the store.

use crate::codec::{AttrValue, Scalar, ScalarKind};
use crate::AttrError;

#[derive(Debug, Clone, PartialEq)]
pub struct Attr<T: AttrValue> {
    value: Option<T>,
    loaded: bool,
    dirty: bool,
    previous: Option<T>,
}

impl<T: AttrValue> Default for Attr<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: AttrValue> Attr<T> {
    pub const fn new() -> Self {
        Attr { value: None, loaded: false, dirty: false, previous: None }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Cached value without triggering a load.
    pub fn cached(&self) -> Option<&T> {
        if self.loaded { self.value.as_ref() } else { None }
    }

    pub fn get_or_load<F>(&mut self, load: F) -> Result<T, AttrError>
    where
        F: FnOnce() -> Result<Scalar, AttrError>,
    {
        match (&self.value, self.loaded) {
            (Some(value), true) => Ok(value.clone()),
            _ => {
                let value = T::typecast(load()?);
                self.value = Some(value.clone());
                self.loaded = true;
                Ok(value)
            }
        }
    }

    /// Writes only touch memory. A value equal to the current one after coercion leaves the
    /// field clean.
    pub fn set_with<V, F>(&mut self, value: V, load: F) -> Result<(), AttrError>
    where
        V: Into<Scalar>,
        F: FnOnce() -> Result<Scalar, AttrError>,
    {
        let current = self.get_or_load(load)?;
        let next = T::typecast(value.into());
        if next != current {
            self.snapshot(current);
        }
        self.value = Some(next);
        Ok(())
    }

    pub fn will_change_with<F>(&mut self, load: F) -> Result<(), AttrError>
    where
        F: FnOnce() -> Result<Scalar, AttrError>,
    {
        let current = self.get_or_load(load)?;
        self.snapshot(current);
        Ok(())
    }

    fn snapshot(&mut self, current: T) {
        if !self.dirty {
            self.previous = Some(current);
            self.dirty = true;
        }
    }

    pub fn is_changed(&self) -> bool {
        self.dirty
    }

    /// Value before the pending change, or the current one when nothing is pending.
    pub fn was(&self) -> Option<T> {
        if self.dirty { self.previous.clone() } else { self.cached().cloned() }
    }

    /// `(previous, current)` while a change is pending.
    pub fn change(&self) -> Option<(T, T)> {
        match (self.dirty, &self.previous, &self.value) {
            (true, Some(previous), Some(current)) => Some((previous.clone(), current.clone())),
            _ => None,
        }
    }

    /// Drops the pending change. Memory only, the store is not touched.
    pub fn restore(&mut self) {
        if self.dirty {
            self.value = self.previous.take();
            self.dirty = false;
        }
    }
}

/// Type-erased view of an [`Attr<T>`] used by the sync engine.
pub trait AttrSlot {
    fn kind(&self) -> ScalarKind;

    fn is_changed(&self) -> bool;

    fn current_scalar(&self) -> Option<Scalar>;

    fn scalar_change(&self) -> Option<(Scalar, Scalar)>;

    /// Overwrites the value with one fetched from the store and forgets pending changes.
    fn replace_loaded(&mut self, value: Scalar);

    fn mark_flushed(&mut self);
}

impl<T: AttrValue> AttrSlot for Attr<T> {
    fn kind(&self) -> ScalarKind {
        T::KIND
    }

    fn is_changed(&self) -> bool {
        self.dirty
    }

    fn current_scalar(&self) -> Option<Scalar> {
        self.cached().map(AttrValue::to_scalar)
    }

    fn scalar_change(&self) -> Option<(Scalar, Scalar)> {
        self.change().map(|(previous, current)| (previous.to_scalar(), current.to_scalar()))
    }

    fn replace_loaded(&mut self, value: Scalar) {
        self.value = Some(T::typecast(value));
        self.loaded = true;
        self.dirty = false;
        self.previous = None;
    }

    fn mark_flushed(&mut self) {
        self.dirty = false;
        self.previous = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub previous: Scalar,
    pub current: Scalar,
}

/// What a commit changed, as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        ChangeSet::default()
    }

    pub fn with(mut self, field: &str, previous: impl Into<Scalar>, current: impl Into<Scalar>) -> Self {
        self.push(field, previous, current);
        self
    }

    /// A second report for the same field keeps the first `previous` and takes the new `current`.
    pub fn push(&mut self, field: &str, previous: impl Into<Scalar>, current: impl Into<Scalar>) {
        let current = current.into();
        match self.changes.iter_mut().find(|c| c.field == field) {
            Some(existing) => existing.current = current,
            None => self.changes.push(FieldChange { field: field.to_string(), previous: previous.into(), current }),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field == field)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.field.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn stored(value: &'static str) -> impl FnOnce() -> Result<Scalar, AttrError> {
        move || Ok(Scalar::from(value))
    }

    fn unreachable_load() -> Result<Scalar, AttrError> {
        Err(AttrError::store("must not load"))
    }

    #[test]
    fn first_read_loads_once() {
        let calls = Cell::new(0);
        let mut title: Attr<String> = Attr::new();
        let load = || { calls.set(calls.get() + 1); Ok(Scalar::from("foobar")) };
        assert_eq!(title.get_or_load(load).unwrap(), "foobar");
        assert_eq!(title.get_or_load(unreachable_load).unwrap(), "foobar");
        assert_eq!(calls.get(), 1);
        assert!(!title.is_changed());
    }

    #[test]
    fn failed_load_leaves_field_unloaded() {
        let mut title: Attr<String> = Attr::new();
        assert!(title.get_or_load(unreachable_load).is_err());
        assert!(!title.is_loaded());
        assert_eq!(title.get_or_load(stored("later")).unwrap(), "later");
    }

    #[test]
    fn set_then_get_returns_coerced_value() {
        let mut version: Attr<i64> = Attr::new();
        version.set_with("12abc", stored("1")).unwrap();
        assert_eq!(version.get_or_load(unreachable_load).unwrap(), 12);
        assert_eq!(version.change(), Some((1, 12)));
        assert_eq!(version.was(), Some(1));
    }

    #[test]
    fn equal_after_coercion_is_not_a_change() {
        let mut version: Attr<i64> = Attr::new();
        version.set_with("4", stored("4")).unwrap();
        assert!(!version.is_changed());
        version.set_with(4, unreachable_load).unwrap();
        assert!(!version.is_changed());

        let mut title: Attr<String> = Attr::new();
        title.set_with("", stored("")).unwrap();
        assert!(!title.is_changed());
        title.set_with("draft", unreachable_load).unwrap();
        title.set_with("draft", unreachable_load).unwrap();
        assert_eq!(title.change(), Some((String::new(), "draft".to_string())));
    }

    #[test]
    fn previous_is_snapshotted_only_on_first_change() {
        let mut title: Attr<String> = Attr::new();
        title.set_with("a", stored("orig")).unwrap();
        title.set_with("b", unreachable_load).unwrap();
        assert_eq!(title.was(), Some("orig".to_string()));
        assert_eq!(title.change(), Some(("orig".to_string(), "b".to_string())));
    }

    #[test]
    fn restore_reverts_in_memory() {
        let mut title: Attr<String> = Attr::new();
        title.set_with("fizzbuzz", stored("foobar")).unwrap();
        title.restore();
        assert!(!title.is_changed());
        assert_eq!(title.get_or_load(unreachable_load).unwrap(), "foobar");
        assert_eq!(title.change(), None);
    }

    #[test]
    fn will_change_marks_dirty_without_new_value() {
        let mut title: Attr<String> = Attr::new();
        title.will_change_with(stored("same")).unwrap();
        assert!(title.is_changed());
        assert_eq!(title.change(), Some(("same".to_string(), "same".to_string())));
    }

    #[test]
    fn slot_view_replaces_and_flushes() {
        let mut version: Attr<i64> = Attr::new();
        version.set_with(3, stored("4")).unwrap();
        let slot: &mut dyn AttrSlot = &mut version;
        assert_eq!(slot.scalar_change(), Some((Scalar::Integer(4), Scalar::Integer(3))));
        slot.replace_loaded(Scalar::from("9"));
        assert!(!slot.is_changed());
        assert_eq!(slot.current_scalar(), Some(Scalar::Integer(9)));
        assert_eq!(slot.kind(), ScalarKind::Integer);
    }

    #[test]
    fn change_set_merges_reports_per_field() {
        let mut changes = ChangeSet::new().with("title", "", "a");
        changes.push("title", "a", "b");
        changes.push("version", 1, 2);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.fields(), vec!["title", "version"]);
        let title = changes.get("title").unwrap();
        assert_eq!((title.previous.clone(), title.current.clone()), (Scalar::from(""), Scalar::from("b")));
    }
}
