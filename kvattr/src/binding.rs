use crate::codec::{AttrValue, Scalar, ScalarKind};
use crate::proxy::{AttrSlot, ChangeSet};
use crate::utils;
use crate::AttrError;

pub const DEFAULT_IDENTITY_FIELD: &str = "id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub kind: ScalarKind,
    pub default: Option<Scalar>,
}

/// Per-model declaration set. Built once while the model is being set up and read-only after.
#[derive(Debug, Clone)]
pub struct ClassBinding {
    model: String,
    namespace: String,
    fields: Vec<FieldDecl>,
    identity_field: Option<String>,
    pool_name: Option<String>,
}

impl ClassBinding {
    pub fn builder(model: &str) -> BindingBuilder {
        BindingBuilder::new(model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Leading key segment, the plural snake case of the model name unless overridden.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn identity_field(&self) -> &str {
        self.identity_field.as_deref().unwrap_or(DEFAULT_IDENTITY_FIELD)
    }

    pub fn pool_name(&self) -> Option<&str> {
        self.pool_name.as_deref()
    }

    pub(crate) fn require_field(&self, name: &str) -> Result<&FieldDecl, AttrError> {
        self.field(name).ok_or_else(|| AttrError::config(format!("`{}` declares no attribute `{}`", self.model, name)))
    }

    /// `{namespace}:{identity}:{field}`; refuses to build a key without an identity.
    pub fn key(&self, identity: Option<&str>, field: &str) -> Result<String, AttrError> {
        let decl = self.require_field(field)?;
        match identity {
            Some(id) if !id.is_empty() => Ok(format!("{}:{}:{}", self.namespace, id, decl.name)),
            _ => Err(AttrError::IdentityNotReady { model: self.model.clone(), field: self.identity_field().to_string() }),
        }
    }

    pub fn keys(&self, identity: Option<&str>) -> Result<Vec<String>, AttrError> {
        self.fields.iter().map(|f| self.key(identity, &f.name)).collect()
    }
}

pub struct BindingBuilder {
    binding: ClassBinding,
}

impl BindingBuilder {
    pub fn new(model: &str) -> Self {
        let model = model.rsplit("::").next().unwrap_or(model).to_string();
        BindingBuilder {
            binding: ClassBinding {
                namespace: utils::tableize(&model),
                model,
                fields: Vec::new(),
                identity_field: None,
                pool_name: None,
            },
        }
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.binding.namespace = namespace.to_string();
        self
    }

    /// Calling this again replaces the previous choice.
    pub fn identity_field(mut self, field: &str) -> Self {
        self.binding.identity_field = Some(field.to_string());
        self
    }

    /// Calling this again replaces the previous choice.
    pub fn pool(mut self, pool_name: &str) -> Self {
        self.binding.pool_name = Some(pool_name.to_string());
        self
    }

    pub fn declare<T: AttrValue>(self, name: &str, default: Option<Scalar>) -> Result<Self, AttrError> {
        self.declare_kind(name, T::KIND, default)
    }

    /// Declares by type name, as found in configuration files: `string`/`text` or `integer`.
    pub fn declare_named(self, name: &str, type_name: &str, default: Option<Scalar>) -> Result<Self, AttrError> {
        let kind = type_name.parse::<ScalarKind>()?;
        self.declare_kind(name, kind, default)
    }

    pub fn declare_kind(mut self, name: &str, kind: ScalarKind, default: Option<Scalar>) -> Result<Self, AttrError> {
        if name.is_empty() || name.contains(':') {
            return Err(AttrError::config(format!("invalid attribute name `{}` on `{}`", name, self.binding.model)));
        }
        if self.binding.field(name).is_some() {
            return Err(AttrError::config(format!("attribute `{}` already declared on `{}`", name, self.binding.model)));
        }
        self.binding.fields.push(FieldDecl { name: name.to_string(), kind, default: default.map(|d| d.coerce(kind)) });
        Ok(self)
    }

    pub fn build(self) -> ClassBinding {
        self.binding
    }
}

/// Resolves the identity segment of a key. `None` means the host has not been persisted yet.
pub trait IdentityValue {
    fn identity_value(&self) -> Option<String>;
}

impl<T: IdentityValue> IdentityValue for Option<T> {
    fn identity_value(&self) -> Option<String> {
        self.as_ref().and_then(IdentityValue::identity_value)
    }
}

impl IdentityValue for String {
    fn identity_value(&self) -> Option<String> {
        if self.is_empty() { None } else { Some(self.clone()) }
    }
}

macro_rules! identity_value_for_int {
    ($($t:ty),*) => {
        $(
            impl IdentityValue for $t {
                fn identity_value(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}

identity_value_for_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// A host object whose declared attributes live in the key-value store.
///
/// Usually derived with `#[derive(KvAttrs)]`; the derive fills every method from the struct's
/// `#[attr_id]` and `#[kv_attr]` fields.
pub trait AttrModel {
    fn attr_binding() -> Result<&'static ClassBinding, AttrError>;

    fn attr_identity(&self) -> Option<String>;

    fn attr_slot(&self, name: &str) -> Option<&dyn AttrSlot>;

    fn attr_slot_mut(&mut self, name: &str) -> Option<&mut dyn AttrSlot>;

    /// Pending changes of all declared fields, in declaration order.
    fn attr_changes(&self) -> Result<ChangeSet, AttrError> {
        let binding = Self::attr_binding()?;
        let mut changes = ChangeSet::new();
        for decl in binding.fields() {
            if let Some((previous, current)) = self.attr_slot(&decl.name).and_then(|slot| slot.scalar_change()) {
                changes.push(&decl.name, previous, current);
            }
        }
        Ok(changes)
    }
}

pub struct ModelInfo {
    pub name: &'static str,
    pub binding_fn: fn() -> Result<&'static ClassBinding, AttrError>,
}

inventory::collect!(ModelInfo);

pub fn models() -> impl Iterator<Item = &'static ModelInfo> {
    inventory::iter::<ModelInfo>.into_iter()
}

pub fn model_binding(name: &str) -> Option<Result<&'static ClassBinding, AttrError>> {
    models().find(|info| info.name == name).map(|info| (info.binding_fn)())
}
