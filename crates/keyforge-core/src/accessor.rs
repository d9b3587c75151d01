//! Resolved-accessor table
//!
//! Maps `(type name, member name)` to the way that member is read: a getter
//! slot, a field slot, or a map-key lookup. Resolution happens once per pair
//! and is shared process-wide; misses are cached as well so unknown members
//! cost one lookup after the first.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::meta::{MemberKind, TypeInfo, TypeRef};
use crate::value::{Reflect, Value};

const MAP_OWNER: &str = "map";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Getter { slot: usize },
    Field { slot: usize },
    MapKey,
}

/// How one member of one type is read
#[derive(Debug, Clone)]
pub struct ResolvedAccessor {
    owner: String,
    /// Type the member was resolved on; `None` for map keys
    owner_info: Option<Arc<TypeInfo>>,
    member: String,
    kind: AccessorKind,
    result: TypeRef,
}

impl ResolvedAccessor {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn kind(&self) -> AccessorKind {
        self.kind
    }

    /// Declared type of the value this accessor produces
    pub fn result_type(&self) -> &TypeRef {
        &self.result
    }

    /// Read the member from `target`.
    ///
    /// Returns `Null` when `target` is null or is not an instance of the owner
    /// type.
    pub fn apply(&self, target: &Value) -> Value {
        match (self.kind, target) {
            (AccessorKind::MapKey, Value::Map(_)) => target.lookup_key(&self.member),
            (AccessorKind::Getter { slot }, Value::Object(obj)) if self.owns(&**obj) => {
                obj.get(MemberKind::Getter, slot)
            }
            (AccessorKind::Field { slot }, Value::Object(obj)) if self.owns(&**obj) => {
                obj.get(MemberKind::Field, slot)
            }
            _ => Value::Null,
        }
    }

    // Pointer identity first; types that rebuild their TypeInfo fall back to the name.
    fn owns(&self, obj: &dyn Reflect) -> bool {
        let info = obj.type_info();
        match &self.owner_info {
            Some(owner) if Arc::ptr_eq(owner, &info) => true,
            _ => info.name() == self.owner,
        }
    }
}

/// Process-wide `(type, member) -> accessor` cache
#[derive(Debug, Default)]
pub struct AccessorTable {
    entries: DashMap<(String, String), Option<Arc<ResolvedAccessor>>>,
    resolutions: AtomicUsize,
}

impl AccessorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shared by every engine that does not bring its own
    pub fn global() -> Arc<AccessorTable> {
        static TABLE: OnceLock<Arc<AccessorTable>> = OnceLock::new();
        TABLE.get_or_init(|| Arc::new(AccessorTable::new())).clone()
    }

    /// Resolve `member` on a reflectable type: bean getter, then field
    pub fn resolve(&self, info: &Arc<TypeInfo>, member: &str) -> Option<Arc<ResolvedAccessor>> {
        let key = (info.name().to_string(), member.to_string());
        if let Some(hit) = self.entries.get(&key) {
            return hit.value().clone();
        }
        self.entries
            .entry(key)
            .or_insert_with(|| {
                self.resolutions.fetch_add(1, Ordering::Relaxed);
                Self::lookup(info, member)
            })
            .value()
            .clone()
    }

    /// Key-lookup accessor for map-typed values
    pub fn map_key(&self, member: &str) -> Arc<ResolvedAccessor> {
        let key = (MAP_OWNER.to_string(), member.to_string());
        self.entries
            .entry(key)
            .or_insert_with(|| {
                self.resolutions.fetch_add(1, Ordering::Relaxed);
                Some(Self::map_accessor(member))
            })
            .value()
            .clone()
            .unwrap_or_else(|| Self::map_accessor(member))
    }

    /// Resolve `member` against the runtime type of `value`.
    ///
    /// `None` for values that have no members (null, scalars, lists) and for
    /// objects whose type does not expose `member`.
    pub fn resolve_runtime(&self, value: &Value, member: &str) -> Option<Arc<ResolvedAccessor>> {
        match value {
            Value::Map(_) => Some(self.map_key(member)),
            Value::Object(obj) => self.resolve(&obj.type_info(), member),
            _ => None,
        }
    }

    /// Number of cached `(type, member)` pairs, misses included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of resolutions actually computed, i.e. cache misses
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::Relaxed)
    }

    fn map_accessor(member: &str) -> Arc<ResolvedAccessor> {
        Arc::new(ResolvedAccessor {
            owner: MAP_OWNER.to_string(),
            owner_info: None,
            member: member.to_string(),
            kind: AccessorKind::MapKey,
            result: TypeRef::Any,
        })
    }

    fn lookup(info: &Arc<TypeInfo>, member: &str) -> Option<Arc<ResolvedAccessor>> {
        let (kind, result) = if let Some((slot, getter)) = info.getter_slot(member) {
            (AccessorKind::Getter { slot }, getter.ty.clone())
        } else if let Some((slot, field)) = info.field_slot(member) {
            (AccessorKind::Field { slot }, field.ty.clone())
        } else {
            tracing::debug!(type_name = info.name(), member, "member not found");
            return None;
        };
        Some(Arc::new(ResolvedAccessor {
            owner: info.name().to_string(),
            owner_info: Some(info.clone()),
            member: member.to_string(),
            kind,
            result,
        }))
    }
}
