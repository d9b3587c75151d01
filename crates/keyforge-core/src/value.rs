//! Dynamic argument values
//!
//! Arguments reach the engine as a snapshot of [`Value`]s. User types take part
//! in member access by implementing [`Reflect`], which exposes getters and
//! fields by slot so the engine never needs blanket runtime introspection.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::meta::{MemberKind, TypeInfo};

/// Capability implemented by user types whose members templates may read.
///
/// `get` receives the slot position from the type's [`TypeInfo`] getter or
/// field table. Slots outside the table must return `Value::Null`.
pub trait Reflect: fmt::Debug + Send + Sync {
    /// Description of this value's type.
    ///
    /// Called on every member read, so return a shared `Arc` built once (a
    /// `static OnceLock<Arc<TypeInfo>>` works) rather than a new one per call.
    /// Accessors match their owner by pointer and only compare type names when
    /// the pointers differ.
    fn type_info(&self) -> Arc<TypeInfo>;

    fn get(&self, kind: MemberKind, slot: usize) -> Value;

    /// Canonical string form used when the object itself ends up in a key
    fn render(&self) -> String {
        self.type_info().name().to_string()
    }
}

/// One argument, or a value reached by walking an accessor chain
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    List(Arc<Vec<Value>>),
    Map(Arc<BTreeMap<String, Value>>),
    Object(Arc<dyn Reflect>),
}

impl Value {
    /// Wrap a reflectable user value
    pub fn object<T: Reflect + 'static>(value: T) -> Self {
        Value::Object(Arc::new(value))
    }

    /// Build a map value from `(key, value)` pairs
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type name, matching `TypeRef::type_name` for the same shape
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "i64".to_string(),
            Value::Float(_) => "f64".to_string(),
            Value::Char(_) => "char".to_string(),
            Value::Str(_) => "String".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Object(o) => o.type_info().name().to_string(),
        }
    }

    /// Map entry by key; `Null` for missing keys and non-map values
    pub fn lookup_key(&self, key: &str) -> Value {
        match self {
            Value::Map(entries) => entries.get(key).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Canonical string conversion
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Char(c) => write!(f, "{}", c),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Object(o) => f.write_str(&o.render()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(Arc::new(v.into_iter().map(Into::into).collect()))
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(v: BTreeMap<String, T>) -> Self {
        Value::map(v)
    }
}

impl<T: Reflect + 'static> From<Arc<T>> for Value {
    fn from(v: Arc<T>) -> Self {
        Value::Object(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => items.into(),
            serde_json::Value::Object(entries) => Value::map(entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::TypeRef;
    use std::sync::OnceLock;

    #[derive(Debug)]
    struct Badge(i64);

    impl Reflect for Badge {
        fn type_info(&self) -> Arc<TypeInfo> {
            static TYPE: OnceLock<Arc<TypeInfo>> = OnceLock::new();
            TYPE.get_or_init(|| {
                TypeInfo::builder("Badge")
                    .getter("get_number", TypeRef::int())
                    .build()
            })
            .clone()
        }

        fn get(&self, kind: MemberKind, slot: usize) -> Value {
            match (kind, slot) {
                (MemberKind::Getter, 0) => self.0.into(),
                _ => Value::Null,
            }
        }
    }

    #[test]
    fn test_scalar_rendering() {
        assert_eq!(Value::from(42).render(), "42");
        assert_eq!(Value::from(-7i64).render(), "-7");
        assert_eq!(Value::from(true).render(), "true");
        assert_eq!(Value::from("a").render(), "a");
        assert_eq!(Value::from('x').render(), "x");
        assert_eq!(Value::Null.render(), "null");
        assert_eq!(Value::from(1.5).render(), "1.5");
    }

    #[test]
    fn test_collection_rendering_is_ordered() {
        let list: Value = vec![1, 2, 3].into();
        assert_eq!(list.render(), "[1, 2, 3]");

        let map = Value::map([("b", Value::from(2)), ("a", Value::from("x"))]);
        assert_eq!(map.render(), "{a=x, b=2}");
    }

    #[test]
    fn test_object_defaults_to_type_name() {
        let badge = Value::object(Badge(9));
        assert_eq!(badge.render(), "Badge");
        assert_eq!(badge.type_name(), "Badge");
    }

    #[test]
    fn test_lookup_key_on_non_map_is_null() {
        let map = Value::map([("age", 1)]);
        assert_eq!(map.lookup_key("age"), Value::Int(1));
        assert!(map.lookup_key("missing").is_null());
        assert!(Value::from("text").lookup_key("age").is_null());
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"id": 5, "tags": ["x", null], "score": 2.5});
        let value = Value::from(json);
        assert_eq!(value.lookup_key("id"), Value::Int(5));
        assert_eq!(value.lookup_key("tags").render(), "[x, null]");
        assert_eq!(value.lookup_key("score"), Value::Float(2.5));
    }

    #[test]
    fn test_option_maps_none_to_null() {
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(Some("v")), Value::Str("v".into()));
    }
}
