//! Method and type metadata consumed by the compiler.
//!
//! A guarded call site is described by a [`MethodSignature`]: its owner, its
//! name and the declared type of each parameter. Declared types drive
//! compile-time member resolution; `TypeRef::Any` defers resolution to the
//! runtime type of the argument.

use std::fmt;
use std::sync::Arc;

use keyforge_core_types::SiteLabel;

/// Lazily produced type description.
///
/// A function pointer rather than an `Arc` so types can refer to themselves
/// (`Node.next: Node`).
pub type TypeFn = fn() -> Arc<TypeInfo>;

/// Declared type of a parameter, getter or field
#[derive(Clone)]
pub enum TypeRef {
    /// Unknown statically; members resolve against the runtime value
    Any,
    /// Leaf value with no members (`i64`, `String`, ...)
    Scalar(&'static str),
    /// String-keyed map; every segment is a key lookup
    Map,
    /// Sequence; has no addressable members in templates
    List,
    /// Reflectable struct
    Object(TypeFn),
}

impl TypeRef {
    pub fn string() -> Self {
        TypeRef::Scalar("String")
    }

    pub fn int() -> Self {
        TypeRef::Scalar("i64")
    }

    pub fn float() -> Self {
        TypeRef::Scalar("f64")
    }

    pub fn bool() -> Self {
        TypeRef::Scalar("bool")
    }

    /// Name used in diagnostics and as the accessor-table key
    pub fn type_name(&self) -> String {
        match self {
            TypeRef::Any => "any".to_string(),
            TypeRef::Scalar(name) => (*name).to_string(),
            TypeRef::Map => "map".to_string(),
            TypeRef::List => "list".to_string(),
            TypeRef::Object(f) => f().name().to_string(),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Object(_) => write!(f, "Object({})", self.type_name()),
            _ => f.write_str(&self.type_name()),
        }
    }
}

/// Distinguishes the two member tables of a [`TypeInfo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Getter,
    Field,
}

/// One getter or field exposed by a type
#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub name: String,
    pub ty: TypeRef,
}

/// Reflectable description of a user type.
///
/// Getters follow bean-property naming: the property `name` is served by a
/// getter called `get_name`, `is_name` or `name`, checked in that order.
/// Names must be unique per process; the accessor table keys on them.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    name: String,
    getters: Vec<MemberInfo>,
    fields: Vec<MemberInfo>,
}

impl TypeInfo {
    pub fn builder(name: impl Into<String>) -> TypeInfoBuilder {
        TypeInfoBuilder {
            info: TypeInfo {
                name: name.into(),
                getters: Vec::new(),
                fields: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn getters(&self) -> &[MemberInfo] {
        &self.getters
    }

    pub fn fields(&self) -> &[MemberInfo] {
        &self.fields
    }

    /// Slot of the getter serving `property`, bean naming first
    pub fn getter_slot(&self, property: &str) -> Option<(usize, &MemberInfo)> {
        let candidates = [
            format!("get_{}", property),
            format!("is_{}", property),
            property.to_string(),
        ];
        candidates.iter().find_map(|wanted| {
            self.getters
                .iter()
                .enumerate()
                .find(|(_, m)| &m.name == wanted)
        })
    }

    /// Slot of the field called `name`
    pub fn field_slot(&self, name: &str) -> Option<(usize, &MemberInfo)> {
        self.fields.iter().enumerate().find(|(_, m)| m.name == name)
    }

    /// Member names as they may appear in templates
    pub fn property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .getters
            .iter()
            .map(|g| {
                g.name
                    .strip_prefix("get_")
                    .or_else(|| g.name.strip_prefix("is_"))
                    .unwrap_or(&g.name)
                    .to_string()
            })
            .chain(self.fields.iter().map(|f| f.name.clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

pub struct TypeInfoBuilder {
    info: TypeInfo,
}

impl TypeInfoBuilder {
    pub fn getter(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.info.getters.push(MemberInfo {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.info.fields.push(MemberInfo {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn build(self) -> Arc<TypeInfo> {
        Arc::new(self.info)
    }
}

/// One declared parameter
#[derive(Debug, Clone)]
pub struct ParamInfo {
    /// Declared name, when the platform could discover it
    pub name: Option<String>,
    pub ty: TypeRef,
}

/// Metadata of a guarded method
#[derive(Debug, Clone)]
pub struct MethodSignature {
    owner: String,
    name: String,
    params: Vec<ParamInfo>,
}

impl MethodSignature {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Append a named parameter
    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(ParamInfo {
            name: Some(name.into()),
            ty,
        });
        self
    }

    /// Append a parameter whose name is not discoverable
    pub fn unnamed_param(mut self, ty: TypeRef) -> Self {
        self.params.push(ParamInfo { name: None, ty });
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn label(&self) -> SiteLabel {
        SiteLabel::new(&self.owner, &self.name)
    }

    /// Identity of the method within the process: label plus parameter types
    pub fn method_id(&self) -> String {
        let types: Vec<String> = self.params.iter().map(|p| p.ty.type_name()).collect();
        format!("{}({})", self.label(), types.join(","))
    }
}
