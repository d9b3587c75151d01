//! Runtime execution units of accessor-chain templates.
//!
//! Every node carries its default text, fixed at compile time, so evaluation
//! never consults configuration. Absent values render as the default; the only
//! failure is a member the runtime type does not have.

use std::sync::Arc;

use crate::accessor::{AccessorTable, ResolvedAccessor};
use crate::value::Value;

/// One step of a member chain
#[derive(Debug, Clone)]
pub enum ChainLink {
    /// Resolved at compile time against the declared type
    Resolved(Arc<ResolvedAccessor>),
    /// Resolved against the runtime type of the value, through the table
    Dynamic {
        member: String,
        table: Arc<AccessorTable>,
    },
}

/// A member requested from a runtime value whose type does not declare it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMember {
    pub type_name: String,
    pub member: String,
}

impl ChainLink {
    /// Read this link's member from `value`.
    ///
    /// Map misses and null inputs yield null. A dynamic link on any other value
    /// whose runtime type lacks the member fails, on every call.
    pub fn apply(&self, value: &Value) -> Result<Value, MissingMember> {
        match self {
            ChainLink::Resolved(accessor) => Ok(accessor.apply(value)),
            ChainLink::Dynamic { .. } if value.is_null() => Ok(Value::Null),
            ChainLink::Dynamic { member, table } => match table.resolve_runtime(value, member) {
                Some(accessor) => Ok(accessor.apply(value)),
                None => Err(MissingMember {
                    type_name: value.type_name(),
                    member: member.clone(),
                }),
            },
        }
    }

    pub fn member(&self) -> &str {
        match self {
            ChainLink::Resolved(accessor) => accessor.member(),
            ChainLink::Dynamic { member, .. } => member,
        }
    }
}

/// Ordered links applied after the first-level access (`a.b.c`)
#[derive(Debug, Clone, Default)]
pub struct FieldGetterChain {
    links: Vec<ChainLink>,
}

impl FieldGetterChain {
    pub fn new(links: Vec<ChainLink>) -> Self {
        Self { links }
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Walk the chain from `base`; the first null short-circuits
    pub fn apply(&self, base: Value) -> Result<Value, MissingMember> {
        let mut current = base;
        for link in &self.links {
            if current.is_null() {
                return Ok(Value::Null);
            }
            current = link.apply(&current)?;
        }
        Ok(current)
    }
}

#[derive(Debug, Clone)]
pub enum AccessorNode {
    Literal(String),
    ParamRef {
        index: usize,
        default: String,
    },
    FieldRef {
        accessor: ChainLink,
        index: usize,
        default: String,
        chain: FieldGetterChain,
    },
    MapRef {
        key: String,
        index: usize,
        default: String,
        chain: FieldGetterChain,
    },
}

impl AccessorNode {
    /// Append this node's text for `args` to `out`
    pub fn write(&self, args: &[Value], out: &mut String) -> Result<(), MissingMember> {
        match self {
            AccessorNode::Literal(text) => out.push_str(text),
            AccessorNode::ParamRef { index, default } => {
                push_or_default(out, args.get(*index).cloned(), default)
            }
            AccessorNode::FieldRef {
                accessor,
                index,
                default,
                chain,
            } => {
                let value = match args.get(*index).filter(|v| !v.is_null()) {
                    Some(v) => Some(chain.apply(accessor.apply(v)?)?),
                    None => None,
                };
                push_or_default(out, value, default)
            }
            AccessorNode::MapRef {
                key,
                index,
                default,
                chain,
            } => {
                let value = args
                    .get(*index)
                    .map(|v| chain.apply(v.lookup_key(key)))
                    .transpose()?;
                push_or_default(out, value, default)
            }
        }
        Ok(())
    }

    pub fn evaluate(&self, args: &[Value]) -> Result<String, MissingMember> {
        let mut out = String::new();
        self.write(args, &mut out)?;
        Ok(out)
    }

    /// Argument position read by this node, if any
    pub fn index(&self) -> Option<usize> {
        match self {
            AccessorNode::Literal(_) => None,
            AccessorNode::ParamRef { index, .. }
            | AccessorNode::FieldRef { index, .. }
            | AccessorNode::MapRef { index, .. } => Some(*index),
        }
    }
}

fn push_or_default(out: &mut String, value: Option<Value>, default: &str) {
    match value {
        Some(Value::Str(s)) => out.push_str(&s),
        Some(v) if !v.is_null() => out.push_str(&v.render()),
        _ => out.push_str(default),
    }
}
