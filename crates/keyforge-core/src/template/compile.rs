//! Accessor-chain compiler.
//!
//! Turns parsed segments into [`AccessorNode`]s. Parameter names and members
//! are resolved here, once; a template that names something the method does
//! not have is rejected before it ever evaluates.

use std::sync::Arc;

use super::parse::{parse, PlaceholderSpec, Segment};
use crate::accessor::AccessorTable;
use crate::config::EngineConfig;
use crate::errors::KeyForgeError;
use crate::getters::{AccessorNode, ChainLink, FieldGetterChain};
use crate::meta::{MethodSignature, TypeRef};

/// Output of the accessor compiler
#[derive(Debug, Clone)]
pub enum CompiledAccessors {
    /// A lone placeholder with no surrounding literal text
    Single(AccessorNode),
    /// Literal text and placeholders in template order
    Multi(Vec<AccessorNode>),
}

/// Compile an accessor-chain template against `method`.
///
/// # Errors
///
/// - `MalformedPlaceholder` when the template does not tokenize
/// - `UnknownParameter` when a placeholder names no parameter
/// - `UnknownMember` when a member is missing from a statically known type,
///   or a member is requested on a scalar
pub fn compile_accessors(
    method: &MethodSignature,
    template: &str,
    config: &EngineConfig,
    table: &Arc<AccessorTable>,
) -> Result<CompiledAccessors, KeyForgeError> {
    let segments = parse(template)?;
    let compiler = Compiler {
        method,
        template,
        config,
        table,
    };

    let mut nodes = Vec::with_capacity(segments.len());
    for segment in segments {
        let node = match segment {
            Segment::Literal(text) => AccessorNode::Literal(text),
            Segment::Placeholder(spec) => compiler.placeholder(&spec)?,
        };
        nodes.push(node);
    }

    match nodes.as_slice() {
        [only] if !matches!(only, AccessorNode::Literal(_)) => {
            Ok(CompiledAccessors::Single(only.clone()))
        }
        _ => Ok(CompiledAccessors::Multi(nodes)),
    }
}

/// Names a placeholder may use for the parameters of `method`
pub fn available_names(method: &MethodSignature, config: &EngineConfig) -> Vec<String> {
    let mut names = Vec::new();
    if config.use_parameter_names {
        names.extend(method.params().iter().filter_map(|p| p.name.clone()));
    }
    for prefix in &config.positional_prefixes {
        names.extend((0..method.param_count()).map(|i| format!("{}{}", prefix, i)));
    }
    names
}

struct Compiler<'a> {
    method: &'a MethodSignature,
    template: &'a str,
    config: &'a EngineConfig,
    table: &'a Arc<AccessorTable>,
}

impl Compiler<'_> {
    fn placeholder(&self, spec: &PlaceholderSpec) -> Result<AccessorNode, KeyForgeError> {
        let index = self.param_index(&spec.name)?;
        let default = spec
            .default
            .clone()
            .unwrap_or_else(|| self.config.default_text.clone());

        let Some((first, rest)) = spec.path.split_first() else {
            return Ok(AccessorNode::ParamRef { index, default });
        };

        let declared = &self.method.params()[index].ty;
        if let TypeRef::Map = declared {
            let chain = self.chain(&TypeRef::Any, rest)?;
            return Ok(AccessorNode::MapRef {
                key: first.clone(),
                index,
                default,
                chain,
            });
        }

        let (accessor, next) = self.link(declared, first)?;
        let chain = self.chain(&next, rest)?;
        Ok(AccessorNode::FieldRef {
            accessor,
            index,
            default,
            chain,
        })
    }

    fn param_index(&self, name: &str) -> Result<usize, KeyForgeError> {
        let params = self.method.params();

        if self.config.use_parameter_names {
            if let Some(i) = params.iter().position(|p| p.name.as_deref() == Some(name)) {
                return Ok(i);
            }
        }

        for prefix in &self.config.positional_prefixes {
            let position = name
                .strip_prefix(prefix.as_str())
                .filter(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                .and_then(|n| n.parse::<usize>().ok());
            if let Some(i) = position.filter(|i| *i < params.len()) {
                return Ok(i);
            }
        }

        Err(KeyForgeError::UnknownParameter {
            name: name.to_string(),
            template: self.template.to_string(),
            available: available_names(self.method, self.config),
        })
    }

    fn chain(&self, start: &TypeRef, members: &[String]) -> Result<FieldGetterChain, KeyForgeError> {
        let mut links = Vec::with_capacity(members.len());
        let mut current = start.clone();
        for member in members {
            let (link, next) = self.link(&current, member)?;
            links.push(link);
            current = next;
        }
        Ok(FieldGetterChain::new(links))
    }

    /// Resolve one member against a declared type; returns the link and the
    /// declared type of its result
    fn link(&self, ty: &TypeRef, member: &str) -> Result<(ChainLink, TypeRef), KeyForgeError> {
        match ty {
            TypeRef::Any => Ok((
                ChainLink::Dynamic {
                    member: member.to_string(),
                    table: self.table.clone(),
                },
                TypeRef::Any,
            )),
            TypeRef::Map => Ok((
                ChainLink::Resolved(self.table.map_key(member)),
                TypeRef::Any,
            )),
            TypeRef::Object(info) => {
                let info = info();
                match self.table.resolve(&info, member) {
                    Some(accessor) => {
                        let next = accessor.result_type().clone();
                        Ok((ChainLink::Resolved(accessor), next))
                    }
                    None => Err(self.unknown_member(ty, member)),
                }
            }
            TypeRef::Scalar(_) | TypeRef::List => Err(self.unknown_member(ty, member)),
        }
    }

    fn unknown_member(&self, ty: &TypeRef, member: &str) -> KeyForgeError {
        KeyForgeError::UnknownMember {
            type_name: ty.type_name(),
            member: member.to_string(),
            template: self.template.to_string(),
        }
    }
}
