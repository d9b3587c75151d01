//! Built-in fallback engine: literal text with `#{ ... }` blocks.

use std::sync::Arc;

use super::parser::{parse_template, Part, Root, Step, Term};
use super::{EvalContext, Expression, ExpressionEngine};
use crate::accessor::AccessorTable;
use crate::errors::{KeyForgeError, Result};
use crate::value::Value;

/// Minimal expression engine covering positional references, named
/// variables, singleton lookup, string concatenation and property access.
#[derive(Debug, Clone)]
pub struct TemplateExpressionEngine {
    accessors: Arc<AccessorTable>,
}

impl Default for TemplateExpressionEngine {
    fn default() -> Self {
        Self::new(AccessorTable::global())
    }
}

impl TemplateExpressionEngine {
    pub fn new(accessors: Arc<AccessorTable>) -> Self {
        Self { accessors }
    }
}

impl ExpressionEngine for TemplateExpressionEngine {
    fn compile(&self, text: &str) -> Result<Arc<dyn Expression>> {
        let parts = parse_template(text).map_err(|reason| KeyForgeError::ExpressionParse {
            template: text.to_string(),
            reason,
        })?;
        Ok(Arc::new(CompiledTemplate {
            source: text.to_string(),
            parts,
            accessors: self.accessors.clone(),
        }))
    }
}

#[derive(Debug)]
struct CompiledTemplate {
    source: String,
    parts: Vec<Part>,
    accessors: Arc<AccessorTable>,
}

impl Expression for CompiledTemplate {
    fn source(&self) -> &str {
        &self.source
    }

    fn eval(&self, ctx: &EvalContext<'_>) -> Result<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Block(terms) => match self.block(terms, ctx)? {
                    Value::Null => {}
                    Value::Str(s) => out.push_str(&s),
                    other => out.push_str(&other.render()),
                },
            }
        }
        Ok(out)
    }
}

impl CompiledTemplate {
    fn fail(&self, reason: impl Into<String>) -> KeyForgeError {
        KeyForgeError::ExpressionEvaluation {
            template: self.source.clone(),
            reason: reason.into(),
        }
    }

    /// `+` adds two integers and concatenates anything else
    fn block(&self, terms: &[Term], ctx: &EvalContext<'_>) -> Result<Value> {
        let mut acc: Option<Value> = None;
        for term in terms {
            let value = self.term(term, ctx)?;
            acc = Some(match acc {
                None => value,
                Some(Value::Int(a)) => match value {
                    Value::Int(b) => a
                        .checked_add(b)
                        .map(Value::Int)
                        .ok_or_else(|| self.fail(format!("integer overflow adding {} and {}", a, b)))?,
                    other => Value::Str(format!("{}{}", a, other)),
                },
                Some(left) => Value::Str(format!("{}{}", left, value)),
            });
        }
        Ok(acc.unwrap_or(Value::Null))
    }

    fn term(&self, term: &Term, ctx: &EvalContext<'_>) -> Result<Value> {
        let mut current = self.root(&term.root, ctx)?;
        for step in &term.steps {
            current = match step {
                Step::Property { name, null_safe } => {
                    if current.is_null() {
                        if *null_safe {
                            Value::Null
                        } else {
                            return Err(self
                                .fail(format!("cannot read property '{}' of null", name))
                                .into());
                        }
                    } else {
                        self.member(&current, name)?
                    }
                }
                Step::Index(key) => self.index(&current, key)?,
            };
        }
        Ok(current)
    }

    fn root(&self, root: &Root, ctx: &EvalContext<'_>) -> Result<Value> {
        let value = match root {
            Root::Positional(i) => match ctx.args.get(*i) {
                Some(v) => v.clone(),
                None => {
                    return Err(self
                        .fail(format!(
                            "no argument at position {} ({} supplied)",
                            i,
                            ctx.args.len()
                        ))
                        .into())
                }
            },
            Root::Variable(name) => ctx
                .variable(name)
                .ok_or_else(|| self.fail(format!("unknown variable '#{}'", name)))?,
            Root::Target => ctx.target.cloned().unwrap_or(Value::Null),
            Root::Singleton(name) => ctx
                .singleton(name)
                .ok_or_else(|| self.fail(format!("no singleton named '@{}'", name)))?,
            Root::Str(s) => Value::Str(s.clone()),
            Root::Int(i) => Value::Int(*i),
            Root::Property(name) => match ctx.target {
                Some(target) if !target.is_null() => self.member(target, name)?,
                _ => {
                    return Err(self
                        .fail(format!("cannot read property '{}' without a target", name))
                        .into())
                }
            },
        };
        Ok(value)
    }

    fn member(&self, value: &Value, name: &str) -> Result<Value> {
        match value {
            Value::Map(_) => Ok(value.lookup_key(name)),
            Value::Object(_) => self
                .accessors
                .resolve_runtime(value, name)
                .map(|accessor| accessor.apply(value))
                .ok_or_else(|| {
                    self.fail(format!(
                        "type '{}' has no property '{}'",
                        value.type_name(),
                        name
                    ))
                    .into()
                }),
            other => Err(self
                .fail(format!(
                    "type '{}' has no property '{}'",
                    other.type_name(),
                    name
                ))
                .into()),
        }
    }

    fn index(&self, value: &Value, key: &str) -> Result<Value> {
        match value {
            Value::Null => Err(self.fail(format!("cannot index null with '{}'", key)).into()),
            Value::List(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i).cloned())
                .ok_or_else(|| self.fail(format!("no list element '{}'", key)).into()),
            _ => self.member(value, key),
        }
    }
}
