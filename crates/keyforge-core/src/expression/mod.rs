//! Expression fallback
//!
//! Templates the accessor compiler cannot express go through an
//! [`ExpressionEngine`]. The engine is pluggable; [`TemplateExpressionEngine`]
//! is the built-in minimal implementation.

pub mod parser;
pub mod template_engine;

pub use template_engine::TemplateExpressionEngine;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::Result;
use crate::meta::MethodSignature;
use crate::value::Value;

/// Compiles fallback expression text
pub trait ExpressionEngine: Send + Sync {
    /// Parse `text` once; the result is evaluated on every call
    ///
    /// # Errors
    ///
    /// `ExpressionParse` when the text is not a valid expression.
    fn compile(&self, text: &str) -> Result<Arc<dyn Expression>>;
}

/// A parsed fallback expression
pub trait Expression: Send + Sync + fmt::Debug {
    /// Source text the expression was compiled from
    fn source(&self) -> &str;

    /// Evaluate against one call
    ///
    /// # Errors
    ///
    /// `ExpressionEvaluation` when a reference cannot be resolved.
    fn eval(&self, ctx: &EvalContext<'_>) -> Result<String>;
}

/// Named singletons reachable as `@name`
pub trait SingletonRegistry: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Value>;
}

/// Registry with no entries
#[derive(Debug, Default)]
pub struct NoopSingletons;

impl SingletonRegistry for NoopSingletons {
    fn lookup(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// Registry backed by a fixed map
#[derive(Debug, Default)]
pub struct MapSingletons {
    entries: BTreeMap<String, Value>,
}

impl MapSingletons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }
}

impl SingletonRegistry for MapSingletons {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.entries.get(name).cloned()
    }
}

/// Everything an expression can see besides the call itself
#[derive(Clone)]
pub struct ExpressionScope {
    singletons: Arc<dyn SingletonRegistry>,
    ambient: Arc<BTreeMap<String, Value>>,
}

impl Default for ExpressionScope {
    fn default() -> Self {
        Self {
            singletons: Arc::new(NoopSingletons),
            ambient: Arc::new(BTreeMap::new()),
        }
    }
}

impl fmt::Debug for ExpressionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionScope")
            .field("ambient", &self.ambient.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ExpressionScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_singletons(mut self, registry: Arc<dyn SingletonRegistry>) -> Self {
        self.singletons = registry;
        self
    }

    /// Add a named value reachable as `#name` when no parameter has that name
    pub fn with_ambient(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.ambient).insert(name.into(), value.into());
        self
    }

    pub fn singleton(&self, name: &str) -> Option<Value> {
        self.singletons.lookup(name)
    }

    pub fn ambient(&self, name: &str) -> Option<&Value> {
        self.ambient.get(name)
    }
}

/// View of one call handed to [`Expression::eval`]
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub target: Option<&'a Value>,
    pub method: &'a MethodSignature,
    pub args: &'a [Value],
    pub scope: &'a ExpressionScope,
}

impl<'a> EvalContext<'a> {
    /// Positional argument; `Null` when out of range
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::Null)
    }

    /// Argument bound to the declared parameter `name`
    pub fn param_named(&self, name: &str) -> Option<Value> {
        self.method
            .params()
            .iter()
            .position(|p| p.name.as_deref() == Some(name))
            .map(|i| self.arg(i))
    }

    /// Variable lookup: parameter name first, then ambient value
    pub fn variable(&self, name: &str) -> Option<Value> {
        self.param_named(name)
            .or_else(|| self.scope.ambient(name).cloned())
    }

    pub fn singleton(&self, name: &str) -> Option<Value> {
        self.scope.singleton(name)
    }
}
