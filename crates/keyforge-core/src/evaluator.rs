//! Compiled evaluators
//!
//! A [`CompiledEvaluator`] is the unit the cache hands out for a call site.
//! It is built once, configured once by the post-compile hook, and then only
//! read, from any number of threads.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use keyforge_core_types::SiteLabel;

use crate::errors::{KeyForgeError, KfError, KfErrorKind, Result};
use crate::expression::{EvalContext, Expression, ExpressionScope};
use crate::getters::{AccessorNode, MissingMember};
use crate::meta::MethodSignature;
use crate::resource::{Resource, ResourceBuilder};
use crate::value::Value;

pub enum EvaluatorKind {
    /// The template itself is the key
    Constant(String),
    Single(AccessorNode),
    Multi(Vec<AccessorNode>),
    Expression {
        expression: Arc<dyn Expression>,
        scope: ExpressionScope,
    },
    /// One evaluator per resource guarding the same call
    Aggregate(Vec<Arc<CompiledEvaluator>>),
}

impl EvaluatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            EvaluatorKind::Constant(_) => "constant",
            EvaluatorKind::Single(_) => "single-accessor",
            EvaluatorKind::Multi(_) => "multi-accessor",
            EvaluatorKind::Expression { .. } => "expression",
            EvaluatorKind::Aggregate(_) => "aggregate",
        }
    }
}

impl fmt::Debug for EvaluatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluatorKind::Constant(text) => f.debug_tuple("Constant").field(text).finish(),
            EvaluatorKind::Single(node) => f.debug_tuple("Single").field(node).finish(),
            EvaluatorKind::Multi(nodes) => f.debug_tuple("Multi").field(nodes).finish(),
            EvaluatorKind::Expression { expression, .. } => f
                .debug_tuple("Expression")
                .field(&expression.source())
                .finish(),
            EvaluatorKind::Aggregate(members) => {
                f.debug_tuple("Aggregate").field(members).finish()
            }
        }
    }
}

pub struct CompiledEvaluator {
    site: SiteLabel,
    template: String,
    kind: EvaluatorKind,
    payload: Option<Arc<dyn Any + Send + Sync>>,
    builder: Option<ResourceBuilder>,
    skip_blank_key: bool,
}

impl fmt::Debug for CompiledEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledEvaluator")
            .field("site", &self.site)
            .field("template", &self.template)
            .field("kind", &self.kind)
            .field("has_payload", &self.payload.is_some())
            .field("has_builder", &self.builder.is_some())
            .field("skip_blank_key", &self.skip_blank_key)
            .finish()
    }
}

impl CompiledEvaluator {
    pub fn new(site: SiteLabel, template: impl Into<String>, kind: EvaluatorKind) -> Self {
        Self {
            site,
            template: template.into(),
            kind,
            payload: None,
            builder: None,
            skip_blank_key: false,
        }
    }

    pub fn site(&self) -> &SiteLabel {
        &self.site
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn kind(&self) -> &EvaluatorKind {
        &self.kind
    }

    /// Produce the key for one call.
    ///
    /// # Errors
    ///
    /// - `UnknownMember` when an untyped path meets a runtime value lacking the member
    /// - `ExpressionEvaluation` from the fallback engine
    /// - `Unsupported` on aggregate evaluators; use [`Self::evaluate_all`]
    pub fn evaluate(
        &self,
        method: &MethodSignature,
        args: &[Value],
        target: Option<&Value>,
    ) -> Result<String> {
        match &self.kind {
            EvaluatorKind::Constant(text) => Ok(text.clone()),
            EvaluatorKind::Single(node) => node.evaluate(args).map_err(|m| self.missing(m)),
            EvaluatorKind::Multi(nodes) => {
                let mut out = String::with_capacity(self.template.len());
                for node in nodes {
                    node.write(args, &mut out).map_err(|m| self.missing(m))?;
                }
                Ok(out)
            }
            EvaluatorKind::Expression { expression, scope } => expression
                .eval(&EvalContext {
                    target,
                    method,
                    args,
                    scope,
                })
                .map_err(|e| e.with_site(self.site.clone())),
            EvaluatorKind::Aggregate(_) => Err(KfError::from(KeyForgeError::Unsupported {
                operation: "evaluate".to_string(),
                variant: self.kind.name().to_string(),
            })
            .with_site(self.site.clone())),
        }
    }

    fn missing(&self, miss: MissingMember) -> KfError {
        KfError::from(KeyForgeError::UnknownMember {
            type_name: miss.type_name,
            member: miss.member,
            template: self.template.clone(),
        })
        .with_site(self.site.clone())
    }

    /// Produce every key for one call, in member order.
    ///
    /// Non-aggregate evaluators yield a single key.
    ///
    /// # Errors
    ///
    /// The first member evaluation failure.
    pub fn evaluate_all(
        &self,
        method: &MethodSignature,
        args: &[Value],
        target: Option<&Value>,
    ) -> Result<Vec<String>> {
        self.members()
            .into_iter()
            .map(|member| member.evaluate(method, args, target))
            .collect()
    }

    /// Aggregate members, or the evaluator itself
    pub fn members(&self) -> Vec<&CompiledEvaluator> {
        match &self.kind {
            EvaluatorKind::Aggregate(members) => members.iter().map(Arc::as_ref).collect(),
            _ => vec![self],
        }
    }

    /// Turn a computed key into a resource via the attached builder.
    ///
    /// # Errors
    ///
    /// - `MissingBuilder` when no builder was attached
    /// - `ResourceAcquire` when the builder fails
    pub fn build_resource(&self, key: &str) -> Result<Box<dyn Resource>> {
        let builder = self.builder.as_ref().ok_or_else(|| {
            KfError::from(KeyForgeError::MissingBuilder {
                site: self.site.to_string(),
            })
            .with_site(self.site.clone())
        })?;
        builder(key).map_err(|source| {
            KfError::new(KfErrorKind::ResourceAcquire)
                .with_site(self.site.clone())
                .with_message(format!("resource builder failed for key {:?}: {}", key, source))
        })
    }

    pub fn has_builder(&self) -> bool {
        self.builder.is_some()
    }

    pub fn builder(&self) -> Option<&ResourceBuilder> {
        self.builder.as_ref()
    }

    pub fn set_builder(&mut self, builder: ResourceBuilder) {
        self.builder = Some(builder);
    }

    pub fn set_payload<T: Any + Send + Sync>(&mut self, payload: T) {
        self.payload = Some(Arc::new(payload));
    }

    /// Payload downcast to the type the hook stored
    pub fn payload_as<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.payload.as_ref()?.downcast_ref::<T>()
    }

    pub fn skip_blank_key(&self) -> bool {
        self.skip_blank_key
    }

    pub fn set_skip_blank_key(&mut self, skip: bool) {
        self.skip_blank_key = skip;
    }
}
