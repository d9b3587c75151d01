//! Engine facade
//!
//! [`KeyEngine`] owns the configuration, the accessor table, the expression
//! engine and the evaluator cache. Wrappers compile through it once per call
//! site and evaluate the returned evaluator on every call.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::accessor::AccessorTable;
use crate::attribute::KeyAttribute;
use crate::cache::{EvaluatorCache, SiteKey};
use crate::config::EngineConfig;
use crate::errors::{KeyForgeError, KfError, Result};
use crate::evaluator::{CompiledEvaluator, EvaluatorKind};
use crate::expression::{ExpressionEngine, ExpressionScope, TemplateExpressionEngine};
use crate::meta::MethodSignature;
use crate::template::{classify, compile_accessors, CompiledAccessors, TemplateClass};
use crate::{log_op_end, log_op_error, log_op_start};

/// Namespace used by [`KeyEngine::compile`]
pub const DEFAULT_NAMESPACE: &str = "";

pub struct KeyEngine {
    config: EngineConfig,
    accessors: Arc<AccessorTable>,
    expressions: Arc<dyn ExpressionEngine>,
    scope: ExpressionScope,
    cache: EvaluatorCache,
}

impl fmt::Debug for KeyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEngine")
            .field("config", &self.config)
            .field("accessors", &self.accessors.len())
            .field("cached_sites", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl Default for KeyEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl KeyEngine {
    /// Engine over the process-wide accessor table and the built-in
    /// expression engine
    pub fn new(config: EngineConfig) -> Self {
        let accessors = AccessorTable::global();
        Self {
            config,
            expressions: Arc::new(TemplateExpressionEngine::new(accessors.clone())),
            accessors,
            scope: ExpressionScope::default(),
            cache: EvaluatorCache::new(),
        }
    }

    /// Use a private accessor table; the built-in expression engine follows it
    pub fn with_accessor_table(mut self, table: Arc<AccessorTable>) -> Self {
        self.expressions = Arc::new(TemplateExpressionEngine::new(table.clone()));
        self.accessors = table;
        self
    }

    pub fn with_expression_engine(mut self, engine: Arc<dyn ExpressionEngine>) -> Self {
        self.expressions = engine;
        self
    }

    /// Singletons and ambient values visible to fallback expressions
    pub fn with_scope(mut self, scope: ExpressionScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn accessors(&self) -> &Arc<AccessorTable> {
        &self.accessors
    }

    pub fn cache(&self) -> &EvaluatorCache {
        &self.cache
    }

    pub fn classify(&self, template: &str) -> TemplateClass {
        classify(template)
    }

    /// Cached evaluator for `template` declared on `method`, in the default
    /// namespace.
    ///
    /// # Errors
    ///
    /// Configuration and expression-parse failures, identical on every call
    /// for the same site.
    pub fn compile(&self, method: &MethodSignature, template: &str) -> Result<Arc<CompiledEvaluator>> {
        self.compile_with(DEFAULT_NAMESPACE, method, template, |_| {})
    }

    /// Like [`Self::compile`], cached under `namespace`; `hook` runs once per
    /// namespace, before the evaluator is published, to attach payload and
    /// resource builder.
    ///
    /// Each wrapper kind passes its own namespace, so a lock and a rate limiter
    /// on the same method and template keep their own evaluators.
    ///
    /// # Errors
    ///
    /// See [`Self::compile`].
    pub fn compile_with<F>(
        &self,
        namespace: &str,
        method: &MethodSignature,
        template: &str,
        hook: F,
    ) -> Result<Arc<CompiledEvaluator>>
    where
        F: FnOnce(&mut CompiledEvaluator),
    {
        let key = SiteKey::Single {
            namespace: namespace.to_string(),
            method_id: method.method_id(),
            template: template.to_string(),
        };
        self.cache.get_or_compile(key, || {
            let mut evaluator = self.build_evaluator(method, template)?;
            hook(&mut evaluator);
            Ok(evaluator)
        })
    }

    /// Cached evaluator for a key attribute; carries its `skip_blank_key`
    ///
    /// # Errors
    ///
    /// See [`Self::compile`]; both aliases blank is `EmptyTemplate`.
    pub fn compile_attribute<F>(
        &self,
        namespace: &str,
        method: &MethodSignature,
        attribute: &KeyAttribute,
        hook: F,
    ) -> Result<Arc<CompiledEvaluator>>
    where
        F: FnOnce(&mut CompiledEvaluator),
    {
        let template = attribute.template().unwrap_or_default();
        self.compile_with(namespace, method, template, |evaluator| {
            evaluator.set_skip_blank_key(attribute.skip_blank_key);
            hook(evaluator);
        })
    }

    /// Cached aggregate of one evaluator per template, for a site guarded by
    /// several resources. `attribute` identifies the declaration on `method`;
    /// `configure` runs once per member with its position.
    ///
    /// # Errors
    ///
    /// The first member failure; `EmptyTemplate` when `templates` is empty.
    pub fn compile_multi<T, F>(
        &self,
        method: &MethodSignature,
        attribute: &str,
        templates: &[T],
        configure: F,
    ) -> Result<Arc<CompiledEvaluator>>
    where
        T: AsRef<str>,
        F: Fn(usize, &mut CompiledEvaluator),
    {
        let key = SiteKey::Multi {
            method_id: method.method_id(),
            attribute: attribute.to_string(),
        };
        self.cache.get_or_compile(key, || {
            if templates.is_empty() {
                return Err(self.site_error(KeyForgeError::EmptyTemplate.into(), method, attribute));
            }
            let mut members = Vec::with_capacity(templates.len());
            for (i, template) in templates.iter().enumerate() {
                let mut member = self.build_evaluator(method, template.as_ref())?;
                configure(i, &mut member);
                members.push(Arc::new(member));
            }
            Ok(CompiledEvaluator::new(
                method.label(),
                attribute,
                EvaluatorKind::Aggregate(members),
            ))
        })
    }

    /// [`Self::compile_multi`] over key attributes, carrying each one's
    /// `skip_blank_key`
    ///
    /// # Errors
    ///
    /// See [`Self::compile_multi`].
    pub fn compile_attributes<F>(
        &self,
        method: &MethodSignature,
        attribute: &str,
        keys: &[KeyAttribute],
        configure: F,
    ) -> Result<Arc<CompiledEvaluator>>
    where
        F: Fn(usize, &mut CompiledEvaluator),
    {
        let templates: Vec<&str> = keys
            .iter()
            .map(|k| k.template().unwrap_or_default())
            .collect();
        self.compile_multi(method, attribute, &templates, |i, member| {
            member.set_skip_blank_key(keys[i].skip_blank_key);
            configure(i, member);
        })
    }

    /// Compile without touching the cache
    ///
    /// # Errors
    ///
    /// See [`Self::compile`].
    pub fn build_evaluator(&self, method: &MethodSignature, template: &str) -> Result<CompiledEvaluator> {
        let started = Instant::now();
        let site = method.label();
        log_op_start!("compile", site = %site, template = template);

        match self.build_kind(method, template) {
            Ok(kind) => {
                log_op_end!(
                    "compile",
                    duration_ms = started.elapsed().as_millis() as u64,
                    site = %site,
                    evaluator = kind.name(),
                );
                Ok(CompiledEvaluator::new(site, template, kind))
            }
            Err(err) => {
                let err = self.site_error(err, method, template);
                log_op_error!(
                    "compile",
                    err.clone(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    site = %site,
                );
                Err(err)
            }
        }
    }

    fn build_kind(&self, method: &MethodSignature, template: &str) -> Result<EvaluatorKind> {
        if template.trim().is_empty() {
            return Err(KeyForgeError::EmptyTemplate.into());
        }

        match classify(template) {
            TemplateClass::Constant => Ok(EvaluatorKind::Constant(template.to_string())),
            TemplateClass::AccessorChain => {
                match compile_accessors(method, template, &self.config, &self.accessors)? {
                    CompiledAccessors::Single(node) => Ok(EvaluatorKind::Single(node)),
                    CompiledAccessors::Multi(nodes) => Ok(EvaluatorKind::Multi(nodes)),
                }
            }
            TemplateClass::Expression => {
                if !self.config.expression_fallback {
                    return Err(KeyForgeError::FallbackDisabled {
                        template: template.to_string(),
                    }
                    .into());
                }
                Ok(EvaluatorKind::Expression {
                    expression: self.expressions.compile(template)?,
                    scope: self.scope.clone(),
                })
            }
        }
    }

    fn site_error(&self, err: KfError, method: &MethodSignature, template: &str) -> KfError {
        err.with_op("compile")
            .with_site(method.label())
            .with_template(template)
    }
}

static GLOBAL_ENGINE: OnceLock<KeyEngine> = OnceLock::new();

/// Install the process-wide engine.
///
/// # Errors
///
/// Returns the engine back when one is already installed (including the
/// default one created by an earlier [`global`] call).
pub fn install(engine: KeyEngine) -> std::result::Result<(), KeyEngine> {
    GLOBAL_ENGINE.set(engine)
}

/// The process-wide engine; a default one is created on first use
pub fn global() -> &'static KeyEngine {
    GLOBAL_ENGINE.get_or_init(KeyEngine::default)
}
