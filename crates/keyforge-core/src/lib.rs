//! keyforge Core - key-template compiler and evaluator
//!
//! Guarded call sites (locks, flow limiters, idempotency slots) declare a
//! template describing how to derive a resource key from the call. This crate
//! provides:
//! - Template classification (constant, accessor chain, expression fallback)
//! - An accessor-chain compiler resolving parameters and members once
//! - A process-wide resolved-accessor table and a per-site evaluator cache
//! - A minimal expression engine behind a pluggable interface
//! - A guard driver acquiring and releasing N resources around a call
//!
//! # Example
//!
//! ```
//! use keyforge_core::{KeyEngine, MethodSignature, TypeRef, Value};
//!
//! let engine = KeyEngine::default();
//! let method = MethodSignature::new("OrderService", "place").param("id", TypeRef::int());
//! let evaluator = engine.compile(&method, "user_{arg0}").unwrap();
//! let key = evaluator.evaluate(&method, &[Value::from(42)], None).unwrap();
//! assert_eq!(key, "user_42");
//! ```

pub mod accessor;
pub mod aggregate;
pub mod attribute;
pub mod cache;
pub mod config;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod expression;
pub mod getters;
pub mod logging_facility;
pub mod meta;
pub mod resource;
pub mod template;
pub mod value;

pub use keyforge_core_types as types;

// Re-export commonly used types
pub use accessor::AccessorTable;
pub use aggregate::{GuardError, GuardPhase};
pub use attribute::KeyAttribute;
pub use config::EngineConfig;
pub use engine::{KeyEngine, DEFAULT_NAMESPACE};
pub use errors::{KeyForgeError, KfError, KfErrorKind, Result};
pub use evaluator::{CompiledEvaluator, EvaluatorKind};
pub use expression::{
    EvalContext, Expression, ExpressionEngine, ExpressionScope, MapSingletons, SingletonRegistry,
    TemplateExpressionEngine,
};
pub use meta::{MethodSignature, TypeInfo, TypeRef};
pub use resource::{Resource, ResourceBuilder, ResourceError};
pub use template::TemplateClass;
pub use value::{Reflect, Value};
