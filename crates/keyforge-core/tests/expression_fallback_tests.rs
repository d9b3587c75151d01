#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::*;
use keyforge_core::{
    EvalContext, Expression, ExpressionEngine, ExpressionScope, KfErrorKind, MapSingletons,
    MethodSignature, Result, TypeRef, Value,
};

fn method() -> MethodSignature {
    MethodSignature::new("TestService", "lock")
        .param("id", TypeRef::int())
        .param("name", TypeRef::string())
        .param("person", TypeRef::Object(person_type))
}

fn args() -> Vec<Value> {
    vec![
        Value::from(1),
        Value::from("a"),
        person(Some("ann"), Some(Some("Oslo"))),
    ]
}

#[test]
fn test_positional_and_singleton_fallback() {
    let scope = ExpressionScope::new()
        .with_singletons(Arc::new(MapSingletons::new().with("testBean", "bean")));
    let engine = new_engine().with_scope(scope);

    let template = "aaa_#{#p0}_#{#p1}_#{@testBean}";
    assert_eq!(engine.classify(template).as_str(), "expression");

    let eval = engine.compile(&method(), template).unwrap();
    assert_eq!(eval.kind().name(), "expression");
    assert_eq!(eval.evaluate(&method(), &args(), None).unwrap(), "aaa_1_a_bean");
}

#[test]
fn test_named_variables_and_reflective_properties() {
    let engine = new_engine();
    let eval = engine
        .compile(&method(), "#{#name + ':' + #person.address.city}")
        .unwrap();
    assert_eq!(eval.evaluate(&method(), &args(), None).unwrap(), "a:Oslo");
}

#[test]
fn test_target_properties() {
    let engine = new_engine();
    let target = Value::map([("tenant", "acme")]);
    let eval = engine.compile(&method(), "t:#{tenant}/#{#root['tenant']}").unwrap();
    assert_eq!(
        eval.evaluate(&method(), &args(), Some(&target)).unwrap(),
        "t:acme/acme"
    );
}

#[test]
fn test_ambient_values() {
    let scope = ExpressionScope::new().with_ambient("region", "eu-west");
    let engine = new_engine().with_scope(scope);
    let eval = engine.compile(&method(), "#{#region}:#{#id}").unwrap();
    assert_eq!(eval.evaluate(&method(), &args(), None).unwrap(), "eu-west:1");
}

#[test]
fn test_unresolved_reference_fails_on_every_evaluation() {
    let engine = new_engine();
    let eval = engine.compile(&method(), "k:#{@missingBean}").unwrap();
    let first = eval.evaluate(&method(), &args(), None).unwrap_err();
    let second = eval.evaluate(&method(), &args(), None).unwrap_err();
    assert_eq!(first.kind(), KfErrorKind::ExpressionEvaluation);
    assert_eq!(first, second);
    assert_eq!(first.site().unwrap().as_str(), "TestService::lock");
}

#[test]
fn test_unknown_property_on_object_fails() {
    let engine = new_engine();
    let eval = engine.compile(&method(), "#{#person.nickname}").unwrap();
    let err = eval.evaluate(&method(), &args(), None).unwrap_err();
    assert_eq!(err.kind(), KfErrorKind::ExpressionEvaluation);
    assert!(err.message().contains("nickname"));
}

#[test]
fn test_parse_error_is_memoized() {
    let engine = new_engine();
    let first = engine.compile(&method(), "k:#{#p0").unwrap_err();
    let second = engine.compile(&method(), "k:#{#p0").unwrap_err();
    assert_eq!(first.kind(), KfErrorKind::ExpressionParse);
    assert_eq!(first, second);
}

// ========== Pluggable engine ==========

#[derive(Debug)]
struct Upper {
    source: String,
}

impl Expression for Upper {
    fn source(&self) -> &str {
        &self.source
    }

    fn eval(&self, ctx: &EvalContext<'_>) -> Result<String> {
        Ok(format!("{}:{}", self.source.to_uppercase(), ctx.arg(0)))
    }
}

#[derive(Default)]
struct CountingEngine {
    compiles: AtomicUsize,
}

impl ExpressionEngine for CountingEngine {
    fn compile(&self, text: &str) -> Result<Arc<dyn Expression>> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(Upper {
            source: text.to_string(),
        }))
    }
}

#[test]
fn test_custom_engine_compiles_once_per_site() {
    let counting = Arc::new(CountingEngine::default());
    let engine = new_engine().with_expression_engine(counting.clone());

    for _ in 0..5 {
        let eval = engine.compile(&method(), "order id").unwrap();
        assert_eq!(eval.evaluate(&method(), &args(), None).unwrap(), "ORDER ID:1");
    }
    assert_eq!(counting.compiles.load(Ordering::SeqCst), 1);
}
