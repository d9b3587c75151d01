#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use keyforge_core::{
    EngineConfig, KeyEngine, KfErrorKind, MethodSignature, TemplateClass, TypeRef, Value,
};

fn user_method() -> MethodSignature {
    MethodSignature::new("UserService", "lookup").param("id", TypeRef::int())
}

fn person_method() -> MethodSignature {
    MethodSignature::new("ProfileService", "update").param("person", TypeRef::Object(person_type))
}

/// Method shaped like `lock(int, String, Map, TestDto)`
fn dto_method() -> MethodSignature {
    MethodSignature::new("TestService", "lock")
        .param("id", TypeRef::int())
        .param("name", TypeRef::string())
        .param("extra", TypeRef::Map)
        .param("dto", TypeRef::Object(test_dto_type))
}

fn dto_args(age: Option<i64>) -> Vec<Value> {
    vec![
        Value::from(1),
        Value::from("a"),
        Value::map([("valueDto", Value::map([("map", Value::map([("age", 1)]))]))]),
        test_dto(age),
    ]
}

// ========== Example scenarios ==========

#[test]
fn scenario_literal_prefix_and_positional() {
    let engine = new_engine();
    let eval = engine.compile(&user_method(), "user_{arg0}").unwrap();
    assert_eq!(
        eval.evaluate(&user_method(), &[Value::from(42)], None).unwrap(),
        "user_42"
    );
}

#[test]
fn scenario_null_member_renders_default() {
    let engine = new_engine();
    let eval = engine.compile(&person_method(), "{arg0.name}").unwrap();
    let key = eval
        .evaluate(&person_method(), &[person(None, None)], None)
        .unwrap();
    assert_eq!(key, "null");
}

#[test]
fn scenario_null_intermediate_uses_placeholder_default() {
    let engine = new_engine();
    let eval = engine
        .compile(&person_method(), "{arg0.address.city:unknown}")
        .unwrap();

    let no_address = eval
        .evaluate(&person_method(), &[person(Some("ann"), None)], None)
        .unwrap();
    assert_eq!(no_address, "unknown");

    let with_city = eval
        .evaluate(&person_method(), &[person(Some("ann"), Some(Some("Oslo")))], None)
        .unwrap();
    assert_eq!(with_city, "Oslo");
}

#[test]
fn test_literal_between_placeholders_stays_accessor_chain() {
    let method = MethodSignature::new("Svc", "f")
        .unnamed_param(TypeRef::int())
        .unnamed_param(TypeRef::string());
    let engine = new_engine();
    assert_eq!(engine.classify("{arg0}:{arg1}"), TemplateClass::AccessorChain);

    let eval = engine.compile(&method, "{arg0}:{arg1}").unwrap();
    assert_eq!(eval.kind().name(), "multi-accessor");
    assert_eq!(
        eval.evaluate(&method, &[Value::from(1), Value::from("a")], None)
            .unwrap(),
        "1:a"
    );
}

#[test]
fn scenario_two_positionals_with_literals() {
    let method = MethodSignature::new("Svc", "f")
        .unnamed_param(TypeRef::int())
        .unnamed_param(TypeRef::string());
    let engine = new_engine();
    let eval = engine.compile(&method, "k_{arg0}_{arg1}").unwrap();
    assert_eq!(eval.kind().name(), "multi-accessor");
    assert_eq!(
        eval.evaluate(&method, &[Value::from(1), Value::from("a")], None)
            .unwrap(),
        "k_1_a"
    );
}

// ========== Positional and named references ==========

#[test]
fn test_single_positional_reference() {
    let engine = new_engine();
    let eval = engine.compile(&dto_method(), "{arg1}").unwrap();
    assert_eq!(eval.kind().name(), "single-accessor");
    assert_eq!(eval.evaluate(&dto_method(), &dto_args(Some(1)), None).unwrap(), "a");
}

#[test]
fn test_p_prefix_and_declared_names_are_equivalent() {
    let engine = new_engine();
    let args = dto_args(Some(1));
    for template in ["{arg1}", "{p1}", "{name}"] {
        let eval = engine.compile(&dto_method(), template).unwrap();
        assert_eq!(eval.evaluate(&dto_method(), &args, None).unwrap(), "a", "{}", template);
    }
}

#[test]
fn test_chain_through_dto_getter_and_map() {
    let engine = new_engine();
    let eval = engine
        .compile(&dto_method(), "{arg0}_{arg1}_{arg3.valueDto.map.age}")
        .unwrap();
    assert_eq!(
        eval.evaluate(&dto_method(), &dto_args(Some(1)), None).unwrap(),
        "1_a_1"
    );
    assert_eq!(
        eval.evaluate(&dto_method(), &dto_args(None), None).unwrap(),
        "1_a_null"
    );
}

#[test]
fn test_chain_through_map_parameter() {
    let engine = new_engine();
    let eval = engine.compile(&dto_method(), "{arg2.valueDto.map.age}").unwrap();
    assert_eq!(eval.evaluate(&dto_method(), &dto_args(None), None).unwrap(), "1");
}

#[test]
fn test_missing_map_key_defaults() {
    let engine = new_engine();
    let eval = engine
        .compile(&dto_method(), "{arg2.valueDto.map.height}")
        .unwrap();
    assert_eq!(
        eval.evaluate(&dto_method(), &dto_args(Some(1)), None).unwrap(),
        "null"
    );

    let eval = engine.compile(&dto_method(), "{arg2.absent.c.d}").unwrap();
    assert_eq!(
        eval.evaluate(&dto_method(), &dto_args(Some(1)), None).unwrap(),
        "null"
    );
}

#[test]
fn test_member_on_scalar_after_map_hop_fails() {
    let engine = new_engine();
    let eval = engine
        .compile(&dto_method(), "{arg2.valueDto.map.age.c.d}")
        .unwrap();
    let err = eval
        .evaluate(&dto_method(), &dto_args(Some(1)), None)
        .unwrap_err();
    assert_eq!(err.kind(), KfErrorKind::UnknownMember);
    assert!(err.message().contains("'c'"), "{}", err.message());
}

#[test]
fn test_object_inside_map_checked_at_runtime() {
    let engine = new_engine();
    let args = |owner: Value| {
        vec![
            Value::from(1),
            Value::from("a"),
            Value::map([("owner", owner)]),
            test_dto(None),
        ]
    };
    let eval = engine.compile(&dto_method(), "{extra.owner.name}").unwrap();
    assert_eq!(
        eval.evaluate(&dto_method(), &args(person(Some("al"), None)), None)
            .unwrap(),
        "al"
    );

    let eval = engine.compile(&dto_method(), "{extra.owner.nmae}").unwrap();
    let err = eval
        .evaluate(&dto_method(), &args(person(Some("al"), None)), None)
        .unwrap_err();
    assert_eq!(err.kind(), KfErrorKind::UnknownMember);
    assert!(err.message().contains("Person"), "{}", err.message());
    assert_eq!(
        eval.evaluate(&dto_method(), &args(Value::Null), None).unwrap(),
        "null"
    );
}

#[test]
fn test_unknown_member_on_typed_dto_is_configuration_error() {
    let engine = new_engine();
    let err = engine
        .compile(&dto_method(), "{arg3.valueDto.map2.age}")
        .unwrap_err();
    assert_eq!(err.kind(), KfErrorKind::UnknownMember);
    assert!(err.is_configuration());
    assert!(err.message().contains("ValueDto"));
    assert!(err.message().contains("map2"));
}

#[test]
fn test_field_reached_when_no_getter() {
    let engine = new_engine();
    let eval = engine.compile(&person_method(), "age_{person.age}").unwrap();
    assert_eq!(
        eval.evaluate(&person_method(), &[person(None, None)], None)
            .unwrap(),
        "age_30"
    );
}

#[test]
fn test_null_argument_defaults_without_touching_chain() {
    let engine = new_engine();
    let eval = engine.compile(&person_method(), "{arg0.address.city}").unwrap();
    assert_eq!(
        eval.evaluate(&person_method(), &[Value::Null], None).unwrap(),
        "null"
    );
}

#[test]
fn test_untyped_parameter_resolves_at_runtime() {
    let method = MethodSignature::new("Svc", "any").param("input", TypeRef::Any);
    let engine = new_engine();
    let eval = engine.compile(&method, "{input.address.city}").unwrap();

    let as_object = person(Some("bo"), Some(Some("Rome")));
    assert_eq!(eval.evaluate(&method, &[as_object], None).unwrap(), "Rome");

    let as_map = Value::map([("address", Value::map([("city", "Lima")]))]);
    assert_eq!(eval.evaluate(&method, &[as_map], None).unwrap(), "Lima");

    assert_eq!(eval.evaluate(&method, &[Value::Null], None).unwrap(), "null");
    let err = eval.evaluate(&method, &[Value::from(3)], None).unwrap_err();
    assert_eq!(err.kind(), KfErrorKind::UnknownMember);
}

#[test]
fn test_misspelled_member_on_runtime_object_fails_every_call() {
    let method = MethodSignature::new("Svc", "any").param("input", TypeRef::Any);
    let engine = new_engine();
    let eval = engine.compile(&method, "{input.nmae}").unwrap();

    for _ in 0..2 {
        let err = eval
            .evaluate(&method, &[person(Some("bo"), None)], None)
            .unwrap_err();
        assert_eq!(err.kind(), KfErrorKind::UnknownMember);
        assert!(err.is_configuration());
        assert_eq!(err.template(), Some("{input.nmae}"));
        assert!(err.message().contains("nmae"), "{}", err.message());
    }

    let multi = engine.compile(&method, "k_{input.nmae}_{arg0}").unwrap();
    let err = multi
        .evaluate(&method, &[person(Some("bo"), None)], None)
        .unwrap_err();
    assert_eq!(err.kind(), KfErrorKind::UnknownMember);
}

#[test]
fn test_self_referential_chain() {
    let method = MethodSignature::new("Svc", "walk").param("head", TypeRef::Object(node_type));
    let engine = new_engine();
    let eval = engine.compile(&method, "{head.next.next.label}").unwrap();
    assert_eq!(
        eval.evaluate(&method, &[node_chain(3, Some("tail"))], None)
            .unwrap(),
        "tail"
    );
    assert_eq!(
        eval.evaluate(&method, &[node_chain(2, Some("tail"))], None)
            .unwrap(),
        "null"
    );
}

// ========== Configuration failures ==========

#[test]
fn test_unknown_parameter_fails_identically_every_time() {
    let engine = new_engine();
    let first = engine.compile(&dto_method(), "{user}").unwrap_err();
    let second = engine.compile(&dto_method(), "{user}").unwrap_err();
    assert_eq!(first, second);
    assert_eq!(first.kind(), KfErrorKind::UnknownParameter);
    assert_eq!(first.site().unwrap().as_str(), "TestService::lock");
    assert!(first.candidates().unwrap().contains(&"arg3".to_string()));
    assert!(first.candidates().unwrap().contains(&"dto".to_string()));
}

#[test]
fn test_malformed_placeholders_rejected() {
    let engine = new_engine();
    for template in ["{arg0", "a_{}", "{arg0..x}", "{a{b}}"] {
        let err = engine.compile(&dto_method(), template).unwrap_err();
        assert_eq!(
            err.kind(),
            KfErrorKind::MalformedPlaceholder,
            "{} should be malformed",
            template
        );
    }
}

#[test]
fn test_member_on_scalar_parameter_rejected() {
    let engine = new_engine();
    let err = engine.compile(&dto_method(), "{name.length}").unwrap_err();
    assert_eq!(err.kind(), KfErrorKind::UnknownMember);
}

// ========== Configuration knobs ==========

#[test]
fn test_configured_default_text() {
    let config = EngineConfig::from_toml_str(r#"default_text = "-""#).unwrap();
    let engine = KeyEngine::new(config);
    let eval = engine.compile(&user_method(), "u_{arg0}").unwrap();
    assert_eq!(eval.evaluate(&user_method(), &[Value::Null], None).unwrap(), "u_-");
    assert_eq!(eval.evaluate(&user_method(), &[], None).unwrap(), "u_-");
}

#[test]
fn test_custom_positional_prefix() {
    let config = EngineConfig {
        positional_prefixes: vec!["a".to_string()],
        ..EngineConfig::default()
    };
    let engine = KeyEngine::new(config);
    assert_eq!(
        engine
            .compile(&user_method(), "{a0}")
            .unwrap()
            .evaluate(&user_method(), &[Value::from(5)], None)
            .unwrap(),
        "5"
    );
    let err = engine.compile(&user_method(), "{arg0}").unwrap_err();
    assert_eq!(err.kind(), KfErrorKind::UnknownParameter);
}

#[test]
fn test_constant_template_ignores_arguments() {
    let engine = new_engine();
    let eval = engine.compile(&user_method(), "global-lock").unwrap();
    assert_eq!(eval.kind().name(), "constant");
    assert_eq!(
        eval.evaluate(&user_method(), &[Value::from(1)], None).unwrap(),
        "global-lock"
    );
}
