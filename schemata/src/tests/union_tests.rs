//! Union disambiguation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{
    decoder_for, Annotations, Ast, DecodeError, DecodeErrorKind, Decoder, Field, Graded, Hook,
    PathSegment, Provider, Severity, Value,
};

fn flagged_negative() -> Ast {
    Ast::refinement_with_severity(
        Ast::number(),
        "nonNegative",
        serde_json::json!({"minimum": 0}),
        |v| v.as_f64().is_some_and(|n| n >= 0.0),
        Severity::Warning,
    )
}

/// Accepts numeric strings and produces numbers.
fn numeric_string() -> Ast {
    let hook = Hook::decoder(|_| {
        Decoder::new(|value| match value.as_str().and_then(|s| s.parse::<f64>().ok()) {
            Some(n) => Graded::success(Value::Number(n)),
            None => Graded::failure(DecodeError::type_mismatch("numeric string", value)),
        })
    });
    Ast::type_alias(Vec::new(), Ast::number(), Annotations::new().with_hook(hook))
}

#[test]
fn test_first_accepting_member_wins() {
    let input = Value::from(-1);

    let warning_first = Ast::union(vec![flagged_negative(), Ast::number()]);
    let result = decoder_for(&warning_first).unwrap().decode(&input);
    assert!(result.is_warning());
    assert_eq!(result.error_list()[0].path, vec![PathSegment::Member(0)]);

    let plain_first = Ast::union(vec![Ast::number(), flagged_negative()]);
    let result = decoder_for(&plain_first).unwrap().decode(&input);
    assert_eq!(result, Graded::Success(input));
}

#[test]
fn test_refined_member_is_skipped_when_predicate_fails() {
    let ast = Ast::union(vec![Ast::string().min_length(3), Ast::string()]);
    let decoder = decoder_for(&ast).unwrap();
    assert!(decoder.decode(&Value::from("ab")).is_success());
    assert!(decoder.decode(&Value::from("abc")).is_success());
}

#[test]
fn test_no_member_reports_one_error_each() {
    let ast = Ast::union(vec![Ast::string(), Ast::number()]);
    let result = decoder_for(&ast).unwrap().decode(&Value::from(true));
    let errors = result.error_list();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].path, vec![PathSegment::Member(0)]);
    assert_eq!(errors[1].path, vec![PathSegment::Member(1)]);
    assert!(matches!(
        &errors[1].kind,
        DecodeErrorKind::UnionMember { expected, .. } if expected == "number"
    ));
    insta::assert_snapshot!(crate::format_tree(errors), @r"
    2 error(s) found
    ├─ union member 0
    │  └─ true did not satisfy is(string)
    └─ union member 1
       └─ true did not satisfy is(number)
    ");
}

#[test]
fn test_member_errors_are_prefixed() {
    let ast = Ast::union(vec![
        Ast::struct_(vec![Field::required("n", Ast::number())]).unwrap(),
        Ast::string(),
    ]);
    let input = Value::object([("n", Value::Number(f64::NAN))]);
    let result = decoder_for(&ast).unwrap().decode(&input);
    assert!(result.is_warning());
    assert_eq!(
        result.error_list()[0].path,
        vec![PathSegment::Member(0), PathSegment::Key("n".to_string())]
    );
}

#[test]
fn test_members_are_selected_on_input_shape() {
    let ast = Ast::union(vec![Ast::boolean(), numeric_string()]);
    let decoder = decoder_for(&ast).unwrap();
    assert_eq!(decoder.decode(&Value::from("2")), Graded::Success(Value::from(2)));
    assert!(decoder.decode(&Value::from(2)).is_failure());
}

#[test]
fn test_discriminated_members() {
    let circle = Ast::struct_(vec![
        Field::required("kind", Ast::literal("circle")),
        Field::required("radius", Ast::number()),
    ])
    .unwrap();
    let square = Ast::struct_(vec![
        Field::required("kind", Ast::literal("square")),
        Field::required("side", Ast::number()),
    ])
    .unwrap();
    let decoder = decoder_for(&Ast::union(vec![circle, square])).unwrap();

    let input = Value::object([("kind", Value::from("square")), ("side", Value::from(2))]);
    assert_eq!(decoder.decode(&input), Graded::Success(input.clone()));

    let bad = Value::object([("kind", Value::from("triangle"))]);
    assert_eq!(decoder.decode(&bad).error_list().len(), 2);
}

#[test]
fn test_decoding_is_deterministic() {
    let ast = Ast::union(vec![flagged_negative(), Ast::number(), Ast::string()]);
    let decoder = decoder_for(&ast).unwrap();
    for input in [Value::from(-3), Value::from(2), Value::from("x"), Value::Null] {
        assert_eq!(decoder.decode(&input), decoder.decode(&input));
    }
}

const NESTING: usize = 24;

/// `union([wrap(struct { x: inner }), string])`, `depth` levels deep.
fn nested(depth: usize, wrap: &dyn Fn(Ast) -> Ast) -> Ast {
    (0..depth).fold(Ast::string(), |inner, _| {
        let boxed = Ast::struct_(vec![Field::required("x", inner)]).unwrap();
        Ast::union(vec![wrap(boxed), Ast::string()])
    })
}

fn wrapped(levels: usize) -> Value {
    (0..levels).fold(Value::from("leaf"), |inner, _| Value::object([("x", inner)]))
}

#[test]
fn test_opaque_members_derive_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let provider = Provider::new().with_decoder(move |params: &[Decoder]| {
        counter.fetch_add(1, Ordering::SeqCst);
        params[0].clone()
    });
    let ast = nested(NESTING, &|inner| Ast::declaration("Box", vec![inner], provider.clone()));

    let decoder = decoder_for(&ast).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), NESTING);
    assert_eq!(decoder.decode(&wrapped(3)), Graded::Success(wrapped(3)));
}

#[test]
fn test_deeply_nested_refined_union() {
    let ast = nested(NESTING, &|inner| {
        inner.filter("hasX", serde_json::Value::Null, |v| v.get("x").is_some())
    });
    let decoder = decoder_for(&ast).unwrap();
    assert_eq!(decoder.decode(&wrapped(3)), Graded::Success(wrapped(3)));
    assert_eq!(decoder.decode(&Value::from(1)).error_list().len(), 2);
}
