//! Declarations, provider lookup and type alias hooks.

use crate::{
    decoder_for, guard_for, Annotations, ArtifactKind, Ast, DeclarationId, Decoder, Encoder,
    Graded, Guard, Hook, Interpreter, Pretty, Provider, ProviderRegistry, SchemaError, Value,
};

/// `Box<T>`: values are `{ "boxed": T }`.
fn box_provider() -> Provider {
    Provider::new()
        .with_decoder(|params: &[Decoder]| {
            let inner = params[0].clone();
            Decoder::new(move |input| match input.get("boxed") {
                Some(value) => inner.decode(value).map(|v| Value::object([("boxed", v)])),
                None => Graded::failure(crate::DecodeError::type_mismatch("Box", input)),
            })
        })
        .with_guard(|params: &[Guard]| {
            let inner = params[0].clone();
            Guard::new(move |value| value.get("boxed").is_some_and(|v| inner.is(v)))
        })
        .with_pretty(|params: &[Pretty]| {
            let inner = params[0].clone();
            Pretty::new(move |value| match value.get("boxed") {
                Some(v) => format!("box({})", inner.pretty(v)),
                None => value.to_string(),
            })
        })
}

fn boxed(value: Value) -> Value {
    Value::object([("boxed", value)])
}

#[test]
fn test_missing_provider_is_a_derivation_error() {
    let ast = Ast::declaration("Box", vec![Ast::string()], Provider::new());
    let error = decoder_for(&ast).unwrap_err();
    assert!(matches!(
        &error,
        SchemaError::MissingProvider { id, artifact: ArtifactKind::Decoder } if id.as_str() == "Box"
    ));
    assert_eq!(error.to_string(), "missing decoder provider for declaration `Box`");
}

#[test]
fn test_missing_provider_inside_struct() {
    let ast = Ast::struct_(vec![crate::Field::required(
        "b",
        Ast::declaration("Box", vec![Ast::string()], Provider::new()),
    )])
    .unwrap();
    assert!(matches!(
        Interpreter::new().encoder_for(&ast),
        Err(SchemaError::MissingProvider { artifact: ArtifactKind::Encoder, .. })
    ));
}

#[test]
fn test_node_provider_receives_type_parameters() {
    let ast = Ast::declaration("Box", vec![Ast::string()], box_provider());
    let decoder = decoder_for(&ast).unwrap();
    assert!(decoder.decode(&boxed(Value::from("a"))).is_success());

    let result = decoder.decode(&boxed(Value::from(1)));
    assert_eq!(result.error_list()[0].to_string(), "1 did not satisfy is(string)");

    assert_eq!(ast.to_string(), "Box<string>");
}

#[test]
fn test_registry_fills_missing_constructors() {
    let registry = ProviderRegistry::new().with("Box", box_provider());
    let interpreter = Interpreter::new().with_providers(registry);
    let ast = Ast::declaration("Box", vec![Ast::number()], Provider::new());

    let pretty = interpreter.pretty_for(&ast).unwrap();
    assert_eq!(pretty.pretty(&boxed(Value::from(1))), "box(1)");
    assert!(interpreter.guard_for(&ast).unwrap().is(&boxed(Value::from(1))));
    assert!(interpreter.providers().contains(&DeclarationId::new("Box")));
}

#[test]
fn test_node_provider_takes_precedence() {
    let registry = ProviderRegistry::new().with(
        "Box",
        Provider::new().with_guard(|_: &[Guard]| Guard::new(|_| false)),
    );
    let interpreter = Interpreter::new().with_providers(registry);
    let ast = Ast::declaration("Box", vec![Ast::number()], box_provider());
    assert!(interpreter.guard_for(&ast).unwrap().is(&boxed(Value::from(1))));
}

#[test]
fn test_input_guard_of_declaration_uses_decoder() {
    let decoder_only = Provider::new().with_decoder(|_: &[Decoder]| {
        Decoder::new(|input| match input {
            Value::String(s) => Graded::success(Value::from(s.len() as f64)),
            _ => Graded::failure(crate::DecodeError::type_mismatch("string", input)),
        })
    });
    let ast = Ast::declaration("Length", Vec::new(), decoder_only);
    let interpreter = Interpreter::new();
    let input = interpreter.input_guard_for(&ast).unwrap();
    assert!(input.is(&Value::from("abc")));
    assert!(!input.is(&Value::from(3)));
    assert!(interpreter.guard_for(&ast).is_err());
}

#[test]
fn test_type_alias_hooks_override_structure() {
    let hooks = Annotations::new()
        .with_hook(Hook::pretty(|_| Pretty::new(|_| "<secret>".to_string())))
        .with_hook(Hook::encoder(|_| Encoder::new(|_| Value::Null)));
    let secret = Ast::type_alias(Vec::new(), Ast::string(), hooks);
    let interpreter = Interpreter::new();

    assert_eq!(interpreter.pretty_for(&secret).unwrap().pretty(&Value::from("pw")), "<secret>");
    assert_eq!(interpreter.encoder_for(&secret).unwrap().encode(&Value::from("pw")), Value::Null);
    // No decoder hook: the expansion decides.
    assert!(decoder_for(&secret).unwrap().decode(&Value::from(1)).is_failure());
    assert!(guard_for(&secret).unwrap().is(&Value::from("pw")));
}

#[test]
fn test_type_alias_hooks_receive_parameters() {
    let hooks = Annotations::new().with_hook(Hook::guard(|params: &[Guard]| {
        let item = params[0].clone();
        Guard::new(move |value| value.as_array().is_some_and(|items| items.iter().all(|i| item.is(i))))
    }));
    let list = Ast::type_alias(vec![Ast::boolean()], Ast::array(Ast::unknown()), hooks);
    let guard = guard_for(&list).unwrap();
    assert!(guard.is(&Value::Array(vec![Value::from(true)])));
    assert!(!guard.is(&Value::Array(vec![Value::from(1)])));
}
