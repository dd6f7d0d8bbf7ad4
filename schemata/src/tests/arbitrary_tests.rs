//! Generators: conformance, termination and limits.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use crate::{
    arbitrary_for, decoder_for, ArbitraryConfig, Ast, Element, Field, GenerateError,
    IndexSignature, Interpreter, Literal, SchemaConfig, Value,
};

fn samples(ast: &Ast, seed: u64, count: usize) -> Vec<Result<Value, GenerateError>> {
    arbitrary_for(ast)
        .unwrap()
        .samples(StdRng::seed_from_u64(seed))
        .take(count)
        .collect()
}

fn assert_generated_values_decode(ast: &Ast) {
    let decoder = decoder_for(ast).unwrap();
    for (i, sample) in samples(ast, 42, 50).into_iter().enumerate() {
        let value = sample.unwrap_or_else(|e| panic!("sample {i} failed: {e}"));
        let result = decoder.decode(&value);
        assert!(result.is_success(), "sample {i} did not decode: {value}");
    }
}

#[test]
fn test_generated_structs_decode() {
    let ast = Ast::struct_with(
        vec![
            Field::required("name", Ast::string().min_length(1)),
            Field::optional("age", Ast::number().non_negative()),
            Field::required("tags", Ast::array(Ast::literals([Literal::from("a"), Literal::from("b")]))),
        ],
        vec![IndexSignature {
            key: Ast::literals([Literal::from("x"), Literal::from("y")]),
            value: Ast::boolean(),
        }],
        false,
    )
    .unwrap();
    assert_generated_values_decode(&ast);
}

#[test]
fn test_generated_tuples_decode() {
    let ast = Ast::tuple_with(
        vec![
            Element::required(Ast::bigint()),
            Element::optional(Ast::string()),
            Element::optional(Ast::null()),
        ],
        Some(Ast::number()),
        false,
    )
    .unwrap();
    assert_generated_values_decode(&ast);
}

#[test]
fn test_recursive_schema_terminates() {
    let category = Ast::lazy(|this| {
        Ast::struct_(vec![
            Field::required("name", Ast::string()),
            Field::required("subcategories", Ast::array(this.clone())),
        ])
        .unwrap_or_else(|_| Ast::never())
    });
    assert_generated_values_decode(&category);
}

#[test]
fn test_recursive_union_prefers_leaves_when_deep() {
    let tree = Ast::lazy(|this| {
        let branch = Ast::tuple(vec![
            Element::required(this.clone()),
            Element::required(this.clone()),
        ])
        .unwrap_or_else(|_| Ast::never());
        Ast::union(vec![branch, Ast::number()])
    });
    assert_generated_values_decode(&tree);
}

#[test]
fn test_same_seed_same_values() {
    let ast = Ast::array(Ast::union(vec![Ast::string(), Ast::number(), Ast::boolean()]));
    assert_eq!(samples(&ast, 7, 20), samples(&ast, 7, 20));
}

#[test]
fn test_never_cannot_be_generated() {
    assert_eq!(samples(&Ast::never(), 1, 1), vec![Err(GenerateError::Never)]);
}

#[test]
fn test_impossible_refinement_gives_up() {
    let ast = Ast::string().filter("impossible", json!({}), |_| false);
    assert_eq!(
        samples(&ast, 1, 1),
        vec![Err(GenerateError::RetryLimit {
            name: "impossible".to_string(),
            attempts: 100,
        })]
    );
}

#[test]
fn test_depth_limit() {
    let nested = Ast::struct_(vec![Field::required(
        "a",
        Ast::struct_(vec![Field::required(
            "b",
            Ast::struct_(vec![Field::required("c", Ast::string())]).unwrap(),
        )])
        .unwrap(),
    )])
    .unwrap();
    let config = SchemaConfig::new().with_arbitrary(
        ArbitraryConfig::new().with_soft_depth(1).with_depth_limit(2),
    );
    let arbitrary = Interpreter::new().with_config(config).arbitrary_for(&nested).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    assert_eq!(arbitrary.generate(&mut rng), Err(GenerateError::DepthLimit { limit: 2 }));
}

#[test]
fn test_rest_length_is_configurable() {
    let config = SchemaConfig::new().with_arbitrary(ArbitraryConfig::new().with_max_rest_length(0));
    let arbitrary = Interpreter::new()
        .with_config(config)
        .arbitrary_for(&Ast::array(Ast::string()))
        .unwrap();
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..10 {
        assert_eq!(arbitrary.generate(&mut rng), Ok(Value::Array(Vec::new())));
    }
}

#[test]
fn test_map_transforms_values() {
    let arbitrary = arbitrary_for(&Ast::literal("a"))
        .unwrap()
        .map(|v| Value::Array(vec![v]));
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(
        arbitrary.generate(&mut rng),
        Ok(Value::Array(vec![Value::from("a")]))
    );
}
