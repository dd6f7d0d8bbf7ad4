//! Property-based tests: the data types obey the same laws as structural
//! schemas.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use schemata::{Ast, Field, Graded, Interpreter, Value};
use schemata_data::{chunk, json, number_from_string, option, readonly_set};

fn schemas() -> Vec<Ast> {
    vec![
        option(Ast::number()),
        readonly_set(Ast::string()),
        chunk(Ast::boolean()),
        json(),
        number_from_string(Ast::string()),
        Ast::struct_(vec![
            Field::required("id", number_from_string(Ast::string())),
            Field::required("tags", readonly_set(option(Ast::string()))),
            Field::optional("payload", json()),
        ])
        .unwrap(),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        Just(Value::Undefined),
        any::<bool>().prop_map(Value::Boolean),
        (-100.0f64..100.0).prop_map(Value::Number),
        "[a-z0-9.]{0,4}".prop_map(Value::String),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("(id|tags|payload)", inner), 0..3).prop_map(Value::object),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Whatever a decoder produces satisfies the guard.
    #[test]
    fn prop_decoded_values_satisfy_guard(input in arb_value()) {
        let interpreter = Interpreter::new();
        for ast in schemas() {
            let decoder = interpreter.decoder_for(&ast).unwrap();
            let guard = interpreter.guard_for(&ast).unwrap();
            if let Some(decoded) = decoder.decode(&input).into_value() {
                prop_assert!(guard.is(&decoded), "schema {} produced {}", ast, decoded);
            }
        }
    }

    /// Generated values satisfy the guard and survive encode then decode.
    #[test]
    fn prop_generated_values_round_trip(seed in any::<u64>()) {
        let interpreter = Interpreter::new();
        let mut rng = StdRng::seed_from_u64(seed);
        for ast in schemas() {
            let value = interpreter.arbitrary_for(&ast).unwrap().generate(&mut rng).unwrap();
            prop_assert!(interpreter.guard_for(&ast).unwrap().is(&value));

            let encoded = interpreter.encoder_for(&ast).unwrap().encode(&value);
            let decoded = interpreter.decoder_for(&ast).unwrap().decode(&encoded);
            prop_assert_eq!(decoded, Graded::Success(value));
        }
    }
}
