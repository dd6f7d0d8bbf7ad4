//! `Json`: any value JSON can carry.
//!
//! Null, booleans, finite numbers, strings, and arrays or objects made of
//! those. The decoder checks the input against the guard and passes it
//! through unchanged.

use rand::{Rng, RngCore};
use schemata::{
    Arbitrary, Ast, DecodeError, Decoder, Encoder, Graded, Guard, Pretty, Provider, Value,
};

pub const JSON_ID: &str = "Json";

/// Nesting depth past which generated values are scalars.
const MAX_GENERATED_DEPTH: usize = 2;
const MAX_GENERATED_LENGTH: usize = 3;

pub fn json() -> Ast {
    Ast::declaration(JSON_ID, Vec::new(), provider())
}

pub fn is_json(value: &Value) -> bool {
    match value {
        Value::Null | Value::Boolean(_) | Value::String(_) => true,
        Value::Number(n) => n.is_finite(),
        Value::Array(items) => items.iter().all(is_json),
        Value::Object(map) => map.values().all(is_json),
        Value::Undefined | Value::BigInt(_) | Value::Symbol(_) | Value::Set(_) => false,
    }
}

pub fn provider() -> Provider {
    Provider::new()
        .with_decoder(|_: &[Decoder]| {
            Decoder::new(|input| {
                if is_json(input) {
                    Graded::success(input.clone())
                } else {
                    Graded::failure(DecodeError::type_mismatch(JSON_ID, input))
                }
            })
        })
        .with_guard(|_: &[Guard]| Guard::new(is_json))
        .with_encoder(|_: &[Encoder]| Encoder::identity())
        .with_pretty(|_: &[Pretty]| Pretty::new(stringify))
        .with_arbitrary(|_: &[Arbitrary]| Arbitrary::new(|rng, depth| Ok(generate(rng, depth))))
}

fn stringify(value: &Value) -> String {
    match value.to_json() {
        Ok(json) => json.to_string(),
        Err(_) => value.to_string(),
    }
}

fn generate(rng: &mut dyn RngCore, depth: usize) -> Value {
    let choices = if depth >= MAX_GENERATED_DEPTH { 4 } else { 6 };
    match rng.gen_range(0..choices) {
        0 => Value::Null,
        1 => Value::Boolean(rng.gen_bool(0.5)),
        2 => Value::Number(f64::from(rng.gen_range(-1000i32..=1000))),
        3 => {
            let length = rng.gen_range(0..=MAX_GENERATED_LENGTH);
            Value::String((0..length).map(|_| rng.gen_range('a'..='z')).collect())
        }
        4 => {
            let length = rng.gen_range(0..=MAX_GENERATED_LENGTH);
            Value::Array((0..length).map(|_| generate(rng, depth + 1)).collect())
        }
        _ => {
            let length = rng.gen_range(0..=MAX_GENERATED_LENGTH);
            Value::object((0..length).map(|i| (format!("k{i}"), generate(rng, depth + 1))))
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use schemata::{arbitrary_for, decoder_for, guard_for, pretty_for};
    use serde_json::json as j;

    use super::*;

    #[test]
    fn test_guard() {
        let guard = guard_for(&json()).unwrap();
        assert!(guard.is(&Value::from(j!({"a": [1, true, null, "s"]}))));
        assert!(!guard.is(&Value::Undefined));
        assert!(!guard.is(&Value::Number(f64::NAN)));
        assert!(!guard.is(&Value::Array(vec![Value::BigInt(1)])));
    }

    #[test]
    fn test_decoder() {
        let decoder = decoder_for(&json()).unwrap();
        let input = Value::from(j!({"a": [1, true]}));
        assert_eq!(decoder.decode(&input), Graded::Success(input.clone()));
        let result = decoder.decode(&Value::Undefined);
        assert_eq!(result.error_list()[0].to_string(), "undefined did not satisfy is(Json)");
    }

    #[test]
    fn test_pretty() {
        let pretty = pretty_for(&json()).unwrap();
        assert_eq!(pretty.pretty(&Value::from(j!({"a": [1, true]}))), r#"{"a":[1,true]}"#);
    }

    #[test]
    fn test_generated_values_are_json() {
        let arbitrary = arbitrary_for(&json()).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..50 {
            let value = arbitrary.generate(&mut rng).unwrap();
            assert!(is_json(&value), "{value}");
        }
    }
}
