//! `Option<A>`.
//!
//! Decoded options are tagged objects: `{"_tag":"None"}` or
//! `{"_tag":"Some","value":a}`. On the wire `undefined` and `null` decode to
//! none and anything else must decode as `A`. None encodes as `null`.
//!
//! # Example
//! ```rust,ignore
//! use schemata::{decoder_for, Ast, Value};
//! use schemata_data::option::{option, some};
//!
//! let decoder = decoder_for(&option(Ast::number()))?;
//! assert_eq!(decoder.decode(&Value::from(1)).into_value(), Some(some(Value::from(1))));
//! ```

use rand::Rng;
use schemata::{
    Arbitrary, Ast, DecodeError, DecodeErrorKind, Decoder, Encoder, Graded, Guard, Literal,
    NonEmpty, PathSegment, Pretty, Provider, Value,
};

pub const OPTION_ID: &str = "Option";

const TAG: &str = "_tag";

pub fn none() -> Value {
    Value::object([(TAG, Value::from("None"))])
}

pub fn some(value: Value) -> Value {
    Value::object([(TAG, Value::from("Some")), ("value", value)])
}

/// The wrapped value of a decoded option: `Some(None)` for none,
/// `Some(Some(a))` for some, `None` if `value` is not an option.
pub fn as_option(value: &Value) -> Option<Option<&Value>> {
    let map = value.as_object()?;
    match map.get(TAG).and_then(Value::as_str)? {
        "None" if map.len() == 1 => Some(None),
        "Some" if map.len() == 2 => map.get("value").map(Some),
        _ => None,
    }
}

/// `Option<item>`.
pub fn option(item: Ast) -> Ast {
    Ast::declaration(OPTION_ID, vec![item], provider())
}

pub fn provider() -> Provider {
    Provider::new()
        .with_decoder(|params: &[Decoder]| decoder(params.first().cloned()))
        .with_guard(|params: &[Guard]| guard(params.first().cloned()))
        .with_encoder(|params: &[Encoder]| encoder(params.first().cloned()))
        .with_pretty(|params: &[Pretty]| pretty(params.first().cloned()))
        .with_arbitrary(|params: &[Arbitrary]| arbitrary(params.first().cloned()))
}

fn decoder(item: Option<Decoder>) -> Decoder {
    let Some(item) = item else {
        return Decoder::new(|input| Graded::failure(DecodeError::type_mismatch("Option", input)));
    };
    Decoder::new(move |input| match input {
        Value::Undefined | Value::Null => Graded::success(none()),
        _ => match item.decode(input) {
            Graded::Failure(errors) => {
                let mut all = NonEmpty::new(
                    DecodeError::type_mismatch("undefined", input).at(PathSegment::Member(0)),
                );
                all.push(
                    DecodeError::new(DecodeErrorKind::Equal {
                        expected: Literal::Null,
                        actual: input.clone(),
                    })
                    .at(PathSegment::Member(1)),
                );
                all.append(errors.map(|e| e.at(PathSegment::Member(2))));
                Graded::Failure(all)
            }
            decoded => decoded.map(some),
        },
    })
}

fn guard(item: Option<Guard>) -> Guard {
    Guard::new(move |value| match as_option(value) {
        Some(None) => true,
        Some(Some(inner)) => item.as_ref().is_some_and(|g| g.is(inner)),
        None => false,
    })
}

fn encoder(item: Option<Encoder>) -> Encoder {
    Encoder::new(move |value| match as_option(value) {
        Some(None) => Value::Null,
        Some(Some(inner)) => match &item {
            Some(encoder) => encoder.encode(inner),
            None => inner.clone(),
        },
        None => value.clone(),
    })
}

fn pretty(item: Option<Pretty>) -> Pretty {
    Pretty::new(move |value| match as_option(value) {
        Some(None) => "none".to_string(),
        Some(Some(inner)) => {
            let shown = item.as_ref().map_or_else(|| inner.to_string(), |p| p.pretty(inner));
            format!("some({shown})")
        }
        None => value.to_string(),
    })
}

fn arbitrary(item: Option<Arbitrary>) -> Arbitrary {
    Arbitrary::new(move |rng, depth| match &item {
        Some(item) if rng.gen_bool(0.5) => item.generate_at(rng, depth + 1).map(some),
        _ => Ok(none()),
    })
}
