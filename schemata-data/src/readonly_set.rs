//! `ReadonlySet<A>`: decoded from an array, stored as [`Value::Set`].

use rand::Rng;
use schemata::{Arbitrary, Ast, Decoder, Encoder, Guard, Pretty, Provider, Value};

use crate::decode_items;

pub const READONLY_SET_ID: &str = "ReadonlySet";

/// Upper bound on generated set sizes at the top level. The bound drops by
/// one per nesting level, so recursive element types terminate.
const MAX_GENERATED_SIZE: usize = 5;

/// `ReadonlySet<item>`.
pub fn readonly_set(item: Ast) -> Ast {
    Ast::declaration(READONLY_SET_ID, vec![item], provider())
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
    Decoder::new(move |input| decode_items(item.as_ref(), input).map(Value::set))
}

fn guard(item: Option<Guard>) -> Guard {
    Guard::new(move |value| match value {
        Value::Set(members) => item
            .as_ref()
            .map_or(true, |item| members.iter().all(|m| item.is(m))),
        _ => false,
    })
}

fn encoder(item: Option<Encoder>) -> Encoder {
    Encoder::new(move |value| match (value, &item) {
        (Value::Set(members), Some(item)) => {
            Value::Array(members.iter().map(|m| item.encode(m)).collect())
        }
        (Value::Set(members), None) => Value::Array(members.clone()),
        _ => value.clone(),
    })
}

fn pretty(item: Option<Pretty>) -> Pretty {
    Pretty::new(move |value| match value {
        Value::Set(members) => {
            let shown: Vec<String> = members
                .iter()
                .map(|m| item.as_ref().map_or_else(|| m.to_string(), |p| p.pretty(m)))
                .collect();
            format!("new Set([{}])", shown.join(", "))
        }
        _ => value.to_string(),
    })
}

fn arbitrary(item: Option<Arbitrary>) -> Arbitrary {
    Arbitrary::new(move |rng, depth| {
        let Some(item) = &item else {
            return Ok(Value::Set(Vec::new()));
        };
        let size = rng.gen_range(0..=MAX_GENERATED_SIZE.saturating_sub(depth));
        let mut members = Vec::with_capacity(size);
        for _ in 0..size {
            members.push(item.generate_at(rng, depth + 1)?);
        }
        Ok(Value::set(members))
    })
}
