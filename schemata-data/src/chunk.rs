//! `Chunk<A>`: an immutable sequence, decoded from an array.
//!
//! Modelled as a type alias over a struct branded with a unique symbol, so
//! structural tools (optics, field listing) still see its shape. Every
//! artifact comes from a hook:
//!
//! | Artifact  | Behaviour                                  |
//! |-----------|--------------------------------------------|
//! | decoder   | `A[]` → chunk                              |
//! | guard     | branded struct whose values all satisfy `A`|
//! | encoder   | chunk → encoded `A[]`                      |
//! | pretty    | `Chunk(a, b)`                              |
//! | arbitrary | random `A[]` → chunk                       |

use rand::Rng;
use schemata::{
    Annotations, Arbitrary, Ast, AstKind, Decoder, Encoder, Field, Guard, Hook, Pretty, Struct,
    Symbol, Value,
};

use crate::decode_items;

pub const CHUNK_SYMBOL: &str = "schemata/data/Chunk";

const ID_KEY: &str = "_id";
const VALUES_KEY: &str = "values";
/// Top-level bound on generated lengths, lowered by one per nesting level.
const MAX_GENERATED_LENGTH: usize = 5;

fn brand() -> Symbol {
    Symbol::new(CHUNK_SYMBOL)
}

/// Wrap decoded items into a chunk value.
pub fn from_values(values: Vec<Value>) -> Value {
    Value::object([
        (ID_KEY, Value::Symbol(brand())),
        (VALUES_KEY, Value::Array(values)),
    ])
}

/// The items of a chunk value, if `value` is one.
pub fn values(value: &Value) -> Option<&[Value]> {
    let map = value.as_object()?;
    match map.get(ID_KEY) {
        Some(Value::Symbol(symbol)) if *symbol == brand() => {}
        _ => return None,
    }
    map.get(VALUES_KEY).and_then(Value::as_array)
}

/// `Chunk<item>`.
pub fn chunk(item: Ast) -> Ast {
    let expansion = Ast::new(AstKind::Struct(Struct {
        fields: vec![
            Field::required(ID_KEY, Ast::unique_symbol(brand())),
            Field::required(VALUES_KEY, Ast::array(item.clone())),
        ],
        index_signatures: Vec::new(),
        allow_unexpected: false,
    }));
    let hooks = Annotations::new()
        .with_identifier("Chunk")
        .with_hook(Hook::decoder(|params: &[Decoder]| decoder(params.first().cloned())))
        .with_hook(Hook::guard(|params: &[Guard]| guard(params.first().cloned())))
        .with_hook(Hook::encoder(|params: &[Encoder]| encoder(params.first().cloned())))
        .with_hook(Hook::pretty(|params: &[Pretty]| pretty(params.first().cloned())))
        .with_hook(Hook::arbitrary(|params: &[Arbitrary]| arbitrary(params.first().cloned())));
    Ast::type_alias(vec![item], expansion, hooks)
}

fn decoder(item: Option<Decoder>) -> Decoder {
    Decoder::new(move |input| decode_items(item.as_ref(), input).map(from_values))
}

fn guard(item: Option<Guard>) -> Guard {
    Guard::new(move |value| match (values(value), &item) {
        (Some(items), Some(item)) => items.iter().all(|v| item.is(v)),
        (Some(_), None) => true,
        (None, _) => false,
    })
}

fn encoder(item: Option<Encoder>) -> Encoder {
    Encoder::new(move |value| match values(value) {
        Some(items) => Value::Array(
            items
                .iter()
                .map(|v| item.as_ref().map_or_else(|| v.clone(), |e| e.encode(v)))
                .collect(),
        ),
        None => value.clone(),
    })
}

fn pretty(item: Option<Pretty>) -> Pretty {
    Pretty::new(move |value| match values(value) {
        Some(items) => {
            let shown: Vec<String> = items
                .iter()
                .map(|v| item.as_ref().map_or_else(|| v.to_string(), |p| p.pretty(v)))
                .collect();
            format!("Chunk({})", shown.join(", "))
        }
        None => value.to_string(),
    })
}

fn arbitrary(item: Option<Arbitrary>) -> Arbitrary {
    Arbitrary::new(move |rng, depth| {
        let Some(item) = &item else {
            return Ok(from_values(Vec::new()));
        };
        let length = rng.gen_range(0..=MAX_GENERATED_LENGTH.saturating_sub(depth));
        let mut items = Vec::with_capacity(length);
        for _ in 0..length {
            items.push(item.generate_at(rng, depth + 1)?);
        }
        Ok(from_values(items))
    })
}
