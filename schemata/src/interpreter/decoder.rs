use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use tracing::trace;

use super::guard::{self, keyword_accepts, Side};
use super::{Artifact, DeriveContext};
use crate::ast::{Ast, AstKind, Keyword, Severity};
use crate::error::{DecodeError, DecodeErrorKind, PathSegment, SchemaResult};
use crate::graded::{Accumulator, Graded, NonEmpty};
use crate::provider::{ArtifactKind, Provider};
use crate::value::{Object, Value};

pub type DecodeResult<A> = Graded<DecodeError, A>;

/// Validates untrusted input.
///
/// Decoding never stops at the first problem: every independent error in the
/// input is reported, and non-fatal ones (NaN, warning refinements) still
/// produce a value.
#[derive(Clone)]
pub struct Decoder {
    decode: Arc<dyn Fn(&Value) -> DecodeResult<Value> + Send + Sync>,
}

impl Decoder {
    pub fn new(f: impl Fn(&Value) -> DecodeResult<Value> + Send + Sync + 'static) -> Self {
        Self { decode: Arc::new(f) }
    }

    pub fn decode(&self, input: &Value) -> DecodeResult<Value> {
        (self.decode)(input)
    }

    /// Post-process successfully decoded values.
    #[must_use]
    pub fn and_then(
        &self,
        f: impl Fn(Value) -> DecodeResult<Value> + Send + Sync + 'static,
    ) -> Decoder {
        let inner = self.clone();
        Decoder::new(move |input| inner.decode(input).and_then(&f))
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Decoder { .. }")
    }
}

impl Artifact for Decoder {
    fn deferred(cell: Weak<OnceLock<Self>>) -> Self {
        Decoder::new(move |input| match cell.upgrade() {
            Some(cell) => forward(&cell, input),
            None => Graded::failure(DecodeError::new(DecodeErrorKind::Unresolved)),
        })
    }

    fn forwarding(cell: Arc<OnceLock<Self>>) -> Self {
        Decoder::new(move |input| forward(&cell, input))
    }
}

fn forward(cell: &OnceLock<Decoder>, input: &Value) -> DecodeResult<Value> {
    match cell.get() {
        Some(decoder) => decoder.decode(input),
        None => Graded::failure(DecodeError::new(DecodeErrorKind::Unresolved)),
    }
}

fn derive_all(asts: &[Ast], ctx: &mut DeriveContext<'_>) -> SchemaResult<Vec<Decoder>> {
    asts.iter().map(|ast| derive(ast, ctx)).collect()
}

fn keyword(keyword: Keyword, expected: Ast) -> Decoder {
    match keyword {
        Keyword::Number => Decoder::new(move |input| match input {
            Value::Number(n) if n.is_nan() => {
                Graded::warning(DecodeError::new(DecodeErrorKind::NaN), input.clone())
            }
            Value::Number(n) if n.is_infinite() => {
                Graded::warning(DecodeError::new(DecodeErrorKind::NotFinite), input.clone())
            }
            Value::Number(_) => Graded::success(input.clone()),
            _ => Graded::failure(DecodeError::type_mismatch(expected.to_string(), input)),
        }),
        _ => Decoder::new(move |input| {
            if keyword_accepts(keyword, input) {
                Graded::success(input.clone())
            } else {
                Graded::failure(DecodeError::type_mismatch(expected.to_string(), input))
            }
        }),
    }
}

pub(crate) fn derive(ast: &Ast, ctx: &mut DeriveContext<'_>) -> SchemaResult<Decoder> {
    if let Some(decoder) = ctx.node_decoders.get(ast, ()) {
        return Ok(decoder);
    }
    let decoder = derive_node(ast, ctx)?;
    ctx.node_decoders.insert(ast, (), decoder.clone());
    Ok(decoder)
}

fn derive_node(ast: &Ast, ctx: &mut DeriveContext<'_>) -> SchemaResult<Decoder> {
    // Rendered only when a mismatch is reported.
    let expected = ast.clone();
    match ast.kind() {
        AstKind::Literal(literal) => {
            let literal = literal.clone();
            Ok(Decoder::new(move |input| {
                if literal.matches(input) {
                    Graded::success(input.clone())
                } else {
                    Graded::failure(DecodeError::new(DecodeErrorKind::Equal {
                        expected: literal.clone(),
                        actual: input.clone(),
                    }))
                }
            }))
        }
        AstKind::Keyword(k) => Ok(keyword(*k, expected)),
        AstKind::UniqueSymbol(symbol) => {
            let symbol = symbol.clone();
            Ok(Decoder::new(move |input| match input {
                Value::Symbol(s) if *s == symbol => Graded::success(input.clone()),
                _ => Graded::failure(DecodeError::type_mismatch(expected.to_string(), input)),
            }))
        }
        AstKind::Enums(members) => {
            let literals: Vec<_> = members.iter().map(|(_, literal)| literal.clone()).collect();
            Ok(Decoder::new(move |input| {
                if literals.iter().any(|l| l.matches(input)) {
                    Graded::success(input.clone())
                } else {
                    Graded::failure(DecodeError::new(DecodeErrorKind::Enums {
                        expected: literals.clone(),
                        actual: input.clone(),
                    }))
                }
            }))
        }
        AstKind::Tuple(tuple) => {
            let mut elements = Vec::with_capacity(tuple.elements.len());
            for element in &tuple.elements {
                elements.push((derive(&element.ast, ctx)?, element.is_optional));
            }
            let rest = tuple.rest.as_ref().map(|r| derive(r, ctx)).transpose()?;
            let allow_unexpected = tuple.allow_unexpected;
            Ok(Decoder::new(move |input| {
                let Value::Array(items) = input else {
                    return Graded::failure(DecodeError::type_mismatch(expected.to_string(), input));
                };
                let mut acc = Accumulator::new();
                let mut output = Vec::with_capacity(items.len());
                for (i, (decoder, optional)) in elements.iter().enumerate() {
                    match items.get(i) {
                        Some(item) => {
                            if let Some(value) = acc.absorb(decoder.decode(item).at(PathSegment::Index(i))) {
                                output.push(value);
                            }
                        }
                        None if *optional => {}
                        None => acc.fail(
                            DecodeError::new(DecodeErrorKind::MissingIndex).at(PathSegment::Index(i)),
                        ),
                    }
                }
                for (i, item) in items.iter().enumerate().skip(elements.len()) {
                    match &rest {
                        Some(decoder) => {
                            if let Some(value) = acc.absorb(decoder.decode(item).at(PathSegment::Index(i))) {
                                output.push(value);
                            }
                        }
                        None if allow_unexpected => output.push(item.clone()),
                        None => acc.fail(
                            DecodeError::new(DecodeErrorKind::UnexpectedIndex { actual: item.clone() })
                                .at(PathSegment::Index(i)),
                        ),
                    }
                }
                acc.finish(Value::Array(output))
            }))
        }
        AstKind::Struct(s) => {
            let mut fields = Vec::with_capacity(s.fields.len());
            for field in &s.fields {
                fields.push((field.key.clone(), derive(&field.ast, ctx)?, field.is_optional));
            }
            let declared: HashSet<String> = s.fields.iter().map(|f| f.key.clone()).collect();
            let mut index_signatures = Vec::with_capacity(s.index_signatures.len());
            for sig in &s.index_signatures {
                index_signatures.push((
                    guard::derive(&sig.key, Side::Decoded, ctx)?,
                    derive(&sig.value, ctx)?,
                ));
            }
            let allow_unexpected = s.allow_unexpected;
            Ok(Decoder::new(move |input| {
                let Value::Object(map) = input else {
                    return Graded::failure(DecodeError::type_mismatch(expected.to_string(), input));
                };
                let mut acc = Accumulator::new();
                let mut output = Object::with_capacity(map.len());
                for (key, decoder, optional) in &fields {
                    match map.get(key) {
                        Some(field) => {
                            let decoded = decoder.decode(field).at(PathSegment::Key(key.clone()));
                            if let Some(value) = acc.absorb(decoded) {
                                output.insert(key.clone(), value);
                            }
                        }
                        None if *optional => {}
                        None => acc.fail(
                            DecodeError::new(DecodeErrorKind::MissingKey)
                                .at(PathSegment::Key(key.clone())),
                        ),
                    }
                }
                for (key, field) in map.iter().filter(|(key, _)| !declared.contains(*key)) {
                    let key_value = Value::String(key.clone());
                    match index_signatures.iter().find(|(k, _)| k.is(&key_value)) {
                        Some((_, decoder)) => {
                            let decoded = decoder.decode(field).at(PathSegment::Key(key.clone()));
                            if let Some(value) = acc.absorb(decoded) {
                                output.insert(key.clone(), value);
                            }
                        }
                        None if allow_unexpected => {
                            trace!(key = %key, "Dropping unexpected key");
                        }
                        None => acc.fail(
                            DecodeError::new(DecodeErrorKind::UnexpectedKey { actual: field.clone() })
                                .at(PathSegment::Key(key.clone())),
                        ),
                    }
                }
                acc.finish(Value::Object(output))
            }))
        }
        AstKind::Union(members) => {
            let mut candidates = Vec::with_capacity(members.len());
            for member in members {
                candidates.push((
                    guard::derive(member, Side::Input, ctx)?,
                    derive(member, ctx)?,
                    member.clone(),
                ));
            }
            Ok(Decoder::new(move |input| {
                if let Some((index, (_, decoder, _))) = candidates
                    .iter()
                    .enumerate()
                    .find(|(_, (guard, _, _))| guard.is(input))
                {
                    return decoder.decode(input).at(PathSegment::Member(index));
                }
                let errors = candidates
                    .iter()
                    .enumerate()
                    .map(|(index, (_, _, member))| {
                        DecodeError::new(DecodeErrorKind::UnionMember {
                            expected: member.to_string(),
                            actual: input.clone(),
                        })
                        .at(PathSegment::Member(index))
                    })
                    .collect();
                match NonEmpty::from_vec(errors) {
                    Some(errors) => Graded::Failure(errors),
                    None => Graded::failure(DecodeError::type_mismatch(expected.to_string(), input)),
                }
            }))
        }
        AstKind::Refinement(refinement) => {
            let from = derive(&refinement.from, ctx)?;
            let refinement = refinement.clone();
            let message = ast.annotations().message().map(str::to_owned);
            Ok(Decoder::new(move |input| {
                from.decode(input).and_then(|value| {
                    if refinement.test(&value) {
                        return Graded::success(value);
                    }
                    let error = DecodeError::new(DecodeErrorKind::Refinement {
                        name: refinement.name.clone(),
                        meta: refinement.meta.clone(),
                        message: message.clone(),
                        actual: value.clone(),
                    });
                    match refinement.severity {
                        Severity::Warning => Graded::warning(error, value),
                        Severity::Failure => Graded::failure(error),
                    }
                })
            }))
        }
        AstKind::Declaration(declaration) => {
            let constructor = ctx.constructor(declaration, ArtifactKind::Decoder, Provider::decoder)?;
            let params = derive_all(&declaration.type_parameters, ctx)?;
            Ok(constructor(&params))
        }
        AstKind::TypeAlias(alias) => match ast.annotations().decoder_hook() {
            Some(hook) => {
                let params = derive_all(&alias.type_parameters, ctx)?;
                Ok(hook(&params))
            }
            None => derive(&alias.expansion, ctx),
        },
        AstKind::Lazy(lazy) => {
            if let Some(decoder) = ctx.decoders.lookup(lazy.id) {
                return Ok(decoder);
            }
            let cell = ctx.decoders.begin(lazy.id);
            let resolved = ctx.resolve(lazy, ast);
            let derived = derive(&resolved, ctx);
            ctx.decoders.finish(lazy.id, cell, derived)
        }
    }
}
