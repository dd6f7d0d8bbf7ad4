use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use tracing::debug;

use super::guard::{self, Side};
use super::{Artifact, DeriveContext};
use crate::ast::{Ast, AstKind};
use crate::error::SchemaResult;
use crate::provider::{ArtifactKind, Provider};
use crate::value::{Object, Value};

/// Projects decoded values back to their input shape.
///
/// Encoding is total. Values that do not have the schema's decoded type pass
/// through unchanged.
#[derive(Clone)]
pub struct Encoder {
    encode: Arc<dyn Fn(&Value) -> Value + Send + Sync>,
}

impl Encoder {
    pub fn new(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        Self { encode: Arc::new(f) }
    }

    pub fn identity() -> Self {
        Self::new(Value::clone)
    }

    pub fn encode(&self, value: &Value) -> Value {
        (self.encode)(value)
    }
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Encoder { .. }")
    }
}

impl Artifact for Encoder {
    fn deferred(cell: Weak<OnceLock<Self>>) -> Self {
        Encoder::new(move |value| match cell.upgrade() {
            Some(cell) => forward(&cell, value),
            None => value.clone(),
        })
    }

    fn forwarding(cell: Arc<OnceLock<Self>>) -> Self {
        Encoder::new(move |value| forward(&cell, value))
    }
}

fn forward(cell: &OnceLock<Encoder>, value: &Value) -> Value {
    match cell.get() {
        Some(encoder) => encoder.encode(value),
        None => value.clone(),
    }
}

fn derive_all(asts: &[Ast], ctx: &mut DeriveContext<'_>) -> SchemaResult<Vec<Encoder>> {
    asts.iter().map(|ast| derive(ast, ctx)).collect()
}

pub(crate) fn derive(ast: &Ast, ctx: &mut DeriveContext<'_>) -> SchemaResult<Encoder> {
    match ast.kind() {
        AstKind::Literal(_)
        | AstKind::Keyword(_)
        | AstKind::UniqueSymbol(_)
        | AstKind::Enums(_) => Ok(Encoder::identity()),
        AstKind::Tuple(tuple) => {
            let elements = tuple
                .elements
                .iter()
                .map(|e| derive(&e.ast, ctx))
                .collect::<SchemaResult<Vec<_>>>()?;
            let rest = tuple.rest.as_ref().map(|r| derive(r, ctx)).transpose()?;
            Ok(Encoder::new(move |value| {
                let Value::Array(items) = value else {
                    return value.clone();
                };
                let output = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match elements.get(i).or(rest.as_ref()) {
                        Some(encoder) => encoder.encode(item),
                        None => item.clone(),
                    })
                    .collect();
                Value::Array(output)
            }))
        }
        AstKind::Struct(s) => {
            let mut fields = Vec::with_capacity(s.fields.len());
            for field in &s.fields {
                fields.push((field.key.clone(), derive(&field.ast, ctx)?));
            }
            let declared: HashSet<String> = s.fields.iter().map(|f| f.key.clone()).collect();
            let mut index_signatures = Vec::with_capacity(s.index_signatures.len());
            for sig in &s.index_signatures {
                index_signatures.push((
                    guard::derive(&sig.key, Side::Decoded, ctx)?,
                    derive(&sig.value, ctx)?,
                ));
            }
            Ok(Encoder::new(move |value| {
                let Value::Object(map) = value else {
                    return value.clone();
                };
                let mut output = Object::with_capacity(map.len());
                for (key, encoder) in &fields {
                    if let Some(field) = map.get(key) {
                        output.insert(key.clone(), encoder.encode(field));
                    }
                }
                for (key, field) in map.iter().filter(|(key, _)| !declared.contains(*key)) {
                    let key_value = Value::String(key.clone());
                    if let Some((_, encoder)) = index_signatures.iter().find(|(k, _)| k.is(&key_value)) {
                        output.insert(key.clone(), encoder.encode(field));
                    }
                }
                Value::Object(output)
            }))
        }
        AstKind::Union(members) => {
            let mut candidates = Vec::with_capacity(members.len());
            for member in members {
                candidates.push((guard::derive(member, Side::Decoded, ctx)?, derive(member, ctx)?));
            }
            Ok(Encoder::new(move |value| {
                match candidates.iter().find(|(guard, _)| guard.is(value)) {
                    Some((_, encoder)) => encoder.encode(value),
                    None => {
                        debug!(value = %value, "No union member matched, passing value through");
                        value.clone()
                    }
                }
            }))
        }
        AstKind::Refinement(refinement) => derive(&refinement.from, ctx),
        AstKind::Declaration(declaration) => {
            let constructor = ctx.constructor(declaration, ArtifactKind::Encoder, Provider::encoder)?;
            let params = derive_all(&declaration.type_parameters, ctx)?;
            Ok(constructor(&params))
        }
        AstKind::TypeAlias(alias) => match ast.annotations().encoder_hook() {
            Some(hook) => {
                let params = derive_all(&alias.type_parameters, ctx)?;
                Ok(hook(&params))
            }
            None => derive(&alias.expansion, ctx),
        },
        AstKind::Lazy(lazy) => {
            if let Some(encoder) = ctx.encoders.lookup(lazy.id) {
                return Ok(encoder);
            }
            let cell = ctx.encoders.begin(lazy.id);
            let resolved = ctx.resolve(lazy, ast);
            let derived = derive(&resolved, ctx);
            ctx.encoders.finish(lazy.id, cell, derived)
        }
    }
}
