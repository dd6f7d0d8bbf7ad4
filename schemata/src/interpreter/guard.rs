use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use super::{decoder, Artifact, DeriveContext};
use crate::ast::{Ast, AstKind, Keyword, Severity};
use crate::error::SchemaResult;
use crate::provider::{ArtifactKind, Provider};
use crate::value::Value;

/// Which side of a schema a guard describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Side {
    /// Values the decoder produces.
    Decoded,
    /// Values the decoder accepts.
    Input,
}

/// A type test.
#[derive(Clone)]
pub struct Guard {
    is: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl Guard {
    pub fn new(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self { is: Arc::new(f) }
    }

    pub fn is(&self, value: &Value) -> bool {
        (self.is)(value)
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard { .. }")
    }
}

impl Artifact for Guard {
    fn deferred(cell: Weak<OnceLock<Self>>) -> Self {
        Guard::new(move |value| {
            cell.upgrade()
                .is_some_and(|cell| cell.get().is_some_and(|guard| guard.is(value)))
        })
    }

    fn forwarding(cell: Arc<OnceLock<Self>>) -> Self {
        Guard::new(move |value| cell.get().is_some_and(|guard| guard.is(value)))
    }
}

pub(crate) fn keyword_accepts(keyword: Keyword, value: &Value) -> bool {
    match keyword {
        Keyword::String => matches!(value, Value::String(_)),
        Keyword::Number => matches!(value, Value::Number(_)),
        Keyword::Boolean => matches!(value, Value::Boolean(_)),
        Keyword::BigInt => matches!(value, Value::BigInt(_)),
        Keyword::Symbol => matches!(value, Value::Symbol(_)),
        Keyword::Object => matches!(value, Value::Array(_) | Value::Object(_) | Value::Set(_)),
        Keyword::Unknown | Keyword::Any => true,
        Keyword::Never => false,
        Keyword::Undefined | Keyword::Void => matches!(value, Value::Undefined),
    }
}

fn derive_all(asts: &[Ast], side: Side, ctx: &mut DeriveContext<'_>) -> SchemaResult<Vec<Guard>> {
    asts.iter().map(|ast| derive(ast, side, ctx)).collect()
}

/// Input side of an opaque node: whatever its decoder accepts.
fn from_decoder(ast: &Ast, ctx: &mut DeriveContext<'_>) -> SchemaResult<Guard> {
    let decoder = decoder::derive(ast, ctx)?;
    Ok(Guard::new(move |value| decoder.decode(value).has_value()))
}

pub(crate) fn derive(ast: &Ast, side: Side, ctx: &mut DeriveContext<'_>) -> SchemaResult<Guard> {
    if let Some(guard) = ctx.node_guards.get(ast, side) {
        return Ok(guard);
    }
    let guard = derive_node(ast, side, ctx)?;
    ctx.node_guards.insert(ast, side, guard.clone());
    Ok(guard)
}

fn derive_node(ast: &Ast, side: Side, ctx: &mut DeriveContext<'_>) -> SchemaResult<Guard> {
    match ast.kind() {
        AstKind::Literal(literal) => {
            let literal = literal.clone();
            Ok(Guard::new(move |value| literal.matches(value)))
        }
        AstKind::Keyword(keyword) => {
            let keyword = *keyword;
            Ok(Guard::new(move |value| keyword_accepts(keyword, value)))
        }
        AstKind::UniqueSymbol(symbol) => {
            let symbol = symbol.clone();
            Ok(Guard::new(
                move |value| matches!(value, Value::Symbol(s) if *s == symbol),
            ))
        }
        AstKind::Enums(members) => {
            let literals: Vec<_> = members.iter().map(|(_, literal)| literal.clone()).collect();
            Ok(Guard::new(move |value| literals.iter().any(|l| l.matches(value))))
        }
        AstKind::Tuple(tuple) => {
            let mut elements = Vec::with_capacity(tuple.elements.len());
            for element in &tuple.elements {
                elements.push((derive(&element.ast, side, ctx)?, element.is_optional));
            }
            let rest = tuple.rest.as_ref().map(|r| derive(r, side, ctx)).transpose()?;
            let allow_unexpected = tuple.allow_unexpected;
            Ok(Guard::new(move |value| {
                let Value::Array(items) = value else {
                    return false;
                };
                let declared = elements.iter().enumerate().all(|(i, (guard, optional))| {
                    match items.get(i) {
                        Some(item) => guard.is(item),
                        None => *optional,
                    }
                });
                declared
                    && items.iter().skip(elements.len()).all(|item| match &rest {
                        Some(rest) => rest.is(item),
                        None => allow_unexpected,
                    })
            }))
        }
        AstKind::Struct(s) => {
            let mut fields = Vec::with_capacity(s.fields.len());
            for field in &s.fields {
                fields.push((field.key.clone(), derive(&field.ast, side, ctx)?, field.is_optional));
            }
            let declared: HashSet<String> = s.fields.iter().map(|f| f.key.clone()).collect();
            let mut index_signatures = Vec::with_capacity(s.index_signatures.len());
            for sig in &s.index_signatures {
                index_signatures.push((
                    derive(&sig.key, Side::Decoded, ctx)?,
                    derive(&sig.value, side, ctx)?,
                ));
            }
            let allow_unexpected = s.allow_unexpected;
            Ok(Guard::new(move |value| {
                let Value::Object(map) = value else {
                    return false;
                };
                let fields_ok = fields.iter().all(|(key, guard, optional)| match map.get(key) {
                    Some(field) => guard.is(field),
                    None => *optional,
                });
                fields_ok
                    && map
                        .iter()
                        .filter(|(key, _)| !declared.contains(*key))
                        .all(|(key, field)| {
                            let key = Value::String(key.clone());
                            match index_signatures.iter().find(|(k, _)| k.is(&key)) {
                                Some((_, guard)) => guard.is(field),
                                None => allow_unexpected,
                            }
                        })
            }))
        }
        AstKind::Union(members) => {
            let guards = derive_all(members, side, ctx)?;
            Ok(Guard::new(move |value| guards.iter().any(|g| g.is(value))))
        }
        AstKind::Refinement(refinement) => match side {
            Side::Input => from_decoder(ast, ctx),
            Side::Decoded => {
                let from = derive(&refinement.from, side, ctx)?;
                let refinement = refinement.clone();
                Ok(Guard::new(move |value| {
                    from.is(value)
                        && (refinement.severity == Severity::Warning || refinement.test(value))
                }))
            }
        },
        AstKind::Declaration(declaration) => match side {
            Side::Input => from_decoder(ast, ctx),
            Side::Decoded => {
                let constructor = ctx.constructor(declaration, ArtifactKind::Guard, Provider::guard)?;
                let params = derive_all(&declaration.type_parameters, side, ctx)?;
                Ok(constructor(&params))
            }
        },
        AstKind::TypeAlias(alias) => {
            let annotations = ast.annotations();
            match (side, annotations.guard_hook()) {
                (Side::Input, _) if annotations.decoder_hook().is_some() => from_decoder(ast, ctx),
                (Side::Decoded, Some(hook)) => {
                    let params = derive_all(&alias.type_parameters, side, ctx)?;
                    Ok(hook(&params))
                }
                _ => derive(&alias.expansion, side, ctx),
            }
        }
        AstKind::Lazy(lazy) => {
            let key = (lazy.id, side);
            if let Some(guard) = ctx.guards.lookup(key) {
                return Ok(guard);
            }
            let cell = ctx.guards.begin(key);
            let resolved = ctx.resolve(lazy, ast);
            let derived = derive(&resolved, side, ctx);
            ctx.guards.finish(key, cell, derived)
        }
    }
}
