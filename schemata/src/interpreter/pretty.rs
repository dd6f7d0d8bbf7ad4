use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use super::guard::{self, Side};
use super::{Artifact, DeriveContext};
use crate::ast::{Ast, AstKind};
use crate::error::SchemaResult;
use crate::provider::{ArtifactKind, Provider};
use crate::value::{quote, Value};

/// Renders values of a schema.
///
/// Output is compact and JSON-like: `{"a":1,"b":["x"]}`. Struct keys come
/// out in declaration order; declared types with a printer of their own
/// (options, sets, chunks) render through it.
#[derive(Clone)]
pub struct Pretty {
    pretty: Arc<dyn Fn(&Value) -> String + Send + Sync>,
}

impl Pretty {
    pub fn new(f: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        Self { pretty: Arc::new(f) }
    }

    /// Renders with the value's own `Display`.
    pub fn display() -> Self {
        Self::new(|value| value.to_string())
    }

    pub fn pretty(&self, value: &Value) -> String {
        (self.pretty)(value)
    }
}

impl fmt::Debug for Pretty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pretty { .. }")
    }
}

impl Artifact for Pretty {
    fn deferred(cell: Weak<OnceLock<Self>>) -> Self {
        Pretty::new(move |value| match cell.upgrade() {
            Some(cell) => forward(&cell, value),
            None => "<unresolved>".to_string(),
        })
    }

    fn forwarding(cell: Arc<OnceLock<Self>>) -> Self {
        Pretty::new(move |value| forward(&cell, value))
    }
}

fn forward(cell: &OnceLock<Pretty>, value: &Value) -> String {
    match cell.get() {
        Some(pretty) => pretty.pretty(value),
        None => "<unresolved>".to_string(),
    }
}

fn derive_all(asts: &[Ast], ctx: &mut DeriveContext<'_>) -> SchemaResult<Vec<Pretty>> {
    asts.iter().map(|ast| derive(ast, ctx)).collect()
}

pub(crate) fn derive(ast: &Ast, ctx: &mut DeriveContext<'_>) -> SchemaResult<Pretty> {
    match ast.kind() {
        AstKind::Literal(_)
        | AstKind::Keyword(_)
        | AstKind::UniqueSymbol(_)
        | AstKind::Enums(_) => Ok(Pretty::display()),
        AstKind::Tuple(tuple) => {
            let elements = derive_all(
                &tuple.elements.iter().map(|e| e.ast.clone()).collect::<Vec<_>>(),
                ctx,
            )?;
            let rest = tuple.rest.as_ref().map(|r| derive(r, ctx)).transpose()?;
            Ok(Pretty::new(move |value| {
                let Value::Array(items) = value else {
                    return value.to_string();
                };
                let parts: Vec<String> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match elements.get(i).or(rest.as_ref()) {
                        Some(pretty) => pretty.pretty(item),
                        None => item.to_string(),
                    })
                    .collect();
                format!("[{}]", parts.join(","))
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
            Ok(Pretty::new(move |value| {
                let Value::Object(map) = value else {
                    return value.to_string();
                };
                let mut parts = Vec::with_capacity(map.len());
                for (key, pretty) in &fields {
                    if let Some(field) = map.get(key) {
                        parts.push(format!("{}:{}", quote(key), pretty.pretty(field)));
                    }
                }
                for (key, field) in map.iter().filter(|(key, _)| !declared.contains(*key)) {
                    let key_value = Value::String(key.clone());
                    let rendered = match index_signatures.iter().find(|(k, _)| k.is(&key_value)) {
                        Some((_, pretty)) => pretty.pretty(field),
                        None => field.to_string(),
                    };
                    parts.push(format!("{}:{rendered}", quote(key)));
                }
                format!("{{{}}}", parts.join(","))
            }))
        }
        AstKind::Union(members) => {
            let mut candidates = Vec::with_capacity(members.len());
            for member in members {
                candidates.push((guard::derive(member, Side::Decoded, ctx)?, derive(member, ctx)?));
            }
            Ok(Pretty::new(move |value| {
                match candidates.iter().find(|(guard, _)| guard.is(value)) {
                    Some((_, pretty)) => pretty.pretty(value),
                    None => value.to_string(),
                }
            }))
        }
        AstKind::Refinement(refinement) => derive(&refinement.from, ctx),
        AstKind::Declaration(declaration) => {
            let constructor = ctx.constructor(declaration, ArtifactKind::Pretty, Provider::pretty)?;
            let params = derive_all(&declaration.type_parameters, ctx)?;
            Ok(constructor(&params))
        }
        AstKind::TypeAlias(alias) => match ast.annotations().pretty_hook() {
            Some(hook) => {
                let params = derive_all(&alias.type_parameters, ctx)?;
                Ok(hook(&params))
            }
            None => derive(&alias.expansion, ctx),
        },
        AstKind::Lazy(lazy) => {
            if let Some(pretty) = ctx.pretties.lookup(lazy.id) {
                return Ok(pretty);
            }
            let cell = ctx.pretties.begin(lazy.id);
            let resolved = ctx.resolve(lazy, ast);
            let derived = derive(&resolved, ctx);
            ctx.pretties.finish(lazy.id, cell, derived)
        }
    }
}
