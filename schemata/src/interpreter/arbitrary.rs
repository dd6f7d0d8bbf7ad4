use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use thiserror::Error;
use tracing::{trace, warn};

use super::guard::{self, Side};
use super::{Artifact, DeriveContext};
use crate::ast::{Ast, AstKind, Keyword, Severity};
use crate::config::ArbitraryConfig;
use crate::error::SchemaResult;
use crate::provider::{ArtifactKind, Provider};
use crate::value::{Object, Symbol, Value};

/// Why a generator could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("no value inhabits never")]
    Never,

    #[error("refinement `{name}` rejected {attempts} candidates")]
    RetryLimit { name: String, attempts: usize },

    #[error("nesting exceeded the depth limit of {limit}")]
    DepthLimit { limit: usize },

    #[error("recursive generator used before it was derived")]
    Unresolved,

    #[error("{0}")]
    Custom(String),
}

type GenerateFn = dyn Fn(&mut dyn RngCore, usize) -> Result<Value, GenerateError> + Send + Sync;

/// Generates values of a schema.
///
/// Generators take the nesting depth they are called at. Past the
/// configured soft depth they stop adding optional and repeated parts, which
/// keeps recursive schemas finite.
///
/// # Example
/// ```rust,ignore
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let arbitrary = schemata::arbitrary_for(&schema)?;
/// let values: Vec<_> = arbitrary.samples(StdRng::seed_from_u64(7)).take(10).collect();
/// ```
#[derive(Clone)]
pub struct Arbitrary {
    generate: Arc<GenerateFn>,
}

impl Arbitrary {
    pub fn new(
        f: impl Fn(&mut dyn RngCore, usize) -> Result<Value, GenerateError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            generate: Arc::new(f),
        }
    }

    pub fn constant(value: Value) -> Self {
        Self::new(move |_, _| Ok(value.clone()))
    }

    /// Generate one value at the root.
    pub fn generate(&self, rng: &mut dyn RngCore) -> Result<Value, GenerateError> {
        self.generate_at(rng, 0)
    }

    /// Generate one value at nesting `depth`.
    pub fn generate_at(&self, rng: &mut dyn RngCore, depth: usize) -> Result<Value, GenerateError> {
        (self.generate)(rng, depth)
    }

    /// Transform every generated value.
    #[must_use]
    pub fn map(&self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Arbitrary {
        let inner = self.clone();
        Arbitrary::new(move |rng, depth| inner.generate_at(rng, depth).map(&f))
    }

    /// An endless stream of values drawn from `rng`. Reseeding the
    /// generator reproduces the stream.
    pub fn samples<R: RngCore>(&self, rng: R) -> Samples<R> {
        Samples {
            arbitrary: self.clone(),
            rng,
        }
    }
}

impl fmt::Debug for Arbitrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Arbitrary { .. }")
    }
}

/// Iterator returned by [`Arbitrary::samples`].
pub struct Samples<R> {
    arbitrary: Arbitrary,
    rng: R,
}

impl<R: RngCore> Iterator for Samples<R> {
    type Item = Result<Value, GenerateError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.arbitrary.generate(&mut self.rng))
    }
}

impl Artifact for Arbitrary {
    fn deferred(cell: Weak<OnceLock<Self>>) -> Self {
        Arbitrary::new(move |rng, depth| match cell.upgrade() {
            Some(cell) => forward(&cell, rng, depth),
            None => Err(GenerateError::Unresolved),
        })
    }

    fn forwarding(cell: Arc<OnceLock<Self>>) -> Self {
        Arbitrary::new(move |rng, depth| forward(&cell, rng, depth))
    }
}

fn forward(
    cell: &OnceLock<Arbitrary>,
    rng: &mut dyn RngCore,
    depth: usize,
) -> Result<Value, GenerateError> {
    match cell.get() {
        Some(arbitrary) => arbitrary.generate_at(rng, depth),
        None => Err(GenerateError::Unresolved),
    }
}

fn string(rng: &mut dyn RngCore, max_length: usize) -> String {
    let length = rng.gen_range(0..=max_length);
    (0..length).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn number(rng: &mut dyn RngCore) -> f64 {
    if rng.gen_bool(0.5) {
        f64::from(rng.gen_range(-1000i32..=1000))
    } else {
        rng.gen_range(-1000.0..1000.0)
    }
}

fn scalar(rng: &mut dyn RngCore, limits: &ArbitraryConfig) -> Value {
    match rng.gen_range(0..4) {
        0 => Value::Null,
        1 => Value::Boolean(rng.gen()),
        2 => Value::Number(number(rng)),
        _ => Value::String(string(rng, limits.max_string_length)),
    }
}

fn keyword(keyword: Keyword, limits: ArbitraryConfig) -> Arbitrary {
    Arbitrary::new(move |rng, _| match keyword {
        Keyword::String => Ok(Value::String(string(rng, limits.max_string_length))),
        Keyword::Number => Ok(Value::Number(number(rng))),
        Keyword::Boolean => Ok(Value::Boolean(rng.gen())),
        Keyword::BigInt => Ok(Value::BigInt(i128::from(rng.gen::<i64>()))),
        Keyword::Symbol => Ok(Value::Symbol(Symbol::new(format!(
            "arbitrary-{}",
            rng.gen_range(0..100)
        )))),
        Keyword::Object => Ok(Value::Object(Object::new())),
        Keyword::Unknown | Keyword::Any => Ok(scalar(rng, &limits)),
        Keyword::Never => Err(GenerateError::Never),
        Keyword::Undefined | Keyword::Void => Ok(Value::Undefined),
    })
}

/// Whether every value of `ast` nests another lazy reference. Such union
/// members are tried last once generation is past the soft depth.
fn requires_recursion(ast: &Ast) -> bool {
    match ast.kind() {
        AstKind::Lazy(_) => true,
        AstKind::Tuple(tuple) => tuple
            .elements
            .iter()
            .any(|e| !e.is_optional && requires_recursion(&e.ast)),
        AstKind::Struct(s) => s
            .fields
            .iter()
            .any(|f| !f.is_optional && requires_recursion(&f.ast)),
        AstKind::Union(members) => members.iter().all(requires_recursion),
        AstKind::Refinement(refinement) => requires_recursion(&refinement.from),
        AstKind::TypeAlias(alias) => requires_recursion(&alias.expansion),
        _ => false,
    }
}

fn derive_all(asts: &[Ast], ctx: &mut DeriveContext<'_>) -> SchemaResult<Vec<Arbitrary>> {
    asts.iter().map(|ast| derive(ast, ctx)).collect()
}

fn check_depth(depth: usize, limits: &ArbitraryConfig) -> Result<(), GenerateError> {
    if depth >= limits.depth_limit {
        Err(GenerateError::DepthLimit {
            limit: limits.depth_limit,
        })
    } else {
        Ok(())
    }
}

pub(crate) fn derive(ast: &Ast, ctx: &mut DeriveContext<'_>) -> SchemaResult<Arbitrary> {
    let limits = ctx.config.arbitrary;
    match ast.kind() {
        AstKind::Literal(literal) => Ok(Arbitrary::constant(literal.to_value())),
        AstKind::Keyword(k) => Ok(keyword(*k, limits)),
        AstKind::UniqueSymbol(symbol) => Ok(Arbitrary::constant(Value::Symbol(symbol.clone()))),
        AstKind::Enums(members) => {
            let values: Vec<Value> = members.iter().map(|(_, l)| l.to_value()).collect();
            Ok(Arbitrary::new(move |rng, _| {
                values.choose(rng).cloned().ok_or(GenerateError::Never)
            }))
        }
        AstKind::Tuple(tuple) => {
            let mut elements = Vec::with_capacity(tuple.elements.len());
            for element in &tuple.elements {
                elements.push((derive(&element.ast, ctx)?, element.is_optional));
            }
            let rest = tuple.rest.as_ref().map(|r| derive(r, ctx)).transpose()?;
            Ok(Arbitrary::new(move |rng, depth| {
                check_depth(depth, &limits)?;
                let shallow = depth < limits.soft_depth;
                let mut items = Vec::new();
                let mut complete = true;
                for (arbitrary, optional) in &elements {
                    if *optional && !(shallow && rng.gen_bool(0.5)) {
                        // Later elements are optional too and must stay absent.
                        complete = false;
                        break;
                    }
                    items.push(arbitrary.generate_at(rng, depth + 1)?);
                }
                if let (true, Some(rest)) = (complete, &rest) {
                    let count = if shallow {
                        rng.gen_range(0..=limits.max_rest_length)
                    } else {
                        0
                    };
                    for _ in 0..count {
                        items.push(rest.generate_at(rng, depth + 1)?);
                    }
                }
                Ok(Value::Array(items))
            }))
        }
        AstKind::Struct(s) => {
            let mut fields = Vec::with_capacity(s.fields.len());
            for field in &s.fields {
                fields.push((field.key.clone(), derive(&field.ast, ctx)?, field.is_optional));
            }
            let declared: HashSet<String> = s.fields.iter().map(|f| f.key.clone()).collect();
            let mut key_guards = Vec::with_capacity(s.index_signatures.len());
            let mut index_signatures = Vec::with_capacity(s.index_signatures.len());
            for sig in &s.index_signatures {
                key_guards.push(guard::derive(&sig.key, Side::Decoded, ctx)?);
                index_signatures.push((derive(&sig.key, ctx)?, derive(&sig.value, ctx)?));
            }
            Ok(Arbitrary::new(move |rng, depth| {
                check_depth(depth, &limits)?;
                let shallow = depth < limits.soft_depth;
                let mut map = Object::new();
                for (key, arbitrary, optional) in &fields {
                    if *optional && !(shallow && rng.gen_bool(0.5)) {
                        continue;
                    }
                    map.insert(key.clone(), arbitrary.generate_at(rng, depth + 1)?);
                }
                for (index, (key_arbitrary, value_arbitrary)) in index_signatures.iter().enumerate() {
                    let count = if shallow {
                        rng.gen_range(0..=limits.max_rest_length)
                    } else {
                        0
                    };
                    for _ in 0..count {
                        let Value::String(key) = key_arbitrary.generate_at(rng, depth + 1)? else {
                            continue;
                        };
                        if declared.contains(&key) || map.contains_key(&key) {
                            continue;
                        }
                        // Only keys this signature will decode.
                        let key_value = Value::String(key.clone());
                        if key_guards.iter().position(|g| g.is(&key_value)) != Some(index) {
                            continue;
                        }
                        map.insert(key, value_arbitrary.generate_at(rng, depth + 1)?);
                    }
                }
                Ok(Value::Object(map))
            }))
        }
        AstKind::Union(members) => {
            let mut ordered: Vec<(bool, Arbitrary)> = Vec::with_capacity(members.len());
            for member in members {
                ordered.push((requires_recursion(member), derive(member, ctx)?));
            }
            let random: Vec<Arbitrary> = ordered.iter().map(|(_, a)| a.clone()).collect();
            ordered.sort_by_key(|(recursive, _)| *recursive);
            let deep: Vec<Arbitrary> = ordered.into_iter().map(|(_, a)| a).collect();
            Ok(Arbitrary::new(move |rng, depth| {
                if random.is_empty() {
                    return Err(GenerateError::Never);
                }
                let (start, candidates) = if depth < limits.soft_depth {
                    (rng.gen_range(0..random.len()), &random)
                } else {
                    (0, &deep)
                };
                let mut last = GenerateError::Never;
                for offset in 0..candidates.len() {
                    match candidates[(start + offset) % candidates.len()].generate_at(rng, depth) {
                        Ok(value) => return Ok(value),
                        Err(error) => last = error,
                    }
                }
                Err(last)
            }))
        }
        AstKind::Refinement(refinement) => {
            let from = derive(&refinement.from, ctx)?;
            let refinement = refinement.clone();
            Ok(Arbitrary::new(move |rng, depth| {
                for attempt in 1..=limits.refinement_retries {
                    let candidate = from.generate_at(rng, depth)?;
                    if refinement.severity == Severity::Warning || refinement.test(&candidate) {
                        return Ok(candidate);
                    }
                    trace!(name = %refinement.name, attempt, "Refinement rejected candidate");
                }
                warn!(
                    name = %refinement.name,
                    attempts = limits.refinement_retries,
                    "Giving up on refinement"
                );
                Err(GenerateError::RetryLimit {
                    name: refinement.name.clone(),
                    attempts: limits.refinement_retries,
                })
            }))
        }
        AstKind::Declaration(declaration) => {
            let constructor =
                ctx.constructor(declaration, ArtifactKind::Arbitrary, Provider::arbitrary)?;
            let params = derive_all(&declaration.type_parameters, ctx)?;
            Ok(constructor(&params))
        }
        AstKind::TypeAlias(alias) => match ast.annotations().arbitrary_hook() {
            Some(hook) => {
                let params = derive_all(&alias.type_parameters, ctx)?;
                Ok(hook(&params))
            }
            None => derive(&alias.expansion, ctx),
        },
        AstKind::Lazy(lazy) => {
            if let Some(arbitrary) = ctx.arbitraries.lookup(lazy.id) {
                return Ok(arbitrary);
            }
            let cell = ctx.arbitraries.begin(lazy.id);
            let resolved = ctx.resolve(lazy, ast);
            let derived = derive(&resolved, ctx);
            ctx.arbitraries.finish(lazy.id, cell, derived)
        }
    }
}
