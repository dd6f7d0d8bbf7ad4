//! Artifact derivation.
//!
//! An [`Interpreter`] walks a schema and builds one artifact per call:
//!
//! | Method           | Artifact      | Purpose                                   |
//! |------------------|---------------|-------------------------------------------|
//! | `decoder_for`    | [`Decoder`]   | validate untrusted input, report errors   |
//! | `guard_for`      | [`Guard`]     | test if a value already has the type      |
//! | `encoder_for`    | [`Encoder`]   | project a value back to its wire shape    |
//! | `pretty_for`     | [`Pretty`]    | render a value                            |
//! | `arbitrary_for`  | [`Arbitrary`] | generate conforming values                |
//! | `optics_for`     | [`Optics`]    | lenses mirroring the schema's structure   |
//!
//! Each call gets a fresh derivation context, so artifacts derived from the
//! same schema never share state. Within a call, every lazy node is derived
//! once: a recursive reference seen while its own derivation is in progress
//! receives a deferred handle that forwards to the finished artifact.
//!
//! # Example
//! ```rust,ignore
//! use schemata::{Ast, Field, Interpreter, Value};
//!
//! let person = Ast::struct_(vec![Field::required("name", Ast::string())])?;
//! let decoder = Interpreter::new().decoder_for(&person)?;
//! assert!(decoder.decode(&Value::object([("name", Value::from("a"))])).is_success());
//! ```

mod arbitrary;
mod decoder;
mod encoder;
mod guard;
mod pretty;

pub use arbitrary::{Arbitrary, GenerateError, Samples};
pub use decoder::{DecodeResult, Decoder};
pub use encoder::Encoder;
pub use guard::Guard;
pub use pretty::Pretty;

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, OnceLock, Weak};

use tracing::trace;

use crate::ast::{Ast, Declaration, Lazy, LazyId};
use crate::config::SchemaConfig;
use crate::error::{SchemaError, SchemaResult};
use crate::optics::Optics;
use crate::provider::{ArtifactKind, Provider, ProviderRegistry};

pub(crate) use guard::Side;

// =============================================================================
// Memoization
// =============================================================================

/// An artifact that can stand in for itself before it exists.
pub(crate) trait Artifact: Clone + Send + Sync + 'static {
    /// Handle given to recursive references during derivation. Holds the
    /// cell weakly so the finished artifact does not keep itself alive.
    fn deferred(cell: Weak<OnceLock<Self>>) -> Self;

    /// Handle returned to callers once derivation finished.
    fn forwarding(cell: Arc<OnceLock<Self>>) -> Self;
}

enum Slot<A> {
    Pending(Arc<OnceLock<A>>),
    Ready(A),
}

/// Per-derivation cache of artifacts for lazy nodes.
pub(crate) struct Memo<K, A> {
    slots: HashMap<K, Slot<A>>,
}

impl<K, A> Default for Memo<K, A> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<K, A> Memo<K, A>
where
    K: Hash + Eq + Copy + fmt::Debug,
    A: Artifact,
{
    /// A finished artifact, or a deferred handle if derivation is underway.
    pub(crate) fn lookup(&self, key: K) -> Option<A> {
        match self.slots.get(&key)? {
            Slot::Ready(artifact) => {
                trace!(?key, "Memo hit");
                Some(artifact.clone())
            }
            Slot::Pending(cell) => {
                trace!(?key, "Recursive reference, deferring");
                Some(A::deferred(Arc::downgrade(cell)))
            }
        }
    }

    /// Mark `key` as in progress.
    pub(crate) fn begin(&mut self, key: K) -> Arc<OnceLock<A>> {
        let cell = Arc::new(OnceLock::new());
        self.slots.insert(key, Slot::Pending(Arc::clone(&cell)));
        cell
    }

    /// Complete (or abandon, on error) the derivation started by `begin`.
    pub(crate) fn finish(
        &mut self,
        key: K,
        cell: Arc<OnceLock<A>>,
        derived: SchemaResult<A>,
    ) -> SchemaResult<A> {
        match derived {
            Ok(artifact) => {
                // `begin` created the cell and only this call fills it.
                let _ = cell.set(artifact);
                let forwarding = A::forwarding(cell);
                self.slots.insert(key, Slot::Ready(forwarding.clone()));
                Ok(forwarding)
            }
            Err(error) => {
                self.slots.remove(&key);
                Err(error)
            }
        }
    }
}

/// Artifacts already derived for a node in this call, keyed by node identity.
///
/// Schemas share subtrees, and a union derives both an input guard and a
/// decoder for each member. Without this cache a nested schema would be
/// derived once per path reaching it. Each entry keeps its node alive so the
/// key cannot be reused by another allocation.
pub(crate) struct NodeCache<K, A> {
    entries: HashMap<(usize, K), (Ast, A)>,
}

impl<K, A> Default for NodeCache<K, A> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq, A: Clone> NodeCache<K, A> {
    pub(crate) fn get(&self, ast: &Ast, key: K) -> Option<A> {
        self.entries
            .get(&(ast.node_key(), key))
            .map(|(_, artifact)| artifact.clone())
    }

    pub(crate) fn insert(&mut self, ast: &Ast, key: K, artifact: A) {
        self.entries
            .insert((ast.node_key(), key), (ast.clone(), artifact));
    }
}

// =============================================================================
// Derivation Context
// =============================================================================

/// State for one derivation call.
pub(crate) struct DeriveContext<'a> {
    pub(crate) providers: &'a ProviderRegistry,
    pub(crate) config: &'a SchemaConfig,
    pub(crate) decoders: Memo<LazyId, Decoder>,
    pub(crate) guards: Memo<(LazyId, Side), Guard>,
    pub(crate) encoders: Memo<LazyId, Encoder>,
    pub(crate) pretties: Memo<LazyId, Pretty>,
    pub(crate) arbitraries: Memo<LazyId, Arbitrary>,
    pub(crate) node_decoders: NodeCache<(), Decoder>,
    pub(crate) node_guards: NodeCache<Side, Guard>,
    resolved: HashMap<LazyId, Ast>,
}

impl<'a> DeriveContext<'a> {
    pub(crate) fn new(providers: &'a ProviderRegistry, config: &'a SchemaConfig) -> Self {
        Self {
            providers,
            config,
            decoders: Memo::default(),
            guards: Memo::default(),
            encoders: Memo::default(),
            pretties: Memo::default(),
            arbitraries: Memo::default(),
            node_decoders: NodeCache::default(),
            node_guards: NodeCache::default(),
            resolved: HashMap::new(),
        }
    }

    /// The schema behind a lazy node. The thunk runs at most once per call,
    /// so every interpreter sees the same nodes for the same lazy.
    pub(crate) fn resolve(&mut self, lazy: &Lazy, this: &Ast) -> Ast {
        self.resolved
            .entry(lazy.id)
            .or_insert_with(|| lazy.resolve(this))
            .clone()
    }

    /// The constructor for `kind`, from the declaration's own provider or,
    /// failing that, from the registry.
    pub(crate) fn constructor<T: Clone>(
        &self,
        declaration: &Declaration,
        kind: ArtifactKind,
        select: fn(&Provider) -> Option<&T>,
    ) -> SchemaResult<T> {
        if let Some(constructor) = select(&declaration.provider) {
            return Ok(constructor.clone());
        }
        trace!(id = %declaration.id, %kind, "Looking up registry provider");
        self.providers
            .get(&declaration.id)
            .and_then(select)
            .cloned()
            .ok_or_else(|| SchemaError::MissingProvider {
                id: declaration.id.clone(),
                artifact: kind,
            })
    }
}

// =============================================================================
// Interpreter
// =============================================================================

/// Derives artifacts from schemas.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    providers: ProviderRegistry,
    config: SchemaConfig,
}

impl Interpreter {
    /// An interpreter with an empty registry and the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `providers` for declarations that carry none of their own.
    #[must_use]
    pub fn with_providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    /// Use `config` for every later derivation.
    #[must_use]
    pub fn with_config(mut self, config: SchemaConfig) -> Self {
        self.config = config;
        self
    }

    /// The registry consulted for declarations.
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Mutable access to the registry, for registering after construction.
    pub fn providers_mut(&mut self) -> &mut ProviderRegistry {
        &mut self.providers
    }

    /// The active configuration.
    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    fn context(&self) -> DeriveContext<'_> {
        DeriveContext::new(&self.providers, &self.config)
    }

    /// Derive a decoder for `ast`.
    #[tracing::instrument(level = "debug", skip_all, fields(node = ast.tag()))]
    pub fn decoder_for(&self, ast: &Ast) -> SchemaResult<Decoder> {
        decoder::derive(ast, &mut self.context())
    }

    /// Derive a guard for decoded values of `ast`.
    #[tracing::instrument(level = "debug", skip_all, fields(node = ast.tag()))]
    pub fn guard_for(&self, ast: &Ast) -> SchemaResult<Guard> {
        guard::derive(ast, Side::Decoded, &mut self.context())
    }

    /// A guard for the *input* side of the schema: it accepts what the
    /// decoder accepts rather than what the decoder produces.
    #[tracing::instrument(level = "debug", skip_all, fields(node = ast.tag()))]
    pub fn input_guard_for(&self, ast: &Ast) -> SchemaResult<Guard> {
        guard::derive(ast, Side::Input, &mut self.context())
    }

    /// Derive an encoder for `ast`.
    #[tracing::instrument(level = "debug", skip_all, fields(node = ast.tag()))]
    pub fn encoder_for(&self, ast: &Ast) -> SchemaResult<Encoder> {
        encoder::derive(ast, &mut self.context())
    }

    /// Derive a printer for `ast`.
    #[tracing::instrument(level = "debug", skip_all, fields(node = ast.tag()))]
    pub fn pretty_for(&self, ast: &Ast) -> SchemaResult<Pretty> {
        pretty::derive(ast, &mut self.context())
    }

    /// Derive a generator for `ast`. Declarations need an arbitrary provider.
    #[tracing::instrument(level = "debug", skip_all, fields(node = ast.tag()))]
    pub fn arbitrary_for(&self, ast: &Ast) -> SchemaResult<Arbitrary> {
        arbitrary::derive(ast, &mut self.context())
    }

    /// Lenses for every field and element reachable in `ast`.
    pub fn optics_for(&self, ast: &Ast) -> Optics {
        crate::optics::optics_for(ast)
    }
}

/// Derive a decoder with no registry and the default configuration.
pub fn decoder_for(ast: &Ast) -> SchemaResult<Decoder> {
    Interpreter::new().decoder_for(ast)
}

/// Derive a guard with no registry and the default configuration.
pub fn guard_for(ast: &Ast) -> SchemaResult<Guard> {
    Interpreter::new().guard_for(ast)
}

/// Derive an encoder with no registry and the default configuration.
pub fn encoder_for(ast: &Ast) -> SchemaResult<Encoder> {
    Interpreter::new().encoder_for(ast)
}

/// Derive a printer with no registry and the default configuration.
pub fn pretty_for(ast: &Ast) -> SchemaResult<Pretty> {
    Interpreter::new().pretty_for(ast)
}

/// Derive a generator with no registry and the default configuration.
pub fn arbitrary_for(ast: &Ast) -> SchemaResult<Arbitrary> {
    Interpreter::new().arbitrary_for(ast)
}
