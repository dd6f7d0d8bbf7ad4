//! Providers for opaque declarations.
//!
//! A [`Declaration`](crate::ast::Declaration) names a type the engine cannot
//! see into. Each artifact for it comes from a constructor that receives the
//! artifacts already derived for the declaration's type parameters.
//! Constructors are looked up on the node's own [`Provider`] first; a
//! [`ProviderRegistry`] handed to the [`Interpreter`](crate::Interpreter)
//! fills the entries the node leaves empty.
//!
//! # Example
//! ```rust,ignore
//! use schemata::{Decoder, DeclarationId, Provider, ProviderRegistry};
//!
//! let provider = Provider::new().with_decoder(|params: &[Decoder]| params[0].clone());
//! let mut registry = ProviderRegistry::new();
//! registry.register(DeclarationId::new("Box"), provider);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::interpreter::{Arbitrary, Decoder, Encoder, Guard, Pretty};

/// Builds a decoder from the type parameters' decoders.
pub type DecoderConstructor = Arc<dyn Fn(&[Decoder]) -> Decoder + Send + Sync>;
/// Builds a guard from the type parameters' guards.
pub type GuardConstructor = Arc<dyn Fn(&[Guard]) -> Guard + Send + Sync>;
/// Builds an encoder from the type parameters' encoders.
pub type EncoderConstructor = Arc<dyn Fn(&[Encoder]) -> Encoder + Send + Sync>;
/// Builds a printer from the type parameters' printers.
pub type PrettyConstructor = Arc<dyn Fn(&[Pretty]) -> Pretty + Send + Sync>;
/// Builds a generator from the type parameters' generators.
pub type ArbitraryConstructor = Arc<dyn Fn(&[Arbitrary]) -> Arbitrary + Send + Sync>;

/// Identity of a declared type. Two ids are equal when their text is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclarationId(Arc<str>);

impl DeclarationId {
    /// Create an id from its text.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// The id's text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeclarationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The kinds of artifact derivable from a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Decoder,
    Guard,
    Encoder,
    Pretty,
    Arbitrary,
}

impl ArtifactKind {
    /// Lower-case name used in messages and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decoder => "decoder",
            Self::Guard => "guard",
            Self::Encoder => "encoder",
            Self::Pretty => "pretty",
            Self::Arbitrary => "arbitrary",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artifact constructors for one declared type. Every entry is optional.
#[derive(Clone, Default)]
pub struct Provider {
    decoder: Option<DecoderConstructor>,
    guard: Option<GuardConstructor>,
    encoder: Option<EncoderConstructor>,
    pretty: Option<PrettyConstructor>,
    arbitrary: Option<ArbitraryConstructor>,
}

impl Provider {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_decoder<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Decoder]) -> Decoder + Send + Sync + 'static,
    {
        self.decoder = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_guard<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Guard]) -> Guard + Send + Sync + 'static,
    {
        self.guard = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_encoder<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Encoder]) -> Encoder + Send + Sync + 'static,
    {
        self.encoder = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_pretty<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Pretty]) -> Pretty + Send + Sync + 'static,
    {
        self.pretty = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_arbitrary<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Arbitrary]) -> Arbitrary + Send + Sync + 'static,
    {
        self.arbitrary = Some(Arc::new(f));
        self
    }

    pub fn decoder(&self) -> Option<&DecoderConstructor> {
        self.decoder.as_ref()
    }

    pub fn guard(&self) -> Option<&GuardConstructor> {
        self.guard.as_ref()
    }

    pub fn encoder(&self) -> Option<&EncoderConstructor> {
        self.encoder.as_ref()
    }

    pub fn pretty(&self) -> Option<&PrettyConstructor> {
        self.pretty.as_ref()
    }

    pub fn arbitrary(&self) -> Option<&ArbitraryConstructor> {
        self.arbitrary.as_ref()
    }

    /// Which artifacts this provider can build.
    pub fn kinds(&self) -> Vec<ArtifactKind> {
        [
            (self.decoder.is_some(), ArtifactKind::Decoder),
            (self.guard.is_some(), ArtifactKind::Guard),
            (self.encoder.is_some(), ArtifactKind::Encoder),
            (self.pretty.is_some(), ArtifactKind::Pretty),
            (self.arbitrary.is_some(), ArtifactKind::Arbitrary),
        ]
        .into_iter()
        .filter_map(|(present, kind)| present.then_some(kind))
        .collect()
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Providers keyed by declaration id.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<DeclarationId, Provider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the provider for `id`.
    pub fn register(&mut self, id: impl Into<DeclarationId>, provider: Provider) -> &mut Self {
        let id = id.into();
        tracing::debug!(id = %id, kinds = ?provider.kinds(), "Registering provider");
        self.providers.insert(id, provider);
        self
    }

    #[must_use]
    pub fn with(mut self, id: impl Into<DeclarationId>, provider: Provider) -> Self {
        self.register(id, provider);
        self
    }

    pub fn get(&self, id: &DeclarationId) -> Option<&Provider> {
        self.providers.get(id)
    }

    pub fn contains(&self, id: &DeclarationId) -> bool {
        self.providers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_reports_kinds() {
        let provider = Provider::new()
            .with_guard(|_: &[Guard]| Guard::new(|_| true))
            .with_pretty(|_: &[Pretty]| Pretty::new(|_| String::new()));
        assert_eq!(provider.kinds(), vec![ArtifactKind::Guard, ArtifactKind::Pretty]);
        assert!(provider.decoder().is_none());
    }

    #[test]
    fn test_registry_replaces_entries() {
        let mut registry = ProviderRegistry::new();
        registry.register("A", Provider::new());
        registry.register("A", Provider::new().with_guard(|_: &[Guard]| Guard::new(|_| false)));
        assert_eq!(registry.len(), 1);
        let provider = registry.get(&DeclarationId::new("A")).unwrap();
        assert!(provider.guard().is_some());
    }

    #[test]
    fn test_declaration_ids_compare_by_text() {
        let owned = DeclarationId::new(String::from("Option"));
        let borrowed = DeclarationId::from("Option");
        assert_eq!(owned, borrowed);
        assert_eq!(owned.as_str(), "Option");
        assert_eq!(owned.to_string(), "Option");

        let registry = ProviderRegistry::new().with(owned, Provider::new());
        assert!(registry.contains(&borrowed));
    }

    #[test]
    fn test_artifact_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ArtifactKind::Arbitrary).unwrap(),
            serde_json::json!("arbitrary")
        );
        let kind: ArtifactKind = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(kind, ArtifactKind::Pretty);
    }
}
