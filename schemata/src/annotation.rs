//! Annotations attached to AST nodes.
//!
//! Annotations are ordered key/value metadata. Most are descriptive
//! (identifier, title, JSON-Schema fragments); the hook keys carry artifact
//! constructors that replace a [`TypeAlias`](crate::ast::TypeAlias)'s
//! structural derivation.

use std::fmt;
use std::sync::Arc;

use crate::interpreter::{Arbitrary, Decoder, Encoder, Guard, Pretty};
use crate::provider::{
    ArbitraryConstructor, DecoderConstructor, EncoderConstructor, GuardConstructor,
    PrettyConstructor,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationKey {
    /// Human-readable name, shown in type representations.
    Identifier,
    Title,
    Description,
    /// Replaces the default message of refinement errors.
    Message,
    Documentation,
    /// A JSON-Schema fragment describing the node.
    JsonSchema,
    Examples,
    DecoderHook,
    GuardHook,
    EncoderHook,
    PrettyHook,
    ArbitraryHook,
    Custom(String),
}

/// An artifact constructor stored as an annotation.
#[derive(Clone)]
pub enum Hook {
    Decoder(DecoderConstructor),
    Guard(GuardConstructor),
    Encoder(EncoderConstructor),
    Pretty(PrettyConstructor),
    Arbitrary(ArbitraryConstructor),
}

impl Hook {
    pub fn decoder(f: impl Fn(&[Decoder]) -> Decoder + Send + Sync + 'static) -> Self {
        Self::Decoder(Arc::new(f))
    }

    pub fn guard(f: impl Fn(&[Guard]) -> Guard + Send + Sync + 'static) -> Self {
        Self::Guard(Arc::new(f))
    }

    pub fn encoder(f: impl Fn(&[Encoder]) -> Encoder + Send + Sync + 'static) -> Self {
        Self::Encoder(Arc::new(f))
    }

    pub fn pretty(f: impl Fn(&[Pretty]) -> Pretty + Send + Sync + 'static) -> Self {
        Self::Pretty(Arc::new(f))
    }

    pub fn arbitrary(f: impl Fn(&[Arbitrary]) -> Arbitrary + Send + Sync + 'static) -> Self {
        Self::Arbitrary(Arc::new(f))
    }

    /// The annotation key this hook is stored under.
    pub fn key(&self) -> AnnotationKey {
        match self {
            Self::Decoder(_) => AnnotationKey::DecoderHook,
            Self::Guard(_) => AnnotationKey::GuardHook,
            Self::Encoder(_) => AnnotationKey::EncoderHook,
            Self::Pretty(_) => AnnotationKey::PrettyHook,
            Self::Arbitrary(_) => AnnotationKey::ArbitraryHook,
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({:?})", self.key())
    }
}

#[derive(Debug, Clone)]
pub enum AnnotationValue {
    Text(String),
    Json(serde_json::Value),
    Hook(Hook),
}

impl From<&str> for AnnotationValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<serde_json::Value> for AnnotationValue {
    fn from(json: serde_json::Value) -> Self {
        Self::Json(json)
    }
}

impl From<Hook> for AnnotationValue {
    fn from(hook: Hook) -> Self {
        Self::Hook(hook)
    }
}

/// Ordered annotation map. Setting an existing key replaces it in place.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    entries: Vec<(AnnotationKey, AnnotationValue)>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: AnnotationKey, value: impl Into<AnnotationValue>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_identifier(self, identifier: impl Into<String>) -> Self {
        self.with(AnnotationKey::Identifier, identifier.into())
    }

    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        self.with(AnnotationKey::Message, message.into())
    }

    #[must_use]
    pub fn with_hook(self, hook: Hook) -> Self {
        self.with(hook.key(), hook)
    }

    pub fn insert(&mut self, key: AnnotationKey, value: impl Into<AnnotationValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Entries of `other` win over entries of `self`.
    #[must_use]
    pub fn merge(mut self, other: &Annotations) -> Self {
        for (key, value) in &other.entries {
            self.insert(key.clone(), value.clone());
        }
        self
    }

    pub fn get(&self, key: &AnnotationKey) -> Option<&AnnotationValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn text(&self, key: &AnnotationKey) -> Option<&str> {
        match self.get(key) {
            Some(AnnotationValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn json(&self, key: &AnnotationKey) -> Option<&serde_json::Value> {
        match self.get(key) {
            Some(AnnotationValue::Json(json)) => Some(json),
            _ => None,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        self.text(&AnnotationKey::Identifier)
    }

    pub fn message(&self) -> Option<&str> {
        self.text(&AnnotationKey::Message)
    }

    pub fn decoder_hook(&self) -> Option<&DecoderConstructor> {
        match self.get(&AnnotationKey::DecoderHook) {
            Some(AnnotationValue::Hook(Hook::Decoder(f))) => Some(f),
            _ => None,
        }
    }

    pub fn guard_hook(&self) -> Option<&GuardConstructor> {
        match self.get(&AnnotationKey::GuardHook) {
            Some(AnnotationValue::Hook(Hook::Guard(f))) => Some(f),
            _ => None,
        }
    }

    pub fn encoder_hook(&self) -> Option<&EncoderConstructor> {
        match self.get(&AnnotationKey::EncoderHook) {
            Some(AnnotationValue::Hook(Hook::Encoder(f))) => Some(f),
            _ => None,
        }
    }

    pub fn pretty_hook(&self) -> Option<&PrettyConstructor> {
        match self.get(&AnnotationKey::PrettyHook) {
            Some(AnnotationValue::Hook(Hook::Pretty(f))) => Some(f),
            _ => None,
        }
    }

    pub fn arbitrary_hook(&self) -> Option<&ArbitraryConstructor> {
        match self.get(&AnnotationKey::ArbitraryHook) {
            Some(AnnotationValue::Hook(Hook::Arbitrary(f))) => Some(f),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AnnotationKey, &AnnotationValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_replaces_in_place() {
        let annotations = Annotations::new()
            .with_identifier("A")
            .with(AnnotationKey::JsonSchema, json!({"type": "string"}))
            .with_identifier("B");
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations.identifier(), Some("B"));
        let keys: Vec<_> = annotations.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![AnnotationKey::Identifier, AnnotationKey::JsonSchema]);
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = Annotations::new().with_identifier("A").with_message("m");
        let merged = base.merge(&Annotations::new().with_identifier("B"));
        assert_eq!(merged.identifier(), Some("B"));
        assert_eq!(merged.message(), Some("m"));
    }

    #[test]
    fn test_hooks_are_typed_by_key() {
        let annotations = Annotations::new().with_hook(Hook::pretty(|_| Pretty::new(|_| "x".into())));
        assert!(annotations.pretty_hook().is_some());
        assert!(annotations.decoder_hook().is_none());
        assert_eq!(annotations.text(&AnnotationKey::PrettyHook), None);
    }
}
