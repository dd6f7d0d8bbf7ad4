//! Schema AST.
//!
//! A schema is an immutable tree of [`Ast`] nodes. Nodes are reference
//! counted and shared freely; every combinator returns a new node. Recursion
//! is expressed with [`Ast::lazy`], whose thunk receives the lazy node
//! itself:
//!
//! ```rust,ignore
//! use schemata::{Ast, Field};
//!
//! // interface Category { name: string; subcategories: Category[] }
//! let category = Ast::lazy(|this| {
//!     Ast::struct_(vec![
//!         Field::required("name", Ast::string()),
//!         Field::required("subcategories", Ast::array(this.clone())),
//!     ])
//!     .unwrap_or_else(|_| Ast::never())
//! });
//! ```

mod combinators;
mod display;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::annotation::{AnnotationKey, AnnotationValue, Annotations};
use crate::error::{SchemaError, SchemaResult};
use crate::provider::{DeclarationId, Provider};
use crate::value::{format_number, quote, Symbol, Value};

// =============================================================================
// Leaf Types
// =============================================================================

/// A literal value a schema can require exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    BigInt(i128),
    String(String),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Boolean(b) => Value::Boolean(*b),
            Self::Number(n) => Value::Number(*n),
            Self::BigInt(n) => Value::BigInt(*n),
            Self::String(s) => Value::String(s.clone()),
        }
    }

    /// Strict equality against a runtime value.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Null, Value::Null) => true,
            (Self::Boolean(a), Value::Boolean(b)) => a == b,
            (Self::Number(a), Value::Number(b)) => a == b,
            (Self::BigInt(a), Value::BigInt(b)) => a == b,
            (Self::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::BigInt(n) => write!(f, "{n}n"),
            Self::String(s) => f.write_str(&quote(s)),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    String,
    Number,
    Boolean,
    BigInt,
    Symbol,
    /// Any non-primitive: arrays, objects and sets.
    Object,
    Unknown,
    Any,
    Never,
    Undefined,
    Void,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::BigInt => "bigint",
            Self::Symbol => "symbol",
            Self::Object => "object",
            Self::Unknown => "unknown",
            Self::Any => "any",
            Self::Never => "never",
            Self::Undefined => "undefined",
            Self::Void => "void",
        }
    }
}

/// A tuple element.
#[derive(Debug, Clone)]
pub struct Element {
    pub ast: Ast,
    pub is_optional: bool,
}

impl Element {
    pub fn required(ast: Ast) -> Self {
        Self {
            ast,
            is_optional: false,
        }
    }

    pub fn optional(ast: Ast) -> Self {
        Self {
            ast,
            is_optional: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tuple {
    pub elements: Vec<Element>,
    pub rest: Option<Ast>,
    pub allow_unexpected: bool,
}

/// A named struct field.
#[derive(Debug, Clone)]
pub struct Field {
    pub key: String,
    pub ast: Ast,
    pub is_optional: bool,
    pub is_readonly: bool,
}

impl Field {
    pub fn required(key: impl Into<String>, ast: Ast) -> Self {
        Self {
            key: key.into(),
            ast,
            is_optional: false,
            is_readonly: true,
        }
    }

    pub fn optional(key: impl Into<String>, ast: Ast) -> Self {
        Self {
            key: key.into(),
            ast,
            is_optional: true,
            is_readonly: true,
        }
    }

    #[must_use]
    pub fn mutable(mut self) -> Self {
        self.is_readonly = false;
        self
    }
}

/// `[key: K]: V` entries of a struct.
#[derive(Debug, Clone)]
pub struct IndexSignature {
    pub key: Ast,
    pub value: Ast,
}

#[derive(Debug, Clone)]
pub struct Struct {
    pub fields: Vec<Field>,
    pub index_signatures: Vec<IndexSignature>,
    pub allow_unexpected: bool,
}

impl Struct {
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// Whether a failed refinement blocks the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Report the violation, keep the value.
    Warning,
    #[default]
    Failure,
}

pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Refinement {
    pub from: Ast,
    pub name: String,
    pub meta: serde_json::Value,
    pub predicate: Predicate,
    pub severity: Severity,
}

impl Refinement {
    pub fn test(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("from", &self.from)
            .field("name", &self.name)
            .field("meta", &self.meta)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: DeclarationId,
    pub type_parameters: Vec<Ast>,
    pub provider: Provider,
}

#[derive(Debug, Clone)]
pub struct TypeAlias {
    pub type_parameters: Vec<Ast>,
    pub expansion: Ast,
}

/// Identity of a lazy node, used to memoize recursive derivations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LazyId(u64);

impl LazyId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

pub type Thunk = Arc<dyn Fn(&Ast) -> Ast + Send + Sync>;

#[derive(Clone)]
pub struct Lazy {
    pub id: LazyId,
    thunk: Thunk,
}

impl Lazy {
    /// Produce the deferred schema. `this` must be the node holding `self`.
    pub fn resolve(&self, this: &Ast) -> Ast {
        (self.thunk)(this)
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy").field("id", &self.id).finish_non_exhaustive()
    }
}

// =============================================================================
// AST
// =============================================================================

#[derive(Debug, Clone)]
pub enum AstKind {
    Literal(Literal),
    Keyword(Keyword),
    UniqueSymbol(Symbol),
    Enums(Vec<(String, Literal)>),
    Tuple(Tuple),
    Struct(Struct),
    Union(Vec<Ast>),
    Refinement(Refinement),
    Declaration(Declaration),
    TypeAlias(TypeAlias),
    Lazy(Lazy),
}

#[derive(Debug)]
struct Node {
    kind: AstKind,
    annotations: Annotations,
}

/// A schema node.
#[derive(Debug, Clone)]
pub struct Ast(Arc<Node>);

impl Ast {
    pub fn new(kind: AstKind) -> Self {
        Self::with_annotations(kind, Annotations::new())
    }

    pub fn with_annotations(kind: AstKind, annotations: Annotations) -> Self {
        Self(Arc::new(Node { kind, annotations }))
    }

    pub fn kind(&self) -> &AstKind {
        &self.0.kind
    }

    pub fn annotations(&self) -> &Annotations {
        &self.0.annotations
    }

    /// Short name of the node kind, used in errors and traces.
    pub fn tag(&self) -> &'static str {
        match self.kind() {
            AstKind::Literal(_) => "literal",
            AstKind::Keyword(_) => "keyword",
            AstKind::UniqueSymbol(_) => "unique symbol",
            AstKind::Enums(_) => "enums",
            AstKind::Tuple(_) => "tuple",
            AstKind::Struct(_) => "struct",
            AstKind::Union(_) => "union",
            AstKind::Refinement(_) => "refinement",
            AstKind::Declaration(_) => "declaration",
            AstKind::TypeAlias(_) => "type alias",
            AstKind::Lazy(_) => "lazy",
        }
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &Ast) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the shared node, stable while any handle is alive.
    pub(crate) fn node_key(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// A copy of this node with one more annotation.
    #[must_use]
    pub fn annotate(&self, key: AnnotationKey, value: impl Into<AnnotationValue>) -> Ast {
        let annotations = self.annotations().clone().with(key, value);
        Ast::with_annotations(self.kind().clone(), annotations)
    }

    /// A copy of this node with `annotations` merged over its own.
    #[must_use]
    pub fn annotate_all(&self, annotations: &Annotations) -> Ast {
        let merged = self.annotations().clone().merge(annotations);
        Ast::with_annotations(self.kind().clone(), merged)
    }

    /// Name the schema. The identifier replaces the structural type rep.
    #[must_use]
    pub fn identified(&self, identifier: impl Into<String>) -> Ast {
        self.annotate(AnnotationKey::Identifier, identifier.into())
    }

    // -------------------------------------------------------------------------
    // Leaves
    // -------------------------------------------------------------------------

    /// A single literal value.
    pub fn literal(literal: impl Into<Literal>) -> Ast {
        Ast::new(AstKind::Literal(literal.into()))
    }

    /// The `null` literal.
    pub fn null() -> Ast {
        Ast::new(AstKind::Literal(Literal::Null))
    }

    /// A primitive or top/bottom type.
    pub fn keyword(keyword: Keyword) -> Ast {
        Ast::new(AstKind::Keyword(keyword))
    }

    /// `string`.
    pub fn string() -> Ast {
        Ast::keyword(Keyword::String)
    }

    /// `number`. NaN and infinities decode with a warning.
    pub fn number() -> Ast {
        Ast::keyword(Keyword::Number)
    }

    /// `boolean`.
    pub fn boolean() -> Ast {
        Ast::keyword(Keyword::Boolean)
    }

    /// `bigint`.
    pub fn bigint() -> Ast {
        Ast::keyword(Keyword::BigInt)
    }

    /// Any symbol.
    pub fn symbol() -> Ast {
        Ast::keyword(Keyword::Symbol)
    }

    /// `object`: arrays, objects and sets.
    pub fn object() -> Ast {
        Ast::keyword(Keyword::Object)
    }

    /// Accepts every value.
    pub fn unknown() -> Ast {
        Ast::keyword(Keyword::Unknown)
    }

    /// Accepts every value, like `unknown`.
    pub fn any() -> Ast {
        Ast::keyword(Keyword::Any)
    }

    /// Accepts nothing.
    pub fn never() -> Ast {
        Ast::keyword(Keyword::Never)
    }

    /// `undefined`.
    pub fn undefined() -> Ast {
        Ast::keyword(Keyword::Undefined)
    }

    /// `void`, decoded like `undefined`.
    pub fn void() -> Ast {
        Ast::keyword(Keyword::Void)
    }

    /// Exactly `symbol`, compared by description.
    pub fn unique_symbol(symbol: Symbol) -> Ast {
        Ast::new(AstKind::UniqueSymbol(symbol))
    }

    /// A TypeScript-style enum: named string or number members.
    pub fn enums<K, I>(members: I) -> Ast
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Literal)>,
    {
        Ast::new(AstKind::Enums(
            members.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    // -------------------------------------------------------------------------
    // Composites
    // -------------------------------------------------------------------------

    /// A closed tuple.
    ///
    /// Fails if a required element follows an optional one.
    pub fn tuple(elements: Vec<Element>) -> SchemaResult<Ast> {
        Ast::tuple_with(elements, None, false)
    }

    pub fn tuple_with(
        elements: Vec<Element>,
        rest: Option<Ast>,
        allow_unexpected: bool,
    ) -> SchemaResult<Ast> {
        check_element_order(&elements)?;
        Ok(Ast::new(AstKind::Tuple(Tuple {
            elements,
            rest,
            allow_unexpected,
        })))
    }

    /// A closed struct.
    ///
    /// Fails if two fields share a key.
    pub fn struct_(fields: Vec<Field>) -> SchemaResult<Ast> {
        Ast::struct_with(fields, Vec::new(), false)
    }

    pub fn struct_with(
        fields: Vec<Field>,
        index_signatures: Vec<IndexSignature>,
        allow_unexpected: bool,
    ) -> SchemaResult<Ast> {
        check_unique_keys(&fields)?;
        Ok(Ast::new(AstKind::Struct(Struct {
            fields,
            index_signatures,
            allow_unexpected,
        })))
    }

    /// A union, normalized.
    ///
    /// Nested unions are flattened, an empty union is `never` and a single
    /// member is returned as is.
    pub fn union(members: impl IntoIterator<Item = Ast>) -> Ast {
        let mut flat = Vec::new();
        for member in members {
            match member.kind() {
                AstKind::Union(nested) => flat.extend(nested.iter().cloned()),
                _ => flat.push(member),
            }
        }
        match flat.len() {
            0 => Ast::never(),
            1 => flat.remove(0),
            _ => Ast::new(AstKind::Union(flat)),
        }
    }

    /// Narrow `from` with a predicate that blocks failing values.
    pub fn refinement<F>(
        from: Ast,
        name: impl Into<String>,
        meta: serde_json::Value,
        predicate: F,
    ) -> Ast
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Ast::refinement_with_severity(from, name, meta, predicate, Severity::Failure)
    }

    pub fn refinement_with_severity<F>(
        from: Ast,
        name: impl Into<String>,
        meta: serde_json::Value,
        predicate: F,
        severity: Severity,
    ) -> Ast
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Ast::new(AstKind::Refinement(Refinement {
            from,
            name: name.into(),
            meta,
            predicate: Arc::new(predicate),
            severity,
        }))
    }

    /// An opaque type whose artifacts come from `provider` or a registry.
    pub fn declaration(
        id: impl Into<DeclarationId>,
        type_parameters: Vec<Ast>,
        provider: Provider,
    ) -> Ast {
        Ast::new(AstKind::Declaration(Declaration {
            id: id.into(),
            type_parameters,
            provider,
        }))
    }

    /// A named expansion. Hook annotations override the structural
    /// derivation of individual artifacts.
    pub fn type_alias(
        type_parameters: Vec<Ast>,
        expansion: Ast,
        annotations: Annotations,
    ) -> Ast {
        Ast::with_annotations(
            AstKind::TypeAlias(TypeAlias {
                type_parameters,
                expansion,
            }),
            annotations,
        )
    }

    /// A deferred node for recursive schemas. The thunk receives the lazy
    /// node itself.
    pub fn lazy<F>(thunk: F) -> Ast
    where
        F: Fn(&Ast) -> Ast + Send + Sync + 'static,
    {
        Ast::new(AstKind::Lazy(Lazy {
            id: LazyId::next(),
            thunk: Arc::new(thunk),
        }))
    }
}

fn check_element_order(elements: &[Element]) -> SchemaResult<()> {
    let mut seen_optional = false;
    for (index, element) in elements.iter().enumerate() {
        if element.is_optional {
            seen_optional = true;
        } else if seen_optional {
            return Err(SchemaError::RequiredAfterOptional { index });
        }
    }
    Ok(())
}

fn check_unique_keys(fields: &[Field]) -> SchemaResult<()> {
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|f| f.key == field.key) {
            return Err(SchemaError::DuplicateKey(field.key.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_normalization() {
        assert!(matches!(
            Ast::union(Vec::new()).kind(),
            AstKind::Keyword(Keyword::Never)
        ));

        let single = Ast::string();
        assert!(Ast::union(vec![single.clone()]).ptr_eq(&single));

        let nested = Ast::union(vec![Ast::string(), Ast::number()]);
        let flat = Ast::union(vec![nested, Ast::boolean()]);
        match flat.kind() {
            AstKind::Union(members) => assert_eq!(members.len(), 3),
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn test_tuple_rejects_required_after_optional() {
        let result = Ast::tuple(vec![
            Element::optional(Ast::string()),
            Element::required(Ast::number()),
        ]);
        assert!(matches!(
            result,
            Err(SchemaError::RequiredAfterOptional { index: 1 })
        ));
    }

    #[test]
    fn test_struct_rejects_duplicate_keys() {
        let result = Ast::struct_(vec![
            Field::required("a", Ast::string()),
            Field::optional("a", Ast::number()),
        ]);
        assert!(matches!(result, Err(SchemaError::DuplicateKey(key)) if key == "a"));
    }

    #[test]
    fn test_lazy_ids_are_distinct() {
        let a = Ast::lazy(|_| Ast::string());
        let b = Ast::lazy(|_| Ast::string());
        match (a.kind(), b.kind()) {
            (AstKind::Lazy(a), AstKind::Lazy(b)) => assert_ne!(a.id, b.id),
            _ => panic!("expected lazy nodes"),
        }
    }

    #[test]
    fn test_annotate_copies_node() {
        let base = Ast::string();
        let named = base.identified("Name");
        assert_eq!(named.annotations().identifier(), Some("Name"));
        assert!(base.annotations().is_empty());
    }

    #[test]
    fn test_literal_matching_is_strict() {
        assert!(Literal::from(1).matches(&Value::from(1)));
        assert!(!Literal::from(1).matches(&Value::from("1")));
        assert!(!Literal::Number(f64::NAN).matches(&Value::Number(f64::NAN)));
    }
}
