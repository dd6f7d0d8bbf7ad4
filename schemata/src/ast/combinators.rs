//! Combinators that derive new schemas from existing ones.

use std::collections::HashSet;

use super::{Ast, AstKind, Element, Field, IndexSignature, LazyId, Literal, Struct, Tuple};
use crate::error::{SchemaError, SchemaResult};

impl Ast {
    /// `ReadonlyArray<item>`.
    pub fn array(item: Ast) -> Ast {
        Ast::new(AstKind::Tuple(Tuple {
            elements: Vec::new(),
            rest: Some(item),
            allow_unexpected: false,
        }))
    }

    /// An array with at least one `item`.
    pub fn non_empty_array(item: Ast) -> Ast {
        Ast::new(AstKind::Tuple(Tuple {
            elements: vec![Element::required(item.clone())],
            rest: Some(item),
            allow_unexpected: false,
        }))
    }

    /// `{ readonly [x: key]: value }`.
    pub fn record(key: Ast, value: Ast) -> Ast {
        Ast::new(AstKind::Struct(Struct {
            fields: Vec::new(),
            index_signatures: vec![IndexSignature { key, value }],
            allow_unexpected: false,
        }))
    }

    /// `self | null`.
    pub fn nullable(&self) -> Ast {
        Ast::union(vec![self.clone(), Ast::null()])
    }

    /// Union of literals.
    pub fn literals(literals: impl IntoIterator<Item = Literal>) -> Ast {
        Ast::union(literals.into_iter().map(Ast::literal))
    }

    /// Fields visible on this schema.
    ///
    /// Structs report their fields. Unions report the keys common to every
    /// member, typed as the union of the member types and optional if any
    /// member has them optional. Refinements, aliases and lazy nodes report
    /// the fields of what they wrap. Everything else has none.
    ///
    /// A union member that only leads back to a lazy node being resolved is
    /// skipped.
    pub fn fields(&self) -> Vec<Field> {
        self.fields_within(&mut HashSet::new()).unwrap_or_default()
    }

    /// `None` when the node only reaches a lazy node already in `resolving`.
    fn fields_within(&self, resolving: &mut HashSet<LazyId>) -> Option<Vec<Field>> {
        match self.kind() {
            AstKind::Struct(s) => Some(s.fields.clone()),
            AstKind::Refinement(r) => r.from.fields_within(resolving),
            AstKind::TypeAlias(alias) => alias.expansion.fields_within(resolving),
            AstKind::Lazy(lazy) => {
                if !resolving.insert(lazy.id) {
                    return None;
                }
                let fields = lazy.resolve(self).fields_within(resolving);
                resolving.remove(&lazy.id);
                fields
            }
            AstKind::Union(members) => {
                let per_member: Vec<Vec<Field>> = members
                    .iter()
                    .filter_map(|member| member.fields_within(resolving))
                    .collect();
                let (first, others) = per_member.split_first()?;
                Some(
                    first
                        .iter()
                        .filter_map(|field| {
                            let mut matching = vec![field.clone()];
                            for other in others {
                                matching.push(other.iter().find(|f| f.key == field.key)?.clone());
                            }
                            Some(Field {
                                key: field.key.clone(),
                                ast: Ast::union(matching.iter().map(|f| f.ast.clone())),
                                is_optional: matching.iter().any(|f| f.is_optional),
                                is_readonly: matching.iter().all(|f| f.is_readonly),
                            })
                        })
                        .collect(),
                )
            }
            _ => Some(Vec::new()),
        }
    }

    /// A struct of only the named fields.
    pub fn pick(&self, keys: &[&str]) -> SchemaResult<Ast> {
        let fields = self.fields_for("pick")?;
        Ast::struct_(
            fields
                .into_iter()
                .filter(|f| keys.contains(&f.key.as_str()))
                .collect(),
        )
    }

    /// A struct without the named fields. Index signatures of a struct are
    /// kept.
    pub fn omit(&self, keys: &[&str]) -> SchemaResult<Ast> {
        let index_signatures = match self.kind() {
            AstKind::Struct(s) => s.index_signatures.clone(),
            _ => Vec::new(),
        };
        let fields = self.fields_for("omit")?;
        Ast::struct_with(
            fields
                .into_iter()
                .filter(|f| !keys.contains(&f.key.as_str()))
                .collect(),
            index_signatures,
            false,
        )
    }

    /// Every field or element becomes optional.
    ///
    /// A lazy node that resolves back to itself without passing through a
    /// struct or tuple is unsupported.
    pub fn partial(&self) -> SchemaResult<Ast> {
        self.partial_within(&mut HashSet::new())
    }

    fn partial_within(&self, resolving: &mut HashSet<LazyId>) -> SchemaResult<Ast> {
        match self.kind() {
            AstKind::Struct(s) => Ast::struct_with(
                s.fields
                    .iter()
                    .map(|f| Field {
                        is_optional: true,
                        ..f.clone()
                    })
                    .collect(),
                s.index_signatures.clone(),
                s.allow_unexpected,
            ),
            AstKind::Tuple(t) => Ast::tuple_with(
                t.elements
                    .iter()
                    .map(|e| Element::optional(e.ast.clone()))
                    .collect(),
                t.rest.clone(),
                t.allow_unexpected,
            ),
            AstKind::Union(members) => Ok(Ast::union(
                members
                    .iter()
                    .map(|member| member.partial_within(resolving))
                    .collect::<SchemaResult<Vec<_>>>()?,
            )),
            AstKind::Lazy(lazy) => {
                if !resolving.insert(lazy.id) {
                    return Err(self.unsupported("partial"));
                }
                let partial = lazy.resolve(self).partial_within(resolving);
                resolving.remove(&lazy.id);
                partial
            }
            _ => Err(self.unsupported("partial")),
        }
    }

    /// Merge the fields of two structs. Fails on a shared key.
    pub fn extend(&self, that: &Ast) -> SchemaResult<Ast> {
        match (self.kind(), that.kind()) {
            (AstKind::Struct(a), AstKind::Struct(b)) => {
                let mut fields = a.fields.clone();
                fields.extend(b.fields.iter().cloned());
                let mut index_signatures = a.index_signatures.clone();
                index_signatures.extend(b.index_signatures.iter().cloned());
                Ast::struct_with(fields, index_signatures, a.allow_unexpected)
            }
            (AstKind::Struct(_), _) => Err(that.unsupported("extend")),
            _ => Err(self.unsupported("extend")),
        }
    }

    /// Append an element to a tuple.
    pub fn append_element(&self, element: Element) -> SchemaResult<Ast> {
        match self.kind() {
            AstKind::Tuple(t) if t.rest.is_none() => {
                let mut elements = t.elements.clone();
                elements.push(element);
                Ast::tuple_with(elements, None, t.allow_unexpected)
            }
            _ => Err(self.unsupported("element")),
        }
    }

    pub fn append_optional_element(&self, ast: Ast) -> SchemaResult<Ast> {
        self.append_element(Element::optional(ast))
    }

    /// Give a tuple a rest type.
    pub fn with_rest(&self, rest: Ast) -> SchemaResult<Ast> {
        match self.kind() {
            AstKind::Tuple(t) if t.rest.is_none() => {
                Ast::tuple_with(t.elements.clone(), Some(rest), t.allow_unexpected)
            }
            _ => Err(self.unsupported("rest")),
        }
    }

    /// Union of the literal keys of this schema, plus the key types of its
    /// index signatures.
    pub fn keyof(&self) -> Ast {
        let mut members: Vec<Ast> = self
            .fields()
            .into_iter()
            .map(|f| Ast::literal(f.key))
            .collect();
        if let AstKind::Struct(s) = self.kind() {
            members.extend(s.index_signatures.iter().map(|sig| sig.key.clone()));
        }
        Ast::union(members)
    }

    /// Tolerate keys or elements not described by this struct or tuple.
    /// Other nodes are returned unchanged.
    pub fn allow_unexpected(&self) -> Ast {
        self.set_allow_unexpected(true)
    }

    pub fn disallow_unexpected(&self) -> Ast {
        self.set_allow_unexpected(false)
    }

    fn set_allow_unexpected(&self, allow: bool) -> Ast {
        let kind = match self.kind() {
            AstKind::Struct(s) => AstKind::Struct(Struct {
                allow_unexpected: allow,
                ..s.clone()
            }),
            AstKind::Tuple(t) => AstKind::Tuple(Tuple {
                allow_unexpected: allow,
                ..t.clone()
            }),
            _ => return self.clone(),
        };
        Ast::with_annotations(kind, self.annotations().clone())
    }

    fn fields_for(&self, combinator: &'static str) -> SchemaResult<Vec<Field>> {
        match self.kind() {
            AstKind::Struct(_)
            | AstKind::Union(_)
            | AstKind::Refinement(_)
            | AstKind::TypeAlias(_)
            | AstKind::Lazy(_) => Ok(dedup(self.fields())),
            _ => Err(self.unsupported(combinator)),
        }
    }

    fn unsupported(&self, combinator: &'static str) -> SchemaError {
        SchemaError::Unsupported {
            combinator,
            tag: self.tag(),
        }
    }
}

fn dedup(fields: Vec<Field>) -> Vec<Field> {
    let mut seen = HashSet::new();
    fields
        .into_iter()
        .filter(|f| seen.insert(f.key.clone()))
        .collect()
}
