//! Type representation of schemas, used in error messages.

use std::fmt;

use super::{Ast, AstKind, Element, Field};
use crate::value::quote;

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(identifier) = self.annotations().identifier() {
            return f.write_str(identifier);
        }
        match self.kind() {
            AstKind::Literal(literal) => write!(f, "{literal}"),
            AstKind::Keyword(keyword) => f.write_str(keyword.as_str()),
            AstKind::UniqueSymbol(symbol) => write!(f, "typeof {symbol}"),
            AstKind::Enums(members) => {
                let names: Vec<&str> = members.iter().map(|(name, _)| name.as_str()).collect();
                write!(f, "enum {{ {} }}", names.join(", "))
            }
            AstKind::Tuple(tuple) => {
                let mut parts: Vec<String> = tuple.elements.iter().map(element).collect();
                if let Some(rest) = &tuple.rest {
                    if parts.is_empty() {
                        return write!(f, "ReadonlyArray<{rest}>");
                    }
                    parts.push(format!("...{rest}[]"));
                }
                write!(f, "readonly [{}]", parts.join(", "))
            }
            AstKind::Struct(s) => {
                let mut parts: Vec<String> = s.fields.iter().map(field).collect();
                parts.extend(
                    s.index_signatures
                        .iter()
                        .map(|sig| format!("readonly [x: {}]: {}", sig.key, sig.value)),
                );
                if parts.is_empty() {
                    f.write_str("{}")
                } else {
                    write!(f, "{{ {} }}", parts.join(", "))
                }
            }
            AstKind::Union(members) => {
                let parts: Vec<String> = members.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(" | "))
            }
            AstKind::Refinement(refinement) => write!(f, "{} & {}", refinement.from, refinement.name),
            AstKind::Declaration(declaration) => {
                if declaration.type_parameters.is_empty() {
                    write!(f, "{}", declaration.id)
                } else {
                    let params: Vec<String> = declaration
                        .type_parameters
                        .iter()
                        .map(ToString::to_string)
                        .collect();
                    write!(f, "{}<{}>", declaration.id, params.join(", "))
                }
            }
            AstKind::TypeAlias(alias) => write!(f, "{}", alias.expansion),
            // Never resolved here: printing a recursive schema must terminate.
            AstKind::Lazy(_) => f.write_str("<lazy>"),
        }
    }
}

fn element(element: &Element) -> String {
    if element.is_optional {
        format!("{}?", element.ast)
    } else {
        element.ast.to_string()
    }
}

fn field(field: &Field) -> String {
    let readonly = if field.is_readonly { "readonly " } else { "" };
    let optional = if field.is_optional { "?" } else { "" };
    let key = if is_identifier(&field.key) {
        field.key.clone()
    } else {
        quote(&field.key)
    };
    format!("{readonly}{key}{optional}: {}", field.ast)
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(Ast::string().to_string(), "string");
        assert_eq!(Ast::literal("a").to_string(), r#""a""#);
        assert_eq!(Ast::literal(1).to_string(), "1");
        assert_eq!(Ast::null().to_string(), "null");
    }

    #[test]
    fn test_composites() {
        let tuple = Ast::tuple_with(
            vec![Element::required(Ast::string()), Element::optional(Ast::number())],
            Some(Ast::boolean()),
            false,
        )
        .unwrap();
        assert_eq!(tuple.to_string(), "readonly [string, number?, ...boolean[]]");
        assert_eq!(Ast::array(Ast::string()).to_string(), "ReadonlyArray<string>");

        let person = Ast::struct_(vec![
            Field::required("a", Ast::string()),
            Field::optional("b", Ast::number()).mutable(),
            Field::required("c d", Ast::boolean()),
        ])
        .unwrap();
        assert_eq!(
            person.to_string(),
            r#"{ readonly a: string, b?: number, readonly "c d": boolean }"#
        );

        let union = Ast::union(vec![Ast::string(), Ast::number()]);
        assert_eq!(union.to_string(), "string | number");
    }

    #[test]
    fn test_identifier_wins_and_lazy_does_not_resolve() {
        assert_eq!(Ast::string().identified("Name").to_string(), "Name");
        let recursive = Ast::lazy(|this| Ast::array(this.clone()));
        assert_eq!(recursive.to_string(), "<lazy>");
    }
}
