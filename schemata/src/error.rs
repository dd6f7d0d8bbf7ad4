//! Error types.
//!
//! Two families live here:
//!
//! - [`DecodeError`]: data errors found while decoding. They are values,
//!   carried inside a [`Graded`](crate::Graded) result, and never abort a
//!   decode.
//! - [`SchemaError`]: failures to *build* something (derive an artifact,
//!   apply a combinator, load a config file). Returned as `Err`.
//!
//! # Example
//! ```rust,ignore
//! use schemata::{decoder_for, format_tree, Ast, Field, Value};
//!
//! let person = Ast::struct_(vec![Field::required("name", Ast::string())])?;
//! let result = decoder_for(&person)?.decode(&Value::Null);
//! println!("{}", format_tree(result.error_list()));
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::Literal;
use crate::config::ConfigValidationError;
use crate::provider::{ArtifactKind, DeclarationId};
use crate::value::{quote, Value};

// =============================================================================
// Decode Errors
// =============================================================================

/// One step of the location of a decode error inside the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PathSegment {
    /// A struct key.
    Key(String),
    /// A tuple or array position.
    Index(usize),
    /// The union member that was selected (or tried).
    Member(usize),
}

impl PathSegment {
    fn label(&self) -> String {
        match self {
            Self::Key(key) => format!("key {}", quote(key)),
            Self::Index(index) => format!("index {index}"),
            Self::Member(index) => format!("union member {index}"),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
            Self::Member(index) => write!(f, "|{index}|"),
        }
    }
}

/// What went wrong at a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeErrorKind {
    /// The value is not of the expected runtime type.
    Type { expected: String, actual: Value },
    /// The value is not equal to the expected literal.
    Equal { expected: Literal, actual: Value },
    /// The value is none of the enumeration members.
    Enums { expected: Vec<Literal>, actual: Value },
    /// A required struct key is absent.
    MissingKey,
    /// A required tuple element is absent.
    MissingIndex,
    /// A key not covered by fields or index signatures.
    UnexpectedKey { actual: Value },
    /// A tuple element past the declared elements with no rest.
    UnexpectedIndex { actual: Value },
    /// No union member accepted the input.
    UnionMember { expected: String, actual: Value },
    /// A refinement predicate rejected the value.
    Refinement {
        name: String,
        meta: serde_json::Value,
        message: Option<String>,
        actual: Value,
    },
    /// The number is NaN.
    NaN,
    /// The number is infinite.
    NotFinite,
    /// A string could not be parsed into the target type.
    Parse {
        from: String,
        to: String,
        actual: Value,
    },
    /// Raised by hand-written decoders.
    Custom { message: String, actual: Value },
    /// A recursive decoder ran before its derivation finished.
    Unresolved,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type { expected, actual } => {
                write!(f, "{actual} did not satisfy is({expected})")
            }
            Self::Equal { expected, actual } => {
                write!(f, "{actual} did not satisfy isEqual({expected})")
            }
            Self::Enums { expected, actual } => {
                let members: Vec<String> = expected.iter().map(ToString::to_string).collect();
                write!(f, "{actual} did not satisfy isEnum({})", members.join(" | "))
            }
            Self::MissingKey => f.write_str("is missing"),
            Self::MissingIndex => f.write_str("is missing"),
            Self::UnexpectedKey { .. } | Self::UnexpectedIndex { .. } => {
                f.write_str("is unexpected")
            }
            Self::UnionMember { expected, actual } => {
                write!(f, "{actual} did not satisfy is({expected})")
            }
            Self::Refinement {
                message: Some(message),
                ..
            } => f.write_str(message),
            Self::Refinement { meta, actual, .. } => {
                write!(f, "{actual} did not satisfy refinement({meta})")
            }
            Self::NaN => f.write_str("did not satisfy not(isNaN)"),
            Self::NotFinite => f.write_str("did not satisfy isFinite"),
            Self::Parse { from, to, actual } => {
                write!(f, "{actual} did not satisfy parse({from} -> {to})")
            }
            Self::Custom { message, .. } => f.write_str(message),
            Self::Unresolved => f.write_str("recursive decoder used before it was derived"),
        }
    }
}

/// A located decode error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeError {
    /// Outermost segment first.
    pub path: Vec<PathSegment>,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    /// An error at the root of the input.
    pub fn new(kind: DecodeErrorKind) -> Self {
        Self {
            path: Vec::new(),
            kind,
        }
    }

    /// Prefix the path with an enclosing segment.
    pub fn at(mut self, segment: PathSegment) -> Self {
        self.path.insert(0, segment);
        self
    }

    pub fn type_mismatch(expected: impl Into<String>, actual: &Value) -> Self {
        Self::new(DecodeErrorKind::Type {
            expected: expected.into(),
            actual: actual.clone(),
        })
    }

    pub fn custom(message: impl Into<String>, actual: &Value) -> Self {
        Self::new(DecodeErrorKind::Custom {
            message: message.into(),
            actual: actual.clone(),
        })
    }

    /// The path rendered as `/a/0`, or empty at the root.
    pub fn pointer(&self) -> String {
        self.path.iter().map(|segment| format!("/{segment}")).collect()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} {}", self.pointer(), self.kind)
        }
    }
}

impl std::error::Error for DecodeError {}

struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(label: String) -> Self {
        Self {
            label,
            children: Vec::new(),
        }
    }

    fn child(&mut self, label: String) -> &mut TreeNode {
        let index = match self.children.iter().position(|c| c.label == label) {
            Some(index) => index,
            None => {
                self.children.push(TreeNode::leaf(label));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    fn render(&self, prefix: &str, is_last: bool, lines: &mut Vec<String>) {
        let (branch, indent) = if is_last {
            ("└─ ", "   ")
        } else {
            ("├─ ", "│  ")
        };
        lines.push(format!("{prefix}{branch}{}", self.label));
        let nested = format!("{prefix}{indent}");
        let last = self.children.len().saturating_sub(1);
        for (i, child) in self.children.iter().enumerate() {
            child.render(&nested, i == last, lines);
        }
    }
}

/// Render errors as a tree grouped by path.
///
/// ```text
/// 2 error(s) found
/// ├─ key "a"
/// │  └─ 1 did not satisfy is(string)
/// └─ key "b"
///    └─ is missing
/// ```
pub fn format_tree(errors: &[DecodeError]) -> String {
    let mut root = TreeNode::leaf(String::new());
    for error in errors {
        let mut node = &mut root;
        for segment in &error.path {
            node = node.child(segment.label());
        }
        node.children.push(TreeNode::leaf(error.kind.to_string()));
    }

    let mut lines = vec![format!("{} error(s) found", errors.len())];
    let last = root.children.len().saturating_sub(1);
    for (i, child) in root.children.iter().enumerate() {
        child.render("", i == last, &mut lines);
    }
    lines.join("\n")
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Failure to derive an artifact, apply a combinator or load configuration.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A declaration has no constructor for the requested artifact, neither
    /// on the node nor in the registry.
    #[error("missing {artifact} provider for declaration `{id}`")]
    MissingProvider {
        id: DeclarationId,
        artifact: ArtifactKind,
    },

    /// A combinator was applied to a node kind it does not support.
    #[error("`{combinator}` is not supported on {tag} schemas")]
    Unsupported {
        combinator: &'static str,
        tag: &'static str,
    },

    #[error("duplicate struct key `{0}`")]
    DuplicateKey(String),

    #[error("required tuple element at index {index} follows an optional element")]
    RequiredAfterOptional { index: usize },

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("{found} cannot be represented as JSON")]
    NotJson { found: &'static str },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read configuration from {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),
}

/// Result type for schema construction and derivation.
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_pointer() {
        let error = DecodeError::type_mismatch("string", &Value::from(1))
            .at(PathSegment::Index(0))
            .at(PathSegment::Key("a".to_string()));
        assert_eq!(error.to_string(), "/a/0 1 did not satisfy is(string)");
    }

    #[test]
    fn test_root_error_has_no_pointer() {
        let error = DecodeError::new(DecodeErrorKind::MissingKey);
        assert_eq!(error.pointer(), "");
        assert_eq!(error.to_string(), "is missing");
    }

    #[test]
    fn test_refinement_message_overrides_default() {
        let kind = DecodeErrorKind::Refinement {
            name: "minLength".to_string(),
            meta: serde_json::json!({"minLength": 2}),
            message: None,
            actual: Value::from("a"),
        };
        assert_eq!(
            kind.to_string(),
            r#""a" did not satisfy refinement({"minLength":2})"#
        );

        let kind = DecodeErrorKind::Refinement {
            name: "minLength".to_string(),
            meta: serde_json::json!({"minLength": 2}),
            message: Some("too short".to_string()),
            actual: Value::from("a"),
        };
        assert_eq!(kind.to_string(), "too short");
    }

    #[test]
    fn test_tree_groups_by_path() {
        let errors = vec![
            DecodeError::type_mismatch("string", &Value::from(1)).at(PathSegment::Key("a".into())),
            DecodeError::new(DecodeErrorKind::MissingKey).at(PathSegment::Key("b".into())),
        ];
        insta::assert_snapshot!(format_tree(&errors), @r#"
        2 error(s) found
        ├─ key "a"
        │  └─ 1 did not satisfy is(string)
        └─ key "b"
           └─ is missing
        "#);
    }

    #[test]
    fn test_tree_merges_shared_prefixes() {
        let errors = vec![
            DecodeError::new(DecodeErrorKind::MissingKey)
                .at(PathSegment::Key("x".into()))
                .at(PathSegment::Index(0)),
            DecodeError::new(DecodeErrorKind::NaN)
                .at(PathSegment::Key("y".into()))
                .at(PathSegment::Index(0)),
        ];
        let tree = format_tree(&errors);
        assert_eq!(tree.matches("index 0").count(), 1);
        assert!(tree.starts_with("2 error(s) found"));
    }
}
