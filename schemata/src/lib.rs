//! # schemata
//!
//! Describe the shape of your data once as a schema [`Ast`], then derive
//! everything else from it: decoders that validate untrusted input and
//! report every problem at once, type guards, encoders, printers, random
//! value generators and lenses.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use schemata::{Ast, Field, Interpreter, Value};
//!
//! let person = Ast::struct_(vec![
//!     Field::required("name", Ast::string().non_empty()),
//!     Field::optional("age", Ast::number().int().non_negative()),
//! ])?;
//!
//! let interpreter = Interpreter::new();
//! let decoder = interpreter.decoder_for(&person)?;
//!
//! let result = decoder.decode_json_str(r#"{"name":"","age":1.5}"#)?;
//! if let Some(errors) = result.errors() {
//!     println!("{}", schemata::format_tree(errors.as_slice()));
//! }
//! ```
//!
//! ## Schema Nodes
//!
//! | Node          | Constructor                            | Type rep               |
//! |---------------|----------------------------------------|------------------------|
//! | literal       | `Ast::literal("a")`                    | `"a"`                  |
//! | keyword       | `Ast::string()`, `Ast::number()`, ...  | `string`               |
//! | unique symbol | `Ast::unique_symbol(sym)`              | `typeof Symbol(desc)`  |
//! | enums         | `Ast::enums([("A", 0.into())])`        | `enum { A }`           |
//! | tuple         | `Ast::tuple(..)`, `Ast::array(item)`   | `readonly [string]`    |
//! | struct        | `Ast::struct_(..)`, `Ast::record(k, v)`| `{ readonly a: string }` |
//! | union         | `Ast::union(..)`                       | `string \| number`     |
//! | refinement    | `Ast::refinement(..)`, filters         | `number & int`         |
//! | declaration   | `Ast::declaration(id, params, provider)` | `Option<string>`     |
//! | type alias    | `Ast::type_alias(params, expansion, hooks)` | expansion         |
//! | lazy          | `Ast::lazy(\|this\| ..)`               | `<lazy>`               |
//!
//! ## Results
//!
//! Decoders return a [`Graded`] result: `Success(value)`, `Warning(errors,
//! value)` for non-fatal problems such as NaN, or `Failure(errors)`. Errors
//! carry the path to the offending part of the input and render as a tree
//! with [`format_tree`].
//!
//! ## Declarations
//!
//! Opaque types get their artifacts from a [`Provider`], attached to the
//! declaration node or registered by id in a [`ProviderRegistry`]. The
//! companion crate `schemata-data` ships providers for options, sets and
//! chunks.
//!
//! ## Configuration
//!
//! Generator limits live in [`SchemaConfig`], loadable from a
//! `schemata.toml` file:
//!
//! ```toml
//! [arbitrary]
//! max_string_length = 10
//! max_rest_length = 5
//! refinement_retries = 100
//! soft_depth = 3
//! depth_limit = 64
//! ```

pub mod annotation;
pub mod ast;
pub mod config;
pub mod error;
pub mod filters;
pub mod graded;
pub mod interpreter;
pub mod json;
pub mod optics;
pub mod provider;
pub mod value;

pub use annotation::{AnnotationKey, AnnotationValue, Annotations, Hook};
pub use ast::{
    Ast, AstKind, Declaration, Element, Field, IndexSignature, Keyword, Lazy, LazyId, Literal,
    Refinement, Severity, Struct, Tuple, TypeAlias,
};
pub use config::{ArbitraryConfig, ConfigValidationError, SchemaConfig, CONFIG_FILENAME};
pub use error::{format_tree, DecodeError, DecodeErrorKind, PathSegment, SchemaError, SchemaResult};
pub use graded::{Accumulator, Graded, NonEmpty};
pub use interpreter::{
    arbitrary_for, decoder_for, encoder_for, guard_for, pretty_for, Arbitrary, DecodeResult,
    Decoder, Encoder, GenerateError, Guard, Interpreter, Pretty, Samples,
};
pub use json::JsonCodec;
pub use optics::{optics_for, Lens, Optics, Step};
pub use provider::{ArtifactKind, DeclarationId, Provider, ProviderRegistry};
pub use value::{Object, Symbol, Value};

#[cfg(test)]
mod tests;
