//! # schemata-data
//!
//! Opaque data types for [`schemata`], built on its declaration providers
//! and type-alias hooks.
//!
//! | Schema                        | Wire form        | Decoded form                       |
//! |-------------------------------|------------------|------------------------------------|
//! | [`option(a)`](option::option) | `a \| null \| undefined` | `{"_tag":"None"}` / `{"_tag":"Some","value":a}` |
//! | [`readonly_set(a)`](readonly_set::readonly_set) | `a[]` | `Set([..])`                  |
//! | [`chunk(a)`](chunk::chunk)    | `a[]`            | branded `{_id, values}` struct     |
//! | [`json()`](json::json)        | any JSON value   | unchanged                          |
//! | [`number_from_string(s)`](parse::number_from_string) | `"1.5"` | `1.5`               |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schemata::{Ast, Field, Interpreter};
//! use schemata_data::{option, readonly_set};
//!
//! let user = Ast::struct_(vec![
//!     Field::required("nickname", option(Ast::string())),
//!     Field::required("roles", readonly_set(Ast::string())),
//! ])?;
//! let decoder = Interpreter::new().decoder_for(&user)?;
//! ```
//!
//! Declarations built here carry their providers. Declarations created
//! elsewhere under the same ids pick them up from a registry filled by
//! [`register`].

pub mod chunk;
pub mod json;
pub mod option;
pub mod parse;
pub mod readonly_set;

pub use chunk::chunk;
pub use json::json;
pub use option::option;
pub use parse::number_from_string;
pub use readonly_set::readonly_set;

use schemata::{
    Accumulator, DecodeError, DecodeResult, Decoder, Graded, PathSegment, ProviderRegistry, Value,
};

/// Add the providers of every declared type in this crate to `registry`.
pub fn register(registry: &mut ProviderRegistry) -> &mut ProviderRegistry {
    tracing::debug!("Registering schemata-data providers");
    registry
        .register(option::OPTION_ID, option::provider())
        .register(readonly_set::READONLY_SET_ID, readonly_set::provider())
        .register(json::JSON_ID, json::provider())
}

/// Decode every element of an array input, accumulating errors by index.
pub(crate) fn decode_items(item: Option<&Decoder>, input: &Value) -> DecodeResult<Vec<Value>> {
    let Value::Array(items) = input else {
        return Graded::failure(DecodeError::type_mismatch("ReadonlyArray<unknown>", input));
    };
    let mut acc = Accumulator::new();
    let mut decoded = Vec::with_capacity(items.len());
    for (index, element) in items.iter().enumerate() {
        let result = match item {
            Some(item) => item.decode(element).at(PathSegment::Index(index)),
            None => Graded::success(element.clone()),
        };
        if let Some(value) = acc.absorb(result) {
            decoded.push(value);
        }
    }
    acc.finish(decoded)
}

#[cfg(test)]
mod tests {
    use schemata::{Ast, DeclarationId, Interpreter, Provider};

    use super::*;

    #[test]
    fn test_registry_supplies_bare_declarations() {
        let mut registry = ProviderRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains(&DeclarationId::new("Option")));

        let bare = Ast::declaration(option::OPTION_ID, vec![Ast::number()], Provider::new());
        let decoder = Interpreter::new()
            .with_providers(registry)
            .decoder_for(&bare)
            .unwrap();
        assert_eq!(decoder.decode(&Value::Null), Graded::Success(option::none()));
    }
}
