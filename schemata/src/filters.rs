//! Refinement filters.
//!
//! Every filter wraps a schema in a [`Refinement`](crate::ast::Refinement)
//! carrying a name, a JSON `meta` describing its parameters and a
//! JSON-Schema hint annotation.
//!
//! | Filter                         | Applies to | Meta                       |
//! |--------------------------------|------------|----------------------------|
//! | `min_length` / `max_length`    | strings    | `{"minLength": n}`         |
//! | `length` / `non_empty`         | strings    | `{"minLength", "maxLength"}` |
//! | `starts_with` / `ends_with`    | strings    | `{"startsWith": s}`        |
//! | `includes` / `pattern`         | strings    | `{"pattern": p}`           |
//! | `less_than` / `greater_than`   | numbers    | `{"exclusiveMaximum": n}`  |
//! | `int` / `non_nan` / `finite`   | numbers    | `{"type": "integer"}`      |
//! | `min_items` / `max_items`      | arrays     | `{"minItems": n}`          |
//!
//! # Example
//! ```rust,ignore
//! let username = Ast::string().min_length(3).max_length(20).pattern("^[a-z]+$")?;
//! let age = Ast::number().int().greater_than_or_equal_to(0.0);
//! ```

use regex::Regex;
use serde_json::json;

use crate::annotation::AnnotationKey;
use crate::ast::{Ast, Severity};
use crate::error::SchemaResult;
use crate::value::Value;

fn string_length(value: &Value) -> Option<usize> {
    value.as_str().map(|s| s.chars().count())
}

fn item_count(value: &Value) -> Option<usize> {
    value.as_array().map(<[Value]>::len)
}

impl Ast {
    /// A custom refinement. `meta` describes the predicate for error
    /// messages.
    pub fn filter<F>(&self, name: impl Into<String>, meta: serde_json::Value, predicate: F) -> Ast
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Ast::refinement(self.clone(), name, meta, predicate)
    }

    /// A refinement whose failures are reported as warnings.
    pub fn warn_unless<F>(
        &self,
        name: impl Into<String>,
        meta: serde_json::Value,
        predicate: F,
    ) -> Ast
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Ast::refinement_with_severity(self.clone(), name, meta, predicate, Severity::Warning)
    }

    fn described<F>(&self, name: &str, meta: serde_json::Value, predicate: F) -> Ast
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Ast::refinement(self.clone(), name, meta.clone(), predicate)
            .annotate(AnnotationKey::JsonSchema, meta)
    }

    // -------------------------------------------------------------------------
    // Strings
    // -------------------------------------------------------------------------

    pub fn min_length(&self, min: usize) -> Ast {
        self.described("minLength", json!({ "minLength": min }), move |v| {
            string_length(v).is_some_and(|n| n >= min)
        })
    }

    pub fn max_length(&self, max: usize) -> Ast {
        self.described("maxLength", json!({ "maxLength": max }), move |v| {
            string_length(v).is_some_and(|n| n <= max)
        })
    }

    /// Exactly `length` characters.
    pub fn length(&self, length: usize) -> Ast {
        self.described(
            "length",
            json!({ "minLength": length, "maxLength": length }),
            move |v| string_length(v) == Some(length),
        )
    }

    pub fn non_empty(&self) -> Ast {
        self.min_length(1)
    }

    pub fn starts_with(&self, prefix: impl Into<String>) -> Ast {
        let prefix = prefix.into();
        let meta = json!({ "startsWith": prefix });
        let hint = json!({ "pattern": format!("^{}", regex::escape(&prefix)) });
        Ast::refinement(self.clone(), "startsWith", meta, move |v| {
            v.as_str().is_some_and(|s| s.starts_with(&prefix))
        })
        .annotate(AnnotationKey::JsonSchema, hint)
    }

    pub fn ends_with(&self, suffix: impl Into<String>) -> Ast {
        let suffix = suffix.into();
        let meta = json!({ "endsWith": suffix });
        let hint = json!({ "pattern": format!("{}$", regex::escape(&suffix)) });
        Ast::refinement(self.clone(), "endsWith", meta, move |v| {
            v.as_str().is_some_and(|s| s.ends_with(&suffix))
        })
        .annotate(AnnotationKey::JsonSchema, hint)
    }

    pub fn includes(&self, needle: impl Into<String>) -> Ast {
        let needle = needle.into();
        let meta = json!({ "includes": needle });
        let hint = json!({ "pattern": regex::escape(&needle) });
        Ast::refinement(self.clone(), "includes", meta, move |v| {
            v.as_str().is_some_and(|s| s.contains(&needle))
        })
        .annotate(AnnotationKey::JsonSchema, hint)
    }

    /// Strings matching `pattern`. Fails if the pattern does not compile.
    pub fn pattern(&self, pattern: &str) -> SchemaResult<Ast> {
        let regex = Regex::new(pattern)?;
        Ok(self.described("pattern", json!({ "pattern": pattern }), move |v| {
            v.as_str().is_some_and(|s| regex.is_match(s))
        }))
    }

    // -------------------------------------------------------------------------
    // Numbers
    // -------------------------------------------------------------------------

    pub fn less_than(&self, max: f64) -> Ast {
        self.described("lessThan", json!({ "exclusiveMaximum": max }), move |v| {
            v.as_f64().is_some_and(|n| n < max)
        })
    }

    pub fn less_than_or_equal_to(&self, max: f64) -> Ast {
        self.described("lessThanOrEqualTo", json!({ "maximum": max }), move |v| {
            v.as_f64().is_some_and(|n| n <= max)
        })
    }

    pub fn greater_than(&self, min: f64) -> Ast {
        self.described("greaterThan", json!({ "exclusiveMinimum": min }), move |v| {
            v.as_f64().is_some_and(|n| n > min)
        })
    }

    pub fn greater_than_or_equal_to(&self, min: f64) -> Ast {
        self.described("greaterThanOrEqualTo", json!({ "minimum": min }), move |v| {
            v.as_f64().is_some_and(|n| n >= min)
        })
    }

    /// Inclusive on both ends.
    pub fn between(&self, min: f64, max: f64) -> Ast {
        self.described(
            "between",
            json!({ "minimum": min, "maximum": max }),
            move |v| v.as_f64().is_some_and(|n| min <= n && n <= max),
        )
    }

    pub fn positive(&self) -> Ast {
        self.greater_than(0.0)
    }

    pub fn negative(&self) -> Ast {
        self.less_than(0.0)
    }

    pub fn non_negative(&self) -> Ast {
        self.greater_than_or_equal_to(0.0)
    }

    pub fn non_positive(&self) -> Ast {
        self.less_than_or_equal_to(0.0)
    }

    pub fn multiple_of(&self, divisor: f64) -> Ast {
        self.described("multipleOf", json!({ "multipleOf": divisor }), move |v| {
            v.as_f64().is_some_and(|n| (n / divisor).fract() == 0.0)
        })
    }

    pub fn int(&self) -> Ast {
        self.described("int", json!({ "type": "integer" }), |v| {
            v.as_f64().is_some_and(|n| n.is_finite() && n.fract() == 0.0)
        })
    }

    /// Rejects NaN outright instead of warning about it.
    pub fn non_nan(&self) -> Ast {
        Ast::refinement(self.clone(), "nonNaN", json!({ "type": "NonNaN" }), |v| {
            v.as_f64().is_some_and(|n| !n.is_nan())
        })
    }

    pub fn finite(&self) -> Ast {
        Ast::refinement(self.clone(), "finite", json!({ "type": "Finite" }), |v| {
            v.as_f64().is_some_and(f64::is_finite)
        })
    }

    // -------------------------------------------------------------------------
    // Arrays
    // -------------------------------------------------------------------------

    pub fn min_items(&self, min: usize) -> Ast {
        self.described("minItems", json!({ "minItems": min }), move |v| {
            item_count(v).is_some_and(|n| n >= min)
        })
    }

    pub fn max_items(&self, max: usize) -> Ast {
        self.described("maxItems", json!({ "maxItems": max }), move |v| {
            item_count(v).is_some_and(|n| n <= max)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use crate::interpreter::decoder_for;

    fn accepts(ast: &Ast, value: Value) -> bool {
        decoder_for(ast).unwrap().decode(&value).is_success()
    }

    #[test]
    fn test_string_filters() {
        let ast = Ast::string().min_length(2).max_length(4);
        assert!(accepts(&ast, Value::from("abc")));
        assert!(!accepts(&ast, Value::from("a")));
        assert!(!accepts(&ast, Value::from("abcde")));

        assert!(accepts(&Ast::string().starts_with("ab"), Value::from("abc")));
        assert!(!accepts(&Ast::string().ends_with("ab"), Value::from("abc")));
        assert!(accepts(&Ast::string().includes("b"), Value::from("abc")));
        assert!(accepts(&Ast::string().length(2), Value::from("é!")));
        assert!(!accepts(&Ast::string().non_empty(), Value::from("")));
    }

    #[test]
    fn test_pattern() {
        let ast = Ast::string().pattern("^[a-z]+$").unwrap();
        assert!(accepts(&ast, Value::from("abc")));
        assert!(!accepts(&ast, Value::from("ab1")));
        assert!(Ast::string().pattern("(").is_err());
    }

    #[test]
    fn test_number_filters() {
        assert!(accepts(&Ast::number().int(), Value::from(3)));
        assert!(!accepts(&Ast::number().int(), Value::from(3.5)));
        assert!(accepts(&Ast::number().between(1.0, 2.0), Value::from(2)));
        assert!(!accepts(&Ast::number().positive(), Value::from(0)));
        assert!(accepts(&Ast::number().non_negative(), Value::from(0)));
        assert!(accepts(&Ast::number().multiple_of(0.5), Value::from(1.5)));
        assert!(!accepts(&Ast::number().less_than(1.0), Value::from(1)));
    }

    #[test]
    fn test_nan_is_rejected_by_non_nan() {
        let result = decoder_for(&Ast::number().non_nan())
            .unwrap()
            .decode(&Value::Number(f64::NAN));
        assert!(result.is_failure());
        let kinds: Vec<_> = result.error_list().iter().map(|e| &e.kind).collect();
        assert!(matches!(kinds[0], DecodeErrorKind::NaN));
        assert!(matches!(kinds[1], DecodeErrorKind::Refinement { name, .. } if name == "nonNaN"));
    }

    #[test]
    fn test_refinement_error_carries_meta() {
        let result = decoder_for(&Ast::string().min_length(2))
            .unwrap()
            .decode(&Value::from("a"));
        assert_eq!(
            result.error_list()[0].to_string(),
            r#""a" did not satisfy refinement({"minLength":2})"#
        );
    }

    #[test]
    fn test_json_schema_hint() {
        let ast = Ast::string().min_length(2);
        assert_eq!(
            ast.annotations().json(&AnnotationKey::JsonSchema),
            Some(&json!({"minLength": 2}))
        );
    }

    #[test]
    fn test_array_filters() {
        let ast = Ast::array(Ast::number()).min_items(1).max_items(2);
        assert!(accepts(&ast, Value::Array(vec![Value::from(1)])));
        assert!(!accepts(&ast, Value::Array(Vec::new())));
        assert!(!accepts(&ast, Value::Array(vec![Value::from(1); 3])));
    }

    #[test]
    fn test_warning_severity_keeps_value() {
        let ast = Ast::number().warn_unless("even", json!({"even": true}), |v| {
            v.as_f64().is_some_and(|n| n % 2.0 == 0.0)
        });
        let result = decoder_for(&ast).unwrap().decode(&Value::from(3));
        assert!(result.is_warning());
        assert_eq!(result.value(), Some(&Value::from(3)));
    }
}
