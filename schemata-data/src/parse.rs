//! Parse combinators: decode through a source schema, then convert.

use rand::Rng;
use schemata::{
    Annotations, Arbitrary, Ast, DecodeError, DecodeErrorKind, Decoder, Encoder, Graded, Guard,
    Hook, Pretty, Value,
};

/// `number` carried as a string on the wire.
///
/// `from` decodes the raw input (usually `Ast::string()`); its output is
/// trimmed and parsed as a float. Text that does not parse, or parses to
/// NaN, fails with a `Parse` error. Numbers encode back with their
/// shortest display form.
///
/// ```rust,ignore
/// let decoder = decoder_for(&number_from_string(Ast::string()))?;
/// assert_eq!(decoder.decode(&Value::from("1.5")).into_value(), Some(Value::from(1.5)));
/// ```
pub fn number_from_string(from: Ast) -> Ast {
    let hooks = Annotations::new()
        .with_identifier("NumberFromString")
        .with_hook(Hook::decoder(|params: &[Decoder]| decoder(params.first().cloned())))
        .with_hook(Hook::guard(|_: &[Guard]| {
            Guard::new(|value| matches!(value, Value::Number(n) if !n.is_nan()))
        }))
        .with_hook(Hook::encoder(|params: &[Encoder]| encoder(params.first().cloned())))
        .with_hook(Hook::pretty(|_: &[Pretty]| Pretty::display()))
        .with_hook(Hook::arbitrary(|_: &[Arbitrary]| {
            Arbitrary::new(|rng, _| Ok(Value::Number(rng.gen_range(-1.0e6..1.0e6))))
        }));
    Ast::type_alias(vec![from], Ast::number(), hooks)
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

fn decoder(from: Option<Decoder>) -> Decoder {
    Decoder::new(move |input| {
        let source = match &from {
            Some(from) => from.decode(input),
            None => Graded::success(input.clone()),
        };
        source.and_then(|text| match text.as_str().and_then(parse_number) {
            Some(n) => Graded::success(Value::Number(n)),
            None => Graded::failure(DecodeError::new(DecodeErrorKind::Parse {
                from: "string".to_string(),
                to: "number".to_string(),
                actual: text,
            })),
        })
    })
}

fn encoder(from: Option<Encoder>) -> Encoder {
    Encoder::new(move |value| {
        let text = match value {
            Value::Number(_) => Value::String(value.to_string()),
            _ => value.clone(),
        };
        match &from {
            Some(from) => from.encode(&text),
            None => text,
        }
    })
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use schemata::{arbitrary_for, decoder_for, encoder_for, guard_for, pretty_for};

    use super::*;

    fn ast() -> Ast {
        number_from_string(Ast::string())
    }

    #[test]
    fn test_decoder() {
        let decoder = decoder_for(&ast()).unwrap();
        assert_eq!(decoder.decode(&Value::from("1.5")), Graded::Success(Value::Number(1.5)));
        assert_eq!(decoder.decode(&Value::from(" -2 ")), Graded::Success(Value::from(-2)));
    }

    #[test]
    fn test_decoder_failures() {
        let decoder = decoder_for(&ast()).unwrap();
        let result = decoder.decode(&Value::from("abc"));
        assert_eq!(
            result.error_list()[0].to_string(),
            r#""abc" did not satisfy parse(string -> number)"#
        );
        assert!(decoder.decode(&Value::from("NaN")).is_failure());

        let result = decoder.decode(&Value::from(1));
        assert_eq!(result.error_list()[0].to_string(), "1 did not satisfy is(string)");
    }

    #[test]
    fn test_encoder_and_pretty() {
        let ast = ast();
        assert_eq!(encoder_for(&ast).unwrap().encode(&Value::Number(1.5)), Value::from("1.5"));
        assert_eq!(pretty_for(&ast).unwrap().pretty(&Value::Number(1.5)), "1.5");
    }

    #[test]
    fn test_union_dispatch_uses_the_parser() {
        let ast = Ast::union(vec![ast(), Ast::boolean()]);
        let decoder = decoder_for(&ast).unwrap();
        assert_eq!(decoder.decode(&Value::from("3")), Graded::Success(Value::from(3)));
        assert_eq!(decoder.decode(&Value::from(true)), Graded::Success(Value::from(true)));
        assert_eq!(decoder.decode(&Value::from("x")).error_list().len(), 2);
    }

    #[test]
    fn test_generated_values_round_trip() {
        let ast = ast();
        let arbitrary = arbitrary_for(&ast).unwrap();
        let guard = guard_for(&ast).unwrap();
        let encoder = encoder_for(&ast).unwrap();
        let decoder = decoder_for(&ast).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..20 {
            let value = arbitrary.generate(&mut rng).unwrap();
            assert!(guard.is(&value));
            assert_eq!(decoder.decode(&encoder.encode(&value)), Graded::Success(value));
        }
    }
}
