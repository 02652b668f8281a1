//! The `Parse` trait for attribute values, and utilities for parsers.

use cssparser::{Parser, ParserInput, Token};

use crate::error::*;

/// Trait to parse values using `cssparser::Parser`.
pub trait Parse: Sized {
    /// Parses a value out of the `parser`.
    ///
    /// All value types should implement this for composability.
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>>;

    /// Convenience function to parse a value out of a `&str`.
    ///
    /// The whole string must be consumed; trailing garbage is an error.
    fn parse_str(s: &str) -> Result<Self, ParseError<'_>> {
        let mut input = ParserInput::new(s);
        let mut parser = Parser::new(&mut input);

        let res = Self::parse(&mut parser)?;
        parser.expect_exhausted()?;

        Ok(res)
    }
}

/// Consumes a comma if it exists, or does nothing.
pub fn optional_comma(parser: &mut Parser<'_, '_>) {
    let _ = parser.try_parse(|p| p.expect_comma());
}

/// Parses a list of identifiers from a `cssparser::Parser`
///
/// # Example
///
/// ```ignore
/// let my_boolean = parse_identifiers!(
///     parser,
///     "true" => true,
///     "false" => false,
/// )?;
/// ```
#[macro_export]
macro_rules! parse_identifiers {
    ($parser:expr,
     $($str:expr => $val:expr,)+) => {
        {
            let loc = $parser.current_source_location();
            let token = $parser.next()?;

            match token {
                $(cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case($str) => Ok($val),)+

                _ => Err(loc.new_basic_unexpected_token_error(token.clone()))
            }
        }
    };
}

/// Parses the value of attribute `attr` of element `element`.
///
/// Errors carry both names so that they can be reported as a
/// [`LoadingError::MalformedAttribute`].
pub fn parse_attribute<T: Parse>(
    element: &str,
    attr: &str,
    value: &str,
) -> Result<T, ElementError> {
    T::parse_str(value).attribute(element, attr)
}

/// Full-precision value of a numeric token, read again from its source text.
///
/// cssparser only keeps an `f32`.  `suffix_len` is the length of the unit or `%`
/// after the number; `approx` is used if the text does not parse, which can happen
/// with escaped units.
pub fn precise_number(source: &str, suffix_len: usize, approx: f32) -> f64 {
    source
        .get(..source.len().saturating_sub(suffix_len))
        .and_then(|s| s.parse().ok())
        .unwrap_or(f64::from(approx))
}

impl Parse for f64 {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        let loc = parser.current_source_location();

        parser.skip_whitespace();
        let start = parser.position();
        let approx = parser.expect_number()?;
        let n = precise_number(parser.slice_from(start), 0, approx);

        if n.is_finite() {
            Ok(n)
        } else {
            Err(loc.new_custom_error(ValueErrorKind::value_error("expected finite number")))
        }
    }
}

/// A plain number or a percentage; percentages are returned as fractions.
///
/// Used for gradient stop offsets and opacities.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NumberOrPercentage {
    pub value: f64,
}

impl Parse for NumberOrPercentage {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        let loc = parser.current_source_location();

        parser.skip_whitespace();
        let start = parser.position();

        let token = parser.next()?.clone();
        let text = parser.slice_from(start);

        let value = match token {
            Token::Number { value, .. } => precise_number(text, 0, value),
            Token::Percentage { unit_value, .. } => {
                precise_number(text, 1, unit_value * 100.0) / 100.0
            }
            tok => return Err(loc.new_unexpected_token_error(tok)),
        };

        if value.is_finite() {
            Ok(NumberOrPercentage { value })
        } else {
            Err(loc.new_custom_error(ValueErrorKind::value_error("expected finite number")))
        }
    }
}

/// List of numbers separated by whitespace and/or commas, as in `points`,
/// `viewBox` or `stroke-dasharray`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NumberList(pub Vec<f64>);

impl Parse for NumberList {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        let mut v = Vec::new();

        while !parser.is_exhausted() {
            if !v.is_empty() {
                optional_comma(parser);
            }

            v.push(f64::parse(parser)?);
        }

        Ok(NumberList(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_number_list() {
        assert_eq!(
            NumberList::parse_str("1 2,3 , 4\n-5").unwrap(),
            NumberList(vec![1.0, 2.0, 3.0, 4.0, -5.0])
        );
        assert_eq!(NumberList::parse_str("").unwrap(), NumberList(vec![]));
    }

    #[test]
    fn invalid_number_list_is_error() {
        assert!(NumberList::parse_str("1 2 x").is_err());
        assert!(NumberList::parse_str("1,,2").is_err());
    }

    #[test]
    fn numbers_keep_double_precision() {
        assert_eq!(f64::parse_str("0.1").unwrap(), 0.1);
        assert_eq!(f64::parse_str(" 123456789.123").unwrap(), 123456789.123);
        assert_eq!(f64::parse_str("-1e-7").unwrap(), -1e-7);
        assert_eq!(
            NumberList::parse_str("0.3, 16777217").unwrap(),
            NumberList(vec![0.3, 16777217.0])
        );
        assert_eq!(NumberOrPercentage::parse_str("0.7").unwrap().value, 0.7);
    }

    #[test]
    fn parses_number_or_percentage() {
        assert_eq!(NumberOrPercentage::parse_str("0.25").unwrap().value, 0.25);
        assert_eq!(NumberOrPercentage::parse_str("50%").unwrap().value, 0.5);
        assert!(NumberOrPercentage::parse_str("10px").is_err());
    }

    #[test]
    fn attribute_errors_carry_names() {
        let e = parse_attribute::<f64>("rect", "width", "wide").unwrap_err();
        assert_eq!(e.element, "rect");
        assert_eq!(e.attr, "width");
    }
}
