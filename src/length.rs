//! Lengths with units, as used by `stroke-width` and `font-size`.
//!
//! Only a small set of units is understood.  Physical units are converted at a fixed
//! resolution of 3 user units per millimeter, and font-relative units use a fixed
//! font size, since widget art has no real font context.

use cssparser::{Parser, Token};

use crate::error::*;
use crate::parsers::{precise_number, Parse};

/// User units per millimeter.
const PX_PER_MM: f64 = 3.0;

/// Units for length values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    Pt,
    Pc,
    In,
    Mm,
    Cm,
    Em,
    Ex,
    Percent,
}

/// A length with a unit, before conversion to user units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Length {
    pub length: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub const fn new(length: f64, unit: LengthUnit) -> Length {
        Length { length, unit }
    }

    /// Converts to user units; `size` is the reference for percentages.
    pub fn to_user(&self, size: f64) -> f64 {
        let x = self.length;

        match self.unit {
            LengthUnit::Px => x,
            LengthUnit::Pt => x * 25.4 / 72.0 * PX_PER_MM,
            LengthUnit::Pc => x * 25.4 / 6.0 * PX_PER_MM,
            LengthUnit::In => x * 25.4 * PX_PER_MM,
            LengthUnit::Mm => x * PX_PER_MM,
            LengthUnit::Cm => x * 10.0 * PX_PER_MM,
            LengthUnit::Em => x * 6.0 * PX_PER_MM,
            LengthUnit::Ex => x * 3.0 * PX_PER_MM,
            LengthUnit::Percent => x * size / 100.0,
        }
    }
}

impl Parse for Length {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Length, ParseError<'i>> {
        let loc = parser.current_source_location();

        parser.skip_whitespace();
        let start = parser.position();
        let token = parser.next()?.clone();
        let text = parser.slice_from(start);

        let length = match token {
            Token::Number { value, .. } => {
                Length::new(precise_number(text, 0, value), LengthUnit::Px)
            }

            Token::Percentage { unit_value, .. } => Length::new(
                precise_number(text, 1, unit_value * 100.0),
                LengthUnit::Percent,
            ),

            Token::Dimension {
                value, ref unit, ..
            } => {
                let value = precise_number(text, unit.len(), value);

                let unit = match unit.to_ascii_lowercase().as_str() {
                    "px" => LengthUnit::Px,
                    "pt" => LengthUnit::Pt,
                    "pc" => LengthUnit::Pc,
                    "in" => LengthUnit::In,
                    "mm" => LengthUnit::Mm,
                    "cm" => LengthUnit::Cm,
                    "em" => LengthUnit::Em,
                    "ex" => LengthUnit::Ex,
                    _ => {
                        return Err(
                            loc.new_custom_error(ValueErrorKind::parse_error("unknown unit"))
                        )
                    }
                };

                Length::new(value, unit)
            }

            tok => return Err(loc.new_unexpected_token_error(tok)),
        };

        if length.length.is_finite() {
            Ok(length)
        } else {
            Err(loc.new_custom_error(ValueErrorKind::value_error("expected finite length")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn user(s: &str, size: f64) -> f64 {
        Length::parse_str(s).unwrap().to_user(size)
    }

    #[test]
    fn parses_units() {
        assert_eq!(
            Length::parse_str("2").unwrap(),
            Length::new(2.0, LengthUnit::Px)
        );
        assert_eq!(
            Length::parse_str("2px").unwrap(),
            Length::new(2.0, LengthUnit::Px)
        );
        assert_eq!(
            Length::parse_str("1.5MM").unwrap(),
            Length::new(1.5, LengthUnit::Mm)
        );
        assert_eq!(
            Length::parse_str("50%").unwrap(),
            Length::new(50.0, LengthUnit::Percent)
        );
    }

    #[test]
    fn converts_to_user_units() {
        assert!(approx_eq!(f64, user("2", 100.0), 2.0));
        assert!(approx_eq!(f64, user("72pt", 100.0), 25.4 * 3.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, user("1in", 100.0), 76.2, epsilon = 1e-9));
        assert!(approx_eq!(f64, user("2mm", 100.0), 6.0));
        assert!(approx_eq!(f64, user("1cm", 100.0), 30.0));
        assert!(approx_eq!(f64, user("1em", 100.0), 18.0));
        assert!(approx_eq!(f64, user("1ex", 100.0), 9.0));
        assert!(approx_eq!(f64, user("5%", 100.0), 5.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, user("5%", 40.0), 2.0, epsilon = 1e-6));
    }

    #[test]
    fn keeps_double_precision() {
        assert_eq!(
            Length::parse_str("0.1mm").unwrap(),
            Length::new(0.1, LengthUnit::Mm)
        );
        assert_eq!(
            Length::parse_str("123456789.123").unwrap(),
            Length::new(123456789.123, LengthUnit::Px)
        );
        assert_eq!(
            Length::parse_str("33.3333333%").unwrap(),
            Length::new(33.3333333, LengthUnit::Percent)
        );
    }

    #[test]
    fn unknown_unit_is_error() {
        assert!(Length::parse_str("3furlongs").is_err());
        assert!(Length::parse_str("thick").is_err());
    }
}
