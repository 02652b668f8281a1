//! Parser for the `viewBox` attribute.

use cssparser::Parser;

use crate::error::*;
use crate::parsers::{NumberList, Parse};

/// The `viewBox` of the root `<svg>` element.
///
/// Documents without a valid `viewBox` get `0 0 1 1`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ViewBox {
    fn default() -> ViewBox {
        ViewBox {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

impl Parse for ViewBox {
    // viewBox: double [,] double [,] double [,] double
    //
    // Where width and height must be nonnegative.
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<ViewBox, ParseError<'i>> {
        let loc = parser.current_source_location();

        let NumberList(v) = NumberList::parse(parser)?;

        let [x, y, width, height] = v[..] else {
            return Err(loc.new_custom_error(ValueErrorKind::value_error(
                "expected four numbers",
            )));
        };

        if width >= 0.0 && height >= 0.0 {
            Ok(ViewBox {
                x,
                y,
                width,
                height,
            })
        } else {
            Err(loc.new_custom_error(ValueErrorKind::value_error(
                "width and height must not be negative",
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_viewboxes() {
        assert_eq!(
            ViewBox::parse_str("  1 2 3 4"),
            Ok(ViewBox {
                x: 1.0,
                y: 2.0,
                width: 3.0,
                height: 4.0
            })
        );

        assert_eq!(
            ViewBox::parse_str(" -1.5 -2.5e1,34,56e2  "),
            Ok(ViewBox {
                x: -1.5,
                y: -25.0,
                width: 34.0,
                height: 5600.0
            })
        );
    }

    #[test]
    fn parsing_invalid_viewboxes_yields_error() {
        assert!(ViewBox::parse_str(" 1,2,-3,-4 ").is_err());
        assert!(ViewBox::parse_str("qwerasdfzxcv").is_err());
        assert!(ViewBox::parse_str(" 1 2 3 4   5").is_err());
        assert!(ViewBox::parse_str(" 1 2 foo 3 4").is_err());
        assert!(ViewBox::parse_str("1 2 3").is_err());
    }

    #[test]
    fn default_is_unit_square() {
        assert_eq!(
            ViewBox::default(),
            ViewBox {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0
            }
        );
    }
}
