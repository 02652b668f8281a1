//! CSS color values.
//!
//! Colors are kept as strings all the way to the drawing surface, which takes one
//! color string per fill, stroke or gradient stop.  This module only knows how to
//! look up named colors and how to fold a separate opacity into an `rgba()`/`hsla()`
//! string.

use std::collections::HashMap;

use cssparser::Parser;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::*;
use crate::parsers::Parse;

/// SVG 1.1 color keywords and their sRGB values.
static NAMED_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("aliceblue", "#F0F8FF"),
        ("antiquewhite", "#FAEBD7"),
        ("aqua", "#00FFFF"),
        ("aquamarine", "#7FFFD4"),
        ("azure", "#F0FFFF"),
        ("beige", "#F5F5DC"),
        ("bisque", "#FFE4C4"),
        ("black", "#000000"),
        ("blanchedalmond", "#FFEBCD"),
        ("blue", "#0000FF"),
        ("blueviolet", "#8A2BE2"),
        ("brown", "#A52A2A"),
        ("burlywood", "#DEB887"),
        ("cadetblue", "#5F9EA0"),
        ("chartreuse", "#7FFF00"),
        ("chocolate", "#D2691E"),
        ("coral", "#FF7F50"),
        ("cornflowerblue", "#6495ED"),
        ("cornsilk", "#FFF8DC"),
        ("crimson", "#DC143C"),
        ("cyan", "#00FFFF"),
        ("darkblue", "#00008B"),
        ("darkcyan", "#008B8B"),
        ("darkgoldenrod", "#B8860B"),
        ("darkgray", "#A9A9A9"),
        ("darkgreen", "#006400"),
        ("darkgrey", "#A9A9A9"),
        ("darkkhaki", "#BDB76B"),
        ("darkmagenta", "#8B008B"),
        ("darkolivegreen", "#556B2F"),
        ("darkorange", "#FF8C00"),
        ("darkorchid", "#9932CC"),
        ("darkred", "#8B0000"),
        ("darksalmon", "#E9967A"),
        ("darkseagreen", "#8FBC8F"),
        ("darkslateblue", "#483D8B"),
        ("darkslategray", "#2F4F4F"),
        ("darkslategrey", "#2F4F4F"),
        ("darkturquoise", "#00CED1"),
        ("darkviolet", "#9400D3"),
        ("deeppink", "#FF1493"),
        ("deepskyblue", "#00BFFF"),
        ("dimgray", "#696969"),
        ("dimgrey", "#696969"),
        ("dodgerblue", "#1E90FF"),
        ("firebrick", "#B22222"),
        ("floralwhite", "#FFFAF0"),
        ("forestgreen", "#228B22"),
        ("fuchsia", "#FF00FF"),
        ("gainsboro", "#DCDCDC"),
        ("ghostwhite", "#F8F8FF"),
        ("gold", "#FFD700"),
        ("goldenrod", "#DAA520"),
        ("gray", "#808080"),
        ("green", "#008000"),
        ("greenyellow", "#ADFF2F"),
        ("grey", "#808080"),
        ("honeydew", "#F0FFF0"),
        ("hotpink", "#FF69B4"),
        ("indianred", "#CD5C5C"),
        ("indigo", "#4B0082"),
        ("ivory", "#FFFFF0"),
        ("khaki", "#F0E68C"),
        ("lavender", "#E6E6FA"),
        ("lavenderblush", "#FFF0F5"),
        ("lawngreen", "#7CFC00"),
        ("lemonchiffon", "#FFFACD"),
        ("lightblue", "#ADD8E6"),
        ("lightcoral", "#F08080"),
        ("lightcyan", "#E0FFFF"),
        ("lightgoldenrodyellow", "#FAFAD2"),
        ("lightgray", "#D3D3D3"),
        ("lightgreen", "#90EE90"),
        ("lightgrey", "#D3D3D3"),
        ("lightpink", "#FFB6C1"),
        ("lightsalmon", "#FFA07A"),
        ("lightseagreen", "#20B2AA"),
        ("lightskyblue", "#87CEFA"),
        ("lightslategray", "#778899"),
        ("lightslategrey", "#778899"),
        ("lightsteelblue", "#B0C4DE"),
        ("lightyellow", "#FFFFE0"),
        ("lime", "#00FF00"),
        ("limegreen", "#32CD32"),
        ("linen", "#FAF0E6"),
        ("magenta", "#FF00FF"),
        ("maroon", "#800000"),
        ("mediumaquamarine", "#66CDAA"),
        ("mediumblue", "#0000CD"),
        ("mediumorchid", "#BA55D3"),
        ("mediumpurple", "#9370DB"),
        ("mediumseagreen", "#3CB371"),
        ("mediumslateblue", "#7B68EE"),
        ("mediumspringgreen", "#00FA9A"),
        ("mediumturquoise", "#48D1CC"),
        ("mediumvioletred", "#C71585"),
        ("midnightblue", "#191970"),
        ("mintcream", "#F5FFFA"),
        ("mistyrose", "#FFE4E1"),
        ("moccasin", "#FFE4B5"),
        ("navajowhite", "#FFDEAD"),
        ("navy", "#000080"),
        ("oldlace", "#FDF5E6"),
        ("olive", "#808000"),
        ("olivedrab", "#6B8E23"),
        ("orange", "#FFA500"),
        ("orangered", "#FF4500"),
        ("orchid", "#DA70D6"),
        ("palegoldenrod", "#EEE8AA"),
        ("palegreen", "#98FB98"),
        ("paleturquoise", "#AFEEEE"),
        ("palevioletred", "#DB7093"),
        ("papayawhip", "#FFEFD5"),
        ("peachpuff", "#FFDAB9"),
        ("peru", "#CD853F"),
        ("pink", "#FFC0CB"),
        ("plum", "#DDA0DD"),
        ("powderblue", "#B0E0E6"),
        ("purple", "#800080"),
        ("red", "#FF0000"),
        ("rosybrown", "#BC8F8F"),
        ("royalblue", "#4169E1"),
        ("saddlebrown", "#8B4513"),
        ("salmon", "#FA8072"),
        ("sandybrown", "#F4A460"),
        ("seagreen", "#2E8B57"),
        ("seashell", "#FFF5EE"),
        ("sienna", "#A0522D"),
        ("silver", "#C0C0C0"),
        ("skyblue", "#87CEEB"),
        ("slateblue", "#6A5ACD"),
        ("slategray", "#708090"),
        ("slategrey", "#708090"),
        ("snow", "#FFFAFA"),
        ("springgreen", "#00FF7F"),
        ("steelblue", "#4682B4"),
        ("tan", "#D2B48C"),
        ("teal", "#008080"),
        ("thistle", "#D8BFD8"),
        ("tomato", "#FF6347"),
        ("turquoise", "#40E0D0"),
        ("violet", "#EE82EE"),
        ("wheat", "#F5DEB3"),
        ("white", "#FFFFFF"),
        ("whitesmoke", "#F5F5F5"),
        ("yellow", "#FFFF00"),
        ("yellowgreen", "#9ACD32"),
    ]
    .into_iter()
    .collect()
});

static HEX3: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#([0-9a-f])([0-9a-f])([0-9a-f])$").unwrap());

static HEX6: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#([0-9a-f]{2})([0-9a-f]{2})([0-9a-f]{2})$").unwrap());

static FUNCTIONAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(rgb|hsl)\(\s*(\d+%?)(?:\s*,\s*|\s+)(\d+%?)(?:\s*,\s*|\s+)(\d+%?)\s*\)$")
        .unwrap()
});

/// Looks up a color keyword such as `"tomato"`; returns its `#RRGGBB` value.
pub fn named_color(name: &str) -> Option<&'static str> {
    NAMED_COLORS.get(name).copied()
}

/// Replaces a color keyword by its hex value; other strings pass through.
pub fn resolve_named(color: &str) -> &str {
    named_color(color).unwrap_or(color)
}

/// Whether a fill is one of the spellings of white that get painted as the literal
/// `"white"`.
///
/// The comparison is exact; `#FFF` or `rgb(255,255,255)` are not affected.
pub fn is_white(color: &str) -> bool {
    matches!(color, "white" | "#fff" | "#ffffff")
}

/// Folds `opacity` into `color`.
///
/// `#rgb` and `#rrggbb` become `rgba(r,g,b,a)`, `rgb(...)` and `hsl(...)` become
/// `rgba(...)` and `hsla(...)`; the alpha is printed with two decimals.  Any other
/// color, or an opacity of exactly 1, is returned unchanged.
pub fn with_opacity(color: &str, opacity: f64) -> String {
    if opacity == 1.0 {
        return color.to_string();
    }

    let alpha = format!("{opacity:.2}");

    if let Some(caps) = HEX3.captures(color) {
        let channel = |i: usize| u8::from_str_radix(&caps[i], 16).map(|c| u32::from(c) * 17);

        if let (Ok(r), Ok(g), Ok(b)) = (channel(1), channel(2), channel(3)) {
            return format!("rgba({r},{g},{b},{alpha})");
        }
    }

    if let Some(caps) = HEX6.captures(color) {
        let channel = |i: usize| u8::from_str_radix(&caps[i], 16);

        if let (Ok(r), Ok(g), Ok(b)) = (channel(1), channel(2), channel(3)) {
            return format!("rgba({r},{g},{b},{alpha})");
        }
    }

    if let Some(caps) = FUNCTIONAL.captures(color) {
        let func = caps[1].to_ascii_lowercase();
        return format!("{func}a({},{},{},{alpha})", &caps[2], &caps[3], &caps[4]);
    }

    color.to_string()
}

/// Used by drawing backends, which need the channels of a color string.
impl Parse for cssparser::RGBA {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<cssparser::RGBA, ParseError<'i>> {
        let loc = parser.current_source_location();

        match cssparser::Color::parse(parser)? {
            cssparser::Color::RGBA(rgba) => Ok(rgba),
            cssparser::Color::CurrentColor => Err(loc.new_custom_error(ValueErrorKind::Value(
                "currentColor is not allowed here".to_string(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_named_colors() {
        assert_eq!(named_color("tomato"), Some("#FF6347"));
        assert_eq!(named_color("white"), Some("#FFFFFF"));
        assert_eq!(named_color("notacolor"), None);
        assert_eq!(resolve_named("#123456"), "#123456");
    }

    #[test]
    fn white_spellings() {
        assert!(is_white("white"));
        assert!(is_white("#fff"));
        assert!(is_white("#ffffff"));
        assert!(!is_white("#FFFFFF"));
        assert!(!is_white("#fffffe"));
    }

    #[test]
    fn folds_opacity_into_hex() {
        assert_eq!(with_opacity("#ff0000", 0.5), "rgba(255,0,0,0.50)");
        assert_eq!(with_opacity("#F00", 0.25), "rgba(255,0,0,0.25)");
        assert_eq!(with_opacity("#0a0B0c", 0.0), "rgba(10,11,12,0.00)");
    }

    #[test]
    fn folds_opacity_into_functional_colors() {
        assert_eq!(with_opacity("rgb(1, 2, 3)", 0.5), "rgba(1,2,3,0.50)");
        assert_eq!(with_opacity("hsl(120 50% 50%)", 0.75), "hsla(120,50%,50%,0.75)");
    }

    #[test]
    fn opaque_or_unknown_colors_pass_through() {
        assert_eq!(with_opacity("#ff0000", 1.0), "#ff0000");
        assert_eq!(with_opacity("currentColor", 0.5), "currentColor");
    }

    #[test]
    fn parses_folded_colors() {
        let rgba = cssparser::RGBA::parse_str(&with_opacity("#ff0000", 0.5)).unwrap();
        assert_eq!((rgba.red, rgba.green, rgba.blue), (255, 0, 0));
        assert!((rgba.alpha_f32() - 0.5).abs() < 0.01);

        assert!(cssparser::RGBA::parse_str(resolve_named("tomato")).is_ok());
        assert!(cssparser::RGBA::parse_str("currentColor").is_err());
        assert!(cssparser::RGBA::parse_str("url(#g)").is_err());
    }
}
