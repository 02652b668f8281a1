//! Presentation properties of elements.
//!
//! Widget art uses a handful of properties, so instead of a full CSS cascade there is a
//! single [`Style`] struct with one optional field per property.  A field that is `None`
//! was not specified; merging styles is last-writer-wins, field by field.
//!
//! Declarations come from four places, in increasing order of precedence when the
//! document is loaded: class rules from `<style>` elements, the `style` attribute, and
//! the presentation attributes `fill`, `stroke`, `stroke-width`, `stroke-dasharray` and
//! `stroke-dashoffset`.  At render time the renderer merges its own overrides on top.

use std::collections::HashSet;

use cssparser::Parser;

use crate::color;
use crate::css;
use crate::error::*;
use crate::length::Length;
use crate::parse_identifiers;
use crate::parsers::{NumberList, NumberOrPercentage, Parse};
use crate::session::Session;
use crate::svg_log;

/// `stroke-linejoin`
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl Parse for LineJoin {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<LineJoin, ParseError<'i>> {
        Ok(parse_identifiers!(
            parser,
            "miter" => LineJoin::Miter,
            "round" => LineJoin::Round,
            "bevel" => LineJoin::Bevel,
        )?)
    }
}

/// `stroke-linecap`
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl Parse for LineCap {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<LineCap, ParseError<'i>> {
        Ok(parse_identifiers!(
            parser,
            "butt" => LineCap::Butt,
            "round" => LineCap::Round,
            "square" => LineCap::Square,
        )?)
    }
}

/// `visibility`
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

impl Parse for Visibility {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Visibility, ParseError<'i>> {
        Ok(parse_identifiers!(
            parser,
            "visible" => Visibility::Visible,
            "hidden" => Visibility::Hidden,
            "collapse" => Visibility::Collapse,
        )?)
    }
}

fn raw(value: &str) -> Result<String, ValueErrorKind> {
    Ok(value.to_string())
}

fn parsed<T: Parse>(value: &str) -> Result<T, ValueErrorKind> {
    Ok(T::parse_str(value)?)
}

/// Generates the `Style` struct plus its by-name setter and its merge function.
///
/// Each entry is `"property-name" => field: Type = parser,` where the parser is a
/// `fn(&str) -> Result<Type, ValueErrorKind>`.
macro_rules! make_style {
    {
        $($name:literal => $field:ident: $ty:ty = $parse:ident,)+
    } => {
        /// Specified values for the supported properties.
        #[derive(Debug, Default, Clone, PartialEq)]
        pub struct Style {
            $(pub $field: Option<$ty>,)+
        }

        impl Style {
            /// Overwrites every field that is set in `other`.
            pub fn merge(&mut self, other: &Style) {
                $(
                    if other.$field.is_some() {
                        self.$field = other.$field.clone();
                    }
                )+
            }

            /// Sets a property by its CSS name.
            ///
            /// Returns `Ok(false)` if the property is not one that we support.
            pub fn set_property(
                &mut self,
                name: &str,
                value: &str,
            ) -> Result<bool, ValueErrorKind> {
                match name {
                    $(
                        $name => {
                            self.$field = Some($parse(value)?);
                            Ok(true)
                        }
                    )+

                    _ => Ok(false),
                }
            }
        }
    };
}

make_style! {
    "fill"              => fill: String = raw,
    "stroke"            => stroke: String = raw,
    "stroke-width"      => stroke_width: Length = parsed,
    "stroke-dasharray"  => stroke_dasharray: NumberList = parsed,
    "stroke-dashoffset" => stroke_dashoffset: f64 = parsed,
    "stroke-miterlimit" => stroke_miterlimit: f64 = parsed,
    "stroke-linejoin"   => stroke_linejoin: LineJoin = parsed,
    "stroke-linecap"    => stroke_linecap: LineCap = parsed,
    "opacity"           => opacity: f64 = parsed,
    "visibility"        => visibility: Visibility = parsed,
    "font-size"         => font_size: String = raw,
    "font-family"       => font_family: String = raw,
    "stop-color"        => stop_color: String = raw,
    "stop-opacity"      => stop_opacity: NumberOrPercentage = parsed,
}

/// Attributes that act as style declarations, with higher precedence than `style`.
pub const PRESENTATION_ATTRIBUTES: [&str; 5] = [
    "fill",
    "stroke",
    "stroke-width",
    "stroke-dasharray",
    "stroke-dashoffset",
];

/// Reference size for percentages in `stroke-width`.
const STROKE_WIDTH_REFERENCE: f64 = 100.0;

impl Style {
    /// Parses a declaration block like `fill: red; stroke: none`.
    pub fn from_declarations(decls: &str, session: &Session) -> Style {
        let mut style = Style::default();
        style.parse_declarations(decls, session);
        style
    }

    /// Applies the declarations in `decls` in order.
    ///
    /// Malformed declarations and unsupported properties are skipped.  Values that do
    /// not parse are logged and ignored, so the property keeps its previous value.  Once
    /// a property is set with `!important`, later declarations in the same block that
    /// lack it do not change it.
    pub fn parse_declarations(&mut self, decls: &str, session: &Session) {
        let mut important = HashSet::new();

        for decl in css::parse_declarations(decls, session) {
            let name = decl.name.as_ref();

            if !decl.important && important.contains(name) {
                svg_log!(session, "ignoring \"{}: {}\" after !important", name, decl.value);
                continue;
            }

            if self.set_logged(name, decl.value, session) && decl.important {
                important.insert(name.to_string());
            }
        }
    }

    /// Applies a presentation attribute; returns false if `name` is not one.
    ///
    /// Empty values are ignored.
    pub fn set_presentation_attribute(
        &mut self,
        name: &str,
        value: &str,
        session: &Session,
    ) -> bool {
        if !PRESENTATION_ATTRIBUTES.contains(&name) {
            return false;
        }

        let value = value.trim();
        if !value.is_empty() {
            self.set_logged(name, value, session);
        }

        true
    }

    /// Returns whether the property was set.
    fn set_logged(&mut self, name: &str, value: &str, session: &Session) -> bool {
        match self.set_property(name, value) {
            Ok(true) => true,
            Ok(false) => {
                svg_log!(session, "ignoring unsupported property \"{}\"", name);
                false
            }
            Err(e) => {
                svg_log!(session, "ignoring property \"{}: {}\": {}", name, value, e);
                false
            }
        }
    }

    /// Returns a copy of `self` with `other` merged on top.
    #[must_use]
    pub fn merged_with(&self, other: &Style) -> Style {
        let mut s = self.clone();
        s.merge(other);
        s
    }

    pub fn is_hidden(&self) -> bool {
        self.visibility == Some(Visibility::Hidden)
    }

    /// Whether shapes get filled; an unset fill paints the default black.
    pub fn paints_fill(&self) -> bool {
        self.fill.as_deref() != Some("none")
    }

    pub fn paints_stroke(&self) -> bool {
        matches!(self.stroke.as_deref(), Some(s) if s != "none")
    }

    /// Whether text gets filled; unlike shapes, text needs an explicit fill.
    pub fn paints_text_fill(&self) -> bool {
        matches!(self.fill.as_deref(), Some(s) if s != "none")
    }

    /// Whether the fill is one of the spellings of white that are painted literally
    /// as `white`.
    pub fn fill_is_white(&self) -> bool {
        self.fill.as_deref().map_or(false, color::is_white)
    }

    pub fn line_width(&self) -> f64 {
        self.stroke_width
            .map_or(1.0, |w| w.to_user(STROKE_WIDTH_REFERENCE))
    }

    pub fn miter_limit(&self) -> f64 {
        self.stroke_miterlimit.unwrap_or(4.0)
    }

    pub fn line_join(&self) -> LineJoin {
        self.stroke_linejoin.unwrap_or_default()
    }

    pub fn line_cap(&self) -> LineCap {
        self.stroke_linecap.unwrap_or_default()
    }

    /// The dash pattern, or `None` for solid strokes.
    pub fn dash(&self) -> Option<(&[f64], f64)> {
        self.stroke_dasharray
            .as_ref()
            .filter(|d| !d.0.is_empty())
            .map(|d| (d.0.as_slice(), self.stroke_dashoffset.unwrap_or(0.0)))
    }

    /// The font as `"<size> <family>"`.
    pub fn font(&self) -> String {
        format!(
            "{} {}",
            self.font_size.as_deref().unwrap_or("12px"),
            self.font_family.as_deref().unwrap_or("helvetica")
        )
    }
}
