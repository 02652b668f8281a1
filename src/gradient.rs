//! Gradient paint servers: `<linearGradient>` and `<radialGradient>`.
//!
//! Gradients are collected by id when the document is loaded, with their `<stop>`
//! elements already decoded.  A fill of the form `url(#id)` is resolved when it is
//! painted: the gradient's `xlink:href` chain is followed to fill in unspecified
//! attributes and stops, and the result is handed to the drawing surface as a
//! [`Paint::Gradient`].

use std::collections::HashMap;

use cssparser::Parser;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::color;
use crate::error::*;
use crate::parse_identifiers;
use crate::parsers::{NumberOrPercentage, Parse};
use crate::session::Session;
use crate::style::Style;
use crate::svg_log;
use crate::xml::XmlElement;

static URL_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^url\(#(.+)\)$").unwrap());

/// A color stop, with the stop opacity already folded into the color.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: String,
}

/// Geometry of a resolved gradient, in user space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GradientKind {
    Linear { x1: f64, y1: f64, x2: f64, y2: f64 },

    /// A radial gradient whose focus is its center, with a focal radius of 0.
    Radial { cx: f64, cy: f64, r: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: Vec<GradientStop>,
}

/// What a fill or stroke paints with.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    /// A color as written in the document, like `red` or `#0af`.
    Color(String),
    Gradient(Gradient),
}

impl Paint {
    pub fn color(c: &str) -> Paint {
        Paint::Color(c.to_string())
    }
}

/// `gradientUnits`
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum GradientUnits {
    UserSpaceOnUse,
    #[default]
    ObjectBoundingBox,
}

impl Parse for GradientUnits {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<GradientUnits, ParseError<'i>> {
        Ok(parse_identifiers!(
            parser,
            "userSpaceOnUse" => GradientUnits::UserSpaceOnUse,
            "objectBoundingBox" => GradientUnits::ObjectBoundingBox,
        )?)
    }
}

/// Parameters specific to each gradient type, before following references.
#[derive(Debug, Copy, Clone, PartialEq)]
enum UnresolvedVariant {
    Linear {
        x1: Option<f64>,
        y1: Option<f64>,
        x2: Option<f64>,
        y2: Option<f64>,
    },

    Radial {
        cx: Option<f64>,
        cy: Option<f64>,
        r: Option<f64>,
    },
}

impl UnresolvedVariant {
    fn resolve_from_fallback(&self, fallback: &UnresolvedVariant) -> UnresolvedVariant {
        match (*self, *fallback) {
            (
                UnresolvedVariant::Linear { x1, y1, x2, y2 },
                UnresolvedVariant::Linear {
                    x1: fx1,
                    y1: fy1,
                    x2: fx2,
                    y2: fy2,
                },
            ) => UnresolvedVariant::Linear {
                x1: x1.or(fx1),
                y1: y1.or(fy1),
                x2: x2.or(fx2),
                y2: y2.or(fy2),
            },

            (
                UnresolvedVariant::Radial { cx, cy, r },
                UnresolvedVariant::Radial {
                    cx: f_cx,
                    cy: f_cy,
                    r: f_r,
                },
            ) => UnresolvedVariant::Radial {
                cx: cx.or(f_cx),
                cy: cy.or(f_cy),
                r: r.or(f_r),
            },

            _ => *self, // If variants are of different types, then nothing to resolve
        }
    }

    // Unspecified geometry is 0
    fn into_resolved(self) -> GradientKind {
        match self {
            UnresolvedVariant::Linear { x1, y1, x2, y2 } => GradientKind::Linear {
                x1: x1.unwrap_or(0.0),
                y1: y1.unwrap_or(0.0),
                x2: x2.unwrap_or(0.0),
                y2: y2.unwrap_or(0.0),
            },

            UnresolvedVariant::Radial { cx, cy, r } => GradientKind::Radial {
                cx: cx.unwrap_or(0.0),
                cy: cy.unwrap_or(0.0),
                r: r.unwrap_or(0.0),
            },
        }
    }
}

/// A gradient element as written in the document.
///
/// Every field is optional; `None` means that the attribute was not specified, so it
/// may be inherited through `xlink:href`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedGradient {
    units: Option<GradientUnits>,
    transform: Option<String>,
    /// `None` if the element has no `<stop>` descendants.
    stops: Option<Vec<GradientStop>>,
    variant: UnresolvedVariant,
    fallback: Option<String>,
}

impl UnresolvedGradient {
    /// Reads a `<linearGradient>` or `<radialGradient>` element; `None` for other elements.
    pub fn from_xml(xml: &XmlElement, session: &Session) -> Option<UnresolvedGradient> {
        let num = |attr: &str| {
            let value = xml.attr(attr)?;
            match f64::parse_str(value) {
                Ok(n) => Some(n),
                Err(e) => {
                    svg_log!(
                        session,
                        "ignoring attribute: <{}> {}: {}",
                        xml.name,
                        attr,
                        ValueErrorKind::from(e)
                    );
                    None
                }
            }
        };

        let variant = match xml.name.as_str() {
            "linearGradient" => UnresolvedVariant::Linear {
                x1: num("x1"),
                y1: num("y1"),
                x2: num("x2"),
                y2: num("y2"),
            },

            "radialGradient" => UnresolvedVariant::Radial {
                cx: num("cx"),
                cy: num("cy"),
                r: num("r"),
            },

            _ => return None,
        };

        let units = xml.attr("gradientUnits").and_then(|v| match GradientUnits::parse_str(v) {
            Ok(u) => Some(u),
            Err(_) => {
                svg_log!(session, "ignoring gradientUnits=\"{}\" on <{}>", v, xml.name);
                None
            }
        });

        let fallback = xml
            .attr("xlink:href")
            .or_else(|| xml.attr("href"))
            .and_then(|href| match href.strip_prefix('#') {
                Some(id) => Some(id.to_string()),
                None => {
                    svg_log!(session, "ignoring non-local gradient reference \"{}\"", href);
                    None
                }
            });

        let mut stop_elements = Vec::new();
        for child in xml.elements() {
            child.walk(&mut |e| {
                if e.name == "stop" {
                    stop_elements.push(e);
                }
            });
        }

        let stops = if stop_elements.is_empty() {
            None
        } else {
            Some(
                stop_elements
                    .into_iter()
                    .filter_map(|e| parse_stop(e, session))
                    .collect(),
            )
        };

        Some(UnresolvedGradient {
            units,
            transform: xml.attr("gradientTransform").map(String::from),
            stops,
            variant,
            fallback,
        })
    }

    fn resolve_from_fallback(&self, fallback: &UnresolvedGradient) -> UnresolvedGradient {
        UnresolvedGradient {
            units: self.units.or(fallback.units),
            transform: self.transform.clone().or_else(|| fallback.transform.clone()),
            stops: self.stops.clone().or_else(|| fallback.stops.clone()),
            variant: self.variant.resolve_from_fallback(&fallback.variant),
            fallback: fallback.fallback.clone(),
        }
    }
}

/// Decodes a `<stop>`; stops without a valid offset are dropped.
fn parse_stop(stop: &XmlElement, session: &Session) -> Option<GradientStop> {
    let style = stop
        .attr("style")
        .map(|s| Style::from_declarations(s, session))
        .unwrap_or_default();

    let offset_str = stop.attr("offset").unwrap_or("0").trim();
    let offset = match NumberOrPercentage::parse_str(offset_str) {
        Ok(NumberOrPercentage { value }) => value,
        Err(_) => {
            svg_log!(session, "ignoring gradient stop with offset \"{}\"", offset_str);
            return None;
        }
    };

    let color = stop
        .attr("stop-color")
        .filter(|c| !c.is_empty())
        .or(style.stop_color.as_deref())
        .unwrap_or("#000");

    let opacity = match stop.attr("stop-opacity").filter(|o| !o.is_empty()) {
        Some(o) => match NumberOrPercentage::parse_str(o.trim()) {
            Ok(NumberOrPercentage { value }) => value,
            Err(_) => {
                svg_log!(session, "ignoring stop-opacity=\"{}\"", o);
                1.0
            }
        },
        None => style.stop_opacity.map_or(1.0, |o| o.value),
    };

    Some(GradientStop {
        offset,
        color: color::with_opacity(color::resolve_named(color), opacity),
    })
}

/// The gradients of a document, by id.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Gradients {
    by_id: HashMap<String, UnresolvedGradient>,
}

impl Gradients {
    /// Collects all the gradients with an id in the tree rooted at `root`.
    pub fn collect(root: &XmlElement, session: &Session) -> Gradients {
        let mut by_id = HashMap::new();

        root.walk(&mut |e| {
            if let Some(id) = e.attr("id") {
                if let Some(g) = UnresolvedGradient::from_xml(e, session) {
                    by_id.entry(id.to_string()).or_insert(g);
                }
            }
        });

        Gradients { by_id }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Resolves the gradient `id`, following its `xlink:href` chain.
    ///
    /// Returns `Ok(None)` if there is no gradient with that id.
    pub fn resolve(&self, id: &str, session: &Session) -> Result<Option<Gradient>, RenderingError> {
        let Some(mut gradient) = self.by_id.get(id).cloned() else {
            return Ok(None);
        };

        let mut visited = vec![id.to_string()];

        while let Some(fallback_id) = gradient.fallback.clone() {
            if visited.contains(&fallback_id) {
                svg_log!(session, "circular gradient reference to \"{}\"", fallback_id);
                break;
            }

            let Some(fallback) = self.by_id.get(&fallback_id) else {
                svg_log!(session, "gradient \"{}\" links to missing \"{}\"", id, fallback_id);
                break;
            };

            gradient = gradient.resolve_from_fallback(fallback);
            visited.push(fallback_id);
        }

        if gradient.units.unwrap_or_default() == GradientUnits::ObjectBoundingBox {
            return Err(RenderingError::UnsupportedGradientFeature(format!(
                "objectBoundingBox units in gradient \"{id}\""
            )));
        }

        if gradient.transform.as_deref().map_or(false, |t| !t.trim().is_empty()) {
            return Err(RenderingError::UnsupportedGradientFeature(format!(
                "gradientTransform in gradient \"{id}\""
            )));
        }

        Ok(Some(Gradient {
            kind: gradient.variant.into_resolved(),
            stops: gradient.stops.unwrap_or_default(),
        }))
    }

    /// Turns the value of a `fill` property into a paint.
    ///
    /// `url(#id)` references to gradients are resolved; a reference to anything else
    /// is passed through as a color, like any other value.
    pub fn resolve_fill(&self, fill: &str, session: &Session) -> Result<Paint, RenderingError> {
        if let Some(caps) = URL_REFERENCE.captures(fill) {
            match self.resolve(&caps[1], session)? {
                Some(gradient) => return Ok(Paint::Gradient(gradient)),
                None => svg_log!(session, "fill \"{}\" does not reference a gradient", fill),
            }
        }

        Ok(Paint::color(fill))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    fn gradients(source: &str) -> Gradients {
        Gradients::collect(&xml::parse(source).unwrap(), &Session::new_for_test_suite())
    }

    fn resolve(g: &Gradients, id: &str) -> Result<Option<Gradient>, RenderingError> {
        g.resolve(id, &Session::new_for_test_suite())
    }

    fn stop(offset: f64, color: &str) -> GradientStop {
        GradientStop {
            offset,
            color: color.to_string(),
        }
    }

    #[test]
    fn parses_gradient_units() {
        assert_eq!(
            GradientUnits::parse_str("userSpaceOnUse").unwrap(),
            GradientUnits::UserSpaceOnUse
        );
        assert!(GradientUnits::parse_str("foo").is_err());
    }

    #[test]
    fn resolves_linear_gradient() {
        let g = gradients(
            r##"<svg><defs>
              <linearGradient id="a" gradientUnits="userSpaceOnUse" x1="1" x2="10" y2="5">
                <stop offset="0" stop-color="red"/>
                <stop offset="50%" style="stop-color: #ff0000; stop-opacity: 0.5"/>
                <stop offset="bogus" stop-color="blue"/>
                <stop offset="1"/>
              </linearGradient>
            </defs></svg>"##,
        );

        assert_eq!(
            resolve(&g, "a"),
            Ok(Some(Gradient {
                kind: GradientKind::Linear { x1: 1.0, y1: 0.0, x2: 10.0, y2: 5.0 },
                stops: vec![
                    stop(0.0, "#FF0000"),
                    stop(0.5, "rgba(255,0,0,0.50)"),
                    stop(1.0, "#000"),
                ],
            }))
        );
    }

    #[test]
    fn follows_href_chain() {
        let g = gradients(
            r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink">
              <linearGradient id="base" gradientUnits="userSpaceOnUse" x2="100">
                <stop offset="0" stop-color="#fff" stop-opacity="25%"/>
              </linearGradient>
              <linearGradient id="mid" xlink:href="#base" x1="7"/>
              <linearGradient id="top" xlink:href="#mid" x1="3" y1="4"/>
              <linearGradient id="own" href="#base">
                <stop offset="1" stop-color="#123456"/>
              </linearGradient>
            </svg>"##,
        );

        assert_eq!(
            resolve(&g, "top"),
            Ok(Some(Gradient {
                kind: GradientKind::Linear { x1: 3.0, y1: 4.0, x2: 100.0, y2: 0.0 },
                stops: vec![stop(0.0, "rgba(255,255,255,0.25)")],
            }))
        );

        // local stops replace inherited ones
        assert_eq!(
            resolve(&g, "own").unwrap().unwrap().stops,
            vec![stop(1.0, "#123456")]
        );
    }

    #[test]
    fn radial_gradient() {
        let g = gradients(
            r##"<svg><radialGradient id="r" gradientUnits="userSpaceOnUse" cx="5" cy="6" r="7">
                <stop offset=".2" stop-color="navy"/>
            </radialGradient></svg>"##,
        );

        assert_eq!(
            resolve(&g, "r"),
            Ok(Some(Gradient {
                kind: GradientKind::Radial { cx: 5.0, cy: 6.0, r: 7.0 },
                stops: vec![stop(0.2, "#000080")],
            }))
        );
    }

    #[test]
    fn circular_references_terminate() {
        let g = gradients(
            r##"<svg>
              <linearGradient id="a" href="#b" gradientUnits="userSpaceOnUse"/>
              <linearGradient id="b" href="#a" x1="2"/>
              <linearGradient id="c" href="#missing" gradientUnits="userSpaceOnUse"/>
            </svg>"##,
        );

        assert_eq!(
            resolve(&g, "a").unwrap().unwrap().kind,
            GradientKind::Linear { x1: 2.0, y1: 0.0, x2: 0.0, y2: 0.0 }
        );
        assert!(resolve(&g, "c").unwrap().is_some());
    }

    #[test]
    fn unsupported_features_fail() {
        let g = gradients(
            r##"<svg>
              <linearGradient id="bbox"/>
              <linearGradient id="tr" gradientUnits="userSpaceOnUse" gradientTransform="rotate(10)"/>
              <radialGradient id="inherits" href="#tr"/>
            </svg>"##,
        );

        assert!(matches!(
            resolve(&g, "bbox"),
            Err(RenderingError::UnsupportedGradientFeature(_))
        ));
        assert!(matches!(
            resolve(&g, "tr"),
            Err(RenderingError::UnsupportedGradientFeature(_))
        ));
        assert!(matches!(
            resolve(&g, "inherits"),
            Err(RenderingError::UnsupportedGradientFeature(_))
        ));
    }

    #[test]
    fn fills_that_are_not_gradients_pass_through() {
        let session = Session::new_for_test_suite();
        let g = gradients(r##"<svg><rect id="r"/></svg>"##);

        assert_eq!(g.resolve_fill("red", &session), Ok(Paint::color("red")));
        assert_eq!(g.resolve_fill("url(#r)", &session), Ok(Paint::color("url(#r)")));
        assert_eq!(g.resolve_fill("url(#nope)", &session), Ok(Paint::color("url(#nope)")));
        assert!(g.is_empty());
    }
}
