//! Preparsed elements.
//!
//! An [`Element`] holds everything the renderer needs to draw one SVG element,
//! already decoded: the geometry, the style resolved from class rules, the `style`
//! attribute and the presentation attributes, and the parsed `transform`.  Elements are
//! stored in an [rctree](rctree) tree; see [`Node`].

use std::fmt;

use crate::css::ClassTable;
use crate::error::*;
use crate::parsers::{parse_attribute, NumberList, Parse};
use crate::path_builder::Path;
use crate::path_parser::{self, ErrorKind};
use crate::session::Session;
use crate::style::Style;
use crate::svg_log;
use crate::transform::TransformList;
use crate::xml::XmlElement;

/// Strong reference to an element in the preparsed tree.
pub type Node = rctree::Node<Element>;

/// Kind-specific geometry of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Svg,
    Group,
    Path(Path),
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    /// `<polygon>` if `closed`, `<polyline>` otherwise.
    Poly {
        points: Vec<(f64, f64)>,
        closed: bool,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
        ry: f64,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
    },
}

impl ElementKind {
    pub fn element_name(&self) -> &'static str {
        match *self {
            ElementKind::Svg => "svg",
            ElementKind::Group => "g",
            ElementKind::Path(_) => "path",
            ElementKind::Line { .. } => "line",
            ElementKind::Poly { closed: true, .. } => "polygon",
            ElementKind::Poly { closed: false, .. } => "polyline",
            ElementKind::Circle { .. } => "circle",
            ElementKind::Rect { .. } => "rect",
            ElementKind::Text { .. } => "text",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(*self, ElementKind::Svg | ElementKind::Group)
    }
}

/// A preparsed element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub id: Option<String>,
    pub style: Style,
    pub transform: TransformList,
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.element_name())?;
        write!(f, " id={}", self.id.as_deref().unwrap_or("None"))?;
        Ok(())
    }
}

impl Element {
    pub fn new(kind: ElementKind) -> Element {
        Element {
            kind,
            id: None,
            style: Style::default(),
            transform: TransformList::default(),
        }
    }

    pub fn element_name(&self) -> &'static str {
        self.kind.element_name()
    }

    /// Preparses one element of the markup.
    ///
    /// Returns `Ok(None)` for elements that are not drawn, like `<defs>`, `<style>` or
    /// gradients; their subtrees are not drawn either.
    pub fn from_xml(
        xml: &XmlElement,
        classes: &ClassTable,
        session: &Session,
    ) -> Result<Option<Element>, LoadingError> {
        let name = xml.name.as_str();
        let num = |attr: &str| number_attribute(xml, attr, session);

        let kind = match name {
            "svg" => ElementKind::Svg,
            "g" => ElementKind::Group,
            "path" => ElementKind::Path(parse_path_data(xml.attr("d").unwrap_or(""))?),
            "line" => ElementKind::Line {
                x1: num("x1").unwrap_or(0.0),
                y1: num("y1").unwrap_or(0.0),
                x2: num("x2").unwrap_or(0.0),
                y2: num("y2").unwrap_or(0.0),
            },
            "polygon" | "polyline" => ElementKind::Poly {
                points: points_attribute(xml, session),
                closed: name == "polygon",
            },
            "circle" => ElementKind::Circle {
                cx: num("cx").unwrap_or(0.0),
                cy: num("cy").unwrap_or(0.0),
                r: num("r").unwrap_or(0.0),
            },
            "rect" => {
                let rx = num("rx");
                let ry = num("ry");

                ElementKind::Rect {
                    x: num("x").unwrap_or(0.0),
                    y: num("y").unwrap_or(0.0),
                    width: num("width").unwrap_or(0.0),
                    height: num("height").unwrap_or(0.0),
                    rx: rx.or(ry).unwrap_or(0.0),
                    ry: ry.or(rx).unwrap_or(0.0),
                }
            }
            "text" => ElementKind::Text {
                x: num("x").unwrap_or(0.0),
                y: num("y").unwrap_or(0.0),
                text: xml.text(),
            },
            _ => return Ok(None),
        };

        let transform = match xml.attr("transform") {
            Some(value) if name != "svg" => {
                parse_attribute::<TransformList>(name, "transform", value)?
            }
            _ => TransformList::default(),
        };

        Ok(Some(Element {
            kind,
            id: xml.attr("id").map(String::from),
            style: preparse_style(xml, classes, session),
            transform,
        }))
    }
}

/// Resolves the style of an element, from lowest to highest precedence: class rules,
/// the `style` attribute, and presentation attributes.
pub fn preparse_style(xml: &XmlElement, classes: &ClassTable, session: &Session) -> Style {
    let mut style = match xml.attr("class") {
        Some(class) => classes.style_for(class, session),
        None => Style::default(),
    };

    if let Some(decls) = xml.attr("style") {
        style.parse_declarations(decls, session);
    }

    for (name, value) in &xml.attrs {
        style.set_presentation_attribute(name, value, session);
    }

    style
}

/// Parses path data, mapping errors to the ones reported when loading.
fn parse_path_data(d: &str) -> Result<Path, LoadingError> {
    let (path, result) = Path::parse(d);

    match result {
        Ok(()) => Ok(path),

        Err(path_parser::ParseError {
            position,
            kind: ErrorKind::UnsupportedCommand(c),
        }) => Err(LoadingError::UnsupportedPathCommand {
            element: "path".to_string(),
            position,
            command: char::from(c),
        }),

        Err(e) => Err(LoadingError::MalformedAttribute {
            element: "path".to_string(),
            attr: "d".to_string(),
            message: e.to_string(),
        }),
    }
}

/// Reads a numeric attribute; `None` if it is absent or invalid.
fn number_attribute(xml: &XmlElement, attr: &str, session: &Session) -> Option<f64> {
    let value = xml.attr(attr)?;

    match parse_attribute::<f64>(&xml.name, attr, value) {
        Ok(n) => Some(n),
        Err(e) => {
            svg_log!(session, "ignoring attribute: {}", e);
            None
        }
    }
}

fn points_attribute(xml: &XmlElement, session: &Session) -> Vec<(f64, f64)> {
    let value = xml.attr("points").unwrap_or("");

    let numbers = match NumberList::parse_str(value) {
        Ok(NumberList(v)) => v,
        Err(e) => {
            svg_log!(
                session,
                "ignoring attribute: <{}> points: {}",
                xml.name,
                ValueErrorKind::from(e)
            );
            Vec::new()
        }
    };

    numbers.chunks_exact(2).map(|c| (c[0], c[1])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_builder::PathCommand;
    use crate::transform::TransformOp;
    use crate::xml;

    fn preparse(source: &str) -> Result<Option<Element>, LoadingError> {
        preparse_with_css(source, "")
    }

    fn preparse_with_css(source: &str, css: &str) -> Result<Option<Element>, LoadingError> {
        let session = Session::new_for_test_suite();
        let xml = xml::parse(source).unwrap();
        Element::from_xml(&xml, &ClassTable::parse(css, &session), &session)
    }

    fn kind(source: &str) -> ElementKind {
        preparse(source).unwrap().unwrap().kind
    }

    #[test]
    fn preparses_shapes() {
        assert_eq!(
            kind(r#"<line x1="1" y1="2" x2="3"/>"#),
            ElementKind::Line { x1: 1.0, y1: 2.0, x2: 3.0, y2: 0.0 }
        );

        assert_eq!(
            kind(r#"<circle cx="5" cy="6" r="7"/>"#),
            ElementKind::Circle { cx: 5.0, cy: 6.0, r: 7.0 }
        );

        assert_eq!(
            kind(r#"<polygon points="0,0 10,0 10,10 5"/>"#),
            ElementKind::Poly {
                points: vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)],
                closed: true,
            }
        );

        assert_eq!(
            kind(r#"<text x="1" y="2">Go</text>"#),
            ElementKind::Text { x: 1.0, y: 2.0, text: "Go".to_string() }
        );
    }

    #[test]
    fn rect_radii_default_to_each_other() {
        let rect = |attrs: &str| match kind(&format!("<rect width=\"10\" height=\"5\" {attrs}/>")) {
            ElementKind::Rect { rx, ry, .. } => (rx, ry),
            k => panic!("unexpected {k:?}"),
        };

        assert_eq!(rect(""), (0.0, 0.0));
        assert_eq!(rect(r#"rx="2""#), (2.0, 2.0));
        assert_eq!(rect(r#"ry="3""#), (3.0, 3.0));
        assert_eq!(rect(r#"rx="1" ry="4""#), (1.0, 4.0));
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        assert_eq!(
            kind(r#"<circle cx="abc" cy="2" r=""/>"#),
            ElementKind::Circle { cx: 0.0, cy: 2.0, r: 0.0 }
        );

        assert_eq!(
            kind(r#"<polyline points="1 2 x 4"/>"#),
            ElementKind::Poly { points: vec![], closed: false }
        );
    }

    #[test]
    fn preparses_path_data() {
        match kind(r#"<path d="M1 2 h3"/>"#) {
            ElementKind::Path(path) => assert_eq!(
                path.iter().collect::<Vec<_>>(),
                vec![PathCommand::MoveTo(1.0, 2.0), PathCommand::LineTo(4.0, 2.0)]
            ),
            k => panic!("unexpected {k:?}"),
        }
    }

    #[test]
    fn path_errors_are_fatal() {
        assert_eq!(
            preparse(r#"<path d="M1 2 K 3"/>"#),
            Err(LoadingError::UnsupportedPathCommand {
                element: "path".to_string(),
                position: 5,
                command: 'K',
            })
        );

        assert!(matches!(
            preparse(r#"<path d="M1 2 L 3"/>"#),
            Err(LoadingError::MalformedAttribute { ref attr, .. }) if attr == "d"
        ));
    }

    #[test]
    fn transform_errors_are_fatal() {
        assert_eq!(
            preparse(r#"<g transform="skewX(30)"/>"#),
            Err(LoadingError::UnsupportedTransformCommand("skewX".to_string()))
        );

        assert!(matches!(
            preparse(r#"<rect transform="translate(one)"/>"#),
            Err(LoadingError::MalformedAttribute { ref attr, .. }) if attr == "transform"
        ));
    }

    #[test]
    fn parses_transform_and_id() {
        let e = preparse(r#"<g id="knob" transform="translate(1 2) scale(3)"/>"#)
            .unwrap()
            .unwrap();

        assert_eq!(e.id.as_deref(), Some("knob"));
        assert_eq!(
            e.transform,
            TransformList(vec![TransformOp::Translate(1.0, 2.0), TransformOp::Scale(3.0, 3.0)])
        );
    }

    #[test]
    fn skips_undrawn_elements() {
        assert_eq!(preparse("<defs/>"), Ok(None));
        assert_eq!(preparse("<linearGradient/>"), Ok(None));
        assert_eq!(preparse("<style>.a{}</style>"), Ok(None));
    }

    #[test]
    fn style_precedence() {
        let e = preparse_with_css(
            r#"<rect class="c" style="fill:blue; stroke: red" fill="green"/>"#,
            ".c { fill: red; opacity: 0.5 }",
        )
        .unwrap()
        .unwrap();

        assert_eq!(e.style.fill.as_deref(), Some("green"));
        assert_eq!(e.style.stroke.as_deref(), Some("red"));
        assert_eq!(e.style.opacity, Some(0.5));
    }
}
