//! Main SVG document structure.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::bbox::{Bounds, PointCloud};
use crate::css::ClassTable;
use crate::element::{Element, Node};
use crate::error::{LoadingError, RenderingError};
use crate::gradient::Gradients;
use crate::parsers::Parse;
use crate::render::{self, RenderOverrides, RenderTarget, ShapeListener};
use crate::session::Session;
use crate::style::Style;
use crate::surface::Surface;
use crate::svg_log;
use crate::viewbox::ViewBox;
use crate::xml::{self, XmlElement};

/// Elements that are understood but never drawn.
const UNDRAWN_ELEMENTS: [&str; 8] = [
    "defs",
    "style",
    "linearGradient",
    "radialGradient",
    "stop",
    "title",
    "desc",
    "metadata",
];

/// A preparsed SVG document.
///
/// The document is immutable once parsed, and can be rendered any number of times
/// with different [`RenderOverrides`].  Lookups by id and element bounds are cached
/// as they are computed.
pub struct Document {
    /// Tree of elements; the root is an `<svg>` element.
    tree: Node,

    view_box: ViewBox,

    /// Class rules from all the `<style>` elements.
    classes: ClassTable,

    gradients: Gradients,

    session: Session,

    /// Ids that were successfully looked up.
    ids: RefCell<HashMap<String, Node>>,

    /// Bounds computed by `get_element_bounds`.
    bounds: RefCell<HashMap<String, Bounds>>,
}

impl Document {
    /// Parses a document, logging according to the environment.
    pub fn parse(source: &str) -> Result<Document, LoadingError> {
        Document::parse_with_session(source, Session::default())
    }

    pub fn parse_with_session(source: &str, session: Session) -> Result<Document, LoadingError> {
        let root = xml::parse(source)?;

        if root.name != "svg" {
            return Err(LoadingError::MalformedXml(format!(
                "root element is <{}>, not <svg>",
                root.name
            )));
        }

        let mut css = String::new();
        collect_css(&root, &mut css);
        let classes = ClassTable::parse(&css, &session);

        let gradients = Gradients::collect(&root, &session);

        let view_box = match root.attr("viewBox") {
            None => ViewBox::default(),
            Some(value) => ViewBox::parse_str(value).unwrap_or_else(|_| {
                svg_log!(session, "ignoring invalid viewBox \"{}\"", value);
                ViewBox::default()
            }),
        };

        let tree = build_tree(&root, &classes, &session)?.ok_or_else(|| {
            LoadingError::MalformedXml("the root element cannot be drawn".to_string())
        })?;

        Ok(Document {
            tree,
            view_box,
            classes,
            gradients,
            session,
            ids: RefCell::new(HashMap::new()),
            bounds: RefCell::new(HashMap::new()),
        })
    }

    /// Gets the root node.  This is guaranteed to be an `<svg>` element.
    pub fn root(&self) -> Node {
        self.tree.clone()
    }

    pub fn view_box(&self) -> ViewBox {
        self.view_box
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn gradients(&self) -> &Gradients {
        &self.gradients
    }

    /// The style given by the class rule for `name`, if there is one.
    pub fn class_style(&self, name: &str) -> Option<Style> {
        self.classes
            .get(name)
            .map(|decls| Style::from_declarations(decls, &self.session))
    }

    /// Looks up an element by its `id` attribute.
    ///
    /// If several elements have the same id, the first one in document order wins.
    pub fn element_by_id(&self, id: &str) -> Option<Node> {
        if let Some(node) = self.ids.borrow().get(id) {
            return Some(node.clone());
        }

        let node = find_descendant(&self.tree, id)?;
        self.ids.borrow_mut().insert(id.to_string(), node.clone());
        Some(node)
    }

    pub fn has_element(&self, id: &str) -> bool {
        self.element_by_id(id).is_some()
    }

    /// Whether the element `id` is `ancestor_id` or one of its descendants.
    ///
    /// Unlike the other queries, this fails if `ancestor_id` does not exist.
    pub fn has_ancestor(&self, id: &str, ancestor_id: &str) -> Result<bool, RenderingError> {
        let ancestor = self
            .element_by_id(ancestor_id)
            .ok_or_else(|| RenderingError::MissingElementId(ancestor_id.to_string()))?;

        Ok(find_descendant(&ancestor, id).is_some())
    }

    /// The ids of all the elements, in document order.
    pub fn ids(&self) -> Vec<String> {
        self.tree
            .descendants()
            .filter_map(|node| node.borrow().id.clone())
            .collect()
    }

    /// Renders the document, or the subtree given by `overrides.target`.
    ///
    /// Without a surface, only the points are collected.
    pub fn render(
        &self,
        surface: Option<&mut dyn Surface>,
        overrides: &RenderOverrides<'_>,
    ) -> Result<PointCloud, RenderingError> {
        render::render(self, surface, overrides, None)
    }

    /// Like [`Document::render`], reporting simple shapes to `listener`.
    pub fn render_with_listener(
        &self,
        surface: Option<&mut dyn Surface>,
        overrides: &RenderOverrides<'_>,
        listener: &mut dyn ShapeListener,
    ) -> Result<PointCloud, RenderingError> {
        render::render(self, surface, overrides, Some(listener))
    }

    /// Bounds of the element `id` in document space; all zeros if there is no such
    /// element or if it has no points.
    pub fn get_element_bounds(&self, id: &str) -> Bounds {
        if let Some(bounds) = self.bounds.borrow().get(id) {
            return *bounds;
        }

        let Some(node) = self.element_by_id(id) else {
            svg_log!(self.session, "no bounds for missing element id \"{}\"", id);
            return Bounds::default();
        };

        let overrides = RenderOverrides {
            target: Some(RenderTarget::Element(&node)),
            ..Default::default()
        };

        let bounds = match self.render(None, &overrides) {
            Ok(points) => points.bounds(),
            Err(e) => {
                svg_log!(self.session, "could not measure \"{}\": {}", id, e);
                Bounds::default()
            }
        };

        self.bounds.borrow_mut().insert(id.to_string(), bounds);
        bounds
    }

    /// Whether `(x, y)` is inside the bounding box of the element `id`.
    ///
    /// This is a test against the axis-aligned bounds, not against the exact shape.
    pub fn is_inside(&self, id: &str, x: f64, y: f64) -> bool {
        self.has_element(id) && self.get_element_bounds(id).contains(x, y)
    }
}

/// Concatenates the text of the `<style>` elements found under `<svg>` and `<defs>`.
fn collect_css(xml: &XmlElement, css: &mut String) {
    for child in xml.elements() {
        match child.name.as_str() {
            "style" => {
                css.push_str(&child.text());
                css.push('\n');
            }

            "svg" | "defs" => collect_css(child, css),

            _ => (),
        }
    }
}

/// Preparses `xml` and its descendants; `None` if the element is not drawn.
fn build_tree(
    xml: &XmlElement,
    classes: &ClassTable,
    session: &Session,
) -> Result<Option<Node>, LoadingError> {
    let Some(element) = Element::from_xml(xml, classes, session)? else {
        if !UNDRAWN_ELEMENTS.contains(&xml.name.as_str()) {
            svg_log!(session, "ignoring unknown element <{}>", xml.name);
        }
        return Ok(None);
    };

    let is_container = element.kind.is_container();
    let mut node = Node::new(element);

    if is_container {
        for child in xml.elements() {
            if let Some(child) = build_tree(child, classes, session)? {
                node.append(child);
            }
        }
    }

    Ok(Some(node))
}

fn find_descendant(root: &Node, id: &str) -> Option<Node> {
    root.descendants()
        .find(|node| node.borrow().id.as_deref() == Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(source: &str) -> Document {
        Document::parse_with_session(source, Session::new_for_test_suite()).unwrap()
    }

    #[test]
    fn collects_css_from_svg_and_defs() {
        let doc = load(
            r#"<svg>
  <style>.a { fill: red }</style>
  <defs><style>.b { stroke: blue }</style></defs>
  <g><style>.c { fill: green }</style></g>
</svg>"#,
        );

        assert_eq!(doc.class_style("a").unwrap().fill.as_deref(), Some("red"));
        assert_eq!(doc.class_style("b").unwrap().stroke.as_deref(), Some("blue"));
        assert!(doc.class_style("c").is_none());
    }

    #[test]
    fn parses_view_box() {
        assert_eq!(
            load(r#"<svg viewBox="0 0 100 50"/>"#).view_box(),
            ViewBox {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 50.0
            }
        );
        assert_eq!(load("<svg/>").view_box(), ViewBox::default());
        assert_eq!(load(r#"<svg viewBox="0 0 1"/>"#).view_box(), ViewBox::default());
    }

    #[test]
    fn root_must_be_svg() {
        assert!(matches!(
            Document::parse_with_session("<g/>", Session::new_for_test_suite()),
            Err(LoadingError::MalformedXml(_))
        ));
    }

    #[test]
    fn undrawn_subtrees_are_dropped() {
        let doc = load(
            r#"<svg>
  <defs><rect id="hidden"/></defs>
  <linearGradient id="lg"/>
  <foo><rect id="unknown"/></foo>
  <g id="g"><rect id="r"/></g>
</svg>"#,
        );

        assert!(!doc.has_element("hidden"));
        assert!(!doc.has_element("lg"));
        assert!(!doc.has_element("unknown"));
        assert!(doc.has_element("g"));
        assert_eq!(doc.ids(), ["g", "r"]);
    }

    #[test]
    fn first_id_wins() {
        let doc = load(r#"<svg><rect id="a" x="1"/><rect id="a" x="2"/></svg>"#);

        let node = doc.element_by_id("a").unwrap();
        assert_eq!(
            node.borrow().kind,
            crate::element::ElementKind::Rect {
                x: 1.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
                rx: 0.0,
                ry: 0.0
            }
        );
    }

    #[test]
    fn failed_lookups_are_not_cached() {
        let doc = load(r#"<svg><rect id="a"/></svg>"#);

        assert!(doc.element_by_id("b").is_none());
        assert!(doc.ids.borrow().get("b").is_none());

        assert!(doc.element_by_id("a").is_some());
        assert!(doc.ids.borrow().get("a").is_some());
    }

    #[test]
    fn ancestors() {
        let doc = load(r#"<svg id="root"><g id="g"><rect id="r"/></g><circle id="c"/></svg>"#);

        assert_eq!(doc.has_ancestor("r", "g"), Ok(true));
        assert_eq!(doc.has_ancestor("g", "g"), Ok(true));
        assert_eq!(doc.has_ancestor("c", "g"), Ok(false));
        assert_eq!(doc.has_ancestor("c", "root"), Ok(true));
        assert_eq!(doc.has_ancestor("missing", "g"), Ok(false));
        assert_eq!(
            doc.has_ancestor("r", "missing"),
            Err(RenderingError::MissingElementId("missing".to_string()))
        );
    }
}
