//! The cascading renderer.
//!
//! A render pass walks a subtree of a [`Document`] and, for every element, draws its
//! geometry on the surface (if there is one) and collects its vertices into a
//! [`PointCloud`].  Each pass is parameterized by [`RenderOverrides`], which are
//! never stored in the document: per-element style overrides, displacements and
//! clips, a style for every element, and a few drawing options.
//!
//! The effective style of an element is, from lowest to highest precedence:
//!
//! * the base style inherited from its parent, with the element's own style on top;
//! * the overrides inherited from its parent, with `style_by_id[id]` and every
//!   `style_by_id["!other"]` where `other` is not the element's id on top;
//! * `element_style`.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::bbox::{Bounds, PointCloud};
use crate::document::Document;
use crate::drawing_ctx::RenderContext;
use crate::element::{Element, ElementKind, Node};
use crate::error::RenderingError;
use crate::gradient::Paint;
use crate::path_builder::{Path, PathCommand};
use crate::style::Style;
use crate::surface::Surface;
use crate::svg_log;
use crate::transform::{Transform, Transformable};
use crate::viewbox::ViewBox;

/// A runtime translation and rotation of one element.
///
/// With a non-zero `phi`, the element is rotated by `phi` radians about `pivot` and
/// then translated by `(dx, dy)` in the unrotated frame.  If `pivot` is `None`, the
/// center of the element's own bounds is used.  With a zero `phi` it is just a
/// translation.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Displacement {
    pub dx: f64,
    pub dy: f64,
    pub phi: f64,
    pub pivot: Option<(f64, f64)>,
}

impl Displacement {
    pub fn translate(dx: f64, dy: f64) -> Displacement {
        Displacement {
            dx,
            dy,
            ..Default::default()
        }
    }

    pub fn rotate(phi: f64) -> Displacement {
        Displacement {
            phi,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_pivot(self, x: f64, y: f64) -> Displacement {
        Displacement {
            pivot: Some((x, y)),
            ..self
        }
    }
}

/// A clipping rectangle, in the user space of the element it applies to.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct ClipRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The subtree that a render pass starts from.
#[derive(Debug, Clone, Copy)]
pub enum RenderTarget<'a> {
    /// The element with this id; nothing is rendered if there is none.
    Id(&'a str),
    Element(&'a Node),
}

/// Receives the simple shapes found while rendering.
///
/// Coordinates are in document space, after all transforms.
pub trait ShapeListener {
    /// A polyline, or a polygon if `closed`.
    ///
    /// Reported for `<line>`, `<polyline>`, `<polygon>`, and for each subpath of a
    /// `<path>` made only of straight segments.
    fn line(&mut self, _xs: &[f64], _ys: &[f64], _closed: bool) {}

    /// A `<circle>` that is still a circle after its transforms.
    fn circle(&mut self, _cx: f64, _cy: f64, _r: f64) {}
}

/// Options for one render pass.
///
/// Keys of the maps are element ids.  A key of the form `!other` in `style_by_id`
/// applies to every element whose id is not `other`, including elements without one.
#[derive(Default)]
pub struct RenderOverrides<'a> {
    pub style_by_id: HashMap<String, String>,
    pub displacement_by_id: HashMap<String, Displacement>,
    pub clip_by_id: HashMap<String, ClipRect>,
    /// Declarations applied to every element, with the highest precedence.
    pub element_style: Option<String>,
    /// Subtree to render instead of the whole document.
    pub target: Option<RenderTarget<'a>>,
    /// Stroke a black box around the points of each element.
    pub draw_bounding_box: bool,
    /// Paint for filled text that is not white; `silver` if unset.
    pub text_fill: Option<String>,
    /// Paint for stroked text; `black` if unset.
    pub text_stroke: Option<String>,
    /// Computes a transform from the view box, applied before anything else.
    pub global_transform: Option<&'a dyn Fn(&ViewBox) -> Transform>,
}

pub(crate) struct Renderer<'a, 'l> {
    doc: &'a Document,
    overrides: &'a RenderOverrides<'a>,
    style_by_id: HashMap<&'a str, Style>,
    style_by_negated_id: Vec<(&'a str, Style)>,
    element_style: Style,
    listener: Option<&'l mut dyn ShapeListener>,
}

/// Renders `doc` as directed by `overrides`.
pub(crate) fn render(
    doc: &Document,
    surface: Option<&mut dyn Surface>,
    overrides: &RenderOverrides<'_>,
    listener: Option<&mut dyn ShapeListener>,
) -> Result<PointCloud, RenderingError> {
    let node = match overrides.target {
        None => doc.root(),

        Some(RenderTarget::Element(node)) => node.clone(),

        Some(RenderTarget::Id(id)) => match doc.element_by_id(id) {
            Some(node) => node,
            None => {
                svg_log!(doc.session(), "nothing to render: no element with id \"{}\"", id);
                return Ok(PointCloud::new());
            }
        },
    };

    let mut renderer = Renderer::new(doc, overrides, listener);
    let mut ctx = RenderContext::new(surface);

    ctx.with_saved_state(|ctx| {
        if let Some(global_transform) = overrides.global_transform {
            Transformable::transform(ctx, &global_transform(&doc.view_box()));
        }

        renderer.apply_ancestors(ctx, &node)?;
        renderer.draw_node(ctx, &node, &Style::default(), &Style::default())
    })?;

    Ok(ctx.into_points())
}

/// Bounds of `node` in the user space of its parent, without any overrides.
fn measure(doc: &Document, node: &Node) -> Result<Bounds, RenderingError> {
    let overrides = RenderOverrides::default();
    let mut renderer = Renderer::new(doc, &overrides, None);
    let mut ctx = RenderContext::new(None);

    renderer.draw_node(&mut ctx, node, &Style::default(), &Style::default())?;

    Ok(ctx.points().bounds())
}

impl<'a, 'l> Renderer<'a, 'l> {
    fn new(
        doc: &'a Document,
        overrides: &'a RenderOverrides<'a>,
        listener: Option<&'l mut dyn ShapeListener>,
    ) -> Renderer<'a, 'l> {
        let session = doc.session();

        let mut style_by_id = HashMap::new();
        let mut style_by_negated_id = Vec::new();

        for (key, decls) in &overrides.style_by_id {
            let style = Style::from_declarations(decls, session);

            match key.strip_prefix('!') {
                Some(other) => style_by_negated_id.push((other, style)),
                None => {
                    style_by_id.insert(key.as_str(), style);
                }
            }
        }

        // keep the merge order independent of the map's iteration order
        style_by_negated_id.sort_by(|a, b| a.0.cmp(b.0));

        let element_style = overrides
            .element_style
            .as_deref()
            .map(|decls| Style::from_declarations(decls, session))
            .unwrap_or_default();

        Renderer {
            doc,
            overrides,
            style_by_id,
            style_by_negated_id,
            element_style,
            listener,
        }
    }

    /// Applies the displacements and transforms of the ancestors of `node`, from the
    /// root down, so that a subtree lands where it would in a full render.
    fn apply_ancestors(
        &mut self,
        ctx: &mut RenderContext<'_>,
        node: &Node,
    ) -> Result<(), RenderingError> {
        let mut ancestors: Vec<Node> = node.ancestors().skip(1).collect();
        ancestors.reverse();

        for ancestor in &ancestors {
            self.apply_displacement(ctx, ancestor)?;
            ancestor.borrow().transform.apply_to(ctx);
        }

        Ok(())
    }

    fn apply_displacement(
        &mut self,
        ctx: &mut RenderContext<'_>,
        node: &Node,
    ) -> Result<(), RenderingError> {
        let displacement = match node.borrow().id {
            Some(ref id) => self.overrides.displacement_by_id.get(id).copied(),
            None => None,
        };

        let Some(Displacement { dx, dy, phi, pivot }) = displacement else {
            return Ok(());
        };

        if phi != 0.0 {
            let (x0, y0) = match pivot {
                Some(pivot) => pivot,
                None => {
                    let bounds = measure(self.doc, node)?;
                    if bounds == Bounds::default() {
                        svg_log!(
                            self.doc.session(),
                            "{} has no points to rotate about; using the origin",
                            node.borrow()
                        );
                    }
                    bounds.center()
                }
            };

            ctx.translate(x0 + dx, y0 + dy);
            ctx.rotate(phi);
            ctx.translate(-x0, -y0);
        } else if dx != 0.0 || dy != 0.0 {
            ctx.translate(dx, dy);
        }

        Ok(())
    }

    fn overrides_for(&self, id: Option<&str>, parent_overridden: &Style) -> Style {
        let mut overridden = parent_overridden.clone();

        if let Some(style) = id.and_then(|id| self.style_by_id.get(id)) {
            overridden.merge(style);
        }

        for (other, style) in &self.style_by_negated_id {
            if id != Some(*other) {
                overridden.merge(style);
            }
        }

        overridden
    }

    fn draw_node(
        &mut self,
        ctx: &mut RenderContext<'_>,
        node: &Node,
        parent_base: &Style,
        parent_overridden: &Style,
    ) -> Result<(), RenderingError> {
        let element = node.borrow();
        let first_point = ctx.points_len();

        ctx.with_saved_state(|ctx| {
            self.apply_displacement(ctx, node)?;

            if let Some(clip) = element
                .id
                .as_ref()
                .and_then(|id| self.overrides.clip_by_id.get(id))
            {
                if let Some(s) = ctx.surface() {
                    s.begin_path();
                    s.rect(clip.x, clip.y, clip.width, clip.height);
                    s.clip();
                }
            }

            let base = parent_base.merged_with(&element.style);
            let overridden = self.overrides_for(element.id.as_deref(), parent_overridden);
            let style = base
                .merged_with(&overridden)
                .merged_with(&self.element_style);

            element.transform.apply_to(ctx);

            if element.kind.is_container() {
                for child in node.children() {
                    self.draw_node(ctx, &child, &base, &overridden)?;
                }
                Ok(())
            } else {
                self.draw_shape(ctx, &element, &style)
            }
        })?;

        if self.overrides.draw_bounding_box && ctx.points_len() > first_point {
            draw_bounding_box(ctx, first_point);
        }

        Ok(())
    }

    fn draw_shape(
        &mut self,
        ctx: &mut RenderContext<'_>,
        element: &Element,
        style: &Style,
    ) -> Result<(), RenderingError> {
        match element.kind {
            ElementKind::Svg | ElementKind::Group => Ok(()),

            ElementKind::Path(ref path) => self.draw_path(ctx, path, style),

            ElementKind::Line { x1, y1, x2, y2 } => {
                if let Some(s) = ctx.surface() {
                    s.begin_path();
                    s.move_to(x1, y1);
                    s.line_to(x2, y2);
                }
                self.paint(ctx, style)?;

                let p1 = ctx.add_point(x1, y1);
                let p2 = ctx.add_point(x2, y2);
                self.emit_line(&[p1.0, p2.0], &[p1.1, p2.1], false);

                Ok(())
            }

            ElementKind::Poly { ref points, closed } => {
                let [(x0, y0), ref rest @ ..] = points[..] else {
                    return Ok(());
                };

                if rest.is_empty() {
                    svg_log!(
                        self.doc.session(),
                        "skipping {} with a single point",
                        element
                    );
                    return Ok(());
                }

                if let Some(s) = ctx.surface() {
                    s.begin_path();
                    s.move_to(x0, y0);
                    for &(x, y) in rest {
                        s.line_to(x, y);
                    }
                    if closed {
                        s.close_path();
                    }
                }
                self.paint(ctx, style)?;

                let mut run = PointCloud::new();
                for &(x, y) in points {
                    let (x, y) = ctx.add_point(x, y);
                    run.push(x, y);
                }
                self.emit_line(&run.x, &run.y, closed);

                Ok(())
            }

            ElementKind::Circle { cx, cy, r } => {
                if let Some(s) = ctx.surface() {
                    s.begin_path();
                    s.arc(cx, cy, r, 0.0, 2.0 * PI, false);
                }
                self.paint(ctx, style)?;

                let corners = [
                    ctx.add_point(cx - r, cy - r),
                    ctx.add_point(cx - r, cy + r),
                    ctx.add_point(cx + r, cy - r),
                    ctx.add_point(cx + r, cy + r),
                ];

                if let Some((cx, cy, r)) = circle_from_corners(corners) {
                    if let Some(listener) = self.listener.as_deref_mut() {
                        listener.circle(cx, cy, r);
                    }
                }

                Ok(())
            }

            ElementKind::Rect {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => {
                if let Some(s) = ctx.surface() {
                    s.begin_path();
                    if rx > 0.0 || ry > 0.0 {
                        rounded_rect(s, x, y, width, height, rx, ry);
                    } else {
                        s.rect(x, y, width, height);
                    }
                }
                self.paint(ctx, style)?;

                ctx.add_point(x, y);
                ctx.add_point(x, y + height);
                ctx.add_point(x + width, y);
                ctx.add_point(x + width, y + height);

                Ok(())
            }

            ElementKind::Text { x, y, ref text } => {
                self.paint_text(ctx, style, text, x, y);
                ctx.add_point(x, y);
                Ok(())
            }
        }
    }

    fn draw_path(
        &mut self,
        ctx: &mut RenderContext<'_>,
        path: &Path,
        style: &Style,
    ) -> Result<(), RenderingError> {
        if path.is_empty() {
            svg_log!(self.doc.session(), "skipping path with no commands");
            return Ok(());
        }

        if let Some(s) = ctx.surface() {
            s.begin_path();
        }

        // Points of the current subpath, as long as it only has straight segments.
        let mut run = PointCloud::new();
        let mut straight = true;

        for cmd in path.iter() {
            match cmd {
                PathCommand::MoveTo(x, y) => {
                    if let Some(s) = ctx.surface() {
                        s.move_to(x, y);
                    }
                    let (x, y) = ctx.add_point(x, y);

                    if straight {
                        self.emit_line(&run.x, &run.y, false);
                    }
                    straight = true;
                    run = PointCloud::new();
                    run.push(x, y);
                }

                PathCommand::LineTo(x, y) => {
                    if let Some(s) = ctx.surface() {
                        s.line_to(x, y);
                    }
                    let (x, y) = ctx.add_point(x, y);
                    run.push(x, y);
                }

                PathCommand::CurveTo(curve) => {
                    if let Some(s) = ctx.surface() {
                        curve.to_surface(s);
                    }
                    ctx.add_point(curve.to.0, curve.to.1);
                    straight = false;
                }

                PathCommand::QuadTo(curve) => {
                    if let Some(s) = ctx.surface() {
                        curve.to_surface(s);
                    }
                    ctx.add_point(curve.to.0, curve.to.1);
                    straight = false;
                }

                PathCommand::Arc(arc) => {
                    let (mx, my) = arc.to_surface(ctx.surface());
                    ctx.add_point(mx, my);
                    ctx.add_point(arc.to.0, arc.to.1);
                    straight = false;
                }

                PathCommand::ClosePath => {
                    if let Some(s) = ctx.surface() {
                        s.close_path();
                    }

                    if straight {
                        self.emit_line(&run.x, &run.y, true);
                    }
                    straight = true;
                    run = PointCloud::new();
                }
            }
        }

        if straight {
            self.emit_line(&run.x, &run.y, false);
        }

        self.paint(ctx, style)
    }

    fn emit_line(&mut self, xs: &[f64], ys: &[f64], closed: bool) {
        if xs.len() > 1 {
            if let Some(listener) = self.listener.as_deref_mut() {
                listener.line(xs, ys, closed);
            }
        }
    }

    /// Fills and strokes the current path.
    fn paint(&self, ctx: &mut RenderContext<'_>, style: &Style) -> Result<(), RenderingError> {
        let Some(s) = ctx.surface() else {
            return Ok(());
        };

        if style.is_hidden() {
            return Ok(());
        }

        if let Some(opacity) = style.opacity {
            let alpha = s.global_alpha();
            s.set_global_alpha(alpha * opacity);
        }

        if style.paints_fill() {
            let paint = if style.fill_is_white() {
                Paint::color("white")
            } else {
                match style.fill {
                    Some(ref fill) => self
                        .doc
                        .gradients()
                        .resolve_fill(fill, self.doc.session())?,
                    None => Paint::color("black"),
                }
            };

            s.set_fill_style(&paint);
            s.fill();
        }

        if let Some(stroke) = style.stroke.as_deref().filter(|_| style.paints_stroke()) {
            s.set_line_width(style.line_width());
            s.set_stroke_style(&Paint::color(stroke));
            s.set_miter_limit(style.miter_limit());
            s.set_line_join(style.line_join());
            s.set_line_cap(style.line_cap());
            if let Some((dashes, offset)) = style.dash() {
                s.set_line_dash(dashes, offset);
            }
            s.stroke();
        }

        Ok(())
    }

    fn paint_text(&self, ctx: &mut RenderContext<'_>, style: &Style, text: &str, x: f64, y: f64) {
        let Some(s) = ctx.surface() else {
            return;
        };

        if style.is_hidden() {
            return;
        }

        s.set_font(&style.font());

        if style.paints_text_fill() {
            let fill = if style.fill_is_white() {
                "white"
            } else {
                self.overrides.text_fill.as_deref().unwrap_or("silver")
            };

            s.set_fill_style(&Paint::color(fill));
            s.fill_text(text, x, y);
        }

        if style.paints_stroke() {
            let stroke = self.overrides.text_stroke.as_deref().unwrap_or("black");

            s.set_stroke_style(&Paint::color(stroke));
            s.stroke_text(text, x, y);
        }
    }
}

/// Circular path with rounded corners of radius `min((rx + ry) / 2, min(w, h) / 2)`.
fn rounded_rect(s: &mut (dyn Surface + '_), x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64) {
    let r = ((rx + ry) / 2.0).min(w.min(h) / 2.0);

    s.move_to(x + w - r, y);
    s.arc(x + w - r, y + r, r, 1.5 * PI, 2.0 * PI, false);
    s.line_to(x + w, y + h - r);
    s.arc(x + w - r, y + h - r, r, 0.0, 0.5 * PI, false);
    s.line_to(x + r, y + h);
    s.arc(x + r, y + h - r, r, 0.5 * PI, PI, false);
    s.line_to(x, y + r);
    s.arc(x + r, y + r, r, PI, 1.5 * PI, false);
    s.close_path();
}

/// Given the transformed corners of a circle's bounding square, in the order
/// top-left, bottom-left, top-right, bottom-right, returns the transformed circle if
/// they still form a square.
///
/// The corners always form a parallelogram; it is a square when its diagonals have
/// the same length and are perpendicular.
fn circle_from_corners(p: [(f64, f64); 4]) -> Option<(f64, f64, f64)> {
    let d1 = (p[3].0 - p[0].0, p[3].1 - p[0].1);
    let d2 = (p[2].0 - p[1].0, p[2].1 - p[1].1);

    let d1_sq = d1.0 * d1.0 + d1.1 * d1.1;
    let d2_sq = d2.0 * d2.0 + d2.1 * d2.1;
    let dot = d1.0 * d2.0 + d1.1 * d2.1;

    if d1_sq + d2_sq == 0.0 {
        return None;
    }

    if (d1_sq - d2_sq).abs() / (d1_sq + d2_sq) < 1e-3 && dot.abs() / d1_sq < 1e-3 {
        Some((
            (p[0].0 + p[3].0) / 2.0,
            (p[0].1 + p[3].1) / 2.0,
            (d1_sq / 8.0).sqrt(),
        ))
    } else {
        None
    }
}

/// Strokes the bounds of the points added since `first_point`, in document space.
fn draw_bounding_box(ctx: &mut RenderContext<'_>, first_point: usize) {
    let b = ctx.points().bounds_since(first_point);
    let t = ctx.current_transform();

    let corners: Option<Vec<_>> = [
        (b.xmin, b.ymin),
        (b.xmax, b.ymin),
        (b.xmax, b.ymax),
        (b.xmin, b.ymax),
    ]
    .iter()
    .map(|&(x, y)| t.inverse_transform_point(x, y))
    .collect();

    let (Some(corners), Some(s)) = (corners, ctx.surface()) else {
        return;
    };

    s.save();
    s.begin_path();
    s.move_to(corners[0].0, corners[0].1);
    for &(x, y) in &corners[1..] {
        s.line_to(x, y);
    }
    s.close_path();
    s.set_stroke_style(&Paint::color("black"));
    s.set_line_width(1.0);
    s.stroke();
    s.restore();
}
