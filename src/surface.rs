//! The drawing surface that documents render to.
//!
//! [`Surface`] is an immediate-mode, path-based canvas: paths are built with
//! `move_to`, `line_to` and friends and then filled or stroked with the current
//! state.  As on an HTML canvas, `fill` and `stroke` leave the current path in place,
//! so a shape can be filled and then stroked.
//!
//! [`RecordingSurface`] records every call, for tests and for the `trace` command of
//! the `widget-svg` tool.  With the `cairo` feature, `CairoSurface` draws on a
//! `cairo::Context`.

use std::fmt;

use crate::gradient::{GradientKind, Paint};
use crate::style::{LineCap, LineJoin};
use crate::transform::{Transform, Transformable};

pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);

    fn translate(&mut self, dx: f64, dy: f64);
    /// Rotation by `angle` radians.
    fn rotate(&mut self, angle: f64);
    fn scale(&mut self, sx: f64, sy: f64);
    /// Multiplies the current transform by `t`, which gets applied first.
    fn transform(&mut self, t: &Transform);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn bezier_curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, x1: f64, y1: f64, x: f64, y: f64);
    /// Adds a circular arc centered at `(xc, yc)` from angle `a1` to `a2`, joined to
    /// the current point by a straight line.
    fn arc(&mut self, xc: f64, yc: f64, r: f64, a1: f64, a2: f64, anticlockwise: bool);
    fn close_path(&mut self);
    /// Adds a closed rectangle subpath.
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn fill(&mut self);
    fn stroke(&mut self);
    /// Intersects the clip region with the current path.
    fn clip(&mut self);

    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn stroke_text(&mut self, text: &str, x: f64, y: f64);

    fn set_fill_style(&mut self, paint: &Paint);
    fn set_stroke_style(&mut self, paint: &Paint);
    fn set_line_width(&mut self, width: f64);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_miter_limit(&mut self, limit: f64);
    fn set_line_dash(&mut self, dashes: &[f64], offset: f64);
    fn global_alpha(&self) -> f64;
    fn set_global_alpha(&mut self, alpha: f64);
    /// Sets the font as `"<size> <family>"`, like `"12px helvetica"`.
    fn set_font(&mut self, font: &str);
}

impl Transformable for dyn Surface + '_ {
    fn translate(&mut self, dx: f64, dy: f64) {
        Surface::translate(self, dx, dy);
    }

    fn rotate(&mut self, angle: f64) {
        Surface::rotate(self, angle);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        Surface::scale(self, sx, sy);
    }

    fn transform(&mut self, t: &Transform) {
        Surface::transform(self, t);
    }
}

/// One call made on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Save,
    Restore,
    Translate(f64, f64),
    Rotate(f64),
    Scale(f64, f64),
    Transform(Transform),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    BezierCurveTo(f64, f64, f64, f64, f64, f64),
    QuadraticCurveTo(f64, f64, f64, f64),
    Arc {
        xc: f64,
        yc: f64,
        r: f64,
        a1: f64,
        a2: f64,
        anticlockwise: bool,
    },
    ClosePath,
    Rect(f64, f64, f64, f64),
    Fill,
    Stroke,
    Clip,
    FillText(String, f64, f64),
    StrokeText(String, f64, f64),
    FillStyle(Paint),
    StrokeStyle(Paint),
    LineWidth(f64),
    LineJoin(LineJoin),
    LineCap(LineCap),
    MiterLimit(f64),
    LineDash(Vec<f64>, f64),
    GlobalAlpha(f64),
    Font(String),
}

fn fmt_paint(f: &mut fmt::Formatter<'_>, paint: &Paint) -> fmt::Result {
    match paint {
        Paint::Color(c) => write!(f, "{c}"),

        Paint::Gradient(g) => {
            match g.kind {
                GradientKind::Linear { x1, y1, x2, y2 } => {
                    write!(f, "linear-gradient({x1}, {y1}, {x2}, {y2}")?
                }
                GradientKind::Radial { cx, cy, r } => write!(f, "radial-gradient({cx}, {cy}, {r}")?,
            }

            for stop in &g.stops {
                write!(f, ", {} {}", stop.color, stop.offset)?;
            }

            write!(f, ")")
        }
    }
}

impl fmt::Display for SurfaceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceOp::Save => write!(f, "save"),
            SurfaceOp::Restore => write!(f, "restore"),
            SurfaceOp::Translate(dx, dy) => write!(f, "translate {dx} {dy}"),
            SurfaceOp::Rotate(a) => write!(f, "rotate {a}"),
            SurfaceOp::Scale(sx, sy) => write!(f, "scale {sx} {sy}"),
            SurfaceOp::Transform(t) => write!(
                f,
                "transform {} {} {} {} {} {}",
                t.xx, t.yx, t.xy, t.yy, t.x0, t.y0
            ),
            SurfaceOp::BeginPath => write!(f, "begin_path"),
            SurfaceOp::MoveTo(x, y) => write!(f, "move_to {x} {y}"),
            SurfaceOp::LineTo(x, y) => write!(f, "line_to {x} {y}"),
            SurfaceOp::BezierCurveTo(x1, y1, x2, y2, x, y) => {
                write!(f, "bezier_curve_to {x1} {y1} {x2} {y2} {x} {y}")
            }
            SurfaceOp::QuadraticCurveTo(x1, y1, x, y) => {
                write!(f, "quadratic_curve_to {x1} {y1} {x} {y}")
            }
            SurfaceOp::Arc {
                xc,
                yc,
                r,
                a1,
                a2,
                anticlockwise,
            } => write!(f, "arc {xc} {yc} {r} {a1} {a2} {anticlockwise}"),
            SurfaceOp::ClosePath => write!(f, "close_path"),
            SurfaceOp::Rect(x, y, w, h) => write!(f, "rect {x} {y} {w} {h}"),
            SurfaceOp::Fill => write!(f, "fill"),
            SurfaceOp::Stroke => write!(f, "stroke"),
            SurfaceOp::Clip => write!(f, "clip"),
            SurfaceOp::FillText(s, x, y) => write!(f, "fill_text {s:?} {x} {y}"),
            SurfaceOp::StrokeText(s, x, y) => write!(f, "stroke_text {s:?} {x} {y}"),
            SurfaceOp::FillStyle(p) => {
                write!(f, "fill_style ")?;
                fmt_paint(f, p)
            }
            SurfaceOp::StrokeStyle(p) => {
                write!(f, "stroke_style ")?;
                fmt_paint(f, p)
            }
            SurfaceOp::LineWidth(w) => write!(f, "line_width {w}"),
            SurfaceOp::LineJoin(j) => write!(f, "line_join {j:?}"),
            SurfaceOp::LineCap(c) => write!(f, "line_cap {c:?}"),
            SurfaceOp::MiterLimit(l) => write!(f, "miter_limit {l}"),
            SurfaceOp::LineDash(d, o) => write!(f, "line_dash {d:?} {o}"),
            SurfaceOp::GlobalAlpha(a) => write!(f, "global_alpha {a}"),
            SurfaceOp::Font(s) => write!(f, "font {s:?}"),
        }
    }
}

/// A surface that records the calls made on it.
///
/// The global alpha is tracked through `save`/`restore` like on a canvas, since the
/// renderer reads it back.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    ops: Vec<SurfaceOp>,
    global_alpha: f64,
    saved_alpha: Vec<f64>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    pub fn new() -> RecordingSurface {
        RecordingSurface {
            ops: Vec::new(),
            global_alpha: 1.0,
            saved_alpha: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Returns the recorded calls and starts over with an empty list.
    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    fn push(&mut self, op: SurfaceOp) {
        self.ops.push(op);
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.saved_alpha.push(self.global_alpha);
        self.push(SurfaceOp::Save);
    }

    fn restore(&mut self) {
        if let Some(alpha) = self.saved_alpha.pop() {
            self.global_alpha = alpha;
        }
        self.push(SurfaceOp::Restore);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.push(SurfaceOp::Translate(dx, dy));
    }

    fn rotate(&mut self, angle: f64) {
        self.push(SurfaceOp::Rotate(angle));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.push(SurfaceOp::Scale(sx, sy));
    }

    fn transform(&mut self, t: &Transform) {
        self.push(SurfaceOp::Transform(*t));
    }

    fn begin_path(&mut self) {
        self.push(SurfaceOp::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push(SurfaceOp::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push(SurfaceOp::LineTo(x, y));
    }

    fn bezier_curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.push(SurfaceOp::BezierCurveTo(x1, y1, x2, y2, x, y));
    }

    fn quadratic_curve_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        self.push(SurfaceOp::QuadraticCurveTo(x1, y1, x, y));
    }

    fn arc(&mut self, xc: f64, yc: f64, r: f64, a1: f64, a2: f64, anticlockwise: bool) {
        self.push(SurfaceOp::Arc {
            xc,
            yc,
            r,
            a1,
            a2,
            anticlockwise,
        });
    }

    fn close_path(&mut self) {
        self.push(SurfaceOp::ClosePath);
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push(SurfaceOp::Rect(x, y, width, height));
    }

    fn fill(&mut self) {
        self.push(SurfaceOp::Fill);
    }

    fn stroke(&mut self) {
        self.push(SurfaceOp::Stroke);
    }

    fn clip(&mut self) {
        self.push(SurfaceOp::Clip);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.push(SurfaceOp::FillText(text.to_string(), x, y));
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        self.push(SurfaceOp::StrokeText(text.to_string(), x, y));
    }

    fn set_fill_style(&mut self, paint: &Paint) {
        self.push(SurfaceOp::FillStyle(paint.clone()));
    }

    fn set_stroke_style(&mut self, paint: &Paint) {
        self.push(SurfaceOp::StrokeStyle(paint.clone()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(SurfaceOp::LineWidth(width));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.push(SurfaceOp::LineJoin(join));
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.push(SurfaceOp::LineCap(cap));
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.push(SurfaceOp::MiterLimit(limit));
    }

    fn set_line_dash(&mut self, dashes: &[f64], offset: f64) {
        self.push(SurfaceOp::LineDash(dashes.to_vec(), offset));
    }

    fn global_alpha(&self) -> f64 {
        self.global_alpha
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.global_alpha = alpha;
        self.push(SurfaceOp::GlobalAlpha(alpha));
    }

    fn set_font(&mut self, font: &str) {
        self.push(SurfaceOp::Font(font.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::{Gradient, GradientStop};

    #[test]
    fn records_calls() {
        let mut s = RecordingSurface::new();

        s.begin_path();
        s.move_to(1.0, 2.0);
        s.arc(0.0, 0.0, 1.0, 0.0, 1.5, true);
        s.fill();

        assert_eq!(
            s.ops(),
            &[
                SurfaceOp::BeginPath,
                SurfaceOp::MoveTo(1.0, 2.0),
                SurfaceOp::Arc {
                    xc: 0.0,
                    yc: 0.0,
                    r: 1.0,
                    a1: 0.0,
                    a2: 1.5,
                    anticlockwise: true,
                },
                SurfaceOp::Fill,
            ]
        );

        assert_eq!(s.take_ops().len(), 4);
        assert!(s.ops().is_empty());
    }

    #[test]
    fn global_alpha_follows_save_and_restore() {
        let mut s = RecordingSurface::new();

        s.save();
        s.set_global_alpha(0.5);
        s.save();
        s.set_global_alpha(s.global_alpha() * 0.5);
        assert_eq!(s.global_alpha(), 0.25);

        s.restore();
        assert_eq!(s.global_alpha(), 0.5);
        s.restore();
        assert_eq!(s.global_alpha(), 1.0);

        // unbalanced restores are harmless
        s.restore();
        assert_eq!(s.global_alpha(), 1.0);
    }

    #[test]
    fn transformable_forwards_to_surface() {
        let mut s = RecordingSurface::new();

        {
            let surface: &mut dyn Surface = &mut s;
            Transformable::translate(surface, 1.0, 2.0);
            Transformable::rotate(surface, 0.5);
        }

        assert_eq!(s.ops(), &[SurfaceOp::Translate(1.0, 2.0), SurfaceOp::Rotate(0.5)]);
    }

    #[test]
    fn formats_ops() {
        assert_eq!(SurfaceOp::MoveTo(1.5, -2.0).to_string(), "move_to 1.5 -2");
        assert_eq!(
            SurfaceOp::FillStyle(Paint::color("red")).to_string(),
            "fill_style red"
        );
        assert_eq!(
            SurfaceOp::FillStyle(Paint::Gradient(Gradient {
                kind: GradientKind::Radial { cx: 1.0, cy: 2.0, r: 3.0 },
                stops: vec![GradientStop {
                    offset: 0.5,
                    color: "#000".to_string(),
                }],
            }))
            .to_string(),
            "fill_style radial-gradient(1, 2, 3, #000 0.5)"
        );
        assert_eq!(
            SurfaceOp::FillText("Go".to_string(), 1.0, 2.0).to_string(),
            "fill_text \"Go\" 1 2"
        );
    }
}
