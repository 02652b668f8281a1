//! A [`Surface`] that draws with cairo.
//!
//! Cairo has a single source and a path that `fill` and `stroke` consume, while
//! [`Surface`] behaves like an HTML canvas: separate fill and stroke styles, a global
//! alpha, and a path that survives painting.  [`CairoSurface`] keeps the canvas state
//! next to the `cairo::Context` and translates each call.
//!
//! The trait's methods cannot fail.  Cairo errors put the context in an error state
//! that makes later calls no-ops; check [`CairoSurface::status`] when done.

use cssparser::RGBA;

use crate::gradient::{Gradient, GradientKind, Paint};
use crate::length::Length;
use crate::parsers::Parse;
use crate::style::{LineCap, LineJoin};
use crate::surface::Surface;
use crate::transform::Transform;

/// Canvas state that cairo does not track.
#[derive(Debug, Clone)]
struct CanvasState {
    global_alpha: f64,
    fill: Paint,
    stroke: Paint,
}

impl Default for CanvasState {
    fn default() -> Self {
        CanvasState {
            global_alpha: 1.0,
            fill: Paint::color("black"),
            stroke: Paint::color("black"),
        }
    }
}

pub struct CairoSurface<'a> {
    cr: &'a cairo::Context,
    state: CanvasState,
    saved: Vec<CanvasState>,
}

impl<'a> CairoSurface<'a> {
    pub fn new(cr: &'a cairo::Context) -> CairoSurface<'a> {
        CairoSurface {
            cr,
            state: CanvasState::default(),
            saved: Vec::new(),
        }
    }

    /// The error state of the underlying context.
    pub fn status(&self) -> Result<(), cairo::Error> {
        self.cr.status()
    }

    fn set_source(&self, paint: &Paint) {
        let alpha = self.state.global_alpha;

        match paint {
            Paint::Color(color) => {
                // unparsable colors paint nothing, like on a canvas
                let rgba = RGBA::parse_str(color).unwrap_or(RGBA::new(0, 0, 0, 0));
                self.cr.set_source_rgba(
                    f64::from(rgba.red_f32()),
                    f64::from(rgba.green_f32()),
                    f64::from(rgba.blue_f32()),
                    f64::from(rgba.alpha_f32()) * alpha,
                );
            }

            Paint::Gradient(gradient) => {
                let _ = self.cr.set_source(&cairo_gradient(gradient, alpha));
            }
        }
    }

    /// Runs `f` on an empty path, and puts the current path back afterwards.
    fn with_own_path(&self, f: impl FnOnce(&cairo::Context)) {
        let path = self.cr.copy_path();
        self.cr.new_path();

        f(self.cr);

        self.cr.new_path();
        if let Ok(path) = path {
            self.cr.append_path(&path);
        }
    }
}

fn cairo_gradient(gradient: &Gradient, global_alpha: f64) -> cairo::Gradient {
    let g = match gradient.kind {
        GradientKind::Linear { x1, y1, x2, y2 } => {
            cairo::Gradient::clone(&cairo::LinearGradient::new(x1, y1, x2, y2))
        }

        GradientKind::Radial { cx, cy, r } => {
            cairo::Gradient::clone(&cairo::RadialGradient::new(cx, cy, 0.0, cx, cy, r))
        }
    };

    for stop in &gradient.stops {
        let rgba = RGBA::parse_str(&stop.color).unwrap_or(RGBA::new(0, 0, 0, 255));

        g.add_color_stop_rgba(
            stop.offset,
            f64::from(rgba.red_f32()),
            f64::from(rgba.green_f32()),
            f64::from(rgba.blue_f32()),
            f64::from(rgba.alpha_f32()) * global_alpha,
        );
    }

    g
}

/// Splits a font like `12px helvetica` into a size in user units and a family.
fn parse_font(font: &str) -> (f64, &str) {
    let (size, family) = font.trim().split_once(' ').unwrap_or((font, "helvetica"));

    let size = Length::parse_str(size).map_or(12.0, |l| l.to_user(12.0));

    (size, family.trim())
}

impl From<Transform> for cairo::Matrix {
    #[inline]
    fn from(t: Transform) -> cairo::Matrix {
        cairo::Matrix::new(t.xx, t.yx, t.xy, t.yy, t.x0, t.y0)
    }
}

impl From<LineJoin> for cairo::LineJoin {
    fn from(j: LineJoin) -> cairo::LineJoin {
        match j {
            LineJoin::Miter => cairo::LineJoin::Miter,
            LineJoin::Round => cairo::LineJoin::Round,
            LineJoin::Bevel => cairo::LineJoin::Bevel,
        }
    }
}

impl From<LineCap> for cairo::LineCap {
    fn from(c: LineCap) -> cairo::LineCap {
        match c {
            LineCap::Butt => cairo::LineCap::Butt,
            LineCap::Round => cairo::LineCap::Round,
            LineCap::Square => cairo::LineCap::Square,
        }
    }
}

impl Surface for CairoSurface<'_> {
    fn save(&mut self) {
        let _ = self.cr.save();
        self.saved.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            let _ = self.cr.restore();
            self.state = state;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.cr.translate(dx, dy);
    }

    fn rotate(&mut self, angle: f64) {
        self.cr.rotate(angle);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.cr.scale(sx, sy);
    }

    fn transform(&mut self, t: &Transform) {
        self.cr.transform(cairo::Matrix::from(*t));
    }

    fn begin_path(&mut self) {
        self.cr.new_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.cr.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.cr.line_to(x, y);
    }

    fn bezier_curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.cr.curve_to(x1, y1, x2, y2, x, y);
    }

    fn quadratic_curve_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        // degree elevation from the current point
        let (x0, y0) = match self.cr.has_current_point() {
            Ok(true) => self.cr.current_point().unwrap_or((x1, y1)),
            _ => {
                self.cr.move_to(x1, y1);
                (x1, y1)
            }
        };

        self.cr.curve_to(
            x0 + 2.0 / 3.0 * (x1 - x0),
            y0 + 2.0 / 3.0 * (y1 - y0),
            x + 2.0 / 3.0 * (x1 - x),
            y + 2.0 / 3.0 * (y1 - y),
            x,
            y,
        );
    }

    fn arc(&mut self, xc: f64, yc: f64, r: f64, a1: f64, a2: f64, anticlockwise: bool) {
        if anticlockwise {
            self.cr.arc_negative(xc, yc, r, a1, a2);
        } else {
            self.cr.arc(xc, yc, r, a1, a2);
        }
    }

    fn close_path(&mut self) {
        self.cr.close_path();
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.cr.rectangle(x, y, width, height);
    }

    fn fill(&mut self) {
        self.set_source(&self.state.fill);
        let _ = self.cr.fill_preserve();
    }

    fn stroke(&mut self) {
        self.set_source(&self.state.stroke);
        let _ = self.cr.stroke_preserve();
    }

    fn clip(&mut self) {
        self.cr.clip();
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.set_source(&self.state.fill);
        self.with_own_path(|cr| {
            cr.move_to(x, y);
            let _ = cr.show_text(text);
        });
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        self.set_source(&self.state.stroke);
        self.with_own_path(|cr| {
            cr.move_to(x, y);
            cr.text_path(text);
            let _ = cr.stroke();
        });
    }

    fn set_fill_style(&mut self, paint: &Paint) {
        self.state.fill = paint.clone();
    }

    fn set_stroke_style(&mut self, paint: &Paint) {
        self.state.stroke = paint.clone();
    }

    fn set_line_width(&mut self, width: f64) {
        self.cr.set_line_width(width);
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.cr.set_line_join(join.into());
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.cr.set_line_cap(cap.into());
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.cr.set_miter_limit(limit);
    }

    fn set_line_dash(&mut self, dashes: &[f64], offset: f64) {
        self.cr.set_dash(dashes, offset);
    }

    fn global_alpha(&self) -> f64 {
        self.state.global_alpha
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.global_alpha = alpha;
    }

    fn set_font(&mut self, font: &str) {
        let (size, family) = parse_font(font);

        self.cr
            .select_font_face(family, cairo::FontSlant::Normal, cairo::FontWeight::Normal);
        self.cr.set_font_size(size);
    }
}
