//! The context structure threaded through a render pass.
//!
//! A [`RenderContext`] pairs an optional drawing surface with a [`TransformStack`]
//! that mirrors the surface's transformation, and with the [`PointCloud`] that the
//! pass collects.  Without a surface only the model and the points are updated, which
//! is how bounds are measured.
//!
//! Every render pass gets its own context, so a pass can start another one (for
//! example to measure the pivot of a displacement) while it is in progress.

use crate::arc::ArcParameterization;
use crate::bbox::PointCloud;
use crate::error::RenderingError;
use crate::path_builder::{CubicBezierCurve, EllipticalArc, QuadraticBezierCurve};
use crate::surface::Surface;
use crate::transform::{Transform, TransformStack, Transformable};

pub struct RenderContext<'s> {
    surface: Option<&'s mut dyn Surface>,
    transform: TransformStack,
    points: PointCloud,
}

impl<'s> RenderContext<'s> {
    pub fn new(surface: Option<&'s mut dyn Surface>) -> RenderContext<'s> {
        RenderContext {
            surface,
            transform: TransformStack::new(),
            points: PointCloud::new(),
        }
    }

    pub fn surface(&mut self) -> Option<&mut (dyn Surface + 's)> {
        self.surface.as_deref_mut()
    }

    /// The current transform of the model.
    pub fn current_transform(&self) -> Transform {
        self.transform.current()
    }

    pub fn save(&mut self) {
        if let Some(s) = self.surface() {
            s.save();
        }
        self.transform.save();
    }

    pub fn restore(&mut self) -> Result<(), RenderingError> {
        if let Some(s) = self.surface() {
            s.restore();
        }
        self.transform.restore()
    }

    /// Adds a point given in the current user space to the cloud, and returns it as
    /// it was added.
    pub fn add_point(&mut self, x: f64, y: f64) -> (f64, f64) {
        let (x, y) = self.transform.apply(x, y);
        self.points.push(x, y);
        (x, y)
    }

    pub fn points(&self) -> &PointCloud {
        &self.points
    }

    pub fn points_len(&self) -> usize {
        self.points.len()
    }

    pub fn into_points(self) -> PointCloud {
        self.points
    }

    /// Runs `f` between a `save` and a `restore` of both the surface and the model.
    ///
    /// The state is restored even if `f` fails, so that an error leaves the surface
    /// balanced; the error from `f` takes precedence.
    pub fn with_saved_state<O, F>(&mut self, f: F) -> Result<O, RenderingError>
    where
        F: FnOnce(&mut RenderContext<'s>) -> Result<O, RenderingError>,
    {
        self.save();
        match f(self) {
            Ok(o) => {
                self.restore()?;
                Ok(o)
            }

            Err(e) => {
                let _ = self.restore();
                Err(e)
            }
        }
    }
}

impl Transformable for RenderContext<'_> {
    fn translate(&mut self, dx: f64, dy: f64) {
        if let Some(s) = self.surface() {
            Surface::translate(s, dx, dy);
        }
        self.transform.translate(dx, dy);
    }

    fn rotate(&mut self, angle: f64) {
        if let Some(s) = self.surface() {
            Surface::rotate(s, angle);
        }
        self.transform.rotate(angle);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        if let Some(s) = self.surface() {
            Surface::scale(s, sx, sy);
        }
        self.transform.scale(sx, sy);
    }

    fn transform(&mut self, t: &Transform) {
        if let Some(s) = self.surface() {
            Surface::transform(s, t);
        }
        Transformable::transform(&mut self.transform, t);
    }
}

impl EllipticalArc {
    /// Adds the arc to the surface's current path and returns the point that stands
    /// for it in bounds computations.
    ///
    /// The arc is drawn as a unit circle arc under `rotate(rotation) scale(rx, ry)`.
    pub(crate) fn to_surface(&self, surface: Option<&mut (dyn Surface + '_)>) -> (f64, f64) {
        let params = self.center_parameterization();

        if let Some(s) = surface {
            match params {
                ArcParameterization::LineTo { .. } => s.line_to(self.to.0, self.to.1),

                ArcParameterization::CenterParameters {
                    center,
                    theta1,
                    theta2,
                    counterclockwise,
                    ..
                } => {
                    let (rx, ry) = self.r;
                    let rotation = self.x_axis_rotation;

                    Surface::rotate(s, rotation);
                    Surface::scale(s, rx, ry);
                    s.arc(center.0, center.1, 1.0, theta1, theta2, counterclockwise);
                    Surface::scale(s, 1.0 / rx, 1.0 / ry);
                    Surface::rotate(s, -rotation);
                }
            }
        }

        params.mid_point()
    }
}

impl CubicBezierCurve {
    pub(crate) fn to_surface(&self, s: &mut (dyn Surface + '_)) {
        let Self { pt1, pt2, to } = *self;
        s.bezier_curve_to(pt1.0, pt1.1, pt2.0, pt2.1, to.0, to.1);
    }
}

impl QuadraticBezierCurve {
    pub(crate) fn to_surface(&self, s: &mut (dyn Surface + '_)) {
        let Self { pt1, to } = *self;
        s.quadratic_curve_to(pt1.0, pt1.1, to.0, to.1);
    }
}
