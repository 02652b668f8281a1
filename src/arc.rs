//! Conversion of elliptical arcs from endpoint to center parameterization.
//!
//! Path data gives an arc by its endpoints, radii, x-axis rotation and two flags.  A
//! canvas can only draw circular arcs by center and angles, so the arc is solved in a
//! "unit frame": the frame where the ellipse, after undoing its rotation and dividing
//! by its radii, becomes a unit circle.  The arc is then drawn as a unit circle arc
//! under `rotate(rotation) scale(rx, ry)`.
//!
//! Besides the center and angles, the solver returns a point halfway along the arc,
//! which is what bounds computations use to account for the arc's bulge.

use std::f64::consts::PI;

use crate::path_builder::{LargeArc, Sweep};
use crate::transform::Transform;

/// Result of [`solve_arc`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ArcParameterization {
    /// One of the radii is zero; the arc is drawn as a straight line.
    ///
    /// `mid_point` is the end point of the arc.
    LineTo { mid_point: (f64, f64) },

    /// Center parameterization in the unit frame.
    CenterParameters {
        /// Center of the unit circle, in the unit frame.
        center: (f64, f64),
        /// Angle of the start point.
        theta1: f64,
        /// Angle of the end point.
        theta2: f64,
        /// Whether the arc goes from `theta1` to `theta2` by decreasing angles.
        counterclockwise: bool,
        /// Point halfway along the arc, in user space.
        mid_point: (f64, f64),
    },
}

impl ArcParameterization {
    /// The representative point used for bounds.
    pub fn mid_point(&self) -> (f64, f64) {
        match *self {
            ArcParameterization::LineTo { mid_point } => mid_point,
            ArcParameterization::CenterParameters { mid_point, .. } => mid_point,
        }
    }
}

/// Solves an arc from `from` to `to` on an ellipse with radii `r`, whose x axis is
/// rotated by `rotation` radians.
///
/// When the radii are too small for the two points to lie on the ellipse, the
/// solution collapses to the circle with both points on a diameter.
pub fn solve_arc(
    r: (f64, f64),
    rotation: f64,
    large_arc: LargeArc,
    sweep: Sweep,
    from: (f64, f64),
    to: (f64, f64),
) -> ArcParameterization {
    let (rx, ry) = r;
    let (x1, y1) = from;
    let (x2, y2) = to;

    if rx == 0.0 || ry == 0.0 {
        return ArcParameterization::LineTo { mid_point: to };
    }

    let counterclockwise = sweep == Sweep::Negative;

    // endpoints in the unit frame
    let (sa, ca) = rotation.sin_cos();
    let x1p = (ca * x1 + sa * y1) / rx;
    let y1p = (-sa * x1 + ca * y1) / ry;
    let x2p = (ca * x2 + sa * y2) / rx;
    let y2p = (-sa * x2 + ca * y2) / ry;

    // midpoint of the chord, and half-chord vector
    let xm = (x1p + x2p) / 2.0;
    let ym = (y1p + y2p) / 2.0;
    let xd = (x2p - x1p) / 2.0;
    let yd = (y2p - y1p) / 2.0;

    // distance from the chord midpoint to the center, in half-chord lengths
    let a2 = xd * xd + yd * yd;
    let mut f = ((1.0 - a2) / a2).sqrt();

    // As in SVG, the offset is negated when the large-arc flag differs from the sweep
    // flag.
    if f.is_nan() {
        f = 0.0;
    } else if large_arc.0 == counterclockwise {
        f = -f;
    }

    let xc = xm + f * yd;
    let yc = ym - f * xd;

    let theta1 = ((y1p - yc) / rx).atan2((x1p - xc) / ry);
    let theta2 = ((y2p - yc) / rx).atan2((x2p - xc) / ry);

    let half = (theta1 + theta2) / 2.0;
    let mid_angle = match (counterclockwise, theta1 < theta2) {
        (true, true) => half + PI,
        (true, false) => half,
        (false, true) => half,
        (false, false) => half + PI,
    };

    let unit_to_user = Transform::new_rotate(rotation).pre_scale(rx, ry);
    let mid_point = unit_to_user.transform_point(xc + mid_angle.cos(), yc + mid_angle.sin());

    ArcParameterization::CenterParameters {
        center: (xc, yc),
        theta1,
        theta2,
        counterclockwise,
        mid_point,
    }
}
