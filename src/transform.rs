//! Handling of transform values.
//!
//! This module contains the following:
//!
//! * [`Transform`] to represent 2D transforms in general; it's just a matrix.
//!
//! * [`TransformList`], the parsed form of the SVG1.1 [`transform` attribute][attr].  It
//!   keeps the individual operations instead of a collapsed matrix, because the renderer
//!   replays them one by one on the drawing surface.
//!
//! * [`TransformStack`], a save/restore stack of transforms that mirrors the drawing
//!   surface's own stack, so that geometry can be computed without a surface.
//!
//! [attr]: https://www.w3.org/TR/SVG11/coords.html#TransformAttribute

use cssparser::{Parser, Token};

use crate::error::*;
use crate::parsers::{optional_comma, Parse};

/// A 2D transformation matrix.
///
/// A point `(x, y)` maps to `(xx * x + xy * y + x0, yx * x + yy * y + y0)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub xx: f64,
    pub yx: f64,
    pub xy: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

impl Transform {
    #[inline]
    pub fn new_unchecked(xx: f64, yx: f64, xy: f64, yy: f64, x0: f64, y0: f64) -> Self {
        Self {
            xx,
            yx,
            xy,
            yy,
            x0,
            y0,
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new_unchecked(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    #[inline]
    pub fn new_translate(tx: f64, ty: f64) -> Self {
        Self::new_unchecked(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    #[inline]
    pub fn new_scale(sx: f64, sy: f64) -> Self {
        Self::new_unchecked(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `angle` radians; positive angles go from the x axis towards the y axis.
    #[inline]
    pub fn new_rotate(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new_unchecked(c, s, -s, c, 0.0, 0.0)
    }

    /// Returns the transform that applies `t1` first, then `t2`.
    #[must_use]
    pub fn multiply(t1: &Transform, t2: &Transform) -> Self {
        #[allow(clippy::suspicious_operation_groupings)]
        Transform {
            xx: t1.xx * t2.xx + t1.yx * t2.xy,
            yx: t1.xx * t2.yx + t1.yx * t2.yy,
            xy: t1.xy * t2.xx + t1.yy * t2.xy,
            yy: t1.xy * t2.yx + t1.yy * t2.yy,
            x0: t1.x0 * t2.xx + t1.y0 * t2.xy + t2.x0,
            y0: t1.x0 * t2.yx + t1.y0 * t2.yy + t2.y0,
        }
    }

    /// Applies `t` before `self`, like a canvas `transform()` call.
    #[inline]
    pub fn pre_transform(&self, t: &Transform) -> Self {
        Self::multiply(t, self)
    }

    /// Applies `t` after `self`.
    #[inline]
    pub fn post_transform(&self, t: &Transform) -> Self {
        Self::multiply(self, t)
    }

    #[inline]
    pub fn pre_translate(&self, x: f64, y: f64) -> Self {
        self.pre_transform(&Transform::new_translate(x, y))
    }

    #[inline]
    pub fn pre_scale(&self, sx: f64, sy: f64) -> Self {
        self.pre_transform(&Transform::new_scale(sx, sy))
    }

    #[inline]
    pub fn pre_rotate(&self, angle: f64) -> Self {
        self.pre_transform(&Transform::new_rotate(angle))
    }

    #[inline]
    pub fn post_translate(&self, x: f64, y: f64) -> Self {
        self.post_transform(&Transform::new_translate(x, y))
    }

    #[inline]
    fn determinant(&self) -> f64 {
        self.xx * self.yy - self.xy * self.yx
    }

    #[inline]
    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();

        det != 0.0 && det.is_finite()
    }

    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();

        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let inv_det = 1.0 / det;

        Some(Transform::new_unchecked(
            inv_det * self.yy,
            inv_det * (-self.yx),
            inv_det * (-self.xy),
            inv_det * self.xx,
            inv_det * (self.xy * self.y0 - self.yy * self.x0),
            inv_det * (self.yx * self.x0 - self.xx * self.y0),
        ))
    }

    #[inline]
    pub fn transform_distance(&self, dx: f64, dy: f64) -> (f64, f64) {
        (dx * self.xx + dy * self.xy, dx * self.yx + dy * self.yy)
    }

    #[inline]
    pub fn transform_point(&self, px: f64, py: f64) -> (f64, f64) {
        let (x, y) = self.transform_distance(px, py);
        (x + self.x0, y + self.y0)
    }

    /// Maps a point back through the transform; `None` if the matrix is singular.
    pub fn inverse_transform_point(&self, px: f64, py: f64) -> Option<(f64, f64)> {
        self.invert().map(|inv| inv.transform_point(px, py))
    }
}

impl Default for Transform {
    #[inline]
    fn default() -> Transform {
        Transform::identity()
    }
}

/// Receiver of canvas-style transform operations.
///
/// Each call modifies the current transform so that it is applied to coordinates
/// before the existing one, exactly like the drawing surface calls of the same names.
pub trait Transformable {
    fn translate(&mut self, dx: f64, dy: f64);

    /// Rotates by `angle` radians.
    fn rotate(&mut self, angle: f64);

    fn scale(&mut self, sx: f64, sy: f64);

    fn transform(&mut self, t: &Transform);
}

/// One function of a `transform` attribute.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TransformOp {
    Translate(f64, f64),

    /// Angle in radians, and the rotation center.
    Rotate { angle: f64, cx: f64, cy: f64 },

    Scale(f64, f64),

    Matrix(Transform),
}

impl TransformOp {
    /// Replays this operation on `target`.
    ///
    /// A rotation with a center is expressed as three calls, so that the center stays
    /// fixed: translate to the center, rotate, translate back.
    pub fn apply_to<T: Transformable + ?Sized>(&self, target: &mut T) {
        match *self {
            TransformOp::Translate(dx, dy) => target.translate(dx, dy),

            TransformOp::Rotate { angle, cx, cy } => {
                if cx != 0.0 || cy != 0.0 {
                    target.translate(cx, cy);
                    target.rotate(angle);
                    target.translate(-cx, -cy);
                } else {
                    target.rotate(angle);
                }
            }

            TransformOp::Scale(sx, sy) => target.scale(sx, sy),

            TransformOp::Matrix(ref t) => target.transform(t),
        }
    }
}

/// The parsed `transform` attribute: operations in the order they were written.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransformList(pub Vec<TransformOp>);

impl TransformList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn apply_to<T: Transformable + ?Sized>(&self, target: &mut T) {
        for op in &self.0 {
            op.apply_to(target);
        }
    }

    /// Collapses the list into a single matrix.
    pub fn to_transform(&self) -> Transform {
        let mut t = Transform::identity();
        self.apply_to(&mut t);
        t
    }
}

impl Transformable for Transform {
    fn translate(&mut self, dx: f64, dy: f64) {
        *self = self.pre_translate(dx, dy);
    }

    fn rotate(&mut self, angle: f64) {
        *self = self.pre_rotate(angle);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        *self = self.pre_scale(sx, sy);
    }

    fn transform(&mut self, t: &Transform) {
        *self = self.pre_transform(t);
    }
}

impl Parse for TransformList {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<TransformList, ParseError<'i>> {
        let mut ops = Vec::new();

        loop {
            if parser.is_exhausted() {
                break;
            }

            ops.push(parse_transform_command(parser)?);
            optional_comma(parser);
        }

        Ok(TransformList(ops))
    }
}

fn parse_transform_command<'i>(parser: &mut Parser<'i, '_>) -> Result<TransformOp, ParseError<'i>> {
    let loc = parser.current_source_location();

    match parser.next()?.clone() {
        Token::Function(ref name) => parse_transform_function(name, parser),

        Token::Ident(ref name) => {
            parser.expect_parenthesis_block()?;
            parse_transform_function(name, parser)
        }

        tok => Err(loc.new_unexpected_token_error(tok.clone())),
    }
}

fn parse_transform_function<'i>(
    name: &str,
    parser: &mut Parser<'i, '_>,
) -> Result<TransformOp, ParseError<'i>> {
    let loc = parser.current_source_location();

    match name {
        "matrix" => parse_matrix_args(parser),
        "translate" => parse_translate_args(parser),
        "scale" => parse_scale_args(parser),
        "rotate" => parse_rotate_args(parser),
        _ => Err(loc.new_custom_error(ValueErrorKind::UnsupportedFunction(name.to_string()))),
    }
}

fn parse_matrix_args<'i>(parser: &mut Parser<'i, '_>) -> Result<TransformOp, ParseError<'i>> {
    parser.parse_nested_block(|p| {
        let xx = f64::parse(p)?;
        optional_comma(p);

        let yx = f64::parse(p)?;
        optional_comma(p);

        let xy = f64::parse(p)?;
        optional_comma(p);

        let yy = f64::parse(p)?;
        optional_comma(p);

        let x0 = f64::parse(p)?;
        optional_comma(p);

        let y0 = f64::parse(p)?;

        Ok(TransformOp::Matrix(Transform::new_unchecked(
            xx, yx, xy, yy, x0, y0,
        )))
    })
}

fn parse_translate_args<'i>(parser: &mut Parser<'i, '_>) -> Result<TransformOp, ParseError<'i>> {
    parser.parse_nested_block(|p| {
        let tx = f64::parse(p)?;

        let ty = p
            .try_parse(|p| {
                optional_comma(p);
                f64::parse(p)
            })
            .unwrap_or(0.0);

        Ok(TransformOp::Translate(tx, ty))
    })
}

fn parse_scale_args<'i>(parser: &mut Parser<'i, '_>) -> Result<TransformOp, ParseError<'i>> {
    parser.parse_nested_block(|p| {
        let x = f64::parse(p)?;

        let y = p
            .try_parse(|p| {
                optional_comma(p);
                f64::parse(p)
            })
            .unwrap_or(x);

        Ok(TransformOp::Scale(x, y))
    })
}

fn parse_rotate_args<'i>(parser: &mut Parser<'i, '_>) -> Result<TransformOp, ParseError<'i>> {
    parser.parse_nested_block(|p| {
        let angle = f64::parse(p)?.to_radians();

        let (cx, cy) = p
            .try_parse(|p| -> Result<_, ParseError<'_>> {
                optional_comma(p);
                let cx = f64::parse(p)?;

                optional_comma(p);
                let cy = f64::parse(p)?;

                Ok((cx, cy))
            })
            .unwrap_or((0.0, 0.0));

        Ok(TransformOp::Rotate { angle, cx, cy })
    })
}

/// A stack of transforms with `save()`/`restore()`, kept in step with the
/// drawing surface's own stack.
///
/// The stack always has at least one entry, the current transform.
#[derive(Debug, Clone)]
pub struct TransformStack {
    stack: Vec<Transform>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    pub fn new() -> Self {
        Self::with_transform(Transform::identity())
    }

    pub fn with_transform(t: Transform) -> Self {
        TransformStack { stack: vec![t] }
    }

    /// The current transform.
    pub fn current(&self) -> Transform {
        self.stack.last().copied().unwrap_or_default()
    }

    /// Number of saved transforms.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Resets to a single identity transform.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.stack.push(Transform::identity());
    }

    pub fn save(&mut self) {
        let current = self.current();
        self.stack.push(current);
    }

    pub fn restore(&mut self) -> Result<(), RenderingError> {
        if self.stack.len() < 2 {
            return Err(RenderingError::UnbalancedRestore);
        }

        self.stack.pop();
        Ok(())
    }

    /// Applies `matrix(a, b, c, d, e, f)`.
    pub fn matrix(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.transform(&Transform::new_unchecked(a, b, c, d, e, f));
    }

    /// Maps a point from local coordinates to the stack's base coordinates.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        self.current().transform_point(x, y)
    }

    /// Maps a point from base coordinates back to local coordinates.
    pub fn apply_inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        self.current().inverse_transform_point(x, y)
    }

    fn top(&mut self) -> &mut Transform {
        if self.stack.is_empty() {
            self.stack.push(Transform::identity());
        }

        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }
}

impl Transformable for TransformStack {
    fn translate(&mut self, dx: f64, dy: f64) {
        self.top().translate(dx, dy);
    }

    fn rotate(&mut self, angle: f64) {
        self.top().rotate(angle);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.top().scale(sx, sy);
    }

    fn transform(&mut self, t: &Transform) {
        Transformable::transform(self.top(), t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::ApproxEq;
    use std::f64;
    use std::f64::consts::PI;

    fn rotation_transform(deg: f64, tx: f64, ty: f64) -> Transform {
        Transform::new_translate(tx, ty)
            .pre_rotate(deg.to_radians())
            .pre_translate(-tx, -ty)
    }

    fn parse_transform(s: &str) -> Result<Transform, ParseError<'_>> {
        let list = TransformList::parse_str(s)?;
        Ok(list.to_transform())
    }

    fn assert_transform_eq(t1: &Transform, t2: &Transform) {
        let epsilon = 8.0 * f64::EPSILON; // kind of arbitrary, but allow for some sloppiness

        assert!(t1.xx.approx_eq(t2.xx, (epsilon, 1)));
        assert!(t1.yx.approx_eq(t2.yx, (epsilon, 1)));
        assert!(t1.xy.approx_eq(t2.xy, (epsilon, 1)));
        assert!(t1.yy.approx_eq(t2.yy, (epsilon, 1)));
        assert!(t1.x0.approx_eq(t2.x0, (epsilon, 1)));
        assert!(t1.y0.approx_eq(t2.y0, (epsilon, 1)));
    }

    fn assert_point_eq(p1: (f64, f64), p2: (f64, f64)) {
        assert!(p1.0.approx_eq(p2.0, (1e-12, 2)), "{p1:?} != {p2:?}");
        assert!(p1.1.approx_eq(p2.1, (1e-12, 2)), "{p1:?} != {p2:?}");
    }

    #[test]
    fn test_multiply() {
        let t1 = Transform::identity();
        let t2 = Transform::new_unchecked(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_transform_eq(&Transform::multiply(&t1, &t2), &t2);
        assert_transform_eq(&Transform::multiply(&t2, &t1), &t2);

        let t1 = Transform::new_unchecked(0.5, 0.0, 0.0, 0.5, 10.0, 10.0);
        let t2 = Transform::new_unchecked(1.0, 0.0, 0.0, 1.0, -10.0, -10.0);
        let r1 = Transform::new_unchecked(0.5, 0.0, 0.0, 0.5, 0.0, 0.0);
        let r2 = Transform::new_unchecked(0.5, 0.0, 0.0, 0.5, 5.0, 5.0);
        assert_transform_eq(&Transform::multiply(&t1, &t2), &r1);
        assert_transform_eq(&Transform::multiply(&t2, &t1), &r2);
    }

    #[test]
    fn test_invert() {
        let t = Transform::new_unchecked(2.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(!t.is_invertible());
        assert!(t.invert().is_none());

        let t = Transform::new_unchecked(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        let i = t.invert().unwrap();
        assert_transform_eq(&t.pre_transform(&i), &Transform::identity());
        assert_transform_eq(&t.post_transform(&i), &Transform::identity());
    }

    #[test]
    fn translate_then_rotate_equals_product() {
        let mut stepwise = Transform::identity();
        stepwise.translate(5.0, 0.0);
        stepwise.rotate(PI / 2.0);

        let product = Transform::multiply(
            &Transform::new_rotate(PI / 2.0),
            &Transform::new_translate(5.0, 0.0),
        );

        assert_point_eq(stepwise.transform_point(1.0, 0.0), (5.0, 1.0));
        assert_point_eq(stepwise.transform_point(1.0, 0.0), product.transform_point(1.0, 0.0));
    }

    #[test]
    fn parses_valid_transform() {
        let t = Transform::new_unchecked(1.0, 0.0, 0.0, 1.0, 20.0, 30.0);
        let s = Transform::new_unchecked(10.0, 0.0, 0.0, 10.0, 0.0, 0.0);
        let r = rotation_transform(30.0, 10.0, 10.0);

        let a = Transform::multiply(&s, &t);
        assert_transform_eq(
            &parse_transform("translate(20, 30), scale (10) rotate (30 10 10)").unwrap(),
            &Transform::multiply(&r, &a),
        );
    }

    #[test]
    fn parses_operations_in_order() {
        assert_eq!(
            TransformList::parse_str("translate(1) rotate(90, 3, 4) scale(2) matrix(1 0 0 1 5 6)")
                .unwrap(),
            TransformList(vec![
                TransformOp::Translate(1.0, 0.0),
                TransformOp::Rotate {
                    angle: PI / 2.0,
                    cx: 3.0,
                    cy: 4.0
                },
                TransformOp::Scale(2.0, 2.0),
                TransformOp::Matrix(Transform::new_unchecked(1.0, 0.0, 0.0, 1.0, 5.0, 6.0)),
            ])
        );
    }

    #[test]
    fn rotation_center_stays_fixed() {
        let t = parse_transform("rotate(90 10 10)").unwrap();
        assert_point_eq(t.transform_point(10.0, 10.0), (10.0, 10.0));
        assert_point_eq(t.transform_point(20.0, 10.0), (10.0, 20.0));
    }

    #[test]
    fn parses_empty() {
        assert!(TransformList::parse_str("").unwrap().is_empty());
        assert_transform_eq(&parse_transform("").unwrap(), &Transform::identity());
    }

    #[test]
    fn syntax_error_yields_parse_error() {
        assert!(parse_transform("matrix (1 2 3 4 5)").is_err());
        assert!(parse_transform("translate(1 2 3 4 5)").is_err());
        assert!(parse_transform("translate (1,)").is_err());
        assert!(parse_transform("scale (1,)").is_err());
        assert!(parse_transform("rotate").is_err());
    }

    #[test]
    fn unsupported_function_is_reported_by_name() {
        let err = TransformList::parse_str("translate(1) skewX(30)").unwrap_err();

        match err.kind {
            cssparser::ParseErrorKind::Custom(ValueErrorKind::UnsupportedFunction(ref name)) => {
                assert_eq!(name, "skewX")
            }
            ref k => panic!("unexpected error kind {k:?}"),
        }
    }

    #[test]
    fn stack_save_restore() {
        let mut stack = TransformStack::new();
        stack.translate(10.0, 0.0);
        stack.save();
        stack.scale(2.0, 2.0);
        assert_point_eq(stack.apply(1.0, 1.0), (12.0, 2.0));
        assert_eq!(stack.depth(), 1);

        stack.restore().unwrap();
        assert_point_eq(stack.apply(1.0, 1.0), (11.0, 1.0));
        assert_eq!(stack.restore(), Err(RenderingError::UnbalancedRestore));
    }

    #[test]
    fn stack_matrix_and_inverse() {
        let mut stack = TransformStack::new();
        stack.matrix(2.0, 0.0, 0.0, 4.0, 1.0, 1.0);
        assert_point_eq(stack.apply(1.0, 1.0), (3.0, 5.0));
        assert_point_eq(stack.apply_inverse(3.0, 5.0).unwrap(), (1.0, 1.0));

        stack.scale(0.0, 1.0);
        assert!(stack.apply_inverse(3.0, 5.0).is_none());

        stack.clear();
        assert_eq!(stack.current(), Transform::identity());
    }
}
