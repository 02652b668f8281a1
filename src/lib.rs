//! Preparsed SVG documents for drawing and hit-testing widgets.
//!
//! This crate parses a practical subset of SVG once into a [`Document`], and then
//! renders it any number of times, typically once per frame while a widget is being
//! dragged.  Each render takes [`RenderOverrides`] that adjust the document for that
//! frame only: extra styles per element, displacements that move or rotate an
//! element (a slider thumb, a knob), clip rectangles, and so on.
//!
//! A render can draw on a [`Surface`], which is an immediate-mode canvas, or it can
//! go without one and only collect the transformed vertices of the elements into a
//! [`PointCloud`].  The latter is what [`Document::get_element_bounds`] and
//! [`Document::is_inside`] use for hit-testing.
//!
//! Supported elements are `svg`, `g`, `path`, `line`, `polygon`, `polyline`,
//! `circle`, `rect` and `text`, styled with class rules from `<style>` elements, the
//! `style` attribute and presentation attributes.  Fills can reference
//! `linearGradient` and `radialGradient` elements in user space.
//!
//! # Example
//!
//! ```
//! use widget_svg::{Document, RecordingSurface, RenderOverrides, Displacement};
//!
//! let doc = Document::parse(
//!     r#"<svg viewBox="0 0 100 20">
//!          <rect id="track" x="0" y="8" width="100" height="4"/>
//!          <circle id="thumb" cx="10" cy="10" r="5"/>
//!        </svg>"#,
//! )
//! .unwrap();
//!
//! let mut overrides = RenderOverrides::default();
//! overrides
//!     .displacement_by_id
//!     .insert("thumb".to_string(), Displacement::translate(40.0, 0.0));
//! overrides
//!     .style_by_id
//!     .insert("thumb".to_string(), "fill: red".to_string());
//!
//! let mut surface = RecordingSurface::new();
//! let points = doc.render(Some(&mut surface), &overrides).unwrap();
//! assert_eq!(points.bounds().xmax, 100.0);
//!
//! assert!(doc.is_inside("thumb", 12.0, 10.0));
//! ```
//!
//! # Logging
//!
//! Set the `WIDGET_SVG_LOG` environment variable to print messages about ignored
//! attributes, unsupported CSS and the like to stdout.

#![allow(clippy::too_many_arguments)]
#![allow(clippy::derive_partial_eq_without_eq)]
#![warn(nonstandard_style, rust_2018_idioms, unused)]

pub use crate::arc::{solve_arc, ArcParameterization};
pub use crate::bbox::{calc_bounds, Bounds, PointCloud};
pub use crate::document::Document;
pub use crate::element::{Element, ElementKind, Node};
pub use crate::error::{LoadingError, RenderingError};
pub use crate::gradient::{Gradient, GradientKind, GradientStop, Gradients, Paint};
pub use crate::length::{Length, LengthUnit};
pub use crate::parsers::NumberList;
pub use crate::path_builder::{
    CubicBezierCurve, EllipticalArc, LargeArc, Path, PathCommand, QuadraticBezierCurve, Sweep,
};
pub use crate::path_parser::{ErrorKind as PathErrorKind, ParseError as PathParseError};
pub use crate::render::{ClipRect, Displacement, RenderOverrides, RenderTarget, ShapeListener};
pub use crate::session::Session;
pub use crate::style::{LineCap, LineJoin, Style, Visibility};
pub use crate::surface::{RecordingSurface, Surface, SurfaceOp};
pub use crate::transform::{Transform, TransformList, TransformOp, TransformStack, Transformable};
pub use crate::viewbox::ViewBox;

#[cfg(feature = "cairo")]
pub use crate::cairo_surface::CairoSurface;

mod arc;
mod bbox;
#[cfg(feature = "cairo")]
mod cairo_surface;
mod color;
mod css;
mod document;
mod drawing_ctx;
mod element;
mod error;
mod gradient;
mod length;
mod log;
mod parsers;
mod path_builder;
mod path_parser;
mod render;
mod session;
mod style;
mod surface;
mod transform;
mod viewbox;
mod xml;

#[doc(hidden)]
pub mod bench_only {
    pub use crate::path_builder::PathBuilder;
    pub use crate::path_parser::Lexer;
}
