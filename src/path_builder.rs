//! Preparsed paths.
//!
//! Path data is expanded once, when the document is loaded, into a list of
//! [`PathCommand`]s in absolute coordinates.  The renderer replays that list on every
//! frame, so nothing in it needs the current point or the previous command to be
//! interpreted.

use tinyvec::TinyVec;

use crate::arc::{self, ArcParameterization};
use crate::path_parser::{ParseError, PathParser};

/// Whether an arc's sweep should be >= 180 degrees, or smaller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LargeArc(pub bool);

/// Angular direction in which an arc is drawn.
///
/// `Positive` is the direction of increasing angles, i.e. clockwise on a y-down
/// surface; it corresponds to a sweep flag of 1 in path data.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Sweep {
    Negative,
    Positive,
}

impl From<bool> for Sweep {
    fn from(flag: bool) -> Sweep {
        if flag {
            Sweep::Positive
        } else {
            Sweep::Negative
        }
    }
}

/// Cubic Bézier segment from the current point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CubicBezierCurve {
    pub pt1: (f64, f64),
    pub pt2: (f64, f64),
    pub to: (f64, f64),
}

/// Quadratic Bézier segment from the current point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuadraticBezierCurve {
    pub pt1: (f64, f64),
    pub to: (f64, f64),
}

/// Elliptical arc given by its end points, as written in path data.
///
/// Unlike the other segments, an arc keeps its start point: converting it to a
/// center parameterization needs both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipticalArc {
    /// Radii, already made non-negative.
    pub r: (f64, f64),
    /// Rotation of the ellipse's x axis, in radians.
    pub x_axis_rotation: f64,
    pub large_arc: LargeArc,
    pub sweep: Sweep,
    pub from: (f64, f64),
    pub to: (f64, f64),
}

impl EllipticalArc {
    /// Calculates a center parameterization from the endpoint parameterization.
    pub fn center_parameterization(&self) -> ArcParameterization {
        arc::solve_arc(
            self.r,
            self.x_axis_rotation,
            self.large_arc,
            self.sweep,
            self.from,
            self.to,
        )
    }
}

/// A path command in absolute coordinates.
///
/// `H` and `V` in path data become `LineTo`; `S` and `T` become curves with their
/// reflected control points filled in.
#[derive(Clone, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo(CubicBezierCurve),
    QuadTo(QuadraticBezierCurve),
    Arc(EllipticalArc),
    ClosePath,
}

// TinyVec needs a default to fill its inline storage.
impl Default for PathCommand {
    fn default() -> PathCommand {
        PathCommand::ClosePath
    }
}

impl PathCommand {
    /// The point where the pen is after this command, or `None` for `ClosePath`,
    /// which returns to the start of the subpath.
    pub fn end_point(&self) -> Option<(f64, f64)> {
        match *self {
            PathCommand::MoveTo(x, y) | PathCommand::LineTo(x, y) => Some((x, y)),
            PathCommand::CurveTo(ref c) => Some(c.to),
            PathCommand::QuadTo(ref q) => Some(q.to),
            PathCommand::Arc(ref a) => Some(a.to),
            PathCommand::ClosePath => None,
        }
    }
}

/// Collects commands while path data is parsed.
///
/// Most paths in widget art are short, so the first 32 commands are kept inline.
#[derive(Default)]
pub struct PathBuilder {
    commands: TinyVec<[PathCommand; 32]>,
}

impl PathBuilder {
    /// Parses path data, appending its commands.
    ///
    /// On error, the commands before the error have been appended.
    pub fn parse(&mut self, path_str: &str) -> Result<(), ParseError> {
        PathParser::new(self, path_str).parse()
    }

    pub fn push(&mut self, command: PathCommand) {
        self.commands.push(command);
    }

    pub fn into_path(self) -> Path {
        Path {
            commands: self.commands.into_iter().collect(),
        }
    }
}

/// An immutable list of absolute path commands.
///
/// A path whose data does not begin with a moveto starts at (0, 0), but that point
/// is not a command of the path: the first command is the first drawing command.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Path {
    commands: Box<[PathCommand]>,
}

impl Path {
    /// Parses path data in one go.
    ///
    /// If there is an error, the commands up to the error are returned along with it.
    pub fn parse(path_str: &str) -> (Path, Result<(), ParseError>) {
        let mut builder = PathBuilder::default();
        let result = builder.parse(path_str);
        (builder.into_path(), result)
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn iter(&self) -> impl Iterator<Item = PathCommand> + '_ {
        self.commands.iter().cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path() {
        let path = PathBuilder::default().into_path();
        assert!(path.is_empty());
        assert_eq!(path, Path::default());
    }

    #[test]
    fn keeps_commands_past_inline_capacity() {
        let mut builder = PathBuilder::default();
        builder.push(PathCommand::MoveTo(0.0, 0.0));
        for i in 0..100 {
            builder.push(PathCommand::LineTo(f64::from(i), 1.0));
        }

        let path = builder.into_path();
        assert_eq!(path.len(), 101);
        assert_eq!(path.commands()[0], PathCommand::MoveTo(0.0, 0.0));
        assert_eq!(path.iter().last(), Some(PathCommand::LineTo(99.0, 1.0)));
    }

    #[test]
    fn end_points() {
        let arc = EllipticalArc {
            r: (1.0, 1.0),
            x_axis_rotation: 0.0,
            large_arc: LargeArc(false),
            sweep: Sweep::from(true),
            from: (0.0, 0.0),
            to: (2.0, 0.0),
        };

        assert_eq!(arc.sweep, Sweep::Positive);
        assert_eq!(PathCommand::Arc(arc).end_point(), Some((2.0, 0.0)));
        assert_eq!(PathCommand::LineTo(3.0, 4.0).end_point(), Some((3.0, 4.0)));
        assert_eq!(PathCommand::ClosePath.end_point(), None);
    }
}
