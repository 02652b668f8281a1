//! Parser for SVG path data.
//!
//! The parser expands path data into absolute commands once, when the document is
//! loaded: relative coordinates are resolved against the current point, `H` and `V`
//! become line segments, and the implicit control points of `S` and `T` are computed
//! by reflection.  Degrees in arc rotations are converted to radians.
//!
//! The grammar is lenient in the usual ways.  Commas and whitespace are
//! interchangeable separators and both are optional where a sign or decimal point
//! starts the next number (`M-10,20-30-40`, `M1.5.5`).  A command's arguments may be
//! repeated without repeating the letter, and the arguments after a moveto are
//! linetos.  Arc flags are single digits that need no separator (`a1 1 0 00 2 2`).

use std::fmt;
use std::str;

use crate::path_builder::*;

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Token {
    Number(f64),
    Flag(bool),
    Command(u8),
    Comma,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum LexError {
    ParseFloatError,
    UnexpectedByte(u8),
    UnexpectedEof,
}

/// Splits path data into tokens, each paired with its byte offset.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    pending_flags: u8,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            input: input.as_bytes(),
            pos: 0,
            pending_flags: 0,
        }
    }

    /// Lexes the next two `0`/`1` digits as flags instead of numbers.
    pub fn expect_flags(&mut self) {
        self.pending_flags = 2;
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let start = self.pos;
        while self.peek().map_or(false, &pred) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn skip_sign(&mut self) {
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
    }

    /// `[sign] digits [. digits] [e [sign] digits]`, with digits on at least one side
    /// of the decimal point.  A second decimal point starts the next number.
    fn number(&mut self) -> Result<Token, LexError> {
        let start = self.pos;

        self.skip_sign();
        let mut digits = self.skip_while(|c| c.is_ascii_digit());
        if self.peek() == Some(b'.') {
            self.pos += 1;
            digits += self.skip_while(|c| c.is_ascii_digit());
        }

        if digits == 0 {
            return Err(self
                .peek()
                .map_or(LexError::UnexpectedEof, LexError::UnexpectedByte));
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            self.skip_sign();
            self.skip_while(|c| c.is_ascii_digit());
        }

        str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Token::Number)
            .ok_or(LexError::ParseFloatError)
    }
}

impl Iterator for Lexer<'_> {
    type Item = (usize, Result<Token, LexError>);

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_while(|c| c.is_ascii_whitespace());

        let start = self.pos;
        let c = self.peek()?;

        let token = match c {
            b',' => {
                self.pos += 1;
                Ok(Token::Comma)
            }

            c if c.is_ascii_alphabetic() => {
                self.pos += 1;
                Ok(Token::Command(c))
            }

            b'0' | b'1' if self.pending_flags > 0 => {
                self.pending_flags -= 1;
                self.pos += 1;
                Ok(Token::Flag(c == b'1'))
            }

            c if self.pending_flags > 0 && c.is_ascii_digit() => {
                self.pos += 1;
                Err(LexError::UnexpectedByte(c))
            }

            b'0'..=b'9' | b'+' | b'-' | b'.' => self.number(),

            c => {
                self.pos += 1;
                Err(LexError::UnexpectedByte(c))
            }
        };

        Some((start, token))
    }
}

/// Whether `c` is one of the command letters of path data.
fn is_path_command(c: u8) -> bool {
    matches!(
        c.to_ascii_uppercase(),
        b'M' | b'L' | b'H' | b'V' | b'C' | b'S' | b'Q' | b'T' | b'A' | b'Z'
    )
}

/// Where the pen is while commands are being expanded.
///
/// Before the first moveto the pen is at (0, 0).
#[derive(Debug, Default, Clone, Copy)]
struct Pen {
    current: (f64, f64),
    subpath_start: (f64, f64),
    // Last control point of the previous segment, if it was a cubic or a quadratic.
    cubic_ctrl: Option<(f64, f64)>,
    quad_ctrl: Option<(f64, f64)>,
}

impl Pen {
    fn resolve(&self, relative: bool, (x, y): (f64, f64)) -> (f64, f64) {
        if relative {
            (self.current.0 + x, self.current.1 + y)
        } else {
            (x, y)
        }
    }

    /// Reflects `ctrl` through the current point; no control point means the current
    /// point itself.
    fn reflect(&self, ctrl: Option<(f64, f64)>) -> (f64, f64) {
        let (cx, cy) = self.current;
        ctrl.map_or(self.current, |(x, y)| (2.0 * cx - x, 2.0 * cy - y))
    }

    fn advance(&mut self, cmd: &PathCommand) {
        self.cubic_ctrl = None;
        self.quad_ctrl = None;

        match *cmd {
            PathCommand::MoveTo(x, y) => self.subpath_start = (x, y),
            PathCommand::CurveTo(ref c) => self.cubic_ctrl = Some(c.pt2),
            PathCommand::QuadTo(ref q) => self.quad_ctrl = Some(q.pt1),
            _ => (),
        }

        self.current = cmd.end_point().unwrap_or(self.subpath_start);
    }
}

/// Recursive descent parser for path data, feeding a [`PathBuilder`].
pub struct PathParser<'a, 'b> {
    lexer: Lexer<'a>,
    lookahead: Option<(usize, Result<Token, LexError>)>,
    input_len: usize,

    builder: &'b mut PathBuilder,
    pen: Pen,
}

impl<'a, 'b> PathParser<'a, 'b> {
    pub fn new(builder: &'b mut PathBuilder, path_str: &'a str) -> PathParser<'a, 'b> {
        let mut lexer = Lexer::new(path_str);
        let lookahead = lexer.next();

        PathParser {
            lexer,
            lookahead,
            input_len: path_str.len(),
            builder,
            pen: Pen::default(),
        }
    }

    /// Parses the whole input.  Commands before an error have already been emitted.
    pub fn parse(&mut self) -> Result<(), ParseError> {
        while let Some((pos, token)) = self.lookahead {
            let c = match token {
                Ok(Token::Command(c)) if is_path_command(c) => c,
                Ok(Token::Command(c)) => return Err(ParseError::new(pos, UnsupportedCommand(c))),
                _ => return Err(self.unexpected()),
            };

            self.bump();
            self.command(c)?;
        }

        Ok(())
    }

    fn bump(&mut self) {
        self.lookahead = self.lexer.next();
    }

    fn unexpected(&self) -> ParseError {
        match self.lookahead {
            Some((pos, Ok(Token::Command(c)))) if !is_path_command(c) => {
                ParseError::new(pos, UnsupportedCommand(c))
            }
            Some((pos, Ok(Token::Command(c)))) => ParseError::new(pos, UnexpectedCommand(c)),
            Some((pos, Ok(t))) => ParseError::new(pos, UnexpectedToken(t)),
            Some((pos, Err(e))) => ParseError::new(pos, LexError(e)),
            None => ParseError::new(self.input_len, UnexpectedEof),
        }
    }

    /// Consumes the next token if `accept` maps it to a value.
    fn take<T>(&mut self, accept: impl FnOnce(Token) -> Option<T>) -> Result<T, ParseError> {
        if let Some((_, Ok(token))) = self.lookahead {
            if let Some(value) = accept(token) {
                self.bump();
                return Ok(value);
            }
        }

        Err(self.unexpected())
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        self.take(|t| match t {
            Token::Number(n) => Some(n),
            _ => None,
        })
    }

    fn flag(&mut self) -> Result<bool, ParseError> {
        self.take(|t| match t {
            Token::Flag(f) => Some(f),
            _ => None,
        })
    }

    fn skip_comma(&mut self) -> bool {
        self.take(|t| (t == Token::Comma).then_some(())).is_ok()
    }

    fn at_number(&self) -> bool {
        matches!(self.lookahead, Some((_, Ok(Token::Number(_)))))
    }

    /// A number, preceded by an optional comma.
    fn next_number(&mut self) -> Result<f64, ParseError> {
        self.skip_comma();
        self.number()
    }

    fn pair(&mut self) -> Result<(f64, f64), ParseError> {
        Ok((self.next_number()?, self.next_number()?))
    }

    fn point(&mut self, relative: bool) -> Result<(f64, f64), ParseError> {
        let p = self.pair()?;
        Ok(self.pen.resolve(relative, p))
    }

    /// The arc rotation and the two flags after it.
    fn rotation_and_flags(&mut self) -> Result<(f64, bool, bool), ParseError> {
        self.skip_comma();

        // The lexer has to know about the flags before it reads past the rotation.
        if !self.at_number() {
            return Err(self.unexpected());
        }
        self.lexer.expect_flags();
        let rotation = self.number()?;

        self.skip_comma();
        let large_arc = self.flag()?;
        self.skip_comma();
        let sweep = self.flag()?;

        Ok((rotation, large_arc, sweep))
    }

    fn emit(&mut self, cmd: PathCommand) {
        self.pen.advance(&cmd);
        self.builder.push(cmd);
    }

    /// Parses the argument groups of command `c`.
    fn command(&mut self, c: u8) -> Result<(), ParseError> {
        let relative = c.is_ascii_lowercase();
        let mut c = c.to_ascii_uppercase();

        if c == b'Z' {
            self.emit(PathCommand::ClosePath);
            return Ok(());
        }

        loop {
            self.segment(c, relative)?;

            if c == b'M' {
                c = b'L';
            }

            // A comma commits to another argument group.
            if !self.skip_comma() && !self.at_number() {
                return Ok(());
            }
        }
    }

    fn segment(&mut self, c: u8, relative: bool) -> Result<(), ParseError> {
        let cmd = match c {
            b'M' => {
                let (x, y) = self.point(relative)?;
                PathCommand::MoveTo(x, y)
            }

            b'L' => {
                let (x, y) = self.point(relative)?;
                PathCommand::LineTo(x, y)
            }

            b'H' => {
                let x = self.number()?;
                let (cx, cy) = self.pen.current;
                PathCommand::LineTo(if relative { cx + x } else { x }, cy)
            }

            b'V' => {
                let y = self.number()?;
                let (cx, cy) = self.pen.current;
                PathCommand::LineTo(cx, if relative { cy + y } else { y })
            }

            b'C' => PathCommand::CurveTo(CubicBezierCurve {
                pt1: self.point(relative)?,
                pt2: self.point(relative)?,
                to: self.point(relative)?,
            }),

            b'S' => PathCommand::CurveTo(CubicBezierCurve {
                pt1: self.pen.reflect(self.pen.cubic_ctrl),
                pt2: self.point(relative)?,
                to: self.point(relative)?,
            }),

            b'Q' => PathCommand::QuadTo(QuadraticBezierCurve {
                pt1: self.point(relative)?,
                to: self.point(relative)?,
            }),

            b'T' => PathCommand::QuadTo(QuadraticBezierCurve {
                pt1: self.pen.reflect(self.pen.quad_ctrl),
                to: self.point(relative)?,
            }),

            b'A' => {
                let rx = self.number()?.abs();
                let ry = self.next_number()?.abs();
                let (rotation, large_arc, sweep) = self.rotation_and_flags()?;

                PathCommand::Arc(EllipticalArc {
                    r: (rx, ry),
                    x_axis_rotation: rotation.to_radians(),
                    large_arc: LargeArc(large_arc),
                    sweep: Sweep::from(sweep),
                    from: self.pen.current,
                    to: self.point(relative)?,
                })
            }

            _ => return Err(ParseError::new(self.input_len, UnexpectedCommand(c))),
        };

        self.emit(cmd);
        Ok(())
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ErrorKind {
    UnexpectedToken(Token),
    /// A path command where a number or flag was expected.
    UnexpectedCommand(u8),
    /// A letter that is not a path command at all.
    UnsupportedCommand(u8),
    UnexpectedEof,
    LexError(LexError),
}

use crate::path_parser::ErrorKind::*;

/// Error from parsing path data; `position` is a byte offset into the data.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ParseError {
    pub position: usize,
    pub kind: ErrorKind,
}

impl ParseError {
    fn new(position: usize, kind: ErrorKind) -> ParseError {
        ParseError { position, kind }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self.kind {
            UnexpectedToken(_) => "unexpected token",
            UnexpectedCommand(_) => "unexpected command",
            UnsupportedCommand(_) => "unsupported command",
            UnexpectedEof => "unexpected end of data",
            LexError(_) => "error processing token",
        };
        write!(f, "error at position {}: {}", self.position, description)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    fn parse(d: &str) -> (Vec<PathCommand>, Result<(), ParseError>) {
        let (path, result) = Path::parse(d);
        (path.iter().collect(), result)
    }

    fn commands(d: &str) -> Vec<PathCommand> {
        let (commands, result) = parse(d);
        assert_eq!(result, Ok(()), "parsing {d:?}");
        commands
    }

    fn error(d: &str) -> ParseError {
        parse(d).1.unwrap_err()
    }

    use PathCommand::{ClosePath, LineTo, MoveTo};

    fn curve(pt1: (f64, f64), pt2: (f64, f64), to: (f64, f64)) -> PathCommand {
        PathCommand::CurveTo(CubicBezierCurve { pt1, pt2, to })
    }

    fn quad(pt1: (f64, f64), to: (f64, f64)) -> PathCommand {
        PathCommand::QuadTo(QuadraticBezierCurve { pt1, to })
    }

    #[test]
    fn lexes_tokens_with_positions() {
        let tokens: Vec<_> = Lexer::new("M1.5.5,-2e1 z").collect();

        assert_eq!(
            tokens,
            vec![
                (0, Ok(Token::Command(b'M'))),
                (1, Ok(Token::Number(1.5))),
                (4, Ok(Token::Number(0.5))),
                (6, Ok(Token::Comma)),
                (7, Ok(Token::Number(-20.0))),
                (12, Ok(Token::Command(b'z'))),
            ]
        );
    }

    #[test]
    fn empty_data_is_an_empty_path() {
        assert!(commands("").is_empty());
        assert!(commands(" \t\n").is_empty());
    }

    #[test]
    fn separators_are_optional() {
        let expected = vec![MoveTo(10.0, -20.0), LineTo(-30.0, 0.5), LineTo(0.25, 1e3)];

        assert_eq!(commands("M 10 -20 L -30 .5 .25 1e3"), expected);
        assert_eq!(commands("M10-20L-30,.5.25,1E+3"), expected);
        assert_eq!(commands("M10,-20,-30,0.5,0.25,1000"), expected);
    }

    #[test]
    fn relative_coordinates_follow_the_current_point() {
        assert_eq!(
            commands("m 10 10 5 0 h 5 v -5 H 0 V 0 l 1 1 z m 2 2"),
            vec![
                MoveTo(10.0, 10.0),
                LineTo(15.0, 10.0),
                LineTo(20.0, 10.0),
                LineTo(20.0, 5.0),
                LineTo(0.0, 5.0),
                LineTo(0.0, 0.0),
                LineTo(1.0, 1.0),
                ClosePath,
                MoveTo(12.0, 12.0),
            ]
        );
    }

    #[test]
    fn smooth_curves_reflect_the_previous_control_point() {
        assert_eq!(
            commands("M0 0 C 0 10 10 10 10 0 s 10 -10 10 0 L 30 0 S 40 10 40 0"),
            vec![
                MoveTo(0.0, 0.0),
                curve((0.0, 10.0), (10.0, 10.0), (10.0, 0.0)),
                curve((10.0, -10.0), (20.0, -10.0), (20.0, 0.0)),
                LineTo(30.0, 0.0),
                curve((30.0, 0.0), (40.0, 10.0), (40.0, 0.0)),
            ]
        );

        assert_eq!(
            commands("M0 0 Q 5 10 10 0 t 10 0 T 30 0 C 30 0 30 0 40 0 T 50 0"),
            vec![
                MoveTo(0.0, 0.0),
                quad((5.0, 10.0), (10.0, 0.0)),
                quad((15.0, -10.0), (20.0, 0.0)),
                quad((25.0, 10.0), (30.0, 0.0)),
                curve((30.0, 0.0), (30.0, 0.0), (40.0, 0.0)),
                quad((40.0, 0.0), (50.0, 0.0)),
            ]
        );
    }

    #[test]
    fn arcs_take_compact_flags() {
        let arc = |from, to, large_arc, sweep| {
            PathCommand::Arc(EllipticalArc {
                r: (5.0, 5.0),
                x_axis_rotation: 90f64.to_radians(),
                large_arc: LargeArc(large_arc),
                sweep,
                from,
                to,
            })
        };

        assert_eq!(
            commands("M0 0a5-5 90 01 10 0A 5,5,90,1,0,0,0"),
            vec![
                MoveTo(0.0, 0.0),
                arc((0.0, 0.0), (10.0, 0.0), false, Sweep::Positive),
                arc((10.0, 0.0), (0.0, 0.0), true, Sweep::Negative),
            ]
        );

        assert_eq!(
            error("M0 0 a 5 5 0 2 0 1 1"),
            ParseError::new(13, LexError(super::LexError::UnexpectedByte(b'2')))
        );
    }

    #[test]
    fn data_without_moveto_starts_at_the_origin() {
        assert_eq!(
            commands("L10,10 L20,20"),
            vec![LineTo(10.0, 10.0), LineTo(20.0, 20.0)]
        );

        assert_eq!(
            commands("l 10 10 z h 5"),
            vec![LineTo(10.0, 10.0), ClosePath, LineTo(5.0, 0.0)]
        );

        assert_eq!(
            commands("C0,0 0,0 10,0 S 20,10 30,0"),
            vec![
                curve((0.0, 0.0), (0.0, 0.0), (10.0, 0.0)),
                curve((20.0, 0.0), (20.0, 10.0), (30.0, 0.0)),
            ]
        );
    }

    #[test]
    fn unknown_letters_are_unsupported_commands() {
        assert_eq!(error("M 0 0 X 1 2"), ParseError::new(6, UnsupportedCommand(b'X')));
        assert_eq!(error("M 0 B"), ParseError::new(4, UnsupportedCommand(b'B')));

        let (commands, _) = parse("M 0 0 L 1 1 X");
        assert_eq!(commands, vec![MoveTo(0.0, 0.0), LineTo(1.0, 1.0)]);
    }

    #[test]
    fn reports_argument_errors() {
        assert_eq!(error("M 10"), ParseError::new(4, UnexpectedEof));
        assert_eq!(error("M 10 20 L 5 C"), ParseError::new(12, UnexpectedCommand(b'C')));
        assert_eq!(error("10 20"), ParseError::new(0, UnexpectedToken(Token::Number(10.0))));
        assert_eq!(error("M 1 2,"), ParseError::new(6, UnexpectedEof));
        assert_eq!(error("M 1,,2"), ParseError::new(4, UnexpectedToken(Token::Comma)));
        assert_eq!(
            error("M 1 -"),
            ParseError::new(4, LexError(super::LexError::UnexpectedEof))
        );
        assert_eq!(
            error("M 1 2 L 3 #"),
            ParseError::new(10, LexError(super::LexError::UnexpectedByte(b'#')))
        );
    }
}
