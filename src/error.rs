//! Error types.

use std::fmt;

use cssparser::{BasicParseError, BasicParseErrorKind, ParseErrorKind, ToCss};
use thiserror::Error;

/// A short-lived error.
///
/// The lifetime of the error is the same as the `cssparser::ParserInput` that
/// was used to create a `cssparser::Parser`.  That is, it is the lifetime of
/// the string data that is being parsed.
///
/// Use [`AttributeResultExt::attribute`] to turn it into a long-lived [`ElementError`].
pub type ParseError<'i> = cssparser::ParseError<'i, ValueErrorKind>;

/// A simple error which refers to an attribute's value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueErrorKind {
    /// The value could not be parsed
    Parse(String),

    // The value could be parsed, but is invalid
    Value(String),

    /// A function name in a function list (e.g. `skewX` in a transform) is not supported
    UnsupportedFunction(String),
}

impl ValueErrorKind {
    pub fn parse_error(s: &str) -> ValueErrorKind {
        ValueErrorKind::Parse(s.to_string())
    }

    pub fn value_error(s: &str) -> ValueErrorKind {
        ValueErrorKind::Value(s.to_string())
    }
}

impl fmt::Display for ValueErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ValueErrorKind::Parse(ref s) => write!(f, "parse error: {s}"),

            ValueErrorKind::Value(ref s) => write!(f, "invalid value: {s}"),

            ValueErrorKind::UnsupportedFunction(ref s) => write!(f, "unsupported function: {s}"),
        }
    }
}

impl<'a> From<BasicParseError<'a>> for ValueErrorKind {
    fn from(e: BasicParseError<'_>) -> ValueErrorKind {
        let BasicParseError { kind, .. } = e;

        let msg = match kind {
            BasicParseErrorKind::UnexpectedToken(_) => "unexpected token",
            BasicParseErrorKind::EndOfInput => "unexpected end of input",
            BasicParseErrorKind::AtRuleInvalid(_) => "invalid @-rule",
            BasicParseErrorKind::AtRuleBodyInvalid => "invalid @-rule body",
            BasicParseErrorKind::QualifiedRuleInvalid => "invalid qualified rule",
        };

        ValueErrorKind::parse_error(msg)
    }
}

/// A complete error for an attribute and its erroneous value
#[derive(Debug, Clone, PartialEq)]
pub struct ElementError {
    pub element: String,
    pub attr: String,
    pub err: ValueErrorKind,
}

impl fmt::Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {}: {}", self.element, self.attr, self.err)
    }
}

/// Errors returned by [`crate::Document::parse`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadingError {
    /// The source is not well-formed XML, or it has no root element.
    #[error("XML parse error: {0}")]
    MalformedXml(String),

    /// A numeric, transform or path attribute could not be parsed.
    #[error("invalid attribute {attr} on <{element}>: {message}")]
    MalformedAttribute {
        element: String,
        attr: String,
        message: String,
    },

    /// Path data uses a command letter outside of `MmLlHhVvCcSsQqTtAaZz`.
    #[error("unsupported path command '{command}' at position {position} in <{element}>")]
    UnsupportedPathCommand {
        element: String,
        position: usize,
        command: char,
    },

    /// A transform list uses a function other than translate, rotate, scale or matrix.
    #[error("unsupported transform command: {0}")]
    UnsupportedTransformCommand(String),
}

impl From<ElementError> for LoadingError {
    fn from(e: ElementError) -> LoadingError {
        let ElementError { element, attr, err } = e;

        match err {
            ValueErrorKind::UnsupportedFunction(name) => {
                LoadingError::UnsupportedTransformCommand(name)
            }

            err => LoadingError::MalformedAttribute {
                element,
                attr,
                message: err.to_string(),
            },
        }
    }
}

/// Errors that can happen while rendering or measuring a document.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderingError {
    /// A gradient uses `objectBoundingBox` units or a `gradientTransform`.
    #[error("unsupported gradient feature: {0}")]
    UnsupportedGradientFeature(String),

    /// Tried to reference an element id that does not exist.
    #[error("undefined element id {0}")]
    MissingElementId(String),

    /// A transform stack was restored more often than it was saved.
    #[error("restore doesn't match save")]
    UnbalancedRestore,
}

/// Helper for converting `Result<O, E>` into `Result<O, ElementError>`
///
/// A `ElementError` represents a value error plus the element and attribute
/// that had the value.
pub trait AttributeResultExt<O> {
    fn attribute(self, element: &str, attr: &str) -> Result<O, ElementError>;
}

impl<O> AttributeResultExt<O> for Result<O, ValueErrorKind> {
    fn attribute(self, element: &str, attr: &str) -> Result<O, ElementError> {
        self.map_err(|err| ElementError {
            element: element.to_string(),
            attr: attr.to_string(),
            err,
        })
    }
}

/// Convert a short-lived ParseError into a long-lived ValueErrorKind
///
/// Kept out of line so that the generic `impl` below does not get a copy of this
/// code for every `O`.
fn parse_error_to_value_error(e: ParseError<'_>) -> ValueErrorKind {
    let ParseError {
        kind,
        location: _location,
    } = e;

    match kind {
        ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(tok)) => {
            let mut s = String::from("unexpected token '");
            // writing into a String does not fail
            let _ = tok.to_css(&mut s);
            s.push('\'');

            ValueErrorKind::Parse(s)
        }

        ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
            ValueErrorKind::parse_error("unexpected end of input")
        }

        ParseErrorKind::Basic(_) => ValueErrorKind::parse_error("invalid syntax"),

        ParseErrorKind::Custom(err) => err,
    }
}

impl<'i> From<ParseError<'i>> for ValueErrorKind {
    fn from(e: ParseError<'i>) -> ValueErrorKind {
        parse_error_to_value_error(e)
    }
}

impl<'i, O> AttributeResultExt<O> for Result<O, ParseError<'i>> {
    fn attribute(self, element: &str, attr: &str) -> Result<O, ElementError> {
        self.map_err(parse_error_to_value_error)
            .attribute(element, attr)
    }
}
