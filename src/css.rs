//! CSS parsing: declaration blocks and class rules from `<style>` elements.
//!
//! Everything is tokenized with `cssparser`, so comments, strings and nested blocks
//! are handled the way a browser would handle them.
//!
//! Only rules whose selectors are simple classes, like `.knob` or `.a, .b`, are
//! understood.  Other selectors are logged and ignored.  When a class appears in
//! several rules, the declaration blocks are concatenated in document order, so later
//! declarations win when the block is parsed.

use std::collections::HashMap;

use cssparser::{
    parse_important, AtRuleParser, CowRcStr, DeclarationListParser, DeclarationParser, Parser,
    ParserInput, ParserState, QualifiedRuleParser, RuleListParser, Token,
};

use crate::error::*;
use crate::session::Session;
use crate::style::Style;
use crate::svg_log;

/// A CSS declaration like `fill: red !important`.
///
/// The value is kept as source text, minus surrounding whitespace, comments and the
/// `!important` marker; property parsers get to tokenize it again.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration<'i> {
    pub name: CowRcStr<'i>,
    pub value: &'i str,
    pub important: bool,
}

/// Dummy struct required to use `cssparser::DeclarationListParser`
struct DeclParser;

impl<'i> DeclarationParser<'i> for DeclParser {
    type Declaration = Declaration<'i>;
    type Error = ValueErrorKind;

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Declaration<'i>, ParseError<'i>> {
        input.skip_whitespace();

        let start = input.position();
        let mut end = start;
        let mut important = false;

        while !input.is_exhausted() {
            if input.try_parse(parse_important).is_ok() {
                input.expect_exhausted()?;
                important = true;
                break;
            }

            skip_component_value(input)?;
            end = input.position();
        }

        let value = input.slice(start..end).trim();
        if value.is_empty() {
            return Err(input.new_custom_error(ValueErrorKind::parse_error("empty value")));
        }

        Ok(Declaration {
            name,
            value,
            important,
        })
    }
}

// cssparser's DeclarationListParser requires this; the default methods reject
// every at-rule.
impl<'i> AtRuleParser<'i> for DeclParser {
    type Prelude = ();
    type AtRule = Declaration<'i>;
    type Error = ValueErrorKind;
}

/// Consumes one token, or a whole block if the token opens one.
fn skip_component_value<'i>(input: &mut Parser<'i, '_>) -> Result<(), ParseError<'i>> {
    let opens_block = matches!(
        input.next()?,
        Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock
    );

    if opens_block {
        input.parse_nested_block(|block| {
            while block.next().is_ok() {}
            Ok::<_, ParseError<'i>>(())
        })?;
    }

    Ok(())
}

/// Parses a declaration list like `fill: red; stroke: blue !important`.
///
/// Malformed declarations are logged and skipped.
pub fn parse_declarations<'i>(decls: &'i str, session: &Session) -> Vec<Declaration<'i>> {
    let mut input = ParserInput::new(decls);
    let mut parser = Parser::new(&mut input);

    DeclarationListParser::new(&mut parser, DeclParser)
        .filter_map(|res| match res {
            Ok(decl) => Some(decl),
            Err((e, text)) => {
                svg_log!(session, "ignoring CSS declaration \"{}\": {:?}", text.trim(), e.kind);
                None
            }
        })
        .collect()
}

/// Struct to implement `cssparser::QualifiedRuleParser` and `cssparser::AtRuleParser`
/// for the class rules of a stylesheet.
struct RuleParser<'s> {
    session: &'s Session,
}

/// A rule with its class selectors and the source text of its declaration block.
struct ClassRule<'i> {
    classes: Vec<String>,
    block: &'i str,
}

fn class_selector<'i>(input: &mut Parser<'i, '_>) -> Result<String, ParseError<'i>> {
    input.expect_delim('.')?;
    let class = input.expect_ident()?.to_string();
    input.expect_exhausted()?;
    Ok(class)
}

impl<'i, 's> QualifiedRuleParser<'i> for RuleParser<'s> {
    type Prelude = Vec<String>;
    type QualifiedRule = ClassRule<'i>;
    type Error = ValueErrorKind;

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Vec<String>, ParseError<'i>> {
        let session = self.session;

        let selectors = input.parse_comma_separated(|selector| {
            let start = selector.position();

            if let Ok(class) = selector.try_parse(class_selector) {
                return Ok(Some(class));
            }

            while selector.next().is_ok() {}
            svg_log!(session, "ignoring CSS selector \"{}\"", selector.slice_from(start).trim());
            Ok::<_, ParseError<'i>>(None)
        })?;

        Ok(selectors.into_iter().flatten().collect())
    }

    fn parse_block<'t>(
        &mut self,
        classes: Vec<String>,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<ClassRule<'i>, ParseError<'i>> {
        let start = input.position();
        while input.next().is_ok() {}

        Ok(ClassRule {
            classes,
            block: input.slice_from(start).trim(),
        })
    }
}

// At-rules are not supported; the default methods reject them.
impl<'i, 's> AtRuleParser<'i> for RuleParser<'s> {
    type Prelude = ();
    type AtRule = ClassRule<'i>;
    type Error = ValueErrorKind;
}

/// Map from class names to their declaration blocks.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClassTable {
    rules: HashMap<String, String>,
}

impl ClassTable {
    /// Parses the concatenated contents of all the `<style>` elements.
    pub fn parse(css: &str, session: &Session) -> ClassTable {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);

        let mut rules: HashMap<String, String> = HashMap::new();

        for rule in RuleListParser::new_for_stylesheet(&mut parser, RuleParser { session }) {
            let rule = match rule {
                Ok(rule) => rule,
                Err((_, text)) => {
                    svg_log!(session, "ignoring CSS rule \"{}\"", text.trim());
                    continue;
                }
            };

            for class in rule.classes {
                rules
                    .entry(class)
                    .and_modify(|decls| {
                        decls.push_str("; ");
                        decls.push_str(rule.block);
                    })
                    .or_insert_with(|| rule.block.to_string());
            }
        }

        ClassTable { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The declarations for `class`, as written in the stylesheet.
    pub fn get(&self, class: &str) -> Option<&str> {
        self.rules.get(class).map(String::as_str)
    }

    /// Computes the style given by a `class` attribute.
    ///
    /// The attribute may list several classes; their rules are applied in the order
    /// the classes are listed.  Unknown classes are ignored.
    pub fn style_for(&self, class_attr: &str, session: &Session) -> Style {
        let mut style = Style::default();

        for class in class_attr.split_whitespace() {
            if let Some(decls) = self.get(class) {
                style.parse_declarations(decls, session);
            }
        }

        style
    }
}
