//! The XML loader.
//!
//! The document is tokenized with xml5ever's XML tokenizer, and the tokens are
//! assembled into a tree of [`XmlElement`].  This raw tree only lives while the
//! document is being preparsed; nothing in it is interpreted here, except for checking
//! that the markup is well formed.

use markup5ever::buffer_queue::BufferQueue;
use markup5ever::QualName;
use std::cell::RefCell;
use std::rc::Rc;
use xml5ever::tendril::format_tendril;
use xml5ever::tokenizer::{TagKind, Token, TokenSink, XmlTokenizer, XmlTokenizerOpts};

use crate::error::LoadingError;

/// A node in the raw tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element as it appears in the markup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Local name, without namespace prefix.
    pub name: String,
    /// Attributes in document order; prefixed names keep their prefix, as in
    /// `xlink:href`.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// The concatenated text of the element and its descendants.
    pub fn text(&self) -> String {
        let mut s = String::new();
        self.collect_text(&mut s);
        s
    }

    fn collect_text(&self, s: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.collect_text(s),
                XmlNode::Text(t) => s.push_str(t),
            }
        }
    }

    /// Visits the element and all its descendants, depth first, in document order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a XmlElement)) {
        f(self);
        for e in self.elements() {
            e.walk(f);
        }
    }
}

fn qual_name_to_string(name: &QualName) -> String {
    match name.prefix {
        Some(ref prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.to_string(),
    }
}

#[derive(Default)]
struct XmlStateInner {
    open_elements: Vec<XmlElement>,
    root: Option<XmlElement>,
    error: Option<LoadingError>,
}

impl XmlStateInner {
    fn fatal(&mut self, msg: String) {
        if self.error.is_none() {
            self.error = Some(LoadingError::MalformedXml(msg));
        }
    }

    fn start_element(&mut self, name: &QualName, attrs: Vec<(String, String)>) {
        self.open_elements.push(XmlElement {
            name: name.local.to_string(),
            attrs,
            children: Vec::new(),
        });
    }

    fn end_element(&mut self, name: Option<&QualName>) {
        let Some(element) = self.open_elements.pop() else {
            self.fatal("end tag without a start tag".to_string());
            return;
        };

        if let Some(name) = name {
            if &*name.local != element.name {
                self.fatal(format!(
                    "end tag </{}> does not match <{}>",
                    qual_name_to_string(name),
                    element.name
                ));
                return;
            }
        }

        match self.open_elements.last_mut() {
            Some(parent) => parent.children.push(XmlNode::Element(element)),

            None if self.root.is_some() => {
                self.fatal(format!("extra content at the end: <{}>", element.name));
            }

            None => self.root = Some(element),
        }
    }

    fn characters(&mut self, text: &str) {
        match self.open_elements.last_mut() {
            Some(parent) => match parent.children.last_mut() {
                Some(XmlNode::Text(t)) => t.push_str(text),
                _ => parent.children.push(XmlNode::Text(text.to_string())),
            },

            None if !text.trim().is_empty() => {
                self.fatal("text outside of the root element".to_string());
            }

            None => (),
        }
    }
}

struct XmlState(Rc<RefCell<XmlStateInner>>);

impl TokenSink for XmlState {
    fn process_token(&mut self, token: Token) {
        let mut inner = self.0.borrow_mut();

        if inner.error.is_some() {
            return;
        }

        match token {
            Token::TagToken(tag) => {
                let attrs = tag
                    .attrs
                    .iter()
                    .map(|a| (qual_name_to_string(&a.name), a.value.to_string()))
                    .collect();

                match tag.kind {
                    TagKind::StartTag => inner.start_element(&tag.name, attrs),

                    TagKind::EmptyTag => {
                        inner.start_element(&tag.name, attrs);
                        inner.end_element(None);
                    }

                    TagKind::EndTag => inner.end_element(Some(&tag.name)),

                    TagKind::ShortTag => inner.end_element(None),
                }
            }

            Token::CharacterTokens(text) => inner.characters(&text),

            Token::NullCharacterToken => inner.fatal("NUL character in document".to_string()),

            Token::ParseError(msg) => inner.fatal(msg.to_string()),

            Token::EOFToken => {
                if let Some(e) = inner.open_elements.last() {
                    let msg = format!("unclosed element <{}>", e.name);
                    inner.fatal(msg);
                }
            }

            Token::CommentToken(_) | Token::PIToken(_) | Token::DoctypeToken(_) => (),
        }
    }
}

/// Parses `source` into its root element.
pub fn parse(source: &str) -> Result<XmlElement, LoadingError> {
    let state = Rc::new(RefCell::new(XmlStateInner::default()));

    let mut queue = BufferQueue::new();
    queue.push_back(format_tendril!("{}", source));

    let mut tokenizer = XmlTokenizer::new(XmlState(state.clone()), XmlTokenizerOpts::default());
    tokenizer.run(&mut queue);
    tokenizer.end();

    let mut inner = state.borrow_mut();

    if let Some(e) = inner.error.take() {
        return Err(e);
    }

    inner
        .root
        .take()
        .ok_or_else(|| LoadingError::MalformedXml("no root element".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tree() {
        let root = parse(
            r##"<?xml version="1.0"?>
<!-- widget -->
<svg xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 10 10">
  <g id="a"><rect width="1"/></g>
  <text x="1">Hello <tspan>there</tspan></text>
  <linearGradient xlink:href="#b"/>
</svg>"##,
        )
        .unwrap();

        assert_eq!(root.name, "svg");
        assert_eq!(root.attr("viewBox"), Some("0 0 10 10"));

        let names: Vec<_> = root.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["g", "text", "linearGradient"]);

        let g = root.elements().next().unwrap();
        assert_eq!(g.attr("id"), Some("a"));
        assert_eq!(g.elements().next().unwrap().name, "rect");

        let text = root.elements().nth(1).unwrap();
        assert_eq!(text.text(), "Hello there");

        let gradient = root.elements().nth(2).unwrap();
        assert_eq!(gradient.attr("xlink:href"), Some("#b"));
    }

    #[test]
    fn walks_in_document_order() {
        let root = parse("<svg><g><a/><b/></g><c/></svg>").unwrap();

        let mut names = Vec::new();
        root.walk(&mut |e| names.push(e.name.clone()));

        assert_eq!(names, ["svg", "g", "a", "b", "c"]);
    }

    #[test]
    fn rejects_malformed_markup() {
        for source in [
            "",
            "   ",
            "<svg>",
            "<svg></g>",
            "<svg/><svg/>",
            "not xml at all",
        ] {
            assert!(
                matches!(parse(source), Err(LoadingError::MalformedXml(_))),
                "{source:?} should be rejected"
            );
        }
    }
}
