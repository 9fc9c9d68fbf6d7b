//! Compiled path expressions
//!
//! A [`Selector`] is a chain of [`Segment`]s compiled from an absolute path
//! expression such as `/catalog//entry[@lang='en']`. Each segment either
//! matches the current element and hands descendants to its [`Step`], or, if
//! it is recursive, keeps searching deeper with itself.
//!
//! A `*` segment compiles the same way as a `//` gap: the next named segment
//! becomes recursive and may match at any depth. This differs from XPath,
//! where `*` stands for exactly one level.
//!
//! A `*` is also a real wildcard where it ends the expression or carries a
//! predicate: `/a/*` yields the outermost elements below `a`, and
//! `/a/*[@id='x']` any child of `a` with that attribute. Treating it as a
//! literal element name `*` would make both match nothing.

pub mod predicate;

pub use predicate::Predicate;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};
use crate::event::Attribute;

/// What follows a matched segment
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Descend and apply this segment to the children
    Segment(Box<Segment>),
    /// The matched element is itself an item
    Matched,
}

/// One compiled `/`-delimited part of a path expression
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    name: Option<String>,
    predicate: Option<Predicate>,
    next: Step,
    recursive: bool,
}

/// Outcome of offering a start tag to a segment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition<'s> {
    /// Capture the element and its whole subtree
    Capture,
    /// Walk the children with this segment
    Descend(&'s Segment),
    /// Discard the subtree
    Skip,
}

impl Segment {
    /// A segment matching any element at any depth, which is itself an item
    fn universal() -> Self {
        Self {
            name: None,
            predicate: None,
            next: Step::Matched,
            recursive: true,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn next(&self) -> &Step {
        &self.next
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn matches(&self, name: &str, attributes: &[Attribute]) -> bool {
        self.name.as_deref().is_none_or(|expected| expected == name)
            && self
                .predicate
                .as_ref()
                .is_none_or(|predicate| predicate.evaluate(attributes))
    }

    pub fn advance(&self, name: &str, attributes: &[Attribute]) -> Transition<'_> {
        if self.matches(name, attributes) {
            return match &self.next {
                Step::Matched => Transition::Capture,
                Step::Segment(next) => Transition::Descend(next),
            };
        }

        if self.recursive {
            Transition::Descend(self)
        } else {
            Transition::Skip
        }
    }
}

/// Compiled, immutable path expression
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    expression: String,
    root: Segment,
}

impl Selector {
    pub fn compile(expression: &str) -> Result<Self> {
        let root = compile_chain(expression)?;
        let selector = Self {
            expression: expression.to_string(),
            root,
        };
        debug!(
            selector = %selector.expression,
            segments = selector.segments().count(),
            "compiled selector"
        );
        Ok(selector)
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn root(&self) -> &Segment {
        &self.root
    }

    /// Segments from the root to the one whose match is an item
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        std::iter::successors(Some(&self.root), |segment| match &segment.next {
            Step::Segment(next) => Some(next.as_ref()),
            Step::Matched => None,
        })
    }

    /// True for `/`, `//`, `/*` and friends: every top-level element is an item
    pub fn is_universal(&self) -> bool {
        self.root == Segment::universal()
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::compile(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// A parsed segment before it is linked to its successor
struct Part {
    name: Option<String>,
    predicate: Option<Predicate>,
    recursive: bool,
}

fn compile_chain(expression: &str) -> Result<Segment> {
    if expression.trim().is_empty() {
        return Err(Error::malformed_selector(expression, "blank expression"));
    }
    let Some(rest) = expression.strip_prefix('/') else {
        return Err(Error::malformed_selector(
            expression,
            "expression must start with '/'",
        ));
    };
    if matches!(rest, "" | "/" | "*") {
        return Ok(Segment::universal());
    }

    let mut parts = Vec::new();
    let mut gaps = 0usize;
    let mut wildcard = false;
    for raw in split_segments(rest) {
        if raw.trim().is_empty() || raw == "*" {
            gaps += 1;
            wildcard |= raw == "*";
            continue;
        }
        parts.push(parse_part(expression, raw, gaps > 0)?);
        gaps = 0;
        wildcard = false;
    }

    // a single trailing `/` is tolerated, a trailing `//` has nothing to search for
    if gaps > 1 && !wildcard && !parts.is_empty() {
        return Err(Error::malformed_selector(
            expression,
            "expression ends in a descendant gap",
        ));
    }

    // `/a/*` selects the outermost elements below `a`
    if wildcard || parts.is_empty() {
        parts.push(Part {
            name: None,
            predicate: None,
            recursive: true,
        });
    }

    let mut chain: Option<Segment> = None;
    for part in parts.into_iter().rev() {
        let next = match chain.take() {
            Some(segment) => Step::Segment(Box::new(segment)),
            None => Step::Matched,
        };
        chain = Some(Segment {
            name: part.name,
            predicate: part.predicate,
            next,
            recursive: part.recursive,
        });
    }

    chain.ok_or_else(|| Error::malformed_selector(expression, "no segments"))
}

/// Split on `/` outside of predicate brackets
fn split_segments(rest: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                segments.extend(rest.get(start..idx));
                start = idx + 1;
            }
            _ => {}
        }
    }
    segments.extend(rest.get(start..));
    segments
}

fn parse_part(expression: &str, raw: &str, recursive: bool) -> Result<Part> {
    let (name, tail) = match raw.find('[') {
        Some(idx) => raw.split_at(idx),
        None => (raw, ""),
    };

    if name.is_empty() {
        return Err(Error::malformed_selector(
            expression,
            format!("segment {raw:?} has no element name"),
        ));
    }
    if !tail.is_empty() && (tail.len() < 3 || !tail.ends_with(']')) {
        return Err(Error::malformed_selector(
            expression,
            format!("segment {raw:?} has an unterminated predicate"),
        ));
    }

    Ok(Part {
        name: (name != "*").then(|| name.to_string()),
        predicate: (!tail.is_empty()).then(|| Predicate::parse(tail)),
        recursive,
    })
}
