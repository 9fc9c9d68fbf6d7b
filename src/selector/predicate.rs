//! Attribute predicates of a path segment
//!
//! Only `[@name='value']` and `[@name="value"]` are understood. Groups in any
//! other shape (positions, functions, unquoted values) are dropped from the
//! conjunction instead of failing compilation, so an unsupported predicate
//! widens the match set.

use tracing::debug;

use crate::event::Attribute;

/// Attribute condition attached to a segment
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// The attribute exists and its value is exactly `value`
    Equals { name: String, value: String },
    /// Every inner predicate holds (vacuously true when empty)
    All(Vec<Predicate>),
}

impl Predicate {
    pub fn equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse the bracket tail of a segment, e.g. `[@a='1'][@b="2"]`
    pub fn parse(tail: &str) -> Self {
        let tests = bracket_groups(tail)
            .filter_map(|group| {
                let parsed = parse_equality(group);
                if parsed.is_none() {
                    debug!(predicate = group, "dropping unsupported predicate");
                }
                parsed
            })
            .collect();
        Self::All(tests)
    }

    pub fn evaluate(&self, attributes: &[Attribute]) -> bool {
        match self {
            Self::Equals { name, value } => attributes
                .iter()
                .any(|attr| attr.name == *name && attr.value == *value),
            Self::All(tests) => tests.iter().all(|test| test.evaluate(attributes)),
        }
    }
}

/// Text between each `[` and the next `]`, scanning left to right
fn bracket_groups(tail: &str) -> impl Iterator<Item = &str> {
    let mut rest = tail;
    std::iter::from_fn(move || {
        let (_, open) = rest.split_once('[')?;
        let (group, after) = open.split_once(']')?;
        rest = after;
        Some(group)
    })
}

fn parse_equality(group: &str) -> Option<Predicate> {
    let body = group.trim().strip_prefix('@')?;

    // Rightmost split first, so `=` inside the quoted value still works
    body.rmatch_indices('=').find_map(|(idx, _)| {
        let (name, rest) = body.split_at(idx);
        let value = quoted(rest.strip_prefix('=')?)?;
        if name.is_empty() {
            return None;
        }
        Some(Predicate::equals(name, value))
    })
}

fn quoted(raw: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|quote| {
        raw.strip_prefix(quote)
            .and_then(|inner| inner.strip_suffix(quote))
            .filter(|inner| !inner.is_empty())
    })
}
