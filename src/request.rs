//! Declarative description of what to read from each matched element

use indexmap::{IndexMap, IndexSet};

/// What to read from one element, and which relative selectors to recurse
/// into.
///
/// ```
/// use xmlharvest::Request;
///
/// let request = Request::new()
///     .attribute("name")
///     .child("title", Request::new().with_text())
///     .child("img", Request::new().attribute("src"));
/// assert!(!request.wants_text());
/// assert_eq!(request.children().count(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Request {
    want_text: bool,
    attributes: IndexSet<String>,
    children: IndexMap<String, Request>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also read the element's text content
    pub fn with_text(mut self) -> Self {
        self.want_text = true;
        self
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.insert(name.into());
        self
    }

    pub fn attributes<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Recurse into the elements `selector` (relative XPath) selects.
    ///
    /// Adding the same selector twice replaces the earlier request.
    pub fn child(mut self, selector: impl Into<String>, request: Self) -> Self {
        self.children.insert(selector.into(), request);
        self
    }

    pub fn wants_text(&self) -> bool {
        self.want_text
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(String::as_str)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &Self)> {
        self.children
            .iter()
            .map(|(selector, request)| (selector.as_str(), request))
    }

    /// Every relative selector in this request tree, depth first
    pub(crate) fn selectors(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut pending = vec![self];
        while let Some(request) = pending.pop() {
            for (selector, child) in request.children() {
                out.push(selector);
                pending.push(child);
            }
        }
        out
    }
}
