//! Result tree produced for each matched element

use indexmap::IndexMap;

/// Values read from one element according to a [`crate::Request`].
///
/// `children` holds one entry per relative selector in the request, even
/// when that selector matched nothing, so [`Node::find`] can tell "not
/// requested" (`None`) from "requested, no matches" (`Some(&[])`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Node {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    text: Option<String>,
    attributes: IndexMap<String, String>,
    children: IndexMap<String, Vec<Node>>,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        text: Option<String>,
        attributes: IndexMap<String, String>,
        children: IndexMap<String, Vec<Self>>,
    ) -> Self {
        Self {
            text,
            attributes,
            children,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, selector: impl Into<String>, nodes: Vec<Self>) -> Self {
        self.children.insert(selector.into(), nodes);
        self
    }

    /// Text content, present only when it was requested
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Requested attribute value; an attribute missing on the element reads
    /// as `""`, an attribute that was never requested as `None`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Nodes built for a requested relative selector, in document order
    pub fn find(&self, selector: &str) -> Option<&[Self]> {
        self.children.get(selector).map(Vec::as_slice)
    }

    pub fn children(&self) -> &IndexMap<String, Vec<Self>> {
        &self.children
    }
}
