//! Forward-only markup events
//!
//! The extractor never looks at bytes directly. It consumes [`XmlEvent`]s
//! from an [`EventSource`], which keeps the streaming walk independent of the
//! XML reader behind it.

pub mod reader;

pub use reader::XmlReader;

use crate::error::Result;

/// One attribute of a start tag, value already unescaped
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Events emitted by an [`EventSource`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlEvent {
    /// Start tag with its qualified name and attributes in document order
    Start {
        name: String,
        attributes: Vec<Attribute>,
    },
    /// End tag (also emitted right after the start of an empty element)
    End { name: String },
    /// Character data; `cdata` is set for `<![CDATA[...]]>` sections
    Text { content: String, cdata: bool },
}

impl XmlEvent {
    pub fn start(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self::Start {
            name: name.into(),
            attributes,
        }
    }

    pub fn end(name: impl Into<String>) -> Self {
        Self::End { name: name.into() }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            cdata: false,
        }
    }

    pub fn cdata(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            cdata: true,
        }
    }
}

/// A forward-only sequence of [`XmlEvent`]s.
///
/// `Ok(None)` means the source is exhausted. Sources are never rewound.
pub trait EventSource {
    fn next_event(&mut self) -> Result<Option<XmlEvent>>;

    /// Byte offset of the source, when it has one
    fn position(&self) -> Option<u64> {
        None
    }
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn next_event(&mut self) -> Result<Option<XmlEvent>> {
        (**self).next_event()
    }

    fn position(&self) -> Option<u64> {
        (**self).position()
    }
}

/// Event source over an in-memory iterator of events
#[derive(Clone, Debug)]
pub struct Events<I> {
    inner: I,
}

impl<I: Iterator<Item = XmlEvent>> EventSource for Events<I> {
    fn next_event(&mut self) -> Result<Option<XmlEvent>> {
        Ok(self.inner.next())
    }
}

/// Wrap any collection or iterator of events as an [`EventSource`]
pub fn events<I>(events: I) -> Events<I::IntoIter>
where
    I: IntoIterator<Item = XmlEvent>,
{
    Events {
        inner: events.into_iter(),
    }
}
