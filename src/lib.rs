//! xmlharvest - streaming sub-tree extraction from large XML documents
//!
//! A path expression in a small XPath dialect (`/a/b`, `//b`, `*`,
//! `[@name='value']`) picks the elements of interest. The document is read
//! once, forward only; matched elements are serialized as [`Fragment`]s and
//! everything else is skipped without buffering. Fragments can then be
//! turned into [`Node`] trees with a [`Request`] of attributes, text and
//! relative XPath children.
//!
//! # Quick Start
//!
//! ```
//! use xmlharvest::{extract_str, harvest_str, Request};
//! # fn main() -> Result<(), xmlharvest::Error> {
//! let xml = "<feed><entry id='1'><title>one</title></entry>\
//!            <entry id='2'><title>two</title></entry></feed>";
//!
//! let fragments = extract_str(xml, "//entry")?;
//! assert_eq!(fragments[0], "<entry id='1'><title>one</title></entry>");
//!
//! let request = Request::new()
//!     .attribute("id")
//!     .child("title", Request::new().with_text());
//! let nodes = harvest_str(xml, "/feed/entry[@id='2']", &request)?;
//! let title = nodes[0].find("title").and_then(|t| t.first()).and_then(|t| t.text());
//! assert_eq!(title, Some("two"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Result};

pub mod event;
pub use event::{events, Attribute, EventSource, Events, XmlEvent, XmlReader};

pub mod selector;
pub use selector::{Predicate, Segment, Selector, Step, Transition};

pub mod extract;
pub use extract::{ExtractConfig, Extractor, Fragment};

pub mod request;
pub use request::Request;

pub mod node;
pub use node::Node;

pub mod build;
pub use build::TreeBuilder;

pub mod harvest;
pub use harvest::{Harvest, Harvester};

/// Compile a path expression
pub fn compile(expression: &str) -> Result<Selector> {
    Selector::compile(expression)
}

/// Extract every fragment `expression` matches in `xml`
pub fn extract_str(xml: &str, expression: &str) -> Result<Vec<Fragment>> {
    let selector = Selector::compile(expression)?;
    selector.extract(XmlReader::from_str(xml)).collect()
}

/// Extract with explicit limits
pub fn extract_str_with_config(
    xml: &str,
    expression: &str,
    config: ExtractConfig,
) -> Result<Vec<Fragment>> {
    let selector = Selector::compile(expression)?;
    selector
        .extract_with_config(XmlReader::from_str(xml), config)
        .collect()
}

/// Build a [`Node`] for every item `expression` matches in `xml`.
///
/// Stops at the first error, including a per-item
/// [`ErrorKind::FragmentParse`]; use [`Harvester`] to skip those instead.
pub fn harvest_str(xml: &str, expression: &str, request: &Request) -> Result<Vec<Node>> {
    let harvester = Harvester::new(expression, request.clone())?;
    harvester.harvest(XmlReader::from_str(xml)).collect()
}
