//! Result tree builder
//!
//! Each fragment is reparsed with `sxd-document` and read according to a
//! [`Request`], evaluating the request's relative selectors with
//! `sxd-xpath`. Selectors are compiled once, when the builder is created.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use sxd_document::{dom, parser};
use sxd_xpath::nodeset::Node as XPathNode;
use sxd_xpath::{Context, Factory, Value, XPath};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::extract::Fragment;
use crate::node::Node;
use crate::request::Request;

/// Builds a [`Node`] per fragment for a fixed [`Request`]
pub struct TreeBuilder {
    request: Request,
    compiled: HashMap<String, XPath>,
}

impl TreeBuilder {
    /// Compile every relative selector in `request`
    pub fn new(request: Request) -> Result<Self> {
        let factory = Factory::new();
        let mut compiled = HashMap::new();
        for selector in request.selectors() {
            if compiled.contains_key(selector) {
                continue;
            }
            let xpath = factory
                .build(selector)
                .map_err(|err| Error::malformed_selector(selector, err))?
                .ok_or_else(|| Error::malformed_selector(selector, "empty relative selector"))?;
            compiled.insert(selector.to_string(), xpath);
        }
        debug!(selectors = compiled.len(), "compiled relative selectors");

        Ok(Self { request, compiled })
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn build(&self, fragment: &Fragment) -> Result<Node> {
        self.build_str(fragment.as_str())
    }

    /// Build from any standalone element serialization
    pub fn build_str(&self, xml: &str) -> Result<Node> {
        let package = parser::parse(xml).map_err(|err| {
            Error::with_message(
                ErrorKind::FragmentParse,
                format!("cannot reparse fragment: {err:?}"),
            )
        })?;
        let document = package.as_document();
        let root = document
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                dom::ChildOfRoot::Element(element) => Some(element),
                _ => None,
            })
            .ok_or_else(|| {
                Error::with_message(ErrorKind::FragmentParse, "fragment has no root element")
            })?;

        let context = Context::new();
        self.node(&context, root, &self.request)
    }

    fn node<'d>(
        &self,
        context: &Context<'d>,
        element: dom::Element<'d>,
        request: &Request,
    ) -> Result<Node> {
        let text = request
            .wants_text()
            .then(|| XPathNode::Element(element).string_value());

        let attributes = request
            .attribute_names()
            .map(|name| {
                let value = element.attribute_value(name).unwrap_or_default();
                (name.to_string(), value.to_string())
            })
            .collect();

        let mut children = IndexMap::new();
        for (selector, child_request) in request.children() {
            let xpath = self
                .compiled
                .get(selector)
                .ok_or_else(|| Error::malformed_selector(selector, "selector was not compiled"))?;
            let value = xpath
                .evaluate(context, element)
                .map_err(|err| Error::malformed_selector(selector, err))?;

            let nodes = match value {
                Value::Nodeset(nodes) => nodes
                    .document_order()
                    .into_iter()
                    .filter_map(|node| match node {
                        XPathNode::Element(child) => Some(child),
                        _ => None,
                    })
                    .map(|child| self.node(context, child, child_request))
                    .collect::<Result<Vec<_>>>()?,
                _ => Vec::new(),
            };
            children.insert(selector.to_string(), nodes);
        }

        Ok(Node::from_parts(text, attributes, children))
    }
}

impl fmt::Debug for TreeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("request", &self.request)
            .field("selectors", &self.compiled.keys().collect::<Vec<_>>())
            .finish()
    }
}
