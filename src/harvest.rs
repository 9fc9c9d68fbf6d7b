//! Selector, request and tree builder combined into one pass

use std::iter::FusedIterator;

use tracing::warn;

use crate::build::TreeBuilder;
use crate::error::{ErrorKind, Result};
use crate::event::EventSource;
use crate::extract::{ExtractConfig, Extractor};
use crate::node::Node;
use crate::request::Request;
use crate::selector::Selector;

/// Extracts every item a selector matches and builds a [`Node`] for each.
///
/// Both the selector and the request's relative selectors are compiled up
/// front, so a `Harvester` can be reused across many documents.
///
/// ```
/// use xmlharvest::{Harvester, Request, XmlReader};
///
/// # fn main() -> xmlharvest::Result<()> {
/// let harvester = Harvester::new(
///     "/shop//item",
///     Request::new().attribute("sku").child("name", Request::new().with_text()),
/// )?;
/// let xml = "<shop><aisle><item sku='1'><name>tea</name></item></aisle></shop>";
/// let nodes = harvester
///     .harvest(XmlReader::from_str(xml))
///     .collect::<xmlharvest::Result<Vec<_>>>()?;
///
/// assert_eq!(nodes.len(), 1);
/// assert_eq!(nodes[0].attribute("sku"), Some("1"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Harvester {
    selector: Selector,
    builder: TreeBuilder,
    config: ExtractConfig,
}

impl Harvester {
    pub fn new(expression: &str, request: Request) -> Result<Self> {
        Ok(Self {
            selector: Selector::compile(expression)?,
            builder: TreeBuilder::new(request)?,
            config: ExtractConfig::default(),
        })
    }

    pub fn with_config(mut self, config: ExtractConfig) -> Self {
        self.config = config;
        self
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn request(&self) -> &Request {
        self.builder.request()
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Lazily harvest `source`.
    ///
    /// A fragment that cannot be reparsed yields a
    /// [`ErrorKind::FragmentParse`] error for that item only and the
    /// iteration continues. Any other error ends it.
    pub fn harvest<S: EventSource>(&self, source: S) -> Harvest<'_, S> {
        Harvest {
            fragments: self.selector.extract_with_config(source, self.config),
            builder: &self.builder,
            done: false,
        }
    }
}

/// Iterator returned by [`Harvester::harvest`]
#[derive(Debug)]
pub struct Harvest<'h, S> {
    fragments: Extractor<'h, S>,
    builder: &'h TreeBuilder,
    done: bool,
}

impl<S: EventSource> Iterator for Harvest<'_, S> {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let fragment = match self.fragments.next()? {
            Ok(fragment) => fragment,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };

        let node = self.builder.build(&fragment);
        if let Err(err) = &node {
            if err.kind() == &ErrorKind::FragmentParse {
                warn!(error = %err, fragment = %fragment, "skipping unreadable item");
            } else {
                warn!(error = %err, "harvest aborted");
                self.done = true;
            }
        }
        Some(node)
    }
}

impl<S: EventSource> FusedIterator for Harvest<'_, S> {}
