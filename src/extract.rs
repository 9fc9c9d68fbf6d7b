//! Streaming matcher and extractor
//!
//! [`Extractor`] walks an [`EventSource`] once, front to back, driving a
//! compiled [`Selector`]. Elements the selector rejects are skipped without
//! buffering; elements it accepts are captured whole and yielded as
//! [`Fragment`]s. A captured element is never searched for further matches.
//!
//! The descent is kept on an explicit frame stack, so pulling the iterator
//! only advances the source as far as the next fragment and dropping it
//! abandons the source where it stands.

use std::fmt;
use std::iter::FusedIterator;

use quick_xml::escape::{escape, partial_escape};
use tracing::{debug, trace, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::event::{Attribute, EventSource, XmlEvent};
use crate::selector::{Segment, Selector, Transition};

/// Limits applied while extracting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Maximum number of descended (not captured, not skipped) elements open
    /// at once (0 means unlimited)
    pub max_depth: u16,
    /// Maximum size of a single fragment in bytes (0 means unlimited)
    pub max_fragment_size: usize,
}

/// No limits; documents are only bounded by their own depth
impl Default for ExtractConfig {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl ExtractConfig {
    /// Create a new config with unlimited depth and size
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_fragment_size: 0,
        }
    }

    /// Create a new config with specific limits
    pub const fn new(max_depth: u16, max_fragment_size: usize) -> Self {
        Self {
            max_depth,
            max_fragment_size,
        }
    }
}

/// Serialized text of one matched element and its subtree.
///
/// Attributes keep their document order and are written single-quoted.
/// Text is trimmed and re-escaped, CDATA keeps its markers, empty elements
/// are written with an explicit end tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fragment(String);

impl Fragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fragment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Fragment> for String {
    fn from(fragment: Fragment) -> Self {
        fragment.0
    }
}

impl PartialEq<str> for Fragment {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Fragment {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for Fragment {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}

/// Lazy iterator of fragments matched by a selector.
///
/// Ends after the source is exhausted or after the first error.
#[derive(Debug)]
pub struct Extractor<'s, S> {
    source: S,
    /// Segment in effect at each open descended element; the bottom frame
    /// applies to the document's top level
    frames: Vec<&'s Segment>,
    config: ExtractConfig,
    emitted: usize,
    finished: bool,
}

impl Selector {
    /// Stream the fragments this selector matches in `source`
    pub fn extract<S: EventSource>(&self, source: S) -> Extractor<'_, S> {
        Extractor::new(self, source)
    }

    /// Like [`Selector::extract`] with explicit limits
    pub fn extract_with_config<S: EventSource>(
        &self,
        source: S,
        config: ExtractConfig,
    ) -> Extractor<'_, S> {
        Extractor::with_config(self, source, config)
    }
}

impl<'s, S: EventSource> Extractor<'s, S> {
    pub fn new(selector: &'s Selector, source: S) -> Self {
        Self::with_config(selector, source, ExtractConfig::default())
    }

    pub fn with_config(selector: &'s Selector, source: S, config: ExtractConfig) -> Self {
        Self {
            source,
            frames: vec![selector.root()],
            config,
            emitted: 0,
            finished: false,
        }
    }

    /// Number of fragments yielded so far
    pub fn fragments_emitted(&self) -> usize {
        self.emitted
    }

    /// Number of descended elements currently open
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    fn walk(&mut self) -> Result<Option<Fragment>> {
        loop {
            let Some(event) = self.source.next_event()? else {
                if self.depth() > 0 {
                    return Err(self.truncated("input ended inside an open element"));
                }
                return Ok(None);
            };

            match event {
                XmlEvent::Start { name, attributes } => {
                    let Some(&segment) = self.frames.last() else {
                        return Ok(None);
                    };
                    match segment.advance(&name, &attributes) {
                        Transition::Capture => {
                            return self.capture(&name, &attributes).map(Some);
                        }
                        Transition::Descend(next) => self.descend(next)?,
                        Transition::Skip => self.skip()?,
                    }
                }
                XmlEvent::End { .. } => {
                    self.frames.pop();
                    if self.frames.is_empty() {
                        return Ok(None);
                    }
                }
                XmlEvent::Text { .. } => {}
            }
        }
    }

    fn descend(&mut self, segment: &'s Segment) -> Result<()> {
        let max = self.config.max_depth;
        if max > 0 && self.depth() >= usize::from(max) {
            return Err(self.located(Error::new(ErrorKind::MaxDepthExceeded { max })));
        }
        self.frames.push(segment);
        Ok(())
    }

    /// Consume the rest of the current element without keeping anything
    fn skip(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.source.next_event()? {
                Some(XmlEvent::Start { .. }) => depth += 1,
                Some(XmlEvent::End { .. }) => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                Some(XmlEvent::Text { .. }) => {}
                None => return Err(self.truncated("input ended inside a skipped element")),
            }
        }
    }

    /// Serialize the element whose start tag was just read, up to its end tag
    fn capture(&mut self, name: &str, attributes: &[Attribute]) -> Result<Fragment> {
        let mut out = String::new();
        write_start(&mut out, name, attributes);

        let mut depth = 0usize;
        loop {
            let Some(event) = self.source.next_event()? else {
                return Err(self.truncated("input ended inside a captured element"));
            };
            match event {
                XmlEvent::Start { name, attributes } => {
                    write_start(&mut out, &name, &attributes);
                    depth += 1;
                }
                XmlEvent::End { name } => {
                    write_end(&mut out, &name);
                    if depth == 0 {
                        return Ok(Fragment(out));
                    }
                    depth -= 1;
                }
                XmlEvent::Text { content, cdata } => write_text(&mut out, &content, cdata),
            }

            let max = self.config.max_fragment_size;
            if max > 0 && out.len() > max {
                return Err(self.located(Error::new(ErrorKind::MaxSizeExceeded { max })));
            }
        }
    }

    fn truncated(&self, message: &str) -> Error {
        self.located(Error::with_message(ErrorKind::TruncatedInput, message))
    }

    fn located(&self, err: Error) -> Error {
        match self.source.position() {
            Some(pos) => err.at(pos),
            None => err,
        }
    }
}

impl<S: EventSource> Iterator for Extractor<'_, S> {
    type Item = Result<Fragment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.walk() {
            Ok(Some(fragment)) => {
                self.emitted += 1;
                trace!(index = self.emitted, bytes = fragment.0.len(), "fragment captured");
                Some(Ok(fragment))
            }
            Ok(None) => {
                self.finished = true;
                debug!(fragments = self.emitted, "extraction finished");
                None
            }
            Err(err) => {
                self.finished = true;
                warn!(fragments = self.emitted, error = %err, "extraction aborted");
                Some(Err(err))
            }
        }
    }
}

impl<S: EventSource> FusedIterator for Extractor<'_, S> {}

fn write_start(out: &mut String, name: &str, attributes: &[Attribute]) {
    out.push('<');
    out.push_str(name);
    for attr in attributes {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("='");
        out.push_str(&escape(attr.value.as_str()));
        out.push('\'');
    }
    out.push('>');
}

fn write_end(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn write_text(out: &mut String, content: &str, cdata: bool) {
    let trimmed = content.trim();
    if cdata {
        out.push_str("<![CDATA[");
        out.push_str(trimmed);
        out.push_str("]]>");
    } else {
        out.push_str(&partial_escape(trimmed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{events, XmlReader};

    fn run(expression: &str, xml: &str) -> Result<Vec<String>> {
        let selector = Selector::compile(expression)?;
        selector
            .extract(XmlReader::from_str(xml))
            .map(|fragment| fragment.map(Fragment::into_string))
            .collect()
    }

    #[test]
    fn test_exact_path_captures_verbatim() -> Result<()> {
        let xml = r#"<root>
            <item id="1" kind="a">
                <name>  first  </name>
                <empty/>
            </item>
            <other><item id="x"/></other>
            <item id="2"/>
        </root>"#;
        assert_eq!(
            run("/root/item", xml)?,
            vec![
                "<item id='1' kind='a'><name>first</name><empty></empty></item>",
                "<item id='2'></item>",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_captured_subtree_is_not_redescended() -> Result<()> {
        let xml = "<r><a><a>inner</a></a><b><a>deep</a></b></r>";
        assert_eq!(
            run("//a", xml)?,
            vec!["<a><a>inner</a></a>", "<a>deep</a>"]
        );
        Ok(())
    }

    #[test]
    fn test_escaping_and_cdata() -> Result<()> {
        let xml = "<r><v q=\"it's &lt;x&gt;\">a &amp; b<![CDATA[  <raw> ]]></v></r>";
        assert_eq!(
            run("/r/v", xml)?,
            vec!["<v q='it&apos;s &lt;x&gt;'>a &amp; b<![CDATA[<raw>]]></v>"]
        );
        Ok(())
    }

    #[test]
    fn test_no_match_is_empty_not_error() -> Result<()> {
        assert!(run("/unknown", "<root><a/></root>")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_truncated_capture() -> Result<()> {
        let selector = Selector::compile("/r/a")?;
        let source = events(vec![
            XmlEvent::start("r", vec![]),
            XmlEvent::start("a", vec![]),
            XmlEvent::end("a"),
            XmlEvent::start("a", vec![]),
            XmlEvent::text("cut"),
        ]);
        let results: Vec<_> = selector.extract(source).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results.first(), Some(&Ok(Fragment("<a></a>".to_string()))));
        assert!(matches!(
            results.get(1),
            Some(Err(err)) if err.kind() == &ErrorKind::TruncatedInput
        ));
        Ok(())
    }

    #[test]
    fn test_truncated_skip_and_open_frames() -> Result<()> {
        for expression in ["/r/a", "/r/b/c"] {
            let selector = Selector::compile(expression)?;
            let source = events(vec![
                XmlEvent::start("r", vec![]),
                XmlEvent::start("b", vec![]),
            ]);
            let results: Vec<_> = selector.extract(source).collect();
            assert!(
                matches!(
                    results.as_slice(),
                    [Err(err)] if err.kind() == &ErrorKind::TruncatedInput
                ),
                "{expression}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_max_depth_limits_descended_frames_only() -> Result<()> {
        let selector = Selector::compile("//leaf")?;
        let xml = "<a><b><c><leaf/></c></b></a>";

        let limited = ExtractConfig::new(2, 0);
        let results: Vec<_> = selector
            .extract_with_config(XmlReader::from_str(xml), limited)
            .collect();
        assert!(matches!(
            results.as_slice(),
            [Err(err)] if err.kind() == &ErrorKind::MaxDepthExceeded { max: 2 }
        ));

        let exact = Selector::compile("/a/x")?;
        let found: Vec<_> = exact
            .extract_with_config(XmlReader::from_str(xml), ExtractConfig::new(1, 0))
            .collect::<Result<_>>()?;
        assert!(found.is_empty());
        Ok(())
    }

    #[test]
    fn test_max_fragment_size() -> Result<()> {
        let selector = Selector::compile("/r")?;
        let results: Vec<_> = selector
            .extract_with_config(
                XmlReader::from_str("<r>0123456789</r>"),
                ExtractConfig::new(0, 8),
            )
            .collect();
        assert!(matches!(
            results.as_slice(),
            [Err(err)] if err.kind() == &ErrorKind::MaxSizeExceeded { max: 8 }
        ));
        Ok(())
    }

    #[test]
    fn test_default_config_is_unlimited() -> Result<()> {
        assert_eq!(ExtractConfig::default(), ExtractConfig::unlimited());

        let selector = Selector::compile("//leaf")?;
        let xml = format!("{}<leaf/>{}", "<n>".repeat(300), "</n>".repeat(300));
        let found: Vec<_> = selector
            .extract(XmlReader::from_str(&xml))
            .collect::<Result<_>>()?;
        assert_eq!(found, vec![Fragment("<leaf></leaf>".to_string())]);
        Ok(())
    }

    #[test]
    fn test_extractor_is_lazy_and_counts() -> Result<()> {
        let selector = Selector::compile("//i")?;
        let mut extractor = selector.extract(XmlReader::from_str("<r><i>1</i><i>2</i></r>"));
        assert_eq!(extractor.fragments_emitted(), 0);
        let first = extractor.next().transpose()?;
        assert_eq!(first.as_ref().map(Fragment::as_str), Some("<i>1</i>"));
        assert_eq!(extractor.fragments_emitted(), 1);
        assert_eq!(extractor.depth(), 1);
        assert!(extractor.next().is_some());
        assert!(extractor.next().is_none());
        assert!(extractor.next().is_none());
        Ok(())
    }
}
