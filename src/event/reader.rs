//! quick-xml backed event source

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::trace;

use crate::error::{Error, ErrorKind, Result};
use crate::event::{Attribute, EventSource, XmlEvent};

/// Streaming XML reader producing [`XmlEvent`]s.
///
/// Declarations, comments, processing instructions and doctypes are dropped.
/// An empty element `<a/>` is reported as a start event directly followed by
/// its end event.
#[derive(Debug)]
pub struct XmlReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending_end: Option<String>,
}

/// What a single quick-xml event turned into
enum Read {
    Event(XmlEvent),
    Empty(String, Vec<Attribute>),
    Ignored,
    Eof,
}

impl<'a> XmlReader<&'a [u8]> {
    /// Read from an in-memory document
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &'a str) -> Self {
        Self::from_reader(s.as_bytes())
    }
}

impl<R: BufRead> XmlReader<R> {
    /// Read from any buffered reader
    pub fn from_reader(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        reader.config_mut().check_end_names = true;
        Self {
            reader,
            buf: Vec::new(),
            pending_end: None,
        }
    }

    /// Bytes consumed from the underlying reader so far
    pub fn buffer_position(&self) -> u64 {
        self.reader.buffer_position()
    }
}

impl<R: BufRead> EventSource for XmlReader<R> {
    fn next_event(&mut self) -> Result<Option<XmlEvent>> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Some(XmlEvent::End { name }));
        }

        loop {
            self.buf.clear();
            let read = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => convert(event),
                Err(err) => Err(Error::from(err)),
            };

            match read.map_err(|err| err.at(self.reader.buffer_position()))? {
                Read::Event(event) => return Ok(Some(event)),
                Read::Empty(name, attributes) => {
                    trace!(element = %name, "expanding empty element");
                    self.pending_end = Some(name.clone());
                    return Ok(Some(XmlEvent::Start { name, attributes }));
                }
                Read::Ignored => continue,
                Read::Eof => return Ok(None),
            }
        }
    }

    fn position(&self) -> Option<u64> {
        Some(self.reader.buffer_position())
    }
}

fn convert(event: Event<'_>) -> Result<Read> {
    match event {
        Event::Start(start) => {
            let (name, attributes) = start_parts(&start)?;
            Ok(Read::Event(XmlEvent::Start { name, attributes }))
        }
        Event::Empty(start) => {
            let (name, attributes) = start_parts(&start)?;
            Ok(Read::Empty(name, attributes))
        }
        Event::End(end) => Ok(Read::Event(XmlEvent::End {
            name: decode(end.name().as_ref())?,
        })),
        Event::Text(text) => Ok(Read::Event(XmlEvent::Text {
            content: text.unescape()?.into_owned(),
            cdata: false,
        })),
        Event::CData(cdata) => Ok(Read::Event(XmlEvent::Text {
            content: decode(&cdata.into_inner())?,
            cdata: true,
        })),
        Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {
            Ok(Read::Ignored)
        }
        Event::Eof => Ok(Read::Eof),
    }
}

fn start_parts(start: &BytesStart<'_>) -> Result<(String, Vec<Attribute>)> {
    let name = decode(start.name().as_ref())?;
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        attributes.push(Attribute {
            name: decode(attr.key.as_ref())?,
            value: attr.unescape_value()?.into_owned(),
        });
    }
    Ok((name, attributes))
}

fn decode(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| Error::with_message(ErrorKind::Syntax, format!("invalid utf-8: {e}")))
}
