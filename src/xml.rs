//! Streaming tokenizer for osm xml documents
//!
//! [read_document] reduces the raw xml to the handful of events a [Handler]
//! cares about, keeping quick-xml behind this seam.

use std::borrow::Cow;
use std::io::BufRead;

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::element::{Element, ElementKind};
use crate::output::SinkError;

/// Events raised by [read_document], in document order
pub trait Handler {
    /// A node, way or relation element was opened
    fn element_start(&mut self, element: Element);

    /// A `tag` child was read
    fn child_tag(&mut self, key: String, value: String);

    /// An `nd` child was read
    fn child_node_ref(&mut self, node_ref: &str);

    /// The element opened last was closed
    fn element_end(&mut self, kind: ElementKind) -> Result<(), SinkError>;

    /// The document ended cleanly
    fn document_end(&mut self) -> Result<(), SinkError>;
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed attribute: {0}")]
    Attr(#[from] AttrError),
    #[error("{element} is missing its {attribute} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("{attribute} is not a number: {value:?}")]
    InvalidNumber {
        attribute: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Feed a whole document through a [Handler]
///
/// Returns once the input is exhausted, after handing the handler its
/// [document_end](Handler::document_end) event. Any error aborts the pass
/// without that event, leaving the handler's sinks unfinalized.
pub fn read_document<R: BufRead, H: Handler>(input: R, handler: &mut H) -> Result<(), ReadError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref start) => {
                handle_start(handler, start)?;
            }
            Event::Empty(ref start) => {
                // A self closing element opens and closes in one event
                if let Some(kind) = handle_start(handler, start)? {
                    handler.element_end(kind)?;
                }
            }
            Event::End(ref end) => {
                if let Some(kind) = ElementKind::from_tag_name(end.local_name().as_ref()) {
                    handler.element_end(kind)?;
                }
            }
            Event::Eof => {
                handler.document_end()?;
                return Ok(());
            }
            _ => {}
        }
        buf.clear();
    }
}

fn handle_start<H: Handler>(
    handler: &mut H,
    start: &BytesStart,
) -> Result<Option<ElementKind>, ReadError> {
    match start.local_name().as_ref() {
        b"tag" => {
            let key = required_attr(start, "tag", "k")?.into_owned();
            let value = required_attr(start, "tag", "v")?.into_owned();
            handler.child_tag(key, value);
            Ok(None)
        }
        b"nd" => {
            let node_ref = required_attr(start, "nd", "ref")?;
            handler.child_node_ref(&node_ref);
            Ok(None)
        }
        name => {
            let Some(kind) = ElementKind::from_tag_name(name) else {
                return Ok(None);
            };
            let id = required_attr(start, kind.as_str(), "id")?.into_owned();
            let timestamp = required_attr(start, kind.as_str(), "timestamp")?.into_owned();
            let element = if kind == ElementKind::Node {
                let lon = numeric_attr(start, "node", "lon")?;
                let lat = numeric_attr(start, "node", "lat")?;
                Element::node(id, timestamp, lon, lat)
            } else {
                Element::new(kind, id, timestamp)
            };
            handler.element_start(element);
            Ok(Some(kind))
        }
    }
}

fn required_attr<'a>(
    start: &'a BytesStart,
    element: &'static str,
    name: &'static str,
) -> Result<Cow<'a, str>, ReadError> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(attr.unescape_value()?);
        }
    }
    Err(ReadError::MissingAttribute {
        element,
        attribute: name,
    })
}

fn numeric_attr(
    start: &BytesStart,
    element: &'static str,
    name: &'static str,
) -> Result<f64, ReadError> {
    let value = required_attr(start, element, name)?;
    value.parse().map_err(|source| ReadError::InvalidNumber {
        attribute: name,
        value: value.into_owned(),
        source,
    })
}
