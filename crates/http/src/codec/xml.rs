//! XML payload decoding.
//!
//! The document is folded into a json-like tree so handlers can treat it the same way
//! as json or form bodies:
//!
//! - the root element becomes the single key of the resulting map
//! - an element with text only becomes a string
//! - an element with children (or attributes) becomes a map, attributes are stored
//!   under `@name` and mixed text under `#text`
//! - repeated sibling elements become an array
//! - an empty element without attributes becomes an empty string

use bytes::Bytes;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

use crate::codec::{ContentDecoder, content_type_contains};
use crate::protocol::{Body, DecodeError};

const TEXT_KEY: &str = "#text";

/// Decodes `application/xml` and `text/xml` payloads into a [`Body::Map`].
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlDecoder;

impl ContentDecoder for XmlDecoder {
    fn can_decode(&self, content_type: &str) -> bool {
        content_type_contains(content_type, "application/xml") || content_type_contains(content_type, "text/xml")
    }

    fn decode(&self, bytes: Bytes, _content_type: &str) -> Result<Body, DecodeError> {
        let (name, value) = parse_document(&bytes)?;

        let mut map = Map::new();
        map.insert(name, value);
        Ok(Body::Map(map))
    }
}

/// An element whose end tag has not been seen yet.
struct OpenElement {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl OpenElement {
    fn new(start: &BytesStart<'_>) -> Result<Self, DecodeError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut children = Map::new();

        for attribute in start.attributes() {
            let attribute = attribute.map_err(DecodeError::invalid_xml)?;
            let key = format!("@{}", String::from_utf8_lossy(attribute.key.as_ref()));
            let value = attribute.unescape_value().map_err(DecodeError::invalid_xml)?;
            children.insert(key, Value::String(value.into_owned()));
        }

        Ok(Self { name, children, text: String::new() })
    }

    fn into_value(self) -> (String, Value) {
        let value = if self.children.is_empty() {
            Value::String(self.text)
        } else {
            let mut children = self.children;
            if !self.text.is_empty() {
                children.insert(TEXT_KEY.to_string(), Value::String(self.text));
            }
            Value::Object(children)
        };
        (self.name, value)
    }

    fn add_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            None => {
                self.children.insert(name, value);
            }
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
}

fn parse_document(bytes: &[u8]) -> Result<(String, Value), DecodeError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader.read_event().map_err(DecodeError::invalid_xml)?;
        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(DecodeError::invalid_xml("multiple root elements"));
                }
                stack.push(OpenElement::new(&start)?);
            }
            Event::Empty(start) => {
                if root.is_some() {
                    return Err(DecodeError::invalid_xml("multiple root elements"));
                }
                let (name, value) = OpenElement::new(&start)?.into_value();
                close_element(&mut stack, &mut root, name, value);
            }
            Event::End(_) => {
                // end tag names are verified by the reader
                let element = stack.pop().ok_or_else(|| DecodeError::invalid_xml("unexpected end tag"))?;
                let (name, value) = element.into_value();
                close_element(&mut stack, &mut root, name, value);
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(DecodeError::invalid_xml)?;
                append_text(&mut stack, &text)?;
            }
            Event::CData(cdata) => {
                let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                append_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DecodeError::invalid_xml(format!("unclosed element <{}>", open.name)));
    }

    root.ok_or_else(|| DecodeError::invalid_xml("document has no root element"))
}

fn close_element(stack: &mut [OpenElement], root: &mut Option<(String, Value)>, name: String, value: Value) {
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, value),
        None => *root = Some((name, value)),
    }
}

fn append_text(stack: &mut [OpenElement], text: &str) -> Result<(), DecodeError> {
    match stack.last_mut() {
        Some(open) => {
            open.text.push_str(text);
            Ok(())
        }
        None => Err(DecodeError::invalid_xml("text outside of the root element")),
    }
}

#[cfg(test)]
mod tests {
    use super::XmlDecoder;
    use crate::codec::ContentDecoder;
    use crate::protocol::DecodeError;
    use bytes::Bytes;
    use indoc::indoc;
    use serde_json::json;

    fn decode(xml: &'static str) -> Result<serde_json::Value, DecodeError> {
        XmlDecoder
            .decode(Bytes::from_static(xml.as_bytes()), "application/xml")
            .map(|body| serde_json::Value::Object(body.as_map().cloned().unwrap()))
    }

    #[test]
    fn accepts_xml_content_types() {
        assert!(XmlDecoder.can_decode("application/xml"));
        assert!(XmlDecoder.can_decode("text/xml; charset=utf-8"));
        assert!(!XmlDecoder.can_decode("application/json"));
    }

    #[test]
    fn decode_nested_document() {
        let xml = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <user id="7">
            <name>juan</name>
            <tag>a</tag>
            <tag>b</tag>
            <address><city>Lima</city></address>
            <empty/>
        </user>
        "#};

        assert_eq!(
            decode(xml).unwrap(),
            json!({
                "user": {
                    "@id": "7",
                    "name": "juan",
                    "tag": ["a", "b"],
                    "address": {"city": "Lima"},
                    "empty": ""
                }
            })
        );
    }

    #[test]
    fn decode_escaped_text_and_cdata() {
        assert_eq!(decode("<note>a &amp; b</note>").unwrap(), json!({"note": "a & b"}));
        assert_eq!(decode("<note><![CDATA[<raw>]]></note>").unwrap(), json!({"note": "<raw>"}));
    }

    #[test]
    fn mismatched_tags_fail() {
        assert!(matches!(decode("<a><b></a></b>"), Err(DecodeError::InvalidXml { .. })));
    }

    #[test]
    fn unclosed_tags_fail() {
        assert!(matches!(decode("<a><b></b>"), Err(DecodeError::InvalidXml { .. })));
    }

    #[test]
    fn missing_root_fails() {
        assert!(matches!(decode("just text"), Err(DecodeError::InvalidXml { .. })));
        assert!(matches!(decode("<?xml version=\"1.0\"?>"), Err(DecodeError::InvalidXml { .. })));
    }

    #[test]
    fn multiple_roots_fail() {
        assert!(matches!(decode("<a>1</a><b>2</b>"), Err(DecodeError::InvalidXml { .. })));
        assert!(matches!(decode("<a>1</a><b/>"), Err(DecodeError::InvalidXml { .. })));
    }
}
