//! XML body to request parameters.
//!
//! The document `<user><name>ann</name></user>` becomes `{"user": {"name": "ann"}}`.
//! Repeated children collapse into arrays, attributes are merged into the element's
//! object, and a handful of `type` attributes (`integer`, `float`, `decimal`,
//! `boolean`, `array`) plus `nil="true"` cast leaf values.

use crate::error::ParseError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Number, Value};

/// Key holding element text when the element also carries attributes
pub const CONTENT_KEY: &str = "__content__";

/// Deepest element nesting accepted; matches the `serde_json` recursion limit
pub const MAX_DEPTH: usize = 128;

struct Frame {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<(String, Value)>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::Xml(format!("bad attribute on <{name}>: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::Xml(format!("bad attribute value on <{name}>: {e}")))?
                .into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn close(self) -> Result<(String, Value), ParseError> {
        if self.attr("nil") == Some("true") {
            return Ok((self.name, Value::Null));
        }

        let type_hint = self.attr("type").map(str::to_owned);
        if type_hint.as_deref() == Some("array") {
            let items = self.children.into_iter().map(|(_, v)| v).collect();
            return Ok((self.name, Value::Array(items)));
        }

        let text = self.text.trim().to_string();
        let plain_attrs: Vec<(String, String)> = self
            .attrs
            .into_iter()
            .filter(|(k, _)| k != "type")
            .collect();

        if self.children.is_empty() && plain_attrs.is_empty() {
            let value = cast_leaf(&self.name, type_hint.as_deref(), &text)?;
            return Ok((self.name, value));
        }

        let mut object = Map::new();
        for (key, value) in plain_attrs {
            object.insert(key, Value::String(value));
        }
        for (key, value) in self.children {
            merge_child(&mut object, key, value);
        }
        if !text.is_empty() {
            object.insert(CONTENT_KEY.to_string(), Value::String(text));
        }
        Ok((self.name, Value::Object(object)))
    }
}

fn merge_child(object: &mut Map<String, Value>, key: String, value: Value) {
    match object.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            object.insert(key, value);
        }
    }
}

fn cast_leaf(name: &str, type_hint: Option<&str>, text: &str) -> Result<Value, ParseError> {
    let invalid = |kind: &str| ParseError::Xml(format!("<{name}> is not a valid {kind}: {text:?}"));
    match type_hint {
        _ if text.is_empty() => Ok(Value::Null),
        Some("integer") => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid("integer")),
        Some("float") | Some("decimal") => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid("float")),
        Some("boolean") => match text {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid("boolean")),
        },
        _ => Ok(Value::String(text.to_string())),
    }
}

/// Decode an XML document into a parameters object keyed by its root element.
pub fn to_params(body: &[u8]) -> Result<Value, ParseError> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);
    // Tag pairing is checked against our own stack for a stable message.
    reader.config_mut().check_end_names = false;

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            ParseError::Xml(format!("{e} at position {}", reader.buffer_position()))
        })?;

        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(ParseError::Xml("multiple root elements".to_string()));
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(ParseError::Xml(format!(
                        "document nested deeper than {MAX_DEPTH} elements"
                    )));
                }
                stack.push(Frame::open(&start)?);
            }
            Event::Empty(start) => {
                if root.is_some() {
                    return Err(ParseError::Xml("multiple root elements".to_string()));
                }
                let closed = Frame::open(&start)?.close()?;
                attach(&mut stack, &mut root, closed);
            }
            Event::End(end) => {
                let found = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                let frame = stack.pop().ok_or_else(|| {
                    ParseError::Xml(format!("unexpected closing tag </{found}>"))
                })?;
                if frame.name != found {
                    return Err(ParseError::Xml(format!(
                        "mismatched closing tag: expected </{}>, found </{found}>",
                        frame.name
                    )));
                }
                let closed = frame.close()?;
                attach(&mut stack, &mut root, closed);
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| ParseError::Xml(e.to_string()))?;
                match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(ParseError::Xml(
                            "text outside of the root element".to_string(),
                        ));
                    }
                }
            }
            Event::CData(data) => match stack.last_mut() {
                Some(frame) => frame.text.push_str(&String::from_utf8_lossy(&data)),
                None => {
                    return Err(ParseError::Xml(
                        "CDATA outside of the root element".to_string(),
                    ));
                }
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Xml(format!("unclosed element <{}>", open.name)));
    }

    let (name, value) =
        root.ok_or_else(|| ParseError::Xml("document has no root element".to_string()))?;
    let mut params = Map::new();
    params.insert(name, value);
    Ok(Value::Object(params))
}

fn attach(stack: &mut [Frame], root: &mut Option<(String, Value)>, closed: (String, Value)) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(closed),
        None => *root = Some(closed),
    }
}
