//! XML structure codec for the callback dialect.
//!
//! Encoding walks an ordered [`Value`] tree recursively and writes it under a `<xml>` root:
//! numeric-looking keys and sequence entries become `<item>` (or a configured tag), numbers
//! are plain text and every other scalar is CDATA-wrapped. Decoding is flat: only the
//! direct children of the root are read, each child's text becoming the mapped value.

use crate::error::{CallbackError, Result};
use indexmap::IndexMap;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;

/// Root element of every callback document.
pub const ROOT_TAG: &str = "xml";

/// Element name used for sequence entries and numeric keys unless overridden.
pub const DEFAULT_ITEM_TAG: &str = "item";

/// Nested, insertion-ordered structure fed to [`encode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Ordered key/value pairs; keys are element names.
    Map(Vec<(String, Value)>),
    /// Ordered entries; each is written under the item tag.
    Seq(Vec<Value>),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Empty mapping, for chaining with [`Value::with`].
    pub fn map() -> Self {
        Value::Map(Vec::new())
    }

    /// Append `key` to a mapping. Calling this on a non-map value is a bug; release
    /// builds leave the value unchanged.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        debug_assert!(matches!(self, Value::Map(_)), "Value::with called on a non-map value");
        if let Value::Map(ref mut entries) = self {
            entries.push((key.into(), value.into()));
        }
        self
    }

    /// Look up a key in a mapping (first match).
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Scalar rendered as text; `None` for maps and sequences.
    pub fn as_scalar_string(&self) -> Option<String> {
        match self {
            Value::Int(n) => Some(n.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Map(_) | Value::Seq(_) => None,
        }
    }

    fn is_numeric(&self) -> bool {
        match self {
            Value::Int(_) => true,
            Value::Float(f) => f.is_finite(),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

/// JSON objects keep their key order (serde_json `preserve_order`). Booleans follow the
/// platform's loose typing: `true` is `"1"`, `false` is `""`; `null` is `""`.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Text(String::new()),
            serde_json::Value::Bool(b) => Value::Text(if b { "1".to_string() } else { String::new() }),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => Value::Seq(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// True for keys that are implicit sequence indices ("0", "12", "-1", "1.5").
fn is_numeric_key(key: &str) -> bool {
    let starts_numeric = key
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
        .unwrap_or(false);
    starts_numeric && key.parse::<f64>().map(|f| f.is_finite()).unwrap_or(false)
}

/// Element names must be non-empty, must not start with a digit, `-` or `.`, and must not
/// contain whitespace, control characters or markup delimiters.
fn check_element_name(name: &str) -> Result<()> {
    let valid = match name.chars().next() {
        None => false,
        Some(first) if first.is_ascii_digit() || first == '-' || first == '.' => false,
        Some(_) => !name.chars().any(|c| {
            c.is_whitespace()
                || c.is_control()
                || matches!(c, '<' | '>' | '&' | '/' | '"' | '\'' | '=' | '!' | '?')
        }),
    };
    if valid {
        Ok(())
    } else {
        Err(CallbackError::Encode(format!("invalid element name {:?}", name)))
    }
}

fn encode_error(e: impl std::fmt::Display) -> CallbackError {
    CallbackError::Encode(e.to_string())
}

/// Encode `value` under `<xml>` with the default `item` tag for numeric keys.
pub fn encode(value: &Value) -> Result<String> {
    encode_with_item_tag(value, DEFAULT_ITEM_TAG)
}

/// Encode `value` under `<xml>`, naming sequence entries and numeric keys `item_tag`.
pub fn encode_with_item_tag(value: &Value, item_tag: &str) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, ROOT_TAG, value, item_tag)?;
    String::from_utf8(writer.into_inner()).map_err(encode_error)
}

fn write_element<W: Write>(writer: &mut Writer<W>, tag: &str, value: &Value, item_tag: &str) -> Result<()> {
    check_element_name(tag)?;
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(encode_error)?;
    match value {
        Value::Map(entries) => {
            for (key, child) in entries {
                let child_tag = if is_numeric_key(key) { item_tag } else { key.as_str() };
                write_element(writer, child_tag, child, item_tag)?;
            }
        }
        Value::Seq(items) => {
            for child in items {
                write_element(writer, item_tag, child, item_tag)?;
            }
        }
        scalar => {
            let text = scalar.as_scalar_string().unwrap_or_default();
            if scalar.is_numeric() {
                writer
                    .write_event(Event::Text(BytesText::new(&text)))
                    .map_err(encode_error)?;
            } else {
                write_cdata(writer, &text)?;
            }
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(encode_error)?;
    Ok(())
}

/// Write `text` as CDATA, splitting around any `]]>` so the section stays well-formed.
fn write_cdata<W: Write>(writer: &mut Writer<W>, text: &str) -> Result<()> {
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        writer
            .write_event(Event::CData(BytesCData::new(&rest[..pos + 2])))
            .map_err(encode_error)?;
        rest = &rest[pos + 2..];
    }
    writer
        .write_event(Event::CData(BytesCData::new(rest)))
        .map_err(encode_error)?;
    Ok(())
}

fn parse_error(msg: impl std::fmt::Display, position: usize) -> CallbackError {
    CallbackError::Parse(format!("{} (at byte {})", msg, position))
}

fn tag_name(name: &[u8], position: usize) -> Result<String> {
    std::str::from_utf8(name)
        .map(str::to_string)
        .map_err(|e| parse_error(e, position))
}

/// Decode a callback document into its root's direct children, in document order.
///
/// A repeated tag keeps its first position and takes the last value. Self-closing or
/// empty children map to `""`. Grandchildren are ignored; only a child's own text and
/// CDATA contribute to its value.
pub fn decode(xml: &str) -> Result<IndexMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut fields = IndexMap::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut current: Option<(String, String)> = None;

    loop {
        let event = match reader.read_event() {
            Ok(ev) => ev,
            Err(e) => return Err(parse_error(e, reader.buffer_position())),
        };
        let pos = reader.buffer_position();
        match event {
            Event::Start(e) => {
                if depth == 0 {
                    if seen_root {
                        return Err(parse_error("multiple root elements", pos));
                    }
                    seen_root = true;
                } else if depth == 1 {
                    current = Some((tag_name(e.name().as_ref(), pos)?, String::new()));
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 0 {
                    if seen_root {
                        return Err(parse_error("multiple root elements", pos));
                    }
                    seen_root = true;
                } else if depth == 1 {
                    fields.insert(tag_name(e.name().as_ref(), pos)?, String::new());
                }
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| parse_error("unmatched closing tag", pos))?;
                if depth == 1 {
                    if let Some((key, value)) = current.take() {
                        fields.insert(key, value);
                    }
                }
            }
            Event::Text(t) => {
                if depth == 2 {
                    let text = t.unescape().map_err(|e| parse_error(e, pos))?;
                    if let Some((_, value)) = current.as_mut() {
                        value.push_str(&text);
                    }
                } else if depth == 0 && !t.iter().all(|b| b.is_ascii_whitespace()) {
                    return Err(parse_error("text outside root element", pos));
                }
            }
            Event::CData(c) => {
                if depth == 2 {
                    let bytes = c.into_inner();
                    let text = std::str::from_utf8(&bytes).map_err(|e| parse_error(e, pos))?;
                    if let Some((_, value)) = current.as_mut() {
                        value.push_str(text);
                    }
                } else if depth == 0 {
                    return Err(parse_error("cdata outside root element", pos));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(parse_error("unexpected end of document", reader.buffer_position()));
    }
    if !seen_root {
        return Err(parse_error("no root element", reader.buffer_position()));
    }
    Ok(fields)
}

/// Summarise template-message data: each `key -> { value: .. }` entry becomes `key=>value`,
/// joined by commas. Entries whose value is not a mapping are skipped.
pub fn template_summary(info: &Value) -> String {
    let Value::Map(entries) = info else {
        return String::new();
    };
    entries
        .iter()
        .filter(|(_, v)| matches!(v, Value::Map(_)))
        .map(|(k, v)| {
            let value = v
                .get("value")
                .and_then(Value::as_scalar_string)
                .unwrap_or_default();
            format!("{}=>{}", k, value)
        })
        .collect::<Vec<_>>()
        .join(",")
}
