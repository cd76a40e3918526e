//! Generic object to XML renderer.
//!
//! Conventions: an object key becomes a child element, `$` holds the
//! element's attributes and `_` its text. Arrays repeat the element once per
//! item, scalars become text-only elements and `null` is dropped.

use serde_json::{Map, Value};

use crate::error::EmlError;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const ATTRIBUTES_KEY: &str = "$";
pub const TEXT_KEY: &str = "_";

const INDENT: &str = "  ";

/// Renders a single-root object as an indented XML document.
pub fn render(document: &Value) -> Result<String, EmlError> {
    let (name, body) = document
        .as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.iter().next())
        .ok_or_else(|| EmlError::Serialize("document must have exactly one root".to_string()))?;
    if !body.is_object() {
        return Err(EmlError::Serialize(format!(
            "root element {name} must be an object"
        )));
    }

    let mut out = String::with_capacity(4096);
    out.push_str(XML_DECLARATION);
    out.push('\n');
    write_element(&mut out, name, body, 0);
    Ok(out)
}

fn write_element(out: &mut String, name: &str, value: &Value, depth: usize) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                write_element(out, name, item, depth);
            }
        }
        Value::Object(map) => write_object(out, name, map, depth),
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                indent(out, depth);
                out.push('<');
                out.push_str(name);
                out.push('>');
                out.push_str(&escape_text(&text));
                out.push_str("</");
                out.push_str(name);
                out.push_str(">\n");
            }
        }
    }
}

fn write_object(out: &mut String, name: &str, map: &Map<String, Value>, depth: usize) {
    indent(out, depth);
    out.push('<');
    out.push_str(name);
    if let Some(Value::Object(attributes)) = map.get(ATTRIBUTES_KEY) {
        for (key, value) in attributes {
            if let Some(text) = scalar_text(value) {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape_attribute(&text));
                out.push('"');
            }
        }
    }

    let text = map.get(TEXT_KEY).and_then(scalar_text);
    let children = map
        .iter()
        .filter(|(key, value)| {
            key.as_str() != ATTRIBUTES_KEY && key.as_str() != TEXT_KEY && !is_empty(value)
        })
        .collect::<Vec<_>>();

    match (text, children.is_empty()) {
        (None, true) => out.push_str("/>\n"),
        (Some(text), true) => {
            out.push('>');
            out.push_str(&escape_text(&text));
            out.push_str("</");
            out.push_str(name);
            out.push_str(">\n");
        }
        (text, false) => {
            out.push_str(">\n");
            if let Some(text) = text {
                indent(out, depth + 1);
                out.push_str(&escape_text(&text));
                out.push('\n');
            }
            for (key, value) in children {
                write_element(out, key, value, depth + 1);
            }
            indent(out, depth);
            out.push_str("</");
            out.push_str(name);
            out.push_str(">\n");
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().all(is_empty),
        _ => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Whether `ch` matches the XML 1.0 `Char` production.
pub fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{9}' | '\u{A}' | '\u{D}'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Escapes markup characters; characters XML cannot carry are dropped.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars().filter(|ch| is_xml_char(*ch)) {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn escape_attribute(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars().filter(|ch| is_xml_char(*ch)) {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
