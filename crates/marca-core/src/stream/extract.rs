//! Line classification and text-delta extraction.
//!
//! Backends are not required to commit to one framing, so every logical line
//! is classified on its own, in priority order:
//!
//! 1. blank (whitespace only) -- skipped
//! 2. `data: ` prefix -- Server-Sent Events payload
//! 3. starts with `{` or `[` -- one JSON value per line
//! 4. anything else -- plain text, taken verbatim
//!
//! A line that fails every rule is skipped, never surfaced as an error.
//!
//! Known limitation: a JSON value split across two `data:` lines is not
//! reassembled. Each half fails to parse and is appended as raw text.

use serde_json::Value;

/// SSE data-line marker, including the separating space.
pub const SSE_DATA_PREFIX: &str = "data: ";

/// SSE payload that ends the stream.
pub const SSE_DONE_SENTINEL: &str = "[DONE]";

/// Fields checked, in order, for the text of a structured frame.
///
/// The first populated field decides: a string is the delta, any other value
/// means the frame carries no text. Null, `false`, zero and `""` count as
/// unpopulated.
pub const DELTA_FIELDS: [&str; 4] = ["content", "text", "message", "data"];

/// The framing shape of one logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape<'a> {
    Blank,
    /// SSE data line; holds the trimmed payload after the marker.
    Sse(&'a str),
    /// Bare JSON value line.
    Structured(&'a str),
    Plain(&'a str),
}

/// Why a line produced no delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    /// A structured line that did not parse, or had no text field.
    MalformedFrame,
}

/// Result of extracting one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Delta(String),
    /// End-of-stream sentinel; nothing after it should be read.
    Done,
    Skip(SkipReason),
}

/// Classify a line by shape. First match wins.
pub fn classify(line: &str) -> LineShape<'_> {
    if line.trim().is_empty() {
        LineShape::Blank
    } else if let Some(payload) = line.strip_prefix(SSE_DATA_PREFIX) {
        LineShape::Sse(payload.trim())
    } else if line.starts_with('{') || line.starts_with('[') {
        LineShape::Structured(line)
    } else {
        LineShape::Plain(line)
    }
}

/// Extract the text delta carried by one logical line.
pub fn extract(line: &str) -> Extraction {
    match classify(line) {
        LineShape::Blank => Extraction::Skip(SkipReason::Blank),
        LineShape::Sse(payload) => {
            if payload == SSE_DONE_SENTINEL {
                return Extraction::Done;
            }
            let Ok(value) = serde_json::from_str::<Value>(payload) else {
                return Extraction::Delta(payload.to_string());
            };
            match delta_field(&value) {
                FieldText::Text(text) => Extraction::Delta(text.to_string()),
                FieldText::NotText => Extraction::Skip(SkipReason::MalformedFrame),
                FieldText::Absent => Extraction::Delta(payload.to_string()),
            }
        }
        LineShape::Structured(line) => match serde_json::from_str::<Value>(line) {
            Ok(value) => match delta_field(&value) {
                FieldText::Text(text) => Extraction::Delta(text.to_string()),
                FieldText::NotText | FieldText::Absent => {
                    Extraction::Skip(SkipReason::MalformedFrame)
                }
            },
            Err(_) => Extraction::Skip(SkipReason::MalformedFrame),
        },
        LineShape::Plain(line) => Extraction::Delta(line.to_string()),
    }
}

enum FieldText<'a> {
    Text(&'a str),
    NotText,
    Absent,
}

/// The first populated field among [`DELTA_FIELDS`].
fn delta_field(value: &Value) -> FieldText<'_> {
    match DELTA_FIELDS
        .iter()
        .filter_map(|field| value.get(*field))
        .find(|v| is_populated(v))
    {
        Some(Value::String(text)) => FieldText::Text(text),
        Some(_) => FieldText::NotText,
        None => FieldText::Absent,
    }
}

fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
