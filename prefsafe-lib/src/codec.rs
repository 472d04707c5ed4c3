//! Value text codec.
//!
//! Every value is reduced to a single UTF-8 string before encryption. The
//! heuristic encoding leaves numbers untagged and wraps booleans and string
//! sets in envelopes:
//!
//! ```text
//! 42               int / long / float (float always carries ".0" or an exponent)
//! boolean(true)    bool
//! string_set[a,b]  string set, comma-joined, no escaping
//! anything else    text
//! ```
//!
//! On read, the type is recovered by trying int32, int64, float32, the
//! string-set envelope, the boolean envelope and finally text, in that order.
//! A text value that happens to look like a number or an envelope is read
//! back as that type; this is inherited behavior and is kept as-is.
//!
//! The tagged encoding prefixes every value with a record-separator marker,
//! a one-letter type tag and the body length, e.g. `\u{1e}s5:hello`. String
//! set elements are length-prefixed too, so commas survive.

use std::collections::BTreeSet;

use crate::config::ValueEncoding;
use crate::value::Value;
use crate::{PrefsafeError, Result};

const STRING_SET_PREFIX: &str = "string_set[";
const STRING_SET_SUFFIX: &str = "]";
const STRING_SET_DELIM: char = ',';
const BOOLEAN_PREFIX: &str = "boolean(";
const PRIMITIVE_SUFFIX: &str = ")";

const TAG_MARKER: char = '\u{1e}';

/// Wrap a boolean in its envelope.
pub fn encode_bool(value: bool) -> String {
    format!("{}{}{}", BOOLEAN_PREFIX, value, PRIMITIVE_SUFFIX)
}

/// Returns true if `text` carries the boolean envelope.
pub fn is_bool(text: &str) -> bool {
    text.starts_with(BOOLEAN_PREFIX) && text.ends_with(PRIMITIVE_SUFFIX)
}

/// Unwrap a boolean envelope. The payload is compared case-insensitively
/// with `true`; anything else reads as `false`.
pub fn decode_bool(text: &str) -> Option<bool> {
    if !is_bool(text) {
        return None;
    }
    let inner = &text[BOOLEAN_PREFIX.len()..text.len() - PRIMITIVE_SUFFIX.len()];
    Some(inner.eq_ignore_ascii_case("true"))
}

/// Wrap a string set in its envelope.
pub fn encode_string_set(values: &BTreeSet<String>) -> String {
    let joined: Vec<&str> = values.iter().map(String::as_str).collect();
    format!(
        "{}{}{}",
        STRING_SET_PREFIX,
        joined.join(&STRING_SET_DELIM.to_string()),
        STRING_SET_SUFFIX
    )
}

/// Returns true if `text` carries the string-set envelope.
pub fn is_string_set(text: &str) -> bool {
    text.len() >= STRING_SET_PREFIX.len() + STRING_SET_SUFFIX.len()
        && text.starts_with(STRING_SET_PREFIX)
        && text.ends_with(STRING_SET_SUFFIX)
}

/// Unwrap a string-set envelope.
///
/// An empty envelope reads as the empty set, so a set holding only the
/// empty string does not survive a round trip.
pub fn decode_string_set(text: &str) -> Option<BTreeSet<String>> {
    if !is_string_set(text) {
        return None;
    }
    let inner = &text[STRING_SET_PREFIX.len()..text.len() - STRING_SET_SUFFIX.len()];
    if inner.is_empty() {
        return Some(BTreeSet::new());
    }
    Some(inner.split(STRING_SET_DELIM).map(str::to_string).collect())
}

/// Render a float so it never re-reads as an integer.
///
/// Non-finite values use the `NaN` / `Infinity` spellings, the only words
/// [`decode_float`] accepts.
pub fn encode_float(value: f32) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f32::INFINITY {
        "Infinity".to_string()
    } else if value == f32::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{:?}", value)
    }
}

/// Parse decimal float text.
///
/// Only digits, sign, point and exponent characters are accepted, plus the
/// exact words `NaN` and `Infinity`. Words such as `inf` or `nan` stay text.
pub fn decode_float(text: &str) -> Option<f32> {
    match text {
        "NaN" | "+NaN" | "-NaN" => return Some(f32::NAN),
        "Infinity" | "+Infinity" => return Some(f32::INFINITY),
        "-Infinity" => return Some(f32::NEG_INFINITY),
        _ => {}
    }
    let numeric = text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !numeric {
        return None;
    }
    text.parse::<f32>().ok()
}

/// Heuristic text for any value.
pub fn encode_heuristic(value: &Value) -> String {
    match value {
        Value::Text(text) => text.clone(),
        Value::Int(v) => v.to_string(),
        Value::Long(v) => v.to_string(),
        Value::Float(v) => encode_float(*v),
        Value::Bool(v) => encode_bool(*v),
        Value::StringSet(set) => encode_string_set(set),
    }
}

/// Recover a value using the fixed parse order.
pub fn decode_heuristic(text: &str) -> Value {
    if let Ok(v) = text.parse::<i32>() {
        return Value::Int(v);
    }
    if let Ok(v) = text.parse::<i64>() {
        return Value::Long(v);
    }
    if let Some(v) = decode_float(text) {
        return Value::Float(v);
    }
    if let Some(set) = decode_string_set(text) {
        return Value::StringSet(set);
    }
    if let Some(v) = decode_bool(text) {
        return Value::Bool(v);
    }
    Value::Text(text.to_string())
}

fn push_field(out: &mut String, body: &str) {
    out.push_str(&body.len().to_string());
    out.push(':');
    out.push_str(body);
}

/// Tagged text for any value.
pub fn encode_tagged(value: &Value) -> String {
    let (tag, body) = match value {
        Value::Text(text) => ('s', text.clone()),
        Value::Int(v) => ('i', v.to_string()),
        Value::Long(v) => ('l', v.to_string()),
        Value::Float(v) => ('f', encode_float(*v)),
        Value::Bool(v) => ('b', v.to_string()),
        Value::StringSet(set) => {
            let mut body = String::new();
            for item in set {
                push_field(&mut body, item);
            }
            ('S', body)
        }
    };
    let mut out = String::with_capacity(body.len() + 8);
    out.push(TAG_MARKER);
    out.push(tag);
    push_field(&mut out, &body);
    out
}

/// Returns true if `text` was written by the tagged encoding.
pub fn is_tagged(text: &str) -> bool {
    text.starts_with(TAG_MARKER)
}

/// Split `len:body...` into the body of that length and the rest.
fn take_field<'a>(input: &'a str, value_type: &'static str) -> Result<(&'a str, &'a str)> {
    let colon = input
        .find(':')
        .ok_or_else(|| PrefsafeError::parse_failure(value_type))?;
    let len: usize = input[..colon]
        .parse()
        .map_err(|_| PrefsafeError::parse_failure(value_type))?;
    let rest = &input[colon + 1..];
    if rest.len() < len || !rest.is_char_boundary(len) {
        return Err(PrefsafeError::parse_failure(value_type));
    }
    Ok(rest.split_at(len))
}

/// Recover a value written by [`encode_tagged`].
pub fn decode_tagged(text: &str) -> Result<Value> {
    let mut chars = text.chars();
    if chars.next() != Some(TAG_MARKER) {
        return Err(PrefsafeError::parse_failure("tagged value"));
    }
    let tag = chars
        .next()
        .ok_or_else(|| PrefsafeError::parse_failure("tagged value"))?;
    let (body, rest) = take_field(chars.as_str(), "tagged value")?;
    if !rest.is_empty() {
        return Err(PrefsafeError::parse_failure("tagged value"));
    }

    let value = match tag {
        's' => Value::Text(body.to_string()),
        'i' => Value::Int(
            body.parse()
                .map_err(|_| PrefsafeError::parse_failure("int"))?,
        ),
        'l' => Value::Long(
            body.parse()
                .map_err(|_| PrefsafeError::parse_failure("long"))?,
        ),
        'f' => Value::Float(
            decode_float(body).ok_or_else(|| PrefsafeError::parse_failure("float"))?,
        ),
        'b' => match body {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => return Err(PrefsafeError::parse_failure("bool")),
        },
        'S' => {
            let mut set = BTreeSet::new();
            let mut remaining = body;
            while !remaining.is_empty() {
                let (item, rest) = take_field(remaining, "string_set")?;
                set.insert(item.to_string());
                remaining = rest;
            }
            Value::StringSet(set)
        }
        _ => return Err(PrefsafeError::parse_failure("tagged value")),
    };
    Ok(value)
}

/// Encoder/decoder bound to one [`ValueEncoding`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueCodec {
    encoding: ValueEncoding,
}

impl ValueCodec {
    /// Create a codec for the given encoding.
    pub fn new(encoding: ValueEncoding) -> Self {
        Self { encoding }
    }

    /// The encoding new values are written with.
    pub fn encoding(&self) -> ValueEncoding {
        self.encoding
    }

    /// Canonical text for a value.
    pub fn encode(&self, value: &Value) -> String {
        match self.encoding {
            ValueEncoding::Heuristic => encode_heuristic(value),
            ValueEncoding::Tagged => encode_tagged(value),
        }
    }

    /// Recover a typed value from stored text.
    ///
    /// Untagged text always goes through the heuristic, whatever the
    /// configured encoding, so stores written before switching to the tagged
    /// encoding stay readable.
    pub fn decode(&self, text: &str) -> Result<Value> {
        match self.encoding {
            ValueEncoding::Tagged if is_tagged(text) => decode_tagged(text),
            _ => Ok(decode_heuristic(text)),
        }
    }

    /// The text a string getter returns for stored text.
    ///
    /// Under the heuristic this is the stored text itself, envelopes
    /// included. Tagged values yield their heuristic rendering.
    pub fn text_view(&self, text: &str) -> Result<String> {
        match self.encoding {
            ValueEncoding::Tagged if is_tagged(text) => {
                Ok(encode_heuristic(&decode_tagged(text)?))
            }
            _ => Ok(text.to_string()),
        }
    }
}
