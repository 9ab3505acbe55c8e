//! Ordered UUID list stored as a single array-literal column value.
//!
//! The stored form is `{"<uuid>","<uuid>",...}`. Decoding also accepts bare
//! elements, whitespace around elements and blank elements (stray commas);
//! encoding always writes the quoted, whitespace-free form, so a decoded
//! value re-encodes to the canonical literal.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ArrayCodecError;

/// Length of the canonical hyphenated UUID text form.
const HYPHENATED_LEN: usize = 36;

/// A raw column value handed over by the storage layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
    Integer(i64),
    Real(f64),
    Null,
}

impl RawValue<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Null => "null",
        }
    }
}

impl<'a> From<&'a str> for RawValue<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(s)
    }
}

impl<'a> From<&'a [u8]> for RawValue<'a> {
    fn from(b: &'a [u8]) -> Self {
        Self::Bytes(b)
    }
}

impl<'a> From<ValueRef<'a>> for RawValue<'a> {
    fn from(value: ValueRef<'a>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(f) => Self::Real(f),
            // SQLite does not guarantee TEXT is valid UTF-8; treat it as bytes.
            ValueRef::Text(b) | ValueRef::Blob(b) => Self::Bytes(b),
        }
    }
}

/// Ordered list of UUIDs. Order is significant and duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UuidArray(Vec<Uuid>);

impl UuidArray {
    /// Column type declared for this value in schema definitions.
    pub const SQL_TYPE: &'static str = "uuid[]";

    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, id: Uuid) {
        self.0.push(id);
    }

    pub fn into_inner(self) -> Vec<Uuid> {
        self.0
    }

    /// Decode a stored array literal.
    ///
    /// Only text and byte values are accepted; `Null` is an error, not an
    /// empty list. Fails on the first invalid element without returning
    /// a partial list.
    pub fn decode(raw: RawValue<'_>) -> Result<Self, ArrayCodecError> {
        let text = match raw {
            RawValue::Text(s) => s,
            RawValue::Bytes(b) => {
                std::str::from_utf8(b).map_err(|_| ArrayCodecError::MalformedLiteral {
                    reason: "value is not valid UTF-8",
                })?
            }
            other => {
                return Err(ArrayCodecError::UnsupportedSourceType {
                    found: other.kind(),
                });
            }
        };
        parse_literal(text)
    }

    /// Encode as the canonical literal: quoted elements, no whitespace.
    pub fn encode(&self) -> String {
        if self.0.is_empty() {
            return "{}".to_string();
        }
        let mut out = String::with_capacity(2 + self.0.len() * (HYPHENATED_LEN + 3));
        out.push('{');
        let mut buf = Uuid::encode_buffer();
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push('"');
            out.push_str(id.hyphenated().encode_lower(&mut buf));
            out.push('"');
        }
        out.push('}');
        out
    }
}

fn parse_literal(text: &str) -> Result<UuidArray, ArrayCodecError> {
    let interior = text
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or(ArrayCodecError::MalformedLiteral {
            reason: "expected value enclosed in '{' and '}'",
        })?;

    let mut ids = Vec::new();
    for part in interior.split(',') {
        let element = unquote(part.trim());
        if element.is_empty() {
            continue;
        }
        ids.push(parse_element(element)?);
    }
    Ok(UuidArray(ids))
}

/// Strip one pair of surrounding double quotes, if both are present.
fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

fn parse_element(element: &str) -> Result<Uuid, ArrayCodecError> {
    let invalid = |reason: String| ArrayCodecError::InvalidElement {
        element: element.to_string(),
        reason,
    };
    // `Uuid::parse_str` also takes the simple, braced and urn forms.
    if element.len() != HYPHENATED_LEN {
        return Err(invalid(format!(
            "expected {HYPHENATED_LEN} characters, found {}",
            element.len()
        )));
    }
    Uuid::parse_str(element).map_err(|e| invalid(e.to_string()))
}

impl Deref for UuidArray {
    type Target = [Uuid];

    fn deref(&self) -> &[Uuid] {
        &self.0
    }
}

impl From<Vec<Uuid>> for UuidArray {
    fn from(ids: Vec<Uuid>) -> Self {
        Self(ids)
    }
}

impl FromIterator<Uuid> for UuidArray {
    fn from_iter<I: IntoIterator<Item = Uuid>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for UuidArray {
    type Item = Uuid;
    type IntoIter = std::vec::IntoIter<Uuid>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a UuidArray {
    type Item = &'a Uuid;
    type IntoIter = std::slice::Iter<'a, Uuid>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for UuidArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for UuidArray {
    type Err = ArrayCodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(RawValue::Text(s))
    }
}

// ── Storage adapter ───────────────────────────────────────────────────

impl FromSql for UuidArray {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Self::decode(value.into()).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for UuidArray {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.encode()))
    }
}
