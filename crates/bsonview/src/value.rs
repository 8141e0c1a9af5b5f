//! Zero-copy typed value views.
//!
//! [`Value`] is a non-owning `(type, bytes)` pair referring to a single
//! value region inside a document buffer. It reads nothing until a typed
//! accessor is invoked, and the accessors decode directly from the
//! borrowed bytes.
//!
//! # Access discipline
//!
//! A typed accessor invoked on a non-matching, non-empty value fails with
//! `Error::TypeMismatch`. The only tolerated coercion is Int32 read through
//! [`Value::as_i64`] (sign-extended). Values with an empty region (lookup
//! misses, Null, Undefined, MinKey, MaxKey) decode to the zero of the
//! requested type instead of failing, so absent optional fields behave as
//! defaults:
//!
//! ```
//! use bsonview::Document;
//!
//! let bytes = [0x05, 0x00, 0x00, 0x00, 0x00]; // {}
//! let doc = Document::new(&bytes).unwrap();
//! assert_eq!(doc.lookup("missing").unwrap().as_i64().unwrap(), 0);
//! ```

use std::fmt;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::tag::ElementType;
use crate::wire::{cstring_end, read_f64, read_i32, read_i64};

/// A 12-byte BSON ObjectId.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectId(pub [u8; 12]);

impl ObjectId {
    /// Parse from a 24-character hex string.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 24 || !s.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 12];
        for (i, chunk) in s.as_bytes().chunks_exact(2).enumerate() {
            let hi = (chunk[0] as char).to_digit(16)?;
            let lo = (chunk[1] as char).to_digit(16)?;
            bytes[i] = ((hi << 4) | lo) as u8;
        }
        Some(Self(bytes))
    }

    /// Render as a 24-character lowercase hex string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Raw id bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A binary value: subtype byte plus borrowed payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Binary<'a> {
    pub subtype: u8,
    pub payload: &'a [u8],
}

/// A regular expression value: pattern and options strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Regex<'a> {
    pub pattern: &'a str,
    pub options: &'a str,
}

/// A DBPointer value: namespace plus referenced ObjectId.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DbPointer<'a> {
    pub namespace: &'a str,
    pub id: ObjectId,
}

/// A datetime value: signed milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Datetime(pub i64);

impl Datetime {
    /// Milliseconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub fn millis(self) -> i64 {
        self.0
    }
}

/// An internal MongoDB timestamp, treated as an opaque int64.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub i64);

/// A non-owning view of one value region within a document buffer.
///
/// The backing buffer must outlive every view derived from it; the
/// lifetime parameter enforces this.
#[derive(Clone, Copy)]
pub struct Value<'a> {
    kind: ElementType,
    data: &'a [u8],
}

impl<'a> Value<'a> {
    #[inline]
    pub(crate) fn new(kind: ElementType, data: &'a [u8]) -> Self {
        Self { kind, data }
    }

    /// The sentinel "missing" value (tag `Empty`, no bytes).
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            kind: ElementType::Empty,
            data: &[],
        }
    }

    /// Element type of this value.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ElementType {
        self.kind
    }

    /// Raw bytes of the value region.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &'a [u8] {
        self.data
    }

    /// True for the "missing" sentinel returned by lookup misses.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind == ElementType::Empty
    }

    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.kind == ElementType::Null
    }

    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        self.kind == ElementType::Undefined
    }

    #[inline]
    #[must_use]
    pub fn is_min_key(&self) -> bool {
        self.kind == ElementType::MinKey
    }

    #[inline]
    #[must_use]
    pub fn is_max_key(&self) -> bool {
        self.kind == ElementType::MaxKey
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.kind.name(),
        }
    }

    fn overrun(&self) -> Error {
        Error::MalformedElement {
            tag: self.kind.raw(),
        }
    }

    /// Decode as a signed 32-bit integer.
    pub fn as_i32(&self) -> Result<i32> {
        if self.data.is_empty() {
            return Ok(0);
        }
        match self.kind {
            ElementType::Int32 => read_i32(self.data).ok_or_else(|| self.overrun()),
            _ => Err(self.mismatch("int32")),
        }
    }

    /// Decode as a signed 64-bit integer. Int32 values widen sign-extended.
    pub fn as_i64(&self) -> Result<i64> {
        if self.data.is_empty() {
            return Ok(0);
        }
        match self.kind {
            ElementType::Int64 => read_i64(self.data).ok_or_else(|| self.overrun()),
            ElementType::Int32 => Ok(i64::from(
                read_i32(self.data).ok_or_else(|| self.overrun())?,
            )),
            _ => Err(self.mismatch("int64")),
        }
    }

    /// Decode as an IEEE-754 double.
    pub fn as_f64(&self) -> Result<f64> {
        if self.data.is_empty() {
            return Ok(0.0);
        }
        match self.kind {
            ElementType::Double => read_f64(self.data).ok_or_else(|| self.overrun()),
            _ => Err(self.mismatch("double")),
        }
    }

    /// Decode as a string slice, excluding the trailing NUL.
    pub fn as_str(&self) -> Result<&'a str> {
        if self.data.is_empty() {
            return Ok("");
        }
        match self.kind {
            ElementType::String => {
                let bytes = self
                    .data
                    .get(4..self.data.len() - 1)
                    .ok_or_else(|| self.overrun())?;
                std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
            }
            _ => Err(self.mismatch("string")),
        }
    }

    /// Decode as a boolean.
    pub fn as_bool(&self) -> Result<bool> {
        if self.data.is_empty() {
            return Ok(false);
        }
        match self.kind {
            ElementType::Boolean => Ok(self.data[0] == 0x01),
            _ => Err(self.mismatch("boolean")),
        }
    }

    /// Decode as an ObjectId.
    pub fn as_objectid(&self) -> Result<ObjectId> {
        if self.data.is_empty() {
            return Ok(ObjectId::default());
        }
        match self.kind {
            ElementType::ObjectId => {
                let bytes: [u8; 12] = self.data.try_into().map_err(|_| self.overrun())?;
                Ok(ObjectId(bytes))
            }
            _ => Err(self.mismatch("objectid")),
        }
    }

    /// Decode as a datetime (signed milliseconds since epoch).
    pub fn as_datetime(&self) -> Result<Datetime> {
        if self.data.is_empty() {
            return Ok(Datetime::default());
        }
        match self.kind {
            ElementType::Datetime => Ok(Datetime(
                read_i64(self.data).ok_or_else(|| self.overrun())?,
            )),
            _ => Err(self.mismatch("datetime")),
        }
    }

    /// Decode as a binary value (subtype plus payload).
    pub fn as_binary(&self) -> Result<Binary<'a>> {
        if self.data.is_empty() {
            return Ok(Binary::default());
        }
        match self.kind {
            ElementType::Binary => Ok(Binary {
                subtype: *self.data.get(4).ok_or_else(|| self.overrun())?,
                payload: self.data.get(5..).ok_or_else(|| self.overrun())?,
            }),
            _ => Err(self.mismatch("binary")),
        }
    }

    /// Decode as a regular expression (pattern and options).
    pub fn as_regex(&self) -> Result<Regex<'a>> {
        if self.data.is_empty() {
            return Ok(Regex::default());
        }
        match self.kind {
            ElementType::Regex => {
                let pattern_end = cstring_end(self.data, 0).ok_or_else(|| self.overrun())?;
                let pattern = std::str::from_utf8(&self.data[..pattern_end])
                    .map_err(|_| Error::InvalidUtf8)?;
                let options = std::str::from_utf8(
                    self.data
                        .get(pattern_end + 1..self.data.len() - 1)
                        .ok_or_else(|| self.overrun())?,
                )
                .map_err(|_| Error::InvalidUtf8)?;
                Ok(Regex { pattern, options })
            }
            _ => Err(self.mismatch("regex")),
        }
    }

    /// Decode as a DBPointer.
    ///
    /// The namespace end derives from the declared string length, not from
    /// slicing backwards off the 12-byte id.
    pub fn as_db_pointer(&self) -> Result<DbPointer<'a>> {
        if self.data.is_empty() {
            return Ok(DbPointer::default());
        }
        match self.kind {
            ElementType::DbPointer => {
                let len = read_i32(self.data).ok_or_else(|| self.overrun())?;
                if len < 1 {
                    return Err(self.overrun());
                }
                let ns_end = 4 + len as usize - 1; // exclude the namespace NUL
                let namespace = std::str::from_utf8(
                    self.data.get(4..ns_end).ok_or_else(|| self.overrun())?,
                )
                .map_err(|_| Error::InvalidUtf8)?;
                let id: [u8; 12] = self
                    .data
                    .get(ns_end + 1..ns_end + 13)
                    .ok_or_else(|| self.overrun())?
                    .try_into()
                    .map_err(|_| self.overrun())?;
                Ok(DbPointer {
                    namespace,
                    id: ObjectId(id),
                })
            }
            _ => Err(self.mismatch("dbpointer")),
        }
    }

    /// Decode as an internal timestamp (opaque int64).
    pub fn as_timestamp(&self) -> Result<Timestamp> {
        if self.data.is_empty() {
            return Ok(Timestamp::default());
        }
        match self.kind {
            ElementType::Timestamp => Ok(Timestamp(
                read_i64(self.data).ok_or_else(|| self.overrun())?,
            )),
            _ => Err(self.mismatch("timestamp")),
        }
    }

    /// View as a nested document. Array values are document-shaped (keys
    /// are decimal indices) and are accepted here too.
    pub fn as_document(&self) -> Result<Document<'a>> {
        if self.data.is_empty() {
            return Ok(Document::empty());
        }
        match self.kind {
            ElementType::Document | ElementType::Array => Document::new(self.data),
            _ => Err(self.mismatch("document")),
        }
    }

    /// Array element at index `i`; equivalent to
    /// `as_document()?.lookup(&i.to_string())`.
    pub fn as_array_at(&self, i: usize) -> Result<Value<'a>> {
        self.as_document()?.lookup(&i.to_string())
    }

    /// Project into the dynamically-typed generic form.
    ///
    /// Decimal128, JS code, Symbol, and JS code with scope project as an
    /// opaque kind-plus-raw-bytes wrapper; they are not decoded further.
    ///
    /// # Errors
    ///
    /// Fails with `TypeMismatch` on the Empty sentinel (a missing value has
    /// no generic form) and propagates malformed nested documents.
    pub fn value(&self) -> Result<BsonValue<'a>> {
        Ok(match self.kind {
            ElementType::Empty => return Err(self.mismatch("value")),
            ElementType::Double => BsonValue::Double(self.as_f64()?),
            ElementType::String => BsonValue::Str(self.as_str()?),
            ElementType::Document => BsonValue::Document(Document::new(self.data)?.map()?),
            ElementType::Array => BsonValue::Array(Document::new(self.data)?.array()?),
            ElementType::Binary => BsonValue::Binary(self.as_binary()?),
            ElementType::Undefined => BsonValue::Undefined,
            ElementType::ObjectId => BsonValue::ObjectId(self.as_objectid()?),
            ElementType::Boolean => BsonValue::Boolean(self.as_bool()?),
            ElementType::Datetime => BsonValue::Datetime(self.as_datetime()?),
            ElementType::Null => BsonValue::Null,
            ElementType::Regex => BsonValue::Regex(self.as_regex()?),
            ElementType::DbPointer => BsonValue::DbPointer(self.as_db_pointer()?),
            ElementType::Int32 => {
                BsonValue::Int32(read_i32(self.data).ok_or_else(|| self.overrun())?)
            }
            ElementType::Timestamp => BsonValue::Timestamp(self.as_timestamp()?),
            ElementType::Int64 => {
                BsonValue::Int64(read_i64(self.data).ok_or_else(|| self.overrun())?)
            }
            ElementType::MinKey => BsonValue::MinKey,
            ElementType::MaxKey => BsonValue::MaxKey,
            ElementType::Decimal128
            | ElementType::JsCode
            | ElementType::Symbol
            | ElementType::JsCodeWithScope => BsonValue::Opaque {
                kind: self.kind,
                bytes: self.data,
            },
        })
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("kind", &self.kind)
            .field("len", &self.data.len())
            .finish()
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self
            .value()
            .and_then(|v| crate::json::value_to_string(&v))
        {
            Ok(s) => f.write_str(&s),
            Err(e) => write!(f, "<invalid value: {e}>"),
        }
    }
}

/// The dynamically-typed generic projection of a value.
///
/// Int32 and Int64 project signed. Nested documents project as
/// insertion-ordered key/value sequences.
#[derive(Debug, Clone, PartialEq)]
pub enum BsonValue<'a> {
    Double(f64),
    Str(&'a str),
    Document(Vec<(String, BsonValue<'a>)>),
    Array(Vec<BsonValue<'a>>),
    Binary(Binary<'a>),
    Undefined,
    ObjectId(ObjectId),
    Boolean(bool),
    Datetime(Datetime),
    Null,
    Regex(Regex<'a>),
    DbPointer(DbPointer<'a>),
    Int32(i32),
    Timestamp(Timestamp),
    Int64(i64),
    MinKey,
    MaxKey,
    /// Kinds the projection does not decode: Decimal128, JS code, Symbol,
    /// and JS code with scope, carried as raw value-region bytes.
    Opaque {
        kind: ElementType,
        bytes: &'a [u8],
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objectid_hex() {
        let id = ObjectId([0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0x00, 0x11, 0x22, 0x33]);
        assert_eq!(id.to_hex(), "0123456789abcdef00112233");
        assert_eq!(ObjectId::from_hex("0123456789abcdef00112233"), Some(id));
        assert_eq!(ObjectId::from_hex("0123"), None);
        assert_eq!(ObjectId::from_hex("zz23456789abcdef00112233"), None);
    }

    #[test]
    fn test_as_i64_widens_int32() {
        let v = Value::new(ElementType::Int32, &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(v.as_i64().unwrap(), -1);
        assert_eq!(v.as_i32().unwrap(), -1);
    }

    #[test]
    fn test_as_i32_rejects_int64() {
        let v = Value::new(ElementType::Int64, &[0x01, 0, 0, 0, 0, 0, 0, 0]);
        assert!(matches!(
            v.as_i32(),
            Err(Error::TypeMismatch {
                expected: "int32",
                found: "int64"
            })
        ));
    }

    #[test]
    fn test_empty_defaults() {
        let v = Value::empty();
        assert!(v.is_empty());
        assert_eq!(v.as_i32().unwrap(), 0);
        assert_eq!(v.as_i64().unwrap(), 0);
        assert_eq!(v.as_f64().unwrap(), 0.0);
        assert_eq!(v.as_str().unwrap(), "");
        assert!(!v.as_bool().unwrap());
        assert_eq!(v.as_objectid().unwrap(), ObjectId::default());
        assert_eq!(v.as_binary().unwrap().payload, b"");
        assert_eq!(v.as_datetime().unwrap(), Datetime(0));
        assert_eq!(v.as_timestamp().unwrap(), Timestamp(0));
        assert_eq!(v.as_regex().unwrap(), Regex::default());
        assert!(v.as_document().unwrap().lookup("x").unwrap().is_empty());
    }

    #[test]
    fn test_null_reads_as_defaults() {
        // Null has an empty value region, so accessors default like a miss.
        let v = Value::new(ElementType::Null, &[]);
        assert!(v.is_null());
        assert_eq!(v.as_i64().unwrap(), 0);
        assert_eq!(v.as_str().unwrap(), "");
    }

    #[test]
    fn test_as_str() {
        // "3.4\0", length 4
        let data = [0x04, 0x00, 0x00, 0x00, b'3', b'.', b'4', 0x00];
        let v = Value::new(ElementType::String, &data);
        assert_eq!(v.as_str().unwrap(), "3.4");
        assert!(matches!(
            v.as_i64(),
            Err(Error::TypeMismatch {
                expected: "int64",
                found: "string"
            })
        ));
    }

    #[test]
    fn test_as_str_invalid_utf8() {
        let data = [0x03, 0x00, 0x00, 0x00, 0xFF, 0xFE, 0x00];
        let v = Value::new(ElementType::String, &data);
        assert!(matches!(v.as_str(), Err(Error::InvalidUtf8)));
    }

    #[test]
    fn test_as_binary() {
        let data = [0x03, 0x00, 0x00, 0x00, 0x80, 0xAA, 0xBB, 0xCC];
        let v = Value::new(ElementType::Binary, &data);
        let bin = v.as_binary().unwrap();
        assert_eq!(bin.subtype, 0x80);
        assert_eq!(bin.payload, &[0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_as_regex() {
        let data = [b'a', b'+', 0x00, b'i', b's', 0x00];
        let v = Value::new(ElementType::Regex, &data);
        let re = v.as_regex().unwrap();
        assert_eq!(re.pattern, "a+");
        assert_eq!(re.options, "is");
    }

    #[test]
    fn test_as_db_pointer() {
        // namespace "test.rs\0" (L=8), then 12 id bytes
        let mut data = vec![0x08, 0x00, 0x00, 0x00];
        data.extend_from_slice(b"test.rs\x00");
        data.extend_from_slice(&[0x42; 12]);
        let v = Value::new(ElementType::DbPointer, &data);
        let ptr = v.as_db_pointer().unwrap();
        assert_eq!(ptr.namespace, "test.rs");
        assert_eq!(ptr.id, ObjectId([0x42; 12]));
    }

    #[test]
    fn test_value_projects_signed() {
        let i32_bytes = (-456i32).to_le_bytes();
        let v = Value::new(ElementType::Int32, &i32_bytes);
        assert_eq!(v.value().unwrap(), BsonValue::Int32(-456));
        let i64_bytes = (-123i64).to_le_bytes();
        let v = Value::new(ElementType::Int64, &i64_bytes);
        assert_eq!(v.value().unwrap(), BsonValue::Int64(-123));
    }

    #[test]
    fn test_value_opaque_kinds() {
        let data = [0u8; 16];
        let v = Value::new(ElementType::Decimal128, &data);
        match v.value().unwrap() {
            BsonValue::Opaque { kind, bytes } => {
                assert_eq!(kind, ElementType::Decimal128);
                assert_eq!(bytes.len(), 16);
            }
            other => panic!("expected Opaque, got {other:?}"),
        }
    }

    #[test]
    fn test_value_on_empty_fails() {
        assert!(matches!(
            Value::empty().value(),
            Err(Error::TypeMismatch { found: "empty", .. })
        ));
    }
}
