//! Document encoding: the marshal side of the codec collaborator.
//!
//! The reader core never builds documents of its own except in one place,
//! the search-token builder, which marshals a synthetic one-field document
//! around the queried value. The same machinery doubles as the fixture
//! encoder for tests and for callers that need to hand-assemble documents.
//!
//! # The `Encode` Trait
//!
//! [`Encode`] maps Rust values onto BSON element kinds:
//!
//! | Rust type | BSON kind |
//! |-----------|-----------|
//! | `f64` | double |
//! | `&str`, `String` | string |
//! | `i32` | int32 |
//! | `i64` | int64 |
//! | `bool` | boolean |
//! | `ObjectId` | objectid |
//! | `Datetime` | datetime |
//! | `Timestamp` | timestamp |
//! | `Binary`, [`Bin`] | binary |
//! | `Regex` | regex |
//! | `DbPointer` | dbpointer |
//! | [`Null`], [`Undefined`], [`MinKey`], [`MaxKey`] | fixed kinds |
//! | [`Subdoc`] | embedded document |
//! | [`Arr`] | array |

use crate::error::{Error, Result};
use crate::tag::ElementType;
use crate::value::{Binary, Datetime, DbPointer, ObjectId, Regex, Timestamp};

/// Trait for Rust values encodable as a BSON element value.
pub trait Encode {
    /// The element kind this value encodes as.
    fn element_type(&self) -> ElementType;

    /// Append the value-region bytes (no tag, no key) to `buf`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Encoder` for values the wire format cannot carry,
    /// such as cstrings with interior NUL bytes.
    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()>;
}

impl Encode for f64 {
    fn element_type(&self) -> ElementType {
        ElementType::Double
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }
}

impl Encode for i32 {
    fn element_type(&self) -> ElementType {
        ElementType::Int32
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }
}

impl Encode for i64 {
    fn element_type(&self) -> ElementType {
        ElementType::Int64
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }
}

impl Encode for bool {
    fn element_type(&self) -> ElementType {
        ElementType::Boolean
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.push(u8::from(*self));
        Ok(())
    }
}

impl Encode for &str {
    fn element_type(&self) -> ElementType {
        ElementType::String
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        encode_string(self, buf)
    }
}

impl Encode for String {
    fn element_type(&self) -> ElementType {
        ElementType::String
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        encode_string(self, buf)
    }
}

impl Encode for ObjectId {
    fn element_type(&self) -> ElementType {
        ElementType::ObjectId
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(&self.0);
        Ok(())
    }
}

impl Encode for Datetime {
    fn element_type(&self) -> ElementType {
        ElementType::Datetime
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(&self.0.to_le_bytes());
        Ok(())
    }
}

impl Encode for Timestamp {
    fn element_type(&self) -> ElementType {
        ElementType::Timestamp
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(&self.0.to_le_bytes());
        Ok(())
    }
}

impl Encode for Binary<'_> {
    fn element_type(&self) -> ElementType {
        ElementType::Binary
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        let len = length_i32(self.payload.len())?;
        buf.extend_from_slice(&len.to_le_bytes());
        buf.push(self.subtype);
        buf.extend_from_slice(self.payload);
        Ok(())
    }
}

/// Binary data with the generic subtype (0x00).
#[derive(Debug, Clone, Copy)]
pub struct Bin<'a>(pub &'a [u8]);

impl Encode for Bin<'_> {
    fn element_type(&self) -> ElementType {
        ElementType::Binary
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        Binary {
            subtype: 0x00,
            payload: self.0,
        }
        .encode_value(buf)
    }
}

impl Encode for Regex<'_> {
    fn element_type(&self) -> ElementType {
        ElementType::Regex
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        encode_cstring(self.pattern, buf)?;
        encode_cstring(self.options, buf)
    }
}

impl Encode for DbPointer<'_> {
    fn element_type(&self) -> ElementType {
        ElementType::DbPointer
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        encode_string(self.namespace, buf)?;
        buf.extend_from_slice(&self.id.0);
        Ok(())
    }
}

/// Null value marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct Null;

impl Encode for Null {
    fn element_type(&self) -> ElementType {
        ElementType::Null
    }

    fn encode_value(&self, _buf: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

/// Undefined value marker (deprecated BSON kind, still readable).
#[derive(Debug, Clone, Copy, Default)]
pub struct Undefined;

impl Encode for Undefined {
    fn element_type(&self) -> ElementType {
        ElementType::Undefined
    }

    fn encode_value(&self, _buf: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

/// MinKey value marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinKey;

impl Encode for MinKey {
    fn element_type(&self) -> ElementType {
        ElementType::MinKey
    }

    fn encode_value(&self, _buf: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

/// MaxKey value marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxKey;

impl Encode for MaxKey {
    fn element_type(&self) -> ElementType {
        ElementType::MaxKey
    }

    fn encode_value(&self, _buf: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

/// Pre-encoded document bytes, embedded as a nested document.
#[derive(Debug, Clone, Copy)]
pub struct Subdoc<'a>(pub &'a [u8]);

impl Encode for Subdoc<'_> {
    fn element_type(&self) -> ElementType {
        ElementType::Document
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        crate::document::Document::new(self.0)
            .map_err(|e| Error::Encoder(format!("invalid subdocument bytes: {e}")))?;
        buf.extend_from_slice(self.0);
        Ok(())
    }
}

/// A slice encoded as a BSON array (keys are decimal indices "0", "1", ...).
#[derive(Debug, Clone, Copy)]
pub struct Arr<'a, T>(pub &'a [T]);

impl<T: Encode> Encode for Arr<'_, T> {
    fn element_type(&self) -> ElementType {
        ElementType::Array
    }

    fn encode_value(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut builder = DocumentBuilder::new();
        for (i, item) in self.0.iter().enumerate() {
            builder.append(&i.to_string(), item)?;
        }
        buf.extend_from_slice(&builder.finish()?);
        Ok(())
    }
}

/// Incremental builder for one document.
///
/// Appends `(key, value)` elements in order and finishes with the length
/// prefix patched in and the terminator appended.
#[derive(Debug)]
pub struct DocumentBuilder {
    buf: Vec<u8>,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; 4], // length prefix patched in finish()
        }
    }

    /// Append one element.
    ///
    /// # Errors
    ///
    /// Returns `Error::Encoder` if the key contains a NUL byte or the
    /// value cannot be encoded.
    pub fn append(&mut self, key: &str, value: &impl Encode) -> Result<()> {
        self.buf.push(value.element_type().raw());
        encode_cstring(key, &mut self.buf)?;
        value.encode_value(&mut self.buf)
    }

    /// Terminate the document and return its bytes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Encoder` if the document exceeds the int32 length
    /// limit.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.buf.push(0x00);
        let len = length_i32(self.buf.len())?;
        self.buf[0..4].copy_from_slice(&len.to_le_bytes());
        Ok(self.buf)
    }
}

/// Marshal the one-field document `{key: value}`.
pub fn marshal_single(key: &str, value: &impl Encode) -> Result<Vec<u8>> {
    let mut builder = DocumentBuilder::new();
    builder.append(key, value)?;
    builder.finish()
}

fn encode_string(s: &str, buf: &mut Vec<u8>) -> Result<()> {
    let len = length_i32(s.len() + 1)?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    buf.push(0x00);
    Ok(())
}

fn encode_cstring(s: &str, buf: &mut Vec<u8>) -> Result<()> {
    if s.as_bytes().contains(&0x00) {
        return Err(Error::Encoder(format!("cstring contains NUL byte: {s:?}")));
    }
    buf.extend_from_slice(s.as_bytes());
    buf.push(0x00);
    Ok(())
}

fn length_i32(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::Encoder(format!("length {len} exceeds int32")))
}
