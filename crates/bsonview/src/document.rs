//! Zero-copy document views.
//!
//! A [`Document`] wraps a borrowed byte slice holding one complete BSON
//! document: a 4-byte little-endian total length (which includes itself
//! and the terminator), a sequence of elements, and a trailing NUL. All
//! reads are zero-copy; the view holds no state besides the slice, so any
//! number of threads may read the same document concurrently.

use std::fmt;

use crate::element::{take_one, Elements};
use crate::error::{Error, Result};
use crate::search::SearchToken;
use crate::tag::ElementType;
use crate::value::{BsonValue, Value};
use crate::wire::read_i32;

/// Minimum document size: length prefix plus terminator.
pub(crate) const MIN_DOCUMENT_SIZE: usize = 5;

/// Canonical empty document, used as the zero value for document reads.
const EMPTY_DOC: &[u8] = &[0x05, 0x00, 0x00, 0x00, 0x00];

/// A zero-copy view of one BSON document.
#[derive(Clone, Copy)]
pub struct Document<'a> {
    data: &'a [u8],
}

impl<'a> Document<'a> {
    /// Wrap a byte slice holding exactly one document.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedFrame` if the slice is shorter than 5
    /// bytes, the declared length disagrees with the slice length, or the
    /// terminator byte is missing.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < MIN_DOCUMENT_SIZE {
            return Err(Error::MalformedFrame {
                len: data.len() as i64,
            });
        }
        let declared = read_i32(data).unwrap_or(0);
        if declared as usize != data.len() || data[data.len() - 1] != 0x00 {
            return Err(Error::MalformedFrame {
                len: i64::from(declared),
            });
        }
        Ok(Self { data })
    }

    /// The canonical empty document `{}`.
    #[inline]
    #[must_use]
    pub fn empty() -> Document<'static> {
        Document { data: EMPTY_DOC }
    }

    /// The backing bytes, exactly as supplied.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Total document size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// The element area: interior bytes between the length prefix and the
    /// terminator.
    #[inline]
    fn element_area(&self) -> &'a [u8] {
        &self.data[4..self.data.len() - 1]
    }

    /// Lazy iteration over the document's elements, restartable by calling
    /// again.
    #[must_use]
    pub fn elements(&self) -> Elements<'a> {
        Elements::new(self.element_area())
    }

    /// Look up a dotted path like `a.b.c`.
    ///
    /// Walks the first matching key in this document, then recursively in
    /// nested documents (arrays are document-shaped; decimal-index
    /// segments descend into them). Duplicate keys resolve to the first
    /// occurrence. Returns the Empty sentinel when the path is empty, a
    /// segment is missing, or an intermediate segment is not a document.
    ///
    /// # Errors
    ///
    /// Propagates `Error::MalformedElement` from walking malformed bytes.
    pub fn lookup(&self, path: &str) -> Result<Value<'a>> {
        if path.is_empty() {
            return Ok(Value::empty());
        }
        let mut current = Value::new(ElementType::Document, self.data);
        for segment in path.split('.') {
            if !matches!(
                current.kind(),
                ElementType::Document | ElementType::Array
            ) {
                return Ok(Value::empty());
            }
            current = Document::new(current.raw())?.lookup_one(segment.as_bytes())?;
            if current.is_empty() {
                return Ok(Value::empty());
            }
        }
        Ok(current)
    }

    /// Find the first element whose key equals `key` (raw-byte equality).
    fn lookup_one(&self, key: &[u8]) -> Result<Value<'a>> {
        let mut rest = self.element_area();
        while let Some((element, next)) = take_one(rest)? {
            if element.key == key {
                return Ok(element.value);
            }
            rest = next;
        }
        Ok(Value::empty())
    }

    /// Fully projected mapping from key to generic value, in insertion
    /// order.
    pub fn map(&self) -> Result<Vec<(String, BsonValue<'a>)>> {
        let mut fields = Vec::new();
        for element in self.elements() {
            let element = element?;
            fields.push((element.key_str().into_owned(), element.value.value()?));
        }
        Ok(fields)
    }

    /// Mapping from key to borrowed value view, in insertion order. Leaf
    /// values are not decoded.
    pub fn value_map(&self) -> Result<Vec<(String, Value<'a>)>> {
        let mut fields = Vec::new();
        for element in self.elements() {
            let element = element?;
            fields.push((element.key_str().into_owned(), element.value));
        }
        Ok(fields)
    }

    /// Ordered generic values, discarding keys.
    pub fn array(&self) -> Result<Vec<BsonValue<'a>>> {
        let mut items = Vec::new();
        for element in self.elements() {
            items.push(element?.value.value()?);
        }
        Ok(items)
    }

    /// Ordered borrowed value views, discarding keys.
    pub fn value_array(&self) -> Result<Vec<Value<'a>>> {
        let mut items = Vec::new();
        for element in self.elements() {
            items.push(element?.value);
        }
        Ok(items)
    }

    /// Fast pre-filter: byte-level substring test of the document bytes
    /// against a search token. No parsing is performed.
    ///
    /// A `true` result means the token's value *may* occur in this
    /// document; confirm real matches with [`Document::lookup`]. A `false`
    /// result definitively rules the value out.
    #[must_use]
    pub fn fast_contains(&self, token: &SearchToken) -> bool {
        memchr::memmem::find(self.data, token.as_bytes()).is_some()
    }

    /// Render the document as JSON via the generic projection.
    ///
    /// Kind-specific encodings are documented in [`crate::json`].
    pub fn to_json(&self) -> Result<String> {
        crate::json::document_to_string(self)
    }
}

impl fmt::Debug for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("size", &self.data.len())
            .finish()
    }
}

impl fmt::Display for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => f.write_str(&json),
            Err(e) => write!(f, "<invalid document: {e}>"),
        }
    }
}
