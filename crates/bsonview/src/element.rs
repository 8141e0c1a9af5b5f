//! Element cursor over a document's element area.
//!
//! The element area is the interior of a document: everything between the
//! 4-byte length prefix and the trailing NUL terminator. The cursor splits
//! one `(key, value)` pair at a time off the front; a well-formed document
//! terminates exactly when the area is empty.
//!
//! The cursor is pure: it holds no state beyond the remaining slice, so two
//! traversals over the same bytes yield identical results.

use crate::error::Result;
use crate::tag::ElementType;
use crate::value::Value;
use crate::wire::{cstring_end, value_size};

/// One element split off the element area: a raw key and its value view.
#[derive(Debug, Clone, Copy)]
pub struct RawElement<'a> {
    /// Key bytes, excluding the NUL terminator. Key equality is raw-byte
    /// equality; use [`RawElement::key_str`] for display.
    pub key: &'a [u8],
    /// Non-owning view of the value region.
    pub value: Value<'a>,
}

impl<'a> RawElement<'a> {
    /// Key decoded as UTF-8, lossily.
    #[must_use]
    pub fn key_str(&self) -> std::borrow::Cow<'a, str> {
        String::from_utf8_lossy(self.key)
    }
}

/// Split the first element off `area`, returning it and the remainder.
///
/// Returns `Ok(None)` when the area is empty (end of document).
///
/// # Errors
///
/// Returns `Error::MalformedElement` on an unknown tag, a key without a
/// NUL terminator, or a value region that overruns the area.
pub fn take_one(area: &[u8]) -> Result<Option<(RawElement<'_>, &[u8])>> {
    if area.is_empty() {
        return Ok(None);
    }
    let tag = ElementType::from_byte(area[0])?;
    let key_end = cstring_end(area, 1).ok_or(crate::error::Error::MalformedElement {
        tag: tag.raw(),
    })?;
    let key = &area[1..key_end];
    let value_start = key_end + 1;
    let size = value_size(tag, area, value_start)?;
    let element = RawElement {
        key,
        value: Value::new(tag, &area[value_start..value_start + size]),
    };
    Ok(Some((element, &area[value_start + size..])))
}

/// Lazy iterator over the elements of a document's element area.
///
/// Yields `Result<RawElement>`; iteration fuses after the first error.
#[derive(Debug, Clone)]
pub struct Elements<'a> {
    rest: &'a [u8],
    failed: bool,
}

impl<'a> Elements<'a> {
    pub(crate) fn new(area: &'a [u8]) -> Self {
        Self {
            rest: area,
            failed: false,
        }
    }

    /// Bytes not yet consumed by the cursor.
    #[inline]
    #[must_use]
    pub fn remainder(&self) -> &'a [u8] {
        self.rest
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Result<RawElement<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match take_one(self.rest) {
            Ok(Some((element, rest))) => {
                self.rest = rest;
                Some(Ok(element))
            }
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
