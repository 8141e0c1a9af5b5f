//! Little-endian wire primitives and per-tag value sizing.
//!
//! These functions read fixed-width integers, scan NUL-terminated strings,
//! and compute the byte length of an element's value region from its tag.
//! Sizing is the single authority the element cursor dispatches on; every
//! recognized tag has exactly one rule here.

use crate::error::{Error, Result};
use crate::tag::ElementType;

/// Read a little-endian signed 32-bit integer from the front of a slice.
///
/// Returns `None` if fewer than 4 bytes are available.
#[inline]
#[must_use]
pub fn read_i32(bytes: &[u8]) -> Option<i32> {
    Some(i32::from_le_bytes(bytes.get(..4)?.try_into().ok()?))
}

/// Read a little-endian signed 64-bit integer from the front of a slice.
#[inline]
#[must_use]
pub fn read_i64(bytes: &[u8]) -> Option<i64> {
    Some(i64::from_le_bytes(bytes.get(..8)?.try_into().ok()?))
}

/// Read a little-endian IEEE-754 double from the front of a slice.
#[inline]
#[must_use]
pub fn read_f64(bytes: &[u8]) -> Option<f64> {
    Some(f64::from_le_bytes(bytes.get(..8)?.try_into().ok()?))
}

/// Index of the first NUL byte at or after `from`.
///
/// Returns `None` if `from` is out of bounds or no NUL follows.
#[inline]
#[must_use]
pub fn cstring_end(bytes: &[u8], from: usize) -> Option<usize> {
    memchr::memchr(0x00, bytes.get(from..)?).map(|i| from + i)
}

/// Byte length of the value region for `tag`, starting at `bytes[from]`.
///
/// Variable-length kinds read their own length prefixes:
///
/// - String, JS code, Symbol: 4-byte length L (including the trailing NUL),
///   region is `4 + L`.
/// - Document, Array, JS code with scope: leading int32 is the total region
///   size including itself.
/// - Binary: 4-byte payload length L, one subtype byte, region `4 + 1 + L`.
/// - Regex: two consecutive cstrings; both trailing NULs belong to the
///   region, and the options scan starts after the pattern's NUL.
/// - DBPointer: 4-byte namespace length L (including its NUL), then the
///   namespace, then a 12-byte ObjectId; region `4 + L + 12`. The offsets
///   derive from the declared length, never from end-slicing.
///
/// # Errors
///
/// Returns `Error::MalformedElement` when the tag is unrecognized, a length
/// prefix is implausible, or the computed region overruns `bytes`.
pub fn value_size(tag: ElementType, bytes: &[u8], from: usize) -> Result<usize> {
    let malformed = || Error::MalformedElement { tag: tag.raw() };
    let Some(avail) = bytes.len().checked_sub(from) else {
        return Err(malformed());
    };

    let size = match tag {
        ElementType::Double
        | ElementType::Datetime
        | ElementType::Timestamp
        | ElementType::Int64 => 8,

        ElementType::String | ElementType::JsCode | ElementType::Symbol => {
            let len = read_i32(&bytes[from..]).ok_or_else(malformed)?;
            if len < 1 {
                return Err(malformed());
            }
            4 + len as usize
        }

        ElementType::Document | ElementType::Array => {
            let total =
                read_i32(&bytes[from..]).ok_or_else(malformed)?;
            if total < 5 {
                return Err(malformed());
            }
            total as usize
        }

        // code_w_s: the leading int32 is the total size including itself.
        ElementType::JsCodeWithScope => {
            let total =
                read_i32(&bytes[from..]).ok_or_else(malformed)?;
            if total < 4 {
                return Err(malformed());
            }
            total as usize
        }

        ElementType::Binary => {
            let len = read_i32(&bytes[from..]).ok_or_else(malformed)?;
            if len < 0 {
                return Err(malformed());
            }
            4 + 1 + len as usize
        }

        ElementType::Empty
        | ElementType::Undefined
        | ElementType::Null
        | ElementType::MinKey
        | ElementType::MaxKey => 0,

        ElementType::ObjectId => 12,
        ElementType::Boolean => 1,

        ElementType::Regex => {
            let pattern_end =
                cstring_end(bytes, from).ok_or_else(malformed)?;
            let options_end = cstring_end(bytes, pattern_end + 1)
                .ok_or_else(malformed)?;
            options_end + 1 - from
        }

        ElementType::DbPointer => {
            let len = read_i32(&bytes[from..]).ok_or_else(malformed)?;
            if len < 1 {
                return Err(malformed());
            }
            4 + len as usize + 12
        }

        ElementType::Int32 => 4,
        ElementType::Decimal128 => 16,
    };

    if size > avail {
        return Err(malformed());
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_i32() {
        assert_eq!(read_i32(&[0x10, 0x00, 0x00, 0x00]), Some(16));
        assert_eq!(read_i32(&[0xFF, 0xFF, 0xFF, 0xFF]), Some(-1));
        assert_eq!(read_i32(&[0x01, 0x02]), None);
    }

    #[test]
    fn test_read_i64() {
        assert_eq!(
            read_i64(&[0xD2, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
            Some(1234)
        );
        assert_eq!(read_i64(&[0xFF; 8]), Some(-1));
    }

    #[test]
    #[allow(clippy::float_cmp)] // 1.5 is exactly representable in IEEE 754
    fn test_read_f64() {
        assert_eq!(
            read_f64(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF8, 0x3F]),
            Some(1.5)
        );
    }

    #[test]
    fn test_cstring_end() {
        assert_eq!(cstring_end(b"ab\x00cd", 0), Some(2));
        assert_eq!(cstring_end(b"ab\x00cd\x00", 3), Some(6));
        assert_eq!(cstring_end(b"abc", 0), None);
        assert_eq!(cstring_end(b"a\x00", 5), None);
    }

    #[test]
    fn test_fixed_width_sizes() {
        let b = [0u8; 16];
        assert_eq!(value_size(ElementType::Double, &b, 0).unwrap(), 8);
        assert_eq!(value_size(ElementType::Datetime, &b, 0).unwrap(), 8);
        assert_eq!(value_size(ElementType::Timestamp, &b, 0).unwrap(), 8);
        assert_eq!(value_size(ElementType::Int64, &b, 0).unwrap(), 8);
        assert_eq!(value_size(ElementType::ObjectId, &b, 0).unwrap(), 12);
        assert_eq!(value_size(ElementType::Boolean, &b, 0).unwrap(), 1);
        assert_eq!(value_size(ElementType::Int32, &b, 0).unwrap(), 4);
        assert_eq!(value_size(ElementType::Decimal128, &b, 0).unwrap(), 16);
        assert_eq!(value_size(ElementType::Null, &b, 0).unwrap(), 0);
        assert_eq!(value_size(ElementType::Undefined, &b, 0).unwrap(), 0);
        assert_eq!(value_size(ElementType::MinKey, &b, 0).unwrap(), 0);
        assert_eq!(value_size(ElementType::MaxKey, &b, 0).unwrap(), 0);
    }

    #[test]
    fn test_string_size() {
        // "hi\0" -> L = 3, region = 4 + 3
        let b = [0x03, 0x00, 0x00, 0x00, b'h', b'i', 0x00];
        assert_eq!(value_size(ElementType::String, &b, 0).unwrap(), 7);
        // region overruns the slice
        let short = [0x04, 0x00, 0x00, 0x00, b'h', b'i', 0x00];
        assert!(value_size(ElementType::String, &short, 0).is_err());
        // zero length cannot hold the trailing NUL
        let zero = [0x00, 0x00, 0x00, 0x00];
        assert!(value_size(ElementType::String, &zero, 0).is_err());
    }

    #[test]
    fn test_binary_size() {
        // L = 3, subtype, 3 payload bytes -> 8
        let b = [0x03, 0x00, 0x00, 0x00, 0x00, 0xAA, 0xBB, 0xCC];
        assert_eq!(value_size(ElementType::Binary, &b, 0).unwrap(), 8);
    }

    #[test]
    fn test_document_size() {
        // empty document: 5 bytes
        let b = [0x05, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(value_size(ElementType::Document, &b, 0).unwrap(), 5);
        assert_eq!(value_size(ElementType::Array, &b, 0).unwrap(), 5);
        let b = [0x04, 0x00, 0x00, 0x00, 0x00];
        assert!(value_size(ElementType::Document, &b, 0).is_err());
    }

    #[test]
    fn test_regex_size() {
        // "a+\0" "is\0" -> 6 bytes, both NULs included
        let b = [b'a', b'+', 0x00, b'i', b's', 0x00];
        assert_eq!(value_size(ElementType::Regex, &b, 0).unwrap(), 6);
        // empty pattern and options
        let b = [0x00, 0x00];
        assert_eq!(value_size(ElementType::Regex, &b, 0).unwrap(), 2);
        // missing options terminator
        let b = [b'a', 0x00, b'i', b's'];
        assert!(value_size(ElementType::Regex, &b, 0).is_err());
    }

    #[test]
    fn test_regex_size_offset_scan() {
        // The options scan must start after the pattern's NUL; with a
        // leading offset the region still covers both cstrings.
        let b = [0xEE, 0xEE, b'p', 0x00, b'i', 0x00];
        assert_eq!(value_size(ElementType::Regex, &b, 2).unwrap(), 4);
    }

    #[test]
    fn test_db_pointer_size() {
        // namespace "db.c\0" (L=5) + 12-byte id -> 4 + 5 + 12 = 21
        let mut b = vec![0x05, 0x00, 0x00, 0x00];
        b.extend_from_slice(b"db.c\x00");
        b.extend_from_slice(&[0x11; 12]);
        assert_eq!(value_size(ElementType::DbPointer, &b, 0).unwrap(), 21);
        // truncated id
        b.truncate(b.len() - 1);
        assert!(value_size(ElementType::DbPointer, &b, 0).is_err());
    }

    #[test]
    fn test_code_with_scope_size() {
        // total = 14: int32(4) + "\0" string (4+1) + empty doc (5)
        let mut b = vec![0x0E, 0x00, 0x00, 0x00];
        b.extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0x00]);
        b.extend_from_slice(&[0x05, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(value_size(ElementType::JsCodeWithScope, &b, 0).unwrap(), 14);
    }
}
