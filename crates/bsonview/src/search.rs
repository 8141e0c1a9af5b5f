//! Search-token builder for the fast-contains pre-filter.
//!
//! A search token is a byte pattern whose presence inside a document's
//! bytes is *necessary but not sufficient* for the queried value to occur
//! as a field value. BSON encoding of a given value is deterministic per
//! encoder, so the encoded value bytes must appear verbatim in any
//! document carrying that value at any key. The bytes may also appear
//! incidentally; callers confirm real matches via
//! [`Document::lookup`](crate::Document::lookup).

use crate::encode::{marshal_single, Encode};
use crate::error::Result;
use crate::tag::ElementType;

/// A byte pattern for pre-filtering documents before parsing.
///
/// ```
/// use bsonview::{Document, SearchToken};
/// use bsonview::encode::marshal_single;
///
/// let bytes = marshal_single("abc", &"def").unwrap();
/// let doc = Document::new(&bytes).unwrap();
///
/// let token = SearchToken::for_value(&"def").unwrap();
/// assert!(doc.fast_contains(&token));
///
/// let token = SearchToken::for_value(&123i64).unwrap();
/// assert!(!doc.fast_contains(&token));
/// ```
#[derive(Debug, Clone)]
pub struct SearchToken(Vec<u8>);

impl SearchToken {
    /// Build the token for a query value.
    ///
    /// String queries use the raw UTF-8 bytes, so the token also hits
    /// substrings of longer field values and key names. Every other kind
    /// marshals the synthetic document `{"v": value}` and slices out the
    /// encoded value region (skipping the 4-byte document length, the tag,
    /// the key and its NUL, and the trailing document terminator).
    ///
    /// # Errors
    ///
    /// Returns `Error::Encoder` if the underlying encoder rejects the
    /// value.
    pub fn for_value(value: &impl Encode) -> Result<Self> {
        let doc = marshal_single("v", value)?;
        // doc_size(4) + tag(1) + key "v"(1) + NUL(1) ...value... NUL(1)
        let region = &doc[7..doc.len() - 1];
        let token = if value.element_type() == ElementType::String {
            // strip the string's own length prefix and trailing NUL
            region[4..region.len() - 1].to_vec()
        } else {
            region.to_vec()
        };
        Ok(Self(token))
    }

    /// The needle bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::encode::{DocumentBuilder, Subdoc};

    #[test]
    fn test_string_token_is_raw_bytes() {
        let token = SearchToken::for_value(&"abc").unwrap();
        assert_eq!(token.as_bytes(), b"abc");
    }

    #[test]
    fn test_numeric_token_is_encoded_value() {
        let token = SearchToken::for_value(&123i64).unwrap();
        assert_eq!(token.as_bytes(), &123i64.to_le_bytes());
        let token = SearchToken::for_value(&3.14f64).unwrap();
        assert_eq!(token.as_bytes(), &3.14f64.to_le_bytes());
    }

    #[test]
    fn test_token_found_under_any_key() {
        let bytes = marshal_single("some_key", &123i64).unwrap();
        let doc = Document::new(&bytes).unwrap();
        assert!(doc.fast_contains(&SearchToken::for_value(&123i64).unwrap()));
        assert!(!doc.fast_contains(&SearchToken::for_value(&124i64).unwrap()));
    }

    #[test]
    fn test_document_valued_token() {
        // searching for a whole nested document value
        let inner = marshal_single("abc", &"sdkf").unwrap();
        let mut outer = DocumentBuilder::new();
        outer.append("k", &Subdoc(&inner)).unwrap();
        let outer = outer.finish().unwrap();

        let doc = Document::new(&outer).unwrap();
        let token = SearchToken::for_value(&Subdoc(&inner)).unwrap();
        assert!(doc.fast_contains(&token));
    }

    #[test]
    fn test_substring_hits_are_possible() {
        // completeness over precision: "a" is a substring of a key
        let bytes = marshal_single("abc", &"def").unwrap();
        let doc = Document::new(&bytes).unwrap();
        assert!(doc.fast_contains(&SearchToken::for_value(&"a").unwrap()));
        assert!(doc.fast_contains(&SearchToken::for_value(&"d").unwrap()));
    }
}
