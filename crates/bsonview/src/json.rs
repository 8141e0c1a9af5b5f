//! JSON projection of documents and generic values.
//!
//! Object keys keep document insertion order (`serde_json` with
//! `preserve_order`). Re-reading the same document always yields the same
//! JSON.
//!
//! # Kind mapping
//!
//! | BSON kind | JSON |
//! |-----------|------|
//! | Double, Int32, Int64, Boolean, String, Null | native JSON (integers signed) |
//! | Binary | base64 string of the payload (subtype dropped) |
//! | Document / Array | object / array |
//! | ObjectId | 24-char lowercase hex string |
//! | Datetime | integer, signed ms since epoch |
//! | Timestamp | integer (opaque int64) |
//! | Regex | `{"pattern": p, "options": o}` |
//! | DBPointer | `{"namespace": ns, "id": hex}` |
//! | MinKey / MaxKey | `{"$minKey": 1}` / `{"$maxKey": 1}` |
//! | Undefined | `{"$undefined": true}` |
//! | Decimal128, JS code, Symbol, code-with-scope | `{"$type": name, "$bytes": base64}` |

use base64::Engine;
use serde_json::Value as JsonValue;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::value::BsonValue;

/// Convert a generic value into a `serde_json` value.
///
/// # Errors
///
/// Returns `Error::NonFiniteFloat` for NaN or infinite doubles.
pub fn to_json_value(value: &BsonValue) -> Result<JsonValue> {
    Ok(match value {
        BsonValue::Double(f) => {
            if !f.is_finite() {
                return Err(Error::NonFiniteFloat(*f));
            }
            let num = serde_json::Number::from_f64(*f).ok_or(Error::NonFiniteFloat(*f))?;
            JsonValue::Number(num)
        }

        BsonValue::Str(s) => JsonValue::String((*s).to_string()),

        BsonValue::Document(fields) => {
            let mut obj = serde_json::Map::with_capacity(fields.len());
            for (key, val) in fields {
                obj.insert(key.clone(), to_json_value(val)?);
            }
            JsonValue::Object(obj)
        }

        BsonValue::Array(items) => {
            let mut arr = Vec::with_capacity(items.len());
            for item in items {
                arr.push(to_json_value(item)?);
            }
            JsonValue::Array(arr)
        }

        BsonValue::Binary(bin) => JsonValue::String(
            base64::engine::general_purpose::STANDARD.encode(bin.payload),
        ),

        BsonValue::Undefined => serde_json::json!({"$undefined": true}),

        BsonValue::ObjectId(id) => JsonValue::String(id.to_hex()),

        BsonValue::Boolean(b) => JsonValue::Bool(*b),

        BsonValue::Datetime(dt) => JsonValue::Number(dt.millis().into()),

        BsonValue::Null => JsonValue::Null,

        BsonValue::Regex(re) => serde_json::json!({
            "pattern": re.pattern,
            "options": re.options,
        }),

        BsonValue::DbPointer(ptr) => serde_json::json!({
            "namespace": ptr.namespace,
            "id": ptr.id.to_hex(),
        }),

        BsonValue::Int32(n) => JsonValue::Number((*n).into()),
        BsonValue::Timestamp(ts) => JsonValue::Number(ts.0.into()),
        BsonValue::Int64(n) => JsonValue::Number((*n).into()),

        BsonValue::MinKey => serde_json::json!({"$minKey": 1}),
        BsonValue::MaxKey => serde_json::json!({"$maxKey": 1}),

        BsonValue::Opaque { kind, bytes } => serde_json::json!({
            "$type": kind.name(),
            "$bytes": base64::engine::general_purpose::STANDARD.encode(bytes),
        }),
    })
}

/// Render a generic value as a JSON string.
pub fn value_to_string(value: &BsonValue) -> Result<String> {
    serde_json::to_string(&to_json_value(value)?).map_err(|e| Error::Json(e.to_string()))
}

/// Render a document as a JSON object string, in element order.
pub(crate) fn document_to_string(doc: &Document) -> Result<String> {
    let mut obj = serde_json::Map::new();
    for (key, val) in doc.map()? {
        obj.insert(key, to_json_value(&val)?);
    }
    serde_json::to_string(&JsonValue::Object(obj)).map_err(|e| Error::Json(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{Bin, DocumentBuilder};
    use crate::value::{Binary, Datetime, ObjectId, Regex};

    #[test]
    fn test_scalars() {
        assert_eq!(
            value_to_string(&BsonValue::Int32(-456)).unwrap(),
            "-456"
        );
        assert_eq!(
            value_to_string(&BsonValue::Int64(-123)).unwrap(),
            "-123"
        );
        assert_eq!(value_to_string(&BsonValue::Null).unwrap(), "null");
        assert_eq!(
            value_to_string(&BsonValue::Boolean(true)).unwrap(),
            "true"
        );
        assert_eq!(
            value_to_string(&BsonValue::Str("hi")).unwrap(),
            r#""hi""#
        );
        assert_eq!(
            value_to_string(&BsonValue::Datetime(Datetime(-5))).unwrap(),
            "-5"
        );
    }

    #[test]
    fn test_binary_renders_base64() {
        let v = BsonValue::Binary(Binary {
            subtype: 0x00,
            payload: b"Hello",
        });
        assert_eq!(value_to_string(&v).unwrap(), r#""SGVsbG8=""#);
    }

    #[test]
    fn test_objectid_renders_hex() {
        let v = BsonValue::ObjectId(ObjectId([0xAB; 12]));
        assert_eq!(
            value_to_string(&v).unwrap(),
            r#""abababababababababababab""#
        );
    }

    #[test]
    fn test_regex_shape() {
        let v = BsonValue::Regex(Regex {
            pattern: "a+",
            options: "is",
        });
        assert_eq!(
            value_to_string(&v).unwrap(),
            r#"{"pattern":"a+","options":"is"}"#
        );
    }

    #[test]
    fn test_min_max_undefined_shapes() {
        assert_eq!(value_to_string(&BsonValue::MinKey).unwrap(), r#"{"$minKey":1}"#);
        assert_eq!(value_to_string(&BsonValue::MaxKey).unwrap(), r#"{"$maxKey":1}"#);
        assert_eq!(
            value_to_string(&BsonValue::Undefined).unwrap(),
            r#"{"$undefined":true}"#
        );
    }

    #[test]
    fn test_non_finite_float_error() {
        assert!(matches!(
            value_to_string(&BsonValue::Double(f64::NAN)),
            Err(Error::NonFiniteFloat(_))
        ));
    }

    #[test]
    fn test_document_order_is_stable() {
        let mut b = DocumentBuilder::new();
        b.append("z", &1i32).unwrap();
        b.append("a", &2i32).unwrap();
        b.append("d", &Bin(b"4.5")).unwrap();
        let bytes = b.finish().unwrap();
        let doc = Document::new(&bytes).unwrap();
        let json = doc.to_json().unwrap();
        assert_eq!(json, r#"{"z":1,"a":2,"d":"NC41"}"#);
        // re-reading yields the same projection
        assert_eq!(doc.to_json().unwrap(), json);
    }
}
