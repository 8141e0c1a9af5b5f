//! Zero-copy BSON document reader and streaming processor.
//!
//! The reader treats a raw BSON byte buffer as a navigable tree: element
//! iteration, dotted-path lookup, typed accessors, a JSON projection, and
//! a byte-level "may contain" pre-filter. The streaming side frames
//! length-prefixed documents off any [`std::io::Read`] source and
//! dispatches each to a callback, serially or across parallel worker
//! lanes with bounded backpressure.
//!
//! ```
//! use bsonview::encode::marshal_single;
//! use bsonview::{Document, DocumentStream};
//!
//! let bytes = marshal_single("answer", &42i64).unwrap();
//!
//! // zero-copy inspection of one document
//! let doc = Document::new(&bytes).unwrap();
//! assert_eq!(doc.lookup("answer").unwrap().as_i64().unwrap(), 42);
//!
//! // streaming over a byte source
//! DocumentStream::new(bytes.as_slice())
//!     .for_each(|frame| {
//!         let doc = frame.document()?;
//!         assert_eq!(doc.lookup("answer")?.as_i64()?, 42);
//!         Ok(())
//!     })
//!     .unwrap();
//! ```

pub mod document;
pub mod element;
pub mod encode;
pub mod error;
pub mod frame;
pub mod json;
pub mod search;
pub mod stream;
pub mod tag;
pub mod value;
pub mod wire;

pub use document::Document;
pub use error::{Error, Result};
pub use frame::FrameReader;
pub use search::SearchToken;
pub use stream::{DocumentStream, Frame};
pub use tag::ElementType;
pub use value::{Binary, BsonValue, Datetime, DbPointer, ObjectId, Regex, Timestamp, Value};
