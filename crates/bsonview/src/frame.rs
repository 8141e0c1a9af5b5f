//! Buffered frame reader: one length-prefixed document per read.

use std::io::{BufReader, ErrorKind, Read};

use crate::document::MIN_DOCUMENT_SIZE;
use crate::error::{Error, Result};

/// Internal read buffer size (4 MiB).
const READ_BUFFER_SIZE: usize = 4 << 20;

/// Cap on a single frame's declared length (64 MiB). Well above MongoDB's
/// 16 MiB document limit, but small enough to reject garbage prefixes
/// before allocating.
const MAX_FRAME_LEN: i32 = 64 << 20;

/// Reads length-prefixed BSON documents off an arbitrary byte source.
pub struct FrameReader<R> {
    inner: BufReader<R>,
}

impl<R: Read> FrameReader<R> {
    /// Wrap a byte source in a buffered frame reader.
    pub fn new(source: R) -> Self {
        Self {
            inner: BufReader::with_capacity(READ_BUFFER_SIZE, source),
        }
    }

    /// Read one complete document, returning an owned buffer that
    /// includes the 4-byte length prefix.
    ///
    /// # Errors
    ///
    /// - `Error::EndOfStream` when the source is exhausted at a frame
    ///   boundary (zero bytes read at the very start of a frame).
    /// - `Error::Truncated` when the source ends mid-frame.
    /// - `Error::MalformedFrame` when the declared length is below the
    ///   5-byte document minimum or above the frame cap.
    /// - `Error::Io` for any other read failure.
    pub fn read_one(&mut self) -> Result<Vec<u8>> {
        let mut prefix = [0u8; 4];
        let mut filled = 0;
        while filled < prefix.len() {
            match self.inner.read(&mut prefix[filled..]) {
                Ok(0) if filled == 0 => return Err(Error::EndOfStream),
                Ok(0) => return Err(Error::Truncated),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }

        let len = i32::from_le_bytes(prefix);
        if len < MIN_DOCUMENT_SIZE as i32 || len > MAX_FRAME_LEN {
            tracing::warn!(len, "rejecting frame with implausible length");
            return Err(Error::MalformedFrame { len: i64::from(len) });
        }

        let mut frame = vec![0u8; len as usize];
        frame[..4].copy_from_slice(&prefix);
        match self.inner.read_exact(&mut frame[4..]) {
            Ok(()) => Ok(frame),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(Error::Truncated),
            Err(e) => Err(Error::Io(e)),
        }
    }
}
