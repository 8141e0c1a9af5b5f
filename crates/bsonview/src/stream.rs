//! Streaming pipeline: serial and parallel dispatch of framed documents.
//!
//! A [`DocumentStream`] frames documents off a byte source and hands each
//! one to a user callback. Serial mode runs everything on the calling
//! thread. Parallel mode keeps framing on the calling thread (the
//! producer) and fans batches of frames out to worker lanes over a
//! bounded queue:
//!
//! - batches hold up to 100 frames;
//! - the batch queue holds `2 * lanes` batches (backpressure: the
//!   producer blocks when workers lag);
//! - a separate error channel of capacity `lanes` carries the first
//!   callback failure.
//!
//! Frames within one batch are delivered to a single lane in source
//! order; no order is guaranteed across lanes. Offsets are assigned by
//! the producer and are strictly monotonic in source order, so a frame's
//! position is unambiguous even when processed out of order.
//!
//! Cancellation is first-error cooperative: a failing callback stops its
//! lane, the producer stops dispatching new batches, in-flight callbacks
//! run to completion, and the first error is returned after all lanes
//! join. Later errors may be dropped.

use std::io::Read;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::frame::FrameReader;
use crate::search::SearchToken;

/// Frames accumulated per batch before handing off to a worker lane.
const BATCH_LEN: usize = 100;

/// One framed document: an owned buffer plus its source position.
#[derive(Debug, Clone)]
pub struct Frame {
    bytes: Vec<u8>,
    offset: u64,
    lane: usize,
}

impl Frame {
    /// The raw document bytes, including the length prefix.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte position of this document's start within the source stream.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Worker lane delivering this frame (0 in serial mode).
    #[inline]
    #[must_use]
    pub fn lane(&self) -> usize {
        self.lane
    }

    /// Document size in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow the frame as a document view. Views must not escape the
    /// callback; the frame owns the buffer they point into.
    pub fn document(&self) -> Result<Document<'_>> {
        Document::new(&self.bytes)
    }

    /// Pre-filter on the raw bytes, without parsing.
    #[must_use]
    pub fn fast_contains(&self, token: &SearchToken) -> bool {
        memchr::memmem::find(&self.bytes, token.as_bytes()).is_some()
    }

    /// Take ownership of the buffer.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Streams framed documents from a byte source into a callback.
pub struct DocumentStream<R> {
    reader: FrameReader<R>,
}

impl<R: Read> DocumentStream<R> {
    /// Wrap a byte source.
    pub fn new(source: R) -> Self {
        Self {
            reader: FrameReader::new(source),
        }
    }

    /// Read the next raw document buffer off the source.
    ///
    /// # Errors
    ///
    /// Same contract as [`FrameReader::read_one`].
    pub fn read_one(&mut self) -> Result<Vec<u8>> {
        self.reader.read_one()
    }

    /// Serial mode: invoke `callback` for every frame, in source order,
    /// on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns the first framing or callback error; end of stream
    /// terminates normally.
    pub fn for_each<F>(mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(&Frame) -> Result<()>,
    {
        let mut offset = 0u64;
        loop {
            let bytes = match self.reader.read_one() {
                Ok(bytes) => bytes,
                Err(Error::EndOfStream) => return Ok(()),
                Err(e) => return Err(e),
            };
            let size = bytes.len() as u64;
            callback(&Frame {
                bytes,
                offset,
                lane: 0,
            })?;
            offset += size;
        }
    }

    /// Parallel mode: frame serially, dispatch batches to `lanes` worker
    /// threads. `lanes <= 1` delegates to [`DocumentStream::for_each`].
    ///
    /// The callback runs concurrently on all lanes; each invocation
    /// receives the frame tagged with the executing lane's id.
    ///
    /// # Errors
    ///
    /// Returns the producer's framing error or the first callback error,
    /// after every lane has terminated.
    pub fn dispatch<F>(mut self, lanes: usize, callback: F) -> Result<()>
    where
        F: Fn(&Frame) -> Result<()> + Sync,
    {
        if lanes <= 1 {
            return self.for_each(callback);
        }

        tracing::debug!(lanes, "dispatching framed documents to worker lanes");
        let (batch_tx, batch_rx) = bounded::<Vec<Frame>>(lanes * 2);
        let (err_tx, err_rx) = bounded::<Error>(lanes);

        let produced = std::thread::scope(|scope| {
            for lane in 0..lanes {
                let batches = batch_rx.clone();
                let errors = err_tx.clone();
                let callback = &callback;
                scope.spawn(move || run_lane(lane, &batches, &errors, callback));
            }
            // workers hold their own clones; the queue closes when the
            // producer drops its sender
            drop(batch_rx);
            drop(err_tx);
            self.produce(batch_tx, &err_rx)
        });

        // all lanes have joined; a worker error can still be pending when
        // the producer finished the stream first
        match produced {
            Ok(()) => match err_rx.try_recv() {
                Ok(e) => Err(e),
                Err(_) => Ok(()),
            },
            Err(e) => Err(e),
        }
    }

    /// Producer loop: frame, tag with cumulative offsets, batch, send.
    fn produce(&mut self, batch_tx: Sender<Vec<Frame>>, err_rx: &Receiver<Error>) -> Result<()> {
        let mut batch = Vec::with_capacity(BATCH_LEN);
        let mut offset = 0u64;
        loop {
            let bytes = match self.reader.read_one() {
                Ok(bytes) => bytes,
                Err(Error::EndOfStream) => break,
                Err(e) => return Err(e),
            };
            let size = bytes.len() as u64;
            batch.push(Frame {
                bytes,
                offset,
                lane: 0,
            });
            offset += size;

            if batch.len() == BATCH_LEN {
                crossbeam_channel::select! {
                    send(batch_tx, std::mem::take(&mut batch)) -> sent => {
                        if sent.is_err() {
                            // every lane exited early; the cause sits in
                            // the error channel and is returned after join
                            return Ok(());
                        }
                    }
                    recv(err_rx) -> err => {
                        return match err {
                            Ok(e) => Err(e),
                            Err(_) => Ok(()),
                        };
                    }
                }
            }
        }
        if !batch.is_empty() {
            // ignore send failure: lanes that exited early left their
            // error behind for pickup after join
            let _ = batch_tx.send(batch);
        }
        Ok(())
    }
}

/// Worker lane: drain batches, tag frames, invoke the callback. Publishes
/// the first failure and exits without consuming further batches.
fn run_lane<F>(lane: usize, batches: &Receiver<Vec<Frame>>, errors: &Sender<Error>, callback: &F)
where
    F: Fn(&Frame) -> Result<()>,
{
    for mut batch in batches.iter() {
        for frame in &mut batch {
            frame.lane = lane;
            if let Err(e) = callback(frame) {
                tracing::debug!(lane, offset = frame.offset, "lane stopping on callback error");
                let _ = errors.try_send(e);
                return;
            }
        }
    }
}
