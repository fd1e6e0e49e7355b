//! Blocking request/response streams between a compilation worker and the owning process.
//!
//! A [`Stream`] performs one round trip per [`Stream::exchange`] call; the calling thread is
//! blocked until the response has arrived. Two implementations are provided:
//!
//! - [`LoopbackStream`] answers requests through an in-process [`MetadataServer`], still
//!   encoding and decoding every message so the wire shape is exercised.
//! - [`FramedStream`] talks to a peer over any `Read`/`Write` pair using length-prefixed
//!   bincode frames.
//!
//! # Frame Format
//!
//! ```text
//! u32 payload length (little-endian) | payload (bincode-encoded Request or Response)
//! ```
//!
//! Timeouts, reconnection and connection setup belong to whoever creates the reader and
//! writer.

use std::{
    io::{ErrorKind, Read, Write},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use dashmap::DashMap;
use tracing::trace;

use crate::{
    remote::{
        message::{decode, encode},
        MetadataServer, Request, Response,
    },
    Error, Result,
};

/// Largest accepted frame payload
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// A blocking request/response channel to the process that owns the class data
pub trait Stream: Send {
    /// Send one request and wait for its response.
    ///
    /// # Errors
    /// Returns a transport error if the request cannot be delivered or the response cannot
    /// be read.
    fn exchange(&mut self, request: &Request) -> Result<Response>;

    /// Round-trip counters of this stream
    fn stats(&self) -> Arc<StreamStats>;
}

/// Round-trip counters shared between a stream and its observers
#[derive(Debug, Default)]
pub struct StreamStats {
    round_trips: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    per_request: DashMap<&'static str, u64>,
}

impl StreamStats {
    /// Create zeroed counters
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, request: &Request, sent: usize, received: usize) {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(sent as u64, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(received as u64, Ordering::Relaxed);
        *self.per_request.entry(request.kind()).or_insert(0) += 1;
    }

    /// Completed round trips
    #[must_use]
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::Relaxed)
    }

    /// Completed round trips for one request kind, e.g. `"ClassFlags"`
    #[must_use]
    pub fn requests_of(&self, kind: &str) -> u64 {
        self.per_request.get(kind).map_or(0, |count| *count)
    }

    /// Payload bytes written
    #[must_use]
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Payload bytes read
    #[must_use]
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }
}

/// A stream served by an in-process [`MetadataServer`]
pub struct LoopbackStream {
    server: MetadataServer,
    stats: Arc<StreamStats>,
}

impl LoopbackStream {
    /// Connect to `server`
    #[must_use]
    pub fn new(server: MetadataServer) -> Self {
        LoopbackStream {
            server,
            stats: StreamStats::new(),
        }
    }
}

impl Stream for LoopbackStream {
    fn exchange(&mut self, request: &Request) -> Result<Response> {
        let outbound = encode(request)?;
        let received: Request = decode(&outbound)?;
        let inbound = encode(&self.server.handle(&received))?;
        let response = decode(&inbound)?;
        self.stats.record(request, outbound.len(), inbound.len());
        trace!(request = request.kind(), "loopback round trip");
        Ok(response)
    }

    fn stats(&self) -> Arc<StreamStats> {
        self.stats.clone()
    }
}

/// A stream over a reader/writer pair using length-prefixed bincode frames
pub struct FramedStream<R, W> {
    reader: R,
    writer: W,
    stats: Arc<StreamStats>,
}

impl<R: Read + Send, W: Write + Send> FramedStream<R, W> {
    /// Wrap an already connected reader/writer pair
    pub fn new(reader: R, writer: W) -> Self {
        FramedStream {
            reader,
            writer,
            stats: StreamStats::new(),
        }
    }
}

impl<R: Read + Send, W: Write + Send> Stream for FramedStream<R, W> {
    fn exchange(&mut self, request: &Request) -> Result<Response> {
        let payload = encode(request)?;
        write_frame(&mut self.writer, &payload)?;
        let Some(frame) = read_frame(&mut self.reader)? else {
            return Err(Error::Transport(format!(
                "peer closed the stream while a {} request was pending",
                request.kind()
            )));
        };
        self.stats.record(request, payload.len(), frame.len());
        decode(&frame)
    }

    fn stats(&self) -> Arc<StreamStats> {
        self.stats.clone()
    }
}

/// Write one frame and flush it.
///
/// # Errors
/// Returns [`Error::Io`] on write failure and [`Error::Malformed`] if the
/// payload exceeds [`MAX_FRAME_LEN`].
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(malformed_error!(
            "Frame of {} bytes exceeds the limit of {} bytes",
            payload.len(),
            MAX_FRAME_LEN
        ));
    }
    #[allow(clippy::cast_possible_truncation)]
    let length = payload.len() as u32;
    writer.write_all(&length.to_le_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one frame; `None` if the peer closed the stream before a new frame began.
///
/// # Errors
/// Returns [`Error::Io`] if the stream ends inside a frame and
/// [`Error::Malformed`] if the announced length exceeds [`MAX_FRAME_LEN`].
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(error) if error.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(error) => return Err(error.into()),
    }

    let length = u32::from_le_bytes(header) as usize;
    if length > MAX_FRAME_LEN {
        return Err(malformed_error!(
            "Frame announces {} bytes, limit is {} bytes",
            length,
            MAX_FRAME_LEN
        ));
    }

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload)?;
    Ok(Some(payload))
}
