//! Remote fetch protocol.
//!
//! A compilation worker running outside the owning process reaches class data through a
//! [`Stream`]. This module defines the request/response catalog, the stream abstraction with
//! its in-process and framed implementations, the owning-side [`MetadataServer`] and the
//! worker-side [`RemoteFetcher`] that layers per-session caching and the optional consistency
//! check on top of the stream.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use classenv::{ClassBuilder, ClassTable, ClientSession, SessionConfig};
//! use classenv::remote::{LoopbackStream, MetadataServer, RemoteFetcher};
//! use classenv::metadata::InfoKind;
//!
//! let table = Arc::new(ClassTable::new());
//! let class = ClassBuilder::new("demo/Widget").instance_size(24).build(&table)?;
//!
//! let stream = LoopbackStream::new(MetadataServer::new(table));
//! let fetcher = RemoteFetcher::new(ClientSession::new(SessionConfig::production()), Box::new(stream));
//!
//! assert_eq!(fetcher.cached_word(class, InfoKind::TotalInstanceSize)?, 24);
//! assert_eq!(fetcher.cached_word(class, InfoKind::TotalInstanceSize)?, 24);
//! assert_eq!(fetcher.stats().round_trips(), 1);
//! # Ok::<(), classenv::Error>(())
//! ```

mod fetch;
mod message;
mod server;
mod stream;

pub use fetch::RemoteFetcher;
pub use message::{decode, encode, Request, Response};
pub use server::MetadataServer;
pub use stream::{
    read_frame, write_frame, FramedStream, LoopbackStream, Stream, StreamStats, MAX_FRAME_LEN,
};
