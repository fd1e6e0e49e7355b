//! Fetch-and-cache discipline of a remote compilation worker.
//!
//! Every cacheable fact is fetched at most once per session and `(class, kind)`: the
//! [`RemoteFetcher`] consults the session's [`crate::session::MetadataStore`] first and only
//! sends a request on a miss, storing the response before returning it. Read-only
//! descriptors are fetched as raw bytes, decoded once and kept in the descriptor cache.
//!
//! When [`crate::SessionConfig::verify_cached_flags`] is set, flag queries answered from the
//! cache are cross-checked against a fresh, uncached flag word from the owning process.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::{
    metadata::{ClassDescriptor, ClassHandle, InfoKind, InfoValue},
    remote::{Request, Response, Stream, StreamStats},
    session::ClientSession,
    Error, Result,
};

/// Request that fetches the value cached for `kind`
fn request_for(handle: ClassHandle, kind: InfoKind) -> Request {
    match kind {
        InfoKind::DepthAndFlags => Request::DepthAndFlags(handle),
        InfoKind::Flags => Request::ClassFlags(handle),
        InfoKind::TotalInstanceSize => Request::TotalInstanceSize(handle),
        InfoKind::SuperClasses => Request::SuperClasses(handle),
        InfoKind::InterfaceTable => Request::InterfaceTable(handle),
        InfoKind::DeclaredFields => Request::DeclaredFields(handle),
        InfoKind::FlattenedFields => Request::FlattenedFields(handle),
    }
}

/// Convert the response to a cacheable request into the value stored for `kind`
fn into_value(kind: InfoKind, response: Response) -> Result<InfoValue> {
    Ok(match kind {
        InfoKind::Flags => InfoValue::Word(u64::from(response.into_flags()?)),
        InfoKind::DepthAndFlags | InfoKind::TotalInstanceSize => {
            InfoValue::Word(response.into_word()?)
        }
        InfoKind::SuperClasses | InfoKind::InterfaceTable => {
            InfoValue::Classes(Arc::from(response.into_classes()?))
        }
        InfoKind::DeclaredFields => InfoValue::Fields(Arc::from(response.into_fields()?)),
        InfoKind::FlattenedFields => {
            InfoValue::FlattenedFields(Arc::from(response.into_flattened_fields()?))
        }
    })
}

/// One worker's connection to the owning process, bound to a shared session
pub struct RemoteFetcher {
    session: Arc<ClientSession>,
    stream: Mutex<Box<dyn Stream>>,
    stats: Arc<StreamStats>,
}

impl RemoteFetcher {
    /// Bind `stream` to `session`
    pub fn new(session: Arc<ClientSession>, stream: Box<dyn Stream>) -> Self {
        let stats = stream.stats();
        RemoteFetcher {
            session,
            stream: Mutex::new(stream),
            stats,
        }
    }

    /// The session this fetcher caches into
    #[must_use]
    pub fn session(&self) -> &Arc<ClientSession> {
        &self.session
    }

    /// Round-trip counters of the underlying stream
    #[must_use]
    pub fn stats(&self) -> &Arc<StreamStats> {
        &self.stats
    }

    /// Send one request, bypassing the cache.
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the stream lock is poisoned, or the stream's error.
    pub fn request(&self, request: &Request) -> Result<Response> {
        let mut stream = self.stream.lock().map_err(|_| Error::LockError)?;
        stream.exchange(request)
    }

    /// Value of `kind` for `handle`, fetched on the first query of the session.
    ///
    /// # Errors
    /// Returns the transport error of the fetch, or the lookup error reported by the peer.
    pub fn cached(&self, handle: ClassHandle, kind: InfoKind) -> Result<InfoValue> {
        self.session.store().get_or_fetch(handle, kind, || {
            let response = self.request(&request_for(handle, kind))?;
            into_value(kind, response)
        })
    }

    /// Cached word value of `kind` for `handle`.
    ///
    /// # Errors
    /// See [`RemoteFetcher::cached`].
    pub fn cached_word(&self, handle: ClassHandle, kind: InfoKind) -> Result<u64> {
        self.cached(handle, kind)?.into_word()
    }

    /// Cached runtime flag word of `handle`.
    ///
    /// # Errors
    /// See [`RemoteFetcher::cached`].
    pub fn cached_flags(&self, handle: ClassHandle) -> Result<u32> {
        let word = self.cached_word(handle, InfoKind::Flags)?;
        u32::try_from(word)
            .map_err(|_| malformed_error!("Flag word 0x{:x} of {} exceeds 32 bits", word, handle))
    }

    /// Read-only descriptor of `handle`, fetched as raw bytes on the first query.
    ///
    /// # Errors
    /// Returns the transport error of the fetch or a decode error for damaged bytes.
    pub fn descriptor(&self, handle: ClassHandle) -> Result<Arc<ClassDescriptor>> {
        self.session.store().descriptor_or_fetch(handle, || {
            let bytes = self
                .request(&Request::DescriptorBytes(handle))?
                .into_descriptor()?;
            ClassDescriptor::parse(&bytes)
        })
    }

    /// Descriptor of `handle` if already cached, without a round trip
    #[must_use]
    pub fn descriptor_if_cached(&self, handle: ClassHandle) -> Option<Arc<ClassDescriptor>> {
        self.session.store().descriptor(handle)
    }

    /// Cross-check a cached flag word against a fresh one under `mask`.
    ///
    /// Does nothing unless the session enables [`crate::SessionConfig::verify_cached_flags`].
    ///
    /// # Errors
    /// Returns [`Error::ConsistencyMismatch`] if the masked values differ, or the transport
    /// error of the extra round trip.
    pub fn verify_flags(&self, handle: ClassHandle, cached: u32, mask: u32) -> Result<()> {
        if !self.session.config().verify_cached_flags {
            return Ok(());
        }

        let authoritative = self.request(&Request::ClassFlags(handle))?.into_flags()? & mask;
        let cached = cached & mask;
        if cached != authoritative {
            warn!(
                class = %handle,
                mask,
                cached,
                authoritative,
                "cached class flags differ from remote flags"
            );
            return Err(Error::ConsistencyMismatch {
                class: handle,
                mask,
                cached,
                authoritative,
            });
        }
        debug!(class = %handle, mask, "cached class flags verified");
        Ok(())
    }
}
