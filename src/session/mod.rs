//! Compilation sessions.
//!
//! A [`ClientSession`] is the scope within which remotely fetched class metadata stays valid.
//! Class shape cannot change while the session lives, so its [`MetadataStore`] is filled lazily
//! and never invalidated. Several worker threads may share one session through an `Arc`.

mod config;
mod store;

pub use config::SessionConfig;
pub use store::MetadataStore;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Per-session state shared by all workers compiling against the same remote client
#[derive(Debug)]
pub struct ClientSession {
    id: u64,
    config: SessionConfig,
    store: MetadataStore,
}

impl ClientSession {
    /// Start a new session with an empty store
    #[must_use]
    pub fn new(config: SessionConfig) -> Arc<Self> {
        Arc::new(ClientSession {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            config,
            store: MetadataStore::new(),
        })
    }

    /// Process-unique id of the session, used in log output
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Configuration fixed at session start
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The session's metadata record store
    #[must_use]
    pub fn store(&self) -> &MetadataStore {
        &self.store
    }
}
