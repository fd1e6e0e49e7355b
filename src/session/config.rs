//! Session configuration
//!
//! Options that stay fixed for the lifetime of one compilation session.

/// Configuration of one compilation session's metadata view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Re-fetch the authoritative flag word after answering a flag query from the cache and
    /// fail with [`crate::Error::ConsistencyMismatch`] if the masked bits differ.
    /// Costs one extra round trip per checked query (default: on in debug builds)
    pub verify_cached_flags: bool,

    /// Size of the object header in bytes, added to every field-layout offset (default: 8)
    pub object_header_size: i32,

    /// Maximum nesting depth of flattened fields during layout enumeration (default: 64)
    pub max_flattening_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verify_cached_flags: cfg!(debug_assertions),
            object_header_size: 8,
            max_flattening_depth: 64,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration for production workers
    ///
    /// Cached values are trusted without cross-checking, so every cache hit costs zero round
    /// trips.
    #[must_use]
    pub fn production() -> Self {
        Self {
            verify_cached_flags: false,
            ..Self::default()
        }
    }

    /// Creates a configuration that cross-checks cached flag words against the owning process
    #[must_use]
    pub fn verification() -> Self {
        Self {
            verify_cached_flags: true,
            ..Self::default()
        }
    }

    /// Replace the object header size
    #[must_use]
    pub fn with_object_header_size(mut self, size: i32) -> Self {
        self.object_header_size = size;
        self
    }

    /// Replace the flattening depth bound
    #[must_use]
    pub fn with_max_flattening_depth(mut self, depth: usize) -> Self {
        self.max_flattening_depth = depth;
        self
    }
}
