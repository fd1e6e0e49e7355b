// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # classenv
//!
//! Class metadata access for a just-in-time compiler that runs either inside the managed
//! runtime it compiles for, or as a separate compilation worker talking to that runtime over
//! a stream.
//!
//! Every part of the compiler asks for class-level facts (flags, depth, instance size,
//! superclass chains, interface tables, field layouts) through one [`ClassEnv`]. Whether the
//! answer is read from local memory or fetched from the owning process is decided once per
//! session; the results are identical in both modes.
//!
//! ## Features
//!
//! - **Single query surface** - [`ClassEnv`] over a local or remote [`access::ClassAccess`] strategy
//! - **Per-session caching** - each `(class, kind)` is fetched at most once per [`ClientSession`]
//! - **Batched fetches** - depth travels with the flags, interface tables in one round trip
//! - **Consistency checking** - optional cross-check of cached flags against the owner
//! - **Flattened layouts** - offset-ordered field layouts with inline value fields expanded
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use classenv::prelude::*;
//!
//! let table = Arc::new(ClassTable::new());
//! let object = ClassBuilder::new("java/lang/Object").build(&table)?;
//! let point = ClassBuilder::new("demo/Point")
//!     .extends(object)
//!     .field("x", "I", 0, FieldModifiers::PRIVATE)
//!     .field("y", "I", 4, FieldModifiers::PRIVATE)
//!     .build(&table)?;
//!
//! // A worker in another process would use a FramedStream instead
//! let session = ClientSession::new(SessionConfig::production());
//! let env = ClassEnv::remote(session, LoopbackStream::new(MetadataServer::new(table)));
//!
//! assert_eq!(env.class_depth(point)?, 1);
//! assert_eq!(env.class_instance_size(point)?, 8);
//! assert_eq!(env.enumerate_fields(point)?.len(), 2);
//! # Ok::<(), classenv::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - handles, flag words, descriptors and the info kinds cached per session
//! - [`runtime`] - the authoritative class data of the owning process
//! - [`session`] - session configuration and the metadata record store
//! - [`remote`] - request/response catalog, streams, the owning-side server and the fetcher
//! - [`access`] - local and remote lookup strategies
//! - [`layout`] - flattened type layouts
//! - [`codec`] - little-endian byte decoding used for descriptor bytes
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]. [`Error::category`] tells programmer errors
//! (violated preconditions, cache divergence) apart from transport failures and damaged data.
//! A cache miss is never an error.

#[macro_use]
pub(crate) mod error;

mod classenv;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use classenv::prelude::*;
///
/// let table = std::sync::Arc::new(ClassTable::new());
/// let env = ClassEnv::local(table);
/// assert!(!env.is_remote());
/// ```
pub mod prelude;

/// Little-endian byte decoding and encoding helpers
pub mod codec;

/// Class metadata types shared by the owning process and compilation workers
pub mod metadata;

/// Authoritative class data owned by the runtime process
pub mod runtime;

/// Compilation sessions and their metadata record store
pub mod session;

/// Remote fetch protocol
pub mod remote;

/// Local and remote lookup strategies
pub mod access;

/// Flattened type layouts
pub mod layout;

/// `classenv` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

pub use self::classenv::ClassEnv;
pub use error::{Error, ErrorCategory};
pub use metadata::{
    ClassDescriptor, ClassFlags, ClassHandle, ClassModifiers, DepthAndFlags, FieldModifiers,
    ITableNode,
};
pub use runtime::{ClassBuilder, ClassTable};
pub use session::{ClientSession, SessionConfig};
