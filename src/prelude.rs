//! # classenv Prelude
//!
//! Commonly used types for building class tables and querying them in either execution
//! mode. Import with `use classenv::prelude::*;`.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all classenv operations
pub use crate::Error;

/// Coarse classification of errors
pub use crate::ErrorCategory;

/// The result type used throughout classenv
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The class metadata accessor
pub use crate::ClassEnv;

/// Session state and configuration
pub use crate::session::{ClientSession, SessionConfig};

// ================================================================================================
// Class Data
// ================================================================================================

/// Authoritative class registry and its builder
pub use crate::runtime::{ClassBuilder, ClassTable};

/// Handles, flags and descriptors
pub use crate::metadata::{
    ClassDescriptor, ClassFlags, ClassHandle, ClassModifiers, ConstantPoolEntry, DepthAndFlags,
    FieldDescriptor, FieldModifiers, FlattenedField, ITableNode,
};

// ================================================================================================
// Remote Mode
// ================================================================================================

/// Streams and the owning-side server
pub use crate::remote::{FramedStream, LoopbackStream, MetadataServer, Stream, StreamStats};

// ================================================================================================
// Layouts
// ================================================================================================

/// Flattened type layouts
pub use crate::layout::{DataKind, TypeLayout, TypeLayoutEntry};
