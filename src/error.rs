use thiserror::Error;

use crate::metadata::{ClassHandle, ITableNode};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// Coarse classification of an [`Error`].
///
/// Callers use this to tell a bug in the compiler (or in the cache) apart from an
/// unavailable peer. Neither is recoverable by the compilation request itself; both abort it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A violated precondition or invariant. The compilation must be aborted and the bug fixed.
    ProgrammerError,
    /// The RPC stream failed or answered with something unexpected.
    Transport,
    /// Descriptor bytes or other encoded data could not be decoded.
    Malformed,
}

/// The generic Error type, which covers every failure this library can report.
///
/// A cache miss is **not** represented here: a miss triggers a fetch and is part of the
/// normal control flow. Everything in this enum aborts the enclosing compilation.
///
/// # Error Categories
///
/// ## Programmer errors
/// - [`Error::UnknownClass`] - The handle does not denote a loaded class
/// - [`Error::UnknownITableNode`] - The interface-table node does not exist
/// - [`Error::FieldNotFound`] - A field name assumed to exist is missing
/// - [`Error::ConsistencyMismatch`] - Cached and authoritative flags disagree
/// - [`Error::NotAnArray`] - An array-only query was issued against a non-array class
/// - [`Error::SuperclassIndexOutOfRange`] - Superclass index beyond the class depth
/// - [`Error::ConstantPoolIndex`] / [`Error::ConstantPoolKind`] - Bad constant-pool access
/// - [`Error::RecursionLimit`] - Field flattening nested deeper than allowed
///
/// ## Transport errors
/// - [`Error::Transport`], [`Error::Io`], [`Error::Codec`], [`Error::UnexpectedResponse`],
///   [`Error::LockError`]
///
/// ## Malformed data
/// - [`Error::Malformed`], [`Error::OutOfBounds`]
///
/// # Examples
///
/// ```rust
/// use classenv::{ClassEnv, ClassBuilder, ClassTable, Error, ErrorCategory};
/// use std::sync::Arc;
///
/// let table = Arc::new(ClassTable::new());
/// let point = ClassBuilder::new("demo/Point").build(&table)?;
/// let env = ClassEnv::local(table);
///
/// match env.array_element_width(point) {
///     Err(e @ Error::NotAnArray(_)) => assert_eq!(e.category(), ErrorCategory::ProgrammerError),
///     other => panic!("unexpected {:?}", other),
/// }
/// # Ok::<(), classenv::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The data is damaged and could not be decoded.
    ///
    /// The error includes the source location where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while decoding bytes.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The handle does not denote a class that is currently loaded.
    #[error("Class {0} is not loaded")]
    UnknownClass(ClassHandle),

    /// The interface-table node does not exist.
    #[error("Interface table node {0} does not exist")]
    UnknownITableNode(ITableNode),

    /// A named field is missing from the class it was assumed to belong to.
    #[error("Field '{name}' doesn't exist in given class {class}")]
    FieldNotFound {
        /// The class that was searched
        class: ClassHandle,
        /// The field name that was looked up
        name: String,
    },

    /// A cached flag word disagrees with the authoritative value fetched from the peer.
    ///
    /// Only produced when [`crate::SessionConfig::verify_cached_flags`] is enabled.
    #[error("Cached class flags of {class} differ from remote flags under mask 0x{mask:08x}: cached 0x{cached:08x}, remote 0x{authoritative:08x}")]
    ConsistencyMismatch {
        /// The class whose flags were checked
        class: ClassHandle,
        /// Mask applied to both values before comparing
        mask: u32,
        /// Masked cached value
        cached: u32,
        /// Masked freshly fetched value
        authoritative: u32,
    },

    /// An array-only query was issued against a class that is not an array.
    #[error("Class {0} must be an array")]
    NotAnArray(ClassHandle),

    /// A superclass index at or beyond the class depth was requested.
    #[error("Superclass index {index} out of range for class {class} with depth {depth}")]
    SuperclassIndexOutOfRange {
        /// The class whose chain was indexed
        class: ClassHandle,
        /// The requested index
        index: usize,
        /// The depth of the class
        depth: usize,
    },

    /// A constant-pool index beyond the end of the pool was requested.
    #[error("Constant pool index {index} out of range for class {class}")]
    ConstantPoolIndex {
        /// The class whose constant pool was indexed
        class: ClassHandle,
        /// The requested index
        index: u32,
    },

    /// A constant-pool entry was of a different kind than the caller required.
    #[error("Constant pool entry {index} of class {class} is not a {expected}")]
    ConstantPoolKind {
        /// The class whose constant pool was indexed
        class: ClassHandle,
        /// The requested index
        index: u32,
        /// The entry kind that was required
        expected: &'static str,
    },

    /// Recursion limit reached.
    ///
    /// Flattened fields nest deeper than [`crate::SessionConfig::max_flattening_depth`].
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// The remote peer reported a failure or the stream is unusable.
    #[error("Transport failure - {0}")]
    Transport(String),

    /// I/O error on the underlying stream.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be encoded or decoded.
    #[error("{0}")]
    Codec(#[from] bincode::Error),

    /// The peer answered with a response that does not belong to the request.
    #[error("Unexpected response - expected {expected}, got {got}")]
    UnexpectedResponse {
        /// The response kind the request calls for
        expected: &'static str,
        /// The response kind that arrived
        got: &'static str,
    },

    /// Failed to lock target.
    ///
    /// The stream mutex of a worker was poisoned by a panicking thread.
    #[error("Failed to lock target")]
    LockError,
}

impl Error {
    /// Returns the [`ErrorCategory`] this error belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Malformed { .. } | Error::OutOfBounds => ErrorCategory::Malformed,
            Error::Transport(_)
            | Error::Io(_)
            | Error::Codec(_)
            | Error::UnexpectedResponse { .. }
            | Error::LockError => ErrorCategory::Transport,
            Error::UnknownClass(_)
            | Error::UnknownITableNode(_)
            | Error::FieldNotFound { .. }
            | Error::ConsistencyMismatch { .. }
            | Error::NotAnArray(_)
            | Error::SuperclassIndexOutOfRange { .. }
            | Error::ConstantPoolIndex { .. }
            | Error::ConstantPoolKind { .. }
            | Error::RecursionLimit(_) => ErrorCategory::ProgrammerError,
        }
    }

    /// Returns `true` if this error signals a bug rather than an unavailable peer.
    #[must_use]
    pub fn is_programmer_error(&self) -> bool {
        self.category() == ErrorCategory::ProgrammerError
    }
}
