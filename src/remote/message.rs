//! Request/response catalog exchanged between a compilation worker and the owning process.
//!
//! Every request is answered by exactly one response in one round trip. Related facts are
//! batched into one message where callers usually need them together: the depth travels
//! inside the combined depth+flags word, and [`Request::InterfaceTable`] returns a whole
//! interface table at once.

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    metadata::{ClassHandle, FieldDescriptor, FlattenedField, ITableNode},
    Error, Result,
};

/// A request sent by a compilation worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
pub enum Request {
    /// Raw runtime flag word
    ClassFlags(ClassHandle),
    /// Combined depth and flags word
    DepthAndFlags(ClassHandle),
    /// Instance size in bytes, not counting the object header
    TotalInstanceSize(ClassHandle),
    /// Whole superclass chain, immediate superclass first
    SuperClasses(ClassHandle),
    /// One element of the superclass chain
    IndexedSuperClass(ClassHandle, u32),
    /// First interface-table node of a class
    InterfaceTableHead(ClassHandle),
    /// Node following the given node
    InterfaceTableNext(ITableNode),
    /// Interface a node resolves to
    InterfaceTableInterface(ITableNode),
    /// Descriptor bytes of the interface a node resolves to
    InterfaceTableInterfaceDescriptor(ITableNode),
    /// Whole interface table of a class in node order
    InterfaceTable(ClassHandle),
    /// Encoded read-only descriptor of a class
    DescriptorBytes(ClassHandle),
    /// Declared fields with offsets and flatness
    DeclaredFields(ClassHandle),
    /// Flattened-field table of a class
    FlattenedFields(ClassHandle),
}

/// A response sent by the owning process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
pub enum Response {
    /// A 32-bit flag word
    Flags(u32),
    /// A 64-bit word (depth+flags, sizes)
    Word(u64),
    /// A single class
    Class(ClassHandle),
    /// An ordered list of classes
    Classes(Vec<ClassHandle>),
    /// An optional interface-table node; `None` ends the chain
    Node(Option<ITableNode>),
    /// Encoded descriptor bytes
    Descriptor(Vec<u8>),
    /// Declared fields
    Fields(Vec<FieldDescriptor>),
    /// Flattened-field table
    FlattenedFields(Vec<FlattenedField>),
    /// The requested class is not loaded in the owning process
    UnknownClass(ClassHandle),
    /// The requested interface-table node does not exist
    UnknownNode(ITableNode),
    /// A superclass index at or beyond the depth of the class
    SuperclassIndexOutOfRange {
        /// Class whose chain was indexed
        class: ClassHandle,
        /// Requested index
        index: usize,
        /// Depth of the class
        depth: usize,
    },
    /// The request failed on the owning side for another reason
    Error(String),
}

impl Request {
    /// Name of the request variant
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

macro_rules! expect_response {
    ($name:ident, $variant:ident, $ty:ty) => {
        #[doc = concat!("Unwrap a `", stringify!($variant), "` response.")]
        ///
        /// # Errors
        /// Returns the error the peer reported, and [`Error::UnexpectedResponse`] for any
        /// other response kind.
        pub fn $name(self) -> Result<$ty> {
            match self {
                Response::$variant(value) => Ok(value),
                Response::UnknownClass(class) => Err(Error::UnknownClass(class)),
                Response::UnknownNode(node) => Err(Error::UnknownITableNode(node)),
                Response::SuperclassIndexOutOfRange {
                    class,
                    index,
                    depth,
                } => Err(Error::SuperclassIndexOutOfRange {
                    class,
                    index,
                    depth,
                }),
                Response::Error(message) => Err(Error::Transport(message)),
                other => Err(Error::UnexpectedResponse {
                    expected: stringify!($variant),
                    got: other.kind(),
                }),
            }
        }
    };
}

impl Response {
    /// Name of the response variant
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    expect_response!(into_flags, Flags, u32);
    expect_response!(into_word, Word, u64);
    expect_response!(into_class, Class, ClassHandle);
    expect_response!(into_classes, Classes, Vec<ClassHandle>);
    expect_response!(into_node, Node, Option<ITableNode>);
    expect_response!(into_descriptor, Descriptor, Vec<u8>);
    expect_response!(into_fields, Fields, Vec<FieldDescriptor>);
    expect_response!(into_flattened_fields, FlattenedFields, Vec<FlattenedField>);
}

/// Encode a message into a bincode payload.
///
/// # Errors
/// Returns [`Error::Codec`] if serialization fails.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(message)?)
}

/// Decode a message from a bincode payload.
///
/// # Errors
/// Returns [`Error::Codec`] if the payload is not a valid message.
pub fn decode<'a, T: Deserialize<'a>>(payload: &'a [u8]) -> Result<T> {
    Ok(bincode::deserialize(payload)?)
}
