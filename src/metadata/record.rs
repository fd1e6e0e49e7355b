//! Info kinds and the values cached for them.
//!
//! A remote session caches class metadata per `(ClassHandle, InfoKind)`. Related facts
//! travel together: [`InfoKind::DepthAndFlags`] is one word carrying both the depth and the
//! upper flag bits, so a depth query and a flag query about the same class share one fetch.

use std::sync::Arc;

use strum::{AsRefStr, EnumCount, EnumIter};

use crate::{
    metadata::{ClassHandle, FieldDescriptor, FlattenedField},
    Result,
};

/// Kind of class information that is fetched and cached as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumCount, AsRefStr)]
pub enum InfoKind {
    /// Combined depth and flags word
    DepthAndFlags,
    /// Runtime class flags word
    Flags,
    /// Total instance size in bytes, not counting the object header
    TotalInstanceSize,
    /// Superclass chain, immediate superclass first
    SuperClasses,
    /// Interfaces in interface-table order
    InterfaceTable,
    /// Declared fields with offsets and flatness
    DeclaredFields,
    /// Flattened-field table
    FlattenedFields,
}

/// A cached piece of class information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoValue {
    /// A single machine word
    Word(u64),
    /// An ordered sequence of classes
    Classes(Arc<[ClassHandle]>),
    /// Declared fields
    Fields(Arc<[FieldDescriptor]>),
    /// Flattened-field table
    FlattenedFields(Arc<[FlattenedField]>),
}

impl InfoValue {
    /// Short name of the value shape, used in error messages
    #[must_use]
    pub fn shape_name(&self) -> &'static str {
        match self {
            InfoValue::Word(_) => "word",
            InfoValue::Classes(_) => "class list",
            InfoValue::Fields(_) => "field list",
            InfoValue::FlattenedFields(_) => "flattened field list",
        }
    }

    /// Unwrap a word value.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the value has a different shape.
    pub fn into_word(self) -> Result<u64> {
        match self {
            InfoValue::Word(word) => Ok(word),
            other => Err(malformed_error!("Expected a word, found a {}", other.shape_name())),
        }
    }

    /// Unwrap a class list value.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the value has a different shape.
    pub fn into_classes(self) -> Result<Arc<[ClassHandle]>> {
        match self {
            InfoValue::Classes(classes) => Ok(classes),
            other => Err(malformed_error!(
                "Expected a class list, found a {}",
                other.shape_name()
            )),
        }
    }

    /// Unwrap a field list value.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the value has a different shape.
    pub fn into_fields(self) -> Result<Arc<[FieldDescriptor]>> {
        match self {
            InfoValue::Fields(fields) => Ok(fields),
            other => Err(malformed_error!(
                "Expected a field list, found a {}",
                other.shape_name()
            )),
        }
    }

    /// Unwrap a flattened-field table value.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the value has a different shape.
    pub fn into_flattened_fields(self) -> Result<Arc<[FlattenedField]>> {
        match self {
            InfoValue::FlattenedFields(fields) => Ok(fields),
            other => Err(malformed_error!(
                "Expected a flattened field list, found a {}",
                other.shape_name()
            )),
        }
    }
}

/// Snapshot of everything a session has cached about one class.
///
/// Each part is `None` until it has been fetched. Once present, a part never changes for the
/// rest of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMetadataRecord {
    /// Combined depth and flags word
    pub depth_and_flags: Option<u64>,
    /// Runtime class flags word
    pub class_flags: Option<u32>,
    /// Total instance size in bytes
    pub total_instance_size: Option<u64>,
    /// Superclass chain, immediate superclass first
    pub superclasses: Option<Arc<[ClassHandle]>>,
    /// Interfaces in interface-table order
    pub interfaces: Option<Arc<[ClassHandle]>>,
    /// Descriptor bytes have been fetched and decoded
    pub has_descriptor: bool,
}
