//! Class metadata types shared by both execution modes.
//!
//! # Key Components
//!
//! - [`ClassHandle`] / [`ITableNode`]: opaque identities of classes and interface-table nodes
//! - [`DepthAndFlags`], [`ClassFlags`], [`ClassModifiers`], [`FieldModifiers`]: flag words
//! - [`ClassDescriptor`]: the read-only per-class blob, including its byte encoding
//! - [`FieldDescriptor`] / [`FlattenedField`]: declared fields and the flattened-field table
//! - [`InfoKind`] / [`InfoValue`]: the units in which a remote session fetches and caches

mod descriptor;
mod field;
mod flags;
mod handle;
mod record;

pub use descriptor::{
    ClassDescriptor, ConstantPoolEntry, FieldShape, DESCRIPTOR_MAGIC, DESCRIPTOR_VERSION,
};
pub use field::{FieldDescriptor, FlattenedField};
pub use flags::{
    ClassFlags, ClassModifiers, DepthAndFlags, FieldModifiers, ARRAY_SHAPE_LOG_ELEMENT_SIZE_MASK,
    CLASS_DEPTH_MASK, STACK_ALLOCATION_SPECIAL_MASK,
};
pub use handle::{ClassHandle, ITableNode};
pub use record::{ClassMetadataRecord, InfoKind, InfoValue};
