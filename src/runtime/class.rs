use std::sync::Arc;

use crate::metadata::{
    ClassDescriptor, ClassFlags, ClassHandle, DepthAndFlags, FlattenedField, ITableNode,
};

/// A loaded class as the owning process stores it.
///
/// This is the authoritative data every query ultimately derives from. A local compilation
/// reads it directly; a remote one receives projections of it over the stream.
#[derive(Debug)]
pub struct RuntimeClass {
    /// Identity of the class
    pub handle: ClassHandle,
    /// Read-only descriptor
    pub descriptor: Arc<ClassDescriptor>,
    /// Combined depth and flags word
    pub depth_and_flags: u64,
    /// Runtime flags word
    pub class_flags: ClassFlags,
    /// Instance size in bytes, not counting the object header
    pub total_instance_size: u64,
    /// Superclass chain, immediate superclass first and root last
    pub superclasses: Arc<[ClassHandle]>,
    /// First node of the interface table
    pub itable: Option<ITableNode>,
    /// Offsets of the declared fields, parallel to `descriptor.fields`
    pub field_offsets: Vec<u32>,
    /// Flattened-field table
    pub flattened: Arc<[FlattenedField]>,
}

impl RuntimeClass {
    /// Depth of the class in its hierarchy (number of superclasses)
    #[must_use]
    pub fn depth(&self) -> usize {
        DepthAndFlags::depth_of(self.depth_and_flags)
    }

    /// Entry of the flattened-field table with the given name
    #[must_use]
    pub fn flattened_entry(&self, name: &str) -> Option<&FlattenedField> {
        self.flattened.iter().find(|entry| entry.name == name)
    }
}

/// One node of an interface table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ITableEntry {
    /// The interface this node resolves to
    pub interface: ClassHandle,
    /// The following node
    pub next: Option<ITableNode>,
}
