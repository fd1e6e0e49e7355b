//! Registry of loaded classes owned by the runtime process.
//!
//! [`ClassTable`] is what a co-located compiler reads directly and what a
//! [`crate::remote::MetadataServer`] projects over the stream for a remote worker.
//!
//! # Thread Safety
//!
//! Classes live in a lock-free `SkipMap` keyed by handle and interface-table nodes in an
//! append-only `boxcar::Vec`, so classes can be loaded while compilations read. A loaded class
//! is never mutated or removed.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crossbeam_skiplist::SkipMap;

use crate::{
    metadata::{ClassFlags, ClassHandle, FieldDescriptor, ITableNode},
    runtime::{ITableEntry, RuntimeClass},
    Error, Result,
};

/// First handle value handed out by [`ClassTable::allocate_handle`]
const FIRST_HANDLE: u64 = 0x1000;
/// Distance between consecutive handles
const HANDLE_STRIDE: u64 = 0x100;

/// Registry of all classes loaded in the owning process.
pub struct ClassTable {
    classes: SkipMap<ClassHandle, Arc<RuntimeClass>>,
    itable_nodes: boxcar::Vec<ITableEntry>,
    next_handle: AtomicU64,
}

impl ClassTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        ClassTable {
            classes: SkipMap::new(),
            itable_nodes: boxcar::Vec::new(),
            next_handle: AtomicU64::new(FIRST_HANDLE),
        }
    }

    /// Reserve a fresh, never reused class handle
    pub fn allocate_handle(&self) -> ClassHandle {
        ClassHandle(self.next_handle.fetch_add(HANDLE_STRIDE, Ordering::Relaxed))
    }

    /// Register a loaded class.
    ///
    /// A handle is registered at most once; a second registration of the same handle is
    /// rejected so that a loaded class never changes shape.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the handle is already registered.
    pub fn insert(&self, class: RuntimeClass) -> Result<ClassHandle> {
        let handle = class.handle;
        if self.classes.contains_key(&handle) {
            return Err(malformed_error!("Class {} is already loaded", handle));
        }
        self.classes.insert(handle, Arc::new(class));
        Ok(handle)
    }

    /// Append an interface-table node and return its identity
    pub fn push_itable_node(&self, entry: ITableEntry) -> Result<ITableNode> {
        let index = self.itable_nodes.push(entry);
        u32::try_from(index)
            .map(ITableNode)
            .map_err(|_| malformed_error!("Interface table node arena is full"))
    }

    /// Look up a loaded class.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] if `handle` is not loaded.
    pub fn get(&self, handle: ClassHandle) -> Result<Arc<RuntimeClass>> {
        self.classes
            .get(&handle)
            .map(|entry| entry.value().clone())
            .ok_or(Error::UnknownClass(handle))
    }

    /// Returns `true` if `handle` denotes a loaded class
    #[must_use]
    pub fn contains(&self, handle: ClassHandle) -> bool {
        self.classes.contains_key(&handle)
    }

    /// Number of loaded classes
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no class is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Handles of all loaded classes, in handle order
    #[must_use]
    pub fn handles(&self) -> Vec<ClassHandle> {
        self.classes.iter().map(|entry| *entry.key()).collect()
    }

    /// Look up an interface-table node.
    ///
    /// # Errors
    /// Returns [`Error::UnknownITableNode`] if the node does not exist.
    pub fn itable_entry(&self, node: ITableNode) -> Result<ITableEntry> {
        self.itable_nodes
            .get(node.index())
            .copied()
            .ok_or(Error::UnknownITableNode(node))
    }

    /// Interfaces of a class, following the interface-table chain node by node.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] or [`Error::UnknownITableNode`] for dangling references.
    pub fn interface_table(&self, handle: ClassHandle) -> Result<Vec<ClassHandle>> {
        let class = self.get(handle)?;
        let mut interfaces = Vec::with_capacity(usize::from(class.descriptor.interface_count));
        let mut cursor = class.itable;
        while let Some(node) = cursor {
            let entry = self.itable_entry(node)?;
            interfaces.push(entry.interface);
            cursor = entry.next;
        }
        Ok(interfaces)
    }

    /// Declared fields of a class with their offsets and flatness.
    ///
    /// A field is flat when the class has a flattened-field entry of the same name and the
    /// entry's value class is flagged [`ClassFlags::IS_FLATTENED`].
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] if the class or a flattened value class is not loaded.
    pub fn declared_fields(&self, handle: ClassHandle) -> Result<Vec<FieldDescriptor>> {
        let class = self.get(handle)?;
        if class.field_offsets.len() != class.descriptor.fields.len() {
            return Err(malformed_error!(
                "Class {} has {} field offsets for {} fields",
                handle,
                class.field_offsets.len(),
                class.descriptor.fields.len()
            ));
        }

        let mut fields = Vec::with_capacity(class.descriptor.fields.len());
        for (shape, offset) in class.descriptor.fields.iter().zip(&class.field_offsets) {
            let flattened = match class.flattened_entry(&shape.name) {
                Some(entry) => self
                    .get(entry.class)?
                    .class_flags
                    .contains(ClassFlags::IS_FLATTENED),
                None => false,
            };
            fields.push(FieldDescriptor {
                name: shape.name.clone(),
                signature: shape.signature.clone(),
                offset: *offset,
                modifiers: shape.modifiers.bits(),
                flattened,
            });
        }
        Ok(fields)
    }
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::new()
    }
}
