//! Mode-selection strategy for class metadata access.
//!
//! A compilation either runs inside the process that owns the classes and reads them
//! directly ([`LocalAccess`]), or runs in a separate worker and asks the owner over a stream
//! ([`RemoteAccess`]). The choice is made once, when the [`crate::ClassEnv`] of a session is
//! created; every query afterwards goes through the [`ClassAccess`] trait without further
//! branching on the mode.
//!
//! Both implementations return raw facts. Masking, bounds checks and composite queries live
//! in [`crate::ClassEnv`], so they are shared by both modes.

mod local;
mod remote;

pub use local::LocalAccess;
pub use remote::RemoteAccess;

use std::sync::Arc;

use crate::{
    metadata::{ClassDescriptor, ClassHandle, FieldDescriptor, FlattenedField, ITableNode},
    Result,
};

/// Raw class metadata lookups, implemented once per execution mode
pub trait ClassAccess: Send + Sync {
    /// Returns `true` if answers come from another process
    fn is_remote(&self) -> bool;

    /// Combined depth and flags word
    fn depth_and_flags(&self, class: ClassHandle) -> Result<u64>;

    /// Runtime flag word; cached per session in remote mode
    fn class_flags(&self, class: ClassHandle) -> Result<u32>;

    /// Runtime flag word read from the owner on every call
    fn authoritative_class_flags(&self, class: ClassHandle) -> Result<u32>;

    /// Check a flag word obtained from [`ClassAccess::class_flags`] against the owner's
    /// current value under `mask`. A no-op where there is no cache to diverge.
    fn verify_class_flags(&self, class: ClassHandle, cached: u32, mask: u32) -> Result<()>;

    /// Instance size in bytes, not counting the object header
    fn total_instance_size(&self, class: ClassHandle) -> Result<u64>;

    /// Superclass chain, immediate superclass first and root last
    fn superclasses(&self, class: ClassHandle) -> Result<Arc<[ClassHandle]>>;

    /// Element `index` of the superclass chain; the caller guarantees `index < depth`
    fn indexed_superclass(&self, class: ClassHandle, index: usize) -> Result<ClassHandle>;

    /// Read-only descriptor
    fn descriptor(&self, class: ClassHandle) -> Result<Arc<ClassDescriptor>>;

    /// Read-only descriptor if it can be produced without a round trip
    fn descriptor_if_cached(&self, class: ClassHandle) -> Option<Arc<ClassDescriptor>>;

    /// First interface-table node, `None` for an empty table
    fn itable_head(&self, class: ClassHandle) -> Result<Option<ITableNode>>;

    /// Node following `node`, `None` at the end of the table
    fn itable_next(&self, node: ITableNode) -> Result<Option<ITableNode>>;

    /// Interface `node` resolves to
    fn itable_interface(&self, node: ITableNode) -> Result<ClassHandle>;

    /// Read-only descriptor of the interface `node` resolves to
    fn itable_descriptor(&self, node: ITableNode) -> Result<Arc<ClassDescriptor>>;

    /// Whole interface table in node order
    fn interface_table(&self, class: ClassHandle) -> Result<Arc<[ClassHandle]>>;

    /// Declared fields with offsets and flatness, in declaration order
    fn declared_fields(&self, class: ClassHandle) -> Result<Arc<[FieldDescriptor]>>;

    /// Flattened-field table
    fn flattened_fields(&self, class: ClassHandle) -> Result<Arc<[FlattenedField]>>;
}
