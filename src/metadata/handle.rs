use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// An opaque, fixed-width identifier of a loaded class.
///
/// The value is assigned by the process that owns the class (typically the address of its
/// class structure) and stays stable for as long as the class is loaded.
/// Equality is identity: two handles are equal exactly when they denote the same class,
/// regardless of whether the two classes have the same shape.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassHandle(pub u64);

impl ClassHandle {
    /// Creates a new handle from a raw 64-bit value
    #[must_use]
    pub fn new(value: u64) -> Self {
        ClassHandle(value)
    }

    /// Returns the raw handle value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns true if this is a null handle (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for ClassHandle {
    fn from(value: u64) -> Self {
        ClassHandle(value)
    }
}

impl From<ClassHandle> for u64 {
    fn from(handle: ClassHandle) -> Self {
        handle.0
    }
}

impl fmt::Debug for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassHandle(0x{:x})", self.0)
    }
}

impl fmt::Display for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl Hash for ClassHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// A node of a class's interface table.
///
/// Nodes form a singly linked sequence per class. A node is only meaningful to the process
/// that owns the class; a remote worker treats it as an opaque cursor and asks the owner what
/// it resolves to and which node follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ITableNode(pub u32);

impl ITableNode {
    /// Returns the raw node index
    #[must_use]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ITableNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
