//! Flag words of loaded classes, class descriptors and fields.
//!
//! This module defines the bit layouts the accessor masks when it answers flag-derived
//! queries, together with helpers that split a raw word into its parts.
//!
//! # Key Types
//! - [`DepthAndFlags`]: upper bits of the combined depth+flags word (low bits carry the depth)
//! - [`ClassFlags`]: the runtime flag word of a loaded class
//! - [`ClassModifiers`]: modifier bits of a read-only class descriptor
//! - [`FieldModifiers`]: modifier bits of a declared field

use bitflags::bitflags;

/// Bitmask for extracting the class depth from a combined depth+flags word
pub const CLASS_DEPTH_MASK: u64 = 0x000F_FFFF;

/// Bitmask for extracting the log2 element size from an array-shape word
pub const ARRAY_SHAPE_LOG_ELEMENT_SIZE_MASK: u32 = 0x0000_FFFF;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Flags stored next to the depth in the combined depth+flags word
    pub struct DepthAndFlags: u64 {
        /// Instances are weak references
        const REFERENCE_WEAK = 0x0010_0000;
        /// Instances are soft references
        const REFERENCE_SOFT = 0x0020_0000;
        /// Instances must be finalized before their storage is reclaimed
        const FINALIZE_NEEDED = 0x0040_0000;
        /// Instances are ownable synchronizers tracked by the collector
        const OWNABLE_SYNCHRONIZER = 0x0080_0000;
    }
}

/// Flags that prevent instances of a class from being allocated on the stack
pub const STACK_ALLOCATION_SPECIAL_MASK: u64 = DepthAndFlags::REFERENCE_WEAK.bits()
    | DepthAndFlags::REFERENCE_SOFT.bits()
    | DepthAndFlags::FINALIZE_NEEDED.bits()
    | DepthAndFlags::OWNABLE_SYNCHRONIZER.bits();

impl DepthAndFlags {
    /// Extract the depth from a raw combined word
    #[must_use]
    pub fn depth_of(word: u64) -> usize {
        (word & CLASS_DEPTH_MASK) as usize
    }

    /// Extract the flag part from a raw combined word
    #[must_use]
    pub fn from_word(word: u64) -> Self {
        Self::from_bits_truncate(word & !CLASS_DEPTH_MASK)
    }

    /// Combine a depth and a set of flags into one word
    #[must_use]
    pub fn to_word(self, depth: usize) -> u64 {
        (depth as u64 & CLASS_DEPTH_MASK) | self.bits()
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Runtime flag word of a loaded class
    pub struct ClassFlags: u32 {
        /// A static final field of the class was modified illegally after initialization
        const HAS_ILLEGAL_FINAL_FIELD_MODIFICATIONS = 0x0002;
        /// New instances start with a reservable lock word
        const RESERVABLE_LOCK_WORD_INIT = 0x0020;
        /// The class is a value type
        const IS_VALUE_TYPE = 0x0100;
        /// Fields of this value type are stored inline in their containers
        const IS_FLATTENED = 0x0200;
        /// Some flattenable fields of the class are stored by reference
        const CONTAINS_UNFLATTENED_FLATTENABLES = 0x0400;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Modifier bits of a read-only class descriptor
    pub struct ClassModifiers: u32 {
        /// Accessible from outside its package
        const PUBLIC = 0x0001;
        /// No subclasses allowed
        const FINAL = 0x0010;
        /// Treat superclass methods specially when invoked
        const SUPER = 0x0020;
        /// Is an interface, not a class
        const INTERFACE = 0x0200;
        /// Must not be instantiated
        const ABSTRACT = 0x0400;
        /// Not present in the source code
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface
        const ANNOTATION = 0x2000;
        /// Declared as an enum class
        const ENUM = 0x4000;
        /// Describes an array class
        const ARRAY = 0x0001_0000;
        /// Describes a primitive type such as `int`
        const PRIMITIVE_TYPE = 0x0002_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Modifier bits of a declared field
    pub struct FieldModifiers: u32 {
        /// Accessible from outside its package
        const PUBLIC = 0x0001;
        /// Accessible only within the defining class
        const PRIVATE = 0x0002;
        /// Accessible within subclasses
        const PROTECTED = 0x0004;
        /// One value per class, not per instance
        const STATIC = 0x0008;
        /// Never assigned after object construction
        const FINAL = 0x0010;
        /// Cannot be cached
        const VOLATILE = 0x0040;
        /// Not written by the default serializer
        const TRANSIENT = 0x0080;
        /// Not present in the source code
        const SYNTHETIC = 0x1000;
        /// An element of an enum class
        const ENUM = 0x4000;
    }
}
