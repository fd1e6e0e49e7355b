use serde::{Deserialize, Serialize};

use crate::metadata::{ClassHandle, FieldModifiers};

/// A declared instance or static field of a loaded class, as seen by the compiler.
///
/// Unlike [`crate::metadata::FieldShape`] this carries the byte offset assigned at load time
/// and whether the field's storage is inlined into its container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Field type signature; its first character selects the data kind
    pub signature: String,
    /// Byte offset within the declaring class, not counting the object header
    pub offset: u32,
    /// Raw modifier bits, see [`FieldModifiers`]
    pub modifiers: u32,
    /// The field's value is stored inline rather than by reference
    pub flattened: bool,
}

impl FieldDescriptor {
    /// Modifier bits as typed flags
    #[must_use]
    pub fn modifiers(&self) -> FieldModifiers {
        FieldModifiers::from_bits_truncate(self.modifiers)
    }

    /// The one-character type signature of this field
    #[must_use]
    pub fn signature_char(&self) -> Option<char> {
        self.signature.chars().next()
    }

    /// Returns `true` for static fields
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers().contains(FieldModifiers::STATIC)
    }
}

/// Entry of a class's flattened-field table.
///
/// Every flattenable field of a class has an entry naming the value class that is (or would
/// be) stored inline and the offset assigned to it. Whether the field is really inlined depends
/// on the flags of that value class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenedField {
    /// Name of the field in the containing class
    pub name: String,
    /// The class of the field's value
    pub class: ClassHandle,
    /// Byte offset within the containing class, not counting the object header
    pub offset: u32,
}
