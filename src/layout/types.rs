//! Flattened type layouts.
//!
//! A [`TypeLayout`] is an ordered list of [`TypeLayoutEntry`] values, one per scalar or
//! reference slot of an instance, with flattened value fields already expanded in place.
//! Layouts are built fresh per enumeration through a [`TypeLayoutBuilder`] and are immutable
//! afterwards.

use std::fmt;

use strum::{AsRefStr, EnumCount, EnumIter};

use crate::metadata::FieldModifiers;

/// Canonical data kind of a layout slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, AsRefStr)]
pub enum DataKind {
    /// 32-bit integer; also used for boolean, byte, char and short fields
    Int32,
    /// 64-bit integer
    Int64,
    /// Single-precision float
    Float32,
    /// Double-precision float
    Float64,
    /// Address-width reference to an object, array or value
    Address,
}

impl DataKind {
    /// Map the first character of a field signature to its data kind.
    ///
    /// Returns `None` for characters that do not start a field signature.
    #[must_use]
    pub fn from_signature(signature: char) -> Option<DataKind> {
        match signature {
            'Z' | 'B' | 'C' | 'S' | 'I' => Some(DataKind::Int32),
            'J' => Some(DataKind::Int64),
            'F' => Some(DataKind::Float32),
            'D' => Some(DataKind::Float64),
            'L' | 'Q' | '[' => Some(DataKind::Address),
            _ => None,
        }
    }

    /// Size of the slot in bytes on a 64-bit target
    #[must_use]
    pub fn size(&self) -> u32 {
        match self {
            DataKind::Int32 | DataKind::Float32 => 4,
            DataKind::Int64 | DataKind::Float64 | DataKind::Address => 8,
        }
    }
}

/// One slot of a flattened type layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeLayoutEntry {
    /// Absolute byte offset from the start of the object, header included
    pub offset: i32,
    /// Canonical data kind
    pub kind: DataKind,
    /// Dotted field path, e.g. `start.x` for field `x` of flattened field `start`
    pub name: String,
    /// The field is volatile
    pub is_volatile: bool,
    /// The field is private
    pub is_private: bool,
    /// The field is final
    pub is_final: bool,
    /// Original field signature, kept for diagnostics
    pub signature: String,
}

impl TypeLayoutEntry {
    /// Create an entry, deriving the qualifier flags from field modifier bits
    #[must_use]
    pub fn new(
        offset: i32,
        kind: DataKind,
        name: String,
        modifiers: FieldModifiers,
        signature: String,
    ) -> Self {
        TypeLayoutEntry {
            offset,
            kind,
            name,
            is_volatile: modifiers.contains(FieldModifiers::VOLATILE),
            is_private: modifiers.contains(FieldModifiers::PRIVATE),
            is_final: modifiers.contains(FieldModifiers::FINAL),
            signature,
        }
    }
}

impl fmt::Display for TypeLayoutEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>6} {:<8} {} ({})",
            self.offset,
            self.kind.as_ref(),
            self.name,
            self.signature
        )
    }
}

/// Ordered flattened layout of a class instance.
///
/// Entries follow declaration order, with the entries of a flattened field inserted where
/// the field is declared. They are not sorted by offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeLayout {
    entries: Vec<TypeLayoutEntry>,
}

impl TypeLayout {
    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for a class without instance fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`
    #[must_use]
    pub fn entry(&self, index: usize) -> Option<&TypeLayoutEntry> {
        self.entries.get(index)
    }

    /// All entries in layout order
    #[must_use]
    pub fn entries(&self) -> &[TypeLayoutEntry] {
        &self.entries
    }

    /// Iterate over the entries in layout order
    pub fn iter(&self) -> std::slice::Iter<'_, TypeLayoutEntry> {
        self.entries.iter()
    }

    /// Entry with the given dotted name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&TypeLayoutEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Entries ordered by ascending offset
    #[must_use]
    pub fn sorted_by_offset(&self) -> Vec<&TypeLayoutEntry> {
        let mut sorted: Vec<&TypeLayoutEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|entry| entry.offset);
        sorted
    }

    /// Consume the layout, returning its entries
    #[must_use]
    pub fn into_entries(self) -> Vec<TypeLayoutEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a TypeLayout {
    type Item = &'a TypeLayoutEntry;
    type IntoIter = std::slice::Iter<'a, TypeLayoutEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Collects entries and seals them into a [`TypeLayout`]
#[derive(Debug, Default)]
pub struct TypeLayoutBuilder {
    entries: Vec<TypeLayoutEntry>,
}

impl TypeLayoutBuilder {
    /// Start an empty layout
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn add(&mut self, entry: TypeLayoutEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    /// Number of entries added so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was added yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seal the layout
    #[must_use]
    pub fn build(self) -> TypeLayout {
        TypeLayout {
            entries: self.entries,
        }
    }
}
