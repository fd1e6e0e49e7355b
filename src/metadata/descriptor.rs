//! Read-only class descriptors and their byte encoding.
//!
//! A [`ClassDescriptor`] is the immutable per-class blob that describes the shape of a class:
//! its name, modifiers, constant pool and declared field shapes. It is loaded once per class
//! and never changes afterwards.
//!
//! A process that owns the class can hand out references to its descriptor directly. A remote
//! compilation worker cannot address that memory, so it fetches the raw descriptor bytes
//! (see [`ClassDescriptor::to_bytes`]) once per class and session, decodes them with
//! [`ClassDescriptor::parse`] and answers every later descriptor query from the decoded copy.
//!
//! # Byte Format
//!
//! All integers are little-endian. `bytes` is a `u16` length followed by the payload.
//!
//! ```text
//! u32 magic 0x4353_4443, u16 version
//! bytes name
//! u32 modifiers, u32 array_shape, u16 interface_count
//! u16 cp_count, cp_count x (u8 tag, payload)
//! u16 field_count, field_count x (bytes name, bytes signature, u32 modifiers)
//! ```

use crate::{
    codec::{write_le, Parser},
    metadata::{ClassModifiers, FieldModifiers, ARRAY_SHAPE_LOG_ELEMENT_SIZE_MASK},
    Result,
};

/// Magic value at the start of encoded descriptor bytes ("CDSC")
pub const DESCRIPTOR_MAGIC: u32 = 0x4353_4443;
/// Current version of the descriptor byte format
pub const DESCRIPTOR_VERSION: u16 = 1;

const TAG_UNUSED: u8 = 0;
const TAG_CLASS_REF: u8 = 1;
const TAG_FIELD_REF: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_UTF8: u8 = 4;

/// One entry of a descriptor's constant pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantPoolEntry {
    /// Placeholder slot (index 0, and the second slot of wide constants)
    Unused,
    /// Reference to a class by name
    ClassRef {
        /// Slash-separated class name
        name: Vec<u8>,
    },
    /// Reference to a field of some class
    FieldRef {
        /// Index of the [`ConstantPoolEntry::ClassRef`] naming the declaring class
        class_ref_index: u16,
        /// Field name
        name: Vec<u8>,
        /// Field type signature
        signature: Vec<u8>,
    },
    /// 32-bit integer constant
    Int(i32),
    /// UTF-8 string constant
    Utf8(Vec<u8>),
}

impl ConstantPoolEntry {
    /// Short name of the entry kind, used in error messages
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConstantPoolEntry::Unused => "unused slot",
            ConstantPoolEntry::ClassRef { .. } => "class reference",
            ConstantPoolEntry::FieldRef { .. } => "field reference",
            ConstantPoolEntry::Int(_) => "int constant",
            ConstantPoolEntry::Utf8(_) => "utf8 constant",
        }
    }
}

/// Shape of a declared field as recorded in the read-only descriptor.
///
/// Offsets are not part of the descriptor; they are assigned when the class is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    /// Field name
    pub name: String,
    /// Field type signature, e.g. `I`, `Ljava/lang/String;` or `QPoint;`
    pub signature: String,
    /// Modifier bits
    pub modifiers: FieldModifiers,
}

/// Immutable per-class metadata blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    /// Slash-separated class name; array classes use their signature, e.g. `[I`
    pub name: String,
    /// Modifier bits
    pub modifiers: ClassModifiers,
    /// Array-shape word; the low 16 bits hold log2 of the element size
    pub array_shape: u32,
    /// Number of interfaces the class declares
    pub interface_count: u16,
    /// Constant pool, index 0 is always [`ConstantPoolEntry::Unused`]
    pub constant_pool: Vec<ConstantPoolEntry>,
    /// Declared field shapes, in declaration order
    pub fields: Vec<FieldShape>,
}

impl ClassDescriptor {
    /// Returns `true` if the descriptor belongs to an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.modifiers.contains(ClassModifiers::INTERFACE)
    }

    /// Returns `true` if the descriptor belongs to an abstract class or interface
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(ClassModifiers::ABSTRACT)
    }

    /// Returns `true` if the descriptor belongs to an array class
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.modifiers.contains(ClassModifiers::ARRAY)
    }

    /// Log2 of the element size of an array class
    #[must_use]
    pub fn log_element_size(&self) -> u32 {
        self.array_shape & ARRAY_SHAPE_LOG_ELEMENT_SIZE_MASK
    }

    /// Encode the descriptor into its byte format.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a name, signature or table does not fit its
    /// `u16` length prefix.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        write_le(&mut data, DESCRIPTOR_MAGIC);
        write_le(&mut data, DESCRIPTOR_VERSION);
        write_prefixed(&mut data, self.name.as_bytes())?;
        write_le(&mut data, self.modifiers.bits());
        write_le(&mut data, self.array_shape);
        write_le(&mut data, self.interface_count);

        write_le(&mut data, count_u16(self.constant_pool.len(), "constant pool")?);
        for entry in &self.constant_pool {
            match entry {
                ConstantPoolEntry::Unused => write_le(&mut data, TAG_UNUSED),
                ConstantPoolEntry::ClassRef { name } => {
                    write_le(&mut data, TAG_CLASS_REF);
                    write_prefixed(&mut data, name)?;
                }
                ConstantPoolEntry::FieldRef {
                    class_ref_index,
                    name,
                    signature,
                } => {
                    write_le(&mut data, TAG_FIELD_REF);
                    write_le(&mut data, *class_ref_index);
                    write_prefixed(&mut data, name)?;
                    write_prefixed(&mut data, signature)?;
                }
                ConstantPoolEntry::Int(value) => {
                    write_le(&mut data, TAG_INT);
                    write_le(&mut data, *value);
                }
                ConstantPoolEntry::Utf8(value) => {
                    write_le(&mut data, TAG_UTF8);
                    write_prefixed(&mut data, value)?;
                }
            }
        }

        write_le(&mut data, count_u16(self.fields.len(), "field table")?);
        for field in &self.fields {
            write_prefixed(&mut data, field.name.as_bytes())?;
            write_prefixed(&mut data, field.signature.as_bytes())?;
            write_le(&mut data, field.modifiers.bits());
        }

        Ok(data)
    }

    /// Decode a descriptor from its byte format.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for a bad magic, version, tag or non-UTF-8 name,
    /// and [`crate::Error::OutOfBounds`] for truncated data.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut parser = Parser::new(data);

        let magic = parser.read_le::<u32>()?;
        if magic != DESCRIPTOR_MAGIC {
            return Err(malformed_error!("Invalid descriptor magic - 0x{:08x}", magic));
        }
        let version = parser.read_le::<u16>()?;
        if version != DESCRIPTOR_VERSION {
            return Err(malformed_error!("Unsupported descriptor version - {}", version));
        }

        let name = read_string(&mut parser)?;
        let modifiers = ClassModifiers::from_bits_truncate(parser.read_le::<u32>()?);
        let array_shape = parser.read_le::<u32>()?;
        let interface_count = parser.read_le::<u16>()?;

        let cp_count = parser.read_le::<u16>()?;
        let mut constant_pool = Vec::with_capacity(usize::from(cp_count));
        for _ in 0..cp_count {
            let entry = match parser.read_le::<u8>()? {
                TAG_UNUSED => ConstantPoolEntry::Unused,
                TAG_CLASS_REF => ConstantPoolEntry::ClassRef {
                    name: parser.read_prefixed_bytes()?.to_vec(),
                },
                TAG_FIELD_REF => ConstantPoolEntry::FieldRef {
                    class_ref_index: parser.read_le::<u16>()?,
                    name: parser.read_prefixed_bytes()?.to_vec(),
                    signature: parser.read_prefixed_bytes()?.to_vec(),
                },
                TAG_INT => ConstantPoolEntry::Int(parser.read_le::<i32>()?),
                TAG_UTF8 => ConstantPoolEntry::Utf8(parser.read_prefixed_bytes()?.to_vec()),
                tag => {
                    return Err(malformed_error!(
                        "Invalid constant pool tag {} at offset {}",
                        tag,
                        parser.pos() - 1
                    ))
                }
            };
            constant_pool.push(entry);
        }

        let field_count = parser.read_le::<u16>()?;
        let mut fields = Vec::with_capacity(usize::from(field_count));
        for _ in 0..field_count {
            let name = read_string(&mut parser)?;
            let signature = read_string(&mut parser)?;
            let modifiers = FieldModifiers::from_bits_truncate(parser.read_le::<u32>()?);
            fields.push(FieldShape {
                name,
                signature,
                modifiers,
            });
        }

        if parser.has_more_data() {
            return Err(malformed_error!(
                "Trailing data after descriptor - {} of {} bytes consumed",
                parser.pos(),
                parser.len()
            ));
        }

        Ok(ClassDescriptor {
            name,
            modifiers,
            array_shape,
            interface_count,
            constant_pool,
            fields,
        })
    }
}

fn count_u16(len: usize, what: &str) -> Result<u16> {
    u16::try_from(len).map_err(|_| malformed_error!("The {} has too many entries - {}", what, len))
}

fn write_prefixed(data: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    let len = u16::try_from(bytes.len())
        .map_err(|_| malformed_error!("String too long for descriptor - {} bytes", bytes.len()))?;
    write_le(data, len);
    data.extend_from_slice(bytes);
    Ok(())
}

fn read_string(parser: &mut Parser<'_>) -> Result<String> {
    let bytes = parser.read_prefixed_bytes()?;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| malformed_error!("Invalid UTF-8 in descriptor string - {}", e))
}
