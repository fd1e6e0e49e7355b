//! Fluent construction of loaded classes.
//!
//! [`ClassBuilder`] assembles a descriptor, resolves the superclass chain and interface table
//! against a [`ClassTable`], assigns the combined depth+flags word and registers the result.
//!
//! # Example
//!
//! ```rust
//! use classenv::{ClassBuilder, ClassTable, FieldModifiers};
//!
//! let table = ClassTable::new();
//! let object = ClassBuilder::new("java/lang/Object").build(&table)?;
//! let point = ClassBuilder::new("demo/Point")
//!     .extends(object)
//!     .field("x", "I", 0, FieldModifiers::PRIVATE)
//!     .field("y", "I", 4, FieldModifiers::PRIVATE)
//!     .build(&table)?;
//!
//! let class = table.get(point)?;
//! assert_eq!(class.depth(), 1);
//! assert_eq!(class.total_instance_size, 8);
//! # Ok::<(), classenv::Error>(())
//! ```

use std::sync::Arc;

use crate::{
    metadata::{
        ClassDescriptor, ClassFlags, ClassHandle, ClassModifiers, ConstantPoolEntry,
        DepthAndFlags, FieldModifiers, FieldShape, FlattenedField, ITableNode,
    },
    runtime::{ClassTable, ITableEntry, RuntimeClass},
    Result,
};

/// Size of a reference slot in bytes
pub const REFERENCE_SIZE: u64 = 8;

struct PendingField {
    name: String,
    signature: String,
    offset: u32,
    modifiers: FieldModifiers,
    flattened_class: Option<ClassHandle>,
}

/// Provides a fluent API for building and registering a loaded class
pub struct ClassBuilder {
    name: String,
    modifiers: ClassModifiers,
    array_shape: u32,
    superclass: Option<ClassHandle>,
    interfaces: Vec<ClassHandle>,
    fields: Vec<PendingField>,
    constant_pool: Vec<ConstantPoolEntry>,
    depth_flags: DepthAndFlags,
    class_flags: ClassFlags,
    instance_size: Option<u64>,
}

impl ClassBuilder {
    /// Start building a class with the given slash-separated name
    #[must_use]
    pub fn new(name: &str) -> Self {
        ClassBuilder {
            name: name.to_string(),
            modifiers: ClassModifiers::PUBLIC,
            array_shape: 0,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            constant_pool: vec![ConstantPoolEntry::Unused],
            depth_flags: DepthAndFlags::empty(),
            class_flags: ClassFlags::empty(),
            instance_size: None,
        }
    }

    /// Add descriptor modifier bits
    #[must_use]
    pub fn modifiers(mut self, modifiers: ClassModifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    /// Mark the class as an interface (interfaces are implicitly abstract)
    #[must_use]
    pub fn interface(self) -> Self {
        self.modifiers(ClassModifiers::INTERFACE | ClassModifiers::ABSTRACT)
    }

    /// Mark the class as abstract
    #[must_use]
    pub fn abstract_class(self) -> Self {
        self.modifiers(ClassModifiers::ABSTRACT)
    }

    /// Mark the class as final
    #[must_use]
    pub fn final_class(self) -> Self {
        self.modifiers(ClassModifiers::FINAL)
    }

    /// Mark the class as a value type; `flattened` value types are stored inline in containers
    #[must_use]
    pub fn value_type(mut self, flattened: bool) -> Self {
        self.class_flags |= ClassFlags::IS_VALUE_TYPE;
        if flattened {
            self.class_flags |= ClassFlags::IS_FLATTENED;
        }
        self.modifiers(ClassModifiers::FINAL)
    }

    /// Make this an array class whose elements are `1 << log_element_size` bytes wide.
    ///
    /// The name should be the array signature, e.g. `[I` or `[Ljava/lang/String;`.
    #[must_use]
    pub fn array(mut self, log_element_size: u16) -> Self {
        self.array_shape = u32::from(log_element_size);
        self.modifiers(ClassModifiers::ARRAY | ClassModifiers::FINAL)
    }

    /// Set the immediate superclass
    #[must_use]
    pub fn extends(mut self, superclass: ClassHandle) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Append an implemented interface; interface-table order follows call order
    #[must_use]
    pub fn implements(mut self, interface: ClassHandle) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Declare a field stored by value or by reference at `offset`
    #[must_use]
    pub fn field(mut self, name: &str, signature: &str, offset: u32, modifiers: FieldModifiers) -> Self {
        self.fields.push(PendingField {
            name: name.to_string(),
            signature: signature.to_string(),
            offset,
            modifiers,
            flattened_class: None,
        });
        self
    }

    /// Declare a flattenable field of value class `class` at `offset`.
    ///
    /// The field gets a flattened-field table entry; it is stored inline exactly when `class`
    /// was built with `value_type(true)`.
    #[must_use]
    pub fn flattened_field(
        mut self,
        name: &str,
        class: ClassHandle,
        offset: u32,
        modifiers: FieldModifiers,
    ) -> Self {
        self.fields.push(PendingField {
            name: name.to_string(),
            signature: String::new(),
            offset,
            modifiers,
            flattened_class: Some(class),
        });
        self
    }

    /// Append a constant-pool entry; the first entry added gets index 1
    #[must_use]
    pub fn constant(mut self, entry: ConstantPoolEntry) -> Self {
        self.constant_pool.push(entry);
        self
    }

    /// Add flags to the combined depth+flags word
    #[must_use]
    pub fn depth_flags(mut self, flags: DepthAndFlags) -> Self {
        self.depth_flags |= flags;
        self
    }

    /// Add runtime class flags
    #[must_use]
    pub fn class_flags(mut self, flags: ClassFlags) -> Self {
        self.class_flags |= flags;
        self
    }

    /// Override the computed instance size
    #[must_use]
    pub fn instance_size(mut self, size: u64) -> Self {
        self.instance_size = Some(size);
        self
    }

    /// Resolve references against `table`, register the class and return its handle.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnknownClass`] if the superclass, an interface or a flattened
    /// value class is not loaded in `table`, and [`crate::Error::Malformed`] if the class
    /// declares more than `u16::MAX` interfaces.
    pub fn build(self, table: &ClassTable) -> Result<ClassHandle> {
        let superclasses: Vec<ClassHandle> = match self.superclass {
            Some(parent) => {
                let parent_class = table.get(parent)?;
                std::iter::once(parent)
                    .chain(parent_class.superclasses.iter().copied())
                    .collect()
            }
            None => Vec::new(),
        };

        for interface in &self.interfaces {
            table.get(*interface)?;
        }
        let interface_count = u16::try_from(self.interfaces.len()).map_err(|_| {
            malformed_error!("Class {} declares too many interfaces", self.name)
        })?;

        let mut shapes = Vec::with_capacity(self.fields.len());
        let mut offsets = Vec::with_capacity(self.fields.len());
        let mut flattened = Vec::new();
        let mut computed_size = 0u64;
        for field in self.fields {
            let (signature, width) = match field.flattened_class {
                Some(class) => {
                    let value_class = table.get(class)?;
                    flattened.push(FlattenedField {
                        name: field.name.clone(),
                        class,
                        offset: field.offset,
                    });
                    let width = if value_class.class_flags.contains(ClassFlags::IS_FLATTENED) {
                        value_class.total_instance_size
                    } else {
                        REFERENCE_SIZE
                    };
                    (format!("Q{};", value_class.descriptor.name), width)
                }
                None => {
                    let width = signature_width(&field.signature);
                    (field.signature, width)
                }
            };
            if !field.modifiers.contains(FieldModifiers::STATIC) {
                computed_size = computed_size.max(u64::from(field.offset) + width);
            }
            shapes.push(FieldShape {
                name: field.name,
                signature,
                modifiers: field.modifiers,
            });
            offsets.push(field.offset);
        }

        let descriptor = ClassDescriptor {
            name: self.name,
            modifiers: self.modifiers,
            array_shape: self.array_shape,
            interface_count,
            constant_pool: self.constant_pool,
            fields: shapes,
        };

        // Nodes link forward, so the chain is built back to front. The arena is append-only,
        // so this runs only once every reference has resolved.
        let mut itable: Option<ITableNode> = None;
        for interface in self.interfaces.iter().rev() {
            itable = Some(table.push_itable_node(ITableEntry {
                interface: *interface,
                next: itable,
            })?);
        }

        let handle = table.allocate_handle();
        table.insert(RuntimeClass {
            handle,
            descriptor: Arc::new(descriptor),
            depth_and_flags: self.depth_flags.to_word(superclasses.len()),
            class_flags: self.class_flags,
            total_instance_size: self.instance_size.unwrap_or(computed_size),
            superclasses: Arc::from(superclasses),
            itable,
            field_offsets: offsets,
            flattened: Arc::from(flattened),
        })
    }
}

/// Storage width in bytes of a field with the given signature
#[must_use]
pub fn signature_width(signature: &str) -> u64 {
    match signature.as_bytes().first() {
        Some(b'Z' | b'B') => 1,
        Some(b'C' | b'S') => 2,
        Some(b'I' | b'F') => 4,
        Some(b'J' | b'D') => 8,
        _ => REFERENCE_SIZE,
    }
}
