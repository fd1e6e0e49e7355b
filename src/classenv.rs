//! The class metadata accessor.
//!
//! [`ClassEnv`] is the query surface the rest of a compiler uses for class-level facts. It is
//! created once per compilation session in either local or remote mode and answers every
//! query identically in both; only the cost differs. Flag masking, bounds checks and
//! composite queries live here, on top of the raw lookups of a
//! [`crate::access::ClassAccess`] strategy.
//!
//! # Usage Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use classenv::{ClassBuilder, ClassEnv, ClassTable, ClientSession, SessionConfig};
//! use classenv::remote::{LoopbackStream, MetadataServer};
//!
//! let table = Arc::new(ClassTable::new());
//! let object = ClassBuilder::new("java/lang/Object").build(&table)?;
//! let list = ClassBuilder::new("demo/List").interface().build(&table)?;
//! let array_list = ClassBuilder::new("demo/ArrayList")
//!     .extends(object)
//!     .implements(list)
//!     .build(&table)?;
//!
//! let local = ClassEnv::local(table.clone());
//! let session = ClientSession::new(SessionConfig::production());
//! let remote = ClassEnv::remote(session, LoopbackStream::new(MetadataServer::new(table)));
//!
//! for env in [&local, &remote] {
//!     assert_eq!(env.class_depth(array_list)?, 1);
//!     assert_eq!(&*env.interface_table(array_list)?, &[list]);
//!     assert!(env.contains_zero_or_one_concrete_class(&[list, array_list])?);
//! }
//! # Ok::<(), classenv::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! `ClassEnv` is `Send + Sync`. Workers that compile concurrently against one remote session
//! each create their own `ClassEnv` over their own stream and share the [`ClientSession`].

use std::sync::Arc;

use tracing::debug;

use crate::{
    access::{ClassAccess, LocalAccess, RemoteAccess},
    layout::{self, TypeLayout},
    metadata::{
        ClassDescriptor, ClassFlags, ClassHandle, ClassModifiers, ConstantPoolEntry,
        DepthAndFlags, FieldDescriptor, FieldModifiers, FlattenedField, ITableNode,
        ARRAY_SHAPE_LOG_ELEMENT_SIZE_MASK, STACK_ALLOCATION_SPECIAL_MASK,
    },
    remote::{Stream, StreamStats},
    runtime::ClassTable,
    session::{ClientSession, SessionConfig},
    Error, Result,
};

/// Signature characters of primitive array element types
const PRIMITIVE_ELEMENT_SIGNATURES: &[u8] = b"ZBCSIJFD";

const STRING_CLASS_NAME: &str = "java/lang/String";

/// Class metadata accessor of one compilation session
pub struct ClassEnv {
    access: Box<dyn ClassAccess>,
    config: SessionConfig,
    session: Option<Arc<ClientSession>>,
    stats: Option<Arc<StreamStats>>,
}

impl ClassEnv {
    /// Read classes directly from `table`, with the default configuration
    #[must_use]
    pub fn local(table: Arc<ClassTable>) -> Self {
        Self::local_with_config(table, SessionConfig::default())
    }

    /// Read classes directly from `table`
    #[must_use]
    pub fn local_with_config(table: Arc<ClassTable>, config: SessionConfig) -> Self {
        ClassEnv {
            access: Box::new(LocalAccess::new(table)),
            config,
            session: None,
            stats: None,
        }
    }

    /// Ask the owning process over `stream`, caching into `session`
    pub fn remote<S: Stream + 'static>(session: Arc<ClientSession>, stream: S) -> Self {
        let config = *session.config();
        let access = RemoteAccess::new(session.clone(), Box::new(stream));
        let stats = access.stats().clone();
        debug!(session = session.id(), "remote class environment created");
        ClassEnv {
            access: Box::new(access),
            config,
            session: Some(session),
            stats: Some(stats),
        }
    }

    /// Use a custom access strategy
    #[must_use]
    pub fn with_access(access: Box<dyn ClassAccess>, config: SessionConfig) -> Self {
        ClassEnv {
            access,
            config,
            session: None,
            stats: None,
        }
    }

    /// Session configuration
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns `true` if queries are answered by another process
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.access.is_remote()
    }

    /// The remote session, `None` in local mode
    #[must_use]
    pub fn session(&self) -> Option<&Arc<ClientSession>> {
        self.session.as_ref()
    }

    /// Round-trip counters of the remote stream, `None` in local mode
    #[must_use]
    pub fn stream_stats(&self) -> Option<&Arc<StreamStats>> {
        self.stats.as_ref()
    }

    // ---------------------------------------------------------------------------------------
    // Flag-derived queries
    // ---------------------------------------------------------------------------------------

    /// Cached flag word, masked and cross-checked when verification is enabled
    fn masked_flags(&self, class: ClassHandle, mask: ClassFlags) -> Result<u32> {
        let flags = self.access.class_flags(class)?;
        self.access.verify_class_flags(class, flags, mask.bits())?;
        Ok(flags & mask.bits())
    }

    /// Runtime flag word of `class`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn class_flags(&self, class: ClassHandle) -> Result<ClassFlags> {
        Ok(ClassFlags::from_bits_retain(self.access.class_flags(class)?))
    }

    /// Runtime flag word of `class`, read from the owning process without using the cache.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn class_flags_value(&self, class: ClassHandle) -> Result<u32> {
        self.access.authoritative_class_flags(class)
    }

    /// Combined depth and flags word of `class`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn depth_and_flags(&self, class: ClassHandle) -> Result<u64> {
        self.access.depth_and_flags(class)
    }

    /// Number of superclasses of `class`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn class_depth(&self, class: ClassHandle) -> Result<usize> {
        Ok(DepthAndFlags::depth_of(self.access.depth_and_flags(class)?))
    }

    /// Instance size of `class` in bytes, not counting the object header.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn class_instance_size(&self, class: ClassHandle) -> Result<u64> {
        self.access.total_instance_size(class)
    }

    /// Returns `true` if instances need special treatment that rules out stack allocation
    /// (weak or soft references, finalizable objects, ownable synchronizers).
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn is_special_for_stack_allocation(&self, class: ClassHandle) -> Result<bool> {
        Ok((self.access.depth_and_flags(class)? & STACK_ALLOCATION_SPECIAL_MASK) != 0)
    }

    /// Returns `true` if instances must be finalized.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn has_finalizer(&self, class: ClassHandle) -> Result<bool> {
        let word = self.access.depth_and_flags(class)?;
        Ok(DepthAndFlags::from_word(word).contains(DepthAndFlags::FINALIZE_NEEDED))
    }

    /// Reservable-lock-word bit of the class flags (zero or the bit itself).
    ///
    /// # Errors
    /// Returns [`Error::ConsistencyMismatch`] if verification is enabled and the cached flags
    /// disagree with the owning process, [`Error::UnknownClass`] or a transport error.
    pub fn reservable_lock_word_init(&self, class: ClassHandle) -> Result<u32> {
        self.masked_flags(class, ClassFlags::RESERVABLE_LOCK_WORD_INIT)
    }

    /// Returns `true` if `class` is a value type.
    ///
    /// # Errors
    /// See [`ClassEnv::reservable_lock_word_init`].
    pub fn is_value_type(&self, class: ClassHandle) -> Result<bool> {
        Ok(self.masked_flags(class, ClassFlags::IS_VALUE_TYPE)? != 0)
    }

    /// Returns `true` if an instance of `class` is valid when all its bytes are zero, i.e. it
    /// has no flattenable field stored by reference.
    ///
    /// # Errors
    /// See [`ClassEnv::reservable_lock_word_init`].
    pub fn is_zero_initializable(&self, class: ClassHandle) -> Result<bool> {
        Ok(self.masked_flags(class, ClassFlags::CONTAINS_UNFLATTENED_FLATTENABLES)? == 0)
    }

    /// Returns `true` if a static final field of `class` was modified illegally.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn has_illegal_static_final_field_modification(&self, class: ClassHandle) -> Result<bool> {
        Ok(self
            .class_flags(class)?
            .contains(ClassFlags::HAS_ILLEGAL_FINAL_FIELD_MODIFICATIONS))
    }

    // ---------------------------------------------------------------------------------------
    // Descriptor-derived queries
    // ---------------------------------------------------------------------------------------

    /// Read-only descriptor of `class`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, a transport error, or
    /// a decode error for damaged descriptor bytes.
    pub fn descriptor_of(&self, class: ClassHandle) -> Result<Arc<ClassDescriptor>> {
        self.access.descriptor(class)
    }

    /// Slash-separated name of `class`.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn class_name(&self, class: ClassHandle) -> Result<String> {
        Ok(self.descriptor_of(class)?.name.clone())
    }

    fn has_modifier(&self, class: ClassHandle, modifier: ClassModifiers) -> Result<bool> {
        Ok(self.descriptor_of(class)?.modifiers.contains(modifier))
    }

    /// Returns `true` if `class` is an interface.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn is_interface(&self, class: ClassHandle) -> Result<bool> {
        self.has_modifier(class, ClassModifiers::INTERFACE)
    }

    /// Returns `true` if `class` is abstract.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn is_abstract(&self, class: ClassHandle) -> Result<bool> {
        self.has_modifier(class, ClassModifiers::ABSTRACT)
    }

    /// Returns `true` if `class` is final.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn is_final(&self, class: ClassHandle) -> Result<bool> {
        self.has_modifier(class, ClassModifiers::FINAL)
    }

    /// Returns `true` if `class` describes a primitive type.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn is_primitive(&self, class: ClassHandle) -> Result<bool> {
        self.has_modifier(class, ClassModifiers::PRIMITIVE_TYPE)
    }

    /// Returns `true` if `class` is an array class.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn is_array(&self, class: ClassHandle) -> Result<bool> {
        self.has_modifier(class, ClassModifiers::ARRAY)
    }

    /// Returns `true` if `class` is an array with primitive elements.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn is_primitive_array(&self, class: ClassHandle) -> Result<bool> {
        let descriptor = self.descriptor_of(class)?;
        Ok(descriptor.is_array() && is_primitive_array_name(&descriptor.name))
    }

    /// Returns `true` if `class` is an array of references.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn is_reference_array(&self, class: ClassHandle) -> Result<bool> {
        let descriptor = self.descriptor_of(class)?;
        Ok(descriptor.is_array() && !is_primitive_array_name(&descriptor.name))
    }

    /// Width in bytes of one element of array class `class`.
    ///
    /// # Errors
    /// Returns [`Error::NotAnArray`] if `class` is not an array class, plus the errors of
    /// [`ClassEnv::descriptor_of`].
    pub fn array_element_width(&self, class: ClassHandle) -> Result<u64> {
        let descriptor = self.descriptor_of(class)?;
        if !descriptor.is_array() {
            return Err(Error::NotAnArray(class));
        }
        let log_element_size = descriptor.array_shape & ARRAY_SHAPE_LOG_ELEMENT_SIZE_MASK;
        1u64.checked_shl(log_element_size).ok_or_else(|| {
            malformed_error!(
                "Array class {} has log element size {}",
                class,
                log_element_size
            )
        })
    }

    /// Constant pool of `class`, entry 0 unused.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn constant_pool_of(&self, class: ClassHandle) -> Result<Vec<ConstantPoolEntry>> {
        Ok(self.descriptor_of(class)?.constant_pool.clone())
    }

    /// Name of the class declaring the field referenced by constant-pool entry `cp_index`.
    ///
    /// In remote mode the descriptor is fetched once and cached; the lookup itself is local.
    ///
    /// # Errors
    /// Returns [`Error::ConstantPoolIndex`] for an index outside the pool and
    /// [`Error::ConstantPoolKind`] if the entry is not a field reference or does not point at a
    /// class reference.
    pub fn class_ref_name(&self, class: ClassHandle, cp_index: u32) -> Result<Vec<u8>> {
        let descriptor = self.descriptor_of(class)?;
        let pool = &descriptor.constant_pool;
        let entry = |index: u32| {
            pool.get(index as usize)
                .ok_or(Error::ConstantPoolIndex { class, index })
        };

        let ConstantPoolEntry::FieldRef {
            class_ref_index, ..
        } = entry(cp_index)?
        else {
            return Err(Error::ConstantPoolKind {
                class,
                index: cp_index,
                expected: "field reference",
            });
        };

        let class_ref_index = u32::from(*class_ref_index);
        match entry(class_ref_index)? {
            ConstantPoolEntry::ClassRef { name } => Ok(name.clone()),
            _ => Err(Error::ConstantPoolKind {
                class,
                index: class_ref_index,
                expected: "class reference",
            }),
        }
    }

    /// Returns `true` if constant-pool entry `cp_index` of `class` names a value class by its
    /// `Q`-descriptor.
    ///
    /// # Errors
    /// Returns [`Error::ConstantPoolIndex`] for an index outside the pool and
    /// [`Error::ConstantPoolKind`] if the entry is not a class reference.
    pub fn is_class_ref_value_type(&self, class: ClassHandle, cp_index: u32) -> Result<bool> {
        let descriptor = self.descriptor_of(class)?;
        match descriptor.constant_pool.get(cp_index as usize) {
            Some(ConstantPoolEntry::ClassRef { name }) => {
                Ok(name.first() == Some(&b'Q') && name.last() == Some(&b';'))
            }
            Some(_) => Err(Error::ConstantPoolKind {
                class,
                index: cp_index,
                expected: "class reference",
            }),
            None => Err(Error::ConstantPoolIndex {
                class,
                index: cp_index,
            }),
        }
    }

    /// Returns `true` if `class` is an enum.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn is_enum(&self, class: ClassHandle) -> Result<bool> {
        self.has_modifier(class, ClassModifiers::ENUM)
    }

    /// Returns `true` if `class` is `java/lang/String`.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn is_string_class(&self, class: ClassHandle) -> Result<bool> {
        Ok(self.descriptor_of(class)?.name == STRING_CLASS_NAME)
    }

    /// Returns `true` if `class` declares at least one final field, static or not.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn has_final_fields(&self, class: ClassHandle) -> Result<bool> {
        Ok(self
            .declared_fields(class)?
            .iter()
            .any(|field| field.modifiers().contains(FieldModifiers::FINAL)))
    }

    /// Name of `class` as raw modified-UTF-8 bytes.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn class_name_chars(&self, class: ClassHandle) -> Result<Vec<u8>> {
        Ok(self.descriptor_of(class)?.name.as_bytes().to_vec())
    }

    /// Type signature of `class`: `Lname;` for classes, the name itself for arrays and the
    /// one-character code for primitive types.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for a primitive type with an unrecognised name, plus the
    /// errors of [`ClassEnv::descriptor_of`].
    pub fn class_signature(&self, class: ClassHandle) -> Result<String> {
        let descriptor = self.descriptor_of(class)?;
        if descriptor.is_array() {
            return Ok(descriptor.name.clone());
        }
        if descriptor.modifiers.contains(ClassModifiers::PRIMITIVE_TYPE) {
            return primitive_signature(&descriptor.name)
                .map(String::from)
                .ok_or_else(|| {
                    malformed_error!("Primitive class {} is named {}", class, descriptor.name)
                });
        }
        Ok(format!("L{};", descriptor.name))
    }

    // ---------------------------------------------------------------------------------------
    // Hierarchy
    // ---------------------------------------------------------------------------------------

    /// Superclass chain of `class`, immediate superclass first and root last.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn superclasses_of(&self, class: ClassHandle) -> Result<Arc<[ClassHandle]>> {
        self.access.superclasses(class)
    }

    /// Read-only descriptor of superclass `index` of `class`.
    ///
    /// # Errors
    /// Returns [`Error::SuperclassIndexOutOfRange`] unless `index < depth`, plus the errors of
    /// [`ClassEnv::descriptor_of`].
    pub fn rom_class_of_superclass(
        &self,
        class: ClassHandle,
        index: usize,
    ) -> Result<Arc<ClassDescriptor>> {
        let depth = self.class_depth(class)?;
        if index >= depth {
            return Err(Error::SuperclassIndexOutOfRange {
                class,
                index,
                depth,
            });
        }
        let superclass = self.access.indexed_superclass(class, index)?;
        self.descriptor_of(superclass)
    }

    /// Returns `true` if at most one class of `classes` is concrete (neither an interface nor
    /// abstract).
    ///
    /// In remote mode, classes whose descriptor is already cached are examined before the
    /// others so that a decision can often be reached without a round trip. The scan stops
    /// as soon as a second concrete class is found.
    ///
    /// # Errors
    /// See [`ClassEnv::descriptor_of`].
    pub fn contains_zero_or_one_concrete_class(&self, classes: &[ClassHandle]) -> Result<bool> {
        let mut count = 0usize;
        let mut second_concrete = |descriptor: &ClassDescriptor| {
            if !descriptor.is_interface() && !descriptor.is_abstract() {
                count += 1;
            }
            count > 1
        };

        if !self.is_remote() {
            for class in classes {
                if second_concrete(&*self.descriptor_of(*class)?) {
                    return Ok(false);
                }
            }
            return Ok(true);
        }

        let mut uncached = Vec::new();
        for class in classes {
            match self.access.descriptor_if_cached(*class) {
                Some(descriptor) => {
                    if second_concrete(&descriptor) {
                        return Ok(false);
                    }
                }
                None => uncached.push(*class),
            }
        }
        for class in uncached {
            if second_concrete(&*self.descriptor_of(class)?) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // ---------------------------------------------------------------------------------------
    // Interface tables
    // ---------------------------------------------------------------------------------------

    /// First interface-table node of `class`, `None` if it implements no interface.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn itable_of(&self, class: ClassHandle) -> Result<Option<ITableNode>> {
        self.access.itable_head(class)
    }

    /// Node following `node`, `None` at the end of the table.
    ///
    /// # Errors
    /// Returns [`Error::UnknownITableNode`] for a node that does not exist, or a transport
    /// error.
    pub fn itable_next(&self, node: ITableNode) -> Result<Option<ITableNode>> {
        self.access.itable_next(node)
    }

    /// Interface `node` resolves to.
    ///
    /// # Errors
    /// See [`ClassEnv::itable_next`].
    pub fn itable_interface(&self, node: ITableNode) -> Result<ClassHandle> {
        self.access.itable_interface(node)
    }

    /// Read-only descriptor of the interface `node` resolves to.
    ///
    /// # Errors
    /// See [`ClassEnv::itable_next`].
    pub fn itable_rom_class(&self, node: ITableNode) -> Result<Arc<ClassDescriptor>> {
        self.access.itable_descriptor(node)
    }

    /// Interfaces of `class` in interface-table order, fetched in one round trip in remote
    /// mode and cached for the session.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn interface_table(&self, class: ClassHandle) -> Result<Arc<[ClassHandle]>> {
        self.access.interface_table(class)
    }

    /// Interfaces of `class` collected node by node.
    ///
    /// Yields the same sequence as [`ClassEnv::interface_table`] at the cost of two round
    /// trips per node in remote mode.
    ///
    /// # Errors
    /// See [`ClassEnv::itable_of`] and [`ClassEnv::itable_next`].
    pub fn walk_interface_table(&self, class: ClassHandle) -> Result<Vec<ClassHandle>> {
        let mut interfaces = Vec::new();
        let mut cursor = self.itable_of(class)?;
        while let Some(node) = cursor {
            interfaces.push(self.itable_interface(node)?);
            cursor = self.itable_next(node)?;
        }
        Ok(interfaces)
    }

    // ---------------------------------------------------------------------------------------
    // Fields
    // ---------------------------------------------------------------------------------------

    /// Declared fields of `class` in declaration order.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn declared_fields(&self, class: ClassHandle) -> Result<Arc<[FieldDescriptor]>> {
        self.access.declared_fields(class)
    }

    /// Flattened-field table of `class`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn flattened_fields(&self, class: ClassHandle) -> Result<Arc<[FlattenedField]>> {
        self.access.flattened_fields(class)
    }

    fn flattened_entry(&self, class: ClassHandle, name: &str) -> Result<Option<FlattenedField>> {
        Ok(self
            .flattened_fields(class)?
            .iter()
            .find(|entry| entry.name == name)
            .cloned())
    }

    fn required_flattened_entry(&self, class: ClassHandle, name: &str) -> Result<FlattenedField> {
        self.flattened_entry(class, name)?
            .ok_or_else(|| Error::FieldNotFound {
                class,
                name: name.to_string(),
            })
    }

    /// Returns `true` if field `name` of `class` is stored inline.
    ///
    /// A field without a flattened-field table entry is not flattened.
    ///
    /// # Errors
    /// Returns [`Error::UnknownClass`] for a handle that is not loaded, or a transport error.
    pub fn is_field_flattened(&self, class: ClassHandle, name: &str) -> Result<bool> {
        match self.flattened_entry(class, name)? {
            Some(entry) => Ok(self
                .class_flags(entry.class)?
                .contains(ClassFlags::IS_FLATTENED)),
            None => Ok(false),
        }
    }

    /// Value class of flattenable field `name` of `class`.
    ///
    /// # Errors
    /// Returns [`Error::FieldNotFound`] if `class` has no flattenable field `name`.
    pub fn flattened_field_type(&self, class: ClassHandle, name: &str) -> Result<ClassHandle> {
        Ok(self.required_flattened_entry(class, name)?.class)
    }

    /// Offset of flattenable field `name` within `class`.
    ///
    /// # Errors
    /// Returns [`Error::FieldNotFound`] if `class` has no flattenable field `name`.
    pub fn flattened_field_offset(&self, class: ClassHandle, name: &str) -> Result<u32> {
        Ok(self.required_flattened_entry(class, name)?.offset)
    }

    /// Flattened, offset-addressable layout of an instance of `class`.
    ///
    /// # Errors
    /// Returns [`Error::RecursionLimit`] if flattened fields nest deeper than
    /// [`SessionConfig::max_flattening_depth`], [`Error::FieldNotFound`] for an inconsistent
    /// flattened-field table, plus the lookup and transport errors of the queries involved.
    pub fn enumerate_fields(&self, class: ClassHandle) -> Result<TypeLayout> {
        layout::enumerate(self, class)
    }
}

fn primitive_signature(name: &str) -> Option<&'static str> {
    Some(match name {
        "boolean" => "Z",
        "byte" => "B",
        "char" => "C",
        "short" => "S",
        "int" => "I",
        "long" => "J",
        "float" => "F",
        "double" => "D",
        "void" => "V",
        _ => return None,
    })
}

fn is_primitive_array_name(name: &str) -> bool {
    match name.as_bytes() {
        [b'[', element] => PRIMITIVE_ELEMENT_SIGNATURES.contains(element),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        remote::{LoopbackStream, MetadataServer},
        runtime::ClassBuilder,
    };

    fn both(table: &Arc<ClassTable>) -> [ClassEnv; 2] {
        let session = ClientSession::new(SessionConfig::verification());
        [
            ClassEnv::local(table.clone()),
            ClassEnv::remote(session, LoopbackStream::new(MetadataServer::new(table.clone()))),
        ]
    }

    #[test]
    fn test_array_width_for_each_log_size() {
        let table = Arc::new(ClassTable::new());
        let arrays: Vec<ClassHandle> = (0u16..=6)
            .map(|log| {
                ClassBuilder::new(&format!("[demo{log}"))
                    .array(log)
                    .build(&table)
                    .unwrap()
            })
            .collect();
        for env in both(&table) {
            let widths: Vec<u64> = arrays
                .iter()
                .map(|class| env.array_element_width(*class).unwrap())
                .collect();
            assert_eq!(widths, vec![1, 2, 4, 8, 16, 32, 64]);
        }
    }

    #[test]
    fn test_array_width_requires_array() {
        let table = Arc::new(ClassTable::new());
        let plain = ClassBuilder::new("demo/Plain").build(&table).unwrap();
        for env in both(&table) {
            let error = env.array_element_width(plain).unwrap_err();
            assert!(matches!(error, Error::NotAnArray(_)));
            assert!(error.is_programmer_error());
        }
    }

    #[test]
    fn test_array_kinds() {
        let table = Arc::new(ClassTable::new());
        let ints = ClassBuilder::new("[I").array(2).build(&table).unwrap();
        let strings = ClassBuilder::new("[Ljava/lang/String;")
            .array(3)
            .build(&table)
            .unwrap();
        for env in both(&table) {
            assert!(env.is_primitive_array(ints).unwrap());
            assert!(!env.is_reference_array(ints).unwrap());
            assert!(env.is_reference_array(strings).unwrap());
            assert!(env.is_final(strings).unwrap());
        }
    }

    #[test]
    fn test_flag_queries() {
        let table = Arc::new(ClassTable::new());
        let value = ClassBuilder::new("demo/Value")
            .value_type(true)
            .class_flags(ClassFlags::CONTAINS_UNFLATTENED_FLATTENABLES)
            .depth_flags(DepthAndFlags::FINALIZE_NEEDED)
            .build(&table)
            .unwrap();
        let plain = ClassBuilder::new("demo/Plain")
            .class_flags(
                ClassFlags::RESERVABLE_LOCK_WORD_INIT
                    | ClassFlags::HAS_ILLEGAL_FINAL_FIELD_MODIFICATIONS,
            )
            .build(&table)
            .unwrap();

        for env in both(&table) {
            assert!(env.is_value_type(value).unwrap());
            assert!(!env.is_zero_initializable(value).unwrap());
            assert!(env.has_finalizer(value).unwrap());
            assert!(env.is_special_for_stack_allocation(value).unwrap());

            assert!(!env.is_value_type(plain).unwrap());
            assert!(env.is_zero_initializable(plain).unwrap());
            assert_eq!(
                env.reservable_lock_word_init(plain).unwrap(),
                ClassFlags::RESERVABLE_LOCK_WORD_INIT.bits()
            );
            assert!(env.has_illegal_static_final_field_modification(plain).unwrap());
            assert!(!env.is_special_for_stack_allocation(plain).unwrap());
        }
    }

    #[test]
    fn test_superclass_index_bounds() {
        let table = Arc::new(ClassTable::new());
        let object = ClassBuilder::new("java/lang/Object").build(&table).unwrap();
        let child = ClassBuilder::new("demo/Child").extends(object).build(&table).unwrap();
        for env in both(&table) {
            assert_eq!(
                env.rom_class_of_superclass(child, 0).unwrap().name,
                "java/lang/Object"
            );
            assert!(matches!(
                env.rom_class_of_superclass(child, 1),
                Err(Error::SuperclassIndexOutOfRange {
                    index: 1,
                    depth: 1,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_class_ref_name() {
        let table = Arc::new(ClassTable::new());
        let user = ClassBuilder::new("demo/User")
            .constant(ConstantPoolEntry::ClassRef {
                name: b"demo/Account".to_vec(),
            })
            .constant(ConstantPoolEntry::FieldRef {
                class_ref_index: 1,
                name: b"balance".to_vec(),
                signature: b"J".to_vec(),
            })
            .constant(ConstantPoolEntry::Int(7))
            .constant(ConstantPoolEntry::FieldRef {
                class_ref_index: 3,
                name: b"broken".to_vec(),
                signature: b"I".to_vec(),
            })
            .build(&table)
            .unwrap();

        for env in both(&table) {
            assert_eq!(env.class_ref_name(user, 2).unwrap(), b"demo/Account");
            assert!(matches!(
                env.class_ref_name(user, 1),
                Err(Error::ConstantPoolKind { index: 1, .. })
            ));
            assert!(matches!(
                env.class_ref_name(user, 4),
                Err(Error::ConstantPoolKind { index: 3, .. })
            ));
            assert!(matches!(
                env.class_ref_name(user, 9),
                Err(Error::ConstantPoolIndex { index: 9, .. })
            ));
            assert_eq!(env.constant_pool_of(user).unwrap().len(), 5);
        }
    }

    #[test]
    fn test_flattened_field_helpers() {
        let table = Arc::new(ClassTable::new());
        let point = ClassBuilder::new("demo/Point")
            .value_type(true)
            .field("x", "I", 0, FieldModifiers::FINAL)
            .build(&table)
            .unwrap();
        let holder = ClassBuilder::new("demo/Holder")
            .field("id", "J", 0, FieldModifiers::empty())
            .flattened_field("origin", point, 8, FieldModifiers::empty())
            .build(&table)
            .unwrap();

        for env in both(&table) {
            assert!(env.is_field_flattened(holder, "origin").unwrap());
            assert!(!env.is_field_flattened(holder, "id").unwrap());
            assert_eq!(env.flattened_field_type(holder, "origin").unwrap(), point);
            assert_eq!(env.flattened_field_offset(holder, "origin").unwrap(), 8);
            assert!(matches!(
                env.flattened_field_type(holder, "id"),
                Err(Error::FieldNotFound { .. })
            ));
            assert!(matches!(
                env.flattened_field_offset(holder, "missing"),
                Err(Error::FieldNotFound { .. })
            ));
        }
    }

    #[test]
    fn test_class_kind_queries() {
        let table = Arc::new(ClassTable::new());
        let object = ClassBuilder::new("java/lang/Object").build(&table).unwrap();
        let string = ClassBuilder::new("java/lang/String")
            .final_class()
            .extends(object)
            .field("value", "[B", 0, FieldModifiers::PRIVATE | FieldModifiers::FINAL)
            .build(&table)
            .unwrap();
        let color = ClassBuilder::new("demo/Color")
            .modifiers(ClassModifiers::ENUM | ClassModifiers::FINAL)
            .extends(object)
            .field("RED", "Ldemo/Color;", 0, FieldModifiers::STATIC | FieldModifiers::FINAL)
            .build(&table)
            .unwrap();
        let counter = ClassBuilder::new("demo/Counter")
            .extends(object)
            .field("count", "I", 0, FieldModifiers::VOLATILE)
            .build(&table)
            .unwrap();

        for env in both(&table) {
            assert!(env.is_string_class(string).unwrap());
            assert!(!env.is_string_class(object).unwrap());
            assert!(env.is_enum(color).unwrap());
            assert!(!env.is_enum(string).unwrap());
            assert!(env.has_final_fields(string).unwrap());
            assert!(env.has_final_fields(color).unwrap());
            assert!(!env.has_final_fields(counter).unwrap());
            assert!(!env.has_final_fields(object).unwrap());
            assert_eq!(env.class_name_chars(color).unwrap(), b"demo/Color".to_vec());
        }
    }

    #[test]
    fn test_class_signatures() {
        let table = Arc::new(ClassTable::new());
        let object = ClassBuilder::new("java/lang/Object").build(&table).unwrap();
        let ints = ClassBuilder::new("[I").array(2).build(&table).unwrap();
        let int = ClassBuilder::new("int")
            .modifiers(ClassModifiers::PRIMITIVE_TYPE)
            .build(&table)
            .unwrap();
        let void = ClassBuilder::new("void")
            .modifiers(ClassModifiers::PRIMITIVE_TYPE)
            .build(&table)
            .unwrap();
        let bogus = ClassBuilder::new("quad")
            .modifiers(ClassModifiers::PRIMITIVE_TYPE)
            .build(&table)
            .unwrap();

        for env in both(&table) {
            assert_eq!(env.class_signature(object).unwrap(), "Ljava/lang/Object;");
            assert_eq!(env.class_signature(ints).unwrap(), "[I");
            assert_eq!(env.class_signature(int).unwrap(), "I");
            assert_eq!(env.class_signature(void).unwrap(), "V");
            assert!(matches!(
                env.class_signature(bogus),
                Err(Error::Malformed { .. })
            ));
        }
    }

    #[test]
    fn test_class_ref_value_type() {
        let table = Arc::new(ClassTable::new());
        let user = ClassBuilder::new("demo/User")
            .constant(ConstantPoolEntry::ClassRef {
                name: b"demo/Plain".to_vec(),
            })
            .constant(ConstantPoolEntry::ClassRef {
                name: b"Qdemo/Point;".to_vec(),
            })
            .constant(ConstantPoolEntry::Int(7))
            .build(&table)
            .unwrap();

        for env in both(&table) {
            assert!(!env.is_class_ref_value_type(user, 1).unwrap());
            assert!(env.is_class_ref_value_type(user, 2).unwrap());
            assert!(matches!(
                env.is_class_ref_value_type(user, 3),
                Err(Error::ConstantPoolKind { index: 3, .. })
            ));
            assert!(matches!(
                env.is_class_ref_value_type(user, 9),
                Err(Error::ConstantPoolIndex { index: 9, .. })
            ));
        }
    }

    #[test]
    fn test_local_mode_has_no_stream() {
        let table = Arc::new(ClassTable::new());
        let [local, remote] = both(&table);
        assert!(!local.is_remote());
        assert!(local.stream_stats().is_none());
        assert!(local.session().is_none());
        assert!(remote.is_remote());
        assert_eq!(remote.stream_stats().unwrap().round_trips(), 0);
    }
}
