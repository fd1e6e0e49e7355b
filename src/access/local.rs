use std::sync::Arc;

use crate::{
    access::ClassAccess,
    metadata::{ClassDescriptor, ClassHandle, FieldDescriptor, FlattenedField, ITableNode},
    runtime::ClassTable,
    Error, Result,
};

/// Direct access to the classes of the current process
#[derive(Clone)]
pub struct LocalAccess {
    table: Arc<ClassTable>,
}

impl LocalAccess {
    /// Read from `table`
    #[must_use]
    pub fn new(table: Arc<ClassTable>) -> Self {
        LocalAccess { table }
    }

    /// The table queries are answered from
    #[must_use]
    pub fn table(&self) -> &Arc<ClassTable> {
        &self.table
    }
}

impl ClassAccess for LocalAccess {
    fn is_remote(&self) -> bool {
        false
    }

    fn depth_and_flags(&self, class: ClassHandle) -> Result<u64> {
        Ok(self.table.get(class)?.depth_and_flags)
    }

    fn class_flags(&self, class: ClassHandle) -> Result<u32> {
        Ok(self.table.get(class)?.class_flags.bits())
    }

    fn authoritative_class_flags(&self, class: ClassHandle) -> Result<u32> {
        self.class_flags(class)
    }

    fn verify_class_flags(&self, _class: ClassHandle, _cached: u32, _mask: u32) -> Result<()> {
        Ok(())
    }

    fn total_instance_size(&self, class: ClassHandle) -> Result<u64> {
        Ok(self.table.get(class)?.total_instance_size)
    }

    fn superclasses(&self, class: ClassHandle) -> Result<Arc<[ClassHandle]>> {
        Ok(self.table.get(class)?.superclasses.clone())
    }

    fn indexed_superclass(&self, class: ClassHandle, index: usize) -> Result<ClassHandle> {
        let runtime = self.table.get(class)?;
        runtime
            .superclasses
            .get(index)
            .copied()
            .ok_or(Error::SuperclassIndexOutOfRange {
                class,
                index,
                depth: runtime.superclasses.len(),
            })
    }

    fn descriptor(&self, class: ClassHandle) -> Result<Arc<ClassDescriptor>> {
        Ok(self.table.get(class)?.descriptor.clone())
    }

    fn descriptor_if_cached(&self, class: ClassHandle) -> Option<Arc<ClassDescriptor>> {
        self.table
            .get(class)
            .ok()
            .map(|runtime| runtime.descriptor.clone())
    }

    fn itable_head(&self, class: ClassHandle) -> Result<Option<ITableNode>> {
        Ok(self.table.get(class)?.itable)
    }

    fn itable_next(&self, node: ITableNode) -> Result<Option<ITableNode>> {
        Ok(self.table.itable_entry(node)?.next)
    }

    fn itable_interface(&self, node: ITableNode) -> Result<ClassHandle> {
        Ok(self.table.itable_entry(node)?.interface)
    }

    fn itable_descriptor(&self, node: ITableNode) -> Result<Arc<ClassDescriptor>> {
        let interface = self.itable_interface(node)?;
        self.descriptor(interface)
    }

    fn interface_table(&self, class: ClassHandle) -> Result<Arc<[ClassHandle]>> {
        Ok(Arc::from(self.table.interface_table(class)?))
    }

    fn declared_fields(&self, class: ClassHandle) -> Result<Arc<[FieldDescriptor]>> {
        Ok(Arc::from(self.table.declared_fields(class)?))
    }

    fn flattened_fields(&self, class: ClassHandle) -> Result<Arc<[FlattenedField]>> {
        Ok(self.table.get(class)?.flattened.clone())
    }
}
