use std::sync::Arc;

use crate::{
    access::ClassAccess,
    metadata::{
        ClassDescriptor, ClassHandle, FieldDescriptor, FlattenedField, ITableNode, InfoKind,
    },
    remote::{RemoteFetcher, Request, Stream, StreamStats},
    session::ClientSession,
    Result,
};

/// Access through a stream to the process that owns the classes.
///
/// Cacheable facts go through the session store; interface-table cursor steps and
/// authoritative flag reads always cost one round trip.
pub struct RemoteAccess {
    fetcher: RemoteFetcher,
}

impl RemoteAccess {
    /// Bind `stream` to `session`
    pub fn new(session: Arc<ClientSession>, stream: Box<dyn Stream>) -> Self {
        RemoteAccess {
            fetcher: RemoteFetcher::new(session, stream),
        }
    }

    /// The session this worker caches into
    #[must_use]
    pub fn session(&self) -> &Arc<ClientSession> {
        self.fetcher.session()
    }

    /// Round-trip counters of this worker's stream
    #[must_use]
    pub fn stats(&self) -> &Arc<StreamStats> {
        self.fetcher.stats()
    }
}

impl ClassAccess for RemoteAccess {
    fn is_remote(&self) -> bool {
        true
    }

    fn depth_and_flags(&self, class: ClassHandle) -> Result<u64> {
        self.fetcher.cached_word(class, InfoKind::DepthAndFlags)
    }

    fn class_flags(&self, class: ClassHandle) -> Result<u32> {
        self.fetcher.cached_flags(class)
    }

    fn authoritative_class_flags(&self, class: ClassHandle) -> Result<u32> {
        self.fetcher
            .request(&Request::ClassFlags(class))?
            .into_flags()
    }

    fn verify_class_flags(&self, class: ClassHandle, cached: u32, mask: u32) -> Result<()> {
        self.fetcher.verify_flags(class, cached, mask)
    }

    fn total_instance_size(&self, class: ClassHandle) -> Result<u64> {
        self.fetcher.cached_word(class, InfoKind::TotalInstanceSize)
    }

    fn superclasses(&self, class: ClassHandle) -> Result<Arc<[ClassHandle]>> {
        self.fetcher
            .cached(class, InfoKind::SuperClasses)?
            .into_classes()
    }

    fn indexed_superclass(&self, class: ClassHandle, index: usize) -> Result<ClassHandle> {
        // A cached chain answers without a round trip
        let store = self.session().store();
        if let Some(chain) = store.get(class, InfoKind::SuperClasses) {
            if let Some(superclass) = chain.into_classes()?.get(index) {
                return Ok(*superclass);
            }
        }

        let index = u32::try_from(index)
            .map_err(|_| malformed_error!("Superclass index {} exceeds 32 bits", index))?;
        self.fetcher
            .request(&Request::IndexedSuperClass(class, index))?
            .into_class()
    }

    fn descriptor(&self, class: ClassHandle) -> Result<Arc<ClassDescriptor>> {
        self.fetcher.descriptor(class)
    }

    fn descriptor_if_cached(&self, class: ClassHandle) -> Option<Arc<ClassDescriptor>> {
        self.fetcher.descriptor_if_cached(class)
    }

    fn itable_head(&self, class: ClassHandle) -> Result<Option<ITableNode>> {
        self.fetcher
            .request(&Request::InterfaceTableHead(class))?
            .into_node()
    }

    fn itable_next(&self, node: ITableNode) -> Result<Option<ITableNode>> {
        self.fetcher
            .request(&Request::InterfaceTableNext(node))?
            .into_node()
    }

    fn itable_interface(&self, node: ITableNode) -> Result<ClassHandle> {
        self.fetcher
            .request(&Request::InterfaceTableInterface(node))?
            .into_class()
    }

    fn itable_descriptor(&self, node: ITableNode) -> Result<Arc<ClassDescriptor>> {
        let bytes = self
            .fetcher
            .request(&Request::InterfaceTableInterfaceDescriptor(node))?
            .into_descriptor()?;
        Ok(Arc::new(ClassDescriptor::parse(&bytes)?))
    }

    fn interface_table(&self, class: ClassHandle) -> Result<Arc<[ClassHandle]>> {
        self.fetcher
            .cached(class, InfoKind::InterfaceTable)?
            .into_classes()
    }

    fn declared_fields(&self, class: ClassHandle) -> Result<Arc<[FieldDescriptor]>> {
        self.fetcher
            .cached(class, InfoKind::DeclaredFields)?
            .into_fields()
    }

    fn flattened_fields(&self, class: ClassHandle) -> Result<Arc<[FlattenedField]>> {
        self.fetcher
            .cached(class, InfoKind::FlattenedFields)?
            .into_flattened_fields()
    }
}
