//! The owning side of the protocol.
//!
//! [`MetadataServer`] answers every [`Request`] from the authoritative [`ClassTable`]. It is
//! the process-side counterpart of a remote compilation worker: the worker never sees a
//! [`crate::runtime::RuntimeClass`], only the projections returned here.

use std::{
    io::{Read, Write},
    sync::Arc,
};

use tracing::debug;

use crate::{
    metadata::ITableNode,
    remote::{
        message::{decode, encode},
        stream::{read_frame, write_frame},
        Request, Response,
    },
    runtime::ClassTable,
    Error, Result,
};

/// Answers metadata requests from a [`ClassTable`]
#[derive(Clone)]
pub struct MetadataServer {
    table: Arc<ClassTable>,
}

impl MetadataServer {
    /// Serve requests about the classes in `table`
    #[must_use]
    pub fn new(table: Arc<ClassTable>) -> Self {
        MetadataServer { table }
    }

    /// The table requests are answered from
    #[must_use]
    pub fn table(&self) -> &Arc<ClassTable> {
        &self.table
    }

    /// Answer one request.
    ///
    /// Lookup failures travel back as [`Response::UnknownClass`], [`Response::UnknownNode`]
    /// or [`Response::SuperclassIndexOutOfRange`] so the worker raises the same error a local
    /// lookup would; any other failure becomes [`Response::Error`].
    #[must_use]
    pub fn handle(&self, request: &Request) -> Response {
        debug!(request = request.kind(), "serving metadata request");
        match self.answer(request) {
            Ok(response) => response,
            Err(Error::UnknownClass(class)) => Response::UnknownClass(class),
            Err(Error::UnknownITableNode(node)) => Response::UnknownNode(node),
            Err(Error::SuperclassIndexOutOfRange {
                class,
                index,
                depth,
            }) => Response::SuperclassIndexOutOfRange {
                class,
                index,
                depth,
            },
            Err(error) => Response::Error(error.to_string()),
        }
    }

    fn answer(&self, request: &Request) -> Result<Response> {
        let table = &self.table;
        Ok(match *request {
            Request::ClassFlags(class) => Response::Flags(table.get(class)?.class_flags.bits()),
            Request::DepthAndFlags(class) => Response::Word(table.get(class)?.depth_and_flags),
            Request::TotalInstanceSize(class) => {
                Response::Word(table.get(class)?.total_instance_size)
            }
            Request::SuperClasses(class) => {
                Response::Classes(table.get(class)?.superclasses.to_vec())
            }
            Request::IndexedSuperClass(class, index) => {
                let runtime = table.get(class)?;
                let superclass = runtime.superclasses.get(index as usize).copied().ok_or(
                    Error::SuperclassIndexOutOfRange {
                        class,
                        index: index as usize,
                        depth: runtime.superclasses.len(),
                    },
                )?;
                Response::Class(superclass)
            }
            Request::InterfaceTableHead(class) => Response::Node(table.get(class)?.itable),
            Request::InterfaceTableNext(node) => Response::Node(table.itable_entry(node)?.next),
            Request::InterfaceTableInterface(node) => {
                Response::Class(table.itable_entry(node)?.interface)
            }
            Request::InterfaceTableInterfaceDescriptor(node) => {
                Response::Descriptor(self.interface_descriptor(node)?)
            }
            Request::InterfaceTable(class) => Response::Classes(table.interface_table(class)?),
            Request::DescriptorBytes(class) => {
                Response::Descriptor(table.get(class)?.descriptor.to_bytes()?)
            }
            Request::DeclaredFields(class) => Response::Fields(table.declared_fields(class)?),
            Request::FlattenedFields(class) => {
                Response::FlattenedFields(table.get(class)?.flattened.to_vec())
            }
        })
    }

    fn interface_descriptor(&self, node: ITableNode) -> Result<Vec<u8>> {
        let interface = self.table.itable_entry(node)?.interface;
        self.table.get(interface)?.descriptor.to_bytes()
    }

    /// Answer framed requests from `reader` on `writer` until the peer closes the stream.
    ///
    /// Returns the number of requests served.
    ///
    /// # Errors
    /// Returns an error if a frame cannot be read, decoded or written. Failures of individual
    /// requests are reported to the peer and do not end the loop.
    pub fn serve<R: Read, W: Write>(&self, mut reader: R, mut writer: W) -> Result<u64> {
        let mut served = 0;
        while let Some(frame) = read_frame(&mut reader)? {
            let request: Request = decode(&frame)?;
            let response = self.handle(&request);
            write_frame(&mut writer, &encode(&response)?)?;
            served += 1;
        }
        debug!(served, "metadata stream closed by peer");
        Ok(served)
    }
}
