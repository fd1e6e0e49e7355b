//! Authoritative class data of the process that owns the loaded classes.
//!
//! - [`ClassTable`]: registry of loaded classes and interface-table nodes
//! - [`RuntimeClass`]: one loaded class
//! - [`ClassBuilder`]: fluent construction and registration of classes

mod builder;
mod class;
mod table;

pub use builder::{signature_width, ClassBuilder, REFERENCE_SIZE};
pub use class::{ITableEntry, RuntimeClass};
pub use table::ClassTable;
