//! Flattened field layouts of class instances.
//!
//! [`crate::ClassEnv::enumerate_fields`] produces a [`TypeLayout`]: one entry per scalar or
//! reference slot, with flattened value fields expanded transitively and every offset
//! measured from the start of the object, header included.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use classenv::{ClassBuilder, ClassEnv, ClassTable, FieldModifiers};
//! use classenv::layout::DataKind;
//!
//! let table = Arc::new(ClassTable::new());
//! let point = ClassBuilder::new("demo/Point")
//!     .value_type(true)
//!     .field("x", "I", 0, FieldModifiers::FINAL)
//!     .field("y", "I", 4, FieldModifiers::FINAL)
//!     .build(&table)?;
//! let line = ClassBuilder::new("demo/Line")
//!     .flattened_field("start", point, 0, FieldModifiers::PRIVATE)
//!     .flattened_field("end", point, 8, FieldModifiers::PRIVATE)
//!     .build(&table)?;
//!
//! let env = ClassEnv::local(table);
//! let layout = env.enumerate_fields(line)?;
//! let names: Vec<&str> = layout.iter().map(|entry| entry.name.as_str()).collect();
//! assert_eq!(names, ["start.x", "start.y", "end.x", "end.y"]);
//! assert_eq!(layout.find("end.y").map(|entry| entry.offset), Some(8 + 8 + 4));
//! assert!(layout.iter().all(|entry| entry.kind == DataKind::Int32));
//! # Ok::<(), classenv::Error>(())
//! ```

mod enumerator;
mod types;

pub(crate) use enumerator::enumerate;
pub use types::{DataKind, TypeLayout, TypeLayoutBuilder, TypeLayoutEntry};
