//! Byte-level helpers for the read-only class descriptor format.
//!
//! - [`io`] - little-endian primitives ([`ByteIO`], [`read_le_at`], [`write_le`])
//! - [`parser`] - the cursor-based [`Parser`]

pub mod io;
pub mod parser;

pub use io::{read_le_at, write_le, ByteIO};
pub use parser::Parser;
