//! Cursor-based reader for descriptor bytes.
//!
//! [`Parser`] keeps a position inside a byte slice and offers bounds-checked reads of
//! little-endian integers and length-prefixed byte strings, which is all the descriptor byte
//! format needs.
//!
//! # Examples
//!
//! ```rust
//! use classenv::codec::Parser;
//!
//! let data = [0x03, 0x00, b'a', b'b', b'c', 0x2A, 0x00, 0x00, 0x00];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_prefixed_bytes()?, b"abc");
//! assert_eq!(parser.read_le::<u32>()?, 42);
//! assert!(!parser.has_more_data());
//! # Ok::<(), classenv::Error>(())
//! ```

use crate::{
    codec::io::{read_le_at, ByteIO},
    Result,
};

/// A binary data parser over a borrowed byte slice.
///
/// The parser maintains an internal position cursor and rejects reads that would run past
/// the end of the data, so truncated descriptor bytes surface as
/// [`crate::Error::OutOfBounds`] instead of a panic.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] from a byte slice.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Read a value of type `T` in little-endian format and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn read_le<T: ByteIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read `len` raw bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let Some(end) = self.position.checked_add(len) else {
            return Err(out_of_bounds_error!());
        };
        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Read a byte string prefixed with its `u16` length.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the prefix or the payload is truncated.
    pub fn read_prefixed_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_le::<u16>()?;
        self.read_bytes(usize::from(len))
    }
}
