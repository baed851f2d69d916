//! Low level input helpers shared by the TIFF reader

pub mod byte_order;

use std::io::{Read, Seek};

/// Anything the TIFF reader can pull bytes from
///
/// Files, buffered files and in-memory cursors all qualify.
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}
