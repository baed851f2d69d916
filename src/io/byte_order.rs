//! Byte order handling
//!
//! TIFF files declare their byte order in the first two bytes. Header and
//! directory fields are read through a `ByteOrderHandler` for that order;
//! sample data is swapped to host order in bulk with `ByteOrder::to_native`.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::Result;

use crate::errors::{GeogridError, GeogridResult};
use crate::io::SeekableReader;

/// Byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// "II"
    LittleEndian,
    /// "MM"
    BigEndian,
}

impl ByteOrder {
    /// Reads the two byte order marker bytes at the reader's position
    pub fn detect(reader: &mut dyn SeekableReader) -> GeogridResult<Self> {
        let marker = reader.read_u16::<LittleEndian>()?;
        match marker {
            0x4949 => Ok(ByteOrder::LittleEndian),
            0x4D4D => Ok(ByteOrder::BigEndian),
            _ => Err(GeogridError::InvalidByteOrder(marker)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    pub fn create_handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndianHandler),
            ByteOrder::BigEndian => Box::new(BigEndianHandler),
        }
    }

    /// Byte order of the machine running this code
    pub fn host() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    pub fn is_native(&self) -> bool {
        *self == ByteOrder::host()
    }

    /// Swaps every `width`-byte sample in `data` from this order to host order
    ///
    /// Single byte samples and trailing partial samples are left alone.
    pub fn to_native(&self, data: &mut [u8], width: usize) {
        if self.is_native() || width < 2 {
            return;
        }

        for sample in data.chunks_exact_mut(width) {
            sample.reverse();
        }
    }
}

/// Reads multi-byte header and directory fields in one byte order
pub trait ByteOrderHandler: Send + Sync {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16>;

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32>;

    /// BigTIFF offsets and counts
    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64>;
}

pub struct LittleEndianHandler;

impl ByteOrderHandler for LittleEndianHandler {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        reader.read_u16::<LittleEndian>()
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        reader.read_u32::<LittleEndian>()
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        reader.read_u64::<LittleEndian>()
    }
}

pub struct BigEndianHandler;

impl ByteOrderHandler for BigEndianHandler {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        reader.read_u16::<BigEndian>()
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        reader.read_u32::<BigEndian>()
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        reader.read_u64::<BigEndian>()
    }
}
