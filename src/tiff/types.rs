//! Parsed TIFF file structure

use std::fmt;

use crate::io::byte_order::ByteOrder;
use crate::tiff::ifd::IFD;

/// Header facts plus every directory of a TIFF file
#[derive(Debug)]
pub struct TIFF {
    pub ifds: Vec<IFD>,
    pub is_big_tiff: bool,
    pub byte_order: ByteOrder,
}

impl TIFF {
    pub fn new(is_big_tiff: bool, byte_order: ByteOrder) -> Self {
        TIFF {
            ifds: Vec::new(),
            is_big_tiff,
            byte_order,
        }
    }

    /// The full resolution image; later directories are ignored
    pub fn main_ifd(&self) -> Option<&IFD> {
        self.ifds.first()
    }

    pub fn ifd_count(&self) -> usize {
        self.ifds.len()
    }
}

impl fmt::Display for TIFF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TIFF File:")?;
        writeln!(f, "  Format: {}", if self.is_big_tiff { "BigTIFF" } else { "TIFF" })?;
        writeln!(f, "  Byte order: {}", self.byte_order.name())?;
        writeln!(f, "  Number of IFDs: {}", self.ifd_count())?;
        if let Some(ifd) = self.main_ifd() {
            write!(f, "{}", ifd)?;
        }
        Ok(())
    }
}
