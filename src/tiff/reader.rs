//! TIFF and BigTIFF directory reader
//!
//! Parses the header and the IFD chain. Pixel data is not touched here;
//! `TiffRaster` uses the parsed directory to locate strips.

use log::{debug, info, warn};
use std::io::{Cursor, SeekFrom};

use crate::errors::{GeogridError, GeogridResult};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::SeekableReader;
use crate::tiff::ifd::{IFDEntry, IFD};
use crate::tiff::types::TIFF;
use crate::tiff::validation;
use crate::utils::{format_utils, ifd_utils, tag_utils};

/// Stops runaway IFD chains in damaged files
const MAX_IFDS: usize = 100;

/// Reader for TIFF and BigTIFF directory structures
pub struct TiffReader {
    byte_order: ByteOrder,
    byte_order_handler: Box<dyn ByteOrderHandler>,
    is_big_tiff: bool,
}

impl TiffReader {
    /// Reads the header and every IFD from `reader`
    pub fn read(reader: &mut dyn SeekableReader) -> GeogridResult<(TiffReader, TIFF)> {
        reader.seek(SeekFrom::Start(0))?;
        let (byte_order, is_big_tiff) = format_utils::detect_tiff_format(reader)?;

        let tiff_reader = TiffReader {
            byte_order,
            byte_order_handler: byte_order.create_handler(),
            is_big_tiff,
        };

        let first_offset = ifd_utils::read_ifd_offset(reader, is_big_tiff, tiff_reader.handler())?;
        let file_size = validation::get_file_size(reader)?;
        validation::validate_ifd_offset(first_offset, file_size)?;
        debug!("First IFD offset: {}", first_offset);

        let mut tiff = TIFF::new(is_big_tiff, byte_order);
        tiff.ifds = tiff_reader.read_ifd_chain(reader, first_offset, file_size)?;

        info!("Read {} IFDs from TIFF file", tiff.ifds.len());
        Ok((tiff_reader, tiff))
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    fn handler(&self) -> &dyn ByteOrderHandler {
        self.byte_order_handler.as_ref()
    }

    /// Follows next-IFD offsets until the end of the chain
    ///
    /// The first directory must parse; damage further down the chain only
    /// truncates it, since only the first image is ever converted.
    fn read_ifd_chain(
        &self,
        reader: &mut dyn SeekableReader,
        first_offset: u64,
        file_size: u64,
    ) -> GeogridResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut offset = first_offset;

        while offset != 0 && ifds.len() < MAX_IFDS {
            let ifd = match self.read_ifd(reader, offset, ifds.len()) {
                Ok(ifd) => ifd,
                Err(e) if !ifds.is_empty() => {
                    warn!("Error reading IFD {}: {}, stopping IFD chain", ifds.len(), e);
                    break;
                }
                Err(e) => return Err(e),
            };

            let next = match ifd_utils::read_ifd_offset(reader, self.is_big_tiff, self.handler()) {
                Ok(next) => next,
                Err(e) => {
                    warn!("Error reading next IFD offset: {}", e);
                    0
                }
            };
            ifds.push(ifd);

            if next != 0 && validation::validate_ifd_offset(next, file_size).is_err() {
                warn!("Invalid next IFD offset: {}, stopping IFD chain", next);
                break;
            }
            offset = next;
        }

        Ok(ifds)
    }

    /// Reads one IFD; leaves the reader on its next-IFD offset field
    pub fn read_ifd(&self, reader: &mut dyn SeekableReader, offset: u64, number: usize) -> GeogridResult<IFD> {
        reader.seek(SeekFrom::Start(offset))?;
        let entry_count = ifd_utils::read_entry_count(reader, self.is_big_tiff, self.handler())?;
        debug!("IFD #{} at {} has {} entries", number, offset, entry_count);

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            ifd.add_entry(self.read_ifd_entry(reader)?);
        }
        Ok(ifd)
    }

    fn read_ifd_entry(&self, reader: &mut dyn SeekableReader) -> GeogridResult<IFDEntry> {
        let handler = self.handler();

        let tag = handler.read_u16(reader)?;
        let field_type = handler.read_u16(reader)?;
        let count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u32(reader)? as u64
        };

        let width = if self.is_big_tiff { 8 } else { 4 };
        let mut value_bytes = [0u8; 8];
        reader.read_exact(&mut value_bytes[..width])?;

        let mut field = Cursor::new(value_bytes);
        let value_offset = ifd_utils::read_ifd_offset(&mut field, self.is_big_tiff, handler)?;

        Ok(IFDEntry::new(tag, field_type, count, value_offset, value_bytes))
    }

    /// Reads all values of a tag as integers
    pub fn read_tag_values(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> GeogridResult<Vec<u64>> {
        let entry = ifd.get_entry(tag).ok_or(GeogridError::TagNotFound(tag))?;

        let mut values = Vec::new();
        values
            .try_reserve_exact(entry.count as usize)
            .map_err(|_| GeogridError::AllocationFailure {
                bytes: (entry.count as usize).saturating_mul(8),
            })?;

        if entry.is_value_inline(self.is_big_tiff) {
            let mut field = Cursor::new(entry.value_bytes);
            tag_utils::read_tag_value_array(&mut field, entry, self.handler(), &mut values)?;
        } else {
            reader.seek(SeekFrom::Start(entry.value_offset))?;
            tag_utils::read_tag_value_array(reader, entry, self.handler(), &mut values)?;
        }

        Ok(values)
    }

    /// First value of a tag, `None` when the tag is absent
    pub fn read_tag_value(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> GeogridResult<Option<u64>> {
        if !ifd.has_tag(tag) {
            return Ok(None);
        }
        Ok(self.read_tag_values(reader, ifd, tag)?.first().copied())
    }
}
