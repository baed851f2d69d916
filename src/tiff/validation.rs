//! Sanity checks applied while walking a TIFF file

use log::{debug, warn};
use std::io::SeekFrom;

use crate::errors::{GeogridError, GeogridResult};
use crate::io::byte_order::ByteOrderHandler;
use crate::io::SeekableReader;
use crate::tiff::constants::header;

/// Rejects directory offsets that point into the header or past the end
pub fn validate_ifd_offset(offset: u64, file_size: u64) -> GeogridResult<()> {
    if offset >= file_size || offset < header::MIN_IFD_OFFSET {
        return Err(GeogridError::GenericError(format!(
            "Invalid IFD offset: {} (file size: {})",
            offset, file_size
        )));
    }
    Ok(())
}

/// Rejects data ranges that run past the end of the file
pub fn validate_data_range(offset: u64, length: u64, file_size: u64, what: &str) -> GeogridResult<()> {
    match offset.checked_add(length) {
        Some(end) if end <= file_size => Ok(()),
        _ => Err(GeogridError::GenericError(format!(
            "{} at offset {} with length {} runs past end of file ({} bytes)",
            what, offset, length, file_size
        ))),
    }
}

/// Length of the underlying stream, restoring the current position
///
/// Returns `u64::MAX` when the stream cannot seek to its end.
pub fn get_file_size(reader: &mut dyn SeekableReader) -> GeogridResult<u64> {
    let position = reader.stream_position()?;
    let size = match reader.seek(SeekFrom::End(0)) {
        Ok(size) => size,
        Err(e) => {
            warn!("Could not determine file size: {}", e);
            u64::MAX
        }
    };
    reader.seek(SeekFrom::Start(position))?;
    Ok(size)
}

/// Checks the two BigTIFF header fields following the version number
pub fn validate_bigtiff_header(
    reader: &mut dyn SeekableReader,
    handler: &dyn ByteOrderHandler,
) -> GeogridResult<()> {
    let offset_size = handler.read_u16(reader)?;
    let reserved = handler.read_u16(reader)?;
    debug!("BigTIFF offset size {}, reserved {}", offset_size, reserved);

    if offset_size != header::BIGTIFF_OFFSET_SIZE || reserved != 0 {
        return Err(GeogridError::InvalidBigTIFFHeader);
    }
    Ok(())
}
