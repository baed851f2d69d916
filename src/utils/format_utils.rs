//! Header level format detection

use log::debug;

use crate::errors::{GeogridError, GeogridResult};
use crate::io::byte_order::ByteOrder;
use crate::io::SeekableReader;
use crate::tiff::constants::header;
use crate::tiff::validation;

/// Reads the byte order marker and version number at the start of a file
///
/// Returns the byte order and whether the file is BigTIFF. The reader is
/// left positioned at the first IFD offset field.
pub fn detect_tiff_format(reader: &mut dyn SeekableReader) -> GeogridResult<(ByteOrder, bool)> {
    let byte_order = ByteOrder::detect(reader)?;
    debug!("Detected byte order: {}", byte_order.name());

    let handler = byte_order.create_handler();
    let version = handler.read_u16(reader)?;

    let is_big_tiff = match version {
        header::BIG_TIFF_VERSION => {
            validation::validate_bigtiff_header(reader, handler.as_ref())?;
            true
        }
        header::TIFF_VERSION => false,
        _ => return Err(GeogridError::UnsupportedVersion(version)),
    };

    debug!("Detected {} format", if is_big_tiff { "BigTIFF" } else { "standard TIFF" });
    Ok((byte_order, is_big_tiff))
}
