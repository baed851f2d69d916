//! Offsets and sizes of directory structures

use crate::errors::GeogridResult;
use crate::io::byte_order::ByteOrderHandler;
use crate::io::SeekableReader;

/// Reads an IFD offset field: 8 bytes in BigTIFF, 4 otherwise
///
/// Used for both the header's first offset and each directory's next offset.
/// Zero marks the end of the chain.
pub fn read_ifd_offset(
    reader: &mut dyn SeekableReader,
    is_big_tiff: bool,
    handler: &dyn ByteOrderHandler,
) -> GeogridResult<u64> {
    if is_big_tiff {
        Ok(handler.read_u64(reader)?)
    } else {
        Ok(handler.read_u32(reader)? as u64)
    }
}

/// Reads a directory's entry count: 8 bytes in BigTIFF, 2 otherwise
pub fn read_entry_count(
    reader: &mut dyn SeekableReader,
    is_big_tiff: bool,
    handler: &dyn ByteOrderHandler,
) -> GeogridResult<u64> {
    if is_big_tiff {
        Ok(handler.read_u64(reader)?)
    } else {
        Ok(handler.read_u16(reader)? as u64)
    }
}
