//! Tests for header and directory parsing

extern crate std;

use std::io::Cursor;

use super::test_utils::StripTiff;
use crate::errors::GeogridError;
use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::tags;
use crate::tiff::reader::TiffReader;

#[test]
fn test_reads_classic_directory() {
    let mut cursor = StripTiff::new(200, 100, 8, 1).cursor(|_, _, _| 0.0);
    let (reader, tiff) = TiffReader::read(&mut cursor).unwrap();

    std::assert!(!tiff.is_big_tiff);
    std::assert_eq!(tiff.byte_order, ByteOrder::LittleEndian);
    std::assert_eq!(tiff.ifd_count(), 1);

    let ifd = tiff.main_ifd().unwrap();
    std::assert!(ifd.has_tag(tags::STRIP_OFFSETS));
    std::assert!(!ifd.is_tiled());
    std::assert_eq!(reader.read_tag_value(&mut cursor, ifd, tags::IMAGE_WIDTH).unwrap(), Some(200));
    std::assert_eq!(reader.read_tag_value(&mut cursor, ifd, tags::IMAGE_LENGTH).unwrap(), Some(100));
    std::assert_eq!(reader.read_tag_value(&mut cursor, ifd, tags::PREDICTOR).unwrap(), None);
}

#[test]
fn test_inline_shorts_in_big_endian() {
    let mut spec = StripTiff::new(7, 3, 16, 2);
    spec.big_endian = true;
    spec.bands = 2;
    let mut cursor = spec.cursor(|_, _, _| 0.0);

    let (reader, tiff) = TiffReader::read(&mut cursor).unwrap();
    let ifd = tiff.main_ifd().unwrap();

    // Two SHORTs fill the 4-byte value field exactly
    std::assert_eq!(reader.read_tag_values(&mut cursor, ifd, tags::BITS_PER_SAMPLE).unwrap(), std::vec![16, 16]);
    std::assert_eq!(reader.read_tag_value(&mut cursor, ifd, tags::SAMPLES_PER_PIXEL).unwrap(), Some(2));
    std::assert_eq!(reader.read_tag_value(&mut cursor, ifd, tags::IMAGE_WIDTH).unwrap(), Some(7));
}

#[test]
fn test_external_arrays() {
    let mut spec = StripTiff::new(4, 10, 8, 1);
    spec.rows_per_strip = 1;
    let mut cursor = spec.cursor(|_, _, _| 0.0);

    let (reader, tiff) = TiffReader::read(&mut cursor).unwrap();
    let ifd = tiff.main_ifd().unwrap();
    let offsets = reader.read_tag_values(&mut cursor, ifd, tags::STRIP_OFFSETS).unwrap();
    let counts = reader.read_tag_values(&mut cursor, ifd, tags::STRIP_BYTE_COUNTS).unwrap();

    std::assert_eq!(offsets.len(), 10);
    std::assert_eq!(offsets[0], 8);
    std::assert_eq!(offsets[9], 8 + 9 * 4);
    std::assert!(counts.iter().all(|&c| c == 4));
}

#[test]
fn test_reads_bigtiff() {
    let mut spec = StripTiff::new(64, 48, 32, 3);
    spec.big_tiff = true;
    spec.rows_per_strip = 16;
    let mut cursor = spec.cursor(|_, _, _| 0.0);

    let (reader, tiff) = TiffReader::read(&mut cursor).unwrap();
    std::assert!(tiff.is_big_tiff);
    std::assert!(reader.is_big_tiff());

    let ifd = tiff.main_ifd().unwrap();
    std::assert_eq!(reader.read_tag_value(&mut cursor, ifd, tags::IMAGE_WIDTH).unwrap(), Some(64));
    // Three LONG8 offsets do not fit inline
    std::assert_eq!(reader.read_tag_values(&mut cursor, ifd, tags::STRIP_OFFSETS).unwrap().len(), 3);
}

#[test]
fn test_missing_tag() {
    let mut cursor = StripTiff::new(2, 2, 8, 1).cursor(|_, _, _| 0.0);
    let (reader, tiff) = TiffReader::read(&mut cursor).unwrap();
    let ifd = tiff.main_ifd().unwrap();

    std::assert!(std::matches!(
        reader.read_tag_values(&mut cursor, ifd, tags::TILE_WIDTH),
        Err(GeogridError::TagNotFound(tags::TILE_WIDTH))
    ));
}

#[test]
fn test_rejects_bad_headers() {
    let mut cursor = Cursor::new(std::vec![0x49, 0x49, 41, 0, 8, 0, 0, 0]);
    std::assert!(std::matches!(TiffReader::read(&mut cursor), Err(GeogridError::UnsupportedVersion(41))));

    let mut cursor = Cursor::new(std::vec![0x49, 0x49, 43, 0, 4, 0, 0, 0, 16, 0, 0, 0, 0, 0, 0, 0]);
    std::assert!(std::matches!(TiffReader::read(&mut cursor), Err(GeogridError::InvalidBigTIFFHeader)));

    let mut cursor = Cursor::new(std::vec![0x49, 0x49, 42, 0, 200, 0, 0, 0]);
    std::assert!(TiffReader::read(&mut cursor).is_err());
}
