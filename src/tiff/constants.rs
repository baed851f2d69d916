//! TIFF numeric constants used by the strip reader

/// Header fields
pub mod header {
    pub const TIFF_VERSION: u16 = 42;
    pub const BIG_TIFF_VERSION: u16 = 43;
    /// BigTIFF offsets are always eight bytes wide
    pub const BIGTIFF_OFFSET_SIZE: u16 = 8;
    /// Smallest legal directory offset (past the classic header)
    pub const MIN_IFD_OFFSET: u64 = 8;
}

/// Directory entry field types
pub mod field_types {
    pub const BYTE: u16 = 1;
    pub const ASCII: u16 = 2;
    pub const SHORT: u16 = 3;
    pub const LONG: u16 = 4;
    pub const RATIONAL: u16 = 5;
    pub const SBYTE: u16 = 6;
    pub const UNDEFINED: u16 = 7;
    pub const SSHORT: u16 = 8;
    pub const SLONG: u16 = 9;
    pub const SRATIONAL: u16 = 10;
    pub const FLOAT: u16 = 11;
    pub const DOUBLE: u16 = 12;
    pub const IFD: u16 = 13;
    pub const LONG8: u16 = 16;
    pub const SLONG8: u16 = 17;
    pub const IFD8: u16 = 18;
}

/// Tags read when opening a stripped raster
pub mod tags {
    pub const NEW_SUBFILE_TYPE: u16 = 254;
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const PLANAR_CONFIGURATION: u16 = 284;
    pub const PREDICTOR: u16 = 317;
    pub const TILE_WIDTH: u16 = 322;
    pub const TILE_LENGTH: u16 = 323;
    pub const TILE_OFFSETS: u16 = 324;
    pub const TILE_BYTE_COUNTS: u16 = 325;
    pub const SAMPLE_FORMAT: u16 = 339;
    pub const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
    pub const MODEL_TIEPOINT_TAG: u16 = 33922;
    pub const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
    pub const GDAL_NODATA: u16 = 42113;
}

/// Compression codes
pub mod compression {
    pub const NONE: u64 = 1;
    pub const DEFLATE: u64 = 8;
    pub const ZSTD: u64 = 14;
    /// Pre-standard code for the same zlib stream as `DEFLATE`
    pub const DEFLATE_OLD: u64 = 32946;
}

pub mod planar_config {
    pub const CHUNKY: u64 = 1;
    pub const PLANAR: u64 = 2;
}

pub mod sample_format {
    pub const UNSIGNED: u64 = 1;
    pub const SIGNED: u64 = 2;
    pub const IEEEFP: u64 = 3;
}

pub mod predictor {
    pub const NONE: u64 = 1;
    pub const HORIZONTAL_DIFFERENCING: u64 = 2;
    pub const FLOATING_POINT: u64 = 3;
}
