//! Error types shared by the raster reader and the tiling pipeline

use std::fmt;
use std::io;

/// Errors raised while reading a raster or producing geogrid tiles
///
/// Every variant is fatal for a conversion run. Components return them
/// to the caller; only the binary entry point terminates the process.
#[derive(Debug)]
pub enum GeogridError {
    /// I/O error
    IoError(io::Error),
    /// A buffer of the given size could not be allocated
    AllocationFailure { bytes: usize },
    /// No conversion exists for this sample encoding and width
    UnsupportedEncoding { encoding: String, bytes_per_sample: usize },
    /// The source raster failed or returned a short read for a strip
    ReadFailure { strip: usize, message: String },
    /// A tile or pixel coordinate fell outside the grid
    OutOfRange(String),
    /// Invalid configuration value
    InvalidConfig(String),
    /// Invalid TIFF header
    InvalidHeader,
    /// Invalid byte order marker
    InvalidByteOrder(u16),
    /// Invalid BigTIFF header
    InvalidBigTIFFHeader,
    /// Unsupported TIFF version
    UnsupportedVersion(u16),
    /// Tag not found
    TagNotFound(u16),
    /// Unsupported field type
    UnsupportedFieldType(u16),
    /// Unsupported compression method
    UnsupportedCompression(u64),
    /// Image dimensions not found
    MissingDimensions,
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for GeogridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeogridError::IoError(e) => write!(f, "I/O error: {}", e),
            GeogridError::AllocationFailure { bytes } =>
                write!(f, "Couldn't allocate buffer of {} bytes", bytes),
            GeogridError::UnsupportedEncoding { encoding, bytes_per_sample } =>
                write!(f, "Unsupported bytes per sample={} for {}", bytes_per_sample, encoding),
            GeogridError::ReadFailure { strip, message } =>
                write!(f, "Read error on input strip number {}: {}", strip, message),
            GeogridError::OutOfRange(msg) => write!(f, "Out of range: {}", msg),
            GeogridError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            GeogridError::InvalidHeader => write!(f, "Invalid TIFF header"),
            GeogridError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            GeogridError::InvalidBigTIFFHeader => write!(f, "Invalid BigTIFF header"),
            GeogridError::UnsupportedVersion(v) => write!(f, "Unsupported TIFF version: {}", v),
            GeogridError::TagNotFound(tag) => write!(f, "Tag not found: {}", tag),
            GeogridError::UnsupportedFieldType(ft) => write!(f, "Unsupported field type: {}", ft),
            GeogridError::UnsupportedCompression(c) => write!(f, "Unsupported compression method: {}", c),
            GeogridError::MissingDimensions => write!(f, "Image dimensions not found"),
            GeogridError::GenericError(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for GeogridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeogridError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for GeogridError {
    fn from(error: io::Error) -> Self {
        GeogridError::IoError(error)
    }
}

impl From<String> for GeogridError {
    fn from(msg: String) -> Self {
        GeogridError::GenericError(msg)
    }
}

/// Result type for raster and tiling operations
pub type GeogridResult<T> = Result<T, GeogridError>;
