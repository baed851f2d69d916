use super::handler::CompressionHandler;
use crate::errors::GeogridResult;
use crate::tiff::constants::compression;

/// Strips stored as is (code 1)
pub struct UncompressedHandler;

impl CompressionHandler for UncompressedHandler {
    fn decompress(&self, data: &[u8]) -> GeogridResult<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn name(&self) -> &'static str {
        "Uncompressed"
    }

    fn code(&self) -> u64 {
        compression::NONE
    }
}
