use log::debug;

use super::handler::CompressionHandler;
use crate::errors::{GeogridError, GeogridResult};
use crate::tiff::constants::compression;

/// Zstandard (code 14)
pub struct ZstdHandler;

impl CompressionHandler for ZstdHandler {
    fn decompress(&self, data: &[u8]) -> GeogridResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let decompressed = zstd::decode_all(data)
            .map_err(|e| GeogridError::GenericError(format!("ZSTD decompression error: {}", e)))?;
        debug!("ZSTD decompressed {} bytes to {}", data.len(), decompressed.len());
        Ok(decompressed)
    }

    fn name(&self) -> &'static str {
        "ZSTD"
    }

    fn code(&self) -> u64 {
        compression::ZSTD
    }
}
