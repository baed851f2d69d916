use std::io::Read;

use flate2::read::ZlibDecoder;

use super::handler::CompressionHandler;
use crate::errors::{GeogridError, GeogridResult};
use crate::tiff::constants::compression;

/// zlib streams, codes 8 and 32946
pub struct AdobeDeflateHandler;

impl CompressionHandler for AdobeDeflateHandler {
    fn decompress(&self, data: &[u8]) -> GeogridResult<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| GeogridError::GenericError(format!("Deflate decompression error: {}", e)))?;
        Ok(decompressed)
    }

    fn name(&self) -> &'static str {
        "Adobe Deflate"
    }

    fn code(&self) -> u64 {
        compression::DEFLATE
    }
}
