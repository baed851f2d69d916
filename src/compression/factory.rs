use super::deflate::AdobeDeflateHandler;
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::zstd::ZstdHandler;
use crate::errors::{GeogridError, GeogridResult};
use crate::tiff::constants::compression;

pub struct CompressionFactory;

impl CompressionFactory {
    /// Handler for a TIFF compression code
    pub fn create_handler(code: u64) -> GeogridResult<Box<dyn CompressionHandler>> {
        match code {
            compression::NONE => Ok(Box::new(UncompressedHandler)),
            compression::DEFLATE | compression::DEFLATE_OLD => Ok(Box::new(AdobeDeflateHandler)),
            compression::ZSTD => Ok(Box::new(ZstdHandler)),
            _ => Err(GeogridError::UnsupportedCompression(code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(CompressionFactory::create_handler(1).unwrap().name(), "Uncompressed");
        assert_eq!(CompressionFactory::create_handler(8).unwrap().code(), 8);
        assert_eq!(CompressionFactory::create_handler(32946).unwrap().code(), 8);
        assert_eq!(CompressionFactory::create_handler(14).unwrap().name(), "ZSTD");
        assert!(matches!(
            CompressionFactory::create_handler(5),
            Err(GeogridError::UnsupportedCompression(5))
        ));
    }

    #[test]
    fn test_deflate_and_zstd_restore_input() {
        use std::io::Write;

        let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();

        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&data).unwrap();
        let deflated = encoder.finish().unwrap();
        let zstd_packed = zstd::encode_all(&data[..], 19).unwrap();

        for (code, packed) in [(8u64, deflated.clone()), (32946, deflated), (14, zstd_packed)] {
            let handler = CompressionFactory::create_handler(code).unwrap();
            assert_eq!(handler.decompress(&packed).unwrap(), data);
        }
    }

    #[test]
    fn test_corrupt_deflate_is_an_error() {
        let handler = AdobeDeflateHandler;
        assert!(handler.decompress(&[1, 2, 3, 4]).is_err());
    }
}
