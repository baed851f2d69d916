use crate::errors::GeogridResult;

/// Strategy for one compression method
pub trait CompressionHandler: Send + Sync {
    fn decompress(&self, data: &[u8]) -> GeogridResult<Vec<u8>>;

    fn name(&self) -> &'static str;

    /// Canonical TIFF compression code of the method
    fn code(&self) -> u64;
}
