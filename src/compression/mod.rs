//! Strip decompression
//!
//! One `CompressionHandler` per TIFF compression code, chosen by
//! `CompressionFactory` when a raster is opened.

mod handler;
mod uncompressed;
mod deflate;
mod factory;
mod zstd;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::AdobeDeflateHandler;
pub use factory::CompressionFactory;
pub use zstd::ZstdHandler;
