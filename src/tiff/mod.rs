//! TIFF and BigTIFF strip reading
//!
//! Only what tiling needs: the header, the first image directory and
//! decoded strips. Tiled layouts are rejected at open time.

pub mod constants;
pub mod ifd;
pub mod predictor;
pub mod raster;
pub mod reader;
pub mod types;
pub(crate) mod validation;

#[cfg(test)]
mod tests;

pub use ifd::{IFDEntry, IFD};
pub use raster::TiffRaster;
pub use reader::TiffReader;
pub use types::TIFF;
