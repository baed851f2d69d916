//! Boundary between the tiling pipeline and a raster decoder
//!
//! The pipeline only needs the raster's shape, its sample format and a way
//! to pull one encoded strip at a time. Anything that can provide that can
//! be tiled.

use crate::errors::GeogridResult;
use crate::geogrid::conversion::SampleFormat;

/// How bands are arranged in the source strips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanarLayout {
    /// Every strip holds all bands, interleaved per pixel
    Interleaved,
    /// Each band is a separate plane of strips, stored plane after plane
    Planar,
}

/// Facts about the source raster the tiling pipeline relies on
#[derive(Debug, Clone, PartialEq)]
pub struct RasterMetadata {
    /// Raster width in pixels
    pub nx: usize,
    /// Raster height in pixels
    pub ny: usize,
    /// Number of bands
    pub nz: usize,
    /// Encoding and width of one sample
    pub sample_format: SampleFormat,
    /// Samples physically stored per pixel within one strip
    pub samples_per_pixel: usize,
    /// Raster rows per strip (the last strip of a plane may hold fewer)
    pub strip_height: usize,
    /// Total number of strips over all planes
    pub total_strips: usize,
    /// Band arrangement
    pub layout: PlanarLayout,
}

impl RasterMetadata {
    /// Number of strips covering one band plane
    pub fn strips_per_plane(&self) -> usize {
        self.ny.div_ceil(self.strip_height)
    }

    /// Number of separately stored planes
    pub fn plane_count(&self) -> usize {
        match self.layout {
            PlanarLayout::Interleaved => 1,
            PlanarLayout::Planar => self.nz,
        }
    }

    /// Rows actually held by strip `strip` of a plane
    pub fn rows_in_strip(&self, strip_in_plane: usize) -> usize {
        let start = strip_in_plane * self.strip_height;
        self.strip_height.min(self.ny.saturating_sub(start))
    }

    /// Bytes of one decoded raster row within a single strip
    pub fn row_bytes(&self) -> usize {
        self.nx * self.samples_per_pixel * self.sample_format.bytes_per_sample()
    }

    /// Bytes a full decoded strip occupies
    pub fn strip_bytes(&self) -> usize {
        self.row_bytes() * self.strip_height
    }
}

/// A raster that can be read one encoded strip at a time
///
/// `read_encoded_strip` blocks until the strip is decoded into `dest` and
/// returns the number of bytes written. Samples must be delivered in host
/// byte order.
pub trait RasterSource {
    /// Shape and format of the raster
    fn metadata(&self) -> &RasterMetadata;

    /// Decodes strip `strip` into `dest`
    fn read_encoded_strip(&mut self, strip: usize, dest: &mut [u8]) -> GeogridResult<usize>;
}

impl<S: RasterSource + ?Sized> RasterSource for Box<S> {
    fn metadata(&self) -> &RasterMetadata {
        (**self).metadata()
    }

    fn read_encoded_strip(&mut self, strip: usize, dest: &mut [u8]) -> GeogridResult<usize> {
        (**self).read_encoded_strip(strip, dest)
    }
}
