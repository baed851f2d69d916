//! Grid geometry for one raster-to-tile mapping
//!
//! `GeogridIndex` is built once per conversion and answers every size and
//! addressing question the other components have. Tile coordinates are
//! expressed in geogrid order: with `RowOrder::BottomTop` geogrid row 0 is
//! the last (southernmost) raster row.

use std::fmt;
use std::ops::Range;

use log::debug;

use crate::errors::{GeogridError, GeogridResult};
use crate::geogrid::conversion::SampleFormat;
use crate::geogrid::source::RasterMetadata;

/// Vertical orientation of the geogrid relative to the raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Geogrid row 0 is the bottom raster row
    BottomTop,
    /// Geogrid row 0 is the top raster row
    TopBottom,
}

impl RowOrder {
    pub fn name(&self) -> &'static str {
        match self {
            RowOrder::BottomTop => "bottom_top",
            RowOrder::TopBottom => "top_bottom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "bottom_top" | "bottom-top" => Some(RowOrder::BottomTop),
            "top_bottom" | "top-bottom" => Some(RowOrder::TopBottom),
            _ => None,
        }
    }
}

/// Describes how a raster is cut into tiles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeogridIndex {
    /// Raster width
    pub nx: usize,
    /// Raster height
    pub ny: usize,
    /// Band count
    pub nz: usize,
    /// Tile width
    pub tx: usize,
    /// Tile height
    pub ty: usize,
    /// Source sample format
    pub sample_format: SampleFormat,
    /// Samples stored per pixel in the source strips
    pub samples_per_pixel: usize,
    /// Orientation of the output rows
    pub row_order: RowOrder,
}

impl GeogridIndex {
    /// Builds an index from raster facts and the requested tile size
    pub fn from_metadata(
        metadata: &RasterMetadata,
        tx: usize,
        ty: usize,
        row_order: RowOrder,
    ) -> GeogridResult<Self> {
        let index = GeogridIndex {
            nx: metadata.nx,
            ny: metadata.ny,
            nz: metadata.nz,
            tx,
            ty,
            sample_format: metadata.sample_format,
            samples_per_pixel: metadata.samples_per_pixel,
            row_order,
        };
        index.validate()?;

        debug!("Geogrid index: {}", index);
        Ok(index)
    }

    /// Checks that every dimension is positive
    pub fn validate(&self) -> GeogridResult<()> {
        let fields = [
            ("nx", self.nx),
            ("ny", self.ny),
            ("nz", self.nz),
            ("tile_x", self.tx),
            ("tile_y", self.ty),
            ("samples_per_pixel", self.samples_per_pixel),
        ];

        for (name, value) in fields {
            if value == 0 {
                return Err(GeogridError::InvalidConfig(format!("{} must be positive", name)));
            }
        }

        // Re-check the format in case the index was assembled by hand
        SampleFormat::new(self.sample_format.encoding(), self.sample_format.bytes_per_sample())?;
        Ok(())
    }

    /// Number of tile columns
    pub fn tile_count_x(&self) -> usize {
        self.nx.div_ceil(self.tx)
    }

    /// Number of tile rows
    pub fn tile_count_y(&self) -> usize {
        self.ny.div_ceil(self.ty)
    }

    pub fn total_tile_count(&self) -> usize {
        self.tile_count_x() * self.tile_count_y()
    }

    /// Elements in one tile buffer, padding included
    pub fn tile_len(&self) -> usize {
        self.tx * self.ty * self.nz
    }

    /// Distance between vertically adjacent pixels in a raster buffer
    pub fn row_stride(&self) -> usize {
        self.nx
    }

    /// Distance between bands in a whole-raster buffer
    pub fn band_stride(&self) -> usize {
        self.nx * self.ny
    }

    /// Distance between bands in a buffer holding only `rows` rows per band
    pub fn band_stride_decomposed(&self, rows: usize) -> usize {
        self.nx * rows
    }

    /// Pixel position of a tile's first cell in geogrid coordinates
    pub fn tile_origin(&self, tile_x: usize, tile_y: usize) -> GeogridResult<(usize, usize)> {
        self.check_tile(tile_x, tile_y)?;
        Ok((tile_x * self.tx, tile_y * self.ty))
    }

    /// Columns of tile column `tile_x` that hold raster data
    pub fn tile_columns(&self, tile_x: usize) -> GeogridResult<usize> {
        let (x0, _) = self.tile_origin(tile_x, 0)?;
        Ok(self.tx.min(self.nx - x0))
    }

    /// Rows of tile row `tile_y` that hold raster data
    pub fn tile_rows(&self, tile_y: usize) -> GeogridResult<usize> {
        let (_, y0) = self.tile_origin(0, tile_y)?;
        Ok(self.ty.min(self.ny - y0))
    }

    /// Raster rows covered by tile row `tile_y`, as a half-open range
    pub fn band_span(&self, tile_y: usize) -> GeogridResult<Range<usize>> {
        let (_, y0) = self.tile_origin(0, tile_y)?;
        let rows = self.tile_rows(tile_y)?;

        Ok(match self.row_order {
            RowOrder::TopBottom => y0..y0 + rows,
            RowOrder::BottomTop => (self.ny - y0 - rows)..(self.ny - y0),
        })
    }

    /// Tile row containing a raster row
    pub fn tile_row_of(&self, raster_row: usize) -> GeogridResult<usize> {
        Ok(self.grid_row(raster_row)? / self.ty)
    }

    /// Maps a geogrid row to the raster row it holds
    pub fn raster_row(&self, grid_row: usize) -> GeogridResult<usize> {
        if grid_row >= self.ny {
            return Err(GeogridError::OutOfRange(format!(
                "grid row {} outside raster height {}",
                grid_row, self.ny
            )));
        }

        Ok(self.flip(grid_row))
    }

    /// Maps a raster row to its geogrid row
    pub fn grid_row(&self, raster_row: usize) -> GeogridResult<usize> {
        if raster_row >= self.ny {
            return Err(GeogridError::OutOfRange(format!(
                "raster row {} outside raster height {}",
                raster_row, self.ny
            )));
        }

        Ok(self.flip(raster_row))
    }

    fn flip(&self, row: usize) -> usize {
        match self.row_order {
            RowOrder::TopBottom => row,
            RowOrder::BottomTop => self.ny - 1 - row,
        }
    }

    fn check_tile(&self, tile_x: usize, tile_y: usize) -> GeogridResult<()> {
        if tile_x >= self.tile_count_x() || tile_y >= self.tile_count_y() {
            return Err(GeogridError::OutOfRange(format!(
                "tile ({}, {}) outside {}x{} tile grid",
                tile_x,
                tile_y,
                self.tile_count_x(),
                self.tile_count_y()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for GeogridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{} raster, {}x{} tiles ({} x {} = {}), {}/{} bytes, {}",
            self.nx,
            self.ny,
            self.nz,
            self.tx,
            self.ty,
            self.tile_count_x(),
            self.tile_count_y(),
            self.total_tile_count(),
            self.sample_format.encoding(),
            self.sample_format.bytes_per_sample(),
            self.row_order.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geogrid::conversion::SampleEncoding;

    fn index(nx: usize, ny: usize, tx: usize, ty: usize, order: RowOrder) -> GeogridIndex {
        GeogridIndex {
            nx,
            ny,
            nz: 1,
            tx,
            ty,
            sample_format: SampleFormat::new(SampleEncoding::IeeeFloat, 4).unwrap(),
            samples_per_pixel: 1,
            row_order: order,
        }
    }

    #[test]
    fn test_example_grid() {
        let idx = index(10, 7, 4, 4, RowOrder::TopBottom);
        assert_eq!(idx.tile_count_x(), 3);
        assert_eq!(idx.tile_count_y(), 2);
        assert_eq!(idx.total_tile_count(), 6);

        assert_eq!(idx.tile_origin(2, 1).unwrap(), (8, 4));
        assert_eq!(idx.tile_columns(2).unwrap(), 2);
        assert_eq!(idx.tile_rows(1).unwrap(), 3);
        assert_eq!(idx.band_span(1).unwrap(), 4..7);
    }

    #[test]
    fn test_tile_counts_cover_raster() {
        for nx in 1..40 {
            for tx in 1..12 {
                let idx = index(nx, nx + 3, tx, tx + 1, RowOrder::TopBottom);
                assert!(idx.tile_count_x() * idx.tx >= idx.nx);
                assert!((idx.tile_count_x() - 1) * idx.tx < idx.nx);
                assert!(idx.tile_count_y() * idx.ty >= idx.ny);
                assert!((idx.tile_count_y() - 1) * idx.ty < idx.ny);
                assert_eq!(idx.total_tile_count(), idx.tile_count_x() * idx.tile_count_y());
            }
        }
    }

    #[test]
    fn test_tile_origin_out_of_range() {
        let idx = index(10, 7, 4, 4, RowOrder::TopBottom);
        assert!(matches!(idx.tile_origin(3, 0), Err(GeogridError::OutOfRange(_))));
        assert!(matches!(idx.tile_origin(0, 2), Err(GeogridError::OutOfRange(_))));
    }

    #[test]
    fn test_strides() {
        let mut idx = index(10, 7, 4, 4, RowOrder::TopBottom);
        idx.nz = 3;
        assert_eq!(idx.row_stride(), 10);
        assert_eq!(idx.band_stride(), 70);
        assert_eq!(idx.band_stride_decomposed(4), 40);
        assert_eq!(idx.tile_len(), 48);
    }

    #[test]
    fn test_bottom_top_spans() {
        let idx = index(10, 7, 4, 4, RowOrder::BottomTop);
        // Band 0 is the bottom four raster rows, band 1 the remaining top three
        assert_eq!(idx.band_span(0).unwrap(), 3..7);
        assert_eq!(idx.band_span(1).unwrap(), 0..3);
        assert_eq!(idx.raster_row(0).unwrap(), 6);
        assert_eq!(idx.grid_row(6).unwrap(), 0);
        assert_eq!(idx.tile_row_of(2).unwrap(), 1);
        assert!(idx.raster_row(7).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_tile() {
        let idx = index(10, 7, 0, 4, RowOrder::TopBottom);
        assert!(matches!(idx.validate(), Err(GeogridError::InvalidConfig(_))));
    }

    #[test]
    fn test_row_order_names() {
        assert_eq!(RowOrder::from_name("bottom_top"), Some(RowOrder::BottomTop));
        assert_eq!(RowOrder::from_name("TOP_BOTTOM"), Some(RowOrder::TopBottom));
        assert_eq!(RowOrder::from_name("sideways"), None);
    }
}
