//! Tile buffers and extraction
//!
//! Tiles are filled either from a block holding the whole raster
//! ([`extract_tile`]) or incrementally from row groups as they are read
//! ([`TileAssembler`]). Both address tiles through the same
//! [`GeogridIndex`] geometry.

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::errors::{GeogridError, GeogridResult};
use crate::geogrid::conversion::alloc_zeroed;
use crate::geogrid::index::GeogridIndex;
use crate::geogrid::ingestion::RowBlock;

/// Samples of one output tile
///
/// The cell of band `z`, tile row `y`, tile column `x` is stored at
/// `z * tx * ty + y * tx + x`. Cells outside the raster keep the fill value.
#[derive(Debug, Clone, PartialEq)]
pub struct TileBuffer {
    pub tile_x: usize,
    pub tile_y: usize,
    pub tx: usize,
    pub ty: usize,
    pub nz: usize,
    pub data: Vec<f32>,
}

impl TileBuffer {
    /// Reads one cell
    pub fn get(&self, band: usize, row: usize, col: usize) -> Option<f32> {
        if band >= self.nz || row >= self.ty || col >= self.tx {
            return None;
        }
        self.data.get(band * self.tx * self.ty + row * self.tx + col).copied()
    }

    /// Sets every cell at column `x0` or beyond, or at row `y0` or beyond, to `value`
    ///
    /// Used to pre-fill the padding of edge tiles before data is copied in.
    pub fn fill_region(&mut self, value: f32, x0: usize, y0: usize) -> GeogridResult<()> {
        if x0 > self.tx || y0 > self.ty {
            return Err(GeogridError::OutOfRange(format!(
                "fill origin ({}, {}) outside {}x{} tile",
                x0, y0, self.tx, self.ty
            )));
        }

        let plane = self.tx * self.ty;
        for band in 0..self.nz {
            for row in 0..self.ty {
                let start = band * plane + row * self.tx;
                let from = if row >= y0 { 0 } else { x0 };
                self.data[start + from..start + self.tx].fill(value);
            }
        }

        Ok(())
    }
}

/// Allocates a zeroed tile buffer for tile `(tile_x, tile_y)`
pub fn allocate_tile_buffer(index: &GeogridIndex, tile_x: usize, tile_y: usize) -> GeogridResult<TileBuffer> {
    index.tile_origin(tile_x, tile_y)?;

    Ok(TileBuffer {
        tile_x,
        tile_y,
        tx: index.tx,
        ty: index.ty,
        nz: index.nz,
        data: alloc_zeroed::<f32>(index.tile_len())?,
    })
}

/// Allocates a tile buffer with its padding set to `fill_value`
fn allocate_padded(index: &GeogridIndex, tile_x: usize, tile_y: usize, fill_value: f32) -> GeogridResult<TileBuffer> {
    let mut tile = allocate_tile_buffer(index, tile_x, tile_y)?;
    if fill_value != 0.0 {
        tile.fill_region(fill_value, index.tile_columns(tile_x)?, index.tile_rows(tile_y)?)?;
    }
    Ok(tile)
}

/// Copies tile `(tile_x, tile_y)` out of a block covering its rows
///
/// Usually `block` holds the whole raster. Padding cells are zero.
pub fn extract_tile(index: &GeogridIndex, block: &RowBlock, tile_x: usize, tile_y: usize) -> GeogridResult<TileBuffer> {
    extract_tile_filled(index, block, tile_x, tile_y, 0.0)
}

/// Same as [`extract_tile`] with an explicit padding value
pub fn extract_tile_filled(
    index: &GeogridIndex,
    block: &RowBlock,
    tile_x: usize,
    tile_y: usize,
    fill_value: f32,
) -> GeogridResult<TileBuffer> {
    check_block_shape(index, block)?;
    let span = index.band_span(tile_y)?;
    if span.start < block.first_row || span.end > block.first_row + block.rows {
        return Err(GeogridError::OutOfRange(format!(
            "tile row {} needs raster rows {:?}, block holds {:?}",
            tile_y,
            span,
            block.row_span()
        )));
    }

    let (x0, y0) = index.tile_origin(tile_x, tile_y)?;
    let cols = index.tile_columns(tile_x)?;
    let rows = index.tile_rows(tile_y)?;
    let mut tile = allocate_padded(index, tile_x, tile_y, fill_value)?;

    let plane = index.tx * index.ty;
    for band in 0..index.nz {
        for row in 0..rows {
            let raster_row = index.raster_row(y0 + row)?;
            let src = band * block.band_stride() + (raster_row - block.first_row) * index.row_stride() + x0;
            let dst = band * plane + row * index.tx;
            tile.data[dst..dst + cols].copy_from_slice(&block.data[src..src + cols]);
        }
    }

    Ok(tile)
}

/// A block must have the index's width and band count, and hold all its rows
fn check_block_shape(index: &GeogridIndex, block: &RowBlock) -> GeogridResult<()> {
    if block.nx != index.nx || block.nz != index.nz {
        return Err(GeogridError::OutOfRange(format!(
            "block of {} columns and {} bands does not match a {}x{} grid of {} bands",
            block.nx, block.nz, index.nx, index.ny, index.nz
        )));
    }
    if block.data.len() != block.nx * block.rows * block.nz {
        return Err(GeogridError::OutOfRange(format!(
            "block of {} rows holds {} samples, expected {}",
            block.rows,
            block.data.len(),
            block.nx * block.rows * block.nz
        )));
    }
    Ok(())
}

/// Receives finished tiles
pub trait TileSink {
    fn write_tile(&mut self, tile: &TileBuffer) -> GeogridResult<()>;
}

/// Keeps finished tiles in memory, in the order they arrive
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub tiles: Vec<TileBuffer>,
}

impl TileSink for CollectingSink {
    fn write_tile(&mut self, tile: &TileBuffer) -> GeogridResult<()> {
        self.tiles.push(tile.clone());
        Ok(())
    }
}

/// One tile row band that has not received all of its rows yet
struct OpenBand {
    tiles: Vec<TileBuffer>,
    rows_remaining: usize,
}

/// Builds tiles from row groups as they are read
///
/// Rows may arrive in any grouping and order. A tile row band is handed to
/// the sink, tile column by tile column, once every raster row it covers has
/// been pushed; its buffers are released right after.
pub struct TileAssembler {
    index: GeogridIndex,
    fill_value: f32,
    open: BTreeMap<usize, OpenBand>,
    tiles_written: usize,
}

impl TileAssembler {
    pub fn new(index: GeogridIndex, fill_value: f32) -> Self {
        TileAssembler {
            index,
            fill_value,
            open: BTreeMap::new(),
            tiles_written: 0,
        }
    }

    /// Tiles handed to a sink so far
    pub fn tiles_written(&self) -> usize {
        self.tiles_written
    }

    /// Tile row bands currently held in memory
    pub fn open_bands(&self) -> usize {
        self.open.len()
    }

    /// Distributes the rows of `block` and writes every band it completes
    pub fn push_block(&mut self, block: &RowBlock, sink: &mut dyn TileSink) -> GeogridResult<usize> {
        check_block_shape(&self.index, block)?;

        let mut written = 0;
        for raster_row in block.row_span() {
            let grid_row = self.index.grid_row(raster_row)?;
            let band_index = grid_row / self.index.ty;
            let row_in_tile = grid_row % self.index.ty;

            self.copy_row(block, raster_row, band_index, row_in_tile)?;

            let complete = match self.open.get_mut(&band_index) {
                Some(band) => {
                    band.rows_remaining -= 1;
                    band.rows_remaining == 0
                }
                None => false,
            };

            if complete {
                if let Some(band) = self.open.remove(&band_index) {
                    trace!("Tile row {} complete", band_index);
                    for tile in &band.tiles {
                        sink.write_tile(tile)?;
                    }
                    written += band.tiles.len();
                }
            }
        }

        self.tiles_written += written;
        Ok(written)
    }

    /// Fails if any band is still waiting for rows
    pub fn finish(&self) -> GeogridResult<()> {
        if let Some((band, open)) = self.open.iter().next() {
            return Err(GeogridError::GenericError(format!(
                "tile row {} incomplete: {} rows never arrived",
                band, open.rows_remaining
            )));
        }

        debug!("Assembled {} tiles", self.tiles_written);
        Ok(())
    }

    fn copy_row(&mut self, block: &RowBlock, raster_row: usize, band_index: usize, row_in_tile: usize) -> GeogridResult<()> {
        if !self.open.contains_key(&band_index) {
            let tiles = (0..self.index.tile_count_x())
                .map(|tile_x| allocate_padded(&self.index, tile_x, band_index, self.fill_value))
                .collect::<GeogridResult<Vec<_>>>()?;
            let rows_remaining = self.index.tile_rows(band_index)?;
            self.open.insert(band_index, OpenBand { tiles, rows_remaining });
        }

        let index = self.index;
        let band = match self.open.get_mut(&band_index) {
            Some(band) => band,
            None => return Err(GeogridError::GenericError(format!("tile row {} not open", band_index))),
        };

        let plane = index.tx * index.ty;
        for z in 0..index.nz {
            let row = block.row(z, raster_row)?;
            for tile in band.tiles.iter_mut() {
                let x0 = tile.tile_x * index.tx;
                let cols = index.tx.min(index.nx - x0);
                let dst = z * plane + row_in_tile * index.tx;
                tile.data[dst..dst + cols].copy_from_slice(&row[x0..x0 + cols]);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geogrid::conversion::{SampleEncoding, SampleFormat};
    use crate::geogrid::index::RowOrder;

    fn index(nx: usize, ny: usize, nz: usize, tx: usize, ty: usize, order: RowOrder) -> GeogridIndex {
        GeogridIndex {
            nx,
            ny,
            nz,
            tx,
            ty,
            sample_format: SampleFormat::new(SampleEncoding::IeeeFloat, 4).unwrap(),
            samples_per_pixel: nz,
            row_order: order,
        }
    }

    /// Whole raster block with value `band * 1000 + y * nx + x + 1`
    fn raster(idx: &GeogridIndex) -> RowBlock {
        let mut data = Vec::new();
        for band in 0..idx.nz {
            for y in 0..idx.ny {
                for x in 0..idx.nx {
                    data.push((band * 1000 + y * idx.nx + x + 1) as f32);
                }
            }
        }
        RowBlock { first_row: 0, rows: idx.ny, nx: idx.nx, nz: idx.nz, data }
    }

    fn slice(block: &RowBlock, rows: std::ops::Range<usize>) -> RowBlock {
        let mut data = Vec::new();
        for band in 0..block.nz {
            for y in rows.clone() {
                data.extend_from_slice(block.row(band, y).unwrap());
            }
        }
        RowBlock { first_row: rows.start, rows: rows.len(), nx: block.nx, nz: block.nz, data }
    }

    #[test]
    fn test_edge_tile_of_example_grid() {
        let idx = index(10, 7, 1, 4, 4, RowOrder::TopBottom);
        let block = raster(&idx);

        let tile = extract_tile(&idx, &block, 2, 1).unwrap();
        assert_eq!(tile.data.len(), 16);
        // Columns 8-9 of rows 4-6 carry data
        assert_eq!(tile.get(0, 0, 0), Some(49.0));
        assert_eq!(tile.get(0, 2, 1), Some(70.0));
        // Padding columns and the padding row stay zero
        assert_eq!(tile.get(0, 0, 2), Some(0.0));
        assert_eq!(tile.get(0, 3, 0), Some(0.0));
    }

    #[test]
    fn test_whole_buffer_round_trip() {
        for order in [RowOrder::TopBottom, RowOrder::BottomTop] {
            let idx = index(10, 7, 2, 4, 3, order);
            let block = raster(&idx);
            let mut rebuilt = vec![f32::NAN; block.data.len()];

            for ty in 0..idx.tile_count_y() {
                for tx in 0..idx.tile_count_x() {
                    let tile = extract_tile(&idx, &block, tx, ty).unwrap();
                    let (x0, y0) = idx.tile_origin(tx, ty).unwrap();
                    for z in 0..idx.nz {
                        for row in 0..idx.ty {
                            for col in 0..idx.tx {
                                let value = tile.get(z, row, col).unwrap();
                                if x0 + col < idx.nx && y0 + row < idx.ny {
                                    let y = idx.raster_row(y0 + row).unwrap();
                                    rebuilt[z * idx.band_stride() + y * idx.row_stride() + x0 + col] = value;
                                } else {
                                    assert_eq!(value, 0.0);
                                }
                            }
                        }
                    }
                }
            }

            assert_eq!(rebuilt, block.data);
        }
    }

    #[test]
    fn test_bottom_top_tile_is_flipped() {
        let idx = index(3, 5, 1, 3, 2, RowOrder::BottomTop);
        let block = raster(&idx);

        let tile = extract_tile(&idx, &block, 0, 0).unwrap();
        // Tile row 0 is the last raster row
        assert_eq!(tile.data, vec![13.0, 14.0, 15.0, 10.0, 11.0, 12.0]);

        let top = extract_tile(&idx, &block, 0, 2).unwrap();
        assert_eq!(top.data, vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_extract_requires_covering_block() {
        let idx = index(4, 8, 1, 4, 4, RowOrder::TopBottom);
        let block = slice(&raster(&idx), 0..4);
        assert!(extract_tile(&idx, &block, 0, 0).is_ok());
        assert!(matches!(extract_tile(&idx, &block, 0, 1), Err(GeogridError::OutOfRange(_))));
    }

    #[test]
    fn test_mismatched_block_is_out_of_range() {
        let idx = index(10, 7, 1, 4, 4, RowOrder::TopBottom);
        let narrow = raster(&index(5, 7, 1, 4, 4, RowOrder::TopBottom));
        assert!(matches!(extract_tile(&idx, &narrow, 2, 0), Err(GeogridError::OutOfRange(_))));

        let mut short = raster(&idx);
        short.data.truncate(20);
        assert!(matches!(extract_tile(&idx, &short, 0, 0), Err(GeogridError::OutOfRange(_))));

        let mut sink = CollectingSink::default();
        let mut assembler = TileAssembler::new(idx, 0.0);
        assert!(matches!(assembler.push_block(&narrow, &mut sink), Err(GeogridError::OutOfRange(_))));
        assert!(sink.tiles.is_empty());
    }

    #[test]
    fn test_fill_region() {
        let idx = index(3, 3, 2, 4, 4, RowOrder::TopBottom);
        let mut tile = allocate_tile_buffer(&idx, 0, 0).unwrap();
        assert!(tile.data.iter().all(|v| *v == 0.0));

        tile.fill_region(-9999.0, 3, 3).unwrap();
        for z in 0..2 {
            for row in 0..4 {
                for col in 0..4 {
                    let expected = if row >= 3 || col >= 3 { -9999.0 } else { 0.0 };
                    assert_eq!(tile.get(z, row, col), Some(expected));
                }
            }
        }

        assert!(tile.fill_region(1.0, 5, 0).is_err());
        assert!(allocate_tile_buffer(&idx, 1, 0).is_err());
    }

    #[test]
    fn test_assembler_matches_extraction() {
        let idx = index(10, 7, 2, 4, 3, RowOrder::BottomTop);
        let block = raster(&idx);

        // Feed two-row strips from the bottom up
        let mut sink = CollectingSink::default();
        let mut assembler = TileAssembler::new(idx, 0.0);
        let mut start: usize = 7;
        while start > 0 {
            let first = start.saturating_sub(2);
            assembler.push_block(&slice(&block, first..start), &mut sink).unwrap();
            assert!(assembler.open_bands() <= 2);
            start = first;
        }
        assembler.finish().unwrap();

        assert_eq!(sink.tiles.len(), idx.total_tile_count());
        for tile in &sink.tiles {
            assert_eq!(*tile, extract_tile(&idx, &block, tile.tile_x, tile.tile_y).unwrap());
        }
    }

    #[test]
    fn test_assembler_writes_band_once_complete() {
        let idx = index(5, 4, 1, 3, 2, RowOrder::TopBottom);
        let block = raster(&idx);
        let mut sink = CollectingSink::default();
        let mut assembler = TileAssembler::new(idx, 0.0);

        assert_eq!(assembler.push_block(&slice(&block, 0..1), &mut sink).unwrap(), 0);
        assert_eq!(assembler.push_block(&slice(&block, 1..3), &mut sink).unwrap(), 2);
        assert!(assembler.finish().is_err());
        assert_eq!(assembler.push_block(&slice(&block, 3..4), &mut sink).unwrap(), 2);
        assembler.finish().unwrap();

        let order: Vec<(usize, usize)> = sink.tiles.iter().map(|t| (t.tile_x, t.tile_y)).collect();
        assert_eq!(order, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_assembler_pads_with_fill_value() {
        let idx = index(2, 1, 1, 3, 2, RowOrder::TopBottom);
        let block = raster(&idx);
        let mut sink = CollectingSink::default();
        let mut assembler = TileAssembler::new(idx, -1.0);

        assembler.push_block(&block, &mut sink).unwrap();
        assert_eq!(sink.tiles[0].data, vec![1.0, 2.0, -1.0, -1.0, -1.0, -1.0]);
    }
}
