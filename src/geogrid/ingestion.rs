//! Strip ingestion
//!
//! Pulls raster rows out of a [`RasterSource`] in groups, converts them to
//! floats and hands them over as [`RowBlock`]s. A group is either one source
//! strip or one tile row band. Groups are visited from the top of the raster
//! down (`Traversal::Forward`) or from the bottom up (`Traversal::Reverse`);
//! the traversal only changes delivery order, never the values delivered.
//!
//! Memory stays bounded by one group plus, per band plane, one cached strip
//! for strips that straddle two groups.

use std::ops::Range;

use log::{debug, trace};

use crate::errors::{GeogridError, GeogridResult};
use crate::geogrid::conversion::alloc_zeroed;
use crate::geogrid::index::GeogridIndex;
use crate::geogrid::source::{PlanarLayout, RasterMetadata, RasterSource};

/// Direction in which row groups are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// First raster row to last
    Forward,
    /// Last raster row to first
    Reverse,
}

impl Traversal {
    pub fn name(&self) -> &'static str {
        match self {
            Traversal::Forward => "forward",
            Traversal::Reverse => "reverse",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "forward" => Some(Traversal::Forward),
            "reverse" => Some(Traversal::Reverse),
            _ => None,
        }
    }
}

/// Size of one row group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// One source strip per read
    Strip,
    /// The rows of exactly one tile row band per read
    TileRows,
}

impl Grouping {
    pub fn name(&self) -> &'static str {
        match self {
            Grouping::Strip => "strips",
            Grouping::TileRows => "rows",
        }
    }
}

/// Decoded rows of all bands
///
/// Bands are stored as separate planes: the value of band `b`, block row `r`,
/// column `x` lives at `b * rows * nx + r * nx + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBlock {
    /// Raster row of the first row in the block
    pub first_row: usize,
    /// Number of rows held
    pub rows: usize,
    /// Raster width
    pub nx: usize,
    /// Band count
    pub nz: usize,
    /// Samples in band-plane order
    pub data: Vec<f32>,
}

impl RowBlock {
    /// Raster rows held by this block
    pub fn row_span(&self) -> Range<usize> {
        self.first_row..self.first_row + self.rows
    }

    /// Distance between bands in `data`
    pub fn band_stride(&self) -> usize {
        self.rows * self.nx
    }

    /// One row of one band, addressed by raster row
    pub fn row(&self, band: usize, raster_row: usize) -> GeogridResult<&[f32]> {
        if band >= self.nz || !self.row_span().contains(&raster_row) {
            return Err(GeogridError::OutOfRange(format!(
                "band {} row {} not in block rows {:?} with {} bands",
                band,
                raster_row,
                self.row_span(),
                self.nz
            )));
        }

        let start = band * self.band_stride() + (raster_row - self.first_row) * self.nx;
        Ok(&self.data[start..start + self.nx])
    }
}

/// Raster row spans visited by one traversal, in delivery order
///
/// `TileRows` spans follow the tile row bands of `index`, so they honour its
/// row order; `Strip` spans follow the source strips.
pub fn plan_row_groups(
    index: &GeogridIndex,
    metadata: &RasterMetadata,
    traversal: Traversal,
    grouping: Grouping,
) -> GeogridResult<Vec<Range<usize>>> {
    let mut spans = match grouping {
        Grouping::Strip => (0..metadata.strips_per_plane())
            .map(|s| {
                let start = s * metadata.strip_height;
                start..start + metadata.rows_in_strip(s)
            })
            .collect::<Vec<_>>(),
        Grouping::TileRows => (0..index.tile_count_y())
            .map(|band| index.band_span(band))
            .collect::<GeogridResult<Vec<_>>>()?,
    };

    spans.sort_by_key(|span| span.start);
    if traversal == Traversal::Reverse {
        spans.reverse();
    }

    Ok(spans)
}

/// A strip kept around because the next group needs it as well
struct CachedStrip {
    strip: usize,
    bytes: Vec<u8>,
}

/// Reads row groups from a raster source
pub struct StripIngestor<'s, S: RasterSource> {
    /// Source raster
    source: &'s mut S,
    /// Source facts, copied once
    metadata: RasterMetadata,
    /// Raster width
    nx: usize,
    /// Band count
    nz: usize,
    /// Spans still to deliver, in order
    plan: Vec<Range<usize>>,
    /// Position in `plan`
    next_group: usize,
    /// Raster rows delivered so far
    current_strip: usize,
    /// Calls made to the source
    strips_read: usize,
    /// One cached strip per band plane
    cache: Vec<Option<CachedStrip>>,
}

impl<'s, S: RasterSource> StripIngestor<'s, S> {
    /// Creates an ingestor visiting `source` with the given traversal and grouping
    pub fn new(
        source: &'s mut S,
        index: &GeogridIndex,
        traversal: Traversal,
        grouping: Grouping,
    ) -> GeogridResult<Self> {
        let metadata = source.metadata().clone();
        if metadata.nx != index.nx || metadata.ny != index.ny || metadata.nz != index.nz {
            return Err(GeogridError::GenericError(format!(
                "raster {}x{}x{} does not match index {}x{}x{}",
                metadata.nx, metadata.ny, metadata.nz, index.nx, index.ny, index.nz
            )));
        }
        if metadata.strip_height == 0 {
            return Err(GeogridError::GenericError("strip height must be positive".to_string()));
        }
        let expected_spp = match metadata.layout {
            PlanarLayout::Interleaved => metadata.nz,
            PlanarLayout::Planar => 1,
        };
        if metadata.samples_per_pixel != expected_spp {
            return Err(GeogridError::GenericError(format!(
                "{:?} raster of {} bands must have {} samples per pixel, found {}",
                metadata.layout, metadata.nz, expected_spp, metadata.samples_per_pixel
            )));
        }

        let plan = plan_row_groups(index, &metadata, traversal, grouping)?;
        debug!(
            "Planned {} {} groups in {} order over {} strips",
            plan.len(),
            grouping.name(),
            traversal.name(),
            metadata.total_strips
        );

        let planes = metadata.plane_count();
        Ok(StripIngestor {
            source,
            nx: metadata.nx,
            nz: metadata.nz,
            metadata,
            plan,
            next_group: 0,
            current_strip: 0,
            strips_read: 0,
            cache: (0..planes).map(|_| None).collect(),
        })
    }

    /// Number of row groups this ingestor delivers
    pub fn group_count(&self) -> usize {
        self.plan.len()
    }

    /// Row spans in delivery order
    pub fn plan(&self) -> &[Range<usize>] {
        &self.plan
    }

    /// Raster rows delivered so far
    pub fn current_strip(&self) -> usize {
        self.current_strip
    }

    /// Strip reads issued against the source so far
    pub fn strips_read(&self) -> usize {
        self.strips_read
    }

    /// Reads and decodes the next row group, or `None` when all are delivered
    pub fn next_block(&mut self) -> GeogridResult<Option<RowBlock>> {
        let span = match self.plan.get(self.next_group) {
            Some(span) => span.clone(),
            None => return Ok(None),
        };
        self.next_group += 1;

        let block = self.read_span(span)?;
        self.current_strip += block.rows;
        Ok(Some(block))
    }

    /// Reads every remaining group into one whole-raster block
    pub fn read_all(&mut self) -> GeogridResult<RowBlock> {
        let ny = self.metadata.ny;
        let mut whole = RowBlock {
            first_row: 0,
            rows: ny,
            nx: self.nx,
            nz: self.nz,
            data: alloc_zeroed::<f32>(self.nx * ny * self.nz)?,
        };

        while let Some(block) = self.next_block()? {
            for band in 0..self.nz {
                let src = &block.data[band * block.band_stride()..(band + 1) * block.band_stride()];
                let dst_start = band * whole.band_stride() + block.first_row * self.nx;
                whole.data[dst_start..dst_start + src.len()].copy_from_slice(src);
            }
        }

        Ok(whole)
    }

    /// Reads one strip on its own and returns its samples as read
    ///
    /// The returned floats keep the source arrangement: interleaved strips
    /// stay pixel-interleaved.
    pub fn read_strip(&mut self, strip: usize) -> GeogridResult<Vec<f32>> {
        if strip >= self.metadata.total_strips {
            return Err(GeogridError::OutOfRange(format!(
                "strip {} beyond strip count {}",
                strip, self.metadata.total_strips
            )));
        }

        let strip_in_plane = strip % self.metadata.strips_per_plane();
        let rows = self.metadata.rows_in_strip(strip_in_plane);
        let samples = rows * self.nx * self.metadata.samples_per_pixel;

        let mut raw = self.metadata.sample_format.allocate(samples)?;
        self.read_into(strip, raw.bytes_mut())?;
        raw.into_f32()
    }

    fn read_span(&mut self, span: Range<usize>) -> GeogridResult<RowBlock> {
        let rows = span.len();
        let strip_height = self.metadata.strip_height;
        let row_bytes = self.metadata.row_bytes();
        let spp = self.metadata.samples_per_pixel;

        trace!("Reading raster rows {:?}", span);

        let mut block = RowBlock {
            first_row: span.start,
            rows,
            nx: self.nx,
            nz: self.nz,
            data: Vec::new(),
        };

        for plane in 0..self.metadata.plane_count() {
            let mut raw = self.metadata.sample_format.allocate(rows * self.nx * spp)?;
            let first_strip = span.start / strip_height;
            let last_strip = (span.end - 1) / strip_height;

            for strip_in_plane in first_strip..=last_strip {
                let strip_start = strip_in_plane * strip_height;
                let strip_rows = strip_start..strip_start + self.metadata.rows_in_strip(strip_in_plane);
                let copy_start = strip_rows.start.max(span.start);
                let copy_end = strip_rows.end.min(span.end);

                let dst_offset = (copy_start - span.start) * row_bytes;
                let dst_len = (copy_end - copy_start) * row_bytes;
                let dest = &mut raw.bytes_mut()[dst_offset..dst_offset + dst_len];

                let strip = plane * self.metadata.strips_per_plane() + strip_in_plane;
                if copy_start == strip_rows.start && copy_end == strip_rows.end {
                    self.read_into(strip, dest)?;
                } else {
                    let bytes = self.cached_strip(plane, strip, strip_rows.len() * row_bytes)?;
                    let src_offset = (copy_start - strip_rows.start) * row_bytes;
                    dest.copy_from_slice(&bytes[src_offset..src_offset + dst_len]);
                }
            }

            let values = raw.into_f32()?;
            self.scatter_plane(&mut block, plane, values)?;
        }

        Ok(block)
    }

    /// Moves one decoded plane into the block's band-plane layout
    fn scatter_plane(&self, block: &mut RowBlock, plane: usize, values: Vec<f32>) -> GeogridResult<()> {
        let spp = self.metadata.samples_per_pixel;
        let band_len = block.rows * self.nx;

        match self.metadata.layout {
            PlanarLayout::Interleaved if spp == 1 && self.nz == 1 => {
                block.data = values;
            }
            PlanarLayout::Interleaved => {
                let mut data = alloc_zeroed::<f32>(band_len * self.nz)?;
                for (pixel, samples) in values.chunks_exact(spp).enumerate() {
                    for (band, value) in samples.iter().enumerate() {
                        data[band * band_len + pixel] = *value;
                    }
                }
                block.data = data;
            }
            PlanarLayout::Planar => {
                if plane == 0 {
                    block.data = alloc_zeroed::<f32>(band_len * self.nz)?;
                }
                let dst = &mut block.data[plane * band_len..(plane + 1) * band_len];
                dst.copy_from_slice(&values[..band_len]);
            }
        }

        Ok(())
    }

    /// Returns the bytes of a strip shared with a neighbouring group
    fn cached_strip(&mut self, plane: usize, strip: usize, len: usize) -> GeogridResult<&[u8]> {
        let hit = matches!(&self.cache[plane], Some(cached) if cached.strip == strip);
        if !hit {
            let mut bytes = alloc_zeroed::<u8>(len)?;
            self.read_into(strip, &mut bytes)?;
            self.cache[plane] = Some(CachedStrip { strip, bytes });
        } else {
            trace!("Reusing cached strip {}", strip);
        }

        match &self.cache[plane] {
            Some(cached) => Ok(&cached.bytes),
            None => Err(GeogridError::GenericError(format!("strip {} missing from cache", strip))),
        }
    }

    /// Issues one strip read and checks it filled `dest`
    fn read_into(&mut self, strip: usize, dest: &mut [u8]) -> GeogridResult<()> {
        if strip >= self.metadata.total_strips {
            return Err(GeogridError::OutOfRange(format!(
                "strip {} beyond strip count {}",
                strip, self.metadata.total_strips
            )));
        }

        let expected = dest.len();
        let read = self.source.read_encoded_strip(strip, dest).map_err(|e| match e {
            GeogridError::ReadFailure { .. } => e,
            other => GeogridError::ReadFailure { strip, message: other.to_string() },
        })?;
        self.strips_read += 1;

        if read < expected {
            return Err(GeogridError::ReadFailure {
                strip,
                message: format!("short read: expected {} bytes, got {}", expected, read),
            });
        }

        Ok(())
    }
}
