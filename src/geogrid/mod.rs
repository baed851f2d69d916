//! Raster to geogrid tile pipeline
//!
//! Leaf first: `conversion` normalizes samples to `f32`, `index` holds the
//! grid geometry, `ingestion` reads row groups from a `RasterSource`,
//! `tiles` cuts them into tile buffers, `writer` puts tiles and the index
//! file on disk and `converter` drives a whole run.

pub mod conversion;
pub mod converter;
pub mod index;
pub mod ingestion;
pub mod source;
pub mod tiles;
pub mod writer;

pub use conversion::{convert_samples, RawSamples, SampleEncoding, SampleFormat};
pub use converter::{ConversionSummary, GeogridConverter};
pub use index::{GeogridIndex, RowOrder};
pub use ingestion::{plan_row_groups, Grouping, RowBlock, StripIngestor, Traversal};
pub use source::{PlanarLayout, RasterMetadata, RasterSource};
pub use tiles::{allocate_tile_buffer, extract_tile, extract_tile_filled, TileAssembler, TileBuffer, TileSink};
pub use writer::{
    parse_tile_file_name, read_index_file, read_tile, tile_file_name, write_index_file, write_tile, IndexAttributes,
    TileWriter,
};
