//! Library entry points
//!
//! `GeogridTiler` bundles a configuration with the file based operations a
//! caller usually wants: inspect a raster, convert it, read the results back.

use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;

use crate::config::ConversionConfig;
use crate::errors::GeogridResult;
use crate::geogrid::converter::{ConversionSummary, GeogridConverter};
use crate::geogrid::index::GeogridIndex;
use crate::geogrid::source::RasterSource;
use crate::geogrid::tiles::TileBuffer;
use crate::geogrid::writer::{read_index_file, read_tile, IndexAttributes, INDEX_FILE_NAME};
use crate::tiff::{TiffRaster, TiffReader};

/// Main interface to the geogrid tiler library
pub struct GeogridTiler {
    config: ConversionConfig,
    show_progress: bool,
}

impl GeogridTiler {
    pub fn new(config: ConversionConfig) -> Self {
        GeogridTiler {
            config,
            show_progress: false,
        }
    }

    /// Loads settings from a TOML file
    pub fn from_config_file(path: &Path) -> GeogridResult<Self> {
        Ok(GeogridTiler::new(ConversionConfig::from_file(path)?))
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConversionConfig {
        &mut self.config
    }

    /// Human readable report on a raster and the grid it would be cut into
    pub fn analyze(&self, input_path: &Path) -> GeogridResult<String> {
        describe_raster(input_path, &self.config, false)
    }

    /// Geometry a conversion of `input_path` would use
    pub fn plan(&self, input_path: &Path) -> GeogridResult<GeogridIndex> {
        let raster = TiffRaster::open(input_path)?;
        GeogridConverter::new(self.config.clone()).plan_index(&raster)
    }

    /// Converts a TIFF file into tiles and an index file under `output_dir`
    pub fn convert(&self, input_path: &Path, output_dir: &Path) -> GeogridResult<ConversionSummary> {
        let mut raster = TiffRaster::open(input_path)?;
        self.convert_source(&mut raster, output_dir)
    }

    /// Converts any raster source
    pub fn convert_source<S: RasterSource>(&self, source: &mut S, output_dir: &Path) -> GeogridResult<ConversionSummary> {
        let summary = GeogridConverter::new(self.config.clone())
            .with_progress(self.show_progress)
            .run(source, output_dir)?;
        info!("Conversion finished: {} tiles", summary.tiles_written);
        Ok(summary)
    }

    /// Reads the index file of an output directory
    pub fn read_index(&self, output_dir: &Path) -> GeogridResult<(GeogridIndex, IndexAttributes)> {
        read_index_file(&output_dir.join(INDEX_FILE_NAME))
    }

    /// Reads one tile of an output directory
    pub fn read_tile(&self, output_dir: &Path, tile_x: usize, tile_y: usize) -> GeogridResult<TileBuffer> {
        let (index, _) = self.read_index(output_dir)?;
        read_tile(output_dir, &index, tile_x, tile_y)
    }
}

/// Builds the report printed by `--info`
///
/// With `verbose` the tag list of the first image directory is included.
pub fn describe_raster(input_path: &Path, config: &ConversionConfig, verbose: bool) -> GeogridResult<String> {
    let raster = TiffRaster::open(input_path)?;
    let metadata = raster.metadata();
    let index = GeogridConverter::new(config.clone()).plan_index(&raster)?;

    let mut report = String::new();
    let _ = writeln!(report, "Raster: {}", input_path.display());
    let _ = writeln!(report, "  Format: {}", if raster.is_big_tiff() { "BigTIFF" } else { "TIFF" });
    let _ = writeln!(report, "  Byte order: {}", raster.byte_order().name());
    let _ = writeln!(report, "  Size: {} x {} pixels, {} band(s)", metadata.nx, metadata.ny, metadata.nz);
    let _ = writeln!(
        report,
        "  Samples: {}, {} bytes",
        metadata.sample_format.encoding(),
        metadata.sample_format.bytes_per_sample()
    );
    let _ = writeln!(
        report,
        "  Strips: {} x {} rows ({:?})",
        metadata.total_strips, metadata.strip_height, metadata.layout
    );
    let _ = writeln!(report, "  Compression: {}, predictor {}", raster.compression_name(), raster.predictor());

    let _ = writeln!(report, "Geogrid:");
    let _ = writeln!(report, "  Tile size: {} x {}", index.tx, index.ty);
    let _ = writeln!(
        report,
        "  Tiles: {} x {} = {}",
        index.tile_count_x(),
        index.tile_count_y(),
        index.total_tile_count()
    );
    let _ = writeln!(report, "  Row order: {}", index.row_order.name());
    let _ = writeln!(report, "  Traversal: {}, mode: {}", config.traversal.name(), config.mode.name());

    if verbose {
        let mut reader = BufReader::new(File::open(input_path)?);
        let (_, tiff) = TiffReader::read(&mut reader)?;
        let _ = write!(report, "{}", tiff);
    }

    Ok(report)
}
