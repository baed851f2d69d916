//! Conversion driver
//!
//! Ties ingestion, tile assembly and serialization together for one raster.
//! Any failure stops the run and is returned as is; files already written
//! are left in place and the caller must treat the output set as invalid.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::config::{ConversionConfig, ConversionMode};
use crate::errors::GeogridResult;
use crate::geogrid::index::GeogridIndex;
use crate::geogrid::ingestion::StripIngestor;
use crate::geogrid::source::RasterSource;
use crate::geogrid::tiles::{extract_tile_filled, TileAssembler, TileSink};
use crate::geogrid::writer::{write_index_file, IndexAttributes, TileWriter, INDEX_FILE_NAME};
use crate::utils::progress::ProgressTracker;

/// Counts reported after a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    /// Geometry used for the run
    pub index: GeogridIndex,
    /// Tile files written
    pub tiles_written: usize,
    /// Row groups read from the source
    pub groups_read: usize,
    /// Strip reads issued against the source
    pub strips_read: usize,
}

/// Runs raster-to-tile conversions with one configuration
pub struct GeogridConverter {
    config: ConversionConfig,
    show_progress: bool,
}

impl GeogridConverter {
    pub fn new(config: ConversionConfig) -> Self {
        GeogridConverter {
            config,
            show_progress: false,
        }
    }

    /// Draw a progress bar on the terminal while reading
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Builds the geometry this converter would use for `source`
    pub fn plan_index<S: RasterSource>(&self, source: &S) -> GeogridResult<GeogridIndex> {
        GeogridIndex::from_metadata(
            source.metadata(),
            self.config.tile_x,
            self.config.tile_y,
            self.config.row_order,
        )
    }

    /// Converts `source` into tiles plus an index file in `output_dir`
    pub fn run<S: RasterSource>(&self, source: &mut S, output_dir: &Path) -> GeogridResult<ConversionSummary> {
        let index = self.plan_index(source)?;
        info!("Tiling {}", index);

        fs::create_dir_all(output_dir)?;
        write_index_file(&output_dir.join(INDEX_FILE_NAME), &index, &self.index_attributes()?)?;

        let mut writer = TileWriter::new(output_dir, index);
        let summary = self.convert(source, &index, &mut writer)?;

        info!(
            "Wrote {} tiles from {} row groups ({} strip reads) to {}",
            summary.tiles_written,
            summary.groups_read,
            summary.strips_read,
            output_dir.display()
        );
        Ok(summary)
    }

    /// Tiles `source` into any sink, without touching the file system
    pub fn convert<S: RasterSource>(
        &self,
        source: &mut S,
        index: &GeogridIndex,
        sink: &mut dyn TileSink,
    ) -> GeogridResult<ConversionSummary> {
        let mode = self.config.mode;
        let mut ingestor = StripIngestor::new(source, index, self.config.traversal, mode.grouping())?;
        debug!(
            "Mode {}, traversal {}, {} row groups",
            mode.name(),
            self.config.traversal.name(),
            ingestor.group_count()
        );

        let progress = self.progress(ingestor.group_count() as u64, mode);
        let mut groups_read = 0;

        let tiles_written = match mode {
            ConversionMode::Whole => {
                let whole = ingestor.read_all()?;
                groups_read = ingestor.group_count();
                progress.increment(groups_read as u64);

                let mut written = 0;
                for tile_y in 0..index.tile_count_y() {
                    for tile_x in 0..index.tile_count_x() {
                        let tile = extract_tile_filled(index, &whole, tile_x, tile_y, self.config.fill_value)?;
                        sink.write_tile(&tile)?;
                        written += 1;
                    }
                }
                written
            }
            ConversionMode::Rows | ConversionMode::Strips => {
                let mut assembler = TileAssembler::new(*index, self.config.fill_value);
                while let Some(block) = ingestor.next_block()? {
                    assembler.push_block(&block, sink)?;
                    groups_read += 1;
                    progress.increment(1);
                }
                assembler.finish()?;
                assembler.tiles_written()
            }
        };
        progress.finish();

        Ok(ConversionSummary {
            index: *index,
            tiles_written,
            groups_read,
            strips_read: ingestor.strips_read(),
        })
    }

    /// Configured attributes, plus `missing_value` when padding is not zero
    fn index_attributes(&self) -> GeogridResult<IndexAttributes> {
        let mut attributes = self.config.attributes.clone();
        if self.config.fill_value != 0.0 && attributes.get("missing_value").is_none() {
            attributes.set("missing_value", &self.config.fill_value.to_string())?;
        }
        Ok(attributes)
    }

    fn progress(&self, total: u64, mode: ConversionMode) -> ProgressTracker {
        if self.show_progress {
            ProgressTracker::new(total, &format!("Reading row groups ({})", mode.name()))
        } else {
            ProgressTracker::hidden(total)
        }
    }
}
