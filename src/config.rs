//! Conversion settings
//!
//! Settings come from built-in defaults, an optional TOML file and finally
//! command line flags, each layer overriding the previous one.
//!
//! ```toml
//! tile_x = 1200
//! tile_y = 1200
//! row_order = "bottom_top"
//! traversal = "reverse"
//! mode = "rows"
//! fill_value = 0.0
//!
//! [index]
//! type = "continuous"
//! units = "meters MSL"
//! description = "Topography height"
//! dx = 0.00083333
//! ```

use std::fs;
use std::path::Path;

use log::debug;

use crate::errors::{GeogridError, GeogridResult};
use crate::geogrid::index::RowOrder;
use crate::geogrid::ingestion::{Grouping, Traversal};
use crate::geogrid::writer::IndexAttributes;

/// How the raster is held in memory while tiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMode {
    /// Decode the whole raster into one buffer, then cut every tile
    Whole,
    /// Stream one tile row band at a time
    Rows,
    /// Stream one source strip at a time
    Strips,
}

impl ConversionMode {
    pub fn name(&self) -> &'static str {
        match self {
            ConversionMode::Whole => "whole",
            ConversionMode::Rows => "rows",
            ConversionMode::Strips => "strips",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "whole" => Some(ConversionMode::Whole),
            "rows" => Some(ConversionMode::Rows),
            "strips" => Some(ConversionMode::Strips),
            _ => None,
        }
    }

    /// Row grouping used when reading in this mode
    pub fn grouping(&self) -> Grouping {
        match self {
            ConversionMode::Strips => Grouping::Strip,
            ConversionMode::Whole | ConversionMode::Rows => Grouping::TileRows,
        }
    }
}

/// Everything a conversion run needs besides the raster itself
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    /// Tile width in pixels
    pub tile_x: usize,
    /// Tile height in pixels
    pub tile_y: usize,
    /// Orientation of the output rows
    pub row_order: RowOrder,
    /// Order in which row groups are read
    pub traversal: Traversal,
    /// Memory strategy
    pub mode: ConversionMode,
    /// Value of padding cells in edge tiles
    pub fill_value: f32,
    /// Extra entries for the index file
    pub attributes: IndexAttributes,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            tile_x: 1200,
            tile_y: 1200,
            row_order: RowOrder::BottomTop,
            traversal: Traversal::Reverse,
            mode: ConversionMode::Rows,
            fill_value: 0.0,
            attributes: IndexAttributes::default(),
        }
    }
}

impl ConversionConfig {
    /// Loads a TOML settings file on top of the defaults
    pub fn from_file(path: &Path) -> GeogridResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut config = ConversionConfig::default();
        config.apply_toml(&content)?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Applies the settings found in a TOML document
    pub fn apply_toml(&mut self, content: &str) -> GeogridResult<()> {
        let value: toml::Value = content
            .parse()
            .map_err(|e| GeogridError::InvalidConfig(format!("TOML parse error: {}", e)))?;

        let table = value
            .as_table()
            .ok_or_else(|| GeogridError::InvalidConfig("expected a TOML table".to_string()))?;

        for (key, item) in table {
            match key.as_str() {
                "tile_x" => self.tile_x = positive(key, item)?,
                "tile_y" => self.tile_y = positive(key, item)?,
                "tile_size" => {
                    let size = positive(key, item)?;
                    self.tile_x = size;
                    self.tile_y = size;
                }
                "row_order" => self.set_row_order(text(key, item)?)?,
                "traversal" => self.set_traversal(text(key, item)?)?,
                "mode" => self.set_mode(text(key, item)?)?,
                "fill_value" => {
                    self.fill_value = match item {
                        toml::Value::Float(f) => *f as f32,
                        toml::Value::Integer(i) => *i as f32,
                        _ => return Err(GeogridError::InvalidConfig("fill_value must be a number".to_string())),
                    }
                }
                "index" => {
                    let entries = item
                        .as_table()
                        .ok_or_else(|| GeogridError::InvalidConfig("[index] must be a table".to_string()))?;
                    for (name, entry) in entries {
                        let rendered = match entry {
                            toml::Value::String(s) => s.clone(),
                            toml::Value::Integer(i) => i.to_string(),
                            toml::Value::Float(f) => f.to_string(),
                            toml::Value::Boolean(b) => (if *b { "yes" } else { "no" }).to_string(),
                            other => {
                                return Err(GeogridError::InvalidConfig(format!(
                                    "index entry '{}' has unsupported value {}",
                                    name, other
                                )))
                            }
                        };
                        self.attributes.set(name, &rendered)?;
                    }
                }
                other => {
                    return Err(GeogridError::InvalidConfig(format!("unknown setting '{}'", other)));
                }
            }
        }

        Ok(())
    }

    pub fn set_row_order(&mut self, name: &str) -> GeogridResult<()> {
        self.row_order = RowOrder::from_name(name)
            .ok_or_else(|| GeogridError::InvalidConfig(format!("unknown row order '{}'", name)))?;
        Ok(())
    }

    pub fn set_traversal(&mut self, name: &str) -> GeogridResult<()> {
        self.traversal = Traversal::from_name(name)
            .ok_or_else(|| GeogridError::InvalidConfig(format!("unknown traversal '{}'", name)))?;
        Ok(())
    }

    pub fn set_mode(&mut self, name: &str) -> GeogridResult<()> {
        self.mode = ConversionMode::from_name(name)
            .ok_or_else(|| GeogridError::InvalidConfig(format!("unknown mode '{}'", name)))?;
        Ok(())
    }
}

fn positive(key: &str, item: &toml::Value) -> GeogridResult<usize> {
    match item.as_integer() {
        Some(v) if v > 0 => Ok(v as usize),
        _ => Err(GeogridError::InvalidConfig(format!("{} must be a positive integer", key))),
    }
}

fn text<'v>(key: &str, item: &'v toml::Value) -> GeogridResult<&'v str> {
    item.as_str()
        .ok_or_else(|| GeogridError::InvalidConfig(format!("{} must be a string", key)))
}
