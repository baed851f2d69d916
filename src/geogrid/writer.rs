//! Tile and index file serialization
//!
//! Tile files carry nothing but `tx * ty * nz` host-order `f32` values in
//! tile layout. Everything needed to interpret them lives in the `index`
//! file next to them, a plain `key=value` text file read by the terrain
//! preprocessing tools.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, NativeEndian};
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;

use crate::errors::{GeogridError, GeogridResult};
use crate::geogrid::conversion::{alloc_zeroed, SampleEncoding, SampleFormat};
use crate::geogrid::index::{GeogridIndex, RowOrder};
use crate::geogrid::tiles::{TileBuffer, TileSink};

/// Name of the index file inside an output directory
pub const INDEX_FILE_NAME: &str = "index";

/// Bytes per value in a tile file
pub const WORD_SIZE: usize = 4;

lazy_static! {
    static ref TILE_NAME: Regex = Regex::new(r"^(\d{5,6})-(\d{5,6})\.(\d{5,6})-(\d{5,6})$")
        .expect("tile name pattern is valid");
}

/// Keys the writer derives from the geometry; attributes may not override them
const RESERVED_KEYS: [&str; 16] = [
    "signed", "wordsize", "tile_x", "tile_y", "tile_z", "nx", "ny", "tiles_x", "tiles_y",
    "total_tiles", "row_order", "endian", "sample_format", "bytes_per_sample",
    "samples_per_pixel", "tile_bdr",
];

/// Free-form index entries such as `description`, `units` or `dx`
///
/// Entries keep their insertion order so the index file is stable.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexAttributes {
    entries: Vec<(String, String)>,
}

impl Default for IndexAttributes {
    fn default() -> Self {
        let mut attributes = IndexAttributes { entries: Vec::new() };
        attributes.entries.push(("type".to_string(), "continuous".to_string()));
        attributes.entries.push(("projection".to_string(), "regular_ll".to_string()));
        attributes
    }
}

impl IndexAttributes {
    /// Attributes with no entries at all
    pub fn empty() -> Self {
        IndexAttributes { entries: Vec::new() }
    }

    /// Sets `key`, replacing an earlier value
    pub fn set(&mut self, key: &str, value: &str) -> GeogridResult<()> {
        let key = key.trim();
        if key.is_empty() || key.contains('=') || key.contains(char::is_whitespace) {
            return Err(GeogridError::InvalidConfig(format!("invalid index key '{}'", key)));
        }
        if RESERVED_KEYS.contains(&key) {
            return Err(GeogridError::InvalidConfig(format!(
                "index key '{}' is derived from the raster and cannot be set",
                key
            )));
        }

        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

/// Geogrid file name of a tile: 1-based, inclusive pixel ranges of the padded tile
pub fn tile_file_name(index: &GeogridIndex, tile_x: usize, tile_y: usize) -> GeogridResult<String> {
    let (x0, y0) = index.tile_origin(tile_x, tile_y)?;
    let width = name_digits(index);

    Ok(format!(
        "{:0w$}-{:0w$}.{:0w$}-{:0w$}",
        x0 + 1,
        x0 + index.tx,
        y0 + 1,
        y0 + index.ty,
        w = width
    ))
}

/// Recovers tile coordinates from a tile file name
pub fn parse_tile_file_name(index: &GeogridIndex, name: &str) -> GeogridResult<(usize, usize)> {
    let caps = TILE_NAME
        .captures(name)
        .ok_or_else(|| GeogridError::GenericError(format!("'{}' is not a tile file name", name)))?;

    let field = |i: usize| -> GeogridResult<usize> {
        caps[i]
            .parse::<usize>()
            .map_err(|e| GeogridError::GenericError(format!("bad number in '{}': {}", name, e)))
    };
    let (x_start, x_end, y_start, y_end) = (field(1)?, field(2)?, field(3)?, field(4)?);

    let aligned = x_start >= 1
        && y_start >= 1
        && (x_start - 1) % index.tx == 0
        && (y_start - 1) % index.ty == 0
        && x_end + 1 == x_start + index.tx
        && y_end + 1 == y_start + index.ty;
    if !aligned {
        return Err(GeogridError::OutOfRange(format!(
            "'{}' does not match {}x{} tiles",
            name, index.tx, index.ty
        )));
    }

    let (tile_x, tile_y) = ((x_start - 1) / index.tx, (y_start - 1) / index.ty);
    index.tile_origin(tile_x, tile_y)?;
    Ok((tile_x, tile_y))
}

fn name_digits(index: &GeogridIndex) -> usize {
    let max_x = index.tile_count_x() * index.tx;
    let max_y = index.tile_count_y() * index.ty;
    if max_x.max(max_y) > 99_999 {
        6
    } else {
        5
    }
}

/// Writes one tile into `dir` and returns its path
pub fn write_tile(dir: &Path, index: &GeogridIndex, tile: &TileBuffer) -> GeogridResult<PathBuf> {
    if tile.data.len() != index.tile_len() {
        return Err(GeogridError::GenericError(format!(
            "tile ({}, {}) holds {} values, expected {}",
            tile.tile_x,
            tile.tile_y,
            tile.data.len(),
            index.tile_len()
        )));
    }

    let path = dir.join(tile_file_name(index, tile.tile_x, tile.tile_y)?);
    let mut bytes = alloc_zeroed::<u8>(tile.data.len() * WORD_SIZE)?;
    NativeEndian::write_f32_into(&tile.data, &mut bytes);

    let mut writer = BufWriter::new(File::create(&path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;

    debug!("Wrote tile ({}, {}) to {}", tile.tile_x, tile.tile_y, path.display());
    Ok(path)
}

/// Reads a tile written by [`write_tile`]
pub fn read_tile(dir: &Path, index: &GeogridIndex, tile_x: usize, tile_y: usize) -> GeogridResult<TileBuffer> {
    let path = dir.join(tile_file_name(index, tile_x, tile_y)?);
    let bytes = fs::read(&path)?;

    let expected = index.tile_len() * WORD_SIZE;
    if bytes.len() != expected {
        return Err(GeogridError::GenericError(format!(
            "{} has {} bytes, expected {}",
            path.display(),
            bytes.len(),
            expected
        )));
    }

    let mut data = alloc_zeroed::<f32>(index.tile_len())?;
    NativeEndian::read_f32_into(&bytes, &mut data);

    Ok(TileBuffer {
        tile_x,
        tile_y,
        tx: index.tx,
        ty: index.ty,
        nz: index.nz,
        data,
    })
}

/// Writes the index file describing `index`
pub fn write_index_file(path: &Path, index: &GeogridIndex, attributes: &IndexAttributes) -> GeogridResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(format_index(index, attributes).as_bytes())?;
    writer.flush()?;

    info!("Wrote index file {}", path.display());
    Ok(())
}

/// Text of the index file
pub fn format_index(index: &GeogridIndex, attributes: &IndexAttributes) -> String {
    let endian = if cfg!(target_endian = "big") { "big" } else { "little" };

    let mut lines = Vec::new();
    for (key, value) in attributes.entries() {
        lines.push(format!("{}={}", key, quote(value)));
    }
    // Words are f32 whatever the source encoding
    lines.push("signed=yes".to_string());
    lines.push(format!("wordsize={}", WORD_SIZE));
    lines.push(format!("tile_x={}", index.tx));
    lines.push(format!("tile_y={}", index.ty));
    lines.push(format!("tile_z={}", index.nz));
    lines.push(format!("nx={}", index.nx));
    lines.push(format!("ny={}", index.ny));
    lines.push(format!("tiles_x={}", index.tile_count_x()));
    lines.push(format!("tiles_y={}", index.tile_count_y()));
    lines.push(format!("total_tiles={}", index.total_tile_count()));
    lines.push(format!("row_order={}", index.row_order.name()));
    lines.push(format!("endian={}", endian));
    lines.push(format!("sample_format={}", index.sample_format.encoding().name()));
    lines.push(format!("bytes_per_sample={}", index.sample_format.bytes_per_sample()));
    lines.push(format!("samples_per_pixel={}", index.samples_per_pixel));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Values containing spaces are quoted, as the preprocessing tools expect
fn quote(value: &str) -> String {
    if value.contains(char::is_whitespace) && !value.starts_with('"') {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

/// Reads an index file back into the geometry and its free-form attributes
pub fn read_index_file(path: &Path) -> GeogridResult<(GeogridIndex, IndexAttributes)> {
    parse_index(&fs::read_to_string(path)?)
}

/// Parses the text produced by [`format_index`]
pub fn parse_index(text: &str) -> GeogridResult<(GeogridIndex, IndexAttributes)> {
    let mut attributes = IndexAttributes::empty();
    let mut reserved = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| {
            GeogridError::InvalidConfig(format!("index line {}: missing '=' in '{}'", line_no + 1, line))
        })?;
        let key = key.trim();
        let value = value.trim().trim_matches('"');

        if RESERVED_KEYS.contains(&key) {
            reserved.push((key.to_string(), value.to_string()));
        } else {
            attributes.set(key, value)?;
        }
    }

    let lookup = |key: &str| -> GeogridResult<&str> {
        reserved
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| GeogridError::InvalidConfig(format!("index file lacks '{}'", key)))
    };
    let number = |key: &str| -> GeogridResult<usize> {
        let value = lookup(key)?;
        value
            .parse::<usize>()
            .map_err(|_| GeogridError::InvalidConfig(format!("index key '{}' is not a number: {}", key, value)))
    };

    let encoding_name = lookup("sample_format")?;
    let encoding = SampleEncoding::from_name(encoding_name)
        .ok_or_else(|| GeogridError::InvalidConfig(format!("unknown sample_format '{}'", encoding_name)))?;
    let order_name = lookup("row_order")?;
    let row_order = RowOrder::from_name(order_name)
        .ok_or_else(|| GeogridError::InvalidConfig(format!("unknown row_order '{}'", order_name)))?;

    let nz = number("tile_z")?;
    let index = GeogridIndex {
        nx: number("nx")?,
        ny: number("ny")?,
        nz,
        tx: number("tile_x")?,
        ty: number("tile_y")?,
        sample_format: SampleFormat::new(encoding, number("bytes_per_sample")?)?,
        samples_per_pixel: number("samples_per_pixel").unwrap_or(nz),
        row_order,
    };
    index.validate()?;

    Ok((index, attributes))
}

/// Writes finished tiles into an output directory
pub struct TileWriter {
    dir: PathBuf,
    index: GeogridIndex,
    written: Vec<PathBuf>,
}

impl TileWriter {
    pub fn new(dir: &Path, index: GeogridIndex) -> Self {
        TileWriter {
            dir: dir.to_path_buf(),
            index,
            written: Vec::new(),
        }
    }

    /// Paths of the tiles written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl TileSink for TileWriter {
    fn write_tile(&mut self, tile: &TileBuffer) -> GeogridResult<()> {
        let path = write_tile(&self.dir, &self.index, tile)?;
        self.written.push(path);
        Ok(())
    }
}
