//! End to end tests: TIFF file in, geogrid tiles and index out

mod common;

use std::fs;
use std::path::Path;

use common::{Sample, TestTiff};
use geogrid_tiler::geogrid::writer::INDEX_FILE_NAME;
use geogrid_tiler::{ConversionConfig, ConversionMode, GeogridError, GeogridTiler, RowOrder, Traversal};

fn ramp(row: usize, col: usize) -> f64 {
    (row * 100 + col) as f64
}

fn tiler(tile_x: usize, tile_y: usize, mode: ConversionMode, traversal: Traversal, order: RowOrder) -> GeogridTiler {
    GeogridTiler::new(ConversionConfig {
        tile_x,
        tile_y,
        mode,
        traversal,
        row_order: order,
        ..ConversionConfig::default()
    })
}

/// Every file in an output directory, sorted by name
fn output_files(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            (entry.file_name().to_string_lossy().into_owned(), fs::read(entry.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_uint16_tiff_to_bottom_top_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let input = TestTiff::new(10, 7, 2, Sample::U16).write(dir.path(), "ramp.tif", ramp);
    let out = dir.path().join("tiles");

    let tiler = tiler(4, 3, ConversionMode::Rows, Traversal::Reverse, RowOrder::BottomTop);
    let summary = tiler.convert(&input, &out).unwrap();
    assert_eq!(summary.tiles_written, 9);
    assert_eq!(summary.groups_read, 3);

    let (index, attributes) = tiler.read_index(&out).unwrap();
    assert_eq!((index.nx, index.ny, index.nz), (10, 7, 1));
    assert_eq!(index.total_tile_count(), 9);
    assert_eq!(attributes.get("type"), Some("continuous"));

    for tile_y in 0..3 {
        for tile_x in 0..3 {
            let tile = tiler.read_tile(&out, tile_x, tile_y).unwrap();
            for r in 0..3 {
                for c in 0..4 {
                    let grid_row = tile_y * 3 + r;
                    let col = tile_x * 4 + c;
                    let expected = if grid_row < 7 && col < 10 {
                        ramp(6 - grid_row, col) as f32
                    } else {
                        0.0
                    };
                    assert_eq!(tile.data[r * 4 + c], expected, "tile ({}, {}) cell ({}, {})", tile_x, tile_y, r, c);
                }
            }
        }
    }

    // index plus one file per tile, each tx * ty * 4 bytes
    let files = output_files(&out);
    assert_eq!(files.len(), 10);
    assert!(files.iter().filter(|(name, _)| name != INDEX_FILE_NAME).all(|(_, data)| data.len() == 48));
}

#[test]
fn test_modes_and_traversals_write_identical_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut spec = TestTiff::new(13, 11, 3, Sample::F32);
    spec.big_endian = true;
    spec.deflate = true;
    let input = spec.write(dir.path(), "float.tif", |row, col| row as f64 * 0.5 - col as f64 * 1.25);

    let mut reference = None;
    for mode in [ConversionMode::Whole, ConversionMode::Rows, ConversionMode::Strips] {
        for traversal in [Traversal::Forward, Traversal::Reverse] {
            let out = dir.path().join(format!("{}_{}", mode.name(), traversal.name()));
            tiler(5, 4, mode, traversal, RowOrder::TopBottom).convert(&input, &out).unwrap();

            let files = output_files(&out);
            assert_eq!(files.len(), 1 + 3 * 3);
            match &reference {
                None => reference = Some(files),
                Some(expected) => assert_eq!(&files, expected, "{} / {}", mode.name(), traversal.name()),
            }
        }
    }
}

#[test]
fn test_little_and_big_endian_sources_agree() {
    let dir = tempfile::tempdir().unwrap();
    let value = |row: usize, col: usize| (row as f64 - 3.0) * 1000.0 - col as f64;

    let mut results = Vec::new();
    for (big_endian, deflate) in [(false, false), (true, false), (false, true), (true, true)] {
        let mut spec = TestTiff::new(6, 5, 2, Sample::I32);
        spec.big_endian = big_endian;
        spec.deflate = deflate;
        let input = spec.write(dir.path(), &format!("i32_{}_{}.tif", big_endian, deflate), value);

        let out = dir.path().join(format!("out_{}_{}", big_endian, deflate));
        tiler(4, 4, ConversionMode::Rows, Traversal::Reverse, RowOrder::BottomTop)
            .convert(&input, &out)
            .unwrap();
        results.push(output_files(&out));
    }

    for other in &results[1..] {
        assert_eq!(other, &results[0]);
    }

    // Tile (0, 0) starts with the bottom raster row
    let tile = tiler(4, 4, ConversionMode::Rows, Traversal::Reverse, RowOrder::BottomTop)
        .read_tile(&dir.path().join("out_false_false"), 0, 0)
        .unwrap();
    assert_eq!(&tile.data[..4], &[1000.0, 999.0, 998.0, 997.0]);
}

#[test]
fn test_config_file_drives_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let input = TestTiff::new(8, 8, 8, Sample::U16).write(dir.path(), "cfg.tif", ramp);
    let config_path = dir.path().join("tiler.toml");
    fs::write(
        &config_path,
        "tile_size = 3\nrow_order = \"top_bottom\"\nfill_value = -1\n\n[index]\nunits = \"meters\"\n",
    )
    .unwrap();

    let tiler = GeogridTiler::from_config_file(&config_path).unwrap();
    let out = dir.path().join("out");
    let summary = tiler.convert(&input, &out).unwrap();
    assert_eq!(summary.tiles_written, 9);

    let (_, attributes) = tiler.read_index(&out).unwrap();
    assert_eq!(attributes.get("units"), Some("meters"));

    // Bottom-right tile: raster rows 6..8, columns 6..8, padding filled with -1
    let tile = tiler.read_tile(&out, 2, 2).unwrap();
    assert_eq!(&tile.data[..3], &[606.0, 607.0, -1.0]);
    assert_eq!(&tile.data[6..], &[-1.0, -1.0, -1.0]);
}

#[test]
fn test_analyze_reports_planned_grid() {
    let dir = tempfile::tempdir().unwrap();
    let input = TestTiff::new(10, 7, 2, Sample::U16).write(dir.path(), "info.tif", ramp);

    let tiler = tiler(4, 3, ConversionMode::Rows, Traversal::Reverse, RowOrder::BottomTop);
    let report = tiler.analyze(&input).unwrap();
    assert!(report.contains("Size: 10 x 7 pixels, 1 band(s)"));
    assert!(report.contains("Tiles: 3 x 3 = 9"));

    let index = tiler.plan(&input).unwrap();
    assert_eq!(index.tile_count_y(), 3);
}

#[test]
fn test_truncated_file_aborts_with_read_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = TestTiff::new(10, 8, 2, Sample::U16).write(dir.path(), "cut.tif", ramp);

    // Point the last strip past the end of the file
    let mut bytes = fs::read(&input).unwrap();
    let len = bytes.len() as u32;
    let last_offset = 8 + 3 * 40;
    let position = bytes
        .windows(4)
        .rposition(|w| w == (last_offset as u32).to_le_bytes())
        .unwrap();
    bytes[position..position + 4].copy_from_slice(&(len + 100).to_le_bytes());
    fs::write(&input, bytes).unwrap();

    let out = dir.path().join("out");
    let tiler = tiler(4, 2, ConversionMode::Rows, Traversal::Forward, RowOrder::TopBottom);
    let result = tiler.convert(&input, &out);
    assert!(matches!(result, Err(GeogridError::ReadFailure { strip: 3, .. })));

    // Output written before the failure stays
    assert!(out.join(INDEX_FILE_NAME).exists());
}

#[test]
fn test_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let tiler = GeogridTiler::new(ConversionConfig::default());
    let result = tiler.convert(&dir.path().join("absent.tif"), &dir.path().join("out"));
    assert!(matches!(result, Err(GeogridError::IoError(_))));
}
