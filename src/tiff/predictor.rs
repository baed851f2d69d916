//! Reversal of TIFF predictor 2 (horizontal differencing)
//!
//! Encoders store each sample as the difference to the previous sample of
//! the same component in the row. Decoding is a running sum with wrapping
//! arithmetic at the sample width. Samples must already be in host order.

use byteorder::{ByteOrder, NativeEndian};

use crate::errors::{GeogridError, GeogridResult};

/// Undoes horizontal differencing in place
///
/// * `bytes_per_sample` - 1, 2, 4 or 8
/// * `row_samples` - samples in one row of the strip, all components included
/// * `components` - interleaved components per pixel (1 for planar data)
///
/// A trailing partial row is decoded as far as it goes.
pub fn undo_horizontal_differencing(
    data: &mut [u8],
    bytes_per_sample: usize,
    row_samples: usize,
    components: usize,
) -> GeogridResult<()> {
    if !matches!(bytes_per_sample, 1 | 2 | 4 | 8) {
        return Err(GeogridError::UnsupportedEncoding {
            encoding: "horizontal predictor".to_string(),
            bytes_per_sample,
        });
    }
    if row_samples == 0 || components == 0 {
        return Ok(());
    }

    let row_bytes = row_samples * bytes_per_sample;
    for row in data.chunks_mut(row_bytes) {
        let samples = row.len() / bytes_per_sample;
        for i in components..samples {
            let prev = load(row, i - components, bytes_per_sample);
            let cur = load(row, i, bytes_per_sample);
            store(row, i, bytes_per_sample, cur.wrapping_add(prev));
        }
    }

    Ok(())
}

fn load(row: &[u8], index: usize, width: usize) -> u64 {
    let bytes = &row[index * width..(index + 1) * width];
    match width {
        1 => bytes[0] as u64,
        2 => NativeEndian::read_u16(bytes) as u64,
        4 => NativeEndian::read_u32(bytes) as u64,
        _ => NativeEndian::read_u64(bytes),
    }
}

// Truncates to the sample width, which is where the wrap happens
fn store(row: &mut [u8], index: usize, width: usize, value: u64) {
    let bytes = &mut row[index * width..(index + 1) * width];
    match width {
        1 => bytes[0] = value as u8,
        2 => NativeEndian::write_u16(bytes, value as u16),
        4 => NativeEndian::write_u32(bytes, value as u32),
        _ => NativeEndian::write_u64(bytes, value),
    }
}
