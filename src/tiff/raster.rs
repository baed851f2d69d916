//! Stripped TIFF and BigTIFF files as a tiling source
//!
//! `TiffRaster` reads the first image directory once at open time and then
//! serves decoded strips on demand. Strips are decompressed, swapped to host
//! byte order and, for predictor 2 files, integrated back to sample values
//! before they reach the tiling pipeline.

use std::fs::File;
use std::io::{BufReader, SeekFrom};
use std::path::Path;

use log::{debug, info};

use crate::compression::{CompressionFactory, CompressionHandler};
use crate::errors::{GeogridError, GeogridResult};
use crate::geogrid::conversion::{alloc_zeroed, SampleEncoding, SampleFormat};
use crate::geogrid::source::{PlanarLayout, RasterMetadata, RasterSource};
use crate::io::byte_order::ByteOrder;
use crate::io::SeekableReader;
use crate::tiff::constants::{compression, planar_config, predictor, sample_format, tags};
use crate::tiff::ifd::IFD;
use crate::tiff::predictor::undo_horizontal_differencing;
use crate::tiff::reader::TiffReader;
use crate::tiff::validation;
use crate::utils::tag_utils;

/// A stripped TIFF opened for strip-by-strip decoding
pub struct TiffRaster<R: SeekableReader = BufReader<File>> {
    reader: R,
    byte_order: ByteOrder,
    is_big_tiff: bool,
    metadata: RasterMetadata,
    strip_offsets: Vec<u64>,
    strip_byte_counts: Vec<u64>,
    compression_code: u64,
    compression: Box<dyn CompressionHandler>,
    predictor: u64,
    file_size: u64,
}

impl TiffRaster<BufReader<File>> {
    /// Opens a TIFF file from disk
    pub fn open(path: &Path) -> GeogridResult<Self> {
        info!("Opening raster {}", path.display());
        let file = File::open(path)?;
        TiffRaster::from_reader(BufReader::with_capacity(1024 * 1024, file))
    }
}

impl<R: SeekableReader> TiffRaster<R> {
    /// Parses the first image directory of a TIFF held by `reader`
    pub fn from_reader(mut reader: R) -> GeogridResult<Self> {
        let (tiff_reader, tiff) = TiffReader::read(&mut reader)?;
        let ifd = tiff
            .main_ifd()
            .ok_or_else(|| GeogridError::GenericError("TIFF file has no image directory".to_string()))?;

        if ifd.is_tiled() {
            return Err(GeogridError::GenericError(
                "tiled TIFF layout is not supported, only strips".to_string(),
            ));
        }

        let layout = read_layout(&tiff_reader, &mut reader, ifd)?;
        let compression_code = optional(&tiff_reader, &mut reader, ifd, tags::COMPRESSION, compression::NONE)?;
        let handler = CompressionFactory::create_handler(compression_code)?;

        let predictor_code = optional(&tiff_reader, &mut reader, ifd, tags::PREDICTOR, predictor::NONE)?;
        match predictor_code {
            predictor::NONE | predictor::HORIZONTAL_DIFFERENCING => {}
            predictor::FLOATING_POINT => {
                return Err(GeogridError::GenericError(
                    "floating point predictor (3) is not supported".to_string(),
                ))
            }
            other => return Err(GeogridError::GenericError(format!("unknown predictor {}", other))),
        }

        let strip_offsets = tiff_reader.read_tag_values(&mut reader, ifd, tags::STRIP_OFFSETS)?;
        let strip_byte_counts = tiff_reader.read_tag_values(&mut reader, ifd, tags::STRIP_BYTE_COUNTS)?;
        let metadata = read_metadata(&tiff_reader, &mut reader, ifd, layout, strip_offsets.len())?;

        if strip_byte_counts.len() != strip_offsets.len() {
            return Err(GeogridError::GenericError(format!(
                "{} strip offsets but {} strip byte counts",
                strip_offsets.len(),
                strip_byte_counts.len()
            )));
        }

        let file_size = validation::get_file_size(&mut reader)?;

        debug!(
            "{}x{}x{} {} {}-byte samples, {} rows per strip, {} strips, {}, predictor {}",
            metadata.nx,
            metadata.ny,
            metadata.nz,
            metadata.sample_format.encoding(),
            metadata.sample_format.bytes_per_sample(),
            metadata.strip_height,
            metadata.total_strips,
            handler.name(),
            predictor_code
        );

        Ok(TiffRaster {
            reader,
            byte_order: tiff_reader.byte_order(),
            is_big_tiff: tiff_reader.is_big_tiff(),
            metadata,
            strip_offsets,
            strip_byte_counts,
            compression_code,
            compression: handler,
            predictor: predictor_code,
            file_size,
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    pub fn compression_name(&self) -> &'static str {
        tag_utils::get_compression_name(self.compression_code)
    }

    pub fn predictor(&self) -> u64 {
        self.predictor
    }

    /// Byte count of each strip as stored in the file
    pub fn strip_byte_counts(&self) -> &[u64] {
        &self.strip_byte_counts
    }
}

impl<R: SeekableReader> RasterSource for TiffRaster<R> {
    fn metadata(&self) -> &RasterMetadata {
        &self.metadata
    }

    fn read_encoded_strip(&mut self, strip: usize, dest: &mut [u8]) -> GeogridResult<usize> {
        let (offset, length) = match (self.strip_offsets.get(strip), self.strip_byte_counts.get(strip)) {
            (Some(&offset), Some(&length)) => (offset, length),
            _ => {
                return Err(GeogridError::ReadFailure {
                    strip,
                    message: format!("file has only {} strips", self.strip_offsets.len()),
                })
            }
        };
        validation::validate_data_range(offset, length, self.file_size, "strip")?;

        let mut stored = alloc_zeroed::<u8>(length as usize)?;
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.read_exact(&mut stored)?;

        let mut data = self.compression.decompress(&stored)?;

        let width = self.metadata.sample_format.bytes_per_sample();
        self.byte_order.to_native(&mut data, width);

        if self.predictor == predictor::HORIZONTAL_DIFFERENCING {
            let components = self.metadata.samples_per_pixel;
            undo_horizontal_differencing(&mut data, width, self.metadata.nx * components, components)?;
        }

        // Some writers pad the last strip to full height
        let n = data.len().min(dest.len());
        dest[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}

fn optional(
    tiff_reader: &TiffReader,
    reader: &mut dyn SeekableReader,
    ifd: &IFD,
    tag: u16,
    default: u64,
) -> GeogridResult<u64> {
    Ok(tiff_reader.read_tag_value(reader, ifd, tag)?.unwrap_or(default))
}

/// Per-sample tags may repeat one value per band; all must agree
fn uniform(
    tiff_reader: &TiffReader,
    reader: &mut dyn SeekableReader,
    ifd: &IFD,
    tag: u16,
    default: u64,
) -> GeogridResult<u64> {
    if !ifd.has_tag(tag) {
        return Ok(default);
    }

    let values = tiff_reader.read_tag_values(reader, ifd, tag)?;
    let first = values.first().copied().unwrap_or(default);
    if values.iter().any(|&v| v != first) {
        return Err(GeogridError::GenericError(format!(
            "{} differs between bands: {:?}",
            tag_utils::get_tag_name(tag),
            values
        )));
    }
    Ok(first)
}

fn read_layout(tiff_reader: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> GeogridResult<PlanarLayout> {
    match optional(tiff_reader, reader, ifd, tags::PLANAR_CONFIGURATION, planar_config::CHUNKY)? {
        planar_config::CHUNKY => Ok(PlanarLayout::Interleaved),
        planar_config::PLANAR => Ok(PlanarLayout::Planar),
        other => Err(GeogridError::GenericError(format!("unknown planar configuration {}", other))),
    }
}

fn read_metadata(
    tiff_reader: &TiffReader,
    reader: &mut dyn SeekableReader,
    ifd: &IFD,
    layout: PlanarLayout,
    total_strips: usize,
) -> GeogridResult<RasterMetadata> {
    let nx = tiff_reader
        .read_tag_value(reader, ifd, tags::IMAGE_WIDTH)?
        .ok_or(GeogridError::MissingDimensions)? as usize;
    let ny = tiff_reader
        .read_tag_value(reader, ifd, tags::IMAGE_LENGTH)?
        .ok_or(GeogridError::MissingDimensions)? as usize;
    if nx == 0 || ny == 0 {
        return Err(GeogridError::MissingDimensions);
    }

    let bands = optional(tiff_reader, reader, ifd, tags::SAMPLES_PER_PIXEL, 1)?.max(1) as usize;
    let bits = uniform(tiff_reader, reader, ifd, tags::BITS_PER_SAMPLE, 1)? as usize;
    let format_code = uniform(tiff_reader, reader, ifd, tags::SAMPLE_FORMAT, sample_format::UNSIGNED)?;

    let encoding = SampleEncoding::from_tiff_code(format_code)?;
    if bits % 8 != 0 {
        return Err(GeogridError::UnsupportedEncoding {
            encoding: format!("{} ({} bits)", encoding, bits),
            bytes_per_sample: bits / 8,
        });
    }
    let sample_format = SampleFormat::new(encoding, bits / 8)?;

    let strip_height = optional(tiff_reader, reader, ifd, tags::ROWS_PER_STRIP, ny as u64)?
        .clamp(1, ny as u64) as usize;

    let metadata = RasterMetadata {
        nx,
        ny,
        nz: bands,
        sample_format,
        samples_per_pixel: match layout {
            PlanarLayout::Interleaved => bands,
            PlanarLayout::Planar => 1,
        },
        strip_height,
        total_strips,
        layout,
    };

    let expected = metadata.strips_per_plane() * metadata.plane_count();
    if total_strips != expected {
        return Err(GeogridError::GenericError(format!(
            "expected {} strips for {} rows of {} per strip, file lists {}",
            expected, ny, strip_height, total_strips
        )));
    }

    Ok(metadata)
}
