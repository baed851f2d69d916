//! Sample format normalization
//!
//! Raw strip bytes arrive in one of several integer or floating point
//! encodings. This module turns them into the canonical `f32` form used by
//! the tiling code. Byte order is not touched here: the raster source hands
//! over samples already in host order.

use std::fmt;

use byteorder::{ByteOrder, NativeEndian};
use log::trace;

use crate::errors::{GeogridError, GeogridResult};

/// How the bits of one sample are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Unsigned integer data (TIFF SampleFormat 1)
    UnsignedInt,
    /// Two's complement signed integer data (TIFF SampleFormat 2)
    SignedInt,
    /// IEEE floating point data (TIFF SampleFormat 3)
    IeeeFloat,
}

impl SampleEncoding {
    /// Maps a TIFF SampleFormat tag value to an encoding
    pub fn from_tiff_code(code: u64) -> GeogridResult<Self> {
        match code {
            1 => Ok(SampleEncoding::UnsignedInt),
            2 => Ok(SampleEncoding::SignedInt),
            3 => Ok(SampleEncoding::IeeeFloat),
            other => Err(GeogridError::UnsupportedEncoding {
                encoding: format!("sample format {}", other),
                bytes_per_sample: 0,
            }),
        }
    }

    /// Short name used in diagnostics and the index file
    pub fn name(&self) -> &'static str {
        match self {
            SampleEncoding::UnsignedInt => "uint",
            SampleEncoding::SignedInt => "int",
            SampleEncoding::IeeeFloat => "IEEEFP",
        }
    }

    /// Parses the short name written by [`SampleEncoding::name`]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "uint" => Some(SampleEncoding::UnsignedInt),
            "int" => Some(SampleEncoding::SignedInt),
            "IEEEFP" => Some(SampleEncoding::IeeeFloat),
            _ => None,
        }
    }

    /// Whether values of this encoding may be negative
    pub fn is_signed(&self) -> bool {
        !matches!(self, SampleEncoding::UnsignedInt)
    }
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated encoding and sample width pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleFormat {
    encoding: SampleEncoding,
    bytes_per_sample: usize,
}

impl SampleFormat {
    /// Creates a sample format, rejecting combinations without a conversion
    pub fn new(encoding: SampleEncoding, bytes_per_sample: usize) -> GeogridResult<Self> {
        let supported = match encoding {
            SampleEncoding::UnsignedInt | SampleEncoding::SignedInt => {
                matches!(bytes_per_sample, 1 | 2 | 4)
            }
            SampleEncoding::IeeeFloat => matches!(bytes_per_sample, 4 | 8),
        };

        if !supported {
            return Err(GeogridError::UnsupportedEncoding {
                encoding: encoding.name().to_string(),
                bytes_per_sample,
            });
        }

        Ok(SampleFormat { encoding, bytes_per_sample })
    }

    pub fn encoding(&self) -> SampleEncoding {
        self.encoding
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bytes_per_sample
    }

    /// True when raw samples are already `f32` and need no conversion
    pub fn is_native_float(&self) -> bool {
        self.encoding == SampleEncoding::IeeeFloat && self.bytes_per_sample == 4
    }

    /// Allocates a raw read buffer for `count` samples of this format
    pub fn allocate(&self, count: usize) -> GeogridResult<RawSamples> {
        if self.is_native_float() {
            Ok(RawSamples::Native(alloc_zeroed::<f32>(count)?))
        } else {
            let bytes = count.checked_mul(self.bytes_per_sample).ok_or(
                GeogridError::AllocationFailure { bytes: usize::MAX },
            )?;
            Ok(RawSamples::Encoded {
                bytes: alloc_zeroed::<u8>(bytes)?,
                format: *self,
            })
        }
    }
}

/// Raw samples as read from the source, before normalization
///
/// For single precision float rasters the read buffer is the float buffer
/// itself, so no second allocation happens on conversion.
#[derive(Debug)]
pub enum RawSamples {
    /// Bytes that still need decoding
    Encoded { bytes: Vec<u8>, format: SampleFormat },
    /// Host-order `f32` samples viewed as bytes while reading
    Native(Vec<f32>),
}

impl RawSamples {
    /// Mutable byte view for the source to read into
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            RawSamples::Encoded { bytes, .. } => bytes.as_mut_slice(),
            RawSamples::Native(values) => bytemuck::cast_slice_mut(values.as_mut_slice()),
        }
    }

    /// Byte view of the buffer
    pub fn bytes(&self) -> &[u8] {
        match self {
            RawSamples::Encoded { bytes, .. } => bytes.as_slice(),
            RawSamples::Native(values) => bytemuck::cast_slice(values.as_slice()),
        }
    }

    /// Converts the buffer into canonical floats
    pub fn into_f32(self) -> GeogridResult<Vec<f32>> {
        match self {
            RawSamples::Native(values) => Ok(values),
            RawSamples::Encoded { bytes, format } => convert_samples(&bytes, format),
        }
    }
}

/// Converts `raw` into one `f32` per sample
///
/// Integers up to 24 bits of magnitude are exact; wider 32-bit integers and
/// doubles are rounded to the nearest `f32`. Trailing bytes that do not make
/// a whole sample are ignored.
pub fn convert_samples(raw: &[u8], format: SampleFormat) -> GeogridResult<Vec<f32>> {
    let width = format.bytes_per_sample;
    let count = raw.len() / width;
    let mut out = alloc_zeroed::<f32>(count)?;

    trace!("Converting {} {} samples of {} bytes", count, format.encoding, width);

    let chunks = raw.chunks_exact(width);
    match (format.encoding, width) {
        (SampleEncoding::UnsignedInt, 1) => fill(&mut out, chunks, |c| c[0] as f32),
        (SampleEncoding::UnsignedInt, 2) => fill(&mut out, chunks, |c| NativeEndian::read_u16(c) as f32),
        (SampleEncoding::UnsignedInt, 4) => fill(&mut out, chunks, |c| NativeEndian::read_u32(c) as f32),
        (SampleEncoding::SignedInt, 1) => fill(&mut out, chunks, |c| c[0] as i8 as f32),
        (SampleEncoding::SignedInt, 2) => fill(&mut out, chunks, |c| NativeEndian::read_i16(c) as f32),
        (SampleEncoding::SignedInt, 4) => fill(&mut out, chunks, |c| NativeEndian::read_i32(c) as f32),
        (SampleEncoding::IeeeFloat, 4) => NativeEndian::read_f32_into(&raw[..count * 4], &mut out),
        (SampleEncoding::IeeeFloat, 8) => fill(&mut out, chunks, |c| NativeEndian::read_f64(c) as f32),
        (encoding, bytes_per_sample) => {
            return Err(GeogridError::UnsupportedEncoding {
                encoding: encoding.name().to_string(),
                bytes_per_sample,
            })
        }
    }

    Ok(out)
}

fn fill<'a, F>(out: &mut [f32], chunks: std::slice::ChunksExact<'a, u8>, decode: F)
where
    F: Fn(&'a [u8]) -> f32,
{
    for (dst, chunk) in out.iter_mut().zip(chunks) {
        *dst = decode(chunk);
    }
}

/// Allocates a zero-filled vector, reporting failure instead of aborting
pub(crate) fn alloc_zeroed<T: Clone + Default>(len: usize) -> GeogridResult<Vec<T>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| GeogridError::AllocationFailure {
        bytes: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    buffer.resize(len, T::default());
    Ok(buffer)
}
