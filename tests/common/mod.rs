//! Writes small single-band stripped TIFF files for the integration tests

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::write::ZlibEncoder;
use flate2::Compression;

#[derive(Clone, Copy)]
pub enum Sample {
    U16,
    I32,
    F32,
}

impl Sample {
    fn bits(self) -> u32 {
        match self {
            Sample::U16 => 16,
            Sample::I32 | Sample::F32 => 32,
        }
    }

    fn format(self) -> u32 {
        match self {
            Sample::U16 => 1,
            Sample::I32 => 2,
            Sample::F32 => 3,
        }
    }
}

pub struct TestTiff {
    pub width: usize,
    pub height: usize,
    pub rows_per_strip: usize,
    pub sample: Sample,
    pub big_endian: bool,
    pub deflate: bool,
}

impl TestTiff {
    pub fn new(width: usize, height: usize, rows_per_strip: usize, sample: Sample) -> Self {
        TestTiff {
            width,
            height,
            rows_per_strip,
            sample,
            big_endian: false,
            deflate: false,
        }
    }

    /// Writes the raster to `dir/name`; `value(row, col)` gives each pixel
    pub fn write(&self, dir: &Path, name: &str, value: impl Fn(usize, usize) -> f64) -> PathBuf {
        let path = dir.join(name);
        let bytes = if self.big_endian {
            self.encode::<BigEndian>(&value)
        } else {
            self.encode::<LittleEndian>(&value)
        };
        fs::write(&path, bytes).unwrap();
        path
    }

    fn encode<B: ByteOrder>(&self, value: &impl Fn(usize, usize) -> f64) -> Vec<u8> {
        let mut strips = Vec::new();
        for first in (0..self.height).step_by(self.rows_per_strip) {
            let mut raw = Vec::new();
            for row in first..(first + self.rows_per_strip).min(self.height) {
                for col in 0..self.width {
                    let v = value(row, col);
                    let mut buf = [0u8; 4];
                    match self.sample {
                        Sample::U16 => {
                            B::write_u16(&mut buf, v as u16);
                            raw.extend_from_slice(&buf[..2]);
                        }
                        Sample::I32 => {
                            B::write_i32(&mut buf, v as i32);
                            raw.extend_from_slice(&buf);
                        }
                        Sample::F32 => {
                            B::write_f32(&mut buf, v as f32);
                            raw.extend_from_slice(&buf);
                        }
                    }
                }
            }
            if self.deflate {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&raw).unwrap();
                raw = encoder.finish().unwrap();
            }
            strips.push(raw);
        }

        let mut out = vec![0u8; 8];
        out[..2].copy_from_slice(if self.big_endian { b"MM" } else { b"II" });
        B::write_u16(&mut out[2..4], 42);

        let mut offsets = Vec::new();
        for strip in &strips {
            offsets.push(out.len() as u32);
            out.extend_from_slice(strip);
        }
        if out.len() % 2 == 1 {
            out.push(0);
        }

        // Offsets and byte counts live in an external block after the IFD
        let entries: Vec<(u16, u16, u32, Vec<u32>)> = vec![
            (256, 4, 1, vec![self.width as u32]),
            (257, 4, 1, vec![self.height as u32]),
            (258, 3, 1, vec![self.sample.bits()]),
            (259, 3, 1, vec![if self.deflate { 8 } else { 1 }]),
            (262, 3, 1, vec![1]),
            (273, 4, strips.len() as u32, offsets),
            (277, 3, 1, vec![1]),
            (278, 4, 1, vec![self.rows_per_strip as u32]),
            (279, 4, strips.len() as u32, strips.iter().map(|s| s.len() as u32).collect()),
            (339, 3, 1, vec![self.sample.format()]),
        ];

        let ifd_offset = out.len();
        let ifd_end = ifd_offset + 2 + entries.len() * 12 + 4;
        B::write_u32(&mut out[4..8], ifd_offset as u32);

        let mut ifd = Vec::new();
        let mut external = Vec::new();
        let mut word = [0u8; 4];
        B::write_u16(&mut word[..2], entries.len() as u16);
        ifd.extend_from_slice(&word[..2]);

        for (tag, field_type, count, values) in entries {
            let mut entry = [0u8; 12];
            B::write_u16(&mut entry[0..2], tag);
            B::write_u16(&mut entry[2..4], field_type);
            B::write_u32(&mut entry[4..8], count);
            if count == 1 {
                if field_type == 3 {
                    B::write_u16(&mut entry[8..10], values[0] as u16);
                } else {
                    B::write_u32(&mut entry[8..12], values[0]);
                }
            } else {
                B::write_u32(&mut entry[8..12], (ifd_end + external.len()) as u32);
                for v in values {
                    B::write_u32(&mut word, v);
                    external.extend_from_slice(&word);
                }
            }
            ifd.extend_from_slice(&entry);
        }
        ifd.extend_from_slice(&[0, 0, 0, 0]);

        out.extend_from_slice(&ifd);
        out.extend_from_slice(&external);
        out
    }
}
