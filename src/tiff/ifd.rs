//! Image File Directory structures
//!
//! An IFD is a list of tag entries describing one image. Entries whose
//! values fit in the entry itself keep those raw bytes so they can be
//! decoded later in the file's byte order.

use std::collections::HashMap;
use std::fmt;

use log::trace;

use crate::tiff::constants::{field_types, tags};
use crate::utils::tag_utils;

/// One directory of a TIFF file
#[derive(Debug, Clone)]
pub struct IFD {
    /// Entries in file order
    pub entries: Vec<IFDEntry>,
    /// Position in the IFD chain (0-based)
    pub number: usize,
    /// Offset of this IFD in the file
    pub offset: u64,
    /// Tag number to position in `entries`
    tag_map: HashMap<u16, usize>,
}

/// One tag of a directory
#[derive(Debug, Clone, PartialEq)]
pub struct IFDEntry {
    pub tag: u16,
    pub field_type: u16,
    /// Number of values, not bytes
    pub count: u64,
    /// Value field read as an offset in the file's byte order
    pub value_offset: u64,
    /// Raw value field bytes; only the first 4 are meaningful in classic TIFF
    pub value_bytes: [u8; 8],
}

impl IFDEntry {
    pub fn new(tag: u16, field_type: u16, count: u64, value_offset: u64, value_bytes: [u8; 8]) -> Self {
        IFDEntry {
            tag,
            field_type,
            count,
            value_offset,
            value_bytes,
        }
    }

    /// Size in bytes of one value of this entry's type, `None` for unknown types
    pub fn field_type_size(&self) -> Option<usize> {
        match self.field_type {
            field_types::BYTE | field_types::ASCII | field_types::SBYTE | field_types::UNDEFINED => Some(1),
            field_types::SHORT | field_types::SSHORT => Some(2),
            field_types::LONG | field_types::SLONG | field_types::FLOAT | field_types::IFD => Some(4),
            field_types::RATIONAL | field_types::SRATIONAL | field_types::DOUBLE => Some(8),
            field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => Some(8),
            _ => None,
        }
    }

    /// Whether the values live in the entry rather than at `value_offset`
    pub fn is_value_inline(&self, is_big_tiff: bool) -> bool {
        let inline_size = if is_big_tiff { 8 } else { 4 };
        match self.field_type_size() {
            Some(size) => (size as u64).saturating_mul(self.count) <= inline_size,
            None => false,
        }
    }
}

impl IFD {
    pub fn new(number: usize, offset: u64) -> Self {
        IFD {
            entries: Vec::new(),
            number,
            offset,
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry; a repeated tag replaces the earlier lookup
    pub fn add_entry(&mut self, entry: IFDEntry) {
        trace!(
            "IFD #{}: tag {} ({}), type {}, count {}",
            self.number,
            entry.tag,
            tag_utils::get_tag_name(entry.tag),
            entry.field_type,
            entry.count
        );

        self.tag_map.insert(entry.tag, self.entries.len());
        self.entries.push(entry);
    }

    pub fn has_tag(&self, tag: u16) -> bool {
        self.tag_map.contains_key(&tag)
    }

    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag).map(|&i| &self.entries[i])
    }

    /// True when the image is stored in tiles instead of strips
    pub fn is_tiled(&self) -> bool {
        self.has_tag(tags::TILE_WIDTH) || self.has_tag(tags::TILE_OFFSETS)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for IFD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IFD #{} (offset: {})", self.number, self.offset)?;
        writeln!(f, "  Number of entries: {}", self.entry_count())?;
        for entry in &self.entries {
            writeln!(
                f,
                "    {} ({}): count {} [{}]",
                entry.tag,
                tag_utils::get_tag_name(entry.tag),
                entry.count,
                tag_utils::get_field_type_name(entry.field_type)
            )?;
        }
        Ok(())
    }
}
