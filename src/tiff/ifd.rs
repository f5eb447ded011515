//! Image File Directory (IFD) structures and methods
//!
//! An IFD is one frame's tag set. Entries keep their raw value bytes in
//! stream byte order so values are decoded on demand with the right
//! handler, whether they were stored inline or at an external offset.

use std::collections::HashMap;
use std::fmt;
use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::tags;
use crate::tiff::errors::TiffResult;
use crate::tiff::types::TagValue;
use log::{debug, trace};
use crate::utils::{tag_utils, tiff_code_translators};

/// Represents an Image File Directory (IFD) in a TIFF file
///
/// Tag ids are unique within one directory; the parser keeps the first
/// occurrence of a duplicated tag.
#[derive(Debug, Clone)]
pub struct IFD {
    /// Entries in this IFD, in stream order
    pub entries: Vec<IFDEntry>,
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in the file
    pub offset: u64,
    /// Offset of the next chained IFD, 0 at the end of the chain
    pub next_offset: u64,
    /// Byte order the entry data is stored in
    pub byte_order: ByteOrder,
    /// Index of each tag in `entries`
    tag_map: HashMap<u16, usize>,
}

/// Represents an entry in an Image File Directory (IFD)
#[derive(Debug, Clone)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Offset of the external value, or the raw inline field as a number
    pub value_offset: u64,
    /// Value bytes in stream byte order
    pub data: Vec<u8>,
}

impl IFDEntry {
    /// Creates a new IFD entry
    pub fn new(tag: u16, field_type: u16, count: u64, value_offset: u64, data: Vec<u8>) -> Self {
        trace!("IFD entry: tag={} ({}), type={} ({}), count={}, offset/value={}",
               tag, tag_utils::get_tag_name(tag), field_type,
               tag_utils::get_field_type_name(field_type), count, value_offset);

        Self {
            tag,
            field_type,
            count,
            value_offset,
            data,
        }
    }

    /// Determines if the value is stored inline in the entry
    pub fn is_value_inline(&self, is_big_tiff: bool) -> bool {
        tag_utils::is_value_inline(self.field_type, self.count, is_big_tiff)
    }

    /// Decodes the entry's value
    pub fn value(&self, byte_order: ByteOrder) -> TiffResult<TagValue> {
        let handler = byte_order.create_handler();
        TagValue::decode(self.field_type, self.count, &self.data, handler.as_ref())
    }

    /// Returns a human-readable description of this entry
    pub fn description(&self, byte_order: ByteOrder) -> String {
        let tag_name = tag_utils::get_tag_name(self.tag);
        let field_type_name = tag_utils::get_field_type_name(self.field_type);

        let value_display = match self.value(byte_order) {
            Ok(value) => {
                let first = value.first_u64().unwrap_or(0);
                match self.tag {
                    tags::COMPRESSION => format!("{} ({})", first,
                                                 tiff_code_translators::compression_code_to_name(first)),
                    tags::PHOTOMETRIC_INTERPRETATION => format!("{} ({})", first,
                                                                tiff_code_translators::photometric_code_to_name(first)),
                    tags::PLANAR_CONFIGURATION => format!("{} ({})", first,
                                                          tiff_code_translators::planar_config_code_to_name(first)),
                    _ => value.to_string(),
                }
            },
            Err(_) => format!("<{} bytes>", self.data.len()),
        };

        format!("{} ({}): {} [{} x{}]",
                self.tag, tag_name, value_display, field_type_name, self.count)
    }
}

impl IFD {
    /// Creates a new IFD
    pub fn new(number: usize, offset: u64, byte_order: ByteOrder) -> Self {
        debug!("Creating new IFD #{} at offset {}", number, offset);

        Self {
            entries: Vec::new(),
            number,
            offset,
            next_offset: 0,
            byte_order,
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry to this IFD
    ///
    /// Returns false, leaving the directory unchanged, when the tag is
    /// already present.
    pub fn add_entry(&mut self, entry: IFDEntry) -> bool {
        if self.tag_map.contains_key(&entry.tag) {
            return false;
        }
        self.tag_map.insert(entry.tag, self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Checks if this IFD has a specific tag
    pub fn has_tag(&self, tag: u16) -> bool {
        self.tag_map.contains_key(&tag)
    }

    /// Gets an IFD entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag).map(|&index| &self.entries[index])
    }

    /// Decodes a tag's value, `None` if absent or undecodable
    pub fn get_value(&self, tag: u16) -> Option<TagValue> {
        let entry = self.get_entry(tag)?;
        match entry.value(self.byte_order) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Tag {} ({}) in IFD #{} could not be decoded: {}",
                       tag, tag_utils::get_tag_name(tag), self.number, e);
                None
            }
        }
    }

    /// First unsigned value of a tag
    pub fn get_u64(&self, tag: u16) -> Option<u64> {
        self.get_value(tag).and_then(|v| v.first_u64())
    }

    /// Gets the dimensions of the image described by this IFD
    pub fn get_dimensions(&self) -> Option<(u64, u64)> {
        let width = self.get_u64(tags::IMAGE_WIDTH)?;
        let height = self.get_u64(tags::IMAGE_LENGTH)?;
        Some((width, height))
    }

    /// Returns number of samples per pixel (default 1 if not specified)
    pub fn get_samples_per_pixel(&self) -> u64 {
        self.get_u64(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Whether the image data is organized in tiles
    pub fn is_tiled(&self) -> bool {
        self.has_tag(tags::TILE_WIDTH) && self.has_tag(tags::TILE_LENGTH)
    }

    /// Gets the number of entries in this IFD
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for IFD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IFD #{} (offset: {})", self.number, self.offset)?;
        writeln!(f, "  Number of entries: {}", self.entries.len())?;

        if let Some((width, height)) = self.get_dimensions() {
            writeln!(f, "  Dimensions: {}x{}", width, height)?;
        }

        writeln!(f, "  Samples per pixel: {}", self.get_samples_per_pixel())?;
        writeln!(f, "  Tags:")?;
        for entry in &self.entries {
            writeln!(f, "    {}", entry.description(self.byte_order))?;
        }

        Ok(())
    }
}
