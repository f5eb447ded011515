//! Typed, defaulted access to the current frame's tags
//!
//! `TagStore` binds a stream to the directory parser, holds the directory
//! of the frame being decoded and advances along the chain on request.

use log::{debug, info};
use std::collections::HashSet;
use std::io::SeekFrom;

use crate::io::byte_order::ByteOrder;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{compression, fill_order, orientation, planar_config, resolution_unit, sample_format, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::{TiffReader, TiffReaderBuilder};
use crate::tiff::types::TagValue;
use crate::tiff::warnings::WarningContext;
use crate::utils::tag_utils;

/// Tag store over one stream
pub struct TagStore<R: SeekableReader> {
    stream: R,
    reader: TiffReader,
    current: IFD,
    visited: HashSet<u64>,
}

impl<R: SeekableReader> TagStore<R> {
    /// Binds a stream and parses the first directory
    ///
    /// Any failure here is fatal: there is no frame to fall back on.
    pub fn open(mut stream: R, ignore_tags: &[u16], warnings: &mut WarningContext) -> TiffResult<Self> {
        let mut reader = TiffReaderBuilder::new().ignore_tags(ignore_tags).build();
        let first_offset = reader.read_header(&mut stream)?;
        let current = reader.read_ifd(&mut stream, first_offset, 0, warnings)?;

        let mut visited = HashSet::new();
        visited.insert(first_offset);

        info!("Opened {} stream ({}), first directory has {} entries",
              if reader.is_big_tiff() { "BigTIFF" } else { "TIFF" },
              reader.byte_order().name(), current.entry_count());

        Ok(TagStore { stream, reader, current, visited })
    }

    /// Directory of the current frame
    pub fn directory(&self) -> &IFD {
        &self.current
    }

    /// Zero-based index of the current frame
    pub fn frame_index(&self) -> usize {
        self.current.number
    }

    /// Byte order of the stream
    pub fn byte_order(&self) -> ByteOrder {
        self.reader.byte_order()
    }

    /// Whether the stream uses 8-byte offsets
    pub fn is_big_tiff(&self) -> bool {
        self.reader.is_big_tiff()
    }

    /// Size of the stream in bytes
    pub fn file_size(&self) -> u64 {
        self.reader.file_size()
    }

    /// Mutable access to the underlying stream
    pub fn stream(&mut self) -> &mut R {
        &mut self.stream
    }

    /// Reads `length` bytes at `offset`, clamped to the end of the stream
    pub fn read_bytes_at(&mut self, offset: u64, length: u64) -> TiffResult<Vec<u8>> {
        let available = self.file_size().saturating_sub(offset).min(length);
        self.stream.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; available as usize];
        self.stream.read_exact(&mut data)?;
        Ok(data)
    }

    /// Whether the current directory carries a tag
    pub fn has_tag(&self, tag: u16) -> bool {
        self.current.has_tag(tag)
    }

    /// A tag the frame cannot be decoded without
    ///
    /// Tags with a library default resolve to it when absent. Width,
    /// height and photometric have none: their absence fails the read.
    pub fn get_required(&self, tag: u16) -> TiffResult<u64> {
        if let Some(value) = self.current.get_value(tag) {
            return value.first_u64().ok_or_else(|| TiffError::structural(format!(
                "Tag {} ({}) does not hold an unsigned value", tag, tag_utils::get_tag_name(tag))));
        }

        let default = match tag {
            tags::COMPRESSION => compression::NONE as u64,
            tags::PLANAR_CONFIGURATION => planar_config::CONTIG as u64,
            tags::SAMPLES_PER_PIXEL => 1,
            tags::BITS_PER_SAMPLE => 1,
            tags::SAMPLE_FORMAT => sample_format::UINT as u64,
            tags::ROWS_PER_STRIP => u32::MAX as u64,
            tags::FILL_ORDER => fill_order::MSB2LSB as u64,
            _ => {
                return Err(TiffError::TagNotFound(tag));
            }
        };
        debug!("Tag {} ({}) absent, using default {}", tag, tag_utils::get_tag_name(tag), default);
        Ok(default)
    }

    /// All values of a required array tag such as StripOffsets
    pub fn get_required_array(&self, tag: u16) -> TiffResult<Vec<u64>> {
        self.current.get_value(tag)
            .and_then(|v| v.as_u64_vec())
            .ok_or(TiffError::TagNotFound(tag))
    }

    /// A tag with a library-defined default
    pub fn get_defaulted(&self, tag: u16) -> TiffResult<TagValue> {
        if let Some(value) = self.current.get_value(tag) {
            return Ok(value);
        }

        let default = match tag {
            tags::RESOLUTION_UNIT => TagValue::Short(vec![resolution_unit::INCH]),
            tags::X_RESOLUTION | tags::Y_RESOLUTION => TagValue::Rational(vec![(0, 1)]),
            tags::ORIENTATION => TagValue::Short(vec![orientation::TOP_LEFT]),
            tags::PAGE_NUMBER => TagValue::Short(vec![0, 0]),
            tags::MIN_SAMPLE_VALUE => TagValue::Short(vec![0]),
            tags::MAX_SAMPLE_VALUE => {
                let bits = self.get_required(tags::BITS_PER_SAMPLE)?.min(16);
                TagValue::Short(vec![((1u32 << bits) - 1) as u16])
            },
            tags::EXTRA_SAMPLES => TagValue::Short(Vec::new()),
            _ => return Err(TiffError::structural(format!(
                "Tag {} ({}) has no default value", tag, tag_utils::get_tag_name(tag)))),
        };
        Ok(default)
    }

    /// A tag that may legitimately be absent
    pub fn get_optional(&self, tag: u16) -> Option<TagValue> {
        self.current.get_value(tag)
    }

    /// An ASCII tag's text
    pub fn get_ascii(&self, tag: u16) -> Option<String> {
        match self.current.get_value(tag)? {
            TagValue::Ascii(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Raw bytes of an embedded block (ICC, Photoshop, IPTC, XMP, JPEGTables)
    ///
    /// The bytes are returned as stored, whatever the entry's field type.
    pub fn get_optional_blob(&self, tag: u16) -> Option<Vec<u8>> {
        self.current.get_entry(tag)
            .filter(|entry| !entry.data.is_empty())
            .map(|entry| entry.data.clone())
    }

    /// Moves to the next chained directory
    ///
    /// Returns false at the end of the chain. A loop or a parse failure
    /// also returns false and is recorded as a warning, leaving the frames
    /// read so far valid.
    pub fn advance(&mut self, warnings: &mut WarningContext) -> bool {
        let next_offset = self.current.next_offset;
        if next_offset == 0 {
            return false;
        }
        if !self.visited.insert(next_offset) {
            warnings.warn("directory-loop", format!(
                "IFD offset {} already visited, stopping IFD chain", next_offset));
            return false;
        }

        let number = self.current.number + 1;
        match self.reader.read_ifd(&mut self.stream, next_offset, number, warnings) {
            Ok(ifd) => {
                debug!("Advanced to IFD #{} at offset {}", number, next_offset);
                self.current = ifd;
                true
            },
            Err(e) => {
                warnings.warn("directory-read-failed", format!("Error reading IFD {}: {}", number, e));
                false
            }
        }
    }

    /// Reads a private directory such as the EXIF or GPS sub-IFD
    pub fn read_sub_directory(&mut self, offset: u64, warnings: &mut WarningContext) -> TiffResult<IFD> {
        let number = self.current.number;
        self.reader.read_ifd(&mut self.stream, offset, number, warnings)
    }
}
