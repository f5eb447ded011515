//! TIFF file reader implementation
//!
//! This module implements the TIFF/BigTIFF directory parser that uses the
//! Strategy pattern to handle different byte orders. Entries are read with
//! their value bytes, so later lookups never touch the stream again.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Cursor, SeekFrom};
use std::path::Path;

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::TIFF;
use crate::tiff::validation;
use crate::tiff::warnings::WarningContext;
use crate::utils::format_utils;
use crate::utils::ifd_utils;
use crate::utils::tag_utils;

/// Builder for TiffReader
///
/// Provides a clean way to construct a TiffReader with various configurations.
#[derive(Default)]
pub struct TiffReaderBuilder {
    /// Tags dropped while parsing
    ignore_tags: HashSet<u16>,
}

impl TiffReaderBuilder {
    /// Create a new TiffReaderBuilder
    pub fn new() -> Self {
        TiffReaderBuilder::default()
    }

    /// Drops the listed tag ids while parsing directories
    pub fn ignore_tags(mut self, tags: &[u16]) -> Self {
        self.ignore_tags.extend(tags.iter().copied());
        self
    }

    /// Build the TiffReader
    pub fn build(self) -> TiffReader {
        TiffReader {
            byte_order_handler: None,
            byte_order: ByteOrder::LittleEndian,
            is_big_tiff: false,
            file_size: 0,
            ignore_tags: self.ignore_tags,
        }
    }
}

/// Reader for TIFF and BigTIFF directories
pub struct TiffReader {
    /// Current byte order handler
    byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    /// Byte order of the stream
    byte_order: ByteOrder,
    /// Whether currently reading BigTIFF format
    is_big_tiff: bool,
    /// Size of the stream, used to bound offsets
    file_size: u64,
    /// Tags dropped while parsing
    ignore_tags: HashSet<u16>,
}

impl TiffReader {
    /// Returns the byte order handler, with proper error handling for None case
    fn handler(&self) -> TiffResult<&dyn ByteOrderHandler> {
        self.byte_order_handler.as_deref()
            .ok_or_else(|| TiffError::GenericError("Byte order not yet determined".to_string()))
    }

    /// Returns whether the current file is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Byte order detected from the header
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Size of the stream measured when the header was read
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Loads every directory of a TIFF file from the given path
    pub fn load(&mut self, filepath: &str, warnings: &mut WarningContext) -> TiffResult<TIFF> {
        info!("Loading TIFF file: {}", filepath);

        let file = File::open(Path::new(filepath))?;
        let mut reader = BufReader::with_capacity(1024 * 1024, file); // 1MB buffer

        self.read(&mut reader, warnings)
    }

    /// Reads the header and returns the first directory offset
    ///
    /// Detects byte order, checks for TIFF or BigTIFF and validates the
    /// first offset against the stream size.
    pub fn read_header(&mut self, reader: &mut dyn SeekableReader) -> TiffResult<u64> {
        debug!("Reader::read_header starting");
        reader.seek(SeekFrom::Start(0))?;

        let handler = format_utils::detect_byte_order(reader)?;
        let (is_big_tiff, _) = format_utils::detect_tiff_format(reader, handler.as_ref())?;
        self.byte_order = handler.order();
        self.is_big_tiff = is_big_tiff;

        let first_ifd_offset = ifd_utils::read_first_ifd_offset(reader, is_big_tiff, handler.as_ref())?;
        debug!("First IFD offset: {}", first_ifd_offset);
        self.byte_order_handler = Some(handler);

        self.file_size = validation::get_file_size(reader)?;
        validation::validate_ifd_offset(first_ifd_offset, self.file_size)?;

        Ok(first_ifd_offset)
    }

    /// Reads the whole directory chain
    ///
    /// A failure on the first directory is an error. A failure further down
    /// the chain, including a loop, ends the chain with a warning.
    pub fn read(&mut self, reader: &mut dyn SeekableReader, warnings: &mut WarningContext) -> TiffResult<TIFF> {
        let first_ifd_offset = self.read_header(reader)?;
        let mut tiff = TIFF::new(self.is_big_tiff, self.byte_order);

        let mut visited = HashSet::new();
        let mut ifd_offset = first_ifd_offset;
        while ifd_offset != 0 {
            if !visited.insert(ifd_offset) {
                warnings.warn("directory-loop", format!("IFD offset {} already visited, stopping IFD chain", ifd_offset));
                break;
            }

            match self.read_ifd(reader, ifd_offset, tiff.ifds.len(), warnings) {
                Ok(ifd) => {
                    debug!("Successfully read IFD with {} entries", ifd.entries.len());
                    ifd_offset = ifd.next_offset;
                    tiff.ifds.push(ifd);
                },
                Err(e) if tiff.ifds.is_empty() => return Err(e),
                Err(e) => {
                    warnings.warn("directory-read-failed", format!("Error reading IFD {}: {}", tiff.ifds.len(), e));
                    break;
                }
            }
        }

        info!("Read {} IFDs from TIFF file", tiff.ifds.len());
        Ok(tiff)
    }

    /// Reads an IFD from the reader
    ///
    /// An entry table running past the end of the stream is a structural
    /// error. Entries with an unknown field type or an out-of-range value,
    /// and duplicates of an earlier tag, are skipped with a codec warning.
    ///
    /// # Arguments
    /// * `reader` - The seekable reader to use
    /// * `offset` - Offset in the file where the IFD starts
    /// * `number` - The index of this IFD in the file
    /// * `warnings` - Sink for entry-level warnings
    ///
    /// # Returns
    /// The parsed IFD structure
    pub fn read_ifd(
        &self,
        reader: &mut dyn SeekableReader,
        offset: u64,
        number: usize,
        warnings: &mut WarningContext
    ) -> TiffResult<IFD> {
        let handler = self.handler()?;
        validation::validate_ifd_offset(offset, self.file_size)?;
        reader.seek(SeekFrom::Start(offset))?;

        let entry_count = ifd_utils::read_entry_count(reader, self.is_big_tiff, handler)?;
        debug!("IFD entry count: {}", entry_count);

        let table_end = offset.saturating_add(ifd_utils::calculate_ifd_size(entry_count, self.is_big_tiff));
        if table_end > self.file_size {
            return Err(TiffError::structural(format!(
                "IFD #{} at offset {} declares {} entries, past the end of the stream ({} bytes)",
                number, offset, entry_count, self.file_size)));
        }

        let mut ifd = IFD::new(number, offset, self.byte_order);
        let capacity = tag_utils::inline_capacity(self.is_big_tiff) as usize;
        let entries_start = reader.stream_position()?;

        for index in 0..entry_count {
            let entry_position = entries_start + index * ifd_utils::entry_size(self.is_big_tiff);
            reader.seek(SeekFrom::Start(entry_position))?;

            let tag = handler.read_u16(reader)?;
            let field_type = handler.read_u16(reader)?;
            let count = ifd_utils::read_offset(reader, self.is_big_tiff, handler)?;
            let mut raw = [0u8; 8];
            reader.read_exact(&mut raw[..capacity])?;
            let value_offset = ifd_utils::read_offset(&mut Cursor::new(&raw[..capacity]), self.is_big_tiff, handler)?;

            if self.ignore_tags.contains(&tag) {
                debug!("Ignoring tag {} ({})", tag, tag_utils::get_tag_name(tag));
                continue;
            }

            let size = match tag_utils::field_type_size(field_type) {
                Some(size) => size as u64,
                None => {
                    warnings.codec_warning("unknown-field-type", format!(
                        "IFD #{}: tag {} has unknown field type {}, entry skipped", number, tag, field_type))?;
                    continue;
                }
            };

            let total = match size.checked_mul(count) {
                Some(total) => total,
                None => {
                    warnings.codec_warning("value-out-of-range", format!(
                        "IFD #{}: tag {} count {} overflows, entry skipped", number, tag, count))?;
                    continue;
                }
            };

            let data = if total <= capacity as u64 {
                raw[..total as usize].to_vec()
            } else {
                if value_offset.saturating_add(total) > self.file_size {
                    warnings.codec_warning("value-out-of-range", format!(
                        "IFD #{}: tag {} ({}) value at offset {} with {} bytes is past the end of the stream, entry skipped",
                        number, tag, tag_utils::get_tag_name(tag), value_offset, total))?;
                    continue;
                }
                reader.seek(SeekFrom::Start(value_offset))?;
                let mut data = vec![0u8; total as usize];
                reader.read_exact(&mut data)?;
                data
            };

            let entry = IFDEntry::new(tag, field_type, count, value_offset, data);
            if !ifd.add_entry(entry) {
                warnings.codec_warning("duplicate-tag", format!(
                    "IFD #{}: duplicate tag {} ({}), keeping the first occurrence",
                    number, tag, tag_utils::get_tag_name(tag)))?;
            }
        }

        reader.seek(SeekFrom::Start(entries_start + entry_count * ifd_utils::entry_size(self.is_big_tiff)))?;
        let next_offset = ifd_utils::read_offset(reader, self.is_big_tiff, handler)?;
        debug!("Next IFD offset: {}", next_offset);
        if next_offset != 0 && (next_offset >= self.file_size || next_offset < 8) {
            warn!("Invalid next IFD offset: {}", next_offset);
        }
        ifd.next_offset = next_offset;

        debug!("Read IFD #{} with {} entries", number, ifd.entries.len());
        Ok(ifd)
    }
}
