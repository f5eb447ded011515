//! TIFF stream writer
//!
//! Writing a valid TIFF requires careful management of offsets, ordering,
//! and alignment. Frames are written one at a time: pixel chunks first,
//! then the directory with its external values. The previous link (the
//! header's first-IFD slot or the prior directory's next-IFD slot) is
//! patched once the directory's position is known.

use std::collections::HashMap;
use std::io::{Seek, SeekFrom, Write};
use log::{debug, info};

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::tiff::builder::DirectoryBuilder;
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::utils::{ifd_utils, tag_utils, write_utils};

/// Where a written directory landed
#[derive(Debug, Clone)]
pub struct DirectoryLocation {
    /// Offset of the directory's entry count
    pub offset: u64,
    /// Position of each entry's value field, by tag
    pub value_positions: HashMap<u16, u64>,
}

/// Writes a TIFF or BigTIFF stream
pub struct TiffStreamWriter<W: Write + Seek> {
    writer: W,
    handler: Box<dyn ByteOrderHandler>,
    is_big_tiff: bool,
    /// Position of the link to patch with the next chained directory
    next_link_position: u64,
    directories_written: usize,
}

impl<W: Write + Seek> TiffStreamWriter<W> {
    /// Writes the header and returns a writer positioned after it
    ///
    /// The header holds the byte order marker, the version (42 for
    /// standard TIFF, 43 for BigTIFF) and a placeholder first-IFD offset.
    pub fn new(mut writer: W, is_big_tiff: bool, byte_order: ByteOrder) -> TiffResult<Self> {
        info!("Writing {} header ({})",
              if is_big_tiff { "BigTIFF" } else { "TIFF" }, byte_order.name());
        let handler = byte_order.create_handler();

        writer.write_all(&byte_order.marker())?;
        let next_link_position = if is_big_tiff {
            handler.write_u16(&mut writer, header::BIG_TIFF_VERSION)?;
            handler.write_u16(&mut writer, header::BIGTIFF_OFFSET_SIZE)?;
            handler.write_u16(&mut writer, 0)?;  // Reserved (always 0)
            handler.write_u64(&mut writer, 0)?;
            8
        } else {
            handler.write_u16(&mut writer, header::TIFF_VERSION)?;
            handler.write_u32(&mut writer, 0)?;
            4
        };

        Ok(TiffStreamWriter {
            writer,
            handler,
            is_big_tiff,
            next_link_position,
            directories_written: 0,
        })
    }

    /// Whether the stream uses 8-byte offsets
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Byte order of the stream
    pub fn byte_order(&self) -> ByteOrder {
        self.handler.order()
    }

    /// Writes a block of data at the next word-aligned position
    ///
    /// # Returns
    /// The offset the data was written at
    pub fn write_data(&mut self, data: &[u8]) -> TiffResult<u64> {
        let offset = self.align()?;
        self.check_offset(offset.saturating_add(data.len() as u64))?;
        self.writer.write_all(data)?;
        Ok(offset)
    }

    /// Writes a directory and its external values
    ///
    /// # Arguments
    /// * `directory` - The entries to write, already sorted by tag
    /// * `chain` - Link the directory into the main chain; private
    ///   directories (EXIF, GPS) are written unlinked
    ///
    /// # Returns
    /// The directory's location, used to back-patch pointer tags
    pub fn write_directory(&mut self, directory: &DirectoryBuilder, chain: bool) -> TiffResult<DirectoryLocation> {
        let capacity = tag_utils::inline_capacity(self.is_big_tiff) as usize;

        // External values go first so the table can be written in one pass
        let mut encoded = Vec::with_capacity(directory.len());
        for (&tag, value) in directory.entries() {
            let bytes = value.encode(self.handler.as_ref())?;
            let external = if bytes.len() > capacity {
                Some(self.write_data(&bytes)?)
            } else {
                None
            };
            encoded.push((tag, value.field_type(), value.count(), bytes, external));
        }

        let offset = self.align()?;
        let table_size = ifd_utils::calculate_ifd_size(encoded.len() as u64, self.is_big_tiff);
        self.check_offset(offset + table_size)?;
        debug!("Writing directory with {} entries at offset {}", encoded.len(), offset);

        let mut value_positions = HashMap::new();
        self.write_offset_sized(encoded.len() as u64, true)?;
        for (tag, field_type, count, bytes, external) in &encoded {
            self.handler.write_u16(&mut self.writer, *tag)?;
            self.handler.write_u16(&mut self.writer, *field_type)?;
            self.write_offset_sized(*count, false)?;

            value_positions.insert(*tag, self.writer.stream_position()?);
            match external {
                Some(value_offset) => self.write_offset_sized(*value_offset, false)?,
                None => {
                    let mut field = [0u8; 8];
                    field[..bytes.len()].copy_from_slice(bytes);
                    self.writer.write_all(&field[..capacity])?;
                },
            }
        }
        let link_position = self.writer.stream_position()?;
        self.write_offset_sized(0, false)?;

        if chain {
            self.patch_offset(self.next_link_position, offset)?;
            self.next_link_position = link_position;
            self.directories_written += 1;
        }

        Ok(DirectoryLocation { offset, value_positions })
    }

    /// Rewrites a pointer tag's value field, e.g. the EXIF IFD offset
    pub fn patch_entry(&mut self, location: &DirectoryLocation, tag: u16, value: u64) -> TiffResult<()> {
        let position = location.value_positions.get(&tag).copied()
            .ok_or(TiffError::TagNotFound(tag))?;
        debug!("Back-patching tag {} ({}) at {} with {}", tag, tag_utils::get_tag_name(tag), position, value);
        self.patch_offset(position, value)
    }

    /// Flushes the stream and returns it
    pub fn finish(mut self) -> TiffResult<W> {
        info!("Finished writing {} directories", self.directories_written);
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Writes an offset-sized value at `position` and returns to the end
    fn patch_offset(&mut self, position: u64, value: u64) -> TiffResult<()> {
        let end = self.writer.seek(SeekFrom::End(0))?;
        self.writer.seek(SeekFrom::Start(position))?;
        self.write_offset_sized(value, false)?;
        self.writer.seek(SeekFrom::Start(end))?;
        Ok(())
    }

    /// Writes a count or offset: 8 bytes for BigTIFF, else 4 (2 for an
    /// entry count)
    fn write_offset_sized(&mut self, value: u64, entry_count: bool) -> TiffResult<()> {
        if self.is_big_tiff {
            self.handler.write_u64(&mut self.writer, value)?;
        } else if entry_count {
            if value > u16::MAX as u64 {
                return Err(TiffError::structural(format!("Too many directory entries: {}", value)));
            }
            self.handler.write_u16(&mut self.writer, value as u16)?;
        } else {
            self.check_offset(value)?;
            self.handler.write_u32(&mut self.writer, value as u32)?;
        }
        Ok(())
    }

    /// Pads the stream to a word boundary and returns the position
    fn align(&mut self) -> TiffResult<u64> {
        let position = self.writer.seek(SeekFrom::End(0))?;
        let aligned = write_utils::align_to_4_bytes(position);
        write_utils::write_padding(&mut self.writer, position as usize)?;
        Ok(aligned)
    }

    fn check_offset(&self, offset: u64) -> TiffResult<()> {
        if !self.is_big_tiff && offset > u32::MAX as u64 {
            return Err(TiffError::structural(format!(
                "Offset {} exceeds the classic TIFF limit, write BigTIFF instead", offset)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::tiff::constants::tags;
    use crate::tiff::types::TagValue;

    #[test]
    fn test_classic_header_and_directory() {
        let mut writer = TiffStreamWriter::new(Cursor::new(Vec::new()), false, ByteOrder::LittleEndian).unwrap();
        writer.write_data(&[1, 2, 3]).unwrap();

        let mut dir = DirectoryBuilder::new();
        dir.set_long(tags::IMAGE_WIDTH, 7);
        dir.set_ascii(tags::SOFTWARE, "tiffcoder");
        let location = writer.write_directory(&dir, true).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert_eq!(&bytes[..4], b"II*\0");
        assert_eq!(location.offset, 8 + 4 + 12);
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as u64, location.offset);
        let count_at = location.offset as usize;
        assert_eq!(u16::from_le_bytes([bytes[count_at], bytes[count_at + 1]]), 2);
        // Software is external: 10 bytes written before the table
        assert_eq!(&bytes[12..21], b"tiffcoder");
    }

    #[test]
    fn test_bigtiff_header() {
        let writer = TiffStreamWriter::new(Cursor::new(Vec::new()), true, ByteOrder::BigEndian).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert_eq!(&bytes[..8], &[0x4D, 0x4D, 0x00, 0x2B, 0x00, 0x08, 0x00, 0x00]);
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn test_patch_entry() {
        let mut writer = TiffStreamWriter::new(Cursor::new(Vec::new()), false, ByteOrder::BigEndian).unwrap();
        let mut dir = DirectoryBuilder::new();
        dir.set(tags::EXIF_IFD, TagValue::Long(vec![0]));
        let location = writer.write_directory(&dir, true).unwrap();
        writer.patch_entry(&location, tags::EXIF_IFD, 0x01020304).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        let pos = location.value_positions[&tags::EXIF_IFD] as usize;
        assert_eq!(&bytes[pos..pos + 4], &[1, 2, 3, 4]);
    }
}
