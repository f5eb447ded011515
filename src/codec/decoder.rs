//! Strip, tile and scanline reads
//!
//! Each chunk goes through: read the stored bytes (clamped to the stream),
//! reverse the fill order, decompress, pad or truncate to the decoded
//! size and undo the predictor. Short data is a codec warning, not an
//! error, so the policy in the warning context decides.

use log::{debug, trace};

use crate::codec::layout::ChunkLayout;
use crate::codec::predictor;
use crate::compression::{CodecParams, CompressionFactory, CompressionHandler};
use crate::io::byte_order::ByteOrder;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{compression, fill_order, predictor as predictor_values, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::tag_store::TagStore;
use crate::tiff::warnings::WarningContext;
use crate::utils::tiff_code_translators::compression_code_to_name;

/// Reads decoded chunks of the current frame
pub struct ChunkDecoder {
    layout: ChunkLayout,
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
    handler: Box<dyn CompressionHandler>,
    predictor: u16,
    fill_order: u16,
    byte_order: ByteOrder,
    /// Strip currently held in the caller's scanline cache
    cached_strip: Option<u32>,
}

impl ChunkDecoder {
    /// Binds a decoder to the current directory of `store`
    pub fn new<R: SeekableReader>(store: &TagStore<R>, layout: ChunkLayout) -> TiffResult<Self> {
        let (offset_tag, count_tag) = if layout.is_tiled() {
            (tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
        } else {
            (tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
        };
        let offsets = store.get_required_array(offset_tag)?;
        let byte_counts = store.get_required_array(count_tag)?;
        let expected = layout.chunk_count() as usize;
        if offsets.len() < expected || byte_counts.len() < expected {
            return Err(TiffError::structural(format!(
                "Frame needs {} chunks but lists {} offsets and {} byte counts",
                expected, offsets.len(), byte_counts.len())));
        }

        let scheme = store.get_required(tags::COMPRESSION)?;
        let predictor = store.get_optional(tags::PREDICTOR)
            .and_then(|v| v.first_u64())
            .unwrap_or(predictor_values::NONE as u64) as u16;
        if predictor == predictor_values::FLOATING_POINT {
            return Err(TiffError::structural("Floating point predictor is not supported"));
        }

        let chunk_width = layout.tile.map_or(layout.width, |(w, _)| w);
        let params = CodecParams {
            width: chunk_width,
            samples: layout.chunk_samples(),
            jpeg_tables: if scheme == compression::JPEG as u64 {
                store.get_optional_blob(tags::JPEG_TABLES)
            } else {
                None
            },
            ..CodecParams::default()
        };
        let handler = CompressionFactory::create_handler(scheme, &params)?;
        debug!("Chunk decoder: {} {} chunks, {}, predictor {}",
               expected, if layout.is_tiled() { "tiled" } else { "stripped" },
               compression_code_to_name(scheme), predictor);

        Ok(ChunkDecoder {
            layout,
            offsets,
            byte_counts,
            handler,
            predictor,
            fill_order: store.get_required(tags::FILL_ORDER)? as u16,
            byte_order: store.byte_order(),
            cached_strip: None,
        })
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    /// Decodes one chunk into a freshly sized vector
    fn decode_chunk<R: SeekableReader>(&self, store: &mut TagStore<R>, chunk: u32, row_bytes: u64,
                                       warnings: &mut WarningContext) -> TiffResult<Vec<u8>> {
        let index = chunk as usize;
        let offset = self.offsets[index];
        let mut length = self.byte_counts[index];
        let expected = self.layout.chunk_size(chunk) as usize;

        if offset.saturating_add(length) > store.file_size() {
            warnings.codec_warning("premature-eof", format!(
                "Chunk {} at {} claims {} bytes, stream ends at {}",
                chunk, offset, length, store.file_size()))?;
            length = store.file_size().saturating_sub(offset);
        }

        let mut raw = store.read_bytes_at(offset, length)?;
        if self.fill_order == fill_order::LSB2MSB {
            predictor::reverse_fill_order(&mut raw);
        }

        let mut decoded = if raw.is_empty() {
            Vec::new()
        } else {
            self.handler.decompress(&raw, expected)?
        };
        trace!("Chunk {}: {} stored bytes, {} decoded, {} expected", chunk, raw.len(), decoded.len(), expected);

        if decoded.len() < expected {
            warnings.codec_warning("short-chunk", format!(
                "Chunk {} decoded to {} of {} bytes", chunk, decoded.len(), expected))?;
        }
        decoded.resize(expected, 0);

        if self.predictor == predictor_values::HORIZONTAL {
            predictor::undo_horizontal(&mut decoded, row_bytes as usize, self.layout.chunk_samples(),
                                       self.layout.bits_per_sample, self.byte_order)?;
        }
        Ok(decoded)
    }

    fn check_chunk(&self, chunk: u32) -> TiffResult<()> {
        if chunk >= self.layout.chunk_count() {
            return Err(TiffError::structural(format!(
                "Chunk {} out of range, frame has {}", chunk, self.layout.chunk_count())));
        }
        Ok(())
    }

    /// Decodes a strip into `out`
    ///
    /// # Returns
    /// The decoded size of the strip
    pub fn read_encoded_strip<R: SeekableReader>(&mut self, store: &mut TagStore<R>, strip: u32,
                                                 out: &mut [u8], warnings: &mut WarningContext) -> TiffResult<usize> {
        self.check_chunk(strip)?;
        let decoded = self.decode_chunk(store, strip, self.layout.scanline_size(), warnings)?;
        copy_into(out, &decoded)
    }

    /// Decodes a tile into `out`
    ///
    /// # Returns
    /// The decoded size of the tile
    pub fn read_encoded_tile<R: SeekableReader>(&mut self, store: &mut TagStore<R>, tile: u32,
                                                out: &mut [u8], warnings: &mut WarningContext) -> TiffResult<usize> {
        self.check_chunk(tile)?;
        let decoded = self.decode_chunk(store, tile, self.layout.tile_row_size(), warnings)?;
        copy_into(out, &decoded)
    }

    /// Decodes one row of one plane into `out`
    ///
    /// The strip holding the row is decoded into `strip`, which must hold
    /// a full strip, and is reused while rows of the same strip follow.
    pub fn read_scanline<R: SeekableReader>(&mut self, store: &mut TagStore<R>, row: u32, plane: u16,
                                            strip: &mut [u8], out: &mut [u8],
                                            warnings: &mut WarningContext) -> TiffResult<usize> {
        if self.layout.is_tiled() {
            return Err(TiffError::structural("Scanline access to a tiled frame"));
        }
        let index = self.layout.strip_index(row, plane);
        self.check_chunk(index)?;

        if self.cached_strip != Some(index) {
            self.cached_strip = None;
            let decoded = self.decode_chunk(store, index, self.layout.scanline_size(), warnings)?;
            copy_into(strip, &decoded)?;
            self.cached_strip = Some(index);
        }

        let scanline = self.layout.scanline_size() as usize;
        let start = (row % self.layout.rows_per_strip.max(1)) as usize * scanline;
        let data = strip.get(start..start + scanline)
            .ok_or_else(|| TiffError::structural(format!("Row {} lies outside the strip buffer", row)))?;
        copy_into(out, data)
    }
}

fn copy_into(out: &mut [u8], data: &[u8]) -> TiffResult<usize> {
    if out.len() < data.len() {
        return Err(TiffError::structural(format!(
            "Working buffer of {} bytes cannot hold a {}-byte chunk", out.len(), data.len())));
    }
    out[..data.len()].copy_from_slice(data);
    Ok(data.len())
}
