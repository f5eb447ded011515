//! Strip and tile geometry
//!
//! All size and index arithmetic for chunked pixel data lives here, so the
//! decoder, encoder and layout strategies agree on it.

use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{compression, limits, photometric, planar_config, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::tag_store::TagStore;

/// Chunk geometry of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u16,
    pub samples_per_pixel: u16,
    /// Samples are stored as separate planes
    pub separate: bool,
    pub rows_per_strip: u32,
    /// Tile width and height, for tiled frames
    pub tile: Option<(u32, u32)>,
    /// Horizontal and vertical chroma block of subsampled YCbCr data
    pub subsampling: Option<(u16, u16)>,
}

impl ChunkLayout {
    /// Stripped layout
    pub fn stripped(width: u32, height: u32, bits_per_sample: u16, samples_per_pixel: u16,
                    separate: bool, rows_per_strip: u32) -> Self {
        ChunkLayout {
            width,
            height,
            bits_per_sample,
            samples_per_pixel,
            separate,
            rows_per_strip: rows_per_strip.clamp(1, height.max(1)),
            tile: None,
            subsampling: None,
        }
    }

    /// Tiled layout
    pub fn tiled(width: u32, height: u32, bits_per_sample: u16, samples_per_pixel: u16,
                 separate: bool, tile_width: u32, tile_height: u32) -> Self {
        ChunkLayout {
            width,
            height,
            bits_per_sample,
            samples_per_pixel,
            separate,
            rows_per_strip: height.max(1),
            tile: Some((tile_width, tile_height)),
            subsampling: None,
        }
    }

    /// Derives the layout from the current directory
    pub fn from_store<R: SeekableReader>(store: &TagStore<R>) -> TiffResult<Self> {
        let width = store.get_required(tags::IMAGE_WIDTH)? as u32;
        let height = store.get_required(tags::IMAGE_LENGTH)? as u32;
        let bits = store.get_required(tags::BITS_PER_SAMPLE)? as u16;
        let spp = store.get_required(tags::SAMPLES_PER_PIXEL)? as u16;
        let separate = store.get_required(tags::PLANAR_CONFIGURATION)? == planar_config::SEPARATE as u64;

        let mut layout = if store.has_tag(tags::TILE_WIDTH) {
            let tile_width = store.get_required(tags::TILE_WIDTH)?.min(u32::MAX as u64) as u32;
            let tile_height = store.get_required(tags::TILE_LENGTH)?.min(u32::MAX as u64) as u32;
            check_tile_extent(tile_width, width, "width")?;
            check_tile_extent(tile_height, height, "length")?;
            let layout = ChunkLayout::tiled(width, height, bits, spp, separate, tile_width, tile_height);
            layout.checked_chunk_count()?;
            layout
        } else {
            let rows_per_strip = store.get_required(tags::ROWS_PER_STRIP)?.min(u32::MAX as u64) as u32;
            ChunkLayout::stripped(width, height, bits, spp, separate, rows_per_strip)
        };
        if !separate {
            layout.subsampling = chroma_blocks(store)?;
        }
        Ok(layout)
    }

    pub fn is_tiled(&self) -> bool {
        self.tile.is_some()
    }

    /// Samples per pixel within one chunk
    pub fn chunk_samples(&self) -> u16 {
        if self.separate { 1 } else { self.samples_per_pixel }
    }

    /// Number of planes the chunks are split into
    pub fn planes(&self) -> u16 {
        if self.separate { self.samples_per_pixel } else { 1 }
    }

    fn row_bytes(&self, pixels: u32) -> u64 {
        (pixels as u64 * self.chunk_samples() as u64 * self.bits_per_sample as u64 + 7) / 8
    }

    /// Bytes of one decoded row of one plane
    pub fn scanline_size(&self) -> u64 {
        match self.subsampling {
            Some((_, v)) => self.region_bytes(self.width, v as u32) / v as u64,
            None => self.row_bytes(self.width),
        }
    }

    /// Bytes of `rows` rows `pixels` wide
    ///
    /// Subsampled data is stored in whole chroma blocks, each holding the
    /// luma samples of the block followed by one Cb and one Cr sample.
    fn region_bytes(&self, pixels: u32, rows: u32) -> u64 {
        match self.subsampling {
            Some((h, v)) => {
                let block_bits = (h as u64 * v as u64 + 2) * self.bits_per_sample as u64;
                let block_row = (div_ceil_u64(pixels as u64, h as u64) * block_bits + 7) / 8;
                block_row * div_ceil_u64(rows as u64, v as u64)
            },
            None => self.row_bytes(pixels) * rows as u64,
        }
    }

    /// Bytes of a strip holding `rows` rows
    pub fn vstrip_size(&self, rows: u32) -> u64 {
        self.region_bytes(self.width, rows)
    }

    /// Bytes of a full strip
    pub fn strip_size(&self) -> u64 {
        self.vstrip_size(self.rows_per_strip.min(self.height))
    }

    /// Bytes of one tile row
    pub fn tile_row_size(&self) -> u64 {
        self.tile.map_or(0, |(w, _)| self.row_bytes(w))
    }

    /// Bytes of one tile
    pub fn tile_size(&self) -> u64 {
        self.tile.map_or(0, |(w, h)| self.region_bytes(w, h))
    }

    /// Strips in one plane
    pub fn strips_per_plane(&self) -> u32 {
        div_ceil(self.height, self.rows_per_strip.max(1))
    }

    /// Tiles across and down one plane
    pub fn tile_grid(&self) -> (u32, u32) {
        match self.tile {
            Some((w, h)) => (div_ceil(self.width, w), div_ceil(self.height, h)),
            None => (0, 0),
        }
    }

    /// Tiles in one plane
    pub fn tiles_per_plane(&self) -> u32 {
        let (across, down) = self.tile_grid();
        across.saturating_mul(down)
    }

    /// Chunks the frame is stored in, over all planes
    pub fn chunk_count(&self) -> u32 {
        let per_plane = if self.is_tiled() { self.tiles_per_plane() } else { self.strips_per_plane() };
        per_plane.saturating_mul(self.planes() as u32)
    }

    /// Chunk count, or a structural error when it does not fit 32 bits
    pub fn checked_chunk_count(&self) -> TiffResult<u32> {
        let per_plane = if self.is_tiled() {
            let (across, down) = self.tile_grid();
            across as u64 * down as u64
        } else {
            self.strips_per_plane() as u64
        };
        u32::try_from(per_plane * self.planes() as u64)
            .map_err(|_| TiffError::structural(format!("Frame of {}x{} needs too many chunks", self.width, self.height)))
    }

    /// Strip holding `row` of `plane`
    pub fn strip_index(&self, row: u32, plane: u16) -> u32 {
        plane as u32 * self.strips_per_plane() + row / self.rows_per_strip.max(1)
    }

    /// Tile holding pixel (`x`, `y`) of `plane`
    pub fn tile_index(&self, x: u32, y: u32, plane: u16) -> u32 {
        match self.tile {
            Some((w, h)) => {
                let (across, _) = self.tile_grid();
                plane as u32 * self.tiles_per_plane() + (y / h) * across + x / w
            },
            None => 0,
        }
    }

    /// Rows actually present in a strip; the last one may be short
    pub fn strip_rows(&self, strip: u32) -> u32 {
        let first = (strip % self.strips_per_plane().max(1)) * self.rows_per_strip;
        self.rows_per_strip.min(self.height.saturating_sub(first))
    }

    /// Decoded size of a chunk
    pub fn chunk_size(&self, chunk: u32) -> u64 {
        if self.is_tiled() {
            self.tile_size()
        } else {
            self.vstrip_size(self.strip_rows(chunk))
        }
    }

    /// Rows per strip that keep each strip near `target_bytes`
    pub fn default_strip_rows(&self, target_bytes: u64) -> u32 {
        let scanline = self.scanline_size().max(1);
        let rows = (target_bytes / scanline).max(1);
        rows.min(self.height.max(1) as u64) as u32
    }
}

fn div_ceil(value: u32, divisor: u32) -> u32 {
    if divisor == 0 {
        return 0;
    }
    value.div_ceil(divisor)
}

fn div_ceil_u64(value: u64, divisor: u64) -> u64 {
    if divisor == 0 {
        return 0;
    }
    value.div_ceil(divisor)
}

/// Chroma block of a subsampled YCbCr frame stored as raw blocks
///
/// JPEG streams carry their own subsampling and decode to full rows.
fn chroma_blocks<R: SeekableReader>(store: &TagStore<R>) -> TiffResult<Option<(u16, u16)>> {
    let photometric = store.get_required(tags::PHOTOMETRIC_INTERPRETATION)?;
    let scheme = store.get_required(tags::COMPRESSION)?;
    if photometric != photometric::YCBCR as u64
        || scheme == compression::JPEG as u64 || scheme == compression::JPEG_OLD as u64 {
        return Ok(None);
    }
    let (h, v) = match store.get_optional(tags::YCBCR_SUBSAMPLING).and_then(|v| v.as_u64_vec()) {
        Some(values) if values.len() >= 2 => (values[0], values[1]),
        _ => (2, 2),
    };
    if !matches!(h, 1 | 2 | 4) || !matches!(v, 1 | 2 | 4) || v > h {
        return Err(TiffError::structural(format!("Invalid YCbCr subsampling {}x{}", h, v)));
    }
    Ok(if (h, v) == (1, 1) { None } else { Some((h as u16, v as u16)) })
}

/// Tile extents must be non-zero multiples of 16 that do not dwarf the frame
fn check_tile_extent(extent: u32, frame: u32, what: &str) -> TiffResult<()> {
    let padded = frame.saturating_add(15) / 16 * 16;
    if extent == 0 || extent % 16 != 0 || extent > padded.max(limits::MAX_TILE_OVERHANG) {
        return Err(TiffError::structural(format!(
            "Invalid tile {} {} for a frame {} pixels across", what, extent, frame)));
    }
    Ok(())
}
