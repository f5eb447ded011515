//! Canonical in-memory image
//!
//! Pixels are 16-bit quanta in row-major order. Palette images also keep
//! one colormap index per pixel. Opacity follows the inverted convention:
//! 0 is opaque and `MAX_RGB` fully transparent.

use std::collections::BTreeMap;
use std::fmt;

use crate::tiff::constants::limits;
use crate::tiff::errors::{TiffError, TiffResult};

/// Largest quantum value
pub const MAX_RGB: u16 = 65535;

/// Quantum depth of the canonical buffer
pub const QUANTUM_DEPTH: u16 = 16;

/// One canonical pixel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pixel {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    /// Fourth ink for CMYK images
    pub black: u16,
    /// 0 is opaque
    pub opacity: u16,
}

impl Pixel {
    /// Opaque RGB pixel
    pub fn rgb(red: u16, green: u16, blue: u16) -> Self {
        Pixel { red, green, blue, black: 0, opacity: 0 }
    }

    /// Opaque gray pixel
    pub fn gray(level: u16) -> Self {
        Pixel::rgb(level, level, level)
    }

    /// Whether all three color channels are equal
    pub fn is_gray(&self) -> bool {
        self.red == self.green && self.green == self.blue
    }

    /// Luminance-weighted intensity
    pub fn intensity(&self) -> u16 {
        ((306 * self.red as u32 + 601 * self.green as u32 + 117 * self.blue as u32 + 512) >> 10) as u16
    }
}

/// Colormap entry
pub type ColorEntry = Pixel;

/// Storage class of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Direct,
    Palette,
}

/// Colorspace of the pixel values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    Rgb,
    Gray,
    Cmyk,
    Lab,
}

/// Interlace mode the frame was stored with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interlace {
    None,
    /// Separate planes
    Plane,
}

/// Resolution units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionUnits {
    Undefined,
    PixelsPerInch,
    PixelsPerCentimeter,
}

/// Compression scheme of a frame, as read or as requested for writing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    Undefined,
    None,
    Fax,
    Group4,
    Jpeg,
    Lzw,
    Rle,
    Zip,
    Zstd,
    Lzma,
    Jbig,
    WebP,
}

impl CompressionType {
    /// Parses the names used on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "none" | "uncompressed" => Some(CompressionType::None),
            "fax" | "group3" | "g3" => Some(CompressionType::Fax),
            "group4" | "g4" => Some(CompressionType::Group4),
            "jpeg" => Some(CompressionType::Jpeg),
            "lzw" => Some(CompressionType::Lzw),
            "rle" | "packbits" => Some(CompressionType::Rle),
            "zip" | "deflate" => Some(CompressionType::Zip),
            "zstd" => Some(CompressionType::Zstd),
            "lzma" => Some(CompressionType::Lzma),
            "jbig" => Some(CompressionType::Jbig),
            "webp" => Some(CompressionType::WebP),
            _ => None,
        }
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressionType::Undefined => "Undefined",
            CompressionType::None => "None",
            CompressionType::Fax => "Fax",
            CompressionType::Group4 => "Group4",
            CompressionType::Jpeg => "JPEG",
            CompressionType::Lzw => "LZW",
            CompressionType::Rle => "RLE",
            CompressionType::Zip => "Zip",
            CompressionType::Zstd => "Zstd",
            CompressionType::Lzma => "LZMA",
            CompressionType::Jbig => "JBIG",
            CompressionType::WebP => "WebP",
        };
        write!(f, "{}", name)
    }
}

/// CIE chromaticity of the primaries and white point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Chromaticity {
    pub red: (f64, f64),
    pub green: (f64, f64),
    pub blue: (f64, f64),
    pub white: (f64, f64),
}

/// One decoded or to-be-encoded frame
#[derive(Debug, Clone)]
pub struct Image {
    pub columns: u32,
    pub rows: u32,
    /// Bits per quantum, 1..=16
    pub depth: u16,
    pub storage_class: StorageClass,
    pub colorspace: Colorspace,
    /// Whether the opacity channel is meaningful
    pub matte: bool,
    pub colormap: Vec<ColorEntry>,
    pub pixels: Vec<Pixel>,
    /// Colormap index per pixel, palette images only
    pub indexes: Vec<u16>,
    pub attributes: BTreeMap<String, String>,
    pub profiles: BTreeMap<String, Vec<u8>>,
    pub x_resolution: f64,
    pub y_resolution: f64,
    pub units: ResolutionUnits,
    /// Orientation tag value, 1..=8
    pub orientation: u16,
    pub chromaticity: Option<Chromaticity>,
    pub interlace: Interlace,
    pub compression: CompressionType,
    /// Frame index within the source stream
    pub scene: usize,
    pub is_grayscale: bool,
    pub is_monochrome: bool,
    pub filename: String,
}

/// Ordered frames of one stream
pub type ImageList = Vec<Image>;

impl Image {
    /// Creates a frame without pixels; call `allocate_pixels` before a transfer
    pub fn new(columns: u32, rows: u32) -> Self {
        Image {
            columns,
            rows,
            depth: 8,
            storage_class: StorageClass::Direct,
            colorspace: Colorspace::Rgb,
            matte: false,
            colormap: Vec::new(),
            pixels: Vec::new(),
            indexes: Vec::new(),
            attributes: BTreeMap::new(),
            profiles: BTreeMap::new(),
            x_resolution: 0.0,
            y_resolution: 0.0,
            units: ResolutionUnits::Undefined,
            orientation: 1,
            chromaticity: None,
            interlace: Interlace::None,
            compression: CompressionType::Undefined,
            scene: 0,
            is_grayscale: false,
            is_monochrome: false,
            filename: String::new(),
        }
    }

    /// Creates a frame with every pixel set to `fill`
    pub fn filled(columns: u32, rows: u32, fill: Pixel) -> Self {
        let mut image = Image::new(columns, rows);
        image.pixels = vec![fill; image.pixel_count()];
        image
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Zero-fills the pixel buffer (and the index buffer for palette images)
    pub fn allocate_pixels(&mut self) {
        self.pixels = vec![Pixel::default(); self.pixel_count()];
        if self.storage_class == StorageClass::Palette {
            self.indexes = vec![0; self.pixel_count()];
        }
    }

    /// One row of pixels
    pub fn row(&self, y: u32) -> &[Pixel] {
        let start = y as usize * self.columns as usize;
        &self.pixels[start..start + self.columns as usize]
    }

    /// One mutable row of pixels
    pub fn row_mut(&mut self, y: u32) -> &mut [Pixel] {
        let start = y as usize * self.columns as usize;
        let end = start + self.columns as usize;
        &mut self.pixels[start..end]
    }

    /// Mutable rows of a rectangle, clipped to the image
    pub fn region_mut(&mut self, x: u32, y: u32, width: u32, height: u32) -> Vec<&mut [Pixel]> {
        let columns = self.columns as usize;
        let x0 = (x as usize).min(columns);
        let x1 = (x as usize + width as usize).min(columns);
        self.pixels.chunks_mut(columns.max(1))
            .skip(y as usize)
            .take(height as usize)
            .map(|row| &mut row[x0..x1])
            .collect()
    }

    /// Installs a colormap and switches to palette storage
    ///
    /// Index storage is sized only once pixels are allocated.
    pub fn set_colormap(&mut self, colormap: Vec<ColorEntry>) -> TiffResult<()> {
        if colormap.is_empty() || colormap.len() > limits::MAX_COLORMAP_SIZE {
            return Err(TiffError::structural(format!("Colormap of {} entries is unsupported", colormap.len())));
        }
        self.colormap = colormap;
        self.storage_class = StorageClass::Palette;
        if !self.pixels.is_empty() && self.indexes.len() != self.pixel_count() {
            self.indexes = vec![0; self.pixel_count()];
        }
        Ok(())
    }

    /// Installs an ascending gray colormap of `colors` entries
    pub fn allocate_grayscale_colormap(&mut self, colors: usize) -> TiffResult<()> {
        if colors < 2 {
            return Err(TiffError::structural(format!("Gray colormap needs at least 2 entries, got {}", colors)));
        }
        let colormap = (0..colors)
            .map(|i| Pixel::gray((i as u64 * MAX_RGB as u64 / (colors as u64 - 1)) as u16))
            .collect();
        self.set_colormap(colormap)
    }

    /// Text attribute by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Sets a text attribute
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    /// Binary profile by name
    pub fn profile(&self, name: &str) -> Option<&[u8]> {
        self.profiles.get(name).map(|p| p.as_slice())
    }

    /// Sets a binary profile
    pub fn set_profile(&mut self, name: &str, data: Vec<u8>) {
        self.profiles.insert(name.to_string(), data);
    }

    /// Whether no pixel carries transparency
    pub fn is_opaque(&self) -> bool {
        !self.matte || self.pixels.iter().all(|p| p.opacity == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_is_clipped() {
        let mut image = Image::filled(5, 4, Pixel::gray(0));
        let region = image.region_mut(3, 2, 4, 4);
        assert_eq!(region.len(), 2);
        assert_eq!(region[0].len(), 2);
    }

    #[test]
    fn test_grayscale_colormap() {
        let mut image = Image::filled(2, 2, Pixel::gray(0));
        image.allocate_grayscale_colormap(4).unwrap();
        assert_eq!(image.storage_class, StorageClass::Palette);
        assert_eq!(image.colormap[3], Pixel::gray(MAX_RGB));
        assert_eq!(image.colormap[1].red, 21845);
        assert_eq!(image.indexes.len(), 4);
    }

    #[test]
    fn test_intensity_of_white() {
        assert_eq!(Pixel::gray(MAX_RGB).intensity(), MAX_RGB);
    }
}
