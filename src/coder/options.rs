//! Decode and encode options

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use crate::io::byte_order::ByteOrder;
use crate::model::CompressionType;
use crate::quantum::SampleType;
use crate::tiff::constants::extra_samples;
use crate::tiff::errors::{TiffError, TiffResult};

lazy_static! {
    static ref LIST_SEPARATOR: Regex = Regex::new(r"[,\s]+").expect("static pattern");
    static ref GEOMETRY: Regex = Regex::new(r"^\s*(\d+)\s*[xX]\s*(\d+)\s*$").expect("static pattern");
}

/// Meaning of the alpha channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaType {
    Unspecified,
    /// Color channels are premultiplied
    Associated,
    Unassociated,
}

impl AlphaType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "unspecified" => Some(AlphaType::Unspecified),
            "associated" => Some(AlphaType::Associated),
            "unassociated" => Some(AlphaType::Unassociated),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AlphaType::Unspecified => "unspecified",
            AlphaType::Associated => "associated",
            AlphaType::Unassociated => "unassociated",
        }
    }

    /// Maps an ExtraSamples value
    pub fn from_extra_sample(value: u16) -> Self {
        match value {
            extra_samples::ASSOCIATED_ALPHA => AlphaType::Associated,
            extra_samples::UNASSOCIATED_ALPHA => AlphaType::Unassociated,
            _ => AlphaType::Unspecified,
        }
    }

    /// The ExtraSamples value to write
    pub fn extra_sample(&self) -> u16 {
        match self {
            AlphaType::Unspecified => extra_samples::UNSPECIFIED,
            AlphaType::Associated => extra_samples::ASSOCIATED_ALPHA,
            AlphaType::Unassociated => extra_samples::UNASSOCIATED_ALPHA,
        }
    }
}

/// Requested output image type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Bilevel,
    Grayscale,
    GrayscaleMatte,
    Palette,
    PaletteMatte,
    TrueColor,
    TrueColorMatte,
    ColorSeparation,
    ColorSeparationMatte,
}

impl OutputType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace(['-', '_'], "").as_str() {
            "bilevel" => Some(OutputType::Bilevel),
            "grayscale" => Some(OutputType::Grayscale),
            "grayscalematte" => Some(OutputType::GrayscaleMatte),
            "palette" => Some(OutputType::Palette),
            "palettematte" => Some(OutputType::PaletteMatte),
            "truecolor" => Some(OutputType::TrueColor),
            "truecolormatte" => Some(OutputType::TrueColorMatte),
            "colorseparation" => Some(OutputType::ColorSeparation),
            "colorseparationmatte" => Some(OutputType::ColorSeparationMatte),
            _ => None,
        }
    }

    /// Whether the type carries an alpha channel
    pub fn has_matte(&self) -> bool {
        matches!(self, OutputType::GrayscaleMatte | OutputType::PaletteMatte
            | OutputType::TrueColorMatte | OutputType::ColorSeparationMatte)
    }
}

/// Options for decoding
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    /// Read geometry and metadata only
    pub ping: bool,
    /// First frame to return
    pub subimage: usize,
    /// Number of frames to return; 0 returns all remaining frames
    pub subrange: usize,
    /// Overrides the alpha type found in ExtraSamples
    pub alpha: Option<AlphaType>,
    /// Overrides the float sample minimum
    pub sample_min: Option<f64>,
    /// Overrides the float sample maximum
    pub sample_max: Option<f64>,
    /// Leave the orientation at top-left whatever the file says
    pub ignore_orientation: bool,
    /// Escalate every codec warning to an error
    pub warnings_as_errors: bool,
    /// Tags skipped while parsing directories
    pub ignore_tags: Vec<u16>,
    /// Read min-is-black and min-is-white frames as palette images
    pub read_as_palette: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            ping: false,
            subimage: 0,
            subrange: 0,
            alpha: None,
            sample_min: None,
            sample_max: None,
            ignore_orientation: false,
            warnings_as_errors: false,
            ignore_tags: Vec::new(),
            read_as_palette: false,
        }
    }
}

impl ReadOptions {
    /// Whether frame `index` is outside the requested range
    pub fn is_past_range(&self, index: usize) -> bool {
        self.subrange != 0 && index >= self.subimage + self.subrange
    }
}

/// Parses a comma- or space-separated tag list such as "270,33432-33434"
pub fn parse_ignore_tags(list: &str) -> TiffResult<Vec<u16>> {
    let mut tags = Vec::new();
    for item in LIST_SEPARATOR.split(list).filter(|s| !s.is_empty()) {
        let parse = |s: &str| s.trim().parse::<u16>()
            .map_err(|_| TiffError::GenericError(format!("Invalid tag '{}' in ignore list", s)));
        match item.split_once('-') {
            Some((first, last)) => {
                let (first, last) = (parse(first)?, parse(last)?);
                if first > last {
                    return Err(TiffError::GenericError(format!("Invalid tag range '{}'", item)));
                }
                tags.extend(first..=last);
            },
            None => tags.push(parse(item)?),
        }
    }
    Ok(tags)
}

/// Options for encoding
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOptions {
    /// Compression to use; `Undefined` keeps each frame's own
    pub compression: CompressionType,
    /// 0-100, meaning depends on the scheme
    pub quality: Option<u8>,
    /// Tile width and height; selects the tiled layout
    pub tile_geometry: Option<(u32, u32)>,
    pub rows_per_strip: Option<u32>,
    /// One strip per frame
    pub strip_per_page: bool,
    pub predictor: Option<u16>,
    pub bits_per_sample: Option<u16>,
    /// Extra unspecified samples are added up to this count
    pub samples_per_pixel: Option<u16>,
    /// Write IEEE float samples (32 or 64 bits)
    pub sample_type: SampleType,
    pub byte_order: ByteOrder,
    pub big_tiff: bool,
    pub alpha: Option<AlphaType>,
    pub output_type: Option<OutputType>,
    /// NewSubfileType for every frame
    pub subfile_type: Option<u32>,
    /// Rebuild EXIF and GPS directories from an "Exif" profile
    pub write_exif: bool,
    /// Write all frames; otherwise only the first
    pub adjoin: bool,
    /// Append 2x reductions after each frame
    pub pyramid: bool,
    pub fill_order: u16,
    /// Group 3 option bits
    pub group3_options: u32,
    pub webp_lossless: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            compression: CompressionType::Undefined,
            quality: None,
            tile_geometry: None,
            rows_per_strip: None,
            strip_per_page: false,
            predictor: None,
            bits_per_sample: None,
            samples_per_pixel: None,
            sample_type: SampleType::Unsigned,
            byte_order: ByteOrder::native(),
            big_tiff: false,
            alpha: None,
            output_type: None,
            subfile_type: None,
            write_exif: true,
            adjoin: true,
            pyramid: false,
            fill_order: 1,
            group3_options: 4,
            webp_lossless: true,
        }
    }
}

/// Parses a "WxH" tile geometry; both sides must be multiples of 16
pub fn parse_tile_geometry(text: &str) -> TiffResult<(u32, u32)> {
    let not_geometry = || TiffError::GenericError(format!("Tile geometry '{}' is not WxH", text));
    let captures = GEOMETRY.captures(text).ok_or_else(not_geometry)?;
    let (w, h) = match (captures[1].parse::<u32>(), captures[2].parse::<u32>()) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(not_geometry()),
    };
    if w % 16 != 0 || h % 16 != 0 {
        return Err(TiffError::GenericError(format!(
            "Tile geometry {}x{} must be a multiple of 16", w, h)));
    }
    Ok((w, h))
}

/// Parses the alpha type named on the command line, warning on unknown names
pub fn parse_alpha(name: &str) -> Option<AlphaType> {
    let alpha = AlphaType::from_name(name);
    if alpha.is_none() {
        warn!("Unknown alpha type '{}' ignored", name);
    }
    alpha
}
