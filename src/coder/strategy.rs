//! Layout strategy selection
//!
//! Picks how a frame's pixels are transferred: natively by scanline, strip
//! or tile through the transfer engine, or through the generic RGBA path
//! when the sample layout is not classified. Selection depends only on the
//! frame descriptor, never on pixel data.

use std::fmt;
use log::debug;

use crate::quantum::{classify, CompressionDescriptor, TransferMode};
use crate::tiff::constants::{compression, limits, photometric};
use crate::tiff::errors::TiffResult;
use crate::utils::tiff_code_translators::{compression_code_to_name, photometric_code_to_name};

/// Transfer strategy for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffMethod {
    ScanLine,
    Stripped,
    Tiled,
    RgbaStripped,
    RgbaTiled,
    RgbaPunt,
}

impl TiffMethod {
    /// Whether the method goes through the generic RGBA path
    pub fn is_rgba(&self) -> bool {
        matches!(self, TiffMethod::RgbaStripped | TiffMethod::RgbaTiled | TiffMethod::RgbaPunt)
    }
}

impl fmt::Display for TiffMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TiffMethod::ScanLine => "scanline",
            TiffMethod::Stripped => "stripped",
            TiffMethod::Tiled => "tiled",
            TiffMethod::RgbaStripped => "generic stripped",
            TiffMethod::RgbaTiled => "generic tiled",
            TiffMethod::RgbaPunt => "generic whole image",
        };
        write!(f, "{}", name)
    }
}

/// Everything the selector looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    pub compression: CompressionDescriptor,
    pub matte: bool,
    pub is_tiled: bool,
    pub has_rows_per_strip: bool,
    /// Decoded bytes of one strip
    pub strip_size: u64,
}

/// Outcome of selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodChoice {
    pub method: TiffMethod,
    /// Transfer mode of plane 0, native methods only
    pub mode: Option<TransferMode>,
    /// Photometric to decode with when it differs from the stored one
    pub photometric_override: Option<u16>,
}

/// Selects the transfer strategy for a frame
///
/// # Returns
/// The choice, or a structural error when the descriptor is inconsistent
pub fn select_method(frame: &FrameDescriptor) -> TiffResult<MethodChoice> {
    let mut descriptor = frame.compression;
    let mut photometric_override = None;

    // The JPEG codec hands back RGB for YCbCr streams
    if descriptor.samples_per_pixel > 1
        && descriptor.compression == compression::JPEG
        && descriptor.photometric == photometric::YCBCR {
        descriptor.photometric = photometric::RGB;
        photometric_override = Some(photometric::RGB);
    }

    let mode = classify(&descriptor, frame.matte, 0)?;
    let method = match mode {
        Some(_) => match descriptor.compression {
            compression::JPEG | compression::JPEG_OLD => {
                if frame.is_tiled { TiffMethod::Tiled } else { TiffMethod::Stripped }
            },
            compression::JBIG => TiffMethod::Stripped,
            _ if frame.is_tiled => TiffMethod::Tiled,
            _ if frame.strip_size <= limits::SMALL_STRIP_THRESHOLD => TiffMethod::Stripped,
            _ => TiffMethod::ScanLine,
        },
        None if frame.is_tiled => TiffMethod::RgbaTiled,
        None if frame.has_rows_per_strip => TiffMethod::RgbaStripped,
        None => TiffMethod::RgbaPunt,
    };

    debug!("Selected {} method for {} {} ({} samples per pixel, {} bits)",
           method, photometric_code_to_name(descriptor.photometric as u64),
           compression_code_to_name(descriptor.compression as u64),
           descriptor.samples_per_pixel, descriptor.bits_per_sample);

    Ok(MethodChoice { method, mode, photometric_override })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::constants::{planar_config, sample_format};

    fn frame(photometric: u16, scheme: u16, spp: u16) -> FrameDescriptor {
        FrameDescriptor {
            compression: CompressionDescriptor {
                compression: scheme,
                photometric,
                sample_format: sample_format::UINT,
                samples_per_pixel: spp,
                bits_per_sample: 8,
                planar_config: planar_config::CONTIG,
            },
            matte: false,
            is_tiled: false,
            has_rows_per_strip: true,
            strip_size: 8192,
        }
    }

    #[test]
    fn test_native_methods() {
        let small = frame(photometric::RGB, compression::LZW, 3);
        assert_eq!(select_method(&small).unwrap().method, TiffMethod::Stripped);

        let large = FrameDescriptor { strip_size: 1 << 20, ..small };
        assert_eq!(select_method(&large).unwrap().method, TiffMethod::ScanLine);

        let tiled = FrameDescriptor { is_tiled: true, ..large };
        assert_eq!(select_method(&tiled).unwrap().method, TiffMethod::Tiled);
    }

    #[test]
    fn test_jpeg_ycbcr_is_read_as_rgb() {
        let jpeg = FrameDescriptor { strip_size: 1 << 20, ..frame(photometric::YCBCR, compression::JPEG, 3) };
        let choice = select_method(&jpeg).unwrap();
        assert_eq!(choice.method, TiffMethod::Stripped);
        assert_eq!(choice.photometric_override, Some(photometric::RGB));
    }

    #[test]
    fn test_fallback_methods() {
        let ycbcr = frame(photometric::YCBCR, compression::NONE, 3);
        assert_eq!(select_method(&ycbcr).unwrap().method, TiffMethod::RgbaStripped);
        let tiled = FrameDescriptor { is_tiled: true, ..ycbcr };
        assert_eq!(select_method(&tiled).unwrap().method, TiffMethod::RgbaTiled);
        let bare = FrameDescriptor { has_rows_per_strip: false, ..ycbcr };
        assert_eq!(select_method(&bare).unwrap().method, TiffMethod::RgbaPunt);
    }

    #[test]
    fn test_inconsistent_descriptor_fails() {
        assert!(select_method(&frame(photometric::SEPARATED, compression::NONE, 2)).is_err());
    }

    #[test]
    fn test_selection_is_deterministic() {
        let f = frame(photometric::MINISBLACK, compression::DEFLATE, 1);
        let first = select_method(&f).unwrap();
        assert!((0..20).all(|_| select_method(&f).unwrap() == first));
    }
}
