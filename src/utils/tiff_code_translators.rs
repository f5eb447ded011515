//! TIFF code translators
//!
//! Translates numeric TIFF tag values into the human-readable names used
//! in debug logs and analysis output.

use crate::tiff::constants::{compression, sample_format, predictor, photometric, planar_config, extra_samples};

/// Converts a TIFF compression code to its human-readable description
pub fn compression_code_to_name(compression_code: u64) -> &'static str {
    match compression_code as u16 {
        compression::NONE => "None",
        compression::CCITT_RLE => "CCITT RLE",
        compression::CCITT_FAX3 => "CCITT Group 3 fax",
        compression::CCITT_FAX4 => "CCITT Group 4 fax",
        compression::LZW => "LZW",
        compression::JPEG_OLD => "JPEG (old-style)",
        compression::JPEG => "JPEG",
        compression::DEFLATE => "Adobe Deflate (zlib)",
        compression::DEFLATE_OLD => "Deflate",
        compression::JBIG_BW | compression::JBIG_COLOR | compression::JBIG => "JBIG",
        compression::PACKBITS => "PackBits",
        compression::SGILOG => "SGI LogLuv",
        compression::SGILOG24 => "SGI LogLuv 24",
        compression::LZMA => "LZMA",
        compression::ZSTD => "ZSTD",
        compression::WEBP => "WebP",
        _ => "Unknown",
    }
}

/// Converts a TIFF sample format code to its human-readable description
pub fn sample_format_code_to_name(sample_format_code: u64) -> &'static str {
    match sample_format_code as u16 {
        sample_format::UINT => "Unsigned integer",
        sample_format::INT => "Signed integer",
        sample_format::IEEEFP => "IEEE floating point",
        sample_format::VOID => "Undefined",
        sample_format::COMPLEX_INT => "Complex integer",
        sample_format::COMPLEX_IEEEFP => "Complex floating point",
        _ => "Unknown",
    }
}

/// Converts a TIFF predictor code to its human-readable description
pub fn predictor_code_to_name(predictor_code: u64) -> &'static str {
    match predictor_code as u16 {
        predictor::NONE => "None",
        predictor::HORIZONTAL => "Horizontal differencing",
        predictor::FLOATING_POINT => "Floating point",
        _ => "Unknown",
    }
}

/// Converts a TIFF photometric interpretation code to its human-readable description
pub fn photometric_code_to_name(photometric_code: u64) -> &'static str {
    match photometric_code as u16 {
        photometric::MINISWHITE => "MINISWHITE",
        photometric::MINISBLACK => "MINISBLACK",
        photometric::RGB => "RGB",
        photometric::PALETTE => "PALETTE",
        photometric::MASK => "MASK",
        photometric::SEPARATED => "SEPARATED",
        photometric::YCBCR => "YCBCR",
        photometric::CIELAB => "CIELAB",
        photometric::ICCLAB => "ICCLAB",
        photometric::ITULAB => "ITULAB",
        photometric::LOGL => "CIE Log2(L)",
        photometric::LOGLUV => "LOGLUV",
        _ => "Unknown",
    }
}

/// Converts a TIFF planar configuration code to its human-readable description
pub fn planar_config_code_to_name(planar_config_code: u64) -> &'static str {
    match planar_config_code as u16 {
        planar_config::CONTIG => "contiguous",
        planar_config::SEPARATE => "separate",
        _ => "Unknown",
    }
}

/// Converts an ExtraSamples value to its human-readable description
pub fn extra_samples_code_to_name(code: u64) -> &'static str {
    match code as u16 {
        extra_samples::UNSPECIFIED => "Unspecified",
        extra_samples::ASSOCIATED_ALPHA => "Associated alpha",
        extra_samples::UNASSOCIATED_ALPHA => "Unassociated alpha",
        _ => "Unknown",
    }
}
