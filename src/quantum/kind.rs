//! Transfer mode classification
//!
//! `classify` maps the tag tuple that describes a frame's samples onto the
//! quantum layout the import and export routines understand. Tuples it
//! does not recognize yield `None` so the caller can fall back to generic
//! RGBA decoding. Tuples that would make the engine consume more samples
//! than a pixel holds are structural errors.

use std::fmt;
use log::trace;

use crate::tiff::constants::{compression, photometric, planar_config, sample_format};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::utils::tiff_code_translators::photometric_code_to_name;

/// Layout of the samples of one pixel in a transfer buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantumKind {
    Gray,
    GrayAlpha,
    Index,
    IndexAlpha,
    Rgb,
    Rgba,
    Cmyk,
    Cmyka,
    Red,
    Green,
    Blue,
    Alpha,
    Cyan,
    Magenta,
    Yellow,
    Black,
    /// CIE luminance, as decoded from LogL
    CieY,
    /// CIE XYZ triple, as decoded from LogLuv
    CieXyz,
}

impl QuantumKind {
    /// Number of samples one pixel of this kind occupies
    pub fn samples(&self) -> u16 {
        match self {
            QuantumKind::Gray | QuantumKind::Index | QuantumKind::CieY => 1,
            QuantumKind::Red | QuantumKind::Green | QuantumKind::Blue | QuantumKind::Alpha => 1,
            QuantumKind::Cyan | QuantumKind::Magenta | QuantumKind::Yellow | QuantumKind::Black => 1,
            QuantumKind::GrayAlpha | QuantumKind::IndexAlpha => 2,
            QuantumKind::Rgb | QuantumKind::CieXyz => 3,
            QuantumKind::Rgba | QuantumKind::Cmyk => 4,
            QuantumKind::Cmyka => 5,
        }
    }
}

impl fmt::Display for QuantumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The tag tuple that decides how raw samples are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionDescriptor {
    pub compression: u16,
    pub photometric: u16,
    pub sample_format: u16,
    pub samples_per_pixel: u16,
    pub bits_per_sample: u16,
    pub planar_config: u16,
}

impl CompressionDescriptor {
    /// Whether samples are stored as separate planes
    pub fn is_separate(&self) -> bool {
        self.planar_config == planar_config::SEPARATE
    }
}

/// Result of classification: the quantum kind and samples it consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferMode {
    pub kind: QuantumKind,
    pub samples: u16,
}

impl TransferMode {
    fn new(kind: QuantumKind) -> Option<Self> {
        Some(TransferMode { kind, samples: kind.samples() })
    }
}

/// Picks the single channel a separate plane carries
fn plane_channel(plane: u16, channels: &[QuantumKind]) -> Option<TransferMode> {
    channels.get(plane as usize).and_then(|&kind| TransferMode::new(kind))
}

/// Classifies a descriptor for the given plane
///
/// # Arguments
/// * `descriptor` - The frame's compression descriptor
/// * `matte` - Whether the frame carries an alpha channel
/// * `plane` - Plane index; only meaningful for separate planes
///
/// # Returns
/// The transfer mode, `None` when the tuple is not recognized, or a
/// structural error when the mode would over-read the pixel
pub fn classify(descriptor: &CompressionDescriptor, matte: bool, plane: u16) -> TiffResult<Option<TransferMode>> {
    use QuantumKind::*;

    if !matches!(descriptor.sample_format,
                 sample_format::INT | sample_format::UINT | sample_format::VOID | sample_format::IEEEFP) {
        return Ok(None);
    }

    let separate = descriptor.is_separate();
    let spp = descriptor.samples_per_pixel;
    let sgilog = matches!(descriptor.compression, compression::SGILOG | compression::SGILOG24);

    let mode = match descriptor.photometric {
        photometric::CIELAB => {
            if separate {
                let first = if spp == 1 { Gray } else { Red };
                plane_channel(plane, &[first, Green, Blue, Alpha])
            } else if spp == 1 {
                TransferMode::new(if matte { GrayAlpha } else { Gray })
            } else {
                TransferMode::new(if matte { Rgba } else { Rgb })
            }
        },
        photometric::LOGL => {
            if sgilog && !separate && spp == 1 && !matte {
                TransferMode::new(CieY)
            } else {
                None
            }
        },
        photometric::LOGLUV => {
            if sgilog && !separate && !matte {
                match spp {
                    1 => TransferMode::new(CieY),
                    3 => TransferMode::new(CieXyz),
                    _ => None,
                }
            } else {
                None
            }
        },
        photometric::MINISBLACK | photometric::MINISWHITE => {
            if separate {
                plane_channel(plane, &[Gray, Alpha])
            } else {
                TransferMode::new(if matte { GrayAlpha } else { Gray })
            }
        },
        photometric::PALETTE => {
            if descriptor.sample_format != sample_format::UINT {
                None
            } else if separate {
                plane_channel(plane, &[Index, Alpha])
            } else {
                TransferMode::new(if matte { IndexAlpha } else { Index })
            }
        },
        photometric::RGB => {
            if descriptor.compression == compression::JPEG_OLD {
                None
            } else if separate {
                plane_channel(plane, &[Red, Green, Blue, Alpha])
            } else {
                TransferMode::new(if matte { Rgba } else { Rgb })
            }
        },
        photometric::SEPARATED => {
            if separate {
                plane_channel(plane, &[Cyan, Magenta, Yellow, Black, Alpha])
            } else {
                TransferMode::new(if matte { Cmyka } else { Cmyk })
            }
        },
        photometric::YCBCR => {
            if descriptor.compression == compression::JPEG && !separate {
                TransferMode::new(Rgb)
            } else {
                None
            }
        },
        _ => None,
    };

    if let Some(mode) = mode {
        if separate && mode.samples != 1 {
            return Err(TiffError::structural(format!(
                "{} quantum consumes {} samples from a separate plane", mode.kind, mode.samples)));
        }
        if mode.samples > spp {
            return Err(TiffError::structural(format!(
                "{} quantum needs {} samples but pixels carry {} ({})",
                mode.kind, mode.samples, spp, photometric_code_to_name(descriptor.photometric as u64))));
        }
        trace!("Classified {} plane {} as {} ({} samples)",
               photometric_code_to_name(descriptor.photometric as u64), plane, mode.kind, mode.samples);
    }

    Ok(mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(photometric: u16, spp: u16, planar: u16) -> CompressionDescriptor {
        CompressionDescriptor {
            compression: compression::NONE,
            photometric,
            sample_format: sample_format::UINT,
            samples_per_pixel: spp,
            bits_per_sample: 8,
            planar_config: planar,
        }
    }

    #[test]
    fn test_contiguous_modes() {
        let rgb = descriptor(photometric::RGB, 3, planar_config::CONTIG);
        assert_eq!(classify(&rgb, false, 0).unwrap(), Some(TransferMode { kind: QuantumKind::Rgb, samples: 3 }));

        let gray_alpha = descriptor(photometric::MINISBLACK, 2, planar_config::CONTIG);
        assert_eq!(classify(&gray_alpha, true, 0).unwrap().unwrap().kind, QuantumKind::GrayAlpha);

        let cmyk = descriptor(photometric::SEPARATED, 4, planar_config::CONTIG);
        assert_eq!(classify(&cmyk, false, 0).unwrap().unwrap().kind, QuantumKind::Cmyk);
    }

    #[test]
    fn test_separate_planes_select_one_channel() {
        let rgba = descriptor(photometric::RGB, 4, planar_config::SEPARATE);
        let kinds: Vec<QuantumKind> = (0..4)
            .map(|plane| classify(&rgba, true, plane).unwrap().unwrap())
            .inspect(|mode| assert_eq!(mode.samples, 1))
            .map(|mode| mode.kind)
            .collect();
        assert_eq!(kinds, vec![QuantumKind::Red, QuantumKind::Green, QuantumKind::Blue, QuantumKind::Alpha]);
    }

    #[test]
    fn test_inconsistent_tuple_is_structural() {
        // Two samples per pixel cannot feed a CMYK quantum
        let bad = descriptor(photometric::SEPARATED, 2, planar_config::CONTIG);
        let err = classify(&bad, false, 0).unwrap_err();
        assert!(matches!(err, TiffError::Structural(_)));

        let bad_rgb = descriptor(photometric::RGB, 3, planar_config::CONTIG);
        assert!(classify(&bad_rgb, true, 0).is_err());
    }

    #[test]
    fn test_unrecognized_tuples() {
        let mut ycbcr = descriptor(photometric::YCBCR, 3, planar_config::CONTIG);
        assert_eq!(classify(&ycbcr, false, 0).unwrap(), None);
        ycbcr.compression = compression::JPEG;
        assert_eq!(classify(&ycbcr, false, 0).unwrap().unwrap().kind, QuantumKind::Rgb);

        let mut palette = descriptor(photometric::PALETTE, 1, planar_config::CONTIG);
        palette.sample_format = sample_format::IEEEFP;
        assert_eq!(classify(&palette, false, 0).unwrap(), None);

        let logl = descriptor(photometric::LOGL, 1, planar_config::CONTIG);
        assert_eq!(classify(&logl, false, 0).unwrap(), None);

        let mut complex = descriptor(photometric::RGB, 3, planar_config::CONTIG);
        complex.sample_format = sample_format::COMPLEX_INT;
        assert_eq!(classify(&complex, false, 0).unwrap(), None);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let d = descriptor(photometric::MINISWHITE, 1, planar_config::CONTIG);
        let first = classify(&d, false, 0).unwrap();
        for _ in 0..10 {
            assert_eq!(classify(&d, false, 0).unwrap(), first);
        }
    }
}
