//! Sample import into canonical pixels
//!
//! Raw samples are scaled to 16-bit quanta: integers by bit depth, floats
//! by the frame's sample range. 16, 32 and 64-bit words must already be in
//! native order and 24-bit words big-endian; narrower and odd widths are
//! read MSB first.

use crate::model::{ColorEntry, Pixel, MAX_RGB};
use crate::quantum::bits::BitReader;
use crate::quantum::kind::QuantumKind;
use crate::tiff::constants::sample_format;

/// Numeric interpretation of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    Unsigned,
    Signed,
    Float,
}

impl SampleType {
    /// Maps a SampleFormat tag value; void samples read as unsigned
    pub fn from_sample_format(format: u16) -> Self {
        match format {
            sample_format::INT => SampleType::Signed,
            sample_format::IEEEFP => SampleType::Float,
            _ => SampleType::Unsigned,
        }
    }
}

/// How to read and scale samples
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub sample_type: SampleType,
    pub bits_per_sample: u16,
    /// Float value mapped to quantum 0
    pub min: f64,
    /// Float value mapped to `MAX_RGB`
    pub max: f64,
    /// Invert gray samples
    pub miniswhite: bool,
}

impl ImportOptions {
    pub fn new(sample_type: SampleType, bits_per_sample: u16) -> Self {
        ImportOptions {
            sample_type,
            bits_per_sample,
            min: 0.0,
            max: 1.0,
            miniswhite: false,
        }
    }
}

/// Outcome of importing one run of pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Bytes of input consumed
    pub bytes: usize,
    /// Palette indexes that were out of range and replaced by 0
    pub invalid_indexes: usize,
}

pub(crate) fn half_to_f32(half: u16) -> f32 {
    let negative = half & 0x8000 != 0;
    let exponent = ((half >> 10) & 0x1f) as i32;
    let mantissa = (half & 0x3ff) as f32;
    let magnitude = match exponent {
        0 => mantissa * 2f32.powi(-24),
        31 if mantissa == 0.0 => f32::INFINITY,
        31 => f32::NAN,
        _ => (1.0 + mantissa / 1024.0) * 2f32.powi(exponent - 15),
    };
    if negative { -magnitude } else { magnitude }
}

/// Scales an unsigned integer sample to a quantum
pub(crate) fn scale_to_quantum(raw: u64, bits: u16) -> u16 {
    match bits {
        16 => raw as u16,
        0 => 0,
        b if b < 16 => {
            let max = (1u64 << b) - 1;
            ((raw.min(max) * MAX_RGB as u64 + max / 2) / max) as u16
        },
        b => (raw >> (b - 16)).min(MAX_RGB as u64) as u16,
    }
}

fn float_to_quantum(value: f64, min: f64, max: f64) -> u16 {
    if value.is_nan() {
        return 0;
    }
    let range = max - min;
    let normalized = if range.abs() > f64::EPSILON { (value - min) / range } else { value };
    (normalized.clamp(0.0, 1.0) * MAX_RGB as f64).round() as u16
}

/// Sequential sample source over one transfer buffer
struct SampleSource<'a> {
    data: &'a [u8],
    reader: BitReader,
    options: &'a ImportOptions,
}

impl<'a> SampleSource<'a> {
    fn new(data: &'a [u8], options: &'a ImportOptions) -> Self {
        SampleSource { data, reader: BitReader::default(), options }
    }

    /// Reads one raw sample, native words for 16, 32 and 64 bits
    fn raw(&mut self) -> u64 {
        let bits = self.options.bits_per_sample;
        match bits {
            16 | 32 | 64 => {
                let width = bits as usize / 8;
                let start = self.reader.bit_position() / 8;
                let mut word = [0u8; 8];
                if let Some(bytes) = self.data.get(start..start + width) {
                    word[..width].copy_from_slice(bytes);
                }
                self.reader = BitReader::at_byte(start + width);
                match bits {
                    16 => u16::from_ne_bytes([word[0], word[1]]) as u64,
                    32 => u32::from_ne_bytes([word[0], word[1], word[2], word[3]]) as u64,
                    _ => u64::from_ne_bytes(word),
                }
            },
            _ => self.reader.read(self.data, bits.min(32)) as u64,
        }
    }

    /// Reads one sample as a quantum
    fn quantum(&mut self) -> u16 {
        let bits = self.options.bits_per_sample;
        let raw = self.raw();
        match self.options.sample_type {
            SampleType::Unsigned => scale_to_quantum(raw, bits),
            SampleType::Signed => scale_to_quantum(raw ^ (1u64 << (bits.clamp(1, 64) - 1)), bits),
            SampleType::Float => {
                let value = match bits {
                    16 => half_to_f32(raw as u16) as f64,
                    32 => f32::from_bits(raw as u32) as f64,
                    64 => f64::from_bits(raw),
                    _ => return scale_to_quantum(raw, bits),
                };
                float_to_quantum(value, self.options.min, self.options.max)
            },
        }
    }

    fn gray(&mut self) -> u16 {
        let level = self.quantum();
        if self.options.miniswhite { MAX_RGB - level } else { level }
    }

    fn opacity(&mut self) -> u16 {
        MAX_RGB - self.quantum()
    }

    fn consumed(&self) -> usize {
        (self.reader.bit_position() + 7) / 8
    }
}

/// Converts CIE XYZ quanta to linear sRGB quanta
fn xyz_to_rgb(x: u16, y: u16, z: u16) -> (u16, u16, u16) {
    let scale = MAX_RGB as f64;
    let (x, y, z) = (x as f64 / scale, y as f64 / scale, z as f64 / scale);
    let channel = |v: f64| (v.clamp(0.0, 1.0) * scale).round() as u16;
    (
        channel(3.2406 * x - 1.5372 * y - 0.4986 * z),
        channel(-0.9689 * x + 1.8758 * y + 0.0415 * z),
        channel(0.0557 * x - 0.2040 * y + 1.0570 * z),
    )
}

/// Imports one run of pixels from a transfer buffer
///
/// Single-channel kinds only touch their own channel, so separate planes
/// can be imported one after another into the same pixels.
///
/// # Arguments
/// * `kind` - Quantum layout of the buffer
/// * `options` - Sample interpretation
/// * `data` - Packed samples, starting on a byte boundary
/// * `pixels` - Destination pixels; one is imported per element
/// * `indexes` - Destination colormap indexes, palette kinds only
/// * `colormap` - Colormap used to resolve indexes
pub fn import_pixels(
    kind: QuantumKind,
    options: &ImportOptions,
    data: &[u8],
    pixels: &mut [Pixel],
    mut indexes: Option<&mut [u16]>,
    colormap: &[ColorEntry],
) -> ImportStats {
    let mut source = SampleSource::new(data, options);
    let mut stats = ImportStats::default();

    for (i, pixel) in pixels.iter_mut().enumerate() {
        match kind {
            QuantumKind::Gray | QuantumKind::CieY => {
                let level = source.gray();
                pixel.red = level;
                pixel.green = level;
                pixel.blue = level;
            },
            QuantumKind::GrayAlpha => {
                let level = source.gray();
                pixel.red = level;
                pixel.green = level;
                pixel.blue = level;
                pixel.opacity = source.opacity();
            },
            QuantumKind::Index | QuantumKind::IndexAlpha => {
                let mut index = source.raw() as usize;
                if index >= colormap.len() {
                    stats.invalid_indexes += 1;
                    index = 0;
                }
                if let Some(entry) = colormap.get(index) {
                    pixel.red = entry.red;
                    pixel.green = entry.green;
                    pixel.blue = entry.blue;
                }
                if let Some(slot) = indexes.as_deref_mut().and_then(|ix| ix.get_mut(i)) {
                    *slot = index as u16;
                }
                if kind == QuantumKind::IndexAlpha {
                    pixel.opacity = source.opacity();
                }
            },
            QuantumKind::Rgb | QuantumKind::Rgba => {
                pixel.red = source.quantum();
                pixel.green = source.quantum();
                pixel.blue = source.quantum();
                if kind == QuantumKind::Rgba {
                    pixel.opacity = source.opacity();
                }
            },
            QuantumKind::Cmyk | QuantumKind::Cmyka => {
                pixel.red = source.quantum();
                pixel.green = source.quantum();
                pixel.blue = source.quantum();
                pixel.black = source.quantum();
                if kind == QuantumKind::Cmyka {
                    pixel.opacity = source.opacity();
                }
            },
            QuantumKind::Red | QuantumKind::Cyan => pixel.red = source.quantum(),
            QuantumKind::Green | QuantumKind::Magenta => pixel.green = source.quantum(),
            QuantumKind::Blue | QuantumKind::Yellow => pixel.blue = source.quantum(),
            QuantumKind::Black => pixel.black = source.quantum(),
            QuantumKind::Alpha => pixel.opacity = source.opacity(),
            QuantumKind::CieXyz => {
                let (x, y, z) = (source.quantum(), source.quantum(), source.quantum());
                let (r, g, b) = xyz_to_rgb(x, y, z);
                pixel.red = r;
                pixel.green = g;
                pixel.blue = b;
            },
        }
    }

    stats.bytes = source.consumed();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_integer_depths() {
        assert_eq!(scale_to_quantum(1, 1), MAX_RGB);
        assert_eq!(scale_to_quantum(255, 8), MAX_RGB);
        assert_eq!(scale_to_quantum(128, 8), 32896);
        assert_eq!(scale_to_quantum(7, 4), 30583);
        assert_eq!(scale_to_quantum(0xFFFF_FFFF, 32), MAX_RGB);
    }

    #[test]
    fn test_miniswhite_bilevel() {
        let options = ImportOptions { miniswhite: true, ..ImportOptions::new(SampleType::Unsigned, 1) };
        let mut pixels = vec![Pixel::default(); 8];
        let stats = import_pixels(QuantumKind::Gray, &options, &[0b1000_0001], &mut pixels, None, &[]);
        assert_eq!(stats.bytes, 1);
        assert_eq!(pixels[0].red, 0);
        assert_eq!(pixels[1].red, MAX_RGB);
        assert_eq!(pixels[7].red, 0);
    }

    #[test]
    fn test_rgba_sets_opacity() {
        let options = ImportOptions::new(SampleType::Unsigned, 8);
        let mut pixels = vec![Pixel::default(); 1];
        import_pixels(QuantumKind::Rgba, &options, &[255, 0, 0, 255], &mut pixels, None, &[]);
        assert_eq!(pixels[0], Pixel::rgb(MAX_RGB, 0, 0));
    }

    #[test]
    fn test_float_range() {
        let mut options = ImportOptions::new(SampleType::Float, 32);
        options.min = -1.0;
        options.max = 1.0;
        let data: Vec<u8> = [0.0f32, 1.0, -2.0].iter().flat_map(|v| v.to_ne_bytes()).collect();
        let mut pixels = vec![Pixel::default(); 3];
        import_pixels(QuantumKind::Gray, &options, &data, &mut pixels, None, &[]);
        assert_eq!(pixels[0].red, 32768);
        assert_eq!(pixels[1].red, MAX_RGB);
        assert_eq!(pixels[2].red, 0);
    }

    #[test]
    fn test_half_float() {
        assert_eq!(half_to_f32(0x3C00), 1.0);
        assert_eq!(half_to_f32(0x3800), 0.5);
        assert_eq!(half_to_f32(0xC000), -2.0);
    }

    #[test]
    fn test_signed_samples_offset() {
        let options = ImportOptions::new(SampleType::Signed, 8);
        let mut pixels = vec![Pixel::default(); 2];
        import_pixels(QuantumKind::Gray, &options, &[0x80, 0x7F], &mut pixels, None, &[]);
        assert_eq!(pixels[0].red, 0);
        assert_eq!(pixels[1].red, MAX_RGB);
    }

    #[test]
    fn test_palette_index_out_of_range() {
        let colormap = vec![Pixel::rgb(1, 2, 3), Pixel::rgb(4, 5, 6)];
        let options = ImportOptions::new(SampleType::Unsigned, 8);
        let mut pixels = vec![Pixel::default(); 2];
        let mut indexes = vec![9u16; 2];
        let stats = import_pixels(QuantumKind::Index, &options, &[1, 7], &mut pixels, Some(&mut indexes), &colormap);
        assert_eq!(stats.invalid_indexes, 1);
        assert_eq!(indexes, vec![1, 0]);
        assert_eq!(pixels[0], Pixel::rgb(4, 5, 6));
        assert_eq!(pixels[1], Pixel::rgb(1, 2, 3));
    }
}
