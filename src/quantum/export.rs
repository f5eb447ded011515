//! Sample export from canonical pixels
//!
//! The inverse of import: quanta are scaled down to the output depth and
//! packed MSB first. 16, 32 and 64-bit words are written in native order;
//! the caller swaps them into stream order.

use crate::model::{Pixel, MAX_RGB};
use crate::quantum::bits::BitWriter;
use crate::quantum::import::SampleType;
use crate::quantum::kind::QuantumKind;

/// How to scale and pack samples
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub sample_type: SampleType,
    pub bits_per_sample: u16,
    /// Invert gray samples
    pub miniswhite: bool,
}

impl ExportOptions {
    pub fn new(sample_type: SampleType, bits_per_sample: u16) -> Self {
        ExportOptions { sample_type, bits_per_sample, miniswhite: false }
    }
}

/// Scales a quantum down to an unsigned sample of `bits` bits
pub(crate) fn scale_from_quantum(quantum: u16, bits: u16) -> u64 {
    match bits {
        16 => quantum as u64,
        0 => 0,
        b if b < 16 => {
            let max = (1u64 << b) - 1;
            (quantum as u64 * max + MAX_RGB as u64 / 2) / MAX_RGB as u64
        },
        b => {
            let max = if b >= 64 { u64::MAX } else { (1u64 << b) - 1 };
            ((quantum as u128 * max as u128) / MAX_RGB as u128) as u64
        },
    }
}

pub(crate) fn f32_to_half(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xff) as i32 - 127 + 15;
    let mantissa = bits & 0x7f_ffff;

    if exponent >= 31 {
        return sign | 0x7c00;
    }
    if exponent <= 0 {
        if exponent < -10 {
            return sign;
        }
        let subnormal = (mantissa | 0x80_0000) >> (1 - exponent) as u32;
        return sign | ((subnormal + 0x1000) >> 13) as u16;
    }
    let half = ((exponent as u32) << 10) | (mantissa >> 13);
    sign | (half + ((mantissa >> 12) & 1)) as u16
}

/// Sequential sample sink over one transfer buffer
struct SampleSink<'a> {
    out: &'a mut [u8],
    writer: BitWriter,
    options: &'a ExportOptions,
}

impl<'a> SampleSink<'a> {
    fn raw(&mut self, value: u64) {
        let bits = self.options.bits_per_sample;
        match bits {
            16 | 32 | 64 => {
                let width = bits as usize / 8;
                let start = self.writer.bit_position() / 8;
                let bytes = match bits {
                    16 => (value as u16).to_ne_bytes().to_vec(),
                    32 => (value as u32).to_ne_bytes().to_vec(),
                    _ => value.to_ne_bytes().to_vec(),
                };
                if let Some(slot) = self.out.get_mut(start..start + width) {
                    slot.copy_from_slice(&bytes);
                }
                self.writer = BitWriter::at_byte(start + width);
            },
            _ => self.writer.write(self.out, bits.min(32), value as u32),
        }
    }

    fn quantum(&mut self, quantum: u16) {
        let bits = self.options.bits_per_sample;
        let value = match self.options.sample_type {
            SampleType::Unsigned => scale_from_quantum(quantum, bits),
            SampleType::Signed => scale_from_quantum(quantum, bits) ^ (1u64 << (bits.clamp(1, 64) - 1)),
            SampleType::Float => {
                let normalized = quantum as f64 / MAX_RGB as f64;
                match bits {
                    16 => f32_to_half(normalized as f32) as u64,
                    32 => (normalized as f32).to_bits() as u64,
                    64 => normalized.to_bits(),
                    _ => scale_from_quantum(quantum, bits),
                }
            },
        };
        self.raw(value);
    }

    fn gray(&mut self, level: u16) {
        let level = if self.options.miniswhite { MAX_RGB - level } else { level };
        self.quantum(level);
    }

    fn alpha(&mut self, opacity: u16) {
        self.quantum(MAX_RGB - opacity);
    }
}

/// Exports one run of pixels into a transfer buffer
///
/// # Arguments
/// * `kind` - Quantum layout to produce
/// * `options` - Sample depth and format
/// * `pixels` - Source pixels
/// * `indexes` - Colormap indexes, palette kinds only
/// * `out` - Destination buffer, starting on a byte boundary
///
/// # Returns
/// Bytes written, rounded up to a whole byte
pub fn export_pixels(
    kind: QuantumKind,
    options: &ExportOptions,
    pixels: &[Pixel],
    indexes: &[u16],
    out: &mut [u8],
) -> usize {
    let mut sink = SampleSink { out, writer: BitWriter::default(), options };

    for (i, pixel) in pixels.iter().enumerate() {
        match kind {
            QuantumKind::Gray | QuantumKind::CieY => sink.gray(pixel.intensity()),
            QuantumKind::GrayAlpha => {
                sink.gray(pixel.intensity());
                sink.alpha(pixel.opacity);
            },
            QuantumKind::Index | QuantumKind::IndexAlpha => {
                sink.raw(indexes.get(i).copied().unwrap_or(0) as u64);
                if kind == QuantumKind::IndexAlpha {
                    sink.alpha(pixel.opacity);
                }
            },
            QuantumKind::Rgb | QuantumKind::Rgba | QuantumKind::CieXyz => {
                sink.quantum(pixel.red);
                sink.quantum(pixel.green);
                sink.quantum(pixel.blue);
                if kind == QuantumKind::Rgba {
                    sink.alpha(pixel.opacity);
                }
            },
            QuantumKind::Cmyk | QuantumKind::Cmyka => {
                sink.quantum(pixel.red);
                sink.quantum(pixel.green);
                sink.quantum(pixel.blue);
                sink.quantum(pixel.black);
                if kind == QuantumKind::Cmyka {
                    sink.alpha(pixel.opacity);
                }
            },
            QuantumKind::Red | QuantumKind::Cyan => sink.quantum(pixel.red),
            QuantumKind::Green | QuantumKind::Magenta => sink.quantum(pixel.green),
            QuantumKind::Blue | QuantumKind::Yellow => sink.quantum(pixel.blue),
            QuantumKind::Black => sink.quantum(pixel.black),
            QuantumKind::Alpha => sink.alpha(pixel.opacity),
        }
    }

    sink.writer.align(sink.out);
    sink.writer.bytes_written()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum::import::{import_pixels, half_to_f32, ImportOptions};

    #[test]
    fn test_bilevel_packing() {
        let options = ExportOptions { miniswhite: true, ..ExportOptions::new(SampleType::Unsigned, 1) };
        let pixels = vec![Pixel::gray(0), Pixel::gray(MAX_RGB), Pixel::gray(0)];
        let mut out = [0xFFu8; 1];
        assert_eq!(export_pixels(QuantumKind::Gray, &options, &pixels, &[], &mut out), 1);
        assert_eq!(out[0], 0b1010_0000);
    }

    #[test]
    fn test_rgba_alpha_sample() {
        let options = ExportOptions::new(SampleType::Unsigned, 8);
        let pixels = vec![Pixel { red: MAX_RGB, green: 0, blue: 257, black: 0, opacity: MAX_RGB }];
        let mut out = [0u8; 4];
        export_pixels(QuantumKind::Rgba, &options, &pixels, &[], &mut out);
        assert_eq!(out, [255, 0, 1, 0]);
    }

    #[test]
    fn test_depths_survive_import() {
        let pixels: Vec<Pixel> = [0u16, 1, 257, 32768, 65534, MAX_RGB].iter().map(|&v| Pixel::gray(v)).collect();
        for bits in [16u16, 32] {
            let options = ExportOptions::new(SampleType::Unsigned, bits);
            let mut out = vec![0u8; pixels.len() * bits as usize / 8];
            export_pixels(QuantumKind::Gray, &options, &pixels, &[], &mut out);
            let mut back = vec![Pixel::default(); pixels.len()];
            import_pixels(QuantumKind::Gray, &ImportOptions::new(SampleType::Unsigned, bits), &out, &mut back, None, &[]);
            assert_eq!(back, pixels, "{} bits", bits);
        }
    }

    #[test]
    fn test_half_conversion() {
        for value in [0.0f32, 0.25, 0.5, 1.0] {
            assert_eq!(half_to_f32(f32_to_half(value)), value);
        }
        assert!((half_to_f32(f32_to_half(1.0e-5)) - 1.0e-5).abs() < 1.0e-6);
    }
}
