//! Generic RGBA decoding for layouts the transfer engine does not classify
//!
//! Decoded contiguous rows are turned straight into RGB(A) pixels. Gray,
//! RGB, palette, CMYK and YCbCr (full or block subsampled) are handled;
//! anything else is a structural error reported when the materializer is
//! built, before any pixel data is read.

use log::debug;

use crate::model::{ColorEntry, Pixel, MAX_RGB};
use crate::quantum::bits::BitReader;
use crate::quantum::import::scale_to_quantum;
use crate::quantum::kind::CompressionDescriptor;
use crate::tiff::constants::{photometric, sample_format};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::utils::tiff_code_translators::photometric_code_to_name;

/// Converts rows of raw samples to RGBA pixels
#[derive(Debug, Clone)]
pub struct RgbaMaterializer {
    photometric: u16,
    bits_per_sample: u16,
    samples_per_pixel: u16,
    matte: bool,
    colormap: Vec<ColorEntry>,
    /// Chroma block for subsampled YCbCr
    subsampling: Option<(u16, u16)>,
}

impl RgbaMaterializer {
    /// Checks that the frame can be materialized
    ///
    /// # Arguments
    /// * `descriptor` - The frame's compression descriptor
    /// * `matte` - Whether the first extra sample is alpha
    /// * `colormap` - Colormap for palette frames
    /// * `subsampling` - Chroma block of subsampled YCbCr data
    pub fn new(descriptor: &CompressionDescriptor, matte: bool, colormap: &[ColorEntry],
               subsampling: Option<(u16, u16)>) -> TiffResult<Self> {
        let name = photometric_code_to_name(descriptor.photometric as u64);
        let unsupported = |reason: String| -> TiffResult<Self> {
            Err(TiffError::structural(format!("Cannot decode {} as RGBA: {}", name, reason)))
        };

        if descriptor.is_separate() {
            return unsupported("separate planes".to_string());
        }
        if !matches!(descriptor.sample_format, sample_format::UINT | sample_format::VOID) {
            return unsupported(format!("sample format {}", descriptor.sample_format));
        }

        let bits = descriptor.bits_per_sample;
        let spp = descriptor.samples_per_pixel;
        let color_samples = match descriptor.photometric {
            photometric::MINISBLACK | photometric::MINISWHITE => {
                if !matches!(bits, 1 | 2 | 4 | 8 | 16) {
                    return unsupported(format!("{}-bit gray", bits));
                }
                1
            },
            photometric::PALETTE => {
                if !matches!(bits, 1 | 2 | 4 | 8 | 16) || colormap.is_empty() {
                    return unsupported(format!("{}-bit palette", bits));
                }
                1
            },
            photometric::RGB | photometric::YCBCR => {
                if let Some((h, v)) = subsampling.filter(|_| descriptor.photometric == photometric::YCBCR) {
                    if bits != 8 || matte || spp != 3 {
                        return unsupported(format!("{}x{} chroma blocks with {} samples of {} bits",
                                                   h, v, spp, bits));
                    }
                }
                if !matches!(bits, 8 | 16) {
                    return unsupported(format!("{}-bit samples", bits));
                }
                3
            },
            photometric::SEPARATED => {
                if !matches!(bits, 8 | 16) {
                    return unsupported(format!("{}-bit samples", bits));
                }
                4
            },
            other => return unsupported(format!("photometric {}", other)),
        };

        if spp < color_samples + matte as u16 {
            return unsupported(format!("{} samples per pixel", spp));
        }
        debug!("RGBA materializer for {} {}-bit, {} samples per pixel", name, bits, spp);

        Ok(RgbaMaterializer {
            photometric: descriptor.photometric,
            bits_per_sample: bits,
            samples_per_pixel: spp,
            matte,
            colormap: colormap.to_vec(),
            subsampling: subsampling.filter(|_| descriptor.photometric == photometric::YCBCR),
        })
    }

    /// Bytes of one row of `columns` pixels
    fn row_size(&self, columns: u32) -> usize {
        (columns as usize * self.samples_per_pixel as usize * self.bits_per_sample as usize + 7) / 8
    }

    /// Materializes row `row` of a decoded chunk `columns` pixels wide
    ///
    /// 16-bit samples must be in native order. `pixels` may be narrower
    /// than the chunk.
    pub fn materialize_row(&self, chunk: &[u8], row: usize, columns: u32, pixels: &mut [Pixel]) {
        match self.subsampling {
            Some(block) => self.materialize_blocks(chunk, row, columns, block, pixels),
            None => {
                let data = chunk.get(row * self.row_size(columns)..).unwrap_or(&[]);
                self.materialize_samples(data, pixels);
            },
        }
    }

    /// Reads one pixel row out of the chroma blocks covering it
    fn materialize_blocks(&self, chunk: &[u8], row: usize, columns: u32, (h, v): (u16, u16),
                          pixels: &mut [Pixel]) {
        let (h, v) = (h as usize, v as usize);
        let block_size = h * v + 2;
        let block_row = (columns as usize).div_ceil(h) * block_size;
        let base = (row / v) * block_row;
        let line = (row % v) * h;
        let sample = |offset: usize| chunk.get(offset).copied().unwrap_or(0) as u64;
        let center = scale_to_quantum(128, 8);

        for (x, pixel) in pixels.iter_mut().enumerate() {
            let block = base + (x / h) * block_size;
            let y = scale_to_quantum(sample(block + line + x % h), 8);
            let cb = scale_to_quantum(sample(block + h * v), 8);
            let cr = scale_to_quantum(sample(block + h * v + 1), 8);
            *pixel = ycbcr_to_rgb(y, cb, cr, center);
        }
    }

    fn materialize_samples(&self, data: &[u8], pixels: &mut [Pixel]) {
        let bits = self.bits_per_sample;
        let mut reader = BitReader::default();
        let mut samples = [0u32; 8];

        for pixel in pixels.iter_mut() {
            let spp = (self.samples_per_pixel as usize).min(samples.len());
            for sample in samples.iter_mut().take(spp) {
                *sample = if bits == 16 {
                    let start = reader.bit_position() / 8;
                    reader = BitReader::at_byte(start + 2);
                    data.get(start..start + 2)
                        .map_or(0, |b| u16::from_ne_bytes([b[0], b[1]]) as u32)
                } else {
                    reader.read(data, bits)
                };
            }
            for _ in spp..self.samples_per_pixel as usize {
                reader.read(data, bits);
            }

            let q = |raw: u32| scale_to_quantum(raw as u64, bits);
            let mut alpha_index = 1;
            match self.photometric {
                photometric::MINISBLACK => *pixel = Pixel::gray(q(samples[0])),
                photometric::MINISWHITE => *pixel = Pixel::gray(MAX_RGB - q(samples[0])),
                photometric::PALETTE => {
                    let entry = self.colormap.get(samples[0] as usize).copied().unwrap_or_default();
                    *pixel = Pixel::rgb(entry.red, entry.green, entry.blue);
                },
                photometric::RGB => {
                    *pixel = Pixel::rgb(q(samples[0]), q(samples[1]), q(samples[2]));
                    alpha_index = 3;
                },
                photometric::YCBCR => {
                    let center = q(1 << (bits - 1));
                    *pixel = ycbcr_to_rgb(q(samples[0]), q(samples[1]), q(samples[2]), center);
                    alpha_index = 3;
                },
                _ => {
                    *pixel = cmyk_to_rgb(q(samples[0]), q(samples[1]), q(samples[2]), q(samples[3]));
                    alpha_index = 4;
                },
            }
            if self.matte {
                pixel.opacity = MAX_RGB - q(samples[alpha_index]);
            }
        }
    }
}

/// Full-range BT.601 conversion; `center` is the quantum of a zero chroma sample
fn ycbcr_to_rgb(y: u16, cb: u16, cr: u16, center: u16) -> Pixel {
    let scale = MAX_RGB as f64;
    let center = center as f64;
    let (y, cb, cr) = (y as f64, cb as f64 - center, cr as f64 - center);
    let channel = |v: f64| v.round().clamp(0.0, scale) as u16;
    Pixel::rgb(
        channel(y + 1.402 * cr),
        channel(y - 0.344136 * cb - 0.714136 * cr),
        channel(y + 1.772 * cb),
    )
}

pub(crate) fn cmyk_to_rgb(c: u16, m: u16, y: u16, k: u16) -> Pixel {
    let scale = MAX_RGB as u32;
    let ink = |v: u16| ((scale - v as u32) * (scale - k as u32) / scale) as u16;
    Pixel::rgb(ink(c), ink(m), ink(y))
}
