//! Associated alpha conversion
//!
//! Associated (premultiplied) color channels hold `c * alpha`, with
//! `alpha = (MAX_RGB - opacity) / MAX_RGB`. Fully transparent pixels are
//! left alone when disassociating since their color is unrecoverable.

use crate::model::{Pixel, MAX_RGB};

fn alpha_of(pixel: &Pixel) -> f64 {
    (MAX_RGB - pixel.opacity) as f64 / MAX_RGB as f64
}

fn clamp_quantum(value: f64) -> u16 {
    value.round().clamp(0.0, MAX_RGB as f64) as u16
}

/// Premultiplies the color channels by alpha
pub fn associate_alpha(pixels: &mut [Pixel]) {
    for pixel in pixels.iter_mut().filter(|p| p.opacity != 0) {
        let alpha = alpha_of(pixel);
        pixel.red = clamp_quantum(pixel.red as f64 * alpha);
        pixel.green = clamp_quantum(pixel.green as f64 * alpha);
        pixel.blue = clamp_quantum(pixel.blue as f64 * alpha);
    }
}

/// Divides the color channels by alpha
pub fn disassociate_alpha(pixels: &mut [Pixel]) {
    for pixel in pixels.iter_mut().filter(|p| p.opacity != 0 && p.opacity != MAX_RGB) {
        let alpha = alpha_of(pixel);
        pixel.red = clamp_quantum(pixel.red as f64 / alpha);
        pixel.green = clamp_quantum(pixel.green as f64 / alpha);
        pixel.blue = clamp_quantum(pixel.blue as f64 / alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_transparent_premultiply() {
        let mut pixels = vec![Pixel { red: MAX_RGB, green: 32768, blue: 0, black: 0, opacity: 32768 }];
        associate_alpha(&mut pixels);
        assert_eq!(pixels[0].red, 32767);
        assert_eq!(pixels[0].blue, 0);

        disassociate_alpha(&mut pixels);
        assert!((pixels[0].red as i32 - MAX_RGB as i32).abs() <= 2);
        assert!((pixels[0].green as i32 - 32768).abs() <= 2);
    }

    #[test]
    fn test_opaque_pixels_unchanged() {
        let original = vec![Pixel::rgb(1, 30000, MAX_RGB)];
        let mut pixels = original.clone();
        associate_alpha(&mut pixels);
        assert_eq!(pixels, original);
        disassociate_alpha(&mut pixels);
        assert_eq!(pixels, original);
    }

    #[test]
    fn test_transparent_pixels_not_divided() {
        let mut pixels = vec![Pixel { red: 100, green: 0, blue: 0, black: 0, opacity: MAX_RGB }];
        disassociate_alpha(&mut pixels);
        assert_eq!(pixels[0].red, 100);
    }
}
