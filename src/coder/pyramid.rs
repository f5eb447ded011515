//! Reduced-resolution levels for pyramid output
//!
//! Each level halves the previous one with a 2x2 box average. Bilevel
//! images are point-sampled instead so they stay bilevel. Levels stop once
//! the shorter side would drop below `MIN_LEVEL_SIZE`.

use log::debug;

use crate::model::{Image, ImageList, Pixel, StorageClass, MAX_RGB};

/// Smallest side a reduction may have
pub const MIN_LEVEL_SIZE: u32 = 32;

fn is_bilevel(image: &Image) -> bool {
    image.pixels.iter().all(|p| p.is_gray() && (p.red == 0 || p.red == MAX_RGB))
}

fn average(samples: [u16; 4]) -> u16 {
    ((samples.iter().map(|&s| s as u32).sum::<u32>() + 2) / 4) as u16
}

/// Halves an image in both directions
///
/// The reduction is a direct-class copy of the image's metadata with the
/// resolution halved and the subfile type set to a reduced image.
pub fn reduce(image: &Image) -> Image {
    let columns = (image.columns / 2).max(1);
    let rows = (image.rows / 2).max(1);
    let point_sample = is_bilevel(image);

    let mut reduced = Image::new(columns, rows);
    reduced.depth = image.depth;
    reduced.colorspace = image.colorspace;
    reduced.matte = image.matte;
    reduced.storage_class = StorageClass::Direct;
    reduced.x_resolution = image.x_resolution / 2.0;
    reduced.y_resolution = image.y_resolution / 2.0;
    reduced.units = image.units;
    reduced.orientation = image.orientation;
    reduced.chromaticity = image.chromaticity;
    reduced.interlace = image.interlace;
    reduced.compression = image.compression;
    reduced.scene = image.scene;
    reduced.is_grayscale = image.is_grayscale;
    reduced.is_monochrome = image.is_monochrome;
    reduced.filename = image.filename.clone();
    if let Some(alpha) = image.attribute("alpha") {
        reduced.set_attribute("alpha", alpha);
    }
    reduced.set_attribute("subfiletype", "REDUCEDIMAGE");

    let width = image.columns as usize;
    let last_x = image.columns.saturating_sub(1) as usize;
    let last_y = image.rows.saturating_sub(1) as usize;
    let mut pixels = Vec::with_capacity(reduced.pixel_count());
    for y in 0..rows as usize {
        let (y0, y1) = ((2 * y).min(last_y), (2 * y + 1).min(last_y));
        for x in 0..columns as usize {
            let (x0, x1) = ((2 * x).min(last_x), (2 * x + 1).min(last_x));
            let p = [
                image.pixels[y0 * width + x0],
                image.pixels[y0 * width + x1],
                image.pixels[y1 * width + x0],
                image.pixels[y1 * width + x1],
            ];
            if point_sample {
                pixels.push(p[0]);
                continue;
            }
            pixels.push(Pixel {
                red: average([p[0].red, p[1].red, p[2].red, p[3].red]),
                green: average([p[0].green, p[1].green, p[2].green, p[3].green]),
                blue: average([p[0].blue, p[1].blue, p[2].blue, p[3].blue]),
                black: average([p[0].black, p[1].black, p[2].black, p[3].black]),
                opacity: average([p[0].opacity, p[1].opacity, p[2].opacity, p[3].opacity]),
            });
        }
    }
    reduced.pixels = pixels;
    reduced
}

/// Successive reductions of `image`, largest first
pub fn build_reductions(image: &Image) -> ImageList {
    let mut levels = ImageList::new();
    if image.pixels.len() != image.pixel_count() {
        return levels;
    }
    loop {
        let current = levels.last().unwrap_or(image);
        if current.columns.min(current.rows) / 2 < MIN_LEVEL_SIZE {
            break;
        }
        let reduced = reduce(current);
        debug!("Pyramid level {}: {}x{}", levels.len() + 1, reduced.columns, reduced.rows);
        levels.push(reduced);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_average() {
        let mut image = Image::filled(2, 2, Pixel::gray(0));
        image.pixels[0] = Pixel::rgb(100, 0, 0);
        image.pixels[3] = Pixel::rgb(300, 0, 0);
        image.x_resolution = 72.0;
        let reduced = reduce(&image);
        assert_eq!((reduced.columns, reduced.rows), (1, 1));
        assert_eq!(reduced.pixels[0].red, 100);
        assert_eq!(reduced.x_resolution, 36.0);
        assert_eq!(reduced.attribute("subfiletype"), Some("REDUCEDIMAGE"));
    }

    #[test]
    fn test_bilevel_is_point_sampled() {
        let mut image = Image::filled(2, 2, Pixel::gray(MAX_RGB));
        image.pixels[0] = Pixel::gray(0);
        assert_eq!(reduce(&image).pixels[0], Pixel::gray(0));
    }

    #[test]
    fn test_levels_stop_below_minimum() {
        let image = Image::filled(256, 200, Pixel::gray(7));
        let sizes: Vec<(u32, u32)> = build_reductions(&image).iter().map(|i| (i.columns, i.rows)).collect();
        assert_eq!(sizes, vec![(128, 100), (64, 50)]);
        assert!(build_reductions(&Image::filled(40, 40, Pixel::gray(0))).is_empty());
    }
}
