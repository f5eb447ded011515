//! Integration tests for encoding and decoding through the public API

use std::io::Cursor;

use tiffcoder::coder::{
    decode, encode, AlphaType, DecodeContext, DecodeOutcome, EncodeContext, ReadOptions, ResourceKind,
    ResourceLimiter, WriteOptions, STRATEGY_ATTRIBUTE,
};
use tiffcoder::io::byte_order::ByteOrder;
use tiffcoder::model::{Colorspace, CompressionType, Image, ImageList, Interlace, Pixel, StorageClass, MAX_RGB};
use tiffcoder::tiff::constants::{new_subfile_type, planar_config, tags};
use tiffcoder::tiff::errors::{ErrorCategory, TiffResult};
use tiffcoder::tiff::{TiffReaderBuilder, WarningContext, TIFF};
use tiffcoder::utils::config::CoderConfig;

const LOSSLESS: [CompressionType; 6] = [
    CompressionType::None,
    CompressionType::Lzw,
    CompressionType::Zip,
    CompressionType::Zstd,
    CompressionType::Lzma,
    CompressionType::Rle,
];

fn encode_context() -> EncodeContext {
    EncodeContext::with_limiter(CoderConfig::default(), ResourceLimiter::new())
}

fn decode_context() -> DecodeContext {
    DecodeContext::with_limiter(CoderConfig::default(), ResourceLimiter::new())
}

fn write(images: &ImageList, options: &WriteOptions) -> Vec<u8> {
    encode(images, Cursor::new(Vec::new()), options, &mut encode_context())
        .unwrap()
        .into_inner()
}

fn read_with(bytes: &[u8], options: &ReadOptions) -> TiffResult<DecodeOutcome> {
    decode(Cursor::new(bytes.to_vec()), options, &mut decode_context())
}

fn read(bytes: &[u8]) -> DecodeOutcome {
    read_with(bytes, &ReadOptions::default()).unwrap()
}

fn directories(bytes: &[u8]) -> TIFF {
    let mut cursor = Cursor::new(bytes.to_vec());
    TiffReaderBuilder::new().build().read(&mut cursor, &mut WarningContext::default()).unwrap()
}

fn level(value: usize) -> u16 {
    (value % 256) as u16 * 257
}

fn rgb_image(columns: u32, rows: u32) -> Image {
    let mut image = Image::new(columns, rows);
    image.pixels = (0..rows as usize)
        .flat_map(|y| (0..columns as usize).map(move |x| Pixel::rgb(level(x * 16), level(y * 16 + 1), level(x + y * 3 + 7))))
        .collect();
    image
}

/// Builds a little-endian classic TIFF with one directory of inline values
/// followed by `data`, which the StripOffsets entry points at.
fn craft_tiff(entries: &[(u16, u16, u32)], data: &[u8]) -> Vec<u8> {
    let mut entries = entries.to_vec();
    entries.sort_by_key(|e| e.0);
    let ifd_size = 2 + entries.len() * 12 + 4;
    let data_offset = (8 + ifd_size) as u32;

    let mut buffer = Vec::new();
    buffer.extend_from_slice(b"II");
    buffer.extend_from_slice(&42u16.to_le_bytes());
    buffer.extend_from_slice(&8u32.to_le_bytes());
    buffer.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for (tag, field_type, value) in entries {
        let value = if tag == tags::STRIP_OFFSETS || tag == tags::TILE_OFFSETS { data_offset } else { value };
        buffer.extend_from_slice(&tag.to_le_bytes());
        buffer.extend_from_slice(&field_type.to_le_bytes());
        buffer.extend_from_slice(&1u32.to_le_bytes());
        buffer.extend_from_slice(&value.to_le_bytes());
    }
    buffer.extend_from_slice(&0u32.to_le_bytes());
    buffer.extend_from_slice(data);
    buffer
}

fn deflate_gray_frame(width: u32, height: u32) -> Vec<u8> {
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    craft_tiff(&[
        (tags::IMAGE_WIDTH, LONG, width),
        (tags::IMAGE_LENGTH, LONG, height),
        (tags::BITS_PER_SAMPLE, SHORT, 8),
        (tags::COMPRESSION, SHORT, 8),
        (tags::PHOTOMETRIC_INTERPRETATION, SHORT, 1),
        (tags::STRIP_OFFSETS, LONG, 0),
        (tags::SAMPLES_PER_PIXEL, SHORT, 1),
        (tags::ROWS_PER_STRIP, LONG, height),
        (tags::STRIP_BYTE_COUNTS, LONG, 16),
    ], &[0x78; 16])
}

#[test]
fn test_rgb_round_trip_uncompressed() {
    let image = rgb_image(4, 4);
    let options = WriteOptions { compression: CompressionType::None, ..WriteOptions::default() };
    let outcome = read(&write(&vec![image.clone()], &options));

    assert_eq!(outcome.images.len(), 1);
    let decoded = &outcome.images[0];
    assert_eq!((decoded.columns, decoded.rows), (4, 4));
    assert_eq!(decoded.depth, 8);
    assert!(!decoded.matte);
    assert_eq!(decoded.pixels, image.pixels);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_lossless_schemes_round_trip() {
    let mut gray8 = Image::new(24, 10);
    gray8.pixels = (0..240).map(|i| Pixel::gray(level(i * 7))).collect();

    let mut gray16 = Image::new(24, 10);
    gray16.depth = 16;
    gray16.pixels = (0..240u32).map(|i| Pixel::gray((i * 271 + 3) as u16)).collect();

    let mut rgb16 = rgb_image(17, 9);
    rgb16.depth = 16;
    for (i, pixel) in rgb16.pixels.iter_mut().enumerate() {
        pixel.blue = (i as u16).wrapping_mul(383);
    }

    for scheme in LOSSLESS {
        let options = WriteOptions { compression: scheme, ..WriteOptions::default() };
        for original in [&gray8, &gray16, &rgb_image(33, 7), &rgb16] {
            let outcome = read(&write(&vec![original.clone()], &options));
            let decoded = &outcome.images[0];
            assert_eq!(decoded.compression, scheme);
            assert_eq!(decoded.depth, original.depth, "{} depth {}", scheme, original.depth);
            assert_eq!(decoded.pixels, original.pixels, "{} {}x{}", scheme, original.columns, original.rows);
        }
    }
}

#[test]
fn test_monochrome_round_trip() {
    let mut image = Image::new(13, 5);
    image.pixels = (0..65).map(|i| Pixel::gray(if i % 3 == 0 { 0 } else { MAX_RGB })).collect();

    for scheme in LOSSLESS {
        let options = WriteOptions { compression: scheme, ..WriteOptions::default() };
        let outcome = read(&write(&vec![image.clone()], &options));
        let decoded = &outcome.images[0];
        assert_eq!(decoded.depth, 1);
        assert_eq!(decoded.colorspace, Colorspace::Gray);
        assert!(decoded.is_monochrome);
        assert_eq!(decoded.pixels, image.pixels, "{}", scheme);
    }
}

#[test]
fn test_palette_round_trip() {
    let colormap: Vec<Pixel> = (0..20u16)
        .map(|i| Pixel::rgb(i * 3000 + 5, MAX_RGB - i * 3000, i * 1000 + 300))
        .collect();
    let mut image = Image::new(10, 6);
    image.storage_class = StorageClass::Palette;
    image.indexes = (0..60).map(|i| (i * 7 % 20) as u16).collect();
    image.pixels = image.indexes.iter().map(|&i| colormap[i as usize]).collect();
    image.colormap = colormap;

    for scheme in LOSSLESS {
        let options = WriteOptions { compression: scheme, ..WriteOptions::default() };
        let outcome = read(&write(&vec![image.clone()], &options));
        let decoded = &outcome.images[0];
        assert_eq!(decoded.storage_class, StorageClass::Palette);
        assert_eq!(decoded.indexes, image.indexes, "{}", scheme);
        assert_eq!(decoded.pixels, image.pixels, "{}", scheme);
    }
}

#[test]
fn test_cmyk_round_trip() {
    let mut image = Image::new(8, 8);
    image.colorspace = Colorspace::Cmyk;
    image.pixels = (0..64)
        .map(|i| Pixel { red: level(i * 3), green: level(i * 5), blue: level(255 - i), black: level(i * 2), opacity: 0 })
        .collect();

    for scheme in LOSSLESS {
        let options = WriteOptions { compression: scheme, ..WriteOptions::default() };
        let outcome = read(&write(&vec![image.clone()], &options));
        let decoded = &outcome.images[0];
        assert_eq!(decoded.colorspace, Colorspace::Cmyk);
        assert_eq!(decoded.pixels, image.pixels, "{}", scheme);
    }
}

#[test]
fn test_associated_alpha_round_trip() {
    let mut image = rgb_image(6, 6);
    image.depth = 16;
    image.matte = true;
    for pixel in image.pixels.iter_mut() {
        pixel.opacity = 32768;
    }
    let options = WriteOptions { alpha: Some(AlphaType::Associated), ..WriteOptions::default() };
    let outcome = read(&write(&vec![image.clone()], &options));

    let decoded = &outcome.images[0];
    assert!(decoded.matte);
    assert_eq!(decoded.attribute("alpha"), Some("associated"));
    for (got, want) in decoded.pixels.iter().zip(&image.pixels) {
        assert!((got.opacity as i32 - want.opacity as i32).abs() <= 1);
        for (g, w) in [(got.red, want.red), (got.green, want.green), (got.blue, want.blue)] {
            assert!((g as i32 - w as i32).abs() <= 64, "{} vs {}", g, w);
        }
    }
}

#[test]
fn test_associated_alpha_at_eight_bits() {
    let mut image = rgb_image(4, 4);
    image.matte = true;
    for pixel in image.pixels.iter_mut() {
        pixel.opacity = MAX_RGB - 128 * 257;
    }
    let bytes = write(&vec![image.clone()], &WriteOptions { alpha: Some(AlphaType::Associated), ..WriteOptions::default() });

    let stored = read_with(&bytes, &ReadOptions { alpha: Some(AlphaType::Unassociated), ..ReadOptions::default() })
        .unwrap();
    let decoded = read(&bytes);
    let decoded = &decoded.images[0];
    assert!(decoded.matte);
    assert_eq!(decoded.depth, 8);

    for ((got, associated), want) in decoded.pixels.iter().zip(&stored.images[0].pixels).zip(&image.pixels) {
        let alpha = (MAX_RGB - got.opacity) as f64 / MAX_RGB as f64;
        assert!((alpha - 0.5).abs() < 0.01);
        for (g, a, w) in [(got.red, associated.red, want.red), (got.green, associated.green, want.green),
                          (got.blue, associated.blue, want.blue)] {
            let expected = (a as f64 / alpha).min(MAX_RGB as f64);
            assert!((g as f64 - expected).abs() <= 1.0, "{} vs {}", g, expected);
            assert!((g as i32 - w as i32).abs() <= 2 * 257, "{} vs {}", g, w);
        }
    }
}

#[test]
fn test_planar_separate_round_trip() {
    let mut image = rgb_image(10, 7);
    image.interlace = Interlace::Plane;
    let options = WriteOptions { compression: CompressionType::Zip, ..WriteOptions::default() };
    let bytes = write(&vec![image.clone()], &options);

    let ifd = directories(&bytes).main_ifd().cloned().unwrap();
    assert_eq!(ifd.get_u64(tags::PLANAR_CONFIGURATION), Some(planar_config::SEPARATE as u64));
    assert_eq!(ifd.get_value(tags::STRIP_OFFSETS).unwrap().count() % 3, 0);

    let outcome = read(&bytes);
    let decoded = &outcome.images[0];
    assert_eq!(decoded.interlace, Interlace::Plane);
    assert_eq!(decoded.pixels, image.pixels);
}

#[test]
fn test_planar_separate_alpha_is_disassociated() {
    let mut image = rgb_image(8, 5);
    image.depth = 16;
    image.matte = true;
    image.interlace = Interlace::Plane;
    for pixel in image.pixels.iter_mut() {
        pixel.opacity = 16384;
    }
    let options = WriteOptions { alpha: Some(AlphaType::Associated), ..WriteOptions::default() };
    let outcome = read(&write(&vec![image.clone()], &options));

    let decoded = &outcome.images[0];
    assert!(decoded.matte);
    assert_eq!(decoded.interlace, Interlace::Plane);
    for (got, want) in decoded.pixels.iter().zip(&image.pixels) {
        assert!((got.opacity as i32 - want.opacity as i32).abs() <= 1);
        for (g, w) in [(got.red, want.red), (got.green, want.green), (got.blue, want.blue)] {
            assert!((g as i32 - w as i32).abs() <= 4, "{} vs {}", g, w);
        }
    }
}

#[test]
fn test_webp_round_trip() {
    let image = rgb_image(16, 12);
    let options = WriteOptions { compression: CompressionType::WebP, ..WriteOptions::default() };
    let bytes = write(&vec![image.clone()], &options);
    assert_eq!(directories(&bytes).main_ifd().unwrap().get_u64(tags::COMPRESSION), Some(50001));

    let outcome = read(&bytes);
    assert_eq!(outcome.images[0].compression, CompressionType::WebP);
    assert_eq!(outcome.images[0].pixels, image.pixels);
}

#[test]
fn test_large_strip_reads_by_scanline() {
    let image = rgb_image(600, 200);
    let options = WriteOptions { compression: CompressionType::None, strip_per_page: true, ..WriteOptions::default() };
    let outcome = read(&write(&vec![image.clone()], &options));

    let decoded = &outcome.images[0];
    assert_eq!(decoded.attribute(STRATEGY_ATTRIBUTE), Some("scanline"));
    assert_eq!(decoded.pixels, image.pixels);
}

#[test]
fn test_subsampled_ycbcr_uses_generic_path() {
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    // Two 2x2 chroma blocks: four luma samples, then Cb and Cr
    let bytes = craft_tiff(&[
        (tags::IMAGE_WIDTH, LONG, 4),
        (tags::IMAGE_LENGTH, LONG, 2),
        (tags::BITS_PER_SAMPLE, SHORT, 8),
        (tags::COMPRESSION, SHORT, 1),
        (tags::PHOTOMETRIC_INTERPRETATION, SHORT, 6),
        (tags::STRIP_OFFSETS, LONG, 0),
        (tags::SAMPLES_PER_PIXEL, SHORT, 3),
        (tags::ROWS_PER_STRIP, LONG, 2),
        (tags::STRIP_BYTE_COUNTS, LONG, 12),
    ], &[10, 20, 30, 40, 128, 128, 200, 210, 220, 230, 128, 128]);

    let outcome = read(&bytes);
    let decoded = &outcome.images[0];
    assert_eq!(decoded.attribute(STRATEGY_ATTRIBUTE), Some("generic stripped"));
    let levels: Vec<u16> = decoded.pixels.iter().map(|p| p.red / 257).collect();
    assert_eq!(levels, vec![10, 20, 200, 210, 30, 40, 220, 230]);
    assert!(decoded.pixels.iter().all(|p| p.is_gray()));
}

#[test]
fn test_double_gray_with_extra_samples() {
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    let samples = [0.25f64, 9.0, 9.0, 0.75, 9.0, 9.0];
    let data: Vec<u8> = samples.iter().flat_map(|v| v.to_le_bytes()).collect();
    let bytes = craft_tiff(&[
        (tags::IMAGE_WIDTH, LONG, 2),
        (tags::IMAGE_LENGTH, LONG, 1),
        (tags::BITS_PER_SAMPLE, SHORT, 64),
        (tags::COMPRESSION, SHORT, 1),
        (tags::PHOTOMETRIC_INTERPRETATION, SHORT, 1),
        (tags::STRIP_OFFSETS, LONG, 0),
        (tags::SAMPLES_PER_PIXEL, SHORT, 3),
        (tags::ROWS_PER_STRIP, LONG, 1),
        (tags::STRIP_BYTE_COUNTS, LONG, 48),
        (tags::SAMPLE_FORMAT, SHORT, 3),
    ], &data);

    let outcome = read(&bytes);
    let decoded = &outcome.images[0];
    assert!(!decoded.matte);
    assert_eq!(decoded.pixels, vec![Pixel::gray(16384), Pixel::gray(49151)]);
}

#[test]
fn test_cancelled_decode() {
    let bytes = write(&vec![rgb_image(8, 8)], &WriteOptions::default());
    let mut context = decode_context().with_monitor(Box::new(|_, _, _| false));
    let err = decode(Cursor::new(bytes), &ReadOptions::default(), &mut context).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Cancelled);
}

#[test]
fn test_tiled_output() {
    let image = rgb_image(100, 100);
    let options = WriteOptions {
        compression: CompressionType::Zip,
        tile_geometry: Some((32, 32)),
        ..WriteOptions::default()
    };
    let bytes = write(&vec![image.clone()], &options);

    let tiff = directories(&bytes);
    let ifd = tiff.main_ifd().unwrap();
    assert!(ifd.is_tiled());
    assert_eq!(ifd.get_value(tags::TILE_OFFSETS).unwrap().count(), 16);
    assert_eq!(ifd.get_value(tags::TILE_BYTE_COUNTS).unwrap().count(), 16);

    let outcome = read(&bytes);
    assert_eq!(outcome.images[0].attribute(STRATEGY_ATTRIBUTE), Some("tiled"));
    assert_eq!(outcome.images[0].pixels, image.pixels);
}

#[test]
fn test_jpeg_within_tolerance() {
    let mut image = Image::new(64, 48);
    image.pixels = (0..48u32)
        .flat_map(|y| (0..64u32).map(move |x| Pixel::rgb((x * 1000) as u16, (y * 1300) as u16, 30000)))
        .collect();
    let options = WriteOptions { compression: CompressionType::Jpeg, quality: Some(90), ..WriteOptions::default() };
    let outcome = read(&write(&vec![image.clone()], &options));

    let decoded = &outcome.images[0];
    assert_eq!(decoded.colorspace, Colorspace::Rgb);
    assert_eq!(decoded.pixels.len(), image.pixels.len());
    let total: f64 = decoded.pixels.iter().zip(&image.pixels)
        .map(|(a, b)| {
            [(a.red, b.red), (a.green, b.green), (a.blue, b.blue)].iter()
                .map(|&(x, y)| (x as f64 - y as f64).abs() / MAX_RGB as f64)
                .sum::<f64>()
        })
        .sum();
    let mean = total / (image.pixels.len() * 3) as f64;
    assert!(mean <= 0.06, "mean error {}", mean);
}

#[test]
fn test_pyramid_levels() {
    let image = rgb_image(256, 200);
    let options = WriteOptions { pyramid: true, ..WriteOptions::default() };
    let bytes = write(&vec![image], &options);

    let tiff = directories(&bytes);
    assert_eq!(tiff.ifd_count(), 3);
    assert_eq!(tiff.reduced_images().len(), 2);
    assert_eq!(tiff.ifds[1].get_u64(tags::NEW_SUBFILE_TYPE), Some(new_subfile_type::REDUCED_IMAGE as u64));

    let outcome = read(&bytes);
    let sizes: Vec<(u32, u32)> = outcome.images.iter().map(|i| (i.columns, i.rows)).collect();
    assert_eq!(sizes, vec![(256, 200), (128, 100), (64, 50)]);
}

#[test]
fn test_bigtiff_big_endian_frames() {
    let images = vec![rgb_image(9, 5), rgb_image(3, 12)];
    let options = WriteOptions {
        big_tiff: true,
        byte_order: ByteOrder::BigEndian,
        compression: CompressionType::Lzw,
        ..WriteOptions::default()
    };
    let bytes = write(&images, &options);
    assert_eq!(&bytes[..4], b"MM\0+");

    let outcome = read(&bytes);
    assert_eq!(outcome.images.len(), 2);
    assert_eq!(outcome.images[1].scene, 1);
    assert_eq!(outcome.images[1].pixels, images[1].pixels);

    let second_only = ReadOptions { subimage: 1, subrange: 1, ..ReadOptions::default() };
    let outcome = read_with(&bytes, &second_only).unwrap();
    assert_eq!(outcome.images.len(), 1);
    assert_eq!((outcome.images[0].columns, outcome.images[0].rows), (3, 12));
}

#[test]
fn test_ping_reports_strategy_without_pixels() {
    let bytes = write(&vec![rgb_image(20, 20)], &WriteOptions::default());
    let options = ReadOptions { ping: true, ..ReadOptions::default() };
    let outcome = read_with(&bytes, &options).unwrap();

    let image = &outcome.images[0];
    assert_eq!((image.columns, image.rows), (20, 20));
    assert!(image.pixels.is_empty());
    assert_eq!(image.attribute(STRATEGY_ATTRIBUTE), Some("stripped"));
}

#[test]
fn test_corrupt_second_frame_is_dropped() {
    let first = Image::filled(4, 4, Pixel::gray(level(40)));
    let second = Image::filled(4, 4, Pixel::gray(level(90)));
    let options = WriteOptions { byte_order: ByteOrder::LittleEndian, ..WriteOptions::default() };
    let mut bytes = write(&vec![first.clone(), second], &options);

    // Zero the BitsPerSample value held inline in the second directory
    let offset = directories(&bytes).ifds[1].offset as usize;
    let count = u16::from_le_bytes([bytes[offset], bytes[offset + 1]]) as usize;
    let entry = (0..count)
        .map(|i| offset + 2 + i * 12)
        .find(|&at| u16::from_le_bytes([bytes[at], bytes[at + 1]]) == tags::BITS_PER_SAMPLE)
        .unwrap();
    bytes[entry + 8] = 0;
    bytes[entry + 9] = 0;

    let outcome = read(&bytes);
    assert_eq!(outcome.images.len(), 1);
    assert_eq!(outcome.images[0].pixels, first.pixels);
    assert!(outcome.warnings.iter().any(|w| w.code == "frame-dropped"));
}

#[test]
fn test_memory_limit_refuses_huge_frame() {
    let bytes = deflate_gray_frame(10000, 10000);
    let limiter = ResourceLimiter::new();
    limiter.set_limit(ResourceKind::Memory, Some(16 * 1024 * 1024));
    let mut context = DecodeContext::with_limiter(CoderConfig::default(), limiter.clone());

    let err = decode(Cursor::new(bytes), &ReadOptions::default(), &mut context).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Resource);
    assert_eq!(limiter.usage(ResourceKind::Memory), 0);
}

#[test]
fn test_strict_context_does_not_leak_into_later_decodes() {
    let bytes = write(&vec![rgb_image(64, 64)], &WriteOptions::default());
    let strict = CoderConfig { memory_limit: Some(1024), ..CoderConfig::default() };
    let err = decode(Cursor::new(bytes.clone()), &ReadOptions::default(), &mut DecodeContext::new(strict))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Resource);

    let mut relaxed = DecodeContext::new(CoderConfig::default());
    let outcome = decode(Cursor::new(bytes), &ReadOptions::default(), &mut relaxed).unwrap();
    assert_eq!(outcome.images.len(), 1);
}

#[test]
fn test_compression_bomb_is_structural() {
    let bytes = deflate_gray_frame(400_000, 1);
    let err = read_with(&bytes, &ReadOptions::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
}

#[test]
fn test_compression_bomb_in_one_large_strip() {
    let bytes = deflate_gray_frame(100_000, 500);
    let ping = read_with(&bytes, &ReadOptions { ping: true, ..ReadOptions::default() }).unwrap();
    assert_eq!(ping.images[0].attribute(STRATEGY_ATTRIBUTE), Some("scanline"));

    let err = read_with(&bytes, &ReadOptions::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
}

#[test]
fn test_hostile_tile_width_is_structural() {
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    let bytes = craft_tiff(&[
        (tags::IMAGE_WIDTH, LONG, 16),
        (tags::IMAGE_LENGTH, LONG, 16),
        (tags::BITS_PER_SAMPLE, SHORT, 8),
        (tags::COMPRESSION, SHORT, 1),
        (tags::PHOTOMETRIC_INTERPRETATION, SHORT, 1),
        (tags::SAMPLES_PER_PIXEL, SHORT, 1),
        (tags::TILE_WIDTH, LONG, 0xFFFF_FFF0),
        (tags::TILE_LENGTH, LONG, 16),
        (tags::TILE_OFFSETS, LONG, 0),
        (tags::TILE_BYTE_COUNTS, LONG, 256),
    ], &[0x40; 256]);
    let err = read_with(&bytes, &ReadOptions::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
}

#[test]
fn test_not_a_tiff() {
    let err = read_with(b"GIF89a not a tiff stream", &ReadOptions::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
}
