//! TIFF encoding
//!
//! `encode` writes frames in order. For every frame the output format is
//! settled first (photometric, bit depth, samples, alpha, compression and
//! chunk layout) from the image's characteristics and the write options.
//! The pixels are then exported and encoded chunk by chunk, and the
//! directory describing the chunks is written last.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use log::{debug, info, warn};

use crate::codec::rgba::cmyk_to_rgb;
use crate::codec::{ChunkEncoder, ChunkLayout};
use crate::coder::context::EncodeContext;
use crate::coder::limits::{LimitedBuffer, ResourceKind};
use crate::coder::options::{AlphaType, OutputType, WriteOptions};
use crate::coder::profiles;
use crate::coder::pyramid;
use crate::compression::{CodecParams, CompressionFactory};
use crate::io::byte_order::ByteOrder;
use crate::model::{
    Colorspace, CompressionType, Image, ImageList, Interlace, Pixel, ResolutionUnits, StorageClass, MAX_RGB,
};
use crate::quantum::swab::normalize_samples;
use crate::quantum::{
    associate_alpha, classify, expand_samples, export_pixels, CompressionDescriptor, ExportOptions, SampleType,
    TransferMode,
};
use crate::tiff::builder::DirectoryBuilder;
use crate::tiff::builders::exif::{parse_exif_profile, pointer_placeholder, write_private_directories, ExifDirectories};
use crate::tiff::builders::writer::TiffStreamWriter;
use crate::tiff::constants::{
    compression, extra_samples, fill_order, ink_set, limits, new_subfile_type, photometric, planar_config,
    predictor, resolution_unit, sample_format, tags,
};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::TagValue;
use crate::utils::tiff_code_translators::{compression_code_to_name, photometric_code_to_name, predictor_code_to_name};

const SAVE_TASK: &str = "Save image";

/// Value of the Software tag
pub const SOFTWARE: &str = "tiffcoder";

/// Tile side used for pyramid output when no tile geometry is given
const DEFAULT_TILE_SIZE: u32 = 256;

/// Encodes `images` as a TIFF stream
///
/// # Arguments
/// * `images` - Frames to write; only the first unless `options.adjoin`
/// * `stream` - Destination, written from its current position
/// * `options` - Output format choices
/// * `context` - Warning sink, resource limiter and progress monitor
///
/// # Returns
/// The stream, flushed, once every frame and directory is written
pub fn encode<W: Write + Seek>(images: &ImageList, stream: W, options: &WriteOptions,
                               context: &mut EncodeContext) -> TiffResult<W> {
    let frames: Vec<&Image> = if options.adjoin {
        images.iter().collect()
    } else {
        images.iter().take(1).collect()
    };
    if frames.is_empty() {
        return Err(TiffError::structural("No frames to encode"));
    }
    if frames.len() < images.len() {
        debug!("Adjoin disabled, writing 1 of {} frames", images.len());
    }

    let pages = frames.len();
    let mut writer = TiffStreamWriter::new(stream, options.big_tiff, options.byte_order)?;
    let mut written = 0;
    for (page, image) in frames.into_iter().enumerate() {
        write_frame(&mut writer, &FrameJob { image: Cow::Borrowed(image), page, pages, reduced: false },
                    options, context)?;
        written += 1;
        if options.pyramid {
            for reduction in pyramid::build_reductions(image) {
                write_frame(&mut writer, &FrameJob { image: Cow::Owned(reduction), page, pages, reduced: true },
                            options, context)?;
                written += 1;
            }
        }
    }
    info!("Encoded {} frame(s) into {} directories", pages, written);
    writer.finish()
}

/// Encodes `images` into a file, removing it again when encoding fails
pub fn encode_file<P: AsRef<Path>>(images: &ImageList, path: P, options: &WriteOptions,
                                   context: &mut EncodeContext) -> TiffResult<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let result = encode(images, BufWriter::new(file), options, context)
        .and_then(|stream| stream.into_inner().map_err(|e| TiffError::IoError(e.into_error())));

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            warn!("Writing {} failed, removing partial output: {}", path.display(), e);
            if let Err(remove) = fs::remove_file(path) {
                warn!("Could not remove {}: {}", path.display(), remove);
            }
            Err(e)
        }
    }
}

/// One directory to write
struct FrameJob<'a> {
    image: Cow<'a, Image>,
    /// Page index of the frame the directory belongs to
    page: usize,
    pages: usize,
    /// A pyramid reduction of the page
    reduced: bool,
}

/// What the writer learns about an image before choosing a format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Characteristics {
    is_cmyk: bool,
    is_grayscale: bool,
    is_monochrome: bool,
    is_palette: bool,
    is_opaque: bool,
}

fn characterize(image: &Image) -> Characteristics {
    let is_cmyk = image.colorspace == Colorspace::Cmyk;
    let is_palette = image.storage_class == StorageClass::Palette
        && !image.colormap.is_empty()
        && image.colormap.len() <= limits::MAX_COLORMAP_SIZE
        && image.indexes.len() == image.pixel_count();
    let is_grayscale = !is_cmyk
        && (image.colorspace == Colorspace::Gray || image.pixels.iter().all(Pixel::is_gray));
    let is_monochrome = is_grayscale && image.pixels.iter().all(|p| p.red == 0 || p.red == MAX_RGB);
    Characteristics { is_cmyk, is_grayscale, is_monochrome, is_palette, is_opaque: image.is_opaque() }
}

/// Pixel conversion needed before export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    None,
    RgbToCmyk,
    CmykToRgb,
}

/// Every output decision for one frame
#[derive(Debug, Clone)]
struct FramePlan {
    scheme: u16,
    photometric: u16,
    bits_per_sample: u16,
    samples_per_pixel: u16,
    sample_type: SampleType,
    matte: bool,
    alpha: AlphaType,
    /// The image had alpha that the scheme cannot carry
    alpha_dropped: bool,
    separate: bool,
    predictor: u16,
    conversion: Conversion,
    tile: Option<(u32, u32)>,
    rows_per_strip: u32,
    params: CodecParams,
}

impl FramePlan {
    fn layout(&self, image: &Image) -> ChunkLayout {
        match self.tile {
            Some((width, height)) => ChunkLayout::tiled(image.columns, image.rows, self.bits_per_sample,
                                                        self.samples_per_pixel, self.separate, width, height),
            None => ChunkLayout::stripped(image.columns, image.rows, self.bits_per_sample,
                                          self.samples_per_pixel, self.separate, self.rows_per_strip),
        }
    }

    /// Samples carrying color, without alpha or extra samples
    fn color_samples(&self) -> u16 {
        color_samples(self.photometric)
    }

    /// Descriptor the export modes are classified from
    fn descriptor(&self) -> CompressionDescriptor {
        CompressionDescriptor {
            compression: self.scheme,
            photometric: self.photometric,
            sample_format: match self.sample_type {
                SampleType::Unsigned => sample_format::UINT,
                SampleType::Signed => sample_format::INT,
                SampleType::Float => sample_format::IEEEFP,
            },
            samples_per_pixel: self.samples_per_pixel,
            bits_per_sample: self.bits_per_sample,
            planar_config: if self.separate { planar_config::SEPARATE } else { planar_config::CONTIG },
        }
    }
}

fn color_samples(photometric: u16) -> u16 {
    match photometric {
        photometric::MINISWHITE | photometric::MINISBLACK | photometric::PALETTE => 1,
        photometric::SEPARATED => 4,
        _ => 3,
    }
}

/// The scheme id a compression type is written with
fn compression_scheme(kind: CompressionType) -> u16 {
    match kind {
        CompressionType::Undefined | CompressionType::None => compression::NONE,
        CompressionType::Fax => compression::CCITT_FAX3,
        CompressionType::Group4 => compression::CCITT_FAX4,
        CompressionType::Jpeg => compression::JPEG,
        CompressionType::Lzw => compression::LZW,
        CompressionType::Rle => compression::PACKBITS,
        CompressionType::Zip => compression::DEFLATE,
        CompressionType::Zstd => compression::ZSTD,
        CompressionType::Lzma => compression::LZMA,
        CompressionType::Jbig => compression::JBIG,
        CompressionType::WebP => compression::WEBP,
    }
}

fn is_bilevel_scheme(scheme: u16) -> bool {
    matches!(scheme, compression::CCITT_RLE | compression::CCITT_FAX3 | compression::CCITT_FAX4 | compression::JBIG)
}

fn depth_bits(depth: u16) -> u16 {
    if depth > 8 { 16 } else { 8 }
}

fn palette_bits(colors: usize) -> u16 {
    match colors {
        0..=2 => 1,
        3..=4 => 2,
        5..=16 => 4,
        17..=256 => 8,
        _ => 16,
    }
}

fn round_up_16(value: u32) -> u32 {
    (value.max(1) + 15) / 16 * 16
}

/// Shrinks a requested tile extent that would dwarf the frame
fn fit_tile(extent: u32, frame: u32) -> u32 {
    let padded = round_up_16(frame);
    if extent > padded.max(limits::MAX_TILE_OVERHANG) { padded } else { extent }
}

/// Codec parameters derived from the quality setting
fn codec_params(quality: Option<u8>) -> CodecParams {
    let quality = quality.unwrap_or(limits::DEFAULT_QUALITY).min(100);
    CodecParams {
        zip_level: (quality as u32 / 10).clamp(1, 9),
        zstd_level: (quality as i32 * 9 / 75).clamp(1, 22),
        lzma_preset: (quality as u32 / 10).clamp(1, 9),
        jpeg_quality: quality.max(1),
        ..CodecParams::default()
    }
}

/// Settles the output format of one frame
///
/// Decisions are made in a fixed order: a default photometric from the
/// image's characteristics, the output type override, the bit depth
/// override, what the compression scheme can carry, then samples,
/// predictor and layout.
fn plan_frame(image: &Image, options: &WriteOptions, bytes_per_strip: u64) -> FramePlan {
    let traits = characterize(image);
    let requested = match options.compression {
        CompressionType::Undefined => image.compression,
        other => other,
    };
    let scheme = compression_scheme(requested);
    let mut matte = image.matte;

    let (mut photometric, mut bits) = if traits.is_cmyk {
        (photometric::SEPARATED, depth_bits(image.depth))
    } else if traits.is_grayscale && traits.is_monochrome && !matte {
        (photometric::MINISWHITE, 1)
    } else if traits.is_grayscale {
        (photometric::MINISBLACK, depth_bits(image.depth))
    } else if traits.is_palette {
        (photometric::PALETTE, palette_bits(image.colormap.len()))
    } else {
        (photometric::RGB, depth_bits(image.depth))
    };

    if let Some(output) = options.output_type {
        matte = output.has_matte();
        match output {
            OutputType::Bilevel => {
                photometric = photometric::MINISWHITE;
                bits = 1;
            },
            OutputType::Grayscale | OutputType::GrayscaleMatte => {
                photometric = photometric::MINISBLACK;
                bits = depth_bits(image.depth);
            },
            OutputType::Palette | OutputType::PaletteMatte if traits.is_palette => {
                photometric = photometric::PALETTE;
                bits = palette_bits(image.colormap.len());
            },
            OutputType::Palette | OutputType::PaletteMatte => {
                warn!("Palette output needs a palette image, keeping {}",
                      photometric_code_to_name(photometric as u64));
            },
            OutputType::TrueColor | OutputType::TrueColorMatte => {
                photometric = photometric::RGB;
                bits = depth_bits(image.depth);
            },
            OutputType::ColorSeparation | OutputType::ColorSeparationMatte => {
                photometric = photometric::SEPARATED;
                bits = depth_bits(image.depth);
            },
        }
    }

    let mut sample_type = options.sample_type;
    if let Some(requested) = options.bits_per_sample {
        let needed = if photometric == photometric::PALETTE { palette_bits(image.colormap.len()) } else { 1 };
        if requested < needed || requested > 32 {
            debug!("Ignoring {} bits per sample for {} output", requested,
                   photometric_code_to_name(photometric as u64));
        } else {
            bits = requested;
        }
    }

    let mut alpha_dropped = false;
    match scheme {
        s if is_bilevel_scheme(s) => {
            alpha_dropped = matte;
            matte = false;
            photometric = photometric::MINISWHITE;
            bits = 1;
            sample_type = SampleType::Unsigned;
        },
        compression::JPEG => {
            alpha_dropped = matte;
            matte = false;
            photometric = match photometric {
                photometric::PALETTE | photometric::SEPARATED => photometric::RGB,
                photometric::MINISWHITE => photometric::MINISBLACK,
                other => other,
            };
            bits = 8;
            sample_type = SampleType::Unsigned;
        },
        compression::WEBP => {
            photometric = photometric::RGB;
            bits = 8;
            sample_type = SampleType::Unsigned;
        },
        _ => {},
    }
    if alpha_dropped {
        debug!("{} cannot carry alpha, dropping the matte channel", compression_code_to_name(scheme as u64));
    }

    if sample_type == SampleType::Float {
        if photometric == photometric::PALETTE {
            debug!("Palette indexes are written as unsigned integers");
            sample_type = SampleType::Unsigned;
        } else if !matches!(bits, 16 | 32 | 64) {
            bits = 32;
        }
    }

    let alpha = if matte {
        options.alpha
            .or_else(|| image.attribute("alpha").and_then(AlphaType::from_name))
            .unwrap_or(AlphaType::Unassociated)
    } else {
        AlphaType::Unspecified
    };

    let conversion = match (traits.is_cmyk, photometric == photometric::SEPARATED) {
        (false, true) => Conversion::RgbToCmyk,
        (true, false) => Conversion::CmykToRgb,
        _ => Conversion::None,
    };

    let separate = image.interlace == Interlace::Plane
        && !matches!(scheme, compression::JPEG | compression::WEBP);
    if scheme == compression::JPEG && photometric == photometric::RGB && !separate {
        photometric = photometric::YCBCR;
    }

    let base_samples = color_samples(photometric) + matte as u16;
    let mut samples_per_pixel = base_samples;
    if let Some(requested) = options.samples_per_pixel {
        if requested > base_samples && requested <= limits::MAX_SAMPLES && bits <= 32
            && !matches!(scheme, compression::JPEG | compression::WEBP) {
            debug!("Adding {} unspecified extra samples", requested - base_samples);
            samples_per_pixel = requested;
        } else if requested != base_samples {
            debug!("Ignoring {} samples per pixel, writing {}", requested, base_samples);
        }
    }

    let predictor = choose_predictor(options.predictor, scheme, photometric, bits, sample_type);

    let tile = options.tile_geometry.map(|(w, h)| (fit_tile(w, image.columns), fit_tile(h, image.rows)))
        .or_else(|| options.pyramid.then(|| {
        (DEFAULT_TILE_SIZE.min(round_up_16(image.columns)), DEFAULT_TILE_SIZE.min(round_up_16(image.rows)))
    }));

    let rows_per_strip = if tile.is_some() {
        image.rows.max(1)
    } else {
        choose_rows_per_strip(image, options, scheme, bits, samples_per_pixel, separate, bytes_per_strip)
    };

    let mut params = codec_params(options.quality);
    if scheme == compression::WEBP && !options.webp_lossless {
        debug!("Lossy WebP is not available, writing lossless");
    }
    params.samples = samples_per_pixel;

    FramePlan {
        scheme,
        photometric,
        bits_per_sample: bits,
        samples_per_pixel,
        sample_type,
        matte,
        alpha,
        alpha_dropped: alpha_dropped && !traits.is_opaque,
        separate,
        predictor,
        conversion,
        tile,
        rows_per_strip,
        params,
    }
}

fn choose_predictor(requested: Option<u16>, scheme: u16, photometric: u16, bits: u16,
                    sample_type: SampleType) -> u16 {
    let differencing = matches!(scheme, compression::LZW | compression::DEFLATE | compression::ZSTD | compression::LZMA);
    match requested {
        Some(predictor::HORIZONTAL) if differencing && matches!(bits, 8 | 16 | 32) => predictor::HORIZONTAL,
        Some(predictor::NONE) => predictor::NONE,
        Some(other) => {
            warn!("{} predictor unavailable for {}-bit {}, writing without", predictor_code_to_name(other as u64),
                  bits, compression_code_to_name(scheme as u64));
            predictor::NONE
        },
        None if differencing && sample_type != SampleType::Float
            && matches!(photometric, photometric::RGB | photometric::MINISBLACK)
            && matches!(bits, 8 | 16) => predictor::HORIZONTAL,
        None => predictor::NONE,
    }
}

fn choose_rows_per_strip(image: &Image, options: &WriteOptions, scheme: u16, bits: u16, samples: u16,
                         separate: bool, bytes_per_strip: u64) -> u32 {
    let rows = image.rows.max(1);
    let target = if is_bilevel_scheme(scheme) { bytes_per_strip * 4 } else { bytes_per_strip };
    let mut rows_per_strip = ChunkLayout::stripped(image.columns, rows, bits, samples, separate, 1)
        .default_strip_rows(target);
    if rows / rows_per_strip > limits::MAX_STRIPS {
        rows_per_strip = (rows / (limits::MAX_STRIPS + 1)).max(1);
    }
    if let Some(requested) = options.rows_per_strip {
        rows_per_strip = requested.clamp(1, rows);
    }
    if options.strip_per_page {
        rows_per_strip = rows;
    }
    if scheme == compression::JPEG {
        rows_per_strip = round_up_16(rows_per_strip);
    }
    rows_per_strip
}

fn rgb_to_cmyk(pixel: &Pixel) -> Pixel {
    let scale = MAX_RGB as f64;
    let (c, m, y) = (1.0 - pixel.red as f64 / scale, 1.0 - pixel.green as f64 / scale, 1.0 - pixel.blue as f64 / scale);
    let k = c.min(m).min(y);
    let ink = |v: f64| if k >= 1.0 { 0 } else { ((v - k) / (1.0 - k) * scale).round() as u16 };
    Pixel { red: ink(c), green: ink(m), blue: ink(y), black: (k * scale).round() as u16, opacity: pixel.opacity }
}

fn convert_pixels<'a>(image: &'a Image, conversion: Conversion) -> Cow<'a, [Pixel]> {
    match conversion {
        Conversion::None => Cow::Borrowed(image.pixels.as_slice()),
        Conversion::RgbToCmyk => Cow::Owned(image.pixels.iter().map(rgb_to_cmyk).collect()),
        Conversion::CmykToRgb => Cow::Owned(image.pixels.iter()
            .map(|p| Pixel { opacity: p.opacity, ..cmyk_to_rgb(p.red, p.green, p.blue, p.black) })
            .collect()),
    }
}

/// Exports pixel runs into chunk rows
struct RowExporter<'a> {
    pixels: Cow<'a, [Pixel]>,
    indexes: &'a [u16],
    width: usize,
    options: ExportOptions,
    associate: bool,
    /// Samples per pixel stored in one chunk
    stored_samples: u16,
}

impl RowExporter<'_> {
    /// Exports `columns` pixels of row `y`, starting at column `x`
    ///
    /// Planes without a transfer mode are extra samples and stay zero.
    fn export(&self, mode: Option<TransferMode>, y: u32, x: u32, columns: u32, out: &mut [u8]) -> TiffResult<()> {
        let Some(mode) = mode else { return Ok(()) };
        let start = y as usize * self.width + x as usize;
        let end = start + columns as usize;
        let mut run = Cow::Borrowed(&self.pixels[start..end]);
        if self.associate {
            associate_alpha(run.to_mut());
        }
        let indexes = self.indexes.get(start..end).unwrap_or(&[]);

        if mode.samples < self.stored_samples {
            let bits = self.options.bits_per_sample;
            let mut scratch = vec![0u8; (columns as usize * mode.samples as usize * bits as usize + 7) / 8];
            export_pixels(mode.kind, &self.options, &run, indexes, &mut scratch);
            expand_samples(&scratch, out, columns as usize, 1, bits, mode.samples, self.stored_samples)?;
        } else {
            export_pixels(mode.kind, &self.options, &run, indexes, out);
        }
        Ok(())
    }
}

/// Offsets and byte counts of the chunks written for one frame
#[derive(Debug, Default)]
struct WrittenChunks {
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
}

impl WrittenChunks {
    fn tag_values(&self, is_big_tiff: bool) -> (TagValue, TagValue) {
        if is_big_tiff {
            (TagValue::Long8(self.offsets.clone()), TagValue::Long8(self.byte_counts.clone()))
        } else {
            (TagValue::Long(self.offsets.iter().map(|&v| v as u32).collect()),
             TagValue::Long(self.byte_counts.iter().map(|&v| v as u32).collect()))
        }
    }
}

/// Swabs a raw chunk into stream order, encodes it and writes it out
fn write_chunk<W: Write + Seek>(writer: &mut TiffStreamWriter<W>, encoder: &ChunkEncoder, data: &mut [u8],
                                bits_per_sample: u16, written: &mut WrittenChunks) -> TiffResult<()> {
    // Every swap is its own inverse: native to stream order here
    normalize_samples(data, bits_per_sample, writer.byte_order());
    let encoded = encoder.encode_chunk(data)?;
    let offset = writer.write_data(&encoded)?;
    written.offsets.push(offset);
    written.byte_counts.push(encoded.len() as u64);
    Ok(())
}

fn write_frame<W: Write + Seek>(writer: &mut TiffStreamWriter<W>, job: &FrameJob, options: &WriteOptions,
                                context: &mut EncodeContext) -> TiffResult<()> {
    let image = job.image.as_ref();
    if image.columns == 0 || image.rows == 0 || image.pixels.len() != image.pixel_count() {
        return Err(TiffError::structural(format!(
            "Frame {} has no pixel data ({}x{})", job.page, image.columns, image.rows)));
    }
    context.limiter.check(ResourceKind::Pixels, image.pixel_count() as u64)?;

    let plan = plan_frame(image, options, context.config.bytes_per_strip);
    if !CompressionFactory::is_supported(plan.scheme as u64) {
        return Err(TiffError::UnsupportedCompression(plan.scheme as u64));
    }
    if plan.alpha_dropped {
        context.warnings.warn("alpha-dropped", format!(
            "{} cannot carry alpha, transparency of frame {} discarded",
            compression_code_to_name(plan.scheme as u64), job.page));
    }
    debug!("Frame {}{}: {} {}, {} bits x {} samples, {}, predictor {}",
           job.page, if job.reduced { " reduction" } else { "" },
           photometric_code_to_name(plan.photometric as u64), compression_code_to_name(plan.scheme as u64),
           plan.bits_per_sample, plan.samples_per_pixel,
           if plan.separate { "separate planes" } else { "contiguous" },
           predictor_code_to_name(plan.predictor as u64));

    let layout = plan.layout(image);
    let descriptor = plan.descriptor();
    let planes = (0..layout.planes())
        .map(|plane| classify(&descriptor, plan.matte, plane))
        .collect::<TiffResult<Vec<_>>>()?;
    if planes.iter().all(Option::is_none) {
        return Err(TiffError::structural(format!(
            "No export layout for {} output", photometric_code_to_name(plan.photometric as u64))));
    }

    let mut export = ExportOptions::new(plan.sample_type, plan.bits_per_sample);
    export.miniswhite = plan.photometric == photometric::MINISWHITE;
    let associate = plan.matte && plan.alpha == AlphaType::Associated;
    if associate {
        debug!("Premultiplying color samples by alpha");
    }
    let exporter = RowExporter {
        pixels: convert_pixels(image, plan.conversion),
        indexes: if plan.photometric == photometric::PALETTE { image.indexes.as_slice() } else { &image.indexes[..0] },
        width: image.columns as usize,
        options: export,
        associate,
        stored_samples: layout.chunk_samples(),
    };

    let encoder = ChunkEncoder::new(layout, plan.scheme, &plan.params, plan.predictor, options.fill_order,
                                    writer.byte_order())?;
    let chunks = if layout.is_tiled() {
        debug!("Writing {} tiles of {:?}", layout.chunk_count(), layout.tile);
        write_tiles(writer, &encoder, &layout, &planes, &exporter, context)?
    } else {
        debug!("Writing {} strips of {} rows ({})", layout.chunk_count(), layout.rows_per_strip,
               if layout.rows_per_strip == 1 { "scanline" } else { "stripped" });
        write_strips(writer, &encoder, &layout, &planes, &exporter, context)?
    };

    let mut directory = build_directory(image, &plan, &layout, job, options, writer.byte_order());
    let (offsets, byte_counts) = chunks.tag_values(writer.is_big_tiff());
    if layout.is_tiled() {
        directory.set(tags::TILE_OFFSETS, offsets);
        directory.set(tags::TILE_BYTE_COUNTS, byte_counts);
    } else {
        directory.set(tags::STRIP_OFFSETS, offsets);
        directory.set(tags::STRIP_BYTE_COUNTS, byte_counts);
    }

    let exif = if options.write_exif && !job.reduced { exif_directories(image, context) } else { None };
    if let Some(private) = &exif {
        if private.exif.is_some() {
            directory.set(tags::EXIF_IFD, pointer_placeholder(writer.is_big_tiff()));
        }
        if private.gps.is_some() {
            directory.set(tags::GPS_IFD, pointer_placeholder(writer.is_big_tiff()));
        }
    }

    let location = writer.write_directory(&directory, true)?;
    if let Some(private) = &exif {
        write_private_directories(writer, &location, private)?;
    }
    Ok(())
}

fn write_strips<W: Write + Seek>(writer: &mut TiffStreamWriter<W>, encoder: &ChunkEncoder, layout: &ChunkLayout,
                                 planes: &[Option<TransferMode>], exporter: &RowExporter,
                                 context: &mut EncodeContext) -> TiffResult<WrittenChunks> {
    let mut buffer = LimitedBuffer::new(&context.limiter, layout.strip_size())?;
    let scanline = layout.scanline_size() as usize;
    let strips = layout.strips_per_plane();
    let total = layout.chunk_count() as u64;
    let mut written = WrittenChunks::default();

    for (plane, mode) in planes.iter().enumerate() {
        for strip in 0..strips {
            let rows = layout.strip_rows(strip);
            let first = strip * layout.rows_per_strip;
            buffer.clear();
            for r in 0..rows as usize {
                exporter.export(*mode, first + r as u32, 0, layout.width,
                                &mut buffer[r * scanline..(r + 1) * scanline])?;
            }
            write_chunk(writer, encoder, &mut buffer[..rows as usize * scanline], layout.bits_per_sample,
                        &mut written)?;
            context.report_progress(SAVE_TASK, (plane as u32 * strips + strip) as u64 + 1, total)?;
        }
    }
    Ok(written)
}

fn write_tiles<W: Write + Seek>(writer: &mut TiffStreamWriter<W>, encoder: &ChunkEncoder, layout: &ChunkLayout,
                                planes: &[Option<TransferMode>], exporter: &RowExporter,
                                context: &mut EncodeContext) -> TiffResult<WrittenChunks> {
    let (tile_width, tile_height) = layout.tile
        .ok_or_else(|| TiffError::structural("Tiled write on a stripped layout"))?;
    let tile_size = layout.tile_size() as usize;
    let row_size = layout.tile_row_size() as usize;
    let mut buffer = LimitedBuffer::new(&context.limiter, tile_size as u64)?;
    let (across, down) = layout.tile_grid();
    let total = layout.chunk_count() as u64;
    let mut written = WrittenChunks::default();

    for mode in planes {
        for ty in 0..down {
            for tx in 0..across {
                let (x, y) = (tx * tile_width, ty * tile_height);
                let columns = tile_width.min(layout.width - x);
                buffer.clear();
                for r in 0..tile_height.min(layout.height - y) as usize {
                    exporter.export(*mode, y + r as u32, x, columns, &mut buffer[r * row_size..(r + 1) * row_size])?;
                }
                write_chunk(writer, encoder, &mut buffer[..tile_size], layout.bits_per_sample, &mut written)?;
                context.report_progress(SAVE_TASK, written.offsets.len() as u64, total)?;
            }
        }
    }
    Ok(written)
}

/// Parses the image's "Exif" profile into private directories
fn exif_directories(image: &Image, context: &mut EncodeContext) -> Option<ExifDirectories> {
    let profile = image.profile("Exif")?;
    match parse_exif_profile(profile, &mut context.warnings) {
        Ok(mut private) => {
            private.exif = private.exif.filter(|d| !d.is_empty());
            private.gps = private.gps.filter(|d| !d.is_empty());
            (!private.is_empty()).then_some(private)
        },
        Err(e) => {
            context.warnings.warn("exif-dropped", format!("Exif profile unreadable: {}", e));
            None
        }
    }
}

fn subfile_type(image: &Image, job: &FrameJob, options: &WriteOptions) -> u32 {
    if job.reduced {
        return new_subfile_type::REDUCED_IMAGE;
    }
    options.subfile_type
        .or_else(|| image.attribute("subfiletype").and_then(profiles::subfile_type_value))
        .unwrap_or(if job.pages > 1 { new_subfile_type::PAGE } else { 0 })
}

/// ColorMap values: all reds, then greens, then blues
fn colormap_values(colormap: &[Pixel], bits: u16) -> Vec<u16> {
    let colors = 1usize << bits.min(16);
    let mut values = vec![0u16; colors * 3];
    for (i, entry) in colormap.iter().take(colors).enumerate() {
        values[i] = entry.red;
        values[colors + i] = entry.green;
        values[2 * colors + i] = entry.blue;
    }
    values
}

fn build_directory(image: &Image, plan: &FramePlan, layout: &ChunkLayout, job: &FrameJob, options: &WriteOptions,
                   order: ByteOrder) -> DirectoryBuilder {
    let mut directory = DirectoryBuilder::new();
    let spp = plan.samples_per_pixel as usize;

    let subfile = subfile_type(image, job, options);
    if subfile != 0 {
        directory.set_long(tags::NEW_SUBFILE_TYPE, subfile);
    }
    directory.set_long(tags::IMAGE_WIDTH, image.columns);
    directory.set_long(tags::IMAGE_LENGTH, image.rows);
    directory.set_shorts(tags::BITS_PER_SAMPLE, vec![plan.bits_per_sample; spp]);
    directory.set_short(tags::COMPRESSION, plan.scheme);
    directory.set_short(tags::PHOTOMETRIC_INTERPRETATION, plan.photometric);
    if options.fill_order == fill_order::LSB2MSB {
        directory.set_short(tags::FILL_ORDER, fill_order::LSB2MSB);
    }
    directory.set_short(tags::ORIENTATION, image.orientation.clamp(1, 8));
    directory.set_short(tags::SAMPLES_PER_PIXEL, plan.samples_per_pixel);
    directory.set_short(tags::PLANAR_CONFIGURATION,
                        if plan.separate { planar_config::SEPARATE } else { planar_config::CONTIG });
    match layout.tile {
        Some((width, height)) => {
            directory.set_long(tags::TILE_WIDTH, width);
            directory.set_long(tags::TILE_LENGTH, height);
        },
        None => directory.set_long(tags::ROWS_PER_STRIP, layout.rows_per_strip),
    }

    if image.x_resolution > 0.0 && image.y_resolution > 0.0 {
        directory.set_rational(tags::X_RESOLUTION, image.x_resolution);
        directory.set_rational(tags::Y_RESOLUTION, image.y_resolution);
        directory.set_short(tags::RESOLUTION_UNIT, match image.units {
            ResolutionUnits::PixelsPerInch => resolution_unit::INCH,
            ResolutionUnits::PixelsPerCentimeter => resolution_unit::CENTIMETER,
            ResolutionUnits::Undefined => resolution_unit::NONE,
        });
    }
    if let Some(chromaticity) = &image.chromaticity {
        directory.set_rationals(tags::WHITE_POINT, &[chromaticity.white.0, chromaticity.white.1]);
        directory.set_rationals(tags::PRIMARY_CHROMATICITIES, &[
            chromaticity.red.0, chromaticity.red.1,
            chromaticity.green.0, chromaticity.green.1,
            chromaticity.blue.0, chromaticity.blue.1,
        ]);
    }
    if job.pages > 1 && !job.reduced {
        directory.set_shorts(tags::PAGE_NUMBER, vec![job.page as u16, job.pages as u16]);
    }

    if plan.predictor != predictor::NONE {
        directory.set_short(tags::PREDICTOR, plan.predictor);
    }
    if plan.scheme == compression::CCITT_FAX3 {
        directory.set_long(tags::GROUP3_OPTIONS, options.group3_options);
    }
    if plan.photometric == photometric::PALETTE {
        directory.set_shorts(tags::COLOR_MAP, colormap_values(&image.colormap, plan.bits_per_sample));
    }
    if plan.photometric == photometric::SEPARATED {
        directory.set_short(tags::INK_SET, ink_set::CMYK);
    }
    if plan.photometric == photometric::YCBCR {
        directory.set_shorts(tags::YCBCR_SUBSAMPLING, vec![1, 1]);
    }

    let extra = plan.samples_per_pixel - plan.color_samples();
    if extra > 0 {
        let mut values = vec![extra_samples::UNSPECIFIED; extra as usize];
        if plan.matte {
            values[0] = plan.alpha.extra_sample();
        }
        directory.set_shorts(tags::EXTRA_SAMPLES, values);
    }
    let format = plan.descriptor().sample_format;
    if format != sample_format::UINT {
        directory.set_shorts(tags::SAMPLE_FORMAT, vec![format; spp]);
    }
    if plan.sample_type == SampleType::Float {
        if plan.bits_per_sample == 64 {
            directory.set(tags::S_MIN_SAMPLE_VALUE, TagValue::Double(vec![0.0; spp]));
            directory.set(tags::S_MAX_SAMPLE_VALUE, TagValue::Double(vec![1.0; spp]));
        } else {
            directory.set(tags::S_MIN_SAMPLE_VALUE, TagValue::Float(vec![0.0; spp]));
            directory.set(tags::S_MAX_SAMPLE_VALUE, TagValue::Float(vec![1.0; spp]));
        }
    }

    profiles::write_profiles(image, &mut directory, order);
    profiles::write_text_attributes(image, &mut directory);
    directory.set_ascii(tags::SOFTWARE, SOFTWARE);
    directory
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::coder::limits::ResourceLimiter;
    use crate::utils::config::CoderConfig;

    fn context() -> EncodeContext {
        EncodeContext::with_limiter(CoderConfig::default(), ResourceLimiter::new())
    }

    fn gradient(columns: u32, rows: u32) -> Image {
        let mut image = Image::filled(columns, rows, Pixel::default());
        for (i, pixel) in image.pixels.iter_mut().enumerate() {
            *pixel = Pixel::rgb((i * 997 % 65536) as u16, (i * 13) as u16, 4000);
        }
        image
    }

    fn plan(image: &Image, options: &WriteOptions) -> FramePlan {
        plan_frame(image, options, limits::BYTES_PER_STRIP)
    }

    #[test]
    fn test_default_photometric() {
        let options = WriteOptions::default();
        assert_eq!(plan(&gradient(4, 4), &options).photometric, photometric::RGB);

        let gray = Image::filled(4, 4, Pixel::gray(1234));
        let gray_plan = plan(&gray, &options);
        assert_eq!((gray_plan.photometric, gray_plan.bits_per_sample), (photometric::MINISBLACK, 8));

        let mono = Image::filled(4, 4, Pixel::gray(MAX_RGB));
        let mono_plan = plan(&mono, &options);
        assert_eq!((mono_plan.photometric, mono_plan.bits_per_sample), (photometric::MINISWHITE, 1));

        let mut palette = gradient(4, 4);
        palette.indexes = vec![0; 16];
        palette.colormap = vec![Pixel::rgb(1, 2, 3), Pixel::rgb(4, 5, 6), Pixel::rgb(7, 8, 9)];
        palette.storage_class = StorageClass::Palette;
        let palette_plan = plan(&palette, &options);
        assert_eq!((palette_plan.photometric, palette_plan.bits_per_sample), (photometric::PALETTE, 2));

        let mut cmyk = gradient(4, 4);
        cmyk.colorspace = Colorspace::Cmyk;
        let cmyk_plan = plan(&cmyk, &options);
        assert_eq!((cmyk_plan.photometric, cmyk_plan.samples_per_pixel), (photometric::SEPARATED, 4));
        assert_eq!(cmyk_plan.conversion, Conversion::None);
    }

    #[test]
    fn test_jpeg_writes_ycbcr_without_alpha() {
        let mut image = gradient(20, 20);
        image.matte = true;
        image.pixels[0].opacity = 100;
        let options = WriteOptions { compression: CompressionType::Jpeg, ..WriteOptions::default() };
        let plan = plan(&image, &options);
        assert_eq!(plan.photometric, photometric::YCBCR);
        assert!(!plan.matte);
        assert!(plan.alpha_dropped);
        assert_eq!(plan.samples_per_pixel, 3);
        assert_eq!(plan.rows_per_strip % 16, 0);
    }

    #[test]
    fn test_bilevel_schemes_force_miniswhite() {
        let options = WriteOptions { compression: CompressionType::Group4, ..WriteOptions::default() };
        let plan = plan(&gradient(8, 8), &options);
        assert_eq!((plan.photometric, plan.bits_per_sample), (photometric::MINISWHITE, 1));
        assert!(!CompressionFactory::is_supported(plan.scheme as u64));
    }

    #[test]
    fn test_predictor_and_levels() {
        let options = WriteOptions { compression: CompressionType::Zip, quality: Some(90), ..WriteOptions::default() };
        let plan = plan(&gradient(8, 8), &options);
        assert_eq!(plan.predictor, predictor::HORIZONTAL);
        assert_eq!(plan.params.zip_level, 9);
        assert_eq!(codec_params(Some(75)).zstd_level, 9);
        assert_eq!(codec_params(Some(0)).zip_level, 1);
        assert_eq!(codec_params(Some(95)).lzma_preset, 9);
        assert_eq!(codec_params(Some(5)).lzma_preset, 1);

        let rle = WriteOptions { compression: CompressionType::Rle, ..WriteOptions::default() };
        assert_eq!(plan_frame(&gradient(8, 8), &rle, 1024).predictor, predictor::NONE);
    }

    #[test]
    fn test_rows_per_strip_rules() {
        let image = gradient(100, 50);
        let small_target = plan_frame(&image, &WriteOptions::default(), 600);
        assert_eq!(small_target.rows_per_strip, 2);

        let one_strip = WriteOptions { strip_per_page: true, ..WriteOptions::default() };
        assert_eq!(plan(&image, &one_strip).rows_per_strip, 50);

        let explicit = WriteOptions { rows_per_strip: Some(7), ..WriteOptions::default() };
        assert_eq!(plan(&image, &explicit).rows_per_strip, 7);
    }

    #[test]
    fn test_oversized_tile_request_is_fitted() {
        assert_eq!(fit_tile(256, 20), 256);
        assert_eq!(fit_tile(8192, 20), 32);
        assert_eq!(fit_tile(8192, 5000), 8192);
    }

    #[test]
    fn test_rgb_to_cmyk() {
        assert_eq!(rgb_to_cmyk(&Pixel::rgb(0, 0, 0)), Pixel { black: MAX_RGB, ..Pixel::default() });
        assert_eq!(rgb_to_cmyk(&Pixel::rgb(MAX_RGB, 0, MAX_RGB)), Pixel { green: MAX_RGB, ..Pixel::default() });
    }

    #[test]
    fn test_extra_samples_and_alpha_type() {
        let mut image = gradient(4, 4);
        image.matte = true;
        image.set_attribute("alpha", "associated");
        let options = WriteOptions { samples_per_pixel: Some(6), ..WriteOptions::default() };
        let plan = plan(&image, &options);
        assert_eq!(plan.samples_per_pixel, 6);
        assert_eq!(plan.alpha, AlphaType::Associated);

        let job = FrameJob { image: Cow::Borrowed(&image), page: 0, pages: 1, reduced: false };
        let directory = build_directory(&image, &plan, &plan.layout(&image), &job, &options,
                                        ByteOrder::LittleEndian);
        assert_eq!(directory.get(tags::EXTRA_SAMPLES),
                   Some(&TagValue::Short(vec![extra_samples::ASSOCIATED_ALPHA, 0, 0])));
        assert_eq!(directory.get(tags::SOFTWARE), Some(&TagValue::Ascii(SOFTWARE.to_string())));
    }

    #[test]
    fn test_encode_writes_header_and_strips() {
        let images = vec![gradient(4, 4)];
        let options = WriteOptions { byte_order: ByteOrder::BigEndian, ..WriteOptions::default() };
        let bytes = encode(&images, Cursor::new(Vec::new()), &options, &mut context()).unwrap().into_inner();
        assert_eq!(&bytes[..4], b"MM\0*");
        // 4x4 RGB at 8 bits, uncompressed
        assert!(bytes.len() > 48);
    }

    #[test]
    fn test_unsupported_scheme_fails() {
        let options = WriteOptions { compression: CompressionType::Jbig, ..WriteOptions::default() };
        let err = encode(&vec![gradient(4, 4)], Cursor::new(Vec::new()), &options, &mut context()).unwrap_err();
        assert!(matches!(err, TiffError::UnsupportedCompression(_)));
    }

    #[test]
    fn test_cancelled_encode() {
        let mut context = context().with_monitor(Box::new(|_, _, _| false));
        let err = encode(&vec![gradient(4, 4)], Cursor::new(Vec::new()), &WriteOptions::default(), &mut context)
            .unwrap_err();
        assert!(matches!(err, TiffError::Cancelled));
    }

    #[test]
    fn test_empty_list_is_structural() {
        let err = encode(&ImageList::new(), Cursor::new(Vec::new()), &WriteOptions::default(), &mut context())
            .unwrap_err();
        assert!(matches!(err, TiffError::Structural(_)));
    }
}
