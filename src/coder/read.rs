//! TIFF decoding
//!
//! `decode` walks the directory chain and turns each selected frame into
//! an `Image`: the directory is validated and mapped onto image metadata,
//! a transfer strategy is chosen, and the frame's chunks are decoded and
//! imported one unit (scanline, strip or tile) at a time.
//!
//! A failure on the first requested frame fails the call. A failure on a
//! later frame keeps the frames already decoded and records a warning.

use log::{debug, info, trace};

use crate::codec::{ChunkDecoder, ChunkLayout, RgbaMaterializer};
use crate::coder::context::DecodeContext;
use crate::coder::limits::{LimitedBuffer, ResourceKind};
use crate::coder::options::{AlphaType, ReadOptions};
use crate::coder::profiles;
use crate::coder::strategy::{select_method, FrameDescriptor, TiffMethod};
use crate::io::byte_order::ByteOrder;
use crate::io::seekable::SeekableReader;
use crate::model::{
    Chromaticity, ColorEntry, Colorspace, CompressionType, Image, ImageList, Interlace, Pixel,
    ResolutionUnits, StorageClass, MAX_RGB,
};
use crate::quantum::swab::{normalize_samples, swab_to_native};
use crate::quantum::{
    classify, compact_samples, disassociate_alpha, import_pixels, CompressionDescriptor, ImportOptions,
    SampleType, TransferMode,
};
use crate::tiff::builders::exif::{build_exif_profile, copy_directory, ExifDirectories};
use crate::tiff::constants::{compression, extra_samples, limits, photometric, planar_config, resolution_unit, sample_format, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::tag_store::TagStore;
use crate::tiff::validation::{round_up_to_word, validate_buffer_size, validate_range};
use crate::tiff::warnings::{Warning, WarningContext};
use crate::utils::tag_utils;
use crate::utils::tiff_code_translators::{
    compression_code_to_name, extra_samples_code_to_name, photometric_code_to_name, planar_config_code_to_name,
    sample_format_code_to_name,
};

const LOAD_TASK: &str = "Load image";

/// Where the reader is in its walk over the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Opened,
    DirectoryParsed,
    GeometryValidated,
    StrategyChosen,
    Transferring,
    FrameComplete,
    NextFrame,
    Done,
    Aborted,
}

fn transition(state: &mut ReaderState, next: ReaderState) {
    trace!("Reader state {:?} -> {:?}", state, next);
    *state = next;
}

/// Attribute recording the transfer strategy chosen for a frame
pub const STRATEGY_ATTRIBUTE: &str = "tiff:strategy";

/// Frames decoded by one call and the warnings collected on the way
#[derive(Debug)]
pub struct DecodeOutcome {
    pub images: ImageList,
    pub warnings: Vec<Warning>,
}

/// Decodes the frames of a TIFF stream selected by `options`
///
/// # Arguments
/// * `stream` - The TIFF stream, read from its start
/// * `options` - Frame selection, ping mode and sample overrides
/// * `context` - Warning sink, resource limiter and progress monitor
///
/// # Returns
/// The decoded frames in stream order, or the error that stopped the
/// first requested frame
pub fn decode<R: SeekableReader>(stream: R, options: &ReadOptions, context: &mut DecodeContext)
                                 -> TiffResult<DecodeOutcome> {
    if options.warnings_as_errors {
        context.escalate_warnings();
    }
    let mut state = ReaderState::Opened;
    let mut store = match TagStore::open(stream, &options.ignore_tags, &mut context.warnings) {
        Ok(store) => store,
        Err(e) => {
            transition(&mut state, ReaderState::Aborted);
            return Err(e);
        }
    };

    let mut images = ImageList::new();
    loop {
        let index = store.frame_index();
        transition(&mut state, ReaderState::DirectoryParsed);

        if index >= options.subimage {
            match read_frame(&mut store, options, context, &mut state) {
                Ok(image) => {
                    transition(&mut state, ReaderState::FrameComplete);
                    images.push(image);
                },
                Err(e) if images.is_empty() || matches!(e, TiffError::Cancelled) => {
                    transition(&mut state, ReaderState::Aborted);
                    return Err(e);
                },
                Err(e) => {
                    context.warnings.warn("frame-dropped", format!(
                        "Frame {} unreadable, keeping the {} frame(s) before it: {}", index, images.len(), e));
                    break;
                }
            }
        } else {
            debug!("Skipping frame {} before subimage {}", index, options.subimage);
        }

        if options.is_past_range(index + 1) || !store.advance(&mut context.warnings) {
            break;
        }
        transition(&mut state, ReaderState::NextFrame);
    }
    transition(&mut state, ReaderState::Done);

    if images.is_empty() {
        return Err(TiffError::structural(format!(
            "Subimage {} requested but the stream has fewer frames", options.subimage)));
    }
    info!("Decoded {} frame(s)", images.len());
    Ok(DecodeOutcome { images, warnings: context.take_warnings() })
}

/// What geometry validation learned about a frame
#[derive(Debug, Clone)]
struct FrameInfo {
    descriptor: CompressionDescriptor,
    layout: ChunkLayout,
    alpha: AlphaType,
    matte: bool,
    import: ImportOptions,
}

fn read_frame<R: SeekableReader>(store: &mut TagStore<R>, options: &ReadOptions, context: &mut DecodeContext,
                                 state: &mut ReaderState) -> TiffResult<Image> {
    let (mut image, frame) = validate_geometry(store, options, context)?;
    transition(state, ReaderState::GeometryValidated);

    let frame_descriptor = FrameDescriptor {
        compression: frame.descriptor,
        matte: frame.matte,
        is_tiled: frame.layout.is_tiled(),
        has_rows_per_strip: store.has_tag(tags::ROWS_PER_STRIP),
        strip_size: frame.layout.strip_size(),
    };
    if options.ping {
        if let Ok(choice) = select_method(&frame_descriptor) {
            image.set_attribute(STRATEGY_ATTRIBUTE, choice.method.to_string());
        }
        finish_frame(&mut image, &frame, options, false)?;
        return Ok(image);
    }

    let choice = select_method(&frame_descriptor)?;
    image.set_attribute(STRATEGY_ATTRIBUTE, choice.method.to_string());
    transition(state, ReaderState::StrategyChosen);

    let mut descriptor = frame.descriptor;
    if let Some(photometric) = choice.photometric_override {
        descriptor.photometric = photometric;
        image.colorspace = Colorspace::Rgb;
    }

    let pixel_bytes = image.pixel_count() as u64 * std::mem::size_of::<Pixel>() as u64;
    context.limiter.check(ResourceKind::Memory, pixel_bytes)?;
    if choice.method.is_rgba() {
        image.storage_class = StorageClass::Direct;
        image.colorspace = Colorspace::Rgb;
    }
    let chunk_bytes = match choice.method {
        TiffMethod::Tiled | TiffMethod::RgbaTiled => frame.layout.tile_size(),
        TiffMethod::RgbaPunt => frame.layout.vstrip_size(frame.layout.height),
        _ => frame.layout.strip_size(),
    };
    validate_buffer_size(chunk_bytes, store.file_size(), context.config.max_compress_ratio)?;
    image.allocate_pixels();
    transition(state, ReaderState::Transferring);

    let mut decoder = ChunkDecoder::new(store, frame.layout)?;
    let disassociate = frame.alpha == AlphaType::Associated && frame.matte
        && descriptor.photometric == photometric::RGB;
    if disassociate {
        debug!("Associated alpha will be removed from color samples");
    }

    if choice.method.is_rgba() {
        let colormap = image.colormap.clone();
        let materializer = RgbaMaterializer::new(&descriptor, frame.matte, &colormap, frame.layout.subsampling)?;
        let transfer = RgbaTransfer {
            materializer,
            bits_per_sample: descriptor.bits_per_sample,
            byte_order: store.byte_order(),
            disassociate,
        };
        match choice.method {
            TiffMethod::RgbaTiled => read_rgba_tiles(store, &mut decoder, &mut image, &transfer, context)?,
            TiffMethod::RgbaPunt => read_rgba_whole(store, &mut decoder, &mut image, &transfer, context)?,
            _ => read_rgba_strips(store, &mut decoder, &mut image, &transfer, context)?,
        }
    } else {
        let mut planes = Vec::with_capacity(frame.layout.planes() as usize);
        planes.push(choice.mode);
        for plane in 1..frame.layout.planes() {
            planes.push(classify(&descriptor, frame.matte, plane)?);
        }
        let plan = TransferPlan {
            planes,
            import: frame.import,
            bits_per_sample: descriptor.bits_per_sample,
            stored_samples: frame.layout.chunk_samples(),
            byte_order: store.byte_order(),
            disassociate,
        };
        let invalid = match choice.method {
            TiffMethod::ScanLine => read_scanlines(store, &mut decoder, &mut image, &plan, context)?,
            TiffMethod::Tiled => read_tiles(store, &mut decoder, &mut image, &plan, context)?,
            _ => read_strips(store, &mut decoder, &mut image, &plan, context)?,
        };
        if invalid > 0 {
            context.warnings.codec_warning("invalid-colormap-index", format!(
                "{} colormap indexes out of range in frame {}", invalid, image.scene))?;
        }
    }

    finish_frame(&mut image, &frame, options, true)?;
    Ok(image)
}

/// Checks the directory and maps it onto image metadata
fn validate_geometry<R: SeekableReader>(store: &mut TagStore<R>, options: &ReadOptions,
                                        context: &mut DecodeContext) -> TiffResult<(Image, FrameInfo)> {
    let width = store.get_required(tags::IMAGE_WIDTH)?;
    let height = store.get_required(tags::IMAGE_LENGTH)?;
    if width == 0 || height == 0 || width > u32::MAX as u64 || height > u32::MAX as u64 {
        return Err(TiffError::structural(format!("Invalid frame dimensions {}x{}", width, height)));
    }
    let photometric = store.get_required(tags::PHOTOMETRIC_INTERPRETATION)? as u16;
    let scheme = store.get_required(tags::COMPRESSION)? as u16;
    let bits = store.get_required(tags::BITS_PER_SAMPLE)? as u16;
    let spp = store.get_required(tags::SAMPLES_PER_PIXEL)? as u16;
    let format = store.get_required(tags::SAMPLE_FORMAT)? as u16;
    let planar = store.get_required(tags::PLANAR_CONFIGURATION)? as u16;

    debug!("Frame {}: {}x{}, {} {}, {} bits x {} samples, {} {}",
           store.frame_index(), width, height,
           photometric_code_to_name(photometric as u64), compression_code_to_name(scheme as u64),
           bits, spp, sample_format_code_to_name(format as u64), planar_config_code_to_name(planar as u64));

    if !(1..=32).contains(&bits) && !(bits == 64 && format == sample_format::IEEEFP) {
        return Err(TiffError::structural(format!("{} bits per sample is not supported", bits)));
    }
    validate_range(spp, 1, limits::MAX_SAMPLES, "samples per pixel")?;
    let extra: Vec<u16> = store.get_defaulted(tags::EXTRA_SAMPLES)?
        .as_u64_vec()
        .unwrap_or_default()
        .into_iter()
        .map(|v| v as u16)
        .collect();
    if extra.len() > limits::MAX_SAMPLES as usize {
        return Err(TiffError::structural(format!("{} extra samples is not supported", extra.len())));
    }
    check_compression(scheme, photometric, bits, spp)?;
    context.limiter.check(ResourceKind::Pixels, width * height)?;

    let mut image = Image::new(width as u32, height as u32);
    image.depth = bits;
    image.scene = store.frame_index();
    image.compression = compression_type(scheme);
    image.colorspace = match photometric {
        photometric::CIELAB => Colorspace::Lab,
        photometric::SEPARATED => Colorspace::Cmyk,
        photometric::MINISBLACK | photometric::MINISWHITE => Colorspace::Gray,
        _ => Colorspace::Rgb,
    };
    if planar == planar_config::SEPARATE {
        image.interlace = Interlace::Plane;
    }

    let units = store.get_defaulted(tags::RESOLUTION_UNIT)?.first_u64().unwrap_or(0) as u16;
    image.units = match units {
        resolution_unit::INCH => ResolutionUnits::PixelsPerInch,
        resolution_unit::CENTIMETER => ResolutionUnits::PixelsPerCentimeter,
        _ => ResolutionUnits::Undefined,
    };
    image.x_resolution = store.get_defaulted(tags::X_RESOLUTION)?.first_f64().unwrap_or(0.0);
    image.y_resolution = store.get_defaulted(tags::Y_RESOLUTION)?.first_f64().unwrap_or(0.0);
    if !options.ignore_orientation {
        let orientation = store.get_defaulted(tags::ORIENTATION)?.first_u64().unwrap_or(1);
        image.orientation = orientation.clamp(1, 8) as u16;
    }
    image.chromaticity = read_chromaticity(store, &mut context.warnings);

    profiles::read_profiles(store, &mut image);
    profiles::read_text_attributes(store, &mut image);
    read_exif(store, &mut image, &mut context.warnings);

    // Alpha
    for (i, value) in extra.iter().enumerate() {
        debug!("Extra sample {} contains {}", i + 1, extra_samples_code_to_name(*value as u64));
    }
    let mut alpha = extra.first().map_or(AlphaType::Unspecified, |&v| AlphaType::from_extra_sample(v));
    let promotable = matches!((photometric, spp),
        (photometric::MINISBLACK | photometric::MINISWHITE, 2) | (photometric::RGB, 4) | (photometric::SEPARATED, 5));
    if extra.len() == 1 && extra[0] == extra_samples::UNSPECIFIED && promotable {
        debug!("Promoting unspecified alpha to unassociated alpha");
        alpha = AlphaType::Unassociated;
    }
    if let (Some(requested), false) = (options.alpha, extra.is_empty()) {
        debug!("Alpha type overridden from {} to {}", alpha.name(), requested.name());
        alpha = requested;
    }
    let matte = alpha != AlphaType::Unspecified;
    image.matte = matte;
    if matte {
        image.set_attribute("alpha", alpha.name());
        debug!("Image has a matte channel of type {}", alpha.name());
    }

    let sample_type = SampleType::from_sample_format(format);
    let mut import = ImportOptions::new(sample_type, bits);
    import.miniswhite = photometric == photometric::MINISWHITE;
    if sample_type == SampleType::Float {
        if let Some(min) = store.get_optional(tags::S_MIN_SAMPLE_VALUE).and_then(|v| v.first_f64()) {
            import.min = min;
        }
        if let Some(max) = store.get_optional(tags::S_MAX_SAMPLE_VALUE).and_then(|v| v.first_f64()) {
            import.max = max;
        }
        import.min = options.sample_min.unwrap_or(import.min);
        import.max = options.sample_max.unwrap_or(import.max);
        if !(import.max > import.min) {
            return Err(TiffError::structural(format!(
                "Float sample range {}..{} is empty", import.min, import.max)));
        }
        debug!("Float samples scaled from {}..{}", import.min, import.max);
    }

    if photometric == photometric::PALETTE {
        if bits > 16 {
            return Err(TiffError::structural(format!("Palette with {} bits per sample is not supported", bits)));
        }
        let values = store.get_required_array(tags::COLOR_MAP)?;
        let colormap = build_colormap(&values, bits)?;
        context.limiter.check(ResourceKind::Memory, (colormap.len() * std::mem::size_of::<ColorEntry>()) as u64)?;
        image.colormap = colormap;
        image.storage_class = StorageClass::Palette;
    }

    let layout = ChunkLayout::from_store(store)?;
    debug!("Layout: {}, {} rows per strip, scanline {} bytes",
           if layout.is_tiled() { "tiled" } else { "stripped" }, layout.rows_per_strip, layout.scanline_size());

    let descriptor = CompressionDescriptor {
        compression: scheme,
        photometric,
        sample_format: format,
        samples_per_pixel: spp,
        bits_per_sample: bits,
        planar_config: planar,
    };
    Ok((image, FrameInfo { descriptor, layout, alpha, matte, import }))
}

/// Bit depth and photometric preconditions of the bilevel and WebP codecs
fn check_compression(scheme: u16, photometric: u16, bits: u16, spp: u16) -> TiffResult<()> {
    match scheme {
        compression::CCITT_RLE | compression::CCITT_FAX3 | compression::CCITT_FAX4 | compression::JBIG => {
            if bits != 1 || !matches!(photometric, photometric::MINISBLACK | photometric::MINISWHITE) {
                return Err(TiffError::structural(format!(
                    "{} needs 1-bit min-is-black or min-is-white samples, frame has {} bits {}",
                    compression_code_to_name(scheme as u64), bits, photometric_code_to_name(photometric as u64))));
            }
        },
        compression::WEBP => {
            if bits != 8 || !(spp == 3 || spp == 4) || photometric != photometric::RGB {
                return Err(TiffError::structural(format!(
                    "WebP needs 8-bit RGB or RGBA, frame has {} bits x {} samples {}",
                    bits, spp, photometric_code_to_name(photometric as u64))));
            }
        },
        _ => {},
    }
    Ok(())
}

/// The image compression a stored scheme maps to
pub fn compression_type(scheme: u16) -> CompressionType {
    match scheme {
        compression::NONE => CompressionType::None,
        compression::CCITT_RLE | compression::CCITT_FAX3 => CompressionType::Fax,
        compression::CCITT_FAX4 => CompressionType::Group4,
        compression::JPEG | compression::JPEG_OLD => CompressionType::Jpeg,
        compression::LZW => CompressionType::Lzw,
        compression::PACKBITS => CompressionType::Rle,
        compression::DEFLATE | compression::DEFLATE_OLD => CompressionType::Zip,
        compression::ZSTD => CompressionType::Zstd,
        compression::LZMA => CompressionType::Lzma,
        compression::JBIG => CompressionType::Jbig,
        compression::WEBP => CompressionType::WebP,
        _ => CompressionType::None,
    }
}

/// Builds the colormap from the ColorMap tag
///
/// Some writers store 8-bit values; when every entry is below 256 the
/// values are scaled from 0..256 instead of 0..65535.
pub fn build_colormap(values: &[u64], bits: u16) -> TiffResult<Vec<ColorEntry>> {
    let colors = 1usize << bits;
    if values.len() < colors * 3 {
        return Err(TiffError::structural(format!(
            "ColorMap holds {} values, {} colors need {}", values.len(), colors, colors * 3)));
    }
    let range = if values[..colors * 3].iter().all(|&v| v < 256) { 256.0 } else { 65535.0 };
    debug!("Colormap of {} colors, {}-bit entries", colors, if range == 256.0 { 8 } else { 16 });

    let scale = |v: u64| (MAX_RGB as f64 * v as f64 / range + 0.5).min(MAX_RGB as f64) as u16;
    Ok((0..colors)
        .map(|i| Pixel::rgb(scale(values[i]), scale(values[colors + i]), scale(values[2 * colors + i])))
        .collect())
}

fn read_chromaticity<R: SeekableReader>(store: &TagStore<R>, warnings: &mut WarningContext) -> Option<Chromaticity> {
    let white = store.get_optional(tags::WHITE_POINT).and_then(|v| v.as_f64_vec()).filter(|v| v.len() >= 2);
    let primaries = store.get_optional(tags::PRIMARY_CHROMATICITIES)
        .and_then(|v| v.as_f64_vec())
        .filter(|v| v.len() >= 6);
    if white.is_none() && primaries.is_none() {
        return None;
    }

    let valid = |values: &[f64]| values.iter().all(|v| v.is_finite() && *v >= 0.0);
    let mut chromaticity = Chromaticity::default();
    if let Some(w) = white {
        if valid(&w) {
            chromaticity.white = (w[0], w[1]);
        } else {
            warnings.warn("chromaticity-ignored", format!("Invalid white point {:?}", &w[..2]));
        }
    }
    if let Some(p) = primaries {
        if valid(&p) {
            chromaticity.red = (p[0], p[1]);
            chromaticity.green = (p[2], p[3]);
            chromaticity.blue = (p[4], p[5]);
        } else {
            warnings.warn("chromaticity-ignored", format!("Invalid primary chromaticities {:?}", &p[..6]));
        }
    }
    Some(chromaticity)
}

/// Stores EXIF and GPS entries as `exif:<Name>` attributes and an "Exif" profile
fn read_exif<R: SeekableReader>(store: &mut TagStore<R>, image: &mut Image, warnings: &mut WarningContext) {
    let mut directories = ExifDirectories::default();
    for (pointer, is_gps) in [(tags::EXIF_IFD, false), (tags::GPS_IFD, true)] {
        let offset = match store.get_optional(pointer).and_then(|v| v.first_u64()) {
            Some(offset) if offset != 0 => offset,
            _ => continue,
        };
        let ifd = match store.read_sub_directory(offset, warnings) {
            Ok(ifd) => ifd,
            Err(e) => {
                warnings.warn("exif-dropped", format!(
                    "{} directory at {} unreadable: {}", tag_utils::get_tag_name(pointer), offset, e));
                continue;
            }
        };

        for entry in &ifd.entries {
            let name = if is_gps {
                tag_utils::get_gps_tag_name(entry.tag)
            } else {
                tag_utils::get_exif_tag_name(entry.tag)
            };
            let name = name.map_or_else(|| format!("{:#06x}", entry.tag), str::to_string);
            if let Ok(value) = entry.value(ifd.byte_order) {
                image.set_attribute(&format!("exif:{}", name), value.to_string());
            }
        }
        let copied = copy_directory(&ifd);
        debug!("{} directory with {} entries", tag_utils::get_tag_name(pointer), copied.len());
        if is_gps {
            directories.gps = Some(copied);
        } else {
            directories.exif = Some(copied);
        }
    }

    if !directories.is_empty() {
        match build_exif_profile(&directories, store.byte_order()) {
            Ok(profile) => image.set_profile("Exif", profile),
            Err(e) => warnings.warn("exif-dropped", format!("Cannot build Exif profile: {}", e)),
        }
    }
}

/// Depth clamp, gray hints and the optional gray palette
fn finish_frame(image: &mut Image, frame: &FrameInfo, options: &ReadOptions, has_pixels: bool) -> TiffResult<()> {
    image.depth = image.depth.min(limits::MAX_QUANTUM_DEPTH);
    image.is_grayscale = image.colorspace == Colorspace::Gray;
    image.is_monochrome = image.is_grayscale && frame.descriptor.bits_per_sample == 1;

    let gray = matches!(frame.descriptor.photometric, photometric::MINISBLACK | photometric::MINISWHITE);
    let bits = frame.descriptor.bits_per_sample;
    if options.read_as_palette && gray && !frame.matte && bits <= 16
        && (1usize << bits) <= limits::MAX_COLORMAP_SIZE {
        let colors = 1usize << bits;
        debug!("Reading gray frame as a {} color palette image", colors);
        image.allocate_grayscale_colormap(colors)?;
        if has_pixels {
            let top = colors as u64 - 1;
            for (index, pixel) in image.indexes.iter_mut().zip(image.pixels.iter()) {
                *index = ((pixel.red as u64 * top + MAX_RGB as u64 / 2) / MAX_RGB as u64) as u16;
            }
        }
    }
    Ok(())
}

fn transfer_buffer(context: &DecodeContext, size: u64, file_size: u64, what: &str) -> TiffResult<LimitedBuffer> {
    validate_buffer_size(size, file_size, context.config.max_compress_ratio)?;
    debug!("Allocating {} bytes for {} buffer", round_up_to_word(size), what);
    LimitedBuffer::new(&context.limiter, size)
}

/// Per-plane transfer modes and sample handling of a native read
struct TransferPlan {
    planes: Vec<Option<TransferMode>>,
    import: ImportOptions,
    bits_per_sample: u16,
    /// Samples per pixel stored in one chunk
    stored_samples: u16,
    byte_order: ByteOrder,
    disassociate: bool,
}

impl TransferPlan {
    /// Swabs and compacts decoded rows in place
    ///
    /// # Returns
    /// The byte stride of the compacted rows
    fn prepare(&self, data: &mut [u8], columns: u32, rows: u32, mode: TransferMode) -> TiffResult<usize> {
        normalize_samples(data, self.bits_per_sample, self.byte_order);
        if mode.samples < self.stored_samples {
            compact_samples(data, columns as usize, rows as usize, self.bits_per_sample,
                            self.stored_samples, mode.samples)?;
        }
        Ok((columns as usize * mode.samples as usize * self.bits_per_sample as usize + 7) / 8)
    }

    fn disassociates(&self, plane: usize) -> bool {
        self.disassociate && plane + 1 == self.planes.len()
    }
}

/// A rectangle of pixels to import from a transfer buffer
#[derive(Debug, Clone, Copy)]
struct Region {
    x: u32,
    y: u32,
    columns: u32,
    rows: u32,
}

/// Imports the rows of `region` from `data`
///
/// # Returns
/// The number of out-of-range colormap indexes met
fn import_region(image: &mut Image, mode: TransferMode, plan: &TransferPlan, plane: usize, data: &[u8],
                 stride: usize, region: Region) -> usize {
    let width = image.columns as usize;
    let disassociate = plan.disassociates(plane);
    let Image { pixels, indexes, colormap, .. } = image;
    let mut invalid = 0;

    for r in 0..region.rows as usize {
        let start = (region.y as usize + r) * width + region.x as usize;
        let end = start + region.columns as usize;
        let row_data = data.get(r * stride..).unwrap_or(&[]);
        let row_indexes = if indexes.is_empty() { None } else { Some(&mut indexes[start..end]) };
        let stats = import_pixels(mode.kind, &plan.import, row_data, &mut pixels[start..end], row_indexes, colormap.as_slice());
        invalid += stats.invalid_indexes;
        if disassociate {
            disassociate_alpha(&mut pixels[start..end]);
        }
    }
    invalid
}

fn read_scanlines<R: SeekableReader>(store: &mut TagStore<R>, decoder: &mut ChunkDecoder, image: &mut Image,
                                     plan: &TransferPlan, context: &mut DecodeContext) -> TiffResult<usize> {
    let layout = *decoder.layout();
    let mut strip = transfer_buffer(context, layout.strip_size(), store.file_size(), "scanline strip")?;
    let mut buffer = transfer_buffer(context, layout.scanline_size(), store.file_size(), "scanline")?;
    let total = layout.planes() as u64 * layout.height as u64;
    let mut done = 0;
    let mut invalid = 0;

    for (plane, mode) in plan.planes.iter().enumerate() {
        let Some(mode) = *mode else {
            trace!("Plane {} carries no importable samples", plane);
            continue;
        };
        for row in 0..layout.height {
            let length = decoder.read_scanline(store, row, plane as u16, &mut strip, &mut buffer,
                                               &mut context.warnings)?;
            let stride = plan.prepare(&mut buffer[..length], layout.width, 1, mode)?;
            invalid += import_region(image, mode, plan, plane, &buffer, stride,
                                     Region { x: 0, y: row, columns: layout.width, rows: 1 });
            done += 1;
            context.report_progress(LOAD_TASK, done, total)?;
        }
    }
    Ok(invalid)
}

fn read_strips<R: SeekableReader>(store: &mut TagStore<R>, decoder: &mut ChunkDecoder, image: &mut Image,
                                  plan: &TransferPlan, context: &mut DecodeContext) -> TiffResult<usize> {
    let layout = *decoder.layout();
    let mut buffer = transfer_buffer(context, layout.strip_size(), store.file_size(), "strip")?;
    let strips = layout.strips_per_plane();
    let total = layout.planes() as u64 * strips as u64;
    let mut done = 0;
    let mut invalid = 0;

    for (plane, mode) in plan.planes.iter().enumerate() {
        let Some(mode) = *mode else {
            trace!("Plane {} carries no importable samples", plane);
            continue;
        };
        for strip in 0..strips {
            let chunk = plane as u32 * strips + strip;
            let rows = layout.strip_rows(chunk);
            buffer.clear();
            let length = decoder.read_encoded_strip(store, chunk, &mut buffer, &mut context.warnings)?;
            let stride = plan.prepare(&mut buffer[..length], layout.width, rows, mode)?;
            invalid += import_region(image, mode, plan, plane, &buffer, stride,
                                     Region { x: 0, y: strip * layout.rows_per_strip, columns: layout.width, rows });
            done += 1;
            context.report_progress(LOAD_TASK, done, total)?;
        }
    }
    Ok(invalid)
}

fn read_tiles<R: SeekableReader>(store: &mut TagStore<R>, decoder: &mut ChunkDecoder, image: &mut Image,
                                 plan: &TransferPlan, context: &mut DecodeContext) -> TiffResult<usize> {
    let layout = *decoder.layout();
    let (tile_width, tile_height) = layout.tile
        .ok_or_else(|| TiffError::structural("Tiled method on a stripped frame"))?;
    let mut buffer = transfer_buffer(context, layout.tile_size(), store.file_size(), "tile")?;
    let (across, down) = layout.tile_grid();
    let total = layout.planes() as u64 * across as u64 * down as u64;
    let mut done = 0;
    let mut invalid = 0;

    for (plane, mode) in plan.planes.iter().enumerate() {
        let Some(mode) = *mode else {
            trace!("Plane {} carries no importable samples", plane);
            continue;
        };
        for ty in 0..down {
            for tx in 0..across {
                let (x, y) = (tx * tile_width, ty * tile_height);
                let chunk = layout.tile_index(x, y, plane as u16);
                buffer.clear();
                let length = decoder.read_encoded_tile(store, chunk, &mut buffer, &mut context.warnings)?;
                let stride = plan.prepare(&mut buffer[..length], tile_width, tile_height, mode)?;
                let region = Region {
                    x,
                    y,
                    columns: tile_width.min(layout.width - x),
                    rows: tile_height.min(layout.height - y),
                };
                invalid += import_region(image, mode, plan, plane, &buffer, stride, region);
                done += 1;
                context.report_progress(LOAD_TASK, done, total)?;
            }
        }
    }
    Ok(invalid)
}

/// Generic RGBA decoding state
struct RgbaTransfer {
    materializer: RgbaMaterializer,
    bits_per_sample: u16,
    byte_order: ByteOrder,
    disassociate: bool,
}

impl RgbaTransfer {
    fn materialize(&self, data: &[u8], pixels: &mut [Pixel], row: usize, columns: u32) {
        self.materializer.materialize_row(data, row, columns, pixels);
        if self.disassociate {
            disassociate_alpha(pixels);
        }
    }
}

fn read_rgba_strips<R: SeekableReader>(store: &mut TagStore<R>, decoder: &mut ChunkDecoder, image: &mut Image,
                                       transfer: &RgbaTransfer, context: &mut DecodeContext) -> TiffResult<()> {
    let layout = *decoder.layout();
    let mut buffer = transfer_buffer(context, layout.strip_size(), store.file_size(), "RGBA strip")?;
    let strips = layout.strips_per_plane();

    for strip in 0..strips {
        buffer.clear();
        let length = decoder.read_encoded_strip(store, strip, &mut buffer, &mut context.warnings)?;
        swab_to_native(&mut buffer[..length], transfer.bits_per_sample, transfer.byte_order);
        let first = strip * layout.rows_per_strip;
        for r in 0..layout.strip_rows(strip) {
            transfer.materialize(&buffer, image.row_mut(first + r), r as usize, layout.width);
        }
        context.report_progress(LOAD_TASK, strip as u64 + 1, strips as u64)?;
    }
    Ok(())
}

fn read_rgba_tiles<R: SeekableReader>(store: &mut TagStore<R>, decoder: &mut ChunkDecoder, image: &mut Image,
                                      transfer: &RgbaTransfer, context: &mut DecodeContext) -> TiffResult<()> {
    let layout = *decoder.layout();
    let (tile_width, tile_height) = layout.tile
        .ok_or_else(|| TiffError::structural("Tiled method on a stripped frame"))?;
    let mut buffer = transfer_buffer(context, layout.tile_size(), store.file_size(), "RGBA tile")?;
    let (across, down) = layout.tile_grid();
    let total = across as u64 * down as u64;
    let mut done = 0;

    for ty in 0..down {
        for tx in 0..across {
            let (x, y) = (tx * tile_width, ty * tile_height);
            buffer.clear();
            let length = decoder.read_encoded_tile(store, layout.tile_index(x, y, 0), &mut buffer,
                                                   &mut context.warnings)?;
            swab_to_native(&mut buffer[..length], transfer.bits_per_sample, transfer.byte_order);
            let columns = tile_width.min(layout.width - x) as usize;
            for r in 0..tile_height.min(layout.height - y) {
                let row = &mut image.row_mut(y + r)[x as usize..x as usize + columns];
                transfer.materialize(&buffer, row, r as usize, tile_width);
            }
            done += 1;
            context.report_progress(LOAD_TASK, done, total)?;
        }
    }
    Ok(())
}

/// Decodes every strip into one whole-image buffer before materializing
fn read_rgba_whole<R: SeekableReader>(store: &mut TagStore<R>, decoder: &mut ChunkDecoder, image: &mut Image,
                                      transfer: &RgbaTransfer, context: &mut DecodeContext) -> TiffResult<()> {
    let layout = *decoder.layout();
    let size = layout.vstrip_size(layout.height);
    let mut buffer = transfer_buffer(context, size, store.file_size(), "whole image")?;
    let strips = layout.strips_per_plane();

    let mut offset = 0usize;
    for strip in 0..strips {
        let length = decoder.read_encoded_strip(store, strip, &mut buffer[offset..], &mut context.warnings)?;
        offset += length;
    }
    swab_to_native(&mut buffer[..offset], transfer.bits_per_sample, transfer.byte_order);

    for row in 0..layout.height {
        transfer.materialize(&buffer, image.row_mut(row), row as usize, layout.width);
        context.report_progress(LOAD_TASK, row as u64 + 1, layout.height as u64)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colormap_range_detection() {
        let eight_bit: Vec<u64> = vec![0, 255, 0, 255, 0, 255];
        let colormap = build_colormap(&eight_bit, 1).unwrap();
        assert_eq!(colormap[1].red, 65279);

        let sixteen_bit: Vec<u64> = vec![0, 65535, 0, 65535, 0, 65535];
        let colormap = build_colormap(&sixteen_bit, 1).unwrap();
        assert_eq!(colormap[1], Pixel::rgb(MAX_RGB, MAX_RGB, MAX_RGB));
        assert_eq!(colormap[0], Pixel::rgb(0, 0, 0));
    }

    #[test]
    fn test_short_colormap_is_structural() {
        assert!(build_colormap(&[0, 1, 2], 1).is_err());
    }

    #[test]
    fn test_bilevel_codec_preconditions() {
        assert!(check_compression(compression::CCITT_FAX4, photometric::MINISWHITE, 1, 1).is_ok());
        assert!(check_compression(compression::CCITT_FAX4, photometric::RGB, 8, 3).is_err());
        assert!(check_compression(compression::WEBP, photometric::RGB, 8, 4).is_ok());
        assert!(check_compression(compression::WEBP, photometric::MINISBLACK, 8, 1).is_err());
    }

    #[test]
    fn test_compression_mapping() {
        assert_eq!(compression_type(compression::DEFLATE_OLD), CompressionType::Zip);
        assert_eq!(compression_type(compression::JPEG_OLD), CompressionType::Jpeg);
        assert_eq!(compression_type(12345), CompressionType::None);
    }
}
