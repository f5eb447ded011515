//! TIFF format constants
//!
//! This module defines constants used throughout the TIFF coding code,
//! replacing magic numbers with descriptive names.

/// TIFF header constants
pub mod header {
    /// Standard TIFF version number (42)
    pub const TIFF_VERSION: u16 = 42;

    /// BigTIFF version number (43)
    pub const BIG_TIFF_VERSION: u16 = 43;

    /// "II" byte order marker for little-endian
    pub const LITTLE_ENDIAN_MARKER: [u8; 2] = [0x49, 0x49];

    /// "MM" byte order marker for big-endian
    pub const BIG_ENDIAN_MARKER: [u8; 2] = [0x4D, 0x4D];

    /// BigTIFF offset size (8 bytes)
    pub const BIGTIFF_OFFSET_SIZE: u16 = 8;
}

/// Field types as defined by TIFF 6.0 and BigTIFF
pub mod field_types {
    pub const BYTE: u16 = 1;       // 8-bit unsigned integer
    pub const ASCII: u16 = 2;      // 8-bit byte containing ASCII character
    pub const SHORT: u16 = 3;      // 16-bit unsigned integer
    pub const LONG: u16 = 4;       // 32-bit unsigned integer
    pub const RATIONAL: u16 = 5;   // Two LONGs: numerator and denominator
    pub const SBYTE: u16 = 6;      // 8-bit signed integer
    pub const UNDEFINED: u16 = 7;  // 8-bit byte with unspecified format
    pub const SSHORT: u16 = 8;     // 16-bit signed integer
    pub const SLONG: u16 = 9;      // 32-bit signed integer
    pub const SRATIONAL: u16 = 10; // Two SLONGs: numerator and denominator
    pub const FLOAT: u16 = 11;     // Single precision IEEE floating point
    pub const DOUBLE: u16 = 12;    // Double precision IEEE floating point
    pub const IFD: u16 = 13;       // 32-bit sub-directory offset
    pub const LONG8: u16 = 16;     // BigTIFF 64-bit unsigned integer
    pub const SLONG8: u16 = 17;    // BigTIFF 64-bit signed integer
    pub const IFD8: u16 = 18;      // BigTIFF 64-bit IFD offset
}

/// Standard TIFF tags
pub mod tags {
    // Basic image structure tags
    pub const NEW_SUBFILE_TYPE: u16 = 254;         // Subfile data descriptor
    pub const SUBFILE_TYPE: u16 = 255;             // Old-style subfile data descriptor
    pub const IMAGE_WIDTH: u16 = 256;              // Width of the image in pixels
    pub const IMAGE_LENGTH: u16 = 257;             // Height of the image in pixels
    pub const BITS_PER_SAMPLE: u16 = 258;          // Bits per component
    pub const COMPRESSION: u16 = 259;              // Compression scheme
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262; // Color space of image data
    pub const FILL_ORDER: u16 = 266;               // Logical order of bits within a byte
    pub const DOCUMENT_NAME: u16 = 269;            // Name of the scanned document
    pub const IMAGE_DESCRIPTION: u16 = 270;        // Free-form description
    pub const MAKE: u16 = 271;                     // Scanner or camera manufacturer
    pub const MODEL: u16 = 272;                    // Scanner or camera model
    pub const STRIP_OFFSETS: u16 = 273;            // Offsets to the data strips
    pub const ORIENTATION: u16 = 274;              // Image orientation
    pub const SAMPLES_PER_PIXEL: u16 = 277;        // Number of components per pixel
    pub const ROWS_PER_STRIP: u16 = 278;           // Rows per strip of data
    pub const STRIP_BYTE_COUNTS: u16 = 279;        // Bytes counts for strips
    pub const MIN_SAMPLE_VALUE: u16 = 280;         // Minimum component value
    pub const MAX_SAMPLE_VALUE: u16 = 281;         // Maximum component value
    pub const X_RESOLUTION: u16 = 282;             // Horizontal resolution
    pub const Y_RESOLUTION: u16 = 283;             // Vertical resolution
    pub const PLANAR_CONFIGURATION: u16 = 284;     // How components are stored
    pub const PAGE_NAME: u16 = 285;                // Name of the page
    pub const GROUP3_OPTIONS: u16 = 292;           // CCITT Group 3 options
    pub const GROUP4_OPTIONS: u16 = 293;           // CCITT Group 4 options
    pub const RESOLUTION_UNIT: u16 = 296;          // Unit of measurement for resolution
    pub const PAGE_NUMBER: u16 = 297;              // Page number and page count
    pub const SOFTWARE: u16 = 305;                 // Software used to create the image
    pub const DATE_TIME: u16 = 306;                // Date and time of image creation
    pub const ARTIST: u16 = 315;                   // Person who created the image
    pub const HOST_COMPUTER: u16 = 316;            // Computer where the image was created
    pub const PREDICTOR: u16 = 317;                // Prediction scheme used on image data
    pub const WHITE_POINT: u16 = 318;              // Chromaticity of the white point
    pub const PRIMARY_CHROMATICITIES: u16 = 319;   // Chromaticities of the primaries
    pub const COLOR_MAP: u16 = 320;                // Colormap for palette color images
    pub const TILE_WIDTH: u16 = 322;               // Width of a tile
    pub const TILE_LENGTH: u16 = 323;              // Length of a tile
    pub const TILE_OFFSETS: u16 = 324;             // Offsets to the data tiles
    pub const TILE_BYTE_COUNTS: u16 = 325;         // Byte counts for tiles
    pub const SUB_IFDS: u16 = 330;                 // Offsets of child directories
    pub const INK_SET: u16 = 332;                  // Inks used in a separated image
    pub const EXTRA_SAMPLES: u16 = 338;            // Description of extra components
    pub const SAMPLE_FORMAT: u16 = 339;            // Interpretation of sample data
    pub const S_MIN_SAMPLE_VALUE: u16 = 340;       // Minimum sample value (typed)
    pub const S_MAX_SAMPLE_VALUE: u16 = 341;       // Maximum sample value (typed)
    pub const JPEG_TABLES: u16 = 347;              // Shared JPEG quantization/huffman tables
    pub const YCBCR_SUBSAMPLING: u16 = 530;        // Chroma subsampling factors
    pub const REFERENCE_BLACK_WHITE: u16 = 532;    // Reference black and white points
    pub const XMP_PACKET: u16 = 700;               // XMP metadata packet
    pub const COPYRIGHT: u16 = 33432;              // Copyright notice
    pub const RICH_TIFF_IPTC: u16 = 33723;         // IPTC-NAA record
    pub const PHOTOSHOP: u16 = 34377;              // Photoshop image resources
    pub const EXIF_IFD: u16 = 34665;               // Pointer to the EXIF private directory
    pub const ICC_PROFILE: u16 = 34675;            // Embedded ICC color profile
    pub const GPS_IFD: u16 = 34853;                // Pointer to the GPS private directory
}

/// Compression types
pub mod compression {
    pub const NONE: u16 = 1;              // No compression
    pub const CCITT_RLE: u16 = 2;         // CCITT modified Huffman RLE
    pub const CCITT_FAX3: u16 = 3;        // CCITT Group 3 fax
    pub const CCITT_FAX4: u16 = 4;        // CCITT Group 4 fax
    pub const LZW: u16 = 5;               // LZW compression
    pub const JPEG_OLD: u16 = 6;          // Old JPEG (deprecated)
    pub const JPEG: u16 = 7;              // JPEG compression
    pub const DEFLATE: u16 = 8;           // Adobe Deflate (zlib)
    pub const JBIG_BW: u16 = 9;           // JBIG for bi-level images
    pub const JBIG_COLOR: u16 = 10;       // JBIG for color images
    pub const PACKBITS: u16 = 32773;      // PackBits compression
    pub const DEFLATE_OLD: u16 = 32946;   // Pre-standard Deflate
    pub const JBIG: u16 = 34661;          // ISO JBIG
    pub const SGILOG: u16 = 34676;        // SGI LogLuv 32-bit
    pub const SGILOG24: u16 = 34677;      // SGI LogLuv 24-bit
    pub const LZMA: u16 = 34925;          // LZMA2
    pub const ZSTD: u16 = 50000;          // Zstandard compression
    pub const WEBP: u16 = 50001;          // WebP compression
}

/// Photometric interpretation values
pub mod photometric {
    pub const MINISWHITE: u16 = 0;        // Minimum value is white
    pub const MINISBLACK: u16 = 1;        // Minimum value is black
    pub const RGB: u16 = 2;               // RGB color model
    pub const PALETTE: u16 = 3;           // Palette color (color map indexed)
    pub const MASK: u16 = 4;              // Transparency mask
    pub const SEPARATED: u16 = 5;         // Ink separations, usually CMYK
    pub const YCBCR: u16 = 6;             // YCbCr color model
    pub const CIELAB: u16 = 8;            // CIE L*a*b color model
    pub const ICCLAB: u16 = 9;            // ICC L*a*b
    pub const ITULAB: u16 = 10;           // ITU L*a*b
    pub const LOGL: u16 = 32844;          // CIE Log2(L)
    pub const LOGLUV: u16 = 32845;        // CIE Log2(L) (u',v')
}

/// Planar configuration values
pub mod planar_config {
    pub const CONTIG: u16 = 1;            // Components stored interleaved (RGBRGBRGB)
    pub const SEPARATE: u16 = 2;          // Components stored separately (RRR...GGG...BBB)
}

/// Sample format values
pub mod sample_format {
    pub const UINT: u16 = 1;              // Unsigned integer data
    pub const INT: u16 = 2;               // Signed integer data
    pub const IEEEFP: u16 = 3;            // IEEE floating point data
    pub const VOID: u16 = 4;              // Undefined data format
    pub const COMPLEX_INT: u16 = 5;       // Complex integer data
    pub const COMPLEX_IEEEFP: u16 = 6;    // Complex floating point data
}

/// Resolution unit values
pub mod resolution_unit {
    pub const NONE: u16 = 1;              // No meaningful units
    pub const INCH: u16 = 2;              // Inches (default)
    pub const CENTIMETER: u16 = 3;        // Centimeters
}

/// Orientation values
pub mod orientation {
    pub const TOP_LEFT: u16 = 1;          // 0th row = top, 0th column = left side
    pub const LEFT_BOTTOM: u16 = 8;       // 0th row = left side, 0th column = bottom
}

/// Predictor values
pub mod predictor {
    pub const NONE: u16 = 1;                    // No prediction scheme
    pub const HORIZONTAL: u16 = 2;              // Horizontal differencing
    pub const FLOATING_POINT: u16 = 3;          // Floating point predictor
}

/// Fill order values
pub mod fill_order {
    pub const MSB2LSB: u16 = 1;                 // Most significant bit to least
    pub const LSB2MSB: u16 = 2;                 // Least significant bit to most
}

/// Extra sample values
pub mod extra_samples {
    pub const UNSPECIFIED: u16 = 0;             // Unspecified data
    pub const ASSOCIATED_ALPHA: u16 = 1;        // Associated alpha data
    pub const UNASSOCIATED_ALPHA: u16 = 2;      // Unassociated alpha data
}

/// Subfile type bit flags
pub mod new_subfile_type {
    pub const REDUCED_IMAGE: u32 = 1;           // Reduced resolution version of another image
    pub const PAGE: u32 = 2;                    // One page of many
    pub const MASK: u32 = 4;                    // Transparency mask for another image
}

/// Ink set values
pub mod ink_set {
    pub const CMYK: u16 = 1;                    // Cyan, magenta, yellow, black
}

/// Coder-level limits shared by reader and writer
pub mod limits {
    /// Largest colormap the canonical image can hold
    pub const MAX_COLORMAP_SIZE: usize = 65536;

    /// Largest quantum depth of the canonical pixel
    pub const MAX_QUANTUM_DEPTH: u16 = 16;

    /// Largest samples-per-pixel or extra-samples count accepted on read
    pub const MAX_SAMPLES: u16 = 8;

    /// Default ratio between a working buffer and the stream size
    pub const MAX_COMPRESS_RATIO: u64 = 1000;

    /// Strip size below which the stripped strategy is preferred
    pub const SMALL_STRIP_THRESHOLD: u64 = 256 * 1024;

    /// Uncompressed bytes per strip targeted by the writer
    pub const BYTES_PER_STRIP: u64 = 1024 * 1024;

    /// Tiles up to this extent may overhang a smaller frame
    pub const MAX_TILE_OVERHANG: u32 = 2048;

    /// Strip count ceiling kept for 16-bit strip counters
    pub const MAX_STRIPS: u32 = 32767;

    /// Default strip size used when deriving rows-per-strip
    pub const DEFAULT_STRIP_BYTES: u64 = 8192;

    /// Default quality for lossy and level-mapped compression
    pub const DEFAULT_QUALITY: u8 = 75;
}
