//! Canonical pixel representation shared by the reader and writer

mod image;

pub use self::image::{
    Chromaticity, ColorEntry, Colorspace, CompressionType, Image, ImageList, Interlace, Pixel,
    ResolutionUnits, StorageClass, MAX_RGB, QUANTUM_DEPTH,
};
