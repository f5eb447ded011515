pub mod io;
pub mod tiff;
pub mod utils;
pub mod compression;
pub mod codec;
pub mod quantum;
pub mod model;
pub mod coder;
pub mod commands;
pub mod api;

pub use crate::api::{from_dynamic_image, to_dynamic_image, TiffCoder};

pub use coder::{decode, encode, encode_file, DecodeOutcome, ReadOptions, WriteOptions};
pub use model::{Image, ImageList, Pixel};
pub use tiff::{is_tiff, TiffError, TiffResult, TiffReader};
