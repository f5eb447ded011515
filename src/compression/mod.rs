//! Compression handling for TIFF files
//!
//! This module implements strategies for handling different compression methods.

mod handler;
mod uncompressed;
mod deflate;
mod factory;
mod zstd;
mod lzw;
mod lzma;
mod packbits;
mod jpeg;
mod webp;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::AdobeDeflateHandler;
pub use factory::{CodecParams, CompressionFactory};
pub use self::zstd::ZstdHandler;
pub use lzw::LzwHandler;
pub use lzma::LzmaHandler;
pub use packbits::PackBitsHandler;
pub use jpeg::JpegHandler;
pub use webp::WebpHandler;
