//! Chunk codec
//!
//! Strip and tile geometry, the predictor and fill order, chunk decoding
//! and encoding through the compression handlers, and the generic RGBA
//! path for layouts the transfer engine cannot classify.

pub mod decoder;
pub mod encoder;
pub mod layout;
pub mod predictor;
pub mod rgba;

pub use self::decoder::ChunkDecoder;
pub use self::encoder::ChunkEncoder;
pub use self::layout::ChunkLayout;
pub use self::rgba::RgbaMaterializer;
