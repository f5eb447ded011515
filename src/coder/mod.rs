//! TIFF coder
//!
//! Decoding from a TIFF stream into canonical images and encoding them
//! back, with the options, limits and per-call context both directions
//! share.

pub mod context;
pub mod limits;
pub mod options;
pub mod profiles;
pub mod pyramid;
pub mod read;
pub mod strategy;
pub mod write;

pub use self::context::{CoderContext, DecodeContext, EncodeContext, ProgressMonitor};
pub use self::limits::{LimitedBuffer, ResourceKind, ResourceLimiter};
pub use self::options::{AlphaType, OutputType, ReadOptions, WriteOptions};
pub use self::read::{decode, DecodeOutcome, STRATEGY_ATTRIBUTE};
pub use self::strategy::{select_method, FrameDescriptor, TiffMethod};
pub use self::write::{encode, encode_file};
