//! Pixel transfer engine
//!
//! Moves samples between raw transfer buffers and canonical pixels:
//! classification of the sample layout, sample compaction, byte swapping,
//! import, export and alpha association.

pub mod alpha;
pub mod bits;
pub mod compact;
pub mod export;
pub mod import;
pub mod kind;
pub mod swab;

pub use self::alpha::{associate_alpha, disassociate_alpha};
pub use self::compact::{compact_samples, expand_samples};
pub use self::export::{export_pixels, ExportOptions};
pub use self::import::{import_pixels, ImportOptions, ImportStats, SampleType};
pub use self::kind::{classify, CompressionDescriptor, QuantumKind, TransferMode};
