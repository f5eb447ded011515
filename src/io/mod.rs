//! I/O utilities for stream handling
//!
//! This module provides the seekable stream traits and the byte order
//! strategies used by both the reader and the writer.

pub mod seekable;
pub mod byte_order;
