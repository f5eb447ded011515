//! TIFF tag utilities
//!
//! Field type sizes, inline-storage rules and human-readable tag names.
//! Names come from the embedded `tag_names.toml` table, parsed once.

use std::collections::HashMap;
use lazy_static::lazy_static;

use crate::tiff::constants::field_types;
use crate::tiff::errors::{TiffError, TiffResult};

lazy_static! {
    // Parse the embedded name table at first use
    static ref TAG_NAMES: TagNameTable = {
        let content = include_str!("../../tag_names.toml");
        TagNameTable::from_str(content).unwrap_or_else(|e| {
            log::warn!("Failed to parse tag name table: {}", e);
            TagNameTable::default()
        })
    };
}

/// Tag id to name tables for the main, EXIF and GPS directories
#[derive(Debug, Default)]
pub struct TagNameTable {
    /// Baseline and extension tags
    pub tag_names: HashMap<u16, String>,
    /// EXIF private directory tags
    pub exif_names: HashMap<u16, String>,
    /// GPS private directory tags
    pub gps_names: HashMap<u16, String>,
}

impl TagNameTable {
    /// Parse the name table from a TOML string
    pub fn from_str(content: &str) -> TiffResult<Self> {
        let toml_value: toml::Value = match content.parse() {
            Ok(value) => value,
            Err(e) => return Err(TiffError::GenericError(format!("Failed to parse TOML: {}", e))),
        };

        let read_table = |section: &str| -> HashMap<u16, String> {
            let mut names = HashMap::new();
            if let Some(table) = toml_value.get(section).and_then(|v| v.as_table()) {
                for (k, v) in table {
                    if let (Ok(id), Some(name)) = (k.parse::<u16>(), v.as_str()) {
                        names.insert(id, name.to_string());
                    }
                }
            }
            names
        };

        Ok(TagNameTable {
            tag_names: read_table("tag_ids"),
            exif_names: read_table("exif_tag_ids"),
            gps_names: read_table("gps_tag_ids"),
        })
    }
}

/// Size in bytes of one value of a field type, `None` for unknown types
pub fn field_type_size(field_type: u16) -> Option<usize> {
    match field_type {
        field_types::BYTE | field_types::ASCII | field_types::SBYTE | field_types::UNDEFINED => Some(1),
        field_types::SHORT | field_types::SSHORT => Some(2),
        field_types::LONG | field_types::SLONG | field_types::FLOAT | field_types::IFD => Some(4),
        field_types::RATIONAL | field_types::SRATIONAL | field_types::DOUBLE => Some(8),
        field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => Some(8),
        _ => None,
    }
}

/// Determines if a value is stored inline in the entry or at an offset
///
/// # Arguments
/// * `field_type` - The entry's field type
/// * `count` - Number of values
/// * `is_big_tiff` - Whether the file is BigTIFF format
///
/// # Returns
/// true if the value fits the 4 (classic) or 8 (BigTIFF) byte value field
pub fn is_value_inline(field_type: u16, count: u64, is_big_tiff: bool) -> bool {
    let size_per_value = field_type_size(field_type).unwrap_or(1) as u64;
    let total_size = size_per_value.saturating_mul(count);
    total_size <= inline_capacity(is_big_tiff)
}

/// Number of bytes available in an entry's value field
pub fn inline_capacity(is_big_tiff: bool) -> u64 {
    if is_big_tiff { 8 } else { 4 }
}

/// Get the name of a TIFF tag
///
/// Returns "Unknown" for tags missing from the name table.
pub fn get_tag_name(tag: u16) -> &'static str {
    TAG_NAMES.tag_names.get(&tag).map(|s| s.as_str()).unwrap_or("Unknown")
}

/// Get the name of a tag from the EXIF private directory
pub fn get_exif_tag_name(tag: u16) -> Option<&'static str> {
    TAG_NAMES.exif_names.get(&tag).map(|s| s.as_str())
}

/// Get the name of a tag from the GPS private directory
pub fn get_gps_tag_name(tag: u16) -> Option<&'static str> {
    TAG_NAMES.gps_names.get(&tag).map(|s| s.as_str())
}

/// Get the name of a TIFF field type
pub fn get_field_type_name(field_type: u16) -> &'static str {
    match field_type {
        field_types::BYTE => "BYTE",
        field_types::ASCII => "ASCII",
        field_types::SHORT => "SHORT",
        field_types::LONG => "LONG",
        field_types::RATIONAL => "RATIONAL",
        field_types::SBYTE => "SBYTE",
        field_types::UNDEFINED => "UNDEFINED",
        field_types::SSHORT => "SSHORT",
        field_types::SLONG => "SLONG",
        field_types::SRATIONAL => "SRATIONAL",
        field_types::FLOAT => "FLOAT",
        field_types::DOUBLE => "DOUBLE",
        field_types::IFD => "IFD",
        field_types::LONG8 => "LONG8",
        field_types::SLONG8 => "SLONG8",
        field_types::IFD8 => "IFD8",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names_from_embedded_table() {
        assert_eq!(get_tag_name(256), "ImageWidth");
        assert_eq!(get_tag_name(34665), "ExifIFD");
        assert_eq!(get_tag_name(65000), "Unknown");
        assert_eq!(get_exif_tag_name(33434), Some("ExposureTime"));
        assert_eq!(get_gps_tag_name(2), Some("GPSLatitude"));
    }

    #[test]
    fn test_inline_rules() {
        assert!(is_value_inline(field_types::SHORT, 2, false));
        assert!(!is_value_inline(field_types::SHORT, 3, false));
        assert!(is_value_inline(field_types::SHORT, 4, true));
        assert!(!is_value_inline(field_types::RATIONAL, 1, false));
        assert!(is_value_inline(field_types::RATIONAL, 1, true));
    }
}
