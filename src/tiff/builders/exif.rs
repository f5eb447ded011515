//! EXIF and GPS private directories
//!
//! On read, the EXIF and GPS sub-IFDs of a frame are packed into an
//! `"Exif"` profile: the APP1 identifier followed by a small TIFF stream
//! whose first directory points at the two private directories. On write,
//! that profile is parsed back and its entries are copied into new private
//! directories, best effort: numeric, ASCII and undefined fields survive,
//! signed rationals are copied verbatim and nested pointers are dropped.

use std::io::Cursor;
use log::{debug, warn};

use crate::io::byte_order::ByteOrder;
use crate::tiff::builder::DirectoryBuilder;
use crate::tiff::builders::writer::{DirectoryLocation, TiffStreamWriter};
use crate::tiff::constants::tags;
use crate::tiff::errors::TiffResult;
use crate::tiff::ifd::IFD;
use crate::tiff::tag_store::TagStore;
use crate::tiff::types::TagValue;
use crate::tiff::warnings::WarningContext;
use crate::utils::tag_utils;

/// APP1 identifier that prefixes an EXIF profile
pub const EXIF_IDENTIFIER: &[u8] = b"Exif\0\0";

/// Interoperability sub-directory pointer inside the EXIF directory
const INTEROPERABILITY_IFD: u16 = 40965;

/// Entries of the EXIF and GPS private directories
#[derive(Debug, Default, Clone)]
pub struct ExifDirectories {
    pub exif: Option<DirectoryBuilder>,
    pub gps: Option<DirectoryBuilder>,
}

impl ExifDirectories {
    /// Whether neither directory has entries
    pub fn is_empty(&self) -> bool {
        self.exif.as_ref().map_or(true, |d| d.is_empty())
            && self.gps.as_ref().map_or(true, |d| d.is_empty())
    }
}

/// Whether an entry survives copying into a reconstructed directory
fn is_copyable(tag: u16, value: &TagValue) -> bool {
    if matches!(tag, tags::EXIF_IFD | tags::GPS_IFD | INTEROPERABILITY_IFD) {
        return false;
    }
    !matches!(value, TagValue::Ifd(_) | TagValue::Ifd8(_))
}

/// Copies the entries of a private directory, skipping nested pointers
pub fn copy_directory(ifd: &IFD) -> DirectoryBuilder {
    let mut directory = DirectoryBuilder::new();
    for entry in &ifd.entries {
        match entry.value(ifd.byte_order) {
            Ok(value) if is_copyable(entry.tag, &value) => directory.set(entry.tag, value),
            Ok(_) => debug!("Skipping nested pointer tag {}", entry.tag),
            Err(e) => debug!("Skipping undecodable EXIF tag {}: {}", entry.tag, e),
        }
    }
    directory
}

/// Placeholder pointer value, patched after the private directory is written
pub fn pointer_placeholder(is_big_tiff: bool) -> TagValue {
    if is_big_tiff {
        TagValue::Long8(vec![0])
    } else {
        TagValue::Long(vec![0])
    }
}

/// Packs the private directories into an `"Exif"` profile blob
pub fn build_exif_profile(directories: &ExifDirectories, byte_order: ByteOrder) -> TiffResult<Vec<u8>> {
    let mut writer = TiffStreamWriter::new(Cursor::new(Vec::new()), false, byte_order)?;

    let mut root = DirectoryBuilder::new();
    if directories.exif.is_some() {
        root.set(tags::EXIF_IFD, pointer_placeholder(false));
    }
    if directories.gps.is_some() {
        root.set(tags::GPS_IFD, pointer_placeholder(false));
    }
    let location = writer.write_directory(&root, true)?;
    write_private_directories(&mut writer, &location, directories)?;

    let stream = writer.finish()?.into_inner();
    let mut profile = Vec::with_capacity(EXIF_IDENTIFIER.len() + stream.len());
    profile.extend_from_slice(EXIF_IDENTIFIER);
    profile.extend_from_slice(&stream);
    Ok(profile)
}

/// Parses an `"Exif"` profile back into its private directories
///
/// The APP1 identifier is optional. Unreadable sub-directories are
/// dropped with a warning.
pub fn parse_exif_profile(profile: &[u8], warnings: &mut WarningContext) -> TiffResult<ExifDirectories> {
    let stream = profile.strip_prefix(EXIF_IDENTIFIER).unwrap_or(profile);
    let mut store = TagStore::open(Cursor::new(stream.to_vec()), &[], warnings)?;

    let mut directories = ExifDirectories::default();
    for (pointer, is_gps) in [(tags::EXIF_IFD, false), (tags::GPS_IFD, true)] {
        let offset = match store.get_optional(pointer).and_then(|v| v.first_u64()) {
            Some(offset) if offset != 0 => offset,
            _ => continue,
        };
        match store.read_sub_directory(offset, warnings) {
            Ok(ifd) => {
                let copied = copy_directory(&ifd);
                debug!("{} directory: {} entries copied", tag_utils::get_tag_name(pointer), copied.len());
                if is_gps {
                    directories.gps = Some(copied);
                } else {
                    directories.exif = Some(copied);
                }
            },
            Err(e) => warnings.warn("exif-dropped", format!(
                "{} directory at {} unreadable: {}", tag_utils::get_tag_name(pointer), offset, e)),
        }
    }
    Ok(directories)
}

/// Writes the private directories and back-patches their pointers
///
/// The pointer tags must already be present, as placeholders, in the
/// directory at `location`.
pub fn write_private_directories<W: std::io::Write + std::io::Seek>(
    writer: &mut TiffStreamWriter<W>,
    location: &DirectoryLocation,
    directories: &ExifDirectories,
) -> TiffResult<()> {
    for (pointer, directory) in [(tags::EXIF_IFD, &directories.exif), (tags::GPS_IFD, &directories.gps)] {
        let Some(directory) = directory else { continue };
        if !location.value_positions.contains_key(&pointer) {
            warn!("No {} entry to patch, private directory not written", tag_utils::get_tag_name(pointer));
            continue;
        }
        let private = writer.write_directory(directory, false)?;
        writer.patch_entry(location, pointer, private.offset)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_directories() -> ExifDirectories {
        let mut exif = DirectoryBuilder::new();
        exif.set(33434, TagValue::Rational(vec![(1, 250)]));
        exif.set(37380, TagValue::SRational(vec![(-1, 3)]));
        exif.set(36867, TagValue::Ascii("2024:01:02 03:04:05".into()));
        exif.set(INTEROPERABILITY_IFD, TagValue::Long(vec![1234]));
        let mut gps = DirectoryBuilder::new();
        gps.set(0, TagValue::Byte(vec![2, 3, 0, 0]));
        ExifDirectories { exif: Some(exif), gps: Some(gps) }
    }

    #[test]
    fn test_profile_reconstruction_skips_nested_pointers() {
        let profile = build_exif_profile(&sample_directories(), ByteOrder::BigEndian).unwrap();
        assert!(profile.starts_with(EXIF_IDENTIFIER));

        let mut warnings = WarningContext::default();
        let parsed = parse_exif_profile(&profile, &mut warnings).unwrap();
        let exif = parsed.exif.unwrap();
        assert_eq!(exif.get(37380), Some(&TagValue::SRational(vec![(-1, 3)])));
        assert_eq!(exif.get(33434), Some(&TagValue::Rational(vec![(1, 250)])));
        assert!(!exif.contains(INTEROPERABILITY_IFD));
        assert_eq!(parsed.gps.unwrap().get(0), Some(&TagValue::Byte(vec![2, 3, 0, 0])));
    }
}
