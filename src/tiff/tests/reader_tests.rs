//! Tests for the directory reader

use crate::tiff::reader::TiffReaderBuilder;
use crate::tiff::warnings::{WarningContext, WarningPolicy};
use super::test_utils::{
    create_out_of_range_buffer, create_test_bigtiff_buffer, create_test_tiff_buffer,
    create_test_tiff_buffer_with_next,
};

#[test]
fn test_read_classic_directory() {
    let mut cursor = create_test_tiff_buffer();
    let mut warnings = WarningContext::default();
    let tiff = TiffReaderBuilder::new().build().read(&mut cursor, &mut warnings).unwrap();

    assert!(!tiff.is_big_tiff);
    assert_eq!(tiff.ifd_count(), 1);
    assert_eq!(tiff.ifds[0].get_dimensions(), Some((800, 600)));
    assert!(warnings.warnings().is_empty());
}

#[test]
fn test_read_bigtiff_directory() {
    let mut cursor = create_test_bigtiff_buffer();
    let mut warnings = WarningContext::default();
    let tiff = TiffReaderBuilder::new().build().read(&mut cursor, &mut warnings).unwrap();

    assert!(tiff.is_big_tiff);
    assert_eq!(tiff.ifds[0].get_dimensions(), Some((1024, 768)));
}

#[test]
fn test_directory_loop_stops_chain() {
    let mut cursor = create_test_tiff_buffer_with_next(8);
    let mut warnings = WarningContext::default();
    let tiff = TiffReaderBuilder::new().build().read(&mut cursor, &mut warnings).unwrap();

    assert_eq!(tiff.ifd_count(), 1);
    assert!(warnings.warnings().iter().any(|w| w.code == "directory-loop"));
}

#[test]
fn test_out_of_range_entry_is_skipped() {
    let mut cursor = create_out_of_range_buffer();
    let mut warnings = WarningContext::new(WarningPolicy::Report, 100);
    let tiff = TiffReaderBuilder::new().build().read(&mut cursor, &mut warnings).unwrap();

    assert_eq!(tiff.ifds[0].entry_count(), 1);
    assert!(!tiff.ifds[0].has_tag(270));
    assert!(warnings.warnings().iter().any(|w| w.code == "value-out-of-range"));
}

#[test]
fn test_ignored_tags_are_dropped() {
    let mut cursor = create_test_tiff_buffer();
    let mut warnings = WarningContext::default();
    let tiff = TiffReaderBuilder::new().ignore_tags(&[257]).build().read(&mut cursor, &mut warnings).unwrap();

    assert!(tiff.ifds[0].has_tag(256));
    assert!(!tiff.ifds[0].has_tag(257));
}
