//! Tests for the TIFF types module

use crate::io::byte_order::ByteOrder;
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::{TagValue, TIFF};

fn long_entry(tag: u16, value: u32) -> IFDEntry {
    IFDEntry::new(tag, 4, 1, value as u64, value.to_le_bytes().to_vec())
}

#[test]
fn test_tiff_creation() {
    let tiff = TIFF::new(false, ByteOrder::LittleEndian);
    assert!(!tiff.is_big_tiff);
    assert_eq!(tiff.ifd_count(), 0);
    assert!(tiff.main_ifd().is_none());
}

#[test]
fn test_tiff_with_reduced_images() {
    let mut tiff = TIFF::new(true, ByteOrder::LittleEndian);

    let mut main_ifd = IFD::new(0, 16, ByteOrder::LittleEndian);
    main_ifd.add_entry(long_entry(256, 1024));
    main_ifd.add_entry(long_entry(257, 768));
    tiff.ifds.push(main_ifd);

    // Subfile type 1 marks a reduced-resolution image
    let mut reduced_ifd = IFD::new(1, 100, ByteOrder::LittleEndian);
    reduced_ifd.add_entry(long_entry(254, 1));
    reduced_ifd.add_entry(long_entry(256, 512));
    reduced_ifd.add_entry(long_entry(257, 384));
    tiff.ifds.push(reduced_ifd);

    assert!(tiff.is_big_tiff);
    assert_eq!(tiff.ifd_count(), 2);
    assert_eq!(tiff.main_ifd().and_then(|ifd| ifd.get_dimensions()), Some((1024, 768)));

    let reduced = tiff.reduced_images();
    assert_eq!(reduced.len(), 1);
    assert_eq!(reduced[0].get_dimensions(), Some((512, 384)));
}

#[test]
fn test_duplicate_entry_keeps_first() {
    let mut ifd = IFD::new(0, 8, ByteOrder::LittleEndian);
    assert!(ifd.add_entry(long_entry(256, 10)));
    assert!(!ifd.add_entry(long_entry(256, 20)));
    assert_eq!(ifd.get_u64(256), Some(10));
    assert_eq!(ifd.entry_count(), 1);
}

#[test]
fn test_big_endian_entry_value() {
    let mut ifd = IFD::new(0, 8, ByteOrder::BigEndian);
    ifd.add_entry(IFDEntry::new(258, 3, 3, 0, vec![0, 8, 0, 8, 0, 8]));
    assert_eq!(ifd.get_value(258), Some(TagValue::Short(vec![8, 8, 8])));
}
