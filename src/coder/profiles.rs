//! Embedded profile blobs and text attributes
//!
//! ICC, Photoshop, IPTC and XMP blocks move between directory tags and
//! the image's named profiles: ICC is stored as "ICM", Photoshop resources
//! as "8BIM" (starting at the first resource header), RichTIFF IPTC as
//! "IPTC" and the XMP packet as "XMP". ASCII tags map onto named text
//! attributes the same way in both directions.

use log::debug;

use crate::io::byte_order::ByteOrder;
use crate::io::seekable::SeekableReader;
use crate::model::Image;
use crate::tiff::builder::DirectoryBuilder;
use crate::tiff::constants::{new_subfile_type, tags};
use crate::tiff::tag_store::TagStore;
use crate::tiff::types::TagValue;
use crate::utils::write_utils::pad_to_word;

const RESOURCE_HEADER: &[u8] = b"8BIM";

/// ASCII tags and the attribute each is stored under
pub const TEXT_ATTRIBUTES: &[(u16, &str)] = &[
    (tags::ARTIST, "artist"),
    (tags::COPYRIGHT, "copyright"),
    (tags::DATE_TIME, "timestamp"),
    (tags::DOCUMENT_NAME, "document"),
    (tags::HOST_COMPUTER, "hostcomputer"),
    (tags::IMAGE_DESCRIPTION, "comment"),
    (tags::MAKE, "make"),
    (tags::MODEL, "model"),
    (tags::PAGE_NAME, "label"),
    (tags::SOFTWARE, "software"),
];

/// Copies the text tags of the current directory into attributes
pub fn read_text_attributes<R: SeekableReader>(store: &TagStore<R>, image: &mut Image) {
    for &(tag, name) in TEXT_ATTRIBUTES {
        if let Some(text) = store.get_ascii(tag) {
            image.set_attribute(name, text);
        }
    }
    if let Some(value) = store.get_optional(tags::NEW_SUBFILE_TYPE).and_then(|v| v.first_u64()) {
        image.set_attribute("subfiletype", subfile_type_name(value as u32));
    }
}

/// Adds the text attributes to an output directory; "software" is left to the caller
pub fn write_text_attributes(image: &Image, directory: &mut DirectoryBuilder) {
    for &(tag, name) in TEXT_ATTRIBUTES.iter().filter(|(tag, _)| *tag != tags::SOFTWARE) {
        if let Some(text) = image.attribute(name).filter(|t| !t.is_empty()) {
            directory.set_ascii(tag, text);
        }
    }
}

/// Attribute text for a NewSubfileType value
pub fn subfile_type_name(value: u32) -> &'static str {
    if value & new_subfile_type::REDUCED_IMAGE != 0 {
        "REDUCEDIMAGE"
    } else if value & new_subfile_type::PAGE != 0 {
        "PAGE"
    } else if value & new_subfile_type::MASK != 0 {
        "MASK"
    } else {
        "NONE"
    }
}

/// NewSubfileType value for an attribute text
pub fn subfile_type_value(name: &str) -> Option<u32> {
    match name.to_uppercase().as_str() {
        "NONE" => Some(0),
        "REDUCEDIMAGE" => Some(new_subfile_type::REDUCED_IMAGE),
        "PAGE" => Some(new_subfile_type::PAGE),
        "MASK" => Some(new_subfile_type::MASK),
        _ => None,
    }
}

/// Finds the first Photoshop resource header, scanning 16-bit words
pub fn locate_resource_header(data: &[u8]) -> Option<usize> {
    (0..data.len().saturating_sub(RESOURCE_HEADER.len()))
        .step_by(2)
        .find(|&i| data[i..].starts_with(RESOURCE_HEADER))
}

/// Copies embedded blobs from the current directory into `image`
pub fn read_profiles<R: SeekableReader>(store: &TagStore<R>, image: &mut Image) {
    if let Some(icc) = store.get_optional_blob(tags::ICC_PROFILE) {
        debug!("ICC embedded profile with length {} bytes", icc.len());
        image.set_profile("ICM", icc);
    }
    if let Some(photoshop) = store.get_optional_blob(tags::PHOTOSHOP) {
        match locate_resource_header(&photoshop) {
            Some(start) => {
                debug!("Photoshop embedded profile with length {} bytes", photoshop.len() - start);
                image.set_profile("8BIM", photoshop[start..].to_vec());
            },
            None => debug!("Failed to find 8BIM header, ignoring Photoshop profile"),
        }
    }
    if let Some(iptc) = store.get_optional_blob(tags::RICH_TIFF_IPTC) {
        debug!("IPTC embedded profile with length {} bytes", iptc.len());
        image.set_profile("IPTC", iptc);
    }
    if let Some(xmp) = store.get_optional_blob(tags::XMP_PACKET) {
        debug!("XMP embedded profile with length {} bytes", xmp.len());
        image.set_profile("XMP", xmp);
    }
}

/// Words whose bytes, written in `order`, reproduce `data`
fn words_in_order(data: &[u8], order: ByteOrder) -> Vec<u32> {
    data.chunks_exact(4)
        .map(|w| match order {
            ByteOrder::LittleEndian => u32::from_le_bytes([w[0], w[1], w[2], w[3]]),
            ByteOrder::BigEndian => u32::from_be_bytes([w[0], w[1], w[2], w[3]]),
        })
        .collect()
}

/// Adds the image's profiles to an output directory
pub fn write_profiles(image: &Image, directory: &mut DirectoryBuilder, order: ByteOrder) {
    if let Some(xmp) = image.profile("XMP").filter(|p| !p.is_empty()) {
        debug!("XMP embedded profile with length {} bytes", xmp.len());
        directory.set(tags::XMP_PACKET, TagValue::Byte(xmp.to_vec()));
    }
    if let Some(icc) = image.profile("ICM").filter(|p| !p.is_empty()) {
        debug!("ICC embedded profile with length {} bytes", icc.len());
        directory.set_blob(tags::ICC_PROFILE, icc);
    }
    if let Some(photoshop) = image.profile("8BIM").filter(|p| !p.is_empty()) {
        let mut data = photoshop.to_vec();
        if data.len() % 2 == 1 {
            data.push(0);
        }
        debug!("Photoshop embedded profile with length {} bytes", data.len());
        directory.set(tags::PHOTOSHOP, TagValue::Byte(data));
    }
    if let Some(iptc) = image.profile("IPTC").filter(|p| !p.is_empty()) {
        let padded = pad_to_word(iptc);
        debug!("IPTC embedded profile with length {} bytes ({} words)", iptc.len(), padded.len() / 4);
        directory.set(tags::RICH_TIFF_IPTC, TagValue::Long(words_in_order(&padded, order)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Image;

    #[test]
    fn test_locate_header_on_word_boundary() {
        assert_eq!(locate_resource_header(b"xx8BIM\x04\x04"), Some(2));
        assert_eq!(locate_resource_header(b"x8BIM\x04\x04"), None);
        assert_eq!(locate_resource_header(b"8BI"), None);
    }

    #[test]
    fn test_subfile_type_names() {
        assert_eq!(subfile_type_name(0), "NONE");
        assert_eq!(subfile_type_name(new_subfile_type::REDUCED_IMAGE), "REDUCEDIMAGE");
        assert_eq!(subfile_type_value("reducedimage"), Some(new_subfile_type::REDUCED_IMAGE));
        assert_eq!(subfile_type_value("thumbnail"), None);
    }

    #[test]
    fn test_iptc_written_as_padded_words() {
        let mut image = Image::new(1, 1);
        image.set_profile("IPTC", vec![1, 2, 3, 4, 5]);
        let mut directory = DirectoryBuilder::new();
        write_profiles(&image, &mut directory, ByteOrder::BigEndian);
        assert_eq!(directory.get(tags::RICH_TIFF_IPTC), Some(&TagValue::Long(vec![0x01020304, 0x05000000])));
    }
}
