//! Directory construction for the writer
//!
//! A `DirectoryBuilder` collects the tags of one output frame. Entries are
//! kept sorted by tag id and unique, as the container requires, so the
//! stream writer can emit them in order.

use std::collections::BTreeMap;
use log::trace;

use crate::tiff::types::TagValue;
use crate::utils::tag_utils;

/// Tag set of one directory being written
#[derive(Debug, Clone, Default)]
pub struct DirectoryBuilder {
    entries: BTreeMap<u16, TagValue>,
}

impl DirectoryBuilder {
    /// Create an empty directory
    pub fn new() -> Self {
        DirectoryBuilder::default()
    }

    /// Sets a tag, replacing any earlier value
    pub fn set(&mut self, tag: u16, value: TagValue) {
        trace!("Set tag {} ({}) = {}", tag, tag_utils::get_tag_name(tag), value);
        self.entries.insert(tag, value);
    }

    /// Sets a SHORT tag
    pub fn set_short(&mut self, tag: u16, value: u16) {
        self.set(tag, TagValue::Short(vec![value]));
    }

    /// Sets a SHORT array tag
    pub fn set_shorts(&mut self, tag: u16, values: Vec<u16>) {
        self.set(tag, TagValue::Short(values));
    }

    /// Sets a LONG tag
    pub fn set_long(&mut self, tag: u16, value: u32) {
        self.set(tag, TagValue::Long(vec![value]));
    }

    /// Sets an ASCII tag; empty strings are not written
    pub fn set_ascii(&mut self, tag: u16, value: &str) {
        if !value.is_empty() {
            self.set(tag, TagValue::Ascii(value.to_string()));
        }
    }

    /// Sets a RATIONAL tag from a floating point value
    pub fn set_rational(&mut self, tag: u16, value: f64) {
        self.set(tag, TagValue::Rational(vec![rational_from_f64(value)]));
    }

    /// Sets a RATIONAL array tag from floating point values
    pub fn set_rationals(&mut self, tag: u16, values: &[f64]) {
        self.set(tag, TagValue::Rational(values.iter().map(|&v| rational_from_f64(v)).collect()));
    }

    /// Sets an UNDEFINED blob tag
    pub fn set_blob(&mut self, tag: u16, data: &[u8]) {
        if !data.is_empty() {
            self.set(tag, TagValue::Undefined(data.to_vec()));
        }
    }

    /// Removes a tag
    pub fn remove(&mut self, tag: u16) -> Option<TagValue> {
        self.entries.remove(&tag)
    }

    /// Value of a tag
    pub fn get(&self, tag: u16) -> Option<&TagValue> {
        self.entries.get(&tag)
    }

    /// Whether a tag is set
    pub fn contains(&self, tag: u16) -> bool {
        self.entries.contains_key(&tag)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending tag order
    pub fn entries(&self) -> impl Iterator<Item = (&u16, &TagValue)> {
        self.entries.iter()
    }
}

/// Converts a non-negative value to a RATIONAL with a fixed denominator
pub fn rational_from_f64(value: f64) -> (u32, u32) {
    if !value.is_finite() || value <= 0.0 {
        return (0, 1);
    }
    let mut denominator: u32 = 10000;
    while denominator > 1 && value * denominator as f64 > u32::MAX as f64 {
        denominator /= 10;
    }
    let numerator = (value * denominator as f64).round().min(u32::MAX as f64) as u32;
    (numerator, denominator)
}
