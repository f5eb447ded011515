//! Core TIFF data structures
//!
//! `TagValue` is the typed form of one directory entry's payload and
//! `TIFF` is the parsed container summary used by analysis.

use std::fmt;
use std::io::Cursor;

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::tiff::constants::{field_types, new_subfile_type, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::utils::tag_utils;

/// Typed value of a directory entry
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Byte(Vec<u8>),
    Ascii(String),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    SByte(Vec<i8>),
    Undefined(Vec<u8>),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<(i32, i32)>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Ifd(Vec<u32>),
    Long8(Vec<u64>),
    SLong8(Vec<i64>),
    Ifd8(Vec<u64>),
}

impl TagValue {
    /// The TIFF field type code of this value
    pub fn field_type(&self) -> u16 {
        match self {
            TagValue::Byte(_) => field_types::BYTE,
            TagValue::Ascii(_) => field_types::ASCII,
            TagValue::Short(_) => field_types::SHORT,
            TagValue::Long(_) => field_types::LONG,
            TagValue::Rational(_) => field_types::RATIONAL,
            TagValue::SByte(_) => field_types::SBYTE,
            TagValue::Undefined(_) => field_types::UNDEFINED,
            TagValue::SShort(_) => field_types::SSHORT,
            TagValue::SLong(_) => field_types::SLONG,
            TagValue::SRational(_) => field_types::SRATIONAL,
            TagValue::Float(_) => field_types::FLOAT,
            TagValue::Double(_) => field_types::DOUBLE,
            TagValue::Ifd(_) => field_types::IFD,
            TagValue::Long8(_) => field_types::LONG8,
            TagValue::SLong8(_) => field_types::SLONG8,
            TagValue::Ifd8(_) => field_types::IFD8,
        }
    }

    /// Number of values, as stored in the entry's count field
    pub fn count(&self) -> u64 {
        let count = match self {
            TagValue::Byte(v) | TagValue::Undefined(v) => v.len(),
            // ASCII counts include the terminating NUL
            TagValue::Ascii(s) => s.len() + 1,
            TagValue::Short(v) => v.len(),
            TagValue::Long(v) | TagValue::Ifd(v) => v.len(),
            TagValue::Rational(v) => v.len(),
            TagValue::SByte(v) => v.len(),
            TagValue::SShort(v) => v.len(),
            TagValue::SLong(v) => v.len(),
            TagValue::SRational(v) => v.len(),
            TagValue::Float(v) => v.len(),
            TagValue::Double(v) => v.len(),
            TagValue::Long8(v) | TagValue::Ifd8(v) => v.len(),
            TagValue::SLong8(v) => v.len(),
        };
        count as u64
    }

    /// Decodes raw entry bytes, stored in stream byte order
    ///
    /// # Arguments
    /// * `field_type` - The TIFF field type of the entry
    /// * `count` - Number of values in the entry
    /// * `data` - The value bytes, at least `count * size` long
    /// * `handler` - Byte order of the stream the bytes came from
    ///
    /// # Returns
    /// The decoded value, or an error for unknown types or short data
    pub fn decode(field_type: u16, count: u64, data: &[u8], handler: &dyn ByteOrderHandler) -> TiffResult<TagValue> {
        let size = tag_utils::field_type_size(field_type)
            .ok_or(TiffError::UnsupportedFieldType(field_type))?;
        let total = (count as usize).checked_mul(size)
            .ok_or_else(|| TiffError::structural(format!("Entry count {} overflows", count)))?;
        if data.len() < total {
            return Err(TiffError::structural(format!(
                "Entry needs {} bytes but only {} are available", total, data.len())));
        }

        let n = count as usize;
        let mut cursor = Cursor::new(&data[..total]);
        let value = match field_type {
            field_types::BYTE => TagValue::Byte(data[..total].to_vec()),
            field_types::UNDEFINED => TagValue::Undefined(data[..total].to_vec()),
            field_types::SBYTE => TagValue::SByte(data[..total].iter().map(|&b| b as i8).collect()),
            field_types::ASCII => {
                let raw = &data[..total];
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                TagValue::Ascii(String::from_utf8_lossy(&raw[..end]).into_owned())
            },
            field_types::SHORT => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_u16(&mut cursor)?);
                }
                TagValue::Short(values)
            },
            field_types::SSHORT => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_i16(&mut cursor)?);
                }
                TagValue::SShort(values)
            },
            field_types::LONG | field_types::IFD => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_u32(&mut cursor)?);
                }
                if field_type == field_types::IFD {
                    TagValue::Ifd(values)
                } else {
                    TagValue::Long(values)
                }
            },
            field_types::SLONG => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_i32(&mut cursor)?);
                }
                TagValue::SLong(values)
            },
            field_types::RATIONAL => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_rational(&mut cursor)?);
                }
                TagValue::Rational(values)
            },
            field_types::SRATIONAL => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_srational(&mut cursor)?);
                }
                TagValue::SRational(values)
            },
            field_types::FLOAT => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_f32(&mut cursor)?);
                }
                TagValue::Float(values)
            },
            field_types::DOUBLE => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_f64(&mut cursor)?);
                }
                TagValue::Double(values)
            },
            field_types::LONG8 | field_types::IFD8 => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_u64(&mut cursor)?);
                }
                if field_type == field_types::IFD8 {
                    TagValue::Ifd8(values)
                } else {
                    TagValue::Long8(values)
                }
            },
            field_types::SLONG8 => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_i64(&mut cursor)?);
                }
                TagValue::SLong8(values)
            },
            _ => return Err(TiffError::UnsupportedFieldType(field_type)),
        };

        Ok(value)
    }

    /// Encodes the value into bytes of the given byte order
    pub fn encode(&self, handler: &dyn ByteOrderHandler) -> TiffResult<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        match self {
            TagValue::Byte(v) | TagValue::Undefined(v) => out.extend_from_slice(v),
            TagValue::SByte(v) => out.extend(v.iter().map(|&b| b as u8)),
            TagValue::Ascii(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            },
            TagValue::Short(v) => {
                for &x in v {
                    handler.write_u16(&mut out, x)?;
                }
            },
            TagValue::SShort(v) => {
                for &x in v {
                    handler.write_u16(&mut out, x as u16)?;
                }
            },
            TagValue::Long(v) | TagValue::Ifd(v) => {
                for &x in v {
                    handler.write_u32(&mut out, x)?;
                }
            },
            TagValue::SLong(v) => {
                for &x in v {
                    handler.write_u32(&mut out, x as u32)?;
                }
            },
            TagValue::Rational(v) => {
                for &(num, den) in v {
                    handler.write_u32(&mut out, num)?;
                    handler.write_u32(&mut out, den)?;
                }
            },
            TagValue::SRational(v) => {
                for &(num, den) in v {
                    handler.write_u32(&mut out, num as u32)?;
                    handler.write_u32(&mut out, den as u32)?;
                }
            },
            TagValue::Float(v) => {
                for &x in v {
                    handler.write_f32(&mut out, x)?;
                }
            },
            TagValue::Double(v) => {
                for &x in v {
                    handler.write_f64(&mut out, x)?;
                }
            },
            TagValue::Long8(v) | TagValue::Ifd8(v) => {
                for &x in v {
                    handler.write_u64(&mut out, x)?;
                }
            },
            TagValue::SLong8(v) => {
                for &x in v {
                    handler.write_u64(&mut out, x as u64)?;
                }
            },
        }
        Ok(out)
    }

    /// Unsigned integer values widened to u64
    pub fn as_u64_vec(&self) -> Option<Vec<u64>> {
        match self {
            TagValue::Byte(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TagValue::Short(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TagValue::Long(v) | TagValue::Ifd(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TagValue::Long8(v) | TagValue::Ifd8(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// First unsigned integer value
    pub fn first_u64(&self) -> Option<u64> {
        self.as_u64_vec().and_then(|v| v.first().copied())
    }

    /// Any numeric value converted to f64; rationals with a zero
    /// denominator become 0.0
    pub fn as_f64_vec(&self) -> Option<Vec<f64>> {
        let ratio = |num: f64, den: f64| if den == 0.0 { 0.0 } else { num / den };
        match self {
            TagValue::Rational(v) => Some(v.iter().map(|&(n, d)| ratio(n as f64, d as f64)).collect()),
            TagValue::SRational(v) => Some(v.iter().map(|&(n, d)| ratio(n as f64, d as f64)).collect()),
            TagValue::Float(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TagValue::Double(v) => Some(v.clone()),
            TagValue::SByte(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TagValue::SShort(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TagValue::SLong(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TagValue::SLong8(v) => Some(v.iter().map(|&x| x as f64).collect()),
            other => other.as_u64_vec().map(|v| v.into_iter().map(|x| x as f64).collect()),
        }
    }

    /// First numeric value as f64
    pub fn first_f64(&self) -> Option<f64> {
        self.as_f64_vec().and_then(|v| v.first().copied())
    }

    /// The string of an ASCII value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Ascii(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Raw bytes of BYTE, UNDEFINED and ASCII values
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TagValue::Byte(v) | TagValue::Undefined(v) => Some(v.as_slice()),
            TagValue::Ascii(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 8;
        if let TagValue::Ascii(s) = self {
            return write!(f, "\"{}\"", s);
        }
        let values: Vec<String> = match self.as_f64_vec() {
            Some(v) if matches!(self, TagValue::Rational(_) | TagValue::SRational(_)
                | TagValue::Float(_) | TagValue::Double(_)) => {
                v.iter().take(SHOWN).map(|x| format!("{:.4}", x)).collect()
            },
            Some(v) => v.iter().take(SHOWN).map(|x| format!("{}", x)).collect(),
            None => Vec::new(),
        };
        write!(f, "{}", values.join(", "))?;
        if self.count() as usize > SHOWN {
            write!(f, ", ... ({} values)", self.count())?;
        }
        Ok(())
    }
}

/// Represents a TIFF file with its Image File Directories (IFDs)
#[derive(Debug)]
pub struct TIFF {
    /// Image File Directories in the TIFF file
    pub ifds: Vec<IFD>,
    /// Whether this is a BigTIFF format
    pub is_big_tiff: bool,
    /// Byte order of the stream
    pub byte_order: ByteOrder,
}

impl TIFF {
    /// Creates a new empty TIFF structure
    pub fn new(is_big_tiff: bool, byte_order: ByteOrder) -> Self {
        TIFF {
            ifds: Vec::new(),
            is_big_tiff,
            byte_order,
        }
    }

    /// Returns the main (first) IFD if available
    pub fn main_ifd(&self) -> Option<&IFD> {
        self.ifds.first()
    }

    /// Returns the number of IFDs in the TIFF file
    pub fn ifd_count(&self) -> usize {
        self.ifds.len()
    }

    /// Returns the directories flagged as reduced-resolution images
    pub fn reduced_images(&self) -> Vec<&IFD> {
        self.ifds.iter()
            .filter(|ifd| {
                ifd.get_u64(tags::NEW_SUBFILE_TYPE)
                    .map(|t| t as u32 & new_subfile_type::REDUCED_IMAGE != 0)
                    .unwrap_or(false)
            })
            .collect()
    }
}

impl fmt::Display for TIFF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TIFF File:")?;
        writeln!(f, "  Format: {}", if self.is_big_tiff { "BigTIFF" } else { "TIFF" })?;
        writeln!(f, "  Byte order: {}", self.byte_order.name())?;
        writeln!(f, "  Number of IFDs: {}", self.ifds.len())?;

        for ifd in &self.ifds {
            write!(f, "{}", ifd)?;
        }

        Ok(())
    }
}
