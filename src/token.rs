use crate::{util, Error, ErrorKind};
use std::borrow::Cow;

/// The type tag carried by every bzn field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FieldType {
    /// Wildcard on the expected side of a validation; also used by markers
    Unknown,

    /// Untyped payload, often a vestigial pointer or padding blob
    Void,

    /// One byte boolean
    Bool,

    /// 16 bit unsigned integer
    Short,

    /// 32 bit integer (signedness decided by the consumer)
    Long,

    /// 32 bit IEEE float
    Float,

    /// Character string
    Char,

    /// Vestigial in-memory pointer from the original engine
    Ptr,

    /// Sequence of 2D points (x, z)
    Vec2d,
}

impl FieldType {
    /// Creates a FieldType from its numeric on-disk tag
    pub fn from_tag(tag: u16) -> Option<FieldType> {
        match tag {
            0 => Some(FieldType::Unknown),
            1 => Some(FieldType::Void),
            2 => Some(FieldType::Bool),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Float),
            6 => Some(FieldType::Char),
            7 => Some(FieldType::Ptr),
            8 => Some(FieldType::Vec2d),
            _ => None,
        }
    }

    /// Returns the numeric on-disk tag
    pub fn tag(&self) -> u16 {
        match self {
            FieldType::Unknown => 0,
            FieldType::Void => 1,
            FieldType::Bool => 2,
            FieldType::Short => 3,
            FieldType::Long => 4,
            FieldType::Float => 5,
            FieldType::Char => 6,
            FieldType::Ptr => 7,
            FieldType::Vec2d => 8,
        }
    }

    /// Creates a FieldType from its text mode mnemonic
    pub fn from_mnemonic(s: &str) -> Option<FieldType> {
        match s {
            "unknown" => Some(FieldType::Unknown),
            "void" => Some(FieldType::Void),
            "bool" => Some(FieldType::Bool),
            "short" => Some(FieldType::Short),
            "long" => Some(FieldType::Long),
            "float" => Some(FieldType::Float),
            "char" => Some(FieldType::Char),
            "ptr" => Some(FieldType::Ptr),
            "vec2d" => Some(FieldType::Vec2d),
            _ => None,
        }
    }

    /// Returns the text mode mnemonic
    pub fn mnemonic(&self) -> &'static str {
        match self {
            FieldType::Unknown => "unknown",
            FieldType::Void => "void",
            FieldType::Bool => "bool",
            FieldType::Short => "short",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Char => "char",
            FieldType::Ptr => "ptr",
            FieldType::Vec2d => "vec2d",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A 2D point as stored in path tables
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Vector2D {
    pub x: f32,
    pub z: f32,
}

/// The raw representation a token was decoded from
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RawValue<'a> {
    /// Payload bytes from a binary region
    Binary(&'a [u8]),

    /// The value text from a text region line
    Text(&'a str),
}

/// One decoded field: name, type tag, and raw value
///
/// Immutable once produced. A token does not interpret its payload until a
/// typed accessor is called, which lets one structural algorithm drive all
/// three physical encodings.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    name: Option<Cow<'a, str>>,
    field_type: FieldType,
    value: RawValue<'a>,
    marker: bool,
    big_endian: bool,
    offset: usize,
}

impl<'a> Token<'a> {
    pub(crate) fn new(
        name: Option<Cow<'a, str>>,
        field_type: FieldType,
        value: RawValue<'a>,
        big_endian: bool,
        offset: usize,
    ) -> Token<'a> {
        Token {
            name,
            field_type,
            value,
            marker: false,
            big_endian,
            offset,
        }
    }

    pub(crate) fn marker(name: &'a str, offset: usize) -> Token<'a> {
        Token {
            name: Some(Cow::Borrowed(name)),
            field_type: FieldType::Unknown,
            value: RawValue::Text(""),
            marker: true,
            big_endian: false,
            offset,
        }
    }

    /// The field name, when the token carried one
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The observed type tag
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Byte offset the token started at
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Checks the token against an expected name and type
    ///
    /// An absent `expected_name` checks the type only, and
    /// [`FieldType::Unknown`] on the expected side accepts any observed tag.
    /// Never errors; callers decide whether a mismatch is fatal.
    pub fn validate(&self, expected_name: Option<&str>, expected: FieldType) -> bool {
        if let Some(expected_name) = expected_name {
            if self.name.as_deref() != Some(expected_name) {
                return false;
            }
        }
        expected == FieldType::Unknown || self.field_type == expected
    }

    /// True for bracket-style marker fields whose only purpose is
    /// structural confirmation
    pub fn is_validation_only(&self) -> bool {
        self.marker
    }

    fn value_error(&self, expected: &'static str) -> Error {
        Error::new(ErrorKind::InvalidValue {
            field: self.name.as_deref().unwrap_or_default().to_string(),
            expected,
            offset: self.offset,
        })
    }

    fn raw_u32(&self, expected: &'static str) -> Result<u32, Error> {
        match self.value {
            RawValue::Binary(data) => {
                if data.len() != 4 {
                    return Err(self.value_error(expected));
                }
                if self.big_endian {
                    Ok(util::be_u32(data))
                } else {
                    Ok(util::le_u32(data))
                }
            }
            RawValue::Text(s) => {
                // ptr and void payloads are written in hex in text regions
                let radix = match self.field_type {
                    FieldType::Ptr | FieldType::Void => 16,
                    _ => 10,
                };
                u32::from_str_radix(s.trim(), radix).map_err(|_| self.value_error(expected))
            }
        }
    }

    /// Reinterpret the payload as a u32
    pub fn get_u32(&self) -> Result<u32, Error> {
        self.raw_u32("u32")
    }

    /// Reinterpret the payload as an i32
    pub fn get_i32(&self) -> Result<i32, Error> {
        match self.value {
            RawValue::Binary(_) => self.raw_u32("i32").map(|x| x as i32),
            RawValue::Text(s) => s.trim().parse().map_err(|_| self.value_error("i32")),
        }
    }

    /// Reinterpret the payload as a u16
    pub fn get_u16(&self) -> Result<u16, Error> {
        match self.value {
            RawValue::Binary(data) => {
                if data.len() != 2 {
                    return Err(self.value_error("u16"));
                }
                if self.big_endian {
                    Ok(util::be_u16(data))
                } else {
                    Ok(util::le_u16(data))
                }
            }
            RawValue::Text(s) => s.trim().parse().map_err(|_| self.value_error("u16")),
        }
    }

    /// Reinterpret the payload as a bool
    pub fn get_bool(&self) -> Result<bool, Error> {
        match self.value {
            RawValue::Binary(data) => match data {
                [b] => Ok(*b != 0),
                _ => Err(self.value_error("bool")),
            },
            RawValue::Text(s) => match s.trim() {
                "0" => Ok(false),
                "1" => Ok(true),
                _ => Err(self.value_error("bool")),
            },
        }
    }

    /// Reinterpret the payload as an f32
    pub fn get_f32(&self) -> Result<f32, Error> {
        match self.value {
            RawValue::Binary(data) => {
                if data.len() != 4 {
                    return Err(self.value_error("f32"));
                }
                let bits = if self.big_endian {
                    util::be_u32(data)
                } else {
                    util::le_u32(data)
                };
                Ok(f32::from_bits(bits))
            }
            RawValue::Text(s) => s.trim().parse().map_err(|_| self.value_error("f32")),
        }
    }

    /// The payload as a string
    ///
    /// Binary payloads are truncated at the first NUL.
    pub fn get_str(&self) -> Result<Cow<'a, str>, Error> {
        if self.field_type != FieldType::Char {
            return Err(self.value_error("string"));
        }
        match self.value {
            RawValue::Binary(data) => {
                let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
                Ok(String::from_utf8_lossy(&data[..end]))
            }
            RawValue::Text(s) => {
                let s = s.trim();
                let s = s
                    .strip_prefix('"')
                    .and_then(|rest| rest.strip_suffix('"'))
                    .unwrap_or(s);
                Ok(Cow::Borrowed(s))
            }
        }
    }

    /// The 2D point at `index` within a vec2d payload
    pub fn get_vector2d(&self, index: usize) -> Result<Vector2D, Error> {
        if self.field_type != FieldType::Vec2d {
            return Err(self.value_error("vec2d"));
        }
        match self.value {
            RawValue::Binary(data) => {
                let start = index * 8;
                let chunk = data
                    .get(start..start + 8)
                    .ok_or_else(|| self.value_error("vec2d index"))?;
                let (x_bits, z_bits) = if self.big_endian {
                    (util::be_u32(&chunk[..4]), util::be_u32(&chunk[4..]))
                } else {
                    (util::le_u32(&chunk[..4]), util::le_u32(&chunk[4..]))
                };
                Ok(Vector2D {
                    x: f32::from_bits(x_bits),
                    z: f32::from_bits(z_bits),
                })
            }
            RawValue::Text(s) => {
                let mut floats = s.split_whitespace().skip(index * 2);
                let x = floats
                    .next()
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| self.value_error("vec2d index"))?;
                let z = floats
                    .next()
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| self.value_error("vec2d index"))?;
                Ok(Vector2D { x, z })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_token(name: &'static str, ty: FieldType, value: &'static str) -> Token<'static> {
        Token::new(Some(Cow::Borrowed(name)), ty, RawValue::Text(value), false, 0)
    }

    #[test]
    fn test_validate_wildcard() {
        let tok = text_token("saveType", FieldType::Long, "1");
        assert!(tok.validate(Some("saveType"), FieldType::Unknown));
        assert!(tok.validate(None, FieldType::Long));
        assert!(!tok.validate(Some("savetype"), FieldType::Long));
        assert!(!tok.validate(Some("saveType"), FieldType::Bool));
    }

    #[test]
    fn test_text_accessors() {
        assert_eq!(text_token("a", FieldType::Long, "-3").get_i32().unwrap(), -3);
        assert_eq!(
            text_token("a", FieldType::Ptr, "00c0ffee").get_u32().unwrap(),
            0x00c0_ffee
        );
        assert!(text_token("a", FieldType::Bool, "1").get_bool().unwrap());
        assert!(text_token("a", FieldType::Bool, "yes").get_bool().is_err());
        assert_eq!(
            text_token("a", FieldType::Char, "\"avtank\"").get_str().unwrap(),
            "avtank"
        );
    }

    #[test]
    fn test_binary_width_mismatch() {
        let tok = Token::new(
            Some(Cow::Borrowed("team")),
            FieldType::Long,
            RawValue::Binary(&[1, 0]),
            false,
            7,
        );
        let err = tok.get_u32().unwrap_err();
        assert_eq!(err.offset(), Some(7));
    }

    #[test]
    fn test_vec2d_indexing() {
        let tok = text_token("points", FieldType::Vec2d, "1.0 2.0 3.0 4.0");
        assert_eq!(tok.get_vector2d(1).unwrap(), Vector2D { x: 3.0, z: 4.0 });
        assert!(tok.get_vector2d(2).is_err());
    }

    #[test]
    fn test_big_endian_payloads() {
        let tok = Token::new(None, FieldType::Long, RawValue::Binary(&[0, 0, 1, 0]), true, 0);
        assert_eq!(tok.get_u32().unwrap(), 256);
    }
}
