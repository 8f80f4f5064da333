// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::fmt::Display;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::{Serialize, Serializer};

use super::{Result, TiffError};
use crate::bits::Endian;

/// The 13 classic TIFF field types
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum FieldType {
  Byte = 1,
  Ascii = 2,
  Short = 3,
  Long = 4,
  Rational = 5,
  SByte = 6,
  Undefined = 7,
  SShort = 8,
  SLong = 9,
  SRational = 10,
  Float = 11,
  Double = 12,
  Ifd = 13,
}

impl FieldType {
  pub const fn code(self) -> u16 {
    self as u16
  }

  /// Byte width of a single element
  pub const fn width(self) -> usize {
    match self {
      Self::Byte | Self::Ascii | Self::SByte | Self::Undefined => 1,
      Self::Short | Self::SShort => 2,
      Self::Long | Self::SLong | Self::Float | Self::Ifd => 4,
      Self::Rational | Self::SRational | Self::Double => 8,
    }
  }

  pub const fn name(self) -> &'static str {
    match self {
      Self::Byte => "BYTE",
      Self::Ascii => "ASCII",
      Self::Short => "SHORT",
      Self::Long => "LONG",
      Self::Rational => "RATIONAL",
      Self::SByte => "SBYTE",
      Self::Undefined => "UNDEFINED",
      Self::SShort => "SSHORT",
      Self::SLong => "SLONG",
      Self::SRational => "SRATIONAL",
      Self::Float => "FLOAT",
      Self::Double => "DOUBLE",
      Self::Ifd => "IFD",
    }
  }

  /// Whether values of this type can be encoded for writing.
  ///
  /// Rationals are decode-only. Entries loaded from a file keep their raw
  /// bytes and are written back unchanged, but a new rational value can't
  /// be assigned.
  pub const fn is_writable(self) -> bool {
    match self {
      Self::Rational | Self::SRational => false,
      Self::Byte
      | Self::Ascii
      | Self::Short
      | Self::Long
      | Self::SByte
      | Self::Undefined
      | Self::SShort
      | Self::SLong
      | Self::Float
      | Self::Double
      | Self::Ifd => true,
    }
  }

  /// Byte-string types pass their payload through unchanged
  pub const fn is_bytes(self) -> bool {
    matches!(self, Self::Byte | Self::Ascii | Self::Undefined)
  }
}

impl TryFrom<u16> for FieldType {
  type Error = TiffError;

  fn try_from(code: u16) -> Result<Self> {
    Ok(match code {
      1 => Self::Byte,
      2 => Self::Ascii,
      3 => Self::Short,
      4 => Self::Long,
      5 => Self::Rational,
      6 => Self::SByte,
      7 => Self::Undefined,
      8 => Self::SShort,
      9 => Self::SLong,
      10 => Self::SRational,
      11 => Self::Float,
      12 => Self::Double,
      13 => Self::Ifd,
      x => return Err(TiffError::UnknownFieldType(x)),
    })
  }
}

impl Display for FieldType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} ({})", self.name(), self.code())
  }
}

/// Type to represent tiff values of type `RATIONAL`
#[derive(Clone, Debug, Default, PartialEq, Eq, Copy)]
pub struct Rational {
  pub n: u32,
  pub d: u32,
}

impl Rational {
  pub fn new(n: u32, d: u32) -> Self {
    Self { n, d }
  }
}

impl Display for Rational {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_fmt(format_args!("{}/{}", self.n, self.d))
  }
}

impl Serialize for Rational {
  fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// Type to represent tiff values of type `SRATIONAL`
#[derive(Clone, Debug, Default, PartialEq, Eq, Copy)]
pub struct SRational {
  pub n: i32,
  pub d: i32,
}

impl SRational {
  pub fn new(n: i32, d: i32) -> Self {
    Self { n, d }
  }
}

impl Display for SRational {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_fmt(format_args!("{}/{}", self.n, self.d))
  }
}

impl Serialize for SRational {
  fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// A decoded tag value, one variant per field type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
  /// 8-bit unsigned integer
  Byte(Vec<u8>),
  /// 7-bit ASCII bytes, including any NUL terminators as stored
  Ascii(Vec<u8>),
  /// 16-bit unsigned integer
  Short(Vec<u16>),
  /// 32-bit unsigned integer
  Long(Vec<u32>),
  /// Fraction stored as two 32-bit unsigned integers
  Rational(Vec<Rational>),
  /// 8-bit signed integer
  SByte(Vec<i8>),
  /// 8-bit byte that may contain anything, depending on the field
  Undefined(Vec<u8>),
  /// 16-bit signed integer
  SShort(Vec<i16>),
  /// 32-bit signed integer
  SLong(Vec<i32>),
  /// Fraction stored as two 32-bit signed integers
  SRational(Vec<SRational>),
  /// 32-bit IEEE floating point
  Float(Vec<f32>),
  /// 64-bit IEEE floating point
  Double(Vec<f64>),
  /// 32-bit offset to another IFD
  Ifd(Vec<u32>),
}

macro_rules! decode_into {
  ($endian:expr, $data:expr, $width:expr, $read:ident, $zero:expr) => {{
    let mut v = vec![$zero; $data.len() / $width];
    match $endian {
      Endian::Big => BigEndian::$read($data, &mut v),
      Endian::Little => LittleEndian::$read($data, &mut v),
    }
    v
  }};
}

macro_rules! encode_from {
  ($endian:expr, $values:expr, $width:expr, $write:ident) => {{
    let mut buf = vec![0; $values.len() * $width];
    match $endian {
      Endian::Big => BigEndian::$write($values, &mut buf),
      Endian::Little => LittleEndian::$write($values, &mut buf),
    }
    buf
  }};
}

impl Value {
  /// Decode a raw payload in file byte order.
  pub fn decode(typ: FieldType, endian: Endian, data: &[u8]) -> Result<Self> {
    if data.len() % typ.width() != 0 {
      return Err(TiffError::InvalidValue(format!(
        "payload of {} bytes is not a multiple of {} element width",
        data.len(),
        typ
      )));
    }
    Ok(match typ {
      FieldType::Byte => Self::Byte(data.to_vec()),
      FieldType::Ascii => Self::Ascii(data.to_vec()),
      FieldType::Undefined => Self::Undefined(data.to_vec()),
      FieldType::SByte => Self::SByte(data.iter().map(|b| *b as i8).collect()),
      FieldType::Short => Self::Short(decode_into!(endian, data, 2, read_u16_into, 0)),
      FieldType::SShort => Self::SShort(decode_into!(endian, data, 2, read_i16_into, 0)),
      FieldType::Long => Self::Long(decode_into!(endian, data, 4, read_u32_into, 0)),
      FieldType::Ifd => Self::Ifd(decode_into!(endian, data, 4, read_u32_into, 0)),
      FieldType::SLong => Self::SLong(decode_into!(endian, data, 4, read_i32_into, 0)),
      FieldType::Float => Self::Float(decode_into!(endian, data, 4, read_f32_into, 0.0)),
      FieldType::Double => Self::Double(decode_into!(endian, data, 8, read_f64_into, 0.0)),
      FieldType::Rational => {
        let tmp: Vec<u32> = decode_into!(endian, data, 4, read_u32_into, 0);
        Self::Rational(tmp.chunks_exact(2).map(|p| Rational::new(p[0], p[1])).collect())
      }
      FieldType::SRational => {
        let tmp: Vec<i32> = decode_into!(endian, data, 4, read_i32_into, 0);
        Self::SRational(tmp.chunks_exact(2).map(|p| SRational::new(p[0], p[1])).collect())
      }
    })
  }

  /// Encode into a raw payload in file byte order.
  pub fn encode(&self, endian: Endian) -> Result<Vec<u8>> {
    Ok(match self {
      Self::Byte(v) | Self::Ascii(v) | Self::Undefined(v) => v.clone(),
      Self::SByte(v) => v.iter().map(|b| *b as u8).collect(),
      Self::Short(v) => encode_from!(endian, v, 2, write_u16_into),
      Self::SShort(v) => encode_from!(endian, v, 2, write_i16_into),
      Self::Long(v) | Self::Ifd(v) => encode_from!(endian, v, 4, write_u32_into),
      Self::SLong(v) => encode_from!(endian, v, 4, write_i32_into),
      Self::Float(v) => encode_from!(endian, v, 4, write_f32_into),
      Self::Double(v) => encode_from!(endian, v, 8, write_f64_into),
      Self::Rational(_) | Self::SRational(_) => return Err(TiffError::UnsupportedEncoding(self.field_type())),
    })
  }

  pub fn field_type(&self) -> FieldType {
    match self {
      Self::Byte(_) => FieldType::Byte,
      Self::Ascii(_) => FieldType::Ascii,
      Self::Short(_) => FieldType::Short,
      Self::Long(_) => FieldType::Long,
      Self::Rational(_) => FieldType::Rational,
      Self::SByte(_) => FieldType::SByte,
      Self::Undefined(_) => FieldType::Undefined,
      Self::SShort(_) => FieldType::SShort,
      Self::SLong(_) => FieldType::SLong,
      Self::SRational(_) => FieldType::SRational,
      Self::Float(_) => FieldType::Float,
      Self::Double(_) => FieldType::Double,
      Self::Ifd(_) => FieldType::Ifd,
    }
  }

  /// Number of elements
  pub fn count(&self) -> usize {
    match self {
      Self::Byte(v) | Self::Ascii(v) | Self::Undefined(v) => v.len(),
      Self::Short(v) => v.len(),
      Self::Long(v) | Self::Ifd(v) => v.len(),
      Self::Rational(v) => v.len(),
      Self::SByte(v) => v.len(),
      Self::SShort(v) => v.len(),
      Self::SLong(v) => v.len(),
      Self::SRational(v) => v.len(),
      Self::Float(v) => v.len(),
      Self::Double(v) => v.len(),
    }
  }

  pub fn byte_size(&self) -> usize {
    self.count() * self.field_type().width()
  }

  pub fn as_bytes(&self) -> Option<&[u8]> {
    match self {
      Self::Byte(v) | Self::Ascii(v) | Self::Undefined(v) => Some(v),
      _ => None,
    }
  }

  /// Element `idx` of an unsigned integer value, widened to u32
  pub fn get_u32(&self, idx: usize) -> Option<u32> {
    match self {
      Self::Byte(v) => v.get(idx).map(|x| *x as u32),
      Self::Short(v) => v.get(idx).map(|x| *x as u32),
      Self::Long(v) | Self::Ifd(v) => v.get(idx).copied(),
      _ => None,
    }
  }

  fn integers(&self) -> Option<Vec<i64>> {
    match self {
      Self::Byte(v) => Some(v.iter().map(|x| *x as i64).collect()),
      Self::Short(v) => Some(v.iter().map(|x| *x as i64).collect()),
      Self::Long(v) | Self::Ifd(v) => Some(v.iter().map(|x| *x as i64).collect()),
      Self::SByte(v) => Some(v.iter().map(|x| *x as i64).collect()),
      Self::SShort(v) => Some(v.iter().map(|x| *x as i64).collect()),
      Self::SLong(v) => Some(v.iter().map(|x| *x as i64).collect()),
      _ => None,
    }
  }

  /// Convert to the given field type.
  ///
  /// Integer types convert between each other when every element fits,
  /// byte strings (BYTE, ASCII, UNDEFINED) convert freely and floating point
  /// types convert between each other. Everything else is a shape mismatch.
  pub fn coerce(self, target: FieldType) -> Result<Self> {
    if self.field_type() == target {
      return Ok(self);
    }
    if target.is_bytes() {
      if let Some(bytes) = self.as_bytes() {
        let bytes = bytes.to_vec();
        return Ok(match target {
          FieldType::Ascii => Self::Ascii(bytes),
          FieldType::Undefined => Self::Undefined(bytes),
          _ => Self::Byte(bytes),
        });
      }
    }
    let source = self.field_type();
    let mismatch = move || TiffError::InvalidValue(format!("can't store {} value as {}", source, target));
    match target {
      FieldType::Byte => Ok(Self::Byte(narrow(&self.integers().ok_or_else(mismatch)?, target)?)),
      FieldType::Short => Ok(Self::Short(narrow(&self.integers().ok_or_else(mismatch)?, target)?)),
      FieldType::Long => Ok(Self::Long(narrow(&self.integers().ok_or_else(mismatch)?, target)?)),
      FieldType::Ifd => Ok(Self::Ifd(narrow(&self.integers().ok_or_else(mismatch)?, target)?)),
      FieldType::SByte => Ok(Self::SByte(narrow(&self.integers().ok_or_else(mismatch)?, target)?)),
      FieldType::SShort => Ok(Self::SShort(narrow(&self.integers().ok_or_else(mismatch)?, target)?)),
      FieldType::SLong => Ok(Self::SLong(narrow(&self.integers().ok_or_else(mismatch)?, target)?)),
      FieldType::Float => match self {
        Self::Double(v) => Ok(Self::Float(v.into_iter().map(|x| x as f32).collect())),
        _ => Err(mismatch()),
      },
      FieldType::Double => match self {
        Self::Float(v) => Ok(Self::Double(v.into_iter().map(f64::from).collect())),
        _ => Err(mismatch()),
      },
      FieldType::Ascii | FieldType::Undefined | FieldType::Rational | FieldType::SRational => Err(mismatch()),
    }
  }

  pub fn visual_rep(&self, limit: usize) -> String {
    fn join<T: Display>(v: &[T], limit: usize) -> String {
      v.iter().take(limit).map(|a| format!("{}", a)).collect::<Vec<String>>().join(" ")
    }
    fn hex(v: &[u8], limit: usize) -> String {
      v.iter().take(limit).map(|a| format!("{:02X}", a)).collect::<Vec<String>>().join(" ")
    }
    match self {
      Self::Byte(v) | Self::Undefined(v) => hex(v, limit),
      Self::Ascii(v) => {
        let end = v.iter().position(|&c| c == b'\0').unwrap_or(v.len());
        String::from_utf8_lossy(&v[..end]).chars().take(limit).collect()
      }
      Self::Short(v) => join(v, limit),
      Self::Long(v) | Self::Ifd(v) => join(v, limit),
      Self::Rational(v) => join(v, limit),
      Self::SByte(v) => join(v, limit),
      Self::SShort(v) => join(v, limit),
      Self::SLong(v) => join(v, limit),
      Self::SRational(v) => join(v, limit),
      Self::Float(v) => join(v, limit),
      Self::Double(v) => join(v, limit),
    }
  }
}

fn narrow<T: TryFrom<i64>>(values: &[i64], target: FieldType) -> Result<Vec<T>> {
  values
    .iter()
    .map(|v| T::try_from(*v).map_err(|_| TiffError::InvalidValue(format!("{} is out of range for {}", v, target))))
    .collect()
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    let mut bytes = value.as_bytes().to_vec();
    bytes.push(b'\0');
    Value::Ascii(bytes)
  }
}

impl From<String> for Value {
  fn from(value: String) -> Self {
    Value::from(value.as_str())
  }
}

impl From<&[u8]> for Value {
  fn from(value: &[u8]) -> Self {
    Value::Byte(value.into())
  }
}

impl From<u16> for Value {
  fn from(value: u16) -> Self {
    Value::Short(vec![value])
  }
}

impl From<&[u16]> for Value {
  fn from(value: &[u16]) -> Self {
    Value::Short(value.into())
  }
}

impl<const N: usize> From<[u16; N]> for Value {
  fn from(value: [u16; N]) -> Self {
    Value::Short(value.into())
  }
}

impl From<u32> for Value {
  fn from(value: u32) -> Self {
    Value::Long(vec![value])
  }
}

impl From<&[u32]> for Value {
  fn from(value: &[u32]) -> Self {
    Value::Long(value.into())
  }
}

impl<const N: usize> From<[u32; N]> for Value {
  fn from(value: [u32; N]) -> Self {
    Value::Long(value.into())
  }
}

impl From<i32> for Value {
  fn from(value: i32) -> Self {
    Value::SLong(vec![value])
  }
}

impl From<f32> for Value {
  fn from(value: f32) -> Self {
    Value::Float(vec![value])
  }
}

impl From<f64> for Value {
  fn from(value: f64) -> Self {
    Value::Double(vec![value])
  }
}

impl From<Rational> for Value {
  fn from(value: Rational) -> Self {
    Value::Rational(vec![value])
  }
}
