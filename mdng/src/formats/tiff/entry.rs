// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::io::{Read, Seek};

use serde::Serialize;

use super::{FieldType, INLINE_LEN, Result, TiffError, Value, reader::EndianReader};
use crate::bits::Endian;

/// A single directory entry.
///
/// The raw payload is kept exactly as stored in the file (file byte order)
/// so it can be written back untouched. The decoded form is produced once
/// when the entry is created and cached next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
  pub tag: u16,
  pub typ: FieldType,
  #[serde(skip)]
  data: Vec<u8>,
  value: Value,
}

impl std::ops::Deref for Entry {
  type Target = Value;

  fn deref(&self) -> &Self::Target {
    &self.value
  }
}

impl Entry {
  /// Build an entry from a decoded value, encoding it for `endian`.
  pub fn new(tag: u16, value: Value, endian: Endian) -> Result<Self> {
    let data = value.encode(endian)?;
    Ok(Self {
      tag,
      typ: value.field_type(),
      data,
      value,
    })
  }

  /// Build an entry from a raw payload in file byte order.
  pub fn from_raw(tag: u16, typ: FieldType, data: Vec<u8>, endian: Endian) -> Result<Self> {
    let value = Value::decode(typ, endian, &data)?;
    Ok(Self { tag, typ, data, value })
  }

  /// Read the payload for a directory record whose type, count and
  /// 4-byte value field have already been consumed.
  ///
  /// Payloads over 4 bytes are fetched from the absolute offset held in
  /// `inline` and the stream position is restored afterwards.
  pub fn load<R: Read + Seek>(reader: &mut EndianReader<'_, R>, tag: u16, typ: FieldType, count: u32, inline: [u8; INLINE_LEN]) -> Result<Self> {
    let size = (typ.width() as u64)
      .checked_mul(count as u64)
      .and_then(|s| usize::try_from(s).ok())
      .ok_or_else(|| TiffError::Overflow(format!("tag {} with {} elements of {} is too large", tag, count, typ)))?;
    let endian = reader.endian();
    let data = if size > INLINE_LEN {
      reader.read_at(endian.read_u32(&inline, 0) as u64, size)?
    } else {
      inline[..size].to_vec()
    };
    Self::from_raw(tag, typ, data, endian)
  }

  /// Reinterpret the stored payload as another field type of the same width.
  pub fn retype(&mut self, typ: FieldType, endian: Endian) -> Result<()> {
    if typ.width() != self.typ.width() {
      return Err(TiffError::InvalidValue(format!("can't retype {} entry as {}", self.typ, typ)));
    }
    self.value = Value::decode(typ, endian, &self.data)?;
    self.typ = typ;
    Ok(())
  }

  pub fn value(&self) -> &Value {
    &self.value
  }

  /// Raw payload in file byte order
  pub fn data(&self) -> &[u8] {
    &self.data
  }

  pub fn count(&self) -> u32 {
    (self.data.len() / self.typ.width()) as u32
  }

  pub fn byte_size(&self) -> usize {
    self.data.len()
  }

  pub fn type_name(&self) -> &'static str {
    self.typ.name()
  }

  /// Value text for trace logs. Payloads over `byte_limit` bytes print
  /// their size only.
  pub fn log_rep(&self, byte_limit: usize) -> String {
    if self.data.len() > byte_limit {
      format!("<{} bytes>", self.data.len())
    } else {
      self.visual_rep(usize::MAX)
    }
  }
}
