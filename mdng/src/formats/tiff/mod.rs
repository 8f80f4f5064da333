// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::io::{Read, Write};

use thiserror::Error;

use crate::bits::Endian;

pub mod entry;
pub mod ifd;
pub mod reader;
pub mod value;
pub mod writer;

pub use entry::Entry;
pub use ifd::TagDirectory;
pub use reader::EndianReader;
pub use value::{FieldType, Rational, SRational, Value};

pub const TIFF_MAGIC: u16 = 42;

/// Size of the file header: byte order, magic, IFD0 offset
pub const HEADER_LEN: u64 = 8;

/// Size of one directory record: tag, type, count, value/offset
pub const IFD_ENTRY_LEN: u64 = 12;

/// Values up to this many bytes live inside the directory record
pub const INLINE_LEN: usize = 4;

/// Recognized byte-order/magic signatures (classic TIFF only)
const SIGNATURES: [&[u8; 4]; 2] = [b"MM\x00\x2A", b"II\x2A\x00"];

/// Error variants for TIFF directory processing
#[derive(Debug, Error)]
pub enum TiffError {
  /// Offsets or counts that don't fit classic TIFF fields
  #[error("Overflow error: {}", _0)]
  Overflow(String),

  #[error("Format mismatch: {}", _0)]
  FormatMismatch(String),

  #[error("Unknown field type code: {}", _0)]
  UnknownFieldType(u16),

  /// Field type without an encoder on the write path
  #[error("Unsupported type for this operation: {} has no encoder", _0)]
  UnsupportedEncoding(FieldType),

  #[error("Tag {} has no known field type", _0)]
  UnknownTagType(u16),

  #[error("Invalid value: {}", _0)]
  InvalidValue(String),

  /// Error on underlying stream
  #[error("I/O error: {:?}", _0)]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TiffError>;

/// Round an offset up to the next word (even) boundary.
#[inline]
pub fn align_even(offset: u64) -> u64 {
  offset + (offset & 1)
}

/// Convert a stream offset into a classic 32-bit TIFF offset.
pub fn offset_u32(offset: u64) -> Result<u32> {
  u32::try_from(offset).map_err(|_| TiffError::Overflow(format!("offset {} exceeds 32-bit TIFF range", offset)))
}

/// The 8-byte file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
  pub endian: Endian,
  pub ifd0_offset: u32,
}

impl TiffHeader {
  pub fn parse(buf: &[u8; HEADER_LEN as usize]) -> Result<Self> {
    if !SIGNATURES.iter().any(|sig| buf[..4] == sig[..]) {
      return Err(TiffError::FormatMismatch(format!("not a TIFF file, unknown signature {:02X?}", &buf[..4])));
    }
    let endian = Endian::from_marker(&buf[..2]).ok_or_else(|| TiffError::FormatMismatch("not a TIFF IFD".into()))?;
    Ok(Self {
      endian,
      ifd0_offset: endian.read_u32(buf, 4),
    })
  }

  pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
    let mut buf = [0; HEADER_LEN as usize];
    reader.read_exact(&mut buf)?;
    Self::parse(&buf)
  }

  pub fn to_bytes(&self) -> [u8; HEADER_LEN as usize] {
    let mut buf = [0; HEADER_LEN as usize];
    buf[..2].copy_from_slice(&self.endian.marker());
    self.endian.write_u16(&mut buf[2..4], TIFF_MAGIC);
    self.endian.write_u32(&mut buf[4..8], self.ifd0_offset);
    buf
  }

  pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
    writer.write_all(&self.to_bytes())?;
    Ok(())
  }
}
