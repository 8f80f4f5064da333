// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

use super::Result;
use crate::bits::Endian;

pub trait ReadByteOrder {
  fn read_u16(&mut self) -> std::io::Result<u16>;
  fn read_u32(&mut self) -> std::io::Result<u32>;
  fn read_u8_into(&mut self, dst: &mut [u8]) -> std::io::Result<()>;
}

/// Stream wrapper that reads integers in a fixed byte order
pub struct EndianReader<'a, R: Read + Seek + 'a> {
  endian: Endian,
  inner: &'a mut R,
}

impl<'a, R: Read + Seek + 'a> EndianReader<'a, R> {
  pub fn new(inner: &'a mut R, endian: Endian) -> Self {
    Self { endian, inner }
  }

  pub fn endian(&self) -> Endian {
    self.endian
  }

  pub fn into_inner(self) -> &'a mut R {
    self.inner
  }

  pub fn position(&mut self) -> Result<u64> {
    Ok(self.inner.stream_position()?)
  }

  pub fn goto(&mut self, offset: u64) -> Result<()> {
    self.inner.seek(SeekFrom::Start(offset))?;
    Ok(())
  }

  /// Read `len` bytes at an absolute `offset`, then return to the
  /// position held before the call.
  ///
  /// The buffer only grows with the bytes actually read, so a corrupt
  /// length fails with `UnexpectedEof` instead of a huge allocation.
  pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
    let here = self.position()?;
    self.goto(offset)?;
    let mut buf = Vec::new();
    let res = (&mut *self.inner).take(len as u64).read_to_end(&mut buf);
    self.goto(here)?; // restore
    res?;
    if buf.len() != len {
      return Err(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        format!("expected {} bytes at offset {}, found {}", len, offset, buf.len()),
      )
      .into());
    }
    Ok(buf)
  }
}

impl<'a, R: Read + Seek + 'a> ReadByteOrder for EndianReader<'a, R> {
  fn read_u16(&mut self) -> std::io::Result<u16> {
    match self.endian {
      Endian::Little => self.inner.read_u16::<LittleEndian>(),
      Endian::Big => self.inner.read_u16::<BigEndian>(),
    }
  }

  fn read_u32(&mut self) -> std::io::Result<u32> {
    match self.endian {
      Endian::Little => self.inner.read_u32::<LittleEndian>(),
      Endian::Big => self.inner.read_u32::<BigEndian>(),
    }
  }

  fn read_u8_into(&mut self, dst: &mut [u8]) -> std::io::Result<()> {
    self.inner.read_exact(dst)
  }
}
