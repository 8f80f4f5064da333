// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::io::{Seek, Write};

use log::debug;

use super::{Entry, IFD_ENTRY_LEN, INLINE_LEN, Result, TiffError, align_even, offset_u32};
use crate::{bits::Endian, envparams::mdng_log_value_limit, tags::TagNames};

/// One 12-byte directory record plus the payload it points to, if any
struct Record<'a> {
  entry: &'a Entry,
  field: [u8; INLINE_LEN],
  external: Option<&'a [u8]>,
}

/// Serializes a set of entries as one classic TIFF directory
pub struct DirectoryWriter<'a> {
  endian: Endian,
  names: &'a dyn TagNames,
  // Sorted by tag, consumers scan records sequentially
  entries: Vec<&'a Entry>,
}

impl<'a> DirectoryWriter<'a> {
  pub fn new(endian: Endian, names: &'a dyn TagNames, entries: impl IntoIterator<Item = &'a Entry>) -> Self {
    let mut entries: Vec<&'a Entry> = entries.into_iter().collect();
    entries.sort_by_key(|entry| entry.tag);
    Self { endian, names, entries }
  }

  pub fn entry_count(&self) -> usize {
    self.entries.len()
  }

  /// Size of count + records + next pointer, before any external payload
  pub fn fixed_size(&self) -> u64 {
    2 + IFD_ENTRY_LEN * self.entries.len() as u64 + 4
  }

  /// Assign inline values and external offsets for a directory starting at `start`.
  /// Returns the records and the offset following the last (padded) payload.
  fn layout(&self, start: u64) -> Result<(Vec<Record<'a>>, u64)> {
    let mut offset = start + self.fixed_size();
    let mut records = Vec::with_capacity(self.entries.len());
    let limit = mdng_log_value_limit();
    for &entry in &self.entries {
      let data = entry.data();
      debug!("save: {} - value: {}", self.names.describe(entry.tag, entry.typ.code()), entry.log_rep(limit));

      let mut field = [0; INLINE_LEN];
      let external = if data.len() <= INLINE_LEN {
        // Shorter payloads are zero padded
        field[..data.len()].copy_from_slice(data);
        None
      } else {
        self.endian.write_u32(&mut field, offset_u32(offset)?);
        // Keep in step with the pad bytes written by build()
        offset += align_even(data.len() as u64);
        Some(data)
      };
      records.push(Record { entry, field, external });
    }
    Ok((records, offset))
  }

  /// Write the directory at the current stream position.
  ///
  /// Returns the offset immediately following the last byte written.
  pub fn build<W: Write + Seek>(self, writer: &mut W) -> Result<u64> {
    let count = u16::try_from(self.entries.len())
      .map_err(|_| TiffError::Overflow(format!("{} entries don't fit into one IFD", self.entries.len())))?;
    let start = writer.stream_position()?;
    let (records, end) = self.layout(start)?;

    let mut buf = [0; 2];
    self.endian.write_u16(&mut buf, count);
    writer.write_all(&buf)?;

    for record in &records {
      let mut raw = [0; IFD_ENTRY_LEN as usize];
      self.endian.write_u16(&mut raw[0..2], record.entry.tag);
      self.endian.write_u16(&mut raw[2..4], record.entry.typ.code());
      self.endian.write_u32(&mut raw[4..8], record.entry.count());
      raw[8..12].copy_from_slice(&record.field);
      writer.write_all(&raw)?;
    }
    // No chained IFD on output
    writer.write_all(&[0; 4])?;

    for data in records.iter().filter_map(|r| r.external) {
      writer.write_all(data)?;
      if data.len() & 1 == 1 {
        writer.write_all(&[0])?;
      }
    }
    Ok(end)
  }
}
