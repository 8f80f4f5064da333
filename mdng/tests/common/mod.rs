// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! In-memory M9 style DNG files, assembled byte by byte without going
//! through the crate's own writer.

#![allow(dead_code)]

use mdng::Endian;

pub(crate) const MAKE: &str = "Leica Camera AG";
pub(crate) const MODEL: &str = "M9 Digital Camera";
pub(crate) const XMP: &[u8] = b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"/>";

pub(crate) fn init_test_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// One directory record before layout
#[derive(Debug, Clone)]
pub(crate) struct RawEntry {
  pub tag: u16,
  pub typ: u16,
  pub count: u32,
  pub data: Vec<u8>,
}

impl RawEntry {
  pub fn short(endian: Endian, tag: u16, value: u16) -> Self {
    let mut data = vec![0; 2];
    endian.write_u16(&mut data, value);
    Self { tag, typ: 3, count: 1, data }
  }

  pub fn long(endian: Endian, tag: u16, values: &[u32]) -> Self {
    let mut data = vec![0; 4 * values.len()];
    for (i, v) in values.iter().enumerate() {
      endian.write_u32(&mut data[i * 4..], *v);
    }
    Self {
      tag,
      typ: 4,
      count: values.len() as u32,
      data,
    }
  }

  pub fn ascii(tag: u16, value: &str) -> Self {
    let mut data = value.as_bytes().to_vec();
    data.push(0);
    Self {
      tag,
      typ: 2,
      count: data.len() as u32,
      data,
    }
  }

  pub fn rational(endian: Endian, tag: u16, n: u32, d: u32) -> Self {
    let mut data = vec![0; 8];
    endian.write_u32(&mut data[0..4], n);
    endian.write_u32(&mut data[4..8], d);
    Self { tag, typ: 5, count: 1, data }
  }

  pub fn undefined(tag: u16, data: &[u8]) -> Self {
    Self {
      tag,
      typ: 7,
      count: data.len() as u32,
      data: data.to_vec(),
    }
  }

  /// A record with a field type code no reader knows
  pub fn bogus(tag: u16) -> Self {
    Self {
      tag,
      typ: 99,
      count: 1,
      data: vec![0xAB, 0xCD, 0, 0],
    }
  }
}

/// Append a directory to `buf` on an even offset and return that offset.
///
/// Records are written in the given order, external payloads follow the
/// directory.
pub(crate) fn append_ifd(buf: &mut Vec<u8>, endian: Endian, entries: &[RawEntry]) -> u32 {
  if buf.len() % 2 == 1 {
    buf.push(0);
  }
  let start = buf.len();
  let fixed = 2 + 12 * entries.len() + 4;
  let mut ifd = vec![0; fixed];
  let mut external = Vec::new();
  endian.write_u16(&mut ifd[0..2], entries.len() as u16);
  for (i, entry) in entries.iter().enumerate() {
    let rec = &mut ifd[2 + i * 12..2 + (i + 1) * 12];
    endian.write_u16(&mut rec[0..2], entry.tag);
    endian.write_u16(&mut rec[2..4], entry.typ);
    endian.write_u32(&mut rec[4..8], entry.count);
    if entry.typ != 99 && entry.data.len() > 4 {
      endian.write_u32(&mut rec[8..12], (start + fixed + external.len()) as u32);
      external.extend_from_slice(&entry.data);
      if external.len() % 2 == 1 {
        external.push(0);
      }
    } else {
      rec[8..8 + entry.data.len().min(4)].copy_from_slice(&entry.data[..entry.data.len().min(4)]);
    }
  }
  buf.extend_from_slice(&ifd);
  buf.extend_from_slice(&external);
  start as u32
}

/// Builder for a three directory, two strip file
pub(crate) struct M9Builder {
  endian: Endian,
  gap: usize,
  preview_strip: Vec<u8>,
  main_strip: Vec<u8>,
  preview_extra: Vec<RawEntry>,
  main_extra: Vec<RawEntry>,
  exif_extra: Vec<RawEntry>,
  split_main_strip: bool,
  exif_pointer: bool,
}

impl M9Builder {
  pub fn new(endian: Endian) -> Self {
    Self {
      endian,
      gap: 37,
      preview_strip: (0..320_u32).map(|i| (i % 251) as u8).collect(),
      main_strip: (0..1000_u32).map(|i| (i * 7 % 256) as u8).collect(),
      preview_extra: Vec::new(),
      main_extra: Vec::new(),
      exif_extra: Vec::new(),
      split_main_strip: false,
      exif_pointer: true,
    }
  }

  pub fn strips(mut self, preview: &[u8], main: &[u8]) -> Self {
    self.preview_strip = preview.to_vec();
    self.main_strip = main.to_vec();
    self
  }

  pub fn preview_entry(mut self, entry: RawEntry) -> Self {
    self.preview_extra.push(entry);
    self
  }

  pub fn main_entry(mut self, entry: RawEntry) -> Self {
    self.main_extra.push(entry);
    self
  }

  pub fn exif_entry(mut self, entry: RawEntry) -> Self {
    self.exif_extra.push(entry);
    self
  }

  /// Describe the main image as two strips
  pub fn split_main_strip(mut self) -> Self {
    self.split_main_strip = true;
    self
  }

  pub fn without_exif_pointer(mut self) -> Self {
    self.exif_pointer = false;
    self
  }

  pub fn preview_strip(&self) -> &[u8] {
    &self.preview_strip
  }

  pub fn main_strip(&self) -> &[u8] {
    &self.main_strip
  }

  /// Header, a junk gap, both strips, then EXIF, main and preview IFDs.
  pub fn build(&self) -> Vec<u8> {
    let endian = self.endian;
    let mut buf = Vec::new();
    buf.extend_from_slice(&endian.marker());
    buf.extend_from_slice(&[0; 6]);
    endian.write_u16(&mut buf[2..4], 42);
    buf.extend(std::iter::repeat_n(0xEE, self.gap));

    let preview_at = buf.len() as u32;
    buf.extend_from_slice(&self.preview_strip);
    let main_at = buf.len() as u32;
    buf.extend_from_slice(&self.main_strip);

    let mut exif = vec![
      RawEntry::rational(endian, 0x829A, 1, 125),
      RawEntry::short(endian, 0x8827, 160),
      RawEntry::undefined(0x9000, b"0220"),
      RawEntry::ascii(0x9003, "2011:05:21 14:02:11"),
    ];
    exif.extend(self.exif_extra.iter().cloned());
    let exif_at = append_ifd(&mut buf, endian, &exif);

    let main_len = self.main_strip.len() as u32;
    let (offsets, counts) = if self.split_main_strip {
      (vec![main_at, main_at + main_len / 2], vec![main_len / 2, main_len - main_len / 2])
    } else {
      (vec![main_at], vec![main_len])
    };
    let mut main = vec![
      RawEntry::long(endian, 254, &[0]),
      RawEntry::long(endian, 256, &[5216]),
      RawEntry::long(endian, 257, &[3472]),
      RawEntry::long(endian, 273, &offsets),
      RawEntry::long(endian, 279, &counts),
    ];
    main.extend(self.main_extra.iter().cloned());
    let main_ifd_at = append_ifd(&mut buf, endian, &main);

    let mut preview = vec![
      RawEntry::long(endian, 254, &[1]),
      RawEntry::ascii(271, MAKE),
      RawEntry::ascii(272, MODEL),
      RawEntry::long(endian, 273, &[preview_at]),
      RawEntry::long(endian, 279, &[self.preview_strip.len() as u32]),
      RawEntry::long(endian, 330, &[main_ifd_at]),
      RawEntry::undefined(700, XMP),
    ];
    if self.exif_pointer {
      preview.push(RawEntry::long(endian, 34665, &[exif_at]));
    }
    preview.extend(self.preview_extra.iter().cloned());
    let preview_ifd_at = append_ifd(&mut buf, endian, &preview);

    endian.write_u32(&mut buf[4..8], preview_ifd_at);
    buf
  }
}
