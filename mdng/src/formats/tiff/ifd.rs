// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{
  collections::BTreeMap,
  io::{Read, Seek, Write},
};

use log::{debug, warn};

use super::{
  Entry, FieldType, INLINE_LEN, Result, TiffError, Value,
  reader::{EndianReader, ReadByteOrder},
  writer::DirectoryWriter,
};
use crate::{
  bits::Endian,
  envparams::mdng_log_value_limit,
  tags::{STANDARD_TAG_NAMES, TagNames, TiffCommonTag, TiffTag},
};

/// A TIFF image file directory: tag entries in insertion order plus the
/// chain pointer read from the file.
#[derive(Clone)]
pub struct TagDirectory {
  endian: Endian,
  names: &'static dyn TagNames,
  entries: Vec<Entry>,
  // Types declared for tags that have no value yet
  declared: BTreeMap<u16, FieldType>,
  next_ifd: u32,
  warnings: Vec<String>,
}

impl std::fmt::Debug for TagDirectory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TagDirectory")
      .field("endian", &self.endian)
      .field("entries", &self.entries)
      .field("declared", &self.declared)
      .field("next_ifd", &self.next_ifd)
      .field("warnings", &self.warnings)
      .finish()
  }
}

impl TagDirectory {
  pub fn new(endian: Endian) -> Self {
    Self::with_names(endian, &STANDARD_TAG_NAMES)
  }

  pub fn with_names(endian: Endian, names: &'static dyn TagNames) -> Self {
    Self {
      endian,
      names,
      entries: Vec::new(),
      declared: BTreeMap::new(),
      next_ifd: 0,
      warnings: Vec::new(),
    }
  }

  fn reset(&mut self) {
    self.entries.clear();
    self.declared.clear();
    self.warnings.clear();
    self.next_ifd = 0;
  }

  /// Replace the contents with the directory at the current stream position.
  ///
  /// Entries with an unknown field type are dropped with a warning. The
  /// stream is left right after the next-IFD pointer.
  pub fn load<R: Read + Seek>(&mut self, reader: &mut R) -> Result<()> {
    self.reset();
    let mut reader = EndianReader::new(reader, self.endian);
    let limit = mdng_log_value_limit();

    let entry_count = reader.read_u16()?;
    debug!("Parse {} entries", entry_count);
    for _ in 0..entry_count {
      let tag = reader.read_u16()?;
      let typ = reader.read_u16()?;
      let count = reader.read_u32()?;
      let mut inline = [0; INLINE_LEN];
      reader.read_u8_into(&mut inline)?;

      let tagdesc = self.names.describe(tag, typ);
      let typ = match FieldType::try_from(typ) {
        Ok(typ) => typ,
        Err(_) => {
          warn!("{} - unsupported type", tagdesc);
          self.warnings.push(format!("{} - unsupported type, entry dropped", tagdesc));
          continue;
        }
      };

      let entry = Entry::load(&mut reader, tag, typ, count, inline)?;
      debug!("{} - value: {}", tagdesc, entry.log_rep(limit));
      self.put(entry);
    }

    // Older M9 firmware stores XMP as UNDEFINED instead of BYTE
    let endian = self.endian;
    if let Some(xmp) = self.entry_mut(TiffCommonTag::Xmp) {
      if xmp.typ == FieldType::Undefined {
        debug!("Normalize XMP entry type to BYTE");
        xmp.retype(FieldType::Byte, endian)?;
      }
    }

    self.next_ifd = reader.read_u32()?;
    Ok(())
  }

  /// Write the directory at the current stream position.
  ///
  /// Entries are emitted in ascending tag order; payloads over 4 bytes follow
  /// the directory, each padded to an even length. Returns the offset
  /// immediately following the last byte written.
  pub fn save<W: Write + Seek>(&self, writer: &mut W) -> Result<u64> {
    DirectoryWriter::new(self.endian, self.names, &self.entries).build(writer)
  }

  fn position<T: TiffTag>(&self, tag: T) -> Option<usize> {
    let tag: u16 = tag.into();
    self.entries.iter().position(|entry| entry.tag == tag)
  }

  fn put(&mut self, entry: Entry) {
    self.declared.remove(&entry.tag);
    match self.position(entry.tag) {
      Some(idx) => self.entries[idx] = entry,
      None => self.entries.push(entry),
    }
  }

  fn entry_mut<T: TiffTag>(&mut self, tag: T) -> Option<&mut Entry> {
    self.position(tag).map(|idx| &mut self.entries[idx])
  }

  pub fn endian(&self) -> Endian {
    self.endian
  }

  pub fn next_ifd(&self) -> u32 {
    self.next_ifd
  }

  /// Diagnostics for entries dropped by the last `load`
  pub fn warnings(&self) -> &[String] {
    &self.warnings
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn contains<T: TiffTag>(&self, tag: T) -> bool {
    self.position(tag).is_some()
  }

  /// Tag ids in insertion order
  pub fn tags(&self) -> impl Iterator<Item = u16> + '_ {
    self.entries.iter().map(|entry| entry.tag)
  }

  pub fn iter(&self) -> impl Iterator<Item = (u16, &Value)> {
    self.entries.iter().map(|entry| (entry.tag, entry.value()))
  }

  pub fn entries(&self) -> &[Entry] {
    &self.entries
  }

  pub fn entry<T: TiffTag>(&self, tag: T) -> Option<&Entry> {
    self.position(tag).map(|idx| &self.entries[idx])
  }

  pub fn get<T: TiffTag>(&self, tag: T) -> Option<&Value> {
    self.entry(tag).map(Entry::value)
  }

  pub fn get_u32<T: TiffTag>(&self, tag: T, idx: usize) -> Option<u32> {
    self.get(tag).and_then(|value| value.get_u32(idx))
  }

  /// Field type of a tag, from its entry or from `set_type`
  pub fn tag_type<T: TiffTag>(&self, tag: T) -> Option<FieldType> {
    let tag: u16 = tag.into();
    self.declared.get(&tag).copied().or_else(|| self.entry(tag).map(|entry| entry.typ))
  }

  /// Declare the field type used by the next `set` for this tag.
  pub fn set_type<T: TiffTag>(&mut self, tag: T, typ: FieldType) {
    self.declared.insert(tag.into(), typ);
  }

  /// Assign a value to a tag whose type is already known.
  ///
  /// The value is converted to the known type first. On any error the
  /// directory is left unchanged.
  pub fn set<T: TiffTag, V: Into<Value>>(&mut self, tag: T, value: V) -> Result<()> {
    let tag: u16 = tag.into();
    let typ = self.tag_type(tag).ok_or(TiffError::UnknownTagType(tag))?;
    if !typ.is_writable() {
      return Err(TiffError::UnsupportedEncoding(typ));
    }
    let entry = Entry::new(tag, value.into().coerce(typ)?, self.endian)?;
    self.put(entry);
    Ok(())
  }

  /// Assign a value, taking the field type from the value itself.
  pub fn insert<T: TiffTag, V: Into<Value>>(&mut self, tag: T, value: V) -> Result<()> {
    let entry = Entry::new(tag.into(), value.into(), self.endian)?;
    self.put(entry);
    Ok(())
  }

  pub fn remove<T: TiffTag>(&mut self, tag: T) -> Option<Entry> {
    let tag: u16 = tag.into();
    self.declared.remove(&tag);
    self.position(tag).map(|idx| self.entries.remove(idx))
  }

  pub fn dump(&self, limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    out.push(format!("IFD entries: {}", self.entries.len()));
    out.push(format!("{0:<34}  | {1:<10} | {2:<6} | {3}", "Tag", "Type", "Count", "Data"));
    let mut sorted: Vec<&Entry> = self.entries.iter().collect();
    sorted.sort_by_key(|entry| entry.tag);
    for entry in sorted {
      let tag_name = self.names.tag_name(entry.tag).unwrap_or_else(|| format!("<?{}>", entry.tag));
      out.push(format!(
        "{0:#06x} : {0:<6} {1:<20}| {2:<10} | {3:<6} | {4}",
        entry.tag,
        tag_name,
        entry.type_name(),
        entry.count(),
        entry.visual_rep(limit)
      ));
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use std::io::{Cursor, Seek, SeekFrom};

  use super::*;
  use crate::{formats::tiff::Rational, tags::ExifTag};

  type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

  /// Assemble a raw directory from `(tag, type, count, value field)` records
  fn raw_ifd(endian: Endian, records: &[(u16, u16, u32, [u8; 4])], next: u32) -> Vec<u8> {
    let mut buf = vec![0; 2 + records.len() * 12 + 4];
    endian.write_u16(&mut buf[0..2], records.len() as u16);
    for (i, (tag, typ, count, field)) in records.iter().enumerate() {
      let rec = &mut buf[2 + i * 12..2 + (i + 1) * 12];
      endian.write_u16(&mut rec[0..2], *tag);
      endian.write_u16(&mut rec[2..4], *typ);
      endian.write_u32(&mut rec[4..8], *count);
      rec[8..12].copy_from_slice(field);
    }
    let len = buf.len();
    endian.write_u32(&mut buf[len - 4..], next);
    buf
  }

  fn reload(dir: &TagDirectory) -> std::result::Result<TagDirectory, Box<dyn std::error::Error>> {
    let mut out = Cursor::new(Vec::new());
    dir.save(&mut out)?;
    out.seek(SeekFrom::Start(0))?;
    let mut loaded = TagDirectory::new(dir.endian());
    loaded.load(&mut out)?;
    Ok(loaded)
  }

  #[test]
  fn single_long_roundtrip() -> TestResult {
    let mut dir = TagDirectory::new(Endian::Little);
    dir.set_type(TiffCommonTag::StripOffsets, FieldType::Long);
    dir.set(TiffCommonTag::StripOffsets, 1000_u32)?;
    let loaded = reload(&dir)?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.get(TiffCommonTag::StripOffsets), Some(&Value::Long(vec![1000])));
    Ok(())
  }

  #[test]
  fn tags_emitted_in_ascending_order() -> TestResult {
    let endian = Endian::Big;
    let mut dir = TagDirectory::new(endian);
    dir.insert(34665_u16, Value::Long(vec![0]))?;
    dir.insert(273_u16, Value::Long(vec![8]))?;
    dir.insert(700_u16, Value::Byte(vec![1, 2]))?;
    dir.insert(256_u16, Value::Short(vec![320]))?;
    assert_eq!(dir.tags().collect::<Vec<_>>(), vec![34665, 273, 700, 256]);

    let mut out = Cursor::new(Vec::new());
    dir.save(&mut out)?;
    let buf = out.into_inner();
    let written: Vec<u16> = (0..4).map(|i| endian.read_u16(&buf, 2 + i * 12)).collect();
    assert_eq!(written, vec![256, 273, 700, 34665]);
    Ok(())
  }

  #[test]
  fn inline_padding_and_external_storage() -> TestResult {
    let endian = Endian::Little;
    let mut dir = TagDirectory::new(endian);
    dir.insert(1_u16, Value::Byte(vec![1, 2, 3, 4]))?;
    dir.insert(2_u16, Value::Byte(vec![5, 6, 7]))?;
    dir.insert(3_u16, Value::Byte(vec![8, 9, 10, 11, 12]))?;

    let mut out = Cursor::new(vec![0; 10]);
    out.seek(SeekFrom::Start(10))?;
    let end = dir.save(&mut out)?;
    let buf = out.into_inner();

    let field = |i: usize| &buf[10 + 2 + i * 12 + 8..10 + 2 + i * 12 + 12];
    assert_eq!(field(0), &[1, 2, 3, 4]);
    assert_eq!(field(1), &[5, 6, 7, 0]);
    let ext = endian.read_u32(field(2), 0) as u64;
    assert_eq!(ext, 10 + 2 + 3 * 12 + 4);
    assert_eq!(ext % 2, 0);
    assert_eq!(&buf[ext as usize..ext as usize + 5], &[8, 9, 10, 11, 12]);
    assert_eq!(end, ext + 6);
    assert_eq!(buf.len() as u64, end);
    Ok(())
  }

  #[test]
  fn ascii_payload_is_external_and_aligned() -> TestResult {
    let endian = Endian::Big;
    let mut dir = TagDirectory::new(endian);
    dir.set_type(TiffCommonTag::Artist, FieldType::Ascii);
    dir.set(TiffCommonTag::Artist, Value::Ascii(b"abcd\0".to_vec()))?;

    let start = 7_u64;
    let mut out = Cursor::new(vec![0xFF; start as usize]);
    out.seek(SeekFrom::Start(start))?;
    let end = dir.save(&mut out)?;
    let buf = out.get_ref().clone();

    let offset = endian.read_u32(&buf, start as usize + 2 + 8) as u64;
    assert_eq!(offset, start + 18);
    assert_eq!((offset - start) % 2, 0);
    assert_eq!(&buf[offset as usize..offset as usize + 5], b"abcd\0");
    assert_eq!(buf[offset as usize + 5], 0);
    assert_eq!(end, offset + 6);

    out.seek(SeekFrom::Start(start))?;
    let mut loaded = TagDirectory::new(endian);
    loaded.load(&mut out)?;
    assert_eq!(loaded.get(TiffCommonTag::Artist).and_then(Value::as_bytes), Some(&b"abcd\0"[..]));
    Ok(())
  }

  #[test]
  fn corrupt_element_count_is_an_error() {
    let endian = Endian::Little;
    let mut raw = raw_ifd(endian, &[(270, 12, 0xFFFF_FFFF, [16, 0, 0, 0])], 0);
    raw.extend_from_slice(&[0; 4]);
    let mut dir = TagDirectory::new(endian);
    assert!(matches!(dir.load(&mut Cursor::new(raw)), Err(TiffError::Io(_) | TiffError::Overflow(_))));
  }

  #[test]
  fn unknown_field_type_is_dropped_with_warning() -> TestResult {
    let endian = Endian::Little;
    let raw = raw_ifd(endian, &[(1, 99, 1, [0; 4]), (273, 4, 1, [0xE8, 0x03, 0, 0])], 0);
    let mut dir = TagDirectory::new(endian);
    dir.load(&mut Cursor::new(raw))?;
    assert_eq!(dir.len(), 1);
    assert_eq!(dir.warnings().len(), 1);
    assert!(!dir.contains(1_u16));
    assert_eq!(dir.get_u32(TiffCommonTag::StripOffsets, 0), Some(1000));

    let loaded = reload(&dir)?;
    assert_eq!(loaded.tags().collect::<Vec<_>>(), vec![273]);
    assert!(loaded.warnings().is_empty());
    Ok(())
  }

  #[test]
  fn xmp_undefined_becomes_byte() -> TestResult {
    let endian = Endian::Big;
    let mut raw = raw_ifd(endian, &[(700, 7, 6, [0, 0, 0, 18])], 0);
    raw.extend_from_slice(b"<xmp/>");
    let mut dir = TagDirectory::new(endian);
    dir.load(&mut Cursor::new(raw))?;
    assert_eq!(dir.tag_type(TiffCommonTag::Xmp), Some(FieldType::Byte));
    assert_eq!(dir.get(TiffCommonTag::Xmp), Some(&Value::Byte(b"<xmp/>".to_vec())));
    Ok(())
  }

  #[test]
  fn load_restores_position_between_records() -> TestResult {
    let endian = Endian::Little;
    let mut raw = raw_ifd(endian, &[(271, 2, 6, [30, 0, 0, 0]), (274, 3, 1, [1, 0, 0, 0])], 0x1234);
    raw.extend_from_slice(b"Leica\0");
    let mut cursor = Cursor::new(raw);
    let mut dir = TagDirectory::new(endian);
    dir.load(&mut cursor)?;
    assert_eq!(dir.get(TiffCommonTag::Make), Some(&Value::Ascii(b"Leica\0".to_vec())));
    assert_eq!(dir.get(TiffCommonTag::Orientation), Some(&Value::Short(vec![1])));
    assert_eq!(dir.next_ifd(), 0x1234);
    assert_eq!(cursor.position(), 30);
    Ok(())
  }

  #[test]
  fn load_save_preserves_values() -> TestResult {
    let endian = Endian::Big;
    let mut raw = raw_ifd(
      endian,
      &[
        (0x829A, 5, 1, [0, 0, 0, 54]),  // ExposureTime, rational
        (0x9204, 10, 1, [0, 0, 0, 62]), // ExposureBias, srational
        (0x8827, 3, 1, [0, 160, 0, 0]), // ISO
        (0x9000, 7, 4, *b"0220"),       // ExifVersion
      ],
      0,
    );
    raw.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 125]);
    raw.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFD, 0, 0, 0, 3]);

    let mut dir = TagDirectory::new(endian);
    dir.load(&mut Cursor::new(raw))?;
    let loaded = reload(&dir)?;
    assert_eq!(loaded.len(), 4);
    for (tag, value) in dir.iter() {
      assert_eq!(loaded.get(tag), Some(value));
    }
    assert_eq!(loaded.get(ExifTag::ISOSpeed), Some(&Value::Short(vec![160])));
    Ok(())
  }

  #[test]
  fn set_requires_known_type() {
    let mut dir = TagDirectory::new(Endian::Little);
    assert!(matches!(dir.set(315_u16, "Someone"), Err(TiffError::UnknownTagType(315))));
    assert!(dir.is_empty());
  }

  #[test]
  fn failed_set_leaves_directory_unchanged() -> TestResult {
    let mut dir = TagDirectory::new(Endian::Little);
    dir.insert(TiffCommonTag::StripOffsets, 8_u32)?;
    assert!(matches!(dir.set(TiffCommonTag::StripOffsets, "eight"), Err(TiffError::InvalidValue(_))));
    assert_eq!(dir.get(TiffCommonTag::StripOffsets), Some(&Value::Long(vec![8])));

    dir.set_type(TiffCommonTag::XResolution, FieldType::Rational);
    assert!(matches!(
      dir.set(TiffCommonTag::XResolution, Rational::new(300, 1)),
      Err(TiffError::UnsupportedEncoding(FieldType::Rational))
    ));
    assert!(!dir.contains(TiffCommonTag::XResolution));
    Ok(())
  }

  #[test]
  fn set_coerces_to_loaded_type() -> TestResult {
    let endian = Endian::Little;
    let raw = raw_ifd(endian, &[(273, 3, 1, [8, 0, 0, 0])], 0);
    let mut dir = TagDirectory::new(endian);
    dir.load(&mut Cursor::new(raw))?;
    dir.set(TiffCommonTag::StripOffsets, 4096_u32)?;
    assert_eq!(dir.get(TiffCommonTag::StripOffsets), Some(&Value::Short(vec![4096])));
    assert!(dir.set(TiffCommonTag::StripOffsets, 70000_u32).is_err());
    Ok(())
  }

  #[test]
  fn declared_type_without_value_is_not_written() -> TestResult {
    let mut dir = TagDirectory::new(Endian::Little);
    dir.set_type(TiffCommonTag::Artist, FieldType::Ascii);
    dir.insert(TiffCommonTag::Orientation, 1_u16)?;
    assert_eq!(reload(&dir)?.len(), 1);
    Ok(())
  }
}
