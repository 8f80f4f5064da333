// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Leica M9 DNG layout.
//!
//! The M9 writes three directories and two strips into one file:
//!
//! ```text
//! Header -> IFD0 (preview) --SubIFDs--> main IFD
//!                          --ExifIFD--> EXIF IFD
//! ```
//!
//! IFD0 describes a small preview strip, the main IFD the full raw strip.
//! Saving re-lays the file out as header, preview strip, main strip, EXIF
//! IFD, main IFD, preview IFD, with every pointer recomputed.

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::{debug, warn};
use serde::Serialize;

use super::{DngError, Result, StripRef};
use crate::{
  bits::Endian,
  formats::tiff::{HEADER_LEN, TagDirectory, TiffError, TiffHeader, align_even, offset_u32},
  tags::{STANDARD_TAG_NAMES, TagNames, TiffCommonTag},
};

/// Destination offsets known before any directory is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutPlan {
  pub preview_strip: u64,
  pub main_strip: u64,
  pub exif_ifd: u64,
}

impl LayoutPlan {
  pub fn compute(preview: &StripRef, main: &StripRef) -> Self {
    let preview_strip = HEADER_LEN;
    let main_strip = preview_strip + preview.length;
    let exif_ifd = align_even(main_strip + main.length);
    Self {
      preview_strip,
      main_strip,
      exif_ifd,
    }
  }
}

/// Every offset chosen while saving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SavedLayout {
  pub preview_strip: u64,
  pub main_strip: u64,
  pub exif_ifd: u64,
  pub main_ifd: u64,
  pub preview_ifd: u64,
  /// Offset following the last byte written
  pub end: u64,
}

/// A loaded M9 DNG file
pub struct DngImage<R: Read + Seek> {
  source: R,
  endian: Endian,
  preview: TagDirectory,
  main: TagDirectory,
  exif: TagDirectory,
  preview_strip: StripRef,
  main_strip: StripRef,
}

impl<R: Read + Seek> DngImage<R> {
  pub fn new(source: R) -> Result<Self> {
    Self::with_names(source, &STANDARD_TAG_NAMES)
  }

  /// Load the header, all three directories and both strip descriptors.
  pub fn with_names(mut source: R, names: &'static dyn TagNames) -> Result<Self> {
    source.seek(SeekFrom::Start(0))?;
    let header = TiffHeader::read(&mut source)?;
    let endian = header.endian;
    debug!("Found TIFF header: {:?}, IFD0 at {}", endian, header.ifd0_offset);

    let preview = load_directory(&mut source, endian, names, header.ifd0_offset as u64, "preview")?;
    let main_offset = pointer(&preview, TiffCommonTag::SubIFDs)?;
    let main = load_directory(&mut source, endian, names, main_offset, "main")?;
    let exif_offset = pointer(&preview, TiffCommonTag::ExifIFDPointer)?;
    let exif = load_directory(&mut source, endian, names, exif_offset, "EXIF")?;

    let preview_strip = strip(&preview)?;
    let main_strip = strip(&main)?;
    debug!("Preview strip: {:?}, main strip: {:?}", preview_strip, main_strip);

    Ok(Self {
      source,
      endian,
      preview,
      main,
      exif,
      preview_strip,
      main_strip,
    })
  }

  pub fn endian(&self) -> Endian {
    self.endian
  }

  pub fn preview(&self) -> &TagDirectory {
    &self.preview
  }

  pub fn preview_mut(&mut self) -> &mut TagDirectory {
    &mut self.preview
  }

  pub fn main(&self) -> &TagDirectory {
    &self.main
  }

  pub fn main_mut(&mut self) -> &mut TagDirectory {
    &mut self.main
  }

  pub fn exif(&self) -> &TagDirectory {
    &self.exif
  }

  pub fn exif_mut(&mut self) -> &mut TagDirectory {
    &mut self.exif
  }

  pub fn preview_strip(&self) -> StripRef {
    self.preview_strip
  }

  pub fn main_strip(&self) -> StripRef {
    self.main_strip
  }

  pub fn into_inner(self) -> R {
    self.source
  }

  /// Write the whole file into `writer`, starting at offset 0.
  ///
  /// The stages run in a fixed order because each one needs the end
  /// offset of the previous one.
  pub fn save<W: Write + Seek>(mut self, writer: &mut W) -> Result<SavedLayout> {
    let plan = LayoutPlan::compute(&self.preview_strip, &self.main_strip);
    debug!("Layout plan: {:?}", plan);

    self.preview.set(TiffCommonTag::StripOffsets, offset_u32(plan.preview_strip)?)?;
    self.preview.set(TiffCommonTag::ExifIFDPointer, offset_u32(plan.exif_ifd)?)?;
    self.main.set(TiffCommonTag::StripOffsets, offset_u32(plan.main_strip)?)?;

    writer.seek(SeekFrom::Start(0))?;
    TiffHeader {
      endian: self.endian,
      ifd0_offset: 0,
    }
    .write(writer)?;

    self.copy_strip(writer, self.preview_strip, plan.preview_strip)?;
    self.copy_strip(writer, self.main_strip, plan.main_strip)?;

    let main_ifd = self.write_exif(writer, plan.exif_ifd)?;
    let preview_ifd = self.write_main(writer, main_ifd)?;
    let end = self.write_preview(writer, preview_ifd, main_ifd)?;

    let mut ifd0 = [0; 4];
    self.endian.write_u32(&mut ifd0, offset_u32(preview_ifd)?);
    writer.seek(SeekFrom::Start(4))?;
    writer.write_all(&ifd0)?;

    if let Err(err) = writer.flush() {
      warn!("Failed to flush output: {}", err);
    }

    Ok(SavedLayout {
      preview_strip: plan.preview_strip,
      main_strip: plan.main_strip,
      exif_ifd: plan.exif_ifd,
      main_ifd,
      preview_ifd,
      end,
    })
  }

  fn copy_strip<W: Write + Seek>(&mut self, writer: &mut W, strip: StripRef, dest: u64) -> Result<()> {
    debug!("Copy {} bytes strip from {} to {}", strip.length, strip.source_offset, dest);
    self.source.seek(SeekFrom::Start(strip.source_offset))?;
    writer.seek(SeekFrom::Start(dest))?;
    let copied = io::copy(&mut (&mut self.source).take(strip.length), writer)?;
    if copied != strip.length {
      return Err(DngError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("strip at {} is truncated: {} of {} bytes", strip.source_offset, copied, strip.length),
      )));
    }
    Ok(())
  }

  /// Returns the start of the main IFD
  fn write_exif<W: Write + Seek>(&self, writer: &mut W, start: u64) -> Result<u64> {
    debug!("Write EXIF IFD at {}", start);
    writer.seek(SeekFrom::Start(start))?;
    Ok(align_even(self.exif.save(writer)?))
  }

  /// Returns the start of the preview IFD
  fn write_main<W: Write + Seek>(&self, writer: &mut W, start: u64) -> Result<u64> {
    debug!("Write main IFD at {}", start);
    writer.seek(SeekFrom::Start(start))?;
    Ok(align_even(self.main.save(writer)?))
  }

  /// Returns the end of the file
  fn write_preview<W: Write + Seek>(&mut self, writer: &mut W, start: u64, main_ifd: u64) -> Result<u64> {
    debug!("Write preview IFD at {}", start);
    self.preview.set(TiffCommonTag::SubIFDs, offset_u32(main_ifd)?)?;
    writer.seek(SeekFrom::Start(start))?;
    Ok(self.preview.save(writer)?)
  }
}

fn load_directory<R: Read + Seek>(source: &mut R, endian: Endian, names: &'static dyn TagNames, offset: u64, what: &str) -> Result<TagDirectory> {
  debug!("Load {} IFD at {}", what, offset);
  source.seek(SeekFrom::Start(offset))?;
  let mut dir = TagDirectory::with_names(endian, names);
  dir.load(source)?;
  for warning in dir.warnings() {
    warn!("{} IFD: {}", what, warning);
  }
  Ok(dir)
}

/// First element of a directory pointer tag
fn pointer(dir: &TagDirectory, tag: TiffCommonTag) -> Result<u64> {
  let value = dir.get(tag).ok_or(DngError::MissingTag(tag.into()))?;
  value
    .get_u32(0)
    .map(u64::from)
    .ok_or_else(|| TiffError::InvalidValue(format!("{:?} is not an offset: {}", tag, value.visual_rep(8))).into())
}

fn strip(dir: &TagDirectory) -> Result<StripRef> {
  let offsets = dir.get(TiffCommonTag::StripOffsets).ok_or(DngError::MissingTag(TiffCommonTag::StripOffsets.into()))?;
  if offsets.count() > 1 {
    return Err(DngError::MultiStrip {
      tag: TiffCommonTag::StripOffsets.into(),
      count: offsets.count(),
    });
  }
  Ok(StripRef {
    source_offset: pointer(dir, TiffCommonTag::StripOffsets)?,
    length: pointer(dir, TiffCommonTag::StripByteCounts)?,
  })
}
