// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Tag identifiers and the read-only name lookup used for diagnostics.
//!
//! Only a handful of tags drive the M9 relayout (strip offsets and counts,
//! the SubIFD and EXIF pointers, XMP). The rest are known purely so log and
//! dump output can print a readable name. A missing name never changes
//! behaviour.

use std::fmt::Debug;

use crate::formats::tiff::FieldType;

/// Anything usable as a tag key in a directory
pub trait TiffTag: Into<u16> + Copy + Debug {}

impl TiffTag for u16 {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, enumn::N)]
#[repr(u16)]
pub enum TiffCommonTag {
  NewSubFileType = 0x00FE,
  ImageWidth = 0x0100,
  ImageLength = 0x0101,
  BitsPerSample = 0x0102,
  Compression = 0x0103,
  PhotometricInt = 0x0106,
  Make = 0x010F,
  Model = 0x0110,
  StripOffsets = 0x0111,
  Orientation = 0x0112,
  SamplesPerPixel = 0x0115,
  RowsPerStrip = 0x0116,
  StripByteCounts = 0x0117,
  XResolution = 0x011A,
  YResolution = 0x011B,
  PlanarConfiguration = 0x011C,
  ResolutionUnit = 0x0128,
  Software = 0x0131,
  DateTime = 0x0132,
  Artist = 0x013B,
  SubIFDs = 0x014A,
  Xmp = 0x02BC,
  CFARepeatPatternDim = 0x828D,
  CFAPattern = 0x828E,
  Copyright = 0x8298,
  ExifIFDPointer = 0x8769,
  DNGVersion = 0xC612,
  DNGBackwardVersion = 0xC613,
  UniqueCameraModel = 0xC614,
  LinearizationTable = 0xC618,
  BlackLevelRepeatDim = 0xC619,
  BlackLevels = 0xC61A,
  WhiteLevel = 0xC61D,
  DefaultScale = 0xC61E,
  DefaultCropOrigin = 0xC61F,
  DefaultCropSize = 0xC620,
  ColorMatrix1 = 0xC621,
  ColorMatrix2 = 0xC622,
  CameraCalibration1 = 0xC623,
  CameraCalibration2 = 0xC624,
  AnalogBalance = 0xC627,
  AsShotNeutral = 0xC628,
  BaselineExposure = 0xC62A,
  BaselineNoise = 0xC62B,
  BaselineSharpness = 0xC62C,
  BayerGreenSplit = 0xC62D,
  LinearResponseLimit = 0xC62E,
  CameraSerialNumber = 0xC62F,
  LensInfo = 0xC630,
  AntiAliasStrength = 0xC632,
  DNGPrivateData = 0xC634,
  CalibrationIlluminant1 = 0xC65A,
  CalibrationIlluminant2 = 0xC65B,
  BestQualityScale = 0xC65C,
  ActiveArea = 0xC68D,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, enumn::N)]
#[repr(u16)]
pub enum ExifTag {
  ExposureTime = 0x829A,
  FNumber = 0x829D,
  ExposureProgram = 0x8822,
  ISOSpeed = 0x8827,
  ExifVersion = 0x9000,
  DateTimeOriginal = 0x9003,
  CreateDate = 0x9004,
  ShutterSpeedValue = 0x9201,
  ApertureValue = 0x9202,
  ExposureBiasValue = 0x9204,
  MaxApertureValue = 0x9205,
  MeteringMode = 0x9207,
  LightSource = 0x9208,
  Flash = 0x9209,
  FocalLength = 0x920A,
  MakerNotes = 0x927C,
  ImageUniqueID = 0xA420,
  FileSource = 0xA300,
  SceneType = 0xA301,
  CustomRendered = 0xA401,
  ExposureMode = 0xA402,
  WhiteBalance = 0xA403,
  DigitalZoomRatio = 0xA404,
  FocalLengthIn35mmFormat = 0xA405,
  SceneCaptureType = 0xA406,
  SerialNumber = 0xA431,
}

impl From<TiffCommonTag> for u16 {
  fn from(tag: TiffCommonTag) -> Self {
    tag as u16
  }
}

impl From<ExifTag> for u16 {
  fn from(tag: ExifTag) -> Self {
    tag as u16
  }
}

impl TiffTag for TiffCommonTag {}
impl TiffTag for ExifTag {}

/// Read-only lookup from numeric ids to names, consulted only when
/// building log and dump text.
pub trait TagNames: Sync {
  fn tag_name(&self, tag: u16) -> Option<String>;

  fn type_name(&self, typ: u16) -> Option<&'static str> {
    FieldType::try_from(typ).ok().map(FieldType::name)
  }

  fn describe(&self, tag: u16, typ: u16) -> String {
    format!(
      "tag: {} ({}) - type: {} ({})",
      self.tag_name(tag).unwrap_or_else(|| "UNKNOWN".into()),
      tag,
      self.type_name(typ).unwrap_or("UNKNOWN"),
      typ
    )
  }
}

/// Names for the baseline TIFF, DNG and EXIF tags listed above.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardTagNames;

pub static STANDARD_TAG_NAMES: StandardTagNames = StandardTagNames;

impl TagNames for StandardTagNames {
  fn tag_name(&self, tag: u16) -> Option<String> {
    TiffCommonTag::n(tag)
      .map(|t| format!("{:?}", t))
      .or_else(|| ExifTag::n(tag).map(|t| format!("{:?}", t)))
  }
}
