// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! DNG container layouts built on top of the TIFF directory codec.

use serde::Serialize;
use thiserror::Error;

use crate::formats::tiff::TiffError;

pub mod m9;

pub use m9::{DngImage, LayoutPlan, SavedLayout};

#[derive(Error, Debug)]
pub enum DngError {
  #[error("TIFF error: {}", _0)]
  Tiff(#[from] TiffError),

  #[error("Required tag {} is missing", _0)]
  MissingTag(u16),

  /// The layout engine handles exactly one strip per directory
  #[error("Tag {} holds {} strips, only single-strip directories are supported", tag, count)]
  MultiStrip { tag: u16, count: usize },

  #[error("I/O error while writing DNG: {:?}", _0)]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DngError>;

/// Location of one strip of image data inside the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StripRef {
  pub source_offset: u64,
  pub length: u64,
}
