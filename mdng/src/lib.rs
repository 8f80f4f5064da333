// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Read and re-layout the tag directories of Leica M9 DNG files.
//!
//! The crate has two layers. `formats::tiff` parses and writes single TIFF
//! image file directories with the classic inline/external value rules.
//! `dng::m9` ties three of those directories and two image strips together
//! and writes them back out with recomputed offsets.
//!
//! # Example
//! ```rust,no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let source = BufReader::new(File::open("L1000001.DNG")?);
//!   let mut image = mdng::DngImage::new(source)?;
//!   image.preview_mut().set_type(mdng::tags::TiffCommonTag::Artist, mdng::FieldType::Ascii);
//!   image.preview_mut().set(mdng::tags::TiffCommonTag::Artist, "Jane Doe")?;
//!   let mut out = File::create("L1000001-new.DNG")?;
//!   let layout = image.save(&mut out)?;
//!   println!("wrote {} bytes", layout.end);
//!   Ok(())
//! }
//! ```

#![deny(unstable_features)]

pub mod bits;
pub mod dng;
pub(crate) mod envparams;
pub mod formats;
pub mod tags;

pub use bits::Endian;
pub use dng::{DngError, DngImage, LayoutPlan, SavedLayout, StripRef};
pub use formats::tiff::{Entry, FieldType, Rational, SRational, TagDirectory, TiffError, Value};
