// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{fs::File, io::BufReader, path::PathBuf};

use clap::ArgMatches;
use log::debug;
use mdng::{DngImage, Entry, Endian, StripRef, TagDirectory};
use serde::Serialize;

#[derive(Serialize)]
struct DirectoryDump<'a> {
  entries: &'a [Entry],
  warnings: &'a [String],
}

#[derive(Serialize)]
struct FileDump<'a> {
  endian: &'static str,
  preview_strip: StripRef,
  main_strip: StripRef,
  preview: DirectoryDump<'a>,
  main: DirectoryDump<'a>,
  exif: DirectoryDump<'a>,
}

impl<'a> From<&'a TagDirectory> for DirectoryDump<'a> {
  fn from(dir: &'a TagDirectory) -> Self {
    Self {
      entries: dir.entries(),
      warnings: dir.warnings(),
    }
  }
}

/// Entry point for Clap sub command `dump`
pub fn dump(options: &ArgMatches) -> crate::Result<()> {
  let in_file: &PathBuf = options.get_one("FILE").expect("FILE is required");
  let limit = options.get_one::<usize>("limit").copied().unwrap_or(16);
  debug!("Infile: {}", in_file.display());

  let image = DngImage::new(BufReader::new(File::open(in_file)?))?;

  if options.get_flag("json") {
    let out = FileDump {
      endian: match image.endian() {
        Endian::Big => "big",
        Endian::Little => "little",
      },
      preview_strip: image.preview_strip(),
      main_strip: image.main_strip(),
      preview: image.preview().into(),
      main: image.main().into(),
      exif: image.exif().into(),
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    return Ok(());
  }

  println!("Byte order: {:?}", image.endian());
  let sections = [
    ("Preview IFD", image.preview(), Some(image.preview_strip())),
    ("Main IFD", image.main(), Some(image.main_strip())),
    ("EXIF IFD", image.exif(), None),
  ];
  for (title, dir, strip) in sections {
    println!();
    println!("{}", title);
    if let Some(strip) = strip {
      println!("Strip: {} bytes at offset {}", strip.length, strip.source_offset);
    }
    for line in dir.dump(limit) {
      println!("{}", line);
    }
    for warning in dir.warnings() {
      println!("Warning: {}", warning);
    }
  }
  Ok(())
}
