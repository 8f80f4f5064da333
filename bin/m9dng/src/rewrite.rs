// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{
  fs::{File, remove_file},
  io::{BufReader, BufWriter},
  path::{Path, PathBuf},
  time::Instant,
};

use clap::ArgMatches;
use log::{debug, info};
use mdng::{DngImage, FieldType, tags::TiffCommonTag};

/// Entry point for Clap sub command `rewrite`
pub fn rewrite(options: &ArgMatches) -> crate::Result<()> {
  let in_file: &PathBuf = options.get_one("INPUT").expect("INPUT is required");
  let dest_path: &PathBuf = options.get_one("OUTPUT").expect("OUTPUT is required");

  if dest_path.exists() && !options.get_flag("override") {
    return Err(crate::AppError::AlreadyExists(dest_path.to_owned()));
  }

  match rewrite_internal(options, in_file, dest_path) {
    Ok(_) => Ok(()),
    Err(err) => {
      if dest_path.exists() {
        if let Err(err) = remove_file(dest_path) {
          log::error!("Failed to delete DNG file after rewrite error: {:?}", err);
        }
      }
      Err(err)
    }
  }
}

fn rewrite_internal(options: &ArgMatches, in_file: &Path, dest_path: &Path) -> crate::Result<()> {
  let now = Instant::now();
  debug!("Infile: {}, outfile: {}", in_file.display(), dest_path.display());

  let mut image = DngImage::new(BufReader::new(File::open(in_file)?))?;

  if let Some(artist) = options.get_one::<String>("artist") {
    let preview = image.preview_mut();
    preview.set_type(TiffCommonTag::Artist, FieldType::Ascii);
    preview.set(TiffCommonTag::Artist, artist.as_str())?;
  }

  let mut stream = BufWriter::new(File::create(dest_path)?);
  let layout = image.save(&mut stream)?;
  debug!("Saved layout: {:?}", layout);
  info!("Wrote {} bytes to {} in {:.3} s", layout.end, dest_path.display(), now.elapsed().as_secs_f32());
  Ok(())
}
