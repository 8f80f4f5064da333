// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

mod app;
mod dump;
mod rewrite;

use std::path::PathBuf;

use fern::colors::{Color, ColoredLevelConfig};
use thiserror::Error;

/// Main entry function
///
/// We initialize the fern logger here, create a Clap command line
/// parser and dispatch to the sub command.
fn main() -> anyhow::Result<()> {
  let app = app::create_app();
  let matches = app.try_get_matches().unwrap_or_else(|e| e.exit());

  let colors = ColoredLevelConfig::new().debug(Color::Magenta);
  fern::Dispatch::new()
    .chain(std::io::stderr())
    .level({
      match matches.get_count("debug") {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
      }
    })
    .format(move |out, message, record| {
      out.finish(format_args!(
        "[{:6}][{}] {} ({}:{})",
        colors.color(record.level()),
        record.target(),
        message,
        record.file().unwrap_or("<undefined>"),
        record.line().unwrap_or(0)
      ))
    })
    .apply()?;

  match matches.subcommand() {
    Some(("dump", sc)) => dump::dump(sc)?,
    Some(("rewrite", sc)) => rewrite::rewrite(sc)?,
    _ => unreachable!("subcommand is required"),
  }
  Ok(())
}

#[derive(Error, Debug)]
pub enum AppError {
  #[error("I/O error: {}", _0)]
  Io(#[from] std::io::Error),
  #[error("Destination already exists: {}", _0.display())]
  AlreadyExists(PathBuf),
  #[error("Invalid DNG file: {}", _0)]
  Dng(#[from] mdng::DngError),
  #[error("Tag update failed: {}", _0)]
  Tiff(#[from] mdng::TiffError),
  #[error("JSON output failed: {}", _0)]
  Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
