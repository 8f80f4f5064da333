// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

pub fn create_app() -> Command {
  Command::new("m9dng")
    .version(crate_version!())
    .author("Daniel V. <daniel@chaospixel.com>")
    .about("M9DNG - Inspect and re-layout Leica M9 DNG files")
    .subcommand_required(true)
    .arg_required_else_help(true)
    .arg(
      Arg::new("debug")
        .short('d')
        .action(ArgAction::Count)
        .global(true)
        .help("Sets the level of debugging information"),
    )
    .subcommand(
      Command::new("dump")
        .about("Print the preview, main and EXIF directories")
        .arg(Arg::new("json").long("json").action(ArgAction::SetTrue).help("Format output as JSON"))
        .arg(
          Arg::new("limit")
            .long("limit")
            .value_parser(value_parser!(usize))
            .default_value("16")
            .help("Maximum number of value elements to print per tag"),
        )
        .arg(Arg::new("FILE").required(true).value_parser(value_parser!(PathBuf)).help("Input file")),
    )
    .subcommand(
      Command::new("rewrite")
        .about("Load a DNG file and write it back with a fresh layout")
        .arg(Arg::new("artist").long("artist").help("Set the artist tag"))
        .arg(
          Arg::new("override")
            .short('f')
            .long("override")
            .action(ArgAction::SetTrue)
            .help("Override existing files"),
        )
        .arg(Arg::new("INPUT").required(true).value_parser(value_parser!(PathBuf)).help("Input file"))
        .arg(Arg::new("OUTPUT").required(true).value_parser(value_parser!(PathBuf)).help("Output file")),
    )
}
