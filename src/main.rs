// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

//! CLI front-end: parses one positional argument (the input path), runs the
//! extraction against `output.osm.pbf` in the current directory, and maps
//! the library's [`golf_extract::Error`] onto the process exit codes this
//! tool's contract promises.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use golf_extract::GolfCourseMatcher;

/// Extract golf courses (and their nodes) from an OpenStreetMap PBF file.
#[derive(Parser)]
struct Cli {
    /// Path to the input `.osm.pbf` file.
    input: PathBuf,
}

const OUTPUT_PATH: &str = "output.osm.pbf";

fn main() -> ExitCode {
    colog::init();
    let cli = Cli::parse();

    match golf_extract::extract(&cli.input, OUTPUT_PATH, &GolfCourseMatcher) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
