// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

//! Extracts golf courses from an [OpenStreetMap](https://www.openstreetmap.org/)
//! PBF dataset.
//!
//! Given an input `.osm.pbf` file, [`extract`] locates every way matched by
//! a [`matcher::WayMatcher`] (by default, ways tagged `leisure=golf_course`),
//! computes each match's bounding box, collects every node that falls
//! inside at least one such box, collects every way that references at
//! least one such node, and writes the result out as a new PBF file.
//!
//! The extraction is a five-pass streaming scan over the input rather than
//! a single pass over an in-memory graph, so it stays linear in file size
//! on inputs far larger than available memory (see the pass drivers in
//! `passes`).
//!
//! # Example
//!
//! ```no_run
//! let matcher = golf_extract::GolfCourseMatcher;
//! golf_extract::extract("path/to/monaco.osm.pbf", "output.osm.pbf", &matcher)
//!     .expect("extraction failed");
//! ```

pub mod error;
pub mod matcher;
pub mod model;
pub mod pbf;

mod passes;
mod scanner;

pub use error::{Error, Result};
pub use matcher::{GolfCourseMatcher, WayMatcher};
pub use model::{BoundingBox, NodeIdSet, NodeOwners, NodeRecord, WayRecord, WayRefTable};

use log::info;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom};
use std::path::Path;

/// Overrides for how the extraction pipeline runs. The worker pool size is
/// currently the only knob; everything else about the five-pass scan is
/// fixed by the format itself.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Worker threads per pass. `None` uses [`default_worker_count`] (twice
    /// the number of logical CPUs, per the pipeline's design).
    pub workers: Option<usize>,
}

/// Twice the number of logical CPUs, falling back to `1` if that can't be
/// determined. This is the pipeline's own default, distinct from rayon's
/// ambient global pool (one worker per logical CPU): [`extract_with_options`]
/// always builds a dedicated pool rather than relying on the global one.
pub fn default_worker_count() -> usize {
    2 * std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

/// Runs the full five-pass extraction of `input` into `output`, using
/// `matcher` to decide which ways qualify and the default [`Options`].
///
/// `output` is created (and truncated if it already exists). The input
/// file is reopened at offset 0 before each pass; only the producer side
/// of the parallel scanner (see `scanner`) ever reads it.
pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    matcher: &dyn WayMatcher,
) -> Result<()> {
    extract_with_options(input, output, matcher, &Options::default())
}

/// Like [`extract`], but with explicit [`Options`] (currently: worker pool
/// size per pass).
pub fn extract_with_options<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    matcher: &dyn WayMatcher,
    options: &Options,
) -> Result<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    let mut file = File::open(input).map_err(|e| Error::Open(input.to_path_buf(), e.into()))?;

    let workers = options.workers.unwrap_or_else(default_worker_count);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))?;

    pool.install(|| -> Result<()> {
        let total = pbf::count_blobs(&mut file)?;
        info!("{}: {total} blobs total ({workers} workers)", input.display());
        rewind(&mut file)?;

        passes::validate_header(&mut file)?;
        rewind(&mut file)?;

        let way_refs = passes::match_ways(&mut file, matcher)?;
        info!("pass 2: {} way(s) matched", way_refs.len());
        rewind(&mut file)?;

        let boxes = passes::compute_bounding_boxes(&mut file, &way_refs)?;
        rewind(&mut file)?;

        let nodes = passes::select_nodes_in_boxes(&mut file, &boxes)?;
        info!("pass 4: {} node(s) selected", nodes.len());
        rewind(&mut file)?;

        let node_ids = NodeIdSet::from_nodes(&nodes);
        let ways = passes::select_ways_from_nodes(&mut file, &node_ids)?;
        info!("pass 5: {} way(s) selected", ways.len());

        write_output(output, &nodes, &ways)?;

        Ok(())
    })
}

fn rewind(file: &mut File) -> Result<()> {
    file.seek(SeekFrom::Start(0))?;
    Ok(())
}

fn write_output(path: &Path, nodes: &[NodeRecord], ways: &[WayRecord]) -> Result<()> {
    let out = File::create(path)?;
    set_output_mode(&out)?;
    let mut writer = pbf::writer::Writer::new(BufWriter::new(out));
    writer.write_header()?;
    writer.write_nodes(nodes)?;
    writer.write_ways(ways)?;
    Ok(())
}

#[cfg(unix)]
fn set_output_mode(out: &File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    out.set_permissions(std::fs::Permissions::from_mode(0o664))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_output_mode(_out: &File) -> Result<()> {
    Ok(())
}
