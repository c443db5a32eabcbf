// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

//! The parallel block scanner that every pass driver runs on top of.
//!
//! One sequential producer (a [`crate::pbf::FramedBlobs`] iterator) reads
//! framed, still-compressed blobs off the file in order. [`rayon`]'s
//! [`ParallelBridge`] fans each blob out to a pool of worker threads, which
//! inflate, parse, and filter it via the caller-supplied `handler`. A single
//! dedicated collector thread folds every result into the pass's
//! accumulator via `collect` — the only place that ever mutates
//! cross-pass state, so no locks are needed there.
//!
//! `scan` runs its `par_bridge()` work on whichever rayon thread pool is
//! active when it's called, not necessarily rayon's ambient global one;
//! `crate::extract_with_options` wraps the whole pass sequence in
//! `pool.install(...)` on a pool sized per [`crate::Options`].

use crate::error::Error;
use crate::pbf::{FramedBlobs, RawBlob};
use log::info;
use rayon::iter::{ParallelBridge, ParallelIterator};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;

/// Runs one full pass over `reader`. `handler` receives each blob still
/// compressed; it is responsible for checking [`RawBlob::kind`] and calling
/// [`RawBlob::inflate`] only for the kind this pass cares about, so a blob
/// of no interest to this pass (e.g. an `OSMData` blob during header
/// validation) is never inflated or parsed.
///
/// Returns the first fatal [`Error`] encountered by any worker, if any; the
/// pipeline has no resume points, so any such error aborts the whole pass.
pub fn scan<R, T, H, C>(reader: R, pass_name: &str, handler: H, mut collect: C) -> Result<(), Error>
where
    R: Read + Send,
    T: Send,
    H: Fn(RawBlob) -> Result<Vec<T>, Error> + Sync,
    C: FnMut(T),
{
    info!("{pass_name}: starting");

    let blobs = FramedBlobs::new(reader);
    let processed = AtomicUsize::new(0);
    let first_error: Mutex<Option<Error>> = Mutex::new(None);

    std::thread::scope(|scope| {
        let (tx, rx) = mpsc::channel::<Vec<T>>();

        let collector = scope.spawn(move || {
            for batch in rx {
                for item in batch {
                    collect(item);
                }
            }
        });

        // `Sender` is `Send` but not `Sync`: rayon's `for_each_with` gives
        // each worker thread its own clone rather than sharing one behind a
        // reference, matching `nyurik-osm2rdf`'s `parse_with_cache`.
        blobs.par_bridge().for_each_with(tx, |tx: &mut Sender<Vec<T>>, blob| {
            let result = blob.and_then(|b| handler(b));

            match result {
                Ok(items) => {
                    if !items.is_empty() {
                        // The receiver only disappears once the collector
                        // has drained it, which only happens after every
                        // per-thread sender clone (including this one) is
                        // dropped at the end of `for_each_with`.
                        let _ = tx.send(items);
                    }
                }
                Err(e) => {
                    let mut slot = first_error.lock().unwrap();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                }
            }

            let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 500 == 0 {
                info!("{pass_name}: processed {count} blobs");
            }
        });
        collector.join().expect("collector thread panicked");
    });

    info!(
        "{pass_name}: finished ({} blobs processed)",
        processed.load(Ordering::Relaxed)
    );

    match first_error.into_inner().unwrap() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
