// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

//! End-to-end scenarios from spec §8 (S1, S2, S5, S6), assembling small
//! PBF byte streams in memory rather than shipping binary fixture files.

use std::fs::File;
use std::io::Read;

use golf_extract::pbf::{fileformat, osmformat, write_frame, BlobKind, FramedBlobs};
use golf_extract::{GolfCourseMatcher, WayMatcher};
use protobuf::{Message, MessageField};

fn write_header(buf: &mut Vec<u8>, required_features: &[&str]) {
    let mut header = osmformat::HeaderBlock::default();
    header.required_features = required_features.iter().map(|s| s.to_string()).collect();
    let bytes = header.write_to_bytes().unwrap();
    write_frame(buf, &bytes, "OSMHeader").unwrap();
}

struct StringTable {
    strings: Vec<Vec<u8>>,
}

impl StringTable {
    fn new() -> Self {
        Self {
            strings: vec![Vec::new()],
        }
    }

    fn intern(&mut self, s: &str) -> u32 {
        let idx = self.strings.len() as u32;
        self.strings.push(s.as_bytes().to_vec());
        idx
    }

    fn into_table(self) -> osmformat::StringTable {
        let mut t = osmformat::StringTable::default();
        t.s = self.strings;
        t
    }
}

/// A node to place in a classic (non-dense) `OSMData` block.
struct NodeFixture {
    id: i64,
    lon: f64,
    lat: f64,
    tags: Vec<(&'static str, &'static str)>,
}

/// Builds one `OSMData` blob containing classic nodes and ways, and writes
/// its frame into `buf`.
fn write_data_block(buf: &mut Vec<u8>, nodes: &[NodeFixture], ways: &[(i64, Vec<i64>, Vec<(&str, &str)>)]) {
    let mut table = StringTable::new();
    let mut group = osmformat::PrimitiveGroup::default();

    for n in nodes {
        let mut node = osmformat::Node::default();
        node.set_id(n.id);
        node.set_lon((n.lon * 1e9) as i64 / 100);
        node.set_lat((n.lat * 1e9) as i64 / 100);
        for (k, v) in &n.tags {
            node.keys.push(table.intern(k));
            node.vals.push(table.intern(v));
        }
        group.nodes.push(node);
    }

    for (id, refs, tags) in ways {
        let mut way = osmformat::Way::default();
        way.set_id(*id);
        let mut prev = 0i64;
        way.refs = refs
            .iter()
            .map(|&id| {
                let delta = id - prev;
                prev = id;
                delta
            })
            .collect();
        for (k, v) in tags {
            way.keys.push(table.intern(k));
            way.vals.push(table.intern(v));
        }
        group.ways.push(way);
    }

    let mut block = osmformat::PrimitiveBlock::default();
    block.set_granularity(100);
    block.stringtable = MessageField::some(table.into_table());
    block.primitivegroup = vec![group];

    let bytes = block.write_to_bytes().unwrap();
    write_frame(buf, &bytes, "OSMData").unwrap();
}

fn run(input_bytes: &[u8]) -> golf_extract::Result<(std::path::PathBuf, std::path::PathBuf)> {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("input.osm.pbf");
    let output_path = dir.path().join("output.osm.pbf");
    std::fs::write(&input_path, input_bytes).unwrap();

    let result = golf_extract::extract(&input_path, &output_path, &GolfCourseMatcher);
    // Keep the tempdir alive for the caller by leaking it; these are short
    // single-assertion tests, not long-running processes.
    std::mem::forget(dir);
    result.map(|()| (input_path, output_path))
}

fn read_blobs(path: &std::path::Path) -> Vec<(BlobKind, Vec<u8>)> {
    let file = File::open(path).unwrap();
    FramedBlobs::new(file)
        .map(|b| {
            let b = b.unwrap();
            let kind = b.kind;
            (kind, b.inflate().unwrap())
        })
        .collect()
}

#[test]
fn s1_empty_file_yields_header_only_output() {
    let mut input = Vec::new();
    write_header(&mut input, &["OsmSchema-V0.6", "DenseNodes"]);

    let (_, output_path) = run(&input).expect("extraction should succeed");
    let blobs = read_blobs(&output_path);

    assert_eq!(blobs.len(), 1);
    assert_eq!(blobs[0].0, BlobKind::Header);
}

#[test]
fn s2_one_way_three_nodes_round_trips() {
    let mut input = Vec::new();
    write_header(&mut input, &["OsmSchema-V0.6", "DenseNodes"]);
    write_data_block(
        &mut input,
        &[
            NodeFixture {
                id: 1,
                lon: 0.0,
                lat: 0.0,
                tags: vec![],
            },
            NodeFixture {
                id: 2,
                lon: 1.0,
                lat: 0.0,
                tags: vec![],
            },
            NodeFixture {
                id: 3,
                lon: 1.0,
                lat: 1.0,
                tags: vec![],
            },
        ],
        &[(10, vec![1, 2, 3], vec![("leisure", "golf_course")])],
    );

    let (_, output_path) = run(&input).expect("extraction should succeed");
    let blobs = read_blobs(&output_path);

    assert_eq!(blobs[0].0, BlobKind::Header);

    let mut seen_node_ids = Vec::new();
    let mut seen_way: Option<osmformat::Way> = None;
    for (kind, data) in &blobs[1..] {
        assert_eq!(*kind, BlobKind::Data);
        let block = osmformat::PrimitiveBlock::parse_from_bytes(data).unwrap();
        for group in &block.primitivegroup {
            for n in &group.nodes {
                seen_node_ids.push(n.id());
            }
            for w in &group.ways {
                seen_way = Some(w.clone());
            }
        }
    }

    seen_node_ids.sort();
    assert_eq!(seen_node_ids, vec![1, 2, 3]);

    let way = seen_way.expect("way should be present in output");
    assert_eq!(way.id(), 10);

    let mut acc = 0i64;
    let absolute_refs: Vec<i64> = way
        .refs
        .iter()
        .map(|&d| {
            acc += d;
            acc
        })
        .collect();
    assert_eq!(absolute_refs, vec![1, 2, 3]);
}

#[test]
fn s5_unsupported_required_feature_is_fatal() {
    let mut input = Vec::new();
    write_header(&mut input, &["HistoricalInformation"]);

    let err = run(&input).expect_err("unsupported required feature must abort the run");
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn s6_zlib_blob_without_raw_size_is_fatal() {
    let mut input = Vec::new();
    write_header(&mut input, &["OsmSchema-V0.6"]);

    // A malformed OSMData blob: zlibData present, rawSize absent.
    let mut blob = fileformat::Blob::default();
    blob.set_zlib_data(vec![0u8; 8]);
    let blob_bytes = blob.write_to_bytes().unwrap();

    let mut header = fileformat::BlobHeader::default();
    header.set_type("OSMData".to_string());
    header.set_datasize(blob_bytes.len() as i32);
    let header_bytes = header.write_to_bytes().unwrap();

    input.extend_from_slice(&(header_bytes.len() as u32).to_be_bytes());
    input.extend_from_slice(&header_bytes);
    input.extend_from_slice(&blob_bytes);

    let err = run(&input).expect_err("missing rawSize on a zlib blob must abort the run");
    assert_eq!(err.exit_code(), 6);
}

#[test]
fn way_with_no_selected_nodes_is_dropped() {
    let mut input = Vec::new();
    write_header(&mut input, &["OsmSchema-V0.6"]);
    write_data_block(
        &mut input,
        &[],
        &[(1, vec![], vec![("leisure", "golf_course")])],
    );

    let (_, output_path) = run(&input).expect("extraction should succeed");
    let blobs = read_blobs(&output_path);
    assert_eq!(blobs.len(), 1, "no node/way blocks should be emitted");
}

#[test]
fn matcher_rejects_non_golf_ways() {
    let m = GolfCourseMatcher;
    assert!(!m.matches(&[("leisure".to_string(), "park".to_string())]));
}
