// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

//! Emits the extracted nodes and ways as a new PBF file: one `OSMHeader`
//! blob, then `OSMData` blobs grouped into batches of at most
//! [`MAX_RECORDS_PER_BLOCK`] records, using classic (non-dense) node
//! encoding throughout.

use super::{coord, osmformat, write_frame};
use crate::error::Error;
use crate::model::{NodeRecord, WayRecord};
use protobuf::{Message, MessageField};
use std::collections::HashMap;
use std::io::Write;

/// Maximum number of nodes, or ways, emitted per `OSMData` blob.
const MAX_RECORDS_PER_BLOCK: usize = 8000;

/// Short identifier recorded as `HeaderBlock.writingprogram`.
const WRITING_PROGRAM: &str = "golf-extract";

/// Writes extracted nodes and ways out as a standalone PBF file.
pub struct Writer<W: Write> {
    out: W,
}

impl<W: Write> Writer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes the `OSMHeader` blob. Must be called exactly once, before any
    /// node/way blocks.
    pub fn write_header(&mut self) -> Result<(), Error> {
        let mut header = osmformat::HeaderBlock::default();
        header.required_features = vec!["OsmSchema-V0.6".to_string()];
        header.writingprogram = Some(WRITING_PROGRAM.to_string());
        let bytes = header.write_to_bytes().map_err(Error::blob_decode)?;
        write_frame(&mut self.out, &bytes, "OSMHeader")
    }

    /// Writes all nodes, split across as many `OSMData` blobs as needed.
    pub fn write_nodes(&mut self, nodes: &[NodeRecord]) -> Result<(), Error> {
        for chunk in nodes.chunks(MAX_RECORDS_PER_BLOCK) {
            self.write_node_block(chunk)?;
        }
        Ok(())
    }

    /// Writes all ways, split across as many `OSMData` blobs as needed.
    pub fn write_ways(&mut self, ways: &[WayRecord]) -> Result<(), Error> {
        for chunk in ways.chunks(MAX_RECORDS_PER_BLOCK) {
            self.write_way_block(chunk)?;
        }
        Ok(())
    }

    fn write_node_block(&mut self, nodes: &[NodeRecord]) -> Result<(), Error> {
        let mut table = StringTableBuilder::new();
        let mut group = osmformat::PrimitiveGroup::default();

        for rec in nodes {
            let mut n = osmformat::Node::default();
            n.set_id(rec.id);
            n.set_lon(coord::degrees_to_raw(rec.lon));
            n.set_lat(coord::degrees_to_raw(rec.lat));
            for (k, v) in &rec.tags {
                n.keys.push(table.intern(k));
                n.vals.push(table.intern(v));
            }
            group.nodes.push(n);
        }

        self.write_block(vec![group], table)
    }

    fn write_way_block(&mut self, ways: &[WayRecord]) -> Result<(), Error> {
        let mut table = StringTableBuilder::new();
        let mut group = osmformat::PrimitiveGroup::default();

        for rec in ways {
            let mut w = osmformat::Way::default();
            w.set_id(rec.id);
            w.refs = delta_encode(&rec.node_ids);
            for (k, v) in &rec.tags {
                w.keys.push(table.intern(k));
                w.vals.push(table.intern(v));
            }
            group.ways.push(w);
        }

        self.write_block(vec![group], table)
    }

    fn write_block(
        &mut self,
        groups: Vec<osmformat::PrimitiveGroup>,
        table: StringTableBuilder,
    ) -> Result<(), Error> {
        let mut block = osmformat::PrimitiveBlock::default();
        block.set_granularity(100);
        block.set_lat_offset(0);
        block.set_lon_offset(0);
        block.stringtable = MessageField::some(table.into_table());
        block.primitivegroup = groups;

        let bytes = block.write_to_bytes().map_err(Error::blob_decode)?;
        write_frame(&mut self.out, &bytes, "OSMData")
    }
}

/// Delta-encodes an absolute node-id sequence for `Way.refs`.
fn delta_encode(ids: &[i64]) -> Vec<i64> {
    let mut prev = 0i64;
    ids.iter()
        .map(|&id| {
            let delta = id - prev;
            prev = id;
            delta
        })
        .collect()
}

/// Builds a per-block string table, reserving index 0 as unused and using a
/// proper membership test (not "index 0 means absent") to detect strings
/// already interned.
struct StringTableBuilder {
    index: HashMap<String, u32>,
    strings: Vec<Vec<u8>>,
}

impl StringTableBuilder {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            strings: vec![Vec::new()], // index 0: reserved, unused
        }
    }

    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.as_bytes().to_vec());
        self.index.insert(s.to_string(), idx);
        idx
    }

    fn into_table(self) -> osmformat::StringTable {
        let mut table = osmformat::StringTable::default();
        table.s = self.strings;
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_table_reuses_indices_and_reserves_zero() {
        let mut t = StringTableBuilder::new();
        let a = t.intern("leisure");
        let b = t.intern("golf_course");
        let a_again = t.intern("leisure");
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(a, a_again);
        assert_eq!(t.into_table().s[0], Vec::<u8>::new());
    }

    #[test]
    fn delta_encode_matches_spec_example() {
        assert_eq!(delta_encode(&[5, 3, 13]), vec![5, -2, 10]);
    }
}
