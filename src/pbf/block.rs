// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

//! Decodes an inflated `OSMData` payload into its string table, dense and
//! classic nodes, and ways — resolving string-table indices and undoing
//! delta encoding along the way.

use super::coord::CoordinateConverter;
use super::osmformat;
use crate::error::Error;
use protobuf::Message;

/// A decoded node, classic or dense, with its tags already resolved through
/// the block's string table.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lon: f64,
    pub lat: f64,
    pub tags: Vec<(String, String)>,
}

/// A decoded way with absolute (already delta-summed) node ids.
#[derive(Debug, Clone, PartialEq)]
pub struct WayEntry {
    pub id: i64,
    pub node_ids: Vec<i64>,
    pub tags: Vec<(String, String)>,
}

/// A decoded `PrimitiveBlock`.
pub struct Block(osmformat::PrimitiveBlock);

impl Block {
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        osmformat::PrimitiveBlock::parse_from_bytes(bytes)
            .map(Block)
            .map_err(Error::data_decode)
    }

    pub fn string_table(&self) -> Vec<String> {
        self.0
            .stringtable
            .s
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    pub fn coordinate_converter(&self) -> CoordinateConverter {
        CoordinateConverter {
            granularity: self.0.granularity() as i64,
            lon_offset: self.0.lon_offset(),
            lat_offset: self.0.lat_offset(),
        }
    }

    pub fn groups(&self) -> &[osmformat::PrimitiveGroup] {
        &self.0.primitivegroup
    }
}

/// Decodes the classic (non-dense) nodes of a group.
pub fn classic_nodes<'a>(
    group: &'a osmformat::PrimitiveGroup,
    conv: CoordinateConverter,
    strings: &'a [String],
) -> impl Iterator<Item = Node> + 'a {
    group.nodes.iter().map(move |n| Node {
        id: n.id(),
        lon: conv.to_lon(n.lon()),
        lat: conv.to_lat(n.lat()),
        tags: collect_tags(&n.keys, &n.vals, strings),
    })
}

/// Decodes the dense-encoded nodes of a group, undoing delta encoding of
/// `id`/`lon`/`lat` and walking the flattened, per-node-sentinel-terminated
/// `keysVals` stream.
///
/// Returns a plain `Vec` rather than a lazy iterator because the `keysVals`
/// cursor must advance in lockstep with every node, classic-iterator
/// combinators over independent fields cannot express that coupling.
pub fn dense_nodes(
    group: &osmformat::PrimitiveGroup,
    conv: CoordinateConverter,
    strings: &[String],
) -> Vec<Node> {
    let Some(dense) = group.dense.as_ref() else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(dense.id.len());
    let has_tags = !dense.keys_vals.is_empty();

    let (mut id, mut lon, mut lat) = (0i64, 0i64, 0i64);
    let mut kv_cursor = 0usize;

    for i in 0..dense.id.len() {
        id += dense.id[i];
        lon += dense.lon.get(i).copied().unwrap_or(0);
        lat += dense.lat.get(i).copied().unwrap_or(0);

        let mut tags = Vec::new();
        if has_tags {
            while kv_cursor < dense.keys_vals.len() && dense.keys_vals[kv_cursor] != 0 {
                let key_idx = dense.keys_vals[kv_cursor] as u32;
                let val_idx = dense.keys_vals.get(kv_cursor + 1).copied().unwrap_or(0) as u32;
                tags.push((get_string(strings, key_idx), get_string(strings, val_idx)));
                kv_cursor += 2;
            }
            kv_cursor += 1; // step past the 0 sentinel
        }

        nodes.push(Node {
            id,
            lon: conv.to_lon(lon),
            lat: conv.to_lat(lat),
            tags,
        });
    }

    nodes
}

/// Decodes the ways of a group, undoing delta encoding of `refs`.
pub fn ways<'a>(
    group: &'a osmformat::PrimitiveGroup,
    strings: &'a [String],
) -> impl Iterator<Item = WayEntry> + 'a {
    group.ways.iter().map(move |w| WayEntry {
        id: w.id(),
        node_ids: delta_decode(&w.refs),
        tags: collect_tags(&w.keys, &w.vals, strings),
    })
}

/// Prefix-sums a delta-encoded sequence into absolute values.
pub fn delta_decode(deltas: &[i64]) -> Vec<i64> {
    let mut acc = 0i64;
    deltas
        .iter()
        .map(|&d| {
            acc += d;
            acc
        })
        .collect()
}

fn collect_tags(keys: &[u32], vals: &[u32], strings: &[String]) -> Vec<(String, String)> {
    keys.iter()
        .zip(vals.iter())
        .map(|(&k, &v)| (get_string(strings, k), get_string(strings, v)))
        .collect()
}

fn get_string(strings: &[String], idx: u32) -> String {
    strings.get(idx as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings() -> Vec<String> {
        vec!["".into(), "k".into(), "v".into(), "k2".into(), "v2".into()]
    }

    #[test]
    fn dense_nodes_with_sentinel_separated_tags() {
        let mut group = osmformat::PrimitiveGroup::default();
        let mut dense = osmformat::DenseNodes::default();
        dense.id = vec![10, 1, 1]; // absolute: 10, 11, 12
        dense.lon = vec![0, 0, 0];
        dense.lat = vec![0, 0, 0];
        dense.keys_vals = vec![1, 2, 0, 0, 3, 4, 0];
        group.dense = Some(dense).into();

        let nodes = dense_nodes(&group, CoordinateConverter::default(), &strings());
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].id, 10);
        assert_eq!(nodes[0].tags, vec![("k".to_string(), "v".to_string())]);
        assert_eq!(nodes[1].id, 11);
        assert!(nodes[1].tags.is_empty());
        assert_eq!(nodes[2].id, 12);
        assert_eq!(nodes[2].tags, vec![("k2".to_string(), "v2".to_string())]);
    }

    #[test]
    fn dense_nodes_without_any_tags() {
        let mut group = osmformat::PrimitiveGroup::default();
        let mut dense = osmformat::DenseNodes::default();
        dense.id = vec![1, 1];
        dense.lon = vec![0, 0];
        dense.lat = vec![0, 0];
        group.dense = Some(dense).into();

        let nodes = dense_nodes(&group, CoordinateConverter::default(), &strings());
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.tags.is_empty()));
    }

    #[test]
    fn way_refs_are_delta_decoded() {
        assert_eq!(delta_decode(&[5, -2, 10]), vec![5, 3, 13]);
    }
}
