// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

//! In-memory entities that cross pass boundaries: the extracted records
//! themselves, and the accumulators (`WayRefTable`, `NodeOwners`,
//! `NodeIdSet`) that make the five-pass scan linear instead of quadratic.

use std::collections::{HashMap, HashSet};

/// A node selected because it falls inside at least one matched way's
/// bounding box. Per-node metadata (version/timestamp/changeset/user) is not
/// preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: i64,
    pub lon: f64,
    pub lat: f64,
    pub tags: Vec<(String, String)>,
}

/// A way selected because it references at least one selected node.
#[derive(Debug, Clone, PartialEq)]
pub struct WayRecord {
    pub id: i64,
    pub node_ids: Vec<i64>,
    pub tags: Vec<(String, String)>,
}

/// An axis-aligned bounding box in decimal degrees, inclusive on all sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Seeds a box from its first sighted point.
    pub fn seed(lon: f64, lat: f64) -> Self {
        Self {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon,
            max_lat: lat,
        }
    }

    /// Widens the box, component-wise, to also cover `(lon, lat)`.
    pub fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    /// Inclusive point-in-box test; no epsilon is applied.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lat >= self.min_lat && lon <= self.max_lon && lat <= self.max_lat
    }
}

/// Every matched way's absolute node-id list, indexed by insertion order
/// from Pass 2. The index is an internal identity only: later passes always
/// go through [`NodeOwners`] to get back to a way, so it never leaks into
/// the output.
#[derive(Debug, Default)]
pub struct WayRefTable {
    entries: Vec<Vec<i64>>,
}

impl WayRefTable {
    /// Appends a matched way's node-id list, returning its index.
    pub fn push(&mut self, node_ids: Vec<i64>) -> usize {
        self.entries.push(node_ids);
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn node_ids(&self, index: usize) -> &[i64] {
        &self.entries[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<i64>> {
        self.entries.iter()
    }
}

/// Maps a node id to every way (by index into [`WayRefTable`]) that
/// references it. Built once, before Pass 3 starts scanning.
#[derive(Debug, Default)]
pub struct NodeOwners(HashMap<i64, Vec<usize>>);

impl NodeOwners {
    pub fn build(table: &WayRefTable) -> Self {
        let mut owners: HashMap<i64, Vec<usize>> = HashMap::new();
        for (way_index, node_ids) in table.iter().enumerate() {
            for &id in node_ids {
                let entry = owners.entry(id).or_default();
                if !entry.contains(&way_index) {
                    entry.push(way_index);
                }
            }
        }
        Self(owners)
    }

    pub fn owning_ways(&self, node_id: i64) -> &[usize] {
        self.0.get(&node_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// The set of node ids selected by Pass 4, consulted by Pass 5.
#[derive(Debug, Default)]
pub struct NodeIdSet(HashSet<i64>);

impl NodeIdSet {
    pub fn from_nodes(nodes: &[NodeRecord]) -> Self {
        Self(nodes.iter().map(|n| n.id).collect())
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.contains(&id)
    }
}
