// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

//! The five pass drivers: header validation, way matching, bounding-box
//! accumulation, node selection, and way selection. Each reopens/rewinds
//! the input and runs it through the [`crate::scanner`].

use crate::error::Error;
use crate::matcher::WayMatcher;
use crate::model::{BoundingBox, NodeIdSet, NodeOwners, NodeRecord, WayRecord, WayRefTable};
use crate::pbf::block::{self, Block};
use crate::pbf::{osmformat, BlobKind};
use crate::scanner::scan;
use protobuf::Message;
use std::fs::File;

/// Pass 1: validates every `OSMHeader` blob's required features.
pub fn validate_header(file: &mut File) -> Result<(), Error> {
    scan::<_, (), _, _>(
        file,
        "pass 1 (header validation)",
        |blob| {
            if blob.kind != BlobKind::Header {
                return Ok(Vec::new());
            }
            let data = blob.inflate()?;

            let header =
                osmformat::HeaderBlock::parse_from_bytes(&data).map_err(Error::header_decode)?;

            let unsupported: Vec<String> = header
                .required_features
                .iter()
                .filter(|f| f.as_str() != "OsmSchema-V0.6" && f.as_str() != "DenseNodes")
                .cloned()
                .collect();

            if !unsupported.is_empty() {
                return Err(Error::UnsupportedFeature(unsupported));
            }

            Ok(Vec::new())
        },
        |_| {},
    )
}

/// Pass 2: matches ways against `matcher`, collecting each match's absolute
/// node-id list into a [`WayRefTable`].
pub fn match_ways(file: &mut File, matcher: &dyn WayMatcher) -> Result<WayRefTable, Error> {
    let mut table = WayRefTable::default();

    scan(
        file,
        "pass 2 (match ways)",
        |blob| {
            if blob.kind != BlobKind::Data {
                return Ok(Vec::new());
            }
            let data = blob.inflate()?;

            let decoded = Block::parse(&data)?;
            let strings = decoded.string_table();

            let mut matched = Vec::new();
            for group in decoded.groups() {
                for way in block::ways(group, &strings) {
                    if !way.node_ids.is_empty() && matcher.matches(&way.tags) {
                        matched.push(way.node_ids);
                    }
                }
            }
            Ok(matched)
        },
        |node_ids| {
            table.push(node_ids);
        },
    )?;

    Ok(table)
}

/// Pass 3: builds [`NodeOwners`] from `table`, then folds every owned
/// node's coordinates into its owning way's bounding box.
pub fn compute_bounding_boxes(
    file: &mut File,
    table: &WayRefTable,
) -> Result<Vec<Option<BoundingBox>>, Error> {
    let owners = NodeOwners::build(table);
    let mut boxes: Vec<Option<BoundingBox>> = vec![None; table.len()];

    scan(
        file,
        "pass 3 (bounding boxes)",
        |blob| {
            if blob.kind != BlobKind::Data {
                return Ok(Vec::new());
            }
            let data = blob.inflate()?;

            let decoded = Block::parse(&data)?;
            let strings = decoded.string_table();
            let conv = decoded.coordinate_converter();

            let mut hits = Vec::new();
            for group in decoded.groups() {
                for node in block::classic_nodes(group, conv, &strings) {
                    for &way_index in owners.owning_ways(node.id) {
                        hits.push((way_index, node.lon, node.lat));
                    }
                }
                for node in block::dense_nodes(group, conv, &strings) {
                    for &way_index in owners.owning_ways(node.id) {
                        hits.push((way_index, node.lon, node.lat));
                    }
                }
            }
            Ok(hits)
        },
        |(way_index, lon, lat)| match &mut boxes[way_index] {
            Some(existing) => existing.extend(lon, lat),
            slot @ None => *slot = Some(BoundingBox::seed(lon, lat)),
        },
    )?;

    Ok(boxes)
}

/// Pass 4: selects every node that falls inside at least one non-null box.
pub fn select_nodes_in_boxes(
    file: &mut File,
    boxes: &[Option<BoundingBox>],
) -> Result<Vec<NodeRecord>, Error> {
    let mut nodes = Vec::new();

    scan(
        file,
        "pass 4 (nodes in box)",
        |blob| {
            if blob.kind != BlobKind::Data {
                return Ok(Vec::new());
            }
            let data = blob.inflate()?;

            let decoded = Block::parse(&data)?;
            let strings = decoded.string_table();
            let conv = decoded.coordinate_converter();

            let mut selected = Vec::new();
            for group in decoded.groups() {
                let classic = block::classic_nodes(group, conv, &strings);
                let dense = block::dense_nodes(group, conv, &strings).into_iter();
                for node in classic.chain(dense) {
                    if boxes.iter().flatten().any(|b| b.contains(node.lon, node.lat)) {
                        selected.push(NodeRecord {
                            id: node.id,
                            lon: node.lon,
                            lat: node.lat,
                            tags: node.tags,
                        });
                    }
                }
            }
            Ok(selected)
        },
        |node| nodes.push(node),
    )?;

    Ok(nodes)
}

/// Pass 5: selects every way referencing at least one selected node.
pub fn select_ways_from_nodes(
    file: &mut File,
    node_ids: &NodeIdSet,
) -> Result<Vec<WayRecord>, Error> {
    let mut ways = Vec::new();

    scan(
        file,
        "pass 5 (ways from nodes)",
        |blob| {
            if blob.kind != BlobKind::Data {
                return Ok(Vec::new());
            }
            let data = blob.inflate()?;

            let decoded = Block::parse(&data)?;
            let strings = decoded.string_table();

            let mut selected = Vec::new();
            for group in decoded.groups() {
                for way in block::ways(group, &strings) {
                    if !way.node_ids.is_empty() && way.node_ids.iter().any(|&id| node_ids.contains(id)) {
                        selected.push(WayRecord {
                            id: way.id,
                            node_ids: way.node_ids,
                            tags: way.tags,
                        });
                    }
                }
            }
            Ok(selected)
        },
        |way| ways.push(way),
    )?;

    Ok(ways)
}
