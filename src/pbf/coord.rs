// (c) Copyright 2026 golf-extract contributors
// SPDX-License-Identifier: MIT

//! Conversion between a primitive block's raw integer coordinates and
//! decimal degrees.

/// Converts between raw (granularity/offset-scaled) coordinates and decimal
/// degrees for a single primitive block.
///
/// Readers must honor whatever `granularity`/`lonOffset`/`latOffset` the
/// block declares; this tool's own writer always emits `granularity = 100`
/// and zero offsets (see [`crate::pbf::writer`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateConverter {
    pub granularity: i64,
    pub lon_offset: i64,
    pub lat_offset: i64,
}

impl Default for CoordinateConverter {
    fn default() -> Self {
        Self {
            granularity: 100,
            lon_offset: 0,
            lat_offset: 0,
        }
    }
}

impl CoordinateConverter {
    pub fn to_lon(&self, raw: i64) -> f64 {
        1e-9 * (self.lon_offset + self.granularity * raw) as f64
    }

    pub fn to_lat(&self, raw: i64) -> f64 {
        1e-9 * (self.lat_offset + self.granularity * raw) as f64
    }
}

/// Inverse of [`CoordinateConverter::to_lon`]/[`to_lat`](CoordinateConverter::to_lat),
/// assuming the writer's fixed `granularity = 100`, zero offsets.
pub fn degrees_to_raw(deg: f64) -> i64 {
    ((deg * 1e9) as i64) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roundtrip_within_tolerance() {
        let conv = CoordinateConverter::default();
        for deg in [0.0_f64, 1.0, -1.0, 51.5074, -122.4194, 179.999_999_9] {
            let raw = degrees_to_raw(deg);
            let back = conv.to_lon(raw);
            assert!((back - deg).abs() < 1e-7, "{deg} -> {raw} -> {back}");
        }
    }

    #[test]
    fn honors_nonzero_offset_and_granularity() {
        let conv = CoordinateConverter {
            granularity: 1000,
            lon_offset: 5_000_000_000,
            lat_offset: -2_000_000_000,
        };
        assert_eq!(conv.to_lon(0), 5.0);
        assert_eq!(conv.to_lat(0), -2.0);
        assert_eq!(conv.to_lon(1), 5.000_001);
    }
}
