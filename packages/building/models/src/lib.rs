#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Building footprint record types and the building type taxonomy.
//!
//! Every ingestion path (CSV of WKT polygons, `GeoJSON` fallback) produces
//! [`BuildingRecord`] values. Records are created once per valid input row
//! and never mutated afterwards; filtering and search build derived views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Use classification assigned to a building footprint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BuildingType {
    /// Dwellings and small compounds
    Residential,
    /// Shops, offices, and roadside trade
    Commercial,
    /// Warehouses, factories, and large irregular sheds
    Industrial,
    /// Schools, hospitals, mosques, government buildings
    Institutional,
    /// Mid-sized buildings with no dominant use
    Mixed,
}

impl BuildingType {
    /// Estimated value per square meter, in local currency units.
    #[must_use]
    pub const fn value_rate(self) -> f64 {
        match self {
            Self::Residential => 500.0,
            Self::Commercial => 1200.0,
            Self::Industrial => 600.0,
            Self::Institutional => 800.0,
            Self::Mixed => 700.0,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Residential,
            Self::Commercial,
            Self::Industrial,
            Self::Institutional,
            Self::Mixed,
        ]
    }
}

/// A single WGS84 position, serialized as a `[longitude, latitude]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LonLat {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl LonLat {
    /// Creates a position from a longitude and latitude.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for LonLat {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<LonLat> for [f64; 2] {
    fn from(value: LonLat) -> Self {
        [value.lon, value.lat]
    }
}

/// Axis-aligned sanity box that every accepted coordinate must fall in.
///
/// Bounds are inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western edge (degrees longitude).
    pub min_lon: f64,
    /// Eastern edge (degrees longitude).
    pub max_lon: f64,
    /// Southern edge (degrees latitude).
    pub min_lat: f64,
    /// Northern edge (degrees latitude).
    pub max_lat: f64,
}

impl BoundingBox {
    /// A box covering every valid WGS84 coordinate.
    pub const WORLD: Self = Self {
        min_lon: -180.0,
        max_lon: 180.0,
        min_lat: -90.0,
        max_lat: 90.0,
    };

    /// Returns `true` if the position lies inside the box.
    #[must_use]
    pub fn contains(&self, point: LonLat) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.lon)
            && (self.min_lat..=self.max_lat).contains(&point.lat)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::WORLD
    }
}

/// Polygon footprint of a building.
///
/// Holds a non-empty list of closed rings. Only the outer ring is ever
/// populated by the ingestion paths; holes are unsupported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Polygon")]
pub struct Footprint {
    /// Closed rings, outer boundary first.
    #[serde(rename = "coordinates")]
    pub rings: Vec<Vec<LonLat>>,
}

impl Footprint {
    /// Minimum number of positions in a closed ring (three distinct
    /// vertices plus the closing point).
    pub const MIN_RING_POSITIONS: usize = 4;

    /// Creates a footprint from a single outer ring.
    #[must_use]
    pub fn from_exterior(ring: Vec<LonLat>) -> Self {
        Self { rings: vec![ring] }
    }

    /// The outer boundary ring, or an empty slice for an empty footprint.
    #[must_use]
    pub fn exterior(&self) -> &[LonLat] {
        self.rings.first().map_or(&[], Vec::as_slice)
    }

    /// Number of vertices in the outer ring, not counting the closing
    /// point.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.exterior().len().saturating_sub(1)
    }

    /// Returns `true` if every ring is closed and long enough, and there
    /// is at least one ring.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.rings.is_empty()
            && self
                .rings
                .iter()
                .all(|ring| ring.len() >= Self::MIN_RING_POSITIONS && is_closed(ring))
    }
}

/// Returns `true` if the ring's first and last positions are identical.
#[must_use]
pub fn is_closed(ring: &[LonLat]) -> bool {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) => first == last,
        _ => false,
    }
}

/// A detected building footprint with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingRecord {
    /// Identifier unique within one load, e.g. `"gombe_42"`.
    pub id: String,
    /// Source row index (1-based), used by map widgets for feature state.
    pub numeric_id: u64,
    /// Building outline.
    pub footprint: Footprint,
    /// Footprint area in square meters, rounded to whole meters.
    pub area_in_meters: f64,
    /// Assigned use classification.
    pub classification: BuildingType,
    /// Detection confidence in `[0, 100]`.
    pub confidence: f64,
    /// Estimated value in local currency units.
    pub estimated_value: f64,
    /// Whether the building was considered road-adjacent when classified.
    pub near_road: bool,
    /// When the record was ingested.
    pub detected_at: DateTime<Utc>,
    /// Centroid latitude reported by the source, if any.
    pub latitude: Option<f64>,
    /// Centroid longitude reported by the source, if any.
    pub longitude: Option<f64>,
    /// Open Location Code reported by the source, if any.
    pub full_plus_code: Option<String>,
}

impl BuildingRecord {
    /// Position used to center list views on the building: the first
    /// vertex of the outer ring.
    #[must_use]
    pub fn center(&self) -> Option<LonLat> {
        self.footprint.exterior().first().copied()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    fn square() -> Vec<LonLat> {
        vec![
            LonLat::new(11.1, 10.2),
            LonLat::new(11.2, 10.2),
            LonLat::new(11.2, 10.3),
            LonLat::new(11.1, 10.3),
            LonLat::new(11.1, 10.2),
        ]
    }

    #[test]
    fn building_type_round_trips_lowercase_names() {
        for ty in BuildingType::all() {
            let name = ty.to_string();
            assert_eq!(name, name.to_lowercase());
            assert_eq!(BuildingType::from_str(&name).unwrap(), *ty);
        }
    }

    #[test]
    fn building_type_serializes_lowercase() {
        let json = serde_json::to_string(&BuildingType::Institutional).unwrap();
        assert_eq!(json, "\"institutional\"");
    }

    #[test]
    fn value_rates_match_table() {
        assert!((BuildingType::Residential.value_rate() - 500.0).abs() < f64::EPSILON);
        assert!((BuildingType::Commercial.value_rate() - 1200.0).abs() < f64::EPSILON);
        assert!((BuildingType::Industrial.value_rate() - 600.0).abs() < f64::EPSILON);
        assert!((BuildingType::Institutional.value_rate() - 800.0).abs() < f64::EPSILON);
        assert!((BuildingType::Mixed.value_rate() - 700.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bounding_box_is_inclusive() {
        let bbox = BoundingBox {
            min_lon: 10.0,
            max_lon: 13.0,
            min_lat: 9.0,
            max_lat: 12.0,
        };
        assert!(bbox.contains(LonLat::new(10.0, 9.0)));
        assert!(bbox.contains(LonLat::new(13.0, 12.0)));
        assert!(!bbox.contains(LonLat::new(15.0, 10.2)));
        assert!(!bbox.contains(LonLat::new(11.0, 8.99)));
    }

    #[test]
    fn footprint_checks_closure_and_length() {
        let footprint = Footprint::from_exterior(square());
        assert!(footprint.is_well_formed());
        assert_eq!(footprint.vertex_count(), 4);

        let mut open = square();
        open.pop();
        assert!(!Footprint::from_exterior(open).is_well_formed());

        let short = vec![LonLat::new(11.1, 10.2), LonLat::new(11.2, 10.2), LonLat::new(11.1, 10.2)];
        assert!(!Footprint::from_exterior(short).is_well_formed());

        assert!(!Footprint { rings: vec![] }.is_well_formed());
    }

    #[test]
    fn footprint_serializes_as_geojson_polygon() {
        let footprint = Footprint::from_exterior(square());
        let value = serde_json::to_value(&footprint).unwrap();
        assert_eq!(value["type"], "Polygon");
        assert_eq!(value["coordinates"][0][0][0], 11.1);
        assert_eq!(value["coordinates"][0][0][1], 10.2);

        let back: Footprint = serde_json::from_value(value).unwrap();
        assert_eq!(back, footprint);
    }
}
