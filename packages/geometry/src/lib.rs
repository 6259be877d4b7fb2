#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Footprint geometry for the building ingestion pipeline.
//!
//! [`wkt`] turns (possibly corrupted) WKT polygon strings into validated
//! [`Footprint`]s and [`regularity`] scores how regular an outline is.

pub mod regularity;
pub mod wkt;

use building_map_building_models::{Footprint, LonLat};
use geo::{LineString, Polygon};

pub use regularity::{CompactnessEstimator, RegularityEstimator, VertexBandEstimator};
pub use wkt::{ParseFailure, WktParser, parse_polygon};

/// Converts a footprint's outer ring into a [`geo::Polygon`].
///
/// Holes are never carried over.
#[must_use]
pub fn to_geo_polygon(footprint: &Footprint) -> Polygon<f64> {
    exterior_polygon(footprint.exterior())
}

fn exterior_polygon(ring: &[LonLat]) -> Polygon<f64> {
    let exterior: LineString<f64> = ring.iter().map(|p| (p.lon, p.lat)).collect();
    Polygon::new(exterior, vec![])
}
