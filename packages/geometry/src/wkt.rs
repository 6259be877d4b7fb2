//! WKT `POLYGON` parsing for building footprints.
//!
//! The upstream building exports occasionally break numeric tokens across
//! lines (`11.1731` + newline + `298`), so every line break is removed from
//! the input before any tokenizing happens.

use std::sync::LazyLock;

use building_map_building_models::{BoundingBox, Footprint, LonLat};
use regex::Regex;

/// Captures everything between the outermost `POLYGON((` and `))`.
static POLYGON_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"POLYGON\s*\(\((.*)\)\)").expect("polygon pattern is valid")
});

/// Separator between rings inside a polygon body: `),(` with optional
/// whitespace.
static RING_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\)\s*,\s*\(").expect("ring separator pattern is valid"));

/// Why a WKT string could not be turned into a footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ParseFailure {
    /// The input does not contain a `POLYGON((...))` body.
    #[error("input does not match POLYGON((...))")]
    NoMatch,
    /// No valid coordinate survived in the outer ring.
    #[error("outer ring has no valid coordinates")]
    EmptyRing,
    /// The outer ring has fewer than three distinct vertices plus the
    /// closing point.
    #[error("outer ring has too few points")]
    TooFewPoints,
}

impl ParseFailure {
    /// Short machine-readable reason, e.g. `"too-few-points"`.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::NoMatch => "no-match",
            Self::EmptyRing => "empty-ring",
            Self::TooFewPoints => "too-few-points",
        }
    }
}

/// Parses WKT polygons, rejecting coordinates outside a sanity box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WktParser {
    bounds: BoundingBox,
}

impl WktParser {
    /// Creates a parser that accepts only coordinates inside `bounds`.
    #[must_use]
    pub const fn new(bounds: BoundingBox) -> Self {
        Self { bounds }
    }

    /// The sanity box applied to every coordinate.
    #[must_use]
    pub const fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Parses a WKT `POLYGON((lon lat, ...))` string into a closed
    /// single-ring footprint.
    ///
    /// Malformed or out-of-bounds coordinate pairs are dropped individually
    /// and the ring continues from the remaining points. An unclosed ring is
    /// closed by repeating its first point. Only the outer ring is kept;
    /// any holes are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ParseFailure`] if no polygon body is found, or if the outer
    /// ring ends up empty or too short after validation.
    pub fn parse_polygon(&self, raw: &str) -> Result<Footprint, ParseFailure> {
        let cleaned: String = raw.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        let cleaned = cleaned.trim();

        let body = POLYGON_BODY
            .captures(cleaned)
            .and_then(|caps| caps.get(1))
            .ok_or(ParseFailure::NoMatch)?
            .as_str();

        let mut rings = RING_SEPARATOR.split(body);
        let outer = rings.next().ok_or(ParseFailure::NoMatch)?;

        let holes = rings.count();
        if holes > 0 {
            log::debug!("Discarding {holes} inner ring(s); holes are unsupported");
        }

        let mut ring: Vec<LonLat> = outer
            .split(',')
            .filter_map(|pair| self.parse_position(pair))
            .collect();

        let Some(&first) = ring.first() else {
            return Err(ParseFailure::EmptyRing);
        };
        if ring.last() != Some(&first) {
            ring.push(first);
        }

        if ring.len() < Footprint::MIN_RING_POSITIONS || distinct_vertices(&ring) < 3 {
            return Err(ParseFailure::TooFewPoints);
        }

        Ok(Footprint::from_exterior(ring))
    }

    /// Parses one `lon lat` token, returning `None` if it is malformed,
    /// non-finite, or outside the sanity box.
    fn parse_position(&self, pair: &str) -> Option<LonLat> {
        let parts: Vec<&str> = pair.split_whitespace().collect();
        let [lon, lat] = parts.as_slice() else {
            log::debug!("Invalid coordinate pair: {:?} -> {parts:?}", pair.trim());
            return None;
        };

        let (Ok(lon), Ok(lat)) = (lon.parse::<f64>(), lat.parse::<f64>()) else {
            log::debug!("Invalid coordinate values: lon={lon}, lat={lat}");
            return None;
        };
        if !lon.is_finite() || !lat.is_finite() {
            log::debug!("Non-finite coordinate: [{lon}, {lat}]");
            return None;
        }

        let position = LonLat::new(lon, lat);
        if !self.bounds.contains(position) {
            log::debug!("Coordinate out of expected range: [{lon}, {lat}]");
            return None;
        }

        Some(position)
    }
}

/// Number of distinct vertices in a closed ring, ignoring the closing
/// point.
fn distinct_vertices(ring: &[LonLat]) -> usize {
    let mut vertices: Vec<LonLat> = ring[..ring.len().saturating_sub(1)].to_vec();
    vertices.sort_by(|a, b| a.lon.total_cmp(&b.lon).then(a.lat.total_cmp(&b.lat)));
    vertices.dedup();
    vertices.len()
}

/// Parses a WKT polygon with the given sanity box.
///
/// Shorthand for [`WktParser::new`] followed by
/// [`WktParser::parse_polygon`].
///
/// # Errors
///
/// See [`WktParser::parse_polygon`].
pub fn parse_polygon(raw: &str, bounds: BoundingBox) -> Result<Footprint, ParseFailure> {
    WktParser::new(bounds).parse_polygon(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOMBE: BoundingBox = BoundingBox {
        min_lon: 10.0,
        max_lon: 13.0,
        min_lat: 9.0,
        max_lat: 12.0,
    };

    const SQUARE: &str = "POLYGON((11.1 10.2, 11.2 10.2, 11.2 10.3, 11.1 10.3, 11.1 10.2))";

    #[test]
    fn parses_closed_square() {
        let footprint = parse_polygon(SQUARE, GOMBE).unwrap();
        assert_eq!(footprint.rings.len(), 1);

        let ring = footprint.exterior();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], LonLat::new(11.1, 10.2));
        assert_eq!(ring[2], LonLat::new(11.2, 10.3));
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn newlines_inside_numbers_are_removed_before_tokenizing() {
        let broken = "POLYGON((11.1731\n298 10.2, 11.2 10.2\r\n, 11.2 10.\n3, 11.1 10.3, 11.1731298 10.2))";
        let clean = "POLYGON((11.1731298 10.2, 11.2 10.2, 11.2 10.3, 11.1 10.3, 11.1731298 10.2))";
        assert_eq!(
            parse_polygon(broken, GOMBE).unwrap(),
            parse_polygon(clean, GOMBE).unwrap()
        );
    }

    #[test]
    fn closes_unclosed_ring() {
        let footprint =
            parse_polygon("POLYGON((11.1 10.2, 11.2 10.2, 11.2 10.3))", GOMBE).unwrap();
        let ring = footprint.exterior();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[3], ring[0]);
    }

    #[test]
    fn drops_out_of_range_point_and_keeps_rest() {
        let wkt = "POLYGON((11.1 10.2, 15.0 10.2, 11.2 10.2, 11.2 10.3, 11.1 10.3, 11.1 10.2))";
        let footprint = parse_polygon(wkt, GOMBE).unwrap();
        assert_eq!(footprint.exterior().len(), 5);
        assert!(
            footprint
                .exterior()
                .iter()
                .all(|p| (10.0..=13.0).contains(&p.lon))
        );
    }

    #[test]
    fn out_of_range_point_can_leave_too_few_points() {
        let wkt = "POLYGON((11.1 10.2, 15.0 10.2, 11.2 10.3, 11.1 10.2))";
        assert_eq!(parse_polygon(wkt, GOMBE), Err(ParseFailure::TooFewPoints));
    }

    #[test]
    fn drops_malformed_tokens() {
        let wkt = "POLYGON((11.1 10.2, 11.2, 11.2 10.2 7, abc 10.3, 11.2 10.3, 11.1 10.3, 11.1 10.2))";
        let footprint = parse_polygon(wkt, GOMBE).unwrap();
        assert_eq!(footprint.exterior().len(), 4);
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let wkt = "POLYGON((11.1 10.2, NaN 10.2, inf 10.3, 11.2 10.3))";
        assert_eq!(parse_polygon(wkt, GOMBE), Err(ParseFailure::TooFewPoints));
    }

    #[test]
    fn keeps_only_outer_ring() {
        let wkt = "POLYGON((11.1 10.2, 11.2 10.2, 11.2 10.3, 11.1 10.3, 11.1 10.2), \
                   (11.12 10.22, 11.14 10.22, 11.14 10.24, 11.12 10.22))";
        let footprint = parse_polygon(wkt, GOMBE).unwrap();
        assert_eq!(footprint.rings.len(), 1);
        assert_eq!(footprint.exterior().len(), 5);
        assert_eq!(footprint, parse_polygon(SQUARE, GOMBE).unwrap());
    }

    #[test]
    fn reports_no_match() {
        assert_eq!(
            parse_polygon("POINT(11.1 10.2)", GOMBE),
            Err(ParseFailure::NoMatch)
        );
        assert_eq!(parse_polygon("", GOMBE), Err(ParseFailure::NoMatch));
    }

    #[test]
    fn reports_empty_ring() {
        assert_eq!(
            parse_polygon("POLYGON((20.0 30.0, 21.0 30.0))", GOMBE),
            Err(ParseFailure::EmptyRing)
        );
    }

    #[test]
    fn rejects_degenerate_ring() {
        let wkt = "POLYGON((11.1 10.2, 11.1 10.2, 11.2 10.2, 11.1 10.2))";
        assert_eq!(parse_polygon(wkt, GOMBE), Err(ParseFailure::TooFewPoints));
    }

    #[test]
    fn reason_strings() {
        assert_eq!(ParseFailure::NoMatch.reason(), "no-match");
        assert_eq!(ParseFailure::EmptyRing.reason(), "empty-ring");
        assert_eq!(ParseFailure::TooFewPoints.reason(), "too-few-points");
    }
}
