#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rule-based building use classification.
//!
//! Buckets a footprint into a [`BuildingType`] from its area, road
//! adjacency, and shape regularity using a fixed decision table, then
//! draws a confidence score from the rule's band and estimates a value
//! from the type's per-square-meter rate.
//!
//! The confidence draw simulates sensor noise and is not a model score.
//! Randomness is always supplied by the caller so runs can be seeded.

use building_map_building_models::BuildingType;
use rand::{Rng as _, RngCore};
use serde::{Deserialize, Serialize};

/// Road adjacency assumed when the caller has no signal.
pub const DEFAULT_NEAR_ROAD: bool = false;

/// Regularity assumed when the caller has no signal.
pub const DEFAULT_REGULARITY: f64 = 0.7;

/// Area thresholds (square meters) separating the size classes. Each
/// threshold is the inclusive lower bound of the next class.
pub mod thresholds {
    /// Lower bound of the small class.
    pub const SMALL: f64 = 100.0;
    /// Lower bound of the medium class.
    pub const MEDIUM: f64 = 300.0;
    /// Lower bound of the large class.
    pub const LARGE: f64 = 500.0;
    /// Lower bound of the very large class.
    pub const VERY_LARGE: f64 = 1000.0;
}

/// Inclusive-exclusive range a confidence score is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    /// Lowest possible draw.
    pub low: f64,
    /// Upper end of the band.
    pub high: f64,
}

impl ConfidenceBand {
    const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Draws a score uniformly from the band, rounded to one decimal and
    /// clamped to `[0, 100]`.
    pub fn draw(&self, rng: &mut dyn RngCore) -> f64 {
        let unit: f64 = rng.r#gen();
        let raw = unit.mul_add(self.high - self.low, self.low);
        ((raw * 10.0).round() / 10.0).clamp(0.0, 100.0)
    }
}

/// The decision-table row matched by an input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Assigned building type.
    pub building_type: BuildingType,
    /// Band the confidence is drawn from.
    pub confidence: ConfidenceBand,
}

/// Output of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Assigned building type.
    #[serde(rename = "type")]
    pub building_type: BuildingType,
    /// Confidence in `[0, 100]`, one decimal place.
    pub confidence: f64,
    /// `round(area * rate)`, never negative.
    pub estimated_value: f64,
}

/// Finds the decision-table row for an input. Fully deterministic.
#[must_use]
pub fn rule_for(area: f64, near_road: bool, regularity: f64) -> Rule {
    use BuildingType::{Commercial, Industrial, Institutional, Mixed, Residential};
    use thresholds::{LARGE, MEDIUM, SMALL, VERY_LARGE};

    let (building_type, low, high) = if area < SMALL {
        (Residential, 85.0, 95.0)
    } else if area < MEDIUM {
        if near_road && regularity > 0.6 {
            (Commercial, 75.0, 85.0)
        } else {
            (Residential, 80.0, 90.0)
        }
    } else if area < LARGE {
        if near_road {
            (Commercial, 78.0, 88.0)
        } else {
            (Residential, 75.0, 85.0)
        }
    } else if area < VERY_LARGE {
        if near_road && regularity > 0.7 {
            (Commercial, 82.0, 90.0)
        } else if regularity > 0.8 {
            (Institutional, 80.0, 90.0)
        } else {
            (Mixed, 65.0, 80.0)
        }
    } else if regularity < 0.6 {
        (Industrial, 85.0, 95.0)
    } else if regularity > 0.8 {
        (Institutional, 82.0, 92.0)
    } else {
        (Industrial, 80.0, 90.0)
    };

    Rule {
        building_type,
        confidence: ConfidenceBand::new(low, high),
    }
}

/// Estimated value of a building: `round(area * rate)`, floored at zero.
#[must_use]
pub fn estimate_value(area: f64, building_type: BuildingType) -> f64 {
    (area * building_type.value_rate()).round().max(0.0)
}

/// Classifies a building and estimates its value.
///
/// The type and value are deterministic in the inputs; only the
/// confidence draw consumes randomness from `rng`.
pub fn classify(
    area: f64,
    near_road: bool,
    regularity: f64,
    rng: &mut dyn RngCore,
) -> Classification {
    let rule = rule_for(area, near_road, regularity);

    Classification {
        building_type: rule.building_type,
        confidence: rule.confidence.draw(rng),
        estimated_value: estimate_value(area, rule.building_type),
    }
}
