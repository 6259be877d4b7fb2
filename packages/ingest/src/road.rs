//! Road adjacency signal for the classifier.
//!
//! No road network is joined in yet, so the default oracle flips a biased
//! coin per building. A real implementation (e.g. a spatial index over road
//! segments) can be dropped in without touching the classifier.

use building_map_building_models::Footprint;
use rand::{Rng as _, RngCore};

/// Decides whether a building counts as road-adjacent.
pub trait RoadProximityOracle: Send + Sync {
    /// Returns `true` if the footprint is considered near a road.
    fn is_near_road(&self, footprint: &Footprint, rng: &mut dyn RngCore) -> bool;
}

/// Placeholder oracle: each building is near a road with a fixed
/// probability, independent of its geometry.
#[derive(Debug, Clone, Copy)]
pub struct RandomRoadProximity {
    probability: f64,
}

impl RandomRoadProximity {
    /// Probability used by the ingestion pipeline.
    pub const DEFAULT_PROBABILITY: f64 = 0.5;

    /// Creates an oracle with the given probability, clamped to `[0, 1]`.
    /// A NaN probability is treated as zero.
    #[must_use]
    pub fn new(probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self { probability }
    }

    /// The probability of a building being reported near a road.
    #[must_use]
    pub const fn probability(&self) -> f64 {
        self.probability
    }
}

impl Default for RandomRoadProximity {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROBABILITY)
    }
}

impl RoadProximityOracle for RandomRoadProximity {
    fn is_near_road(&self, _footprint: &Footprint, rng: &mut dyn RngCore) -> bool {
        rng.gen_bool(self.probability)
    }
}

/// Oracle that always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoadProximity(pub bool);

impl RoadProximityOracle for FixedRoadProximity {
    fn is_near_road(&self, _footprint: &Footprint, _rng: &mut dyn RngCore) -> bool {
        self.0
    }
}
