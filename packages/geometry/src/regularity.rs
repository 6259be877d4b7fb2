//! Shape regularity heuristics.
//!
//! A regularity score in `[0, 1]` is only a tie-breaking signal for the
//! classifier. The default [`VertexBandEstimator`] is a coarse vertex-count
//! banding with random jitter; [`CompactnessEstimator`] computes the
//! isoperimetric ratio instead, but the classifier's thresholds are tuned for
//! the banded scale.

use building_map_building_models::{Footprint, LonLat};
use geo::{Area as _, Euclidean, Length as _};
use rand::{Rng as _, RngCore};

/// Scores how regular a footprint outline is.
pub trait RegularityEstimator: Send + Sync {
    /// Returns a score in `[0, 1]` for a closed ring, where higher is more
    /// regular.
    fn estimate(&self, ring: &[LonLat], rng: &mut dyn RngCore) -> f64;

    /// Short identifier used in log output.
    fn name(&self) -> &'static str;
}

/// Bands rings by vertex count: simple outlines (at most
/// [`Self::SIMPLE_MAX_VERTICES`] vertices) draw from `[0.8, 1.0)`, busier
/// ones from `[0.5, 0.8)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexBandEstimator;

impl VertexBandEstimator {
    /// Largest vertex count (closing point excluded) treated as a simple
    /// rectangular outline.
    pub const SIMPLE_MAX_VERTICES: usize = 6;

    /// Score for rings too short to be a polygon.
    pub const DEGENERATE_SCORE: f64 = 0.5;
}

impl RegularityEstimator for VertexBandEstimator {
    fn estimate(&self, ring: &[LonLat], rng: &mut dyn RngCore) -> f64 {
        if ring.len() < Footprint::MIN_RING_POSITIONS {
            return Self::DEGENERATE_SCORE;
        }

        let vertices = ring.len() - 1;
        let jitter: f64 = rng.r#gen();

        if vertices <= Self::SIMPLE_MAX_VERTICES {
            jitter.mul_add(0.2, 0.8)
        } else {
            jitter.mul_add(0.3, 0.5)
        }
    }

    fn name(&self) -> &'static str {
        "vertex-bands"
    }
}

/// Isoperimetric compactness, `4 * pi * area / perimeter^2`.
///
/// A circle scores 1.0 and a square about 0.785. Computed in planar
/// degrees, which is close enough at building scale since the ratio is
/// unitless.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactnessEstimator;

impl RegularityEstimator for CompactnessEstimator {
    fn estimate(&self, ring: &[LonLat], _rng: &mut dyn RngCore) -> f64 {
        if ring.len() < Footprint::MIN_RING_POSITIONS {
            return 0.0;
        }

        let polygon = crate::exterior_polygon(ring);
        let perimeter = Euclidean.length(polygon.exterior());
        if perimeter <= 0.0 {
            return 0.0;
        }

        let area = polygon.unsigned_area();
        (4.0 * std::f64::consts::PI * area / (perimeter * perimeter)).clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "compactness"
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    use super::*;

    fn rectangle() -> Vec<LonLat> {
        vec![
            LonLat::new(11.1, 10.2),
            LonLat::new(11.2, 10.2),
            LonLat::new(11.2, 10.3),
            LonLat::new(11.1, 10.3),
            LonLat::new(11.1, 10.2),
        ]
    }

    fn octagon() -> Vec<LonLat> {
        let mut ring: Vec<LonLat> = (0..8)
            .map(|i| {
                let angle = f64::from(i) * std::f64::consts::FRAC_PI_4;
                LonLat::new(angle.cos().mul_add(0.001, 11.2), angle.sin().mul_add(0.001, 10.3))
            })
            .collect();
        ring.push(ring[0]);
        ring
    }

    #[test]
    fn simple_outlines_score_high() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let score = VertexBandEstimator.estimate(&rectangle(), &mut rng);
            assert!((0.8..=1.0).contains(&score), "score {score} out of band");
        }
    }

    #[test]
    fn busy_outlines_score_lower() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let score = VertexBandEstimator.estimate(&octagon(), &mut rng);
            assert!((0.5..0.8).contains(&score), "score {score} out of band");
        }
    }

    #[test]
    fn six_vertices_is_still_simple() {
        let ring = vec![
            LonLat::new(11.10, 10.20),
            LonLat::new(11.20, 10.20),
            LonLat::new(11.20, 10.25),
            LonLat::new(11.15, 10.25),
            LonLat::new(11.15, 10.30),
            LonLat::new(11.10, 10.30),
            LonLat::new(11.10, 10.20),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(VertexBandEstimator.estimate(&ring, &mut rng) >= 0.8);
    }

    #[test]
    fn short_rings_get_degenerate_score() {
        let mut rng = StdRng::seed_from_u64(1);
        let ring = vec![LonLat::new(11.1, 10.2), LonLat::new(11.1, 10.2)];
        let score = VertexBandEstimator.estimate(&ring, &mut rng);
        assert!((score - VertexBandEstimator::DEGENERATE_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn same_seed_same_score() {
        let a = VertexBandEstimator.estimate(&rectangle(), &mut StdRng::seed_from_u64(42));
        let b = VertexBandEstimator.estimate(&rectangle(), &mut StdRng::seed_from_u64(42));
        assert!((a - b).abs() < f64::EPSILON);
    }

    #[test]
    fn compactness_of_square_is_pi_over_four() {
        let mut rng = StdRng::seed_from_u64(0);
        let score = CompactnessEstimator.estimate(&rectangle(), &mut rng);
        assert!((score - std::f64::consts::FRAC_PI_4).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn compactness_prefers_rounder_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let square = CompactnessEstimator.estimate(&rectangle(), &mut rng);
        let octagon = CompactnessEstimator.estimate(&octagon(), &mut rng);
        assert!(octagon > square);
        assert!(octagon <= 1.0);
    }

    #[test]
    fn compactness_of_sliver_is_low() {
        let sliver = vec![
            LonLat::new(11.0, 10.0),
            LonLat::new(12.0, 10.0),
            LonLat::new(12.0, 10.0001),
            LonLat::new(11.0, 10.0001),
            LonLat::new(11.0, 10.0),
        ];
        let mut rng = StdRng::seed_from_u64(0);
        assert!(CompactnessEstimator.estimate(&sliver, &mut rng) < 0.01);
    }
}
