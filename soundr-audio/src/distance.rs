/// Loudness which is expected at the reference distance (one meter).
pub const DEFAULT_REFERENCE_LEVEL: f64 = 1.;

/// How strong the loudness drops with the distance.
pub const DEFAULT_ATTENUATION_FACTOR: f64 = 100.;

/// Guesses how far away the sound source is from its loudness.
///
/// Inverse log-distance path loss:
/// `distance = 10 ^ ((reference_level - loudness) / (2 * attenuation_factor))`.
/// Louder means closer. It's a rough heuristic, not a calibrated acoustic model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEstimator {
    pub reference_level: f64,
    pub attenuation_factor: f64,
}

impl DistanceEstimator {
    pub fn new(reference_level: f64, attenuation_factor: f64) -> Self {
        Self {
            reference_level,
            attenuation_factor,
        }
    }

    /// The estimated distance in meters.
    pub fn estimate(&self, loudness: f64) -> f64 {
        let exponent = (self.reference_level - loudness) / (2. * self.attenuation_factor);
        10f64.powf(exponent)
    }
}

impl Default for DistanceEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_LEVEL, DEFAULT_ATTENUATION_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::SILENCE_LOUDNESS;

    #[test]
    fn reference_level_is_one_meter() {
        let estimator = DistanceEstimator::default();
        assert_eq!(estimator.estimate(DEFAULT_REFERENCE_LEVEL), 1.);
    }

    #[test]
    fn loud_source() {
        let distance = DistanceEstimator::default().estimate(100.);
        // 10 ^ (-99 / 200)
        assert!((distance - 0.319_889).abs() < 1e-6, "{}", distance);
    }

    #[test]
    fn strictly_decreasing() {
        let estimator = DistanceEstimator::default();

        let mut prev = f64::INFINITY;
        let mut loudness = -300.;
        while loudness <= 300. {
            let distance = estimator.estimate(loudness);
            assert!(distance < prev);
            prev = distance;
            loudness += 0.5;
        }
    }

    #[test]
    fn silence_is_far_but_finite() {
        let distance = DistanceEstimator::default().estimate(SILENCE_LOUDNESS);

        assert!(distance.is_finite());
        assert!(distance > 1e40);
    }

    #[test]
    fn never_negative() {
        let estimator = DistanceEstimator::new(-20., 3.);
        for loudness in [-1e4, -1., 0., 1., 1e4] {
            assert!(estimator.estimate(loudness) >= 0.);
        }
    }
}
