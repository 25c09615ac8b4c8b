use std::num::NonZero;

use thiserror::Error;

use crate::{
    baseline::DEFAULT_BASELINE_OFFSET,
    distance::{DEFAULT_ATTENUATION_FACTOR, DEFAULT_REFERENCE_LEVEL},
    level::{DEFAULT_LEVEL_GAIN, SILENCE_LOUDNESS},
    smoothing::DEFAULT_SMOOTHING_FACTOR,
    SampleRate, DEFAULT_FRAME_SIZE, DEFAULT_SAMPLE_RATE,
};

/// The default amount of frames (and estimates) which may wait for their consumer.
pub const DEFAULT_QUEUE_CAPACITY: NonZero<usize> = NonZero::new(16).unwrap();

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("`{name}` has to be a finite number but it's {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("The smoothing factor has to be within (0, 1] but it's {0}")]
    SmoothingFactor(f64),

    #[error("The attenuation factor has to be greater than 0 but it's {0}")]
    AttenuationFactor(f64),

    #[error(
        "A silent frame would be {exponent} decades away which doesn't fit into a float. \
         Increase the attenuation factor ({attenuation_factor}) or lower the reference level ({reference_level})"
    )]
    SilenceOutOfRange {
        exponent: f64,
        reference_level: f64,
        attenuation_factor: f64,
    },

    #[error("The level gain has to be greater than 0 but it's {0}")]
    LevelGain(f64),

    #[error("The sample rate can't be 0")]
    SampleRate,
}

/// Every tunable constant of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Amount of samples per channel of each frame.
    pub frame_size: NonZero<usize>,

    pub sample_rate: SampleRate,

    /// How much louder than the baseline a frame has to be to lock on.
    pub baseline_offset: f64,

    /// The weight of the newest angle in the moving average. Within `(0, 1]`.
    pub smoothing_factor: f64,

    /// Loudness at the reference distance of one meter.
    pub reference_level: f64,

    pub attenuation_factor: f64,

    /// Scales `log10(rms)` into the loudness unit.
    pub level_gain: f64,

    /// Capacity of the frame queue and of the estimate queue.
    pub queue_capacity: NonZero<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
            baseline_offset: DEFAULT_BASELINE_OFFSET,
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            reference_level: DEFAULT_REFERENCE_LEVEL,
            attenuation_factor: DEFAULT_ATTENUATION_FACTOR,
            level_gain: DEFAULT_LEVEL_GAIN,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("baseline_offset", self.baseline_offset),
            ("smoothing_factor", self.smoothing_factor),
            ("reference_level", self.reference_level),
            ("attenuation_factor", self.attenuation_factor),
            ("level_gain", self.level_gain),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }

        if self.smoothing_factor <= 0. || self.smoothing_factor > 1. {
            return Err(ConfigError::SmoothingFactor(self.smoothing_factor));
        }

        if self.attenuation_factor <= 0. {
            return Err(ConfigError::AttenuationFactor(self.attenuation_factor));
        }

        // silence is the lowest loudness, so it's the largest distance
        let exponent = self.silence_exponent();
        if exponent > f64::from(f64::MAX_10_EXP) {
            return Err(ConfigError::SilenceOutOfRange {
                exponent,
                reference_level: self.reference_level,
                attenuation_factor: self.attenuation_factor,
            });
        }

        if self.level_gain <= 0. {
            return Err(ConfigError::LevelGain(self.level_gain));
        }

        if self.sample_rate == 0 {
            return Err(ConfigError::SampleRate);
        }

        Ok(())
    }

    /// The exponent of the distance of a silent frame.
    fn silence_exponent(&self) -> f64 {
        (self.reference_level - SILENCE_LOUDNESS) / (2. * self.attenuation_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.frame_size.get(), 1024);
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.baseline_offset, 5.0);
        assert_eq!(config.smoothing_factor, 0.2);
        assert_eq!(config.reference_level, 1.0);
        assert_eq!(config.attenuation_factor, 100.0);
        assert_eq!(config.level_gain, 100.0);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_smoothing_factor() {
        for factor in [0., -0.1, 1.5] {
            let config = PipelineConfig {
                smoothing_factor: factor,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::SmoothingFactor(factor)));
        }

        let config = PipelineConfig {
            smoothing_factor: 1.,
            ..Default::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_non_finite_values() {
        let config = PipelineConfig {
            reference_level: f64::INFINITY,
            ..Default::default()
        };

        assert_eq!(
            config.validate(),
            Err(ConfigError::NotFinite {
                name: "reference_level",
                value: f64::INFINITY
            })
        );
    }

    #[test]
    fn rejects_non_positive_attenuation() {
        let config = PipelineConfig {
            attenuation_factor: 0.,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::AttenuationFactor(0.)));
    }

    #[test]
    fn rejects_attenuation_which_overflows_on_silence() {
        let config = PipelineConfig {
            attenuation_factor: 1.,
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::SilenceOutOfRange { .. })
        ));
    }

    #[test]
    fn smallest_attenuation_keeps_silence_finite() {
        let boundary = (DEFAULT_REFERENCE_LEVEL - SILENCE_LOUDNESS) / (2. * 308.);

        let rejected = PipelineConfig {
            attenuation_factor: boundary * 0.99,
            ..Default::default()
        };
        assert!(rejected.validate().is_err());

        let config = PipelineConfig {
            attenuation_factor: boundary * (1. + 1e-12),
            ..Default::default()
        };
        assert_eq!(config.validate(), Ok(()));

        let mut state = crate::StreamState::new(&config);
        let silence = crate::fetcher::AudioFrame::mono(&[0.; 1024], 44_100);
        for _ in 0..3 {
            let estimate = state.process_frame(&silence);
            assert_eq!(estimate.loudness, SILENCE_LOUDNESS);
            assert!(estimate.distance_meters.is_finite(), "{}", estimate.distance_meters);
        }
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let config = PipelineConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::SampleRate));
    }
}
