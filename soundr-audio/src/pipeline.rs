use crate::{
    baseline::BaselineCalibrator, distance::DistanceEstimator, fetcher::AudioFrame, level,
    smoothing::AngleSmoother, PipelineConfig,
};

/// What the pipeline derived from one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Index of the frame within its stream, starting at `0`.
    pub sequence: u64,

    /// The loudness of the frame.
    pub loudness: f64,

    /// `true` if the frame is louder than the calibrated ambient noise (plus offset).
    /// Always `false` for the first frame of a stream since it calibrates the baseline.
    pub is_locking_on: bool,

    /// Smoothed angle in degrees.
    ///
    /// It's derived from the loudness only, so it does **not** point towards the
    /// sound source. Use it to animate an indicator, not as a bearing.
    pub angle_degrees: f64,

    /// Heuristic distance to the sound source.
    pub distance_meters: f64,
}

impl Estimate {
    pub fn angle_radians(&self) -> f64 {
        self.angle_degrees.to_radians()
    }
}

/// All mutable state of one stream.
///
/// A new stream has to start with a new state so nothing leaks from the previous one.
#[derive(Debug, Clone)]
pub struct StreamState {
    calibrator: BaselineCalibrator,
    smoother: AngleSmoother,
    distance: DistanceEstimator,
    level_gain: f64,

    processed: u64,
}

impl StreamState {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            calibrator: BaselineCalibrator::new(config.baseline_offset),
            smoother: AngleSmoother::new(config.smoothing_factor),
            distance: DistanceEstimator::new(config.reference_level, config.attenuation_factor),
            level_gain: config.level_gain,
            processed: 0,
        }
    }

    /// Runs the frame through the whole pipeline.
    pub fn process_frame(&mut self, frame: &AudioFrame) -> Estimate {
        let loudness = level::loudness(frame, self.level_gain);
        self.process_loudness(loudness)
    }

    /// Same as [StreamState::process_frame] but for an already computed loudness.
    pub fn process_loudness(&mut self, loudness: f64) -> Estimate {
        let is_locking_on = self.calibrator.observe(loudness);
        let angle_degrees = self.smoother.update(loudness);
        let distance_meters = self.distance.estimate(loudness);

        let sequence = self.processed;
        self.processed += 1;

        tracing::trace!(
            sequence = sequence,
            loudness = loudness,
            is_locking_on = is_locking_on,
            "Processed frame"
        );

        Estimate {
            sequence,
            loudness,
            is_locking_on,
            angle_degrees,
            distance_meters,
        }
    }

    pub fn calibrator(&self) -> &BaselineCalibrator {
        &self.calibrator
    }

    /// Amount of frames which went through this state.
    pub fn processed(&self) -> u64 {
        self.processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> StreamState {
        StreamState::new(&PipelineConfig::default())
    }

    fn frame(samples: &[f32]) -> AudioFrame {
        AudioFrame::mono(samples, 44_100)
    }

    #[test]
    fn first_frame_never_locks_on() {
        for samples in [[0f32; 4], [1.; 4], [1_000.; 4]] {
            let estimate = state().process_frame(&frame(&samples));
            assert!(!estimate.is_locking_on);
            assert_eq!(estimate.sequence, 0);
        }
    }

    #[test]
    fn end_to_end() {
        let mut state = state();

        let first = state.process_frame(&frame(&[1., 1., 1., 1.]));
        assert_eq!(first.loudness, 0.);
        assert!(!first.is_locking_on);
        assert_eq!(state.calibrator().baseline(), Some(0.));

        let second = state.process_frame(&frame(&[10., 10., 10., 10.]));
        assert!((second.loudness - 100.).abs() < 1e-9);
        assert!(second.is_locking_on);
        assert!((second.distance_meters - 10f64.powf(-99. / 200.)).abs() < 1e-12);
        // 0 * 0.8 + 200 * 0.2
        assert!((second.angle_degrees - 40.).abs() < 1e-9);
        assert_eq!(second.sequence, 1);
    }

    #[test]
    fn locking_on_follows_threshold() {
        let mut state = state();
        state.process_loudness(-30.);

        let sequence = [-30., -25., -24.9, -10., -26., -40., -20.];
        let expected = [false, false, true, true, false, false, true];

        for (&loudness, &expected) in sequence.iter().zip(expected.iter()) {
            let estimate = state.process_loudness(loudness);
            assert_eq!(estimate.is_locking_on, expected, "loudness: {}", loudness);
            assert_eq!(estimate.is_locking_on, loudness > -30. + 5.);
        }
    }

    #[test]
    fn smoothing_runs_while_calibrating() {
        let estimate = state().process_loudness(10.);
        assert!((estimate.angle_degrees - 4.).abs() < 1e-12);
    }

    #[test]
    fn silence_produces_finite_values() {
        let mut state = state();
        for _ in 0..10 {
            let estimate = state.process_frame(&frame(&[0.; 1024]));

            assert!(estimate.loudness.is_finite());
            assert!(estimate.angle_degrees.is_finite());
            assert!(estimate.distance_meters.is_finite());
            assert!(estimate.distance_meters >= 0.);
        }
        assert_eq!(state.processed(), 10);
    }

    #[test]
    fn angle_radians() {
        let estimate = Estimate {
            sequence: 0,
            loudness: 0.,
            is_locking_on: false,
            angle_degrees: 180.,
            distance_meters: 1.,
        };

        assert!((estimate.angle_radians() - std::f64::consts::PI).abs() < 1e-12);
    }
}
