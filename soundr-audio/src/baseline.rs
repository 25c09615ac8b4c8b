/// The default distance between baseline and detection threshold.
pub const DEFAULT_BASELINE_OFFSET: f64 = 5.;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BaselineState {
    Uninitialized,
    Calibrated { baseline: f64 },
}

/// Decides if a loudness value stands out of the ambient noise.
///
/// The very first loudness it sees becomes the ambient reference (the baseline).
/// Every following value "locks on" if it's louder than `baseline + offset`.
///
/// The baseline is never updated afterwards, so it doesn't follow ambient noise
/// which changes during a stream. Start a new calibrator (a new stream) to
/// calibrate again.
#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    state: BaselineState,
    offset: f64,
}

impl BaselineCalibrator {
    pub fn new(offset: f64) -> Self {
        Self {
            state: BaselineState::Uninitialized,
            offset,
        }
    }

    /// Feed the next loudness value and return whether it's locking on.
    ///
    /// The calibrating (first) value never locks on.
    pub fn observe(&mut self, loudness: f64) -> bool {
        match self.state {
            BaselineState::Uninitialized => {
                tracing::debug!("Calibrated baseline at {:.2}", loudness);
                self.state = BaselineState::Calibrated { baseline: loudness };
                false
            }
            BaselineState::Calibrated { baseline } => loudness > baseline + self.offset,
        }
    }

    pub fn state(&self) -> BaselineState {
        self.state
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self.state, BaselineState::Calibrated { .. })
    }

    pub fn baseline(&self) -> Option<f64> {
        match self.state {
            BaselineState::Uninitialized => None,
            BaselineState::Calibrated { baseline } => Some(baseline),
        }
    }

    /// The loudness which has to be exceeded to lock on.
    pub fn threshold(&self) -> Option<f64> {
        self.baseline().map(|baseline| baseline + self.offset)
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
}

impl Default for BaselineCalibrator {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_OFFSET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_value_calibrates() {
        let mut calibrator = BaselineCalibrator::default();
        assert!(!calibrator.is_calibrated());
        assert_eq!(calibrator.threshold(), None);

        // even something very loud doesn't lock on while calibrating
        assert!(!calibrator.observe(500.));

        assert_eq!(calibrator.state(), BaselineState::Calibrated { baseline: 500. });
        assert_eq!(calibrator.threshold(), Some(505.));
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut calibrator = BaselineCalibrator::new(5.);
        calibrator.observe(10.);

        assert!(!calibrator.observe(15.));
        assert!(calibrator.observe(15.000_001));
    }

    #[test]
    fn crossing_in_both_directions() {
        let mut calibrator = BaselineCalibrator::new(5.);
        calibrator.observe(0.);

        let sequence = [1., 4.9, 5.1, 20., 100., 5., -3., 6., 0.];
        let expected = [false, false, true, true, true, false, false, true, false];

        let detected: Vec<bool> = sequence.iter().map(|&l| calibrator.observe(l)).collect();
        assert_eq!(detected, expected);
    }

    #[test]
    fn baseline_never_moves() {
        let mut calibrator = BaselineCalibrator::new(5.);
        calibrator.observe(-40.);

        for loudness in [-100., 50., 0., 1_000.] {
            calibrator.observe(loudness);
        }

        assert_eq!(calibrator.baseline(), Some(-40.));
    }
}
