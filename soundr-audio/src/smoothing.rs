/// The default weight of a new angle in the moving average.
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.2;

/// How many degrees one loudness unit turns the angle.
const DEGREES_PER_LOUDNESS: f64 = 2.;

/// Exponential moving average over an angle which is derived from the loudness.
///
/// The angle is **not** a bearing to the sound source: it only depends on how
/// loud the frames are. It exists so a presentation layer can turn an indicator
/// smoothly instead of jumping around with every frame.
#[derive(Debug, Clone)]
pub struct AngleSmoother {
    factor: f64,
    // in degrees
    angle: f64,
}

impl AngleSmoother {
    /// `factor` is the weight of each new angle and should be within `(0, 1]`.
    pub fn new(factor: f64) -> Self {
        Self { factor, angle: 0. }
    }

    /// The unsmoothed angle (in degrees) of the given loudness.
    pub fn raw_angle(loudness: f64) -> f64 {
        loudness * DEGREES_PER_LOUDNESS
    }

    /// Moves the smoothed angle towards the angle of `loudness` and returns it.
    pub fn update(&mut self, loudness: f64) -> f64 {
        self.angle = self.angle * (1. - self.factor) + Self::raw_angle(loudness) * self.factor;
        self.angle
    }

    /// The current smoothed angle in degrees.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Default for AngleSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_FACTOR)
    }
}
