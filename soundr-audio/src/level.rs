use crate::fetcher::AudioFrame;

/// The loudness reported for frames without any measurable energy
/// (silence, empty frames, broken samples).
///
/// Every other loudness value is clamped to be at least this value, so it's
/// also the smallest loudness the pipeline can ever see.
pub const SILENCE_LOUDNESS: f64 = -10_000.;

/// The default factor which scales `log10(rms)` into the loudness unit.
pub const DEFAULT_LEVEL_GAIN: f64 = 100.;

/// Root mean square of the first channel of the frame.
///
/// The other channels are ignored. Returns `0` for an empty frame.
pub fn rms(frame: &AudioFrame) -> f64 {
    let samples = match frame.channel(0) {
        Some(samples) if !samples.is_empty() => samples,
        _ => return 0.,
    };

    let sum: f64 = samples
        .iter()
        .map(|&sample| f64::from(sample) * f64::from(sample))
        .sum();

    (sum / samples.len() as f64).sqrt()
}

/// Converts the frame into its loudness: `gain * log10(rms)`.
///
/// This is not a calibrated sound pressure level, `gain` is just a tunable scaling.
/// Frames with zero (or non finite) energy return [SILENCE_LOUDNESS].
pub fn loudness(frame: &AudioFrame, gain: f64) -> f64 {
    loudness_from_rms(rms(frame), gain)
}

pub fn loudness_from_rms(rms: f64, gain: f64) -> f64 {
    if !rms.is_finite() || rms <= 0. {
        return SILENCE_LOUDNESS;
    }

    let level = gain * rms.log10();
    if level.is_nan() {
        SILENCE_LOUDNESS
    } else {
        level.max(SILENCE_LOUDNESS)
    }
}
