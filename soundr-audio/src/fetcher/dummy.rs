use thiserror::Error;
use tracing::debug;

use super::{AudioFrame, Fetcher, FrameSink};
use crate::{SampleRate, DEFAULT_SAMPLE_RATE};

#[derive(Debug, Error)]
pub enum DummyFetcherError {
    #[error("The dummy audio device is configured to be unavailable")]
    Unavailable,
}

/// A fetcher which doesn't touch any audio device.
///
/// It replays the given frames once, in order, as soon as it gets started.
/// Useful for tests and as a stand-in where no microphone exists.
#[derive(Debug, Clone)]
pub struct DummyFetcher {
    frames: Vec<AudioFrame>,
    channels: u16,
    sample_rate: SampleRate,
    fail_on_start: bool,

    sink: Option<FrameSink>,
}

impl DummyFetcher {
    /// A fetcher which delivers nothing.
    pub fn new(channels: u16) -> Self {
        Self {
            frames: Vec::new(),
            channels,
            sample_rate: DEFAULT_SAMPLE_RATE,
            fail_on_start: false,
            sink: None,
        }
    }

    /// A fetcher which replays `frames` on every start.
    pub fn with_frames(frames: Vec<AudioFrame>) -> Self {
        let channels = frames
            .first()
            .map(|frame| frame.amount_channels() as u16)
            .unwrap_or(1);
        let sample_rate = frames
            .first()
            .map(AudioFrame::sample_rate)
            .unwrap_or(DEFAULT_SAMPLE_RATE);

        Self {
            frames,
            channels,
            sample_rate,
            fail_on_start: false,
            sink: None,
        }
    }

    /// A single channel fetcher which replays the given sample arrays, one frame each.
    pub fn from_mono_frames<S: AsRef<[f32]>>(frames: &[S]) -> Self {
        Self::with_frames(
            frames
                .iter()
                .map(|samples| AudioFrame::mono(samples.as_ref(), DEFAULT_SAMPLE_RATE))
                .collect(),
        )
    }

    /// A fetcher whose device can't be acquired.
    pub fn unavailable() -> Self {
        Self {
            fail_on_start: true,
            ..Self::new(1)
        }
    }

    /// Push one more frame into a running fetcher.
    ///
    /// Returns `false` if the fetcher isn't running or the frame got dropped.
    pub fn deliver(&self, frame: AudioFrame) -> bool {
        match &self.sink {
            Some(sink) => sink.push(frame),
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.sink.is_some()
    }
}

impl Fetcher for DummyFetcher {
    type Error = DummyFetcherError;

    fn start(&mut self, sink: FrameSink) -> Result<(), Self::Error> {
        if self.fail_on_start {
            return Err(DummyFetcherError::Unavailable);
        }

        debug!("Replaying {} dummy frames", self.frames.len());
        for frame in self.frames.iter() {
            sink.push(frame.clone());
        }

        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        self.sink = None;
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{atomic::AtomicU64, Arc};

    use super::*;

    #[test]
    fn replays_frames_in_order() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let mut fetcher = DummyFetcher::from_mono_frames(&[[1f32], [2.], [3.]]);

        fetcher
            .start(FrameSink::new(tx, Arc::new(AtomicU64::new(0))))
            .unwrap();

        let firsts: Vec<f32> = rx.try_iter().map(|frame| frame.channel(0).unwrap()[0]).collect();
        assert_eq!(firsts, [1., 2., 3.]);
    }

    #[test]
    fn deliver_requires_running_fetcher() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let mut fetcher = DummyFetcher::new(1);

        assert!(!fetcher.deliver(AudioFrame::mono(&[1.], 44_100)));

        fetcher
            .start(FrameSink::new(tx, Arc::new(AtomicU64::new(0))))
            .unwrap();
        assert!(fetcher.deliver(AudioFrame::mono(&[1.], 44_100)));

        fetcher.stop();
        assert!(!fetcher.is_running());
        assert!(!fetcher.deliver(AudioFrame::mono(&[1.], 44_100)));
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn unavailable_device() {
        let (tx, _rx) = crossbeam_channel::bounded(4);
        let mut fetcher = DummyFetcher::unavailable();

        let result = fetcher.start(FrameSink::new(tx, Arc::new(AtomicU64::new(0))));
        assert!(matches!(result, Err(DummyFetcherError::Unavailable)));
        assert!(!fetcher.is_running());
    }
}
