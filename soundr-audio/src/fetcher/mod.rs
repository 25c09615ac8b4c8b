//! Each struct here can be used to fetch audio frames from various sources.
//! Pick the one you need to fetch from.
mod dummy;

#[cfg(feature = "native")]
mod system_audio;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crossbeam_channel::{Sender, TrySendError};
use tracing::warn;

use crate::SampleRate;

pub use dummy::{DummyFetcher, DummyFetcherError};

#[cfg(feature = "native")]
pub use system_audio::{
    input_device_names, Descriptor as SystemAudioFetcherDescriptor,
    SystemAudio as SystemAudioFetcher, SystemAudioError,
};

/// Interface for all structs (fetchers) which are listed in the [fetcher module](crate::fetcher).
///
/// A fetcher owns the audio device. After [Fetcher::start] it pushes every captured
/// frame into the given [FrameSink] until [Fetcher::stop] is called.
pub trait Fetcher {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Acquire the device and start delivering frames into `sink`.
    fn start(&mut self, sink: FrameSink) -> Result<(), Self::Error>;

    /// Stop delivering frames and release the device.
    ///
    /// Must be harmless if the fetcher isn't running.
    fn stop(&mut self);

    /// Returns the amount of channels of each delivered frame.
    fn channels(&self) -> u16;

    /// Returns the sample rate of the delivered frames.
    fn sample_rate(&self) -> SampleRate;
}

/// One buffer of audio samples, one array per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    channels: Box<[Box<[f32]>]>,
    sample_rate: SampleRate,
}

impl AudioFrame {
    /// Create a frame from per-channel sample arrays.
    ///
    /// Every channel is cut or zero-padded to the length of the first one.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: SampleRate) -> Self {
        let len = channels.first().map(Vec::len).unwrap_or(0);

        let channels = channels
            .into_iter()
            .map(|mut samples| {
                samples.resize(len, 0.);
                samples.into_boxed_slice()
            })
            .collect();

        Self {
            channels,
            sample_rate,
        }
    }

    /// Convenience constructor for a single channel frame.
    pub fn mono(samples: &[f32], sample_rate: SampleRate) -> Self {
        Self::new(vec![samples.to_vec()], sample_rate)
    }

    /// Splits an interleaved device buffer (`[l, r, l, r, ...]`) into its channels.
    /// A trailing incomplete sample group is ignored.
    pub fn from_interleaved(data: &[f32], amount_channels: u16, sample_rate: SampleRate) -> Self {
        let amount_channels = usize::from(amount_channels.max(1));

        let mut channels = vec![Vec::with_capacity(data.len() / amount_channels); amount_channels];
        for samples in data.chunks_exact(amount_channels) {
            for (channel, &sample) in channels.iter_mut().zip(samples) {
                channel.push(sample);
            }
        }

        Self::new(channels, sample_rate)
    }

    /// The samples of the given channel, if it exists.
    pub fn channel(&self, idx: usize) -> Option<&[f32]> {
        self.channels.get(idx).map(|samples| samples.as_ref())
    }

    pub fn amount_channels(&self) -> usize {
        self.channels.len()
    }

    /// Amount of samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map(|samples| samples.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }
}

/// The delivery end of the frame queue which is handed to a [Fetcher].
///
/// Pushing never blocks: if the consumer lags behind and the queue is full,
/// the frame gets dropped and counted.
#[derive(Debug, Clone)]
pub struct FrameSink {
    sender: Sender<AudioFrame>,
    dropped: Arc<AtomicU64>,
}

impl FrameSink {
    pub(crate) fn new(sender: Sender<AudioFrame>, dropped: Arc<AtomicU64>) -> Self {
        Self { sender, dropped }
    }

    /// Hand the frame over to the consumer.
    ///
    /// Returns `false` if the frame got dropped (queue full or consumer gone).
    pub fn push(&self, frame: AudioFrame) -> bool {
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    warn!("Frame queue is full, dropped {} frames so far", dropped);
                }
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Collects device buffers of arbitrary size and cuts them into frames of a fixed size.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    // pending interleaved samples
    pending: Vec<f32>,
    frame_size: usize,
    amount_channels: u16,
    sample_rate: SampleRate,
}

impl FrameAssembler {
    /// `frame_size` is the amount of samples *per channel* of each assembled frame.
    pub fn new(frame_size: usize, amount_channels: u16, sample_rate: SampleRate) -> Self {
        let amount_channels = amount_channels.max(1);
        let frame_size = frame_size.max(1);

        Self {
            pending: Vec::with_capacity(frame_size * usize::from(amount_channels)),
            frame_size,
            amount_channels,
            sample_rate,
        }
    }

    /// Appends the interleaved `data` and calls `on_frame` for every completed frame.
    pub fn push(&mut self, data: &[f32], mut on_frame: impl FnMut(AudioFrame)) {
        let chunk_len = self.frame_size * usize::from(self.amount_channels);

        let mut data = data;
        while !data.is_empty() {
            let missing = chunk_len - self.pending.len();
            let take = missing.min(data.len());

            self.pending.extend_from_slice(&data[..take]);
            data = &data[take..];

            if self.pending.len() == chunk_len {
                on_frame(AudioFrame::from_interleaved(
                    &self.pending,
                    self.amount_channels,
                    self.sample_rate,
                ));
                self.pending.clear();
            }
        }
    }

    /// Amount of interleaved samples which are waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
