//! # Description
//! A crate which turns a live audio stream into three values a presentation layer
//! can render:
//!
//! - whether something louder than the ambient noise is around ("locking on"),
//! - a smoothed angle to turn an indicator with,
//! - a rough guess of the distance to the sound source.
//!
//! The angle only depends on the loudness. There's no direction finding involved,
//! so don't treat it as a bearing.
//!
//! ### [cpal]
//!
//! With the `native` feature (enabled by default) this crate re-exports [cpal]
//! which is used by [fetcher::SystemAudioFetcher] to capture the microphone.
//!
//! # Example
//!
//! ## Process frames by hand
//! The whole pipeline is available as a plain state struct:
//! ```
//! use soundr_audio::{PipelineConfig, StreamState, fetcher::AudioFrame};
//!
//! let mut state = StreamState::new(&PipelineConfig::default());
//!
//! // the first frame calibrates the baseline (rms = 1 => loudness = 0)
//! let estimate = state.process_frame(&AudioFrame::mono(&[1., 1., 1., 1.], 44_100));
//! assert!(!estimate.is_locking_on);
//!
//! // rms = 10 => loudness = 100 which is way above the baseline
//! let estimate = state.process_frame(&AudioFrame::mono(&[10., 10., 10., 10.], 44_100));
//! assert!(estimate.is_locking_on);
//! assert!((estimate.distance_meters - 0.3199).abs() < 1e-4);
//! ```
//!
//! ## Let a coordinator do the work
//! A [Coordinator] pulls the frames of a [fetcher::Fetcher] on its own thread:
//! ```
//! use std::time::Duration;
//! use soundr_audio::{Coordinator, PipelineConfig, fetcher::DummyFetcher};
//!
//! let fetcher = DummyFetcher::from_mono_frames(&[[0.2f32; 1024]; 3]);
//! let mut coordinator = Coordinator::new(fetcher, PipelineConfig::default()).unwrap();
//!
//! coordinator.start().unwrap();
//!
//! for _ in 0..3 {
//!     let estimate = coordinator.recv_timeout(Duration::from_secs(5)).unwrap();
//!     // same loudness as the baseline
//!     assert!(!estimate.is_locking_on);
//! }
//!
//! coordinator.stop();
//! ```
pub mod baseline;
pub mod distance;
pub mod fetcher;
pub mod level;
pub mod smoothing;

mod config;
mod coordinator;
mod pipeline;

use std::num::NonZero;

pub use config::{ConfigError, PipelineConfig, DEFAULT_QUEUE_CAPACITY};
pub use coordinator::{Coordinator, StartError};
#[cfg(feature = "native")]
pub use cpal;
pub use pipeline::{Estimate, StreamState};

pub type SampleRate = u32;

/// The default sample rate for a fetcher.
/// Fetchers are allowed to use this for orientation.
pub const DEFAULT_SAMPLE_RATE: SampleRate = 44_100;

/// The default amount of samples per channel of a frame.
pub const DEFAULT_FRAME_SIZE: NonZero<usize> = NonZero::new(1024).unwrap();
