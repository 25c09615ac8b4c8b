use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    fetcher::{AudioFrame, Fetcher, FrameSink},
    pipeline::{Estimate, StreamState},
    ConfigError, PipelineConfig,
};

const WORKER_NAME: &str = "soundr-pipeline";

#[derive(Debug, Error)]
pub enum StartError {
    #[error("The audio source couldn't be started: {0}")]
    Fetcher(Box<dyn std::error::Error + Send + Sync>),

    #[error("Couldn't spawn the pipeline worker: {0}")]
    Spawn(std::io::Error),
}

/// Runs the pipeline on the frames of a [Fetcher].
///
/// After [Coordinator::start], the fetcher delivers its frames into a bounded queue
/// (frames get dropped instead of blocking the audio thread if the queue is full).
/// A single worker thread processes them in arrival order and hands the
/// [Estimate]s over to whoever reads them through [Coordinator::try_recv],
/// [Coordinator::recv_timeout] or [Coordinator::latest].
///
/// # Example
/// ```
/// use std::time::Duration;
/// use soundr_audio::{Coordinator, PipelineConfig, fetcher::DummyFetcher};
///
/// let fetcher = DummyFetcher::from_mono_frames(&[[1f32; 4], [10.; 4]]);
/// let mut coordinator = Coordinator::new(fetcher, PipelineConfig::default()).unwrap();
///
/// coordinator.start().unwrap();
///
/// // the first frame calibrates the baseline ...
/// let first = coordinator.recv_timeout(Duration::from_secs(5)).unwrap();
/// assert!(!first.is_locking_on);
///
/// // ... and the much louder second one locks on
/// let second = coordinator.recv_timeout(Duration::from_secs(5)).unwrap();
/// assert!(second.is_locking_on);
///
/// coordinator.stop();
/// ```
pub struct Coordinator<F: Fetcher> {
    config: PipelineConfig,
    fetcher: F,

    stream: Option<ActiveStream>,

    dropped_frames: Arc<AtomicU64>,
    dropped_estimates: Arc<AtomicU64>,
    mismatched_frames: Arc<AtomicU64>,
}

struct ActiveStream {
    active: Arc<AtomicBool>,
    // dropping it tells the worker to finish
    shutdown: Sender<()>,
    worker: JoinHandle<()>,
    estimates: Receiver<Estimate>,
}

impl<F: Fetcher> Coordinator<F> {
    pub fn new(fetcher: F, config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            fetcher,
            stream: None,
            dropped_frames: Arc::new(AtomicU64::new(0)),
            dropped_estimates: Arc::new(AtomicU64::new(0)),
            mismatched_frames: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Starts a new stream with fresh state.
    ///
    /// Does nothing if the coordinator is already running. If the fetcher can't be
    /// started, the error is returned and no estimate will ever be emitted.
    pub fn start(&mut self) -> Result<(), StartError> {
        if self.stream.is_some() {
            debug!("Coordinator is already running");
            return Ok(());
        }

        self.dropped_frames.store(0, Ordering::Relaxed);
        self.dropped_estimates.store(0, Ordering::Relaxed);
        self.mismatched_frames.store(0, Ordering::Relaxed);

        let capacity = self.config.queue_capacity.get();
        let (frame_tx, frame_rx) = bounded(capacity);
        let (estimate_tx, estimate_rx) = bounded(capacity);
        let (shutdown_tx, shutdown_rx) = bounded(0);
        let active = Arc::new(AtomicBool::new(true));

        let worker = Worker {
            state: StreamState::new(&self.config),
            estimates: estimate_tx,
            oldest: estimate_rx.clone(),
            active: active.clone(),
            dropped_estimates: self.dropped_estimates.clone(),
            frame_size: self.config.frame_size.get(),
            mismatched_frames: self.mismatched_frames.clone(),
        };

        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || worker.run(frame_rx, shutdown_rx))
            .map_err(StartError::Spawn)?;

        let sink = FrameSink::new(frame_tx, self.dropped_frames.clone());
        if let Err(err) = self.fetcher.start(sink) {
            active.store(false, Ordering::Release);
            drop(shutdown_tx);
            if worker.join().is_err() {
                error!("The pipeline worker panicked");
            }

            return Err(StartError::Fetcher(Box::new(err)));
        }

        if self.fetcher.sample_rate() != self.config.sample_rate {
            debug!(
                "The audio source delivers {} Hz instead of the configured {} Hz",
                self.fetcher.sample_rate(),
                self.config.sample_rate
            );
        }

        info!("Started listening");
        self.stream = Some(ActiveStream {
            active,
            shutdown: shutdown_tx,
            worker,
            estimates: estimate_rx,
        });

        Ok(())
    }

    /// Stops the stream, releases the audio source and discards every estimate
    /// which hasn't been read yet.
    ///
    /// Does nothing if the coordinator isn't running.
    pub fn stop(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };

        let ActiveStream {
            active,
            shutdown,
            worker,
            estimates,
        } = stream;

        active.store(false, Ordering::Release);
        self.fetcher.stop();

        drop(shutdown);
        if worker.join().is_err() {
            error!("The pipeline worker panicked");
        }

        let discarded = estimates.try_iter().count();
        info!(
            "Stopped listening (discarded {} unread estimates, dropped {} frames)",
            discarded,
            self.dropped_frames()
        );
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    /// The next unread estimate, if there's one.
    pub fn try_recv(&self) -> Option<Estimate> {
        self.stream.as_ref()?.estimates.try_recv().ok()
    }

    /// Waits up to `timeout` for the next estimate.
    ///
    /// Returns `None` immediately if the coordinator isn't running.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Estimate> {
        self.stream.as_ref()?.estimates.recv_timeout(timeout).ok()
    }

    /// Reads every unread estimate and returns the most recent one.
    pub fn latest(&self) -> Option<Estimate> {
        self.stream.as_ref()?.estimates.try_iter().last()
    }

    /// Frames of the current stream which got dropped because the queue was full.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Estimates of the current stream which got replaced by newer ones
    /// because nobody read them in time.
    pub fn dropped_estimates(&self) -> u64 {
        self.dropped_estimates.load(Ordering::Relaxed)
    }

    /// Frames of the current stream whose length differs from [PipelineConfig::frame_size].
    ///
    /// They're processed anyway but the fetcher should be configured with the same frame size.
    pub fn mismatched_frames(&self) -> u64 {
        self.mismatched_frames.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}

impl<F: Fetcher> Drop for Coordinator<F> {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    state: StreamState,

    estimates: Sender<Estimate>,
    // used to evict the oldest estimate if the consumer is lagging behind
    oldest: Receiver<Estimate>,

    active: Arc<AtomicBool>,
    dropped_estimates: Arc<AtomicU64>,

    frame_size: usize,
    mismatched_frames: Arc<AtomicU64>,
}

impl Worker {
    fn run(mut self, frames: Receiver<AudioFrame>, shutdown: Receiver<()>) {
        debug!("Pipeline worker started");

        loop {
            select! {
                recv(frames) -> frame => match frame {
                    Ok(frame) => self.handle(&frame),
                    // the fetcher let go of its sink
                    Err(_) => break,
                },
                recv(shutdown) -> _ => break,
            }
        }

        debug!(
            "Pipeline worker finished after {} frames",
            self.state.processed()
        );
    }

    fn handle(&mut self, frame: &AudioFrame) {
        if frame.len() != self.frame_size
            && self.mismatched_frames.fetch_add(1, Ordering::Relaxed) == 0
        {
            warn!(
                "The audio source delivers frames of {} samples instead of the configured {}",
                frame.len(),
                self.frame_size
            );
        }

        let estimate = self.state.process_frame(frame);

        // the stream got stopped while the frame was processed
        if !self.active.load(Ordering::Acquire) {
            return;
        }

        match self.estimates.try_send(estimate) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(estimate)) => {
                if self.oldest.try_recv().is_ok() {
                    self.dropped_estimates.fetch_add(1, Ordering::Relaxed);
                }
                // the worker is the only producer so there's room again
                if let Err(err) = self.estimates.try_send(estimate) {
                    debug!("Couldn't queue the estimate: {}", err);
                }
            }
        }
    }
}
