use std::{
    io,
    num::NonZero,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use soundr_audio::{
    baseline::DEFAULT_BASELINE_OFFSET,
    distance::{DEFAULT_ATTENUATION_FACTOR, DEFAULT_REFERENCE_LEVEL},
    fetcher::{SystemAudioFetcher, SystemAudioFetcherDescriptor},
    level::DEFAULT_LEVEL_GAIN,
    smoothing::DEFAULT_SMOOTHING_FACTOR,
    Coordinator, PipelineConfig, SampleRate, DEFAULT_FRAME_SIZE, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SAMPLE_RATE,
};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    IO(#[from] io::Error),

    #[error(transparent)]
    Serde(#[from] toml::de::Error),

    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Name of the input device. The default input device is used if it's not set.
    pub device: Option<String>,

    /// Amount of samples per channel which are processed at once.
    pub frame_size: NonZero<usize>,

    /// The sample rate which gets requested from the device.
    /// The default sample rate of the device is used if it's not set.
    pub sample_rate: Option<SampleRate>,

    /// How many frames may wait for the pipeline before new ones get dropped.
    pub queue_capacity: NonZero<usize>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            frame_size: DEFAULT_FRAME_SIZE,
            sample_rate: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// How much louder than the ambient noise a sound has to be to lock on.
    pub baseline_offset: f64,

    /// Scales `log10(rms)` into the loudness unit.
    pub level_gain: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            baseline_offset: DEFAULT_BASELINE_OFFSET,
            level_gain: DEFAULT_LEVEL_GAIN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Weight of the newest angle, within `(0, 1]`. Smaller values turn the arrow slower.
    pub factor: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            factor: DEFAULT_SMOOTHING_FACTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// Loudness of the source at a distance of one meter.
    pub reference_level: f64,

    /// Adjust this to your environment and sound source.
    pub attenuation_factor: f64,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            reference_level: DEFAULT_REFERENCE_LEVEL,
            attenuation_factor: DEFAULT_ATTENUATION_FACTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// How often the status line gets redrawn.
    pub refresh_interval_ms: u64,

    pub color: bool,
}

impl DisplayConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 100,
            color: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub detection: DetectionConfig,
    pub smoothing: SmoothingConfig,
    pub distance: DistanceConfig,
    pub display: DisplayConfig,
}

impl Config {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let string = toml::to_string(self)?;
        std::fs::write(path, string)?;
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            frame_size: self.audio.frame_size,
            sample_rate: self.audio.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
            baseline_offset: self.detection.baseline_offset,
            smoothing_factor: self.smoothing.factor,
            reference_level: self.distance.reference_level,
            attenuation_factor: self.distance.attenuation_factor,
            level_gain: self.detection.level_gain,
            queue_capacity: self.audio.queue_capacity,
        }
    }

    pub fn fetcher_descriptor(&self) -> SystemAudioFetcherDescriptor {
        SystemAudioFetcherDescriptor {
            device_name: self.audio.device.clone(),
            frame_size: self.audio.frame_size,
            sample_rate: self.audio.sample_rate,
        }
    }

    pub fn coordinator(&self) -> anyhow::Result<Coordinator<SystemAudioFetcher>> {
        let fetcher = SystemAudioFetcher::new(self.fetcher_descriptor());
        let coordinator = Coordinator::new(fetcher, self.pipeline_config())?;

        Ok(coordinator)
    }
}

pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

/// Loads the config file at `path`.
///
/// A missing file gets created with the default config. A broken file is
/// backed up next to it (`.back`) and replaced by the default config.
pub fn load_or_default(path: &Path) -> Config {
    load(path).unwrap_or_else(|err| {
        let default_config = Config::default();

        match err {
            ConfigError::IO(io_err) => match io_err.kind() {
                io::ErrorKind::NotFound => {
                    warn!(
                        "There's no config file yet. Creating one with the default values at {}",
                        path.to_string_lossy()
                    );

                    if let Err(err) = default_config.save(path) {
                        warn!("Couldn't save default config file: {:?}", err);
                    }
                }
                _other => {
                    warn!("{}. Fallback to default config file", io_err);
                }
            },
            ConfigError::Serde(serde_err) => {
                let backup_path = backup_path(path);

                warn!(
                    "{} {} will be backup to {} and the default config will be saved and used.",
                    serde_err,
                    path.to_string_lossy(),
                    backup_path.to_string_lossy()
                );

                if let Err(err) = std::fs::copy(path, &backup_path) {
                    warn!(
                        "Couldn't backup config file: {:?}. Won't create new config file.",
                        err
                    );
                } else if let Err(err) = default_config.save(path) {
                    warn!("Couldn't create default config file: {:?}", err);
                }
            }
            ConfigError::Serialize(ser_err) => {
                warn!("{}. Fallback to default config file", ser_err);
            }
        };

        default_config
    })
}

fn backup_path(path: &Path) -> PathBuf {
    let mut path = path.to_path_buf();
    path.set_extension("back");
    path
}
