use std::num::NonZero;

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig,
};
use thiserror::Error;
use tracing::{debug, error, info};

use super::{Fetcher, FrameAssembler, FrameSink};
use crate::{SampleRate, DEFAULT_FRAME_SIZE, DEFAULT_SAMPLE_RATE};

#[derive(Debug, Error)]
pub enum SystemAudioError {
    #[error("Couldn't find a default input device. Is a microphone connected?")]
    NoDefaultInputDevice,

    #[error("There's no input device called '{0}'")]
    UnknownDevice(String),

    #[error("Couldn't list the input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("Couldn't retrieve the default input config of the device: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("The sample format '{0}' of the input device isn't supported")]
    UnsupportedSampleFormat(SampleFormat),

    #[error("Couldn't build the input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Couldn't start the input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Describes which input device should be captured and how.
#[derive(Debug, Clone)]
pub struct Descriptor {
    /// The name of the input device. `None` picks the default input device.
    pub device_name: Option<String>,

    /// Amount of samples per channel of each delivered frame.
    pub frame_size: NonZero<usize>,

    /// The sample rate which should be requested from the device.
    /// `None` takes the default sample rate of the device.
    pub sample_rate: Option<SampleRate>,
}

impl Default for Descriptor {
    fn default() -> Self {
        Self {
            device_name: None,
            frame_size: DEFAULT_FRAME_SIZE,
            sample_rate: None,
        }
    }
}

/// Captures the microphone (or any other input device) through [cpal].
///
/// The device delivers buffers of whatever size it likes, they are re-chunked
/// into frames of exactly [Descriptor::frame_size] samples per channel.
pub struct SystemAudio {
    desc: Descriptor,

    channels: u16,
    sample_rate: SampleRate,

    // Dropping the stream releases the device.
    stream: Option<Stream>,
}

impl SystemAudio {
    pub fn new(desc: Descriptor) -> Self {
        let sample_rate = desc.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);

        Self {
            desc,
            channels: 1,
            sample_rate,
            stream: None,
        }
    }

    fn device(&self) -> Result<cpal::Device, SystemAudioError> {
        let host = cpal::default_host();

        match self.desc.device_name.as_deref() {
            None => host
                .default_input_device()
                .ok_or(SystemAudioError::NoDefaultInputDevice),
            Some(wanted) => host
                .input_devices()?
                .find(|device| device_name(device).as_deref() == Some(wanted))
                .ok_or_else(|| SystemAudioError::UnknownDevice(wanted.to_string())),
        }
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &StreamConfig,
        frame_size: usize,
        sink: FrameSink,
    ) -> Result<Stream, SystemAudioError>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let mut assembler = FrameAssembler::new(frame_size, config.channels, config.sample_rate);
        let mut converted: Vec<f32> = Vec::new();

        let stream = device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                converted.clear();
                converted.extend(data.iter().map(|&sample| f32::from_sample(sample)));

                assembler.push(&converted, |frame| {
                    sink.push(frame);
                });
            },
            |err| error!("Audio input stream error: {}", err),
            None,
        )?;

        Ok(stream)
    }
}

impl Fetcher for SystemAudio {
    type Error = SystemAudioError;

    fn start(&mut self, sink: FrameSink) -> Result<(), Self::Error> {
        let device = self.device()?;
        let supported = device.default_input_config()?;

        let mut config = supported.config();
        if let Some(sample_rate) = self.desc.sample_rate {
            config.sample_rate = sample_rate;
        }

        debug!("Input stream config: {:?}", config);

        let frame_size = self.desc.frame_size.get();
        let stream = match supported.sample_format() {
            SampleFormat::I8 => Self::build_stream::<i8>(&device, &config, frame_size, sink),
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, frame_size, sink),
            SampleFormat::I32 => Self::build_stream::<i32>(&device, &config, frame_size, sink),
            SampleFormat::U8 => Self::build_stream::<u8>(&device, &config, frame_size, sink),
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, frame_size, sink),
            SampleFormat::U32 => Self::build_stream::<u32>(&device, &config, frame_size, sink),
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, frame_size, sink),
            SampleFormat::F64 => Self::build_stream::<f64>(&device, &config, frame_size, sink),
            other => Err(SystemAudioError::UnsupportedSampleFormat(other)),
        }?;

        stream.play()?;

        info!(
            "Listening on '{}' ({} channel(s), {} Hz)",
            device_name(&device).unwrap_or_else(|| "unknown device".to_string()),
            config.channels,
            config.sample_rate
        );

        self.channels = config.channels;
        self.sample_rate = config.sample_rate;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                debug!("Couldn't pause the input stream before releasing it: {}", err);
            }
        }
    }

    /// The channels of the running stream (`1` before the first start).
    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }
}

/// Returns the names of all input devices of the default host.
pub fn input_device_names() -> Result<Vec<String>, SystemAudioError> {
    let host = cpal::default_host();

    Ok(host
        .input_devices()?
        .filter_map(|device| device_name(&device))
        .collect())
}

#[allow(deprecated)]
fn device_name(device: &cpal::Device) -> Option<String> {
    device.name().ok()
}
