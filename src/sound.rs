use std::time::{Duration, Instant};

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use log::{debug, warn};

const TONE_HZ: f32 = 440.0;
const BEEP_LENGTH: Duration = Duration::from_millis(100);

/// Fire-and-forget beeper. The tone keeps playing on cpal's own thread until
/// `update` notices it has run long enough and drops the stream.
pub struct Sound {
    device: cpal::Device,
    config: cpal::StreamConfig,
    format: cpal::SampleFormat,
    playing: Option<(cpal::Stream, Instant)>,
}

impl Sound {
    pub fn new() -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no output device available")?;
        let mut supported_configs_range = device
            .supported_output_configs()
            .context("error while querying configs")?;
        let supported_config = supported_configs_range
            .next()
            .context("output device has no supported config")?
            .with_max_sample_rate();
        let sample_format = supported_config.sample_format();
        Ok(Self {
            device,
            config: supported_config.into(),
            format: sample_format,
            playing: None,
        })
    }

    pub fn beep(&mut self) {
        let stream = match self.format {
            cpal::SampleFormat::I8 => self.build::<i8>(),
            cpal::SampleFormat::I16 => self.build::<i16>(),
            cpal::SampleFormat::I32 => self.build::<i32>(),
            cpal::SampleFormat::I64 => self.build::<i64>(),
            cpal::SampleFormat::U8 => self.build::<u8>(),
            cpal::SampleFormat::U16 => self.build::<u16>(),
            cpal::SampleFormat::U32 => self.build::<u32>(),
            cpal::SampleFormat::U64 => self.build::<u64>(),
            cpal::SampleFormat::F32 => self.build::<f32>(),
            cpal::SampleFormat::F64 => self.build::<f64>(),
            sample_format => Err(anyhow::anyhow!(
                "unsupported sample format '{sample_format}'"
            )),
        };
        match stream {
            Ok(stream) => self.playing = Some((stream, Instant::now())),
            Err(err) => warn!("could not play beep: {err:#}"),
        }
    }

    /// Stops a finished beep.
    pub fn update(&mut self) {
        if let Some((_, started)) = &self.playing {
            if started.elapsed() >= BEEP_LENGTH {
                debug!("beep finished");
                self.playing = None;
            }
        }
    }

    fn build<T>(&self) -> anyhow::Result<cpal::Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let sample_rate = self.config.sample_rate.0 as f32;
        let channels = self.config.channels as usize;

        // Produce a sinusoid of maximum amplitude.
        let mut sample_clock = 0f32;
        let mut next_value = move || {
            sample_clock = (sample_clock + 1.0) % sample_rate;
            (sample_clock * TONE_HZ * 2.0 * std::f32::consts::PI / sample_rate).sin()
        };

        let err_fn = |err| warn!("an error occurred on stream: {}", err);

        let stream = self.device.build_output_stream(
            &self.config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                Self::write_data(data, channels, &mut next_value)
            },
            err_fn,
            None,
        )?;
        stream.play()?;
        Ok(stream)
    }

    fn write_data<T>(output: &mut [T], channels: usize, next_sample: &mut dyn FnMut() -> f32)
    where
        T: Sample + FromSample<f32>,
    {
        for frame in output.chunks_mut(channels) {
            let value: T = T::from_sample(next_sample());
            for sample in frame.iter_mut() {
                *sample = value;
            }
        }
    }
}
