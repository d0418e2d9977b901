//! Capture device acquisition with an explicit fallback chain.
//!
//! Strategies are tried in order: loopback of the default output (the only
//! way to hear "what the speakers play" on WASAPI hosts), the default input
//! device, then any device advertising an input channel. Exhaustion is the
//! caller's cue to switch to simulation, never a fatal error.

use crate::error::{AudioError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::mpsc::{Receiver, Sender};

const LOG_TARGET: &str = "lyricbar::capture";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStrategy {
    /// Input stream built on the default output device (WASAPI loopback)
    OutputLoopback,
    DefaultInput,
    /// First enumerated device with at least one input channel
    AnyInput,
}

/// The acquisition order tried by [`CaptureStream::acquire`]
pub const FALLBACK_CHAIN: [CaptureStrategy; 3] = [
    CaptureStrategy::OutputLoopback,
    CaptureStrategy::DefaultInput,
    CaptureStrategy::AnyInput,
];

/// A playing input stream plus the channel its callback feeds.
///
/// Dropping this closes the stream; the engine thread owns it exclusively
/// because cpal streams are not `Send`.
pub struct CaptureStream {
    _stream: cpal::Stream,
    pub samples: Receiver<Vec<f32>>,
    pub channels: usize,
    pub sample_rate: u32,
    pub strategy: CaptureStrategy,
}

impl CaptureStream {
    /// Try each strategy in order, logging failures, until one yields a
    /// playing stream.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::NoDevice`] when the whole chain is exhausted.
    pub fn acquire(strategies: &[CaptureStrategy]) -> Result<Self> {
        let host = cpal::default_host();
        for &strategy in strategies {
            match Self::open(&host, strategy) {
                Ok(stream) => {
                    tracing::info!(
                        target: LOG_TARGET,
                        ?strategy,
                        channels = stream.channels,
                        sample_rate = stream.sample_rate,
                        "capture stream acquired"
                    );
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::warn!(target: LOG_TARGET, ?strategy, error = %e, "capture strategy failed");
                }
            }
        }
        Err(AudioError::NoDevice)
    }

    fn open(host: &cpal::Host, strategy: CaptureStrategy) -> Result<Self> {
        let device = match strategy {
            CaptureStrategy::OutputLoopback => {
                host.default_output_device().ok_or(AudioError::NoDevice)?
            }
            CaptureStrategy::DefaultInput => {
                host.default_input_device().ok_or(AudioError::NoDevice)?
            }
            CaptureStrategy::AnyInput => host
                .input_devices()?
                .next()
                .ok_or(AudioError::NoDevice)?,
        };
        let supported = match strategy {
            CaptureStrategy::OutputLoopback => device.default_output_config()?,
            CaptureStrategy::DefaultInput | CaptureStrategy::AnyInput => {
                device.default_input_config()?
            }
        };
        let config: StreamConfig = supported.config();
        let sample_format = supported.sample_format();
        let (tx, rx) = std::sync::mpsc::channel();
        let stream = build_stream(&device, &config, sample_format, tx)?;
        stream.play()?;
        Ok(Self {
            _stream: stream,
            samples: rx,
            channels: usize::from(config.channels),
            sample_rate: config.sample_rate.0,
            strategy,
        })
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    format: SampleFormat,
    tx: Sender<Vec<f32>>,
) -> Result<cpal::Stream> {
    let stream = match format {
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &_| {
                let _ = tx.send(data.to_vec());
            },
            log_stream_error,
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &_| {
                let block = data
                    .iter()
                    .map(|&s| f32::from(s) / f32::from(i16::MAX))
                    .collect();
                let _ = tx.send(block);
            },
            log_stream_error,
            None,
        )?,
        SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _: &_| {
                let block = data
                    .iter()
                    .map(|&s| (f32::from(s) - 32_768.0) / 32_768.0)
                    .collect();
                let _ = tx.send(block);
            },
            log_stream_error,
            None,
        )?,
        other => {
            return Err(AudioError::UnsupportedFormat {
                format: format!("{other:?}"),
            })
        }
    };
    Ok(stream)
}

fn log_stream_error(err: cpal::StreamError) {
    tracing::warn!(target: LOG_TARGET, error = %err, "audio stream error");
}
