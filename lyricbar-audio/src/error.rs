use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no usable capture device")]
    NoDevice,

    #[error("unsupported sample format: {format}")]
    UnsupportedFormat { format: String },

    #[error("failed to query stream config: {0}")]
    StreamConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to enumerate devices: {0}")]
    Devices(#[from] cpal::DevicesError),
}

pub type Result<T> = std::result::Result<T, AudioError>;
