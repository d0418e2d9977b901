pub mod bands;
pub mod capture;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod meter;
pub mod simulate;

pub use bands::BandPartition;
pub use capture::{CaptureStrategy, CaptureStream, FALLBACK_CHAIN};
pub use dsp::{downmix, hann_window, normalize_db, Smoother, SpectrumAnalyzer};
pub use engine::{LevelCallback, SpectrumEngine};
pub use error::AudioError;
pub use meter::BarState;
pub use simulate::SimulatedSpectrum;
