//! Windowed FFT and level shaping for the spectrum pipeline.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Floor added before the log so silent bins stay finite
const DB_EPSILON: f32 = 1e-10;

/// Hann window coefficient for position `index` of `size`
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

/// Collapse interleaved multichannel frames to mono by channel mean
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    let channels = channels.max(1);
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Map a dB magnitude into [0, 1] against the configured range
#[must_use]
pub fn normalize_db(db: f32, min_db: f32, max_db: f32) -> f32 {
    ((db - min_db) / (max_db - min_db)).clamp(0.0, 1.0)
}

/// Windowed forward FFT producing per-bin dB magnitudes.
///
/// Owns the plan and scratch buffers so the per-chunk path allocates only
/// the output vector.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    chunk_size: usize,
}

impl SpectrumAnalyzer {
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(chunk_size);
        let scratch_len = fft.get_inplace_scratch_len();
        Self {
            fft,
            window: (0..chunk_size).map(|i| hann_window(i, chunk_size)).collect(),
            buffer: vec![Complex::new(0.0, 0.0); chunk_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            chunk_size,
        }
    }

    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// dB magnitudes for the first `chunk_size / 2` bins (the real half).
    /// Short chunks are zero-padded.
    #[must_use]
    pub fn magnitudes_db(&mut self, samples: &[f32]) -> Vec<f32> {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        self.buffer[..self.chunk_size / 2]
            .iter()
            .map(|bin| 20.0 * (bin.norm() + DB_EPSILON).log10())
            .collect()
    }
}

/// Asymmetric temporal smoother: rises track the input quickly, falls are
/// held back by the decayed previous level.
pub struct Smoother {
    alpha: f32,
    peak_decay: f32,
    levels: Vec<f32>,
}

impl Smoother {
    #[must_use]
    pub fn new(alpha: f32, peak_decay: f32, num_bars: usize) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            peak_decay: peak_decay.clamp(0.0, 1.0),
            levels: vec![0.0; num_bars],
        }
    }

    /// Fold one normalized frame into the running levels
    pub fn apply(&mut self, frame: &[f32]) -> &[f32] {
        for (level, &new) in self.levels.iter_mut().zip(frame) {
            let floor = *level * (1.0 - self.peak_decay);
            *level = self.alpha * *level + (1.0 - self.alpha) * new.max(floor);
        }
        &self.levels
    }

    #[must_use]
    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    pub fn reset(&mut self) {
        self.levels.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window_shape() {
        let size = 1024;
        assert!(hann_window(0, size).abs() < 0.01);
        assert!(hann_window(size - 1, size).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_downmix_stereo_mean() {
        let interleaved = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&interleaved, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let samples = [0.1, 0.2, 0.3];
        assert_eq!(downmix(&samples, 1), samples.to_vec());
    }

    #[test]
    fn test_normalize_db_clamps() {
        assert!((normalize_db(-20.0, -20.0, 70.0)).abs() < f32::EPSILON);
        assert!((normalize_db(70.0, -20.0, 70.0) - 1.0).abs() < f32::EPSILON);
        assert!((normalize_db(25.0, -20.0, 70.0) - 0.5).abs() < 1e-6);
        assert!((normalize_db(-100.0, -20.0, 70.0)).abs() < f32::EPSILON);
        assert!((normalize_db(500.0, -20.0, 70.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_silence_magnitudes_are_floor() {
        let mut analyzer = SpectrumAnalyzer::new(256);
        let db = analyzer.magnitudes_db(&[0.0; 256]);
        assert_eq!(db.len(), 128);
        for &bin in &db {
            assert!((bin - 20.0 * DB_EPSILON.log10()).abs() < 1e-3);
        }
    }

    #[test]
    fn test_sine_concentrates_energy() {
        let size = 1024;
        let sample_rate = 48_000.0_f32;
        let target_bin = 32;
        let freq = target_bin as f32 * sample_rate / size as f32;
        let samples: Vec<f32> = (0..size)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect();
        let mut analyzer = SpectrumAnalyzer::new(size);
        let db = analyzer.magnitudes_db(&samples);
        let loudest = db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(loudest, target_bin);
    }

    #[test]
    fn test_smoother_rise_beats_fall() {
        let mut s = Smoother::new(0.65, 1.0, 1);
        let after_hit = s.apply(&[1.0])[0];
        assert!((after_hit - 0.35).abs() < 1e-6);
        // Silence decays geometrically rather than snapping to zero
        let after_silence = s.apply(&[0.0])[0];
        assert!(after_silence > 0.0);
        assert!(after_silence < after_hit);
    }

    #[test]
    fn test_smoother_peak_decay_holds_levels() {
        // With zero decay the floor equals the previous level, so silence
        // cannot pull a bar down at all
        let mut s = Smoother::new(0.5, 0.0, 1);
        s.apply(&[1.0]);
        let held = s.levels()[0];
        assert!((s.apply(&[0.0])[0] - held).abs() < 1e-6);
    }

    #[test]
    fn test_smoother_reset() {
        let mut s = Smoother::new(0.65, 1.0, 3);
        s.apply(&[1.0, 1.0, 1.0]);
        s.reset();
        assert!(s.levels().iter().all(|&l| l.abs() < f32::EPSILON));
    }
}
