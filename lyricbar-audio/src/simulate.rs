//! Deterministic pseudo-spectrum for when no capture device exists.
//!
//! A phase accumulator sweeps a sine across the bars while seeded jitter
//! keeps them lively; an occasional full-scale peak mimics a transient.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Simulated time advance per frame (seconds)
const TIME_STEP: f64 = 0.05;
/// Chance per frame of injecting one full-scale bar
const PEAK_CHANCE: f64 = 0.1;

pub struct SimulatedSpectrum {
    rng: SmallRng,
    time: f64,
    num_bars: usize,
}

impl SimulatedSpectrum {
    #[must_use]
    pub fn new(num_bars: usize, seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            time: 0.0,
            num_bars: num_bars.max(1),
        }
    }

    /// Produce the next frame of normalized bar levels in [0, 1]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn next_frame(&mut self) -> Vec<f32> {
        self.time += TIME_STEP;
        let sweep = 5.0 + 4.0 * (0.3 * self.time).sin();

        let mut raw: Vec<f64> = (0..self.num_bars)
            .map(|i| {
                let freq = i as f64 / self.num_bars as f64;
                let wave = 0.5 * (self.time * freq * sweep).sin().abs();
                wave + self.rng.random::<f64>() * 0.3
            })
            .collect();

        if self.rng.random::<f64>() < PEAK_CHANCE {
            let index = self.rng.random_range(0..self.num_bars);
            raw[index] = 1.0;
        }

        let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
        let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;
        raw.iter()
            .map(|&v| {
                if span > f64::EPSILON {
                    ((v - min) / span) as f32
                } else {
                    0.0
                }
            })
            .collect()
    }
}
