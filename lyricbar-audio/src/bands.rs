//! Geometric frequency-band partition of FFT bins.
//!
//! Bands are spaced geometrically so each visual bar spans a comparable
//! perceptual range; linear spacing would bury everything below 1 kHz in the
//! first bar or two.

use tracing::debug;

const LOG_TARGET: &str = "lyricbar::bands";

/// Maps FFT bins to visualizer bars. Built once per stream configuration;
/// lookup is a slice scan per band.
#[derive(Debug, Clone)]
pub struct BandPartition {
    /// Half-open bin ranges per band, fallback bands resolved to one bin
    ranges: Vec<(usize, usize)>,
}

impl BandPartition {
    /// Partition `chunk_size / 2` bins into `num_bars` geometric bands over
    /// `freq_min..min(freq_max, Nyquist)`.
    ///
    /// Bands too narrow to own a bin borrow the bin nearest their center,
    /// so every band always reports a level.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(
        num_bars: usize,
        chunk_size: usize,
        sample_rate: f64,
        freq_min: f64,
        freq_max: f64,
    ) -> Self {
        let half = (chunk_size / 2).max(1);
        let nyquist = sample_rate / 2.0;
        let lo_limit = freq_min.max(1.0);
        let hi_limit = freq_max.min(nyquist).max(lo_limit * 2.0);
        let bin_hz = sample_rate / chunk_size as f64;
        let ratio = (hi_limit / lo_limit).powf(1.0 / num_bars.max(1) as f64);

        let mut ranges = Vec::with_capacity(num_bars);
        let mut lo = lo_limit;
        for _ in 0..num_bars {
            let hi = lo * ratio;
            let start = ((lo / bin_hz).ceil() as usize).min(half);
            let end = ((hi / bin_hz).ceil() as usize).clamp(start, half);
            if start < end {
                ranges.push((start, end));
            } else {
                // Band narrower than one bin: use the bin nearest its center
                let center = (lo + hi) / 2.0;
                let nearest = ((center / bin_hz).round() as usize).min(half - 1);
                ranges.push((nearest, nearest + 1));
            }
            lo = hi;
        }
        debug!(
            target: LOG_TARGET,
            num_bars,
            chunk_size,
            sample_rate,
            "band partition built"
        );
        Self { ranges }
    }

    #[must_use]
    pub fn num_bands(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn bin_range(&self, band: usize) -> (usize, usize) {
        self.ranges[band]
    }

    /// Per-band level: the loudest bin inside each band's range
    #[must_use]
    pub fn band_levels_db(&self, magnitudes_db: &[f32]) -> Vec<f32> {
        self.ranges
            .iter()
            .map(|&(start, end)| {
                magnitudes_db[start.min(magnitudes_db.len())..end.min(magnitudes_db.len())]
                    .iter()
                    .copied()
                    .fold(f32::NEG_INFINITY, f32::max)
            })
            .map(|db| if db.is_finite() { db } else { 0.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition() -> BandPartition {
        BandPartition::new(30, 2048, 48_000.0, 20.0, 20_000.0)
    }

    #[test]
    fn test_every_band_owns_at_least_one_bin() {
        let p = partition();
        assert_eq!(p.num_bands(), 30);
        for band in 0..p.num_bands() {
            let (start, end) = p.bin_range(band);
            assert!(start < end, "band {band} is empty");
            assert!(end <= 1024);
        }
    }

    #[test]
    fn test_wide_bands_tile_without_overlap() {
        let p = partition();
        let mut prev_end = 0;
        for band in 0..p.num_bands() {
            let (start, end) = p.bin_range(band);
            // Fallback bands may reuse a neighbor's bin; wide bands must not
            if end - start > 1 {
                assert!(start >= prev_end, "band {band} overlaps its predecessor");
            }
            prev_end = prev_end.max(end);
        }
    }

    #[test]
    fn test_bands_are_geometric() {
        let p = partition();
        // The top band spans far more bins than a middle one
        let (mid_start, mid_end) = p.bin_range(15);
        let (top_start, top_end) = p.bin_range(29);
        assert!(top_end - top_start > (mid_end - mid_start) * 2);
    }

    #[test]
    fn test_nyquist_caps_the_range() {
        // 8 kHz sample rate: Nyquist 4 kHz, well under the 20 kHz request
        let p = BandPartition::new(10, 512, 8_000.0, 20.0, 20_000.0);
        for band in 0..p.num_bands() {
            let (_, end) = p.bin_range(band);
            assert!(end <= 256);
        }
    }

    #[test]
    fn test_band_levels_take_the_loudest_bin() {
        let p = BandPartition::new(4, 64, 8_000.0, 100.0, 4_000.0);
        let mut mags = vec![-80.0_f32; 32];
        let (start, end) = p.bin_range(2);
        mags[start] = -10.0;
        if end - start > 1 {
            mags[end - 1] = -5.0;
        }
        let levels = p.band_levels_db(&mags);
        assert_eq!(levels.len(), 4);
        let expected = if end - start > 1 { -5.0 } else { -10.0 };
        assert!((levels[2] - expected).abs() < f32::EPSILON);
    }
}
