//! Render-side bar smoothing with peak hold.
//!
//! The engine already smooths levels temporally; this second stage runs in
//! the window layer at frame rate, easing bar motion between engine updates
//! and tracking a slowly falling peak marker per bar.

/// Frame-rate exponential ease toward the latest engine levels
const EASE_NEW: f32 = 0.7;
const EASE_OLD: f32 = 0.3;
/// Peak marker decay per frame
const PEAK_HOLD: f32 = 0.98;
/// Fresh-level weight competing with the held peak
const PEAK_RISE: f32 = 0.9;

#[derive(Debug, Clone)]
pub struct BarState {
    smooth: Vec<f32>,
    peaks: Vec<f32>,
}

impl BarState {
    #[must_use]
    pub fn new(num_bars: usize) -> Self {
        Self {
            smooth: vec![0.0; num_bars],
            peaks: vec![0.0; num_bars],
        }
    }

    /// Fold one frame of engine levels into the eased bars and peak markers
    pub fn update(&mut self, levels: &[f32]) {
        for ((smooth, peak), &new) in self.smooth.iter_mut().zip(&mut self.peaks).zip(levels) {
            *smooth = EASE_NEW * new + EASE_OLD * *smooth;
            *peak = (PEAK_RISE * *smooth).max(PEAK_HOLD * *peak);
        }
    }

    #[must_use]
    pub fn levels(&self) -> &[f32] {
        &self.smooth
    }

    #[must_use]
    pub fn peaks(&self) -> &[f32] {
        &self.peaks
    }

    /// True while any bar is visibly above rest
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.smooth.iter().any(|&v| v > 0.01)
    }

    pub fn reset(&mut self) {
        self.smooth.fill(0.0);
        self.peaks.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_eases_toward_input() {
        let mut bars = BarState::new(1);
        bars.update(&[1.0]);
        assert!((bars.levels()[0] - 0.7).abs() < 1e-6);
        bars.update(&[1.0]);
        assert!((bars.levels()[0] - 0.91).abs() < 1e-6);
    }

    #[test]
    fn test_peak_outlives_the_level() {
        let mut bars = BarState::new(1);
        bars.update(&[1.0]);
        let peak_after_hit = bars.peaks()[0];
        for _ in 0..5 {
            bars.update(&[0.0]);
        }
        // Level has collapsed but the marker is still falling slowly
        assert!(bars.levels()[0] < 0.01);
        assert!(bars.peaks()[0] > peak_after_hit * 0.8);
    }

    #[test]
    fn test_activity_flag() {
        let mut bars = BarState::new(4);
        assert!(!bars.is_active());
        bars.update(&[0.0, 0.5, 0.0, 0.0]);
        assert!(bars.is_active());
        bars.reset();
        assert!(!bars.is_active());
    }
}
