//! Per-character karaoke progress and coloring.
//!
//! A line's animation state is derived from the clock on every tick; there
//! are no explicit transition events. Colors come from precomputed lookup
//! tables built once at construction.

use crate::color::{ColorLut, Rgb};
use crate::config::KaraokeConfig;
use crate::error::Result;
use std::f64::consts::TAU;

/// Seam to the window layer's font metrics. A monospace implementation ships
/// for tests and headless use.
pub trait TextMeasurer {
    fn char_width(&self, ch: char) -> f32;

    fn text_width(&self, text: &str) -> f32 {
        text.chars().map(|c| self.char_width(c)).sum()
    }
}

/// Fixed-advance measurer
#[derive(Debug, Clone, Copy)]
pub struct MonoMeasurer {
    pub advance: f32,
}

impl TextMeasurer for MonoMeasurer {
    fn char_width(&self, _ch: char) -> f32 {
        self.advance
    }
}

/// Where the active line is in its animation window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePhase {
    NotStarted,
    Animating,
    Settled,
}

/// Layout and timing for the active line. Owned exclusively by the render
/// layer; rebuilt only when the line or layout-affecting inputs change.
#[derive(Debug, Clone)]
pub struct LineState {
    pub line_start: f64,
    pub line_end: f64,
    pub text: String,
    /// Pixel x of the line's first glyph (centered layout)
    pub line_offset: f32,
    /// Per-character pixel offsets; empty while karaoke mode is disabled
    pub char_positions: Vec<(char, f32)>,
}

/// Karaoke engine: consumes the timeline cursor and clock position, produces
/// per-character render colors.
pub struct KaraokeRenderer {
    enabled: bool,
    max_fade: f64,
    fade_floor: f64,
    shimmer_intensity: f64,
    shimmer_phase: f64,
    base_color: Rgb,
    lut: ColorLut,
    shimmer_lut: ColorLut,
    line: Option<LineState>,
    canvas_width: f32,
    layout_dirty: bool,
}

impl KaraokeRenderer {
    /// Build the renderer and its color tables from config
    ///
    /// # Errors
    ///
    /// Returns an error if any configured color fails to parse.
    pub fn new(cfg: &KaraokeConfig) -> Result<Self> {
        let base_color = Rgb::from_hex(&cfg.base_color)?;
        let highlight = Rgb::from_hex(&cfg.highlight_color)?;
        let shimmer = Rgb::from_hex(&cfg.shimmer_color)?;
        Ok(Self {
            enabled: cfg.enabled,
            max_fade: cfg.max_fade_secs,
            fade_floor: cfg.fade_floor_secs,
            shimmer_intensity: cfg.shimmer_intensity.clamp(0.0, 1.0),
            shimmer_phase: cfg.shimmer_phase_offset,
            base_color,
            lut: ColorLut::build(base_color, highlight, cfg.color_lut_steps),
            shimmer_lut: ColorLut::build(highlight, shimmer, cfg.shimmer_lut_steps),
            line: None,
            canvas_width: 0.0,
            layout_dirty: true,
        })
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.layout_dirty = true;
        }
    }

    pub fn set_canvas_width(&mut self, width: f32) {
        if (self.canvas_width - width).abs() > f32::EPSILON {
            self.canvas_width = width;
            self.layout_dirty = true;
        }
    }

    /// Force a layout rebuild on the next [`Self::layout`] call
    pub fn invalidate_layout(&mut self) {
        self.layout_dirty = true;
    }

    /// Install a new active line and mark its layout stale
    pub fn set_line(&mut self, text: &str, line_start: f64, line_end: f64) {
        self.line = Some(LineState {
            line_start,
            // Degenerate windows get a tiny positive duration
            line_end: line_end.max(line_start + 0.01),
            text: text.to_string(),
            line_offset: 0.0,
            char_positions: Vec::new(),
        });
        self.layout_dirty = true;
    }

    pub fn clear_line(&mut self) {
        self.line = None;
        self.layout_dirty = true;
    }

    #[must_use]
    pub const fn line(&self) -> Option<&LineState> {
        self.line.as_ref()
    }

    /// Recompute character pixel offsets if layout-affecting inputs changed.
    /// Cheap no-op otherwise.
    pub fn layout(&mut self, measurer: &dyn TextMeasurer) {
        if !self.layout_dirty {
            return;
        }
        self.layout_dirty = false;
        let enabled = self.enabled;
        let canvas_width = self.canvas_width;
        let Some(line) = self.line.as_mut() else {
            return;
        };
        let total = measurer.text_width(&line.text);
        let mut x = (canvas_width - total) / 2.0;
        line.line_offset = x;
        line.char_positions.clear();
        if enabled {
            for ch in line.text.chars() {
                line.char_positions.push((ch, x));
                x += measurer.char_width(ch);
            }
        }
    }

    /// Animation fraction in [0, 1] for character `index` at clock time `now`
    #[must_use]
    pub fn char_progress(&self, now: f64, index: usize) -> f64 {
        let Some(line) = &self.line else {
            return 0.0;
        };
        let (delay, fade) = self.char_timing(line);
        #[allow(clippy::cast_precision_loss)]
        let char_start = line.line_start + index as f64 * delay;
        ((now - char_start) / fade).clamp(0.0, 1.0)
    }

    /// Derived line state at clock time `now`
    #[must_use]
    pub fn phase(&self, now: f64) -> LinePhase {
        let Some(line) = &self.line else {
            return LinePhase::Settled;
        };
        let (_, fade) = self.char_timing(line);
        if now < line.line_start {
            LinePhase::NotStarted
        } else if now > line.line_end + fade {
            LinePhase::Settled
        } else {
            LinePhase::Animating
        }
    }

    /// Per-character `(pixel offset, color)` pairs for the active line.
    ///
    /// With karaoke disabled this collapses to a single base-color run at the
    /// line offset.
    #[must_use]
    pub fn char_colors(&self, now: f64) -> Vec<(f32, Rgb)> {
        let Some(line) = &self.line else {
            return Vec::new();
        };
        if !self.enabled {
            return vec![(line.line_offset, self.base_color)];
        }
        let (delay, fade) = self.char_timing(line);
        let mut out = Vec::with_capacity(line.char_positions.len());
        for (i, &(_, x)) in line.char_positions.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let char_start = line.line_start + i as f64 * delay;
            let progress = ((now - char_start) / fade).clamp(0.0, 1.0);
            let mut color = self.lut.sample(progress);
            if self.shimmer_intensity > 0.0 && progress > 0.5 {
                #[allow(clippy::cast_precision_loss)]
                let wave = (now * TAU + i as f64 * self.shimmer_phase).sin().max(0.0);
                let strength = self.shimmer_intensity * wave;
                color = color.lerp(self.shimmer_lut.sample(strength), strength);
            }
            out.push((x, color));
        }
        out
    }

    /// Whether any character is mid-fade at `now`, judged from a small
    /// representative sample (first, last, quartiles) rather than every
    /// character. Can under-detect motion on pathological lines; that costs a
    /// briefly lower frame rate, not correctness.
    #[must_use]
    pub fn any_mid_fade(&self, now: f64) -> bool {
        let Some(line) = &self.line else {
            return false;
        };
        if !self.enabled || self.phase(now) != LinePhase::Animating {
            return false;
        }
        let n = line.text.chars().count();
        if n == 0 {
            return false;
        }
        let samples = [0, n / 4, n / 2, 3 * n / 4, n - 1];
        samples.iter().any(|&i| {
            let p = self.char_progress(now, i);
            p > 0.0 && p < 1.0
        })
    }

    /// `(char_delay, fade_duration)` for a line.
    ///
    /// The fade is capped at 0.9 of the per-character delay so adjacent fade
    /// windows never fully overlap on very fast lines.
    fn char_timing(&self, line: &LineState) -> (f64, f64) {
        let chars = line.text.chars().count().max(1);
        #[allow(clippy::cast_precision_loss)]
        let delay = (line.line_end - line.line_start) / chars as f64;
        let fade = self.max_fade.min(self.fade_floor.max(delay * 0.9));
        (delay, fade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> KaraokeRenderer {
        let mut r = KaraokeRenderer::new(&KaraokeConfig::default()).unwrap();
        r.set_canvas_width(800.0);
        r
    }

    const MONO: MonoMeasurer = MonoMeasurer { advance: 10.0 };

    #[test]
    fn test_progress_monotonic_and_saturating() {
        let mut r = renderer();
        // 10 chars over 5 seconds: delay 0.5s, fade = min(0.25, 0.45) = 0.25
        r.set_line("abcdefghij", 10.0, 15.0);
        let mut last = -1.0;
        let mut t = 9.5;
        while t < 16.0 {
            let p = r.char_progress(t, 3);
            assert!(p >= last, "progress regressed at t={t}");
            assert!((0.0..=1.0).contains(&p));
            last = p;
            t += 0.01;
        }
        // Char 3 starts at 11.5; saturated 1.0 after start + fade
        assert!((r.char_progress(11.5 + 0.25, 3) - 1.0).abs() < 1e-9);
        assert!(r.char_progress(11.4, 3) < f64::EPSILON);
    }

    #[test]
    fn test_fade_capped_below_char_delay() {
        let mut r = renderer();
        // 10 chars over 1 second: delay 0.1s, fade = min(0.25, max(0.05, 0.09)) = 0.09
        r.set_line("abcdefghij", 0.0, 1.0);
        // Char 0 must be fully faded before char 1 reaches full progress
        assert!((r.char_progress(0.09, 0) - 1.0).abs() < 1e-9);
        assert!(r.char_progress(0.09, 1) < 1.0);
    }

    #[test]
    fn test_fade_floor_on_absurdly_fast_lines() {
        let mut r = renderer();
        // 50 chars over 0.5s: delay 0.01, 0.9*delay below the 0.05 floor
        let text: String = "x".repeat(50);
        r.set_line(&text, 0.0, 0.5);
        // At the floor, a char still takes 0.05s to fade
        assert!(r.char_progress(0.025, 0) < 1.0);
        assert!((r.char_progress(0.05, 0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_phase_transitions() {
        let mut r = renderer();
        r.set_line("hello", 10.0, 12.0);
        assert_eq!(r.phase(9.0), LinePhase::NotStarted);
        assert_eq!(r.phase(10.5), LinePhase::Animating);
        assert_eq!(r.phase(13.0), LinePhase::Settled);
    }

    #[test]
    fn test_layout_centered_positions() {
        let mut r = renderer();
        r.set_line("abcd", 0.0, 4.0);
        r.layout(&MONO);
        let line = r.line().unwrap();
        // 4 chars * 10px = 40px, centered in 800px canvas
        assert!((line.line_offset - 380.0).abs() < f32::EPSILON);
        let xs: Vec<f32> = line.char_positions.iter().map(|&(_, x)| x).collect();
        assert_eq!(xs, vec![380.0, 390.0, 400.0, 410.0]);
    }

    #[test]
    fn test_layout_cached_until_invalidated() {
        let mut r = renderer();
        r.set_line("ab", 0.0, 2.0);
        r.layout(&MONO);
        // A wider measurer without invalidation changes nothing
        r.layout(&MonoMeasurer { advance: 99.0 });
        assert!((r.line().unwrap().char_positions[1].1 - 390.0).abs() < f32::EPSILON);
        // Canvas width change dirties the layout
        r.set_canvas_width(400.0);
        r.layout(&MONO);
        assert!((r.line().unwrap().line_offset - 190.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_disabled_mode_single_run() {
        let mut r = renderer();
        r.set_enabled(false);
        r.set_line("hello", 0.0, 5.0);
        r.layout(&MONO);
        assert!(r.line().unwrap().char_positions.is_empty());
        let colors = r.char_colors(2.5);
        assert_eq!(colors.len(), 1);
        assert_eq!(colors[0].1, Rgb::from_hex("#E6E6FA").unwrap());
        assert!(!r.any_mid_fade(2.5));
    }

    #[test]
    fn test_char_colors_progress_gradient() {
        let mut r = renderer();
        r.set_line("abcdefghij", 0.0, 10.0);
        r.layout(&MONO);
        let colors = r.char_colors(5.0);
        assert_eq!(colors.len(), 10);
        // Chars well past their window carry the highlight, far future ones the base
        let highlight = Rgb::from_hex("#FFD700").unwrap();
        let base = Rgb::from_hex("#E6E6FA").unwrap();
        assert_eq!(colors[0].1, highlight);
        assert_eq!(colors[9].1, base);
    }

    #[test]
    fn test_mid_fade_sampling() {
        let mut r = renderer();
        r.set_line("abcdefghij", 0.0, 10.0);
        // First char fading right after line start
        assert!(r.any_mid_fade(0.1));
        // Between fades (char 0 settled at 0.25, char 1 starts at 1.0)
        assert!(!r.any_mid_fade(0.6));
        // Outside the line window entirely
        assert!(!r.any_mid_fade(20.0));
    }

    #[test]
    fn test_shimmer_blends_toward_shimmer_color() {
        let cfg = KaraokeConfig {
            shimmer_intensity: 1.0,
            ..KaraokeConfig::default()
        };
        let mut r = KaraokeRenderer::new(&cfg).unwrap();
        r.set_canvas_width(800.0);
        r.set_line("ab", 0.0, 2.0);
        r.layout(&MONO);
        // now = 0.25: char 0 fully progressed and sin(now * TAU) = 1, so full
        // intensity blends the highlight all the way to the shimmer color
        let colors = r.char_colors(0.25);
        assert_eq!(colors[0].1, Rgb::from_hex("#FFFFFF").unwrap());
    }

    #[test]
    fn test_no_line_is_inert() {
        let r = renderer();
        assert!(r.char_colors(1.0).is_empty());
        assert!(!r.any_mid_fade(1.0));
        assert_eq!(r.phase(1.0), LinePhase::Settled);
    }
}
