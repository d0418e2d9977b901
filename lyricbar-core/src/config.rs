use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LyricbarConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub karaoke: KaraokeConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub spectrum: SpectrumConfig,
}

/// Timing policy for the playback clock and translation alignment.
///
/// These values are behavior policy rather than protocol, so they are
/// configurable instead of hard constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How long to extrapolate past the last time sync before freezing (ms)
    #[serde(default = "default_stale_threshold_ms")]
    pub stale_threshold_ms: u64,
    /// Animation window granted to the final lyric line (seconds)
    #[serde(default = "default_last_line_fallback")]
    pub last_line_fallback_secs: f64,
    /// Maximum |primary - translation| timestamp difference to pair lines (seconds)
    #[serde(default = "default_match_window")]
    pub translation_match_window_secs: f64,
    /// Maximum number of queued messages applied per scheduler tick
    #[serde(default = "default_batch_cap")]
    pub message_batch_cap: usize,
}

const fn default_stale_threshold_ms() -> u64 {
    800
}

const fn default_last_line_fallback() -> f64 {
    3.0
}

const fn default_match_window() -> f64 {
    0.6
}

const fn default_batch_cap() -> usize {
    20
}

impl SyncConfig {
    /// Stale threshold as a [`Duration`]
    #[must_use]
    pub const fn stale_threshold(&self) -> Duration {
        Duration::from_millis(self.stale_threshold_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            stale_threshold_ms: default_stale_threshold_ms(),
            last_line_fallback_secs: default_last_line_fallback(),
            translation_match_window_secs: default_match_window(),
            message_batch_cap: default_batch_cap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KaraokeConfig {
    /// Per-character gradient animation on/off; off renders whole-line base color
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_base_color")]
    pub base_color: String,
    #[serde(default = "default_highlight_color")]
    pub highlight_color: String,
    #[serde(default = "default_shimmer_color")]
    pub shimmer_color: String,
    /// Upper bound on a single character's fade window (seconds)
    #[serde(default = "default_max_fade")]
    pub max_fade_secs: f64,
    /// Lower bound on a single character's fade window (seconds)
    #[serde(default = "default_fade_floor")]
    pub fade_floor_secs: f64,
    /// Shimmer blend intensity in [0, 1]; 0 disables shimmer entirely
    #[serde(default)]
    pub shimmer_intensity: f64,
    /// Per-character phase offset for the shimmer oscillation (radians)
    #[serde(default = "default_shimmer_phase")]
    pub shimmer_phase_offset: f64,
    #[serde(default = "default_color_lut_steps")]
    pub color_lut_steps: usize,
    #[serde(default = "default_shimmer_lut_steps")]
    pub shimmer_lut_steps: usize,
}

const fn default_true() -> bool {
    true
}

fn default_base_color() -> String {
    "#E6E6FA".to_string()
}

fn default_highlight_color() -> String {
    "#FFD700".to_string()
}

fn default_shimmer_color() -> String {
    "#FFFFFF".to_string()
}

const fn default_max_fade() -> f64 {
    0.25
}

const fn default_fade_floor() -> f64 {
    0.05
}

const fn default_shimmer_phase() -> f64 {
    0.6
}

const fn default_color_lut_steps() -> usize {
    100
}

const fn default_shimmer_lut_steps() -> usize {
    50
}

impl Default for KaraokeConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_color: default_base_color(),
            highlight_color: default_highlight_color(),
            shimmer_color: default_shimmer_color(),
            max_fade_secs: default_max_fade(),
            fade_floor_secs: default_fade_floor(),
            shimmer_intensity: 0.0,
            shimmer_phase_offset: default_shimmer_phase(),
            color_lut_steps: default_color_lut_steps(),
            shimmer_lut_steps: default_shimmer_lut_steps(),
        }
    }
}

/// Adaptive frame-pacing tiers for the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Rate while any character is mid-fade
    #[serde(default = "default_max_fps")]
    pub max_fps: u32,
    /// Rate while text is static and the visualizer is off
    #[serde(default = "default_idle_fps")]
    pub idle_fps: u32,
    /// Idle rate while the visualizer is active (keeps bars smooth)
    #[serde(default = "default_visualizer_idle_fps")]
    pub visualizer_idle_fps: u32,
    /// Rate while the clock is stale (paused/disconnected)
    #[serde(default = "default_paused_fps")]
    pub paused_fps: u32,
}

const fn default_max_fps() -> u32 {
    60
}

const fn default_idle_fps() -> u32 {
    10
}

const fn default_visualizer_idle_fps() -> u32 {
    30
}

const fn default_paused_fps() -> u32 {
    2
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_fps: default_max_fps(),
            idle_fps: default_idle_fps(),
            visualizer_idle_fps: default_visualizer_idle_fps(),
            paused_fps: default_paused_fps(),
        }
    }
}

/// Audio capture and spectrum analysis tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// FFT block size in samples (power of two)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_min_db")]
    pub min_db: f32,
    #[serde(default = "default_max_db")]
    pub max_db: f32,
    /// Temporal smoothing factor; higher = slower response
    #[serde(default = "default_smooth_alpha")]
    pub smooth_alpha: f32,
    /// Per-chunk peak decay applied to the previous level before the rise test
    #[serde(default = "default_peak_decay")]
    pub peak_decay: f32,
    /// Maximum callback delivery rate (Hz)
    #[serde(default = "default_throttle_hz")]
    pub throttle_hz: u32,
    #[serde(default = "default_freq_min")]
    pub freq_min_hz: f64,
    #[serde(default = "default_freq_max")]
    pub freq_max_hz: f64,
    /// Blocking sample-read timeout; also bounds stop-flag observation latency (ms)
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Consecutive read failures tolerated before re-entering the device fallback chain
    #[serde(default = "default_max_read_failures")]
    pub max_read_failures: u32,
}

const fn default_chunk_size() -> usize {
    2048
}

const fn default_min_db() -> f32 {
    -20.0
}

const fn default_max_db() -> f32 {
    70.0
}

const fn default_smooth_alpha() -> f32 {
    0.65
}

const fn default_peak_decay() -> f32 {
    1.0
}

const fn default_throttle_hz() -> u32 {
    30
}

const fn default_freq_min() -> f64 {
    20.0
}

const fn default_freq_max() -> f64 {
    20_000.0
}

const fn default_read_timeout_ms() -> u64 {
    100
}

const fn default_max_read_failures() -> u32 {
    50
}

impl SpectrumConfig {
    /// Read timeout as a [`Duration`]
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Minimum interval between level callbacks
    #[must_use]
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.throttle_hz.max(1)))
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            min_db: default_min_db(),
            max_db: default_max_db(),
            smooth_alpha: default_smooth_alpha(),
            peak_decay: default_peak_decay(),
            throttle_hz: default_throttle_hz(),
            freq_min_hz: default_freq_min(),
            freq_max_hz: default_freq_max(),
            read_timeout_ms: default_read_timeout_ms(),
            max_read_failures: default_max_read_failures(),
        }
    }
}

impl LyricbarConfig {
    /// Get the configuration directory path (~/.config/lyricbar/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/lyricbar/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file or create a commented template on first run
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or
    /// [`CoreError::ConfigNotFound`] after writing the template.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&config_path, CONFIG_TEMPLATE)?;
            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] for out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if self.spectrum.chunk_size == 0 || !self.spectrum.chunk_size.is_power_of_two() {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "spectrum.chunk_size must be a power of two, got {}",
                    self.spectrum.chunk_size
                ),
            });
        }
        if self.spectrum.max_db <= self.spectrum.min_db {
            return Err(CoreError::ConfigInvalid {
                message: "spectrum.max_db must be greater than spectrum.min_db".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.spectrum.smooth_alpha) {
            return Err(CoreError::ConfigInvalid {
                message: "spectrum.smooth_alpha must be within [0, 1]".to_string(),
            });
        }
        if self.sync.message_batch_cap == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "sync.message_batch_cap must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

const CONFIG_TEMPLATE: &str = r##"# lyricbar Configuration
# ~/.config/lyricbar/config.toml

[sync]
# Extrapolation cutoff after the last time update; past this the clock freezes
stale_threshold_ms = 800
# Animation window for the final lyric line (no next line to bound it)
last_line_fallback_secs = 3.0
# Maximum timestamp distance for pairing a translation line with a primary line
translation_match_window_secs = 0.6
message_batch_cap = 20

[karaoke]
enabled = true
base_color = "#E6E6FA"
highlight_color = "#FFD700"
shimmer_color = "#FFFFFF"
max_fade_secs = 0.25
fade_floor_secs = 0.05
# 0.0 disables the shimmer pass
shimmer_intensity = 0.0
shimmer_phase_offset = 0.6
color_lut_steps = 100
shimmer_lut_steps = 50

[scheduler]
max_fps = 60
idle_fps = 10
visualizer_idle_fps = 30
paused_fps = 2

[spectrum]
chunk_size = 2048
min_db = -20.0
max_db = 70.0
smooth_alpha = 0.65
peak_decay = 1.0
throttle_hz = 30
freq_min_hz = 20.0
freq_max_hz = 20000.0
read_timeout_ms = 100
max_read_failures = 50
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: LyricbarConfig = toml::from_str("").unwrap();
        assert_eq!(config.sync.stale_threshold_ms, 800);
        assert!((config.sync.translation_match_window_secs - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.karaoke.color_lut_steps, 100);
        assert_eq!(config.scheduler.max_fps, 60);
        assert_eq!(config.spectrum.chunk_size, 2048);
        config.validate().unwrap();
    }

    #[test]
    fn test_template_parses_and_matches_defaults() {
        let config: LyricbarConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        let defaults = LyricbarConfig::default();
        assert_eq!(config.sync.stale_threshold_ms, defaults.sync.stale_threshold_ms);
        assert_eq!(config.karaoke.base_color, defaults.karaoke.base_color);
        assert_eq!(config.scheduler.idle_fps, defaults.scheduler.idle_fps);
        assert!((config.spectrum.smooth_alpha - defaults.spectrum.smooth_alpha).abs() < f32::EPSILON);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_override() {
        let config: LyricbarConfig = toml::from_str(
            r#"
[sync]
stale_threshold_ms = 1200

[scheduler]
max_fps = 120
"#,
        )
        .unwrap();
        assert_eq!(config.sync.stale_threshold_ms, 1200);
        assert_eq!(config.scheduler.max_fps, 120);
        // Untouched sections keep defaults
        assert_eq!(config.scheduler.paused_fps, 2);
        assert_eq!(config.spectrum.throttle_hz, 30);
    }

    #[test]
    fn test_validate_rejects_bad_chunk_size() {
        let mut config = LyricbarConfig::default();
        config.spectrum.chunk_size = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_db_range() {
        let mut config = LyricbarConfig::default();
        config.spectrum.max_db = -40.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stale_threshold_duration() {
        let config = SyncConfig::default();
        assert_eq!(config.stale_threshold(), Duration::from_millis(800));
    }

    #[test]
    fn test_throttle_interval() {
        let config = SpectrumConfig::default();
        let interval = config.throttle_interval();
        assert!((interval.as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }
}
