//! Drift-compensated playback clock extrapolating between sparse network updates.

use std::time::{Duration, Instant};

/// Playback clock anchored to the last server-reported position.
///
/// The network layer delivers position updates at irregular, possibly
/// throttled intervals; local extrapolation between updates keeps per-frame
/// animation smooth, while the staleness cutoff stops extrapolation from
/// running past a genuine pause or disconnect.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    server_time: f64,
    anchor: Instant,
    stale_threshold: Duration,
}

impl PlaybackClock {
    /// Create a zeroed clock. The zero anchor counts as already written, so a
    /// freshly created clock goes stale (frozen at 0.0) after the threshold.
    #[must_use]
    pub fn new(stale_threshold: Duration) -> Self {
        Self {
            server_time: 0.0,
            anchor: Instant::now(),
            stale_threshold,
        }
    }

    /// Record a server-reported playback position. Last write wins; arrival
    /// order does not matter because the local anchor is taken fresh here.
    pub fn sync(&mut self, server_time: f64) {
        self.server_time = server_time;
        self.anchor = Instant::now();
    }

    /// Reset to position zero (song change / disconnect)
    pub fn reset(&mut self) {
        self.sync(0.0);
    }

    /// Current extrapolated playback position in seconds.
    ///
    /// Frozen at the last synced position once the anchor is older than the
    /// stale threshold; staleness is a first-class paused state, not an error.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now_at(Instant::now())
    }

    /// Whether the last sync is too old to trust continued extrapolation
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale_at(Instant::now())
    }

    fn now_at(&self, at: Instant) -> f64 {
        let elapsed = at.saturating_duration_since(self.anchor);
        if elapsed > self.stale_threshold {
            self.server_time
        } else {
            self.server_time + elapsed.as_secs_f64()
        }
    }

    fn stale_at(&self, at: Instant) -> bool {
        at.saturating_duration_since(self.anchor) > self.stale_threshold
    }
}
