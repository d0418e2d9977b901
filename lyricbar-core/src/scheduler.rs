//! Adaptive frame loop.
//!
//! The tick rate follows what is actually on screen: full rate only while
//! characters are mid-fade, a medium rate while the visualizer needs motion,
//! a slow idle rate otherwise, and a crawl when the clock has gone stale.

use crate::bridge::MessageBridge;
use crate::color::Rgb;
use crate::config::SchedulerConfig;
use crate::karaoke::TextMeasurer;
use crate::session::LyricSession;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const LOG_TARGET: &str = "lyricbar::scheduler";

/// Owned per-tick snapshot handed to the drawing surface
#[derive(Debug, Clone, PartialEq)]
pub struct LyricFrame {
    pub now: f64,
    pub connected: bool,
    pub stale: bool,
    pub song_label: String,
    pub line_text: Option<String>,
    /// `(pixel offset, color)` runs; one run per character in karaoke mode,
    /// a single run otherwise
    pub chars: Vec<(f32, Rgb)>,
    pub translation: String,
}

/// Seam to the platform window. Implementations draw frames; the scheduler
/// never touches a pixel itself.
pub trait LyricSurface {
    fn measurer(&self) -> &dyn TextMeasurer;
    fn draw(&mut self, frame: &LyricFrame);
}

pub struct FrameScheduler {
    cfg: SchedulerConfig,
    visualizer_active: Arc<AtomicBool>,
}

impl FrameScheduler {
    #[must_use]
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self {
            cfg,
            visualizer_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag the audio engine flips when bars are moving
    #[must_use]
    pub fn visualizer_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.visualizer_active)
    }

    /// Sleep until the next tick should run. Stale beats everything: a
    /// frozen clock means nothing on screen is moving, regardless of what
    /// the visualizer flag claims.
    #[must_use]
    pub fn next_delay(&self, stale: bool, mid_fade: bool) -> Duration {
        let fps = if stale {
            self.cfg.paused_fps
        } else if mid_fade {
            self.cfg.max_fps
        } else if self.visualizer_active.load(Ordering::Relaxed) {
            self.cfg.visualizer_idle_fps
        } else {
            self.cfg.idle_fps
        };
        Duration::from_secs_f64(1.0 / f64::from(fps.max(1)))
    }

    /// Drive the session until cancelled: drain the bridge, refresh, draw,
    /// sleep for the tier-appropriate delay, repeat.
    pub async fn run<S: LyricSurface>(
        self,
        mut session: LyricSession,
        mut bridge: MessageBridge,
        mut surface: S,
        cancel: CancellationToken,
    ) {
        tracing::info!(target: LOG_TARGET, "frame loop started");
        loop {
            for msg in bridge.drain() {
                session.apply(msg);
            }

            let frame = build_frame(&mut session, surface.measurer());
            let mid_fade = session.renderer().any_mid_fade(frame.now);
            let stale = frame.stale;
            surface.draw(&frame);

            let delay = self.next_delay(stale, mid_fade);
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!(target: LOG_TARGET, "frame loop stopped");
                    break;
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

fn build_frame(session: &mut LyricSession, measurer: &dyn TextMeasurer) -> LyricFrame {
    let view = session.refresh(measurer);
    let now = view.now;
    let connected = view.connected;
    let stale = view.stale;
    let song_label = view.song_label.to_string();
    let line_text = view.line.map(|line| line.text.clone());
    let translation = view.translation.to_string();
    LyricFrame {
        now,
        connected,
        stale,
        song_label,
        line_text,
        chars: session.renderer().char_colors(now),
        translation,
    }
}
