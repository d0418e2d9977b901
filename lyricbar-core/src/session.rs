//! Session state machine tying the bridge, timelines, clock, and karaoke
//! renderer together.
//!
//! The render loop owns one [`LyricSession`], feeds it drained messages via
//! [`LyricSession::apply`], then calls [`LyricSession::refresh`] once per
//! frame to get everything the surface needs to draw.

use crate::clock::PlaybackClock;
use crate::config::{LyricbarConfig, SyncConfig};
use crate::error::Result;
use crate::karaoke::{KaraokeRenderer, LineState, TextMeasurer};
use crate::message::NetMessage;
use crate::timeline::Timeline;

const LOG_TARGET: &str = "lyricbar::session";

/// Longest song label shown before truncation
const MAX_LABEL_CHARS: usize = 80;

/// Per-frame snapshot handed to the drawing surface
#[derive(Debug)]
pub struct SessionView<'a> {
    /// Clock position the frame was computed at
    pub now: f64,
    /// True when time reports stopped arriving and the clock froze
    pub stale: bool,
    pub connected: bool,
    pub song_label: &'a str,
    pub line: Option<&'a LineState>,
    pub translation: &'a str,
}

pub struct LyricSession {
    sync: SyncConfig,
    timeline: Timeline,
    translation: Timeline,
    clock: PlaybackClock,
    renderer: KaraokeRenderer,
    song_label: String,
    translation_text: String,
    connected: bool,
    active_index: Option<usize>,
}

impl LyricSession {
    /// # Errors
    ///
    /// Returns an error if a configured karaoke color fails to parse.
    pub fn new(cfg: &LyricbarConfig) -> Result<Self> {
        Ok(Self {
            sync: cfg.sync.clone(),
            timeline: Timeline::default(),
            translation: Timeline::default(),
            clock: PlaybackClock::new(cfg.sync.stale_threshold()),
            renderer: KaraokeRenderer::new(&cfg.karaoke)?,
            song_label: String::new(),
            translation_text: String::new(),
            connected: false,
            active_index: None,
        })
    }

    /// Fold one decoded message into session state. `ping` frames are
    /// answered at the transport layer and are a no-op here.
    pub fn apply(&mut self, msg: NetMessage) {
        match msg {
            NetMessage::Song { song, artist } => {
                self.song_label = make_label(&song, &artist);
                tracing::info!(target: LOG_TARGET, song = %self.song_label, "track changed");
                // Lyric bodies arrive separately; drop the old track's now
                self.replace_lyrics("", "");
                self.clock.reset();
                self.connected = true;
            }
            NetMessage::FullLyric { lyric, tlyric } => {
                tracing::debug!(target: LOG_TARGET, "lyrics replaced for current track");
                // Same track, keep the clock running
                self.replace_lyrics(&lyric, &tlyric);
            }
            NetMessage::Time { current_time } => {
                self.clock.sync(current_time);
                self.connected = true;
            }
            NetMessage::Ping => {}
            NetMessage::Disconnect => {
                tracing::info!(target: LOG_TARGET, "player disconnected");
                self.song_label.clear();
                self.replace_lyrics("", "");
                self.clock.reset();
                self.connected = false;
            }
        }
    }

    fn replace_lyrics(&mut self, lyric: &str, tlyric: &str) {
        self.timeline = Timeline::parse(lyric);
        self.translation = Timeline::parse(tlyric);
        self.active_index = None;
        self.translation_text.clear();
        self.renderer.clear_line();
    }

    /// Advance the session to the current clock position and return the
    /// frame snapshot. Line selection and translation lookup only run when
    /// the active line actually changes; layout only reruns when the
    /// renderer marked itself dirty.
    pub fn refresh(&mut self, measurer: &dyn TextMeasurer) -> SessionView<'_> {
        let now = self.clock.now();
        let stale = self.clock.is_stale();

        let active = self.timeline.active_index(now);
        if active != self.active_index {
            self.active_index = active;
            match active {
                Some(index) => self.enter_line(index),
                None => {
                    self.renderer.clear_line();
                    self.translation_text.clear();
                }
            }
        }
        self.renderer.layout(measurer);

        SessionView {
            now,
            stale,
            connected: self.connected,
            song_label: &self.song_label,
            line: self.renderer.line(),
            translation: &self.translation_text,
        }
    }

    fn enter_line(&mut self, index: usize) {
        let Some((start, end)) = self
            .timeline
            .line_window(index, self.sync.last_line_fallback_secs)
        else {
            return;
        };
        let text = self.timeline.entries()[index].text.clone();
        tracing::trace!(target: LOG_TARGET, index, start, end, "active line changed");
        self.renderer.set_line(&text, start, end);
        self.translation_text = self
            .translation
            .nearest_within(start, self.sync.translation_match_window_secs)
            .map(|entry| entry.text.clone())
            .unwrap_or_default();
    }

    #[must_use]
    pub const fn connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.clock.is_stale()
    }

    #[must_use]
    pub fn has_lyrics(&self) -> bool {
        !self.timeline.is_empty()
    }

    #[must_use]
    pub const fn renderer(&self) -> &KaraokeRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut KaraokeRenderer {
        &mut self.renderer
    }
}

fn make_label(song: &str, artist: &str) -> String {
    format!("{song} - {artist}").chars().take(MAX_LABEL_CHARS).collect()
}
