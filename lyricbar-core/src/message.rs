//! Wire messages exchanged with the player plugin.
//!
//! The transport is newline-delimited JSON with a `type` discriminator.
//! Malformed frames are logged and dropped; the session never sees them.

use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "lyricbar::message";

/// Reply sent for every `ping` frame
pub const PONG: &str = "{\"type\":\"pong\"}";

/// Inbound frame from the player plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetMessage {
    /// Track change; lyric bodies follow separately as `full_lyric`
    Song {
        #[serde(default)]
        song: String,
        #[serde(default)]
        artist: String,
    },
    /// Wholesale lyric replacement for the current track
    FullLyric {
        #[serde(default)]
        lyric: String,
        #[serde(default)]
        tlyric: String,
    },
    /// Playback position report
    Time {
        #[serde(rename = "currentTime")]
        current_time: f64,
    },
    /// Liveness probe; answered with [`PONG`]
    Ping,
    /// Player is going away
    Disconnect,
}

/// Coalescing key: within one drain batch only the newest message of each
/// kind is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Song,
    FullLyric,
    Time,
    Ping,
    Disconnect,
}

impl NetMessage {
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Song { .. } => MessageKind::Song,
            Self::FullLyric { .. } => MessageKind::FullLyric,
            Self::Time { .. } => MessageKind::Time,
            Self::Ping => MessageKind::Ping,
            Self::Disconnect => MessageKind::Disconnect,
        }
    }

    /// Parse a single frame, returning `None` for anything malformed or of
    /// unknown type
    #[must_use]
    pub fn decode(frame: &str) -> Option<Self> {
        let frame = frame.trim();
        if frame.is_empty() {
            return None;
        }
        match serde_json::from_str(frame) {
            Ok(msg) => Some(msg),
            Err(e) => {
                tracing::warn!(target: LOG_TARGET, error = %e, "dropping malformed frame");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_time() {
        let msg = NetMessage::decode(r#"{"type":"time","currentTime":42.5}"#).unwrap();
        assert_eq!(msg, NetMessage::Time { current_time: 42.5 });
        assert_eq!(msg.kind(), MessageKind::Time);
    }

    #[test]
    fn test_decode_song_with_missing_fields() {
        let msg = NetMessage::decode(r#"{"type":"song","song":"Test"}"#).unwrap();
        match msg {
            NetMessage::Song { song, artist } => {
                assert_eq!(song, "Test");
                assert!(artist.is_empty());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_decode_ping_and_disconnect() {
        assert_eq!(
            NetMessage::decode(r#"{"type":"ping"}"#),
            Some(NetMessage::Ping)
        );
        assert_eq!(
            NetMessage::decode("{\"type\":\"disconnect\"}\n"),
            Some(NetMessage::Disconnect)
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(NetMessage::decode(""), None);
        assert_eq!(NetMessage::decode("   "), None);
        assert_eq!(NetMessage::decode("not json"), None);
        assert_eq!(NetMessage::decode(r#"{"type":"warp_drive"}"#), None);
        // Wrong payload shape for a known type
        assert_eq!(NetMessage::decode(r#"{"type":"time"}"#), None);
    }

    #[test]
    fn test_pong_is_valid_json() {
        let v: serde_json::Value = serde_json::from_str(PONG).unwrap();
        assert_eq!(v["type"], "pong");
    }
}
