pub mod bridge;
pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod karaoke;
pub mod message;
pub mod paths;
pub mod scheduler;
pub mod session;
pub mod timeline;

pub use bridge::{BridgeSender, MessageBridge};
pub use clock::PlaybackClock;
pub use color::{ColorLut, Rgb};
pub use config::{
    KaraokeConfig, LyricbarConfig, SchedulerConfig, SpectrumConfig, SyncConfig,
};
pub use error::{CoreError, Result};
pub use karaoke::{KaraokeRenderer, LinePhase, LineState, MonoMeasurer, TextMeasurer};
pub use message::{MessageKind, NetMessage, PONG};
pub use paths::{config_dir, config_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use scheduler::{FrameScheduler, LyricFrame, LyricSurface};
pub use session::{LyricSession, SessionView};
pub use timeline::{LyricEntry, Timeline};
