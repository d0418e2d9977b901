//! Channel between the socket transport task and the render loop.
//!
//! The transport pushes decoded frames as fast as they arrive; the render
//! loop drains a bounded batch per tick and coalesces bursts so a flood of
//! `time` reports costs one state update, not twenty.

use crate::message::NetMessage;
use tokio::sync::mpsc;

const LOG_TARGET: &str = "lyricbar::bridge";

/// Transport-side handle; cheap to clone into connection tasks
#[derive(Debug, Clone)]
pub struct BridgeSender {
    tx: mpsc::UnboundedSender<NetMessage>,
}

impl BridgeSender {
    /// Forward a decoded message toward the render loop. Returns `false` if
    /// the bridge has been dropped.
    pub fn send(&self, msg: NetMessage) -> bool {
        if self.tx.send(msg).is_err() {
            tracing::debug!(target: LOG_TARGET, "bridge closed, frame discarded");
            return false;
        }
        true
    }
}

/// Render-loop side of the bridge
#[derive(Debug)]
pub struct MessageBridge {
    rx: mpsc::UnboundedReceiver<NetMessage>,
    batch_cap: usize,
    /// Message pulled by [`Self::recv_ready`] awaiting the next drain
    pending: Option<NetMessage>,
}

impl MessageBridge {
    #[must_use]
    pub fn new(batch_cap: usize) -> (Self, BridgeSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rx,
                batch_cap: batch_cap.max(1),
                pending: None,
            },
            BridgeSender { tx },
        )
    }

    /// Drain up to the batch cap of queued messages without blocking.
    ///
    /// Within one batch, only the newest message of each kind survives; the
    /// output preserves the order kinds were first seen in. A drained `song`
    /// followed by a newer `time` therefore still applies the track change
    /// before the position update.
    pub fn drain(&mut self) -> Vec<NetMessage> {
        let mut batch: Vec<NetMessage> = Vec::new();
        let mut carried = self.pending.take();
        for _ in 0..self.batch_cap {
            let msg = match carried.take() {
                Some(msg) => msg,
                None => match self.rx.try_recv() {
                    Ok(msg) => msg,
                    Err(_) => break,
                },
            };
            if let Some(slot) = batch.iter_mut().find(|m| m.kind() == msg.kind()) {
                *slot = msg;
            } else {
                batch.push(msg);
            }
        }
        batch
    }

    /// Wait until at least one message is queued, or the channel closes
    pub async fn recv_ready(&mut self) -> bool {
        match self.rx.recv().await {
            Some(msg) => {
                // Put the message back through the coalescing path by
                // treating it as a one-element batch prefix
                self.pending = Some(msg);
                true
            }
            None => false,
        }
    }
}
