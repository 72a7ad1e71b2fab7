use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// What changed on a content item. Advisory only: subscribers re-pull the
/// authoritative aggregate rather than trusting the notification, so
/// duplicate or dropped deliveries are harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    CountersChanged,
    CommentsChanged,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::CountersChanged => "counters_changed",
            ChangeKind::CommentsChanged => "comments_changed",
        }
    }
}

const CHANNEL_CAPACITY: usize = 64;

/// Per-content-id notification bus. Each actively-watched content id owns
/// one broadcast channel, so a viewer of content A never receives or pays
/// for content B's traffic. Delivery is at-least-once and ordered per id.
#[derive(Clone, Default)]
pub struct ChangeBus {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<ChangeKind>>>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifies current subscribers of `content_id`. Sends to a channel
    /// with no live receivers are dropped and the channel is retired.
    pub fn publish(&self, content_id: &str, kind: ChangeKind) {
        let dead = {
            let guard = self.channels.read().expect("change bus lock poisoned");
            match guard.get(content_id) {
                Some(sender) => sender.send(kind).is_err(),
                None => false,
            }
        };
        if dead {
            let mut guard = self.channels.write().expect("change bus lock poisoned");
            let still_dead = guard
                .get(content_id)
                .map(|sender| sender.receiver_count() == 0)
                .unwrap_or(false);
            if still_dead {
                guard.remove(content_id);
                tracing::debug!(content_id, "retired fan-out channel with no subscribers");
            }
        } else {
            tracing::debug!(content_id, kind = kind.as_str(), "published change");
        }
    }

    pub fn subscribe(&self, content_id: &str) -> broadcast::Receiver<ChangeKind> {
        let mut guard = self.channels.write().expect("change bus lock poisoned");
        guard
            .entry(content_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Drops the channel for a purged content id; outstanding receivers
    /// observe a closed stream.
    pub fn retire(&self, content_id: &str) {
        self.channels
            .write()
            .expect("change bus lock poisoned")
            .remove(content_id);
    }

    pub fn subscriber_count(&self, content_id: &str) -> usize {
        self.channels
            .read()
            .expect("change bus lock poisoned")
            .get(content_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}
