//! Topic-based fan-out over per-connection channels.
//!
//! Every connection registers its outbound sender under its session id and
//! subscribes to the topics it wants. Publishing clones the event to every
//! subscriber's channel; a subscriber whose channel is full loses the frame
//! rather than stalling the room.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::messages::{ServerEvent, ServerFrame};
use crate::room::SessionId;

/// Outbound channel depth per connection.
pub const OUTBOUND_BUFFER: usize = 64;

struct Subscriber {
    session: SessionId,
    tx: mpsc::Sender<ServerFrame>,
}

#[derive(Default)]
pub struct TopicBus {
    topics: DashMap<String, Vec<Subscriber>>,
    sessions: DashMap<SessionId, mpsc::Sender<ServerFrame>>,
}

impl TopicBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a connection's outbound channel.
    pub fn register_session(&self, session: SessionId, tx: mpsc::Sender<ServerFrame>) {
        self.sessions.insert(session, tx);
    }

    /// Detach a connection and drop all its subscriptions.
    pub fn drop_session(&self, session: SessionId) {
        self.sessions.remove(&session);
        for mut entry in self.topics.iter_mut() {
            entry.value_mut().retain(|s| s.session != session);
        }
        self.topics.retain(|_, subs| !subs.is_empty());
    }

    /// Subscribe a registered session to a topic. Double subscription is a
    /// no-op.
    pub fn subscribe(&self, session: SessionId, topic: &str) {
        let Some(tx) = self.sessions.get(&session).map(|t| t.clone()) else {
            return;
        };
        let mut subs = self.topics.entry(topic.to_string()).or_default();
        if subs.iter().any(|s| s.session == session) {
            return;
        }
        subs.push(Subscriber { session, tx });
    }

    /// Publish an event to every subscriber of `topic`. Returns how many
    /// channels accepted the frame.
    pub fn publish(&self, topic: &str, body: ServerEvent) -> usize {
        let Some(subs) = self.topics.get(topic) else {
            return 0;
        };
        let mut delivered = 0;
        for sub in subs.iter() {
            let frame = ServerFrame {
                topic: topic.to_string(),
                body: body.clone(),
            };
            match sub.tx.try_send(frame) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    debug!(%topic, session = %sub.session, "dropping frame for slow or closed subscriber");
                }
            }
        }
        delivered
    }

    /// Deliver an event to one session only, regardless of subscriptions.
    pub fn send_to_session(&self, session: SessionId, topic: &str, body: ServerEvent) -> bool {
        let Some(tx) = self.sessions.get(&session) else {
            return false;
        };
        tx.try_send(ServerFrame {
            topic: topic.to_string(),
            body,
        })
        .is_ok()
    }
}
