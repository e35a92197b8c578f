//! Snapshot fan-out.
//!
//! After every successful mutation the dispatcher asks the broadcaster to
//! publish a fresh snapshot on the room's state topic. The room may have been
//! evicted between the mutation and the snapshot; in that race the origin
//! session gets a targeted `room_destroyed` envelope instead.

use std::sync::{Arc, PoisonError};

use metrics::counter;

use crate::messages::{error_topic, state_topic, RoomError, ServerEvent};
use crate::metrics as keys;
use crate::registry::RoomRegistry;
use crate::room::SessionId;
use crate::topics::TopicBus;

#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<RoomRegistry>,
    bus: Arc<TopicBus>,
}

impl Broadcaster {
    pub fn new(registry: Arc<RoomRegistry>, bus: Arc<TopicBus>) -> Self {
        Self { registry, bus }
    }

    /// Publish the current state of `code` to its subscribers. Snapshot and
    /// publish happen under the room's publish gate so subscribers observe
    /// snapshots in commit order.
    pub fn broadcast(&self, code: &str, origin: SessionId) {
        match self.registry.find(code) {
            Some(room) => {
                let _gate = room
                    .publish_gate()
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                let state = room.snapshot();
                self.bus
                    .publish(&state_topic(code), ServerEvent::State(state));
                counter!(keys::ROOM_SNAPSHOTS).increment(1);
            }
            None => {
                self.bus.send_to_session(
                    origin,
                    &error_topic(code),
                    ServerEvent::Error(RoomError::room_destroyed(code)),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::OUTBOUND_BUFFER;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn setup() -> (Arc<RoomRegistry>, Arc<TopicBus>, Broadcaster) {
        let registry = Arc::new(RoomRegistry::new(10));
        let bus = Arc::new(TopicBus::new());
        let broadcaster = Broadcaster::new(registry.clone(), bus.clone());
        (registry, bus, broadcaster)
    }

    #[test]
    fn broadcast_publishes_a_snapshot_to_subscribers() {
        let (registry, bus, broadcaster) = setup();
        registry.create("ABCD");

        let session = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(OUTBOUND_BUFFER);
        bus.register_session(session, tx);
        bus.subscribe(session, "room/ABCD/state");

        broadcaster.broadcast("ABCD", session);
        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.topic, "room/ABCD/state");
        let ServerEvent::State(state) = frame.body else {
            panic!("expected a state frame");
        };
        assert_eq!(state.room_code, "ABCD");
    }

    #[test]
    fn vanished_room_yields_a_targeted_destroyed_error() {
        let (_registry, bus, broadcaster) = setup();
        let session = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(OUTBOUND_BUFFER);
        bus.register_session(session, tx);

        broadcaster.broadcast("GONE", session);
        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.topic, "room/GONE/error");
        let ServerEvent::Error(err) = frame.body else {
            panic!("expected an error frame");
        };
        assert_eq!(err.action, "room_destroyed");
    }
}
