//! Core library for the Plenum meeting coordination server.
//!
//! Rooms are identified by four-character codes and live entirely in memory.
//! Clients hold a WebSocket open, send commands addressed to a room, and
//! subscribe to the room's topics; after every state change the server fans
//! out a fresh snapshot to all subscribers.

pub mod broadcaster;
pub mod clock;
pub mod codes;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod facets;
pub mod handlers;
pub mod messages;
pub mod metrics;
pub mod poll;
pub mod registry;
pub mod room;
pub mod topics;
pub mod validation;
pub mod ws_router;

use std::sync::Arc;

use crate::broadcaster::Broadcaster;
use crate::config::Settings;
use crate::registry::RoomRegistry;
use crate::topics::TopicBus;

/// Application state shared across all handlers.
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<RoomRegistry>,
    pub bus: Arc<TopicBus>,
    pub broadcaster: Broadcaster,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let registry = Arc::new(RoomRegistry::new(settings.room.max_rooms));
        let bus = Arc::new(TopicBus::new());
        let broadcaster = Broadcaster::new(registry.clone(), bus.clone());
        Self {
            settings: Arc::new(settings),
            registry,
            bus,
            broadcaster,
        }
    }
}
