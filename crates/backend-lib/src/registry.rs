//! The bounded room registry.
//!
//! Three indices: the primary `code -> Room` map (lock-free reads), a
//! creation-ordered index used to find the eviction victim, and the
//! `session -> code` map. Creation, eviction and destruction mutate the
//! indices together under the registry-wide order lock; plain lookups and
//! session (un)binding do not take it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use metrics::{counter, gauge};
use tracing::{error, info, warn};

use crate::clock;
use crate::error::AppError;
use crate::metrics as keys;
use crate::room::{Room, SessionId};

pub struct RoomRegistry {
    max_rooms: usize,
    rooms: DashMap<String, Arc<Room>>,
    /// Creation-order index; the key is `(created_at_sec, seq)` so rooms
    /// created in the same second still evict deterministically, oldest
    /// insertion first. Also serves as the registry-wide mutation guard.
    order: Mutex<BTreeMap<(u64, u64), String>>,
    sessions: DashMap<SessionId, String>,
    seq: AtomicU64,
}

impl RoomRegistry {
    pub fn new(max_rooms: usize) -> Self {
        info!(max_rooms, "room registry initialized");
        Self {
            max_rooms,
            rooms: DashMap::new(),
            order: Mutex::new(BTreeMap::new()),
            sessions: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    fn order_lock(&self) -> MutexGuard<'_, BTreeMap<(u64, u64), String>> {
        self.order.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create the room for `code`, or return the existing one. At capacity
    /// the oldest room is evicted first, together with its session bindings.
    pub fn create(&self, code: &str) -> Arc<Room> {
        let mut order = self.order_lock();
        if let Some(existing) = self.rooms.get(code) {
            info!(room = code, "room already exists");
            return existing.clone();
        }
        if self.rooms.len() >= self.max_rooms {
            warn!(
                room_limit = self.max_rooms,
                "room limit reached, removing oldest room"
            );
            self.evict_oldest(&mut order);
        }
        let key = (clock::epoch_sec(), self.seq.fetch_add(1, Ordering::Relaxed));
        let room = Arc::new(Room::new(code.to_string(), key));
        self.rooms.insert(code.to_string(), room.clone());
        order.insert(key, code.to_string());
        counter!(keys::ROOM_CREATED).increment(1);
        gauge!(keys::ROOM_ACTIVE).increment(1.0);
        info!(room = code, total = self.rooms.len(), "created room");
        room
    }

    fn evict_oldest(&self, order: &mut BTreeMap<(u64, u64), String>) {
        let Some((key, code)) = order.pop_first() else {
            warn!("attempted to remove oldest room but the order index is empty");
            return;
        };
        self.rooms.remove(&code);
        let bound_sessions = self.sessions.iter().filter(|e| *e.value() == code).count();
        if bound_sessions > 0 {
            error!(
                room = %code,
                sessions = bound_sessions,
                "evicting room with active sessions"
            );
        }
        self.sessions.retain(|_, c| *c != code);
        counter!(keys::ROOM_EVICTED).increment(1);
        gauge!(keys::ROOM_ACTIVE).decrement(1.0);
        warn!(
            room = %code,
            created_at_sec = key.0,
            sessions_cleaned = bound_sessions,
            remaining = self.rooms.len(),
            "removed oldest room"
        );
    }

    /// Pure lookup; never creates.
    pub fn find(&self, code: &str) -> Option<Arc<Room>> {
        self.rooms.get(code).map(|r| r.clone())
    }

    pub fn find_or_fail(&self, code: &str) -> Result<Arc<Room>, AppError> {
        self.find(code).ok_or_else(|| {
            warn!(room = code, "room not found");
            AppError::RoomNotFound {
                room_code: code.to_string(),
            }
        })
    }

    pub fn exists(&self, code: &str) -> bool {
        self.rooms.contains_key(code)
    }

    /// Record which room a session belongs to. A previous binding is
    /// overwritten.
    pub fn bind_session(&self, session: SessionId, code: &str) {
        if let Some(previous) = self.sessions.insert(session, code.to_string()) {
            if previous != code {
                warn!(%session, from = %previous, to = code, "session remapped");
            }
        }
        if !self.rooms.contains_key(code) {
            error!(%session, room = code, "tracking session for non-existent room");
        }
    }

    pub fn unbind_session(&self, session: SessionId) {
        self.sessions.remove(&session);
    }

    /// Resolve a session to its room. A binding whose room is gone is purged
    /// and reported as absent.
    pub fn room_of_session(&self, session: SessionId) -> Option<Arc<Room>> {
        let code = self.sessions.get(&session).map(|c| c.clone())?;
        match self.find(&code) {
            Some(room) => Some(room),
            None => {
                warn!(%session, room = %code, "orphaned session mapping");
                self.sessions.remove(&session);
                None
            }
        }
    }

    /// Every session currently bound to `code`.
    pub fn sessions_of(&self, code: &str) -> Vec<SessionId> {
        self.sessions
            .iter()
            .filter(|e| e.value().as_str() == code)
            .map(|e| *e.key())
            .collect()
    }

    /// Remove the room, its order entry and every session binding to it.
    pub fn destroy(&self, code: &str) {
        let mut order = self.order_lock();
        if let Some((_, room)) = self.rooms.remove(code) {
            order.remove(&room.creation_key());
            let bound_sessions = self.sessions.iter().filter(|e| *e.value() == code).count();
            if bound_sessions > 0 {
                warn!(room = code, sessions = bound_sessions, "destroying room with active sessions");
            }
            self.sessions.retain(|_, c| *c != code);
            counter!(keys::ROOM_DESTROYED).increment(1);
            gauge!(keys::ROOM_ACTIVE).decrement(1.0);
            info!(room = code, remaining = self.rooms.len(), "destroyed room");
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
