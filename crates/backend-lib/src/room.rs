//! The room aggregate: speak queue, current speaker with timer, chair role,
//! poll and configuration.
//!
//! Every mutator and the snapshot run under the room's state mutex. Critical
//! sections are short and never perform I/O or await; publishing happens
//! outside, serialized by the separate publish gate.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use uuid::Uuid;

use crate::clock;
use crate::error::AppError;
use crate::facets::{DecisionRule, Deliverable, MeetingGoal, ParticipationFormat};
use crate::poll::{PollCell, PollKind, PollStateView};

pub type SessionId = Uuid;

/// Reserved display name: a join under this name tries to take the chair.
pub const CHAIR_NAME: &str = "Chair";

pub const MIN_LIMIT_SEC: u32 = 10;
pub const MAX_LIMIT_SEC: u32 = 3600;
pub const DEFAULT_LIMIT_SEC: u32 = 180;

/// A queued speaker.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub requested_at_sec: u64,
}

impl Participant {
    fn new(name: &str, now_sec: u64) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            requested_at_sec: now_sec,
        }
    }
}

/// The speaker currently holding the floor.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Current {
    pub participant: Participant,
    /// Wall-clock second at which the current running interval began.
    pub started_at_sec: u64,
    /// Time accumulated while running, across pause/resume cycles.
    pub elapsed_ms: u64,
    pub running: bool,
    pub limit_sec: u32,
}

/// Room configuration, every field individually optional.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfig {
    pub topic: Option<String>,
    pub meeting_goal: Option<MeetingGoal>,
    pub participation_format: Option<ParticipationFormat>,
    pub decision_rule: Option<DecisionRule>,
    pub deliverable: Option<Deliverable>,
}

/// Immutable room snapshot broadcast to subscribers.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub queue: Vec<Participant>,
    pub current: Option<Current>,
    pub meeting_start_sec: u64,
    pub default_limit_sec: u32,
    pub room_code: String,
    pub chair_occupied: bool,
    pub poll_state: Option<PollStateView>,
    pub room_config: RoomConfig,
}

#[derive(Debug)]
struct RoomInner {
    queue: Vec<Participant>,
    current: Option<Current>,
    default_limit_sec: u32,
    chair_session: Option<SessionId>,
    config: RoomConfig,
    poll: PollCell,
}

impl Default for RoomInner {
    fn default() -> Self {
        Self {
            queue: Vec::new(),
            current: None,
            default_limit_sec: DEFAULT_LIMIT_SEC,
            chair_session: None,
            config: RoomConfig::default(),
            poll: PollCell::default(),
        }
    }
}

#[derive(Debug)]
pub struct Room {
    code: String,
    /// `(created_at_sec, monotonic_seq)`: the registry's eviction order key.
    /// The sequence component keeps same-second rooms distinct.
    creation_key: (u64, u64),
    inner: Mutex<RoomInner>,
    /// Held across snapshot + publish so snapshots of this room are always
    /// published in commit order. Never held together with `inner`.
    publish_gate: Mutex<()>,
}

impl Room {
    pub fn new(code: String, creation_key: (u64, u64)) -> Self {
        Self {
            code,
            creation_key,
            inner: Mutex::new(RoomInner::default()),
            publish_gate: Mutex::new(()),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn created_at_sec(&self) -> u64 {
        self.creation_key.0
    }

    pub fn creation_key(&self) -> (u64, u64) {
        self.creation_key
    }

    pub fn publish_gate(&self) -> &Mutex<()> {
        &self.publish_gate
    }

    fn lock(&self) -> MutexGuard<'_, RoomInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn chair_denied(&self, session: SessionId) -> AppError {
        AppError::ChairAccessDenied {
            room_code: self.code.clone(),
            session_id: session,
        }
    }

    pub fn is_chair(&self, session: SessionId) -> bool {
        self.lock().chair_session == Some(session)
    }

    pub fn has_chair(&self) -> bool {
        self.lock().chair_session.is_some()
    }

    /// Take the chair. Idempotent for the current holder; fails when another
    /// session holds it.
    pub fn assume_chair(&self, session: SessionId) -> Result<(), AppError> {
        let mut inner = self.lock();
        match inner.chair_session {
            Some(holder) if holder == session => Ok(()),
            Some(_) => Err(AppError::ChairOccupied {
                room_code: self.code.clone(),
            }),
            None => {
                inner.chair_session = Some(session);
                Ok(())
            }
        }
    }

    /// Clear the chair only if `session` holds it.
    pub fn release_chair(&self, session: SessionId) {
        let mut inner = self.lock();
        if inner.chair_session == Some(session) {
            inner.chair_session = None;
        }
    }

    /// Append a speaker. Names already present in the queue or speaking are
    /// ignored, compared case-insensitively.
    pub fn add_to_queue(&self, name: &str) {
        self.add_to_queue_at(name, clock::epoch_sec());
    }

    pub(crate) fn add_to_queue_at(&self, name: &str, now_sec: u64) {
        let mut inner = self.lock();
        if let Some(current) = &inner.current {
            if current.participant.name.eq_ignore_ascii_case(name) {
                return;
            }
        }
        if inner
            .queue
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name))
        {
            return;
        }
        inner.queue.push(Participant::new(name, now_sec));
    }

    /// Remove the first queued speaker with this name (case-insensitive).
    /// The current speaker is unaffected.
    pub fn withdraw(&self, name: &str) {
        let mut inner = self.lock();
        if let Some(idx) = inner
            .queue
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
        {
            inner.queue.remove(idx);
        }
    }

    /// Clear the floor; if anyone is waiting, the head of the queue starts
    /// speaking with a fresh running timer.
    pub fn next_participant(&self, session: SessionId) -> Result<(), AppError> {
        self.next_participant_at(session, clock::epoch_sec())
    }

    pub(crate) fn next_participant_at(
        &self,
        session: SessionId,
        now_sec: u64,
    ) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner.chair_session != Some(session) {
            return Err(self.chair_denied(session));
        }
        inner.current = None;
        if !inner.queue.is_empty() {
            let next = inner.queue.remove(0);
            let limit_sec = inner.default_limit_sec;
            inner.current = Some(Current {
                participant: next,
                started_at_sec: now_sec,
                elapsed_ms: 0,
                running: true,
                limit_sec,
            });
        }
        Ok(())
    }

    /// Resume the timer; a no-op when already running or nobody speaks.
    pub fn start_timer(&self, session: SessionId) -> Result<(), AppError> {
        self.start_timer_at(session, clock::epoch_sec())
    }

    pub(crate) fn start_timer_at(&self, session: SessionId, now_sec: u64) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner.chair_session != Some(session) {
            return Err(self.chair_denied(session));
        }
        if let Some(current) = &mut inner.current {
            if !current.running {
                current.started_at_sec = now_sec;
                current.running = true;
            }
        }
        Ok(())
    }

    /// Pause the timer, folding the running interval into `elapsed_ms`;
    /// a no-op when not running or nobody speaks.
    pub fn pause_timer(&self, session: SessionId) -> Result<(), AppError> {
        self.pause_timer_at(session, clock::epoch_sec())
    }

    pub(crate) fn pause_timer_at(&self, session: SessionId, now_sec: u64) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner.chair_session != Some(session) {
            return Err(self.chair_denied(session));
        }
        if let Some(current) = &mut inner.current {
            if current.running {
                let add_ms = now_sec.saturating_sub(current.started_at_sec) * 1000;
                current.elapsed_ms += add_ms;
                current.running = false;
            }
        }
        Ok(())
    }

    /// Restart the timer from zero, running.
    pub fn reset_timer(&self, session: SessionId) -> Result<(), AppError> {
        self.reset_timer_at(session, clock::epoch_sec())
    }

    pub(crate) fn reset_timer_at(&self, session: SessionId, now_sec: u64) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner.chair_session != Some(session) {
            return Err(self.chair_denied(session));
        }
        if let Some(current) = &mut inner.current {
            current.elapsed_ms = 0;
            current.started_at_sec = now_sec;
            current.running = true;
        }
        Ok(())
    }

    /// Set the per-speaker limit, clamped to `[MIN_LIMIT_SEC, MAX_LIMIT_SEC]`.
    /// A live speaker picks up the new limit without losing timer state.
    pub fn update_limit(&self, session: SessionId, seconds: i64) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner.chair_session != Some(session) {
            return Err(self.chair_denied(session));
        }
        let clamped = seconds.clamp(i64::from(MIN_LIMIT_SEC), i64::from(MAX_LIMIT_SEC)) as u32;
        inner.default_limit_sec = clamped;
        if let Some(current) = &mut inner.current {
            current.limit_sec = clamped;
        }
        Ok(())
    }

    /// Replace the room configuration wholesale; unset fields clear.
    pub fn update_config(&self, session: SessionId, config: RoomConfig) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner.chair_session != Some(session) {
            return Err(self.chair_denied(session));
        }
        inner.config = config;
        Ok(())
    }

    pub fn start_poll(
        &self,
        session: SessionId,
        question: String,
        kind: PollKind,
    ) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner.chair_session != Some(session) {
            return Err(self.chair_denied(session));
        }
        inner.poll.start(question, kind);
        Ok(())
    }

    /// Anyone may vote while a poll is active. Returns whether the tally
    /// changed; rejected votes are silent.
    pub fn cast_vote(&self, session: SessionId, key: &str) -> bool {
        self.lock().poll.cast(session, key)
    }

    pub fn end_poll(&self, session: SessionId) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner.chair_session != Some(session) {
            return Err(self.chair_denied(session));
        }
        inner.poll.end();
        Ok(())
    }

    pub fn close_poll(&self, session: SessionId) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner.chair_session != Some(session) {
            return Err(self.chair_denied(session));
        }
        inner.poll.close();
        Ok(())
    }

    pub fn cancel_poll(&self, session: SessionId) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner.chair_session != Some(session) {
            return Err(self.chair_denied(session));
        }
        inner.poll.cancel();
        Ok(())
    }

    pub fn snapshot(&self) -> State {
        let inner = self.lock();
        State {
            queue: inner.queue.clone(),
            current: inner.current.clone(),
            meeting_start_sec: self.created_at_sec(),
            default_limit_sec: inner.default_limit_sec,
            room_code: self.code.clone(),
            chair_occupied: inner.chair_session.is_some(),
            poll_state: inner.poll.view(),
            room_config: inner.config.clone(),
        }
    }
}
