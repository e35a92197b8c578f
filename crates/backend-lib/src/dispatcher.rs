//! Per-connection command dispatcher.
//!
//! One dispatcher exists per WebSocket connection, identified by its session
//! id. Every command runs the same pipeline: validate the payload, normalize
//! the room code, resolve the room, apply the operation, broadcast a fresh
//! snapshot. Faults never escape; they become targeted error envelopes.

use std::sync::Arc;

use metrics::counter;
use tracing::debug;
use uuid::Uuid;

use crate::codes;
use crate::error::AppError;
use crate::facets::{DecisionRule, Deliverable, MeetingGoal, ParticipationFormat};
use crate::messages::{
    chair_assumed_topic, destroyed_topic, error_topic, ChairAssumed, ClientFrame, RoomDestroyed,
    RoomError, ServerEvent, TimerAction, SESSION_ERROR_TOPIC,
};
use crate::metrics as keys;
use crate::room::{Room, RoomConfig, SessionId, CHAIR_NAME};
use crate::validation;
use crate::AppState;

pub struct Dispatcher {
    state: Arc<AppState>,
    session_id: SessionId,
}

impl Dispatcher {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            session_id: Uuid::new_v4(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Handle one inbound frame. Never panics, never returns an error: every
    /// fault is delivered to the offending session as an envelope.
    pub fn handle_frame(&self, frame: ClientFrame) {
        counter!(keys::ROOM_COMMANDS, "kind" => kind_label(&frame)).increment(1);
        match frame {
            ClientFrame::Subscribe { topic } => {
                self.state.bus.subscribe(self.session_id, &topic);
            }
            ClientFrame::Join { room, name } => self.join(&room, &name),
            ClientFrame::AssumeChair {
                room,
                participant_name,
                request_id,
            } => self.assume_chair(&room, &participant_name, &request_id),
            ClientFrame::Request { room, name } => {
                let name = match validation::validate_name(&name) {
                    Ok(name) => name,
                    Err(err) => return self.validation_error(&room, &err),
                };
                self.with_room(&room, |r| {
                    r.add_to_queue(&name);
                    Ok(true)
                });
            }
            ClientFrame::Withdraw { room, name } => {
                let name = match validation::validate_name(&name) {
                    Ok(name) => name,
                    Err(err) => return self.validation_error(&room, &err),
                };
                self.with_room(&room, |r| {
                    r.withdraw(&name);
                    Ok(true)
                });
            }
            ClientFrame::Next { room } => {
                self.with_room(&room, |r| {
                    r.next_participant(self.session_id)?;
                    Ok(true)
                });
            }
            ClientFrame::Timer { room, action } => {
                self.with_room(&room, |r| {
                    match action {
                        TimerAction::Start => r.start_timer(self.session_id)?,
                        TimerAction::Pause => r.pause_timer(self.session_id)?,
                        TimerAction::Reset => r.reset_timer(self.session_id)?,
                    }
                    Ok(true)
                });
            }
            ClientFrame::SetLimit { room, seconds } => {
                self.with_room(&room, |r| {
                    r.update_limit(self.session_id, seconds)?;
                    Ok(true)
                });
            }
            ClientFrame::PollStart {
                room,
                question,
                poll_type,
                options,
                votes_per_participant,
            } => {
                let question = match validation::validate_question(&question) {
                    Ok(question) => question,
                    Err(err) => return self.validation_error(&room, &err),
                };
                let kind = match validation::validate_poll_spec(
                    &poll_type,
                    options,
                    votes_per_participant,
                ) {
                    Ok(kind) => kind,
                    Err(err) => return self.validation_error(&room, &err),
                };
                self.with_room(&room, |r| {
                    r.start_poll(self.session_id, question, kind)?;
                    Ok(true)
                });
            }
            ClientFrame::PollVote { room, vote } => {
                // A rejected vote is silent: no broadcast, no error.
                self.with_room(&room, |r| Ok(r.cast_vote(self.session_id, &vote)));
            }
            ClientFrame::PollEnd { room } => {
                self.with_room(&room, |r| {
                    r.end_poll(self.session_id)?;
                    Ok(true)
                });
            }
            ClientFrame::PollClose { room } => {
                self.with_room(&room, |r| {
                    r.close_poll(self.session_id)?;
                    Ok(true)
                });
            }
            ClientFrame::PollCancel { room } => {
                self.with_room(&room, |r| {
                    r.cancel_poll(self.session_id)?;
                    Ok(true)
                });
            }
            ClientFrame::UpdateConfig {
                room,
                topic,
                meeting_goal,
                participation_format,
                decision_rule,
                deliverable,
            } => {
                let config = match Self::parse_config(
                    topic.as_deref(),
                    meeting_goal.as_deref(),
                    participation_format.as_deref(),
                    decision_rule.as_deref(),
                    deliverable.as_deref(),
                ) {
                    Ok(config) => config,
                    Err(err) => return self.validation_error(&room, &err),
                };
                self.with_room(&room, |r| {
                    r.update_config(self.session_id, config)?;
                    Ok(true)
                });
            }
            ClientFrame::Destroy { room } => self.destroy(&room),
        }
    }

    /// Exactly-once connection teardown: release the chair if held, unbind
    /// the session, drop all subscriptions.
    pub fn on_disconnect(&self) {
        if let Some(room) = self.state.registry.room_of_session(self.session_id) {
            if room.is_chair(self.session_id) {
                room.release_chair(self.session_id);
                self.state
                    .broadcaster
                    .broadcast(room.code(), self.session_id);
            }
        }
        self.state.registry.unbind_session(self.session_id);
        self.state.bus.drop_session(self.session_id);
    }

    /// Shared pipeline: normalize, resolve, apply, broadcast on `Ok(true)`.
    fn with_room<F>(&self, raw_code: &str, op: F)
    where
        F: FnOnce(&Room) -> Result<bool, AppError>,
    {
        let code = codes::normalize(raw_code);
        if let Err(err) = validation::validate_room_code(&code) {
            return self.validation_error(&code, &err);
        }
        match self.state.registry.find_or_fail(&code) {
            Ok(room) => match op(&room) {
                Ok(true) => self.state.broadcaster.broadcast(&code, self.session_id),
                Ok(false) => {}
                Err(err) => self.emit_error(&code, &err),
            },
            Err(err) => self.emit_error(&code, &err),
        }
    }

    fn join(&self, raw_code: &str, name: &str) {
        let name = match validation::validate_name(name) {
            Ok(name) => name,
            Err(err) => return self.validation_error(raw_code, &err),
        };
        self.with_room(raw_code, |room| {
            self.state
                .registry
                .bind_session(self.session_id, room.code());
            if name == CHAIR_NAME {
                // Occupied chair is not an error on join; the UI falls back
                // to participant view after the snapshot.
                let _ = room.assume_chair(self.session_id);
            }
            Ok(true)
        });
    }

    fn assume_chair(&self, raw_code: &str, participant_name: &str, request_id: &str) {
        if let Err(err) = validation::validate_name(participant_name) {
            return self.validation_error(raw_code, &err);
        }
        let code = codes::normalize(raw_code);
        if let Err(err) = validation::validate_room_code(&code) {
            return self.validation_error(&code, &err);
        }
        let room = match self.state.registry.find_or_fail(&code) {
            Ok(room) => room,
            Err(err) => return self.emit_error(&code, &err),
        };
        self.state.registry.bind_session(self.session_id, &code);

        let success = match room.assume_chair(self.session_id) {
            Ok(()) => true,
            Err(AppError::ChairOccupied { .. }) => false,
            Err(err) => return self.emit_error(&code, &err),
        };
        // The reply goes out regardless of outcome, and the state is
        // rebroadcast in both cases so every UI reconciles the chair flag.
        self.state.broadcaster.broadcast(&code, self.session_id);
        self.state.bus.publish(
            &chair_assumed_topic(&code),
            ServerEvent::ChairAssumed(ChairAssumed {
                success,
                request_id: request_id.to_string(),
            }),
        );
    }

    fn destroy(&self, raw_code: &str) {
        let code = codes::normalize(raw_code);
        if let Err(err) = validation::validate_room_code(&code) {
            return self.validation_error(&code, &err);
        }
        let room = match self.state.registry.find_or_fail(&code) {
            Ok(room) => room,
            Err(err) => return self.emit_error(&code, &err),
        };
        if !room.is_chair(self.session_id) {
            return self.emit_error(
                &code,
                &AppError::ChairAccessDenied {
                    room_code: code.clone(),
                    session_id: self.session_id,
                },
            );
        }
        self.state.bus.publish(
            &destroyed_topic(&code),
            ServerEvent::Destroyed(RoomDestroyed::by_chair()),
        );
        self.state.registry.destroy(&code);
    }

    fn validation_error(&self, code: &str, err: &validation::ValidationError) {
        debug!(%err, room = code, session = %self.session_id, "rejected command payload");
        self.state.bus.send_to_session(
            self.session_id,
            SESSION_ERROR_TOPIC,
            ServerEvent::Error(RoomError::validation(code, &err.to_string())),
        );
    }

    fn emit_error(&self, code: &str, err: &AppError) {
        debug!(%err, room = code, session = %self.session_id, "command failed");
        match err {
            AppError::RoomNotFound { .. } => {
                self.state.bus.send_to_session(
                    self.session_id,
                    &error_topic(code),
                    ServerEvent::Error(RoomError::room_not_found(code)),
                );
            }
            AppError::ChairAccessDenied { .. } => {
                self.state.bus.send_to_session(
                    self.session_id,
                    SESSION_ERROR_TOPIC,
                    ServerEvent::Error(RoomError::chair_access_denied(code)),
                );
            }
            AppError::Validation(err) => self.validation_error(code, err),
            other => {
                self.state.bus.send_to_session(
                    self.session_id,
                    SESSION_ERROR_TOPIC,
                    ServerEvent::Error(RoomError::validation(code, &other.to_string())),
                );
            }
        }
    }

    fn parse_config(
        topic: Option<&str>,
        meeting_goal: Option<&str>,
        participation_format: Option<&str>,
        decision_rule: Option<&str>,
        deliverable: Option<&str>,
    ) -> Result<RoomConfig, validation::ValidationError> {
        Ok(RoomConfig {
            topic: validation::validate_topic(topic)?,
            meeting_goal: validation::parse_facet::<MeetingGoal>(meeting_goal)?,
            participation_format: validation::parse_facet::<ParticipationFormat>(
                participation_format,
            )?,
            decision_rule: validation::parse_facet::<DecisionRule>(decision_rule)?,
            deliverable: validation::parse_facet::<Deliverable>(deliverable)?,
        })
    }
}

fn kind_label(frame: &ClientFrame) -> &'static str {
    match frame {
        ClientFrame::Subscribe { .. } => "subscribe",
        ClientFrame::Join { .. } => "join",
        ClientFrame::AssumeChair { .. } => "assumeChair",
        ClientFrame::Request { .. } => "request",
        ClientFrame::Withdraw { .. } => "withdraw",
        ClientFrame::Next { .. } => "next",
        ClientFrame::Timer { .. } => "timer",
        ClientFrame::SetLimit { .. } => "setLimit",
        ClientFrame::PollStart { .. } => "poll/start",
        ClientFrame::PollVote { .. } => "poll/vote",
        ClientFrame::PollEnd { .. } => "poll/end",
        ClientFrame::PollClose { .. } => "poll/close",
        ClientFrame::PollCancel { .. } => "poll/cancel",
        ClientFrame::UpdateConfig { .. } => "updateConfig",
        ClientFrame::Destroy { .. } => "destroy",
    }
}
