//! Wire protocol: client command frames and server event frames.
//!
//! Clients send tagged JSON commands addressed to a room code and subscribe
//! to per-room topics; the server pushes `{topic, body}` frames. Snapshot and
//! error payload shapes are fixed by the front-end contract and serialize in
//! `camelCase`.

use serde::{Deserialize, Serialize};

use crate::room::State;

/// Where evicted or lost clients are told to navigate.
pub const LANDING_URL: &str = "/landing.html";

/// Per-session channel for targeted errors, outside any room topic.
pub const SESSION_ERROR_TOPIC: &str = "queue/error";

pub fn state_topic(code: &str) -> String {
    format!("room/{code}/state")
}

pub fn chair_assumed_topic(code: &str) -> String {
    format!("room/{code}/chairAssumed")
}

pub fn destroyed_topic(code: &str) -> String {
    format!("room/{code}/destroyed")
}

pub fn error_topic(code: &str) -> String {
    format!("room/{code}/error")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAction {
    Start,
    Pause,
    Reset,
}

/// Commands a client can send over the duplex channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientFrame {
    Subscribe {
        topic: String,
    },
    Join {
        room: String,
        name: String,
    },
    AssumeChair {
        room: String,
        participant_name: String,
        request_id: String,
    },
    Request {
        room: String,
        name: String,
    },
    Withdraw {
        room: String,
        name: String,
    },
    Next {
        room: String,
    },
    Timer {
        room: String,
        action: TimerAction,
    },
    SetLimit {
        room: String,
        seconds: i64,
    },
    #[serde(rename = "poll/start")]
    PollStart {
        room: String,
        question: String,
        poll_type: String,
        #[serde(default)]
        options: Option<Vec<String>>,
        #[serde(default)]
        votes_per_participant: Option<u32>,
    },
    #[serde(rename = "poll/vote")]
    PollVote {
        room: String,
        vote: String,
    },
    #[serde(rename = "poll/end")]
    PollEnd {
        room: String,
    },
    #[serde(rename = "poll/close")]
    PollClose {
        room: String,
    },
    #[serde(rename = "poll/cancel")]
    PollCancel {
        room: String,
    },
    UpdateConfig {
        room: String,
        #[serde(default)]
        topic: Option<String>,
        #[serde(default)]
        meeting_goal: Option<String>,
        #[serde(default)]
        participation_format: Option<String>,
        #[serde(default)]
        decision_rule: Option<String>,
        #[serde(default)]
        deliverable: Option<String>,
    },
    Destroy {
        room: String,
    },
}

/// Error envelope delivered on room error topics and the session channel.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomError {
    pub error: String,
    pub room_code: String,
    pub action: String,
    pub landing_url: String,
}

impl RoomError {
    pub fn room_not_found(code: &str) -> Self {
        Self {
            error: format!("Room not found: {code}"),
            room_code: code.to_string(),
            action: "room_not_found".to_string(),
            landing_url: LANDING_URL.to_string(),
        }
    }

    pub fn chair_access_denied(code: &str) -> Self {
        Self {
            error: "Unauthorized chair access: chair access required for this operation"
                .to_string(),
            room_code: code.to_string(),
            action: "chair_access_denied".to_string(),
            landing_url: LANDING_URL.to_string(),
        }
    }

    pub fn room_destroyed(code: &str) -> Self {
        Self {
            error: "Room no longer exists".to_string(),
            room_code: code.to_string(),
            action: "room_destroyed".to_string(),
            landing_url: LANDING_URL.to_string(),
        }
    }

    pub fn validation(code: &str, message: &str) -> Self {
        Self {
            error: format!("Invalid message: {message}"),
            room_code: code.to_string(),
            action: "validation_error".to_string(),
            landing_url: LANDING_URL.to_string(),
        }
    }
}

/// Reply on the chair-assumed topic, correlated by request id.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChairAssumed {
    pub success: bool,
    pub request_id: String,
}

/// Teardown notice on the destroyed topic.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomDestroyed {
    pub message: String,
    pub landing_url: String,
}

impl RoomDestroyed {
    pub fn by_chair() -> Self {
        Self {
            message: "The room has been closed by the chair.".to_string(),
            landing_url: LANDING_URL.to_string(),
        }
    }
}

/// Everything the server pushes; the topic tells the client what to expect,
/// so the body serializes untagged.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ServerEvent {
    State(State),
    ChairAssumed(ChairAssumed),
    Destroyed(RoomDestroyed),
    Error(RoomError),
}

/// One outbound frame on the duplex channel.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServerFrame {
    pub topic: String,
    pub body: ServerEvent,
}

/// HTTP reply for room creation and existence probes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_code: String,
    pub exists: bool,
}
