//! Field-level validation for incoming command payloads.
//!
//! Everything here runs before any room is touched; a failure becomes a
//! targeted `VALIDATION_ERROR` envelope and the command is dropped.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::codes::CODE_LEN;
use crate::facets::Facet;
use crate::poll::PollKind;

pub const MAX_NAME_LEN: usize = 30;
pub const MAX_QUESTION_LEN: usize = 200;
pub const MAX_CONFIG_LEN: usize = 100;

static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9 '.\-]+$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid room code: {0}")]
    InvalidRoomCode(String),

    #[error("invalid poll question: {0}")]
    InvalidQuestion(String),

    #[error("invalid poll: {0}")]
    InvalidPoll(String),

    #[error("invalid room config: {0}")]
    InvalidConfig(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate and trim a display name: 1-30 chars from the permitted class.
pub fn validate_name(raw: &str) -> ValidationResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::InvalidName("name is required".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::InvalidName(format!(
            "name must not exceed {MAX_NAME_LEN} characters"
        )));
    }
    if !NAME_REGEX.is_match(name) {
        return Err(ValidationError::InvalidName(
            "name can only contain letters, numbers, spaces, dots, hyphens, and apostrophes"
                .to_string(),
        ));
    }
    Ok(name.to_string())
}

/// A normalized room code must be exactly four characters.
pub fn validate_room_code(normalized: &str) -> ValidationResult<()> {
    if normalized.chars().count() != CODE_LEN {
        return Err(ValidationError::InvalidRoomCode(format!(
            "room code must be exactly {CODE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate and trim a poll question: 1-200 chars.
pub fn validate_question(raw: &str) -> ValidationResult<String> {
    let question = raw.trim();
    if question.is_empty() {
        return Err(ValidationError::InvalidQuestion(
            "question is required".to_string(),
        ));
    }
    if question.len() > MAX_QUESTION_LEN {
        return Err(ValidationError::InvalidQuestion(format!(
            "question must not exceed {MAX_QUESTION_LEN} characters"
        )));
    }
    Ok(question.to_string())
}

/// Parse a poll specification into its typed kind.
pub fn validate_poll_spec(
    poll_type: &str,
    options: Option<Vec<String>>,
    votes_per_participant: Option<u32>,
) -> ValidationResult<PollKind> {
    if let Some(vpp) = votes_per_participant {
        if vpp < 1 {
            return Err(ValidationError::InvalidPoll(
                "votesPerParticipant must be at least 1".to_string(),
            ));
        }
    }
    match poll_type {
        "YES_NO" => Ok(PollKind::YesNo),
        "GRADIENTS" => Ok(PollKind::Gradients),
        "MULTISELECT" | "MULTISELECT_MULTIPLE" => {
            let options = options.unwrap_or_default();
            if options.is_empty() {
                return Err(ValidationError::InvalidPoll(
                    "multiselect polls require at least one option".to_string(),
                ));
            }
            let multiple = poll_type == "MULTISELECT_MULTIPLE";
            Ok(PollKind::Multiselect {
                options,
                multiple,
                votes_per_participant: if multiple {
                    votes_per_participant.unwrap_or(1)
                } else {
                    1
                },
            })
        }
        other => Err(ValidationError::InvalidPoll(format!(
            "unknown poll type: {other}"
        ))),
    }
}

/// Validate an optional topic string: trimmed, at most 100 chars, empty means
/// unset.
pub fn validate_topic(raw: Option<&str>) -> ValidationResult<Option<String>> {
    match raw {
        None => Ok(None),
        Some(raw) => {
            let topic = raw.trim();
            if topic.is_empty() {
                return Ok(None);
            }
            if topic.len() > MAX_CONFIG_LEN {
                return Err(ValidationError::InvalidConfig(format!(
                    "topic must not exceed {MAX_CONFIG_LEN} characters"
                )));
            }
            Ok(Some(topic.to_string()))
        }
    }
}

/// Parse an optional facet value. Values that do not name a known variant are
/// accepted and mean "unset"; over-long strings are rejected outright.
pub fn parse_facet<F: Facet>(raw: Option<&str>) -> ValidationResult<Option<F>> {
    match raw {
        None => Ok(None),
        Some(raw) => {
            if raw.len() > MAX_CONFIG_LEN {
                return Err(ValidationError::InvalidConfig(format!(
                    "config value must not exceed {MAX_CONFIG_LEN} characters"
                )));
            }
            Ok(F::parse(raw))
        }
    }
}
