//! Room creation, existence probes, deep-link redirects and health.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::codes;
use crate::error::AppError;
use crate::messages::{RoomInfo, LANDING_URL};
use crate::registry::RoomRegistry;
use crate::AppState;

/// Upper bound on code sampling before giving up. Unreachable in practice:
/// the code space (35^4) dwarfs any configured registry capacity.
const MAX_CODE_ATTEMPTS: usize = 100_000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/rooms", post(create_room))
        .route("/rooms/{code}", get(check_room))
        .route("/chair/{code}", get(chair_view))
        .route("/room/{code}", get(participant_view))
        .route("/healthz", get(healthz))
}

/// Sample unused codes until one is free.
pub fn allocate_code(registry: &RoomRegistry) -> Result<String, AppError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = codes::generate();
        if !registry.exists(&code) {
            return Ok(code);
        }
    }
    Err(AppError::CodesExhausted)
}

async fn create_room(State(state): State<Arc<AppState>>) -> Result<Json<RoomInfo>, AppError> {
    let code = allocate_code(&state.registry)?;
    state.registry.create(&code);
    Ok(Json(RoomInfo {
        room_code: code,
        exists: true,
    }))
}

async fn check_room(
    Path(code): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<RoomInfo> {
    let normalized = codes::normalize(&code);
    let exists = state.registry.exists(&normalized);
    Json(RoomInfo {
        room_code: normalized,
        exists,
    })
}

async fn chair_view(Path(code): Path<String>) -> Response {
    found_redirect(&format!("/chair.html?room={}", codes::normalize(&code)))
}

async fn participant_view(Path(code): Path<String>) -> Response {
    found_redirect(&format!("/participant.html?room={}", codes::normalize(&code)))
}

async fn home() -> Response {
    found_redirect(LANDING_URL)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn found_redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{CODE_ALPHABET, CODE_LEN};

    #[test]
    fn allocated_codes_are_fresh_and_well_formed() {
        let registry = RoomRegistry::new(10);
        for _ in 0..100 {
            let code = allocate_code(&registry).unwrap();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
            assert!(!registry.exists(&code));
            registry.create(&code);
        }
    }

    #[test]
    fn redirects_normalize_the_code() {
        let response = found_redirect("/chair.html?room=ABOD");
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers().get(header::LOCATION).unwrap();
        assert_eq!(location, "/chair.html?room=ABOD");
    }
}
