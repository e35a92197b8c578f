//! WebSocket endpoint and connection lifecycle.
//!
//! Each connection gets a session id, an outbound pump task and a dispatcher.
//! Inbound text frames are parsed and handed to the dispatcher; the pump
//! drains the session's channel into the socket. Closing the socket, from
//! either side, runs the disconnect hook exactly once.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;
use crate::handlers;
use crate::messages::{ClientFrame, RoomError, ServerEvent, SESSION_ERROR_TOPIC};
use crate::metrics as keys;
use crate::topics::OUTBOUND_BUFFER;
use crate::AppState;

/// Full application router: WebSocket endpoint plus the HTTP surface.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .merge(handlers::rooms::routes())
        .merge(handlers::metadata::routes())
        .with_state(state)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    counter!(keys::WS_CONNECTION).increment(1);
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    gauge!(keys::WS_ACTIVE).increment(1.0);

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel(OUTBOUND_BUFFER);
    let dispatcher = Dispatcher::new(state.clone());
    let session_id = dispatcher.session_id();
    state.bus.register_session(session_id, tx);
    debug!(%session_id, "websocket connected");

    // Pump outbound frames into the socket until either side goes away.
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match serde_json::to_string(&frame) {
                Ok(json) => {
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(err) => warn!(%err, "failed to serialize outbound frame"),
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(frame) => dispatcher.handle_frame(frame),
                Err(err) => {
                    state.bus.send_to_session(
                        session_id,
                        SESSION_ERROR_TOPIC,
                        ServerEvent::Error(RoomError::validation(
                            "",
                            &format!("malformed message: {err}"),
                        )),
                    );
                }
            },
            Message::Close(_) => break,
            // Ping/Pong are answered by the protocol layer.
            _ => {}
        }
    }

    dispatcher.on_disconnect();
    debug!(%session_id, "websocket disconnected");
    counter!(keys::WS_DISCONNECTION).increment(1);
    gauge!(keys::WS_ACTIVE).decrement(1.0);
    send_task.abort();
}
