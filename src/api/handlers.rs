//! HTTP and WebSocket endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Json},
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::{
    error::SyncError,
    protocol::{ClientMessage, ServerMessage},
    state::{AppState, Snapshot},
};
use super::responses::HealthResponse;

/// Handle GET /ws - Upgrade to the timer sync channel
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(HealthResponse::ok(
        state.get_uptime(),
        state.connected_clients(),
        state.timer_count(),
        last_action,
        last_action_time,
    ))
}

/// Drive one client connection until it closes.
///
/// The client first receives the current snapshot, then every snapshot
/// broadcast after it. Inbound `updateTimer` commands are applied to the store;
/// the resulting broadcast reaches this client like any other.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    state.client_connected();

    let (initial, mut snapshots) = state.subscribe();
    let (mut ws_tx, mut ws_rx) = socket.split();

    if send_snapshot(&mut ws_tx, &initial).await {
        loop {
            tokio::select! {
                update = snapshots.recv() => match update {
                    Ok(snapshot) => {
                        if !send_snapshot(&mut ws_tx, &snapshot).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Client fell behind, skipping intermediate snapshots");
                    }
                    Err(RecvError::Closed) => break,
                },

                incoming = ws_rx.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = handle_client_message(&state, &text) {
                            warn!("Ignoring client message: {}", e);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("WebSocket receive error: {}", e);
                        break;
                    }
                },
            }
        }
    }

    state.client_disconnected();
}

/// Decode and apply one client frame
pub fn handle_client_message(state: &AppState, text: &str) -> Result<(), SyncError> {
    let ClientMessage::UpdateTimer(command) = ClientMessage::decode(text)?;

    let record = state.apply_update(&command.timer_id, &command.timer_data)?;
    debug!(
        timer_id = %command.timer_id,
        remaining = record.remaining,
        is_running = record.is_running,
        "Applied timer update"
    );
    Ok(())
}

/// Send one snapshot, returning false once the socket is gone
async fn send_snapshot(ws_tx: &mut SplitSink<WebSocket, Message>, snapshot: &Arc<Snapshot>) -> bool {
    let text = match ServerMessage::StateUpdate(Arc::clone(snapshot)).encode() {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to encode snapshot: {}", e);
            return true;
        }
    };

    match ws_tx.send(Message::Text(text)).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Failed to send snapshot, closing connection: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TimerStore;
    use serde_json::json;

    fn state() -> AppState {
        AppState::new(TimerStore::with_defaults())
    }

    #[test]
    fn applies_update_command() {
        let state = state();
        let text = json!({
            "event": "updateTimer",
            "data": { "timerId": "timer2", "timerData": { "name": "Oven" } }
        })
        .to_string();

        handle_client_message(&state, &text).unwrap();
        assert_eq!(state.get_timer("timer2").unwrap().name, "Oven");
    }

    #[test]
    fn unknown_timer_leaves_others_untouched() {
        let state = state();
        let before = state.snapshot();
        let text = json!({
            "event": "updateTimer",
            "data": { "timerId": "timer9", "timerData": { "isRunning": true } }
        })
        .to_string();

        let err = handle_client_message(&state, &text).unwrap_err();
        assert!(matches!(err, SyncError::UnknownTimer(_)));
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn malformed_frame_is_reported_not_applied() {
        let state = state();
        let before = state.snapshot();

        let err = handle_client_message(&state, "{\"event\":").unwrap_err();
        assert!(matches!(err, SyncError::MalformedMessage(_)));
        assert_eq!(state.snapshot(), before);
    }
}
