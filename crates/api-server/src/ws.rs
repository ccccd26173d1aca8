//! WebSocket handler binding client connections to agent runs
//!
//! One text frame in = one problem statement = one run. Events are
//! relayed back as JSON text frames; delivery is best-effort, and an
//! in-flight run keeps going if the client disconnects.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use agent_loop::{Session, SessionEvent};

use crate::state::AppState;

/// WebSocket upgrade handler
pub async fn agent_ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_agent_socket(socket, state))
}

/// Handle an individual client connection
async fn handle_agent_socket(socket: WebSocket, state: AppState) {
    let session = Arc::new(Session::new(state.runner()));
    info!("Client connected: session={}", session.id());

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Channel for relaying run events to this client
    let (tx, mut rx) = mpsc::channel::<SessionEvent>(100);

    // Task to forward events from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                }
            }
        }
    });

    // Process incoming problem statements
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                start_run(&session, &state, text.to_string(), tx.clone()).await;
            }
            Ok(Message::Close(_)) => {
                info!("Session {} sent close frame", session.id());
                break;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                debug!("Ping/pong from session {}", session.id());
            }
            Ok(Message::Binary(_)) => {
                warn!("Unexpected binary message from session {}", session.id());
            }
            Err(e) => {
                error!("WebSocket error from session {}: {}", session.id(), e);
                break;
            }
        }
    }

    // The run, if any, continues; its events are dropped with the channel.
    info!("Client disconnected: session={}", session.id());
    send_task.abort();
}

/// Start one run for a problem statement, if the session is free
async fn start_run(
    session: &Arc<Session>,
    state: &AppState,
    problem: String,
    tx: mpsc::Sender<SessionEvent>,
) {
    let Some(guard) = session.try_begin() else {
        warn!("Session {} rejected a problem statement mid-run", session.id());
        let _ = tx
            .send(SessionEvent::Error(
                "a run is already in progress for this session".to_string(),
            ))
            .await;
        return;
    };

    let runner = session.runner();
    let session_id = session.id();
    let output_dir = state.config().output_dir.clone();

    tokio::spawn(async move {
        let _guard = guard;

        // Previous generated files are cleared before every run.
        if let Err(e) = agent_loop::reset_dir(&output_dir).await {
            error!("Session {} failed to reset output directory: {}", session_id, e);
            let _ = tx
                .send(SessionEvent::Error(
                    "failed to reset the output directory".to_string(),
                ))
                .await;
            return;
        }

        match runner.run(problem, tx).await {
            Ok(report) => {
                info!(
                    "Session {} run completed in {}ms",
                    session_id, report.duration_ms
                );
            }
            Err(e) => {
                // The terminal error event has already been emitted.
                error!("Session {} run failed: {}", session_id, e);
            }
        }
    });
}
