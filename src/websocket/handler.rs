use std::sync::Arc;
use axum::{
    extract::{Path, Query, State, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::models::{Envelope, SystemMessage};
use crate::room::{Frame, RoomRegistry, SessionHandle, ANONYMOUS};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub user_email: Option<String>,
}

/// WebSocket handler for `/ws/docs/:document_id`
pub async fn websocket_handler(
    Path(document_id): Path<String>,
    Query(params): Query<ConnectParams>,
    State(app_state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    let identity = params.user_email.unwrap_or_else(|| ANONYMOUS.to_string());
    info!("New WebSocket connection attempt for document {} by {}", document_id, identity);

    let registry = app_state.registry.clone();
    let capacity = app_state.config.session_queue_capacity;
    ws.on_upgrade(move |socket| handle_socket(socket, registry, document_id, identity, capacity))
}

/// Drive one connection from registration to teardown.
async fn handle_socket(
    socket: WebSocket,
    registry: Arc<RoomRegistry>,
    document_id: String,
    identity: String,
    capacity: usize,
) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Frame>(capacity);
    let session = SessionHandle::new(identity, outbound_tx);
    let session_id = session.id();

    registry.join(&document_id, session.clone());
    info!("Session {} ({}) joined document {}", session_id, session.identity(), document_id);
    announce(&registry, &document_id, SystemMessage::join(session.user()), Some(session_id));

    // Writer: drain the bounded queue into the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if sender.send(Message::Text(frame.to_string())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    // Reader: relay every well-formed text frame to the rest of the room.
    let relay_registry = registry.clone();
    let relay_document_id = document_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(Message::Binary(_)) => {
                    debug!("Dropping binary frame from session {}", session_id);
                    continue;
                }
                Ok(_) => continue,
                Err(e) => {
                    debug!("Transport error on session {}: {}", session_id, e);
                    break;
                }
            };

            match Envelope::decode(text) {
                Ok(envelope) => {
                    debug!(
                        "Relaying {} frame from session {} in document {}",
                        envelope.type_name(),
                        session_id,
                        relay_document_id
                    );
                    relay_registry.broadcast(&relay_document_id, &envelope.raw, Some(session_id));
                }
                Err(e) => {
                    warn!("Dropping malformed frame from session {}: {}", session_id, e);
                }
            }
        }
    });

    // Wait for either task to finish (or an eviction) and stop the other
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
        _ = session.evicted() => {
            warn!("Session {} evicted from document {}", session_id, document_id);
            send_task.abort();
            recv_task.abort();
        }
    };

    if let Some(user) = registry.leave(&document_id, session_id) {
        info!("Session {} ({}) left document {}", session_id, user.email, document_id);
        announce(&registry, &document_id, SystemMessage::leave(user), None);
    }
    info!("WebSocket connection terminated");
}

fn announce(registry: &RoomRegistry, document_id: &str, message: SystemMessage, exclude: Option<uuid::Uuid>) {
    match message.to_frame() {
        Ok(frame) => registry.broadcast(document_id, &frame, exclude),
        Err(e) => warn!("Failed to encode presence for document {}: {}", document_id, e),
    }
}
