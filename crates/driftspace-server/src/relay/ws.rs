use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use uuid::Uuid;

use driftspace_sync::RelayFrame;

use crate::AppState;

/// WebSocket handler for a document's relay channel
async fn ws_handler(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, document_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, document_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();

    let room = state.rooms.get_or_create(document_id).await;
    let connection = state.rooms.next_connection_id();
    let mut frames = room.subscribe();

    // Forward room traffic to this client, skipping its own frames
    let mut send_task = tokio::spawn(async move {
        while let Ok(envelope) = frames.recv().await {
            if envelope.origin == connection {
                continue;
            }
            let text = match serde_json::to_string(&envelope.frame) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Failed to serialize relay frame: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming frames from this client
    let room_recv = room.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let frame: RelayFrame = match serde_json::from_str(&text) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::debug!("Dropping malformed relay frame: {}", e);
                            continue;
                        }
                    };
                    // document ids are normalized to this channel's document
                    match frame {
                        RelayFrame::Join { peer, .. } => {
                            room_recv.join(connection, peer).await;
                        }
                        RelayFrame::Delta { delta, .. } => {
                            room_recv.relay(connection, RelayFrame::Delta { document_id, delta });
                        }
                        RelayFrame::CursorMove { peer_id, range, .. } => {
                            room_recv.relay(
                                connection,
                                RelayFrame::CursorMove {
                                    document_id,
                                    peer_id,
                                    range,
                                },
                            );
                        }
                        // rosters are authored by the hub, never by clients
                        RelayFrame::RosterSync { .. } => {}
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    room.leave(connection).await;
    state.rooms.remove_if_idle(document_id).await;

    tracing::debug!("Relay connection closed for document {}", document_id);
}

pub fn router() -> Router<AppState> {
    Router::new().route("/relay/{document_id}", get(ws_handler))
}
