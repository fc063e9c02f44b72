use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use tokio::sync::broadcast::error::RecvError;

use crate::state::app::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new().route("/ws", get(upgrade)).with_state(state)
}

/// GET /api/ws
///
/// Upgrade and start forwarding updates.
async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One task per connected tab.
///
/// Forwards every published update until the transport reports close or
/// error; that is the only thing that unsubscribes a connection. A client
/// that lags past the channel capacity just misses the skipped events and
/// catches up on its next snapshot reload.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut updates = state.updates.subscribe();

    tracing::debug!("subscriber connected");

    loop {
        tokio::select! {
            event = updates.recv() => {
                match event {
                    Ok(msg) => {
                        let Ok(text) = serde_json::to_string(&msg) else {
                            continue;
                        };
                        if socket.send(Message::Text(text)).await.is_err() {
                            break; // client disconnected
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("subscriber lagged, skipped {skipped} updates");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {} // ignore anything else the client sends
                }
            }
        }
    }

    tracing::debug!("subscriber disconnected");
}
