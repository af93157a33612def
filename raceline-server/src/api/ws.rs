use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use raceline_core::events::NotificationReceiver;
use raceline_sdk::objects::{WsCloseCode, WsServerMessage};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;

use crate::state::AppState;

/// `GET /ws`: WebSocket notification stream.
///
/// Upgrades the HTTP connection to a WebSocket and relays every cache
/// mutation published on the notification bus as a [`WsServerMessage`]
/// JSON frame. Nothing is replayed on connect.
pub(super) async fn notifications_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    // Subscribe before the upgrade completes so that nothing published
    // during the handshake is missed.
    let notifications = state.bus.subscribe();
    let shutdown_rx = state.shutdown_rx.clone();
    ws.on_upgrade(move |socket| relay_notifications(socket, notifications, shutdown_rx))
}

/// Background task that drives a single WebSocket connection until the
/// client leaves, the bus closes or the server shuts down.
async fn relay_notifications(
    mut socket: WebSocket,
    mut notifications: NotificationReceiver,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    tracing::debug!("WS: notification subscriber connected");

    let close_code = loop {
        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break WsCloseCode::GOING_AWAY;
                }
            }

            result = notifications.recv() => {
                let msg = match result {
                    Ok(notification) => WsServerMessage::from(&notification),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "WS: notification subscriber lagged");
                        WsServerMessage::Lagged { skipped }
                    }
                    Err(RecvError::Closed) => break WsCloseCode::GOING_AWAY,
                };
                if send_json(&mut socket, &msg).await.is_err() {
                    tracing::debug!("WS: send failed, dropping subscriber");
                    return;
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                        tracing::debug!("WS: notification subscriber left");
                        return;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    };

    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: close_code,
            reason: "server shutting down".into(),
        })))
        .await;
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
