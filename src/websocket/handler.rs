use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    error::{AppError, Result},
    extract::ApiQuery,
    middleware::AuthUser,
    state::AppState,
    websocket::{
        connection::{ConnectionId, RoomRegistry, WsSender},
        types::{ClientMessage, ErrorPayload, WsMessage},
    },
};

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: Option<String>,
}

/// WebSocket upgrade handler. Browsers cannot set headers on the upgrade
/// request, so the access token travels in the query string.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WsAuthQuery>,
) -> Result<Response> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Authentication("Access token is required".to_string()))?;
    let user = state.auth_service.authenticate(&token).await?;
    let caller = AuthUser::from(&user);

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, caller, state.rooms)))
}

async fn handle_socket(socket: WebSocket, caller: AuthUser, rooms: RoomRegistry) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let connection = rooms.next_connection_id();

    rooms.join(caller.id, connection, tx.clone());
    tracing::info!("WebSocket connected: user {} (connection {})", caller.id, connection);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!("Failed to encode frame: {:?}", e),
            }
        }
    });

    let recv_rooms = rooms.clone();
    let recv_caller = caller.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if let Err(e) =
                        process_client_message(&text, &recv_caller, connection, &recv_rooms, &tx)
                    {
                        tracing::debug!("Rejected frame from user {}: {}", recv_caller.id, e);
                        let _ = tx.send(WsMessage::Error(ErrorPayload {
                            message: client_message(&e),
                        }));
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    rooms.leave_all(connection);
    tracing::info!("WebSocket disconnected: user {} (connection {})", caller.id, connection);
}

fn client_message(err: &AppError) -> String {
    match err {
        AppError::Validation(msg) | AppError::Forbidden(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// Applies one client frame. Relays are fire and forget.
fn process_client_message(
    text: &str,
    caller: &AuthUser,
    connection: ConnectionId,
    rooms: &RoomRegistry,
    tx: &WsSender,
) -> Result<()> {
    let frame: ClientMessage = serde_json::from_str(text)
        .map_err(|e| AppError::Validation(format!("Invalid message format: {}", e)))?;

    match frame {
        ClientMessage::JoinUserRoom(payload) => {
            if payload.user_id != caller.id && !caller.is_admin() {
                return Err(AppError::Forbidden(
                    "You can only join your own room".to_string(),
                ));
            }
            rooms.join(payload.user_id, connection, tx.clone());
        }
        ClientMessage::TaskUpdated(mut payload) => {
            payload.updated_by = caller.id;
            if let Some(recipient) = payload.recipient() {
                rooms.send_to_user(recipient, WsMessage::TaskUpdated(payload));
            }
        }
        ClientMessage::NotificationCreated(notification) => {
            rooms.send_to_user(
                notification.user_id,
                WsMessage::NotificationCreated(notification),
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_task, sample_user};
    use crate::user::user_models::Role;
    use crate::websocket::types::{TaskAction, TaskUpdatedPayload};
    use serde_json::json;
    use uuid::Uuid;

    fn caller(role: Role) -> AuthUser {
        AuthUser::from(&sample_user("caller@amc.com", role))
    }

    #[test]
    fn test_join_other_room_requires_admin() {
        let rooms = RoomRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let other = Uuid::new_v4();
        let frame = json!({"event": "join-user-room", "data": {"userId": other}}).to_string();

        let user = caller(Role::User);
        let err = process_client_message(&frame, &user, 1, &rooms, &tx).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(rooms.room_size(other), 0);

        let admin = caller(Role::Admin);
        process_client_message(&frame, &admin, 2, &rooms, &tx).unwrap();
        assert_eq!(rooms.room_size(other), 1);
    }

    #[test]
    fn test_task_relay_uses_authenticated_sender() {
        let rooms = RoomRegistry::new();
        let (own_tx, _own_rx) = mpsc::unbounded_channel();
        let (assignee_tx, mut assignee_rx) = mpsc::unbounded_channel();
        let user = caller(Role::User);
        let assignee = Uuid::new_v4();
        rooms.join(assignee, 7, assignee_tx);

        let mut task = sample_task("Relay me");
        task.assigned_to = Some(assignee);
        // A spoofed updater equal to the assignee would otherwise suppress delivery.
        let spoofed = TaskUpdatedPayload::new(&task, assignee, TaskAction::Updated);
        let frame = serde_json::to_string(&ClientMessage::TaskUpdated(spoofed)).unwrap();

        process_client_message(&frame, &user, 1, &rooms, &own_tx).unwrap();
        match assignee_rx.try_recv().unwrap() {
            WsMessage::TaskUpdated(payload) => assert_eq!(payload.updated_by, user.id),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_frame_is_rejected() {
        let rooms = RoomRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let err = process_client_message("{\"event\":\"dance\"}", &caller(Role::User), 1, &rooms, &tx)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(client_message(&err).starts_with("Invalid message format"));
    }
}
