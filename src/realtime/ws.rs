use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use sea_orm::EntityTrait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedSender};
use uuid::Uuid;

use crate::{
    entity::Restaurants,
    error::{AppError, AppResult},
    extract::Query,
    middleware::auth::{AuthUser, decode_token, ensure_owner_or_admin, token_from_headers},
    realtime::{hub::{ConnectionId, encode_frame}, user_room},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum ClientMessage {
    Join { room: String },
    Leave { room: String },
}

/// Authenticates before upgrading; a bad token never reaches the socket.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .or_else(|| token_from_headers(&headers))
        .ok_or_else(|| AppError::Unauthorized("Authentication token is required".into()))?;
    let user = decode_token(&token, &state.config.jwt_secret)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user: AuthUser) {
    let conn = state.hub.next_connection_id();
    tracing::info!(user_id = %user.user_id, conn, "websocket connected");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    state.hub.join(&user_room(user.user_id), conn, tx.clone());
    send_event(&tx, "connected", json!({ "userId": user.user_id }));

    let mut forward = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    handle_client_message(&state, &user, conn, &tx, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(err)) => {
                    tracing::warn!(user_id = %user.user_id, conn, error = %err, "websocket error");
                    break;
                }
                Some(Ok(_)) => {}
            },
            _ = &mut forward => break,
        }
    }

    forward.abort();
    state.hub.leave_all(conn);
    tracing::info!(user_id = %user.user_id, conn, "websocket disconnected");
}

async fn handle_client_message(
    state: &AppState,
    user: &AuthUser,
    conn: ConnectionId,
    tx: &UnboundedSender<String>,
    text: &str,
) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(_) => {
            send_error(tx, "Unsupported message");
            return;
        }
    };

    match message {
        ClientMessage::Join { room } => match authorize_room(state, user, &room).await {
            Ok(()) => {
                state.hub.join(&room, conn, tx.clone());
                tracing::debug!(user_id = %user.user_id, conn, %room, "joined room");
            }
            Err(err) => {
                tracing::debug!(user_id = %user.user_id, %room, error = %err, "join refused");
                send_error(tx, &err.to_string());
            }
        },
        ClientMessage::Leave { room } => {
            state.hub.leave(&room, conn);
            tracing::debug!(user_id = %user.user_id, conn, %room, "left room");
        }
    }
}

/// Restaurant rooms are for the owner and admins; user rooms only for that user.
pub async fn authorize_room(state: &AppState, user: &AuthUser, room: &str) -> AppResult<()> {
    if let Some(raw) = room.strip_prefix("restaurant_") {
        let id = parse_room_id(raw)?;
        let restaurant = Restaurants::find_by_id(id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::not_found("Restaurant"))?;
        return ensure_owner_or_admin(restaurant.owner_id, user);
    }
    if let Some(raw) = room.strip_prefix("user_") {
        if parse_room_id(raw)? == user.user_id {
            return Ok(());
        }
        return Err(AppError::forbidden("You cannot join another user's room"));
    }
    Err(AppError::BadRequest("Unknown room".into()))
}

fn parse_room_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid room".into()))
}

fn send_event(tx: &UnboundedSender<String>, event: &str, data: serde_json::Value) {
    match encode_frame(event, data) {
        Ok(frame) => {
            let _ = tx.send(frame);
        }
        Err(err) => tracing::warn!(event, error = %err, "failed to encode frame"),
    }
}

fn send_error(tx: &UnboundedSender<String>, message: &str) {
    send_event(tx, "error", json!({ "message": message }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_and_leave_actions() {
        let join: ClientMessage =
            serde_json::from_str(r#"{"action":"join","room":"restaurant_1"}"#).unwrap();
        assert!(matches!(join, ClientMessage::Join { room } if room == "restaurant_1"));

        let leave: ClientMessage =
            serde_json::from_str(r#"{"action":"leave","room":"user_2"}"#).unwrap();
        assert!(matches!(leave, ClientMessage::Leave { .. }));

        assert!(serde_json::from_str::<ClientMessage>(r#"{"action":"shout"}"#).is_err());
    }
}
