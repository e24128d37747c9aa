//! WebSocket transport: one task pair per connection, JSON frames in
//! both directions. The session token arrives as a query parameter and
//! is resolved once at connect time; events that mutate state are
//! silently dropped for unresolved sessions.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use gridtag_core::events::{ClientEvent, ServerEvent};

use crate::state::AppState;
use crate::store::DocumentStore;
use crate::{arena, lobby, match_loop};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.token))
}

async fn handle_socket(socket: WebSocket, state: AppState, token: Option<String>) {
    let conn_id = Uuid::new_v4().to_string();
    let user = token.as_deref().and_then(|t| state.store.resolve_session(t));
    let (ws_sender, mut ws_receiver) = socket.split();

    let (tx, rx) = mpsc::channel::<Arc<str>>(state.config.limits.player_message_buffer);
    state.broadcaster.register(&conn_id, tx);
    spawn_writer(ws_sender, rx);

    tracing::info!(%conn_id, user = user.as_deref().unwrap_or("<anonymous>"), "Client connected");

    let rate = state.config.limits.ws_rate_limit_per_sec;
    let mut rate_limiter = RateLimiter::new(rate, rate);
    // The room this connection last joined, for events with no room field.
    let mut current_room: Option<String> = None;

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        if !rate_limiter.allow() {
            tracing::warn!(%conn_id, "Rate limited");
            continue;
        }

        let event = match serde_json::from_str::<ClientEvent>(text.as_str()) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "Dropping malformed client event");
                continue;
            }
        };

        dispatch(&state, &conn_id, user.as_deref(), &mut current_room, event);
    }

    if let Some(user) = &user {
        lobby::handle_disconnect(&state, &conn_id, user);
        tracing::info!(%conn_id, user = user.as_str(), "Client disconnected");
    } else {
        state.broadcaster.unregister(&conn_id);
    }
}

fn dispatch(
    state: &AppState,
    conn_id: &str,
    user: Option<&str>,
    current_room: &mut Option<String>,
    event: ClientEvent,
) {
    // Browsing the room list needs no session.
    match &event {
        ClientEvent::LobbyReady => return lobby::handle_lobby_ready(state, conn_id),
        ClientEvent::GetRooms => return lobby::handle_get_rooms(state, conn_id),
        _ => {}
    }
    let Some(user) = user else {
        // Ownership checks get an explicit negative; everything else is
        // ignored for unresolved sessions.
        if let ClientEvent::AmIOwner { .. } = event {
            state
                .broadcaster
                .send_to(conn_id, &ServerEvent::OwnerStatus { is_owner: false });
        } else {
            tracing::debug!(conn_id, "Dropping event from unresolved session");
        }
        return;
    };

    match event {
        ClientEvent::CreateRoom { room_name } => {
            lobby::handle_create_room(state, user, &room_name);
        }
        ClientEvent::JoinRoom { room_id } => {
            if let Some(joined) = lobby::handle_join_room(state, conn_id, user, &room_id) {
                *current_room = Some(joined);
            }
        }
        ClientEvent::JoinTeam { team, room_id } => {
            lobby::handle_join_team(state, conn_id, user, &room_id, team);
        }
        ClientEvent::AmIOwner { room_id } => {
            lobby::handle_am_i_owner(state, conn_id, user, &room_id);
        }
        ClientEvent::StartGame { room_id } => {
            match_loop::handle_start_game(state, user, &room_id);
        }
        ClientEvent::Move { room_id, direction } => {
            arena::handle_move(state, &room_id, user, direction);
        }
        ClientEvent::RequestPositions => {
            if let Some(room_id) = current_room {
                arena::handle_request_positions(state, conn_id, room_id);
            }
        }
        ClientEvent::LobbyReady | ClientEvent::GetRooms => {}
    }
}

fn spawn_writer(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Arc<str>>,
) {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender
                .send(Message::Text(frame.as_ref().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });
}

/// Per-connection rate limiter (token bucket).
struct RateLimiter {
    tokens: f64,
    last_refill: tokio::time::Instant,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: tokio::time::Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// Returns true if the message is allowed; false if rate-limited.
    fn allow(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rate_limiter_recovers_over_time() {
        let mut limiter = RateLimiter::new(2.0, 1.0);
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());

        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }

    #[tokio::test]
    async fn unresolved_sessions_cannot_mutate() {
        let state = AppState::new(crate::config::ServerConfig::default());
        let mut current_room = None;
        dispatch(
            &state,
            "c1",
            None,
            &mut current_room,
            ClientEvent::CreateRoom {
                room_name: "arena".into(),
            },
        );
        assert!(state.store.rooms_in_lobby().is_empty());
    }
}
