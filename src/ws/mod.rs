pub mod handlers;
mod host;
mod player;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::protocol::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
use crate::state::AppState;
use crate::sync::SyncLoop;
use crate::types::SessionContext;
use crate::view::ClientView;

/// One connection's place in a room, plus the sync loop feeding it views
pub struct Session {
    ctx: Option<SessionContext>,
    views: mpsc::UnboundedSender<ClientView>,
    sync: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(views: mpsc::UnboundedSender<ClientView>) -> Self {
        Self {
            ctx: None,
            views,
            sync: None,
        }
    }

    pub fn ctx(&self) -> Option<&SessionContext> {
        self.ctx.as_ref()
    }

    /// Bind the connection to a room and start syncing it. Replaces any
    /// previous room this connection was in.
    pub fn attach(&mut self, state: &Arc<AppState>, ctx: SessionContext) {
        if let Some(handle) = self.sync.take() {
            handle.abort();
        }
        let sync = SyncLoop::new(state.clone(), ctx.clone());
        self.sync = Some(sync.spawn(self.views.clone()));
        self.ctx = Some(ctx);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(handle) = self.sync.take() {
            handle.abort();
        }
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::debug!("WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            true
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        categories: state.lexicon.categories(),
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if !send(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        return;
    }

    let (views_tx, mut views_rx) = mpsc::unbounded_channel();
    let mut session = Session::new(views_tx);

    loop {
        tokio::select! {
            // Views rendered by this connection's sync loop
            Some(view) = views_rx.recv() => {
                if !send(&mut sender, &ServerMessage::View { view }).await {
                    break;
                }
            }

            // Handle client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handlers::handle_message(client_msg, &mut session, &state).await
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::error(
                                    "PARSE_ERROR",
                                    format!("Invalid message format: {}", e),
                                ))
                            }
                        };

                        if let Some(response) = response {
                            if !send(&mut sender, &response).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::debug!("WebSocket closed by client");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    match session.ctx() {
        Some(ctx) => tracing::info!(
            room_code = ctx.room_code,
            player_id = %ctx.player_id,
            "WebSocket connection closed"
        ),
        None => tracing::debug!("WebSocket connection closed before joining a room"),
    }
}
