//! WebSocket upgrade + message loop. Each socket owns one quiz session. Each client
//! message is parsed as JSON and forwarded to core logic; we reply with a single JSON
//! message per request, so events for the session are handled strictly one at a time.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::Mutex;
use tracing::{info, error, instrument, debug};

use crate::protocol::{to_event, ClientWsMessage, ServerWsMessage};
use crate::logic::*;
use crate::quiz::Session;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "watchlearn", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "watchlearn", "WebSocket connected");
  let session = Mutex::new(Session::Idle);
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let out = handle_text(&txt, &state, &session).await;
        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "watchlearn", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "watchlearn", "WebSocket disconnected");
}

/// Parse, dispatch, serialize response.
async fn handle_text(txt: &str, state: &AppState, session: &Mutex<Session>) -> String {
  let reply_msg = match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "watchlearn", "WS received: {:?}", &incoming);
      handle_client_ws(incoming, state, session).await
    }
    Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
  };

  serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

#[instrument(level = "info", skip(state, session))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session: &Mutex<Session>) -> ServerWsMessage {
  let result = match &msg {
    ClientWsMessage::Ping => return ServerWsMessage::Pong,
    ClientWsMessage::State => Ok(current_view(state, session).await),
    ClientWsMessage::Start => start_quiz(state, session).await,
    _ => match to_event(&msg) {
      Some(event) => apply_event(state, session, event).await,
      None => return ServerWsMessage::Error { message: "Unsupported message.".into() },
    },
  };

  match result {
    Ok(view) => ServerWsMessage::Quiz { view },
    Err(e) => {
      tracing::info!(target: "quiz", error = %e, "WS request failed");
      ServerWsMessage::Error { message: e.to_string() }
    }
  }
}
