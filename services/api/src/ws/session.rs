//! Manages the WebSocket connection lifecycle for one interview.

use super::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use anyhow::{Result, anyhow};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use interview_core::{InterviewConfig, InterviewSession, SessionEvent, SessionHandle};
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual WebSocket connection.
///
/// Performs the `init` handshake, starts an interview session and then
/// relays messages between the socket and the session until either side
/// finishes.
#[instrument(name = "ws_session", skip_all, fields(session_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("New WebSocket connection. Awaiting initialization...");
    let (mut socket_tx, mut socket_rx) = socket.split();

    let config = match read_init(&mut socket_rx).await {
        Ok(Some(config)) => config,
        Ok(None) => {
            info!("Client disconnected before sending init message.");
            return;
        }
        Err(e) => {
            error!("Session initialization failed: {:?}", e);
            let _ = send_msg(
                &mut socket_tx,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return;
        }
    };

    let session_id = Uuid::new_v4();
    tracing::Span::current().record("session_id", tracing::field::display(session_id));
    info!(field = %config.field, level = %config.level, "Starting interview");

    if send_msg(&mut socket_tx, ServerMessage::Initialized { session_id })
        .await
        .is_err()
    {
        error!("Failed to send Initialized message to client.");
        return;
    }

    let (handle, events) =
        InterviewSession::spawn(session_id.to_string(), state.session_deps(), config);
    if let Err(e) = relay(&handle, events, socket_tx, socket_rx).await {
        error!(error = ?e, "Interview connection terminated with error.");
    }
    // No-op when the session already finished.
    let _ = handle.shutdown().await;
    info!("WebSocket connection closed.");
}

/// Reads the first message, which must be `init`.
async fn read_init(socket_rx: &mut SplitStream<WebSocket>) -> Result<Option<InterviewConfig>> {
    let Some(first) = socket_rx.next().await else {
        return Ok(None);
    };
    match first? {
        Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text)? {
            ClientMessage::Init { config } => Ok(Some(config)),
            _ => Err(anyhow!("First message must be `init`")),
        },
        Message::Close(_) => Ok(None),
        _ => Err(anyhow!("First message was not a text `init` message.")),
    }
}

/// Relays client signals into the session and session events out to the client.
async fn relay(
    handle: &SessionHandle,
    mut events: Receiver<SessionEvent>,
    mut socket_tx: SplitSink<WebSocket, Message>,
    mut socket_rx: SplitStream<WebSocket>,
) -> Result<()> {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => send_msg(&mut socket_tx, event.into()).await?,
                None => {
                    info!("Interview session finished; closing connection.");
                    let _ = socket_tx.close().await;
                    break;
                }
            },
            msg_result = socket_rx.next() => match msg_result {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(msg) => forward(handle, msg).await,
                        Err(e) => {
                            warn!(error = %e, "Ignoring malformed client message.");
                            let error = ServerMessage::Error { message: e.to_string() };
                            send_msg(&mut socket_tx, error).await?;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Client closed the connection.");
                    break;
                }
                Some(Ok(_)) => debug!("Ignoring non-text frame."),
                Some(Err(e)) => {
                    error!("Error receiving from client WebSocket: {:?}", e);
                    break;
                }
            },
        }
    }
    Ok(())
}

async fn forward(handle: &SessionHandle, msg: ClientMessage) {
    let sent = match msg {
        ClientMessage::CandidateMessage { text } => handle.submit(text).await,
        ClientMessage::InterviewerSpeakingStarted => handle.interviewer_started_speaking().await,
        ClientMessage::InterviewerSpeakingStopped => handle.interviewer_stopped_speaking().await,
        ClientMessage::EndInterview => handle.end().await,
        ClientMessage::Init { .. } => {
            warn!("Ignoring repeated `init` message.");
            Ok(())
        }
    };
    if let Err(e) = sent {
        debug!(error = %e, "Dropping client signal");
    }
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    msg: ServerMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}
