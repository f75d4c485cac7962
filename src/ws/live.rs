use std::sync::Arc;
use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use chrono::Utc;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::error::{ApiError, ApiResult, AuthError};
use crate::models::{
    DocumentMessage, ErrorMessage, PongMessage, PresenceMessage, ReceivedMessage, Role, RosterMessage,
    SendMessage, TerminatedMessage, WelcomeMessage,
};
use crate::services::auth_service::{get_auth_token, Claims};
use crate::session::{JoinRequest, SessionError, SessionEvent, SessionHandle, TERMINATION_NOTICE};
use crate::state::AppState;

type Sender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

#[derive(Deserialize)]
pub struct LiveQuery {
    name: Option<String>,
    token: Option<String>,
    /// Rejoin with a previous participant id.
    id: Option<String>,
}

/// Upgrade to a live session socket. The join is validated before upgrading
/// so rejected joins get a plain HTTP error.
pub async fn live_session(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<LiveQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    info!("New live connection attempt for session '{}'", code);
    let claims = optional_claims(&state, query.token.as_deref(), &headers)?;
    let role = match &claims {
        Some(c) if c.is_admin => Role::Interviewer,
        _ => Role::Candidate,
    };
    let name = query
        .name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| claims.as_ref().filter(|c| c.is_admin).map(|c| c.email.clone()))
        .ok_or_else(|| ApiError::Validation("Name required".to_string()))?;

    let request = JoinRequest {
        participant_id: query.id.filter(|id| !id.is_empty()),
        name,
        role,
        max_age: state.config.session_max_age(),
    };
    let handle = SessionHandle::join(&state.store, &code, request)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, handle)))
}

// A token is optional, but one that is present must be a valid access token.
fn optional_claims(state: &AppState, query_token: Option<&str>, headers: &HeaderMap) -> ApiResult<Option<Claims>> {
    let token = match query_token.filter(|t| !t.is_empty()) {
        Some(token) => token.to_string(),
        None => match get_auth_token(headers) {
            Ok(token) => token,
            Err(AuthError::MissingToken) => return Ok(None),
            Err(e) => return Err(e.into()),
        },
    };
    let claims = state.tokens.validate(&token)?;
    if claims.token_type.is_some() {
        return Err(AuthError::InvalidToken.into());
    }
    Ok(Some(claims))
}

async fn handle_socket(socket: WebSocket, mut handle: SessionHandle) {
    let code = handle.code().to_string();
    info!("Live connection established for session '{}' as '{}'", code, handle.participant().id);

    // Split the socket into sender and receiver
    let (sender, mut receiver) = socket.split();
    let sender: Sender = Arc::new(Mutex::new(sender));

    let welcome = SendMessage::Welcome(WelcomeMessage {
        participant: handle.participant().clone(),
        roster: handle.roster(),
        settings: handle.settings().clone(),
        document: handle.document().to_string(),
        read_only: handle.is_read_only(),
    });
    if !send(&sender, &welcome).await {
        handle.teardown();
        return;
    }

    // Socket reader: forwards parsed client messages to the session task
    let (commands_tx, mut commands_rx) = mpsc::unbounded_channel::<ReceivedMessage>();
    let reader_code = code.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            match serde_json::from_str::<ReceivedMessage>(&text) {
                Ok(command) => {
                    if commands_tx.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to parse message for session '{}': {}", reader_code, e),
            }
        }
    });

    // Session task: owns the handle, applies commands and relays events
    let session_sender = sender.clone();
    let mut session_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                command = commands_rx.recv() => {
                    let Some(command) = command else { break };
                    if let Some(reply) = apply_command(&mut handle, command) {
                        if !send(&session_sender, &reply).await {
                            break;
                        }
                    }
                }
                event = handle.next_event() => {
                    let Some(event) = event else { break };
                    if !send(&session_sender, &event_message(&handle, event)).await {
                        break;
                    }
                }
            }
        }
        handle.teardown();
    });

    // Wait for either side to finish; the session task always tears down
    tokio::select! {
        _ = (&mut recv_task) => {
            if let Err(e) = session_task.await {
                error!("Session task for '{}' failed: {}", code, e);
            }
        }
        _ = (&mut session_task) => recv_task.abort(),
    };
    info!("Live connection for session '{}' terminated", code);
}

fn apply_command(handle: &mut SessionHandle, command: ReceivedMessage) -> Option<SendMessage> {
    debug!("Received {:?} in session '{}'", command, handle.code());
    let result = match command {
        ReceivedMessage::Edit(edit) => handle.write_document(&edit.content),
        ReceivedMessage::Setting(setting) => handle.update_setting(setting.key, &setting.value),
        ReceivedMessage::End(end) => handle.end_session(end.language).map(|outcome| {
            if outcome.already_terminated {
                debug!("Session '{}' was already terminated", handle.code());
            }
        }),
        ReceivedMessage::Ping(_) => {
            return Some(SendMessage::Pong(PongMessage { date: Utc::now().to_rfc3339() }));
        }
    };
    result.err().map(|e: SessionError| {
        warn!("Rejected command in session '{}': {}", handle.code(), e);
        SendMessage::Error(ErrorMessage { error: e.to_string() })
    })
}

fn event_message(handle: &SessionHandle, event: SessionEvent) -> SendMessage {
    match event {
        SessionEvent::Joined(participant) => SendMessage::Joined(PresenceMessage {
            message: format!("{} joined the session", participant.name),
            participant,
        }),
        SessionEvent::Left(participant) => SendMessage::Left(PresenceMessage {
            message: format!("{} left the session", participant.name),
            participant,
        }),
        SessionEvent::Roster { participants, label } => SendMessage::Roster(RosterMessage { participants, label }),
        SessionEvent::Terminated(record) => SendMessage::Terminated(TerminatedMessage {
            record,
            notice: TERMINATION_NOTICE.to_string(),
            read_only: handle.is_read_only(),
        }),
        SessionEvent::SettingsChanged(settings) => SendMessage::Settings(settings),
        SessionEvent::DocumentChanged(content) => SendMessage::Document(DocumentMessage { content }),
    }
}

async fn send(sender: &Sender, message: &SendMessage) -> bool {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to serialize outgoing message: {}", e);
            return false;
        }
    };
    sender.lock().await.send(Message::Text(text)).await.is_ok()
}
