use chrono::Duration;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::code::{ensure_valid_code, generate_session_code};
use super::SessionError;
use crate::models::{Role, SessionRecord, SessionSummary};
use crate::store::{RealtimeStore, ServerValue, StorePath};

const CREATE_ATTEMPTS: usize = 5;

/// Who is opening a session.
#[derive(Debug, Clone)]
pub struct Creator {
    pub name: String,
    pub id: String,
}

pub fn session_path(code: &str) -> Result<StorePath, SessionError> {
    ensure_valid_code(code)?;
    Ok(StorePath::session(code)?)
}

/// Read and decode the session subtree. `None` when nothing is stored.
pub fn read_session(store: &RealtimeStore, code: &str) -> Result<Option<SessionRecord>, SessionError> {
    let value = store.get(&session_path(code)?);
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}

/// Create the session metadata at `code`. Fails if anything is stored there.
pub fn open_session(store: &RealtimeStore, code: &str, creator: &Creator) -> Result<i64, SessionError> {
    let path = session_path(code)?;
    let outcome = store.transaction(&path, |current| {
        current.is_null().then(|| {
            json!({
                "created": ServerValue::timestamp(),
                "createdBy": creator.name,
                "creatorId": creator.id,
                "status": "active",
            })
        })
    });
    if !outcome.committed {
        return Err(SessionError::AlreadyExists(code.to_string()));
    }
    let created = outcome.snapshot.get("created").and_then(Value::as_i64).unwrap_or_default();
    info!("Session '{}' created by '{}'", code, creator.name);
    Ok(created)
}

/// Create a session under a freshly generated code.
pub fn create_session(store: &RealtimeStore, creator: &Creator) -> Result<(String, i64), SessionError> {
    for _ in 0..CREATE_ATTEMPTS {
        let code = generate_session_code();
        match open_session(store, &code, creator) {
            Ok(created) => return Ok((code, created)),
            Err(SessionError::AlreadyExists(_)) => {
                debug!("Generated session code '{}' is taken, retrying", code);
            }
            Err(e) => return Err(e),
        }
    }
    Err(SessionError::Malformed("Could not allocate a free session code".to_string()))
}

/// Check whether a participant with `role` may join `code` at `now_millis`.
///
/// Candidates need a session opened by an interviewer that is younger than
/// `max_age`. Interviewers may join a code that does not exist yet, in which
/// case `Ok(None)` is returned. Nobody may join a terminated session.
pub fn validate_session(
    store: &RealtimeStore,
    code: &str,
    role: Role,
    max_age: Duration,
    now_millis: i64,
) -> Result<Option<SessionRecord>, SessionError> {
    let record = read_session(store, code)?;
    if role == Role::Candidate {
        let Some(session) = record.as_ref() else {
            return Err(SessionError::NotFound(code.to_string()));
        };
        let (Some(created), Some(_)) = (session.created, session.created_by.as_ref()) else {
            return Err(SessionError::NotCreated);
        };
        if now_millis - created > max_age.num_milliseconds() {
            return Err(SessionError::Expired);
        }
    }
    if record.as_ref().is_some_and(SessionRecord::is_terminated) {
        return Err(SessionError::Terminated);
    }
    Ok(record)
}

/// Dashboard listing. Ended sessions come newest-terminated first, active
/// ones newest-created first.
pub fn list_sessions(store: &RealtimeStore, archived: bool) -> Vec<SessionSummary> {
    let value = store.get(&StorePath::sessions());
    let Some(sessions) = value.as_object() else {
        return Vec::new();
    };
    let mut summaries: Vec<SessionSummary> = sessions
        .iter()
        .filter_map(|(code, raw)| match serde_json::from_value::<SessionRecord>(raw.clone()) {
            Ok(record) => Some(summarize(code, record)),
            Err(e) => {
                warn!("Skipping malformed session '{}': {}", code, e);
                None
            }
        })
        .filter(|summary| summary.is_terminated == archived)
        .collect();
    if archived {
        summaries.sort_by(|a, b| b.terminated_at.cmp(&a.terminated_at));
    } else {
        summaries.sort_by(|a, b| b.created.cmp(&a.created));
    }
    summaries
}

fn summarize(code: &str, record: SessionRecord) -> SessionSummary {
    let is_terminated = record.is_terminated();
    // Ended sessions have no live users left; fall back to the preserved list.
    let participants: Vec<String> = if record.users.is_empty() {
        record.preserved_participants.values().map(|p| p.name.clone()).collect()
    } else {
        record.users.values().map(|u| u.name.clone()).collect()
    };
    SessionSummary {
        code: code.to_string(),
        created: record.created.unwrap_or_default(),
        created_by: record.created_by.unwrap_or_default(),
        participant_count: participants.len(),
        participants,
        is_terminated,
        terminated_at: record.terminated.filter(|t| t.terminated).map(|t| t.terminated_at),
    }
}

/// Hard delete. Returns whether anything was stored.
pub fn delete_session(store: &RealtimeStore, code: &str) -> Result<bool, SessionError> {
    let path = session_path(code)?;
    let outcome = store.transaction(&path, |current| (!current.is_null()).then_some(Value::Null));
    if outcome.committed {
        info!("Session '{}' deleted", code);
    }
    Ok(outcome.committed)
}

pub fn delete_all_sessions(store: &RealtimeStore) -> usize {
    let root = StorePath::sessions();
    let mut deleted = 0;
    store.transaction(&root, |current| {
        deleted = current.as_object().map_or(0, |sessions| sessions.len());
        (deleted > 0).then_some(Value::Null)
    });
    info!("Deleted {} session(s)", deleted);
    deleted
}
