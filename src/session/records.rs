//! Per-session records written outside the live protocol: interviewer
//! notes, candidate activity and tracking events.

use serde_json::{json, Map, Value};
use tracing::debug;

use super::lifecycle::session_path;
use super::SessionError;
use crate::models::{ActivityKind, ActivityResponse, InterviewerNotes, TrackingRecord, UpdateNotesRequest};
use crate::store::rules::{authorize_read, authorize_write, Actor};
use crate::store::{RealtimeStore, ServerValue, StorePath, TransactionOutcome};

const NOTES: &str = "interviewerNotes";
const ACTIVITY_SUMMARY: &str = "activity_summary";
const ACTIVITY_FINAL: &str = "activity_final_summary";
const ACTIVITY_LOG: &str = "activity_log";
const TRACKING: &str = "tracking";

// Guarded read-modify-write of `sessions/{code}/{relative}`: the session must
// exist and `actor` must be allowed to write there.
fn guarded_update<F>(
    store: &RealtimeStore,
    code: &str,
    actor: &Actor,
    relative: &StorePath,
    update: F,
) -> Result<TransactionOutcome, SessionError>
where
    F: FnOnce(&Value) -> Option<Value>,
{
    let path = session_path(code)?;
    store.scoped_transaction(&path, relative, |session, current| {
        if session.is_null() {
            return Err(SessionError::NotFound(code.to_string()));
        }
        authorize_write(actor, relative, session)?;
        Ok(update(current))
    })
}

fn guarded_read(store: &RealtimeStore, code: &str, actor: &Actor, relative: &StorePath) -> Result<Value, SessionError> {
    authorize_read(actor, relative)?;
    Ok(store.get(&session_path(code)?.join(relative)))
}

pub fn get_notes(store: &RealtimeStore, code: &str, actor: &Actor) -> Result<Option<InterviewerNotes>, SessionError> {
    let value = guarded_read(store, code, actor, &StorePath::parse(NOTES)?)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}

/// Merge `update` into the stored notes. `createdAt`/`createdBy` are set on
/// first write, `updatedAt` on every write.
pub fn update_notes(
    store: &RealtimeStore,
    code: &str,
    actor: &Actor,
    author: &str,
    update: UpdateNotesRequest,
) -> Result<InterviewerNotes, SessionError> {
    let relative = StorePath::parse(NOTES)?;
    let outcome = guarded_update(store, code, actor, &relative, |current| {
        let mut notes = current.as_object().cloned().unwrap_or_default();
        if let Some(content) = update.content {
            notes.insert("content".to_string(), json!(content));
        }
        if let Some(rating) = update.rating {
            notes.insert("rating".to_string(), json!({"overall": rating.min(5)}));
        }
        if let Some(tags) = update.tags {
            notes.insert("tags".to_string(), json!(tags));
        }
        if let Some(recommendation) = update.recommendation {
            notes.insert("recommendation".to_string(), json!(recommendation));
        }
        if !notes.contains_key("createdAt") {
            notes.insert("createdAt".to_string(), ServerValue::timestamp());
            notes.insert("createdBy".to_string(), json!(author));
        }
        notes.insert("updatedAt".to_string(), ServerValue::timestamp());
        Some(Value::Object(notes))
    })?;
    Ok(serde_json::from_value(outcome.snapshot)?)
}

/// Store one activity item. Logs are appended and capped at `log_limit`,
/// dropping the oldest.
pub fn save_activity(
    store: &RealtimeStore,
    code: &str,
    actor: &Actor,
    kind: ActivityKind,
    data: Value,
    log_limit: usize,
) -> Result<(), SessionError> {
    match kind {
        ActivityKind::Summary | ActivityKind::Final => {
            let field = if kind == ActivityKind::Summary { ACTIVITY_SUMMARY } else { ACTIVITY_FINAL };
            guarded_update(store, code, actor, &StorePath::parse(field)?, |_| Some(data))?;
        }
        ActivityKind::Log => {
            let key = store.push_key();
            guarded_update(store, code, actor, &StorePath::parse(ACTIVITY_LOG)?, |current| {
                let mut log = current.as_object().cloned().unwrap_or_default();
                log.insert(key, data);
                Some(Value::Object(cap_log(log, log_limit)))
            })?;
        }
    }
    debug!("Saved {:?} activity for session '{}'", kind, code);
    Ok(())
}

fn cap_log(log: Map<String, Value>, limit: usize) -> Map<String, Value> {
    let mut entries: Vec<(String, Value)> = log.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let excess = entries.len().saturating_sub(limit);
    entries.into_iter().skip(excess).collect()
}

/// Activity overview; the final summary takes precedence over the periodic one.
pub fn get_activity(store: &RealtimeStore, code: &str, actor: &Actor) -> Result<ActivityResponse, SessionError> {
    let summary = non_null(guarded_read(store, code, actor, &StorePath::parse(ACTIVITY_SUMMARY)?)?);
    let final_summary = non_null(guarded_read(store, code, actor, &StorePath::parse(ACTIVITY_FINAL)?)?);
    let log = guarded_read(store, code, actor, &StorePath::parse(ACTIVITY_LOG)?)?;
    let mut entries: Vec<(String, Value)> = log.as_object().cloned().unwrap_or_default().into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(ActivityResponse {
        summary: final_summary.clone().or(summary),
        final_summary,
        logs: entries.into_iter().map(|(_, v)| v).collect(),
    })
}

fn non_null(value: Value) -> Option<Value> {
    (!value.is_null()).then_some(value)
}

/// Append a tracking record under `tracking/{timestamp}_{userId}`.
pub fn record_tracking(store: &RealtimeStore, actor: &Actor, record: &TrackingRecord) -> Result<String, SessionError> {
    let key = format!("{}_{}", record.timestamp, record.user_id);
    let relative = StorePath::parse(TRACKING)?.child(&key)?;
    let value = serde_json::to_value(record)?;
    guarded_update(store, &record.session_code, actor, &relative, |_| Some(value))?;
    Ok(key)
}
