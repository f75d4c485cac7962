use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::lifecycle::session_path;
use super::SessionError;
use crate::models::{FinalCodeInput, TerminationRecord};
use crate::store::rules::{authorize_write, is_terminated, Actor};
use crate::store::{RealtimeStore, ServerValue, StorePath};

pub const TERMINATION_NOTICE: &str = "This interview has been terminated by the interviewer.";
pub const DASHBOARD_TERMINATOR: &str = "Admin Dashboard";
const DEFAULT_LANGUAGE: &str = "javascript";

#[derive(Debug, Clone, PartialEq)]
pub struct EndOutcome {
    pub already_terminated: bool,
    pub record: TerminationRecord,
}

enum Verdict {
    Missing,
    AlreadyEnded(Value),
    Denied(SessionError),
}

/// End a session in one atomic write.
///
/// Copies the live roster to `preservedParticipants`, snapshots the document
/// into `finalCode` and sets the `terminated` latch. Ending an ended session
/// returns the existing record untouched.
pub fn end_session(
    store: &RealtimeStore,
    code: &str,
    actor: &Actor,
    terminated_by: &str,
    final_code: Option<FinalCodeInput>,
) -> Result<EndOutcome, SessionError> {
    let path = session_path(code)?;
    let latch = StorePath::parse("terminated")?;
    let mut verdict = None;

    let outcome = store.transaction(&path, |current| {
        if current.is_null() {
            verdict = Some(Verdict::Missing);
            return None;
        }
        if is_terminated(current) {
            verdict = Some(Verdict::AlreadyEnded(current.get("terminated").cloned().unwrap_or(Value::Null)));
            return None;
        }
        if let Err(denied) = authorize_write(actor, &latch, current) {
            verdict = Some(Verdict::Denied(denied.into()));
            return None;
        }
        Some(terminated_session(current, terminated_by, final_code))
    });

    if outcome.committed {
        let record = decode_record(outcome.snapshot.get("terminated"))?;
        info!("Session '{}' terminated by '{}'", code, record.terminated_by);
        return Ok(EndOutcome { already_terminated: false, record });
    }
    match verdict {
        Some(Verdict::AlreadyEnded(existing)) => {
            info!("Session '{}' was already terminated", code);
            Ok(EndOutcome { already_terminated: true, record: decode_record(Some(&existing))? })
        }
        Some(Verdict::Denied(e)) => {
            warn!("Termination of '{}' denied: {}", code, e);
            Err(e)
        }
        Some(Verdict::Missing) | None => Err(SessionError::NotFound(code.to_string())),
    }
}

fn terminated_session(current: &Value, terminated_by: &str, final_code: Option<FinalCodeInput>) -> Value {
    let mut next = current.as_object().cloned().unwrap_or_default();

    let preserved: Map<String, Value> = current
        .get("users")
        .and_then(Value::as_object)
        .map(|users| {
            users
                .iter()
                .map(|(id, user)| {
                    let name = user.get("name").cloned().unwrap_or(Value::Null);
                    let joined_at = user.get("timestamp").cloned().unwrap_or(Value::Null);
                    (id.clone(), json!({"name": name, "joinedAt": joined_at}))
                })
                .collect()
        })
        .unwrap_or_default();
    next.insert("preservedParticipants".to_string(), Value::Object(preserved));

    let input = final_code.unwrap_or_default();
    let content = input
        .content
        .or_else(|| current.pointer("/firepad/content").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default();
    let language = input
        .language
        .or_else(|| current.pointer("/settings/language").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    next.insert(
        "finalCode".to_string(),
        json!({
            "content": content,
            "language": language,
            "savedAt": ServerValue::timestamp(),
            "lineCount": content.split('\n').count(),
            "characterCount": content.chars().count(),
            "savedBy": terminated_by,
        }),
    );

    next.insert(
        "terminated".to_string(),
        json!({
            "terminated": true,
            "terminatedBy": terminated_by,
            "terminatedAt": ServerValue::timestamp(),
        }),
    );
    Value::Object(next)
}

fn decode_record(value: Option<&Value>) -> Result<TerminationRecord, SessionError> {
    let value = value.cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
}

/// Fires once, on the first snapshot showing the session terminated.
#[derive(Debug, Default)]
pub struct TerminationLatch {
    fired: bool,
}

impl TerminationLatch {
    pub fn observe(&mut self, snapshot: &Value) -> Option<TerminationRecord> {
        if self.fired {
            return None;
        }
        let record: TerminationRecord = serde_json::from_value(snapshot.clone()).ok()?;
        if !record.terminated {
            return None;
        }
        self.fired = true;
        Some(record)
    }

    pub fn is_fired(&self) -> bool {
        self.fired
    }
}
