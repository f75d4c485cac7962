//! Write and read capabilities for paths inside one session subtree.
//!
//! Paths are given relative to `sessions/{code}`. Checks run against the
//! current session value so that the termination latch is honoured.

use serde_json::Value;

use super::path::StorePath;
use crate::models::Role;

/// Who is performing a store operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub role: Role,
    /// Presence id of the participant, when the actor has joined.
    pub participant_id: Option<String>,
}

impl Actor {
    pub fn elevated() -> Self {
        Self { role: Role::Interviewer, participant_id: None }
    }

    pub fn standard() -> Self {
        Self { role: Role::Candidate, participant_id: None }
    }

    pub fn participant(role: Role, participant_id: &str) -> Self {
        Self { role, participant_id: Some(participant_id.to_string()) }
    }

    pub fn is_elevated(&self) -> bool {
        self.role == Role::Interviewer
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{0}")]
pub struct AccessDenied(pub String);

enum Area<'a> {
    Session,
    Metadata,
    Presence(Option<&'a str>),
    Termination,
    InterviewerRecord,
    Shared,
    Monitoring,
    Unknown,
}

fn classify(relative: &StorePath) -> Area<'_> {
    let segments = relative.segments();
    let Some(first) = segments.first() else {
        return Area::Session;
    };
    match first.as_str() {
        "created" | "createdBy" | "creatorId" | "status" => Area::Metadata,
        "users" => Area::Presence(segments.get(1).map(String::as_str)),
        "terminated" => Area::Termination,
        "preservedParticipants" | "finalCode" | "interviewerNotes" => Area::InterviewerRecord,
        "firepad" | "settings" => Area::Shared,
        "activity_log" | "activity_summary" | "activity_final_summary" | "tracking"
        | "security_warnings" | "privacy_consent" => Area::Monitoring,
        _ => Area::Unknown,
    }
}

/// True once the session's termination latch is set.
pub fn is_terminated(session: &Value) -> bool {
    session
        .get("terminated")
        .and_then(|t| t.get("terminated"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Check that `actor` may write at `relative` given the current `session` value.
pub fn authorize_write(actor: &Actor, relative: &StorePath, session: &Value) -> Result<(), AccessDenied> {
    let terminated = is_terminated(session);
    match classify(relative) {
        Area::Session | Area::Metadata | Area::InterviewerRecord | Area::Unknown => {
            require_elevated(actor, relative)
        }
        Area::Presence(Some(owner)) => {
            if actor.is_elevated() || actor.participant_id.as_deref() == Some(owner) {
                Ok(())
            } else {
                Err(AccessDenied(format!("Participant may only write its own presence, not '{}'", owner)))
            }
        }
        Area::Presence(None) => require_elevated(actor, relative),
        Area::Termination => {
            require_elevated(actor, relative)?;
            if terminated {
                return Err(AccessDenied("Session has already been terminated".to_string()));
            }
            Ok(())
        }
        Area::Shared => {
            if terminated && !actor.is_elevated() {
                return Err(AccessDenied("Session has ended; the editor is read-only".to_string()));
            }
            Ok(())
        }
        Area::Monitoring => Ok(()),
    }
}

/// Check that `actor` may read at `relative`.
pub fn authorize_read(actor: &Actor, relative: &StorePath) -> Result<(), AccessDenied> {
    let restricted = match relative.segments().first().map(String::as_str) {
        Some("interviewerNotes") | Some("tracking") | Some("security_warnings") => true,
        Some(first) => first.starts_with("activity_"),
        None => false,
    };
    if restricted {
        require_elevated(actor, relative)
    } else {
        Ok(())
    }
}

fn require_elevated(actor: &Actor, relative: &StorePath) -> Result<(), AccessDenied> {
    if actor.is_elevated() {
        Ok(())
    } else {
        Err(AccessDenied(format!("Interviewer access required for '{}'", relative)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rel(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    #[test]
    fn candidate_may_only_write_own_presence() {
        let asha = Actor::participant(Role::Candidate, "asha");
        let session = json!({});
        assert!(authorize_write(&asha, &rel("users/asha"), &session).is_ok());
        assert!(authorize_write(&asha, &rel("users/other"), &session).is_err());
        assert!(authorize_write(&asha, &rel("users"), &session).is_err());
    }

    #[test]
    fn termination_is_elevated_and_latched() {
        let active = json!({"created": 1});
        let ended = json!({"terminated": {"terminated": true}});
        assert!(authorize_write(&Actor::standard(), &rel("terminated"), &active).is_err());
        assert!(authorize_write(&Actor::elevated(), &rel("terminated"), &active).is_ok());
        assert!(authorize_write(&Actor::elevated(), &rel("terminated"), &ended).is_err());
    }

    #[test]
    fn shared_paths_become_read_only_for_candidates_after_termination() {
        let ended = json!({"terminated": {"terminated": true}});
        let candidate = Actor::standard();
        assert!(authorize_write(&candidate, &rel("firepad/content"), &json!({})).is_ok());
        assert!(authorize_write(&candidate, &rel("firepad/content"), &ended).is_err());
        assert!(authorize_write(&candidate, &rel("settings/theme"), &ended).is_err());
        assert!(authorize_write(&Actor::elevated(), &rel("settings/theme"), &ended).is_ok());
    }

    #[test]
    fn monitoring_is_writable_but_not_readable_by_candidates() {
        let candidate = Actor::standard();
        assert!(authorize_write(&candidate, &rel("activity_log/k"), &json!({})).is_ok());
        assert!(authorize_read(&candidate, &rel("activity_summary")).is_err());
        assert!(authorize_read(&candidate, &rel("interviewerNotes")).is_err());
        assert!(authorize_read(&candidate, &rel("settings")).is_ok());
        assert!(authorize_read(&Actor::elevated(), &rel("tracking")).is_ok());
    }

    #[test]
    fn unknown_paths_require_elevation() {
        assert!(authorize_write(&Actor::standard(), &rel("somethingElse"), &json!({})).is_err());
        assert!(authorize_write(&Actor::standard(), &rel(""), &json!({})).is_err());
    }
}
