use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Participant role. Interviewers hold the elevated role.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Interviewer,
    #[default]
    Candidate,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Interviewer => write!(f, "interviewer"),
            Role::Candidate => write!(f, "candidate"),
        }
    }
}

/// Presence record stored under `sessions/{code}/users/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    pub name: String,
    #[serde(default)]
    pub color: String,
    /// Join time in server milliseconds.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub role: Role,
}

/// A participant currently present in a session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub color: String,
    pub joined_at: i64,
    pub role: Role,
}

impl Participant {
    pub fn from_record(id: &str, record: PresenceRecord) -> Self {
        Self {
            id: id.to_string(),
            name: record.name,
            color: record.color,
            joined_at: record.timestamp,
            role: record.role,
        }
    }
}

/// Participant snapshot kept after a session ends.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreservedParticipant {
    pub name: String,
    pub joined_at: i64,
}
