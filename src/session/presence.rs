use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::models::{Participant, PresenceRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum PresenceChange {
    Joined(Participant),
    Left(Participant),
}

pub fn roster_label(count: usize) -> String {
    if count == 1 {
        "1 user online".to_string()
    } else {
        format!("{} users online", count)
    }
}

/// Decode a `users` snapshot. Entries that do not decode are skipped.
pub fn parse_users(snapshot: &Value) -> BTreeMap<String, Participant> {
    let Some(users) = snapshot.as_object() else {
        return BTreeMap::new();
    };
    users
        .iter()
        .filter_map(|(id, raw)| match serde_json::from_value::<PresenceRecord>(raw.clone()) {
            Ok(record) => Some((id.clone(), Participant::from_record(id, record))),
            Err(e) => {
                warn!("Ignoring malformed presence record '{}': {}", id, e);
                None
            }
        })
        .collect()
}

/// Turns successive `users` snapshots into a roster plus join/leave changes.
///
/// The first snapshot only seeds the roster. Changes concerning the local
/// participant are never reported.
#[derive(Debug)]
pub struct PresenceTracker {
    self_id: String,
    roster: Option<BTreeMap<String, Participant>>,
}

impl PresenceTracker {
    pub fn new(self_id: &str) -> Self {
        Self { self_id: self_id.to_string(), roster: None }
    }

    pub fn apply(&mut self, snapshot: &Value) -> Vec<PresenceChange> {
        let next = parse_users(snapshot);
        let Some(previous) = self.roster.replace(next) else {
            return Vec::new();
        };
        let Some(current) = self.roster.as_ref() else {
            return Vec::new();
        };

        let mut changes = Vec::new();
        for (id, participant) in current {
            if id != &self.self_id && !previous.contains_key(id) {
                changes.push(PresenceChange::Joined(participant.clone()));
            }
        }
        for (id, participant) in previous {
            if id != self.self_id && !current.contains_key(&id) {
                changes.push(PresenceChange::Left(participant));
            }
        }
        changes
    }

    /// Everyone present, in join order.
    pub fn participants(&self) -> Vec<Participant> {
        let mut participants: Vec<Participant> = self.roster.iter().flat_map(|r| r.values().cloned()).collect();
        participants.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        participants
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.roster.as_ref().and_then(|r| r.get(id))
    }

    pub fn label(&self) -> String {
        roster_label(self.roster.as_ref().map_or(0, BTreeMap::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(changes: &[PresenceChange]) -> Vec<String> {
        changes
            .iter()
            .map(|c| match c {
                PresenceChange::Joined(p) => format!("+{}", p.name),
                PresenceChange::Left(p) => format!("-{}", p.name),
            })
            .collect()
    }

    #[test]
    fn first_snapshot_produces_no_changes() {
        let mut tracker = PresenceTracker::new("me");
        let changes = tracker.apply(&json!({
            "me": {"name": "Interviewer", "color": "#FF6B6B", "timestamp": 1, "role": "interviewer"},
            "asha": {"name": "Asha", "color": "#4ECDC4", "timestamp": 2, "role": "candidate"},
        }));
        assert!(changes.is_empty());
        assert_eq!(tracker.label(), "2 users online");
        let roster: Vec<String> = tracker.participants().into_iter().map(|p| p.name).collect();
        assert_eq!(roster, vec!["Interviewer", "Asha"]);
    }

    #[test]
    fn diffs_exclude_self() {
        let mut tracker = PresenceTracker::new("me");
        tracker.apply(&json!({"me": {"name": "Me", "timestamp": 1}}));
        let changes = tracker.apply(&json!({
            "me": {"name": "Me", "timestamp": 1},
            "bo": {"name": "Bo", "timestamp": 2},
        }));
        assert_eq!(names(&changes), vec!["+Bo"]);

        let changes = tracker.apply(&json!({"bo": {"name": "Bo", "timestamp": 2}}));
        assert!(changes.is_empty());
        assert_eq!(tracker.label(), "1 user online");

        let changes = tracker.apply(&Value::Null);
        assert_eq!(names(&changes), vec!["-Bo"]);
        assert_eq!(tracker.label(), "0 users online");
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let users = parse_users(&json!({"a": {"name": "A"}, "b": 42}));
        assert_eq!(users.len(), 1);
        assert_eq!(users["a"].role, crate::models::Role::Candidate);
    }
}
