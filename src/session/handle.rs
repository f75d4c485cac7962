use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::collections::VecDeque;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::code::assign_color;
use super::lifecycle::{open_session, session_path, validate_session, Creator};
use super::presence::{PresenceChange, PresenceTracker};
use super::settings::SettingsSync;
use super::termination::{end_session, EndOutcome, TerminationLatch};
use super::SessionError;
use crate::models::{FinalCodeInput, Participant, Role, SettingKey, Settings, TerminationRecord};
use crate::store::rules::{authorize_write, Actor};
use crate::store::tree::get_at;
use crate::store::{Connection, RealtimeStore, ServerValue, StorePath, Subscription};

/// Everything needed to join a session.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    /// Reuse a participant id; a fresh one is generated otherwise.
    pub participant_id: Option<String>,
    pub name: String,
    pub role: Role,
    pub max_age: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Joined(Participant),
    Left(Participant),
    Roster { participants: Vec<Participant>, label: String },
    Terminated(TerminationRecord),
    SettingsChanged(Settings),
    DocumentChanged(String),
}

enum Snapshot {
    Users(Value),
    Terminated(Value),
    Settings(Value),
    Document(Value),
}

/// One participant's live view of a session.
///
/// Owns the store connection carrying the presence record and every
/// subscription. `teardown` (or dropping the handle) releases all of them and
/// removes the presence record.
pub struct SessionHandle {
    store: RealtimeStore,
    code: String,
    session_path: StorePath,
    participant: Participant,
    actor: Actor,
    connection: Option<Connection>,
    users: Option<Subscription>,
    terminated: Option<Subscription>,
    settings: Option<Subscription>,
    document: Option<Subscription>,
    presence: PresenceTracker,
    latch: TerminationLatch,
    settings_sync: SettingsSync,
    document_content: String,
    read_only: bool,
    pending: VecDeque<SessionEvent>,
}

impl SessionHandle {
    pub fn join(store: &RealtimeStore, code: &str, request: JoinRequest) -> Result<Self, SessionError> {
        let session_path = session_path(code)?;
        let now = Utc::now().timestamp_millis();
        if validate_session(store, code, request.role, request.max_age, now)?.is_none() {
            // An interviewer joining a fresh code opens it.
            let creator = Creator { name: request.name.clone(), id: request.participant_id.clone().unwrap_or_default() };
            match open_session(store, code, &creator) {
                Ok(_) | Err(SessionError::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let id = request.participant_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let actor = Actor::participant(request.role, &id);
        let presence_rel = StorePath::parse("users")?.child(&id)?;
        let presence_path = session_path.join(&presence_rel);

        let connection = store.connect();
        let record = json!({
            "name": request.name,
            "color": assign_color(),
            "timestamp": ServerValue::timestamp(),
            "role": request.role,
        });
        // A presence record only exists while its connection is open, so an
        // occupied id belongs to someone else who is still connected.
        store.set_if(&session_path, &presence_rel, record, |session| {
            if get_at(session, &presence_rel).is_some_and(|existing| !existing.is_null()) {
                return Err(SessionError::Forbidden(format!("Participant '{}' is already connected", id)));
            }
            authorize_write(&actor, &presence_rel, session).map_err(SessionError::from)
        })?;
        connection.on_disconnect_remove(&presence_path);

        let mut handle = Self {
            store: store.clone(),
            code: code.to_string(),
            users: Some(store.subscribe(&session_path.child("users")?)),
            terminated: Some(store.subscribe(&session_path.child("terminated")?)),
            settings: Some(store.subscribe(&session_path.child("settings")?)),
            document: Some(store.subscribe(&session_path.join(&StorePath::parse("firepad/content")?))),
            session_path,
            participant: Participant {
                id: id.clone(),
                name: request.name,
                color: String::new(),
                joined_at: 0,
                role: request.role,
            },
            actor,
            connection: Some(connection),
            presence: PresenceTracker::new(&id),
            latch: TerminationLatch::default(),
            settings_sync: SettingsSync::default(),
            document_content: String::new(),
            read_only: false,
            pending: VecDeque::new(),
        };
        handle.seed();
        info!("Participant '{}' ({}) joined session '{}'", handle.participant.name, handle.participant.role, code);
        Ok(handle)
    }

    // Consume the initial snapshot of every subscription without producing events.
    fn seed(&mut self) {
        if let Some(users) = self.users.as_mut().and_then(Subscription::try_changed) {
            self.presence.apply(&users);
        }
        if let Some(me) = self.presence.get(&self.participant.id) {
            self.participant = me.clone();
        }
        if let Some(settings) = self.settings.as_mut().and_then(Subscription::try_changed) {
            self.settings_sync.apply_remote(&settings);
        }
        if let Some(document) = self.document.as_mut().and_then(Subscription::try_changed) {
            self.document_content = document.as_str().unwrap_or_default().to_string();
        }
        // Anything else is queued; a termination racing the join is reported.
        if let Some(terminated) = self.terminated.as_mut().and_then(Subscription::try_changed) {
            self.apply(Snapshot::Terminated(terminated));
        }
    }

    /// Wait for the next event. `None` after teardown.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.connection.is_none() {
                return None;
            }
            let snapshot = tokio::select! {
                Some(v) = next_snapshot(&mut self.users) => Snapshot::Users(v),
                Some(v) = next_snapshot(&mut self.terminated) => Snapshot::Terminated(v),
                Some(v) = next_snapshot(&mut self.settings) => Snapshot::Settings(v),
                Some(v) = next_snapshot(&mut self.document) => Snapshot::Document(v),
                else => return None,
            };
            self.apply(snapshot);
        }
    }

    fn apply(&mut self, snapshot: Snapshot) {
        match snapshot {
            Snapshot::Users(value) => {
                for change in self.presence.apply(&value) {
                    self.pending.push_back(match change {
                        PresenceChange::Joined(p) => SessionEvent::Joined(p),
                        PresenceChange::Left(p) => SessionEvent::Left(p),
                    });
                }
                self.pending.push_back(SessionEvent::Roster {
                    participants: self.presence.participants(),
                    label: self.presence.label(),
                });
            }
            Snapshot::Terminated(value) => {
                if let Some(record) = self.latch.observe(&value) {
                    if !self.actor.is_elevated() {
                        self.read_only = true;
                        self.document = None;
                    }
                    info!("Session '{}' terminated, notifying '{}'", self.code, self.participant.name);
                    self.pending.push_back(SessionEvent::Terminated(record));
                }
            }
            Snapshot::Settings(value) => {
                if let Some(settings) = self.settings_sync.apply_remote(&value) {
                    self.pending.push_back(SessionEvent::SettingsChanged(settings));
                }
            }
            Snapshot::Document(value) => {
                let content = value.as_str().unwrap_or_default();
                if content != self.document_content {
                    self.document_content = content.to_string();
                    self.pending.push_back(SessionEvent::DocumentChanged(self.document_content.clone()));
                }
            }
        }
    }

    pub fn set_language(&mut self, language: &str) -> Result<(), SessionError> {
        self.update_setting(SettingKey::Language, language)
    }

    pub fn update_setting(&mut self, key: SettingKey, value: &str) -> Result<(), SessionError> {
        if self.read_only {
            return Err(SessionError::ReadOnly);
        }
        if self.settings_sync.get(key) == Some(value) {
            return Ok(());
        }
        let relative = StorePath::parse("settings")?.child(key.field())?;
        self.write_guarded(&relative, json!(value))?;
        // Recorded before the echoed snapshot is polled, so it is not re-applied.
        self.settings_sync.set_local(key, value);
        Ok(())
    }

    /// Replace the shared document content.
    pub fn write_document(&mut self, content: &str) -> Result<(), SessionError> {
        if self.read_only {
            return Err(SessionError::ReadOnly);
        }
        self.write_guarded(&StorePath::parse("firepad/content")?, json!(content))?;
        self.document_content = content.to_string();
        Ok(())
    }

    fn write_guarded(&self, relative: &StorePath, value: Value) -> Result<(), SessionError> {
        let actor = &self.actor;
        self.store.set_if(&self.session_path, relative, value, |session| {
            if session.is_null() {
                return Err(SessionError::NotFound(self.code.clone()));
            }
            authorize_write(actor, relative, session).map_err(SessionError::from)
        })
    }

    /// End the session with the current document as the final code.
    /// `language` overrides the shared language setting.
    pub fn end_session(&self, language: Option<String>) -> Result<EndOutcome, SessionError> {
        let final_code = FinalCodeInput {
            content: Some(self.document_content.clone()),
            language: language.or_else(|| self.settings_sync.local().language.clone()),
        };
        end_session(&self.store, &self.code, &self.actor, &self.participant.name, Some(final_code))
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn roster(&self) -> Vec<Participant> {
        self.presence.participants()
    }

    pub fn roster_label(&self) -> String {
        self.presence.label()
    }

    pub fn settings(&self) -> &Settings {
        self.settings_sync.local()
    }

    pub fn document(&self) -> &str {
        &self.document_content
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_terminated(&self) -> bool {
        self.latch.is_fired()
    }

    /// Release every subscription and disconnect, removing the presence record.
    pub fn teardown(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        self.users = None;
        self.terminated = None;
        self.settings = None;
        self.document = None;
        self.pending.clear();
        connection.disconnect();
        debug!("Participant '{}' left session '{}'", self.participant.id, self.code);
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if self.connection.is_some() {
            warn!("Session handle for '{}' dropped without teardown", self.participant.id);
            self.teardown();
        }
    }
}

async fn next_snapshot(subscription: &mut Option<Subscription>) -> Option<Value> {
    match subscription {
        Some(subscription) => subscription.changed().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration as TokioDuration};

    fn request(name: &str, role: Role) -> JoinRequest {
        JoinRequest { participant_id: None, name: name.to_string(), role, max_age: Duration::minutes(120) }
    }

    async fn next(handle: &mut SessionHandle) -> SessionEvent {
        timeout(TokioDuration::from_secs(1), handle.next_event())
            .await
            .expect("event in time")
            .expect("handle alive")
    }

    #[tokio::test]
    async fn interviewer_opens_a_fresh_code() {
        let store = RealtimeStore::new();
        let handle = SessionHandle::join(&store, "NEWCODE1", request("Interviewer", Role::Interviewer)).unwrap();
        assert_eq!(handle.roster().len(), 1);
        assert!(handle.participant().joined_at > 0);
        assert_eq!(handle.roster_label(), "1 user online");
    }

    #[tokio::test]
    async fn candidate_cannot_open_a_code() {
        let store = RealtimeStore::new();
        let result = SessionHandle::join(&store, "NEWCODE1", request("Asha", Role::Candidate));
        assert!(matches!(result, Err(SessionError::NotFound(_))));
    }

    #[tokio::test]
    async fn document_edits_reach_other_participants() {
        let store = RealtimeStore::new();
        let mut interviewer = SessionHandle::join(&store, "482913", request("Interviewer", Role::Interviewer)).unwrap();
        let mut asha = SessionHandle::join(&store, "482913", request("Asha", Role::Candidate)).unwrap();
        assert!(matches!(next(&mut interviewer).await, SessionEvent::Joined(p) if p.name == "Asha"));
        assert!(matches!(next(&mut interviewer).await, SessionEvent::Roster { .. }));

        asha.write_document("print(1+1)").unwrap();
        assert_eq!(next(&mut interviewer).await, SessionEvent::DocumentChanged("print(1+1)".to_string()));
        assert_eq!(interviewer.document(), "print(1+1)");
        // The writer does not see its own edit echoed back.
        assert!(timeout(TokioDuration::from_millis(50), asha.next_event()).await.is_err());
    }

    #[tokio::test]
    async fn server_rejects_candidate_writes_after_termination() {
        let store = RealtimeStore::new();
        let interviewer = SessionHandle::join(&store, "482913", request("Interviewer", Role::Interviewer)).unwrap();
        let mut asha = SessionHandle::join(&store, "482913", request("Asha", Role::Candidate)).unwrap();
        interviewer.end_session(None).unwrap();

        // Bypass the local read-only flag; the store rules still refuse.
        let denied = asha.write_guarded(&StorePath::parse("firepad/content").unwrap(), json!("x"));
        assert!(matches!(denied, Err(SessionError::Forbidden(_))));
        assert!(matches!(next(&mut asha).await, SessionEvent::Terminated(_)));
        assert!(matches!(asha.write_document("x"), Err(SessionError::ReadOnly)));
    }

    #[tokio::test]
    async fn occupied_participant_id_cannot_be_joined() {
        let store = RealtimeStore::new();
        let interviewer = SessionHandle::join(&store, "482913", request("Interviewer", Role::Interviewer)).unwrap();
        let taken = interviewer.participant().id.clone();

        let mut impostor = request("Mallory", Role::Candidate);
        impostor.participant_id = Some(taken.clone());
        let result = SessionHandle::join(&store, "482913", impostor);
        assert!(matches!(result, Err(SessionError::Forbidden(_))));

        // The rejected join left the original record and its cleanup alone.
        let presence = StorePath::parse(&format!("sessions/482913/users/{}", taken)).unwrap();
        assert_eq!(store.get(&presence)["name"], "Interviewer");
        assert_eq!(store.stats().connections, 1);
    }

    #[tokio::test]
    async fn participant_id_is_reusable_after_leaving() {
        let store = RealtimeStore::new();
        let _interviewer = SessionHandle::join(&store, "482913", request("Interviewer", Role::Interviewer)).unwrap();
        let mut asha = SessionHandle::join(&store, "482913", request("Asha", Role::Candidate)).unwrap();
        let id = asha.participant().id.clone();
        asha.teardown();

        let mut rejoin = request("Asha", Role::Candidate);
        rejoin.participant_id = Some(id.clone());
        let asha = SessionHandle::join(&store, "482913", rejoin).unwrap();
        assert_eq!(asha.participant().id, id);
    }

    #[tokio::test]
    async fn failed_setting_write_keeps_local_settings() {
        let store = RealtimeStore::new();
        let mut interviewer = SessionHandle::join(&store, "482913", request("Interviewer", Role::Interviewer)).unwrap();
        let mut asha = SessionHandle::join(&store, "482913", request("Asha", Role::Candidate)).unwrap();
        interviewer.update_setting(SettingKey::Language, "python").unwrap();
        while asha.settings().language.is_none() {
            next(&mut asha).await;
        }
        interviewer.end_session(None).unwrap();

        // The termination has not been observed yet, so the store refuses the write.
        let denied = asha.update_setting(SettingKey::Language, "go");
        assert!(matches!(denied, Err(SessionError::Forbidden(_))));
        assert_eq!(asha.settings().language.as_deref(), Some("python"));
        let stored = store.get(&StorePath::parse("sessions/482913/settings/language").unwrap());
        assert_eq!(stored, json!("python"));
    }

    #[tokio::test]
    async fn teardown_removes_presence_and_subscriptions() {
        let store = RealtimeStore::new();
        let mut handle = SessionHandle::join(&store, "482913", request("Interviewer", Role::Interviewer)).unwrap();
        assert_eq!(store.stats().subscriptions, 4);
        handle.teardown();
        assert_eq!(store.stats().subscriptions, 0);
        assert_eq!(store.stats().connections, 0);
        let users = store.get(&StorePath::parse("sessions/482913/users").unwrap());
        assert!(users.is_null());
        assert!(handle.next_event().await.is_none());
    }
}
