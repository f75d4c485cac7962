use serde::{Deserialize, Serialize};

use super::{Participant, Settings, TerminationRecord};

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EditMessage {
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    Language,
    Theme,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SettingMessage {
    pub key: SettingKey,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EndMessage {
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct PingMessage {}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ReceivedMessage {
    #[serde(rename = "edit")]
    Edit(EditMessage),
    #[serde(rename = "setting")]
    Setting(SettingMessage),
    #[serde(rename = "end")]
    End(EndMessage),
    #[serde(rename = "ping")]
    Ping(PingMessage),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMessage {
    pub participant: Participant,
    pub roster: Vec<Participant>,
    pub settings: Settings,
    pub document: String,
    pub read_only: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RosterMessage {
    pub participants: Vec<Participant>,
    pub label: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PresenceMessage {
    pub participant: Participant,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMessage {
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TerminatedMessage {
    pub record: TerminationRecord,
    pub notice: String,
    pub read_only: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub error: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PongMessage {
    pub date: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum SendMessage {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMessage),
    #[serde(rename = "roster")]
    Roster(RosterMessage),
    #[serde(rename = "joined")]
    Joined(PresenceMessage),
    #[serde(rename = "left")]
    Left(PresenceMessage),
    #[serde(rename = "settings")]
    Settings(Settings),
    #[serde(rename = "document")]
    Document(DocumentMessage),
    #[serde(rename = "terminated")]
    Terminated(TerminatedMessage),
    #[serde(rename = "error")]
    Error(ErrorMessage),
    #[serde(rename = "pong")]
    Pong(PongMessage),
}
