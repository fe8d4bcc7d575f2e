use std::fmt;

use serde::{Deserialize, Serialize};

/// An action taken on a prayer request, recorded as a history status.
///
/// The vocabulary is open: anything outside the well-known actions is kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestAction {
    Created,
    Prayed,
    Updated,
    Answered,
    Other(String),
}

impl RequestAction {
    pub fn as_str(&self) -> &str {
        match self {
            RequestAction::Created => "Created",
            RequestAction::Prayed => "Prayed",
            RequestAction::Updated => "Updated",
            RequestAction::Answered => "Answered",
            RequestAction::Other(s) => s,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, RequestAction::Answered)
    }
}

impl From<&str> for RequestAction {
    fn from(s: &str) -> Self {
        match s {
            "Created" => RequestAction::Created,
            "Prayed" => RequestAction::Prayed,
            "Updated" => RequestAction::Updated,
            "Answered" => RequestAction::Answered,
            other => RequestAction::Other(other.to_string()),
        }
    }
}

impl From<String> for RequestAction {
    fn from(s: String) -> Self {
        RequestAction::from(s.as_str())
    }
}

impl From<RequestAction> for String {
    fn from(action: RequestAction) -> Self {
        match action {
            RequestAction::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record of action taken on a request. `text` is only present when the
/// request's text changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub request_id: String,
    pub as_of: i64,
    pub status: RequestAction,
    pub text: Option<String>,
}

/// A note on a request; never changes its text or status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub request_id: String,
    pub as_of: i64,
    pub notes: String,
}

/// A request as shown in the journal: latest text and latest status.
///
/// `history` (oldest first) and `notes` (newest first) are only filled by a
/// full read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalRequest {
    pub request_id: String,
    pub user_id: String,
    pub text: String,
    pub as_of: i64,
    pub last_status: RequestAction,
    #[serde(default)]
    pub history: Vec<History>,
    #[serde(default)]
    pub notes: Vec<Note>,
}
