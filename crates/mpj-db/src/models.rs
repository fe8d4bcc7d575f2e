//! Database row types. These map directly to SQLite rows and stay distinct
//! from the mpj-types API models.

use mpj_types::models::{History, JournalRequest, Note, RequestAction};

/// A row of the `journal` view.
pub struct JournalRow {
    pub request_id: String,
    pub user_id: String,
    pub text: Option<String>,
    pub as_of: i64,
    pub last_status: String,
}

pub struct HistoryRow {
    pub request_id: String,
    pub as_of: i64,
    pub status: String,
    pub text: Option<String>,
}

pub struct NoteRow {
    pub request_id: String,
    pub as_of: i64,
    pub notes: String,
}

impl From<JournalRow> for JournalRequest {
    fn from(row: JournalRow) -> Self {
        JournalRequest {
            request_id: row.request_id,
            user_id: row.user_id,
            text: row.text.unwrap_or_default(),
            as_of: row.as_of,
            last_status: RequestAction::from(row.last_status),
            history: Vec::new(),
            notes: Vec::new(),
        }
    }
}

impl From<HistoryRow> for History {
    fn from(row: HistoryRow) -> Self {
        History {
            request_id: row.request_id,
            as_of: row.as_of,
            status: RequestAction::from(row.status),
            text: row.text,
        }
    }
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Note {
            request_id: row.request_id,
            as_of: row.as_of,
            notes: row.notes,
        }
    }
}
