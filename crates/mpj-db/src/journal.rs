//! Request lifecycle: every operation is scoped to the owning user, and a
//! request that is missing or owned by someone else is `DbError::NotFound`.

use std::time::Instant;

use mpj_types::models::{History, JournalRequest, Note, RequestAction};
use rusqlite::Connection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::queries;
use crate::{Database, DbError, Result};

/// Milliseconds since the Unix epoch on the server clock.
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn require_owned(conn: &Connection, request_id: &str, user_id: &str) -> Result<()> {
    if queries::request_owned_by(conn, request_id, user_id)? {
        Ok(())
    } else {
        Err(DbError::NotFound)
    }
}

/// A caller that has already given up must not see its write land later.
fn require_before(deadline: Option<Instant>) -> Result<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(DbError::DeadlineExceeded),
        _ => Ok(()),
    }
}

fn require_text(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DbError::Validation(format!("{} is required", what)));
    }
    Ok(())
}

impl Database {
    /// Store a new request with its initial `Created` history entry. Both rows
    /// are written in one transaction; on any failure, including `deadline`
    /// passing before commit, neither persists.
    pub fn add_new(&self, user_id: &str, text: &str, deadline: Option<Instant>) -> Result<JournalRequest> {
        require_text(text, "request text")?;

        let request_id = Uuid::new_v4().simple().to_string();
        let now = now_millis();

        self.with_conn_mut(|conn| {
            require_before(deadline)?;
            let tx = conn.transaction()?;
            queries::insert_request(&tx, &request_id, now, user_id)?;
            queries::insert_history(&tx, &request_id, now, RequestAction::Created.as_str(), Some(text))?;
            // dropping tx on this error rolls both inserts back
            require_before(deadline)?;
            tx.commit()?;
            Ok(())
        })?;

        debug!("Created request {} for {}", request_id, user_id);
        Ok(JournalRequest {
            request_id,
            user_id: user_id.to_string(),
            text: text.to_string(),
            as_of: now,
            last_status: RequestAction::Created,
            history: Vec::new(),
            notes: Vec::new(),
        })
    }

    /// Append a history entry. Empty text means "text unchanged" and is stored
    /// as NULL. The timestamp never goes backwards for a request.
    pub fn add_history(
        &self,
        user_id: &str,
        request_id: &str,
        status: &RequestAction,
        text: Option<&str>,
        deadline: Option<Instant>,
    ) -> Result<()> {
        require_text(status.as_str(), "status")?;
        let text = text.filter(|t| !t.is_empty());

        self.with_conn_mut(|conn| {
            require_owned(conn, request_id, user_id)?;
            let as_of = queries::latest_history_as_of(conn, request_id)?
                .map_or(now_millis(), |last| last.max(now_millis()));
            require_before(deadline)?;
            queries::insert_history(conn, request_id, as_of, status.as_str(), text)
        })?;

        if status.is_answered() {
            info!("Request {} marked answered", request_id);
        } else {
            debug!("Recorded {} on request {}", status, request_id);
        }
        Ok(())
    }

    /// Append a note. Notes never change the projected text or status.
    pub fn add_note(&self, user_id: &str, request_id: &str, notes: &str, deadline: Option<Instant>) -> Result<()> {
        require_text(notes, "notes")?;

        self.with_conn_mut(|conn| {
            require_owned(conn, request_id, user_id)?;
            let as_of = queries::latest_note_as_of(conn, request_id)?
                .map_or(now_millis(), |last| last.max(now_millis()));
            require_before(deadline)?;
            queries::insert_note(conn, request_id, as_of, notes)
        })?;

        debug!("Added note to request {}", request_id);
        Ok(())
    }

    /// The user's active journal, oldest activity first.
    pub fn journal(&self, user_id: &str) -> Result<Vec<JournalRequest>> {
        self.with_conn(|conn| {
            let rows = queries::query_journal(conn, user_id)?;
            Ok(rows.into_iter().map(JournalRequest::from).collect())
        })
    }

    /// The user's answered requests, most recently answered first.
    pub fn answered(&self, user_id: &str) -> Result<Vec<JournalRequest>> {
        self.with_conn(|conn| {
            let rows = queries::query_answered(conn, user_id)?;
            Ok(rows.into_iter().map(JournalRequest::from).collect())
        })
    }

    pub fn by_id(&self, user_id: &str, request_id: &str) -> Result<JournalRequest> {
        self.with_conn(|conn| {
            queries::query_journal_by_id(conn, request_id, user_id)?
                .map(JournalRequest::from)
                .ok_or(DbError::NotFound)
        })
    }

    /// A request with its full history (oldest first) and notes (newest first).
    pub fn full_by_id(&self, user_id: &str, request_id: &str) -> Result<JournalRequest> {
        self.with_conn(|conn| {
            let mut req = queries::query_journal_by_id(conn, request_id, user_id)?
                .map(JournalRequest::from)
                .ok_or(DbError::NotFound)?;
            req.history = queries::history_for(conn, request_id)?
                .into_iter()
                .map(History::from)
                .collect();
            req.notes = queries::notes_for(conn, request_id)?
                .into_iter()
                .map(Note::from)
                .collect();
            Ok(req)
        })
    }

    /// Notes for a request, newest first. An owned request with no notes gives
    /// an empty list; a missing or foreign request is `NotFound`.
    pub fn notes_by_id(&self, user_id: &str, request_id: &str) -> Result<Vec<Note>> {
        self.with_conn(|conn| {
            require_owned(conn, request_id, user_id)?;
            let rows = queries::notes_for(conn, request_id)?;
            Ok(rows.into_iter().map(Note::from).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const ALICE: &str = "auth0|alice";
    const BOB: &str = "auth0|bob";

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?)
        })
        .unwrap()
    }

    #[test]
    fn create_returns_journal_shaped_record() {
        let db = db();
        let created = db.add_new(ALICE, "Pray for health", None).unwrap();

        assert_eq!(created.text, "Pray for health");
        assert_eq!(created.last_status, RequestAction::Created);
        assert_eq!(created.request_id.len(), 32);

        let fetched = db.by_id(ALICE, &created.request_id).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn create_rejects_blank_text() {
        let db = db();
        assert!(matches!(db.add_new(ALICE, "   ", None), Err(DbError::Validation(_))));
        assert_eq!(count(&db, "request"), 0);
    }

    #[test]
    fn create_is_atomic_when_history_insert_fails() {
        let db = db();
        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER fail_history BEFORE INSERT ON history
                 BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        assert!(matches!(db.add_new(ALICE, "Never stored", None), Err(DbError::Sqlite(_))));
        assert_eq!(count(&db, "request"), 0);
        assert_eq!(count(&db, "history"), 0);
    }

    #[test]
    fn writes_past_their_deadline_leave_nothing_behind() {
        let db = db();
        let created = db.add_new(ALICE, "Kept", None).unwrap();
        let expired = Some(Instant::now());

        assert!(matches!(db.add_new(ALICE, "Too late", expired), Err(DbError::DeadlineExceeded)));
        assert!(matches!(
            db.add_history(ALICE, &created.request_id, &RequestAction::Answered, Some("late"), expired),
            Err(DbError::DeadlineExceeded)
        ));
        assert!(matches!(
            db.add_note(ALICE, &created.request_id, "late", expired),
            Err(DbError::DeadlineExceeded)
        ));

        assert_eq!(count(&db, "request"), 1);
        assert_eq!(count(&db, "history"), 1);
        assert_eq!(count(&db, "note"), 0);
        assert_eq!(db.by_id(ALICE, &created.request_id).unwrap().last_status, RequestAction::Created);
    }

    #[test]
    fn writes_before_their_deadline_succeed() {
        let db = db();
        let deadline = Some(Instant::now() + Duration::from_secs(60));
        let created = db.add_new(ALICE, "In time", deadline).unwrap();
        db.add_note(ALICE, &created.request_id, "noted", deadline).unwrap();
        db.add_history(ALICE, &created.request_id, &RequestAction::Prayed, None, deadline).unwrap();

        assert_eq!(count(&db, "history"), 2);
        assert_eq!(count(&db, "note"), 1);
    }

    #[test]
    fn answered_request_moves_from_journal_to_answered() {
        let db = db();
        let created = db.add_new(ALICE, "Pray for health", None).unwrap();
        let other = db.add_new(ALICE, "Pray for rain", None).unwrap();

        db.add_history(ALICE, &created.request_id, &RequestAction::Answered, Some("Fully recovered"), None)
            .unwrap();

        let journal = db.journal(ALICE).unwrap();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].request_id, other.request_id);

        let answered = db.answered(ALICE).unwrap();
        assert_eq!(answered.len(), 1);
        assert_eq!(answered[0].request_id, created.request_id);
        assert_eq!(answered[0].text, "Fully recovered");
        assert_eq!(answered[0].last_status, RequestAction::Answered);
    }

    #[test]
    fn status_only_update_keeps_previous_text() {
        let db = db();
        let created = db.add_new(ALICE, "Original", None).unwrap();
        let id = &created.request_id;

        db.add_history(ALICE, id, &RequestAction::Updated, Some("Revised"), None).unwrap();
        db.add_history(ALICE, id, &RequestAction::Prayed, Some(""), None).unwrap();
        db.add_history(ALICE, id, &RequestAction::Prayed, None, None).unwrap();

        let req = db.by_id(ALICE, id).unwrap();
        assert_eq!(req.text, "Revised");
        assert_eq!(req.last_status, RequestAction::Prayed);

        let full = db.full_by_id(ALICE, id).unwrap();
        assert_eq!(full.history.len(), 4);
        assert_eq!(full.history[0].status, RequestAction::Created);
        assert_eq!(full.history[2].text, None);
        assert_eq!(full.history.last().unwrap().as_of, req.as_of);
        assert!(full.history.windows(2).all(|w| w[0].as_of <= w[1].as_of));
    }

    #[test]
    fn open_vocabulary_status_is_projected() {
        let db = db();
        let created = db.add_new(ALICE, "Text", None).unwrap();
        let snoozed = RequestAction::from("Snoozed");
        db.add_history(ALICE, &created.request_id, &snoozed, None, None).unwrap();

        let req = db.by_id(ALICE, &created.request_id).unwrap();
        assert_eq!(req.last_status, snoozed);
        assert_eq!(db.journal(ALICE).unwrap().len(), 1);
    }

    #[test]
    fn empty_status_is_rejected() {
        let db = db();
        let created = db.add_new(ALICE, "Text", None).unwrap();
        let err = db.add_history(ALICE, &created.request_id, &RequestAction::from(""), None, None);
        assert!(matches!(err, Err(DbError::Validation(_))));
        assert_eq!(count(&db, "history"), 1);
    }

    #[test]
    fn notes_do_not_change_projection() {
        let db = db();
        let created = db.add_new(ALICE, "Text", None).unwrap();
        let id = &created.request_id;

        assert!(db.notes_by_id(ALICE, id).unwrap().is_empty());

        db.add_note(ALICE, id, "first", None).unwrap();
        db.add_note(ALICE, id, "second", None).unwrap();

        let notes = db.notes_by_id(ALICE, id).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].notes, "second");
        assert!(notes[0].as_of >= notes[1].as_of);

        let req = db.by_id(ALICE, id).unwrap();
        assert_eq!(req.text, "Text");
        assert_eq!(req.last_status, RequestAction::Created);

        let full = db.full_by_id(ALICE, id).unwrap();
        assert_eq!(full.notes, notes);
    }

    #[test]
    fn missing_request_is_not_found_for_notes() {
        let db = db();
        assert!(matches!(db.notes_by_id(ALICE, "missing"), Err(DbError::NotFound)));
    }

    #[test]
    fn history_can_attach_to_request_without_history() {
        let db = db();
        db.with_conn(|conn| queries::insert_request(conn, "bare", 1, ALICE)).unwrap();

        db.add_history(ALICE, "bare", &RequestAction::Updated, Some("late text"), None).unwrap();
        db.add_note(ALICE, "bare", "note", None).unwrap();

        assert_eq!(db.by_id(ALICE, "bare").unwrap().text, "late text");
    }

    #[test]
    fn history_timestamp_never_moves_backwards() {
        let db = db();
        let created = db.add_new(ALICE, "Text", None).unwrap();
        let future = created.as_of + 60_000;
        db.with_conn(|conn| queries::insert_history(conn, &created.request_id, future, "Prayed", None))
            .unwrap();

        db.add_history(ALICE, &created.request_id, &RequestAction::Answered, None, None).unwrap();

        let req = db.by_id(ALICE, &created.request_id).unwrap();
        assert_eq!(req.as_of, future);
        assert_eq!(req.last_status, RequestAction::Answered);
    }

    #[test]
    fn other_users_cannot_see_or_touch_a_request() {
        let db = db();
        let created = db.add_new(ALICE, "Private", None).unwrap();
        let id = &created.request_id;

        assert!(matches!(db.by_id(BOB, id), Err(DbError::NotFound)));
        assert!(matches!(db.full_by_id(BOB, id), Err(DbError::NotFound)));
        assert!(matches!(db.notes_by_id(BOB, id), Err(DbError::NotFound)));
        assert!(matches!(
            db.add_history(BOB, id, &RequestAction::Answered, Some("hijacked"), None),
            Err(DbError::NotFound)
        ));
        assert!(matches!(db.add_note(BOB, id, "hijacked", None), Err(DbError::NotFound)));
        assert!(db.journal(BOB).unwrap().is_empty());
        assert!(db.answered(BOB).unwrap().is_empty());

        // nothing was written by the rejected calls
        assert_eq!(count(&db, "history"), 1);
        assert_eq!(count(&db, "note"), 0);
    }
}
