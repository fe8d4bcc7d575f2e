//! Single-statement reads and writes. Callers own ownership checks and
//! transactions; every function here works on a plain connection or an open
//! transaction.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::Result;
use crate::models::{HistoryRow, JournalRow, NoteRow};

const JOURNAL_COLUMNS: &str = "SELECT request_id, user_id, text, as_of, last_status FROM journal";

// -- Requests --

pub fn insert_request(conn: &Connection, request_id: &str, entered_on: i64, user_id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO request (request_id, entered_on, user_id) VALUES (?1, ?2, ?3)",
        (request_id, entered_on, user_id),
    )?;
    Ok(())
}

/// Whether the base request row exists and belongs to `user_id`. Checked
/// against `request` rather than the projection, so a request with no
/// history still resolves.
pub fn request_owned_by(conn: &Connection, request_id: &str, user_id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM request WHERE request_id = ?1 AND user_id = ?2",
            (request_id, user_id),
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

// -- History --

pub fn insert_history(
    conn: &Connection,
    request_id: &str,
    as_of: i64,
    status: &str,
    text: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO history (request_id, as_of, status, text) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![request_id, as_of, status, text],
    )?;
    Ok(())
}

/// Oldest first; rows sharing an `as_of` stay in append order.
pub fn history_for(conn: &Connection, request_id: &str) -> Result<Vec<HistoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT request_id, as_of, status, text
         FROM history
         WHERE request_id = ?1
         ORDER BY as_of, seq",
    )?;

    let rows = stmt
        .query_map([request_id], |row| {
            Ok(HistoryRow {
                request_id: row.get(0)?,
                as_of: row.get(1)?,
                status: row.get(2)?,
                text: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn latest_history_as_of(conn: &Connection, request_id: &str) -> Result<Option<i64>> {
    let as_of = conn.query_row(
        "SELECT MAX(as_of) FROM history WHERE request_id = ?1",
        [request_id],
        |row| row.get(0),
    )?;
    Ok(as_of)
}

// -- Notes --

pub fn insert_note(conn: &Connection, request_id: &str, as_of: i64, notes: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO note (request_id, as_of, notes) VALUES (?1, ?2, ?3)",
        (request_id, as_of, notes),
    )?;
    Ok(())
}

/// Newest first; rows sharing an `as_of` put the later append first.
pub fn notes_for(conn: &Connection, request_id: &str) -> Result<Vec<NoteRow>> {
    let mut stmt = conn.prepare(
        "SELECT request_id, as_of, notes
         FROM note
         WHERE request_id = ?1
         ORDER BY as_of DESC, seq DESC",
    )?;

    let rows = stmt
        .query_map([request_id], |row| {
            Ok(NoteRow {
                request_id: row.get(0)?,
                as_of: row.get(1)?,
                notes: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn latest_note_as_of(conn: &Connection, request_id: &str) -> Result<Option<i64>> {
    let as_of = conn.query_row(
        "SELECT MAX(as_of) FROM note WHERE request_id = ?1",
        [request_id],
        |row| row.get(0),
    )?;
    Ok(as_of)
}

// -- Journal projection --

/// Active requests (latest status is not `Answered`), oldest activity first.
pub fn query_journal(conn: &Connection, user_id: &str) -> Result<Vec<JournalRow>> {
    query_journal_rows(
        conn,
        &format!(
            "{JOURNAL_COLUMNS}
             WHERE user_id = ?1 AND last_status <> 'Answered'
             ORDER BY as_of, request_id"
        ),
        user_id,
    )
}

/// Answered requests, most recently answered first.
pub fn query_answered(conn: &Connection, user_id: &str) -> Result<Vec<JournalRow>> {
    query_journal_rows(
        conn,
        &format!(
            "{JOURNAL_COLUMNS}
             WHERE user_id = ?1 AND last_status = 'Answered'
             ORDER BY as_of DESC, request_id"
        ),
        user_id,
    )
}

pub fn query_journal_by_id(conn: &Connection, request_id: &str, user_id: &str) -> Result<Option<JournalRow>> {
    let row = conn
        .query_row(
            &format!("{JOURNAL_COLUMNS} WHERE request_id = ?1 AND user_id = ?2"),
            (request_id, user_id),
            journal_row,
        )
        .optional()?;
    Ok(row)
}

fn query_journal_rows(conn: &Connection, sql: &str, user_id: &str) -> Result<Vec<JournalRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([user_id], journal_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn journal_row(row: &Row<'_>) -> rusqlite::Result<JournalRow> {
    Ok(JournalRow {
        request_id: row.get(0)?,
        user_id: row.get(1)?,
        text: row.get(2)?,
        as_of: row.get(3)?,
        last_status: row.get(4)?,
    })
}
