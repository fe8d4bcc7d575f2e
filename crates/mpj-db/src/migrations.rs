use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::Result;

/// A schema object the journal needs, and the DDL that creates it.
struct SchemaObject {
    kind: &'static str,
    name: &'static str,
    label: &'static str,
    ddl: &'static str,
}

const SCHEMA: &[SchemaObject] = &[
    SchemaObject {
        kind: "table",
        name: "request",
        label: "request table",
        ddl: "
            CREATE TABLE request (
                request_id  TEXT PRIMARY KEY,
                entered_on  INTEGER NOT NULL,
                user_id     TEXT NOT NULL
            );
        ",
    },
    SchemaObject {
        kind: "table",
        name: "history",
        label: "history table",
        // seq is the append order; it breaks ties between equal as_of values
        ddl: "
            CREATE TABLE history (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                request_id  TEXT NOT NULL REFERENCES request(request_id) ON DELETE CASCADE,
                as_of       INTEGER NOT NULL,
                status      TEXT NOT NULL,
                text        TEXT
            );
        ",
    },
    SchemaObject {
        kind: "table",
        name: "note",
        label: "note table",
        ddl: "
            CREATE TABLE note (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                request_id  TEXT NOT NULL REFERENCES request(request_id) ON DELETE CASCADE,
                as_of       INTEGER NOT NULL,
                notes       TEXT NOT NULL
            );
        ",
    },
    SchemaObject {
        kind: "index",
        name: "idx_request_user_id",
        label: "request.user_id index",
        ddl: "CREATE INDEX idx_request_user_id ON request(user_id);",
    },
    SchemaObject {
        kind: "view",
        name: "journal",
        label: "journal view",
        // Latest text is the newest non-null text; latest status/as_of is the
        // newest row. Requests without history have no projection.
        ddl: "
            CREATE VIEW journal AS
            SELECT
                r.request_id,
                r.user_id,
                (SELECT h.text
                   FROM history h
                  WHERE h.request_id = r.request_id
                    AND h.text IS NOT NULL
                  ORDER BY h.as_of DESC, h.seq DESC
                  LIMIT 1) AS text,
                (SELECT h.as_of
                   FROM history h
                  WHERE h.request_id = r.request_id
                  ORDER BY h.as_of DESC, h.seq DESC
                  LIMIT 1) AS as_of,
                (SELECT h.status
                   FROM history h
                  WHERE h.request_id = r.request_id
                  ORDER BY h.as_of DESC, h.seq DESC
                  LIMIT 1) AS last_status
              FROM request r
             WHERE EXISTS (SELECT 1 FROM history h WHERE h.request_id = r.request_id);
        ",
    },
];

/// Make sure every journal table, index and view exists, creating only the
/// missing ones. Returns how many objects were created.
///
/// Safe to run on every startup. It is not safe against two processes
/// bootstrapping the same file at the same moment.
pub fn ensure_schema(conn: &Connection) -> Result<usize> {
    let mut created = 0;

    for object in SCHEMA {
        if !object_exists(conn, object.kind, object.name)? {
            info!("Fixing up {}...", object.label);
            conn.execute_batch(object.ddl)?;
            created += 1;
        }
    }

    info!("Database schema verified ({} object(s) created)", created);
    Ok(created)
}

fn object_exists(conn: &Connection, kind: &str, name: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2",
            (kind, name),
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}
