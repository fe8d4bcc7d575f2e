use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, warn};

use mpj_db::Database;
use mpj_types::models::{JournalRequest, Note, RequestAction};

use crate::error::ServiceError;

/// Extra time the async side waits past the storage deadline, so a write that
/// passed its deadline check can report its commit instead of being abandoned.
const COMMIT_GRACE: Duration = Duration::from_millis(100);

/// Journal operations for the async side of the server. Each call runs the
/// blocking SQLite work off the runtime and gives up after `timeout`.
///
/// Writes receive the same deadline: once it passes they roll back instead of
/// committing, so a reported timeout never leaves rows behind.
#[derive(Clone)]
pub struct JournalService {
    db: Arc<Database>,
    timeout: Duration,
}

impl JournalService {
    pub fn new(db: Arc<Database>, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    async fn run<F, T>(&self, op: &'static str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&Database, Instant) -> mpj_db::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let deadline = Instant::now() + self.timeout;
        let task = tokio::task::spawn_blocking(move || f(&db, deadline));

        match tokio::time::timeout(self.timeout + COMMIT_GRACE, task).await {
            Ok(Ok(result)) => result.map_err(ServiceError::from),
            Ok(Err(e)) => {
                error!("spawn_blocking join error in {}: {}", op, e);
                Err(ServiceError::TransientStorage)
            }
            Err(_) => {
                warn!("{} timed out after {:?}", op, self.timeout);
                Err(ServiceError::TransientStorage)
            }
        }
    }

    pub async fn create_request(&self, user_id: &str, text: &str) -> Result<JournalRequest, ServiceError> {
        let (user_id, text) = (user_id.to_owned(), text.to_owned());
        self.run("create_request", move |db, deadline| db.add_new(&user_id, &text, Some(deadline))).await
    }

    pub async fn add_history(
        &self,
        user_id: &str,
        request_id: &str,
        status: RequestAction,
        text: Option<String>,
    ) -> Result<(), ServiceError> {
        let (user_id, request_id) = (user_id.to_owned(), request_id.to_owned());
        self.run("add_history", move |db, deadline| {
            db.add_history(&user_id, &request_id, &status, text.as_deref(), Some(deadline))
        })
        .await
    }

    pub async fn add_note(&self, user_id: &str, request_id: &str, notes: &str) -> Result<(), ServiceError> {
        let (user_id, request_id, notes) = (user_id.to_owned(), request_id.to_owned(), notes.to_owned());
        self.run("add_note", move |db, deadline| db.add_note(&user_id, &request_id, &notes, Some(deadline))).await
    }

    pub async fn journal(&self, user_id: &str) -> Result<Vec<JournalRequest>, ServiceError> {
        let user_id = user_id.to_owned();
        self.run("journal", move |db, _| db.journal(&user_id)).await
    }

    pub async fn answered(&self, user_id: &str) -> Result<Vec<JournalRequest>, ServiceError> {
        let user_id = user_id.to_owned();
        self.run("answered", move |db, _| db.answered(&user_id)).await
    }

    pub async fn by_id(&self, user_id: &str, request_id: &str) -> Result<JournalRequest, ServiceError> {
        let (user_id, request_id) = (user_id.to_owned(), request_id.to_owned());
        self.run("by_id", move |db, _| db.by_id(&user_id, &request_id)).await
    }

    pub async fn full_by_id(&self, user_id: &str, request_id: &str) -> Result<JournalRequest, ServiceError> {
        let (user_id, request_id) = (user_id.to_owned(), request_id.to_owned());
        self.run("full_by_id", move |db, _| db.full_by_id(&user_id, &request_id)).await
    }

    pub async fn notes_by_id(&self, user_id: &str, request_id: &str) -> Result<Vec<Note>, ServiceError> {
        let (user_id, request_id) = (user_id.to_owned(), request_id.to_owned());
        self.run("notes_by_id", move |db, _| db.notes_by_id(&user_id, &request_id)).await
    }
}
