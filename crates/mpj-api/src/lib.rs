pub mod error;
pub mod journal;
pub mod middleware;
pub mod requests;
pub mod service;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::middleware::{AuthConfig, require_auth};
use crate::service::JournalService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub service: JournalService,
}

/// All journal routes, behind bearer-token authentication.
pub fn router(state: AppState, auth: Arc<AuthConfig>) -> Router {
    Router::new()
        .route("/api/journal", get(journal::get_journal))
        .route("/api/request", post(requests::add_request))
        .route("/api/request/answered", get(requests::get_answered))
        .route("/api/request/{request_id}", get(requests::get_request))
        .route("/api/request/{request_id}/full", get(requests::get_full_request))
        .route("/api/request/{request_id}/notes", get(requests::get_notes))
        .route("/api/request/{request_id}/history", post(requests::add_history))
        .route("/api/request/{request_id}/note", post(requests::add_note))
        .layer(from_fn_with_state(auth, require_auth))
        .with_state(state)
}
