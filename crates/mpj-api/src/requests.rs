use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use mpj_types::api::{AddHistoryRequest, AddNoteRequest, Claims, NewRequest};
use mpj_types::models::{JournalRequest, Note, RequestAction};

use crate::AppState;
use crate::error::ServiceError;

pub async fn add_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<NewRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .service
        .create_request(&claims.sub, &req.request_text)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Record prayed / updated / answered etc. An empty `updateText` leaves the
/// request text unchanged.
pub async fn add_history(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddHistoryRequest>,
) -> Result<StatusCode, ServiceError> {
    state
        .service
        .add_history(
            &claims.sub,
            &request_id,
            RequestAction::from(req.status),
            req.update_text,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_note(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddNoteRequest>,
) -> Result<StatusCode, ServiceError> {
    state
        .service
        .add_note(&claims.sub, &request_id, &req.notes)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_answered(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<JournalRequest>>, ServiceError> {
    Ok(Json(state.service.answered(&claims.sub).await?))
}

pub async fn get_request(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<JournalRequest>, ServiceError> {
    Ok(Json(state.service.by_id(&claims.sub, &request_id).await?))
}

pub async fn get_full_request(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<JournalRequest>, ServiceError> {
    Ok(Json(state.service.full_by_id(&claims.sub, &request_id).await?))
}

pub async fn get_notes(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Note>>, ServiceError> {
    Ok(Json(state.service.notes_by_id(&claims.sub, &request_id).await?))
}
