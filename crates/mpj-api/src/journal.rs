use axum::{Extension, Json, extract::State};

use mpj_types::api::Claims;
use mpj_types::models::JournalRequest;

use crate::AppState;
use crate::error::ServiceError;

/// The caller's active journal; an empty journal is `[]`.
pub async fn get_journal(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<JournalRequest>>, ServiceError> {
    let requests = state.service.journal(&claims.sub).await?;
    Ok(Json(requests))
}
