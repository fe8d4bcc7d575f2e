use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// Claims of a bearer token issued by the identity provider. `sub` is the
/// owning user id for every journal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

// -- Requests --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    pub request_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddHistoryRequest {
    pub status: String,
    #[serde(default)]
    pub update_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddNoteRequest {
    pub notes: String,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}
