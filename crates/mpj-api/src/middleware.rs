use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use mpj_types::api::Claims;

/// How bearer tokens from the identity provider are checked.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl AuthConfig {
    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &self.issuer {
            validation.set_issuer(&[iss]);
        }
        validation
    }
}

/// Extract and validate the JWT from the Authorization header. The verified
/// claims are handed to handlers as a request extension.
pub async fn require_auth(
    State(auth): State<Arc<AuthConfig>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &auth.validation(),
    )
    .map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    if token_data.claims.sub.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}
