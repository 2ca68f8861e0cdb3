use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::decode_jwt;
use crate::database::models::Role;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated identity extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
///
/// The token subject must still be an active account; its stored role wins over the claim.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers)?.ok_or_else(|| {
        tracing::warn!("Rejected {}: missing Authorization header", request.uri().path());
        ApiError::unauthorized("Missing Authorization header")
    })?;

    let auth_user = authenticate(&state, &token).await?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Identity from an optional bearer token. A present but invalid token is still a 401.
pub async fn optional_identity(headers: &HeaderMap, state: &AppState) -> Result<Option<AuthUser>, ApiError> {
    match extract_jwt_from_headers(headers)? {
        Some(token) => authenticate(state, &token).await.map(Some),
        None => Ok(None),
    }
}

async fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let claims = decode_jwt(&state.config.security, token).map_err(|e| {
        tracing::warn!("Rejected token: {}", e);
        ApiError::from(e)
    })?;

    match state.store.find_user(claims.sub).await? {
        Some(user) if user.status => Ok(AuthUser {
            id: user.id,
            role: user.role,
        }),
        _ => {
            tracing::warn!("Rejected token for missing or inactive user {}", claims.sub);
            Err(ApiError::unauthorized("User not found or inactive"))
        }
    }
}

/// Bearer token from the Authorization header, `None` when the header is absent
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err(ApiError::unauthorized("Empty JWT token"));
        }
        Ok(Some(token.trim().to_string()))
    } else {
        Err(ApiError::unauthorized("Authorization header must use Bearer token format"))
    }
}
