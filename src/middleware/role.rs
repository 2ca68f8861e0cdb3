use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::database::models::Role;
use crate::error::ApiError;

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Continue only when the identity attached by `jwt_auth_middleware` holds one of `roles`.
///
/// Mount with `middleware::from_fn_with_state(ADMIN_ONLY, require_roles)`.
pub async fn require_roles(
    State(roles): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before role check"))?;

    if !roles.contains(&auth_user.role) {
        tracing::warn!(
            "User {} with role {} denied {} {}",
            auth_user.id,
            auth_user.role,
            request.method(),
            request.uri().path()
        );
        return Err(ApiError::forbidden(format!(
            "This action requires one of the roles: {}",
            roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
        )));
    }

    Ok(next.run(request).await)
}
