// handlers/auth.rs - POST /auth/register, POST /auth/login

use axum::{extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};

use super::{parse_body, JsonBody};
use crate::auth::{generate_jwt, hash_password, verify_dummy, verify_password};
use crate::database::models::{NewUser, Role, User};
use crate::error::ApiError;
use crate::middleware::{optional_identity, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{chains, ValidationContext};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    name: String,
    surname: String,
    username: String,
    email: String,
    password: String,
    role: Role,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    username: Option<String>,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// POST /auth/register - create a user account
///
/// Open while the store holds no administrator, so the first account can be
/// created on an empty deployment. Afterwards the caller must present an ADMIN
/// token: no token is a 401 and a non-ADMIN token a 403.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(body): JsonBody,
) -> ApiResult<User> {
    if state.store.admin_exists().await? {
        let caller = optional_identity(&headers, &state).await?
            .ok_or_else(|| ApiError::unauthorized("Registration requires an administrator token"))?;
        if !caller.is_admin() {
            tracing::warn!("User {} attempted to register an account", caller.id);
            return Err(ApiError::forbidden("Only administrators can register users"));
        }
    }

    let ctx = ValidationContext::new(state.store.clone());
    chains::register().run(&body, &ctx).await?;
    let input: RegisterRequest = parse_body(body)?;

    let password = hash_password(input.password).await?;
    let user = state
        .store
        .insert_user(NewUser {
            name: input.name.trim().to_string(),
            surname: input.surname.trim().to_string(),
            username: input.username.trim().to_string(),
            email: input.email.trim().to_string(),
            password,
            phone: input.phone.map(|p| p.trim().to_string()),
            role: input.role,
        })
        .await?;

    tracing::info!("Registered user '{}' ({}) as {}", user.username, user.id, user.role);
    Ok(ApiResponse::created(user))
}

/// POST /auth/login - exchange email or username plus password for a JWT
///
/// Unknown, inactive and wrong-password logins share one 400 response.
pub async fn login(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult<LoginResponse> {
    let ctx = ValidationContext::new(state.store.clone());
    chains::login().run(&body, &ctx).await?;
    let input: LoginRequest = parse_body(body)?;

    let email = input.email.as_deref().map(str::trim);
    let username = input.username.as_deref().map(str::trim);
    let invalid = || ApiError::bad_request("Invalid credentials");

    let Some(user) = state.store.find_login(email, username).await? else {
        verify_dummy(input.password).await?;
        return Err(invalid());
    };
    if !verify_password(input.password, user.password.clone()).await? {
        tracing::warn!("Failed login for '{}'", user.username);
        return Err(invalid());
    }

    let token = generate_jwt(&state.config.security, user.id, user.role)?;
    tracing::info!("User '{}' logged in", user.username);
    Ok(ApiResponse::success(LoginResponse { token, user }))
}
