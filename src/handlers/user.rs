// handlers/user.rs - /user and /user/:uid

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{parse_body, parse_id, JsonBody};
use crate::auth::hash_password;
use crate::database::models::{Role, User, UserPatch};
use crate::error::ApiError;
use crate::filter::{filter::QueryParams, Page};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::validation::{chains, with_values, ValidationContext};

#[derive(Debug, Serialize)]
pub struct UserList {
    pub total: i64,
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserRemoved {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserUpdate {
    name: Option<String>,
    surname: Option<String>,
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    /// Absent leaves the number alone, `null` clears it.
    #[serde(default, deserialize_with = "present")]
    phone: Option<Option<String>>,
    role: Option<Role>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl UserUpdate {
    /// Trim text and hash a new password. Role changes are dropped unless allowed.
    async fn into_patch(self, allow_role: bool) -> Result<UserPatch, ApiError> {
        let password = match self.password {
            Some(p) => Some(hash_password(p).await?),
            None => None,
        };
        let trim = |v: Option<String>| v.map(|s| s.trim().to_string());

        Ok(UserPatch {
            name: trim(self.name),
            surname: trim(self.surname),
            username: trim(self.username),
            email: trim(self.email),
            password,
            phone: self.phone.map(trim),
            role: if allow_role { self.role } else { None },
        })
    }
}

fn non_empty(patch: UserPatch) -> Result<UserPatch, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::bad_request("No updatable fields supplied"));
    }
    Ok(patch)
}

async fn active_user(state: &AppState, id: Uuid) -> Result<User, ApiError> {
    match state.store.find_user(id).await? {
        Some(user) if user.status => Ok(user),
        _ => Err(ApiError::not_found(format!("User {} not found", id))),
    }
}

/// The store must keep at least one active ADMIN.
async fn ensure_not_last_admin(state: &AppState, user: &User) -> Result<(), ApiError> {
    if user.role == Role::Admin && state.store.active_admin_count().await? <= 1 {
        tracing::warn!("Refused to remove the last active administrator {}", user.id);
        return Err(ApiError::bad_request("The last active administrator cannot be removed"));
    }
    Ok(())
}

/// GET /user?limite&desde - active users, paginated
pub async fn list(State(state): State<AppState>, Query(params): Query<QueryParams>) -> ApiResult<UserList> {
    let pagination = &state.config.pagination;
    let page = Page::from_params(&params, pagination.users_default_limit, pagination.max_limit)?;

    let result = state.store.list_users(page).await?;
    Ok(ApiResponse::success(UserList {
        total: result.total,
        users: result.items,
    }))
}

/// GET /user/:uid
pub async fn get(State(state): State<AppState>, Path(uid): Path<String>) -> ApiResult<User> {
    let ctx = ValidationContext::new(state.store.clone());
    chains::user_by_id().run(&json!({ "uid": uid }), &ctx).await?;
    let id = parse_id(&uid)?;

    Ok(ApiResponse::success(active_user(&state, id).await?))
}

/// PUT /user/:uid - administrative partial update, role included
pub async fn update(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<User> {
    let parsed = parse_id(&uid).ok();
    let input = with_values(body, &[("uid", Value::String(uid.clone()))]);

    let ctx = ValidationContext::new(state.store.clone());
    chains::update_user(parsed).run(&input, &ctx).await?;
    let id = parse_id(&uid)?;
    let current = active_user(&state, id).await?;

    let update: UserUpdate = parse_body(input)?;
    let patch = non_empty(update.into_patch(true).await?)?;
    if patch.role.is_some_and(|role| role != Role::Admin) {
        ensure_not_last_admin(&state, &current).await?;
    }

    let user = state
        .store
        .update_user(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))?;

    tracing::info!("Updated user {}", user.id);
    Ok(ApiResponse::success(user))
}

/// PUT /user - the caller updates their own profile; role and status are rejected
pub async fn update_self(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(body): JsonBody,
) -> ApiResult<User> {
    let input = with_values(body, &[("id", json!(auth.id))]);

    let ctx = ValidationContext::new(state.store.clone());
    chains::update_self(auth.id).run(&input, &ctx).await?;

    let update: UserUpdate = parse_body(input)?;
    let patch = non_empty(update.into_patch(false).await?)?;

    let user = state
        .store
        .update_user(auth.id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", auth.id)))?;

    Ok(ApiResponse::success(user))
}

/// DELETE /user - logically delete the calling account
pub async fn delete_self(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<UserRemoved> {
    let ctx = ValidationContext::new(state.store.clone());
    chains::delete_self().run(&json!({ "id": auth.id }), &ctx).await?;
    ensure_not_last_admin(&state, &active_user(&state, auth.id).await?).await?;

    let user = state
        .store
        .deactivate_user(auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", auth.id)))?;

    tracing::info!("Deactivated user {}", user.id);
    Ok(ApiResponse::success(UserRemoved {
        message: "User deactivated",
        user,
    }))
}
