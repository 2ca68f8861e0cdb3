// handlers/mod.rs - route handlers grouped by resource
//
// Public: /health, /auth/*
// Protected (JWT): /user*, /company*; role checks are mounted per method in app.rs

pub mod auth;
pub mod company;
pub mod health;
pub mod user;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::validation::rules::as_int;

/// JSON request body whose rejections use the API error envelope
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::invalid_json(rejection.body_text())),
        }
    }
}

/// Deserialize an already validated body.
pub(crate) fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::invalid_json(e.to_string()))
}

/// Path id that a validation chain has already accepted.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::field("id", "must be a valid id"))
}

/// Trimmed string member, `None` when absent or null.
pub(crate) fn text(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(|s| s.trim().to_string())
}

pub(crate) fn int(body: &Value, key: &str) -> Option<i64> {
    body.get(key).and_then(as_int)
}
