// Store-backed checks used by validation chains. Each one issues exactly one
// store lookup. `except` lets update routes ignore the record being modified.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{Rule, RuleError, ValidationContext};
use crate::database::{Store, StoreError};

pub async fn email_is_unique(store: &dyn Store, email: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
    Ok(!store.email_taken(email, except).await?)
}

pub async fn username_is_unique(store: &dyn Store, username: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
    Ok(!store.username_taken(username, except).await?)
}

pub async fn company_name_is_unique(store: &dyn Store, name: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
    Ok(!store.company_name_taken(name, except).await?)
}

/// True when the user exists and is active.
pub async fn user_is_present(store: &dyn Store, id: Uuid) -> Result<bool, StoreError> {
    Ok(store.find_user(id).await?.is_some_and(|u| u.status))
}

/// True when the company exists and is active.
pub async fn company_is_present(store: &dyn Store, id: Uuid) -> Result<bool, StoreError> {
    Ok(store.find_company(id).await?.is_some_and(|c| c.status))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unique {
    Email,
    Username,
    CompanyName,
}

/// Fails when another record already holds the value
pub struct IsUnique {
    pub target: Unique,
    pub except: Option<Uuid>,
}

impl IsUnique {
    pub fn new(target: Unique, except: Option<Uuid>) -> Self {
        Self { target, except }
    }
}

#[async_trait]
impl Rule for IsUnique {
    async fn check(&self, value: &Value, ctx: &ValidationContext) -> Result<(), RuleError> {
        let raw = value.as_str().ok_or_else(|| RuleError::invalid("must be a string"))?;
        let raw = raw.trim();
        let store = ctx.store.as_ref();

        let (unique, label) = match self.target {
            Unique::Email => (email_is_unique(store, raw, self.except).await?, "email"),
            Unique::Username => (username_is_unique(store, raw, self.except).await?, "username"),
            Unique::CompanyName => (company_name_is_unique(store, raw, self.except).await?, "company name"),
        };

        if unique {
            Ok(())
        } else {
            Err(RuleError::invalid(format!("{} '{}' is already registered", label, raw)))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Present {
    User,
    Company,
}

/// Fails when the referenced id has no active record
pub struct IsPresent(pub Present);

#[async_trait]
impl Rule for IsPresent {
    async fn check(&self, value: &Value, ctx: &ValidationContext) -> Result<(), RuleError> {
        let id = value
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| RuleError::invalid("must be a valid id"))?;
        let store = ctx.store.as_ref();

        let (present, label) = match self.0 {
            Present::User => (user_is_present(store, id).await?, "user"),
            Present::Company => (company_is_present(store, id).await?, "company"),
        };

        if present {
            Ok(())
        } else {
            Err(RuleError::invalid(format!("no active {} with id {}", label, id)))
        }
    }
}
