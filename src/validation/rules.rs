use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use super::{Rule, RuleError, ValidationContext};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex compiles")
});

/// Integer from a JSON number or a numeric string.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub struct IsString;

#[async_trait]
impl Rule for IsString {
    async fn check(&self, value: &Value, _ctx: &ValidationContext) -> Result<(), RuleError> {
        match value {
            Value::String(_) => Ok(()),
            _ => Err(RuleError::invalid("must be a string")),
        }
    }
}

pub struct IsEmail;

#[async_trait]
impl Rule for IsEmail {
    async fn check(&self, value: &Value, _ctx: &ValidationContext) -> Result<(), RuleError> {
        match value.as_str() {
            Some(s) if EMAIL_RE.is_match(s.trim()) => Ok(()),
            _ => Err(RuleError::invalid("must be a valid email address")),
        }
    }
}

pub struct IsInt;

#[async_trait]
impl Rule for IsInt {
    async fn check(&self, value: &Value, _ctx: &ValidationContext) -> Result<(), RuleError> {
        as_int(value)
            .map(|_| ())
            .ok_or_else(|| RuleError::invalid("must be an integer"))
    }
}

pub struct IsUuid;

#[async_trait]
impl Rule for IsUuid {
    async fn check(&self, value: &Value, _ctx: &ValidationContext) -> Result<(), RuleError> {
        match value.as_str().map(Uuid::parse_str) {
            Some(Ok(_)) => Ok(()),
            _ => Err(RuleError::invalid("must be a valid id")),
        }
    }
}

/// String membership in a fixed set
pub struct OneOf(pub &'static [&'static str]);

#[async_trait]
impl Rule for OneOf {
    async fn check(&self, value: &Value, _ctx: &ValidationContext) -> Result<(), RuleError> {
        match value.as_str() {
            Some(s) if self.0.contains(&s) => Ok(()),
            _ => Err(RuleError::invalid(format!("must be one of: {}", self.0.join(", ")))),
        }
    }
}

/// Inclusive integer bounds. Non-integers fail too.
pub struct IntRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl IntRange {
    pub fn at_least(min: i64) -> Self {
        Self { min: Some(min), max: None }
    }

    pub fn between(min: i64, max: i64) -> Self {
        Self { min: Some(min), max: Some(max) }
    }
}

#[async_trait]
impl Rule for IntRange {
    async fn check(&self, value: &Value, _ctx: &ValidationContext) -> Result<(), RuleError> {
        let n = as_int(value).ok_or_else(|| RuleError::invalid("must be an integer"))?;
        match (self.min, self.max) {
            (Some(min), Some(max)) if n < min || n > max => {
                Err(RuleError::invalid(format!("must be between {} and {}", min, max)))
            }
            (Some(min), _) if n < min => Err(RuleError::invalid(format!("must be at least {}", min))),
            (_, Some(max)) if n > max => Err(RuleError::invalid(format!("must be at most {}", max))),
            _ => Ok(()),
        }
    }
}

/// Character count of the trimmed string
pub struct Length {
    pub min: usize,
    pub max: Option<usize>,
}

impl Length {
    pub fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self { min, max: Some(max) }
    }
}

#[async_trait]
impl Rule for Length {
    async fn check(&self, value: &Value, _ctx: &ValidationContext) -> Result<(), RuleError> {
        let s = value.as_str().ok_or_else(|| RuleError::invalid("must be a string"))?;
        let len = s.trim().chars().count();
        if len < self.min {
            return Err(RuleError::invalid(if self.min == 1 {
                "must not be empty".to_string()
            } else {
                format!("must be at least {} characters", self.min)
            }));
        }
        match self.max {
            Some(max) if len > max => Err(RuleError::invalid(format!("must be at most {} characters", max))),
            _ => Ok(()),
        }
    }
}

/// Rejects any supplied value, for fields a route must not change.
pub struct NotAllowed;

#[async_trait]
impl Rule for NotAllowed {
    async fn check(&self, _value: &Value, _ctx: &ValidationContext) -> Result<(), RuleError> {
        Err(RuleError::invalid("cannot be changed through this endpoint"))
    }
}
