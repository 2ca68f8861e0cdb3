// Validation chains: ordered per-field rules run before a controller.
//
// A chain is a list of entries evaluated in declaration order. Each field entry
// runs its rules one at a time and stops at the first failure; async rules are
// awaited before the next rule starts. All field failures are collected and
// returned as a single 400. A store failure inside a rule aborts with 500.

pub mod chains;
pub mod predicates;
pub mod rules;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::database::{Store, StoreError};
use crate::error::{ApiError, FieldError};

/// Handles a rule may need while checking a value
#[derive(Clone)]
pub struct ValidationContext {
    pub store: Arc<dyn Store>,
}

impl ValidationContext {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Outcome of a single failed rule
#[derive(Debug)]
pub enum RuleError {
    /// The value is unacceptable; the message is shown to the client.
    Invalid(String),
    /// The rule could not be evaluated.
    Store(StoreError),
}

impl From<StoreError> for RuleError {
    fn from(err: StoreError) -> Self {
        RuleError::Store(err)
    }
}

impl RuleError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RuleError::Invalid(message.into())
    }
}

/// One check applied to a present, non-null field value
#[async_trait]
pub trait Rule: Send + Sync {
    async fn check(&self, value: &Value, ctx: &ValidationContext) -> Result<(), RuleError>;
}

pub struct Field {
    name: &'static str,
    required: bool,
    rules: Vec<Box<dyn Rule>>,
}

impl Field {
    /// Missing or null is a failure.
    pub fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            rules: Vec::new(),
        }
    }

    /// Missing or null skips every rule.
    pub fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    async fn run(&self, input: &Map<String, Value>, ctx: &ValidationContext) -> Result<Option<FieldError>, StoreError> {
        let value = match input.get(self.name) {
            None | Some(Value::Null) if self.required => {
                return Ok(Some(FieldError::new(self.name, format!("{} is required", self.name))));
            }
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };

        for rule in &self.rules {
            match rule.check(value, ctx).await {
                Ok(()) => continue,
                Err(RuleError::Invalid(message)) => return Ok(Some(FieldError::new(self.name, message))),
                Err(RuleError::Store(err)) => return Err(err),
            }
        }
        Ok(None)
    }
}

/// How many fields of a group may be supplied together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    ExactlyOne,
    AtMostOne,
    AtLeastOne,
}

struct Group {
    fields: &'static [&'static str],
    mode: GroupMode,
}

impl Group {
    fn run(&self, input: &Map<String, Value>) -> Option<FieldError> {
        let present = self
            .fields
            .iter()
            .filter(|f| input.get(**f).is_some_and(|v| !v.is_null()))
            .count();
        let listed = self.fields.join(", ");

        let message = match self.mode {
            GroupMode::ExactlyOne if present != 1 => format!("exactly one of {} must be provided", listed),
            GroupMode::AtMostOne if present > 1 => format!("only one of {} may be provided", listed),
            GroupMode::AtLeastOne if present == 0 => format!("one of {} is required", listed),
            _ => return None,
        };
        Some(FieldError::new(self.fields[0], message))
    }
}

enum Entry {
    Field(Field),
    Group(Group),
}

/// Ordered list of field checks for one route
#[derive(Default)]
pub struct ValidationChain {
    entries: Vec<Entry>,
}

impl ValidationChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.entries.push(Entry::Field(field));
        self
    }

    /// Cross-field presence constraint, reported against the first field name.
    pub fn group(mut self, fields: &'static [&'static str], mode: GroupMode) -> Self {
        self.entries.push(Entry::Group(Group { fields, mode }));
        self
    }

    /// Check `input` (a JSON object) and fold every failure into one error.
    pub async fn run(&self, input: &Value, ctx: &ValidationContext) -> Result<(), ApiError> {
        let Some(map) = input.as_object() else {
            return Err(ApiError::invalid_json("Request body must be a JSON object"));
        };

        let mut failures = Vec::new();
        for entry in &self.entries {
            let outcome = match entry {
                Entry::Field(field) => field.run(map, ctx).await?,
                Entry::Group(group) => group.run(map),
            };
            if let Some(failure) = outcome {
                failures.push(failure);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            tracing::debug!("Validation failed on {} field(s)", failures.len());
            Err(ApiError::validation_error("Validation failed", failures))
        }
    }
}

/// Add path or identity values to a body so one chain can check them together.
/// Body keys with the same name are overwritten.
pub fn with_values(body: Value, values: &[(&str, Value)]) -> Value {
    let mut map = match body {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => return other,
    };
    for (key, value) in values {
        map.insert((*key).to_string(), value.clone());
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::rules::{IsEmail, IsInt, Length};
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn ctx() -> ValidationContext {
        ValidationContext::new(Arc::new(MemoryStore::new()))
    }

    fn field_errors(err: ApiError) -> Vec<FieldError> {
        match err {
            ApiError::ValidationError { field_errors, .. } => field_errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn collects_failures_in_declaration_order() {
        let chain = ValidationChain::new()
            .field(Field::required("name").rule(Length::between(1, 10)))
            .field(Field::required("email").rule(IsEmail))
            .field(Field::optional("age").rule(IsInt));

        let err = chain
            .run(&json!({ "email": "nope", "age": "x" }), &ctx())
            .await
            .unwrap_err();
        let fields: Vec<_> = field_errors(err).into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email", "age"]);
    }

    #[tokio::test]
    async fn optional_null_skips_rules() {
        let chain = ValidationChain::new().field(Field::optional("phone").rule(Length::between(7, 20)));
        assert!(chain.run(&json!({ "phone": null }), &ctx()).await.is_ok());
        assert!(chain.run(&json!({}), &ctx()).await.is_ok());
    }

    #[tokio::test]
    async fn stops_at_first_failing_rule() {
        let chain = ValidationChain::new().field(
            Field::required("email")
                .rule(IsEmail)
                .rule(Length::between(100, 200)),
        );
        let errors = field_errors(chain.run(&json!({ "email": "bad" }), &ctx()).await.unwrap_err());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "must be a valid email address");
    }

    #[tokio::test]
    async fn group_modes() {
        let exactly = ValidationChain::new().group(&["a", "b"], GroupMode::ExactlyOne);
        assert!(exactly.run(&json!({ "a": 1 }), &ctx()).await.is_ok());
        assert!(exactly.run(&json!({ "a": 1, "b": 2 }), &ctx()).await.is_err());
        assert!(exactly.run(&json!({}), &ctx()).await.is_err());

        let at_most = ValidationChain::new().group(&["a", "b"], GroupMode::AtMostOne);
        assert!(at_most.run(&json!({}), &ctx()).await.is_ok());
        assert!(at_most.run(&json!({ "a": 1, "b": null }), &ctx()).await.is_ok());
    }

    #[tokio::test]
    async fn non_object_body_is_invalid_json() {
        let err = ValidationChain::new().run(&json!([1, 2]), &ctx()).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_JSON");
    }

    #[test]
    fn with_values_overrides_body_keys() {
        let merged = with_values(json!({ "id": "spoofed", "name": "x" }), &[("id", json!("real"))]);
        assert_eq!(merged, json!({ "id": "real", "name": "x" }));
    }
}
