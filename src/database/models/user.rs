use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub const ALL: &'static [&'static str] = &["ADMIN", "USER"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Account record. The password hash never leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    /// Already hashed.
    pub password: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl NewUser {
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            name: self.name,
            surname: self.surname,
            username: self.username,
            email: self.email.to_lowercase(),
            password: self.password,
            phone: self.phone,
            role: self.role,
            status: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    /// Already hashed.
    pub password: Option<String>,
    /// `Some(None)` clears the number.
    pub phone: Option<Option<String>>,
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        *self == UserPatch::default()
    }

    pub fn apply(self, user: &mut User, now: DateTime<Utc>) {
        if let Some(v) = self.name { user.name = v; }
        if let Some(v) = self.surname { user.surname = v; }
        if let Some(v) = self.username { user.username = v; }
        if let Some(v) = self.email { user.email = v.to_lowercase(); }
        if let Some(v) = self.password { user.password = v; }
        if let Some(v) = self.phone { user.phone = v; }
        if let Some(v) = self.role { user.role = v; }
        user.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_wire_format() {
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("ADMIN"));
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn password_is_never_serialized() {
        let user = NewUser {
            name: "Ana".into(),
            surname: "Diaz".into(),
            username: "ana".into(),
            email: "Ana@Example.com".into(),
            password: "$argon2id$hash".into(),
            phone: None,
            role: Role::User,
        }
        .into_user(Utc::now());

        let v = serde_json::to_value(&user).unwrap();
        assert!(v.get("password").is_none());
        assert_eq!(v["email"], "ana@example.com");
        assert_eq!(v["status"], true);
    }

    #[test]
    fn patch_distinguishes_absent_and_cleared_phone() {
        let mut user = NewUser {
            name: "Ana".into(),
            surname: "Diaz".into(),
            username: "ana".into(),
            email: "ana@example.com".into(),
            password: "hash".into(),
            phone: Some("5551234567".into()),
            role: Role::User,
        }
        .into_user(Utc::now());

        UserPatch { name: Some("Ana Maria".into()), ..Default::default() }.apply(&mut user, Utc::now());
        assert_eq!(user.phone.as_deref(), Some("5551234567"));

        let clear = UserPatch { phone: Some(None), ..Default::default() };
        assert!(!clear.is_empty());
        clear.apply(&mut user, Utc::now());
        assert!(user.phone.is_none());
    }
}
