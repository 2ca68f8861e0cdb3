#![allow(dead_code)]

use std::sync::{Arc, Once};

use anyhow::{Context, Result};
use serde_json::{json, Value};

use company_registry_api::{
    app,
    auth::{generate_jwt, hash_password},
    config::AppConfig,
    database::{
        models::{NewUser, Role, User},
        MemoryStore, Store,
    },
    services::ensure_default_admin,
    AppState,
};

pub const ADMIN_PASSWORD: &str = "admin123";
pub const USER_PASSWORD: &str = "user-pass-1";

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// The real router served on an ephemeral port over an in-memory store.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub config: AppConfig,
    /// Seeded administrator, `None` for an empty server.
    pub admin: Option<User>,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Server with the default administrator already seeded.
    pub async fn start() -> Result<Self> {
        let mut server = Self::start_empty().await?;
        let admin = ensure_default_admin(server.store.as_ref(), &server.config.bootstrap)
            .await?
            .context("administrator was not seeded")?;
        server.admin = Some(admin);
        Ok(server)
    }

    /// Server over a store with no users at all.
    pub async fn start_empty() -> Result<Self> {
        init_tracing();

        let mut config = AppConfig::development();
        config.security.jwt_secret = "integration-test-secret".to_string();

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.expect("server");
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            store,
            config,
            admin: None,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token_for(&self, user: &User) -> String {
        generate_jwt(&self.config.security, user.id, user.role).expect("token")
    }

    pub fn admin_token(&self) -> String {
        self.token_for(self.admin.as_ref().expect("server was started without an administrator"))
    }

    /// Insert a USER directly and return it with a token.
    pub async fn create_user(&self, username: &str) -> Result<(User, String)> {
        self.insert_account(username, Role::User).await
    }

    /// Insert a second ADMIN directly and return it with a token.
    pub async fn create_admin(&self, username: &str) -> Result<(User, String)> {
        self.insert_account(username, Role::Admin).await
    }

    async fn insert_account(&self, username: &str, role: Role) -> Result<(User, String)> {
        let user = self
            .store
            .insert_user(NewUser {
                name: "Test".to_string(),
                surname: "User".to_string(),
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password: hash_password(USER_PASSWORD.to_string()).await?,
                phone: None,
                role,
            })
            .await?;
        let token = self.token_for(&user);
        Ok((user, token))
    }

    /// POST /company as the administrator; returns the created record.
    pub async fn create_company(&self, name: &str, years: i64, category: &str) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/company"))
            .bearer_auth(self.admin_token())
            .json(&json!({
                "name": name,
                "description": format!("{} description", name),
                "levelImpact": "Medio",
                "yearsTrajectory": years,
                "category": category
            }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == reqwest::StatusCode::CREATED, "create failed: {}", res.status());
        let body: Value = res.json().await?;
        Ok(body["data"].clone())
    }
}

/// Field names listed in a validation error body.
pub fn failed_fields(body: &Value) -> Vec<String> {
    body["field_errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
