use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgArguments, PgPoolOptions, PgRow},
    FromRow, PgPool, Row,
};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::models::{
    Company, CompanyPatch, CompanyView, LevelImpact, NewCompany, NewUser, OwnerRef, Role, User,
    UserPatch,
};
use crate::database::store::{Store, StoreError};
use crate::filter::{CompanyFilter, FilterOrder, FilterWhere, Page, Paged, SortDirection, SqlParam};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id          UUID PRIMARY KEY,
        name        TEXT NOT NULL,
        surname     TEXT NOT NULL DEFAULT '',
        username    TEXT NOT NULL,
        email       TEXT NOT NULL,
        password    TEXT NOT NULL,
        phone       TEXT,
        role        TEXT NOT NULL CHECK (role IN ('ADMIN', 'USER')),
        status      BOOLEAN NOT NULL DEFAULT TRUE,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS companies (
        id                UUID PRIMARY KEY,
        name              TEXT NOT NULL,
        description       TEXT NOT NULL,
        level_impact      TEXT NOT NULL,
        years_trajectory  INTEGER NOT NULL CHECK (years_trajectory >= 0),
        category          TEXT NOT NULL,
        created_by        UUID NOT NULL REFERENCES users (id),
        status            BOOLEAN NOT NULL DEFAULT TRUE,
        created_at        TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at        TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower_key ON users (LOWER(email))",
    "CREATE UNIQUE INDEX IF NOT EXISTS users_username_lower_key ON users (LOWER(username))",
    "CREATE UNIQUE INDEX IF NOT EXISTS companies_name_lower_key ON companies (LOWER(name))",
    "CREATE INDEX IF NOT EXISTS companies_status_idx ON companies (status)",
    "CREATE INDEX IF NOT EXISTS users_role_idx ON users (role)",
];

const USER_COLUMNS: &str =
    "id, name, surname, username, email, password, phone, role, status, created_at, updated_at";

const COMPANY_VIEW_SELECT: &str = r#"
    SELECT c.id, c.name, c.description, c.level_impact, c.years_trajectory, c.category,
           c.created_by, c.status, c.created_at, c.updated_at,
           u.name AS owner_name, u.email AS owner_email
    FROM companies c
    LEFT JOIN users u ON u.id = c.created_by
"#;

/// Store backed by a PostgreSQL connection pool
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and create the schema. Any failure here is fatal for the process.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::QueryError("DATABASE_URL is not configured".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        info!("Connected to PostgreSQL (max_connections={})", config.max_connections);
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    surname: String,
    username: String,
    email: String,
    password: String,
    phone: Option<String>,
    role: String,
    status: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            surname: row.surname,
            username: row.username,
            email: row.email,
            password: row.password,
            phone: row.phone,
            role: row.role.parse::<Role>().map_err(StoreError::Corrupt)?,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CompanyRow {
    id: Uuid,
    name: String,
    description: String,
    level_impact: String,
    years_trajectory: i32,
    category: String,
    created_by: Uuid,
    status: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CompanyRow> for Company {
    type Error = StoreError;

    fn try_from(row: CompanyRow) -> Result<Self, Self::Error> {
        Ok(Company {
            id: row.id,
            name: row.name,
            description: row.description,
            level_impact: row.level_impact.parse::<LevelImpact>().map_err(StoreError::Corrupt)?,
            years_trajectory: row.years_trajectory,
            category: row.category,
            created_by: row.created_by,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn company_view_from_row(row: &PgRow) -> Result<CompanyView, StoreError> {
    let company = Company::try_from(CompanyRow::from_row(row)?)?;
    let owner_name: Option<String> = row.try_get("owner_name")?;
    let owner_email: Option<String> = row.try_get("owner_email")?;
    let owner = match (owner_name, owner_email) {
        (Some(name), Some(email)) => Some(OwnerRef { id: company.created_by, name, email }),
        _ => None,
    };
    Ok(CompanyView::new(company, owner))
}

/// Map unique-index violations onto the wire field they protect.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some("users_email_lower_key") => "email",
                Some("users_username_lower_key") => "username",
                Some("companies_name_lower_key") => "name",
                _ => "id",
            };
            return StoreError::Duplicate { field };
        }
    }
    StoreError::Sqlx(err)
}

fn bind_params<'q>(
    mut q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    params: &'q [SqlParam],
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    for p in params {
        q = match p {
            SqlParam::Int(i) => q.bind(*i),
            SqlParam::Text(s) => q.bind(s.as_str()),
        };
    }
    q
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn active_admin_count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'ADMIN' AND status = TRUE")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_login(&self, email: Option<&str>, username: Option<&str>) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM users WHERE status = TRUE AND (LOWER(email) = LOWER($1) OR LOWER(username) = LOWER($2)) LIMIT 1",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(username) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = user.into_user(Utc::now());
        sqlx::query(
            "INSERT INTO users (id, name, surname, username, email, password, phone, role, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.surname)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.status)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let phone_given = patch.phone.is_some();
        let sql = format!(
            "UPDATE users SET
                name = COALESCE($2, name),
                surname = COALESCE($3, surname),
                username = COALESCE($4, username),
                email = COALESCE(LOWER($5), email),
                password = COALESCE($6, password),
                phone = CASE WHEN $9 THEN $7 ELSE phone END,
                role = COALESCE($8, role),
                updated_at = now()
             WHERE id = $1 AND status = TRUE
             RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(patch.name)
            .bind(patch.surname)
            .bind(patch.username)
            .bind(patch.email)
            .bind(patch.password)
            .bind(patch.phone.flatten())
            .bind(patch.role.map(|r| r.as_str()))
            .bind(phone_given)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        row.map(User::try_from).transpose()
    }

    async fn deactivate_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "UPDATE users SET status = FALSE, updated_at = now() WHERE id = $1 AND status = TRUE RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn list_users(&self, page: Page) -> Result<Paged<User>, StoreError> {
        let where_sql = FilterWhere::active_only("");

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {}", where_sql.query))
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM users WHERE {} {} LIMIT $1 OFFSET $2",
            USER_COLUMNS,
            where_sql.query,
            FilterOrder::generate(None, "")
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        let items = rows.into_iter().map(User::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Paged { total, items })
    }

    async fn company_name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM companies WHERE LOWER(name) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Company::try_from).transpose()
    }

    async fn find_company_view(&self, id: Uuid) -> Result<Option<CompanyView>, StoreError> {
        let sql = format!("{} WHERE c.id = $1 AND c.status = TRUE", COMPANY_VIEW_SELECT);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(company_view_from_row).transpose()
    }

    async fn insert_company(&self, company: NewCompany) -> Result<Company, StoreError> {
        let company = company.into_company(Utc::now());
        sqlx::query(
            "INSERT INTO companies (id, name, description, level_impact, years_trajectory, category, created_by, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(company.id)
        .bind(&company.name)
        .bind(&company.description)
        .bind(company.level_impact.as_str())
        .bind(company.years_trajectory)
        .bind(&company.category)
        .bind(company.created_by)
        .bind(company.status)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(company)
    }

    async fn update_company(&self, id: Uuid, patch: CompanyPatch) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            "UPDATE companies SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                level_impact = COALESCE($4, level_impact),
                years_trajectory = COALESCE($5, years_trajectory),
                category = COALESCE($6, category),
                updated_at = now()
             WHERE id = $1 AND status = TRUE
             RETURNING *",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.level_impact.map(|l| l.as_str()))
        .bind(patch.years_trajectory)
        .bind(patch.category)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;
        row.map(Company::try_from).transpose()
    }

    async fn deactivate_company(&self, id: Uuid) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            "UPDATE companies SET status = FALSE, updated_at = now() WHERE id = $1 AND status = TRUE RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Company::try_from).transpose()
    }

    async fn list_companies(&self, filter: &CompanyFilter, page: Page) -> Result<Paged<CompanyView>, StoreError> {
        let where_sql = FilterWhere::company(filter, "c");

        let count_sql = format!("SELECT COUNT(*) AS count FROM companies c WHERE {}", where_sql.query);
        let count_row = bind_params(sqlx::query(&count_sql), &where_sql.params)
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = count_row.try_get("count")?;

        let next = where_sql.params.len();
        let page_sql = format!(
            "{} WHERE {} {} LIMIT ${} OFFSET ${}",
            COMPANY_VIEW_SELECT,
            where_sql.query,
            FilterOrder::generate(filter.order, "c"),
            next + 1,
            next + 2
        );
        let rows = bind_params(sqlx::query(&page_sql), &where_sql.params)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        let items = rows.iter().map(company_view_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(Paged { total, items })
    }

    async fn active_companies(&self) -> Result<Vec<CompanyView>, StoreError> {
        let sql = format!(
            "{} WHERE {} {}",
            COMPANY_VIEW_SELECT,
            FilterWhere::active_only("c").query,
            FilterOrder::generate(Some(SortDirection::Asc), "c")
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(company_view_from_row).collect()
    }
}
