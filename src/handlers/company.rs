// handlers/company.rs - /company, /company/:id and the spreadsheet export

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::{int, parse_id, text, JsonBody};
use crate::database::models::company::current_year;
use crate::database::models::{Company, CompanyPatch, CompanyView, LevelImpact, NewCompany, Trajectory};
use crate::error::ApiError;
use crate::filter::{filter::QueryParams, CompanyFilter, Page};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::report::{companies_workbook, REPORT_FILENAME, XLSX_CONTENT_TYPE};
use crate::state::AppState;
use crate::validation::{chains, with_values, ValidationContext};

#[derive(Debug, Serialize)]
pub struct CompanyList {
    pub total: i64,
    pub companies: Vec<CompanyView>,
}

#[derive(Debug, Serialize)]
pub struct CompanyRemoved {
    pub message: &'static str,
    pub company: Company,
}

fn to_i32(field: &str, value: i64) -> Result<i32, ApiError> {
    i32::try_from(value).map_err(|_| ApiError::field(field, "is out of range"))
}

/// Trajectory from whichever of the two accepted fields was supplied.
fn trajectory(body: &Value) -> Result<Option<Trajectory>, ApiError> {
    if let Some(years) = int(body, "yearsTrajectory") {
        return Ok(Some(Trajectory::Years(to_i32("yearsTrajectory", years)?)));
    }
    if let Some(year) = int(body, "foundingYear") {
        return Ok(Some(Trajectory::FoundedIn(to_i32("foundingYear", year)?)));
    }
    Ok(None)
}

fn level_impact(body: &Value) -> Result<Option<LevelImpact>, ApiError> {
    text(body, "levelImpact")
        .map(|raw| raw.parse::<LevelImpact>().map_err(|e| ApiError::field("levelImpact", e)))
        .transpose()
}

fn not_found(id: impl std::fmt::Display) -> ApiError {
    ApiError::not_found(format!("Company {} not found", id))
}

/// POST /company - create a company owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(body): JsonBody,
) -> ApiResult<Company> {
    let ctx = ValidationContext::new(state.store.clone());
    chains::create_company().run(&body, &ctx).await?;

    let years_trajectory = trajectory(&body)?
        .ok_or_else(|| ApiError::field("yearsTrajectory", "yearsTrajectory or foundingYear is required"))?
        .resolve(current_year());
    let level_impact = level_impact(&body)?.ok_or_else(|| ApiError::field("levelImpact", "levelImpact is required"))?;

    let company = state
        .store
        .insert_company(NewCompany {
            name: text(&body, "name").unwrap_or_default(),
            description: text(&body, "description").unwrap_or_default(),
            level_impact,
            years_trajectory,
            category: text(&body, "category").unwrap_or_default(),
            created_by: auth.id,
        })
        .await?;

    tracing::info!("User {} created company '{}' ({})", auth.id, company.name, company.id);
    Ok(ApiResponse::created(company))
}

/// GET /company?limite&desde&order&minYears&maxYears&category
pub async fn list(State(state): State<AppState>, Query(params): Query<QueryParams>) -> ApiResult<CompanyList> {
    let pagination = &state.config.pagination;
    let page = Page::from_params(&params, pagination.companies_default_limit, pagination.max_limit)?;
    let filter = CompanyFilter::from_params(&params)?;

    let result = state.store.list_companies(&filter, page).await?;
    Ok(ApiResponse::success(CompanyList {
        total: result.total,
        companies: result.items,
    }))
}

/// GET /company/:id - active company with its owner resolved
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<CompanyView> {
    let ctx = ValidationContext::new(state.store.clone());
    chains::company_by_id().run(&json!({ "id": id }), &ctx).await?;
    let id = parse_id(&id)?;

    let company = state.store.find_company_view(id).await?.ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::success(company))
}

/// PUT /company/:id - partial update
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Company> {
    let parsed = parse_id(&id).ok();
    let input = with_values(body, &[("id", Value::String(id.clone()))]);

    let ctx = ValidationContext::new(state.store.clone());
    chains::update_company(parsed).run(&input, &ctx).await?;
    let id = parse_id(&id)?;
    if !state.store.find_company(id).await?.is_some_and(|c| c.status) {
        return Err(not_found(id));
    }

    let patch = CompanyPatch {
        name: text(&input, "name"),
        description: text(&input, "description"),
        level_impact: level_impact(&input)?,
        years_trajectory: trajectory(&input)?.map(|t| t.resolve(current_year())),
        category: text(&input, "category"),
    };
    if patch.is_empty() {
        return Err(ApiError::bad_request("No updatable fields supplied"));
    }

    let company = state.store.update_company(id, patch).await?.ok_or_else(|| not_found(id))?;
    tracing::info!("Updated company {}", company.id);
    Ok(ApiResponse::success(company))
}

/// DELETE /company/:id - logical delete
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<CompanyRemoved> {
    let ctx = ValidationContext::new(state.store.clone());
    chains::company_by_id().run(&json!({ "id": id }), &ctx).await?;
    let id = parse_id(&id)?;

    let company = state.store.deactivate_company(id).await?.ok_or_else(|| not_found(id))?;
    tracing::info!("Deactivated company {}", company.id);
    Ok(ApiResponse::success(CompanyRemoved {
        message: "Company deactivated",
        company,
    }))
}

/// GET /company/report/excel - every active company as an .xlsx download
pub async fn report(State(state): State<AppState>) -> Result<Response, ApiError> {
    let companies = state.store.active_companies().await?;
    if companies.is_empty() {
        return Err(ApiError::not_found("There are no active companies to report"));
    }

    let bytes = tokio::task::spawn_blocking(move || companies_workbook(&companies))
        .await
        .map_err(|e| ApiError::internal_with_detail("Report task failed", e))??;

    tracing::info!("Generated company report ({} bytes)", bytes.len());
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", REPORT_FILENAME),
            ),
        ],
        bytes,
    )
        .into_response())
}
