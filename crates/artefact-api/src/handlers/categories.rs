//! Category registry handlers
//!
//! Categories are scoped to the organization in the caller's token. Path ids from another
//! organization behave exactly like ids that do not exist.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::TenantContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use artefact_core::models::{
    Category, CategoryWithUsage, CreateCategoryRequest, UpdateCategoryRequest,
};
use artefact_core::AppError;
use artefact_db::{CategoryDeletion, DUPLICATE_CATEGORY_MESSAGE};

const CATEGORY_NOT_FOUND: &str = "Category not found or access denied";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListResponse {
    pub status_code: u16,
    pub status: String,
    pub message: String,
    pub data: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUsageListResponse {
    pub status_code: u16,
    pub status: String,
    pub message: String,
    pub data: Vec<CategoryWithUsage>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub status_code: u16,
    pub status: String,
    pub message: String,
    pub data: Category,
}

fn parse_id(raw: &str, message: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::BadRequest(message.to_string()))
}

/// List the categories of the caller's organization
#[utoipa::path(
    get,
    path = "/api/artefacts/category/{orgId}",
    params(
        ("orgId" = String, Path, description = "Organization ID; must match the token")
    ),
    responses(
        (status = 200, description = "Categories ordered by name", body = CategoryListResponse),
        (status = 400, description = "Missing organization ID"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Organization does not match the token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(org_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let token_org = ctx.require_org()?;

    let org_id = org_id.trim();
    if org_id.is_empty() {
        return Err(
            AppError::BadRequest("Please provide a valid organization ID".to_string()).into(),
        );
    }
    if org_id != token_org.to_string() {
        return Err(AppError::Forbidden(
            "Forbidden: Access denied to this organization".to_string(),
        )
        .into());
    }

    let categories = state.db.categories.list_for_org(token_org).await?;
    let message = if categories.is_empty() {
        "No categories found for this organization"
    } else {
        "Categories fetched successfully"
    };

    Ok(Json(CategoryListResponse {
        status_code: 200,
        status: "success".to_string(),
        message: message.to_string(),
        data: categories,
    }))
}

/// List the organization's categories with creator name and document count
#[utoipa::path(
    get,
    path = "/api/artefacts/category/all",
    responses(
        (status = 200, description = "Categories with usage, ordered by name", body = CategoryUsageListResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn list_categories_with_usage(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_user()?;
    let org_id = ctx.require_org()?;

    let categories = state.db.categories.list_with_usage(org_id).await?;
    let message = if categories.is_empty() {
        "No categories found in your organization"
    } else {
        "Categories fetched successfully"
    };

    Ok(Json(CategoryUsageListResponse {
        status_code: 200,
        status: "success".to_string(),
        message: message.to_string(),
        data: categories,
    }))
}

/// Create a category in the caller's organization. A body `org_id` is ignored.
#[utoipa::path(
    post,
    path = "/api/artefacts/category/add",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid category name"),
        (status = 401, description = "Missing or invalid token"),
        (status = 409, description = "Category name already used in the organization"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    ValidatedJson(request): ValidatedJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user_id = ctx.require_user()?;
    let org_id = ctx.require_org()?;
    request.validate()?;

    let name = request.name.trim();
    if state.db.categories.exists_by_name(org_id, name).await? {
        return Err(AppError::Conflict(DUPLICATE_CATEGORY_MESSAGE.to_string()).into());
    }

    let category = state
        .db
        .categories
        .create(org_id, name, Some(user_id))
        .await?;
    tracing::info!(org_id, category_id = category.id, "Category created");

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            status_code: 201,
            status: "success".to_string(),
            message: "Category created successfully".to_string(),
            data: category,
        }),
    ))
}

/// Rename a category. Documents filed under the old name follow the rename.
#[utoipa::path(
    put,
    path = "/api/artefacts/category/{id}",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category renamed", body = CategoryResponse),
        (status = 400, description = "Invalid category ID or name"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Category not found in the organization"),
        (status = 409, description = "Category name already used in the organization"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
#[tracing::instrument(skip(state, ctx, request))]
pub async fn rename_category(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org()?;
    let id = parse_id(&id, "Please provide a valid category ID")?;
    request.validate()?;

    let category = state
        .db
        .categories
        .rename(org_id, id, request.name.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(CATEGORY_NOT_FOUND.to_string()))?;
    tracing::info!(org_id, category_id = id, "Category renamed");

    Ok(Json(CategoryResponse {
        status_code: 200,
        status: "success".to_string(),
        message: "Category updated successfully".to_string(),
        data: category,
    }))
}

/// Delete an unused category
#[utoipa::path(
    delete,
    path = "/api/artefacts/category/{id}",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 400, description = "Invalid category ID"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Category not found in the organization"),
        (status = 409, description = "Category still referenced by documents"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
#[tracing::instrument(skip(state, ctx))]
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    ctx: TenantContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let org_id = ctx.require_org()?;
    let id = parse_id(&id, "Please provide a valid category ID")?;

    match state.db.categories.delete_unused(org_id, id).await? {
        CategoryDeletion::Deleted => {}
        CategoryDeletion::InUse => {
            return Err(AppError::Conflict(
                "Cannot delete category: it is being used by existing documents".to_string(),
            )
            .into());
        }
        CategoryDeletion::NotFound => {
            return Err(AppError::NotFound(CATEGORY_NOT_FOUND.to_string()).into());
        }
    }
    tracing::info!(org_id, category_id = id, "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}
