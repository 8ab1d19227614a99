use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_category_name;

/// Organization-scoped document category.
///
/// Documents reference a category by `name`, so the name is unique per organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub org_id: i64,
    pub added_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category annotated with its creator and the number of documents tagged with it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CategoryWithUsage {
    pub id: i64,
    pub name: String,
    pub org_id: i64,
    pub added_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub added_by_name: Option<String>,
    pub document_count: i64,
}

/// Request DTO for creating a category
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_category_name"))]
    pub name: String,
    /// Accepted for compatibility; the organization always comes from the token.
    #[serde(default)]
    pub org_id: Option<serde_json::Value>,
}

/// Request DTO for renaming a category
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_category_name"))]
    pub name: String,
}
