use artefact_core::models::{Category, CategoryWithUsage};
use artefact_core::AppError;
use sqlx::{PgPool, Postgres};

/// Message for a category name that is already taken in the organization
pub const DUPLICATE_CATEGORY_MESSAGE: &str =
    "Category with this name already exists in your organization";

const CATEGORY_COLUMNS: &str = "id, name, org_id, added_by, created_at, updated_at";

/// Result of [`CategoryRepositoryTrait::delete_unused`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryDeletion {
    Deleted,
    /// Documents in the organization are still filed under the category's name
    InUse,
    NotFound,
}

/// Organization-scoped category storage.
///
/// Documents reference categories by name, so renames cascade and deletes only remove
/// categories no document refers to.
#[async_trait::async_trait]
pub trait CategoryRepositoryTrait: Send + Sync {
    /// Categories of an organization, ordered by name
    async fn list_for_org(&self, org_id: i64) -> Result<Vec<Category>, AppError>;

    /// Categories with creator name and number of referencing documents, ordered by name
    async fn list_with_usage(&self, org_id: i64) -> Result<Vec<CategoryWithUsage>, AppError>;

    async fn find(&self, org_id: i64, id: i64) -> Result<Option<Category>, AppError>;

    async fn exists_by_name(&self, org_id: i64, name: &str) -> Result<bool, AppError>;

    /// Insert a category. A duplicate `(name, org_id)` fails with `AppError::Conflict`.
    async fn create(
        &self,
        org_id: i64,
        name: &str,
        added_by: Option<i64>,
    ) -> Result<Category, AppError>;

    /// Rename a category and every document reference to it, atomically.
    /// Returns `None` when the category does not exist in the organization.
    async fn rename(
        &self,
        org_id: i64,
        id: i64,
        new_name: &str,
    ) -> Result<Option<Category>, AppError>;

    /// Delete a category unless a document of the organization still uses its name.
    async fn delete_unused(&self, org_id: i64, id: i64) -> Result<CategoryDeletion, AppError>;
}

fn map_unique_violation(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict(DUPLICATE_CATEGORY_MESSAGE.to_string())
        }
        other => AppError::Database(other),
    }
}

#[derive(Clone)]
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CategoryRepositoryTrait for PostgresCategoryRepository {
    #[tracing::instrument(skip(self), fields(db.table = "document_category", db.operation = "select"))]
    async fn list_for_org(&self, org_id: i64) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<Postgres, Category>(&format!(
            "SELECT {} FROM document_category WHERE org_id = $1 ORDER BY name ASC",
            CATEGORY_COLUMNS
        ))
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    #[tracing::instrument(skip(self), fields(db.table = "document_category", db.operation = "select"))]
    async fn list_with_usage(&self, org_id: i64) -> Result<Vec<CategoryWithUsage>, AppError> {
        let categories = sqlx::query_as::<Postgres, CategoryWithUsage>(
            r#"
            SELECT
                dc.id,
                dc.name,
                dc.org_id,
                dc.added_by,
                dc.created_at,
                dc.updated_at,
                u.name AS added_by_name,
                COUNT(od.id) AS document_count
            FROM document_category dc
            LEFT JOIN users u ON dc.added_by = u.user_id
            LEFT JOIN organization_documents od
                ON dc.name = od.file_category AND dc.org_id = od.org_id
            WHERE dc.org_id = $1
            GROUP BY dc.id, dc.name, dc.org_id, dc.added_by, dc.created_at, dc.updated_at, u.name
            ORDER BY dc.name ASC
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    #[tracing::instrument(skip(self), fields(db.table = "document_category", db.operation = "select", db.record_id = %id))]
    async fn find(&self, org_id: i64, id: i64) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<Postgres, Category>(&format!(
            "SELECT {} FROM document_category WHERE id = $1 AND org_id = $2",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    #[tracing::instrument(skip(self), fields(db.table = "document_category", db.operation = "select"))]
    async fn exists_by_name(&self, org_id: i64, name: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM document_category WHERE name = $1 AND org_id = $2)",
        )
        .bind(name)
        .bind(org_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(db.table = "document_category", db.operation = "insert"))]
    async fn create(
        &self,
        org_id: i64,
        name: &str,
        added_by: Option<i64>,
    ) -> Result<Category, AppError> {
        sqlx::query_as::<Postgres, Category>(&format!(
            "INSERT INTO document_category (name, org_id, added_by) VALUES ($1, $2, $3) RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(name)
        .bind(org_id)
        .bind(added_by)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)
    }

    #[tracing::instrument(skip(self), fields(db.table = "document_category", db.operation = "update", db.record_id = %id))]
    async fn rename(
        &self,
        org_id: i64,
        id: i64,
        new_name: &str,
    ) -> Result<Option<Category>, AppError> {
        let mut tx = self.pool.begin().await?;

        let old_name = sqlx::query_scalar::<Postgres, String>(
            "SELECT name FROM document_category WHERE id = $1 AND org_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(old_name) = old_name else {
            return Ok(None);
        };

        let category = sqlx::query_as::<Postgres, Category>(&format!(
            "UPDATE document_category SET name = $1, updated_at = NOW() \
             WHERE id = $2 AND org_id = $3 RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(new_name)
        .bind(id)
        .bind(org_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        if old_name != new_name {
            let moved = sqlx::query(
                "UPDATE organization_documents SET file_category = $1, updated_at = NOW() \
                 WHERE org_id = $2 AND file_category = $3",
            )
            .bind(new_name)
            .bind(org_id)
            .bind(&old_name)
            .execute(&mut *tx)
            .await?;

            tracing::debug!(
                org_id,
                documents = moved.rows_affected(),
                "Category rename cascaded to documents"
            );
        }

        tx.commit().await?;
        Ok(Some(category))
    }

    #[tracing::instrument(skip(self), fields(db.table = "document_category", db.operation = "delete", db.record_id = %id))]
    async fn delete_unused(&self, org_id: i64, id: i64) -> Result<CategoryDeletion, AppError> {
        let mut tx = self.pool.begin().await?;

        // Usage guard and delete in one statement.
        let deleted = sqlx::query(
            "DELETE FROM document_category c WHERE c.id = $1 AND c.org_id = $2 \
             AND NOT EXISTS (SELECT 1 FROM organization_documents d \
             WHERE d.org_id = c.org_id AND d.file_category = c.name)",
        )
        .bind(id)
        .bind(org_id)
        .execute(&mut *tx)
        .await?;

        let outcome = if deleted.rows_affected() > 0 {
            CategoryDeletion::Deleted
        } else {
            let exists = sqlx::query_scalar::<Postgres, bool>(
                "SELECT EXISTS(SELECT 1 FROM document_category WHERE id = $1 AND org_id = $2)",
            )
            .bind(id)
            .bind(org_id)
            .fetch_one(&mut *tx)
            .await?;
            if exists {
                CategoryDeletion::InUse
            } else {
                CategoryDeletion::NotFound
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }
}
