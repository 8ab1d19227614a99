use artefact_core::models::{DocumentRecord, DocumentStatus, DocumentUpsert, UpsertOutcome};
use artefact_core::AppError;
use sqlx::{PgPool, Postgres};

const DOCUMENT_COLUMNS: &str = "id, org_id, doc_type, document_link, status, file_category, name, \
     content_type, file_size, summary, is_summarized, created_at, updated_at";

/// Storage of `organization_documents` rows, unique on `(org_id, name)`.
#[async_trait::async_trait]
pub trait DocumentRepositoryTrait: Send + Sync {
    /// Insert or refresh the row for `(org_id, name)`.
    ///
    /// An existing row gets the new link and category, goes back to `processing` and loses its
    /// summary. Content type and size are only written on insert.
    async fn upsert(&self, doc: &DocumentUpsert) -> Result<UpsertOutcome, AppError>;

    /// Move the given rows from `processing` to `failed`. Returns the number of rows changed.
    async fn mark_failed(&self, org_id: i64, ids: &[i64]) -> Result<u64, AppError>;

    async fn find_by_name(&self, org_id: i64, name: &str)
        -> Result<Option<DocumentRecord>, AppError>;

    async fn list_for_org(&self, org_id: i64) -> Result<Vec<DocumentRecord>, AppError>;
}

#[derive(Clone)]
pub struct PostgresDocumentRepository {
    pool: PgPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DocumentRepositoryTrait for PostgresDocumentRepository {
    #[tracing::instrument(
        skip(self, doc),
        fields(db.table = "organization_documents", db.operation = "upsert", org_id = doc.org_id, file = %doc.name)
    )]
    async fn upsert(&self, doc: &DocumentUpsert) -> Result<UpsertOutcome, AppError> {
        // xmax is 0 only for a freshly inserted tuple
        let outcome = sqlx::query_as::<Postgres, UpsertOutcome>(
            r#"
            INSERT INTO organization_documents
                (org_id, doc_type, document_link, status, file_category, name,
                 content_type, file_size, summary, is_summarized)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL, FALSE)
            ON CONFLICT (org_id, name) DO UPDATE SET
                document_link = EXCLUDED.document_link,
                file_category = EXCLUDED.file_category,
                status = EXCLUDED.status,
                summary = NULL,
                is_summarized = FALSE,
                updated_at = NOW()
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(doc.org_id)
        .bind(doc.source.as_str())
        .bind(&doc.document_link)
        .bind(DocumentStatus::Processing.as_str())
        .bind(&doc.category)
        .bind(&doc.name)
        .bind(&doc.content_type)
        .bind(doc.file_size)
        .fetch_one(&self.pool)
        .await?;

        Ok(outcome)
    }

    #[tracing::instrument(skip(self, ids), fields(db.table = "organization_documents", db.operation = "update", count = ids.len()))]
    async fn mark_failed(&self, org_id: i64, ids: &[i64]) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE organization_documents SET status = $1, updated_at = NOW() \
             WHERE org_id = $2 AND id = ANY($3) AND status = $4",
        )
        .bind(DocumentStatus::Failed.as_str())
        .bind(org_id)
        .bind(ids)
        .bind(DocumentStatus::Processing.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self), fields(db.table = "organization_documents", db.operation = "select"))]
    async fn find_by_name(
        &self,
        org_id: i64,
        name: &str,
    ) -> Result<Option<DocumentRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, DocumentRecord>(&format!(
            "SELECT {} FROM organization_documents WHERE org_id = $1 AND name = $2",
            DOCUMENT_COLUMNS
        ))
        .bind(org_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organization_documents", db.operation = "select"))]
    async fn list_for_org(&self, org_id: i64) -> Result<Vec<DocumentRecord>, AppError> {
        let records = sqlx::query_as::<Postgres, DocumentRecord>(&format!(
            "SELECT {} FROM organization_documents WHERE org_id = $1 ORDER BY name ASC",
            DOCUMENT_COLUMNS
        ))
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
