use artefact_core::models::Organization;
use artefact_core::AppError;
use sqlx::{PgPool, Postgres};

/// Read-only lookup of the organization a user belongs to
#[async_trait::async_trait]
pub trait OrganizationRepositoryTrait: Send + Sync {
    async fn find_for_user(&self, user_id: i64) -> Result<Option<Organization>, AppError>;
}

#[derive(Clone)]
pub struct PostgresOrganizationRepository {
    pool: PgPool,
}

impl PostgresOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrganizationRepositoryTrait for PostgresOrganizationRepository {
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn find_for_user(&self, user_id: i64) -> Result<Option<Organization>, AppError> {
        let organization = sqlx::query_as::<Postgres, Organization>(
            r#"
            SELECT o.org_id, o.org_name
            FROM users u
            INNER JOIN organizations o ON u.org_id = o.org_id
            WHERE u.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organization)
    }
}
