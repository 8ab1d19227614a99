//! OpenAPI documentation, served at `/api/openapi.json` and rendered by RapiDoc at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use artefact_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Registers the `bearer` scheme referenced by protected paths
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Artefact API",
        version = "0.1.0",
        description = "Organization document categories and Google Drive ingestion. Imported files are copied to object storage and queued for processing. All endpoints live under /api/artefacts/."
    ),
    paths(
        // Categories
        handlers::categories::list_categories,
        handlers::categories::list_categories_with_usage,
        handlers::categories::create_category,
        handlers::categories::rename_category,
        handlers::categories::delete_category,
        // Google Drive
        handlers::google_drive::fetch_folder,
        handlers::google_drive::ingest_files,
    ),
    components(
        schemas(
            models::Category,
            models::CategoryWithUsage,
            models::CreateCategoryRequest,
            models::UpdateCategoryRequest,
            models::ExternalFileDescriptor,
            models::UploadSummary,
            models::FileFailure,
            handlers::categories::CategoryListResponse,
            handlers::categories::CategoryUsageListResponse,
            handlers::categories::CategoryResponse,
            handlers::google_drive::FetchFolderRequest,
            handlers::google_drive::FolderListingResponse,
            handlers::google_drive::IngestFilesRequest,
            handlers::google_drive::IngestFilesResponse,
            // Error
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "categories", description = "Organization document categories"),
        (name = "google-drive", description = "Drive folder listing and document ingestion")
    )
)]
pub struct ApiDoc;
