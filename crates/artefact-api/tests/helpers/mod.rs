//! Test helpers: build AppState and router for integration tests.
//!
//! Repositories are the in-memory doubles from `artefact-db`, storage is a temp directory and the
//! drive API is a mockito server, so these tests need neither Docker nor network access.
//! Run from workspace root: `cargo test -p artefact-api`.

#![allow(dead_code)]

pub mod auth;
pub mod drive;

use artefact_api::constants;
use artefact_api::services::{DocumentProcessor, ProcessingRequest};
use artefact_api::setup::routes;
use artefact_api::setup::services::build_state;
use artefact_api::state::DbState;
use artefact_core::{AppConfig, AppError, BatchPolicy, Config};
use artefact_db::CategoryRepositoryTrait;
use artefact_db::test_helpers::{
    MockCategoryRepository, MockDocumentRepository, MockOrganizationRepository,
};
use artefact_drive::{DriveClient, DriveConfig, ServiceAccountCredentials};
use artefact_storage::LocalStorage;
use async_trait::async_trait;
use axum_test::TestServer;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

pub const STORAGE_BASE_URL: &str = "http://files.test";

/// API path prefix for tests (`/api/artefacts`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub type ProcessedBatch = (ProcessingRequest, Option<String>);

/// Captures processing hand-offs instead of calling a real processor
struct RecordingProcessor(mpsc::UnboundedSender<ProcessedBatch>);

#[async_trait]
impl DocumentProcessor for RecordingProcessor {
    async fn process(
        &self,
        request: &ProcessingRequest,
        request_id: Option<&str>,
    ) -> Result<(), AppError> {
        let _ = self
            .0
            .send((request.clone(), request_id.map(str::to_string)));
        Ok(())
    }
}

/// Test application: server, in-memory repositories and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub drive: mockito::ServerGuard,
    pub categories: MockCategoryRepository,
    pub documents: MockDocumentRepository,
    pub organizations: MockOrganizationRepository,
    pub processed: mpsc::UnboundedReceiver<ProcessedBatch>,
    pub storage_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Category names of an organization, ordered by name
    pub async fn category_names(&self, org_id: i64) -> Vec<String> {
        self.categories
            .list_for_org(org_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect()
    }
}

pub struct TestOptions {
    pub policy: BatchPolicy,
    pub service_account: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            policy: BatchPolicy::AllOrNothing,
            service_account: true,
        }
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

/// Setup test app with in-memory repositories and local storage.
///
/// User [`auth::USER_ID`] belongs to org [`auth::ORG_ID`] ("Acme Legal"); user
/// [`auth::OTHER_USER_ID`] belongs to [`auth::OTHER_ORG_ID`] ("Globex").
pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let mut drive_server = mockito::Server::new_async().await;
    drive::mock_token_endpoint(&mut drive_server).await;

    let storage_dir = tempfile::tempdir().unwrap();
    let storage_path = storage_dir.path().to_string_lossy().to_string();
    let credentials = drive::encoded_credentials(&drive_server);
    let policy = match options.policy {
        BatchPolicy::AllOrNothing => "all_or_nothing",
        BatchPolicy::Isolated => "isolated",
    };

    let mut env: HashMap<&str, String> = HashMap::new();
    env.insert("JWT_SECRET", auth::TEST_JWT_SECRET.to_string());
    env.insert("DATABASE_URL", "postgresql://localhost/artefacts_test".to_string());
    env.insert("STORAGE_BACKEND", "local".to_string());
    env.insert("LOCAL_STORAGE_PATH", storage_path.clone());
    env.insert("LOCAL_STORAGE_BASE_URL", STORAGE_BASE_URL.to_string());
    env.insert("S3_KEY_PREFIX", "artefacts".to_string());
    env.insert("DRIVE_API_BASE_URL", drive_server.url());
    env.insert("DRIVE_EXPORT_BASE_URL", drive_server.url());
    env.insert("DRIVE_DOWNLOAD_RETRIES", "0".to_string());
    env.insert("INGEST_BATCH_POLICY", policy.to_string());
    if options.service_account {
        env.insert("GOOGLE_APPLICATION_CREDENTIALS_BASE64", credentials);
    }
    let config = Config(Box::new(
        AppConfig::from_lookup(|key| env.get(key).cloned()).unwrap(),
    ));

    let documents = MockDocumentRepository::new();
    let categories = MockCategoryRepository::new(documents.clone());
    let organizations = MockOrganizationRepository::new();
    organizations.add_member(auth::USER_ID, auth::ORG_ID, "Acme Legal");
    organizations.add_member(auth::OTHER_USER_ID, auth::OTHER_ORG_ID, "Globex");

    let db = DbState {
        pool: None,
        categories: Arc::new(categories.clone()),
        documents: Arc::new(documents.clone()),
        organizations: Arc::new(organizations.clone()),
    };

    let storage = Arc::new(
        LocalStorage::new(storage_path, STORAGE_BASE_URL.to_string())
            .await
            .unwrap(),
    );

    let mut drive_client = DriveClient::new(reqwest::Client::new(), DriveConfig::from_config(&config));
    if let Some(encoded) = config.google_credentials_base64() {
        let credentials = ServiceAccountCredentials::from_base64(encoded).unwrap();
        drive_client = drive_client.with_service_account(credentials).unwrap();
    }

    let (tx, processed) = mpsc::unbounded_channel();
    let state = build_state(
        &config,
        db,
        storage,
        drive_client,
        Arc::new(RecordingProcessor(tx)),
    );
    let app = routes::setup_routes(&config, state).unwrap();

    TestApp {
        server: TestServer::new(app).unwrap(),
        drive: drive_server,
        categories,
        documents,
        organizations,
        processed,
        storage_dir,
    }
}
