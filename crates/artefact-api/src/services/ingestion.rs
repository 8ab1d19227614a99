//! Drive-to-object-store ingestion
//!
//! A batch of selected drive files is downloaded, written to storage under the organization's
//! key prefix and recorded in `organization_documents` with status `processing`. Transfers run
//! through a bounded pool in input order. The downstream processor is notified once per batch.
//!
//! Under [`BatchPolicy::AllOrNothing`] the first failure aborts the batch. Cancellation and the
//! batch deadline behave the same way: every row this batch already moved to `processing` is
//! marked `failed` before the error is returned.

use std::sync::Arc;
use std::time::{Duration, Instant};

use artefact_core::models::{
    classify, parse_size_kb, DocumentUpsert, ExternalFileDescriptor, FileFailure, Organization,
    ProcessingDocument, SourceType, TenantIdentity, UploadSummary,
};
use artefact_core::{AppError, BatchPolicy, Config, ErrorMetadata};
use artefact_db::{DocumentRepositoryTrait, OrganizationRepositoryTrait};
use artefact_drive::{is_valid_file_id, DriveClient};
use artefact_storage::{document_key, document_prefix, Storage, StorageError};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::services::keyed_lock::KeyedLocks;
use crate::services::processing::{dispatch, DocumentProcessor, ProcessingRequest};

pub const CANCELLED_MESSAGE: &str = "Ingestion cancelled";

#[derive(Debug, Clone)]
pub struct IngestionSettings {
    pub concurrency: usize,
    pub timeout: Duration,
    pub policy: BatchPolicy,
    /// Namespace prefix of object keys
    pub key_prefix: String,
}

impl IngestionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.ingest_concurrency().max(1),
            timeout: Duration::from_secs(config.ingest_timeout_secs()),
            policy: config.ingest_batch_policy(),
            key_prefix: config.s3_key_prefix().to_string(),
        }
    }
}

/// One ingestion request, as received from an authenticated caller
#[derive(Debug, Clone)]
pub struct IngestionJob {
    pub identity: TenantIdentity,
    /// Forwarded to the document processor
    pub bearer_token: String,
    pub files: Vec<ExternalFileDescriptor>,
    pub category: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IngestionResult {
    pub files: Vec<UploadSummary>,
    /// Only populated under [`BatchPolicy::Isolated`]
    pub failures: Vec<FileFailure>,
}

struct Transferred {
    document: ProcessingDocument,
    summary: UploadSummary,
}

pub struct IngestionService {
    drive: DriveClient,
    storage: Arc<dyn Storage>,
    documents: Arc<dyn DocumentRepositoryTrait>,
    organizations: Arc<dyn OrganizationRepositoryTrait>,
    processor: Arc<dyn DocumentProcessor>,
    locks: KeyedLocks<(i64, String)>,
    settings: IngestionSettings,
}

impl IngestionService {
    pub fn new(
        drive: DriveClient,
        storage: Arc<dyn Storage>,
        documents: Arc<dyn DocumentRepositoryTrait>,
        organizations: Arc<dyn OrganizationRepositoryTrait>,
        processor: Arc<dyn DocumentProcessor>,
        settings: IngestionSettings,
    ) -> Self {
        Self {
            drive,
            storage,
            documents,
            organizations,
            processor,
            locks: KeyedLocks::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &IngestionSettings {
        &self.settings
    }

    /// Run one batch. `cancel` aborts in-flight transfers; the batch deadline does the same.
    #[tracing::instrument(
        skip(self, job, cancel),
        fields(user_id = ?job.identity.user_id, files = job.files.len(), category = %job.category)
    )]
    pub async fn ingest(
        &self,
        job: IngestionJob,
        cancel: CancellationToken,
    ) -> Result<IngestionResult, AppError> {
        let user_id = job.identity.require_user()?;

        if job.files.is_empty() {
            return Err(AppError::BadRequest(
                "No files selected for upload".to_string(),
            ));
        }
        let category = job.category.trim();
        if category.is_empty() {
            return Err(AppError::BadRequest("Category is required".to_string()));
        }

        let org = self
            .organizations
            .find_for_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User or organization not found".to_string()))?;

        if self.settings.policy == BatchPolicy::AllOrNothing {
            for file in &job.files {
                source_link(file)?;
            }
        }

        let started = Instant::now();
        let written = Mutex::new(Vec::<i64>::new());
        let policy = self.settings.policy;

        let run = async {
            let pending: Vec<_> = job
                .files
                .iter()
                .map(|file| self.transfer_one(&org, category, file, &written).boxed())
                .collect();
            let mut transfers =
                stream::iter(pending).buffered(self.settings.concurrency.max(1));

            let mut outcomes = Vec::with_capacity(job.files.len());
            while let Some(outcome) = transfers.next().await {
                match outcome {
                    Err(e) if policy == BatchPolicy::AllOrNothing => return Err(e),
                    other => outcomes.push(other),
                }
            }
            Ok(outcomes)
        };

        let outcome = tokio::select! {
            result = run => result,
            _ = cancel.cancelled() => {
                tracing::warn!(org_id = org.org_id, "Ingestion cancelled by caller");
                Err(AppError::Upstream(CANCELLED_MESSAGE.to_string()))
            }
            _ = tokio::time::sleep(self.settings.timeout) => {
                tracing::warn!(
                    org_id = org.org_id,
                    timeout_secs = self.settings.timeout.as_secs(),
                    "Ingestion deadline exceeded"
                );
                Err(AppError::Upstream(CANCELLED_MESSAGE.to_string()))
            }
        };

        let outcomes = match outcome {
            Ok(outcomes) => outcomes,
            Err(e) => {
                self.fail_batch(org.org_id, &written).await;
                return Err(e);
            }
        };

        let mut documents = Vec::new();
        let mut files = Vec::new();
        let mut failures = Vec::new();
        let mut first_error = None;

        for (file, outcome) in job.files.iter().zip(outcomes) {
            match outcome {
                Ok(Transferred { document, summary }) => {
                    documents.push(document);
                    files.push(summary);
                }
                Err(e) => {
                    tracing::warn!(error = %e, file = %file.name, "File ingestion failed");
                    failures.push(FileFailure {
                        name: file.name.clone(),
                        message: e.client_message(),
                    });
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if documents.is_empty() {
            return Err(first_error
                .unwrap_or_else(|| AppError::BadRequest("No files selected for upload".to_string())));
        }

        tracing::info!(
            org_id = org.org_id,
            ingested = documents.len(),
            failed = failures.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Ingestion batch completed"
        );

        dispatch(
            self.processor.clone(),
            ProcessingRequest {
                bucket_name: self.storage.bucket().unwrap_or_default().to_string(),
                folder_name: self.settings.key_prefix.clone(),
                org_name: org.org_name.clone(),
                org_id: org.org_id,
                user_id,
                documents,
                token: job.bearer_token,
            },
            job.request_id,
        );

        Ok(IngestionResult { files, failures })
    }

    async fn transfer_one(
        &self,
        org: &Organization,
        category: &str,
        file: &ExternalFileDescriptor,
        written: &Mutex<Vec<i64>>,
    ) -> Result<Transferred, AppError> {
        source_link(file)?;
        let started = Instant::now();

        let bytes = self.drive.download(file).await?;
        let size_bytes = bytes.len();

        let key = document_key(&self.settings.key_prefix, &org.org_name, &file.name)
            .map_err(|_| invalid_file(&file.name))?;

        let public_url = self
            .storage
            .upload_with_key(&key, bytes.to_vec(), &file.mime_type)
            .await
            .map_err(|e| self.upload_error(e, org, file))?;

        let outcome = {
            let _guard = self.locks.lock((org.org_id, file.name.clone())).await;
            self.documents
                .upsert(&DocumentUpsert {
                    org_id: org.org_id,
                    name: file.name.clone(),
                    source: SourceType::Gdrive,
                    document_link: public_url.clone(),
                    category: category.to_string(),
                    content_type: file.mime_type.clone(),
                    file_size: parse_size_kb(&file.size),
                })
                .await?
        };
        written.lock().await.push(outcome.id);

        tracing::info!(
            org_id = org.org_id,
            file = %file.name,
            key = %key,
            size_bytes,
            inserted = outcome.inserted,
            duration_ms = started.elapsed().as_millis() as u64,
            "Document stored"
        );

        let kind = file
            .kind
            .clone()
            .filter(|kind| !kind.is_empty())
            .unwrap_or_else(|| classify(&file.name, &file.mime_type).label().to_string());

        Ok(Transferred {
            document: ProcessingDocument {
                id: outcome.id,
                name: file.name.clone(),
                kind: "document".to_string(),
                link: public_url.clone(),
            },
            summary: UploadSummary {
                name: file.name.clone(),
                public_url,
                content_type: file.mime_type.clone(),
                size: file.size.clone(),
                kind,
            },
        })
    }

    fn upload_error(
        &self,
        err: StorageError,
        org: &Organization,
        file: &ExternalFileDescriptor,
    ) -> AppError {
        tracing::error!(error = %err, org_id = org.org_id, file = %file.name, "Storage upload failed");
        match err {
            StorageError::BucketNotFound(_) => AppError::Storage(format!(
                "S3 bucket '{}' does not exist",
                self.storage.bucket().unwrap_or_default()
            )),
            StorageError::AccessDenied(_) => AppError::Storage(format!(
                "Access denied to S3 bucket or path '{}'",
                document_prefix(&self.settings.key_prefix, &org.org_name)
            )),
            other => AppError::Storage(format!(
                "Failed to upload file '{}' to S3: {}",
                file.name, other
            )),
        }
    }

    /// Move every row this batch wrote back out of `processing`.
    async fn fail_batch(&self, org_id: i64, written: &Mutex<Vec<i64>>) {
        let ids = written.lock().await.clone();
        if ids.is_empty() {
            return;
        }
        match self.documents.mark_failed(org_id, &ids).await {
            Ok(count) => tracing::warn!(org_id, count, "Marked aborted batch documents as failed"),
            Err(e) => tracing::error!(
                error = %e,
                org_id,
                ids = ?ids,
                "Failed to mark aborted batch documents as failed"
            ),
        }
    }
}

fn invalid_file(name: &str) -> AppError {
    AppError::BadRequest(format!("Invalid file data: {}", name))
}

/// A descriptor needs a well-formed provider id and a view link.
fn source_link(file: &ExternalFileDescriptor) -> Result<&str, AppError> {
    match file.source_link() {
        Some(link) if is_valid_file_id(&file.id) => Ok(link),
        _ => Err(invalid_file(&file.name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artefact_core::models::DocumentStatus;
    use artefact_core::StorageBackend;
    use artefact_db::test_helpers::{MockDocumentRepository, MockOrganizationRepository};
    use artefact_drive::DriveConfig;
    use artefact_storage::{LocalStorage, StorageResult};
    use async_trait::async_trait;
    use mockito::Matcher;
    use tokio::sync::mpsc;

    const ORG_ID: i64 = 42;
    const USER_ID: i64 = 7;

    struct RecordingProcessor(mpsc::UnboundedSender<(ProcessingRequest, Option<String>)>);

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

    /// Delegates to local storage but never finishes uploads of `stall_on`
    struct StallingStorage {
        inner: LocalStorage,
        stall_on: &'static str,
    }

    #[async_trait]
    impl Storage for StallingStorage {
        async fn upload_with_key(
            &self,
            storage_key: &str,
            data: Vec<u8>,
            content_type: &str,
        ) -> StorageResult<String> {
            if storage_key.ends_with(self.stall_on) {
                std::future::pending::<()>().await;
            }
            self.inner.upload_with_key(storage_key, data, content_type).await
        }

        fn public_url(&self, storage_key: &str) -> String {
            self.inner.public_url(storage_key)
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Local
        }
    }

    struct FailingStorage(fn() -> StorageError);

    #[async_trait]
    impl Storage for FailingStorage {
        async fn upload_with_key(&self, _: &str, _: Vec<u8>, _: &str) -> StorageResult<String> {
            Err((self.0)())
        }

        fn public_url(&self, key: &str) -> String {
            format!("https://docs-bucket.s3.eu-west-1.amazonaws.com/{}", key)
        }

        fn bucket(&self) -> Option<&str> {
            Some("docs-bucket")
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::S3
        }
    }

    struct Harness {
        service: IngestionService,
        documents: MockDocumentRepository,
        processed: mpsc::UnboundedReceiver<(ProcessingRequest, Option<String>)>,
        _dir: tempfile::TempDir,
    }

    fn settings(policy: BatchPolicy) -> IngestionSettings {
        IngestionSettings {
            concurrency: 4,
            timeout: Duration::from_secs(30),
            policy,
            key_prefix: "artefacts".to_string(),
        }
    }

    async fn harness_with(
        server: &mockito::ServerGuard,
        settings: IngestionSettings,
        storage: impl FnOnce(LocalStorage) -> Arc<dyn Storage>,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStorage::new(dir.path(), "http://files.test".to_string())
            .await
            .unwrap();

        let drive = DriveClient::new(
            reqwest::Client::new(),
            DriveConfig {
                api_base_url: server.url(),
                export_base_url: server.url(),
                download_retries: 0,
                retry_base_delay: Duration::from_millis(1),
            },
        );

        let documents = MockDocumentRepository::new();
        let organizations = MockOrganizationRepository::new();
        organizations.add_member(USER_ID, ORG_ID, "Acme Legal");

        let (tx, rx) = mpsc::unbounded_channel();
        let service = IngestionService::new(
            drive,
            storage(local),
            Arc::new(documents.clone()),
            Arc::new(organizations),
            Arc::new(RecordingProcessor(tx)),
            settings,
        );

        Harness {
            service,
            documents,
            processed: rx,
            _dir: dir,
        }
    }

    async fn harness(server: &mockito::ServerGuard, policy: BatchPolicy) -> Harness {
        harness_with(server, settings(policy), |local| Arc::new(local)).await
    }

    fn descriptor(id: &str, name: &str) -> ExternalFileDescriptor {
        ExternalFileDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: "application/pdf".to_string(),
            size: "2.00 KB".to_string(),
            web_view_link: Some(format!("https://drive.google.com/file/d/{}/view", id)),
            ..Default::default()
        }
    }

    fn job(files: Vec<ExternalFileDescriptor>) -> IngestionJob {
        IngestionJob {
            identity: TenantIdentity::new(Some(USER_ID), None).unwrap(),
            bearer_token: "user-jwt".to_string(),
            files,
            category: "Contracts".to_string(),
            request_id: Some("req-1".to_string()),
        }
    }

    async fn mock_download(server: &mut mockito::ServerGuard, id: &str, status: usize, body: &str) {
        server
            .mock("GET", "/uc")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("export".into(), "download".into()),
                Matcher::UrlEncoded("id".into(), id.into()),
            ]))
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;
    }

    fn assert_nothing_processing(documents: &MockDocumentRepository) {
        assert!(documents
            .all()
            .iter()
            .all(|d| d.parsed_status() != Some(DocumentStatus::Processing)));
    }

    #[tokio::test]
    async fn test_ingest_stores_records_and_notifies_processor() {
        let mut server = mockito::Server::new_async().await;
        mock_download(&mut server, "fileA", 200, "%PDF-1.7 contract").await;
        let mut h = harness(&server, BatchPolicy::AllOrNothing).await;

        let result = h
            .service
            .ingest(job(vec![descriptor("fileA", "a.pdf")]), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.files.len(), 1);
        assert!(result.failures.is_empty());
        let summary = &result.files[0];
        assert_eq!(summary.name, "a.pdf");
        assert_eq!(summary.public_url, "http://files.test/artefacts/acme_legal/files/a.pdf");
        assert_eq!(summary.content_type, "application/pdf");
        assert_eq!(summary.size, "2.00 KB");
        assert_eq!(summary.kind, "PDF");

        let rows = h.documents.all();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].org_id, ORG_ID);
        assert_eq!(rows[0].file_category, "Contracts");
        assert_eq!(rows[0].status, "processing");
        assert_eq!(rows[0].doc_type, "gdrive");
        assert_eq!(rows[0].file_size, Some(2048));
        assert_eq!(rows[0].document_link, summary.public_url);

        let (request, request_id) = h.processed.recv().await.unwrap();
        assert_eq!(request_id.as_deref(), Some("req-1"));
        assert_eq!(request.org_id, ORG_ID);
        assert_eq!(request.user_id, USER_ID);
        assert_eq!(request.org_name, "Acme Legal");
        assert_eq!(request.folder_name, "artefacts");
        assert_eq!(request.token, "user-jwt");
        assert_eq!(request.documents.len(), 1);
        assert_eq!(request.documents[0].id, rows[0].id);
        assert_eq!(request.documents[0].kind, "document");
    }

    #[tokio::test]
    async fn test_ingest_runs_on_spawned_task() {
        let mut server = mockito::Server::new_async().await;
        mock_download(&mut server, "fileA", 200, "content").await;
        mock_download(&mut server, "fileB", 200, "content").await;
        let Harness {
            service,
            documents,
            processed: _processed,
            _dir,
        } = harness(&server, BatchPolicy::AllOrNothing).await;
        let service = Arc::new(service);

        let batch = job(vec![descriptor("fileA", "a.pdf"), descriptor("fileB", "b.pdf")]);
        let result = tokio::spawn(async move { service.ingest(batch, CancellationToken::new()).await })
            .await
            .unwrap()
            .unwrap();

        let names: Vec<_> = result.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
        assert_eq!(documents.all().len(), 2);
    }

    #[tokio::test]
    async fn test_reingest_resets_existing_row() {
        let mut server = mockito::Server::new_async().await;
        mock_download(&mut server, "fileA", 200, "v2").await;
        let h = harness(&server, BatchPolicy::AllOrNothing).await;
        let existing = h.documents.add_document(ORG_ID, "a.pdf", "Old");

        h.service
            .ingest(job(vec![descriptor("fileA", "a.pdf")]), CancellationToken::new())
            .await
            .unwrap();

        let rows = h.documents.all();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, existing.id);
        assert_eq!(rows[0].status, "processing");
        assert_eq!(rows[0].file_category, "Contracts");
        assert!(rows[0].summary.is_none());
        assert!(!rows[0].is_summarized);
    }

    #[tokio::test]
    async fn test_preconditions() {
        let server = mockito::Server::new_async().await;
        let h = harness(&server, BatchPolicy::AllOrNothing).await;

        let err = h.service.ingest(job(vec![]), CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.client_message(), "No files selected for upload");

        let mut no_category = job(vec![descriptor("fileA", "a.pdf")]);
        no_category.category = "  ".to_string();
        let err = h.service.ingest(no_category, CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.client_message(), "Category is required");

        let mut stranger = job(vec![descriptor("fileA", "a.pdf")]);
        stranger.identity = TenantIdentity::new(Some(999), None).unwrap();
        let err = h.service.ingest(stranger, CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.client_message(), "User or organization not found");

        let mut org_only = job(vec![descriptor("fileA", "a.pdf")]);
        org_only.identity = TenantIdentity::new(None, Some(ORG_ID)).unwrap();
        let err = h.service.ingest(org_only, CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.http_status_code(), 401);
    }

    #[tokio::test]
    async fn test_invalid_descriptor_rejected_before_any_download() {
        let mut server = mockito::Server::new_async().await;
        let download = server
            .mock("GET", "/uc")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let h = harness(&server, BatchPolicy::AllOrNothing).await;

        let mut broken = descriptor("fileB", "b.pdf");
        broken.web_view_link = None;
        let err = h
            .service
            .ingest(
                job(vec![descriptor("fileA", "a.pdf"), broken]),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.client_message(), "Invalid file data: b.pdf");
        download.assert_async().await;
        assert!(h.documents.all().is_empty());
    }

    #[tokio::test]
    async fn test_path_like_file_id_rejected_before_any_download() {
        let mut server = mockito::Server::new_async().await;
        let any = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let h = harness(&server, BatchPolicy::AllOrNothing).await;

        let mut traversal = descriptor("fileA", "a.pdf");
        traversal.id = "../about".to_string();
        traversal.google_access_token = Some("user-drive-token".to_string());
        let err = h
            .service
            .ingest(job(vec![traversal]), CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.client_message(), "Invalid file data: a.pdf");
        any.assert_async().await;
        assert!(h.documents.all().is_empty());
    }

    #[tokio::test]
    async fn test_all_or_nothing_failure_leaves_nothing_processing() {
        let mut server = mockito::Server::new_async().await;
        mock_download(&mut server, "fileA", 200, "content").await;
        mock_download(&mut server, "fileB", 404, "File not found").await;
        let mut h = harness(&server, BatchPolicy::AllOrNothing).await;

        let err = h
            .service
            .ingest(
                job(vec![descriptor("fileA", "a.pdf"), descriptor("fileB", "b.pdf")]),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.http_status_code(), 502);
        assert_nothing_processing(&h.documents);
        assert!(h.processed.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_isolated_policy_reports_failures_per_file() {
        let mut server = mockito::Server::new_async().await;
        mock_download(&mut server, "fileA", 200, "content").await;
        mock_download(&mut server, "fileB", 404, "File not found").await;
        let mut h = harness(&server, BatchPolicy::Isolated).await;

        let result = h
            .service
            .ingest(
                job(vec![descriptor("fileA", "a.pdf"), descriptor("fileB", "b.pdf")]),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].name, "a.pdf");
        assert_eq!(
            result.failures,
            vec![FileFailure {
                name: "b.pdf".to_string(),
                message: "File not found".to_string(),
            }]
        );

        let (request, _) = h.processed.recv().await.unwrap();
        assert_eq!(request.documents.len(), 1);
    }

    #[tokio::test]
    async fn test_isolated_policy_with_no_success_returns_first_error() {
        let mut server = mockito::Server::new_async().await;
        mock_download(&mut server, "fileB", 404, "File not found").await;
        let h = harness(&server, BatchPolicy::Isolated).await;

        let broken = descriptor("", "x.pdf");
        let err = h
            .service
            .ingest(
                job(vec![broken, descriptor("fileB", "b.pdf")]),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.client_message(), "Invalid file data: x.pdf");
    }

    #[tokio::test]
    async fn test_storage_errors_are_classified() {
        let mut server = mockito::Server::new_async().await;
        mock_download(&mut server, "fileA", 200, "content").await;

        let cases: [(fn() -> StorageError, &str); 3] = [
            (
                || StorageError::BucketNotFound("docs-bucket".to_string()),
                "S3 bucket 'docs-bucket' does not exist",
            ),
            (
                || StorageError::AccessDenied("denied".to_string()),
                "Access denied to S3 bucket or path 'artefacts/acme_legal/files/'",
            ),
            (
                || StorageError::UploadFailed("connection reset".to_string()),
                "Failed to upload file 'a.pdf' to S3: Upload failed: connection reset",
            ),
        ];

        for (make_error, expected) in cases {
            let h = harness_with(&server, settings(BatchPolicy::AllOrNothing), |_| {
                Arc::new(FailingStorage(make_error))
            })
            .await;
            let err = h
                .service
                .ingest(job(vec![descriptor("fileA", "a.pdf")]), CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(err.http_status_code(), 500);
            assert_eq!(err.client_message(), expected);
            assert!(h.documents.all().is_empty());
        }
    }

    #[tokio::test]
    async fn test_deadline_marks_written_rows_failed() {
        let mut server = mockito::Server::new_async().await;
        mock_download(&mut server, "fileA", 200, "content").await;
        mock_download(&mut server, "fileB", 200, "content").await;

        let mut short = settings(BatchPolicy::AllOrNothing);
        short.timeout = Duration::from_millis(500);
        let mut h = harness_with(&server, short, |local| {
            Arc::new(StallingStorage {
                inner: local,
                stall_on: "b.pdf",
            })
        })
        .await;

        let err = h
            .service
            .ingest(
                job(vec![descriptor("fileA", "a.pdf"), descriptor("fileB", "b.pdf")]),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.client_message(), CANCELLED_MESSAGE);
        let rows = h.documents.all();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "a.pdf");
        assert_eq!(rows[0].status, "failed");
        assert!(h.processed.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_batch() {
        let mut server = mockito::Server::new_async().await;
        mock_download(&mut server, "fileA", 200, "content").await;
        let h = harness_with(&server, settings(BatchPolicy::AllOrNothing), |local| {
            Arc::new(StallingStorage {
                inner: local,
                stall_on: "a.pdf",
            })
        })
        .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = h
            .service
            .ingest(job(vec![descriptor("fileA", "a.pdf")]), cancel)
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 502);
        assert_eq!(err.client_message(), CANCELLED_MESSAGE);
        assert!(h.documents.all().is_empty());
    }
}
