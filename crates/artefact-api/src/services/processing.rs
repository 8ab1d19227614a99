//! Hand-off of freshly ingested documents to the downstream processor.

use std::sync::Arc;

use artefact_core::models::ProcessingDocument;
use artefact_core::AppError;
use async_trait::async_trait;
use serde::Serialize;

use crate::constants::REQUEST_ID_HEADER;

/// One processing call per successful ingestion batch
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingRequest {
    pub bucket_name: String,
    pub folder_name: String,
    pub org_name: String,
    pub org_id: i64,
    pub user_id: i64,
    pub documents: Vec<ProcessingDocument>,
    /// Caller's bearer token. Sent as the `Authorization` header, never in the body.
    #[serde(skip)]
    pub token: String,
}

#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    async fn process(
        &self,
        request: &ProcessingRequest,
        request_id: Option<&str>,
    ) -> Result<(), AppError>;
}

/// Posts the request as JSON to `DOCUMENT_PROCESSOR_URL`
pub struct HttpDocumentProcessor {
    client: reqwest::Client,
    url: String,
}

impl HttpDocumentProcessor {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DocumentProcessor for HttpDocumentProcessor {
    #[tracing::instrument(skip(self, request), fields(org_id = request.org_id, documents = request.documents.len()))]
    async fn process(
        &self,
        request: &ProcessingRequest,
        request_id: Option<&str>,
    ) -> Result<(), AppError> {
        let mut builder = self
            .client
            .post(&self.url)
            .bearer_auth(&request.token)
            .json(request);
        if let Some(id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Document processor unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Document processor returned {}: {}",
                status, body
            )));
        }

        tracing::info!("Document processing requested");
        Ok(())
    }
}

/// Used when no processor endpoint is configured
#[derive(Debug, Default)]
pub struct NoopDocumentProcessor;

#[async_trait]
impl DocumentProcessor for NoopDocumentProcessor {
    async fn process(
        &self,
        request: &ProcessingRequest,
        _request_id: Option<&str>,
    ) -> Result<(), AppError> {
        tracing::info!(
            org_id = request.org_id,
            documents = request.documents.len(),
            "No document processor configured, skipping processing"
        );
        Ok(())
    }
}

/// Run the processor in the background. Failures are logged and never reach the caller.
pub fn dispatch(
    processor: Arc<dyn DocumentProcessor>,
    request: ProcessingRequest,
    request_id: Option<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = processor.process(&request, request_id.as_deref()).await {
            tracing::error!(
                error = %e,
                org_id = request.org_id,
                documents = request.documents.len(),
                "Document processing request failed"
            );
        }
    })
}
