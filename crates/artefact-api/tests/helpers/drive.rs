//! Mocked drive endpoints served by mockito.

use base64::{engine::general_purpose::STANDARD, Engine};
use mockito::{Matcher, Mock, ServerGuard};

const TEST_PRIVATE_KEY: &str =
    include_str!("../../../artefact-drive/tests/fixtures/test_service_account_key.pem");

pub const SERVICE_TOKEN: &str = "sa-token";

/// Base64 service account whose token endpoint is the mock server
pub fn encoded_credentials(server: &ServerGuard) -> String {
    let json = serde_json::json!({
        "type": "service_account",
        "client_email": "ingest@project.iam.gserviceaccount.com",
        "private_key": TEST_PRIVATE_KEY,
        "token_uri": format!("{}/token", server.url()),
    });
    STANDARD.encode(json.to_string())
}

pub async fn mock_token_endpoint(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"access_token":"{}","expires_in":3600,"token_type":"Bearer"}}"#,
            SERVICE_TOKEN
        ))
        .create_async()
        .await
}

pub async fn mock_folder(server: &mut ServerGuard, folder_id: &str) -> Mock {
    server
        .mock("GET", format!("/drive/v3/files/{}", folder_id).as_str())
        .match_query(Matcher::UrlEncoded("fields".into(), "id".into()))
        .match_header("authorization", format!("Bearer {}", SERVICE_TOKEN).as_str())
        .with_status(200)
        .with_body(format!(r#"{{"id":"{}"}}"#, folder_id))
        .create_async()
        .await
}

pub async fn mock_missing_folder(server: &mut ServerGuard, folder_id: &str) -> Mock {
    server
        .mock("GET", format!("/drive/v3/files/{}", folder_id).as_str())
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"error":{"code":404,"message":"File not found"}}"#)
        .create_async()
        .await
}

/// One listing page holding `a.pdf` and `b.exe`
pub async fn mock_listing(server: &mut ServerGuard) -> Mock {
    let body = serde_json::json!({
        "files": [
            {
                "id": "fileA",
                "name": "a.pdf",
                "mimeType": "application/pdf",
                "size": "2048",
                "webViewLink": "https://drive.google.com/file/d/fileA/view"
            },
            {
                "id": "fileB",
                "name": "b.exe",
                "mimeType": "application/octet-stream",
                "size": "4096",
                "webViewLink": "https://drive.google.com/file/d/fileB/view"
            }
        ]
    });
    server
        .mock("GET", "/drive/v3/files")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

/// Anonymous export download of `file_id`
pub async fn mock_download(server: &mut ServerGuard, file_id: &str, status: usize, body: &str) -> Mock {
    server
        .mock("GET", "/uc")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("export".into(), "download".into()),
            Matcher::UrlEncoded("id".into(), file_id.into()),
        ]))
        .with_status(status)
        .with_body(body)
        .create_async()
        .await
}
