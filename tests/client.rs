use std::time::Duration;

use mockito::{Matcher, Mock, Server};
use serde_json::json;
use url::Url;
use video_summarizer::{
    summary::{GeminiService, RemoteFileHandle, SummaryConfig, VideoService},
    ClientError, FileState, Gemini,
};

const API_KEY: &str = "test-key";

fn base_url(server: &Server) -> Url {
    Url::parse(&format!("{}/v1beta/", server.url())).unwrap()
}

fn file_json(server: &Server, state: &str) -> serde_json::Value {
    json!({
        "name": "files/abc-123",
        "displayName": "sample.mp4",
        "mimeType": "video/mp4",
        "sizeBytes": "4",
        "uri": format!("{}/v1beta/files/abc-123", server.url()),
        "state": state
    })
}

#[tokio::test]
async fn resumable_upload_opens_session_then_finalizes() {
    let mut server = Server::new_async().await;
    let session_url = format!("{}/upload-session/1", server.url());

    let start = server
        .mock("POST", "/upload/v1beta/files")
        .match_header("x-goog-api-key", API_KEY)
        .match_header("x-goog-upload-protocol", "resumable")
        .match_header("x-goog-upload-command", "start")
        .match_header("x-goog-upload-header-content-length", "4")
        .match_header("x-goog-upload-header-content-type", "video/mp4")
        .match_body(Matcher::PartialJson(
            json!({ "file": { "displayName": "sample.mp4" } }),
        ))
        .with_status(200)
        .with_header("x-goog-upload-url", session_url.as_str())
        .create_async()
        .await;

    let finalize = server
        .mock("POST", "/upload-session/1")
        .match_header("x-goog-upload-command", "upload, finalize")
        .match_header("x-goog-upload-offset", "0")
        .match_body("abcd")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "file": file_json(&server, "ACTIVE") }).to_string())
        .create_async()
        .await;

    let gemini = Gemini::with_model_and_base_url(API_KEY, "gemini-1.5-flash", base_url(&server))
        .unwrap();
    let handle = gemini
        .create_file(b"abcd".to_vec())
        .display_name("sample.mp4")
        .with_mime_type("video/mp4".parse().unwrap())
        .upload()
        .await
        .unwrap();

    start.assert_async().await;
    finalize.assert_async().await;
    assert_eq!(handle.name(), "files/abc-123");
    assert_eq!(handle.state(), Some(FileState::Active));
    assert_eq!(handle.get_file_meta().size_bytes, Some(4));
}

#[tokio::test]
async fn upload_without_session_header_fails() {
    let mut server = Server::new_async().await;
    let _start = server
        .mock("POST", "/upload/v1beta/files")
        .with_status(200)
        .create_async()
        .await;

    let gemini = Gemini::with_model_and_base_url(API_KEY, "gemini-1.5-flash", base_url(&server))
        .unwrap();
    let err = gemini.create_file(b"abcd".to_vec()).upload().await.unwrap_err();

    assert!(
        matches!(err, ClientError::MissingResponseHeader { ref header } if header == "x-goog-upload-url"),
        "{err:?}"
    );
}

#[tokio::test]
async fn processing_file_is_polled_until_active() {
    let mut server = Server::new_async().await;
    let session_url = format!("{}/upload-session/2", server.url());

    let _start = server
        .mock("POST", "/upload/v1beta/files")
        .with_status(200)
        .with_header("x-goog-upload-url", session_url.as_str())
        .create_async()
        .await;
    let _finalize = server
        .mock("POST", "/upload-session/2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "file": file_json(&server, "PROCESSING") }).to_string())
        .create_async()
        .await;
    let poll = server
        .mock("GET", "/v1beta/files/abc-123")
        .match_header("x-goog-api-key", API_KEY)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(file_json(&server, "ACTIVE").to_string())
        .expect(1)
        .create_async()
        .await;

    let config = SummaryConfig::new(API_KEY)
        .with_base_url(base_url(&server))
        .with_poll_interval(Duration::from_millis(10));
    let service = GeminiService::from_config(&config).unwrap();

    let file = service
        .upload("sample.mp4", b"abcd".to_vec(), &config.mime_type)
        .await
        .unwrap();

    poll.assert_async().await;
    assert_eq!(file.id, "files/abc-123");
    assert_eq!(file.uri, format!("{}/v1beta/files/abc-123", server.url()));
    assert_eq!(file.mime_type.essence_str(), "video/mp4");
}

/// Mocks a resumable upload whose finalize step returns `file`.
async fn mock_upload(
    server: &mut Server,
    session: &str,
    file: serde_json::Value,
) -> (Mock, Mock) {
    let session_url = format!("{}/upload-session/{session}", server.url());
    let start = server
        .mock("POST", "/upload/v1beta/files")
        .with_status(200)
        .with_header("x-goog-upload-url", session_url.as_str())
        .create_async()
        .await;
    let finalize = server
        .mock("POST", format!("/upload-session/{session}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "file": file }).to_string())
        .create_async()
        .await;
    (start, finalize)
}

#[tokio::test]
async fn failed_processing_is_an_upload_error() {
    let mut server = Server::new_async().await;
    let mut failed = file_json(&server, "PROCESSING");
    let _upload = mock_upload(&mut server, "3", failed.clone()).await;

    failed["state"] = json!("FAILED");
    failed["error"] = json!({ "code": 3, "message": "unsupported codec" });
    let _poll = server
        .mock("GET", "/v1beta/files/abc-123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(failed.to_string())
        .create_async()
        .await;

    let config = SummaryConfig::new(API_KEY)
        .with_base_url(base_url(&server))
        .with_poll_interval(Duration::from_millis(10));
    let service = GeminiService::from_config(&config).unwrap();

    let err = service
        .upload("sample.mp4", b"abcd".to_vec(), &config.mime_type)
        .await
        .unwrap_err();

    let err = err.downcast_ref::<ClientError>().unwrap();
    assert!(
        matches!(err, ClientError::FileProcessingFailed { message, .. } if message.as_deref() == Some("unsupported codec")),
        "{err:?}"
    );
}

#[tokio::test]
async fn processing_that_never_ends_times_out() {
    let mut server = Server::new_async().await;
    let processing = file_json(&server, "PROCESSING");
    let _upload = mock_upload(&mut server, "4", processing.clone()).await;
    let poll = server
        .mock("GET", "/v1beta/files/abc-123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(processing.to_string())
        .expect_at_least(1)
        .create_async()
        .await;

    let config = SummaryConfig::new(API_KEY)
        .with_base_url(base_url(&server))
        .with_poll_interval(Duration::from_millis(10))
        .with_processing_timeout(Some(Duration::from_millis(50)));
    let service = GeminiService::from_config(&config).unwrap();

    let err = service
        .upload("sample.mp4", b"abcd".to_vec(), &config.mime_type)
        .await
        .unwrap_err();

    poll.assert_async().await;
    let err = err.downcast_ref::<ClientError>().unwrap();
    assert!(
        matches!(err, ClientError::FileProcessingTimeout { name, timeout } if name == "files/abc-123" && *timeout == Duration::from_millis(50)),
        "{err:?}"
    );
}

#[tokio::test]
async fn generate_sends_prompt_and_file_reference() {
    let mut server = Server::new_async().await;

    let generate = server
        .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
        .match_header("x-goog-api-key", API_KEY)
        .match_body(Matcher::Json(json!({
            "contents": [{
                "parts": [
                    { "text": "Describe the video." },
                    { "fileData": { "mimeType": "video/mp4", "fileUri": "https://files.example/abc" } }
                ],
                "role": "user"
            }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{
                    "content": { "parts": [{ "text": " A dog crosses the yard. " }], "role": "model" },
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let config = SummaryConfig::new(API_KEY).with_base_url(base_url(&server));
    let service = GeminiService::from_config(&config).unwrap();
    let file = RemoteFileHandle {
        uri: "https://files.example/abc".to_string(),
        id: "files/abc".to_string(),
        mime_type: "video/mp4".parse().unwrap(),
    };

    let text = service
        .infer("gemini-2.5-flash", "Describe the video.", &file)
        .await
        .unwrap();

    generate.assert_async().await;
    assert_eq!(text, " A dog crosses the yard. ");
}

#[tokio::test]
async fn error_status_carries_code_and_body() {
    let mut server = Server::new_async().await;
    let _generate = server
        .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
        .with_status(403)
        .with_body("API key not valid")
        .create_async()
        .await;

    let gemini = Gemini::with_model_and_base_url(API_KEY, "gemini-1.5-flash", base_url(&server))
        .unwrap();
    let err = gemini
        .generate_content()
        .with_user_message_and_file_uri("hello", "video/mp4", "https://files.example/abc")
        .execute()
        .await
        .unwrap_err();

    assert!(
        matches!(err, ClientError::BadResponse { code: 403, ref description } if description.as_deref() == Some("API key not valid")),
        "{err:?}"
    );
}

#[tokio::test]
async fn delete_targets_the_file_resource() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", "/v1beta/files/abc-123")
        .match_header("x-goog-api-key", API_KEY)
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let config = SummaryConfig::new(API_KEY).with_base_url(base_url(&server));
    let service = GeminiService::from_config(&config).unwrap();
    service.delete("files/abc-123").await.unwrap();

    delete.assert_async().await;
}

#[tokio::test]
async fn failed_delete_reports_status() {
    let mut server = Server::new_async().await;
    let _delete = server
        .mock("DELETE", "/v1beta/files/abc-123")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let config = SummaryConfig::new(API_KEY).with_base_url(base_url(&server));
    let service = GeminiService::from_config(&config).unwrap();
    let err = service.delete("files/abc-123").await.unwrap_err();

    let err = err.downcast_ref::<ClientError>().unwrap();
    assert!(matches!(err, ClientError::BadResponse { code: 404, .. }), "{err:?}");
}

#[tokio::test]
async fn base_url_without_trailing_slash_keeps_api_version() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", "/v1beta/files/abc")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let base = Url::parse(&format!("{}/v1beta", server.url())).unwrap();
    let config = SummaryConfig::new(API_KEY).with_base_url(base);
    let service = GeminiService::from_config(&config).unwrap();
    service.delete("files/abc").await.unwrap();

    delete.assert_async().await;
}
