//! Download, preview, progress and listing integration tests.
//!
//! Run with: `cargo test -p stowage-api --test files_test`

mod helpers;

use helpers::fixtures::{upload_form, SAMPLE_CONTENT, SIX_LINES};
use helpers::setup_test_app;
use serde_json::Value;
use stowage_storage::Storage;

#[tokio::test]
async fn test_download_unknown_file_is_not_found() {
    let app = setup_test_app().await;

    let response = app.client().get("/download/missing.csv").await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"], "File not found");
}

#[tokio::test]
async fn test_download_returns_attachment() {
    let app = setup_test_app().await;
    let client = app.client();

    let uploaded: Value = client
        .post("/upload")
        .multipart(upload_form(&[("report.csv", SAMPLE_CONTENT)]))
        .await
        .json();

    let response = client.get("/download/report.csv").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"report.csv\""
    );
    assert_eq!(response.header("content-type"), "text/csv");
    assert_eq!(response.as_bytes().as_ref(), SAMPLE_CONTENT);

    // The record id works as a key too.
    let id = uploaded[0]["id"].as_str().unwrap();
    let by_id = client.get(&format!("/download/{}", id)).await;
    assert_eq!(by_id.as_bytes().as_ref(), SAMPLE_CONTENT);
}

#[tokio::test]
async fn test_download_with_missing_object_is_not_found() {
    let app = setup_test_app().await;
    let client = app.client();

    client
        .post("/upload")
        .multipart(upload_form(&[("lost.csv", SAMPLE_CONTENT)]))
        .await;
    app.storage.delete("uploads/lost.csv").await.unwrap();

    let response = client.get("/download/lost.csv").await;
    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"], "File not found");
    assert_eq!(body["code"], "OBJECT_NOT_FOUND");
}

#[tokio::test]
async fn test_preview_returns_first_five_lines() {
    let app = setup_test_app().await;
    let client = app.client();

    client
        .post("/upload")
        .multipart(upload_form(&[("lines.csv", SIX_LINES)]))
        .await;

    let response = client.get("/preview/lines.csv").await;
    assert_eq!(response.status_code(), 200);
    let lines: Vec<String> = response.json();
    assert_eq!(lines, ["Line 1", "Line 2", "Line 3", "Line 4", "Line 5"]);

    let two: Vec<String> = client
        .get("/preview/lines.csv")
        .add_query_param("lines", 2)
        .await
        .json();
    assert_eq!(two, ["Line 1", "Line 2"]);
}

#[tokio::test]
async fn test_preview_unknown_file_is_not_found() {
    let app = setup_test_app().await;
    let response = app.client().get("/preview/missing.csv").await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_progress_unknown_file_is_not_found() {
    let app = setup_test_app().await;
    let response = app.client().get("/progress/missing.csv").await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_list_files_and_progress() {
    let app = setup_test_app().await;
    let client = app.client();

    let empty: Vec<Value> = client.get("/files").await.json();
    assert!(empty.is_empty());

    client
        .post("/upload")
        .multipart(upload_form(&[("one.csv", b"1\n"), ("two.csv", SAMPLE_CONTENT)]))
        .await;

    let files: Vec<Value> = client.get("/files").await.json();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["filename"], "one.csv");
    assert_eq!(files[1]["uploaded_size"], 18);

    let progress: Vec<Value> = client.get("/progress").await.json();
    assert_eq!(progress.len(), 2);
    assert!(progress.iter().all(|p| p["percentage"] == 100.0));
}

#[tokio::test]
async fn test_root_and_health() {
    let app = setup_test_app().await;
    let client = app.client();

    let root: Value = client.get("/").await.json();
    assert!(root["message"].is_string());

    let health = client.get("/health").await;
    assert_eq!(health.status_code(), 200);
    let body: Value = health.json();
    assert_eq!(body["database"], "healthy");
    assert_eq!(body["storage"], "healthy");

    let ready = client.get("/health/ready").await;
    assert_eq!(ready.status_code(), 200);
}
