//! Upload API integration tests.
//!
//! Run with: `cargo test -p stowage-api --test upload_test`

mod helpers;

use axum_test::multipart::MultipartForm;
use helpers::fixtures::{file_part, upload_form, SAMPLE_CONTENT};
use helpers::{setup_test_app, setup_test_app_with};
use bytes::Bytes;
use serde_json::Value;
use stowage_core::NewFileRecord;
use stowage_db::FileRecordRepository;
use stowage_storage::Storage;

#[tokio::test]
async fn test_upload_single_file_completes() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client
        .post("/upload")
        .multipart(upload_form(&[("test.csv", SAMPLE_CONTENT)]))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let files = body.as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["filename"], "test.csv");
    assert_eq!(files[0]["status"], "completed");
    assert_eq!(files[0]["uploaded_size"], 18);
    assert_eq!(files[0]["file_size"], 18);

    let progress: Value = client.get("/progress/test.csv").await.json();
    assert_eq!(progress["percentage"], 100.0);
    assert_eq!(progress["status"], "completed");

    let stored = app
        .storage
        .read_range("uploads/test.csv", 0..64)
        .await
        .unwrap();
    assert_eq!(&stored[..], SAMPLE_CONTENT);
}

#[tokio::test]
async fn test_upload_multiple_files_in_one_request() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/upload")
        .multipart(upload_form(&[
            ("a.csv", b"a,b\n1,2\n"),
            ("b.csv", b"x\n"),
        ]))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["filename"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["a.csv", "b.csv"]);
    assert_eq!(app.repository.len(), 2);
}

#[tokio::test]
async fn test_upload_accepts_singular_file_field() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_text("note", "ignored")
        .add_part("file", file_part("single.csv", SAMPLE_CONTENT));
    let response = app.client().post("/upload").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body[0]["filename"], "single.csv");
}

#[tokio::test]
async fn test_upload_rejects_disallowed_extension() {
    let app = setup_test_app_with(&[("ALLOWED_EXTENSIONS", "csv")]).await;

    let response = app
        .client()
        .post("/upload")
        .multipart(upload_form(&[("notes.txt", b"hello\n")]))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "File type not allowed");
    assert!(app.repository.is_empty());
}

#[tokio::test]
async fn test_failing_part_keeps_earlier_files_committed() {
    let app = setup_test_app_with(&[("ALLOWED_EXTENSIONS", "csv")]).await;
    let client = app.client();

    let response = client
        .post("/upload")
        .multipart(upload_form(&[
            ("first.csv", SAMPLE_CONTENT),
            ("second.txt", b"hello\n"),
        ]))
        .await;
    assert_eq!(response.status_code(), 400);

    // The error covers the whole request; the earlier part is still stored.
    let record = app
        .repository
        .find_by_filename("first.csv")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.uploaded_size, SAMPLE_CONTENT.len() as u64);
    assert!(record.is_completed());
    assert_eq!(app.repository.len(), 1);

    let progress: Value = client.get("/progress/first.csv").await.json();
    assert_eq!(progress["status"], "completed");
}

#[tokio::test]
async fn test_upload_without_files_is_bad_request() {
    let app = setup_test_app().await;

    let form = MultipartForm::new().add_text("note", "no file here");
    let response = app.client().post("/upload").multipart(form).await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_reupload_keeps_same_record() {
    let app = setup_test_app().await;
    let client = app.client();

    let first: Value = client
        .post("/upload")
        .multipart(upload_form(&[("same.csv", SAMPLE_CONTENT)]))
        .await
        .json();
    let second: Value = client
        .post("/upload")
        .multipart(upload_form(&[("same.csv", b"different content!")]))
        .await
        .json();

    assert_eq!(first[0]["id"], second[0]["id"]);
    assert_eq!(second[0]["status"], "completed");
    assert_eq!(app.repository.len(), 1);

    // The completed file is left untouched.
    let body = client.get("/download/same.csv").await;
    assert_eq!(body.as_bytes().as_ref(), SAMPLE_CONTENT);
}

#[tokio::test]
async fn test_resume_with_offset() {
    let app = setup_test_app().await;
    let client = app.client();

    // An earlier attempt stored the first 6 of 18 bytes.
    let record = app
        .repository
        .create(NewFileRecord {
            filename: "resume.csv".to_string(),
            content_type: "text/csv".to_string(),
            file_size: 18,
            storage_path: "uploads/resume.csv".to_string(),
        })
        .await
        .unwrap();
    app.storage
        .write_chunk(&record.storage_path, 0, Bytes::from_static(&SAMPLE_CONTENT[..6]))
        .await
        .unwrap();
    app.repository.advance_progress(record.id, 0, 6).await.unwrap();

    let partial: Value = client.get("/progress/resume.csv").await.json();
    assert_eq!(partial["status"], "in_progress");

    let response = client
        .post("/upload")
        .add_query_param("offset", 6)
        .multipart(upload_form(&[("resume.csv", &SAMPLE_CONTENT[6..])]))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body[0]["id"], record.id.to_string());
    assert_eq!(body[0]["status"], "completed");

    let download = client.get("/download/resume.csv").await;
    assert_eq!(download.as_bytes().as_ref(), SAMPLE_CONTENT);
}

#[tokio::test]
async fn test_offset_past_stored_bytes_is_rejected() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client
        .post("/upload")
        .add_query_param("offset", 6)
        .multipart(upload_form(&[("gap.csv", &SAMPLE_CONTENT[6..])]))
        .await;
    assert_eq!(response.status_code(), 400);

    let progress: Value = client.get("/progress/gap.csv").await.json();
    assert_eq!(progress["uploaded_size"], 0);
    assert_eq!(progress["file_size"], 18);
}
