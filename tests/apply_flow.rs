//! End-to-end tests of the submission pipeline and the read endpoints,
//! running the real handlers against an in-memory database and a
//! temporary upload directory.

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use futures_util::future::join_all;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use applicant_intake::api::application::handlers::application_config;
use applicant_intake::api::application::ApplicationService;
use applicant_intake::db::migrations::run_migrations;
use applicant_intake::mailer::Mailer;
use applicant_intake::storage::ResumeStore;

const BASE_URL: &str = "http://127.0.0.1:8080";
const BOUNDARY: &str = "----applicantintaketestboundary";

struct TestEnv {
    upload_dir: tempfile::TempDir,
    service: web::Data<ApplicationService>,
    pool: Pool<Sqlite>,
}

async fn setup(max_upload_size: usize, mailer: Option<Mailer>) -> TestEnv {
    let upload_dir = tempfile::tempdir().unwrap();

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();

    let store = ResumeStore::new(upload_dir.path().to_path_buf(), max_upload_size);
    let service = web::Data::new(ApplicationService::new(
        pool.clone(),
        store,
        mailer,
        BASE_URL.to_string(),
    ));

    TestEnv {
        upload_dir,
        service,
        pool,
    }
}

macro_rules! init_app {
    ($env:expr) => {
        test::init_service(
            App::new()
                .app_data($env.service.clone())
                .configure(application_config),
        )
        .await
    };
}

/// Build a multipart/form-data body by hand: text fields plus an optional
/// file part with a declared content type.
fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (
        format!("multipart/form-data; boundary={BOUNDARY}"),
        body,
    )
}

fn base_fields<'a>(email: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("firstName", "Ada"),
        ("lastName", "Lovelace"),
        ("email", email),
        ("phone", "555-0100"),
        ("position", "Software Engineer"),
        ("coverLetter", "I would be a great fit."),
    ]
}

async fn post_apply<S, B>(
    app: &S,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> ServiceResponse<B>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (content_type, body) = multipart_body(fields, file);
    let req = test::TestRequest::post()
        .uri("/apply")
        .insert_header(("content-type", content_type))
        .set_payload(body)
        .to_request();
    test::call_service(app, req).await
}

fn upload_dir_entries(env: &TestEnv) -> Vec<String> {
    std::fs::read_dir(env.upload_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect()
}

#[actix_web::test]
async fn apply_without_resume_creates_record_with_null_resume() {
    let env = setup(10 * 1024 * 1024, None).await;
    let app = init_app!(env);

    let resp = post_apply(&app, &base_fields("ada@example.com"), None).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    let id = body["id"].as_i64().unwrap();
    assert!(id >= 1);

    let req = test::TestRequest::get()
        .uri(&format!("/applicants/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let record: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(record["email"], "ada@example.com");
    assert!(record["resumeFile"].is_null());
    assert!(record["resumeUrl"].is_null());
    assert!(upload_dir_entries(&env).is_empty());
}

#[actix_web::test]
async fn apply_requires_email_and_position() {
    let env = setup(10 * 1024 * 1024, None).await;
    let app = init_app!(env);

    let resp = post_apply(&app, &[("firstName", "Ada")], None).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn unsupported_file_type_leaves_no_record_and_no_artifact() {
    let env = setup(10 * 1024 * 1024, None).await;
    let app = init_app!(env);

    let resp = post_apply(
        &app,
        &base_fields("ada@example.com"),
        Some(("notes.txt", "text/plain", b"just text")),
    )
    .await;
    assert_eq!(resp.status(), 415);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);

    let req = test::TestRequest::get().uri("/applicants").to_request();
    let resp = test::call_service(&app, req).await;
    let records: Vec<serde_json::Value> = test::read_body_json(resp).await;
    assert!(records.is_empty());
    assert!(upload_dir_entries(&env).is_empty());
}

#[actix_web::test]
async fn oversize_file_leaves_no_record_and_no_artifact() {
    // 1 KiB ceiling, 2 KiB upload
    let env = setup(1024, None).await;
    let app = init_app!(env);

    let payload = vec![0u8; 2048];
    let resp = post_apply(
        &app,
        &base_fields("ada@example.com"),
        Some(("cv.pdf", "application/pdf", &payload)),
    )
    .await;
    assert_eq!(resp.status(), 413);

    let req = test::TestRequest::get().uri("/applicants").to_request();
    let resp = test::call_service(&app, req).await;
    let records: Vec<serde_json::Value> = test::read_body_json(resp).await;
    assert!(records.is_empty());
    assert!(upload_dir_entries(&env).is_empty());
}

#[actix_web::test]
async fn resume_round_trips_byte_identical() {
    let env = setup(10 * 1024 * 1024, None).await;
    let app = init_app!(env);

    let content = b"%PDF-1.4\nfake resume bytes\n%%EOF";
    let resp = post_apply(
        &app,
        &base_fields("ada@example.com"),
        Some(("ada_cv.pdf", "application/pdf", content)),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let id = body["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/applicants/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let record: serde_json::Value = test::read_body_json(resp).await;

    let resume_url = record["resumeUrl"].as_str().unwrap();
    let key = record["resumeFile"].as_str().unwrap();
    assert_eq!(resume_url, format!("{}/uploads/{}", BASE_URL, key));
    assert!(key.ends_with(".pdf"));

    let req = test::TestRequest::get()
        .uri(&format!("/resume/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("Ada.pdf"));

    let downloaded = test::read_body(resp).await;
    assert_eq!(downloaded.as_ref(), &content[..]);
}

#[actix_web::test]
async fn listing_is_most_recent_first() {
    let env = setup(10 * 1024 * 1024, None).await;
    let app = init_app!(env);

    let mut ids = Vec::new();
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        let resp = post_apply(&app, &base_fields(email), None).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        ids.push(body["id"].as_i64().unwrap());
    }

    let req = test::TestRequest::get().uri("/applicants").to_request();
    let resp = test::call_service(&app, req).await;
    let records: Vec<serde_json::Value> = test::read_body_json(resp).await;

    ids.reverse();
    let listed: Vec<i64> = records.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(listed, ids);

    let created: Vec<String> = records
        .iter()
        .map(|r| r["createdAt"].as_str().unwrap().to_string())
        .collect();
    for pair in created.windows(2) {
        assert!(pair[0] >= pair[1]);
    }
}

#[actix_web::test]
async fn missing_record_and_missing_resume_return_not_found() {
    let env = setup(10 * 1024 * 1024, None).await;
    let app = init_app!(env);

    let req = test::TestRequest::get().uri("/applicants/999").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // A record without a resume has nothing to download
    let resp = post_apply(&app, &base_fields("ada@example.com"), None).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let id = body["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/resume/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn externally_deleted_artifact_downloads_as_not_found() {
    let env = setup(10 * 1024 * 1024, None).await;
    let app = init_app!(env);

    let resp = post_apply(
        &app,
        &base_fields("ada@example.com"),
        Some(("cv.pdf", "application/pdf", b"%PDF-1.4")),
    )
    .await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let id = body["id"].as_i64().unwrap();

    // Operator removes the artifact out from under the service
    for entry in upload_dir_entries(&env) {
        std::fs::remove_file(env.upload_dir.path().join(entry)).unwrap();
    }

    let req = test::TestRequest::get()
        .uri(&format!("/resume/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn failed_notification_does_not_fail_the_submission() {
    // Nothing listens on port 9; the delivery attempt is refused.
    let mailer = Mailer::unencrypted("127.0.0.1", 9, "noreply@example.com").unwrap();
    let env = setup(10 * 1024 * 1024, Some(mailer)).await;
    let app = init_app!(env);

    let resp = post_apply(&app, &base_fields("ada@example.com"), None).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    let id = body["id"].as_i64().unwrap();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("confirmation email could not be sent"));

    // The record is durably stored despite the delivery failure
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM applicants WHERE id = ?1")
        .bind(id)
        .fetch_one(&env.pool)
        .await
        .unwrap();
    assert_eq!(count.0, 1);
}

#[actix_web::test]
async fn parallel_submissions_get_distinct_ids_and_artifacts() {
    let env = setup(10 * 1024 * 1024, None).await;
    let app = init_app!(env);

    let emails: Vec<String> = (0..10).map(|i| format!("user{}@example.com", i)).collect();
    let app_ref = &app;
    let responses = join_all(emails.iter().map(|email| async move {
        let fields = base_fields(email.as_str());
        post_apply(
            app_ref,
            &fields,
            Some(("cv.pdf", "application/pdf", b"%PDF-1.4 body")),
        )
        .await
    }))
    .await;

    let mut ids = std::collections::HashSet::new();
    for resp in responses {
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(ids.insert(body["id"].as_i64().unwrap()));
    }
    assert_eq!(ids.len(), 10);

    let req = test::TestRequest::get().uri("/applicants").to_request();
    let resp = test::call_service(&app, req).await;
    let records: Vec<serde_json::Value> = test::read_body_json(resp).await;

    let keys: std::collections::HashSet<&str> = records
        .iter()
        .map(|r| r["resumeFile"].as_str().unwrap())
        .collect();
    assert_eq!(keys.len(), 10);
    assert_eq!(upload_dir_entries(&env).len(), 10);
}
