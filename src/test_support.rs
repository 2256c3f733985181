use std::path::Path;
use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower::ServiceExt;

use crate::api;
use crate::core::{config::Settings, security, state::AppState};
use crate::db::types::UserRole;

const TEST_SECRET_KEY: &str = "test-secret";
pub(crate) const TEST_TEACHER_PASSWORD: &str = "giaovien-test";
pub(crate) const TEST_CLASS_PASSWORDS: &str = "10A1:lop10a1,10A2:lop10a2";

/// Three-part exam with one question per part. Question ids are `1`, `2`, `3`.
pub(crate) const SAMPLE_EXAM_TEXT: &str = "\
Phần 1: Trắc nghiệm nhiều lựa chọn
Câu 1: 2 + 2 bằng bao nhiêu?
A. 3
B. 4
C. 5
D. 6
Phần 2: Đúng/Sai
Câu 2: Xét các mệnh đề sau
a) 2 là số chẵn
b) 3 là số chẵn
Phần 3: Trả lời ngắn
Câu 3: Tính 3 x 3
";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    _dir: TempDir,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env(data_dir: &Path) {
    std::env::set_var("KIEMTRA_ENV", "test");
    std::env::set_var("KIEMTRA_STRICT_CONFIG", "0");
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::set_var("DATA_DIR", data_dir);
    std::env::set_var("TEACHER_PASSWORD", TEST_TEACHER_PASSWORD);
    std::env::set_var("CLASS_PASSWORDS", TEST_CLASS_PASSWORDS);
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("DEFAULT_TIME_MINUTES");
    std::env::remove_var("MAX_UPLOAD_SIZE_MB");
    std::env::remove_var("API_V1_STR");
    std::env::remove_var("PROJECT_NAME");
}

pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    let dir = tempfile::tempdir().expect("tempdir");
    set_test_env(dir.path());

    let settings = Settings::load().expect("settings");
    let data_dir = crate::db::init_data_dir(&settings).await.expect("data dir");

    let state = AppState::new(settings, data_dir);
    let app = api::router::router(state.clone());

    TestContext { state, app, _dir: dir, _guard: guard }
}

pub(crate) fn teacher_token(settings: &Settings) -> String {
    security::create_access_token(UserRole::Teacher, None, settings, None).expect("token")
}

pub(crate) fn student_token(settings: &Settings, class_name: &str) -> String {
    security::create_access_token(UserRole::Student, Some(class_name), settings, None)
        .expect("token")
}

/// Uploads `SAMPLE_EXAM_TEXT` as a teacher and returns the new exam id.
pub(crate) async fn upload_sample_exam(ctx: &TestContext, options: serde_json::Value) -> String {
    let token = teacher_token(ctx.state.settings());
    let mut body = json!({"originalName": "de-kiem-tra.docx", "text": SAMPLE_EXAM_TEXT});
    if let (Some(body), Some(options)) = (body.as_object_mut(), options.as_object()) {
        body.extend(options.clone());
    }

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/exams/upload", Some(&token), Some(body)))
        .await
        .expect("upload exam");
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);

    let body = read_json(response).await;
    body["examId"].as_str().expect("exam id").to_string()
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
