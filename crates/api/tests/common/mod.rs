#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use chrono::{NaiveDate, Utc};
use http_body_util::BodyExt;
use mimaropa_core::attachment::FileAttachment;
use mimaropa_core::tna::AssessmentTeamMember;
use mimaropa_db::models::application::{Application, CreateApplication};
use mimaropa_db::models::tna::{NewTna, Tna};
use mimaropa_db::models::user::{CreateUser, User};
use mimaropa_db::repositories::{ApplicationRepo, TnaRepo, UserRepo};
use mimaropa_events::{EventBus, NotificationEvent};
use sqlx::PgPool;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tower::ServiceExt;

use mimaropa_api::auth::jwt::{generate_access_token, JwtConfig};
use mimaropa_api::auth::password::hash_password;
use mimaropa_api::config::ServerConfig;
use mimaropa_api::router::build_app_router;
use mimaropa_api::state::AppState;

pub const TEST_PASSWORD: &str = "mimaropa-test-password";

const BOUNDARY: &str = "----mimaropa-test-boundary";

/// Build a test `ServerConfig` with safe defaults and uploads under `uploads_dir`.
pub fn test_config(uploads_dir: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        uploads_dir: uploads_dir.to_string(),
        max_upload_bytes: 1024 * 1024,
        jwt: JwtConfig {
            secret: "integration-test-secret-that-is-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// The application under test plus handles for inspecting side effects.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    /// Receives every notification the handlers emit.
    pub events: broadcast::Receiver<NotificationEvent>,
    pub uploads: TempDir,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn token(&self, user: &User) -> String {
        generate_access_token(user.id, &user.role, &self.state.config.jwt)
            .expect("token generation should succeed")
    }

    /// Every notification emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<NotificationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Build the full application router, using the same middleware stack as
/// `main.rs`.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let uploads = tempfile::tempdir().expect("tempdir should be created");
    let config = test_config(uploads.path().to_str().expect("utf-8 temp path"));
    let event_bus = Arc::new(EventBus::default());
    let events = event_bus.subscribe();

    let state = AppState::new(pool, config.clone(), event_bus);
    let router = build_app_router(state.clone(), &config);

    TestApp {
        router,
        state,
        events,
        uploads,
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &PgPool, email: &str, role: &str, province: Option<&str>) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
            first_name: "Test".to_string(),
            last_name: role.to_string(),
            role: role.to_string(),
            province: province.map(str::to_string),
        },
    )
    .await
    .expect("user creation should succeed")
}

pub async fn create_application(pool: &PgPool, proponent: &User) -> Application {
    ApplicationRepo::create(
        pool,
        proponent.id,
        &CreateApplication {
            program_name: "SETUP".to_string(),
            enterprise_name: "Puerto Princesa Cashew Processors".to_string(),
        },
    )
    .await
    .expect("application creation should succeed")
}

/// Schedule a TNA directly through the repository.
pub async fn schedule_tna(pool: &PgPool, application: &Application, scheduler: &User) -> Tna {
    TnaRepo::schedule(
        pool,
        &NewTna {
            application_id: application.id,
            proponent_id: application.proponent_id,
            scheduled_by: scheduler.id,
            program_name: application.program_name.clone(),
            scheduled_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            scheduled_time: "09:00".to_string(),
            location: "Town Hall".to_string(),
            contact_person: None,
            contact_phone: None,
            email: None,
            assessment_team: vec![AssessmentTeamMember {
                name: "Engr. Santos".to_string(),
                email: None,
                phone: None,
            }],
            notes: None,
        },
    )
    .await
    .expect("scheduling should succeed")
}

/// Force a TNA into `status` without going through the workflow.
pub async fn set_tna_status(pool: &PgPool, id: i64, status: &str) {
    sqlx::query("UPDATE tnas SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await
        .expect("status update should succeed");
}

/// Move a TNA to `report_uploaded` with report metadata whose file is not on
/// disk.
pub async fn attach_report_fixture(pool: &PgPool, tna_id: i64, uploaded_by: i64) -> Tna {
    set_tna_status(pool, tna_id, "completed").await;
    let report = FileAttachment {
        filename: format!("tna-report-fixture-{tna_id}.pdf"),
        original_name: "fixture.pdf".to_string(),
        path: format!("uploads/tna-report-fixture-{tna_id}.pdf"),
        size: 3,
        mimetype: "application/pdf".to_string(),
        uploaded_at: Utc::now(),
        uploaded_by,
    };
    TnaRepo::attach_report(
        pool,
        tna_id,
        "completed",
        "report_uploaded",
        &report,
        None,
        None,
        uploaded_by,
    )
    .await
    .expect("report attach should succeed")
    .expect("TNA should be completed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Read the full response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("response body should be valid JSON")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should complete")
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, builder(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        builder(Method::GET, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        builder(method, uri, token)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, None, body).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::POST, uri, Some(token), body).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::PUT, uri, Some(token), body).await
}

pub async fn put_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        builder(Method::PUT, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        builder(Method::POST, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

/// POST a multipart form with text `fields` and an optional `(filename, bytes)` file part.
pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Response<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    send(
        app,
        builder(Method::POST, uri, Some(token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

/// Assert the standard error envelope and return its `code`.
pub async fn error_code(response: Response<Body>, expected: StatusCode) -> (String, String) {
    assert_eq!(response.status(), expected);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    (
        json["code"].as_str().unwrap_or_default().to_string(),
        json["error"].as_str().unwrap_or_default().to_string(),
    )
}
