//! HTTP-level integration tests for funding document requests.

mod common;

use axum::http::StatusCode;
use common::{
    attach_report_fixture, body_bytes, body_json, build_test_app, create_application, create_user,
    error_code, get_auth, post_json_auth, post_multipart_auth, put_json_auth, schedule_tna,
    TestApp,
};
use mimaropa_core::funding::DEFAULT_REQUIRED_DOCUMENTS;
use mimaropa_core::notification::NotificationKind;
use mimaropa_db::models::user::User;
use mimaropa_db::repositories::FundingRequestRepo;
use mimaropa_events::Recipient;
use serde_json::json;
use sqlx::PgPool;

const PERMIT_PDF: &[u8] = b"%PDF-1.4 mayor's permit";

struct Parties {
    proponent: User,
    psto: User,
    dost: User,
    tna_id: i64,
}

/// A Palawan proponent whose TNA has an uploaded report.
async fn eligible_tna(pool: &PgPool) -> Parties {
    let proponent = create_user(pool, "owner@cashew.ph", "proponent", Some("Palawan")).await;
    let psto = create_user(pool, "psto@palawan.dost.gov.ph", "psto", Some("Palawan")).await;
    let dost = create_user(pool, "rd@dost.gov.ph", "dost_mimaropa", None).await;
    let application = create_application(pool, &proponent).await;
    let tna = schedule_tna(pool, &application, &psto).await;
    attach_report_fixture(pool, tna.id, psto.id).await;
    Parties {
        proponent,
        psto,
        dost,
        tna_id: tna.id,
    }
}

/// Request the default documents and return the new request's id.
async fn request_defaults(app: &TestApp, requester: &User, tna_id: i64) -> i64 {
    let response = post_json_auth(
        app.app(),
        "/api/v1/funding-requests",
        &app.token(requester),
        json!({ "tna_id": tna_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn set_request_status(pool: &PgPool, id: i64, status: &str) {
    sqlx::query("UPDATE funding_document_requests SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// RequestDocuments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn request_documents_seeds_default_list(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let mut app = build_test_app(pool.clone());

    let response = post_json_auth(
        app.app(),
        "/api/v1/funding-requests",
        &app.token(&parties.psto),
        json!({ "tna_id": parties.tna_id, "due_date": "2025-03-01" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "documents_requested");
    assert_eq!(json["data"]["requested_by"], parties.psto.id);
    assert_eq!(json["data"]["proponent_id"], parties.proponent.id);
    assert_eq!(json["data"]["due_date"], "2025-03-01");

    let docs = json["data"]["funding_documents"].as_array().unwrap();
    assert_eq!(docs.len(), DEFAULT_REQUIRED_DOCUMENTS.len());
    for (doc, (doc_type, _)) in docs.iter().zip(DEFAULT_REQUIRED_DOCUMENTS) {
        assert_eq!(doc["type"], *doc_type);
        assert_eq!(doc["document_status"], "pending");
    }

    let events = app.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::DocumentsRequested);
    assert_eq!(events[0].recipients, vec![Recipient::User(parties.proponent.id)]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn request_documents_with_custom_list(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let app = build_test_app(pool);

    let body = json!({
        "tna_id": parties.tna_id,
        "documents": [
            { "type": "business_permit", "name": "Mayor's Permit" },
            { "type": "dti_registration", "name": "DTI Registration" },
        ],
    });
    let response =
        post_json_auth(app.app(), "/api/v1/funding-requests", &app.token(&parties.dost), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let docs = json["data"]["funding_documents"].as_array().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[1]["type"], "dti_registration");
    assert_eq!(docs[1]["name"], "DTI Registration");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_request_for_same_tna_conflicts(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let app = build_test_app(pool.clone());
    request_defaults(&app, &parties.psto, parties.tna_id).await;

    let response = post_json_auth(
        app.app(),
        "/api/v1/funding-requests",
        &app.token(&parties.dost),
        json!({ "tna_id": parties.tna_id }),
    )
    .await;
    let (code, _) = error_code(response, StatusCode::CONFLICT).await;
    assert_eq!(code, "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn request_requires_uploaded_report(pool: PgPool) {
    let proponent = create_user(&pool, "owner@cashew.ph", "proponent", Some("Palawan")).await;
    let psto = create_user(&pool, "psto@palawan.dost.gov.ph", "psto", Some("Palawan")).await;
    let application = create_application(&pool, &proponent).await;
    let tna = schedule_tna(&pool, &application, &psto).await;
    let app = build_test_app(pool.clone());

    let response = post_json_auth(
        app.app(),
        "/api/v1/funding-requests",
        &app.token(&psto),
        json!({ "tna_id": tna.id }),
    )
    .await;
    let (code, _) = error_code(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(code, "INVALID_STATE");
    assert!(FundingRequestRepo::find_by_tna_id(&pool, tna.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn request_is_scoped_and_role_checked(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let romblon = create_user(&pool, "psto@romblon.dost.gov.ph", "psto", Some("Romblon")).await;
    let app = build_test_app(pool);
    let body = json!({ "tna_id": parties.tna_id });

    let response =
        post_json_auth(app.app(), "/api/v1/funding-requests", &app.token(&romblon), body.clone())
            .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(
        app.app(),
        "/api/v1/funding-requests",
        &app.token(&parties.proponent),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_requests_documents_without_province(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let admin = create_user(&pool, "admin@dost.gov.ph", "admin", None).await;
    let app = build_test_app(pool);

    let id = request_defaults(&app, &admin, parties.tna_id).await;

    let response = get_auth(
        app.app(),
        &format!("/api/v1/funding-requests/{id}"),
        &app.token(&admin),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["requested_by"], admin.id);
    assert_eq!(json["data"]["status"], "documents_requested");
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn submit_review_and_download_document(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let mut app = build_test_app(pool.clone());
    let id = request_defaults(&app, &parties.psto, parties.tna_id).await;
    app.drain_events();

    let uri = format!("/api/v1/funding-requests/{id}/documents");
    let response = post_multipart_auth(
        app.app(),
        &uri,
        &app.token(&parties.proponent),
        &[("type", "business_permit")],
        Some(("permit.pdf", PERMIT_PDF)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "documents_requested");
    let doc = &json["data"]["funding_documents"][2];
    assert_eq!(doc["document_status"], "submitted");
    assert_eq!(doc["original_name"], "permit.pdf");

    let events = app.drain_events();
    assert_eq!(events[0].kind, NotificationKind::DocumentSubmitted);
    assert_eq!(events[0].recipients, vec![Recipient::User(parties.psto.id)]);

    let uri = format!("/api/v1/funding-requests/{id}/documents/2/review");
    let response = put_json_auth(
        app.app(),
        &uri,
        &app.token(&parties.dost),
        json!({ "status": "approved", "comments": "Valid until December" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let doc = &json["data"]["funding_documents"][2];
    assert_eq!(doc["document_status"], "approved");
    assert_eq!(doc["review_comments"], "Valid until December");
    assert_eq!(doc["reviewed_by"], parties.dost.id);
    assert_eq!(json["data"]["status"], "documents_requested");

    let events = app.drain_events();
    assert_eq!(events[0].kind, NotificationKind::DocumentReviewed);
    assert_eq!(events[0].recipients, vec![Recipient::User(parties.proponent.id)]);

    let uri = format!("/api/v1/funding-requests/{id}/documents/2/download");
    let response = get_auth(app.app(), &uri, &app.token(&parties.psto)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, PERMIT_PDF);

    let uri = format!("/api/v1/funding-requests/{id}/documents/0/download");
    let response = get_auth(app.app(), &uri, &app.token(&parties.psto)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn submit_appends_unlisted_document_type(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let app = build_test_app(pool);
    let id = request_defaults(&app, &parties.psto, parties.tna_id).await;

    let uri = format!("/api/v1/funding-requests/{id}/documents");
    let response = post_multipart_auth(
        app.app(),
        &uri,
        &app.token(&parties.proponent),
        &[("document_type", "bir_registration"), ("name", "BIR Form 2303")],
        Some(("bir.pdf", b"%PDF-1.4 bir")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let docs = json["data"]["funding_documents"].as_array().unwrap();
    assert_eq!(docs.len(), DEFAULT_REQUIRED_DOCUMENTS.len() + 1);
    assert_eq!(docs.last().unwrap()["name"], "BIR Form 2303");
    assert_eq!(docs.last().unwrap()["document_status"], "submitted");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_owner_can_submit(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let stranger = create_user(&pool, "other@cashew.ph", "proponent", Some("Palawan")).await;
    let app = build_test_app(pool);
    let id = request_defaults(&app, &parties.psto, parties.tna_id).await;

    let uri = format!("/api/v1/funding-requests/{id}/documents");
    let response = post_multipart_auth(
        app.app(),
        &uri,
        &app.token(&stranger),
        &[("type", "business_permit")],
        Some(("permit.pdf", PERMIT_PDF)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(std::fs::read_dir(app.uploads.path()).unwrap().count(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn submit_rejected_once_request_is_under_review(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let app = build_test_app(pool.clone());
    let id = request_defaults(&app, &parties.psto, parties.tna_id).await;
    set_request_status(&pool, id, "documents_under_review").await;

    let uri = format!("/api/v1/funding-requests/{id}/documents");
    let response = post_multipart_auth(
        app.app(),
        &uri,
        &app.token(&parties.proponent),
        &[("type", "business_permit")],
        Some(("permit.pdf", PERMIT_PDF)),
    )
    .await;
    let (code, _) = error_code(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(code, "INVALID_STATE");
    assert_eq!(std::fs::read_dir(app.uploads.path()).unwrap().count(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_requires_submitted_document(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let app = build_test_app(pool);
    let id = request_defaults(&app, &parties.psto, parties.tna_id).await;
    let token = app.token(&parties.dost);

    let uri = format!("/api/v1/funding-requests/{id}/documents/0/review");
    let response = put_json_auth(app.app(), &uri, &token, json!({ "status": "approved" })).await;
    let (code, message) = error_code(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(code, "INVALID_STATE");
    assert_eq!(message, "Document must be submitted before it can be reviewed");

    let uri = format!("/api/v1/funding-requests/{id}/documents/42/review");
    let response = put_json_auth(app.app(), &uri, &token, json!({ "status": "approved" })).await;
    let (code, _) = error_code(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(code, "VALIDATION_ERROR");

    let uri = format!("/api/v1/funding-requests/{id}/documents/0/review");
    let response = put_json_auth(
        app.app(),
        &uri,
        &app.token(&parties.psto),
        json!({ "status": "approved" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Request-level status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_moves_only_through_explicit_actions(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let mut app = build_test_app(pool.clone());
    let id = request_defaults(&app, &parties.psto, parties.tna_id).await;
    app.drain_events();
    let uri = format!("/api/v1/funding-requests/{id}/status");
    let dost = app.token(&parties.dost);

    let response = put_json_auth(app.app(), &uri, &dost, json!({ "action": "start_review" })).await;
    let (code, message) = error_code(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(code, "INVALID_STATE");
    assert_eq!(message, "Documents must be submitted before review can start");

    let response = put_json_auth(
        app.app(),
        &uri,
        &app.token(&parties.proponent),
        json!({ "action": "mark_submitted" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "documents_submitted");

    let events = app.drain_events();
    assert_eq!(events[0].kind, NotificationKind::DocumentSubmitted);
    assert_eq!(events[0].recipients, vec![Recipient::User(parties.psto.id)]);

    for (action, expected) in [
        ("start_review", "documents_under_review"),
        ("approve", "documents_approved"),
        ("complete_funding", "funding_completed"),
    ] {
        let response = put_json_auth(app.app(), &uri, &dost, json!({ "action": action })).await;
        assert_eq!(response.status(), StatusCode::OK, "{action}");
        assert_eq!(body_json(response).await["data"]["status"], expected);
    }

    let events = app.drain_events();
    assert_eq!(events.len(), 3);
    assert!(events
        .iter()
        .all(|e| e.recipients == vec![Recipient::User(parties.proponent.id)]));

    let stored = FundingRequestRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(stored.status, "funding_completed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_actions_are_role_checked(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let stranger = create_user(&pool, "other@cashew.ph", "proponent", Some("Palawan")).await;
    let app = build_test_app(pool.clone());
    let id = request_defaults(&app, &parties.psto, parties.tna_id).await;
    let uri = format!("/api/v1/funding-requests/{id}/status");

    let response = put_json_auth(
        app.app(),
        &uri,
        &app.token(&stranger),
        json!({ "action": "mark_submitted" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    set_request_status(&pool, id, "documents_submitted").await;
    let response = put_json_auth(
        app.app(),
        &uri,
        &app.token(&parties.psto),
        json!({ "action": "start_review" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(
        app.app(),
        &uri,
        &app.token(&parties.dost),
        json!({ "action": "fast_track" }),
    )
    .await;
    let (code, _) = error_code(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(code, "VALIDATION_ERROR");

    let stored = FundingRequestRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(stored.status, "documents_submitted");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_and_get_are_scoped(pool: PgPool) {
    let parties = eligible_tna(&pool).await;
    let stranger = create_user(&pool, "other@cashew.ph", "proponent", Some("Palawan")).await;
    let romblon = create_user(&pool, "psto@romblon.dost.gov.ph", "psto", Some("Romblon")).await;
    let app = build_test_app(pool);
    let id = request_defaults(&app, &parties.psto, parties.tna_id).await;

    for (user, expected) in [
        (&parties.proponent, 1),
        (&parties.psto, 1),
        (&parties.dost, 1),
        (&stranger, 0),
        (&romblon, 0),
    ] {
        let json = body_json(
            get_auth(app.app(), "/api/v1/funding-requests", &app.token(user)).await,
        )
        .await;
        assert_eq!(json["data"].as_array().unwrap().len(), expected, "{}", user.email);
    }

    let uri = format!("/api/v1/funding-requests/{id}");
    let response = get_auth(app.app(), &uri, &app.token(&parties.proponent)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = get_auth(app.app(), &uri, &app.token(&stranger)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = get_auth(app.app(), &uri, &app.token(&romblon)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(
        app.app(),
        "/api/v1/funding-requests?status=funding_completed",
        &app.token(&parties.dost),
    )
    .await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}
