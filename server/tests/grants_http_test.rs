//! HTTP integration tests for the grant ledger.
//!
//! Covers citizen-side visibility, extension and revocation with their
//! conflict semantics, and derived status in responses.
//!
//! These tests require a running `PostgreSQL` instance with the schema
//! applied. Run with: `cargo test --test grants_http_test -- --ignored`

mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use helpers::{
    body_to_json, create_service_tree, create_test_citizen, create_test_grant,
    create_test_request, delete_citizen, delete_department_tree, gateway_token, make_manager,
    mark_request_granted, TestApp,
};
use serde_json::json;
use uuid::Uuid;

// ============================================================================
// Citizen visibility
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_citizen_sees_own_grants_with_status() {
    let app = TestApp::new().await;
    let (citizen_id, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    let (department_id, _, service_id, grantee_id) =
        create_service_tree(&app.pool, resolver_cit).await;

    let request_id = create_test_request(&app.pool, citizen_id, service_id).await;
    mark_request_granted(&app.pool, request_id).await;
    let grant_id = create_test_grant(
        &app.pool,
        request_id,
        Some(grantee_id),
        Some(Utc::now() - Duration::hours(1)),
    )
    .await;
    let token = gateway_token(citizen_id);

    let resp = app.get("/api/grants", &token).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listed = body_to_json(resp).await;
    let entry = listed
        .as_array()
        .unwrap()
        .iter()
        .find(|g| g["id"] == grant_id.to_string().as_str())
        .expect("Own grant should be listed");
    assert_eq!(entry["status"], "expired", "End date in the past");

    let resp = app.get(&format!("/api/grants/{grant_id}"), &token).await;
    assert_eq!(resp.status(), StatusCode::OK);

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, citizen_id).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_foreign_grant_hidden_from_citizen() {
    let app = TestApp::new().await;
    let (owner_id, _) = create_test_citizen(&app.pool).await;
    let (snoop_id, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    let (department_id, _, service_id, grantee_id) =
        create_service_tree(&app.pool, resolver_cit).await;

    let request_id = create_test_request(&app.pool, owner_id, service_id).await;
    mark_request_granted(&app.pool, request_id).await;
    let grant_id = create_test_grant(&app.pool, request_id, Some(grantee_id), None).await;

    let resp = app
        .get(&format!("/api/grants/{grant_id}"), &gateway_token(snoop_id))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, owner_id).await;
    delete_citizen(&app.pool, snoop_id).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

// ============================================================================
// Extension
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_extend_replaces_end_policy() {
    let app = TestApp::new().await;
    let (citizen_id, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    let (department_id, _, service_id, grantee_id) =
        create_service_tree(&app.pool, resolver_cit).await;

    let request_id = create_test_request(&app.pool, citizen_id, service_id).await;
    mark_request_granted(&app.pool, request_id).await;
    // Already expired; the extension revives it.
    let grant_id = create_test_grant(
        &app.pool,
        request_id,
        Some(grantee_id),
        Some(Utc::now() - Duration::days(2)),
    )
    .await;
    let token = gateway_token(resolver_cit);

    let new_end = Utc::now() + Duration::days(30);
    let resp = app
        .post_json(
            &format!("/api/grantee/grants/{grant_id}/extend"),
            &token,
            &json!({"end_date": new_end}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_to_json(resp).await;
    assert_eq!(body["status"], "active");

    // To indefinite.
    let resp = app
        .post_json(
            &format!("/api/grantee/grants/{grant_id}/extend"),
            &token,
            &json!({"indefinite": true}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_to_json(resp).await;
    assert!(body["end_date"].is_null());
    assert_eq!(body["status"], "active");

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, citizen_id).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_extend_needs_exactly_one_end_policy() {
    let app = TestApp::new().await;
    let (citizen_id, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    let (department_id, _, service_id, grantee_id) =
        create_service_tree(&app.pool, resolver_cit).await;

    let request_id = create_test_request(&app.pool, citizen_id, service_id).await;
    mark_request_granted(&app.pool, request_id).await;
    let grant_id = create_test_grant(&app.pool, request_id, Some(grantee_id), None).await;
    let token = gateway_token(resolver_cit);

    let resp = app
        .post_json(
            &format!("/api/grantee/grants/{grant_id}/extend"),
            &token,
            &json!({}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .post_json(
            &format!("/api/grantee/grants/{grant_id}/extend"),
            &token,
            &json!({"end_date": Utc::now() + Duration::days(7), "indefinite": true}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_to_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, citizen_id).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_extend_rejects_end_before_start() {
    let app = TestApp::new().await;
    let (citizen_id, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    let (department_id, _, service_id, grantee_id) =
        create_service_tree(&app.pool, resolver_cit).await;

    let request_id = create_test_request(&app.pool, citizen_id, service_id).await;
    mark_request_granted(&app.pool, request_id).await;
    let grant_id = create_test_grant(&app.pool, request_id, Some(grantee_id), None).await;

    let resp = app
        .post_json(
            &format!("/api/grantee/grants/{grant_id}/extend"),
            &gateway_token(resolver_cit),
            &json!({"end_date": Utc::now() - Duration::days(30)}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, citizen_id).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

// ============================================================================
// Revocation
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_revoke_is_terminal() {
    let app = TestApp::new().await;
    let (citizen_id, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    let (department_id, _, service_id, grantee_id) =
        create_service_tree(&app.pool, resolver_cit).await;

    let request_id = create_test_request(&app.pool, citizen_id, service_id).await;
    mark_request_granted(&app.pool, request_id).await;
    let grant_id = create_test_grant(&app.pool, request_id, Some(grantee_id), None).await;
    let token = gateway_token(resolver_cit);

    let resp = app
        .post_empty(&format!("/api/grantee/grants/{grant_id}/revoke"), &token)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_to_json(resp).await;
    assert_eq!(body["status"], "declined");

    // The row survives in the ledger.
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM grants WHERE id = $1")
        .bind(grant_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count.0, 1);

    // Second revoke conflicts.
    let resp = app
        .post_empty(&format!("/api/grantee/grants/{grant_id}/revoke"), &token)
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = body_to_json(resp).await;
    assert_eq!(body["error"], "INVALID_STATE");

    // So does extending a declined grant.
    let resp = app
        .post_json(
            &format!("/api/grantee/grants/{grant_id}/extend"),
            &token,
            &json!({"indefinite": true}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, citizen_id).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

// ============================================================================
// Authority
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_grantee_cannot_touch_foreign_ledger_rows() {
    let app = TestApp::new().await;
    let (citizen_id, _) = create_test_citizen(&app.pool).await;
    let (resolver_a, _) = create_test_citizen(&app.pool).await;
    let (resolver_b, _) = create_test_citizen(&app.pool).await;

    // Grant lives under resolver A's service; resolver B runs a
    // different tree.
    let (dept_a, _, service_a, grantee_a) = create_service_tree(&app.pool, resolver_a).await;
    let (dept_b, _, _, _) = create_service_tree(&app.pool, resolver_b).await;
    let request_id = create_test_request(&app.pool, citizen_id, service_a).await;
    mark_request_granted(&app.pool, request_id).await;
    let grant_id = create_test_grant(&app.pool, request_id, Some(grantee_a), None).await;

    let resp = app
        .post_empty(
            &format!("/api/grantee/grants/{grant_id}/revoke"),
            &gateway_token(resolver_b),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    delete_department_tree(&app.pool, dept_a).await;
    delete_department_tree(&app.pool, dept_b).await;
    delete_citizen(&app.pool, citizen_id).await;
    delete_citizen(&app.pool, resolver_a).await;
    delete_citizen(&app.pool, resolver_b).await;
}

#[tokio::test]
#[ignore]
async fn test_detached_grant_answers_to_manager_only() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let (department_id, _, _, _) = create_service_tree(&app.pool, resolver_cit).await;

    // A ledger row with no owning request.
    let grant_id = Uuid::now_v7();
    sqlx::query(
        r"
        INSERT INTO grants (id, granted, decline, start_date)
        VALUES ($1, TRUE, FALSE, NOW())
        ",
    )
    .bind(grant_id)
    .execute(&app.pool)
    .await
    .unwrap();

    let resp = app
        .post_empty(
            &format!("/api/grantee/grants/{grant_id}/revoke"),
            &gateway_token(resolver_cit),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .post_empty(
            &format!("/api/manager/grants/{grant_id}/revoke"),
            &gateway_token(manager_cit),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    sqlx::query("DELETE FROM grants WHERE id = $1")
        .bind(grant_id)
        .execute(&app.pool)
        .await
        .ok();
    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, manager_cit).await;
    delete_citizen(&app.pool, resolver_cit).await;
}
