//! HTTP integration tests for the permission registry.
//!
//! Covers tier-scoped CRUD, window validation, the authority matrix
//! (manager everywhere, administrator inside the department, grantee on
//! assigned services only) and citizen set replacement.
//!
//! These tests require a running `PostgreSQL` instance with the schema
//! applied. Run with: `cargo test --test permissions_http_test -- --ignored`

mod helpers;

use axum::http::StatusCode;
use cam_server::permissions::ScopeTier;
use chrono::{Duration, Utc};
use helpers::{
    body_to_json, create_service_tree, create_test_citizen, create_test_permission,
    delete_citizen, delete_department_tree, gateway_token, make_administrator, make_manager,
    open_window, TestApp,
};
use serde_json::json;
use uuid::Uuid;

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_manager_creates_department_permission() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    let (named_cit, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let (department_id, _, _, _) = create_service_tree(&app.pool, resolver_cit).await;
    let (start, end) = open_window();

    let resp = app
        .post_json(
            "/api/manager/permissions/department",
            &gateway_token(manager_cit),
            &json!({
                "name": "Census week",
                "description": "Broad access during the census",
                "scope_target": department_id,
                "start_time": start,
                "end_time": end,
                "citizens": [named_cit],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_to_json(resp).await;
    assert_eq!(body["scope_tier"], "department");
    assert_eq!(body["active"], true);
    assert_eq!(body["citizens"].as_array().unwrap().len(), 1);

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, manager_cit).await;
    delete_citizen(&app.pool, named_cit).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_create_rejects_inverted_window() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let (department_id, _, _, _) = create_service_tree(&app.pool, resolver_cit).await;
    let now = Utc::now();

    let resp = app
        .post_json(
            "/api/manager/permissions/department",
            &gateway_token(manager_cit),
            &json!({
                "name": "Backwards",
                "scope_target": department_id,
                "start_time": now,
                "end_time": now - Duration::hours(1),
                "citizens": [manager_cit],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_to_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, manager_cit).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_create_rejects_unknown_target() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let (start, end) = open_window();

    let resp = app
        .post_json(
            "/api/manager/permissions/service",
            &gateway_token(manager_cit),
            &json!({
                "name": "Nowhere",
                "scope_target": Uuid::now_v7(),
                "start_time": start,
                "end_time": end,
                "citizens": [manager_cit],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_to_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");

    delete_citizen(&app.pool, manager_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_create_rejects_unknown_citizens() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let (department_id, _, service_id, _) = create_service_tree(&app.pool, resolver_cit).await;
    let (start, end) = open_window();

    let resp = app
        .post_json(
            "/api/manager/permissions/service",
            &gateway_token(manager_cit),
            &json!({
                "name": "Ghost list",
                "scope_target": service_id,
                "start_time": start,
                "end_time": end,
                "citizens": [Uuid::now_v7()],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, manager_cit).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

// ============================================================================
// Authority matrix
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_administrator_scoped_to_own_department() {
    let app = TestApp::new().await;
    let (admin_cit, _) = create_test_citizen(&app.pool).await;
    let (resolver_b, _) = create_test_citizen(&app.pool).await;

    let administrator_id = make_administrator(&app.pool, admin_cit).await;
    let own_dept = helpers::create_test_department(&app.pool, Some(administrator_id)).await;
    let (other_dept, _, _, _) = create_service_tree(&app.pool, resolver_b).await;
    let (start, end) = open_window();
    let token = gateway_token(admin_cit);

    // Own department: fine.
    let resp = app
        .post_json(
            "/api/admin/permissions/department",
            &token,
            &json!({
                "name": "Own turf",
                "scope_target": own_dept,
                "start_time": start,
                "end_time": end,
                "citizens": [admin_cit],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Someone else's department: forbidden.
    let resp = app
        .post_json(
            "/api/admin/permissions/department",
            &token,
            &json!({
                "name": "Land grab",
                "scope_target": other_dept,
                "start_time": start,
                "end_time": end,
                "citizens": [admin_cit],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = body_to_json(resp).await;
    assert_eq!(body["error"], "AUTHORIZATION_ERROR");

    delete_department_tree(&app.pool, own_dept).await;
    delete_department_tree(&app.pool, other_dept).await;
    delete_citizen(&app.pool, admin_cit).await;
    delete_citizen(&app.pool, resolver_b).await;
}

#[tokio::test]
#[ignore]
async fn test_grantee_limited_to_assigned_services() {
    let app = TestApp::new().await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    let (named_cit, _) = create_test_citizen(&app.pool).await;
    let (department_id, association_id, service_id, _) =
        create_service_tree(&app.pool, resolver_cit).await;
    // A second service in the association the grantee is NOT assigned to.
    let other_service = helpers::create_test_service(&app.pool, association_id).await;
    let (start, end) = open_window();
    let token = gateway_token(resolver_cit);

    // Assigned service: fine.
    let resp = app
        .post_json(
            "/api/grantee/permissions/service",
            &token,
            &json!({
                "name": "Evening window",
                "scope_target": service_id,
                "start_time": start,
                "end_time": end,
                "citizens": [named_cit],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Unassigned service: forbidden.
    let resp = app
        .post_json(
            "/api/grantee/permissions/service",
            &token,
            &json!({
                "name": "Not mine",
                "scope_target": other_service,
                "start_time": start,
                "end_time": end,
                "citizens": [named_cit],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Department tier is off limits altogether.
    let resp = app
        .get("/api/grantee/permissions/department", &token)
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, resolver_cit).await;
    delete_citizen(&app.pool, named_cit).await;
}

// ============================================================================
// Update and delete
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_update_flips_kill_switch_and_replaces_citizens() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    let (first_cit, _) = create_test_citizen(&app.pool).await;
    let (second_cit, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let (department_id, _, service_id, _) = create_service_tree(&app.pool, resolver_cit).await;
    let (start, end) = open_window();
    let permission_id = create_test_permission(
        &app.pool,
        ScopeTier::Service,
        service_id,
        &[first_cit],
        start,
        end,
        true,
    )
    .await;
    let token = gateway_token(manager_cit);

    let resp = app
        .patch_json(
            &format!("/api/manager/permissions/service/{permission_id}"),
            &token,
            &json!({
                "active": false,
                "citizens": [second_cit],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_to_json(resp).await;
    assert_eq!(body["active"], false);
    let citizens = body["citizens"].as_array().unwrap();
    assert_eq!(citizens.len(), 1);
    assert_eq!(
        citizens[0].as_str().unwrap(),
        second_cit.to_string(),
        "Citizen set is replaced wholesale, not merged"
    );

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, manager_cit).await;
    delete_citizen(&app.pool, first_cit).await;
    delete_citizen(&app.pool, second_cit).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_update_rejects_window_inversion_against_kept_bound() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let (department_id, _, service_id, _) = create_service_tree(&app.pool, resolver_cit).await;
    let (start, end) = open_window();
    let permission_id = create_test_permission(
        &app.pool,
        ScopeTier::Service,
        service_id,
        &[manager_cit],
        start,
        end,
        true,
    )
    .await;

    // New end before the existing start.
    let resp = app
        .patch_json(
            &format!("/api/manager/permissions/service/{permission_id}"),
            &gateway_token(manager_cit),
            &json!({"end_time": start - Duration::hours(1)}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, manager_cit).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_delete_permission_then_gone() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let (department_id, _, service_id, _) = create_service_tree(&app.pool, resolver_cit).await;
    let (start, end) = open_window();
    let permission_id = create_test_permission(
        &app.pool,
        ScopeTier::Service,
        service_id,
        &[manager_cit],
        start,
        end,
        true,
    )
    .await;
    let token = gateway_token(manager_cit);

    let resp = app
        .delete(
            &format!("/api/manager/permissions/service/{permission_id}"),
            &token,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .get(
            &format!("/api/manager/permissions/service/{permission_id}"),
            &token,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // The membership rows went with it.
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM permission_citizens WHERE permission_id = $1")
            .bind(permission_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(count.0, 0);

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, manager_cit).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_get_permission_respects_tier_in_path() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let (department_id, _, service_id, _) = create_service_tree(&app.pool, resolver_cit).await;
    let (start, end) = open_window();
    let permission_id = create_test_permission(
        &app.pool,
        ScopeTier::Service,
        service_id,
        &[manager_cit],
        start,
        end,
        true,
    )
    .await;
    let token = gateway_token(manager_cit);

    // Right tier resolves.
    let resp = app
        .get(
            &format!("/api/manager/permissions/service/{permission_id}"),
            &token,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // A service permission is not addressable as a department one.
    let resp = app
        .get(
            &format!("/api/manager/permissions/department/{permission_id}"),
            &token,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, manager_cit).await;
    delete_citizen(&app.pool, resolver_cit).await;
}
