//! HTTP integration tests for the resource tree.
//!
//! Covers the citizen directory (visibility filtering), department and
//! association CRUD with its authority rules, and grantee assignment on
//! services.
//!
//! These tests require a running `PostgreSQL` instance with the schema
//! applied. Run with: `cargo test --test catalog_http_test -- --ignored`

mod helpers;

use axum::http::StatusCode;
use helpers::{
    body_to_json, create_service_tree, create_test_association, create_test_citizen,
    create_test_department, create_test_service_with, delete_citizen, delete_department_tree,
    gateway_token, make_administrator, make_grantee, make_manager, TestApp,
};
use serde_json::json;
use uuid::Uuid;

// ============================================================================
// Citizen directory
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_directory_hides_invisible_services() {
    let app = TestApp::new().await;
    let (citizen_id, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    let (department_id, association_id, visible_service, _) =
        create_service_tree(&app.pool, resolver_cit).await;
    let hidden_service =
        create_test_service_with(&app.pool, association_id, false, false).await;
    let token = gateway_token(citizen_id);

    let resp = app.get("/api/services", &token).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listed = body_to_json(resp).await;
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&visible_service.to_string().as_str()));
    assert!(!ids.contains(&hidden_service.to_string().as_str()));

    // Fetching the hidden one by ID is a plain miss.
    let resp = app
        .get(&format!("/api/services/{hidden_service}"), &token)
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, citizen_id).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_directory_lists_departments() {
    let app = TestApp::new().await;
    let (citizen_id, _) = create_test_citizen(&app.pool).await;
    let department_id = create_test_department(&app.pool, None).await;

    let resp = app.get("/api/departments", &gateway_token(citizen_id)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listed = body_to_json(resp).await;
    assert!(listed
        .as_array()
        .unwrap()
        .iter()
        .any(|d| d["id"] == department_id.to_string().as_str()));

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, citizen_id).await;
}

// ============================================================================
// Department CRUD
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_manager_department_lifecycle() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let token = gateway_token(manager_cit);
    let tag = &Uuid::now_v7().to_string()[24..];

    let resp = app
        .post_json(
            "/api/manager/departments",
            &token,
            &json!({
                "title": format!("Transport {tag}"),
                "description": "Roads and rail",
                "email": format!("transport_{tag}@example.test"),
                "telephone": format!("+1800{tag}"),
                "website": format!("https://transport-{tag}.example.test"),
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_to_json(resp).await;
    let department_id = created["id"].as_str().unwrap().to_string();
    assert!(created["administrator_id"].is_null());

    // Duplicate title is refused.
    let resp = app
        .post_json(
            "/api/manager/departments",
            &token,
            &json!({
                "title": format!("Transport {tag}"),
                "description": "Copycat",
                "email": format!("other_{tag}@example.test"),
                "telephone": format!("+1801{tag}"),
                "website": format!("https://other-{tag}.example.test"),
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Empty department deletes cleanly.
    let resp = app
        .delete(&format!("/api/manager/departments/{department_id}"), &token)
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    delete_citizen(&app.pool, manager_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_delete_department_with_children_conflicts() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let (department_id, _, _, _) = create_service_tree(&app.pool, resolver_cit).await;

    let resp = app
        .delete(
            &format!("/api/manager/departments/{department_id}"),
            &gateway_token(manager_cit),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = body_to_json(resp).await;
    assert_eq!(body["error"], "INVALID_STATE");

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, manager_cit).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

// ============================================================================
// Administrator scoping
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_administrator_creates_association_in_own_department_only() {
    let app = TestApp::new().await;
    let (admin_cit, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    let administrator_id = make_administrator(&app.pool, admin_cit).await;
    let own_dept = create_test_department(&app.pool, Some(administrator_id)).await;
    let (other_dept, _, _, _) = create_service_tree(&app.pool, resolver_cit).await;
    let token = gateway_token(admin_cit);
    let tag = &Uuid::now_v7().to_string()[24..];

    let resp = app
        .post_json(
            "/api/admin/associations",
            &token,
            &json!({
                "title": format!("Registry office {tag}"),
                "email": format!("registry_{tag}@example.test"),
                "department_id": own_dept,
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .post_json(
            "/api/admin/associations",
            &token,
            &json!({
                "title": format!("Encroachment {tag}"),
                "email": format!("encroach_{tag}@example.test"),
                "department_id": other_dept,
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    delete_department_tree(&app.pool, own_dept).await;
    delete_department_tree(&app.pool, other_dept).await;
    delete_citizen(&app.pool, admin_cit).await;
    delete_citizen(&app.pool, resolver_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_administrator_without_department_rejected() {
    let app = TestApp::new().await;
    let (admin_cit, _) = create_test_citizen(&app.pool).await;
    // Role record exists, but no department names it.
    make_administrator(&app.pool, admin_cit).await;

    let resp = app.get("/api/admin/department", &gateway_token(admin_cit)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = body_to_json(resp).await;
    assert_eq!(body["error"], "AUTHORIZATION_ERROR");

    delete_citizen(&app.pool, admin_cit).await;
}

// ============================================================================
// Grantee assignment
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_assign_and_remove_grantee() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    let (resolver_cit, _) = create_test_citizen(&app.pool).await;
    let (second_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let (department_id, association_id, service_id, _) =
        create_service_tree(&app.pool, resolver_cit).await;
    let second_grantee = make_grantee(&app.pool, second_cit, association_id).await;
    let token = gateway_token(manager_cit);

    let resp = app
        .post_json(
            &format!("/api/manager/services/{service_id}/grantees"),
            &token,
            &json!({"grantee_id": second_grantee}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM service_grantees WHERE service_id = $1 AND grantee_id = $2",
    )
    .bind(service_id)
    .bind(second_grantee)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(count.0, 1);

    let resp = app
        .delete(
            &format!("/api/manager/services/{service_id}/grantees/{second_grantee}"),
            &token,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Removing an assignment that is not there is a miss.
    let resp = app
        .delete(
            &format!("/api/manager/services/{service_id}/grantees/{second_grantee}"),
            &token,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    delete_department_tree(&app.pool, department_id).await;
    delete_citizen(&app.pool, manager_cit).await;
    delete_citizen(&app.pool, resolver_cit).await;
    delete_citizen(&app.pool, second_cit).await;
}

#[tokio::test]
#[ignore]
async fn test_association_create_under_unknown_department() {
    let app = TestApp::new().await;
    let (manager_cit, _) = create_test_citizen(&app.pool).await;
    make_manager(&app.pool, manager_cit).await;
    let tag = &Uuid::now_v7().to_string()[24..];

    let resp = app
        .post_json(
            "/api/manager/associations",
            &gateway_token(manager_cit),
            &json!({
                "title": format!("Orphan {tag}"),
                "email": format!("orphan_{tag}@example.test"),
                "department_id": Uuid::now_v7(),
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    delete_citizen(&app.pool, manager_cit).await;
}
