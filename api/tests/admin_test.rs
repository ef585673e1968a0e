mod helpers;

use api::auth::generate_jwt;
use chrono::NaiveDate;
use axum::http::StatusCode;
use db::models::check_in::Status;
use db::models::user::Model as UserModel;
use helpers::app::{authed_get, get_json_body, make_test_app};
use serde_json::json;
use serial_test::serial;
use services::ledger;
use tower::ServiceExt;

fn day(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// Test Case: the dashboard aggregates per-group presence for a date
#[tokio::test]
#[serial]
async fn test_dashboard_counts() {
    let (app, db) = make_test_app().await;

    let admin = UserModel::create(&db, "root", "Head Curator", "admin123", None, true)
        .await
        .unwrap();
    let a1 = UserModel::create(&db, "a1", "A One", "pw", Some("IS-21"), false)
        .await
        .unwrap();
    UserModel::create(&db, "a2", "A Two", "pw", Some("IS-21"), false)
        .await
        .unwrap();
    let b1 = UserModel::create(&db, "b1", "B One", "pw", Some("CS-11"), false)
        .await
        .unwrap();

    let date = day("2026-03-02");
    for id in [a1.id, b1.id] {
        ledger::record_success(&db, id, date, Status::OnTime, 45.01, 78.22, "dev", "ok")
            .await
            .unwrap();
    }

    let (token, _) = generate_jwt(admin.id, admin.admin);
    let response = app
        .clone()
        .oneshot(authed_get("/api/admin/dashboard?date=2026-03-02", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = get_json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["date"], "2026-03-02");
    assert_eq!(body["data"]["total_students"], 3);
    assert_eq!(body["data"]["total_present"], 2);
    assert_eq!(
        body["data"]["groups"],
        json!([
            {"group_name": "CS-11", "total": 1, "present": 1},
            {"group_name": "IS-21", "total": 2, "present": 1},
        ])
    );
}

/// Test Case: students cannot reach the dashboard
#[tokio::test]
#[serial]
async fn test_dashboard_requires_admin() {
    let (app, db) = make_test_app().await;

    let student = UserModel::create(&db, "a1", "A One", "pw", Some("IS-21"), false)
        .await
        .unwrap();
    let (token, _) = generate_jwt(student.id, student.admin);

    let response = app
        .clone()
        .oneshot(authed_get("/api/admin/dashboard", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
