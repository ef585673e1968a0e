use api::{routes::routes, state::AppState};
use axum::{Router, body::Body, http::Request, http::header::CONTENT_TYPE, response::Response};
use common::config::AppConfig;
use sea_orm::DatabaseConnection;
use serde_json::Value;

/// Builds a router over a fresh in-memory database, with the configuration
/// pinned to known test values.
pub async fn make_test_app() -> (Router, DatabaseConnection) {
    // Satisfy required config vars without relying on a .env file.
    unsafe {
        std::env::set_var("DATABASE_PATH", ":memory:");
        std::env::set_var("JWT_SECRET", "test-secret");
    }
    AppConfig::set_jwt_secret("test-secret");
    AppConfig::set_geofence(45.01, 78.22, 400.0);
    AppConfig::set_checkin_late_after(None);
    AppConfig::set_default_locale("ru");

    let db = db::test_utils::setup_test_db().await;
    let app_state = AppState::new(db.clone());
    let router = Router::new().nest("/api", routes(app_state));

    (router, db)
}

pub async fn get_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub fn json_request(method: &str, uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

pub fn authed_json_request(method: &str, uri: &str, token: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(payload.to_string()))
        .unwrap()
}

pub fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}
