//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness probe (public)
//! - `/auth` → login and device binding (public)
//! - `/checkin` → daily check-in and today view (authenticated students)
//! - `/admin` → attendance dashboard (admin-only)

use axum::{Router, middleware::from_fn};

use crate::auth::guards::{allow_admin, allow_authenticated};
use crate::routes::{
    admin::admin_routes, auth::auth_routes, checkin::checkin_routes, health::health_routes,
};
use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod checkin;
pub mod health;

/// Builds the application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .nest(
            "/checkin",
            checkin_routes().route_layer(from_fn(allow_authenticated)),
        )
        .nest("/admin", admin_routes().route_layer(from_fn(allow_admin)))
        .with_state(app_state)
}
