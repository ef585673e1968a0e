use axum::{Router, routing::get};

use crate::state::AppState;

pub mod get;

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(get::dashboard))
}
