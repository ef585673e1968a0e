use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod get;
pub mod post;

pub fn checkin_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(post::mark))
        .route("/today", get(get::today))
}
