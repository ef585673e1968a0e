use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use services::checkin;
use services::report::{self, GroupPresence};

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Default)]
pub struct DashboardResponse {
    pub date: NaiveDate,
    pub groups: Vec<GroupPresence>,
    pub total_students: i64,
    pub total_present: i64,
}

/// GET /admin/dashboard?date=YYYY-MM-DD
///
/// Per-group attendance for the given date (defaults to today): total active
/// students and how many have a success record, plus grand totals. Read-only.
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    let date = query.date.unwrap_or_else(checkin::server_today);

    match report::group_presence(state.db(), date).await {
        Ok(groups) => {
            let total_students = groups.iter().map(|g| g.total).sum();
            let total_present = groups.iter().map(|g| g.present).sum();

            let response = DashboardResponse {
                date,
                groups,
                total_students,
                total_present,
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    response,
                    "Dashboard retrieved successfully",
                )),
            )
        }
        Err(err) => {
            tracing::error!(error = %err, %date, "dashboard aggregation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<DashboardResponse>::error("Database error")),
            )
        }
    }
}
