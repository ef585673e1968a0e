use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use db::models::check_in::Model as CheckInModel;
use serde::Serialize;
use services::checkin;
use services::history::{self, AttendanceStats};
use services::ledger;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize, Default)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub already_marked: bool,
    pub record: Option<CheckInModel>,
    pub stats: AttendanceStats,
}

/// GET /checkin/today
///
/// Today's attendance state for the authenticated student: whether a record
/// already exists, the record itself, and the history statistics shown on the
/// student home screen.
pub async fn today(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> impl IntoResponse {
    let date = checkin::server_today();

    let record = match ledger::find_for_day(state.db(), claims.sub, date).await {
        Ok(record) => record,
        Err(err) => {
            tracing::error!(error = %err, student_id = claims.sub, "today lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<TodayResponse>::error("Database error")),
            );
        }
    };

    let stats = match ledger::success_dates_before(state.db(), claims.sub, date).await {
        Ok(dates) => history::analyze(&dates, date),
        Err(err) => {
            tracing::error!(error = %err, student_id = claims.sub, "history lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<TodayResponse>::error("Database error")),
            );
        }
    };

    let response = TodayResponse {
        date,
        already_marked: record.is_some(),
        record,
        stats,
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            response,
            "Attendance state retrieved successfully",
        )),
    )
}
