use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Local, Utc};
use common::{config, format_validation_errors};
use db::models::check_in::Status;
use serde::Deserialize;
use services::checkin::{self, CheckInError, CheckInRequest, CheckInResponse, Outcome};
use services::feedback::Locale;
use services::geofence::GeofenceConfig;
use validator::Validate;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckInBody {
    #[validate(length(min = 1, message = "Device id is required"))]
    pub device_id: String,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub client_timestamp: Option<DateTime<Utc>>,
    pub lang: Option<String>,
}

/// POST /checkin
///
/// Record today's attendance for the authenticated student.
///
/// ### Request Body
/// ```json
/// {
///   "device_id": "4f9d…",
///   "latitude": 45.0102,
///   "longitude": 78.2199,
///   "lang": "ru"
/// }
/// ```
///
/// ### Responses
///
/// - `200 OK` — outcome `success_on_time`, `success_late` or `duplicate`;
///   `data` carries the outcome, the feedback message and the ledger record.
/// - `400 Bad Request` — missing/invalid coordinates, or `out_of_range`.
/// - `403 Forbidden` — `device_rejected`: the request came from a device
///   other than the bound one.
/// - `500 Internal Server Error` — storage failure; no record was written.
pub async fn mark(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CheckInBody>,
) -> impl IntoResponse {
    if let Err(validation_errors) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Option<CheckInResponse>>::error(
                format_validation_errors(&validation_errors),
            )),
        );
    }

    let locale = Locale::parse(body.lang.as_deref().unwrap_or(&config::default_locale()));
    let fence = GeofenceConfig::from_app_config();
    let today = checkin::server_today();
    let punctuality = classify_punctuality();

    let req = CheckInRequest {
        student_id: claims.sub,
        device_id: body.device_id,
        latitude: body.latitude,
        longitude: body.longitude,
        client_timestamp: body.client_timestamp,
    };

    match checkin::check_in(state.db(), &fence, &req, punctuality, locale, today).await {
        Ok(res) => {
            let status = match res.outcome {
                Outcome::DeviceRejected => StatusCode::FORBIDDEN,
                Outcome::OutOfRange => StatusCode::BAD_REQUEST,
                _ => StatusCode::OK,
            };
            let success = matches!(
                res.outcome,
                Outcome::SuccessOnTime | Outcome::SuccessLate | Outcome::Duplicate
            );
            let message = res.message.clone();

            (
                status,
                Json(ApiResponse {
                    success,
                    data: Some(res),
                    message,
                }),
            )
        }
        Err(CheckInError::MalformedRequest(detail)) => {
            tracing::debug!(student_id = claims.sub, detail = %detail, "malformed check-in");
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<Option<CheckInResponse>>::error(
                    missing_geolocation(locale),
                )),
            )
        }
        Err(CheckInError::Storage(err)) => {
            tracing::error!(error = %err, student_id = claims.sub, "check-in storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Option<CheckInResponse>>::error(
                    "Database error",
                )),
            )
        }
    }
}

/// Classifies punctuality from the optional configured cutoff; without one,
/// every success counts as on time.
fn classify_punctuality() -> Status {
    match config::checkin_late_after() {
        Some(cutoff) if Local::now().time() > cutoff => Status::Late,
        _ => Status::OnTime,
    }
}

fn missing_geolocation(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => {
            "Не удалось получить геолокацию. Включите доступ к местоположению и попробуйте снова."
        }
        Locale::Kk => "Геолокация алынбады. Орналасқан жерге қолжеткізуді қосып, қайта көріңіз.",
    }
}
