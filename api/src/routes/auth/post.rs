use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use common::{config, format_validation_errors};
use db::models::user::Model as UserModel;
use serde::{Deserialize, Serialize};
use services::checkin::Outcome;
use services::device_binding::{self, BindingResult};
use services::feedback::{self, Locale};
use services::history::AttendanceStats;
use uuid::Uuid;
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Login is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// Client-held device token. Absent on a device's very first login; the
    /// server then issues one and the client must persist it.
    pub device_id: Option<String>,

    pub lang: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct LoginResponse {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub group_name: Option<String>,
    pub admin: bool,
    pub device_id: String,
    pub token: String,
    pub expires_at: String,
}

/// POST /auth/login
///
/// Authenticate a user and, for students, establish or verify the device
/// binding.
///
/// ### Request Body
/// ```json
/// {
///   "username": "aruzhan",
///   "password": "secret123",
///   "device_id": "4f9d…",
///   "lang": "ru"
/// }
/// ```
///
/// ### Responses
///
/// - `200 OK` — credentials valid, device bound or verified; `data` carries
///   the issued token and the device id the client must keep.
/// - `401 Unauthorized` — wrong login or password.
/// - `403 Forbidden` — the account is bound to a different device. This is
///   deliberately distinct from `401`: the student should contact a curator,
///   not retry the password.
/// - `500 Internal Server Error` — storage failure.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<LoginResponse>::error(
                format_validation_errors(&validation_errors),
            )),
        );
    }

    let locale = Locale::parse(req.lang.as_deref().unwrap_or(&config::default_locale()));
    let username = req.username.trim();

    let user = match UserModel::verify_credentials(state.db(), username, &req.password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<LoginResponse>::error(wrong_credentials(
                    locale,
                ))),
            );
        }
        Err(err) => {
            tracing::error!(error = %err, "login credential lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<LoginResponse>::error("Database error")),
            );
        }
    };

    // Admins are not presence-tracked and skip device binding entirely.
    let device_id = req
        .device_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    if !user.admin {
        match device_binding::bind_or_verify(state.db(), user.id, &device_id).await {
            Ok(BindingResult::Bound | BindingResult::Verified) => {}
            Ok(BindingResult::Rejected) => {
                return (
                    StatusCode::FORBIDDEN,
                    Json(ApiResponse::<LoginResponse>::error(
                        feedback::select_message(
                            Outcome::DeviceRejected,
                            &AttendanceStats::default(),
                            locale,
                        ),
                    )),
                );
            }
            Err(err) => {
                tracing::error!(error = %err, user_id = user.id, "device binding failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<LoginResponse>::error("Database error")),
                );
            }
        }
    }

    let (token, expires_at) = generate_jwt(user.id, user.admin);
    let response = LoginResponse {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
        group_name: user.group_name,
        admin: user.admin,
        device_id,
        token,
        expires_at,
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(response, "Login successful")),
    )
}

fn wrong_credentials(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => "Неверный логин или пароль",
        Locale::Kk => "Қате логин немесе құпия сөз",
    }
}
