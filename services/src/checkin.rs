//! The check-in operation.
//!
//! One attempt walks `DeviceCheck → AlreadyMarkedCheck → GeofenceCheck →
//! RecordWrite`; each stage either advances or produces a terminal outcome.
//! The only mutation permitted on a non-success path is the `Bound`
//! transition inside DeviceCheck: a student's device binds on first login
//! whether or not the geofence check later passes.

use chrono::{DateTime, Local, NaiveDate, Utc};
use db::models::check_in::{Model as CheckInModel, Status};
use sea_orm::{DbConn, DbErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device_binding::{self, BindingResult};
use crate::feedback::{self, Locale};
use crate::geofence::{self, GeofenceConfig};
use crate::history::{self, AttendanceStats};
use crate::ledger::{self, LedgerError};

/// Terminal classification of one check-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    SuccessOnTime,
    SuccessLate,
    Suspicious,
    OutOfRange,
    Duplicate,
    DeviceRejected,
}

/// Parsed check-in input. Identity resolution, locale and punctuality
/// classification are the caller's responsibility.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    pub student_id: i64,
    pub device_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub client_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInResponse {
    pub outcome: Outcome,
    pub message: String,
    pub record: Option<CheckInModel>,
}

#[derive(Debug, Error)]
pub enum CheckInError {
    /// Missing or out-of-range coordinates. Reported before any state is
    /// touched; never retried automatically.
    #[error("malformed check-in request: {0}")]
    MalformedRequest(String),
    /// The underlying store failed; nothing may be assumed about partial
    /// writes and no feedback message is issued.
    #[error(transparent)]
    Storage(#[from] DbErr),
}

/// Server-local calendar date. The device clock is never trusted for
/// deciding "today".
pub fn server_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Runs one check-in attempt to a terminal outcome.
///
/// Calling this twice on the same day has the same observable effect as
/// calling it once: the second call returns [`Outcome::Duplicate`] with the
/// message persisted by the first.
pub async fn check_in(
    db: &DbConn,
    fence: &GeofenceConfig,
    req: &CheckInRequest,
    punctuality: Status,
    locale: Locale,
    today: NaiveDate,
) -> Result<CheckInResponse, CheckInError> {
    let (lat, lon) = validate_coordinates(req)?;

    match device_binding::bind_or_verify(db, req.student_id, &req.device_id).await? {
        BindingResult::Rejected => {
            return Ok(failure(Outcome::DeviceRejected, locale));
        }
        BindingResult::Bound | BindingResult::Verified => {}
    }

    if ledger::has_success_today(db, req.student_id, today).await? {
        return duplicate_response(db, req.student_id, today, locale).await;
    }

    let distance = geofence::distance_meters(lat, lon, fence.center_lat, fence.center_lon);
    if distance > fence.radius_m {
        tracing::info!(
            student_id = req.student_id,
            distance_m = distance,
            radius_m = fence.radius_m,
            "check-in rejected outside the geofence"
        );
        return Ok(failure(Outcome::OutOfRange, locale));
    }

    // History as of today, which excludes the record about to be written.
    let dates = ledger::success_dates_before(db, req.student_id, today).await?;
    let stats = history::analyze(&dates, today);

    let outcome = match punctuality {
        Status::OnTime => Outcome::SuccessOnTime,
        Status::Late => Outcome::SuccessLate,
    };
    let message = feedback::select_message(outcome, &stats, locale);

    match ledger::record_success(
        db,
        req.student_id,
        today,
        punctuality,
        lat,
        lon,
        &req.device_id,
        &message,
    )
    .await
    {
        Ok(record) => Ok(CheckInResponse {
            outcome,
            message,
            record: Some(record),
        }),
        // Lost a race against a concurrent attempt; that attempt's record wins.
        Err(LedgerError::Duplicate) => duplicate_response(db, req.student_id, today, locale).await,
        Err(LedgerError::Db(err)) => Err(CheckInError::Storage(err)),
    }
}

fn validate_coordinates(req: &CheckInRequest) -> Result<(f64, f64), CheckInError> {
    let (Some(lat), Some(lon)) = (req.latitude, req.longitude) else {
        return Err(CheckInError::MalformedRequest(
            "latitude and longitude are required".into(),
        ));
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(CheckInError::MalformedRequest(format!(
            "coordinates out of range: ({lat}, {lon})"
        )));
    }
    Ok((lat, lon))
}

fn failure(outcome: Outcome, locale: Locale) -> CheckInResponse {
    CheckInResponse {
        outcome,
        message: feedback::select_message(outcome, &AttendanceStats::default(), locale),
        record: None,
    }
}

async fn duplicate_response(
    db: &DbConn,
    student_id: i64,
    today: NaiveDate,
    locale: Locale,
) -> Result<CheckInResponse, CheckInError> {
    let record = ledger::find_for_day(db, student_id, today).await?;
    let message = record
        .as_ref()
        .map(|r| r.message.clone())
        .unwrap_or_else(|| {
            feedback::select_message(Outcome::Duplicate, &AttendanceStats::default(), locale)
        });

    Ok(CheckInResponse {
        outcome: Outcome::Duplicate,
        message,
        record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use db::models::check_in::Entity as CheckInEntity;
    use db::models::user::{Entity as UserEntity, Model as UserModel};
    use db::test_utils::setup_test_db;
    use sea_orm::EntityTrait;

    const FENCE: GeofenceConfig = GeofenceConfig {
        center_lat: 45.01,
        center_lon: 78.22,
        radius_m: 400.0,
    };

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn request(student_id: i64, device_id: &str, lat: f64, lon: f64) -> CheckInRequest {
        CheckInRequest {
            student_id,
            device_id: device_id.to_owned(),
            latitude: Some(lat),
            longitude: Some(lon),
            client_timestamp: None,
        }
    }

    async fn seed_student(db: &DbConn, username: &str) -> UserModel {
        UserModel::create(db, username, "Student S.", "pw", Some("IS-21"), false)
            .await
            .unwrap()
    }

    async fn ledger_rows(db: &DbConn) -> usize {
        CheckInEntity::find().all(db).await.unwrap().len()
    }

    #[tokio::test]
    async fn first_check_in_succeeds_binds_and_writes_one_record() {
        let db = setup_test_db().await;
        let student = seed_student(&db, "zhanar").await;
        let today = day("2026-03-02");

        let req = request(student.id, "device-a", 45.01, 78.22);
        let res = check_in(&db, &FENCE, &req, Status::OnTime, Locale::Ru, today)
            .await
            .unwrap();

        assert_eq!(res.outcome, Outcome::SuccessOnTime);
        let record = res.record.expect("success must carry the record");
        assert_eq!(record.student_id, student.id);
        assert_eq!(record.date, today);
        assert_eq!(record.device_uid, "device-a");
        assert_eq!(record.message, res.message);
        assert_eq!(ledger_rows(&db).await, 1);

        let stored = UserEntity::find_by_id(student.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.device_uid.as_deref(), Some("device-a"));
    }

    #[tokio::test]
    async fn second_call_is_a_duplicate_with_the_original_message() {
        let db = setup_test_db().await;
        let student = seed_student(&db, "bek").await;
        let today = day("2026-03-02");
        let req = request(student.id, "device-a", 45.01, 78.22);

        let first = check_in(&db, &FENCE, &req, Status::OnTime, Locale::Ru, today)
            .await
            .unwrap();
        let second = check_in(&db, &FENCE, &req, Status::OnTime, Locale::Ru, today)
            .await
            .unwrap();

        assert_eq!(second.outcome, Outcome::Duplicate);
        assert_eq!(second.message, first.message);
        assert_eq!(ledger_rows(&db).await, 1);
    }

    #[tokio::test]
    async fn out_of_range_writes_nothing() {
        let db = setup_test_db().await;
        let student = seed_student(&db, "madi").await;
        let today = day("2026-03-02");

        // ~500 m north of a 400 m fence.
        let req = request(student.id, "device-a", 45.0145, 78.22);
        let res = check_in(&db, &FENCE, &req, Status::OnTime, Locale::Ru, today)
            .await
            .unwrap();

        assert_eq!(res.outcome, Outcome::OutOfRange);
        assert!(res.record.is_none());
        assert_eq!(ledger_rows(&db).await, 0);

        // Binding still happened: DeviceCheck precedes the geofence verdict.
        let stored = UserEntity::find_by_id(student.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.device_uid.as_deref(), Some("device-a"));

        // A bound student stays bound to the same device after the failure.
        let retry = request(student.id, "device-a", 45.01, 78.22);
        let res = check_in(&db, &FENCE, &retry, Status::OnTime, Locale::Ru, today)
            .await
            .unwrap();
        assert_eq!(res.outcome, Outcome::SuccessOnTime);
    }

    #[tokio::test]
    async fn foreign_device_is_rejected_without_touching_the_ledger() {
        let db = setup_test_db().await;
        let student = seed_student(&db, "sara").await;
        let today = day("2026-03-02");

        let first = request(student.id, "device-a", 45.01, 78.22);
        check_in(&db, &FENCE, &first, Status::OnTime, Locale::Ru, today)
            .await
            .unwrap();

        let foreign = request(student.id, "device-b", 45.01, 78.22);
        let res = check_in(
            &db,
            &FENCE,
            &foreign,
            Status::OnTime,
            Locale::Ru,
            today + Duration::days(1),
        )
        .await
        .unwrap();

        assert_eq!(res.outcome, Outcome::DeviceRejected);
        assert!(res.record.is_none());
        assert_eq!(ledger_rows(&db).await, 1);
    }

    #[tokio::test]
    async fn missing_or_invalid_coordinates_are_malformed() {
        let db = setup_test_db().await;
        let student = seed_student(&db, "nursultan").await;
        let today = day("2026-03-02");

        let mut req = request(student.id, "device-a", 45.01, 78.22);
        req.latitude = None;
        let res = check_in(&db, &FENCE, &req, Status::OnTime, Locale::Ru, today).await;
        assert!(matches!(res, Err(CheckInError::MalformedRequest(_))));

        let req = request(student.id, "device-a", 95.0, 78.22);
        let res = check_in(&db, &FENCE, &req, Status::OnTime, Locale::Ru, today).await;
        assert!(matches!(res, Err(CheckInError::MalformedRequest(_))));

        // Malformed requests mutate nothing, not even the binding.
        let stored = UserEntity::find_by_id(student.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.device_uid.is_none());
        assert_eq!(ledger_rows(&db).await, 0);
    }

    #[tokio::test]
    async fn late_classification_flows_into_outcome_and_record() {
        let db = setup_test_db().await;
        let student = seed_student(&db, "aigerim").await;
        let today = day("2026-03-02");

        let req = request(student.id, "device-a", 45.01, 78.22);
        let res = check_in(&db, &FENCE, &req, Status::Late, Locale::Ru, today)
            .await
            .unwrap();

        assert_eq!(res.outcome, Outcome::SuccessLate);
        assert_eq!(res.record.unwrap().status, Status::Late);
        assert!(res.message.contains("опоздал"), "got {}", res.message);
    }

    #[tokio::test]
    async fn streak_message_reflects_prior_history_only() {
        let db = setup_test_db().await;
        let student = seed_student(&db, "damir").await;
        let today = day("2026-03-10");

        for offset in 1..=5 {
            ledger::record_success(
                &db,
                student.id,
                today - Duration::days(offset),
                Status::OnTime,
                45.01,
                78.22,
                "device-a",
                "ok",
            )
            .await
            .unwrap();
        }

        let req = request(student.id, "device-a", 45.01, 78.22);
        let res = check_in(&db, &FENCE, &req, Status::OnTime, Locale::Ru, today)
            .await
            .unwrap();

        assert_eq!(res.outcome, Outcome::SuccessOnTime);
        assert!(res.message.contains("5 дней подряд"), "got {}", res.message);
    }

    #[tokio::test]
    async fn concurrent_attempts_produce_one_record_and_duplicates() {
        let db = setup_test_db().await;
        let student = seed_student(&db, "arman").await;
        let today = day("2026-03-02");
        let req = request(student.id, "device-a", 45.01, 78.22);

        let attempts = (0..4).map(|_| check_in(&db, &FENCE, &req, Status::OnTime, Locale::Ru, today));
        let results: Vec<_> = futures::future::join_all(attempts)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let successes = results
            .iter()
            .filter(|r| r.outcome == Outcome::SuccessOnTime)
            .count();
        let duplicates = results
            .iter()
            .filter(|r| r.outcome == Outcome::Duplicate)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(duplicates, 3);
        assert_eq!(ledger_rows(&db).await, 1);
    }
}
