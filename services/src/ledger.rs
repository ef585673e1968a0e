//! Append-only ledger of successful daily check-ins.
//!
//! The composite primary key (student_id, date) makes a second success for
//! the same day a constraint violation, which this module surfaces as
//! [`LedgerError::Duplicate`]. That constraint, not application logic, is
//! what holds under concurrent duplicate attempts.

use chrono::{NaiveDate, Utc};
use db::models::check_in::{ActiveModel, Column, Entity, Model, Status};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A success row for this (student, date) already exists.
    #[error("check-in already recorded for this day")]
    Duplicate,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Whether the student already has a success record for `day`.
pub async fn has_success_today(db: &DbConn, student_id: i64, day: NaiveDate) -> Result<bool, DbErr> {
    Ok(Entity::find_by_id((student_id, day))
        .one(db)
        .await?
        .is_some())
}

/// The student's success record for `day`, if any.
pub async fn find_for_day(
    db: &DbConn,
    student_id: i64,
    day: NaiveDate,
) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id((student_id, day)).one(db).await
}

/// Appends the success record for `day`.
///
/// A concurrent writer that loses the race on the composite key observes
/// [`LedgerError::Duplicate`]; exactly one row per (student, day) can exist.
#[allow(clippy::too_many_arguments)]
pub async fn record_success(
    db: &DbConn,
    student_id: i64,
    day: NaiveDate,
    status: Status,
    latitude: f64,
    longitude: f64,
    device_uid: &str,
    message: &str,
) -> Result<Model, LedgerError> {
    let row = ActiveModel {
        student_id: Set(student_id),
        date: Set(day),
        status: Set(status),
        recorded_at: Set(Utc::now()),
        latitude: Set(latitude),
        longitude: Set(longitude),
        device_uid: Set(device_uid.to_owned()),
        message: Set(message.to_owned()),
    };

    match row.insert(db).await {
        Ok(model) => Ok(model),
        Err(err) => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Err(LedgerError::Duplicate),
            _ => Err(LedgerError::Db(err)),
        },
    }
}

/// Distinct success dates strictly before `day`, oldest first. Input for the
/// history analyzer, which must not see the day being evaluated.
pub async fn success_dates_before(
    db: &DbConn,
    student_id: i64,
    day: NaiveDate,
) -> Result<Vec<NaiveDate>, DbErr> {
    Entity::find()
        .select_only()
        .column(Column::Date)
        .filter(Column::StudentId.eq(student_id))
        .filter(Column::Date.lt(day))
        .order_by_asc(Column::Date)
        .into_tuple()
        .all(db)
        .await
}
