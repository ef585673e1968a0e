//! One-time association between a student account and a client device.
//!
//! The first successful login claims the binding; afterwards only that device
//! is accepted. There is no reset path here: releasing a binding is an
//! administrative action outside this service.

use chrono::Utc;
use db::models::user::{Column as UserColumn, Entity as UserEntity};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter};

/// Result of a bind-or-verify attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingResult {
    /// No prior binding existed; the candidate device is now permanently
    /// associated with the student.
    Bound,
    /// The prior binding matches the candidate device.
    Verified,
    /// A different device is already bound. Must surface as its own error,
    /// never as a credentials failure.
    Rejected,
}

/// Establishes or checks the student's device binding.
///
/// The bind transition is a conditional update on `device_uid IS NULL`; the
/// affected-row count decides concurrent races, so two simultaneous first
/// logins can never both win `Bound`.
pub async fn bind_or_verify(
    db: &DbConn,
    student_id: i64,
    candidate_device_id: &str,
) -> Result<BindingResult, DbErr> {
    let student = UserEntity::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("User {student_id} not found")))?;

    match student.device_uid.as_deref() {
        Some(bound) if bound == candidate_device_id => Ok(BindingResult::Verified),
        Some(_) => Ok(BindingResult::Rejected),
        None => {
            let result = UserEntity::update_many()
                .col_expr(UserColumn::DeviceUid, Expr::value(candidate_device_id))
                .col_expr(UserColumn::UpdatedAt, Expr::value(Utc::now()))
                .filter(UserColumn::Id.eq(student_id))
                .filter(UserColumn::DeviceUid.is_null())
                .exec(db)
                .await?;

            if result.rows_affected == 1 {
                return Ok(BindingResult::Bound);
            }

            // Lost the race to a concurrent login; re-read and classify.
            let current = UserEntity::find_by_id(student_id)
                .one(db)
                .await?
                .and_then(|u| u.device_uid);

            match current.as_deref() {
                Some(uid) if uid == candidate_device_id => Ok(BindingResult::Verified),
                _ => Ok(BindingResult::Rejected),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::user::{Entity as UserEntity, Model as UserModel};
    use db::test_utils::setup_test_db;

    #[tokio::test]
    async fn first_login_binds_and_persists() {
        let db = setup_test_db().await;
        let student = UserModel::create(&db, "dana", "Dana K.", "pw", Some("IS-21"), false)
            .await
            .unwrap();

        let result = bind_or_verify(&db, student.id, "device-a").await.unwrap();
        assert_eq!(result, BindingResult::Bound);

        let stored = UserEntity::find_by_id(student.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.device_uid.as_deref(), Some("device-a"));
    }

    #[tokio::test]
    async fn bound_device_verifies_and_others_are_rejected() {
        let db = setup_test_db().await;
        let student = UserModel::create(&db, "erik", "Erik T.", "pw", Some("IS-21"), false)
            .await
            .unwrap();

        assert_eq!(
            bind_or_verify(&db, student.id, "device-a").await.unwrap(),
            BindingResult::Bound
        );
        assert_eq!(
            bind_or_verify(&db, student.id, "device-a").await.unwrap(),
            BindingResult::Verified
        );
        assert_eq!(
            bind_or_verify(&db, student.id, "device-b").await.unwrap(),
            BindingResult::Rejected
        );

        // Rejection never clobbers the original binding.
        let stored = UserEntity::find_by_id(student.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.device_uid.as_deref(), Some("device-a"));
    }

    #[tokio::test]
    async fn concurrent_first_logins_bind_exactly_once() {
        let db = setup_test_db().await;
        let student = UserModel::create(&db, "aliya", "Aliya M.", "pw", Some("IS-22"), false)
            .await
            .unwrap();

        let (a, b) = futures::join!(
            bind_or_verify(&db, student.id, "device-a"),
            bind_or_verify(&db, student.id, "device-b"),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        let bound = [a, b]
            .iter()
            .filter(|r| **r == BindingResult::Bound)
            .count();
        assert_eq!(bound, 1, "exactly one login may win the binding");
        assert!([a, b].contains(&BindingResult::Rejected));
    }

    #[tokio::test]
    async fn unknown_student_is_an_error() {
        let db = setup_test_db().await;
        assert!(bind_or_verify(&db, 9999, "device-a").await.is_err());
    }
}
