//! Read-only attendance aggregation for the admin dashboard.

use chrono::NaiveDate;
use db::models::{check_in, user};
use sea_orm::{
    ColumnTrait, DbConn, DbErr, EntityTrait, FromQueryResult, JoinType, QueryFilter, QuerySelect,
    RelationTrait,
};
use serde::Serialize;
use std::collections::HashMap;

/// Attendance of one student group on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupPresence {
    pub group_name: String,
    pub total: i64,
    pub present: i64,
}

#[derive(FromQueryResult)]
struct GroupCount {
    group_name: Option<String>,
    cnt: i64,
}

const UNGROUPED: &str = "ungrouped";

/// Per-group totals and present counts for `day`, sorted by group name.
/// Admins and inactive accounts are excluded from the totals.
pub async fn group_presence(db: &DbConn, day: NaiveDate) -> Result<Vec<GroupPresence>, DbErr> {
    let totals: Vec<GroupCount> = user::Entity::find()
        .select_only()
        .column(user::Column::GroupName)
        .column_as(user::Column::Id.count(), "cnt")
        .filter(user::Column::Admin.eq(false))
        .filter(user::Column::Active.eq(true))
        .group_by(user::Column::GroupName)
        .into_model::<GroupCount>()
        .all(db)
        .await?;

    let presents: Vec<GroupCount> = check_in::Entity::find()
        .select_only()
        .column_as(user::Column::GroupName, "group_name")
        .column_as(check_in::Column::StudentId.count(), "cnt")
        .join(JoinType::InnerJoin, check_in::Relation::Student.def())
        .filter(check_in::Column::Date.eq(day))
        .filter(user::Column::Admin.eq(false))
        .group_by(user::Column::GroupName)
        .into_model::<GroupCount>()
        .all(db)
        .await?;

    let present_by_group: HashMap<Option<String>, i64> = presents
        .into_iter()
        .map(|row| (row.group_name, row.cnt))
        .collect();

    let mut groups: Vec<GroupPresence> = totals
        .into_iter()
        .map(|row| {
            let present = present_by_group.get(&row.group_name).copied().unwrap_or(0);
            GroupPresence {
                group_name: row.group_name.unwrap_or_else(|| UNGROUPED.into()),
                total: row.cnt,
                present,
            }
        })
        .collect();
    groups.sort_by(|a, b| a.group_name.cmp(&b.group_name));

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger;
    use db::models::check_in::Status;
    use db::models::user::Model as UserModel;
    use db::test_utils::setup_test_db;
    use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    async fn mark(db: &DbConn, student_id: i64, d: NaiveDate) {
        ledger::record_success(db, student_id, d, Status::OnTime, 45.01, 78.22, "dev", "ok")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn groups_report_totals_and_present_counts() {
        let db = setup_test_db().await;
        let today = day("2026-03-02");

        let a1 = UserModel::create(&db, "a1", "A One", "pw", Some("IS-21"), false)
            .await
            .unwrap();
        let _a2 = UserModel::create(&db, "a2", "A Two", "pw", Some("IS-21"), false)
            .await
            .unwrap();
        let b1 = UserModel::create(&db, "b1", "B One", "pw", Some("CS-11"), false)
            .await
            .unwrap();
        UserModel::create(&db, "root", "Admin", "pw", None, true)
            .await
            .unwrap();

        mark(&db, a1.id, today).await;
        mark(&db, b1.id, today).await;
        // A check-in on another day never leaks into today's counts.
        mark(&db, b1.id, day("2026-03-01")).await;

        let groups = group_presence(&db, today).await.unwrap();
        assert_eq!(
            groups,
            vec![
                GroupPresence {
                    group_name: "CS-11".into(),
                    total: 1,
                    present: 1,
                },
                GroupPresence {
                    group_name: "IS-21".into(),
                    total: 2,
                    present: 1,
                },
            ]
        );
    }

    #[tokio::test]
    async fn inactive_students_and_admins_are_excluded() {
        let db = setup_test_db().await;
        let today = day("2026-03-02");

        let gone = UserModel::create(&db, "gone", "Gone G.", "pw", Some("IS-21"), false)
            .await
            .unwrap();
        let mut active = gone.into_active_model();
        active.active = Set(false);
        active.update(&db).await.unwrap();

        UserModel::create(&db, "root", "Admin", "pw", None, true)
            .await
            .unwrap();

        let groups = group_presence(&db, today).await.unwrap();
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn students_without_a_group_fall_under_ungrouped() {
        let db = setup_test_db().await;
        let today = day("2026-03-02");

        let solo = UserModel::create(&db, "solo", "Solo S.", "pw", None, false)
            .await
            .unwrap();
        mark(&db, solo.id, today).await;

        let groups = group_presence(&db, today).await.unwrap();
        assert_eq!(
            groups,
            vec![GroupPresence {
                group_name: UNGROUPED.into(),
                total: 1,
                present: 1,
            }]
        );
    }
}
