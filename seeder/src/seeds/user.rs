use crate::seed::Seeder;
use db::models::user::Model;
use sea_orm::DatabaseConnection;

pub struct UserSeeder;

const DEMO_STUDENTS: &[(&str, &str, &str)] = &[
    ("aruzhan", "Аружан Сапарова", "IS-21"),
    ("erik", "Ерік Төлеуов", "IS-21"),
    ("dana", "Дана Қасымова", "IS-22"),
    ("timur", "Тимур Жанатов", "CS-11"),
    ("aliya", "Әлия Мұратқызы", "CS-11"),
];

#[async_trait::async_trait]
impl Seeder for UserSeeder {
    async fn seed(&self, db: &DatabaseConnection) {
        // Fixed admin account
        if let Err(err) = Model::create(db, "admin", "Administrator", "admin123", None, true).await
        {
            log::warn!("admin already seeded or insert failed: {err}");
        }

        // Demo students, one password for all
        for (username, full_name, group) in DEMO_STUDENTS {
            if let Err(err) =
                Model::create(db, username, full_name, "password123", Some(group), false).await
            {
                log::warn!("student {username} already seeded or insert failed: {err}");
            }
        }
    }
}
