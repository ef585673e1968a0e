use common::{config, logger};
use migration::Migrator;
use sea_orm_migration::MigratorTrait;

use crate::seed::{Seeder, run_seeder};
use crate::seeds::user::UserSeeder;

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    logger::init_logger(&config::log_level(), "logs/seeder.log");

    let db = db::connect().await;

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    for (seeder, name) in [(Box::new(UserSeeder) as Box<dyn Seeder + Send + Sync>, "User")] {
        run_seeder(&*seeder, name, &db).await;
    }
}
