pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_account;
mod m20250101_000002_create_note;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_account::Migration),
            Box::new(m20250101_000002_create_note::Migration),
        ]
    }
}
