pub use sea_orm_migration::prelude::*;

mod m20260109_000001_accounts;
mod m20260109_120000_catalog;

pub struct Migrator;
#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260109_000001_accounts::Migration),
            Box::new(m20260109_120000_catalog::Migration),
        ]
    }
}
