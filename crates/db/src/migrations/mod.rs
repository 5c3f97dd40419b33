//! Database migrations.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_following_table;
mod m20250101_000003_create_post_tables;
mod m20250101_000004_create_message_and_notification_tables;
mod m20250101_000005_create_story_tables;
mod m20250101_000006_create_video_tables;
mod m20250101_000007_create_group_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_following_table::Migration),
            Box::new(m20250101_000003_create_post_tables::Migration),
            Box::new(m20250101_000004_create_message_and_notification_tables::Migration),
            Box::new(m20250101_000005_create_story_tables::Migration),
            Box::new(m20250101_000006_create_video_tables::Migration),
            Box::new(m20250101_000007_create_group_tables::Migration),
        ]
    }
}
