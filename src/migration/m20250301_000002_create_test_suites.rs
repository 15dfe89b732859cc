//! Migration: Create test_suites table.
//!
//! Suite names are stored lowercase; the unique index backs the
//! insert-if-absent resolution used during ingestion.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestSuites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TestSuites::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TestSuites::SuiteName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TestSuites::ProjectId).integer().null())
                    .col(
                        ColumnDef::new(TestSuites::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_test_suites_project_id")
                            .from(TestSuites::Table, TestSuites::ProjectId)
                            .to(TestProjects::Table, TestProjects::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_suites_suite_name")
                    .table(TestSuites::Table)
                    .col(TestSuites::SuiteName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_suites_project_id")
                    .table(TestSuites::Table)
                    .col(TestSuites::ProjectId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestSuites::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum TestSuites {
    Table,
    Id,
    SuiteName,
    ProjectId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TestProjects {
    Table,
    Id,
}
