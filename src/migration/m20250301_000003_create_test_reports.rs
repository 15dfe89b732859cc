//! Migration: Create test_reports and test_steps tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TestReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TestReports::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TestReports::TestName)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TestReports::Status).string_len(10).not_null())
                    .col(ColumnDef::new(TestReports::ExecutionTime).double().not_null())
                    .col(
                        ColumnDef::new(TestReports::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TestReports::TestSuiteId).integer().null())
                    .col(ColumnDef::new(TestReports::TestProjectId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_test_reports_test_suite_id")
                            .from(TestReports::Table, TestReports::TestSuiteId)
                            .to(TestSuites::Table, TestSuites::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_test_reports_test_project_id")
                            .from(TestReports::Table, TestReports::TestProjectId)
                            .to(TestProjects::Table, TestProjects::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Filter/aggregation lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_test_reports_project_suite")
                    .table(TestReports::Table)
                    .col(TestReports::TestProjectId)
                    .col(TestReports::TestSuiteId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_test_reports_timestamp")
                    .table(TestReports::Table)
                    .col(TestReports::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TestSteps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TestSteps::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TestSteps::TestReportId).integer().not_null())
                    .col(ColumnDef::new(TestSteps::StepNumber).integer().not_null())
                    .col(ColumnDef::new(TestSteps::StepDescription).text().not_null())
                    .col(ColumnDef::new(TestSteps::StepStatus).string_len(10).not_null())
                    .col(ColumnDef::new(TestSteps::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(TestSteps::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_test_steps_test_report_id")
                            .from(TestSteps::Table, TestSteps::TestReportId)
                            .to(TestReports::Table, TestReports::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Step numbers are unique within a run
        manager
            .create_index(
                Index::create()
                    .name("idx_test_steps_report_step_number")
                    .table(TestSteps::Table)
                    .col(TestSteps::TestReportId)
                    .col(TestSteps::StepNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestSteps::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TestReports::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum TestReports {
    Table,
    Id,
    TestName,
    Status,
    ExecutionTime,
    Timestamp,
    TestSuiteId,
    TestProjectId,
}

#[derive(DeriveIden)]
enum TestSteps {
    Table,
    Id,
    TestReportId,
    StepNumber,
    StepDescription,
    StepStatus,
    ErrorMessage,
    Timestamp,
}

#[derive(DeriveIden)]
enum TestSuites {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum TestProjects {
    Table,
    Id,
}
