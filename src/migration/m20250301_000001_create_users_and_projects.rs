//! Migration: Create users, test_projects and the assignment/favourite tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::HashedPassword).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(20)
                            .not_null()
                            .default("user"),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TestProjects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TestProjects::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TestProjects::ProjectName)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(TestProjects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserProjects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserProjects::UserId).integer().not_null())
                    .col(ColumnDef::new(UserProjects::ProjectId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(UserProjects::UserId)
                            .col(UserProjects::ProjectId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_projects_user_id")
                            .from(UserProjects::Table, UserProjects::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_projects_project_id")
                            .from(UserProjects::Table, UserProjects::ProjectId)
                            .to(TestProjects::Table, TestProjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FavoriteProjects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FavoriteProjects::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FavoriteProjects::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(FavoriteProjects::ProjectId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FavoriteProjects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favorite_projects_user_id")
                            .from(FavoriteProjects::Table, FavoriteProjects::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favorite_projects_project_id")
                            .from(FavoriteProjects::Table, FavoriteProjects::ProjectId)
                            .to(TestProjects::Table, TestProjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One favourite row per (user, project)
        manager
            .create_index(
                Index::create()
                    .name("idx_favorite_projects_user_project")
                    .table(FavoriteProjects::Table)
                    .col(FavoriteProjects::UserId)
                    .col(FavoriteProjects::ProjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FavoriteProjects::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserProjects::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TestProjects::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    HashedPassword,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TestProjects {
    Table,
    Id,
    ProjectName,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserProjects {
    Table,
    UserId,
    ProjectId,
}

#[derive(DeriveIden)]
enum FavoriteProjects {
    Table,
    Id,
    UserId,
    ProjectId,
    CreatedAt,
}
