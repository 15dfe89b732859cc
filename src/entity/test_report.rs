//! Test report (one executed test run) entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "test_reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub test_name: String,
    pub status: String,
    /// Execution time in seconds.
    pub execution_time: f64,
    pub timestamp: DateTimeUtc,
    pub test_suite_id: Option<i32>,
    pub test_project_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::test_step::Entity")]
    Steps,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::test_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Steps.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
