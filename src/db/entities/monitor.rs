use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "monitors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: Option<String>,
    pub url: String,
    pub interval_seconds: i32,
    pub timeout_seconds: i32,
    pub is_active: bool,
    pub last_checked_at: Option<ChronoDateTimeUtc>,
    pub last_healthy_at: Option<ChronoDateTimeUtc>,
    pub last_unhealthy_at: Option<ChronoDateTimeUtc>,
    pub total_checks: i64,
    pub healthy_checks: i64,
    pub unhealthy_checks: i64,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
    pub deleted_at: Option<ChronoDateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::check_result::Entity")]
    CheckResult,
}

impl Related<super::check_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckResult.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
