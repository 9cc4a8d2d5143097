use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use hublift_core::UtcDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "milestones")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub project_id: i64,
    pub external_id: i64,
    /// Natural key within a project; unique per (project_id, title).
    pub title: String,
    pub description: Option<String>,
    pub state: String,
    pub due_on: Option<UtcDateTime>,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
