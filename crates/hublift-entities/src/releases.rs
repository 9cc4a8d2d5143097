use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use hublift_core::UtcDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "releases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub project_id: i64,
    pub external_id: i64,
    /// Natural key within a project; unique per (project_id, tag_name).
    pub tag_name: String,
    pub name: Option<String>,
    pub body: Option<String>,
    /// Local id of the resolved author, when one could be mapped.
    pub author_id: Option<i64>,
    pub released_at: Option<UtcDateTime>,
    pub created_at: UtcDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
