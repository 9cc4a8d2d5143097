use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use hublift_core::UtcDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub project_id: i64,
    /// External asset id, unique per project.
    pub external_id: String,
    /// Object type the attachment belongs to, e.g. "issue" or "release".
    pub record_type: String,
    /// External id of the owning record.
    pub record_external_id: String,
    pub url: String,
    pub created_at: UtcDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
