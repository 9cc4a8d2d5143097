use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use hublift_core::UtcDateTime;

/// Durable record of a foreign-key column whose author or assignee could not
/// be resolved to a local user at import time. A later reconciliation pass
/// rewrites `record_table.column_name` for `record_id` once the external
/// identity completes a mapping flow.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "placeholder_references")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub project_id: i64,
    pub record_table: String,
    pub record_id: i64,
    pub column_name: String,
    pub external_user_id: i64,
    pub external_login: Option<String>,
    pub created_at: UtcDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
