//! Label import. Labels are flat and cheap, so whole pages are written
//! through the bulk persister instead of per-object tasks.

use crate::adapter::{ImportStrategy, ObjectAdapter};
use crate::context::RunContext;
use crate::error::ImportTaskError;
use crate::persister::{BulkMapper, BulkPersister, RowValidationError};
use async_trait::async_trait;
use hublift_core::{parse_timestamp, ObjectType};
use hublift_entities::labels;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde_json::Value;

use super::timestamp_or_now;

pub struct LabelAdapter;

struct LabelMapper;

#[async_trait]
impl BulkMapper for LabelMapper {
    type Entity = labels::Entity;

    fn object_kind(&self) -> &'static str {
        "label"
    }

    fn build_row(
        &self,
        project_id: i64,
        raw: &Value,
    ) -> Result<labels::ActiveModel, RowValidationError> {
        let external_id = raw
            .get("id")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| RowValidationError::new("label", "missing id"))?;
        let name = raw
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RowValidationError::new("label", "missing name"))?;

        Ok(labels::ActiveModel {
            project_id: Set(project_id),
            external_id: Set(external_id),
            name: Set(name.to_string()),
            color: Set(raw.get("color").and_then(|v| v.as_str()).map(String::from)),
            description: Set(raw
                .get("description")
                .and_then(|v| v.as_str())
                .map(String::from)),
            created_at: Set(timestamp_or_now(parse_timestamp(raw, "created_at"))),
            ..Default::default()
        })
    }

    async fn already_imported(
        &self,
        db: &DatabaseConnection,
        project_id: i64,
        raw: &Value,
    ) -> Result<bool, DbErr> {
        let name = match raw.get("name").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => return Ok(false),
        };
        Ok(labels::Entity::find()
            .filter(labels::Column::ProjectId.eq(project_id))
            .filter(labels::Column::Name.eq(name))
            .one(db)
            .await?
            .is_some())
    }
}

#[async_trait]
impl ObjectAdapter for LabelAdapter {
    fn object_type(&self) -> ObjectType {
        ObjectType::Label
    }

    fn collection_name(&self) -> &'static str {
        "labels"
    }

    fn task_type(&self) -> &'static str {
        "import_labels_page"
    }

    fn strategy(&self) -> ImportStrategy {
        ImportStrategy::BulkPage
    }

    async fn import_page(&self, ctx: &RunContext, raws: &[Value]) -> Result<u64, ImportTaskError> {
        let outcome = BulkPersister::persist(&ctx.db, &LabelMapper, ctx.project_id, raws).await?;
        if !outcome.invalid.is_empty() {
            ctx.counters()
                .add_failed(&ctx.scope_for(self.object_type()), outcome.invalid.len() as i64)
                .await?;
        }
        Ok(outcome.inserted())
    }
}
