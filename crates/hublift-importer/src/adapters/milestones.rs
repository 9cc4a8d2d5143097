//! Milestone import, bulk per page. The title is the natural key.

use crate::adapter::{ImportStrategy, ObjectAdapter};
use crate::context::RunContext;
use crate::error::ImportTaskError;
use crate::persister::{BulkMapper, BulkPersister, RowValidationError};
use async_trait::async_trait;
use hublift_core::{parse_timestamp, ObjectType};
use hublift_entities::milestones;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde_json::Value;

use super::timestamp_or_now;

pub struct MilestoneAdapter;

struct MilestoneMapper;

#[async_trait]
impl BulkMapper for MilestoneMapper {
    type Entity = milestones::Entity;

    fn object_kind(&self) -> &'static str {
        "milestone"
    }

    fn build_row(
        &self,
        project_id: i64,
        raw: &Value,
    ) -> Result<milestones::ActiveModel, RowValidationError> {
        let external_id = raw
            .get("id")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| RowValidationError::new("milestone", "missing id"))?;
        let title = raw
            .get("title")
            .and_then(|v| v.as_str())
            .filter(|title| !title.is_empty())
            .ok_or_else(|| RowValidationError::new("milestone", "missing title"))?;

        Ok(milestones::ActiveModel {
            project_id: Set(project_id),
            external_id: Set(external_id),
            title: Set(title.to_string()),
            description: Set(raw
                .get("description")
                .and_then(|v| v.as_str())
                .map(String::from)),
            state: Set(raw
                .get("state")
                .and_then(|v| v.as_str())
                .unwrap_or("open")
                .to_string()),
            due_on: Set(parse_timestamp(raw, "due_on")),
            created_at: Set(timestamp_or_now(parse_timestamp(raw, "created_at"))),
            updated_at: Set(timestamp_or_now(parse_timestamp(raw, "updated_at"))),
            ..Default::default()
        })
    }

    async fn already_imported(
        &self,
        db: &DatabaseConnection,
        project_id: i64,
        raw: &Value,
    ) -> Result<bool, DbErr> {
        let title = match raw.get("title").and_then(|v| v.as_str()) {
            Some(title) => title,
            None => return Ok(false),
        };
        Ok(milestones::Entity::find()
            .filter(milestones::Column::ProjectId.eq(project_id))
            .filter(milestones::Column::Title.eq(title))
            .one(db)
            .await?
            .is_some())
    }
}

#[async_trait]
impl ObjectAdapter for MilestoneAdapter {
    fn object_type(&self) -> ObjectType {
        ObjectType::Milestone
    }

    fn collection_name(&self) -> &'static str {
        "milestones"
    }

    fn task_type(&self) -> &'static str {
        "import_milestones_page"
    }

    fn strategy(&self) -> ImportStrategy {
        ImportStrategy::BulkPage
    }

    async fn import_page(&self, ctx: &RunContext, raws: &[Value]) -> Result<u64, ImportTaskError> {
        let outcome =
            BulkPersister::persist(&ctx.db, &MilestoneMapper, ctx.project_id, raws).await?;
        if !outcome.invalid.is_empty() {
            ctx.counters()
                .add_failed(&ctx.scope_for(self.object_type()), outcome.invalid.len() as i64)
                .await?;
        }
        Ok(outcome.inserted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_row_reads_due_date_and_state() {
        let row = MilestoneMapper
            .build_row(
                1,
                &json!({
                    "id": 5,
                    "title": "v1.0",
                    "state": "closed",
                    "due_on": "2026-03-01T00:00:00Z"
                }),
            )
            .unwrap();

        assert_eq!(row.title.as_ref(), "v1.0");
        assert_eq!(row.state.as_ref(), "closed");
        assert!(row.due_on.as_ref().is_some());
    }

    #[test]
    fn build_row_rejects_missing_title() {
        let err = MilestoneMapper.build_row(1, &json!({"id": 5})).unwrap_err();
        assert_eq!(err.details, "missing title");
    }
}
