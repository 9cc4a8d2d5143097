//! Attachment import: references to uploaded assets on already-imported
//! records. Asset ids are opaque strings upstream.

use crate::adapter::ObjectAdapter;
use crate::context::RunContext;
use crate::error::ImportTaskError;
use async_trait::async_trait;
use hublift_core::{ObjectRepresentation, ObjectType};
use hublift_entities::attachments;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{parse_payload, timestamp_or_now};

pub struct AttachmentAdapter;

#[derive(Debug, Deserialize)]
struct AttachmentPayload {
    id: String,
    /// Object type of the owning record, e.g. "issue" or "release".
    record_type: String,
    record_external_id: String,
    url: String,
}

#[async_trait]
impl ObjectAdapter for AttachmentAdapter {
    fn object_type(&self) -> ObjectType {
        ObjectType::Attachment
    }

    fn collection_name(&self) -> &'static str {
        "attachments"
    }

    fn task_type(&self) -> &'static str {
        "import_attachment"
    }

    /// Attachment ids are strings upstream.
    fn already_imported_id(&self, raw: &Value) -> Option<String> {
        match raw.get("id")? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    async fn import_object(
        &self,
        ctx: &RunContext,
        representation: &ObjectRepresentation,
    ) -> Result<(), ImportTaskError> {
        let payload: AttachmentPayload = parse_payload(representation)?;

        let existing = attachments::Entity::find()
            .filter(attachments::Column::ProjectId.eq(ctx.project_id))
            .filter(attachments::Column::ExternalId.eq(&payload.id))
            .one(&ctx.db)
            .await?;
        if existing.is_some() {
            debug!(external_id = %payload.id, "Attachment already imported, skipping");
            return Ok(());
        }

        attachments::Entity::insert(attachments::ActiveModel {
            project_id: Set(ctx.project_id),
            external_id: Set(payload.id),
            record_type: Set(payload.record_type),
            record_external_id: Set(payload.record_external_id),
            url: Set(payload.url),
            created_at: Set(timestamp_or_now(representation.created_at)),
            ..Default::default()
        })
        .exec_with_returning(&ctx.db)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context_with, CollectingQueue, ScriptedClient};
    use crate::user_finder::MapUserResolver;
    use hublift_core::ImportSettings;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn dedup_id_accepts_string_and_numeric_ids() {
        let adapter = AttachmentAdapter;
        assert_eq!(
            adapter.already_imported_id(&json!({"id": "abc-123"})),
            Some("abc-123".to_string())
        );
        assert_eq!(
            adapter.already_imported_id(&json!({"id": 55})),
            Some("55".to_string())
        );
        assert_eq!(adapter.already_imported_id(&json!({"id": ""})), None);
        assert_eq!(adapter.already_imported_id(&json!({"url": "x"})), None);
    }

    #[tokio::test]
    async fn imports_an_asset_reference() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<attachments::Model, _, _>([vec![]])
            .append_query_results([vec![attachments::Model {
                id: 1,
                project_id: 1,
                external_id: "abc-123".to_string(),
                record_type: "issue".to_string(),
                record_external_id: "12".to_string(),
                url: "https://cdn.example.com/abc-123.png".to_string(),
                created_at: chrono::Utc::now(),
            }]])
            .into_connection();
        let ctx = test_context_with(
            db,
            Arc::new(ScriptedClient::new()),
            Arc::new(CollectingQueue::new()),
            Arc::new(MapUserResolver::empty()),
            ImportSettings::default(),
        );

        let repr = ObjectRepresentation::new(
            ObjectType::Attachment,
            "abc-123",
            json!({
                "id": "abc-123",
                "record_type": "issue",
                "record_external_id": "12",
                "url": "https://cdn.example.com/abc-123.png"
            }),
        );
        AttachmentAdapter.import_object(&ctx, &repr).await.unwrap();

        assert_eq!(ctx.db.into_transaction_log().len(), 2);
    }
}
