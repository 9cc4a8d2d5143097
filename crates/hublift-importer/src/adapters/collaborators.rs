//! Collaborator import. The external identity is stored directly, so no
//! author resolution is involved.

use crate::adapter::ObjectAdapter;
use crate::context::RunContext;
use crate::error::ImportTaskError;
use async_trait::async_trait;
use hublift_core::{ObjectRepresentation, ObjectType};
use hublift_entities::collaborators;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use tracing::debug;

use super::{parse_payload, timestamp_or_now};

pub struct CollaboratorAdapter;

#[derive(Debug, Deserialize)]
struct CollaboratorPayload {
    id: i64,
    login: String,
    #[serde(default = "default_role")]
    role_name: String,
}

fn default_role() -> String {
    "read".to_string()
}

#[async_trait]
impl ObjectAdapter for CollaboratorAdapter {
    fn object_type(&self) -> ObjectType {
        ObjectType::Collaborator
    }

    fn collection_name(&self) -> &'static str {
        "collaborators"
    }

    fn task_type(&self) -> &'static str {
        "import_collaborator"
    }

    async fn import_object(
        &self,
        ctx: &RunContext,
        representation: &ObjectRepresentation,
    ) -> Result<(), ImportTaskError> {
        let payload: CollaboratorPayload = parse_payload(representation)?;

        let existing = collaborators::Entity::find()
            .filter(collaborators::Column::ProjectId.eq(ctx.project_id))
            .filter(collaborators::Column::ExternalUserId.eq(payload.id))
            .one(&ctx.db)
            .await?;
        if existing.is_some() {
            debug!(login = %payload.login, "Collaborator already imported, skipping");
            return Ok(());
        }

        collaborators::Entity::insert(collaborators::ActiveModel {
            project_id: Set(ctx.project_id),
            external_user_id: Set(payload.id),
            login: Set(payload.login),
            access_level: Set(payload.role_name),
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

    fn collaborator_model(id: i64) -> collaborators::Model {
        collaborators::Model {
            id,
            project_id: 1,
            external_user_id: 500,
            login: "alice".to_string(),
            access_level: "admin".to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn imports_role_as_access_level() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<collaborators::Model, _, _>([vec![]])
            .append_query_results([vec![collaborator_model(1)]])
            .into_connection();
        let ctx = test_context_with(
            db,
            Arc::new(ScriptedClient::new()),
            Arc::new(CollectingQueue::new()),
            Arc::new(MapUserResolver::empty()),
            ImportSettings::default(),
        );

        let repr = ObjectRepresentation::new(
            ObjectType::Collaborator,
            "500",
            json!({"id": 500, "login": "alice", "role_name": "admin"}),
        );
        CollaboratorAdapter.import_object(&ctx, &repr).await.unwrap();

        assert_eq!(ctx.db.into_transaction_log().len(), 2);
    }

    #[tokio::test]
    async fn reimport_is_a_no_op() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![collaborator_model(1)]])
            .into_connection();
        let ctx = test_context_with(
            db,
            Arc::new(ScriptedClient::new()),
            Arc::new(CollectingQueue::new()),
            Arc::new(MapUserResolver::empty()),
            ImportSettings::default(),
        );

        let repr = ObjectRepresentation::new(
            ObjectType::Collaborator,
            "500",
            json!({"id": 500, "login": "alice"}),
        );
        CollaboratorAdapter.import_object(&ctx, &repr).await.unwrap();

        assert_eq!(ctx.db.into_transaction_log().len(), 1);
    }
}
