//! Comment import. Comments attach to issues or pull requests through the
//! parent's external number; a missing parent defers the comment instead of
//! failing it.

use crate::adapter::ObjectAdapter;
use crate::context::RunContext;
use crate::error::ImportTaskError;
use crate::ledger::PlaceholderReference;
use async_trait::async_trait;
use hublift_core::{ExternalUser, ObjectRepresentation, ObjectType};
use hublift_entities::notes;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use tracing::debug;

use super::{parse_payload, timestamp_or_now};

pub struct NoteAdapter;

#[derive(Debug, Deserialize)]
struct NotePayload {
    id: i64,
    body: String,
    /// External number of the issue or pull request the comment belongs to.
    issue_number: i64,
    #[serde(default)]
    user: Option<ExternalUser>,
}

/// Locate the local parent record for an external issue/PR number. Issues and
/// pull requests share one number sequence upstream, so both tables are
/// checked.
pub(crate) async fn find_noteable(
    ctx: &RunContext,
    external_number: i64,
) -> Result<Option<(&'static str, i64)>, ImportTaskError> {
    if let Some(issue) = super::issues::find_issue(&ctx.db, ctx.project_id, external_number).await?
    {
        return Ok(Some(("issue", issue.id)));
    }
    if let Some(pr) =
        super::pull_requests::find_pull_request(&ctx.db, ctx.project_id, external_number).await?
    {
        return Ok(Some(("pull_request", pr.id)));
    }
    Ok(None)
}

#[async_trait]
impl ObjectAdapter for NoteAdapter {
    fn object_type(&self) -> ObjectType {
        ObjectType::Note
    }

    fn collection_name(&self) -> &'static str {
        "issue_comments"
    }

    fn task_type(&self) -> &'static str {
        "import_note"
    }

    async fn import_object(
        &self,
        ctx: &RunContext,
        representation: &ObjectRepresentation,
    ) -> Result<(), ImportTaskError> {
        let payload: NotePayload = parse_payload(representation)?;

        let existing = notes::Entity::find()
            .filter(notes::Column::ProjectId.eq(ctx.project_id))
            .filter(notes::Column::ExternalId.eq(payload.id))
            .one(&ctx.db)
            .await?;
        if existing.is_some() {
            debug!(external_id = payload.id, "Note already imported, skipping");
            return Ok(());
        }

        let (noteable_type, noteable_id) = find_noteable(ctx, payload.issue_number)
            .await?
            .ok_or_else(|| {
                ImportTaskError::UnresolvedParent(format!(
                    "no issue or pull request #{}",
                    payload.issue_number
                ))
            })?;

        let finder = ctx.user_finder();
        let (author_id, author_found) = finder.author_id_for(payload.user.as_ref()).await?;

        let model = notes::Entity::insert(notes::ActiveModel {
            project_id: Set(ctx.project_id),
            external_id: Set(payload.id),
            noteable_type: Set(noteable_type.to_string()),
            noteable_id: Set(noteable_id),
            author_id: Set(author_id),
            body: Set(payload.body),
            created_at: Set(timestamp_or_now(representation.created_at)),
            updated_at: Set(timestamp_or_now(representation.updated_at)),
            ..Default::default()
        })
        .exec_with_returning(&ctx.db)
        .await?;

        if !author_found {
            if let Some(user) = &payload.user {
                ctx.ledger()
                    .push(
                        ctx.project_id,
                        PlaceholderReference {
                            record_table: "notes",
                            record_id: model.id,
                            column_name: "author_id",
                            external_user_id: user.id,
                            external_login: Some(user.login.clone()),
                        },
                    )
                    .await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context_with, CollectingQueue, ScriptedClient};
    use crate::user_finder::MapUserResolver;
    use hublift_core::ImportSettings;
    use hublift_entities::issues;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn ctx_with(db: DatabaseConnection) -> RunContext {
        test_context_with(
            db,
            Arc::new(ScriptedClient::new()),
            Arc::new(CollectingQueue::new()),
            Arc::new(MapUserResolver::new(HashMap::from([(500, 42)]))),
            ImportSettings::default(),
        )
    }

    fn issue_model(id: i64, number: i64) -> issues::Model {
        issues::Model {
            id,
            project_id: 1,
            external_iid: number,
            title: "Broken build".to_string(),
            body: None,
            state: "open".to_string(),
            author_id: 42,
            assignee_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn note_model(id: i64) -> notes::Model {
        notes::Model {
            id,
            project_id: 1,
            external_id: 900,
            noteable_type: "issue".to_string(),
            noteable_id: 7,
            author_id: 42,
            body: "Looks good".to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn representation(data: serde_json::Value) -> ObjectRepresentation {
        let id = data["id"].as_i64().unwrap().to_string();
        ObjectRepresentation::new(ObjectType::Note, id, data)
    }

    #[tokio::test]
    async fn attaches_to_the_parent_issue() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // note existence lookup
            .append_query_results::<notes::Model, _, _>([vec![]])
            // parent issue lookup
            .append_query_results([vec![issue_model(7, 12)]])
            // insert returning the new note
            .append_query_results([vec![note_model(1)]])
            .into_connection();
        let ctx = ctx_with(db);

        let repr = representation(json!({
            "id": 900,
            "body": "Looks good",
            "issue_number": 12,
            "user": {"id": 500, "login": "alice"}
        }));
        NoteAdapter.import_object(&ctx, &repr).await.unwrap();

        assert_eq!(ctx.db.into_transaction_log().len(), 3);
    }

    #[tokio::test]
    async fn missing_parent_is_an_unresolved_parent_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // note lookup, issue lookup, pull request lookup: all empty
            .append_query_results::<notes::Model, _, _>([vec![]])
            .append_query_results::<issues::Model, _, _>([vec![]])
            .append_query_results::<hublift_entities::pull_requests::Model, _, _>([vec![]])
            .into_connection();
        let ctx = ctx_with(db);

        let repr = representation(json!({
            "id": 900,
            "body": "Looks good",
            "issue_number": 99
        }));
        let err = NoteAdapter.import_object(&ctx, &repr).await.unwrap_err();
        assert!(matches!(err, ImportTaskError::UnresolvedParent(_)));
    }

    #[tokio::test]
    async fn reimporting_an_existing_note_is_a_no_op() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![note_model(1)]])
            .into_connection();
        let ctx = ctx_with(db);

        let repr = representation(json!({
            "id": 900,
            "body": "Looks good",
            "issue_number": 12
        }));
        NoteAdapter.import_object(&ctx, &repr).await.unwrap();

        assert_eq!(ctx.db.into_transaction_log().len(), 1);
    }
}
