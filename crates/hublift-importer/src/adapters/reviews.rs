//! Pull request review import.
//!
//! Reviews live in a nested collection, one per pull request, so the adapter
//! enumerates collections from the already-imported pull requests and folds
//! the parent number into each dispatched payload. Reviews are stored as
//! pull-request notes; an approval without a body becomes a short marker
//! note.

use crate::adapter::{ObjectAdapter, RepresentationError};
use crate::client::CollectionRef;
use crate::context::RunContext;
use crate::error::ImportTaskError;
use crate::ledger::PlaceholderReference;
use async_trait::async_trait;
use hublift_core::{ExternalUser, ObjectRepresentation, ObjectType};
use hublift_entities::{notes, pull_requests};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{parse_payload, timestamp_or_now};

pub struct ReviewAdapter;

#[derive(Debug, Deserialize)]
struct ReviewPayload {
    id: i64,
    #[serde(default)]
    body: Option<String>,
    state: String,
    pull_request_number: i64,
    #[serde(default)]
    user: Option<ExternalUser>,
}

#[async_trait]
impl ObjectAdapter for ReviewAdapter {
    fn object_type(&self) -> ObjectType {
        ObjectType::Review
    }

    fn collection_name(&self) -> &'static str {
        "pull_request_reviews"
    }

    fn task_type(&self) -> &'static str {
        "import_review"
    }

    async fn collections(&self, ctx: &RunContext) -> Result<Vec<CollectionRef>, ImportTaskError> {
        let pulls = pull_requests::Entity::find()
            .filter(pull_requests::Column::ProjectId.eq(ctx.project_id))
            .order_by_asc(pull_requests::Column::ExternalIid)
            .all(&ctx.db)
            .await?;
        Ok(pulls
            .into_iter()
            .map(|pr| CollectionRef::nested(self.collection_name(), pr.external_iid.to_string()))
            .collect())
    }

    /// Fold the parent pull request number into the payload, so the import
    /// task is self-contained.
    fn build_representation(
        &self,
        collection: &CollectionRef,
        raw: &Value,
    ) -> Result<ObjectRepresentation, RepresentationError> {
        let id = self
            .already_imported_id(raw)
            .ok_or_else(|| RepresentationError("raw review has no id".to_string()))?;
        let parent = collection
            .parent
            .as_deref()
            .and_then(|parent| parent.parse::<i64>().ok())
            .ok_or_else(|| {
                RepresentationError("review collection has no parent pull request".to_string())
            })?;
        let mut data = raw.clone();
        if let Value::Object(map) = &mut data {
            map.insert("pull_request_number".to_string(), Value::from(parent));
        }
        Ok(ObjectRepresentation::new(self.object_type(), id, data))
    }

    async fn import_object(
        &self,
        ctx: &RunContext,
        representation: &ObjectRepresentation,
    ) -> Result<(), ImportTaskError> {
        let payload: ReviewPayload = parse_payload(representation)?;

        let existing = notes::Entity::find()
            .filter(notes::Column::ProjectId.eq(ctx.project_id))
            .filter(notes::Column::ExternalId.eq(payload.id))
            .one(&ctx.db)
            .await?;
        if existing.is_some() {
            debug!(external_id = payload.id, "Review already imported, skipping");
            return Ok(());
        }

        let pr = super::pull_requests::find_pull_request(
            &ctx.db,
            ctx.project_id,
            payload.pull_request_number,
        )
        .await?
        .ok_or_else(|| {
            ImportTaskError::UnresolvedParent(format!(
                "no pull request #{}",
                payload.pull_request_number
            ))
        })?;

        let finder = ctx.user_finder();
        let (author_id, author_found) = finder.author_id_for(payload.user.as_ref()).await?;

        let body = match payload.body.filter(|body| !body.is_empty()) {
            Some(body) => body,
            None => format!("*{}*", payload.state.to_lowercase()),
        };

        let model = notes::Entity::insert(notes::ActiveModel {
            project_id: Set(ctx.project_id),
            external_id: Set(payload.id),
            noteable_type: Set("pull_request".to_string()),
            noteable_id: Set(pr.id),
            author_id: Set(author_id),
            body: Set(body),
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
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    fn pr_model(id: i64, number: i64) -> pull_requests::Model {
        pull_requests::Model {
            id,
            project_id: 1,
            external_iid: number,
            title: "Add retry".to_string(),
            body: None,
            state: "open".to_string(),
            source_branch: "feature/retry".to_string(),
            target_branch: "main".to_string(),
            author_id: 42,
            merged_at: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn enumerates_one_collection_per_pull_request() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pr_model(3, 17), pr_model(4, 21)]])
            .into_connection();
        let ctx = test_context_with(
            db,
            Arc::new(ScriptedClient::new()),
            Arc::new(CollectingQueue::new()),
            Arc::new(MapUserResolver::empty()),
            ImportSettings::default(),
        );

        let collections = ReviewAdapter.collections(&ctx).await.unwrap();
        assert_eq!(
            collections,
            vec![
                CollectionRef::nested("pull_request_reviews", "17"),
                CollectionRef::nested("pull_request_reviews", "21"),
            ]
        );
    }

    #[test]
    fn representation_carries_the_parent_number() {
        let collection = CollectionRef::nested("pull_request_reviews", "17");
        let repr = ReviewAdapter
            .build_representation(&collection, &json!({"id": 301, "state": "APPROVED"}))
            .unwrap();

        assert_eq!(repr.external_id, "301");
        assert_eq!(repr.data["pull_request_number"], 17);
    }

    #[test]
    fn project_level_collection_is_rejected() {
        let collection = CollectionRef::project("pull_request_reviews");
        assert!(ReviewAdapter
            .build_representation(&collection, &json!({"id": 301}))
            .is_err());
    }

    #[tokio::test]
    async fn approval_without_body_becomes_a_marker_note() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // note existence lookup
            .append_query_results::<notes::Model, _, _>([vec![]])
            // parent pull request lookup
            .append_query_results([vec![pr_model(3, 17)]])
            // insert returning the new note
            .append_query_results([vec![notes::Model {
                id: 9,
                project_id: 1,
                external_id: 301,
                noteable_type: "pull_request".to_string(),
                noteable_id: 3,
                author_id: 42,
                body: "*approved*".to_string(),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            }]])
            .into_connection();
        let ctx = test_context_with(
            db,
            Arc::new(ScriptedClient::new()),
            Arc::new(CollectingQueue::new()),
            Arc::new(MapUserResolver::new(std::collections::HashMap::from([(
                500, 42,
            )]))),
            ImportSettings::default(),
        );

        let repr = ObjectRepresentation::new(
            ObjectType::Review,
            "301",
            json!({
                "id": 301,
                "state": "APPROVED",
                "pull_request_number": 17,
                "user": {"id": 500, "login": "alice"}
            }),
        );
        ReviewAdapter.import_object(&ctx, &repr).await.unwrap();

        assert_eq!(ctx.db.into_transaction_log().len(), 3);
    }
}
