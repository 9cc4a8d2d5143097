//! Release import, bulk per page with author resolution.
//!
//! Authors are resolved before the batch insert; unresolved identities get
//! the fallback user and, once generated ids are back, one placeholder
//! reference per affected row.

use crate::adapter::{ImportStrategy, ObjectAdapter};
use crate::context::RunContext;
use crate::error::ImportTaskError;
use crate::ledger::PlaceholderReference;
use crate::persister::{BulkMapper, BulkPersister, RowValidationError};
use crate::user_finder::external_author;
use async_trait::async_trait;
use hublift_core::{parse_timestamp, ExternalUser, ObjectType};
use hublift_entities::releases;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde_json::Value;
use std::collections::HashMap;

use super::timestamp_or_now;

pub struct ReleaseAdapter;

struct ReleaseMapper {
    /// Resolved local author id per tag, filled before the batch insert.
    authors: HashMap<String, i64>,
}

#[async_trait]
impl BulkMapper for ReleaseMapper {
    type Entity = releases::Entity;

    fn object_kind(&self) -> &'static str {
        "release"
    }

    fn build_row(
        &self,
        project_id: i64,
        raw: &Value,
    ) -> Result<releases::ActiveModel, RowValidationError> {
        let external_id = raw
            .get("id")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| RowValidationError::new("release", "missing id"))?;
        let tag_name = raw
            .get("tag_name")
            .and_then(|v| v.as_str())
            .filter(|tag| !tag.is_empty())
            .ok_or_else(|| RowValidationError::new("release", "missing tag_name"))?;

        Ok(releases::ActiveModel {
            project_id: Set(project_id),
            external_id: Set(external_id),
            tag_name: Set(tag_name.to_string()),
            name: Set(raw.get("name").and_then(|v| v.as_str()).map(String::from)),
            body: Set(raw.get("body").and_then(|v| v.as_str()).map(String::from)),
            author_id: Set(self.authors.get(tag_name).copied()),
            released_at: Set(parse_timestamp(raw, "published_at")),
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
        let tag_name = match raw.get("tag_name").and_then(|v| v.as_str()) {
            Some(tag) => tag,
            None => return Ok(false),
        };
        Ok(releases::Entity::find()
            .filter(releases::Column::ProjectId.eq(project_id))
            .filter(releases::Column::TagName.eq(tag_name))
            .one(db)
            .await?
            .is_some())
    }
}

#[async_trait]
impl ObjectAdapter for ReleaseAdapter {
    fn object_type(&self) -> ObjectType {
        ObjectType::Release
    }

    fn collection_name(&self) -> &'static str {
        "releases"
    }

    fn task_type(&self) -> &'static str {
        "import_releases_page"
    }

    fn strategy(&self) -> ImportStrategy {
        ImportStrategy::BulkPage
    }

    async fn import_page(&self, ctx: &RunContext, raws: &[Value]) -> Result<u64, ImportTaskError> {
        let finder = ctx.user_finder();
        let mut authors = HashMap::new();
        let mut unresolved: HashMap<String, ExternalUser> = HashMap::new();

        for raw in raws {
            let tag = match raw.get("tag_name").and_then(|v| v.as_str()) {
                Some(tag) => tag.to_string(),
                None => continue,
            };
            if let Some(author) = external_author(raw, "author") {
                let (author_id, found) = finder.author_id_for(Some(&author)).await?;
                authors.insert(tag.clone(), author_id);
                if !found {
                    unresolved.insert(tag, author);
                }
            }
        }

        let mapper = ReleaseMapper { authors };
        let outcome = BulkPersister::persist(&ctx.db, &mapper, ctx.project_id, raws).await?;
        if !outcome.invalid.is_empty() {
            ctx.counters()
                .add_failed(&ctx.scope_for(self.object_type()), outcome.invalid.len() as i64)
                .await?;
        }

        let references: Vec<PlaceholderReference> = outcome
            .models
            .iter()
            .filter_map(|model| {
                unresolved.get(&model.tag_name).map(|author| PlaceholderReference {
                    record_table: "releases",
                    record_id: model.id,
                    column_name: "author_id",
                    external_user_id: author.id,
                    external_login: Some(author.login.clone()),
                })
            })
            .collect();
        ctx.ledger().push_many(ctx.project_id, references).await?;

        Ok(outcome.inserted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context_with, CollectingQueue, ScriptedClient};
    use crate::user_finder::MapUserResolver;
    use hublift_core::ImportSettings;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn release_model(id: i64, tag: &str, author_id: Option<i64>) -> releases::Model {
        releases::Model {
            id,
            project_id: 1,
            external_id: id,
            tag_name: tag.to_string(),
            name: None,
            body: None,
            author_id,
            released_at: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn unresolved_author_gets_fallback_and_placeholder() {
        let settings = ImportSettings::default();
        let fallback = settings.fallback_user_id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // natural-key lookups
            .append_query_results::<releases::Model, _, _>([vec![], vec![]])
            // batch insert returning both rows
            .append_query_results([vec![
                release_model(10, "v1.0", Some(42)),
                release_model(11, "v1.1", Some(fallback)),
            ]])
            // placeholder ledger insert
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }])
            .into_connection();

        // alice (500) resolves to 42; ghost (600) has no mapping
        let users = Arc::new(MapUserResolver::new(std::collections::HashMap::from([(
            500, 42,
        )])));
        let ctx = test_context_with(
            db,
            Arc::new(ScriptedClient::new()),
            Arc::new(CollectingQueue::new()),
            users,
            settings,
        );

        let raws = vec![
            json!({"id": 10, "tag_name": "v1.0", "author": {"id": 500, "login": "alice"}}),
            json!({"id": 11, "tag_name": "v1.1", "author": {"id": 600, "login": "ghost"}}),
        ];
        let imported = ReleaseAdapter.import_page(&ctx, &raws).await.unwrap();
        assert_eq!(imported, 2);

        // Two natural-key lookups, the batch insert, and the placeholder
        // write for ghost's release.
        assert_eq!(ctx.db.into_transaction_log().len(), 4);
    }
}
