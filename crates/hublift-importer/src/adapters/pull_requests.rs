//! Pull request import, one task per object.

use crate::adapter::ObjectAdapter;
use crate::context::RunContext;
use crate::error::ImportTaskError;
use crate::ledger::PlaceholderReference;
use async_trait::async_trait;
use hublift_core::{parse_timestamp, ExternalUser, ObjectRepresentation, ObjectType};
use hublift_entities::pull_requests;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use tracing::debug;

use super::{parse_payload, timestamp_or_now};

pub struct PullRequestAdapter;

#[derive(Debug, Deserialize)]
struct BranchRef {
    #[serde(rename = "ref")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: i64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default = "default_state")]
    state: String,
    head: BranchRef,
    base: BranchRef,
    #[serde(default)]
    user: Option<ExternalUser>,
}

fn default_state() -> String {
    "open".to_string()
}

pub(crate) async fn find_pull_request(
    db: &DatabaseConnection,
    project_id: i64,
    external_iid: i64,
) -> Result<Option<pull_requests::Model>, DbErr> {
    pull_requests::Entity::find()
        .filter(pull_requests::Column::ProjectId.eq(project_id))
        .filter(pull_requests::Column::ExternalIid.eq(external_iid))
        .one(db)
        .await
}

#[async_trait]
impl ObjectAdapter for PullRequestAdapter {
    fn object_type(&self) -> ObjectType {
        ObjectType::PullRequest
    }

    fn collection_name(&self) -> &'static str {
        "pull_requests"
    }

    fn task_type(&self) -> &'static str {
        "import_pull_request"
    }

    async fn import_object(
        &self,
        ctx: &RunContext,
        representation: &ObjectRepresentation,
    ) -> Result<(), ImportTaskError> {
        let payload: PullRequestPayload = parse_payload(representation)?;

        if find_pull_request(&ctx.db, ctx.project_id, payload.number)
            .await?
            .is_some()
        {
            debug!(number = payload.number, "Pull request already imported, skipping");
            return Ok(());
        }

        let finder = ctx.user_finder();
        let (author_id, author_found) = finder.author_id_for(payload.user.as_ref()).await?;

        let model = pull_requests::Entity::insert(pull_requests::ActiveModel {
            project_id: Set(ctx.project_id),
            external_iid: Set(payload.number),
            title: Set(payload.title),
            body: Set(payload.body),
            state: Set(payload.state),
            source_branch: Set(payload.head.name),
            target_branch: Set(payload.base.name),
            author_id: Set(author_id),
            merged_at: Set(parse_timestamp(&representation.data, "merged_at")),
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
                            record_table: "pull_requests",
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
