//! Issue import, one task per object.

use crate::adapter::ObjectAdapter;
use crate::context::RunContext;
use crate::error::ImportTaskError;
use crate::ledger::PlaceholderReference;
use async_trait::async_trait;
use hublift_core::{ExternalUser, ObjectRepresentation, ObjectType};
use hublift_entities::issues;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use tracing::debug;

use super::{parse_payload, timestamp_or_now};

pub struct IssueAdapter;

#[derive(Debug, Deserialize)]
struct IssuePayload {
    number: i64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default = "default_state")]
    state: String,
    #[serde(default)]
    user: Option<ExternalUser>,
    #[serde(default)]
    assignee: Option<ExternalUser>,
}

fn default_state() -> String {
    "open".to_string()
}

pub(crate) async fn find_issue(
    db: &DatabaseConnection,
    project_id: i64,
    external_iid: i64,
) -> Result<Option<issues::Model>, DbErr> {
    issues::Entity::find()
        .filter(issues::Column::ProjectId.eq(project_id))
        .filter(issues::Column::ExternalIid.eq(external_iid))
        .one(db)
        .await
}

#[async_trait]
impl ObjectAdapter for IssueAdapter {
    fn object_type(&self) -> ObjectType {
        ObjectType::Issue
    }

    fn collection_name(&self) -> &'static str {
        "issues"
    }

    fn task_type(&self) -> &'static str {
        "import_issue"
    }

    async fn import_object(
        &self,
        ctx: &RunContext,
        representation: &ObjectRepresentation,
    ) -> Result<(), ImportTaskError> {
        let payload: IssuePayload = parse_payload(representation)?;

        if find_issue(&ctx.db, ctx.project_id, payload.number)
            .await?
            .is_some()
        {
            debug!(number = payload.number, "Issue already imported, skipping");
            return Ok(());
        }

        let finder = ctx.user_finder();
        let (author_id, author_found) = finder.author_id_for(payload.user.as_ref()).await?;
        let (assignee_id, assignee_found) = match &payload.assignee {
            Some(assignee) => {
                let (id, found) = finder.author_id_for(Some(assignee)).await?;
                (Some(id), found)
            }
            None => (None, true),
        };

        let model = issues::Entity::insert(issues::ActiveModel {
            project_id: Set(ctx.project_id),
            external_iid: Set(payload.number),
            title: Set(payload.title),
            body: Set(payload.body),
            state: Set(payload.state),
            author_id: Set(author_id),
            assignee_id: Set(assignee_id),
            created_at: Set(timestamp_or_now(representation.created_at)),
            updated_at: Set(timestamp_or_now(representation.updated_at)),
            ..Default::default()
        })
        .exec_with_returning(&ctx.db)
        .await?;

        let ledger = ctx.ledger();
        if !author_found {
            if let Some(user) = &payload.user {
                ledger
                    .push(
                        ctx.project_id,
                        PlaceholderReference {
                            record_table: "issues",
                            record_id: model.id,
                            column_name: "author_id",
                            external_user_id: user.id,
                            external_login: Some(user.login.clone()),
                        },
                    )
                    .await?;
            }
        }
        if !assignee_found {
            if let Some(assignee) = &payload.assignee {
                ledger
                    .push(
                        ctx.project_id,
                        PlaceholderReference {
                            record_table: "issues",
                            record_id: model.id,
                            column_name: "assignee_id",
                            external_user_id: assignee.id,
                            external_login: Some(assignee.login.clone()),
                        },
                    )
                    .await?;
            }
        }

        Ok(())
    }
}
