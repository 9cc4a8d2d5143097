//! Protected branch import. Branches have no numeric id upstream; the branch
//! name is both the dedup id and the natural key.

use crate::adapter::ObjectAdapter;
use crate::context::RunContext;
use crate::error::ImportTaskError;
use async_trait::async_trait;
use hublift_core::{ObjectRepresentation, ObjectType};
use hublift_entities::protected_branches;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{parse_payload, timestamp_or_now};

pub struct ProtectedBranchAdapter;

#[derive(Debug, Deserialize)]
struct ProtectedBranchPayload {
    name: String,
    #[serde(default)]
    allow_force_push: bool,
    #[serde(default)]
    require_reviews: bool,
}

#[async_trait]
impl ObjectAdapter for ProtectedBranchAdapter {
    fn object_type(&self) -> ObjectType {
        ObjectType::ProtectedBranch
    }

    fn collection_name(&self) -> &'static str {
        "protected_branches"
    }

    fn task_type(&self) -> &'static str {
        "import_protected_branch"
    }

    fn already_imported_id(&self, raw: &Value) -> Option<String> {
        raw.get("name")
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
            .map(String::from)
    }

    async fn import_object(
        &self,
        ctx: &RunContext,
        representation: &ObjectRepresentation,
    ) -> Result<(), ImportTaskError> {
        let payload: ProtectedBranchPayload = parse_payload(representation)?;

        let existing = protected_branches::Entity::find()
            .filter(protected_branches::Column::ProjectId.eq(ctx.project_id))
            .filter(protected_branches::Column::Name.eq(&payload.name))
            .one(&ctx.db)
            .await?;
        if existing.is_some() {
            debug!(name = %payload.name, "Protected branch already imported, skipping");
            return Ok(());
        }

        protected_branches::Entity::insert(protected_branches::ActiveModel {
            project_id: Set(ctx.project_id),
            name: Set(payload.name),
            allow_force_push: Set(payload.allow_force_push),
            require_reviews: Set(payload.require_reviews),
            created_at: Set(timestamp_or_now(representation.created_at)),
            ..Default::default()
        })
        .exec_with_returning(&ctx.db)
        .await?;

        Ok(())
    }
}
