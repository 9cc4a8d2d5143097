//! Placeholder-reference ledger.
//!
//! Whenever an authored record is written with the fallback user standing in
//! for an unresolved external identity, one row lands here. The ledger is the
//! durable work list for a later reconciliation pass; without it the original
//! authorship would be silently lost.

use hublift_entities::placeholder_references;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use tracing::debug;

/// One unresolved authorship: `record_table.column_name` of `record_id` holds
/// the fallback user instead of external user `external_user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderReference {
    pub record_table: &'static str,
    pub record_id: i64,
    pub column_name: &'static str,
    pub external_user_id: i64,
    pub external_login: Option<String>,
}

#[derive(Clone)]
pub struct PlaceholderReferenceLedger {
    db: DatabaseConnection,
}

impl PlaceholderReferenceLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Record one unresolved authorship. Exactly one row per record/column
    /// pair is expected; the caller only pushes after substituting the
    /// fallback user.
    pub async fn push(
        &self,
        project_id: i64,
        reference: PlaceholderReference,
    ) -> Result<(), DbErr> {
        debug!(
            project_id,
            table = reference.record_table,
            record_id = reference.record_id,
            column = reference.column_name,
            external_user_id = reference.external_user_id,
            "Recording placeholder reference"
        );
        placeholder_references::Entity::insert(row(project_id, reference))
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    /// Record a batch of unresolved authorships in one write.
    pub async fn push_many(
        &self,
        project_id: i64,
        references: Vec<PlaceholderReference>,
    ) -> Result<(), DbErr> {
        if references.is_empty() {
            return Ok(());
        }
        let rows: Vec<placeholder_references::ActiveModel> = references
            .into_iter()
            .map(|reference| row(project_id, reference))
            .collect();
        placeholder_references::Entity::insert_many(rows)
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    /// All pending references for one project, for reconciliation tooling.
    pub async fn pending(
        &self,
        project_id: i64,
    ) -> Result<Vec<placeholder_references::Model>, DbErr> {
        placeholder_references::Entity::find()
            .filter(placeholder_references::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await
    }
}

fn row(
    project_id: i64,
    reference: PlaceholderReference,
) -> placeholder_references::ActiveModel {
    placeholder_references::ActiveModel {
        project_id: Set(project_id),
        record_table: Set(reference.record_table.to_string()),
        record_id: Set(reference.record_id),
        column_name: Set(reference.column_name.to_string()),
        external_user_id: Set(reference.external_user_id),
        external_login: Set(reference.external_login),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
}
