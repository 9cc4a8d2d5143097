//! Bulk persister: writes one fetched page of objects as a single batch
//! insert, for object types cheap enough to skip per-object tasks.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Insert, IntoActiveModel};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// One raw object rejected during row building. The batch continues without
/// the rejected object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {object_kind} row: {details}")]
pub struct RowValidationError {
    pub object_kind: &'static str,
    pub details: String,
}

impl RowValidationError {
    pub fn new(object_kind: &'static str, details: impl Into<String>) -> Self {
        Self {
            object_kind,
            details: details.into(),
        }
    }
}

/// Maps raw objects of one type onto insertable rows.
///
/// `already_imported` is the natural-key pre-filter: the batch insert is
/// all-or-nothing, so any row that would collide on a unique key must be
/// filtered out before the insert is issued.
#[async_trait]
pub trait BulkMapper: Send + Sync {
    type Entity: EntityTrait;

    /// Kind tag used in logs and validation errors.
    fn object_kind(&self) -> &'static str;

    fn build_row(
        &self,
        project_id: i64,
        raw: &Value,
    ) -> Result<<Self::Entity as EntityTrait>::ActiveModel, RowValidationError>;

    /// Whether a row with this object's natural key already exists locally.
    async fn already_imported(
        &self,
        db: &DatabaseConnection,
        project_id: i64,
        raw: &Value,
    ) -> Result<bool, DbErr>;
}

/// Result of persisting one page.
#[derive(Debug)]
pub struct BulkOutcome<M> {
    /// Inserted rows, with their generated primary keys.
    pub models: Vec<M>,
    pub invalid: Vec<RowValidationError>,
    /// Rows skipped by the natural-key pre-filter.
    pub already_present: u64,
}

impl<M> BulkOutcome<M> {
    pub fn inserted(&self) -> u64 {
        self.models.len() as u64
    }
}

pub struct BulkPersister;

impl BulkPersister {
    /// Build, filter, and insert one page of raw objects.
    ///
    /// Invalid objects are segregated into the outcome rather than failing the
    /// batch; only database errors fail the whole page.
    pub async fn persist<M>(
        db: &DatabaseConnection,
        mapper: &M,
        project_id: i64,
        raws: &[Value],
    ) -> Result<BulkOutcome<<M::Entity as EntityTrait>::Model>, DbErr>
    where
        M: BulkMapper,
        <M::Entity as EntityTrait>::Model:
            IntoActiveModel<<M::Entity as EntityTrait>::ActiveModel>,
    {
        let mut rows = Vec::with_capacity(raws.len());
        let mut invalid = Vec::new();
        let mut already_present = 0u64;

        for raw in raws {
            if mapper.already_imported(db, project_id, raw).await? {
                already_present += 1;
                continue;
            }
            match mapper.build_row(project_id, raw) {
                Ok(row) => rows.push(row),
                Err(err) => {
                    warn!(kind = mapper.object_kind(), "Rejected raw object: {}", err);
                    invalid.push(err);
                }
            }
        }

        let models = if rows.is_empty() {
            Vec::new()
        } else {
            Insert::many(rows).exec_with_returning_many(db).await?
        };

        debug!(
            kind = mapper.object_kind(),
            inserted = models.len(),
            invalid = invalid.len(),
            already_present,
            "Persisted page"
        );

        Ok(BulkOutcome {
            models,
            invalid,
            already_present,
        })
    }
}
