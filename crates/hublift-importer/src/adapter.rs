//! The per-object-type adapter contract and its static registry.
//!
//! Adapters are thin plugins: they know their external collection, how to
//! extract a dedup id from a raw object, how to build a representation, and
//! how to map the representation onto local records. The scheduling machinery
//! is shared and lives in `driver`.

use crate::client::CollectionRef;
use crate::context::RunContext;
use crate::error::ImportTaskError;
use async_trait::async_trait;
use hublift_core::{ObjectRepresentation, ObjectType};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Cannot build representation: {0}")]
pub struct RepresentationError(pub String);

/// How the driver handles a page of unseen objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStrategy {
    /// One import task dispatched per object.
    Dispatch,
    /// The whole page is written in one batch through the bulk persister,
    /// bypassing per-object task overhead.
    BulkPage,
}

#[async_trait]
pub trait ObjectAdapter: Send + Sync {
    fn object_type(&self) -> ObjectType;

    /// Name of the external collection to paginate.
    fn collection_name(&self) -> &'static str;

    /// Import task identifier carried in dispatched job payloads.
    fn task_type(&self) -> &'static str;

    fn strategy(&self) -> ImportStrategy {
        ImportStrategy::Dispatch
    }

    /// Id used for dedup-cache membership. `None` means the raw object is
    /// missing its identity and cannot be imported.
    fn already_imported_id(&self, raw: &Value) -> Option<String> {
        raw.get("id")
            .and_then(|v| v.as_i64())
            .map(|id| id.to_string())
    }

    /// Build the immutable DTO an import task consumes. The collection is
    /// passed so adapters for nested collections can fold the parent identity
    /// into the payload.
    fn build_representation(
        &self,
        collection: &CollectionRef,
        raw: &Value,
    ) -> Result<ObjectRepresentation, RepresentationError> {
        let _ = collection;
        let id = self
            .already_imported_id(raw)
            .ok_or_else(|| RepresentationError("raw object has no id".to_string()))?;
        Ok(ObjectRepresentation::new(self.object_type(), id, raw.clone()))
    }

    /// Collections to paginate for this object type. The default is a single
    /// project-level collection; adapters for nested objects enumerate one
    /// collection per parent entity.
    async fn collections(&self, ctx: &RunContext) -> Result<Vec<CollectionRef>, ImportTaskError> {
        let _ = ctx;
        Ok(vec![CollectionRef::project(self.collection_name())])
    }

    /// Import one dispatched object. Must be idempotent: at-least-once
    /// delivery means the same representation can arrive twice.
    async fn import_object(
        &self,
        ctx: &RunContext,
        representation: &ObjectRepresentation,
    ) -> Result<(), ImportTaskError> {
        let _ = (ctx, representation);
        Err(ImportTaskError::InvalidPayload(format!(
            "{} does not import per object",
            self.task_type()
        )))
    }

    /// Import a page of unseen objects in one batch. Returns how many rows
    /// were written.
    async fn import_page(&self, ctx: &RunContext, raws: &[Value]) -> Result<u64, ImportTaskError> {
        let _ = (ctx, raws);
        Err(ImportTaskError::InvalidPayload(format!(
            "{} does not import in bulk",
            self.task_type()
        )))
    }
}

/// Static dispatch table mapping object-type tags to adapter implementations.
pub struct AdapterRegistry {
    adapters: HashMap<ObjectType, Arc<dyn ObjectAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registry with every built-in adapter.
    pub fn with_defaults() -> Self {
        use crate::adapters::*;

        let mut registry = Self::new();
        registry.register(Arc::new(LabelAdapter));
        registry.register(Arc::new(MilestoneAdapter));
        registry.register(Arc::new(ReleaseAdapter));
        registry.register(Arc::new(IssueAdapter));
        registry.register(Arc::new(NoteAdapter));
        registry.register(Arc::new(PullRequestAdapter));
        registry.register(Arc::new(ReviewAdapter));
        registry.register(Arc::new(CollaboratorAdapter));
        registry.register(Arc::new(ProtectedBranchAdapter));
        registry.register(Arc::new(AttachmentAdapter));
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn ObjectAdapter>) {
        self.adapters.insert(adapter.object_type(), adapter);
    }

    pub fn get(&self, object_type: ObjectType) -> Option<Arc<dyn ObjectAdapter>> {
        self.adapters.get(&object_type).cloned()
    }

    pub fn by_task_type(&self, task_type: &str) -> Option<Arc<dyn ObjectAdapter>> {
        self.adapters
            .values()
            .find(|adapter| adapter.task_type() == task_type)
            .cloned()
    }

    pub fn object_types(&self) -> Vec<ObjectType> {
        let mut types: Vec<ObjectType> = self.adapters.keys().copied().collect();
        types.sort_by_key(|t| t.as_str());
        types
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_every_object_type() {
        let registry = AdapterRegistry::with_defaults();
        for object_type in ObjectType::ALL {
            let adapter = registry
                .get(object_type)
                .unwrap_or_else(|| panic!("missing adapter for {}", object_type));
            assert_eq!(adapter.object_type(), object_type);
        }
    }

    #[test]
    fn task_types_are_unique() {
        let registry = AdapterRegistry::with_defaults();
        for object_type in registry.object_types() {
            let adapter = registry.get(object_type).unwrap();
            let by_task = registry.by_task_type(adapter.task_type()).unwrap();
            assert_eq!(by_task.object_type(), object_type);
        }
    }
}
