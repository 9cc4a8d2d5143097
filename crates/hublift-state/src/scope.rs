//! Key namespacing for shared import state.
//!
//! Keys follow `import:{project_id}:{object_type-or-collection}:{entity}` so
//! concurrent runs for different projects and object types never collide.

use hublift_core::ObjectType;

/// Scope for per-(project, object type) state: dedup sets and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportScope {
    pub project_id: i64,
    pub object_type: ObjectType,
}

impl ImportScope {
    pub fn new(project_id: i64, object_type: ObjectType) -> Self {
        Self {
            project_id,
            object_type,
        }
    }

    pub(crate) fn key(&self, entity: &str) -> String {
        format!("import:{}:{}:{}", self.project_id, self.object_type, entity)
    }
}

/// Scope for pagination progress: one cursor per (parent entity, collection)
/// pair, e.g. per pull-request-and-review-collection. Long multi-parent scans
/// resume exactly where they stopped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CursorScope {
    pub project_id: i64,
    pub collection: String,
    /// External id of the parent entity for nested collections; `None` for
    /// project-level collections.
    pub parent: Option<String>,
}

impl CursorScope {
    pub fn project(project_id: i64, collection: impl Into<String>) -> Self {
        Self {
            project_id,
            collection: collection.into(),
            parent: None,
        }
    }

    pub fn nested(
        project_id: i64,
        collection: impl Into<String>,
        parent: impl Into<String>,
    ) -> Self {
        Self {
            project_id,
            collection: collection.into(),
            parent: Some(parent.into()),
        }
    }

    pub(crate) fn key(&self) -> String {
        match &self.parent {
            Some(parent) => format!(
                "import:{}:{}:{}:cursor",
                self.project_id, self.collection, parent
            ),
            None => format!("import:{}:{}:cursor", self.project_id, self.collection),
        }
    }
}
