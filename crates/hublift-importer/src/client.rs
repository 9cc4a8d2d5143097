//! External platform API collaborator.

use async_trait::async_trait;
use hublift_core::FetchError;
use hublift_state::CursorScope;
use serde_json::Value;

/// A paginated collection on the external platform. Project-level
/// collections ("issues", "labels") have no parent; nested collections
/// ("pull_request_reviews") are scoped to one parent entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    pub name: String,
    /// External id of the parent entity, when the collection is nested.
    pub parent: Option<String>,
}

impl CollectionRef {
    pub fn project(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
        }
    }

    pub fn nested(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent.into()),
        }
    }

    /// Pagination state scope for this collection within a project.
    pub fn cursor_scope(&self, project_id: i64) -> CursorScope {
        match &self.parent {
            Some(parent) => CursorScope::nested(project_id, self.name.clone(), parent.clone()),
            None => CursorScope::project(project_id, self.name.clone()),
        }
    }
}

/// One fetched page of raw objects.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub objects: Vec<Value>,
    pub has_next: bool,
}

impl Page {
    pub fn last(objects: Vec<Value>) -> Self {
        Self {
            objects,
            has_next: false,
        }
    }

    pub fn with_next(objects: Vec<Value>) -> Self {
        Self {
            objects,
            has_next: true,
        }
    }
}

/// Paginated fetch access to the hosted platform.
///
/// Implementations own HTTP and auth details entirely; failures surface as
/// the typed `FetchError` outcomes the driver and governor understand.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Fetch one page (1-based) of `collection` for the given repository.
    async fn fetch_page(
        &self,
        repo: &str,
        collection: &CollectionRef,
        page: u64,
        per_page: u64,
    ) -> Result<Page, FetchError>;
}
