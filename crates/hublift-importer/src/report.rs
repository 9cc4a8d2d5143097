//! Project-level import reporting, aggregated from the shared counters.

use hublift_core::ObjectType;
use hublift_state::{ImportCounter, ImportScope, ImportTallies, StateError};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ObjectTypeSummary {
    pub object_type: ObjectType,
    pub tallies: ImportTallies,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectImportSummary {
    pub project_id: i64,
    pub per_type: Vec<ObjectTypeSummary>,
    pub totals: ImportTallies,
}

impl ProjectImportSummary {
    /// Every fetched object is accounted for when fetched equals imported
    /// plus failed. Dispatch-strategy types trail while tasks are in flight.
    pub fn is_settled(&self) -> bool {
        self.totals.fetched == self.totals.imported + self.totals.failed
    }
}

/// Snapshot the tallies of every object type for one project.
pub async fn project_summary(
    counters: &ImportCounter,
    project_id: i64,
    object_types: &[ObjectType],
) -> Result<ProjectImportSummary, StateError> {
    let mut per_type = Vec::with_capacity(object_types.len());
    let mut totals = ImportTallies::default();

    for &object_type in object_types {
        let tallies = counters
            .tallies(&ImportScope::new(project_id, object_type))
            .await?;
        totals.fetched += tallies.fetched;
        totals.imported += tallies.imported;
        totals.failed += tallies.failed;
        per_type.push(ObjectTypeSummary {
            object_type,
            tallies,
        });
    }

    Ok(ProjectImportSummary {
        project_id,
        per_type,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hublift_state::MemoryStateStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn aggregates_across_object_types() {
        let counters = ImportCounter::new(Arc::new(MemoryStateStore::new()));
        let issues = ImportScope::new(1, ObjectType::Issue);
        let labels = ImportScope::new(1, ObjectType::Label);

        counters.add_fetched(&issues, 10).await.unwrap();
        counters.add_imported(&issues, 9).await.unwrap();
        counters.add_failed(&issues, 1).await.unwrap();
        counters.add_fetched(&labels, 4).await.unwrap();
        counters.add_imported(&labels, 4).await.unwrap();

        let summary = project_summary(
            &counters,
            1,
            &[ObjectType::Issue, ObjectType::Label, ObjectType::Note],
        )
        .await
        .unwrap();

        assert_eq!(summary.totals.fetched, 14);
        assert_eq!(summary.totals.imported, 13);
        assert_eq!(summary.totals.failed, 1);
        assert!(summary.is_settled());
        assert_eq!(summary.per_type.len(), 3);
        assert_eq!(summary.per_type[2].tallies, ImportTallies::default());
    }

    #[tokio::test]
    async fn unsettled_while_tasks_are_in_flight() {
        let counters = ImportCounter::new(Arc::new(MemoryStateStore::new()));
        let issues = ImportScope::new(1, ObjectType::Issue);

        counters.add_fetched(&issues, 10).await.unwrap();
        counters.add_imported(&issues, 4).await.unwrap();

        let summary = project_summary(&counters, 1, &[ObjectType::Issue])
            .await
            .unwrap();
        assert!(!summary.is_settled());
    }
}
