//! The scheduling driver: fetch → dedup-check → dispatch cycles per object
//! type, with rate-limit-safe suspension.

use crate::adapter::{ImportStrategy, ObjectAdapter};
use crate::context::RunContext;
use crate::error::ImportTaskError;
use crate::governor::{RateLimitGovernor, Reschedule};
use hublift_core::{ImportObjectJob, Job, QueueError, RescheduleReason};
use hublift_state::{ImportScope, ImportTallies, StateError};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum DriverError {
    /// Losing the shared state store means losing progress tracking; this is
    /// the one condition fatal to a run.
    #[error("State store failure: {0}")]
    State(#[from] StateError),

    #[error("Dispatch failure: {0}")]
    Queue(#[from] QueueError),

    #[error("Fatal fetch failure: {0}")]
    FatalFetch(String),

    #[error("Bulk import failure: {0}")]
    Task(#[from] ImportTaskError),
}

/// How a driver invocation ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every collection is drained; tallies are the final counts.
    Finished(ImportTallies),
    /// The run suspended; the caller hands the reschedule instruction to the
    /// task-dispatch collaborator for delayed re-invocation.
    Rescheduled(Reschedule),
}

/// Drives one (project, object type) import run.
///
/// Contract: across a fully successful run, total dispatches equal the number
/// of distinct upstream objects minus those already marked imported at start.
/// A partially completed run may always be re-invoked; dedup and cursor state
/// make the re-invocation resume forward without duplicate dispatches.
pub struct SchedulingDriver<'a> {
    ctx: &'a RunContext,
    governor: RateLimitGovernor,
}

impl<'a> SchedulingDriver<'a> {
    pub fn new(ctx: &'a RunContext) -> Self {
        let governor = RateLimitGovernor::new(&ctx.settings);
        Self { ctx, governor }
    }

    pub async fn run(&self, adapter: &dyn ObjectAdapter) -> Result<RunOutcome, DriverError> {
        let scope = self.ctx.scope_for(adapter.object_type());
        let collections = adapter.collections(self.ctx).await?;
        let mut pages_this_run: u32 = 0;

        info!(
            project_id = self.ctx.project_id,
            object_type = %adapter.object_type(),
            collections = collections.len(),
            "Starting import run"
        );

        for collection in &collections {
            let cursor_scope = collection.cursor_scope(self.ctx.project_id);

            loop {
                if pages_this_run >= self.ctx.settings.max_pages_per_run {
                    info!(
                        project_id = self.ctx.project_id,
                        object_type = %adapter.object_type(),
                        pages = pages_this_run,
                        "Page budget exhausted, suspending run"
                    );
                    return Ok(RunOutcome::Rescheduled(Reschedule {
                        delay: Duration::ZERO,
                        reason: RescheduleReason::BudgetExhausted,
                    }));
                }

                let page = self.ctx.cursors().current(&cursor_scope).await? + 1;
                debug!(
                    collection = %collection.name,
                    parent = ?collection.parent,
                    page,
                    "Fetching page"
                );

                let fetched = match self
                    .ctx
                    .client
                    .fetch_page(
                        &self.ctx.repo,
                        collection,
                        page,
                        self.ctx.settings.page_size,
                    )
                    .await
                {
                    Ok(fetched) => fetched,
                    Err(err) => match self.governor.evaluate(&err) {
                        Some(reschedule) => return Ok(RunOutcome::Rescheduled(reschedule)),
                        None => return Err(DriverError::FatalFetch(err.to_string())),
                    },
                };

                if !fetched.objects.is_empty() {
                    self.ctx
                        .counters()
                        .add_fetched(&scope, fetched.objects.len() as i64)
                        .await?;
                    self.process_page(adapter, &scope, collection, &fetched.objects)
                        .await?;
                }

                self.ctx.cursors().advance(&cursor_scope, page).await?;
                pages_this_run += 1;

                if !fetched.has_next {
                    self.ctx.cursors().expire(&cursor_scope).await?;
                    break;
                }
            }
        }

        let tallies = self.ctx.counters().tallies(&scope).await?;
        info!(
            project_id = self.ctx.project_id,
            object_type = %adapter.object_type(),
            fetched = tallies.fetched,
            imported = tallies.imported,
            failed = tallies.failed,
            "Import run finished"
        );
        Ok(RunOutcome::Finished(tallies))
    }

    async fn process_page(
        &self,
        adapter: &dyn ObjectAdapter,
        scope: &ImportScope,
        collection: &crate::client::CollectionRef,
        objects: &[Value],
    ) -> Result<(), DriverError> {
        let mut pending: Vec<(String, &Value)> = Vec::with_capacity(objects.len());
        for raw in objects {
            match adapter.already_imported_id(raw) {
                Some(id) => pending.push((id, raw)),
                None => {
                    warn!(
                        object_type = %adapter.object_type(),
                        "Skipping raw object without an id"
                    );
                    self.ctx.counters().add_failed(scope, 1).await?;
                }
            }
        }

        let ids: Vec<String> = pending.iter().map(|(id, _)| id.clone()).collect();
        let seen = self.ctx.dedup().bulk_contains(scope, &ids).await?;

        match adapter.strategy() {
            ImportStrategy::Dispatch => {
                for (id, raw) in &pending {
                    if seen.contains(id) {
                        debug!(id = %id, "Skipping already-imported object");
                        continue;
                    }
                    let representation = match adapter.build_representation(collection, raw) {
                        Ok(representation) => representation,
                        Err(err) => {
                            warn!(id = %id, "Cannot build representation: {}", err);
                            self.ctx.counters().add_failed(scope, 1).await?;
                            continue;
                        }
                    };
                    self.ctx
                        .queue
                        .send(Job::ImportObject(ImportObjectJob {
                            project_id: self.ctx.project_id,
                            task_type: adapter.task_type().to_string(),
                            representation,
                        }))
                        .await?;
                    // Mark after dispatch: a crash in between re-sends the
                    // object, and import tasks are idempotent.
                    self.ctx.dedup().mark_imported(scope, id).await?;
                }
            }
            ImportStrategy::BulkPage => {
                let unseen: Vec<Value> = pending
                    .iter()
                    .filter(|(id, _)| !seen.contains(id))
                    .map(|(_, raw)| (*raw).clone())
                    .collect();
                if !unseen.is_empty() {
                    let imported = adapter.import_page(self.ctx, &unseen).await?;
                    self.ctx
                        .counters()
                        .add_imported(scope, imported as i64)
                        .await?;
                    for (id, _) in &pending {
                        if !seen.contains(id) {
                            self.ctx.dedup().mark_imported(scope, id).await?;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_context, CollectingQueue, ScriptedClient};
    use hublift_core::{FetchError, ImportSettings, ObjectType};
    use serde_json::json;
    use std::sync::Arc;

    struct IssueDispatchAdapter;

    #[async_trait::async_trait]
    impl ObjectAdapter for IssueDispatchAdapter {
        fn object_type(&self) -> ObjectType {
            ObjectType::Issue
        }
        fn collection_name(&self) -> &'static str {
            "issues"
        }
        fn task_type(&self) -> &'static str {
            "import_issue"
        }
    }

    fn issues(range: std::ops::RangeInclusive<i64>) -> Vec<Value> {
        range.map(|id| json!({"id": id})).collect()
    }

    #[tokio::test]
    async fn dispatches_each_distinct_object_once() {
        let client = Arc::new(ScriptedClient::new());
        client.script_pages("issues", vec![issues(1..=3), issues(4..=5)]);
        let queue = Arc::new(CollectingQueue::new());
        let ctx = test_context(client, queue.clone(), ImportSettings::default());

        let outcome = SchedulingDriver::new(&ctx)
            .run(&IssueDispatchAdapter)
            .await
            .unwrap();

        assert!(matches!(outcome, RunOutcome::Finished(_)));
        assert_eq!(queue.dispatched_ids().len(), 5);

        // Cursor was expired once the collection drained.
        let cursor_scope =
            crate::client::CollectionRef::project("issues").cursor_scope(ctx.project_id);
        assert_eq!(ctx.cursors().current(&cursor_scope).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rerunning_a_completed_run_dispatches_nothing() {
        let client = Arc::new(ScriptedClient::new());
        client.script_pages("issues", vec![issues(1..=3)]);
        let queue = Arc::new(CollectingQueue::new());
        let ctx = test_context(client.clone(), queue.clone(), ImportSettings::default());

        let driver = SchedulingDriver::new(&ctx);
        driver.run(&IssueDispatchAdapter).await.unwrap();
        assert_eq!(queue.dispatched_ids().len(), 3);

        client.script_pages("issues", vec![issues(1..=3)]);
        driver.run(&IssueDispatchAdapter).await.unwrap();
        assert_eq!(queue.dispatched_ids().len(), 3, "no duplicate dispatches");
    }

    #[tokio::test]
    async fn budget_exhaustion_suspends_and_resumes_forward() {
        let client = Arc::new(ScriptedClient::new());
        client.script_pages("issues", vec![issues(1..=2), issues(3..=4), issues(5..=6)]);
        let queue = Arc::new(CollectingQueue::new());
        let settings = ImportSettings {
            max_pages_per_run: 2,
            ..ImportSettings::default()
        };
        let ctx = test_context(client.clone(), queue.clone(), settings);
        let driver = SchedulingDriver::new(&ctx);

        let outcome = driver.run(&IssueDispatchAdapter).await.unwrap();
        match outcome {
            RunOutcome::Rescheduled(r) => {
                assert_eq!(r.reason, RescheduleReason::BudgetExhausted)
            }
            other => panic!("expected reschedule, got {:?}", other),
        }
        assert_eq!(queue.dispatched_ids().len(), 4);

        // Resume picks up at page 3, not page 1.
        let outcome = driver.run(&IssueDispatchAdapter).await.unwrap();
        assert!(matches!(outcome, RunOutcome::Finished(_)));
        assert_eq!(queue.dispatched_ids().len(), 6);
        assert_eq!(client.fetch_count("issues", 1), 1);
        assert_eq!(client.fetch_count("issues", 3), 1);
    }

    #[tokio::test]
    async fn rate_limit_preserves_progress_and_reschedules_whole_run() {
        let client = Arc::new(ScriptedClient::new());
        client.script_pages("issues", vec![issues(1..=2), issues(3..=4)]);
        client.fail_once(
            "issues",
            2,
            FetchError::RateLimited {
                retry_after: Some(Duration::from_secs(90)),
            },
        );
        let queue = Arc::new(CollectingQueue::new());
        let ctx = test_context(client.clone(), queue.clone(), ImportSettings::default());
        let driver = SchedulingDriver::new(&ctx);

        let outcome = driver.run(&IssueDispatchAdapter).await.unwrap();
        match outcome {
            RunOutcome::Rescheduled(r) => {
                assert_eq!(r.reason, RescheduleReason::RateLimited);
                assert_eq!(r.delay, Duration::from_secs(90));
            }
            other => panic!("expected reschedule, got {:?}", other),
        }
        assert_eq!(queue.dispatched_ids().len(), 2);

        // Resumption fetches page 2 onward; page-1 objects are not
        // re-dispatched.
        driver.run(&IssueDispatchAdapter).await.unwrap();
        let ids = queue.dispatched_ids();
        assert_eq!(ids.len(), 4);
        assert_eq!(client.fetch_count("issues", 1), 1);
    }

    #[tokio::test]
    async fn transient_failure_uses_the_shorter_delay() {
        let client = Arc::new(ScriptedClient::new());
        client.script_pages("issues", vec![issues(1..=2)]);
        client.fail_once("issues", 1, FetchError::Transient("reset".to_string()));
        let queue = Arc::new(CollectingQueue::new());
        let ctx = test_context(client, queue, ImportSettings::default());

        let outcome = SchedulingDriver::new(&ctx)
            .run(&IssueDispatchAdapter)
            .await
            .unwrap();
        match outcome {
            RunOutcome::Rescheduled(r) => {
                assert_eq!(r.reason, RescheduleReason::TransientFetch);
                assert_eq!(r.delay, ImportSettings::default().transient_delay());
            }
            other => panic!("expected reschedule, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn fatal_fetch_failures_propagate() {
        let client = Arc::new(ScriptedClient::new());
        client.script_pages("issues", vec![issues(1..=2)]);
        client.fail_once("issues", 1, FetchError::Fatal("bad token".to_string()));
        let queue = Arc::new(CollectingQueue::new());
        let ctx = test_context(client, queue, ImportSettings::default());

        let err = SchedulingDriver::new(&ctx)
            .run(&IssueDispatchAdapter)
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::FatalFetch(_)));
    }

    #[tokio::test]
    async fn objects_without_ids_are_counted_failed() {
        let client = Arc::new(ScriptedClient::new());
        client.script_pages("issues", vec![vec![json!({"id": 1}), json!({"title": "no id"})]]);
        let queue = Arc::new(CollectingQueue::new());
        let ctx = test_context(client, queue.clone(), ImportSettings::default());

        SchedulingDriver::new(&ctx)
            .run(&IssueDispatchAdapter)
            .await
            .unwrap();

        assert_eq!(queue.dispatched_ids().len(), 1);
        let tallies = ctx
            .counters()
            .tallies(&ctx.scope_for(ObjectType::Issue))
            .await
            .unwrap();
        assert_eq!(tallies.fetched, 2);
        assert_eq!(tallies.failed, 1);
    }
}
