//! Import task execution: consumes dispatched jobs and applies bounded retry.

use crate::adapter::{AdapterRegistry, ObjectAdapter};
use crate::context::RunContext;
use crate::driver::{DriverError, RunOutcome, SchedulingDriver};
use crate::error::ImportTaskError;
use hublift_core::{ImportObjectJob, Job, JobReceiver, QueueError, ResumeImportJob};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Run one driver pass and, when it suspends, hand the continuation to the
/// queue as a delayed resume job. The sender never sleeps; the delay lives in
/// the dispatch layer.
pub async fn run_with_reschedule(
    ctx: &RunContext,
    adapter: &dyn ObjectAdapter,
) -> Result<RunOutcome, DriverError> {
    let outcome = SchedulingDriver::new(ctx).run(adapter).await?;
    if let RunOutcome::Rescheduled(reschedule) = &outcome {
        ctx.queue
            .send_delayed(
                Job::ResumeImport(ResumeImportJob {
                    project_id: ctx.project_id,
                    object_type: adapter.object_type(),
                    reason: reschedule.reason,
                }),
                reschedule.delay,
            )
            .await?;
    }
    Ok(outcome)
}

/// Executes import jobs pulled off the queue.
///
/// Per-object failures are tallied and never cascade: a broken object costs
/// one `failed` increment, not the run. Only state-store and queue failures
/// propagate out of `handle`.
pub struct ImportWorker {
    ctx: RunContext,
    registry: Arc<AdapterRegistry>,
}

impl ImportWorker {
    pub fn new(ctx: RunContext, registry: Arc<AdapterRegistry>) -> Self {
        Self { ctx, registry }
    }

    /// Consume jobs until the queue closes.
    pub async fn run(&self, mut receiver: Box<dyn JobReceiver>) -> Result<(), DriverError> {
        loop {
            match receiver.recv().await {
                Ok(job) => self.handle(job).await?,
                Err(QueueError::ChannelClosed) => {
                    info!("Job queue closed, worker exiting");
                    return Ok(());
                }
                Err(err) => {
                    warn!("Failed to receive job: {}", err);
                }
            }
        }
    }

    pub async fn handle(&self, job: Job) -> Result<(), DriverError> {
        match job {
            Job::ImportObject(job) => self.handle_import(job).await,
            Job::ResumeImport(job) => self.handle_resume(job).await,
        }
    }

    async fn handle_import(&self, job: ImportObjectJob) -> Result<(), DriverError> {
        let adapter = match self.registry.by_task_type(&job.task_type) {
            Some(adapter) => adapter,
            None => {
                error!(task_type = %job.task_type, "No adapter for task type, dropping job");
                return Ok(());
            }
        };
        let scope = self.ctx.scope_for(adapter.object_type());

        let mut attempt = 1;
        loop {
            match adapter.import_object(&self.ctx, &job.representation).await {
                Ok(()) => {
                    self.ctx.counters().add_imported(&scope, 1).await?;
                    return Ok(());
                }
                Err(ImportTaskError::Transient(details))
                    if attempt < self.ctx.settings.max_task_attempts =>
                {
                    debug!(
                        task_type = %job.task_type,
                        external_id = %job.representation.external_id,
                        attempt,
                        "Transient task failure, retrying: {}",
                        details
                    );
                    attempt += 1;
                }
                Err(ImportTaskError::UnresolvedParent(details)) => {
                    // The parent may arrive in a later stage; the object is
                    // skipped, not failed.
                    warn!(
                        task_type = %job.task_type,
                        external_id = %job.representation.external_id,
                        "Skipping object with unresolved parent: {}",
                        details
                    );
                    return Ok(());
                }
                Err(ImportTaskError::State(err)) => return Err(DriverError::State(err)),
                Err(err) => {
                    warn!(
                        task_type = %job.task_type,
                        external_id = %job.representation.external_id,
                        attempt,
                        "Import task failed: {}",
                        err
                    );
                    self.ctx.counters().add_failed(&scope, 1).await?;
                    return Ok(());
                }
            }
        }
    }

    async fn handle_resume(&self, job: ResumeImportJob) -> Result<(), DriverError> {
        let adapter = match self.registry.get(job.object_type) {
            Some(adapter) => adapter,
            None => {
                error!(object_type = %job.object_type, "No adapter registered, dropping resume");
                return Ok(());
            }
        };
        info!(
            project_id = job.project_id,
            object_type = %job.object_type,
            reason = %job.reason,
            "Resuming suspended import run"
        );
        run_with_reschedule(&self.ctx, adapter.as_ref()).await?;
        Ok(())
    }
}
