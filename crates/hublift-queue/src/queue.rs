use std::sync::Arc;
use std::time::Duration;

use hublift_core::async_trait::async_trait;
use hublift_core::{ImportObjectJob, Job, JobQueue, JobReceiver, QueueError, ResumeImportJob};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum QueueServiceError {
    #[error("Failed to send job to queue: {details}")]
    QueueSendError { details: String, job_type: String },

    #[error("Queue channel closed")]
    QueueChannelClosed { job_type: String },
}

#[derive(Clone)]
pub struct BroadcastQueueService {
    broadcast_sender: broadcast::Sender<Job>,
}

// Wrapper for broadcast::Receiver to implement JobReceiver trait
pub struct BroadcastJobReceiver {
    receiver: broadcast::Receiver<Job>,
}

#[async_trait]
impl JobReceiver for BroadcastJobReceiver {
    async fn recv(&mut self) -> Result<Job, QueueError> {
        let result = self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => {
                error!("Broadcast channel closed");
                QueueError::ChannelClosed
            }
            broadcast::error::RecvError::Lagged(n) => {
                warn!("Receiver lagged by {} messages", n);
                QueueError::ReceiveError(format!("Receiver lagged by {} messages", n))
            }
        });

        if let Ok(job) = &result {
            debug!("Received job: {}", job);
        }

        result
    }
}

#[async_trait]
impl JobQueue for BroadcastQueueService {
    async fn send(&self, job: Job) -> Result<(), QueueError> {
        debug!("Broadcasting job: {}", job);

        if self.broadcast_sender.receiver_count() == 0 {
            error!(
                "No subscribers listening to broadcast channel! Job will be lost: {}",
                job
            );
        }

        self.broadcast_sender.send(job.clone()).map_err(|e| {
            error!("Failed to broadcast job {}: {}", job, e);
            QueueError::SendError(format!("Broadcast send failed: {}", e))
        })?;
        Ok(())
    }

    async fn send_delayed(&self, job: Job, delay: Duration) -> Result<(), QueueError> {
        info!("Scheduling job {} for delivery in {:?}", job, delay);

        let sender = self.broadcast_sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = sender.send(job.clone()) {
                // Every subscriber is gone; the import was abandoned and its
                // externalized state needs no cleanup.
                warn!("Dropping delayed job {} (no subscribers): {}", job, e);
            }
        });
        Ok(())
    }

    fn subscribe(&self) -> Box<dyn JobReceiver> {
        debug!(
            "Creating subscriber (current count: {})",
            self.broadcast_sender.receiver_count()
        );
        Box::new(BroadcastJobReceiver {
            receiver: self.broadcast_sender.subscribe(),
        })
    }
}

impl BroadcastQueueService {
    pub fn new(broadcast_sender: broadcast::Sender<Job>) -> Self {
        Self { broadcast_sender }
    }

    pub fn create_broadcast_channel(
        buffer_size: usize,
    ) -> (BroadcastQueueService, broadcast::Receiver<Job>) {
        let (sender, receiver) = broadcast::channel(buffer_size);
        (BroadcastQueueService::new(sender), receiver)
    }

    /// Create a new broadcast queue that implements the JobQueue trait
    /// Returns (queue, keep_alive_receiver) - the receiver must be kept alive!
    pub fn create_job_queue_arc_with_receiver(
        buffer_size: usize,
    ) -> (Arc<dyn JobQueue>, broadcast::Receiver<Job>) {
        let (sender, receiver) = broadcast::channel(buffer_size);
        (Arc::new(BroadcastQueueService::new(sender)), receiver)
    }

    pub fn subscribe_direct(&self) -> broadcast::Receiver<Job> {
        self.broadcast_sender.subscribe()
    }

    pub async fn launch_object_import(
        &self,
        data: ImportObjectJob,
    ) -> Result<(), QueueServiceError> {
        debug!(
            "Broadcasting object import job for {}/{}",
            data.project_id, data.task_type
        );
        // A broadcast send only fails once every receiver is gone.
        self.broadcast_sender
            .send(Job::ImportObject(data))
            .map_err(|e| {
                error!("Failed to broadcast object import job: {}", e);
                QueueServiceError::QueueChannelClosed {
                    job_type: "import_object".to_string(),
                }
            })?;
        Ok(())
    }

    pub async fn launch_import_resume(
        &self,
        data: ResumeImportJob,
        delay: Duration,
    ) -> Result<(), QueueServiceError> {
        info!(
            "Scheduling import resume for project {} / {} in {:?}",
            data.project_id, data.object_type, delay
        );
        self.send_delayed(Job::ResumeImport(data), delay)
            .await
            .map_err(|e| QueueServiceError::QueueSendError {
                details: e.to_string(),
                job_type: "resume_import".to_string(),
            })?;
        Ok(())
    }
}
