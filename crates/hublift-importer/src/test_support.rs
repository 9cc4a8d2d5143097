//! Scripted collaborators for driver and worker tests.

use crate::client::{CollectionRef, Page, PlatformClient};
use crate::context::RunContext;
use crate::user_finder::{MapUserResolver, UserResolver};
use async_trait::async_trait;
use hublift_core::{FetchError, ImportSettings, Job, JobQueue, JobReceiver, QueueError};
use hublift_state::MemoryStateStore;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn collection_key(collection: &CollectionRef) -> String {
    match &collection.parent {
        Some(parent) => format!("{}/{}", collection.name, parent),
        None => collection.name.clone(),
    }
}

/// `PlatformClient` whose pages are scripted up front. Failures can be
/// injected per (collection, page) and are consumed on first fetch, so the
/// retried fetch succeeds.
#[derive(Default)]
pub struct ScriptedClient {
    pages: Mutex<HashMap<String, Vec<Vec<Value>>>>,
    failures: Mutex<HashMap<(String, u64), Vec<FetchError>>>,
    fetches: Mutex<HashMap<(String, u64), usize>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the full page sequence for a project-level collection.
    pub fn script_pages(&self, collection: &str, pages: Vec<Vec<Value>>) {
        self.pages
            .lock()
            .unwrap()
            .insert(collection.to_string(), pages);
    }

    /// Script pages for a nested collection scoped to one parent.
    pub fn script_nested_pages(&self, collection: &str, parent: &str, pages: Vec<Vec<Value>>) {
        self.pages
            .lock()
            .unwrap()
            .insert(format!("{}/{}", collection, parent), pages);
    }

    /// Inject one failure for the next fetch of (collection, page).
    pub fn fail_once(&self, collection: &str, page: u64, error: FetchError) {
        self.failures
            .lock()
            .unwrap()
            .entry((collection.to_string(), page))
            .or_default()
            .push(error);
    }

    /// How many times (collection, page) was fetched, failures included.
    pub fn fetch_count(&self, collection: &str, page: u64) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(&(collection.to_string(), page))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PlatformClient for ScriptedClient {
    async fn fetch_page(
        &self,
        _repo: &str,
        collection: &CollectionRef,
        page: u64,
        _per_page: u64,
    ) -> Result<Page, FetchError> {
        let key = collection_key(collection);
        *self
            .fetches
            .lock()
            .unwrap()
            .entry((key.clone(), page))
            .or_insert(0) += 1;

        if let Some(failures) = self.failures.lock().unwrap().get_mut(&(key.clone(), page)) {
            if !failures.is_empty() {
                return Err(failures.remove(0));
            }
        }

        let pages = self.pages.lock().unwrap();
        let script = pages
            .get(&key)
            .ok_or_else(|| FetchError::Fatal(format!("no scripted pages for {}", key)))?;
        let index = (page - 1) as usize;
        match script.get(index) {
            Some(objects) => Ok(Page {
                objects: objects.clone(),
                has_next: index + 1 < script.len(),
            }),
            None => Ok(Page::last(Vec::new())),
        }
    }
}

/// `JobQueue` that records everything instead of delivering it. Delayed jobs
/// keep their delay so tests can assert on reschedule timing.
#[derive(Default)]
pub struct CollectingQueue {
    sent: Mutex<Vec<Job>>,
    delayed: Mutex<Vec<(Job, Duration)>>,
}

impl CollectingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_jobs(&self) -> Vec<Job> {
        self.sent.lock().unwrap().clone()
    }

    pub fn delayed_jobs(&self) -> Vec<(Job, Duration)> {
        self.delayed.lock().unwrap().clone()
    }

    /// External ids of all dispatched import-object jobs, in dispatch order.
    pub fn dispatched_ids(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|job| match job {
                Job::ImportObject(job) => Some(job.representation.external_id.clone()),
                Job::ResumeImport(_) => None,
            })
            .collect()
    }

    /// Drop all recorded jobs, keeping the queue reusable between phases of a
    /// test.
    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.delayed.lock().unwrap().clear();
    }
}

#[async_trait]
impl JobQueue for CollectingQueue {
    async fn send(&self, job: Job) -> Result<(), QueueError> {
        self.sent.lock().unwrap().push(job);
        Ok(())
    }

    async fn send_delayed(&self, job: Job, delay: Duration) -> Result<(), QueueError> {
        self.delayed.lock().unwrap().push((job, delay));
        Ok(())
    }

    fn subscribe(&self) -> Box<dyn JobReceiver> {
        Box::new(DrainReceiver {
            jobs: self.sent.lock().unwrap().clone(),
            next: 0,
        })
    }
}

/// Replays a snapshot of collected jobs, then reports the channel closed.
struct DrainReceiver {
    jobs: Vec<Job>,
    next: usize,
}

#[async_trait]
impl JobReceiver for DrainReceiver {
    async fn recv(&mut self) -> Result<Job, QueueError> {
        match self.jobs.get(self.next) {
            Some(job) => {
                self.next += 1;
                Ok(job.clone())
            }
            None => Err(QueueError::ChannelClosed),
        }
    }
}

pub fn mock_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

/// Context over in-memory state with an empty mock database and no user
/// mappings.
pub fn test_context(
    client: Arc<dyn PlatformClient>,
    queue: Arc<dyn JobQueue>,
    settings: ImportSettings,
) -> RunContext {
    test_context_with(mock_db(), client, queue, Arc::new(MapUserResolver::empty()), settings)
}

pub fn test_context_with(
    db: DatabaseConnection,
    client: Arc<dyn PlatformClient>,
    queue: Arc<dyn JobQueue>,
    users: Arc<dyn UserResolver>,
    settings: ImportSettings,
) -> RunContext {
    RunContext::new(
        1,
        "acme/widgets",
        settings,
        db,
        client,
        queue,
        users,
        Arc::new(MemoryStateStore::new()),
    )
}
