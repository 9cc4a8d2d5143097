//! End-to-end flows over scripted collaborators: driver dispatch, worker
//! execution, interruption and resume, and the broadcast queue wiring.

use hublift_core::{
    FetchError, ImportObjectJob, ImportSettings, Job, JobQueue, ObjectType, RescheduleReason,
};
use hublift_entities::issues;
use hublift_importer::test_support::{test_context_with, CollectingQueue, ScriptedClient};
use hublift_importer::{
    project_summary, run_with_reschedule, AdapterRegistry, ImportWorker, MapUserResolver,
    RunContext, RunOutcome,
};
use hublift_queue::BroadcastQueueService;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn issue_raws(range: std::ops::RangeInclusive<i64>) -> Vec<Value> {
    range
        .map(|n| {
            json!({
                "id": 1000 + n,
                "number": n,
                "title": format!("Issue {}", n),
                "state": "open",
                "user": {"id": 500, "login": "alice"}
            })
        })
        .collect()
}

fn issue_model(id: i64, number: i64) -> issues::Model {
    issues::Model {
        id,
        project_id: 1,
        external_iid: number,
        title: format!("Issue {}", number),
        body: None,
        state: "open".to_string(),
        author_id: 42,
        assignee_id: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

/// Mock database scripted for `count` fresh issue imports: one empty
/// existence lookup and one returning insert per issue.
fn db_for_fresh_issues(numbers: &[i64]) -> DatabaseConnection {
    let mut db = MockDatabase::new(DatabaseBackend::Postgres);
    for (i, &number) in numbers.iter().enumerate() {
        db = db
            .append_query_results::<issues::Model, _, _>([vec![]])
            .append_query_results([vec![issue_model(i as i64 + 1, number)]]);
    }
    db.into_connection()
}

fn context(
    db: DatabaseConnection,
    client: Arc<ScriptedClient>,
    queue: Arc<CollectingQueue>,
) -> RunContext {
    test_context_with(
        db,
        client,
        queue,
        Arc::new(MapUserResolver::new(HashMap::from([(500, 42)]))),
        ImportSettings {
            max_pages_per_run: 2,
            ..ImportSettings::default()
        },
    )
}

#[tokio::test]
async fn interrupted_import_resumes_and_settles() {
    let client = Arc::new(ScriptedClient::new());
    client.script_pages(
        "issues",
        vec![issue_raws(1..=2), issue_raws(3..=4), issue_raws(5..=6)],
    );
    let queue = Arc::new(CollectingQueue::new());
    let ctx = context(db_for_fresh_issues(&[1, 2, 3, 4, 5, 6]), client, queue.clone());

    let registry = Arc::new(AdapterRegistry::with_defaults());
    let adapter = registry.get(ObjectType::Issue).unwrap();

    // First invocation stops at the two-page budget and enqueues its resume.
    let outcome = run_with_reschedule(&ctx, adapter.as_ref()).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Rescheduled(_)));
    assert_eq!(queue.dispatched_ids().len(), 4);

    let delayed = queue.delayed_jobs();
    assert_eq!(delayed.len(), 1);
    match &delayed[0].0 {
        Job::ResumeImport(resume) => {
            assert_eq!(resume.object_type, ObjectType::Issue);
            assert_eq!(resume.reason, RescheduleReason::BudgetExhausted);
        }
        other => panic!("expected resume job, got {}", other),
    }

    // The resume drains the remaining page. No object is dispatched twice.
    let outcome = run_with_reschedule(&ctx, adapter.as_ref()).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Finished(_)));
    let mut ids = queue.dispatched_ids();
    assert_eq!(ids.len(), 6);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 6);

    // Execute the dispatched tasks.
    let worker = ImportWorker::new(ctx.clone(), registry);
    for job in queue.sent_jobs() {
        worker.handle(job).await.unwrap();
    }

    let summary = project_summary(ctx.counters(), ctx.project_id, &[ObjectType::Issue])
        .await
        .unwrap();
    assert_eq!(summary.totals.fetched, 6);
    assert_eq!(summary.totals.imported, 6);
    assert_eq!(summary.totals.failed, 0);
    assert!(summary.is_settled());
}

#[tokio::test]
async fn restart_after_crash_does_not_redispatch() {
    // Same shared state across two contexts simulates a process restart
    // between pages.
    let store = Arc::new(hublift_state::MemoryStateStore::new());
    let client = Arc::new(ScriptedClient::new());
    client.script_pages("issues", vec![issue_raws(1..=2), issue_raws(3..=4)]);
    let queue = Arc::new(CollectingQueue::new());
    let users = Arc::new(MapUserResolver::new(HashMap::from([(500, 42)])));
    let settings = ImportSettings {
        max_pages_per_run: 1,
        ..ImportSettings::default()
    };

    let first = RunContext::new(
        1,
        "acme/widgets",
        settings.clone(),
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        client.clone(),
        queue.clone(),
        users.clone(),
        store.clone(),
    );
    let registry = AdapterRegistry::with_defaults();
    let adapter = registry.get(ObjectType::Issue).unwrap();

    let outcome = run_with_reschedule(&first, adapter.as_ref()).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Rescheduled(_)));
    assert_eq!(queue.dispatched_ids().len(), 2);
    drop(first);

    // "New process": fresh context, same store.
    let second = RunContext::new(
        1,
        "acme/widgets",
        settings,
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        client.clone(),
        queue.clone(),
        users,
        store,
    );
    let outcome = run_with_reschedule(&second, adapter.as_ref()).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Finished(_)));

    let ids = queue.dispatched_ids();
    assert_eq!(ids.len(), 4, "page one must not be re-fetched or re-dispatched");
    assert_eq!(client.fetch_count("issues", 1), 1);
    assert_eq!(client.fetch_count("issues", 2), 1);
}

#[tokio::test]
async fn rate_limited_run_keeps_earlier_pages_dispatched_once() {
    let client = Arc::new(ScriptedClient::new());
    client.script_pages("issues", vec![issue_raws(1..=2), issue_raws(3..=4)]);
    client.fail_once(
        "issues",
        2,
        FetchError::RateLimited {
            retry_after: Some(Duration::from_secs(60)),
        },
    );
    let queue = Arc::new(CollectingQueue::new());
    let ctx = context(db_for_fresh_issues(&[1, 2, 3, 4]), client, queue.clone());
    let registry = AdapterRegistry::with_defaults();
    let adapter = registry.get(ObjectType::Issue).unwrap();

    let outcome = run_with_reschedule(&ctx, adapter.as_ref()).await.unwrap();
    match outcome {
        RunOutcome::Rescheduled(r) => {
            assert_eq!(r.reason, RescheduleReason::RateLimited);
            assert_eq!(r.delay, Duration::from_secs(60));
        }
        other => panic!("expected reschedule, got {:?}", other),
    }

    let delayed = queue.delayed_jobs();
    assert_eq!(delayed.len(), 1);
    assert_eq!(delayed[0].1, Duration::from_secs(60));

    run_with_reschedule(&ctx, adapter.as_ref()).await.unwrap();
    assert_eq!(queue.dispatched_ids().len(), 4);
}

#[tokio::test]
async fn broadcast_queue_carries_dispatches_to_a_subscriber() {
    let (service, _keep_alive) = BroadcastQueueService::create_broadcast_channel(64);
    let mut receiver = service.subscribe();

    let client = Arc::new(ScriptedClient::new());
    client.script_pages("issues", vec![issue_raws(1..=3)]);
    let ctx = test_context_with(
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        client,
        Arc::new(service),
        Arc::new(MapUserResolver::empty()),
        ImportSettings::default(),
    );
    let registry = AdapterRegistry::with_defaults();
    let adapter = registry.get(ObjectType::Issue).unwrap();

    let outcome = run_with_reschedule(&ctx, adapter.as_ref()).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Finished(_)));

    for expected_number in 1..=3 {
        let job = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .expect("job should arrive")
            .expect("queue should stay open");
        match job {
            Job::ImportObject(ImportObjectJob {
                project_id,
                task_type,
                representation,
            }) => {
                assert_eq!(project_id, 1);
                assert_eq!(task_type, "import_issue");
                assert_eq!(representation.data["number"], expected_number);
            }
            other => panic!("expected import job, got {}", other),
        }
    }
}
