//! Incident store behavior against an in-process incident service

mod common;

use common::{critical_scenario, incident, GatedGateway, Phase, RecordingSink};
use incident_stack::config::ResponseOrdering;
use incident_stack::error::Operation;
use incident_stack::gateway::InMemoryGateway;
use incident_stack::models::{CreateIncidentDto, IncidentStatus, Severity, UpdateIncidentDto};
use incident_stack::store::{IncidentStore, LoadState};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn store_with(gateway: InMemoryGateway) -> (Arc<RecordingSink>, IncidentStore) {
    let sink = Arc::new(RecordingSink::default());
    let store = IncidentStore::new(Arc::new(gateway)).with_sink(sink.clone());
    (sink, store)
}

#[tokio::test]
async fn test_load_then_create_prepends_server_record() {
    let gateway = InMemoryGateway::with_incidents(vec![
        incident("a", "First", Severity::High, IncidentStatus::Open),
        incident("b", "Second", Severity::Low, IncidentStatus::Open),
    ]);
    let (sink, store) = store_with(gateway);
    assert_ok!(store.load_all().await);

    let created = assert_ok!(
        store
            .create(
                CreateIncidentDto::new("DB down", "dba", "pager")
                    .with_severity(Severity::Critical)
                    .with_status(IncidentStatus::Open),
            )
            .await
    );

    let ids: Vec<String> = store.snapshot().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![created.id.clone(), "a".to_string(), "b".to_string()]);
    assert_eq!(store.snapshot()[0].severity, Severity::Critical);
    assert!(!created.id.is_empty());

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].1, Phase::Started);
    assert_eq!(events[0].2, "Creating incident...");
    assert_eq!(events[1].1, Phase::Succeeded);
    assert_eq!(events[1].2, "Incident created successfully");
}

#[tokio::test]
async fn test_status_update_replaces_in_place() {
    let (sink, store) = store_with(InMemoryGateway::with_incidents(critical_scenario()));
    store.load_all().await.unwrap();
    let before = store.snapshot();

    let updated = assert_ok!(store.update_status("B", IncidentStatus::Investigating).await);

    let after = store.snapshot();
    assert_eq!(after.len(), 3);
    assert_eq!(after[1].id, "B");
    assert_eq!(after[1], updated);
    assert_eq!(after[1].status, IncidentStatus::Investigating);
    assert!(after[1].updated_at >= after[1].created_at);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);

    let messages: Vec<String> = sink.events().into_iter().map(|(_, _, m)| m).collect();
    assert_eq!(messages, vec!["Updating status...", "Status updated successfully"]);
}

#[tokio::test]
async fn test_failed_delete_keeps_collection() {
    let gateway = InMemoryGateway::with_incidents(critical_scenario());
    gateway.fail(Operation::Delete);
    let (sink, store) = store_with(gateway);
    store.load_all().await.unwrap();
    let before = store.snapshot();

    let err = assert_err!(store.delete("A").await);
    assert_eq!(err.operation(), Some(Operation::Delete));
    assert_eq!(err.error_code(), "MUTATION_ERROR");

    assert_eq!(store.snapshot(), before);
    assert_eq!(
        sink.events()
            .into_iter()
            .map(|(_, phase, message)| (phase, message))
            .collect::<Vec<_>>(),
        vec![
            (Phase::Started, "Deleting incident...".to_string()),
            (Phase::Failed, "Failed to delete incident".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_initial_load_failure_is_persistent() {
    let gateway = InMemoryGateway::with_incidents(critical_scenario());
    gateway.fail(Operation::LoadAll);
    let (sink, store) = store_with(gateway.clone());

    let err = assert_err!(store.load_all().await);
    assert_eq!(err.error_code(), "FETCH_ERROR");
    assert!(store.is_empty());
    assert_eq!(
        store.load_state(),
        LoadState::Failed {
            message: "Failed to fetch incidents".to_string()
        }
    );
    // Loads are not mutations and never produce notifications
    assert!(sink.events().is_empty());

    // Nothing retries on its own; an explicit load recovers
    gateway.recover(Operation::LoadAll);
    assert!(store.load_state().is_failed());
    assert_ok!(store.load_all().await);
    assert_eq!(store.len(), 3);
    assert_eq!(store.load_state(), LoadState::Loaded);
}

#[tokio::test]
async fn test_update_with_empty_title_rejected_before_remote_call() {
    let gateway = InMemoryGateway::with_incidents(critical_scenario());
    let (sink, store) = store_with(gateway.clone());
    store.load_all().await.unwrap();
    let calls = gateway.call_count();

    let patch = UpdateIncidentDto {
        title: Some(String::new()),
        ..Default::default()
    };
    let err = assert_err!(store.update("A", patch).await);

    assert_eq!(err.operation(), Some(Operation::Update));
    assert_eq!(gateway.call_count(), calls);
    assert_eq!(store.get("A").unwrap().title, "Checkout errors");
    sink.assert_well_formed();
}

#[tokio::test]
async fn test_concurrent_mutations_on_different_ids_both_apply() {
    let (sink, store) = store_with(InMemoryGateway::with_incidents(critical_scenario()));
    store.load_all().await.unwrap();

    let (a, c) = futures::join!(
        store.update_severity("A", Severity::Medium),
        store.update_status("C", IncidentStatus::Closed),
    );
    assert_ok!(a);
    assert_ok!(c);

    assert_eq!(store.get("A").unwrap().severity, Severity::Medium);
    assert_eq!(store.get("C").unwrap().status, IncidentStatus::Closed);

    let phases = sink.phases();
    assert_eq!(phases.len(), 4);
    assert_eq!(phases.iter().filter(|(_, p)| *p == Phase::Succeeded).count(), 2);
    sink.assert_well_formed();
}

#[tokio::test]
async fn test_notification_ids_are_distinct() {
    let (sink, store) = store_with(InMemoryGateway::with_incidents(critical_scenario()));
    store.load_all().await.unwrap();

    store.update_status("A", IncidentStatus::Investigating).await.unwrap();
    store.update_status("A", IncidentStatus::Resolved).await.unwrap();
    let _ = store.delete("missing").await;

    let started: Vec<u64> = sink
        .phases()
        .into_iter()
        .filter(|(_, phase)| *phase == Phase::Started)
        .map(|(id, _)| id)
        .collect();
    assert_eq!(started.len(), 3);
    assert!(started.windows(2).all(|w| w[0] < w[1]));
    sink.assert_well_formed();
}

/// Issue Investigating then Resolved for the same incident and let the
/// responses arrive in reverse order. Returns the cached status afterwards.
async fn overlapping_status_updates(ordering: ResponseOrdering) -> (IncidentStatus, IncidentStatus) {
    let gateway = Arc::new(GatedGateway::new(InMemoryGateway::with_incidents(
        critical_scenario(),
    )));
    let store = IncidentStore::new(gateway.clone()).with_ordering(ordering);
    store.load_all().await.unwrap();

    let release_investigating = gateway.gate("investigating");
    let release_resolved = gateway.gate("resolved");
    let mut revisions = store.subscribe();
    revisions.borrow_and_update();

    let (first, second, _) = futures::join!(
        store.update_status("A", IncidentStatus::Investigating),
        store.update_status("A", IncidentStatus::Resolved),
        async {
            release_resolved.send(()).unwrap();
            revisions.changed().await.unwrap();
            release_investigating.send(()).unwrap();
        },
    );
    first.unwrap();
    second.unwrap();

    let server = gateway.inner.record("A").unwrap().status;
    (store.get("A").unwrap().status, server)
}

#[tokio::test]
async fn test_last_settled_response_wins_by_default() {
    let (cached, server) = overlapping_status_updates(ResponseOrdering::LastSettled).await;
    assert_eq!(server, IncidentStatus::Resolved);
    assert_eq!(cached, IncidentStatus::Investigating);
}

#[tokio::test]
async fn test_last_issued_discards_stale_response() {
    let (cached, server) = overlapping_status_updates(ResponseOrdering::LastIssued).await;
    assert_eq!(server, IncidentStatus::Resolved);
    assert_eq!(cached, IncidentStatus::Resolved);
}

#[tokio::test]
async fn test_late_update_after_delete_is_ignored() {
    let gateway = Arc::new(GatedGateway::new(InMemoryGateway::with_incidents(
        critical_scenario(),
    )));
    let sink = Arc::new(RecordingSink::default());
    let store = IncidentStore::new(gateway.clone()).with_sink(sink.clone());
    store.load_all().await.unwrap();

    let release = gateway.gate("closed");
    let (update, delete) = futures::join!(store.update_status("B", IncidentStatus::Closed), async {
        let deleted = store.delete("B").await;
        release.send(()).unwrap();
        deleted
    });

    assert_ok!(update);
    assert_ok!(delete);
    assert!(store.get("B").is_none());
    assert_eq!(store.len(), 2);
    sink.assert_well_formed();
}

#[tokio::test]
async fn test_response_applies_after_caller_stops_waiting() {
    let gateway = Arc::new(GatedGateway::new(InMemoryGateway::with_incidents(
        critical_scenario(),
    )));
    let sink = Arc::new(RecordingSink::default());
    let store = IncidentStore::new(gateway.clone()).with_sink(sink.clone());
    store.load_all().await.unwrap();

    let release = gateway.gate("5");
    let mut revisions = store.subscribe();
    revisions.borrow_and_update();

    let waited = tokio::time::timeout(
        Duration::from_millis(20),
        store.update_severity("A", Severity::Info),
    )
    .await;
    assert!(waited.is_err());
    assert_eq!(gateway.inner.record("A").unwrap().severity, Severity::Info);
    assert_eq!(store.get("A").unwrap().severity, Severity::Critical);

    release.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), revisions.changed())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(store.get("A").unwrap().severity, Severity::Info);
    assert_eq!(sink.phases().last().map(|(_, p)| *p), Some(Phase::Succeeded));
    sink.assert_well_formed();
}

#[tokio::test]
async fn test_update_changes_only_the_target() {
    let gateway = InMemoryGateway::with_incidents(critical_scenario());
    let (sink, store) = store_with(gateway.clone());
    store.load_all().await.unwrap();
    let before = store.snapshot();

    let patch = UpdateIncidentDto {
        title: Some("Search degraded".to_string()),
        owner: Some("search-team".to_string()),
        ..Default::default()
    };
    let updated = assert_ok!(store.update("B", patch).await);

    let after = store.snapshot();
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert_eq!(after[1], updated);
    assert_eq!(Some(after[1].clone()), gateway.record("B"));
    assert_eq!(after[1].title, "Search degraded");
    assert_eq!(after[1].owner, "search-team");
    assert_eq!(after[1].severity, before[1].severity);

    let messages: Vec<String> = sink.events().into_iter().map(|(_, _, m)| m).collect();
    assert_eq!(messages, vec!["Updating incident...", "Incident updated successfully"]);
}

#[tokio::test]
async fn test_failed_create_keeps_collection() {
    let gateway = InMemoryGateway::with_incidents(critical_scenario());
    gateway.fail(Operation::Create);
    let (sink, store) = store_with(gateway.clone());
    store.load_all().await.unwrap();
    let before = store.snapshot();

    let err = assert_err!(
        store
            .create(CreateIncidentDto::new("DB down", "dba", "pager"))
            .await
    );

    assert_eq!(err.operation(), Some(Operation::Create));
    assert_eq!(err.error_code(), "MUTATION_ERROR");
    assert_eq!(store.snapshot(), before);
    assert_eq!(gateway.len(), 3);
    assert_eq!(
        sink.phases().into_iter().map(|(_, p)| p).collect::<Vec<_>>(),
        vec![Phase::Started, Phase::Failed]
    );
}
