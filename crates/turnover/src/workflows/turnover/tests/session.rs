use super::common::*;
use chrono::Duration;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::WorkflowConfig;
use crate::workflows::turnover::domain::{CaseId, CasePatch, TurnoverCase, TurnoverStage};
use crate::workflows::turnover::optimistic::{CaseSession, OptimisticCaseCache};
use crate::workflows::turnover::repository::{
    CaseRepository, InMemoryCaseRepository, RepositoryError,
};
use crate::workflows::turnover::TurnoverService;

fn seeded_repository() -> (Arc<InMemoryCaseRepository>, CaseId) {
    let repository = Arc::new(InMemoryCaseRepository::default());
    let service = TurnoverService::new(repository.clone(), WorkflowConfig::default());
    let case = service.create(draft(), "seed", now()).expect("created");
    (repository, case.id)
}

#[test]
fn cache_revert_restores_last_known_good() {
    let (repository, id) = seeded_repository();
    let mut cache = OptimisticCaseCache::from_snapshot(repository.list().expect("list"));
    let before = cache.get(&id).cloned().expect("cached");

    let correlation = cache
        .apply_tentative(
            &id,
            CasePatch {
                responsible: Some("Team Süd".to_string()),
                ..CasePatch::default()
            },
            now() + Duration::minutes(1),
        )
        .expect("case cached");
    assert_eq!(cache.get(&id).expect("cached").responsible, "Team Süd");
    assert_eq!(cache.pending_count(), 1);

    assert!(cache.revert(correlation));
    assert_eq!(cache.get(&id), Some(&before));
    assert_eq!(cache.pending_count(), 0);
    assert!(!cache.revert(correlation));
}

#[test]
fn cache_confirm_takes_authoritative_record() {
    let (repository, id) = seeded_repository();
    let mut cache = OptimisticCaseCache::from_snapshot(repository.list().expect("list"));
    let patch = CasePatch {
        unit: Some("Dachgeschoss".to_string()),
        ..CasePatch::default()
    };

    let correlation = cache
        .apply_tentative(&id, patch.clone(), now())
        .expect("case cached");
    let authoritative = repository.update(&id, patch).expect("persisted");
    cache.confirm(correlation, Some(authoritative.clone()));

    assert_eq!(cache.get(&id), Some(&authoritative));
    assert_eq!(cache.pending_count(), 0);
}

#[test]
fn pushed_snapshot_keeps_pending_patches_applied() {
    let (repository, id) = seeded_repository();
    let mut cache = OptimisticCaseCache::from_snapshot(repository.list().expect("list"));
    cache
        .apply_tentative(
            &id,
            CasePatch {
                incoming_tenant: Some(Some("Ida Brandt".to_string())),
                ..CasePatch::default()
            },
            now(),
        )
        .expect("case cached");

    repository
        .update(
            &id,
            CasePatch {
                responsible: Some("Team West".to_string()),
                ..CasePatch::default()
            },
        )
        .expect("remote change");
    cache.replace_snapshot(repository.list().expect("list"));

    let cached = cache.get(&id).expect("cached");
    assert_eq!(cached.responsible, "Team West");
    assert_eq!(cached.incoming_tenant.as_deref(), Some("Ida Brandt"));
    assert_eq!(cache.pending_count(), 1);

    repository.delete(&id).expect("deleted remotely");
    cache.replace_snapshot(repository.list().expect("list"));
    assert!(cache.get(&id).is_none());
    assert_eq!(cache.pending_count(), 0);
}

#[test]
fn session_commit_confirms_on_success() {
    let (repository, id) = seeded_repository();
    let session = CaseSession::open(repository.clone()).expect("session opens");

    let record = session
        .commit(
            &id,
            CasePatch {
                responsible: Some("Team Süd".to_string()),
                ..CasePatch::touched_at(now())
            },
            now(),
        )
        .expect("commit succeeds");

    assert_eq!(record.responsible, "Team Süd");
    assert_eq!(session.get(&id), Some(record));
}

#[test]
fn session_commit_reverts_and_resyncs_on_failure() {
    let repository = Arc::new(FlakyRepository::default());
    let service = TurnoverService::new(repository.clone(), WorkflowConfig::default());
    let case = service.create(draft(), "seed", now()).expect("created");
    let session = CaseSession::open(repository.clone()).expect("session opens");

    repository.set_failing(true);
    let result = session.commit(
        &case.id,
        CasePatch {
            status: Some(TurnoverStage::Handover),
            ..CasePatch::touched_at(now())
        },
        now(),
    );

    assert_eq!(
        result,
        Err(RepositoryError::Unavailable("store offline".to_string()))
    );
    let cached = session.get(&case.id).expect("still cached");
    assert_eq!(cached.status, TurnoverStage::NoticeReceived);
    assert_eq!(cached, repository.fetch(&case.id).expect("fetch").expect("stored"));
}

#[test]
fn attached_session_follows_remote_changes_until_detached() {
    let (repository, id) = seeded_repository();
    let mut session = CaseSession::open(repository.clone()).expect("session opens");
    session.attach();

    repository
        .update(
            &id,
            CasePatch {
                address: Some("Musterstraße 14".to_string()),
                ..CasePatch::default()
            },
        )
        .expect("remote change");
    assert_eq!(
        session.get(&id).expect("cached").address,
        "Musterstraße 14"
    );

    session.detach();
    repository
        .update(
            &id,
            CasePatch {
                address: Some("Musterstraße 16".to_string()),
                ..CasePatch::default()
            },
        )
        .expect("remote change");
    assert_eq!(
        session.get(&id).expect("cached").address,
        "Musterstraße 14"
    );
}

#[test]
fn repository_notifies_observers_with_full_snapshot() {
    let (repository, id) = seeded_repository();
    let seen = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&seen);
    let subscription = repository.subscribe(Arc::new(move |cases: &[TurnoverCase]| {
        observed.store(cases.len(), Ordering::SeqCst);
    }));

    let service = TurnoverService::new(repository.clone(), WorkflowConfig::default());
    service.create(draft(), "seed", now()).expect("created");
    assert_eq!(seen.load(Ordering::SeqCst), 2);

    assert!(repository.unsubscribe(subscription));
    assert!(!repository.unsubscribe(subscription));
    repository.delete(&id).expect("deleted");
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}
