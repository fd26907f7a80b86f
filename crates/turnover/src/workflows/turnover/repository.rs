use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::domain::{CaseId, CasePatch, NewCase, TurnoverCase};

/// Callback receiving the complete case list after every change.
pub type CaseObserver = Arc<dyn Fn(&[TurnoverCase]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// Storage abstraction for turnover cases. Updates are last-write-wins per case.
pub trait CaseRepository: Send + Sync {
    fn list(&self) -> Result<Vec<TurnoverCase>, RepositoryError>;
    fn fetch(&self, id: &CaseId) -> Result<Option<TurnoverCase>, RepositoryError>;
    fn create(&self, case: NewCase) -> Result<TurnoverCase, RepositoryError>;
    /// Merges the fields present in `patch` and refreshes `last_activity`.
    fn update(&self, id: &CaseId, patch: CasePatch) -> Result<TurnoverCase, RepositoryError>;
    fn delete(&self, id: &CaseId) -> Result<(), RepositoryError>;
    fn subscribe(&self, observer: CaseObserver) -> SubscriptionId;
    fn unsubscribe(&self, subscription: SubscriptionId) -> bool;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Process-local repository used by the HTTP service, the demo, and tests.
#[derive(Default)]
pub struct InMemoryCaseRepository {
    records: Mutex<BTreeMap<CaseId, TurnoverCase>>,
    observers: Mutex<BTreeMap<SubscriptionId, CaseObserver>>,
    next_case: AtomicU64,
    next_subscription: AtomicU64,
}

impl InMemoryCaseRepository {
    pub fn with_cases(cases: impl IntoIterator<Item = TurnoverCase>) -> Self {
        let repository = Self::default();
        {
            let mut records = repository.records_guard();
            for case in cases {
                records.insert(case.id.clone(), case);
            }
        }
        repository
    }

    fn records_guard(&self) -> MutexGuard<'_, BTreeMap<CaseId, TurnoverCase>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Next `case-NNNNNN` id not already held, including ids loaded through [`Self::with_cases`].
    fn allocate_id(&self, records: &BTreeMap<CaseId, TurnoverCase>) -> CaseId {
        loop {
            let sequence = self.next_case.fetch_add(1, Ordering::Relaxed) + 1;
            let id = CaseId(format!("case-{sequence:06}"));
            if !records.contains_key(&id) {
                return id;
            }
        }
    }

    fn snapshot(&self) -> Vec<TurnoverCase> {
        self.records_guard().values().cloned().collect()
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        let observers: Vec<CaseObserver> = self
            .observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .cloned()
            .collect();

        for observer in observers {
            observer(&snapshot);
        }
    }
}

impl CaseRepository for InMemoryCaseRepository {
    fn list(&self) -> Result<Vec<TurnoverCase>, RepositoryError> {
        Ok(self.snapshot())
    }

    fn fetch(&self, id: &CaseId) -> Result<Option<TurnoverCase>, RepositoryError> {
        Ok(self.records_guard().get(id).cloned())
    }

    fn create(&self, case: NewCase) -> Result<TurnoverCase, RepositoryError> {
        let stored = {
            let mut records = self.records_guard();
            let id = self.allocate_id(&records);
            let stored = case.into_case(id.clone());
            records.insert(id, stored.clone());
            stored
        };
        self.notify();
        Ok(stored)
    }

    fn update(&self, id: &CaseId, patch: CasePatch) -> Result<TurnoverCase, RepositoryError> {
        let updated = {
            let mut records = self.records_guard();
            let record = records.get_mut(id).ok_or(RepositoryError::NotFound)?;
            patch.apply_to(record, Utc::now());
            record.clone()
        };
        self.notify();
        Ok(updated)
    }

    fn delete(&self, id: &CaseId) -> Result<(), RepositoryError> {
        let removed = self.records_guard().remove(id);
        if removed.is_none() {
            return Err(RepositoryError::NotFound);
        }
        self.notify();
        Ok(())
    }

    fn subscribe(&self, observer: CaseObserver) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, observer);
        id
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&subscription)
            .is_some()
    }
}
