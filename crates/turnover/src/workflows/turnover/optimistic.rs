//! Client-side case cache with tentative patches.
//!
//! A caller applies a patch locally under a correlation id, persists it, and then
//! either confirms the tentative copy with the repository's answer or reverts to
//! the last-known-good record. Pushed snapshots replace the whole list; patches
//! still in flight are replayed on top so the local view does not flicker.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{CaseId, CasePatch, TurnoverCase};
use super::repository::{CaseRepository, RepositoryError, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorrelationId(pub u64);

#[derive(Debug, Clone)]
struct TentativePatch {
    case_id: CaseId,
    patch: CasePatch,
    applied_at: DateTime<Utc>,
    last_known_good: TurnoverCase,
}

#[derive(Debug, Default)]
pub struct OptimisticCaseCache {
    cases: Vec<TurnoverCase>,
    pending: BTreeMap<CorrelationId, TentativePatch>,
    next_correlation: u64,
}

impl OptimisticCaseCache {
    pub fn from_snapshot(cases: Vec<TurnoverCase>) -> Self {
        Self {
            cases,
            ..Self::default()
        }
    }

    pub fn cases(&self) -> &[TurnoverCase] {
        &self.cases
    }

    pub fn get(&self, id: &CaseId) -> Option<&TurnoverCase> {
        self.cases.iter().find(|case| case.id == *id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Applies `patch` locally. `None` when the case is not in the cache.
    pub fn apply_tentative(
        &mut self,
        case_id: &CaseId,
        patch: CasePatch,
        now: DateTime<Utc>,
    ) -> Option<CorrelationId> {
        let case = self.cases.iter_mut().find(|case| case.id == *case_id)?;
        let last_known_good = case.clone();
        patch.apply_to(case, now);

        self.next_correlation += 1;
        let correlation = CorrelationId(self.next_correlation);
        self.pending.insert(
            correlation,
            TentativePatch {
                case_id: case_id.clone(),
                patch,
                applied_at: now,
                last_known_good,
            },
        );
        Some(correlation)
    }

    /// Replaces the tentative copy with the authoritative record, when one is known.
    pub fn confirm(&mut self, correlation: CorrelationId, authoritative: Option<TurnoverCase>) {
        let Some(tentative) = self.pending.remove(&correlation) else {
            return;
        };

        if let Some(record) = authoritative {
            if let Some(slot) = self
                .cases
                .iter_mut()
                .find(|case| case.id == tentative.case_id)
            {
                *slot = record;
            }
        }
    }

    /// Restores the record as it was before the tentative patch.
    pub fn revert(&mut self, correlation: CorrelationId) -> bool {
        let Some(tentative) = self.pending.remove(&correlation) else {
            return false;
        };

        if let Some(slot) = self
            .cases
            .iter_mut()
            .find(|case| case.id == tentative.case_id)
        {
            *slot = tentative.last_known_good;
        }
        true
    }

    /// Swaps in a pushed snapshot and replays pending patches in issue order.
    pub fn replace_snapshot(&mut self, cases: Vec<TurnoverCase>) {
        self.cases = cases;

        let mut orphaned = Vec::new();
        for (correlation, tentative) in self.pending.iter_mut() {
            match self
                .cases
                .iter_mut()
                .find(|case| case.id == tentative.case_id)
            {
                Some(case) => {
                    tentative.last_known_good = case.clone();
                    tentative.patch.apply_to(case, tentative.applied_at);
                }
                None => orphaned.push(*correlation),
            }
        }

        for correlation in orphaned {
            self.pending.remove(&correlation);
        }
    }
}

/// Cache bound to a repository: local-first commits with revert-and-resync on failure.
pub struct CaseSession<R: CaseRepository + 'static> {
    repository: Arc<R>,
    cache: Arc<Mutex<OptimisticCaseCache>>,
    subscription: Option<SubscriptionId>,
}

impl<R> CaseSession<R>
where
    R: CaseRepository + 'static,
{
    pub fn open(repository: Arc<R>) -> Result<Self, RepositoryError> {
        let snapshot = repository.list()?;
        debug!(cases = snapshot.len(), "opened case session");
        Ok(Self {
            repository,
            cache: Arc::new(Mutex::new(OptimisticCaseCache::from_snapshot(snapshot))),
            subscription: None,
        })
    }

    fn cache(&self) -> MutexGuard<'_, OptimisticCaseCache> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers for live snapshots. Idempotent.
    pub fn attach(&mut self) {
        if self.subscription.is_some() {
            return;
        }

        let cache = Arc::clone(&self.cache);
        let id = self.repository.subscribe(Arc::new(move |cases: &[TurnoverCase]| {
            cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .replace_snapshot(cases.to_vec());
        }));
        self.subscription = Some(id);
    }

    pub fn detach(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.repository.unsubscribe(id);
        }
    }

    pub fn cases(&self) -> Vec<TurnoverCase> {
        self.cache().cases().to_vec()
    }

    pub fn get(&self, id: &CaseId) -> Option<TurnoverCase> {
        self.cache().get(id).cloned()
    }

    /// Applies `patch` locally, then persists it. On failure the local change is
    /// discarded and the cache is re-synced from the repository.
    pub fn commit(
        &self,
        case_id: &CaseId,
        patch: CasePatch,
        now: DateTime<Utc>,
    ) -> Result<TurnoverCase, RepositoryError> {
        let correlation = self
            .cache()
            .apply_tentative(case_id, patch.clone(), now)
            .ok_or(RepositoryError::NotFound)?;

        match self.repository.update(case_id, patch) {
            Ok(record) => {
                self.cache().confirm(correlation, Some(record.clone()));
                Ok(record)
            }
            Err(error) => {
                warn!(case_id = %case_id, %error, "persisting case change failed, reverting");
                self.cache().revert(correlation);
                self.resync();
                Err(error)
            }
        }
    }

    /// Replaces the local snapshot with the repository's. Keeps the stale cache if the list call fails.
    pub fn resync(&self) {
        match self.repository.list() {
            Ok(snapshot) => self.cache().replace_snapshot(snapshot),
            Err(error) => warn!(%error, "re-sync after failed commit did not succeed"),
        }
    }
}

impl<R: CaseRepository + 'static> Drop for CaseSession<R> {
    fn drop(&mut self) {
        self.detach();
    }
}
