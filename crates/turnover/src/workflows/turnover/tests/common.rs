use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::workflows::turnover::checklist::ChecklistUpdate;
use crate::workflows::turnover::domain::{
    CaseDraft, CaseId, CasePatch, ChecklistEntry, NewCase, RelettingOption, TurnoverCase,
    TurnoverStage,
};
use crate::workflows::turnover::repository::{
    CaseObserver, CaseRepository, InMemoryCaseRepository, RepositoryError, SubscriptionId,
};
use crate::workflows::turnover::{case_router, TurnoverService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 9, 30, 0).unwrap()
}

pub(super) fn draft() -> CaseDraft {
    CaseDraft {
        address: "Musterstraße 12".to_string(),
        unit: "3. OG links".to_string(),
        outgoing_tenant: "Jonas Keller".to_string(),
        termination_date: NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date"),
        incoming_tenant: None,
        rental_start: None,
        responsible: "Team Nord".to_string(),
        reletting_option: RelettingOption::Relet,
    }
}

pub(super) fn draft_with(address: &str, termination: &str, responsible: &str) -> CaseDraft {
    CaseDraft {
        address: address.to_string(),
        termination_date: NaiveDate::parse_from_str(termination, "%Y-%m-%d").expect("valid"),
        responsible: responsible.to_string(),
        ..draft()
    }
}

pub(super) fn build_service(
    auto_advance: bool,
) -> (
    TurnoverService<InMemoryCaseRepository>,
    Arc<InMemoryCaseRepository>,
) {
    let repository = Arc::new(InMemoryCaseRepository::default());
    let service = TurnoverService::new(repository.clone(), WorkflowConfig { auto_advance });
    (service, repository)
}

/// Update that satisfies `entry`, or `None` for entries that carry no weight.
pub(super) fn satisfying_updates(entry: &ChecklistEntry) -> Vec<ChecklistUpdate> {
    match entry {
        ChecklistEntry::Checkbox { .. } => vec![ChecklistUpdate::Check],
        ChecklistEntry::TextInput { .. } => vec![ChecklistUpdate::SetValue {
            value: "noted".to_string(),
        }],
        ChecklistEntry::DateInput { .. } => vec![ChecklistUpdate::SetValue {
            value: "2024-05-10".to_string(),
        }],
        ChecklistEntry::NumberInput { .. } => vec![ChecklistUpdate::SetValue {
            value: "1200".to_string(),
        }],
        ChecklistEntry::Group { fields, .. } => fields
            .iter()
            .map(|field| ChecklistUpdate::SetGroupField {
                field: field.label.clone(),
                value: "42".to_string(),
            })
            .collect(),
        ChecklistEntry::Header { .. } | ChecklistEntry::Spacer => Vec::new(),
    }
}

/// Positions of the weighted entries in `stage`'s section.
pub(super) fn section_indices(case: &TurnoverCase, stage: TurnoverStage) -> Vec<usize> {
    let mut indices = Vec::new();
    let mut inside = false;
    for (index, entry) in case.checklist.iter().enumerate() {
        if let ChecklistEntry::Header { .. } = entry {
            if inside {
                break;
            }
            inside = entry.section_stage() == Some(stage);
            continue;
        }
        if inside && !matches!(entry, ChecklistEntry::Spacer) {
            indices.push(index);
        }
    }
    indices
}

/// Fills every entry of the case's current section except the last one.
pub(super) fn nearly_complete_current_stage(
    service: &TurnoverService<InMemoryCaseRepository>,
    id: &CaseId,
) -> usize {
    let case = service.get(id).expect("case exists");
    let indices = section_indices(&case, case.status);
    let (last, rest) = indices.split_last().expect("section has entries");
    for index in rest {
        fill_entry(service, id, *index);
    }
    *last
}

pub(super) fn fill_entry(
    service: &TurnoverService<InMemoryCaseRepository>,
    id: &CaseId,
    index: usize,
) {
    let entry = service.get(id).expect("case exists").checklist[index].clone();
    for update in satisfying_updates(&entry) {
        service
            .update_checklist_entry(id, index, update, "Lena Vogt", now())
            .expect("checklist update applies");
    }
}

pub(super) fn complete_current_stage(
    service: &TurnoverService<InMemoryCaseRepository>,
    id: &CaseId,
) {
    let last = nearly_complete_current_stage(service, id);
    fill_entry(service, id, last);
}

/// Repository whose writes can be switched off to exercise failure paths.
#[derive(Default)]
pub(super) struct FlakyRepository {
    pub(super) inner: InMemoryCaseRepository,
    pub(super) fail_writes: AtomicBool,
}

impl FlakyRepository {
    pub(super) fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CaseRepository for FlakyRepository {
    fn list(&self) -> Result<Vec<TurnoverCase>, RepositoryError> {
        self.inner.list()
    }

    fn fetch(&self, id: &CaseId) -> Result<Option<TurnoverCase>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn create(&self, case: NewCase) -> Result<TurnoverCase, RepositoryError> {
        self.check()?;
        self.inner.create(case)
    }

    fn update(&self, id: &CaseId, patch: CasePatch) -> Result<TurnoverCase, RepositoryError> {
        self.check()?;
        self.inner.update(id, patch)
    }

    fn delete(&self, id: &CaseId) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.delete(id)
    }

    fn subscribe(&self, observer: CaseObserver) -> SubscriptionId {
        self.inner.subscribe(observer)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.inner.unsubscribe(subscription)
    }
}

pub(super) fn router_with_service(
    service: TurnoverService<InMemoryCaseRepository>,
) -> axum::Router {
    case_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
