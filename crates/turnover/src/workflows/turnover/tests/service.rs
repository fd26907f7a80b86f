use super::common::*;
use chrono::{Duration, NaiveDate};

use crate::workflows::turnover::checklist::{ChecklistError, ChecklistUpdate};
use crate::workflows::turnover::domain::{
    CaseDraft, CaseFieldsPatch, CaseId, CasePatch, ChecklistEntry, TurnoverStage,
};
use crate::workflows::turnover::query::{CaseFilter, ResponsibleFilter};
use crate::workflows::turnover::repository::{CaseRepository, RepositoryError};
use crate::workflows::turnover::ServiceError;

#[test]
fn create_starts_in_first_stage_with_fresh_checklist() {
    let (service, _) = build_service(false);
    let case = service
        .create(draft(), "Sabine Roth", now())
        .expect("case created");

    assert_eq!(case.status, TurnoverStage::NoticeReceived);
    assert_eq!(case.created_by, "Sabine Roth");
    assert_eq!(case.created_at, now());
    assert_eq!(case.last_activity, now());
    assert!(case.completed_at.is_none());
    assert!(case.comments.is_empty());
    assert!(!case.checklist.is_empty());
    assert!(case.checklist.iter().all(|entry| !entry.is_satisfied()));
}

#[test]
fn change_stage_refuses_forward_move_with_open_checklist() {
    let (service, _) = build_service(false);
    let case = service.create(draft(), "Sabine Roth", now()).expect("created");

    match service.change_stage(&case.id, TurnoverStage::PreInspection, now()) {
        Err(ServiceError::TransitionRefused {
            current,
            target,
            incomplete_stage,
        }) => {
            assert_eq!(current, TurnoverStage::NoticeReceived);
            assert_eq!(target, TurnoverStage::PreInspection);
            assert_eq!(incomplete_stage, TurnoverStage::NoticeReceived);
        }
        other => panic!("expected refusal, got {other:?}"),
    }

    let stored = service.get(&case.id).expect("still there");
    assert_eq!(stored.status, TurnoverStage::NoticeReceived);
}

#[test]
fn refusal_message_names_the_incomplete_stage() {
    let (service, _) = build_service(false);
    let case = service.create(draft(), "Sabine Roth", now()).expect("created");

    let error = service
        .change_stage(&case.id, TurnoverStage::Handover, now())
        .expect_err("gated");
    assert!(error
        .to_string()
        .contains("complete the Notice Received checklist"));
}

#[test]
fn completed_section_unlocks_forward_move_and_backward_is_free() {
    let (service, _) = build_service(false);
    let case = service.create(draft(), "Sabine Roth", now()).expect("created");
    complete_current_stage(&service, &case.id);

    let later = now() + Duration::hours(2);
    let change = service
        .change_stage(&case.id, TurnoverStage::PreInspection, later)
        .expect("forward allowed");
    assert_eq!(change.from, TurnoverStage::NoticeReceived);
    assert_eq!(change.case.status, TurnoverStage::PreInspection);
    assert_eq!(change.case.last_activity, later);

    let back = service
        .change_stage(&case.id, TurnoverStage::NoticeReceived, later)
        .expect("backward always allowed");
    assert_eq!(back.case.status, TurnoverStage::NoticeReceived);
}

#[test]
fn entering_terminal_stage_stamps_completed_at() {
    let (service, _) = build_service(false);
    let case = service.create(draft(), "Sabine Roth", now()).expect("created");

    for stage in [
        TurnoverStage::PreInspection,
        TurnoverStage::Reletting,
        TurnoverStage::Handover,
    ] {
        complete_current_stage(&service, &case.id);
        service
            .change_stage(&case.id, stage, now())
            .expect("advance");
    }
    complete_current_stage(&service, &case.id);

    let done_at = now() + Duration::days(1);
    let change = service
        .change_stage(&case.id, TurnoverStage::Completed, done_at)
        .expect("handover complete");
    assert_eq!(change.case.completed_at, Some(done_at));

    let much_later = done_at + Duration::days(45);
    let again = service
        .change_stage(&case.id, TurnoverStage::Completed, much_later)
        .expect("same stage is never gated");
    assert_eq!(again.case.completed_at, Some(done_at));
    assert_eq!(again.case.last_activity, much_later);
}

#[test]
fn checklist_update_reports_suggestion_without_auto_advance() {
    let (service, _) = build_service(false);
    let case = service.create(draft(), "Sabine Roth", now()).expect("created");
    let last = nearly_complete_current_stage(&service, &case.id);

    let outcome = service
        .update_checklist_entry(
            &case.id,
            last,
            satisfying_updates(&case.checklist[last]).remove(0),
            "Lena Vogt",
            now(),
        )
        .expect("update applies");

    assert_eq!(
        outcome.suggested_next_stage,
        Some(TurnoverStage::PreInspection)
    );
    assert_eq!(outcome.auto_advanced_to, None);
    assert_eq!(outcome.case.status, TurnoverStage::NoticeReceived);
}

#[test]
fn checklist_update_auto_advances_when_enabled() {
    let (service, _) = build_service(true);
    let case = service.create(draft(), "Sabine Roth", now()).expect("created");
    let last = nearly_complete_current_stage(&service, &case.id);

    let outcome = service
        .update_checklist_entry(
            &case.id,
            last,
            satisfying_updates(&case.checklist[last]).remove(0),
            "Lena Vogt",
            now(),
        )
        .expect("update applies");

    assert_eq!(outcome.auto_advanced_to, Some(TurnoverStage::PreInspection));
    assert_eq!(outcome.case.status, TurnoverStage::PreInspection);
    assert_eq!(
        service.get(&case.id).expect("exists").status,
        TurnoverStage::PreInspection
    );
}

#[test]
fn checklist_update_rejects_headers_and_unknown_positions() {
    let (service, _) = build_service(false);
    let case = service.create(draft(), "Sabine Roth", now()).expect("created");
    assert!(matches!(case.checklist[0], ChecklistEntry::Header { .. }));

    match service.update_checklist_entry(&case.id, 0, ChecklistUpdate::Check, "x", now()) {
        Err(ServiceError::Checklist(ChecklistError::KindMismatch { kind, .. })) => {
            assert_eq!(kind, "header")
        }
        other => panic!("expected kind mismatch, got {other:?}"),
    }

    match service.update_checklist_entry(&case.id, 999, ChecklistUpdate::Check, "x", now()) {
        Err(ServiceError::Checklist(ChecklistError::UnknownEntry(999))) => {}
        other => panic!("expected unknown entry, got {other:?}"),
    }
}

#[test]
fn comments_append_and_blank_text_is_rejected() {
    let (service, _) = build_service(false);
    let case = service.create(draft(), "Sabine Roth", now()).expect("created");

    let later = now() + Duration::minutes(5);
    let updated = service
        .add_comment(&case.id, "Lena Vogt", "  Tenant asked for early handover ", later)
        .expect("comment added");
    assert_eq!(updated.comments.len(), 1);
    assert_eq!(updated.comments[0].text, "Tenant asked for early handover");
    assert_eq!(updated.comments[0].created_at, later);
    assert_eq!(updated.last_activity, later);

    assert!(matches!(
        service.add_comment(&case.id, "Lena Vogt", "   ", later),
        Err(ServiceError::EmptyComment)
    ));
}

#[test]
fn update_fields_merges_present_values_only() {
    let (service, _) = build_service(false);
    let case = service.create(draft(), "Sabine Roth", now()).expect("created");

    let later = now() + Duration::days(3);
    let updated = service
        .update_fields(
            &case.id,
            CaseFieldsPatch {
                incoming_tenant: Some(Some("Ida Brandt".to_string())),
                ..CaseFieldsPatch::default()
            },
            later,
        )
        .expect("fields updated");
    assert_eq!(updated.incoming_tenant.as_deref(), Some("Ida Brandt"));
    assert_eq!(updated.address, case.address);
    assert_eq!(updated.status, case.status);
    assert_eq!(updated.checklist, case.checklist);
    assert_eq!(updated.created_at, case.created_at);
    assert_eq!(updated.last_activity, later);
}

#[test]
fn update_fields_clears_optional_successor_details() {
    let (service, _) = build_service(false);
    let case = service
        .create(
            CaseDraft {
                incoming_tenant: Some("Ida Brandt".to_string()),
                rental_start: NaiveDate::from_ymd_opt(2024, 8, 1),
                ..draft()
            },
            "Sabine Roth",
            now(),
        )
        .expect("created");

    let kept = service
        .update_fields(
            &case.id,
            CaseFieldsPatch {
                responsible: Some("Team Süd".to_string()),
                ..CaseFieldsPatch::default()
            },
            now(),
        )
        .expect("fields updated");
    assert_eq!(kept.incoming_tenant.as_deref(), Some("Ida Brandt"));
    assert_eq!(kept.rental_start, NaiveDate::from_ymd_opt(2024, 8, 1));

    let cleared = service
        .update_fields(
            &case.id,
            CaseFieldsPatch {
                incoming_tenant: Some(None),
                rental_start: Some(None),
                ..CaseFieldsPatch::default()
            },
            now(),
        )
        .expect("fields cleared");
    assert_eq!(cleared.incoming_tenant, None);
    assert_eq!(cleared.rental_start, None);
    assert_eq!(cleared.responsible, "Team Süd");
}

#[test]
fn list_filters_sorts_and_hides_archived_cases() {
    let (service, repository) = build_service(false);
    service
        .create(draft_with("Bahnhofstraße 1", "2024-09-30", "Team Süd"), "seed", now())
        .expect("created");
    let early = service
        .create(draft_with("Musterstraße 12", "2024-03-31", "Team Nord"), "seed", now())
        .expect("created");
    service
        .create(draft_with("Musterweg 5", "2024-07-31", "Team Nord"), "seed", now())
        .expect("created");

    let long_ago = now() - Duration::days(60);
    repository
        .update(
            &early.id,
            CasePatch {
                status: Some(TurnoverStage::Completed),
                completed_at: Some(long_ago),
                ..CasePatch::touched_at(long_ago)
            },
        )
        .expect("seeded as archived");

    let filter = CaseFilter {
        query: "muster".to_string(),
        responsible: ResponsibleFilter::Named("Team Nord".to_string()),
    };
    let active = service.list(&filter, false, now()).expect("list");
    let addresses: Vec<&str> = active.iter().map(|case| case.address.as_str()).collect();
    assert_eq!(addresses, ["Musterweg 5"]);

    let everything = service.list(&filter, true, now()).expect("list");
    let addresses: Vec<&str> = everything.iter().map(|case| case.address.as_str()).collect();
    assert_eq!(addresses, ["Musterstraße 12", "Musterweg 5"]);

    let all = service
        .list(&CaseFilter::default(), false, now())
        .expect("list");
    assert_eq!(all.len(), 2);
}

#[test]
fn evaluate_reports_progress_for_every_stage() {
    let (service, _) = build_service(false);
    let case = service.create(draft(), "Sabine Roth", now()).expect("created");
    complete_current_stage(&service, &case.id);

    let evaluation = service.evaluate(&case.id, now()).expect("evaluates");
    assert_eq!(evaluation.sections.len(), TurnoverStage::ordered().len());
    assert!(evaluation.current_stage_complete);
    assert_eq!(
        evaluation.suggested_next_stage,
        Some(TurnoverStage::PreInspection)
    );
    assert!(!evaluation.archived);

    let terminal = evaluation
        .sections
        .iter()
        .find(|section| section.stage == TurnoverStage::Completed)
        .expect("terminal listed");
    assert_eq!(terminal.total, 0);
    assert!(!terminal.complete);
}

#[test]
fn missing_cases_propagate_not_found() {
    let (service, _) = build_service(false);
    let missing = CaseId("case-missing".to_string());

    assert!(matches!(
        service.get(&missing),
        Err(ServiceError::Repository(RepositoryError::NotFound))
    ));
    assert!(matches!(
        service.delete(&missing),
        Err(ServiceError::Repository(RepositoryError::NotFound))
    ));
    assert!(matches!(
        service.change_stage(&missing, TurnoverStage::Handover, now()),
        Err(ServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn delete_removes_the_case() {
    let (service, repository) = build_service(false);
    let case = service.create(draft(), "Sabine Roth", now()).expect("created");
    service.delete(&case.id).expect("deleted");
    assert!(repository.fetch(&case.id).expect("fetch").is_none());
}
