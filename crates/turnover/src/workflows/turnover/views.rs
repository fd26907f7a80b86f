use super::archive::should_archive;
use super::checklist::section_progress;
use super::domain::{CaseId, RelettingOption, TurnoverCase, TurnoverStage};
use super::gate::suggest_next_stage;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SectionStatusEntry {
    pub stage: TurnoverStage,
    pub stage_label: &'static str,
    pub completed: usize,
    pub total: usize,
    pub complete: bool,
}

/// Everything the rules engine says about one case at `now`.
#[derive(Debug, Clone, Serialize)]
pub struct CaseEvaluation {
    pub sections: Vec<SectionStatusEntry>,
    pub current_stage_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_next_stage: Option<TurnoverStage>,
    pub archived: bool,
}

impl CaseEvaluation {
    pub fn of(case: &TurnoverCase, now: DateTime<Utc>) -> Self {
        let sections: Vec<SectionStatusEntry> = TurnoverStage::ordered()
            .into_iter()
            .map(|stage| {
                let progress = section_progress(case, stage);
                SectionStatusEntry {
                    stage,
                    stage_label: stage.label(),
                    completed: progress.completed,
                    total: progress.total,
                    complete: progress.is_complete(),
                }
            })
            .collect();

        let current_stage_complete = sections
            .iter()
            .any(|section| section.stage == case.status && section.complete);

        Self {
            sections,
            current_stage_complete,
            suggested_next_stage: suggest_next_stage(case),
            archived: should_archive(case, now),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseSummaryView {
    pub id: CaseId,
    pub address: String,
    pub unit: String,
    pub outgoing_tenant: String,
    pub termination_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming_tenant: Option<String>,
    pub status: TurnoverStage,
    pub status_label: &'static str,
    pub responsible: String,
    pub reletting_option: RelettingOption,
    pub reletting_label: &'static str,
    pub stage_completed: usize,
    pub stage_total: usize,
    pub last_activity: DateTime<Utc>,
    pub archived: bool,
}

impl CaseSummaryView {
    pub fn of(case: &TurnoverCase, now: DateTime<Utc>) -> Self {
        let progress = section_progress(case, case.status);
        Self {
            id: case.id.clone(),
            address: case.address.clone(),
            unit: case.unit.clone(),
            outgoing_tenant: case.outgoing_tenant.clone(),
            termination_date: case.termination_date,
            incoming_tenant: case.incoming_tenant.clone(),
            status: case.status,
            status_label: case.status.label(),
            responsible: case.responsible.clone(),
            reletting_option: case.reletting_option,
            reletting_label: case.reletting_option.label(),
            stage_completed: progress.completed,
            stage_total: progress.total,
            last_activity: case.last_activity,
            archived: should_archive(case, now),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseDetailView {
    #[serde(flatten)]
    pub case: TurnoverCase,
    pub status_label: &'static str,
    pub reletting_label: &'static str,
    pub evaluation: CaseEvaluation,
}

impl CaseDetailView {
    pub fn of(case: TurnoverCase, now: DateTime<Utc>) -> Self {
        let evaluation = CaseEvaluation::of(&case, now);
        Self {
            status_label: case.status.label(),
            reletting_label: case.reletting_option.label(),
            evaluation,
            case,
        }
    }
}
