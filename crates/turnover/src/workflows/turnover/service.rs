use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::blueprint::ChecklistBlueprint;
use super::checklist::{apply_update, ChecklistError, ChecklistUpdate};
use super::domain::{
    CaseDraft, CaseFieldsPatch, CaseId, CasePatch, Comment, NewCase, TurnoverCase, TurnoverStage,
};
use super::gate::{review_transition, suggest_next_stage, transition_patch, TransitionDecision};
use super::query::{partition_archived, sort_by_termination_date, CaseFilter};
use super::repository::{CaseRepository, RepositoryError};
use super::views::CaseEvaluation;
use crate::config::WorkflowConfig;

/// Service composing the case repository with the gating rules.
pub struct TurnoverService<R> {
    repository: Arc<R>,
    blueprint: ChecklistBlueprint,
    config: WorkflowConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageChange {
    pub case: TurnoverCase,
    pub from: TurnoverStage,
    pub to: TurnoverStage,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecklistOutcome {
    pub case: TurnoverCase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_next_stage: Option<TurnoverStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_advanced_to: Option<TurnoverStage>,
}

impl<R> TurnoverService<R>
where
    R: CaseRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: WorkflowConfig) -> Self {
        Self::with_blueprint(repository, ChecklistBlueprint::standard(), config)
    }

    pub fn with_blueprint(
        repository: Arc<R>,
        blueprint: ChecklistBlueprint,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            repository,
            blueprint,
            config,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Create a case in the first stage with a fresh checklist.
    pub fn create(
        &self,
        draft: CaseDraft,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Result<TurnoverCase, ServiceError> {
        let new_case = NewCase {
            draft,
            status: TurnoverStage::first(),
            checklist: self.blueprint.fresh_checklist(),
            created_at: now,
            created_by: created_by.to_string(),
        };

        let stored = self.repository.create(new_case)?;
        info!(case_id = %stored.id, address = %stored.address, "turnover case created");
        Ok(stored)
    }

    pub fn get(&self, id: &CaseId) -> Result<TurnoverCase, ServiceError> {
        let case = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(case)
    }

    /// Filtered working set sorted by termination date. Archived cases only on request.
    pub fn list(
        &self,
        filter: &CaseFilter,
        include_archived: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<TurnoverCase>, ServiceError> {
        let matching: Vec<TurnoverCase> = self
            .repository
            .list()?
            .into_iter()
            .filter(|case| filter.matches(case))
            .collect();

        let visible = if include_archived {
            matching
        } else {
            partition_archived(matching, now).0
        };

        Ok(sort_by_termination_date(visible))
    }

    pub fn evaluate(&self, id: &CaseId, now: DateTime<Utc>) -> Result<CaseEvaluation, ServiceError> {
        let case = self.get(id)?;
        Ok(CaseEvaluation::of(&case, now))
    }

    /// Move a case to `target`, enforcing the forward gate.
    pub fn change_stage(
        &self,
        id: &CaseId,
        target: TurnoverStage,
        now: DateTime<Utc>,
    ) -> Result<StageChange, ServiceError> {
        let case = self.get(id)?;
        let from = case.status;

        if let TransitionDecision::Refused { incomplete_stage } = review_transition(&case, target) {
            warn!(case_id = %id, from = %from, to = %target, "stage change refused");
            return Err(ServiceError::TransitionRefused {
                current: from,
                target,
                incomplete_stage,
            });
        }

        let patch = transition_patch(&case, target, now).ok_or(ServiceError::TransitionRefused {
            current: from,
            target,
            incomplete_stage: from,
        })?;
        let updated = self.repository.update(id, patch)?;
        info!(case_id = %id, from = %from, to = %target, "stage changed");

        Ok(StageChange {
            case: updated,
            from,
            to: target,
        })
    }

    /// Update one checklist entry and report (or apply) the next-stage suggestion.
    pub fn update_checklist_entry(
        &self,
        id: &CaseId,
        index: usize,
        update: ChecklistUpdate,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<ChecklistOutcome, ServiceError> {
        let case = self.get(id)?;
        let mut checklist = case.checklist;
        apply_update(&mut checklist, index, &update, actor, now)?;

        let patch = CasePatch {
            checklist: Some(checklist),
            ..CasePatch::touched_at(now)
        };
        let updated = self.repository.update(id, patch)?;
        let suggested_next_stage = suggest_next_stage(&updated);

        match suggested_next_stage {
            Some(next) if self.config.auto_advance => {
                let change = self.change_stage(id, next, now)?;
                info!(case_id = %id, to = %next, "stage auto-advanced after checklist completion");
                Ok(ChecklistOutcome {
                    case: change.case,
                    suggested_next_stage: None,
                    auto_advanced_to: Some(next),
                })
            }
            _ => Ok(ChecklistOutcome {
                case: updated,
                suggested_next_stage,
                auto_advanced_to: None,
            }),
        }
    }

    pub fn add_comment(
        &self,
        id: &CaseId,
        author: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<TurnoverCase, ServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::EmptyComment);
        }

        let mut comments = self.get(id)?.comments;
        comments.push(Comment {
            author: author.to_string(),
            text: text.to_string(),
            created_at: now,
        });

        let updated = self.repository.update(
            id,
            CasePatch {
                comments: Some(comments),
                ..CasePatch::touched_at(now)
            },
        )?;
        Ok(updated)
    }

    /// Descriptive field edits. Stage, checklist and comments have their own operations.
    pub fn update_fields(
        &self,
        id: &CaseId,
        fields: CaseFieldsPatch,
        now: DateTime<Utc>,
    ) -> Result<TurnoverCase, ServiceError> {
        let updated = self.repository.update(id, fields.into_patch(now))?;
        info!(case_id = %id, "case fields updated");
        Ok(updated)
    }

    pub fn delete(&self, id: &CaseId) -> Result<(), ServiceError> {
        self.repository.delete(id)?;
        info!(case_id = %id, "turnover case deleted");
        Ok(())
    }
}

/// Error raised by the turnover service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(
        "cannot move from {current} to {target}: complete the {incomplete_stage} checklist before moving on"
    )]
    TransitionRefused {
        current: TurnoverStage,
        target: TurnoverStage,
        incomplete_stage: TurnoverStage,
    },
    #[error("comment text must not be empty")]
    EmptyComment,
    #[error(transparent)]
    Checklist(#[from] ChecklistError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
