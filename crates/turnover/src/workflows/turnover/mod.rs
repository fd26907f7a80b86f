//! Apartment turnover cases: checklist gating, stage progression, archival, and
//! the service, repository, and HTTP surface around them.

mod archive;
mod blueprint;
mod checklist;
pub mod domain;
mod gate;
pub mod optimistic;
mod query;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use archive::{should_archive, ARCHIVE_AFTER_DAYS};
pub use blueprint::ChecklistBlueprint;
pub use checklist::{
    apply_update, is_stage_complete, section_progress, ChecklistError, ChecklistUpdate,
    SectionProgress,
};
pub use domain::{
    CaseDraft, CaseFieldsPatch, CaseId, CasePatch, ChecklistEntry, Comment, GroupField, NewCase,
    RelettingOption, TurnoverCase, TurnoverStage,
};
pub use gate::{
    can_transition, review_transition, suggest_next_stage, transition_patch, TransitionDecision,
};
pub use optimistic::{CaseSession, CorrelationId, OptimisticCaseCache};
pub use query::{
    board_columns, matches_query, matches_responsible, partition_archived,
    sort_by_termination_date, BoardColumn, CaseFilter, ResponsibleFilter, ALL_RESPONSIBLE,
};
pub use repository::{
    CaseObserver, CaseRepository, InMemoryCaseRepository, RepositoryError, SubscriptionId,
};
pub use router::case_router;
pub use service::{ChecklistOutcome, ServiceError, StageChange, TurnoverService};
pub use views::{CaseDetailView, CaseEvaluation, CaseSummaryView, SectionStatusEntry};
