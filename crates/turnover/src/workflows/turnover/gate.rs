use super::checklist::is_stage_complete;
use super::domain::{CasePatch, TurnoverCase, TurnoverStage};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of reviewing a requested stage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum TransitionDecision {
    Allowed,
    Refused { incomplete_stage: TurnoverStage },
}

impl TransitionDecision {
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn refusal_message(self) -> Option<String> {
        match self {
            Self::Allowed => None,
            Self::Refused { incomplete_stage } => Some(format!(
                "complete the {} checklist before moving on",
                incomplete_stage.label()
            )),
        }
    }
}

/// Forward moves require the current stage's section to be complete; regressions are always allowed.
pub fn review_transition(case: &TurnoverCase, target: TurnoverStage) -> TransitionDecision {
    let current = case.status;
    if target.position() <= current.position() || is_stage_complete(case, current) {
        TransitionDecision::Allowed
    } else {
        TransitionDecision::Refused {
            incomplete_stage: current,
        }
    }
}

pub fn can_transition(case: &TurnoverCase, target: TurnoverStage) -> bool {
    review_transition(case, target).is_allowed()
}

/// Patch committing an accepted transition. `None` when the gate refuses it.
///
/// `completed_at` is stamped only when the case enters the terminal stage, so
/// re-confirming a completed case keeps its original completion time.
pub fn transition_patch(
    case: &TurnoverCase,
    target: TurnoverStage,
    now: DateTime<Utc>,
) -> Option<CasePatch> {
    if !can_transition(case, target) {
        return None;
    }

    Some(CasePatch {
        status: Some(target),
        completed_at: (target.is_terminal() && case.status != target).then_some(now),
        ..CasePatch::touched_at(now)
    })
}

/// Next stage once the current section is complete. Never suggests past the terminal stage.
pub fn suggest_next_stage(case: &TurnoverCase) -> Option<TurnoverStage> {
    if case.status.is_terminal() || !is_stage_complete(case, case.status) {
        return None;
    }
    case.status.next()
}
