use super::domain::{initials_for, ChecklistEntry, TurnoverCase, TurnoverStage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionProgress {
    pub completed: usize,
    pub total: usize,
}

impl SectionProgress {
    /// An empty section is never complete.
    pub const fn is_complete(self) -> bool {
        self.total > 0 && self.total == self.completed
    }
}

/// Counts the entries of the first section opened by a header for `stage`.
pub fn section_progress(case: &TurnoverCase, stage: TurnoverStage) -> SectionProgress {
    let mut progress = SectionProgress::default();
    let mut in_section = false;

    for entry in &case.checklist {
        if let ChecklistEntry::Header { .. } = entry {
            if in_section {
                break;
            }
            in_section = entry.section_stage() == Some(stage);
            continue;
        }

        if !in_section || matches!(entry, ChecklistEntry::Spacer) {
            continue;
        }

        progress.total += 1;
        if entry.is_satisfied() {
            progress.completed += 1;
        }
    }

    progress
}

pub fn is_stage_complete(case: &TurnoverCase, stage: TurnoverStage) -> bool {
    section_progress(case, stage).is_complete()
}

/// Mutation requested for a single checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ChecklistUpdate {
    Check,
    Uncheck,
    SetValue { value: String },
    SetGroupField { field: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChecklistError {
    #[error("checklist has no entry at position {0}")]
    UnknownEntry(usize),
    #[error("cannot apply {update} to a {kind} entry")]
    KindMismatch {
        update: &'static str,
        kind: &'static str,
    },
    #[error("group has no field named '{0}'")]
    UnknownGroupField(String),
}

impl ChecklistUpdate {
    const fn name(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Uncheck => "uncheck",
            Self::SetValue { .. } => "set_value",
            Self::SetGroupField { .. } => "set_group_field",
        }
    }
}

/// Applies `update` to the entry at `index`, stamping checkbox provenance for `actor`.
pub fn apply_update(
    checklist: &mut [ChecklistEntry],
    index: usize,
    update: &ChecklistUpdate,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<(), ChecklistError> {
    let entry = checklist
        .get_mut(index)
        .ok_or(ChecklistError::UnknownEntry(index))?;
    let kind = entry.kind();
    let mismatch = || ChecklistError::KindMismatch {
        update: update.name(),
        kind,
    };

    match (entry, update) {
        (
            ChecklistEntry::Checkbox {
                completed,
                completed_by,
                completed_by_initials,
                completed_at,
                ..
            },
            ChecklistUpdate::Check,
        ) => {
            *completed = true;
            *completed_by = Some(actor.to_string());
            *completed_by_initials = Some(initials_for(actor));
            *completed_at = Some(now);
        }
        (
            ChecklistEntry::Checkbox {
                completed,
                completed_by,
                completed_by_initials,
                completed_at,
                ..
            },
            ChecklistUpdate::Uncheck,
        ) => {
            *completed = false;
            *completed_by = None;
            *completed_by_initials = None;
            *completed_at = None;
        }
        (
            ChecklistEntry::TextInput { value, .. }
            | ChecklistEntry::DateInput { value, .. }
            | ChecklistEntry::NumberInput { value, .. },
            ChecklistUpdate::SetValue { value: next },
        ) => {
            *value = next.clone();
        }
        (
            ChecklistEntry::Group { fields, .. },
            ChecklistUpdate::SetGroupField { field, value },
        ) => {
            let target = fields
                .iter_mut()
                .find(|candidate| candidate.label == *field)
                .ok_or_else(|| ChecklistError::UnknownGroupField(field.clone()))?;
            target.value = value.clone();
        }
        _ => return Err(mismatch()),
    }

    Ok(())
}
