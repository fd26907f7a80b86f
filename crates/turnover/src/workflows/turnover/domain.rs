use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnoverStage {
    NoticeReceived,
    PreInspection,
    Reletting,
    Handover,
    Completed,
}

impl TurnoverStage {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::NoticeReceived,
            Self::PreInspection,
            Self::Reletting,
            Self::Handover,
            Self::Completed,
        ]
    }

    pub const fn first() -> Self {
        Self::NoticeReceived
    }

    pub const fn terminal() -> Self {
        Self::Completed
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NoticeReceived => "Notice Received",
            Self::PreInspection => "Pre-Inspection",
            Self::Reletting => "Re-letting",
            Self::Handover => "Handover",
            Self::Completed => "Completed",
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::NoticeReceived => "notice_received",
            Self::PreInspection => "pre_inspection",
            Self::Reletting => "reletting",
            Self::Handover => "handover",
            Self::Completed => "completed",
        }
    }

    /// Zero-based position in the pipeline.
    pub const fn position(self) -> usize {
        match self {
            Self::NoticeReceived => 0,
            Self::PreInspection => 1,
            Self::Reletting => 2,
            Self::Handover => 3,
            Self::Completed => 4,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn next(self) -> Option<Self> {
        Self::ordered().get(self.position() + 1).copied()
    }

    /// Exact display-label lookup used for headers that predate stage identifiers.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|stage| stage.label() == label)
    }

    /// Accepts either the stable key or the display label. Anything else is unknown.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|stage| stage.key() == trimmed)
            .or_else(|| Self::from_label(trimmed))
    }
}

impl fmt::Display for TurnoverStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelettingOption {
    Relet,
    SuccessorKnown,
    Renovation,
}

impl RelettingOption {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Relet => "Will be re-let",
            Self::SuccessorKnown => "Successor tenant known",
            Self::Renovation => "Renovation",
        }
    }
}

/// Identifier wrapper for turnover cases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub String);

impl CaseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupField {
    pub label: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ChecklistEntry {
    Header {
        text: String,
        /// Stable stage identifier; headers without one are matched on `text`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stage: Option<TurnoverStage>,
    },
    Checkbox {
        label: String,
        #[serde(default)]
        completed: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completed_by: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completed_by_initials: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completed_at: Option<DateTime<Utc>>,
    },
    TextInput {
        label: String,
        #[serde(default)]
        value: String,
    },
    DateInput {
        label: String,
        #[serde(default)]
        value: String,
    },
    NumberInput {
        label: String,
        #[serde(default)]
        value: String,
    },
    Group {
        label: String,
        fields: Vec<GroupField>,
    },
    Spacer,
}

impl ChecklistEntry {
    pub fn header(stage: TurnoverStage) -> Self {
        Self::Header {
            text: stage.label().to_string(),
            stage: Some(stage),
        }
    }

    pub fn checkbox(label: &str) -> Self {
        Self::Checkbox {
            label: label.to_string(),
            completed: false,
            completed_by: None,
            completed_by_initials: None,
            completed_at: None,
        }
    }

    pub fn text_input(label: &str) -> Self {
        Self::TextInput {
            label: label.to_string(),
            value: String::new(),
        }
    }

    pub fn date_input(label: &str) -> Self {
        Self::DateInput {
            label: label.to_string(),
            value: String::new(),
        }
    }

    pub fn number_input(label: &str) -> Self {
        Self::NumberInput {
            label: label.to_string(),
            value: String::new(),
        }
    }

    pub fn group(label: &str, fields: &[&str]) -> Self {
        Self::Group {
            label: label.to_string(),
            fields: fields
                .iter()
                .map(|field| GroupField {
                    label: field.to_string(),
                    value: String::new(),
                })
                .collect(),
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Header { .. } => "header",
            Self::Checkbox { .. } => "checkbox",
            Self::TextInput { .. } => "text-input",
            Self::DateInput { .. } => "date-input",
            Self::NumberInput { .. } => "number-input",
            Self::Group { .. } => "group",
            Self::Spacer => "spacer",
        }
    }

    /// Stage a header opens. `None` for non-header entries and unrecognized header text.
    pub fn section_stage(&self) -> Option<TurnoverStage> {
        match self {
            Self::Header { stage: Some(stage), .. } => Some(*stage),
            Self::Header { text, stage: None } => TurnoverStage::from_label(text),
            _ => None,
        }
    }

    /// Whether the entry is satisfied. Headers and spacers never count.
    pub fn is_satisfied(&self) -> bool {
        match self {
            Self::Checkbox { completed, .. } => *completed,
            Self::TextInput { value, .. }
            | Self::DateInput { value, .. }
            | Self::NumberInput { value, .. } => !value.trim().is_empty(),
            Self::Group { fields, .. } => fields.iter().all(|field| !field.value.trim().is_empty()),
            Self::Header { .. } | Self::Spacer => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// One apartment turnover tracked from notice to re-let.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnoverCase {
    pub id: CaseId,
    pub address: String,
    pub unit: String,
    pub outgoing_tenant: String,
    pub termination_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_tenant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rental_start: Option<NaiveDate>,
    pub status: TurnoverStage,
    pub responsible: String,
    pub reletting_option: RelettingOption,
    #[serde(default)]
    pub checklist: Vec<ChecklistEntry>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub last_activity: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// Caller-supplied descriptive fields for a new case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDraft {
    pub address: String,
    pub unit: String,
    pub outgoing_tenant: String,
    pub termination_date: NaiveDate,
    #[serde(default)]
    pub incoming_tenant: Option<String>,
    #[serde(default)]
    pub rental_start: Option<NaiveDate>,
    pub responsible: String,
    pub reletting_option: RelettingOption,
}

/// A fully initialized case that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCase {
    pub draft: CaseDraft,
    pub status: TurnoverStage,
    pub checklist: Vec<ChecklistEntry>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl NewCase {
    pub fn into_case(self, id: CaseId) -> TurnoverCase {
        let CaseDraft {
            address,
            unit,
            outgoing_tenant,
            termination_date,
            incoming_tenant,
            rental_start,
            responsible,
            reletting_option,
        } = self.draft;

        TurnoverCase {
            id,
            address,
            unit,
            outgoing_tenant,
            termination_date,
            incoming_tenant,
            rental_start,
            status: self.status,
            responsible,
            reletting_option,
            checklist: self.checklist,
            comments: Vec::new(),
            last_activity: self.created_at,
            completed_at: None,
            created_at: self.created_at,
            created_by: self.created_by,
        }
    }
}

/// Partial update. Absent fields are left untouched; provenance is never patchable.
///
/// `incoming_tenant` and `rental_start` are doubly optional: `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CasePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing_tenant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<NaiveDate>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "clearable"
    )]
    pub incoming_tenant: Option<Option<String>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "clearable"
    )]
    pub rental_start: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TurnoverStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reletting_option: Option<RelettingOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checklist: Option<Vec<ChecklistEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

impl CasePatch {
    pub fn touched_at(now: DateTime<Utc>) -> Self {
        Self {
            last_activity: Some(now),
            ..Self::default()
        }
    }

    /// Merge present fields into `case` and refresh `last_activity`.
    pub fn apply_to(&self, case: &mut TurnoverCase, fallback_now: DateTime<Utc>) {
        if let Some(address) = &self.address {
            case.address = address.clone();
        }
        if let Some(unit) = &self.unit {
            case.unit = unit.clone();
        }
        if let Some(outgoing_tenant) = &self.outgoing_tenant {
            case.outgoing_tenant = outgoing_tenant.clone();
        }
        if let Some(termination_date) = self.termination_date {
            case.termination_date = termination_date;
        }
        if let Some(incoming_tenant) = &self.incoming_tenant {
            case.incoming_tenant = incoming_tenant.clone();
        }
        if let Some(rental_start) = self.rental_start {
            case.rental_start = rental_start;
        }
        if let Some(status) = self.status {
            case.status = status;
        }
        if let Some(responsible) = &self.responsible {
            case.responsible = responsible.clone();
        }
        if let Some(option) = self.reletting_option {
            case.reletting_option = option;
        }
        if let Some(checklist) = &self.checklist {
            case.checklist = checklist.clone();
        }
        if let Some(comments) = &self.comments {
            case.comments = comments.clone();
        }
        if let Some(completed_at) = self.completed_at {
            case.completed_at = Some(completed_at);
        }
        case.last_activity = self.last_activity.unwrap_or(fallback_now);
    }
}

/// Descriptive edits a client may send. Stage, checklist and comments each have
/// their own operation, so any other key is rejected while deserializing.
///
/// An explicit `null` for `incoming_tenant` or `rental_start` clears the value;
/// leaving the key out keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaseFieldsPatch {
    pub address: Option<String>,
    pub unit: Option<String>,
    pub outgoing_tenant: Option<String>,
    pub termination_date: Option<NaiveDate>,
    #[serde(deserialize_with = "clearable")]
    pub incoming_tenant: Option<Option<String>>,
    #[serde(deserialize_with = "clearable")]
    pub rental_start: Option<Option<NaiveDate>>,
    pub responsible: Option<String>,
    pub reletting_option: Option<RelettingOption>,
}

impl CaseFieldsPatch {
    pub fn into_patch(self, now: DateTime<Utc>) -> CasePatch {
        CasePatch {
            address: self.address,
            unit: self.unit,
            outgoing_tenant: self.outgoing_tenant,
            termination_date: self.termination_date,
            incoming_tenant: self.incoming_tenant,
            rental_start: self.rental_start,
            responsible: self.responsible,
            reletting_option: self.reletting_option,
            ..CasePatch::touched_at(now)
        }
    }
}

/// A present key, `null` included, becomes `Some`; only a missing key stays `None`.
fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Initials shown next to a checked item, e.g. "Anna Maria Berg" -> "AMB".
pub fn initials_for(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}
