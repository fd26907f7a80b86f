use super::archive::should_archive;
use super::domain::{TurnoverCase, TurnoverStage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel accepted wherever a responsible filter is parsed from text.
pub const ALL_RESPONSIBLE: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResponsibleFilter {
    #[default]
    All,
    Named(String),
}

impl ResponsibleFilter {
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() || raw == ALL_RESPONSIBLE {
            Self::All
        } else {
            Self::Named(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_RESPONSIBLE,
            Self::Named(name) => name,
        }
    }
}

impl Serialize for ResponsibleFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResponsibleFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Text and responsible predicates, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFilter {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub responsible: ResponsibleFilter,
}

impl CaseFilter {
    pub fn matches(&self, case: &TurnoverCase) -> bool {
        matches_query(case, &self.query) && matches_responsible(case, &self.responsible)
    }
}

/// Case-insensitive substring match over address, tenants, and unit.
pub fn matches_query(case: &TurnoverCase, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let needle = query.to_lowercase();
    let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

    contains(&case.address)
        || contains(&case.outgoing_tenant)
        || contains(&case.unit)
        || case
            .incoming_tenant
            .as_deref()
            .is_some_and(|tenant| contains(tenant))
}

pub fn matches_responsible(case: &TurnoverCase, filter: &ResponsibleFilter) -> bool {
    match filter {
        ResponsibleFilter::All => true,
        ResponsibleFilter::Named(name) => case.responsible == *name,
    }
}

/// Stable ascending sort on the termination date.
pub fn sort_by_termination_date(mut cases: Vec<TurnoverCase>) -> Vec<TurnoverCase> {
    cases.sort_by_key(|case| case.termination_date);
    cases
}

/// Splits a snapshot into `(active, archived)` keeping input order.
pub fn partition_archived(
    cases: Vec<TurnoverCase>,
    now: DateTime<Utc>,
) -> (Vec<TurnoverCase>, Vec<TurnoverCase>) {
    cases
        .into_iter()
        .partition(|case| !should_archive(case, now))
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
    pub stage: TurnoverStage,
    pub stage_label: &'static str,
    pub cases: Vec<TurnoverCase>,
}

/// Groups cases by stage in pipeline order. Every stage gets a column.
pub fn board_columns(cases: &[TurnoverCase]) -> Vec<BoardColumn> {
    TurnoverStage::ordered()
        .into_iter()
        .map(|stage| BoardColumn {
            stage,
            stage_label: stage.label(),
            cases: cases
                .iter()
                .filter(|case| case.status == stage)
                .cloned()
                .collect(),
        })
        .collect()
}
