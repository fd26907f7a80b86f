use super::domain::{ChecklistEntry, TurnoverStage};

/// Checklist every new case starts from. The terminal stage carries no section:
/// entering it is gated by the handover section like any other forward move.
#[derive(Debug, Clone)]
pub struct ChecklistBlueprint {
    entries: Vec<ChecklistEntry>,
}

impl ChecklistBlueprint {
    pub fn standard() -> Self {
        Self {
            entries: standard_checklist(),
        }
    }

    pub fn from_entries(entries: Vec<ChecklistEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ChecklistEntry] {
        &self.entries
    }

    pub fn fresh_checklist(&self) -> Vec<ChecklistEntry> {
        self.entries.clone()
    }

    pub fn entries_for_stage(&self, stage: TurnoverStage) -> Vec<&ChecklistEntry> {
        let mut current = None;
        self.entries
            .iter()
            .filter(|entry| {
                if let ChecklistEntry::Header { .. } = entry {
                    current = entry.section_stage();
                    return false;
                }
                current == Some(stage) && !matches!(entry, ChecklistEntry::Spacer)
            })
            .collect()
    }
}

impl Default for ChecklistBlueprint {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_checklist() -> Vec<ChecklistEntry> {
    vec![
        ChecklistEntry::header(TurnoverStage::NoticeReceived),
        ChecklistEntry::checkbox("Termination confirmed to tenant in writing"),
        ChecklistEntry::checkbox("Notice period and end of tenancy verified"),
        ChecklistEntry::text_input("Forwarding address of outgoing tenant"),
        ChecklistEntry::date_input("Pre-inspection appointment"),
        ChecklistEntry::Spacer,
        ChecklistEntry::header(TurnoverStage::PreInspection),
        ChecklistEntry::checkbox("Pre-inspection carried out with tenant"),
        ChecklistEntry::checkbox("Cosmetic repair obligations recorded"),
        ChecklistEntry::text_input("Defects noted"),
        ChecklistEntry::number_input("Estimated renovation cost (EUR)"),
        ChecklistEntry::Spacer,
        ChecklistEntry::header(TurnoverStage::Reletting),
        ChecklistEntry::checkbox("Listing published"),
        ChecklistEntry::checkbox("Viewings held"),
        ChecklistEntry::text_input("Selected applicant"),
        ChecklistEntry::checkbox("Lease signed"),
        ChecklistEntry::Spacer,
        ChecklistEntry::header(TurnoverStage::Handover),
        ChecklistEntry::checkbox("Final inspection report signed"),
        ChecklistEntry::group(
            "Meter readings",
            &["Electricity", "Cold water", "Hot water", "Heating"],
        ),
        ChecklistEntry::group("Keys handed over", &["Front door", "Apartment", "Mailbox"]),
        ChecklistEntry::checkbox("Deposit settlement initiated"),
    ]
}
