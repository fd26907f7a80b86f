use crate::infra::start_of_day;
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use turnover::config::WorkflowConfig;
use turnover::error::AppError;
use turnover::workflows::import::CaseCsvImporter;
use turnover::workflows::turnover::{
    board_columns, partition_archived, section_progress, suggest_next_stage, CaseDraft, CaseId,
    CasePatch, CaseRepository, CaseSession, ChecklistEntry, ChecklistUpdate,
    InMemoryCaseRepository, RelettingOption, ServiceError, TurnoverCase, TurnoverService,
    TurnoverStage, ARCHIVE_AFTER_DAYS,
};

const DEMO_ACTOR: &str = "Demo Bot";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Load the demo cases from a CSV case list instead of the built-in set
    #[arg(long)]
    pub(crate) cases_csv: Option<PathBuf>,
    /// Advance a case as soon as its current checklist section is done
    #[arg(long)]
    pub(crate) auto_advance: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        cases_csv,
        auto_advance,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let now = start_of_day(today);
    let drafts = match cases_csv {
        Some(path) => CaseCsvImporter::from_path(path)?,
        None => sample_drafts(today),
    };

    let repository = Arc::new(InMemoryCaseRepository::default());
    let service = TurnoverService::new(repository.clone(), WorkflowConfig { auto_advance });
    let mut session = CaseSession::open(repository).map_err(ServiceError::from)?;
    session.attach();

    println!("Turnover board demo ({today})");
    let mut created = Vec::with_capacity(drafts.len());
    for draft in drafts {
        created.push(service.create(draft, DEMO_ACTOR, now)?);
    }
    println!("- {} cases opened in {}", created.len(), TurnoverStage::first());

    if let Some(case) = created.first() {
        walk_to_completion(&service, &case.id, now)?;
        service.add_comment(&case.id, DEMO_ACTOR, "Deposit settlement handed to accounting", now)?;
        println!("- {} walked through every stage", case.address);
    }

    if let Some(case) = created.get(1) {
        match service.change_stage(&case.id, TurnoverStage::Handover, now) {
            Err(error @ ServiceError::TransitionRefused { .. }) => {
                println!("- gate held for {}: {error}", case.address)
            }
            Err(other) => return Err(other.into()),
            Ok(change) => println!("- {} jumped to {}", case.address, change.to),
        }
    }

    if let Some(case) = created.get(2) {
        let record = session
            .commit(
                &case.id,
                CasePatch {
                    responsible: Some("Team West".to_string()),
                    ..CasePatch::touched_at(now)
                },
                now,
            )
            .map_err(ServiceError::from)?;
        println!("- {} reassigned to {}", record.address, record.responsible);
    }

    let cases = session.cases();
    println!("\nBoard");
    render_board(&cases);

    let later = now + Duration::days(ARCHIVE_AFTER_DAYS + 1);
    let (active, archived) = partition_archived(cases, later);
    println!(
        "\nBy {}: {} active, {} archived",
        later.date_naive(),
        active.len(),
        archived.len()
    );
    for case in archived {
        println!("  - {} ({})", case.address, case.unit);
    }

    Ok(())
}

fn sample_drafts(today: NaiveDate) -> Vec<CaseDraft> {
    let draft = |address: &str, unit: &str, tenant: &str, days: i64, responsible: &str| {
        CaseDraft {
            address: address.to_string(),
            unit: unit.to_string(),
            outgoing_tenant: tenant.to_string(),
            termination_date: today + Duration::days(days),
            incoming_tenant: None,
            rental_start: None,
            responsible: responsible.to_string(),
            reletting_option: RelettingOption::Relet,
        }
    };

    vec![
        draft("Musterstraße 12", "3. OG links", "Jonas Keller", 14, "Team Nord"),
        draft("Bahnhofstraße 1", "EG", "Petra Lang", 45, "Team Süd"),
        draft("Lindenallee 7", "1. OG", "Karl Weiß", 30, "Team Nord"),
        CaseDraft {
            incoming_tenant: Some("Ida Brandt".to_string()),
            rental_start: Some(today + Duration::days(61)),
            reletting_option: RelettingOption::SuccessorKnown,
            ..draft("Am Markt 3", "DG", "Familie Özdemir", 60, "Team West")
        },
    ]
}

fn walk_to_completion<R>(
    service: &TurnoverService<R>,
    id: &CaseId,
    now: DateTime<Utc>,
) -> Result<(), AppError>
where
    R: CaseRepository + 'static,
{
    loop {
        let case = service.get(id)?;
        if case.status.is_terminal() {
            return Ok(());
        }

        let stage = case.status;
        for index in open_entries(&case) {
            for update in updates_for(&case.checklist[index], now.date_naive()) {
                service.update_checklist_entry(id, index, update, DEMO_ACTOR, now)?;
            }
        }

        let case = service.get(id)?;
        if case.status != stage {
            continue;
        }
        let next = suggest_next_stage(&case).ok_or(ServiceError::TransitionRefused {
            current: stage,
            target: stage.next().unwrap_or(stage),
            incomplete_stage: stage,
        })?;
        service.change_stage(id, next, now)?;
    }
}

/// Positions of unsatisfied entries in the case's current section.
fn open_entries(case: &TurnoverCase) -> Vec<usize> {
    let mut current = None;
    case.checklist
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            if let ChecklistEntry::Header { .. } = entry {
                current = entry.section_stage();
                return None;
            }
            let open = current == Some(case.status)
                && !matches!(entry, ChecklistEntry::Spacer)
                && !entry.is_satisfied();
            open.then_some(index)
        })
        .collect()
}

fn updates_for(entry: &ChecklistEntry, today: NaiveDate) -> Vec<ChecklistUpdate> {
    let value = |value: String| vec![ChecklistUpdate::SetValue { value }];
    match entry {
        ChecklistEntry::Checkbox { .. } => vec![ChecklistUpdate::Check],
        ChecklistEntry::TextInput { .. } => value("recorded during demo".to_string()),
        ChecklistEntry::DateInput { .. } => value(today.to_string()),
        ChecklistEntry::NumberInput { .. } => value("0".to_string()),
        ChecklistEntry::Group { fields, .. } => fields
            .iter()
            .filter(|field| field.value.trim().is_empty())
            .map(|field| ChecklistUpdate::SetGroupField {
                field: field.label.clone(),
                value: "ok".to_string(),
            })
            .collect(),
        ChecklistEntry::Header { .. } | ChecklistEntry::Spacer => Vec::new(),
    }
}

fn render_board(cases: &[TurnoverCase]) {
    for column in board_columns(cases) {
        println!("{} ({})", column.stage_label, column.cases.len());
        for case in &column.cases {
            let progress = section_progress(case, case.status);
            println!(
                "  - {}, {} | moves out {} | {} | checklist {}/{}",
                case.address,
                case.unit,
                case.termination_date,
                case.responsible,
                progress.completed,
                progress.total
            );
        }
    }
}
