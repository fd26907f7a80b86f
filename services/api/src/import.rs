use clap::Args;
use std::path::PathBuf;
use turnover::error::AppError;
use turnover::workflows::import::CaseCsvImporter;
use turnover::workflows::turnover::CaseDraft;

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// CSV case list with the legacy export headers
    pub(crate) path: PathBuf,
    /// Print the parsed drafts as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let drafts = CaseCsvImporter::from_path(&args.path)?;

    if args.json {
        let payload = serde_json::to_string_pretty(&drafts).map_err(std::io::Error::from)?;
        println!("{payload}");
        return Ok(());
    }

    println!("{} cases in {}", drafts.len(), args.path.display());
    for draft in &drafts {
        println!("- {}", preview_line(draft));
    }
    Ok(())
}

fn preview_line(draft: &CaseDraft) -> String {
    let mut line = format!(
        "{} | {}, {} | {} moving out | {} | {}",
        draft.termination_date,
        draft.address,
        draft.unit,
        draft.outgoing_tenant,
        draft.responsible,
        draft.reletting_option.label()
    );
    if let Some(incoming) = &draft.incoming_tenant {
        line.push_str(&format!(" | successor {incoming}"));
    }
    if let Some(start) = draft.rental_start {
        line.push_str(&format!(" from {start}"));
    }
    line
}
