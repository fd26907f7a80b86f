//! Bulk loading of legacy case lists exported as CSV.
//!
//! Rows become [`CaseDraft`]s; creating the cases is left to the caller so an
//! import can be previewed before anything is persisted.

mod normalizer;
mod parser;

use crate::workflows::turnover::CaseDraft;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use parser::LocatedRow;

#[derive(Debug, Error)]
pub enum CaseImportError {
    #[error("failed to read case list: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid case list CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: '{column}' is required")]
    MissingField { row: u64, column: &'static str },
    #[error("row {row}: '{value}' in '{column}' is not a date (expected YYYY-MM-DD)")]
    InvalidDate {
        row: u64,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: unknown reletting option '{value}'")]
    UnknownOption { row: u64, value: String },
}

pub struct CaseCsvImporter;

impl CaseCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CaseDraft>, CaseImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<CaseDraft>, CaseImportError> {
        parser::parse_rows(reader)?
            .into_iter()
            .map(draft_from_row)
            .collect()
    }
}

fn draft_from_row(located: LocatedRow) -> Result<CaseDraft, CaseImportError> {
    let LocatedRow { line, row } = located;
    let required = |value: Option<String>, column: &'static str| {
        value.ok_or(CaseImportError::MissingField { row: line, column })
    };
    let date = |value: String, column: &'static str| {
        parser::parse_date(&value).ok_or(CaseImportError::InvalidDate {
            row: line,
            column,
            value,
        })
    };

    let option_raw = required(row.reletting_option, "Reletting Option")?;
    let reletting_option =
        normalizer::reletting_option(&option_raw).ok_or(CaseImportError::UnknownOption {
            row: line,
            value: option_raw,
        })?;

    Ok(CaseDraft {
        address: required(row.address, "Address")?,
        unit: row.unit.unwrap_or_default(),
        outgoing_tenant: required(row.outgoing_tenant, "Outgoing Tenant")?,
        termination_date: date(
            required(row.termination_date, "Termination Date")?,
            "Termination Date",
        )?,
        incoming_tenant: row.incoming_tenant,
        rental_start: row
            .rental_start
            .map(|value| date(value, "Rental Start"))
            .transpose()?,
        responsible: required(row.responsible, "Responsible")?,
        reletting_option,
    })
}
