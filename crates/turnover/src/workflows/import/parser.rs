use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One data row of a case list export, cells trimmed and blanks dropped.
#[derive(Debug, Deserialize)]
pub(crate) struct CaseRow {
    #[serde(rename = "Address", default, deserialize_with = "empty_string_as_none")]
    pub(crate) address: Option<String>,
    #[serde(rename = "Unit", default, deserialize_with = "empty_string_as_none")]
    pub(crate) unit: Option<String>,
    #[serde(
        rename = "Outgoing Tenant",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) outgoing_tenant: Option<String>,
    #[serde(
        rename = "Termination Date",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) termination_date: Option<String>,
    #[serde(
        rename = "Incoming Tenant",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) incoming_tenant: Option<String>,
    #[serde(
        rename = "Rental Start",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) rental_start: Option<String>,
    #[serde(
        rename = "Responsible",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) responsible: Option<String>,
    #[serde(
        rename = "Reletting Option",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) reletting_option: Option<String>,
}

#[derive(Debug)]
pub(crate) struct LocatedRow {
    /// 1-based line in the source file.
    pub(crate) line: u64,
    pub(crate) row: CaseRow,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<LocatedRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let row: CaseRow = record.deserialize(Some(&headers))?;
        rows.push(LocatedRow { line, row });
    }

    Ok(rows)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, keeping the date part.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}
