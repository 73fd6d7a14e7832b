use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::repository::create_patient;
use crate::db::DatabaseError;
use crate::models::{NewPatient, Sex};

use super::csv::{parse_csv, CsvRecord};
use super::ImportError;

const REQUIRED_COLUMNS: &[&str] = &["first_name", "last_name", "date_of_birth", "sex"];

/// Outcome of one batch import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<RowIssue>,
}

/// One skipped row and why.
#[derive(Debug, Clone, Serialize)]
pub struct RowIssue {
    pub line: usize,
    pub reason: String,
}

/// Column positions resolved from the header row.
struct ColumnMap {
    indices: Vec<(String, usize)>,
}

impl ColumnMap {
    fn from_header(header: &CsvRecord) -> Result<Self, ImportError> {
        let indices: Vec<(String, usize)> = header
            .fields
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| !indices.iter().any(|(name, _)| name == *required))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::MissingColumns(missing.join(", ")));
        }

        Ok(Self { indices })
    }

    fn get<'a>(&self, record: &'a CsvRecord, column: &str) -> Option<&'a str> {
        self.indices
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, i)| record.fields.get(*i))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// Validate one data row into a `NewPatient`, or explain why it can't be.
fn parse_row(columns: &ColumnMap, record: &CsvRecord) -> Result<NewPatient, String> {
    let expected = columns.indices.len();
    if record.fields.len() != expected {
        return Err(format!(
            "expected {expected} field(s), found {}",
            record.fields.len()
        ));
    }

    let first_name = columns
        .get(record, "first_name")
        .ok_or("missing first_name")?;
    let last_name = columns.get(record, "last_name").ok_or("missing last_name")?;

    let dob_raw = columns
        .get(record, "date_of_birth")
        .ok_or("missing date_of_birth")?;
    let date_of_birth = NaiveDate::parse_from_str(dob_raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid date_of_birth: {dob_raw}"))?;

    let sex_raw = columns.get(record, "sex").ok_or("missing sex")?;
    let sex: Sex = sex_raw
        .to_lowercase()
        .parse()
        .map_err(|_| format!("invalid sex: {sex_raw}"))?;

    let years_exposure = match columns.get(record, "years_exposure") {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| format!("invalid years_exposure: {raw}"))?,
        None => 0,
    };

    let email = columns.get(record, "email");
    if let Some(email) = email {
        if !crate::models::valid_email(email) {
            return Err(format!("invalid email: {email}"));
        }
    }

    let smoker = match columns.get(record, "smoker") {
        Some(raw) => match raw.to_lowercase().as_str() {
            "true" | "yes" | "1" => true,
            "false" | "no" | "0" => false,
            other => return Err(format!("invalid smoker flag: {other}")),
        },
        None => false,
    };

    Ok(NewPatient {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        date_of_birth,
        sex,
        phone: columns.get(record, "phone").map(String::from),
        email: email.map(String::from),
        address: columns.get(record, "address").map(String::from),
        city: columns.get(record, "city").map(String::from),
        blood_type: columns.get(record, "blood_type").map(String::from),
        years_exposure,
        smoker,
    })
}

/// Import a CSV roster. Valid rows are inserted; malformed rows are
/// skipped with a per-line reason. A missing or incomplete header aborts
/// before any insert.
pub fn import_patients(conn: &Connection, input: &str) -> Result<ImportSummary, ImportError> {
    let records = parse_csv(input);
    let Some((header, rows)) = records.split_first() else {
        return Err(ImportError::EmptyInput);
    };
    let columns = ColumnMap::from_header(header)?;

    let mut summary = ImportSummary {
        imported: 0,
        skipped: 0,
        errors: Vec::new(),
    };

    for record in rows {
        match parse_row(&columns, record) {
            Ok(new_patient) => match create_patient(conn, &new_patient) {
                Ok(_) => summary.imported += 1,
                Err(DatabaseError::ConstraintViolation(reason)) => {
                    summary.skipped += 1;
                    summary.errors.push(RowIssue {
                        line: record.line,
                        reason,
                    });
                }
                Err(other) => return Err(other.into()),
            },
            Err(reason) => {
                summary.skipped += 1;
                summary.errors.push(RowIssue {
                    line: record.line,
                    reason,
                });
            }
        }
    }

    tracing::info!(
        imported = summary.imported,
        skipped = summary.skipped,
        "Patient CSV import complete"
    );
    Ok(summary)
}
