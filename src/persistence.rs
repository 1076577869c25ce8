// 🗂️ Persistence Adapter - ledger <-> CSV text
//
// Pure text conversion. Reading and writing files is the caller's job;
// this module only sees text that was already read or is about to be written.

use crate::error::{LedgerError, Result};
use crate::ledger::ExpenseRecord;
use serde::{Deserialize, Serialize};

pub const DATE_COLUMN: &str = "Date";
pub const CATEGORY_COLUMN: &str = "Category";
pub const AMOUNT_COLUMN: &str = "Amount";

/// Header written by `serialize`, in this order
pub const HEADER: [&str; 3] = [DATE_COLUMN, CATEGORY_COLUMN, AMOUNT_COLUMN];

// ============================================================================
// RAW RECORD
// ============================================================================

/// RawRecord - one unvalidated data row, fields already mapped by header name.
/// The amount is still text; `Ledger::load` decides whether it is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// 1-based line in the source text (the header is line 1)
    pub line: usize,
    pub date: String,
    pub category: String,
    pub amount: String,
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    category: usize,
    amount: usize,
}

impl ColumnMap {
    fn from_header(header: &csv::StringRecord) -> Result<Self> {
        if header.is_empty() || header.iter().all(|name| name.is_empty()) {
            return Err(LedgerError::MalformedInput("missing header row".to_string()));
        }

        let find = |name: &str| header.iter().position(|column| column == name);

        let missing: Vec<&str> = HEADER
            .iter()
            .copied()
            .filter(|name| find(name).is_none())
            .collect();

        match (find(DATE_COLUMN), find(CATEGORY_COLUMN), find(AMOUNT_COLUMN)) {
            (Some(date), Some(category), Some(amount)) => Ok(ColumnMap {
                date,
                category,
                amount,
            }),
            _ => Err(LedgerError::MalformedInput(format!(
                "header is missing required column(s): {}",
                missing.join(", ")
            ))),
        }
    }

    fn width(&self) -> usize {
        self.date.max(self.category).max(self.amount) + 1
    }
}

// ============================================================================
// PARSE / SERIALIZE
// ============================================================================

/// Split CSV text into raw rows.
///
/// The first row is the header; `Date`, `Category` and `Amount` must all be
/// present (exact, case-sensitive) but may come in any order. Extra columns
/// are ignored.
pub fn parse(text: &str) -> Result<Vec<RawRecord>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header = rdr
        .headers()
        .map_err(|e| LedgerError::MalformedInput(format!("unreadable header: {}", e)))?
        .clone();
    let columns = ColumnMap::from_header(&header)?;

    let mut rows = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| LedgerError::MalformedInput(e.to_string()))?;
        let line = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(index + 2);

        if record.len() < columns.width() {
            return Err(LedgerError::MalformedInput(format!(
                "line {} has {} field(s), expected at least {}",
                line,
                record.len(),
                columns.width()
            )));
        }

        rows.push(RawRecord {
            line,
            date: record[columns.date].to_string(),
            category: record[columns.category].to_string(),
            amount: record[columns.amount].to_string(),
        });
    }

    Ok(rows)
}

/// Render records as CSV text: header row, then one row per record.
///
/// Amounts use the shortest decimal form that parses back to the same f64.
pub fn serialize(records: &[ExpenseRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record(HEADER)
        .map_err(|e| LedgerError::Csv(e.to_string()))?;

    for record in records {
        wtr.write_record([
            record.date(),
            record.category(),
            format_amount(record.amount()).as_str(),
        ])
        .map_err(|e| LedgerError::Csv(e.to_string()))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| LedgerError::Csv(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| LedgerError::Csv(e.to_string()))
}

/// Plain decimal text for an amount (no exponent, no grouping, `.` point)
pub fn format_amount(amount: f64) -> String {
    amount.to_string()
}
