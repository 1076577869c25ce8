// Ledger Store - ordered, invariant-preserving expense records
//
// Records are addressed only by position. The only invariant enforced here
// is that every stored amount is finite; date and category are kept verbatim.

use crate::error::{LedgerError, Result};
use crate::persistence::RawRecord;
use chrono::NaiveDate;
use serde::Serialize;

// ============================================================================
// RECORD
// ============================================================================

/// ExpenseRecord - one dated, categorized transaction
///
/// Fields are private so an amount can only enter through a finite check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRecord {
    date: String,
    category: String,
    amount: f64,
}

impl ExpenseRecord {
    /// Build a record from an amount that is already known to be valid.
    /// Returns None for NaN/infinite amounts.
    pub fn new(date: &str, category: &str, amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        Some(ExpenseRecord {
            date: date.to_string(),
            category: category.to_string(),
            amount,
        })
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Date as a calendar date, if it is a real `YYYY-MM-DD` day.
    ///
    /// The ledger never rejects a record for its date; shells use this to
    /// flag suspicious input.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }
}

/// Parse amount text into a finite number.
///
/// Surrounding whitespace is ignored. Empty text, non-numeric text,
/// `NaN` and infinities all yield None.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

// ============================================================================
// LEDGER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    records: Vec<ExpenseRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole ledger with the given raw rows.
    ///
    /// All rows are validated before anything is replaced: the first row with
    /// a bad amount fails the load and the current records stay as they were.
    pub fn load(&mut self, rows: Vec<RawRecord>) -> Result<()> {
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            let amount = parse_amount(&row.amount).ok_or_else(|| LedgerError::InvalidAmount {
                line: Some(row.line),
                value: row.amount.clone(),
            })?;

            records.push(ExpenseRecord {
                date: row.date,
                category: row.category,
                amount,
            });
        }

        self.records = records;
        Ok(())
    }

    /// Append a new expense, returning its position.
    ///
    /// Category is not checked for emptiness; an empty label is stored as-is.
    pub fn add(&mut self, date: &str, category: &str, amount_text: &str) -> Result<usize> {
        let amount =
            parse_amount(amount_text).ok_or_else(|| LedgerError::invalid_amount(amount_text))?;

        self.records.push(ExpenseRecord {
            date: date.to_string(),
            category: category.to_string(),
            amount,
        });

        Ok(self.records.len() - 1)
    }

    /// Delete the record at `position`; later records shift down by one.
    pub fn remove(&mut self, position: usize) -> Result<ExpenseRecord> {
        if position >= self.records.len() {
            return Err(LedgerError::PositionOutOfRange {
                position,
                len: self.records.len(),
            });
        }
        Ok(self.records.remove(position))
    }

    /// Wholesale replace with prebuilt records.
    ///
    /// Every amount is checked again; on a non-finite one nothing is replaced.
    pub fn replace_all(&mut self, records: Vec<ExpenseRecord>) -> Result<()> {
        if let Some(bad) = records.iter().find(|record| !record.amount.is_finite()) {
            return Err(LedgerError::invalid_amount(&bad.amount.to_string()));
        }
        self.records = records;
        Ok(())
    }

    pub fn all(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn get(&self, position: usize) -> Option<&ExpenseRecord> {
        self.records.get(position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Amounts of every record whose category matches exactly, in ledger order
    pub fn amounts_for(&self, category: &str) -> Vec<f64> {
        self.records
            .iter()
            .filter(|record| record.category == category)
            .map(|record| record.amount)
            .collect()
    }
}
