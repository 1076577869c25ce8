// Ledger errors - typed failures returned by the core
//
// The core never logs and never aborts; every failure comes back as one of
// these variants and the calling shell decides how to surface it.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Amount text is empty, non-numeric, NaN or infinite
    #[error("invalid amount {:?}{}", .value, line_suffix(.line))]
    InvalidAmount { line: Option<usize>, value: String },

    /// CSV text is missing the header or a required column
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Summary requested for a category with no records
    #[error("no expenses recorded for category {0:?}")]
    EmptyCategory(String),

    #[error("no expense at position {position} (ledger has {len})")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("failed to write CSV: {0}")]
    Csv(String),
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" on line {}", line),
        None => String::new(),
    }
}

impl LedgerError {
    pub fn invalid_amount(value: &str) -> Self {
        LedgerError::InvalidAmount {
            line: None,
            value: value.to_string(),
        }
    }

    /// True for errors caused by bad caller input (as opposed to lookups)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount { .. } | LedgerError::MalformedInput(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
