// Expense Book - the API the shells (TUI, CLI, HTTP) call into
//
// One ExpenseBook owns one Ledger. There is no global state: whoever creates
// the book holds it and passes it by reference.

use crate::categories;
use crate::error::Result;
use crate::ledger::{ExpenseRecord, Ledger};
use crate::persistence;
use crate::summary::{self, DistributionSummary};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default)]
pub struct ExpenseBook {
    ledger: Ledger,
}

impl ExpenseBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the ledger with the contents of CSV text.
    /// On any error the current ledger is kept as-is.
    pub fn load_from_text(&mut self, text: &str) -> Result<()> {
        let rows = persistence::parse(text)?;
        self.ledger.load(rows)
    }

    pub fn export_to_text(&self) -> Result<String> {
        persistence::serialize(self.ledger.all())
    }

    pub fn add_expense(&mut self, date: &str, category: &str, amount_text: &str) -> Result<usize> {
        self.ledger.add(date, category, amount_text)
    }

    pub fn delete_expense(&mut self, position: usize) -> Result<ExpenseRecord> {
        self.ledger.remove(position)
    }

    pub fn list_categories(&self) -> Vec<String> {
        categories::categories(&self.ledger)
    }

    pub fn default_category(&self) -> Option<String> {
        categories::default_selection(&self.list_categories())
    }

    /// Box plot statistics for one category (exact, case-sensitive match)
    pub fn summarize(&self, category: &str) -> Result<DistributionSummary> {
        summary::summarize(category, &self.ledger.amounts_for(category))
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        self.ledger.all()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

// ============================================================================
// SHARED BOOK
// ============================================================================

/// Thread-safe handle for shells that serve concurrent callers.
///
/// Writers (`load_from_text`, `add_expense`, `delete_expense`) hold the write
/// lock for the whole call, so readers only ever see committed states.
#[derive(Debug, Clone, Default)]
pub struct SharedBook {
    inner: Arc<RwLock<ExpenseBook>>,
}

impl SharedBook {
    pub fn new(book: ExpenseBook) -> Self {
        SharedBook {
            inner: Arc::new(RwLock::new(book)),
        }
    }

    // A panic while locked can only happen between complete calls, so the
    // book behind a poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, ExpenseBook> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ExpenseBook> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn load_from_text(&self, text: &str) -> Result<()> {
        self.write().load_from_text(text)
    }

    pub fn export_to_text(&self) -> Result<String> {
        self.read().export_to_text()
    }

    pub fn add_expense(&self, date: &str, category: &str, amount_text: &str) -> Result<usize> {
        self.write().add_expense(date, category, amount_text)
    }

    pub fn delete_expense(&self, position: usize) -> Result<ExpenseRecord> {
        self.write().delete_expense(position)
    }

    pub fn list_categories(&self) -> Vec<String> {
        self.read().list_categories()
    }

    pub fn summarize(&self, category: &str) -> Result<DistributionSummary> {
        self.read().summarize(category)
    }

    /// Owned copy of the current records
    pub fn snapshot(&self) -> Vec<ExpenseRecord> {
        self.read().records().to_vec()
    }

    pub fn len(&self) -> usize {
        self.read().ledger().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().ledger().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use std::thread;

    const FOOD_CSV: &str = "Date,Category,Amount\n\
        2024-01-01,Food,10\n\
        2024-01-05,Food,20\n\
        2024-01-10,Food,30\n";

    #[test]
    fn test_load_then_summarize() {
        let mut book = ExpenseBook::new();
        book.load_from_text(FOOD_CSV).unwrap();

        assert_eq!(book.list_categories(), vec!["Food"]);
        assert_eq!(book.default_category(), Some("Food".to_string()));

        let summary = book.summarize("Food").unwrap();
        assert_eq!(summary.median, 20.0);
        assert_eq!(summary.q1, 15.0);
        assert_eq!(summary.q3, 25.0);
        assert!(summary.outliers.is_empty());
    }

    #[test]
    fn test_add_invalid_amount_keeps_length() {
        let mut book = ExpenseBook::new();
        book.load_from_text(FOOD_CSV).unwrap();

        let err = book.add_expense("2024-02-01", "Rent", "abc").unwrap_err();

        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
        assert_eq!(book.records().len(), 3);
    }

    #[test]
    fn test_load_missing_date_column() {
        let mut book = ExpenseBook::new();
        let err = book.load_from_text("Category,Amount\nFood,10\n").unwrap_err();
        assert!(matches!(err, LedgerError::MalformedInput(_)));
    }

    #[test]
    fn test_failed_load_keeps_previous_ledger() {
        let mut book = ExpenseBook::new();
        book.load_from_text(FOOD_CSV).unwrap();

        assert!(book
            .load_from_text("Date,Category,Amount\n2024-01-01,Rent,lots\n")
            .is_err());
        assert!(book.load_from_text("Amount\n5\n").is_err());

        assert_eq!(book.records().len(), 3);
        assert_eq!(book.list_categories(), vec!["Food"]);
    }

    #[test]
    fn test_summarize_unknown_category() {
        let mut book = ExpenseBook::new();
        assert_eq!(
            book.summarize("Food").unwrap_err(),
            LedgerError::EmptyCategory("Food".to_string())
        );

        book.load_from_text(FOOD_CSV).unwrap();
        assert!(matches!(
            book.summarize("food"),
            Err(LedgerError::EmptyCategory(_))
        ));
    }

    #[test]
    fn test_single_fuel_record() {
        let mut book = ExpenseBook::new();
        book.add_expense("2024-03-01", "Fuel", "42.5").unwrap();

        let s = book.summarize("Fuel").unwrap();
        assert_eq!((s.min, s.q1, s.median, s.q3, s.max), (42.5, 42.5, 42.5, 42.5, 42.5));
        assert!(s.outliers.is_empty());
    }

    #[test]
    fn test_export_round_trip() {
        let mut book = ExpenseBook::new();
        book.add_expense("2024-01-01", "Food", "10.1").unwrap();
        book.add_expense("2024-01-02", "Rent", "-0.3").unwrap();

        let text = book.export_to_text().unwrap();
        let mut reloaded = ExpenseBook::new();
        reloaded.load_from_text(&text).unwrap();

        assert_eq!(reloaded.records(), book.records());
    }

    #[test]
    fn test_delete_refreshes_categories() {
        let mut book = ExpenseBook::new();
        book.add_expense("2024-01-01", "Food", "1").unwrap();
        book.add_expense("2024-01-02", "Rent", "2").unwrap();

        book.delete_expense(0).unwrap();

        assert_eq!(book.list_categories(), vec!["Rent"]);
        assert_eq!(book.default_category(), Some("Rent".to_string()));
    }

    #[test]
    fn test_shared_book_concurrent_adds() {
        let shared = SharedBook::default();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let book = shared.clone();
                thread::spawn(move || {
                    for j in 0..25 {
                        book.add_expense("2024-01-01", &format!("C{}", i), &j.to_string())
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.len(), 200);
        assert_eq!(shared.list_categories().len(), 8);
        assert_eq!(shared.summarize("C3").unwrap().count, 25);
    }

    #[test]
    fn test_shared_book_load_and_snapshot() {
        let shared = SharedBook::new(ExpenseBook::new());
        assert!(shared.is_empty());

        shared.load_from_text(FOOD_CSV).unwrap();
        let snapshot = shared.snapshot();
        shared.delete_expense(0).unwrap();

        assert_eq!(snapshot.len(), 3);
        assert_eq!(shared.len(), 2);
        assert!(shared.export_to_text().unwrap().starts_with("Date,Category,Amount\n"));
    }
}
