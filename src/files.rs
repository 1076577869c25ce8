// CSV file I/O for the shells
//
// The core converts text; these helpers move that text to and from disk.

use crate::book::ExpenseBook;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Load a book from a CSV file.
pub fn load_csv(csv_path: &Path) -> Result<ExpenseBook> {
    let text = fs::read_to_string(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;

    let mut book = ExpenseBook::new();
    book.load_from_text(&text)
        .with_context(|| format!("Failed to load expenses from {}", csv_path.display()))?;

    Ok(book)
}

/// Load a book from a CSV file, or start an empty one if the file is absent.
pub fn load_csv_or_empty(csv_path: &Path) -> Result<ExpenseBook> {
    if csv_path.exists() {
        load_csv(csv_path)
    } else {
        Ok(ExpenseBook::new())
    }
}

/// Replace the book's contents with a CSV file. The book is unchanged on error.
pub fn reload_csv(book: &mut ExpenseBook, csv_path: &Path) -> Result<()> {
    let text = fs::read_to_string(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;

    book.load_from_text(&text)
        .with_context(|| format!("Failed to load expenses from {}", csv_path.display()))
}

/// Write the book to a CSV file.
pub fn save_csv(book: &ExpenseBook, csv_path: &Path) -> Result<()> {
    let text = book.export_to_text()?;
    save_text(&text, csv_path)
}

/// Write already-serialized CSV text (temp file + rename, so a failed write
/// never leaves a half-written ledger behind).
///
/// Each call gets its own uniquely named temp file next to the target, so
/// concurrent saves of the same path never trip over each other.
pub fn save_text(text: &str, csv_path: &Path) -> Result<()> {
    let parent = match csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            parent
        }
        None => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    tmp.write_all(text.as_bytes())
        .with_context(|| format!("Failed to write {}", tmp.path().display()))?;
    tmp.persist(csv_path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to save CSV file {}", csv_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("expenses.csv");

        let mut book = ExpenseBook::new();
        book.add_expense("2024-01-01", "Food", "12.5").unwrap();
        book.add_expense("2024-01-02", "Rent", "900").unwrap();
        save_csv(&book, &path).unwrap();

        let loaded = load_csv(&path).unwrap();
        assert_eq!(loaded.records(), book.records());

        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1, "only the saved file should remain");
    }

    #[test]
    fn test_concurrent_saves_to_same_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("expenses.csv");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let mut book = ExpenseBook::new();
                    book.add_expense("2024-01-01", "Food", &i.to_string()).unwrap();
                    save_csv(&book, &path)
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let loaded = load_csv(&path).unwrap();
        assert_eq!(loaded.records().len(), 1);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.csv");

        assert!(load_csv(&path).is_err());
        assert!(load_csv_or_empty(&path).unwrap().records().is_empty());
    }

    #[test]
    fn test_reload_keeps_book_on_bad_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "Category,Amount\nFood,1\n").unwrap();

        let mut book = ExpenseBook::new();
        book.add_expense("2024-01-01", "Food", "1").unwrap();

        let err = reload_csv(&mut book, &path).unwrap_err();
        assert!(format!("{:#}", err).contains("malformed input"));
        assert_eq!(book.records().len(), 1);
    }
}
