// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Result};
use std::env;
use std::path::{Path, PathBuf};

use expense_analyzer::{files, logging, AppConfig};

const USAGE: &str = "\
Usage:
  expense-analyzer [ui [FILE]]                    Interactive terminal UI
  expense-analyzer list FILE                      Print all expenses
  expense-analyzer categories FILE                Print distinct categories
  expense-analyzer summary FILE CATEGORY          Box plot statistics for a category
  expense-analyzer add FILE DATE CATEGORY AMOUNT  Append an expense and save";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = AppConfig::load()?;

    match args.get(1).map(String::as_str) {
        None | Some("ui") => {
            let file = args.get(2).map(PathBuf::from).unwrap_or_else(|| config.data_file.clone());
            run_ui_mode(&config, &file)?;
        }
        Some("list") => {
            logging::init_tracing(&config.log_level);
            run_list(file_arg(&args)?, &config)?;
        }
        Some("categories") => {
            logging::init_tracing(&config.log_level);
            run_categories(file_arg(&args)?)?;
        }
        Some("summary") => {
            logging::init_tracing(&config.log_level);
            let Some(category) = args.get(3) else {
                bail!("missing CATEGORY\n\n{}", USAGE);
            };
            run_summary(file_arg(&args)?, category, &config)?;
        }
        Some("add") => {
            logging::init_tracing(&config.log_level);
            let [date, category, amount] = match &args[2..] {
                [_, date, category, amount] => [date, category, amount],
                _ => bail!("add expects FILE DATE CATEGORY AMOUNT\n\n{}", USAGE),
            };
            run_add(file_arg(&args)?, date, category, amount)?;
        }
        Some("help") | Some("--help") | Some("-h") => println!("{}", USAGE),
        Some(other) => bail!("unknown command {:?}\n\n{}", other, USAGE),
    }

    Ok(())
}

fn file_arg(args: &[String]) -> Result<&Path> {
    match args.get(2) {
        Some(file) => Ok(Path::new(file)),
        None => bail!("missing FILE\n\n{}", USAGE),
    }
}

fn run_list(csv_path: &Path, config: &AppConfig) -> Result<()> {
    let book = files::load_csv(csv_path)?;
    tracing::info!(file = %csv_path.display(), records = book.records().len(), "ledger loaded");

    println!("{:>4}  {:<12} {:<20} {:>12}", "#", "Date", "Category", config.amount_label());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (position, record) in book.records().iter().enumerate() {
        let flag = if record.parsed_date().is_some() { "" } else { "  (unrecognized date)" };
        println!(
            "{:>4}  {:<12} {:<20} {:>12}{}",
            position,
            record.date(),
            record.category(),
            record.amount(),
            flag
        );
    }
    println!("\n✓ {} expenses", book.records().len());

    Ok(())
}

fn run_categories(csv_path: &Path) -> Result<()> {
    let book = files::load_csv(csv_path)?;

    for category in book.list_categories() {
        println!("{}", category);
    }

    Ok(())
}

fn run_summary(csv_path: &Path, category: &str, config: &AppConfig) -> Result<()> {
    let book = files::load_csv(csv_path)?;
    let summary = book.summarize(category)?;
    tracing::debug!(category, count = summary.count, "summary computed");

    println!("📊 Expense Distribution - {} ({})", summary.category, config.amount_label());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  count         {}", summary.count);
    println!("  min           {}", summary.min);
    println!("  Q1            {}", summary.q1);
    println!("  median        {}", summary.median);
    println!("  Q3            {}", summary.q3);
    println!("  max           {}", summary.max);
    println!("  fences        [{}, {}]", summary.lower_fence, summary.upper_fence);
    println!("  whiskers      [{}, {}]", summary.whisker_low, summary.whisker_high);
    if summary.outliers.is_empty() {
        println!("  outliers      none");
    } else {
        let outliers: Vec<String> = summary.outliers.iter().map(|v| v.to_string()).collect();
        println!("  outliers      {}", outliers.join(", "));
    }

    Ok(())
}

fn run_add(csv_path: &Path, date: &str, category: &str, amount: &str) -> Result<()> {
    let mut book = files::load_csv_or_empty(csv_path)?;
    let position = book.add_expense(date, category, amount)?;
    files::save_csv(&book, csv_path)?;

    tracing::info!(file = %csv_path.display(), position, category, "expense added");
    println!("✓ Added expense #{} to {}", position, csv_path.display());

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig, csv_path: &Path) -> Result<()> {
    use expense_analyzer::ExpenseBook;

    logging::init_file_tracing(&config.log_file(), &config.log_level)?;

    let (book, status) = match files::load_csv_or_empty(csv_path) {
        Ok(book) => {
            let status = format!("Loaded {} expenses from {}", book.records().len(), csv_path.display());
            (book, status)
        }
        Err(err) => {
            tracing::warn!(error = %format!("{:#}", err), "starting with an empty ledger");
            (ExpenseBook::new(), format!("Could not load {}: {:#}", csv_path.display(), err))
        }
    };

    let mut app = ui::App::new(book, config, csv_path.to_path_buf(), status);
    ui::run_ui(&mut app)?;

    println!("\n✅ Expense Analyzer closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig, _csv_path: &Path) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the CLI commands:\n\n{}", USAGE);
    std::process::exit(1);
}
