use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use expense_analyzer::{files, AppConfig, DistributionSummary, ExpenseBook, LedgerError};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

const PAGE_SIZE: usize = 20;
const FORM_LABELS: [&str; 3] = ["Date (YYYY-MM-DD)", "Category", "Amount"];

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Open,
    SaveAs,
}

impl FileAction {
    pub fn title(&self) -> &str {
        match self {
            FileAction::Open => " Load CSV ",
            FileAction::SaveAs => " Save CSV As ",
        }
    }
}

/// Add-expense form: date, category, amount
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseForm {
    pub fields: [String; 3],
    pub focus: usize,
}

impl ExpenseForm {
    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    fn previous_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    fn push(&mut self, c: char) {
        self.fields[self.focus].push(c);
    }

    fn backspace(&mut self) {
        self.fields[self.focus].pop();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Browse,
    Adding(ExpenseForm),
    Prompt { action: FileAction, input: String },
}

pub struct App {
    pub book: ExpenseBook,
    pub csv_path: PathBuf,
    pub amount_label: String,
    pub state: TableState,
    pub categories: Vec<String>,
    pub category_state: ListState,
    pub mode: Mode,
    pub show_plot: bool,
    pub status: String,
    pub status_is_error: bool,
}

impl App {
    pub fn new(book: ExpenseBook, config: &AppConfig, csv_path: PathBuf, status: String) -> Self {
        let mut app = Self {
            book,
            csv_path,
            amount_label: config.amount_label(),
            state: TableState::default(),
            categories: Vec::new(),
            category_state: ListState::default(),
            mode: Mode::Browse,
            show_plot: false,
            status,
            status_is_error: false,
        };
        app.refresh();
        app
    }

    /// Re-derive categories and clamp selections after any ledger change.
    /// Keeps the selected category if it still exists.
    fn refresh(&mut self) {
        let previous = self.selected_category().map(str::to_string);
        self.categories = self.book.list_categories();

        let index = previous
            .and_then(|name| self.categories.iter().position(|c| *c == name))
            .or(if self.categories.is_empty() { None } else { Some(0) });
        self.category_state.select(index);

        let len = self.book.records().len();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            _ => {}
        }
    }

    fn info(&mut self, message: String) {
        tracing::info!("{}", message);
        self.status = message;
        self.status_is_error = false;
    }

    fn error(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.status = message;
        self.status_is_error = true;
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.category_state
            .selected()
            .and_then(|i| self.categories.get(i))
            .map(String::as_str)
    }

    /// Summary for the selected category; None when nothing can be drawn
    pub fn current_summary(&self) -> Option<DistributionSummary> {
        self.selected_category()
            .and_then(|category| self.book.summarize(category).ok())
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn next(&mut self) {
        let len = self.book.records().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.book.records().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.book.records().len();
        if len == 0 {
            return;
        }
        let i = self
            .state
            .selected()
            .map(|i| (i + PAGE_SIZE).min(len - 1))
            .unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = self.state.selected().map(|i| i.saturating_sub(PAGE_SIZE)).unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn next_category(&mut self) {
        let len = self.categories.len();
        if len == 0 {
            return;
        }
        let i = self.category_state.selected().map(|i| (i + 1) % len).unwrap_or(0);
        self.category_state.select(Some(i));
    }

    pub fn previous_category(&mut self) {
        let len = self.categories.len();
        if len == 0 {
            return;
        }
        let i = self
            .category_state
            .selected()
            .map(|i| (i + len - 1) % len)
            .unwrap_or(0);
        self.category_state.select(Some(i));
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    pub fn submit_form(&mut self, form: &ExpenseForm) -> bool {
        let [date, category, amount] = &form.fields;

        match self.book.add_expense(date.trim(), category.trim(), amount) {
            Ok(position) => {
                self.refresh();
                self.state.select(Some(position));
                if let Some(index) = self.categories.iter().position(|c| c == category.trim()) {
                    self.category_state.select(Some(index));
                }
                self.info(format!("Added expense #{} ({})", position + 1, category.trim()));
                true
            }
            Err(LedgerError::InvalidAmount { .. }) => {
                self.error("Please enter a valid amount!".to_string());
                false
            }
            Err(err) => {
                self.error(err.to_string());
                false
            }
        }
    }

    pub fn delete_selected(&mut self) {
        let Some(position) = self.state.selected() else {
            self.error("No expense selected".to_string());
            return;
        };

        match self.book.delete_expense(position) {
            Ok(record) => {
                self.refresh();
                self.info(format!(
                    "Deleted {} {} {}",
                    record.date(),
                    record.category(),
                    record.amount()
                ));
            }
            Err(err) => self.error(err.to_string()),
        }
    }

    pub fn save(&mut self) {
        let path = self.csv_path.clone();
        match files::save_csv(&self.book, &path) {
            Ok(()) => self.info(format!("Data saved successfully to {}", path.display())),
            Err(err) => self.error(format!("{:#}", err)),
        }
    }

    pub fn open(&mut self, path: PathBuf) {
        match files::reload_csv(&mut self.book, &path) {
            Ok(()) => {
                self.csv_path = path;
                self.state.select(None);
                self.category_state.select(None);
                self.refresh();
                self.info(format!(
                    "Loaded {} expenses from {}",
                    self.book.records().len(),
                    self.csv_path.display()
                ));
            }
            Err(err) => self.error(format!("{:#}", err)),
        }
    }

    /// Draw the box plot for the selected category. The plot then follows
    /// the category selection.
    pub fn generate_plot(&mut self) {
        if self.book.records().is_empty() {
            self.error("No data to visualize!".to_string());
            return;
        }
        if self.selected_category().is_none() {
            self.error("Please select a valid category!".to_string());
            return;
        }
        self.show_plot = true;
    }

    /// Handle one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Browse => return self.handle_browse_key(key),
            Mode::Adding(mut form) => match key.code {
                KeyCode::Esc => self.info("Add cancelled".to_string()),
                KeyCode::Enter => {
                    if self.submit_form(&form) {
                        self.mode = Mode::Adding(ExpenseForm::default());
                    } else {
                        self.mode = Mode::Adding(form);
                    }
                }
                KeyCode::Tab | KeyCode::Down => {
                    form.next_field();
                    self.mode = Mode::Adding(form);
                }
                KeyCode::BackTab | KeyCode::Up => {
                    form.previous_field();
                    self.mode = Mode::Adding(form);
                }
                KeyCode::Backspace => {
                    form.backspace();
                    self.mode = Mode::Adding(form);
                }
                KeyCode::Char(c) => {
                    form.push(c);
                    self.mode = Mode::Adding(form);
                }
                _ => self.mode = Mode::Adding(form),
            },
            Mode::Prompt { action, mut input } => match key.code {
                KeyCode::Esc => {}
                KeyCode::Enter if !input.trim().is_empty() => {
                    let path = PathBuf::from(input.trim());
                    match action {
                        FileAction::Open => self.open(path),
                        FileAction::SaveAs => {
                            self.csv_path = path;
                            self.save();
                        }
                    }
                }
                KeyCode::Backspace => {
                    input.pop();
                    self.mode = Mode::Prompt { action, input };
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    self.mode = Mode::Prompt { action, input };
                }
                _ => self.mode = Mode::Prompt { action, input },
            },
        }
        false
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => {
                if !self.book.records().is_empty() {
                    self.state.select(Some(0));
                }
            }
            KeyCode::End => {
                if !self.book.records().is_empty() {
                    self.state.select(Some(self.book.records().len() - 1));
                }
            }
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => self.next_category(),
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => self.previous_category(),
            KeyCode::Enter | KeyCode::Char('b') => self.generate_plot(),
            KeyCode::Char('a') => self.mode = Mode::Adding(ExpenseForm::default()),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('s') => self.save(),
            KeyCode::Char('S') => {
                self.mode = Mode::Prompt {
                    action: FileAction::SaveAs,
                    input: self.csv_path.display().to_string(),
                }
            }
            KeyCode::Char('o') => {
                self.mode = Mode::Prompt {
                    action: FileAction::Open,
                    input: self.csv_path.display().to_string(),
                }
            }
            KeyCode::Char('r') => self.open(self.csv_path.clone()),
            _ => {}
        }
        false
    }
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_table(f, content_chunks[0], app);

    let side_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(0)])
        .split(content_chunks[1]);

    render_categories(f, side_chunks[0], app);
    render_plot(f, side_chunks[1], app);

    render_status_bar(f, chunks[2], app);

    match &app.mode {
        Mode::Browse => {}
        Mode::Adding(form) => render_form(f, form),
        Mode::Prompt { action, input } => render_prompt(f, *action, input),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let spans = vec![
        Span::styled(
            "💰 Expense Analyzer",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Expenses: {}", app.book.records().len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Categories: {}", app.categories.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  |  "),
        Span::styled(
            app.csv_path.display().to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["#", "Date", "Category", "Amount"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let selected_category = app.selected_category().map(str::to_string);

    let rows = app.book.records().iter().enumerate().map(|(i, record)| {
        let color = if record.amount() < 0.0 { Color::Green } else { Color::Red };
        let date_style = if record.parsed_date().is_some() {
            Style::default()
        } else {
            Style::default().fg(Color::Magenta)
        };
        let category_style = if selected_category.as_deref() == Some(record.category()) {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        Row::new(vec![
            Cell::from(format!("{}", i + 1)),
            Cell::from(record.date().to_string()).style(date_style),
            Cell::from(truncate(record.category(), 20)).style(category_style),
            Cell::from(format!("{:.2}", record.amount())).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Length(22),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Expenses "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_categories(f: &mut Frame, area: Rect, app: &mut App) {
    let counts = expense_analyzer::category_counts(app.book.ledger());

    let items: Vec<ListItem> = counts
        .iter()
        .map(|(name, count)| {
            ListItem::new(Line::from(vec![
                Span::raw(truncate(name, 24)),
                Span::styled(format!("  ({})", count), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Category (Tab/←/→) "),
        )
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");

    f.render_stateful_widget(list, area, &mut app.category_state);
}

fn render_plot(f: &mut Frame, area: Rect, app: &App) {
    let title = match app.selected_category() {
        Some(category) => format!(" Expense Distribution - {} ", category),
        None => " Expense Distribution ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(title);

    let summary = match app.current_summary() {
        Some(summary) if app.show_plot => summary,
        _ => {
            let hint = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "  Select a category and press Enter to generate the box plot",
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )),
            ])
            .block(block);
            f.render_widget(hint, area);
            return;
        }
    };

    let width = area.width.saturating_sub(6).max(10) as usize;
    let label = |name: &str, value: f64| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", name), Style::default().fg(Color::Cyan)),
            Span::raw(format!("{:.2}", value)),
        ])
    };

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", box_plot_line(&summary, width)),
            Style::default().fg(Color::Green),
        )),
        Line::from(Span::styled(
            format!("  {}", axis_line(&summary, width)),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            format!("  {}", app.amount_label),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
        label("count", summary.count as f64),
        label("min", summary.min),
        label("Q1", summary.q1),
        label("median", summary.median),
        label("Q3", summary.q3),
        label("max", summary.max),
        label("IQR", summary.iqr),
    ];

    let outliers = if summary.outliers.is_empty() {
        "none".to_string()
    } else {
        summary
            .outliers
            .iter()
            .map(|v| format!("{:.2}", v))
            .collect::<Vec<_>>()
            .join(", ")
    };
    content.push(Line::from(vec![
        Span::styled(format!("  {:<10}", "outliers"), Style::default().fg(Color::Cyan)),
        Span::styled(outliers, Style::default().fg(Color::Red)),
    ]));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let status_style = if app.status_is_error {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };

    let mut spans = vec![Span::styled(format!(" {} ", app.status), status_style)];

    let keys: &[(&str, &str)] = match app.mode {
        Mode::Browse => &[
            ("a", "Add"),
            ("d", "Delete"),
            ("Enter", "Boxplot"),
            ("o", "Load"),
            ("s", "Save"),
            ("S", "Save as"),
            ("q", "Quit"),
        ],
        Mode::Adding(_) => &[("Tab", "Next field"), ("Enter", "Add"), ("Esc", "Close")],
        Mode::Prompt { .. } => &[("Enter", "Confirm"), ("Esc", "Cancel")],
    };

    for (key, action) in keys {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(format!(" {}", action)));
    }

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_form(f: &mut Frame, form: &ExpenseForm) {
    let area = centered_rect(50, 9, f.size());

    let mut content = vec![Line::from("")];
    for (i, (label, value)) in FORM_LABELS.iter().zip(form.fields.iter()).enumerate() {
        let focused = i == form.focus;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        content.push(Line::from(vec![
            Span::styled(format!("  {:<18} ", label), label_style),
            Span::raw(value.clone()),
            Span::raw(if focused { "▏" } else { "" }),
        ]));
    }

    let popup = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" ➕ Add New Expense "),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn render_prompt(f: &mut Frame, action: FileAction, input: &str) {
    let area = centered_rect(60, 5, f.size());

    let popup = Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![Span::raw("  "), Span::raw(input.to_string()), Span::raw("▏")]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(action.title()),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    // u32 so wide terminals cannot overflow the product
    let width = (u32::from(r.width) * u32::from(percent_x.min(100)) / 100) as u16;
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}

/// Horizontal box plot scaled between the sample min and max.
///
/// `├──` and `──┤` are the whiskers, `▒` the box from Q1 to Q3, `┃` the
/// median and `o` each outlier.
pub fn box_plot_line(summary: &DistributionSummary, width: usize) -> String {
    let width = width.max(3);
    let (lo, hi) = (summary.min, summary.max);
    let span = hi - lo;
    let col = |v: f64| -> usize {
        if span <= 0.0 {
            width / 2
        } else {
            (((v - lo) / span) * (width - 1) as f64).round().clamp(0.0, (width - 1) as f64) as usize
        }
    };

    let mut chars = vec![' '; width];

    let (w_lo, w_hi) = (col(summary.whisker_low), col(summary.whisker_high));
    for c in chars.iter_mut().take(w_hi.max(w_lo) + 1).skip(w_lo.min(w_hi)) {
        *c = '─';
    }
    chars[w_lo] = '├';
    chars[w_hi] = '┤';

    let (b_lo, b_hi) = (col(summary.q1), col(summary.q3));
    for c in chars.iter_mut().take(b_hi + 1).skip(b_lo) {
        *c = '▒';
    }
    chars[col(summary.median)] = '┃';

    for outlier in &summary.outliers {
        chars[col(*outlier)] = 'o';
    }

    chars.into_iter().collect()
}

/// Min label on the left, max label on the right
pub fn axis_line(summary: &DistributionSummary, width: usize) -> String {
    let left = format!("{:.2}", summary.min);
    let right = format!("{:.2}", summary.max);
    let gap = width.saturating_sub(left.chars().count() + right.chars().count()).max(1);
    format!("{}{}{}", left, " ".repeat(gap), right)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
