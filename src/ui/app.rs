use std::cell::Cell;
use std::mem;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, MouseEvent};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell as TableCell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::fetch_clients;
use crate::models::{Client, ClientTab};
use crate::sort::{Direction as SortDirection, FieldRegistry, RuleSet, SortError};

use super::dropdown::{DropdownOutcome, SortDropdown};
use super::helpers::{format_date, status_style, surface_error};
use super::screens::ClientTableScreen;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const PAGE_STEP: isize = 10;

/// Fine-grained modes for the table. The sort dropdown is tracked by the
/// dropdown itself, since its session state lives in the configurator.
enum Mode {
    Normal,
    Searching(SearchState),
}

/// State for an active inline search.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    table: ClientTableScreen,
    dropdown: SortDropdown,
    mode: Mode,
    status: Option<StatusMessage>,
    /// Last frame size, so pointer events can be hit-tested against the
    /// same geometry that was drawn.
    frame_area: Cell<Rect>,
}

impl App {
    pub fn new(conn: Connection, registry: FieldRegistry, clients: Vec<Client>) -> Result<Self> {
        let dropdown = SortDropdown::new(registry.clone());
        let table =
            ClientTableScreen::new(registry, clients).context("failed to build client table")?;
        Ok(Self {
            conn,
            table,
            dropdown,
            mode: Mode::Normal,
            status: None,
            frame_area: Cell::new(Rect::default()),
        })
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if self.dropdown.is_open() {
            let outcome = self.dropdown.handle_key(code);
            self.settle(outcome);
            return Ok(false);
        }

        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Searching(state) => self.handle_search(code, state),
        };
        Ok(exit)
    }

    /// Pointer input is routed only while the dropdown's outside-click
    /// listener is bound; the table itself is keyboard driven.
    pub fn handle_mouse(&mut self, event: MouseEvent) {
        if self.dropdown.is_listening() {
            let outcome = self.dropdown.handle_mouse(event, self.frame_area.get());
            self.settle(outcome);
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.table.move_selection(-1),
            KeyCode::Down => self.table.move_selection(1),
            KeyCode::PageUp => self.table.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.table.move_selection(PAGE_STEP),
            KeyCode::Home => self.table.select_first(),
            KeyCode::End => self.table.select_last(),
            KeyCode::Tab => self.table.cycle_tab(1),
            KeyCode::BackTab => self.table.cycle_tab(-1),
            KeyCode::Char(' ') => self.table.toggle_current(),
            KeyCode::Char('a') => {
                self.table.toggle_all();
                let count = self.table.checked.len();
                if count == 0 {
                    self.set_status("Selection cleared.", StatusKind::Info);
                } else {
                    self.set_status(format!("Selected {count} clients."), StatusKind::Info);
                }
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                let query = self.table.filter.clone().unwrap_or_default();
                self.clear_status();
                return Mode::Searching(SearchState { query });
            }
            KeyCode::Char('s') => self.open_sort(),
            KeyCode::Char('r') => self.reload_clients(),
            _ => {}
        }
        Mode::Normal
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.table.set_filter(None);
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => {
                self.table.move_selection(-1);
                return Mode::Searching(state);
            }
            KeyCode::Down => {
                self.table.move_selection(1);
                return Mode::Searching(state);
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => return Mode::Searching(state),
        }

        if state.query.trim().is_empty() {
            self.table.set_filter(None);
        } else {
            self.table.set_filter(Some(state.query.clone()));
        }
        Mode::Searching(state)
    }

    fn open_sort(&mut self) {
        match self
            .dropdown
            .open(self.table.committed(), self.table.field_order())
        {
            Ok(_) => self.clear_status(),
            Err(err) => {
                warn!(%err, "could not open sort dropdown");
                self.set_status(err.to_string(), StatusKind::Error);
            }
        }
    }

    /// Act on what the dropdown reported. An applied sort is the only path
    /// by which the committed rules change.
    fn settle(&mut self, outcome: Result<DropdownOutcome, SortError>) {
        match outcome {
            Ok(DropdownOutcome::Stay) => {}
            Ok(DropdownOutcome::Applied(applied)) => {
                let summary = describe_rules(&self.table.registry, &applied.rules);
                let count = applied.rules.len();
                match self.table.commit_sort(applied) {
                    Ok(()) => {
                        info!(rules = count, sort = %summary, "sort applied");
                        if count == 0 {
                            self.set_status("Sort cleared.", StatusKind::Info);
                        } else {
                            self.set_status(format!("Sorted by {summary}."), StatusKind::Info);
                        }
                    }
                    Err(err) => {
                        warn!(%err, "applied sort was rejected");
                        self.set_status(err.to_string(), StatusKind::Error);
                    }
                }
            }
            Ok(DropdownOutcome::Dismissed(order)) => match self.table.remember_order(order) {
                Ok(()) => self.set_status("Sort unchanged.", StatusKind::Info),
                Err(err) => {
                    warn!(%err, "dismissed field order was rejected");
                    self.set_status(err.to_string(), StatusKind::Error);
                }
            },
            Err(err) => {
                warn!(%err, "sort dropdown rejected input");
                self.set_status(err.to_string(), StatusKind::Error);
            }
        }
    }

    /// Re-read the dataset. A storage failure is reported on the footer
    /// rather than ending the session.
    fn reload_clients(&mut self) {
        match fetch_clients(&self.conn) {
            Ok(clients) => {
                let count = clients.len();
                self.table.set_clients(clients);
                info!(count, "reloaded clients");
                self.set_status(format!("Reloaded {count} clients."), StatusKind::Info);
            }
            Err(err) => {
                warn!(error = %err, "reload failed");
                self.set_status(surface_error(&err), StatusKind::Error);
            }
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        self.frame_area.set(area);
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(footer_height),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        self.draw_tabs(frame, chunks[1]);
        self.draw_table(frame, chunks[2]);
        if area.height >= footer_height {
            self.draw_footer(frame, chunks[3]);
        }

        if let Mode::Searching(state) = &self.mode {
            self.draw_search_bar(frame, area, state);
        }
        self.dropdown.draw(frame, area);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let committed = self.table.committed();
        let indicator = if committed.is_empty() {
            "Sort: none".to_string()
        } else {
            let parts: Vec<String> = committed
                .iter()
                .map(|rule| {
                    let label = self
                        .table
                        .registry
                        .get(rule.field)
                        .map_or(rule.field.as_str(), |field| field.label);
                    let arrow = match rule.direction {
                        SortDirection::Ascending => "↑",
                        SortDirection::Descending => "↓",
                    };
                    format!("{label} {arrow}")
                })
                .collect();
            format!("Sort: {}", parts.join(", "))
        };

        let line = Line::from(vec![
            Span::styled("Clients", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("   "),
            Span::styled(indicator, Style::default().fg(Color::Cyan)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let tabs = Tabs::new(ClientTab::ALL.iter().map(|tab| tab.label()))
            .select(self.table.tab.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " {} of {} clients · {} selected ",
            self.table.visible.len(),
            self.table.clients.len(),
            self.table.checked.len()
        );
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.table.visible.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let message = Paragraph::new("No clients found.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            let row = Rect {
                y: inner.y + inner.height / 2,
                height: inner.height.min(1),
                ..inner
            };
            frame.render_widget(message, row);
            return;
        }

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let all = if self.table.all_checked() { "[x]" } else { "[ ]" };
        let header = Row::new(
            [
                all,
                "ID",
                "Name",
                "Type",
                "Email",
                "Status",
                "Created At",
                "Updated At",
                "Updated By",
            ]
            .into_iter()
            .map(|title| TableCell::from(title).style(bold)),
        );

        let rows = self.table.visible.iter().map(|client| {
            let check = if self.table.is_checked(client.id) {
                "[x]"
            } else {
                "[ ]"
            };
            let status = Line::from(vec![
                Span::styled("● ", status_style(client.status)),
                Span::raw(client.status.as_str()),
            ]);
            Row::new(vec![
                TableCell::from(check),
                TableCell::from(client.id.to_string()),
                TableCell::from(client.name.clone()),
                TableCell::from(client.client_type.as_str()),
                TableCell::from(client.email.clone()),
                TableCell::from(status),
                TableCell::from(format_date(&client.created_at, false)),
                TableCell::from(format_date(&client.updated_at, true)),
                TableCell::from(client.updated_by.clone()),
            ])
        });

        let widths = [
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(14),
            Constraint::Length(10),
            Constraint::Min(18),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(22),
            Constraint::Length(10),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .row_highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = TableState::default().with_selected(Some(self.table.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let mut status = Vec::new();
        if let Some(message) = &self.status {
            status.push(Span::styled(message.text.clone(), message.kind.style()));
        }
        if !self.table.issues.is_empty() {
            if !status.is_empty() {
                status.push(Span::raw("   "));
            }
            status.push(Span::styled(
                format!(
                    "{} unreadable value(s) sorted last, see log",
                    self.table.issues.len()
                ),
                Style::default().fg(Color::Yellow),
            ));
        }

        let paragraph = Paragraph::new(vec![Line::from(status), self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&'static str, &'static str)] = if self.dropdown.is_open() {
            &[
                ("[↑↓]", " Field   "),
                ("[←→]", " Option   "),
                ("[Enter]", " Choose   "),
                ("[Space]", " Grab   "),
                ("[x]", " Clear   "),
                ("[c]", " Clear all   "),
                ("[a]", " Apply   "),
                ("[Esc]", " Cancel"),
            ]
        } else if matches!(self.mode, Mode::Searching(_)) {
            &[
                ("[Type]", " Filter   "),
                ("[↑↓]", " Navigate   "),
                ("[Enter]", " Keep   "),
                ("[Esc]", " Clear"),
            ]
        } else {
            &[
                ("[↑↓]", " Navigate   "),
                ("[Tab]", " Type   "),
                ("[Space]", " Select   "),
                ("[a]", " All   "),
                ("[f]", " Search   "),
                ("[s]", " Sort   "),
                ("[r]", " Reload   "),
                ("[q]", " Quit"),
            ]
        };

        Line::from(
            hints
                .iter()
                .flat_map(|(key, label)| {
                    [Span::styled(*key, key_style), Span::raw(*label)]
                })
                .collect::<Vec<_>>(),
        )
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

/// `Created At (Newest to Oldest), Client Name (A-Z)`.
fn describe_rules(registry: &FieldRegistry, rules: &RuleSet) -> String {
    rules
        .iter()
        .map(|rule| match registry.get(rule.field) {
            Some(field) => {
                let option = field
                    .label_for(rule.direction)
                    .unwrap_or(rule.direction.token());
                format!("{} ({option})", field.label)
            }
            None => format!("{} ({})", rule.field, rule.direction),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{load_or_seed_clients, open_in_memory};
    use crate::sort::client_fields;
    use crate::sort::registry::{CREATED_AT, ID, NAME, UPDATED_AT};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn app() -> App {
        let conn = open_in_memory().unwrap();
        let clients = load_or_seed_clients(&conn).unwrap();
        App::new(conn, client_fields().unwrap(), clients).unwrap()
    }

    fn keys(app: &mut App, codes: &[KeyCode]) {
        for code in codes {
            app.handle_key(*code).unwrap();
        }
    }

    fn ids(app: &App) -> Vec<i64> {
        app.table.visible.iter().map(|c| c.id).collect()
    }

    fn status_text(app: &App) -> &str {
        app.status.as_ref().map_or("", |s| s.text.as_str())
    }

    #[test]
    fn applying_from_the_keyboard_commits_and_resorts() {
        let mut app = app();
        // Open, move to Created At, choose "Newest to Oldest", apply.
        keys(
            &mut app,
            &[KeyCode::Char('s'), KeyCode::Down, KeyCode::Enter, KeyCode::Char('a')],
        );
        assert!(!app.dropdown.is_open());
        assert_eq!(app.table.committed().len(), 1);
        assert_eq!(ids(&app)[0], 16);
        assert_eq!(status_text(&app), "Sorted by Created At (Newest to Oldest).");
    }

    #[test]
    fn cancelling_keeps_the_committed_sort() {
        let mut app = app();
        keys(
            &mut app,
            &[KeyCode::Char('s'), KeyCode::Enter, KeyCode::Esc],
        );
        assert!(app.table.committed().is_empty());
        assert_eq!(ids(&app), (10..=19).collect::<Vec<_>>());
        assert_eq!(status_text(&app), "Sort unchanged.");
    }

    #[test]
    fn reorders_survive_a_cancelled_session() {
        let mut app = app();
        // Grab Client Name, push it to the bottom, release, cancel.
        keys(
            &mut app,
            &[
                KeyCode::Char('s'),
                KeyCode::Char(' '),
                KeyCode::Down,
                KeyCode::Down,
                KeyCode::Down,
                KeyCode::Char(' '),
                KeyCode::Esc,
            ],
        );
        assert!(!app.dropdown.is_open());
        assert_eq!(status_text(&app), "Sort unchanged.");
        assert!(app.table.committed().is_empty());
        assert_eq!(ids(&app), (10..=19).collect::<Vec<_>>());
        assert_eq!(app.table.field_order().keys(), &[CREATED_AT, UPDATED_AT, ID, NAME]);

        app.handle_key(KeyCode::Char('s')).unwrap();
        let reopened: Vec<_> = app.dropdown.views().iter().map(|v| v.key).collect();
        assert_eq!(reopened, vec![CREATED_AT, UPDATED_AT, ID, NAME]);
    }

    #[test]
    fn quitting_is_ignored_while_the_dropdown_is_open() {
        let mut app = app();
        app.handle_key(KeyCode::Char('s')).unwrap();
        assert!(!app.handle_key(KeyCode::Char('q')).unwrap());
        app.handle_key(KeyCode::Esc).unwrap();
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn search_mode_filters_as_you_type() {
        let mut app = app();
        keys(
            &mut app,
            &[
                KeyCode::Char('f'),
                KeyCode::Char('p'),
                KeyCode::Char('a'),
                KeyCode::Char('t'),
            ],
        );
        assert_eq!(ids(&app), vec![18, 19]);
        // Keys typed while searching do not trigger table shortcuts.
        assert!(app.table.checked.is_empty());

        app.handle_key(KeyCode::Enter).unwrap();
        assert_eq!(ids(&app), vec![18, 19]);
        app.handle_key(KeyCode::Char('f')).unwrap();
        app.handle_key(KeyCode::Esc).unwrap();
        assert_eq!(ids(&app).len(), 10);
    }

    #[test]
    fn describes_rules_with_option_labels() {
        let registry = client_fields().unwrap();
        let rules = RuleSet::from_rules(vec![
            crate::sort::SortRule::desc(CREATED_AT),
            crate::sort::SortRule::asc(NAME),
        ])
        .unwrap();
        assert_eq!(
            describe_rules(&registry, &rules),
            "Created At (Newest to Oldest), Client Name (A-Z)"
        );
    }

    #[test]
    fn draws_table_and_dropdown() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(130, 30)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("John Doe"));
        assert!(text.contains("Jan 15, 2024"));
        assert!(text.contains("Jan 20, 2024, 02:45 PM"));

        app.handle_key(KeyCode::Char('s')).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Sort By"));
        assert!(text.contains("Apply Sort"));
        assert_eq!(app.frame_area.get(), Rect::new(0, 0, 130, 30));
    }

    #[test]
    fn empty_results_show_a_message() {
        let mut app = app();
        app.table.set_filter(Some("nobody".into()));
        let mut terminal = Terminal::new(TestBackend::new(130, 30)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        assert!(buffer_text(&terminal).contains("No clients found."));
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        let mut text = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }
}
