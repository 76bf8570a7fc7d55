//! Main application logic for the terminal dashboard.
//!
//! This module contains the `App` struct which holds the current query and
//! the derived views, handles key input, and renders the dashboard: headline
//! counts, filter tabs, the task table, category counts and the notification
//! feed. All changes go through the task service.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame, Terminal,
};

use crate::alerts::{FeedItem, NotificationFeed};
use crate::db::{truncate, TaskStore};
use crate::fields::{SortKey, SortOrder, ViewFilter};
use crate::service::TaskService;
use crate::tui::colors::{AMBER, DARK_RED, GOLD, MUTED, NAVY};
use crate::tui::enums::{next_sort, AppState};
use crate::tui::utils::centered_rect;
use crate::view::{DashboardView, DueLabel, TaskRow, ViewQuery};

/// State for the dashboard screen.
pub struct App<S: TaskStore> {
    state: AppState,
    svc: TaskService<S>,
    query: ViewQuery,
    view: DashboardView,
    feed: NotificationFeed,
    table_state: TableState,
    status_message: String,
    pending_delete: Option<(String, String)>,
}

impl<S: TaskStore> App<S> {
    pub fn new(svc: TaskService<S>) -> Self {
        let query = ViewQuery::default();
        let view = svc.view(&query);
        let feed = svc.feed();
        let mut app = App {
            state: AppState::Dashboard,
            svc,
            query,
            view,
            feed,
            table_state: TableState::default(),
            status_message: String::new(),
            pending_delete: None,
        };
        app.clamp_selection();
        app
    }

    /// Re-read both files and rebuild the derived views.
    fn refresh(&mut self) {
        self.view = self.svc.view(&self.query);
        self.feed = self.svc.feed();
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.view.filtered.len();
        let selected = match self.table_state.selected() {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            Some(i) => Some(i),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    fn selected_row(&self) -> Option<&TaskRow> {
        self.table_state
            .selected()
            .and_then(|i| self.view.filtered.get(i))
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    fn set_filter(&mut self, filter: ViewFilter) {
        self.query.filter = filter;
        self.table_state.select(Some(0));
        self.refresh();
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.view.filtered.len();
        if len == 0 {
            return;
        }
        let i = self.table_state.selected().unwrap_or(0);
        let next = if down { (i + 1).min(len - 1) } else { i.saturating_sub(1) };
        self.table_state.select(Some(next));
    }

    fn toggle_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let (id, done) = (row.task.id.clone(), !row.completed);
        match self.svc.set_completed(&id, done) {
            Ok(task) => {
                let verb = if done { "Completed" } else { "Reopened" };
                self.set_status_message(format!("{verb}: {}", task.title));
            }
            Err(e) => self.set_status_message(format!("Update failed: {e}")),
        }
        self.refresh();
    }

    fn delete_pending(&mut self) {
        if let Some((id, title)) = self.pending_delete.take() {
            match self.svc.delete(&id) {
                Ok(_) => self.set_status_message(format!("Deleted: {title}")),
                Err(e) => self.set_status_message(format!("Delete failed: {e}")),
            }
            self.refresh();
        }
    }

    /// Handle one key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        self.status_message.clear();
        match self.state {
            AppState::Dashboard => return self.handle_dashboard_key(key),
            AppState::Help => self.state = AppState::Dashboard,
            AppState::Confirm => match key {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.delete_pending();
                    self.state = AppState::Dashboard;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.pending_delete = None;
                    self.state = AppState::Dashboard;
                }
                _ => {}
            },
        }
        false
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('1') => self.set_filter(ViewFilter::All),
            KeyCode::Char('2') => self.set_filter(ViewFilter::Pending),
            KeyCode::Char('3') => self.set_filter(ViewFilter::Completed),
            KeyCode::Char('4') => self.set_filter(ViewFilter::High),
            KeyCode::Char('s') => {
                self.query.sort = next_sort(self.query.sort);
                self.refresh();
            }
            KeyCode::Char('o') => {
                self.query.order = self.query.order.toggled();
                self.refresh();
            }
            KeyCode::Char('x') | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('d') => {
                if let Some(row) = self.selected_row() {
                    self.pending_delete = Some((row.task.id.clone(), row.task.title.clone()));
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('c') => {
                match self.svc.clear_notifications() {
                    Ok(()) => self.set_status_message("Notifications cleared"),
                    Err(e) => self.set_status_message(format!("Failed to clear notifications: {e}")),
                }
                self.refresh();
            }
            KeyCode::Char('r') => {
                self.refresh();
                self.set_status_message("Reloaded");
            }
            KeyCode::Char('h') | KeyCode::Char('?') => self.state = AppState::Help,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            _ => {}
        }
        false
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let c = &self.view.counts;
        let stat = |label: &str, n: usize| {
            vec![
                Span::styled(format!(" {n} "), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!("{label}  ")),
            ]
        };
        let mut spans = vec![Span::styled(
            "TASK DASHBOARD  ",
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        )];
        spans.extend(stat("total", c.total));
        spans.extend(stat("completed", c.completed));
        spans.extend(stat("pending", c.pending));
        spans.extend(stat("high priority", c.high_priority));
        spans.extend(stat("notifications", self.feed.unread));

        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().bg(NAVY).fg(Color::White))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_filters(&self, f: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ViewFilter::ALL
            .iter()
            .enumerate()
            .map(|(i, filter)| {
                Line::from(format!(
                    "{} {} ({})",
                    i + 1,
                    filter.as_str(),
                    self.view.counts.filters.get(*filter)
                ))
            })
            .collect();
        let selected = ViewFilter::ALL
            .iter()
            .position(|f| *f == self.query.filter)
            .unwrap_or(0);
        let sort = match self.query.sort {
            Some(SortKey::Due) => "due",
            Some(SortKey::Priority) => "priority",
            None => "none",
        };
        let order = match self.query.order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        };
        let tabs = Tabs::new(titles)
            .select(selected)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Filter  |  sort: {sort} {order}")),
            )
            .highlight_style(Style::default().fg(Color::Black).bg(GOLD));
        f.render_widget(tabs, area);
    }

    fn render_task_table(&mut self, f: &mut Frame, area: Rect) {
        let header_cells = ["", "Title", "Status", "Pri", "Due", "Due date", "Category"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(NAVY).fg(Color::White))
            .height(1);

        let rows: Vec<Row> = self
            .view
            .filtered
            .iter()
            .map(|row| {
                let t = &row.task;
                let label = row.due_label.map(|l| l.to_string()).unwrap_or_default();
                let label_style = match row.due_label {
                    Some(DueLabel::Overdue) if !row.completed => Style::default().fg(Color::White).bg(DARK_RED),
                    Some(DueLabel::Today) if !row.completed => Style::default().fg(GOLD),
                    _ => Style::default(),
                };
                let row_style = if row.completed {
                    Style::default().fg(MUTED)
                } else {
                    Style::default().fg(Color::White)
                };
                Row::new(vec![
                    Cell::from(if row.completed { "[x]" } else { "[ ]" }),
                    Cell::from(t.title.clone()),
                    Cell::from(truncate(&t.status, 12)),
                    Cell::from(t.priority_level().map(|p| p.to_string()).unwrap_or_else(|| "?".into())),
                    Cell::from(label).style(label_style),
                    Cell::from(row.due_display.clone()),
                    Cell::from(truncate(&t.category, 14)),
                ])
                .style(row_style)
            })
            .collect();

        let widths = [
            Constraint::Length(3),
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(3),
            Constraint::Length(10),
            Constraint::Length(19),
            Constraint::Length(14),
        ];

        let mut title = format!(
            "Tasks ({}/{}) - Press 'h' for help",
            self.view.filtered.len(),
            self.view.counts.total
        );
        if let Some(date) = &self.query.date {
            title.push_str(&format!(" - due {date}"));
        }
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_categories(&self, f: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = if self.view.counts.categories.is_empty() {
            vec![ListItem::new("No categories")]
        } else {
            self.view
                .counts
                .categories
                .iter()
                .map(|(name, n)| ListItem::new(format!("{n:>3}  {name}")))
                .collect()
        };
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Categories"));
        f.render_widget(list, area);
    }

    fn render_feed(&self, f: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = if self.feed.entries.is_empty() {
            vec![ListItem::new("No notifications")]
        } else {
            self.feed
                .entries
                .iter()
                .map(|entry| {
                    let style = match entry.item {
                        FeedItem::Alert(_) => Style::default().fg(AMBER).add_modifier(Modifier::BOLD),
                        FeedItem::Event(_) => Style::default(),
                    };
                    ListItem::new(vec![
                        Line::from(Span::styled(entry.item.message().to_string(), style)),
                        Line::from(Span::styled(
                            entry.ts_display.clone(),
                            Style::default().fg(MUTED),
                        )),
                    ])
                })
                .collect()
        };
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Notifications ({}) - 'c' clears", self.feed.unread)),
        );
        f.render_widget(list, area);
    }

    fn render_dashboard(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);
        self.render_header(f, chunks[0]);
        self.render_filters(f, chunks[1]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
            .split(chunks[2]);
        self.render_task_table(f, body[0]);

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(body[1]);
        self.render_categories(f, side[0]);
        self.render_feed(f, side[1]);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled("Keys", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from("1-4      filter: all / pending / completed / high"),
            Line::from("s        cycle sort: none / due / priority"),
            Line::from("o        toggle ascending / descending"),
            Line::from("x, space toggle completion of the selected task"),
            Line::from("d        delete the selected task"),
            Line::from("c        clear notifications"),
            Line::from("r        reload from disk"),
            Line::from("j/k      move selection"),
            Line::from("q, Esc   quit"),
            Line::from(""),
            Line::from("Press any key to return"),
        ];
        let area = centered_rect(60, 60, area);
        f.render_widget(Clear, area);
        let help = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: false });
        f.render_widget(help, area);
    }

    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 20, area);
        f.render_widget(Clear, area);

        let title = self
            .pending_delete
            .as_ref()
            .map(|(_, title)| title.as_str())
            .unwrap_or("");
        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "Delete this task?",
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(title.to_string()),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::Dashboard => format!(
                    "Tasks: {} | Press 'h' for help",
                    self.view.filtered.len()
                ),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
            }
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(NAVY).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Draw the whole screen.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        self.render_dashboard(f, chunks[0]);
        match self.state {
            AppState::Dashboard => {}
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => self.render_confirm(f, chunks[0]),
        }
        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key.code) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
