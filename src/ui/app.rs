use std::mem;

use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::location::{LocationError, LocationFix, LocationPoller, LocationUpdate};
use crate::models::Item;
use crate::sync::{Change, ItemView, Outcome, Request, StoreWorker};

use super::forms::{ConfirmItemDelete, LabelForm};
use super::helpers::{centered_rect, item_line};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Location banner at the top of the screen.
const BANNER_HEIGHT: u16 = 4;
/// Label used when no city is known yet.
const FALLBACK_LABEL: &str = "New item";

/// Fine-grained modes of the single screen.
enum Mode {
    Normal,
    AddingItem(LabelForm),
    ConfirmDelete(ConfirmItemDelete),
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

/// What the banner knows about the device's whereabouts.
enum LocationState {
    Locating,
    Found(LocationFix),
    /// The latest refresh failed. The previous fix, if any, is still shown.
    Failed {
        error: LocationError,
        last: Option<LocationFix>,
    },
}

impl LocationState {
    fn fix(&self) -> Option<&LocationFix> {
        match self {
            LocationState::Locating => None,
            LocationState::Found(fix) => Some(fix),
            LocationState::Failed { last, .. } => last.as_ref(),
        }
    }
}

/// Central application state. Items are only ever changed by folding worker
/// completions into `view`; key handlers just submit requests.
pub struct App {
    worker: StoreWorker,
    view: ItemView,
    selected: usize,
    mode: Mode,
    status: Option<StatusMessage>,
    location: LocationState,
    poller: Option<LocationPoller>,
}

impl App {
    /// Take ownership of the store worker and the location timer and queue the
    /// initial load.
    pub fn new(
        mut worker: StoreWorker,
        poller: Option<LocationPoller>,
    ) -> Result<Self, StoreError> {
        worker.submit(Request::Refresh)?;
        Ok(Self {
            worker,
            view: ItemView::new(),
            selected: 0,
            mode: Mode::Normal,
            status: None,
            location: LocationState::Locating,
            poller,
        })
    }

    /// Fold in everything the background threads have produced since the last
    /// frame. Completions are applied in the order they arrive.
    pub fn tick(&mut self) {
        while let Some(completion) = self.worker.try_complete() {
            let outcome = self.view.apply(completion);
            self.absorb(outcome);
        }

        let update = self.poller.as_ref().and_then(LocationPoller::latest);
        if let Some(update) = update {
            self.apply_location(update);
        }
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingItem(form) => self.handle_add_item(code, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };

        exit
    }

    /// Stop the location timer. Also happens on drop.
    pub fn shutdown(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.cancel();
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-5),
            KeyCode::PageDown => self.move_selection(5),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.view.len().saturating_sub(1),
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.clear_status();
                let label = self.default_label();
                self.submit(Request::Insert { label });
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                self.clear_status();
                return Mode::AddingItem(LabelForm::with_label(&self.default_label()));
            }
            KeyCode::Char('+') | KeyCode::Enter => {
                if let Some(id) = self.current_item().map(|item| item.id) {
                    self.submit(Request::Increment { id });
                } else {
                    self.set_status("No item selected.", StatusKind::Error);
                }
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(item) = self.current_item() {
                    let confirm = ConfirmItemDelete::from(item);
                    self.clear_status();
                    return Mode::ConfirmDelete(confirm);
                }
                self.set_status("No item selected to delete.", StatusKind::Error);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.clear_status();
                self.submit(Request::Refresh);
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_add_item(&mut self, code: KeyCode, mut form: LabelForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add item cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_label() {
                Ok(label) => {
                    self.submit(Request::Insert { label });
                    return Mode::Normal;
                }
                Err(err) => {
                    let message = err.to_string();
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingItem(form)
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmItemDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.submit(Request::Delete { id: confirm.id });
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn submit(&mut self, request: Request) {
        if let Err(err) = self.worker.submit(request) {
            warn!(error = %err, "could not queue store request");
            self.set_status(err.root_message(), StatusKind::Error);
        }
    }

    /// Turn a confirmed (or rejected) operation into selection and status
    /// updates.
    fn absorb(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Applied(Change::Refreshed { count }) => {
                self.clamp_selection();
                self.set_status(format!("Loaded {count} items."), StatusKind::Info);
            }
            Outcome::Applied(Change::Added(item)) => {
                if let Some(index) = self.view.position(item.id) {
                    self.selected = index;
                }
                self.set_status(format!("Added {}.", item.label), StatusKind::Info);
            }
            Outcome::Applied(Change::Incremented(item)) => {
                self.set_status(
                    format!("{} is now at {}.", item.label, item.count),
                    StatusKind::Info,
                );
            }
            Outcome::Applied(Change::Removed(item)) => {
                self.clamp_selection();
                self.set_status(format!("Deleted {}.", item.label), StatusKind::Info);
            }
            // The row vanished underneath us; nothing to show.
            Outcome::NotFound { .. } => {}
            Outcome::Rejected { reason } => self.set_status(reason, StatusKind::Error),
            Outcome::Diverged { .. } => self.submit(Request::Refresh),
        }
    }

    pub(crate) fn apply_location(&mut self, update: LocationUpdate) {
        let previous = mem::replace(&mut self.location, LocationState::Locating);
        self.location = match update {
            Ok(fix) => {
                if previous.fix().map(|old| &old.address) != Some(&fix.address) {
                    info!(address = %fix.address, coords = %fix.coords, "location changed");
                }
                LocationState::Found(fix)
            }
            Err(error) => {
                let last = match previous {
                    LocationState::Found(fix) => Some(fix),
                    LocationState::Failed { last, .. } => last,
                    LocationState::Locating => None,
                };
                LocationState::Failed { error, last }
            }
        };
    }

    /// The current city, which doubles as the label for quick-added items.
    fn default_label(&self) -> String {
        self.location
            .fix()
            .and_then(|fix| fix.address.city())
            .unwrap_or(FALLBACK_LABEL)
            .to_string()
    }

    fn current_item(&self) -> Option<&Item> {
        self.view.items().get(self.selected)
    }

    fn move_selection(&mut self, offset: isize) {
        if self.view.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.view.len() - 1;
        self.selected = self.selected.saturating_add_signed(offset).min(last);
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.view.len() {
            self.selected = self.view.len().saturating_sub(1);
        }
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

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(BANNER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_location_banner(frame, chunks[0]);
        self.draw_item_list(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::AddingItem(form) => self.draw_add_form(frame, area, form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_location_banner(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Your Location");
        let muted = Style::default().fg(Color::DarkGray);

        let mut lines = match self.location.fix() {
            Some(fix) => vec![
                Line::from(Span::styled(
                    fix.address.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(fix.coords.to_string(), muted)),
            ],
            None => vec![Line::from(Span::styled("Locating...", muted))],
        };
        if let LocationState::Failed { error, .. } = &self.location {
            lines.truncate(1);
            lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_item_list(&self, frame: &mut Frame, area: Rect) {
        let mut title = format!("Items ({})", self.view.len());
        if !self.worker.is_idle() {
            title.push_str(" - saving...");
        }
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.view.is_empty() {
            let message = Paragraph::new("No items yet. Press 'n' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let rows: Vec<ListItem> = self
            .view
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| ListItem::new(item_line(item, index == self.selected)))
            .collect();
        let list = List::new(rows)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow));

        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::AddingItem(_) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::ConfirmDelete(_) => Line::from(vec![
                Span::styled("[Y]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[N/Esc]", key_style),
                Span::raw(" Keep"),
            ]),
            Mode::Normal => Line::from(vec![
                Span::styled("[n]", key_style),
                Span::raw(" Add Here   "),
                Span::styled("[a]", key_style),
                Span::raw(" Add Named   "),
                Span::styled("[+]", key_style),
                Span::raw(" Increment   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[r]", key_style),
                Span::raw(" Reload   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_add_form(&self, frame: &mut Frame, area: Rect, form: &LabelForm) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Item").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![form.build_line(), Line::from("")];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + "Label: ".len() as u16 + form.value_len() as u16;
        frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), inner.y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmItemDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete {} (count {})?",
                confirm.label, confirm.count
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}
