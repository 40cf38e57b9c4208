use std::cmp::min;
use std::mem;
use std::time::Instant;

use anyhow::Result;
use chrono::Local;
use crossterm::event::KeyCode;
use log::{info, warn};
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::admin::drafts::{BirdDraft, EventDraft};
use crate::admin::save::{delete_record, save_bird, save_event, SaveError};
use crate::admin::session::{AdminGate, Session};
use crate::admin::workflow::SubmitTicket;
use crate::admin::{AdminState, EntityKind, Services};
use crate::data::FetchTicket;
use crate::error::StoreError;
use crate::models::{Bird, Entity, Event};

use super::forms::{BirdForm, ConfirmDelete, EventForm, LoginForm};
use super::helpers::{
    banner_style, bird_card_lines, centered_rect, event_card_lines, surface_error,
};
use super::screens::{ListScreen, SearchState};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height allocation per record card.
const CARD_HEIGHT: u16 = 5;
/// Rows moved by PgUp/PgDn.
const PAGE_STEP: isize = 5;

/// Fine-grained modes for the console.
enum Mode {
    Login(LoginForm),
    Normal,
    Searching(SearchState),
    Bird(BirdForm),
    Event(EventForm),
    ConfirmDelete(ConfirmDelete),
}

/// Results of background requests, delivered back to the draw loop.
enum BackendEvent {
    BirdsLoaded(FetchTicket, Result<Vec<Bird>, StoreError>),
    EventsLoaded(FetchTicket, Result<Vec<Event>, StoreError>),
    Saved {
        kind: EntityKind,
        ticket: SubmitTicket,
        outcome: Result<(), SaveError>,
    },
    Deleted {
        kind: EntityKind,
        outcome: Result<(), StoreError>,
    },
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
    services: Services,
    runtime: Handle,
    sender: UnboundedSender<BackendEvent>,
    receiver: UnboundedReceiver<BackendEvent>,
    gate: AdminGate,
    session: Session,
    state: AdminState,
    birds_list: ListScreen,
    events_list: ListScreen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Build the console. Must be called from within a tokio runtime, which
    /// then runs every request the console makes.
    pub fn new(services: Services, gate: AdminGate, session: Session) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mode = if session.is_authenticated() {
            Mode::Normal
        } else {
            Mode::Login(LoginForm::default())
        };
        Self {
            services,
            runtime: Handle::current(),
            sender,
            receiver,
            gate,
            session,
            state: AdminState::new(),
            birds_list: ListScreen::default(),
            events_list: ListScreen::default(),
            mode,
            status: None,
        }
    }

    /// Apply finished requests, advance timers and start any fetches that
    /// are due. Called once per pass of the event loop.
    pub(crate) fn tick(&mut self) {
        while let Ok(event) = self.receiver.try_recv() {
            self.apply(event);
        }

        self.state.tick(Instant::now());
        if matches!(self.mode, Mode::Bird(_) | Mode::Event(_)) && !self.state.workflow().form_open()
        {
            self.mode = Mode::Normal;
        }

        if self.session.is_authenticated() {
            for kind in self.state.stale_kinds() {
                self.spawn_fetch(kind);
            }
        }
    }

    fn apply(&mut self, event: BackendEvent) {
        let now = Instant::now();
        match event {
            BackendEvent::BirdsLoaded(ticket, outcome) => {
                if let Err(err) = &outcome {
                    warn!("Loading birds failed: {err}");
                }
                self.state.birds_mut().finish_fetch(ticket, outcome);
                let len = self.visible_len(EntityKind::Birds);
                self.birds_list.clamp(len);
            }
            BackendEvent::EventsLoaded(ticket, outcome) => {
                if let Err(err) = &outcome {
                    warn!("Loading events failed: {err}");
                }
                self.state.events_mut().finish_fetch(ticket, outcome);
                let len = self.visible_len(EntityKind::Events);
                self.events_list.clamp(len);
            }
            BackendEvent::Saved {
                kind,
                ticket,
                outcome,
            } => self.state.finish_save(kind, ticket, outcome, now),
            BackendEvent::Deleted { kind, outcome } => {
                self.state.finish_delete(kind, outcome, now)
            }
        }
    }

    fn spawn_fetch(&mut self, kind: EntityKind) {
        let sender = self.sender.clone();
        match kind {
            EntityKind::Birds => {
                let ticket = self.state.birds_mut().begin_fetch();
                let repo = self.services.birds.clone();
                self.runtime.spawn(async move {
                    let outcome = repo.list().await;
                    let _ = sender.send(BackendEvent::BirdsLoaded(ticket, outcome));
                });
            }
            EntityKind::Events => {
                let ticket = self.state.events_mut().begin_fetch();
                let repo = self.services.events.clone();
                self.runtime.spawn(async move {
                    let outcome = repo.list().await;
                    let _ = sender.send(BackendEvent::EventsLoaded(ticket, outcome));
                });
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Login(form) => self.handle_login(code, form, &mut exit)?,
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
            Mode::Bird(form) => self.handle_bird_form(code, form)?,
            Mode::Event(form) => self.handle_event_form(code, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_login(&mut self, code: KeyCode, mut form: LoginForm, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Esc => *exit = true,
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.session.login(&self.gate, &form.password) {
                Ok(()) => {
                    info!("Admin session started");
                    self.set_status("Signed in.", StatusKind::Info);
                    return Ok(Mode::Normal);
                }
                Err(err) => {
                    form.password.clear();
                    form.error = Some(err.to_string());
                }
            },
            KeyCode::Char(ch) => form.push_char(ch),
            _ => {}
        }
        Ok(Mode::Login(form))
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let tab = self.state.tab();
        let visible_len = self.visible_len(tab);
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Tab | KeyCode::BackTab => {
                if let Err(err) = self.state.switch_tab(tab.other()) {
                    self.set_status(err.to_string(), StatusKind::Error);
                } else {
                    self.clear_status();
                }
            }
            KeyCode::Up => self.list_mut(tab).move_selection(-1, visible_len),
            KeyCode::Down => self.list_mut(tab).move_selection(1, visible_len),
            KeyCode::PageUp => self.list_mut(tab).move_selection(-PAGE_STEP, visible_len),
            KeyCode::PageDown => self.list_mut(tab).move_selection(PAGE_STEP, visible_len),
            KeyCode::Home => self.list_mut(tab).select_first(),
            KeyCode::End => self.list_mut(tab).select_last(visible_len),
            KeyCode::Char('f') | KeyCode::Char('/') => {
                let query = self.list(tab).filter.clone();
                return Ok(Mode::Searching(SearchState { query }));
            }
            KeyCode::Char('+') | KeyCode::Char('a') => return Ok(self.open_create_form()),
            KeyCode::Char('e') => return Ok(self.open_edit_form()),
            KeyCode::Char('-') | KeyCode::Char('d') => {
                if let Some(confirm) = self.current_delete_target() {
                    return Ok(Mode::ConfirmDelete(confirm));
                }
                self.set_status("Nothing selected.", StatusKind::Error);
            }
            KeyCode::Char('r') => {
                self.state.invalidate(tab);
                self.set_status(format!("Refreshing {}...", tab.title()), StatusKind::Info);
            }
            KeyCode::Enter => self.open_current_image(),
            KeyCode::Char('L') => {
                if let Err(err) = self.session.logout() {
                    self.set_status(err.to_string(), StatusKind::Error);
                    return Ok(Mode::Normal);
                }
                info!("Admin session ended");
                self.clear_status();
                return Ok(Mode::Login(LoginForm::default()));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_search(&mut self, code: KeyCode, mut search: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                search.query.clear();
                self.apply_filter(&search.query);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => return Ok(Mode::Normal),
            KeyCode::Backspace => {
                search.query.pop();
            }
            KeyCode::Char(ch) => search.query.push(ch),
            _ => return Ok(Mode::Searching(search)),
        }
        self.apply_filter(&search.query);
        Ok(Mode::Searching(search))
    }

    fn apply_filter(&mut self, query: &str) {
        match self.state.tab() {
            EntityKind::Birds => self.birds_list.set_filter(query, self.state.birds().items()),
            EntityKind::Events => self
                .events_list
                .set_filter(query, self.state.events().items()),
        }
    }

    fn handle_bird_form(&mut self, code: KeyCode, mut form: BirdForm) -> Result<Mode> {
        if code == KeyCode::Esc {
            self.state.workflow_mut().cancel();
            self.state.dismiss_banner();
            self.set_status("Edit cancelled.", StatusKind::Info);
            return Ok(Mode::Normal);
        }
        if self.state.workflow().is_locked() {
            return Ok(Mode::Bird(form));
        }

        match code {
            KeyCode::Tab | KeyCode::Down => form.next_field(true),
            KeyCode::BackTab | KeyCode::Up => form.next_field(false),
            KeyCode::Left => form.cycle(false),
            KeyCode::Right => form.cycle(true),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => self.submit_bird(&form),
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            _ => {}
        }
        Ok(Mode::Bird(form))
    }

    fn handle_event_form(&mut self, code: KeyCode, mut form: EventForm) -> Result<Mode> {
        if code == KeyCode::Esc && !form.cancel_autocomplete() {
            self.state.workflow_mut().cancel();
            self.state.dismiss_banner();
            self.set_status("Edit cancelled.", StatusKind::Info);
            return Ok(Mode::Normal);
        }
        if self.state.workflow().is_locked() {
            return Ok(Mode::Event(form));
        }

        let names = self.species_names();
        match code {
            KeyCode::Tab => {
                let consumed = form.has_active_suggestion() && form.accept_suggestion();
                if !consumed {
                    form.next_field(true);
                }
            }
            KeyCode::Down => form.next_field(true),
            KeyCode::BackTab | KeyCode::Up => form.next_field(false),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => self.submit_event(&form),
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            _ => {}
        }
        form.update_suggestion(&names);
        Ok(Mode::Event(form))
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Mode> {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.start_delete(confirm);
                Ok(Mode::Normal)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn open_create_form(&mut self) -> Mode {
        if let Err(err) = self.state.workflow_mut().start_create() {
            self.set_status(err.to_string(), StatusKind::Error);
            return Mode::Normal;
        }
        self.state.dismiss_banner();
        self.clear_status();
        match self.state.tab() {
            EntityKind::Birds => Mode::Bird(BirdForm::new(BirdDraft::default(), None)),
            EntityKind::Events => Mode::Event(EventForm::new(
                EventDraft::blank(Local::now().date_naive()),
                None,
            )),
        }
    }

    fn open_edit_form(&mut self) -> Mode {
        let form = match self.state.tab() {
            EntityKind::Birds => self
                .birds_list
                .current(self.state.birds().items())
                .and_then(|bird| {
                    let id = bird.id()?.clone();
                    Some((
                        id.clone(),
                        Mode::Bird(BirdForm::new(BirdDraft::from_record(bird), Some(id))),
                    ))
                }),
            EntityKind::Events => self
                .events_list
                .current(self.state.events().items())
                .and_then(|event| {
                    let id = event.id()?.clone();
                    Some((
                        id.clone(),
                        Mode::Event(EventForm::new(EventDraft::from_record(event), Some(id))),
                    ))
                }),
        };

        let Some((id, mode)) = form else {
            self.set_status("Nothing selected.", StatusKind::Error);
            return Mode::Normal;
        };
        if let Err(err) = self.state.workflow_mut().start_edit(id) {
            self.set_status(err.to_string(), StatusKind::Error);
            return Mode::Normal;
        }
        self.state.dismiss_banner();
        self.clear_status();
        mode
    }

    fn current_delete_target(&self) -> Option<ConfirmDelete> {
        let kind = self.state.tab();
        let (id, label) = match kind {
            EntityKind::Birds => {
                let bird = self.birds_list.current(self.state.birds().items())?;
                (bird.id()?.clone(), bird.label())
            }
            EntityKind::Events => {
                let event = self.events_list.current(self.state.events().items())?;
                (event.id()?.clone(), event.label())
            }
        };
        Some(ConfirmDelete { kind, id, label })
    }

    fn submit_bird(&mut self, form: &BirdForm) {
        if let Err(err) = form.draft.validate() {
            self.state.report_error(err.to_string());
            return;
        }
        let attachment = match form.attachment() {
            Ok(attachment) => attachment,
            Err(err) => {
                self.state.report_error(surface_error(&err));
                return;
            }
        };
        let ticket = match self.state.begin_save() {
            Ok(ticket) => ticket,
            Err(err) => {
                self.state.report_error(err.to_string());
                return;
            }
        };

        let services = self.services.clone();
        let sender = self.sender.clone();
        let draft = form.draft.clone();
        self.runtime.spawn(async move {
            let outcome = save_bird(
                &services.birds,
                &services.uploader,
                &services.bird_bucket,
                draft,
                attachment.as_ref(),
            )
            .await
            .map(|_| ());
            let _ = sender.send(BackendEvent::Saved {
                kind: EntityKind::Birds,
                ticket,
                outcome,
            });
        });
    }

    fn submit_event(&mut self, form: &EventForm) {
        if let Err(err) = form.draft.validate() {
            self.state.report_error(err.to_string());
            return;
        }
        let attachment = match form.attachment() {
            Ok(attachment) => attachment,
            Err(err) => {
                self.state.report_error(surface_error(&err));
                return;
            }
        };
        let ticket = match self.state.begin_save() {
            Ok(ticket) => ticket,
            Err(err) => {
                self.state.report_error(err.to_string());
                return;
            }
        };

        let services = self.services.clone();
        let sender = self.sender.clone();
        let draft = form.draft.clone();
        self.runtime.spawn(async move {
            let outcome = save_event(
                &services.events,
                &services.uploader,
                &services.event_bucket,
                draft,
                attachment.as_ref(),
            )
            .await
            .map(|_| ());
            let _ = sender.send(BackendEvent::Saved {
                kind: EntityKind::Events,
                ticket,
                outcome,
            });
        });
    }

    fn start_delete(&mut self, confirm: ConfirmDelete) {
        if let Err(err) = self.state.begin_delete() {
            self.set_status(err.to_string(), StatusKind::Error);
            return;
        }
        self.clear_status();

        let sender = self.sender.clone();
        let services = self.services.clone();
        let ConfirmDelete { kind, id, .. } = confirm;
        self.runtime.spawn(async move {
            let outcome = match kind {
                EntityKind::Birds => delete_record(&services.birds, &id).await,
                EntityKind::Events => delete_record(&services.events, &id).await,
            };
            let _ = sender.send(BackendEvent::Deleted { kind, outcome });
        });
    }

    fn open_current_image(&mut self) {
        let url = match self.state.tab() {
            EntityKind::Birds => self
                .birds_list
                .current(self.state.birds().items())
                .map(|bird| bird.thumbnail.clone())
                .filter(|url| !url.trim().is_empty()),
            EntityKind::Events => self
                .events_list
                .current(self.state.events().items())
                .and_then(|event| event.cover_url().map(str::to_string)),
        };

        match url {
            Some(url) => match open_link(&url) {
                Ok(()) => self.set_status(format!("Opened {url}"), StatusKind::Info),
                Err(err) => {
                    self.set_status(format!("Failed to open image: {err}"), StatusKind::Error)
                }
            },
            None => self.set_status("This record has no image.", StatusKind::Error),
        }
    }

    /// English names of every loaded bird, offered while typing species.
    fn species_names(&self) -> Vec<String> {
        self.state
            .birds()
            .items()
            .iter()
            .map(|bird| bird.english_name.clone())
            .collect()
    }

    fn list(&self, kind: EntityKind) -> &ListScreen {
        match kind {
            EntityKind::Birds => &self.birds_list,
            EntityKind::Events => &self.events_list,
        }
    }

    fn list_mut(&mut self, kind: EntityKind) -> &mut ListScreen {
        match kind {
            EntityKind::Birds => &mut self.birds_list,
            EntityKind::Events => &mut self.events_list,
        }
    }

    fn visible_len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Birds => self.birds_list.visible(self.state.birds().items()).len(),
            EntityKind::Events => self.events_list.visible(self.state.events().items()).len(),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();

        if let Mode::Login(form) = &self.mode {
            self.draw_login(frame, area, form);
            return;
        }

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

        self.draw_tabs(frame, chunks[0]);
        self.draw_banner(frame, chunks[1]);
        self.draw_records(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);

        match &self.mode {
            Mode::Bird(form) => self.draw_form(
                frame,
                area,
                form.title(),
                form.lines(),
                (form.cursor_column(), form.active_index()),
            ),
            Mode::Event(form) => self.draw_form(
                frame,
                area,
                form.title(),
                form.lines(),
                (form.cursor_column(), form.active_index()),
            ),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Searching(search) => self.draw_search_bar(frame, area, search),
            Mode::Normal | Mode::Login(_) => {}
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for kind in EntityKind::ALL {
            let style = if kind == self.state.tab() {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(format!(" {} ", kind.title()), style));
            spans.push(Span::raw(" "));
        }

        let filter = &self.list(self.state.tab()).filter;
        if !filter.is_empty() {
            spans.push(Span::styled(
                format!("  Filter: {filter}"),
                Style::default().fg(Color::Cyan),
            ));
        }
        if self.services.uploader.uploading() {
            spans.push(Span::styled(
                "  Uploading image...",
                Style::default().fg(Color::Cyan),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_banner(&self, frame: &mut Frame, area: Rect) {
        if let Some(banner) = self.state.banner() {
            let paragraph = Paragraph::new(Span::styled(
                banner.message.clone(),
                banner_style(banner.kind).add_modifier(Modifier::BOLD),
            ));
            frame.render_widget(paragraph, area);
        }
    }

    fn draw_records(&self, frame: &mut Frame, area: Rect) {
        let tab = self.state.tab();
        let title = match tab {
            EntityKind::Birds => format!("Birds ({})", self.state.birds().items().len()),
            EntityKind::Events => format!("Events ({})", self.state.events().items().len()),
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let cards = match tab {
            EntityKind::Birds => self.card_lines(
                self.state.birds().items(),
                &self.birds_list,
                bird_card_lines,
            ),
            EntityKind::Events => self.card_lines(
                self.state.events().items(),
                &self.events_list,
                event_card_lines,
            ),
        };

        // A failed refresh keeps the previously loaded cards on screen; the
        // full-page notice only replaces an empty list.
        if let Some(error) = self.state.list_error(tab) {
            let heading = match tab {
                EntityKind::Birds => "Oops! Something went wrong",
                EntityKind::Events => "Connection Lost",
            };
            let lines = vec![
                Line::from(Span::styled(
                    heading,
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(error.to_string()),
                Line::from(Span::styled(
                    "Press r to try again.",
                    Style::default().fg(Color::Gray),
                )),
            ];
            if cards.is_empty() {
                frame.render_widget(
                    Paragraph::new(lines)
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: true }),
                    inner,
                );
                return;
            }

            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(0)])
                .split(inner);
            frame.render_widget(Paragraph::new(lines), chunks[0]);
            self.render_cards(frame, chunks[1], cards, self.list(tab).selected);
            return;
        }

        if cards.is_empty() {
            let lines = if self.state.loading(tab) {
                vec![Line::from(Span::styled(
                    format!("Loading {}...", tab.title().to_lowercase()),
                    Style::default().fg(Color::Cyan),
                ))]
            } else {
                self.empty_lines(tab)
            };
            frame.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                inner,
            );
            return;
        }

        self.render_cards(frame, inner, cards, self.list(tab).selected);
    }

    fn card_lines<E: Entity>(
        &self,
        items: &[E],
        list: &ListScreen,
        build: fn(&E, bool) -> Vec<Line<'static>>,
    ) -> Vec<Vec<Line<'static>>> {
        list.visible(items)
            .into_iter()
            .enumerate()
            .map(|(idx, record)| build(record, idx == list.selected))
            .collect()
    }

    fn empty_lines(&self, tab: EntityKind) -> Vec<Line<'static>> {
        let (heading, hint) = match tab {
            EntityKind::Events if self.events_list.filter.is_empty() => (
                "No expeditions recorded",
                "Check back later for new bird watching updates.",
            ),
            _ if !self.list(tab).filter.is_empty() => (
                "No results found",
                "Try adjusting your filters or search terms.",
            ),
            _ => ("No birds registered yet", "Press + to register the first one."),
        };
        vec![
            Line::from(Span::styled(
                heading,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
        ]
    }

    fn render_cards(
        &self,
        frame: &mut Frame,
        area: Rect,
        cards: Vec<Vec<Line<'static>>>,
        selected: usize,
    ) {
        if cards.is_empty() || area.height == 0 {
            return;
        }

        let card_height = CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = cards.len();
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);
        let visible_len = end.saturating_sub(start);
        if visible_len == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..visible_len)
            .map(|_| Constraint::Length(CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (chunk, (index, lines)) in rows
            .iter()
            .zip(cards.into_iter().enumerate().skip(start).take(visible_len))
        {
            if chunk.height == 0 {
                continue;
            }

            let mut block = Block::default().borders(Borders::ALL);
            let mut paragraph_style = Style::default();
            if index == selected {
                block = block.style(Style::default().fg(Color::Yellow));
                paragraph_style = Style::default().fg(Color::Yellow);
            }

            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Left)
                .style(paragraph_style);

            frame.render_widget(paragraph, *chunk);
        }
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

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::Bird(_) => Line::from(vec![
                Span::styled("[Tab/↑↓]", key_style),
                Span::raw(" Field   "),
                Span::styled("[←→]", key_style),
                Span::raw(" Status   "),
                Span::styled("[Space]", key_style),
                Span::raw(" Featured   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::Event(_) => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Accept / Next   "),
                Span::styled("[↑↓]", key_style),
                Span::raw(" Field   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::Searching(_) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Keep Filter   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Clear"),
            ]),
            Mode::ConfirmDelete(_) => Line::from(vec![
                Span::styled("[y]", key_style),
                Span::raw(" Remove   "),
                Span::styled("[n/Esc]", key_style),
                Span::raw(" Keep"),
            ]),
            Mode::Normal | Mode::Login(_) => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Switch   "),
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[f]", key_style),
                Span::raw(" Filter   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add   "),
                Span::styled("[e]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[-]", key_style),
                Span::raw(" Remove   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Image   "),
                Span::styled("[r]", key_style),
                Span::raw(" Refresh   "),
                Span::styled("[L]", key_style),
                Span::raw(" Logout   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_login(&self, frame: &mut Frame, area: Rect, form: &LoginForm) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Avian Journal Admin")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let prefix = "Password: ";
        let mut lines = vec![
            Line::from(vec![Span::raw(prefix), Span::raw(form.masked())]),
            Line::from(""),
        ];
        match &form.error {
            Some(error) => lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            ))),
            None => lines.push(Line::from(Span::styled(
                "Enter to sign in • Esc to quit",
                Style::default().fg(Color::Gray),
            ))),
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        let cursor_x = inner.x + prefix.len() as u16 + form.password.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_form(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        mut lines: Vec<Line<'static>>,
        (cursor_column, cursor_row): (usize, usize),
    ) {
        let popup_area = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        lines.push(Line::from(""));
        match self.state.banner() {
            Some(banner) => lines.push(Line::from(Span::styled(
                banner.message.clone(),
                banner_style(banner.kind),
            ))),
            None => lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            ))),
        }

        frame.render_widget(Paragraph::new(lines), inner);

        if !self.state.workflow().is_locked() {
            let cursor_x = inner.x + cursor_column as u16;
            let cursor_y = inner.y + cursor_row as u16;
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let question = match confirm.kind {
            EntityKind::Birds => "Are you sure you want to remove this bird record?",
            EntityKind::Events => "Are you sure you want to remove this event record?",
        };
        let lines = vec![
            Line::from(question),
            Line::from(Span::styled(
                confirm.label.clone(),
                Style::default().add_modifier(Modifier::BOLD),
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
