use std::cell::Cell;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use prompthub_core::catalog::Catalog;
use prompthub_core::filter::{tag_options, PromptFilter, TagFilter};
use prompthub_core::prompt::Prompt;
use prompthub_core::selection::Selection;
use prompthub_service::submission::SUBMITTED_MESSAGE;
use prompthub_service::{BlockingHttpService, PollConfig, PromptStore};
use ratatui::layout::Position;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use tracing::{error, info, warn};
use url::Url;

use crate::clipboard::Clipboard;
use crate::components::prompt_list::PromptList;
use crate::components::request_form::{FormAction, RequestForm};

/// How long a copy acknowledgement stays visible.
pub const FLASH_DURATION: Duration = Duration::from_secs(2);

/// What the app is currently doing
#[derive(Debug, Clone)]
pub enum Mode {
    /// Browsing the prompt list
    Browse,
    /// Typing into the search box. `previous` is restored on Esc.
    Search { previous: String },
    /// Choosing a tag to filter by
    TagPick { list_state: ListState },
    /// Detail overlay for the selected prompt
    Detail { scroll: u16 },
    /// Filling in a prompt request
    RequestForm { form: RequestForm },
}

/// Which copy action was acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyAck {
    Prompt,
    Link,
}

impl CopyAck {
    pub fn label(&self) -> &'static str {
        match self {
            CopyAck::Prompt => "Copied!",
            CopyAck::Link => "Link copied!",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub poll: PollConfig,
    /// Location the session starts at. An `id` in it opens that prompt once
    /// it is loaded.
    pub start_location: Url,
}

pub struct App {
    // Declared before `service` so the poll loop stops before the runtime
    // it runs on goes away.
    store: PromptStore,
    service: BlockingHttpService,
    updates: Receiver<Arc<Catalog>>,
    catalog: Arc<Catalog>,
    tag_options: Vec<TagFilter>,
    filter: PromptFilter,
    list: PromptList,
    selection: Selection,
    mode: Mode,
    status_message: Option<String>,
    copy_ack: Option<(CopyAck, Instant)>,
    clipboard: Box<dyn Clipboard>,
    /// Where the detail overlay was last drawn, for backdrop clicks.
    overlay_area: Cell<Rect>,
    quit: bool,
}

impl App {
    /// Load the catalog once, then start polling.
    pub fn new(
        service: BlockingHttpService,
        settings: AppSettings,
        clipboard: Box<dyn Clipboard>,
    ) -> Self {
        let mut store = service.store();
        let (tx, updates) = mpsc::channel();
        store.subscribe(move |catalog| {
            let _ = tx.send(catalog.clone());
        });

        // A failed first fetch is already logged; the list stays empty until
        // a poll succeeds.
        let _ = service.block_on(store.refresh());
        store.start(service.handle(), settings.poll);

        let mut app = Self {
            store,
            service,
            updates,
            catalog: Arc::new(Catalog::default()),
            tag_options: vec![TagFilter::All],
            filter: PromptFilter::default(),
            list: PromptList::new(Vec::new()),
            selection: Selection::new(settings.start_location),
            mode: Mode::Browse,
            status_message: None,
            copy_ack: None,
            clipboard,
            overlay_area: Cell::new(Rect::default()),
            quit: false,
        };
        app.pump_updates();
        app
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn filter(&self) -> &PromptFilter {
        &self.filter
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn tag_options(&self) -> &[TagFilter] {
        &self.tag_options
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn location(&self) -> &Url {
        self.selection.location()
    }

    pub fn store(&self) -> &PromptStore {
        &self.store
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn copy_ack(&self) -> Option<CopyAck> {
        self.copy_ack.map(|(ack, _)| ack)
    }

    /// Ids of the visible cards, in display order.
    pub fn visible_ids(&self) -> Vec<&str> {
        self.list.prompts().iter().map(|p| p.id.as_str()).collect()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn is_input_mode(&self) -> bool {
        matches!(self.mode, Mode::Search { .. } | Mode::RequestForm { .. })
    }

    /// Apply the newest catalog the poller has delivered, if any.
    pub fn pump_updates(&mut self) {
        let mut latest = None;
        while let Ok(catalog) = self.updates.try_recv() {
            latest = Some(catalog);
        }
        if let Some(catalog) = latest {
            self.apply_catalog(catalog);
        }
    }

    fn apply_catalog(&mut self, catalog: Arc<Catalog>) {
        self.catalog = catalog;
        self.tag_options = tag_options(&self.catalog);
        if let Mode::TagPick { list_state } = &mut self.mode {
            let last = self.tag_options.len().saturating_sub(1);
            list_state.select(Some(list_state.selected().unwrap_or(0).min(last)));
        }
        self.rebuild_list();

        if let Err(e) = self.selection.sync(&self.catalog) {
            error!("{e}");
        }
        self.sync_mode();
    }

    fn rebuild_list(&mut self) {
        let rows: Vec<Prompt> = self
            .filter
            .apply(self.catalog.prompts())
            .into_iter()
            .cloned()
            .collect();
        self.list.set_prompts(rows);
    }

    /// Keep the detail mode in step with the overlay state.
    fn sync_mode(&mut self) {
        match self.selection.selected_id().map(str::to_string) {
            None => {
                if matches!(self.mode, Mode::Detail { .. }) {
                    self.mode = Mode::Browse;
                }
            }
            Some(id) => {
                if matches!(self.mode, Mode::Browse) {
                    self.list.select_by_id(&id);
                    self.mode = Mode::Detail { scroll: 0 };
                }
            }
        }
    }

    /// Called on every pass of the event loop.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        self.pump_updates();
        if let Some((_, at)) = self.copy_ack {
            if now.duration_since(at) >= FLASH_DURATION {
                self.copy_ack = None;
            }
        }
    }

    pub fn focus_lost(&mut self) {
        self.store.pause();
    }

    pub fn focus_gained(&mut self) {
        self.store.resume();
        self.store.spawn_refresh(self.service.handle());
    }

    /// Fetch right away and apply the result.
    pub fn refresh_now(&mut self) {
        match self.service.block_on(self.store.refresh()) {
            Ok(prompts) => {
                self.status_message = Some(format!("Loaded {} prompts", prompts.len()));
            }
            Err(e) => {
                self.status_message = Some(format!("Refresh failed: {}", e.0));
            }
        }
        self.pump_updates();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status_message = None;

        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Browse => self.handle_browse(key),
            Mode::Search { previous } => self.handle_search(key, previous),
            Mode::TagPick { list_state } => self.handle_tag_pick(key, list_state),
            Mode::Detail { scroll } => self.handle_detail(key, scroll),
            Mode::RequestForm { form } => self.handle_request_form(key, form),
        }
        self.sync_mode();
    }

    fn handle_browse(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::ALT) {
            match key.code {
                KeyCode::Left => self.history_back(),
                KeyCode::Right => self.history_forward(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('/') => {
                self.mode = Mode::Search {
                    previous: self.filter.query.clone(),
                };
            }
            KeyCode::Char('t') => {
                let idx = self
                    .tag_options
                    .iter()
                    .position(|t| *t == self.filter.tag)
                    .unwrap_or(0);
                let mut list_state = ListState::default();
                list_state.select(Some(idx));
                self.mode = Mode::TagPick { list_state };
            }
            KeyCode::Char('n') => {
                self.mode = Mode::RequestForm {
                    form: RequestForm::new(),
                };
            }
            KeyCode::Char('r') => self.refresh_now(),
            KeyCode::Char('[') => self.history_back(),
            KeyCode::Char(']') => self.history_forward(),
            KeyCode::Enter => {
                if let Some(id) = self.list.selected().map(|p| p.id.clone()) {
                    self.open_prompt(&id);
                }
            }
            KeyCode::Esc => {
                self.filter = PromptFilter::default();
                self.rebuild_list();
            }
            _ => self.list.handle_key(key),
        }
    }

    fn handle_search(&mut self, key: KeyEvent, previous: String) {
        match key.code {
            KeyCode::Enter => {}
            KeyCode::Esc => {
                self.filter.query = previous;
                self.rebuild_list();
            }
            KeyCode::Backspace => {
                self.filter.query.pop();
                self.rebuild_list();
                self.mode = Mode::Search { previous };
            }
            KeyCode::Down | KeyCode::Up => {
                self.list.handle_key(key);
                self.mode = Mode::Search { previous };
            }
            KeyCode::Char(c) => {
                self.filter.query.push(c);
                self.rebuild_list();
                self.mode = Mode::Search { previous };
            }
            _ => self.mode = Mode::Search { previous },
        }
    }

    fn handle_tag_pick(&mut self, key: KeyEvent, mut list_state: ListState) {
        let last = self.tag_options.len().saturating_sub(1);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let i = list_state.selected().unwrap_or(0);
                list_state.select(Some((i + 1).min(last)));
                self.mode = Mode::TagPick { list_state };
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let i = list_state.selected().unwrap_or(0);
                list_state.select(Some(i.saturating_sub(1)));
                self.mode = Mode::TagPick { list_state };
            }
            KeyCode::Enter => {
                let idx = list_state.selected().unwrap_or(0);
                if let Some(tag) = self.tag_options.get(idx) {
                    self.filter.tag = tag.clone();
                    self.rebuild_list();
                }
            }
            KeyCode::Esc => {}
            _ => self.mode = Mode::TagPick { list_state },
        }
    }

    fn handle_detail(&mut self, key: KeyEvent, scroll: u16) {
        if key.modifiers.contains(KeyModifiers::ALT) {
            match key.code {
                KeyCode::Left => self.history_back(),
                KeyCode::Right => self.history_forward(),
                _ => self.mode = Mode::Detail { scroll },
            }
            return;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('x') => self.close_overlay(),
            KeyCode::Char('[') => self.history_back(),
            KeyCode::Char(']') => self.history_forward(),
            KeyCode::Char('c') => {
                self.copy_prompt_text();
                self.mode = Mode::Detail { scroll };
            }
            KeyCode::Char('l') => {
                self.copy_link();
                self.mode = Mode::Detail { scroll };
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.mode = Mode::Detail {
                    scroll: scroll.saturating_add(1),
                };
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.mode = Mode::Detail {
                    scroll: scroll.saturating_sub(1),
                };
            }
            _ => self.mode = Mode::Detail { scroll },
        }
    }

    fn handle_request_form(&mut self, key: KeyEvent, mut form: RequestForm) {
        match form.handle_key(key) {
            FormAction::Cancel => {}
            FormAction::Submit => self.submit_form(form),
            FormAction::None => self.mode = Mode::RequestForm { form },
        }
    }

    /// Validate and send the form. It closes on success and stays open with
    /// its contents and an inline message otherwise.
    fn submit_form(&mut self, mut form: RequestForm) {
        match self.service.submit(&self.catalog, &form.draft) {
            Ok(()) => {
                self.status_message = Some(SUBMITTED_MESSAGE.to_string());
            }
            Err(e) => {
                form.set_error(e.user_message());
                self.mode = Mode::RequestForm { form };
            }
        }
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => self.handle_click(event.column, event.row),
            MouseEventKind::ScrollDown => self.scroll_by(1),
            MouseEventKind::ScrollUp => self.scroll_by(-1),
            _ => {}
        }
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        match self.mode {
            Mode::Browse => {
                if let Some(id) = self.list.prompt_at(column, row).map(|p| p.id.clone()) {
                    self.open_prompt(&id);
                }
            }
            // Clicking the backdrop closes the overlay.
            Mode::Detail { .. } => {
                if !self.overlay_area.get().contains(Position::new(column, row)) {
                    self.close_overlay();
                }
            }
            _ => {}
        }
    }

    fn scroll_by(&mut self, delta: i16) {
        match &mut self.mode {
            Mode::Browse => self.list.move_by(delta as isize),
            Mode::Detail { scroll } => {
                *scroll = scroll.saturating_add_signed(delta);
            }
            _ => {}
        }
    }

    fn open_prompt(&mut self, id: &str) {
        self.selection.open(id);
        self.list.select_by_id(id);
        self.mode = Mode::Detail { scroll: 0 };
    }

    fn close_overlay(&mut self) {
        self.selection.close();
        self.mode = Mode::Browse;
    }

    // The caller re-derives the mode from the overlay afterwards.
    fn history_back(&mut self) {
        if let Err(e) = self.selection.back(&self.catalog) {
            error!("{e}");
        }
    }

    fn history_forward(&mut self) {
        if let Err(e) = self.selection.forward(&self.catalog) {
            error!("{e}");
        }
    }

    fn open_prompt_data(&self) -> Option<&Prompt> {
        self.selection
            .selected_id()
            .and_then(|id| self.catalog.get(id))
    }

    pub fn copy_prompt_text(&mut self) {
        let Some(text) = self.open_prompt_data().map(|p| p.text.clone()) else {
            return;
        };
        self.copy(&text, CopyAck::Prompt);
    }

    pub fn copy_link(&mut self) {
        let Some(id) = self.selection.selected_id() else {
            return;
        };
        let link = self.selection.link_for(id);
        self.copy(link.as_str(), CopyAck::Link);
    }

    fn copy(&mut self, text: &str, ack: CopyAck) {
        match self.clipboard.set_text(text) {
            Ok(()) => {
                info!(?ack, "copied to clipboard");
                self.copy_ack = Some((ack, Instant::now()));
            }
            Err(e) => {
                warn!("clipboard write failed: {e:#}");
                self.status_message = Some(format!("Copy failed: {e}"));
            }
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_title_bar(frame, layout[0]);
        self.render_filter_bar(frame, layout[1]);
        self.list.render(frame, layout[2], "Prompts");
        self.render_status_bar(frame, layout[3]);

        // Overlays
        match &self.mode {
            Mode::Browse | Mode::Search { .. } => {}
            Mode::TagPick { list_state } => self.render_tag_pick(frame, list_state, area),
            Mode::Detail { scroll } => self.render_detail(frame, *scroll, area),
            Mode::RequestForm { form } => form.render(frame, centered_rect(70, 90, area)),
        }
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let title = Line::from(vec![
            Span::styled(" prompthub ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("| "),
            Span::styled(
                format!("{} prompts", self.catalog.len()),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(" | "),
            Span::styled(
                self.selection.location().as_str(),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(title, area);
    }

    fn render_filter_bar(&self, frame: &mut Frame, area: Rect) {
        let searching = matches!(self.mode, Mode::Search { .. });
        let label_style = if searching {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().bold()
        };
        let mut spans = vec![
            Span::styled(" Search: ", label_style),
            Span::raw(self.filter.query.as_str()),
        ];
        if searching {
            spans.push(Span::styled("_", Style::default().fg(Color::Cyan)));
        }
        spans.push(Span::raw("   "));
        spans.push(Span::styled("Tag: ", Style::default().bold()));
        spans.push(Span::styled(
            self.filter.tag.to_string(),
            Style::default().fg(Color::Magenta),
        ));
        frame.render_widget(Line::from(spans), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some(ref msg) = self.status_message {
            let line = Line::from(Span::styled(
                format!(" {msg}"),
                Style::default().fg(Color::Green),
            ));
            frame.render_widget(line, area);
            return;
        }

        let hints = match &self.mode {
            Mode::Browse => vec![
                ("q", "quit"),
                ("j/k", "nav"),
                ("Enter", "open"),
                ("/", "search"),
                ("t", "tag"),
                ("Esc", "clear"),
                ("n", "request"),
                ("r", "refresh"),
                ("[/]", "back/fwd"),
            ],
            Mode::Search { .. } => vec![("Enter", "done"), ("Esc", "cancel")],
            Mode::TagPick { .. } => vec![("j/k", "nav"), ("Enter", "select"), ("Esc", "back")],
            Mode::Detail { .. } => vec![
                ("c", "copy prompt"),
                ("l", "copy link"),
                ("j/k", "scroll"),
                ("[/]", "back/fwd"),
                ("Esc", "close"),
            ],
            Mode::RequestForm { .. } => vec![
                ("Tab", "next field"),
                ("Ctrl+S", "submit"),
                ("Esc", "cancel"),
            ],
        };

        let mut spans: Vec<Span> = hints
            .into_iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(
                        format!(" {key}"),
                        Style::default().fg(Color::Yellow).bold(),
                    ),
                    Span::raw(format!(" {desc} ")),
                ]
            })
            .collect();
        if let Some(ack) = self.copy_ack() {
            spans.push(Span::styled(
                format!(" {}", ack.label()),
                Style::default().fg(Color::Green).bold(),
            ));
        }

        frame.render_widget(Line::from(spans), area);
    }

    fn render_tag_pick(&self, frame: &mut Frame, list_state: &ListState, area: Rect) {
        let popup = centered_rect(40, 50, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Filter by Tag ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta));

        let items: Vec<ListItem> = self
            .tag_options
            .iter()
            .map(|tag| {
                let marker = if *tag == self.filter.tag { "* " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Cyan)),
                    Span::raw(tag.to_string()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Magenta)
                    .bold(),
            )
            .highlight_symbol("> ");

        let mut state = list_state.clone();
        frame.render_stateful_widget(list, popup, &mut state);
    }

    fn render_detail(&self, frame: &mut Frame, scroll: u16, area: Rect) {
        let popup = centered_rect(70, 80, area);
        self.overlay_area.set(popup);
        frame.render_widget(Clear, popup);

        let Some(prompt) = self.open_prompt_data() else {
            return;
        };

        let mut title = format!(" {} ", prompt.name);
        if let Some(ack) = self.copy_ack() {
            title.push_str(&format!("[{}] ", ack.label()));
        }
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let mut lines = Vec::new();
        if !prompt.authors.is_empty() || !prompt.institution.is_empty() {
            let mut byline = prompt.authors.join(", ");
            if !prompt.institution.is_empty() {
                if !byline.is_empty() {
                    byline.push_str(", ");
                }
                byline.push_str(&prompt.institution);
            }
            lines.push(Line::from(vec![
                Span::styled("By: ", Style::default().bold()),
                Span::raw(byline),
            ]));
        }
        if !prompt.tags.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Tags: ", Style::default().bold()),
                Span::styled(prompt.tags.join(", "), Style::default().fg(Color::Magenta)),
            ]));
        }
        if !prompt.summary.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                prompt.summary.as_str(),
                Style::default().fg(Color::DarkGray),
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Prompt", Style::default().bold())));
        for line in prompt.text.lines() {
            lines.push(Line::from(Span::styled(line, Style::default().fg(Color::Yellow))));
        }

        if !prompt.description.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("How to use", Style::default().bold())));
            for line in prompt.description.lines() {
                lines.push(Line::from(line));
            }
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0));
        frame.render_widget(paragraph, popup);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
