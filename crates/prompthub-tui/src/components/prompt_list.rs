use std::cell::Cell;

use crossterm::event::{KeyCode, KeyEvent};
use prompthub_core::prompt::Prompt;
use ratatui::layout::Position;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Every card renders as exactly this many lines, which lets mouse clicks be
/// mapped back to rows.
const CARD_HEIGHT: u16 = 3;

/// The filtered prompts as a scrollable list of cards.
pub struct PromptList {
    prompts: Vec<Prompt>,
    list_state: ListState,
    /// Where the list was last drawn and the scroll offset it used.
    last_area: Cell<Rect>,
    last_offset: Cell<usize>,
}

impl PromptList {
    pub fn new(prompts: Vec<Prompt>) -> Self {
        let mut list_state = ListState::default();
        if !prompts.is_empty() {
            list_state.select(Some(0));
        }
        Self {
            prompts,
            list_state,
            last_area: Cell::new(Rect::default()),
            last_offset: Cell::new(0),
        }
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    /// Replace the rows, keeping the highlight on the same prompt id when it
    /// is still present.
    pub fn set_prompts(&mut self, prompts: Vec<Prompt>) {
        let selected_id = self.selected().map(|p| p.id.clone());
        let previous_idx = self.list_state.selected().unwrap_or(0);
        self.prompts = prompts;

        if let Some(id) = selected_id {
            if self.select_by_id(&id) {
                return;
            }
        }
        if self.prompts.is_empty() {
            self.list_state.select(None);
        } else {
            self.list_state
                .select(Some(previous_idx.min(self.prompts.len() - 1)));
        }
    }

    /// Returns the currently highlighted prompt, if any.
    pub fn selected(&self) -> Option<&Prompt> {
        let idx = self.list_state.selected()?;
        self.prompts.get(idx)
    }

    /// Highlight the prompt with the given id.
    /// Returns `false` and leaves the cursor alone if it is not listed.
    pub fn select_by_id(&mut self, id: &str) -> bool {
        match self.prompts.iter().position(|p| p.id == id) {
            Some(idx) => {
                self.list_state.select(Some(idx));
                true
            }
            None => false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_by(-1),
            KeyCode::PageDown => self.move_by(5),
            KeyCode::PageUp => self.move_by(-5),
            // Jump to first/last
            KeyCode::Char('g') | KeyCode::Home => {
                if !self.prompts.is_empty() {
                    self.list_state.select(Some(0));
                }
            }
            KeyCode::Char('G') | KeyCode::End => {
                if !self.prompts.is_empty() {
                    self.list_state.select(Some(self.prompts.len() - 1));
                }
            }
            _ => {}
        }
    }

    pub fn move_by(&mut self, delta: isize) {
        if self.prompts.is_empty() {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let last = self.prompts.len() as isize - 1;
        let next = (current + delta).clamp(0, last);
        self.list_state.select(Some(next as usize));
    }

    /// The prompt drawn at terminal cell (`column`, `row`) in the last frame.
    pub fn prompt_at(&self, column: u16, row: u16) -> Option<&Prompt> {
        let area = self.last_area.get();
        let inner = Rect {
            x: area.x + 1,
            y: area.y + 1,
            width: area.width.saturating_sub(2),
            height: area.height.saturating_sub(2),
        };
        if !inner.contains(Position::new(column, row)) {
            return None;
        }
        let idx = self.last_offset.get() + ((row - inner.y) / CARD_HEIGHT) as usize;
        self.prompts.get(idx)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, title: &str) {
        let block = Block::default()
            .title(format!(" {title} ({}) ", self.prompts.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        if self.prompts.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                "No prompts match the current search.",
                Style::default().fg(Color::DarkGray),
            )))
            .block(block);
            frame.render_widget(empty, area);
            self.last_area.set(area);
            self.last_offset.set(0);
            return;
        }

        let width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = self
            .prompts
            .iter()
            .map(|prompt| ListItem::new(card_lines(prompt, width)))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Black).bg(Color::Green))
            .highlight_symbol("> ");

        let mut state = self.list_state.clone();
        frame.render_stateful_widget(list, area, &mut state);
        self.last_area.set(area);
        self.last_offset.set(state.offset());
    }
}

fn card_lines(prompt: &Prompt, width: usize) -> Vec<Line<'_>> {
    let summary = prompt.summary.lines().next().unwrap_or("");
    let summary: String = summary.chars().take(width).collect();

    let mut tag_spans = Vec::new();
    for tag in &prompt.tags {
        tag_spans.push(Span::styled(
            format!(" {tag} "),
            Style::default().fg(Color::Black).bg(Color::Gray),
        ));
        tag_spans.push(Span::raw(" "));
    }

    vec![
        Line::from(Span::styled(&prompt.name, Style::default().bold())),
        Line::from(Span::styled(summary, Style::default().fg(Color::DarkGray))),
        Line::from(tag_spans),
    ]
}
