use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use prompthub_core::request::{Institution, RequestDraft};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Which input of the request form has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Institution,
    Email,
    Tags,
    PromptName,
    PromptSummary,
    PromptText,
    Description,
}

impl FormField {
    pub const ALL: &[FormField] = &[
        FormField::Name,
        FormField::Institution,
        FormField::Email,
        FormField::Tags,
        FormField::PromptName,
        FormField::PromptSummary,
        FormField::PromptText,
        FormField::Description,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Name => "Your name",
            FormField::Institution => "Institution",
            FormField::Email => "Email",
            FormField::Tags => "Tags (comma separated)",
            FormField::PromptName => "Prompt title",
            FormField::PromptSummary => "Summary (optional)",
            FormField::PromptText => "Prompt text",
            FormField::Description => "Usage information",
        }
    }

    /// Fields where Enter inserts a newline instead of moving on.
    pub fn is_multiline(&self) -> bool {
        matches!(self, FormField::PromptText | FormField::Description)
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> FormField {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> FormField {
        let len = Self::ALL.len();
        Self::ALL[(self.position() + len - 1) % len]
    }
}

/// What the owner of the form should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    None,
    Submit,
    Cancel,
}

/// Modal form for requesting a new prompt.
#[derive(Debug, Clone)]
pub struct RequestForm {
    pub draft: RequestDraft,
    field: FormField,
    /// Inline message from the last failed submit.
    error: Option<String>,
}

impl Default for RequestForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestForm {
    pub fn new() -> Self {
        Self {
            draft: RequestDraft::default(),
            field: FormField::Name,
            error: None,
        }
    }

    pub fn field(&self) -> FormField {
        self.field
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        let draft = &mut self.draft;
        match field {
            FormField::Name => Some(&mut draft.name),
            FormField::Institution => None,
            FormField::Email => Some(&mut draft.email),
            FormField::Tags => Some(&mut draft.tags),
            FormField::PromptName => Some(&mut draft.prompt_name),
            FormField::PromptSummary => Some(&mut draft.prompt_summary),
            FormField::PromptText => Some(&mut draft.prompt_text),
            FormField::Description => Some(&mut draft.description),
        }
    }

    fn value(&self, field: FormField) -> &str {
        let draft = &self.draft;
        match field {
            FormField::Name => &draft.name,
            FormField::Institution => draft
                .institution
                .map(|i| i.display_name())
                .unwrap_or("Select an institution"),
            FormField::Email => &draft.email,
            FormField::Tags => &draft.tags,
            FormField::PromptName => &draft.prompt_name,
            FormField::PromptSummary => &draft.prompt_summary,
            FormField::PromptText => &draft.prompt_text,
            FormField::Description => &draft.description,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('s') => FormAction::Submit,
                _ => FormAction::None,
            };
        }

        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Tab | KeyCode::Down => self.field = self.field.next(),
            KeyCode::BackTab | KeyCode::Up => self.field = self.field.prev(),
            KeyCode::Enter => {
                if self.field.is_multiline() {
                    if let Some(text) = self.text_mut(self.field) {
                        text.push('\n');
                    }
                } else {
                    self.field = self.field.next();
                }
            }
            KeyCode::Left if self.field == FormField::Institution => {
                self.draft.institution = Some(Institution::prev(self.draft.institution));
            }
            KeyCode::Right | KeyCode::Char(' ') if self.field == FormField::Institution => {
                self.draft.institution = Some(Institution::next(self.draft.institution));
            }
            KeyCode::Backspace => {
                if let Some(text) = self.text_mut(self.field) {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = self.text_mut(self.field) {
                    text.push(c);
                }
            }
            _ => {}
        }
        FormAction::None
    }

    /// Draw the form into `area`, which the caller has already placed.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" Request a Prompt ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = Vec::new();
        for &field in FormField::ALL {
            let focused = field == self.field;
            let label_style = if focused {
                Style::default().fg(Color::Cyan).bold()
            } else {
                Style::default()
            };
            let value = self.value(field);
            let value_style = if field == FormField::Institution && self.draft.institution.is_none()
            {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };

            let mut value_lines = value.split('\n');
            let first = value_lines.next().unwrap_or("");
            let mut first_spans = vec![
                Span::styled(format!("{}: ", field.label()), label_style),
                Span::styled(first.to_string(), value_style),
            ];
            if field == FormField::Institution && focused {
                first_spans.push(Span::styled(
                    "  (←/→ to change)",
                    Style::default().fg(Color::DarkGray),
                ));
            }
            lines.push(Line::from(first_spans));
            for rest in value_lines {
                lines.push(Line::from(format!("  {rest}")));
            }
        }

        lines.push(Line::from(""));
        if let Some(ref err) = self.error {
            lines.push(Line::from(Span::styled(
                err.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        lines.push(Line::from(Span::styled(
            "Tab/Shift-Tab:field  Ctrl-S:submit  Esc:cancel",
            Style::default().fg(Color::DarkGray),
        )));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(form: &mut RequestForm, s: &str) {
        for c in s.chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn tab_cycles_through_every_field() {
        let mut form = RequestForm::new();
        assert_eq!(form.field(), FormField::Name);
        for _ in 0..FormField::ALL.len() {
            form.handle_key(key(KeyCode::Tab));
        }
        assert_eq!(form.field(), FormField::Name);
        form.handle_key(key(KeyCode::BackTab));
        assert_eq!(form.field(), FormField::Description);
    }

    #[test]
    fn typing_fills_the_focused_field() {
        let mut form = RequestForm::new();
        type_str(&mut form, "Jane");
        form.handle_key(key(KeyCode::Backspace));
        form.handle_key(key(KeyCode::Enter));
        assert_eq!(form.field(), FormField::Institution);
        assert_eq!(form.draft.name, "Jan");
    }

    #[test]
    fn institution_cycles_and_ignores_text() {
        let mut form = RequestForm::new();
        form.handle_key(key(KeyCode::Tab));
        type_str(&mut form, "x");
        assert_eq!(form.draft.institution, None);

        form.handle_key(key(KeyCode::Right));
        assert_eq!(form.draft.institution, Some(Institution::UniversityOfChicago));
        form.handle_key(key(KeyCode::Left));
        form.handle_key(key(KeyCode::Left));
        assert_eq!(
            form.draft.institution,
            Some(Institution::UniversityOfPennsylvania)
        );
    }

    #[test]
    fn enter_adds_newline_in_prompt_text() {
        let mut form = RequestForm::new();
        while form.field() != FormField::PromptText {
            form.handle_key(key(KeyCode::Tab));
        }
        type_str(&mut form, "one");
        form.handle_key(key(KeyCode::Enter));
        type_str(&mut form, "two");
        assert_eq!(form.draft.prompt_text, "one\ntwo");
        assert_eq!(form.field(), FormField::PromptText);
    }

    #[test]
    fn ctrl_s_submits_and_esc_cancels() {
        let mut form = RequestForm::new();
        let submit = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(form.handle_key(submit), FormAction::Submit);
        assert!(form.draft.name.is_empty());
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormAction::Cancel);
    }

    #[test]
    fn error_is_rendered() {
        let mut form = RequestForm::new();
        form.set_error("email address is required");
        let backend = ratatui::backend::TestBackend::new(70, 24);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| form.render(frame, frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("email address is required"));
        assert!(text.contains("Request a Prompt"));
    }
}
