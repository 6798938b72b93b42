//! App behaviour driven through key and mouse events against the API stub.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use prompthub_core::filter::TagFilter;
use prompthub_core::selection::id_of;
use prompthub_service::submission::{FAILED_MESSAGE, SUBMITTED_MESSAGE};
use prompthub_service::test_helpers::{spawn_stub_api_thread, StubState};
use prompthub_service::{BlockingHttpService, PollConfig};
use prompthub_tui::app::{App, AppSettings, CopyAck, Mode};
use prompthub_tui::clipboard::Clipboard;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use serde_json::json;
use url::Url;

fn upstream() -> serde_json::Value {
    json!([
        {
            "ID": "2",
            "name": "Translate",
            "text": "Translate this",
            "description": "Any language pair",
            "tags": ["nlp, i18n"],
            "meta": { "author": ["Grace", "Alan"], "institution": "Cornell University" }
        },
        {
            "ID": "1",
            "name": "Summarize",
            "text": "Summarize this",
            "description": "For long readings",
            "summary": "Summaries",
            "tags": ["nlp"],
            "meta": { "author": "Ada Lovelace", "institution": "University of Chicago" }
        }
    ])
}

#[derive(Clone, Default)]
struct RecordingClipboard {
    writes: Arc<Mutex<Vec<String>>>,
}

impl Clipboard for RecordingClipboard {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.writes.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

struct BrokenClipboard;

impl Clipboard for BrokenClipboard {
    fn set_text(&mut self, _text: &str) -> anyhow::Result<()> {
        anyhow::bail!("no display")
    }
}

struct Harness {
    app: App,
    state: Arc<StubState>,
    clipboard: RecordingClipboard,
}

fn start_at(location: &str) -> Harness {
    start_with(upstream(), location)
}

fn start_with(prompts: serde_json::Value, location: &str) -> Harness {
    let (url, state) = spawn_stub_api_thread(prompts);
    let service = BlockingHttpService::new(&url).unwrap();
    let clipboard = RecordingClipboard::default();
    // Long interval: tests drive refreshes themselves.
    let settings = AppSettings {
        poll: PollConfig::from_millis(60_000, 60_000),
        start_location: Url::parse(location).unwrap(),
    };
    let app = App::new(service, settings, Box::new(clipboard.clone()));
    Harness {
        app,
        state,
        clipboard,
    }
}

fn start() -> Harness {
    start_at("http://localhost:3000/")
}

fn press(app: &mut App, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn type_str(app: &mut App, s: &str) {
    for c in s.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn click(app: &mut App, column: u16, row: u16) {
    app.handle_mouse(MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column,
        row,
        modifiers: KeyModifiers::NONE,
    });
}

fn draw(app: &App) {
    let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
    terminal.draw(|frame| app.render(frame)).unwrap();
}

fn open_id(app: &App) -> Option<String> {
    id_of(app.location())
}

#[test]
fn loads_catalog_sorted_by_name() {
    let h = start();
    assert_eq!(h.app.visible_ids(), vec!["1", "2"]);
    assert_eq!(
        h.app.tag_options(),
        &[
            TagFilter::All,
            TagFilter::Tag("i18n".into()),
            TagFilter::Tag("nlp".into()),
        ]
    );
    assert!(matches!(h.app.mode(), Mode::Browse));
}

#[test]
fn enter_opens_and_escape_closes() {
    let mut h = start();
    press(&mut h.app, KeyCode::Enter);
    assert!(matches!(h.app.mode(), Mode::Detail { .. }));
    assert_eq!(h.app.selection().selected_id(), Some("1"));
    assert_eq!(h.app.location().as_str(), "http://localhost:3000/?id=1");

    press(&mut h.app, KeyCode::Esc);
    assert!(matches!(h.app.mode(), Mode::Browse));
    assert_eq!(h.app.selection().selected_id(), None);
    assert_eq!(open_id(&h.app), None);
}

#[test]
fn history_reopens_and_closes() {
    let mut h = start();
    press(&mut h.app, KeyCode::Char('j'));
    press(&mut h.app, KeyCode::Enter);
    press(&mut h.app, KeyCode::Char('q'));
    assert!(!h.app.should_quit());

    press(&mut h.app, KeyCode::Char('['));
    assert_eq!(h.app.selection().selected_id(), Some("2"));
    assert!(matches!(h.app.mode(), Mode::Detail { .. }));

    press(&mut h.app, KeyCode::Char('['));
    assert_eq!(h.app.selection().selected_id(), None);
    assert!(matches!(h.app.mode(), Mode::Browse));

    h.app.handle_key(KeyEvent::new(KeyCode::Right, KeyModifiers::ALT));
    assert_eq!(h.app.selection().selected_id(), Some("2"));
}

#[test]
fn deep_link_opens_once_loaded() {
    let h = start_at("http://localhost:3000/?id=2");
    assert!(matches!(h.app.mode(), Mode::Detail { .. }));
    assert_eq!(h.app.selection().selected_id(), Some("2"));
}

#[test]
fn unknown_deep_link_stays_closed() {
    let h = start_at("http://localhost:3000/?id=99");
    assert!(matches!(h.app.mode(), Mode::Browse));
    assert_eq!(h.app.selection().selected_id(), None);
}

/// Collects formatted log lines written on the current thread.
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[test]
fn deep_link_against_empty_catalog_logs_lookup_error() {
    let logs = LogCapture::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let h = tracing::subscriber::with_default(subscriber, || {
        start_with(json!([]), "http://localhost:3000/?id=9")
    });

    assert_eq!(h.app.store().generation(), 1);
    assert!(h.app.catalog().is_empty());
    assert!(matches!(h.app.mode(), Mode::Browse));
    assert_eq!(h.app.selection().selected_id(), None);
    let logs = logs.contents();
    assert_eq!(
        logs.matches("prompt with id 9 not found").count(),
        1,
        "logs: {logs}"
    );
}

#[test]
fn search_narrows_and_escape_restores() {
    let mut h = start();
    press(&mut h.app, KeyCode::Char('/'));
    assert!(h.app.is_input_mode());
    type_str(&mut h.app, "SUM");
    assert_eq!(h.app.visible_ids(), vec!["1"]);

    press(&mut h.app, KeyCode::Esc);
    assert_eq!(h.app.filter().query, "");
    assert_eq!(h.app.visible_ids(), vec!["1", "2"]);

    press(&mut h.app, KeyCode::Char('/'));
    type_str(&mut h.app, "sum");
    press(&mut h.app, KeyCode::Enter);
    assert!(!h.app.is_input_mode());
    assert_eq!(h.app.filter().query, "sum");
    assert_eq!(h.app.visible_ids(), vec!["1"]);
}

#[test]
fn tag_picker_filters_and_escape_clears() {
    let mut h = start();
    press(&mut h.app, KeyCode::Char('t'));
    press(&mut h.app, KeyCode::Down);
    press(&mut h.app, KeyCode::Enter);
    assert_eq!(h.app.filter().tag, TagFilter::Tag("i18n".into()));
    assert_eq!(h.app.visible_ids(), vec!["2"]);

    press(&mut h.app, KeyCode::Esc);
    assert_eq!(h.app.filter().tag, TagFilter::All);
    assert_eq!(h.app.visible_ids(), vec!["1", "2"]);
}

#[test]
fn vanished_prompt_closes_overlay_on_refresh() {
    let mut h = start();
    press(&mut h.app, KeyCode::Enter);
    assert_eq!(h.app.selection().selected_id(), Some("1"));

    h.state.set_prompts(json!([
        { "ID": "2", "name": "Translate", "tags": ["i18n"], "meta": { "author": "Grace", "institution": "" } }
    ]));
    h.app.refresh_now();

    assert!(matches!(h.app.mode(), Mode::Browse));
    assert_eq!(open_id(&h.app), None);
    assert_eq!(h.app.visible_ids(), vec!["2"]);
    assert_eq!(
        h.app.tag_options(),
        &[TagFilter::All, TagFilter::Tag("i18n".into())]
    );
}

#[test]
fn failed_refresh_keeps_catalog() {
    let mut h = start();
    h.state.set_fail_list(true);
    h.app.refresh_now();
    assert_eq!(h.app.visible_ids(), vec!["1", "2"]);
    assert!(h.app.status_message().unwrap().contains("database unavailable"));
}

#[test]
fn copy_actions_acknowledge_and_expire() {
    let mut h = start();
    press(&mut h.app, KeyCode::Enter);

    press(&mut h.app, KeyCode::Char('c'));
    assert_eq!(h.app.copy_ack(), Some(CopyAck::Prompt));
    press(&mut h.app, KeyCode::Char('l'));
    assert_eq!(h.app.copy_ack(), Some(CopyAck::Link));
    assert_eq!(
        *h.clipboard.writes.lock().unwrap(),
        vec![
            "Summarize this".to_string(),
            "http://localhost:3000/?id=1".to_string()
        ]
    );

    h.app.tick_at(Instant::now());
    assert_eq!(h.app.copy_ack(), Some(CopyAck::Link));
    h.app.tick_at(Instant::now() + Duration::from_secs(3));
    assert_eq!(h.app.copy_ack(), None);
    assert!(matches!(h.app.mode(), Mode::Detail { .. }));
}

#[test]
fn clipboard_failure_is_reported() {
    let (url, _state) = spawn_stub_api_thread(upstream());
    let service = BlockingHttpService::new(&url).unwrap();
    let settings = AppSettings {
        poll: PollConfig::from_millis(60_000, 60_000),
        start_location: Url::parse("http://localhost:3000/?id=1").unwrap(),
    };
    let mut app = App::new(service, settings, Box::new(BrokenClipboard));

    press(&mut app, KeyCode::Char('c'));
    assert_eq!(app.copy_ack(), None);
    assert!(app.status_message().unwrap().starts_with("Copy failed"));
}

#[test]
fn mouse_opens_card_and_backdrop_closes() {
    let mut h = start();
    draw(&h.app);
    // Title and filter bars take two rows, then the list border.
    click(&mut h.app, 5, 6);
    assert_eq!(h.app.selection().selected_id(), Some("2"));

    draw(&h.app);
    click(&mut h.app, 40, 15);
    assert!(h.app.selection().is_open());
    click(&mut h.app, 0, 0);
    assert!(!h.app.selection().is_open());
    assert_eq!(open_id(&h.app), None);
}

fn fill_form(app: &mut App, title: &str) {
    press(app, KeyCode::Char('n'));
    assert!(matches!(app.mode(), Mode::RequestForm { .. }));
    type_str(app, "Jane Doe");
    press(app, KeyCode::Tab);
    press(app, KeyCode::Right);
    press(app, KeyCode::Tab);
    type_str(app, "jane@uchicago.edu");
    press(app, KeyCode::Tab);
    type_str(app, "writing, feedback");
    press(app, KeyCode::Tab);
    type_str(app, title);
    press(app, KeyCode::Tab);
    press(app, KeyCode::Tab);
    type_str(app, "Give feedback");
    press(app, KeyCode::Tab);
    type_str(app, "Paste the essay");
}

fn submit(app: &mut App) {
    app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
}

#[test]
fn duplicate_title_keeps_form_open_without_request() {
    let mut h = start();
    fill_form(&mut h.app, "  summarize ");
    submit(&mut h.app);

    match h.app.mode() {
        Mode::RequestForm { form } => {
            assert!(form.error().unwrap().contains("already exists"));
            assert_eq!(form.draft.email, "jane@uchicago.edu");
        }
        other => panic!("form closed: {other:?}"),
    }
    assert!(h.state.requests().is_empty());
}

#[test]
fn successful_submit_closes_form() {
    let mut h = start();
    fill_form(&mut h.app, "Essay feedback");
    submit(&mut h.app);

    assert!(matches!(h.app.mode(), Mode::Browse));
    assert_eq!(h.app.status_message(), Some(SUBMITTED_MESSAGE));
    let requests = h.state.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["institution"], "University of Chicago");
    assert_eq!(requests[0]["promptName"], "Essay feedback");
    assert!(requests[0].get("promptSummary").is_none());
    // Submitting never touches the local catalog.
    assert_eq!(h.app.catalog().len(), 2);
}

#[test]
fn rejected_submit_shows_generic_notice() {
    let mut h = start();
    h.state.set_reject_requests(true);
    fill_form(&mut h.app, "Essay feedback");
    submit(&mut h.app);

    match h.app.mode() {
        Mode::RequestForm { form } => assert_eq!(form.error(), Some(FAILED_MESSAGE)),
        other => panic!("form closed: {other:?}"),
    }
    assert_eq!(h.state.requests().len(), 1);
}

#[test]
fn focus_pauses_and_resumes_polling() {
    let mut h = start();
    assert!(h.app.store().is_running());
    h.app.focus_lost();
    assert!(h.app.store().is_paused());
    h.app.focus_gained();
    assert!(!h.app.store().is_paused());
}
