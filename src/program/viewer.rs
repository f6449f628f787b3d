//! Full-screen session viewer.
//!
//! A deliberately small terminal program: a header with the session context,
//! a scrollable log of server events and automation requests, a status line,
//! and the draft prompt (seeded from the command line and piped input,
//! editable through control requests).
//!
//! All state transitions live in [`ViewState`] so they can be tested without a
//! terminal; [`Viewer`] only does I/O.

use super::{ExitReason, ProgramHandle, RunSummary, TerminalProgram};
use crate::api::{ControlRequest, Event};
use crate::clipboard::{self, ClipboardState};
use crate::delivery::{self, DeliveryReceiver, Message};
use crate::error::ProgramError;
use crate::shutdown::CleanupLatch;
use crate::types::{LaunchOptions, Snapshot};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, QueueableCommand};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Oldest log lines are dropped past this many.
const MAX_LOG_LINES: usize = 500;
/// Event payload previews are cut at this many characters.
const MAX_DETAIL_CHARS: usize = 160;
/// Rows used by header, separators, status and prompt.
const CHROME_ROWS: usize = 6;
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const HELP_TEXT: &str = "q quit · ↑/↓ scroll · y copy last line";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Header,
    Rule,
    Normal,
    Warn,
    Error,
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub style: LineStyle,
    pub text: String,
}

/// Result of one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Ignored,
    Redraw,
    CopyLatest,
}

/// Everything the viewer shows, with no terminal attached.
#[derive(Debug, Clone)]
pub struct ViewState {
    snapshot: Arc<Snapshot>,
    agent: Option<String>,
    model: Option<String>,
    session_id: Option<String>,
    draft: String,
    log: VecDeque<LogLine>,
    /// Lines scrolled up from the bottom of the log.
    scroll: usize,
    status: String,
    exit: Option<ExitReason>,
    applied: usize,
}

impl ViewState {
    pub fn new(snapshot: Arc<Snapshot>, launch: LaunchOptions) -> Self {
        let agent = initial_agent(&snapshot, launch.agent.as_deref());
        Self {
            snapshot,
            agent,
            model: launch.model,
            session_id: launch.session_id,
            draft: launch.prompt.unwrap_or_default(),
            log: VecDeque::new(),
            scroll: 0,
            status: HELP_TEXT.to_string(),
            exit: None,
            applied: 0,
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn agent(&self) -> Option<&str> {
        self.agent.as_deref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn log(&self) -> impl Iterator<Item = &LogLine> {
        self.log.iter()
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit
    }

    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Apply one delivered message.
    pub fn apply(&mut self, message: Message) {
        self.applied += 1;
        match message {
            Message::Event(event) => self.apply_event(&event),
            Message::StreamFailed(reason) => {
                self.push(LineStyle::Error, format!("event stream closed: {reason}"));
                self.status = "disconnected from server; restart to reconnect".to_string();
            }
            Message::Control(request) => self.apply_control(&request),
            Message::Quit => {
                self.exit.get_or_insert(ExitReason::QuitRequested);
            }
        }
    }

    fn apply_event(&mut self, event: &Event) {
        let style = match event {
            Event::SessionError(_) => LineStyle::Error,
            Event::PermissionUpdated(_) => LineStyle::Warn,
            _ => LineStyle::Normal,
        };
        let detail = match event.properties() {
            serde_json::Value::Null => String::new(),
            props => truncate_chars(&props.to_string(), MAX_DETAIL_CHARS),
        };
        let text = if detail.is_empty() {
            event.kind().to_string()
        } else {
            format!("{} {detail}", event.kind())
        };
        self.push(style, text);
    }

    fn apply_control(&mut self, request: &ControlRequest) {
        let text_field = |key: &str| {
            request
                .body
                .get(key)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        match request.command() {
            "append-prompt" => self.draft.push_str(&text_field("text")),
            "clear-prompt" => self.draft.clear(),
            "show-toast" => self.status = text_field("message"),
            "open-help" => self.status = HELP_TEXT.to_string(),
            _ => {}
        }
        self.push(LineStyle::Normal, format!("control: {}", request.command()));
    }

    fn push(&mut self, style: LineStyle, text: String) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(LogLine { style, text });
    }

    /// Translate a key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => {
                self.exit.get_or_insert(ExitReason::UserQuit);
                KeyAction::Redraw
            }
            KeyCode::Char('q') => {
                self.exit.get_or_insert(ExitReason::UserQuit);
                KeyAction::Redraw
            }
            KeyCode::Char('y') => KeyAction::CopyLatest,
            KeyCode::Up => self.scroll_by(1),
            KeyCode::Down => self.scroll_by(-1),
            KeyCode::PageUp => self.scroll_by(10),
            KeyCode::PageDown => self.scroll_by(-10),
            _ => KeyAction::Ignored,
        }
    }

    fn scroll_by(&mut self, delta: isize) -> KeyAction {
        let max = self.log.len().saturating_sub(1);
        let next = self.scroll.saturating_add_signed(delta).min(max);
        if next == self.scroll {
            return KeyAction::Ignored;
        }
        self.scroll = next;
        KeyAction::Redraw
    }

    /// Text copied by the copy key: the newest log line.
    pub fn latest_line(&self) -> Option<&str> {
        self.log.back().map(|line| line.text.as_str())
    }

    /// Lay the screen out for a `width` x `height` terminal.
    pub fn render(&self, width: u16, height: u16) -> Vec<LogLine> {
        let width = usize::from(width).max(1);
        let height = usize::from(height);
        let clip = |text: String| truncate_chars(&text, width);
        let line = |style, text: String| LogLine {
            style,
            text: clip(text),
        };

        let app = &self.snapshot.app_info;
        let mut lines = vec![
            line(
                LineStyle::Header,
                format!("ken8n {} · {} · {}", self.snapshot.version, app.hostname, app.path.cwd),
            ),
            line(LineStyle::Header, self.context_line()),
            line(LineStyle::Rule, "─".repeat(width)),
        ];

        let body_rows = height.saturating_sub(CHROME_ROWS);
        let end = self.log.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(body_rows);
        lines.extend(
            self.log
                .range(start..end)
                .map(|entry| line(entry.style, entry.text.clone())),
        );
        while lines.len() < 3 + body_rows {
            lines.push(line(LineStyle::Normal, String::new()));
        }

        lines.push(line(LineStyle::Rule, "─".repeat(width)));
        lines.push(line(LineStyle::Normal, self.status.clone()));
        lines.push(line(LineStyle::Prompt, format!("> {}", self.draft.replace('\n', " ⏎ "))));
        lines
    }

    fn context_line(&self) -> String {
        let agents: Vec<String> = self
            .snapshot
            .agents
            .iter()
            .map(|agent| {
                if Some(agent.name.as_str()) == self.agent.as_deref() {
                    format!("[{}]", agent.name)
                } else {
                    agent.name.clone()
                }
            })
            .collect();
        let mut parts = vec![format!("agents: {}", agents.join(" "))];
        if let Some(model) = &self.model {
            parts.push(format!("model: {model}"));
        }
        if let Some(session) = &self.session_id {
            parts.push(format!("session: {session}"));
        }
        parts.join(" · ")
    }
}

/// Requested agent if the server knows it, else the first user-selectable one.
fn initial_agent(snapshot: &Snapshot, requested: Option<&str>) -> Option<String> {
    if let Some(name) = requested {
        if snapshot.agent(name).is_some() {
            return Some(name.to_string());
        }
        tracing::warn!(agent = name, "requested agent not found");
    }
    snapshot
        .agents
        .iter()
        .find(|agent| agent.mode.is_user_selectable())
        .or_else(|| snapshot.agents.first())
        .map(|agent| agent.name.clone())
}

fn truncate_chars(text: &str, max: usize) -> String {
    let flat: String = text.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();
    if flat.chars().count() <= max {
        return flat;
    }
    let mut out: String = flat.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Raw mode and alternate screen control.
pub trait TerminalBackend: Send {
    /// Enter raw mode and the alternate screen.
    fn acquire(&mut self) -> io::Result<()>;
    /// Undo [`Self::acquire`]. Best effort.
    fn release(&mut self);
}

/// The process terminal, via crossterm.
#[derive(Debug, Default)]
pub struct CrosstermBackend;

impl TerminalBackend for CrosstermBackend {
    fn acquire(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)
    }

    fn release(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
    }
}

/// Terminal ownership shared by the run loop and the cleanup latch.
///
/// Drawing and releasing both hold the lock, so a release never interleaves
/// with a frame. Once released the terminal is never acquired again.
struct Screen {
    backend: Box<dyn TerminalBackend>,
    acquired: bool,
    released: bool,
}

type SharedScreen = Arc<Mutex<Screen>>;

impl Screen {
    /// Take the terminal unless it was already released. `Ok(false)` when
    /// the release came first.
    fn acquire(&mut self) -> io::Result<bool> {
        if self.released {
            return Ok(false);
        }
        // Marked first so a half-finished acquire is still undone on release.
        self.acquired = true;
        self.backend.acquire()?;
        Ok(true)
    }

    fn release(&mut self) {
        self.released = true;
        if std::mem::take(&mut self.acquired) {
            self.backend.release();
        }
    }
}

fn lock_screen(screen: &Mutex<Screen>) -> MutexGuard<'_, Screen> {
    screen.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The bundled [`TerminalProgram`].
pub struct Viewer {
    state: ViewState,
    inbox: DeliveryReceiver,
    handle: ProgramHandle,
    cleanup: CleanupLatch,
    screen: SharedScreen,
    clipboard: ClipboardState,
}

impl Viewer {
    pub fn new(snapshot: Arc<Snapshot>, launch: LaunchOptions, clipboard: ClipboardState) -> Self {
        Self::with_backend(snapshot, launch, clipboard, Box::new(CrosstermBackend))
    }

    pub fn with_backend(
        snapshot: Arc<Snapshot>,
        launch: LaunchOptions,
        clipboard: ClipboardState,
        backend: Box<dyn TerminalBackend>,
    ) -> Self {
        let (tx, inbox) = delivery::channel();
        let screen = Arc::new(Mutex::new(Screen {
            backend,
            acquired: false,
            released: false,
        }));
        let latch_screen = Arc::clone(&screen);
        Self {
            state: ViewState::new(snapshot, launch),
            inbox,
            handle: ProgramHandle::new(tx),
            cleanup: CleanupLatch::new(move || lock_screen(&latch_screen).release()),
            screen,
            clipboard,
        }
    }

    fn summary(&self, reason: ExitReason) -> RunSummary {
        RunSummary {
            reason,
            messages: self.state.applied(),
        }
    }

    fn event_loop(&mut self, out: &mut impl Write) -> Result<RunSummary, ProgramError> {
        let mut dirty = true;
        loop {
            for message in self.inbox.drain() {
                self.state.apply(message);
                dirty = true;
            }
            if let Some(reason) = self.state.exit_reason() {
                return Ok(self.summary(reason));
            }
            if self.cleanup.is_done() {
                return Ok(self.summary(ExitReason::Released));
            }
            if dirty {
                self.draw(out)?;
                dirty = false;
            }

            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            match event::read()? {
                event::Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match self.state.handle_key(key) {
                        KeyAction::Ignored => {}
                        KeyAction::Redraw => dirty = true,
                        KeyAction::CopyLatest => {
                            self.copy_latest();
                            dirty = true;
                        }
                    }
                }
                event::Event::Resize(..) => dirty = true,
                _ => {}
            }
        }
    }

    fn copy_latest(&mut self) {
        let Some(text) = self.state.latest_line().map(str::to_string) else {
            return;
        };
        match clipboard::copy_text(&self.clipboard, &text) {
            Ok(()) => self.state.set_status("copied to clipboard"),
            Err(err) => {
                tracing::warn!(error = %err, "copy failed");
                self.state.set_status(format!("copy failed: {err}"));
            }
        }
    }

    fn draw(&self, out: &mut impl Write) -> io::Result<()> {
        let screen = lock_screen(&self.screen);
        if screen.released {
            return Ok(());
        }
        let (width, height) = terminal::size()?;
        out.queue(Clear(ClearType::All))?;
        for (row, line) in self.state.render(width, height).into_iter().enumerate() {
            let Ok(row) = u16::try_from(row) else {
                break;
            };
            out.queue(MoveTo(0, row))?;
            match line.style {
                LineStyle::Header => out.queue(PrintStyledContent(line.text.bold()))?,
                LineStyle::Rule => out.queue(PrintStyledContent(line.text.dark_grey()))?,
                LineStyle::Warn => out.queue(PrintStyledContent(line.text.yellow()))?,
                LineStyle::Error => out.queue(PrintStyledContent(line.text.red()))?,
                LineStyle::Prompt => out.queue(PrintStyledContent(line.text.cyan()))?,
                LineStyle::Normal => out.queue(Print(line.text))?,
            };
        }
        out.flush()
    }
}

impl TerminalProgram for Viewer {
    fn handle(&self) -> ProgramHandle {
        self.handle.clone()
    }

    fn cleanup(&self) -> CleanupLatch {
        self.cleanup.clone()
    }

    fn run(&mut self) -> Result<RunSummary, ProgramError> {
        if !lock_screen(&self.screen).acquire()? {
            tracing::debug!("terminal released before the viewer started");
            return Ok(self.summary(ExitReason::Released));
        }
        self.event_loop(&mut io::stdout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::{agent, APP_INFO_JSON};
    use crate::types::AgentMode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snapshot() -> Arc<Snapshot> {
        let mut sub = agent("general");
        sub.mode = AgentMode::Subagent;
        Arc::new(Snapshot {
            version: "v1.1.5".into(),
            app_info: serde_json::from_str(APP_INFO_JSON).unwrap(),
            agents: vec![sub, agent("build"), agent("plan")],
        })
    }

    fn state() -> ViewState {
        ViewState::new(snapshot(), LaunchOptions::default())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn control(path: &str, body: serde_json::Value) -> Message {
        Message::Control(ControlRequest {
            path: path.into(),
            body,
        })
    }

    #[test]
    fn first_selectable_agent_is_default() {
        assert_eq!(state().agent(), Some("build"));
    }

    #[test]
    fn requested_agent_is_honored_when_known() {
        let launch = LaunchOptions {
            agent: Some("plan".into()),
            ..LaunchOptions::default()
        };
        assert_eq!(ViewState::new(snapshot(), launch).agent(), Some("plan"));

        let unknown = LaunchOptions {
            agent: Some("ghost".into()),
            ..LaunchOptions::default()
        };
        assert_eq!(ViewState::new(snapshot(), unknown).agent(), Some("build"));
    }

    #[test]
    fn draft_starts_from_launch_prompt_and_follows_control_requests() {
        let launch = LaunchOptions {
            prompt: Some("hello\nworld".into()),
            ..LaunchOptions::default()
        };
        let mut view = ViewState::new(snapshot(), launch);
        assert_eq!(view.draft(), "hello\nworld");

        view.apply(control("/tui/clear-prompt", serde_json::Value::Null));
        view.apply(control("/tui/append-prompt", json!({"text": "fix the bug"})));
        view.apply(control("/tui/show-toast", json!({"message": "saved"})));

        assert_eq!(view.draft(), "fix the bug");
        assert_eq!(view.status(), "saved");
        let texts: Vec<_> = view.log().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["control: clear-prompt", "control: append-prompt", "control: show-toast"]
        );
    }

    #[test]
    fn events_are_logged_with_severity() {
        let mut view = state();
        view.apply(Message::Event(Event::ServerConnected(serde_json::Value::Null)));
        view.apply(Message::Event(Event::SessionError(json!({"error": "quota"}))));
        view.apply(Message::StreamFailed("connection reset".into()));

        let lines: Vec<_> = view.log().cloned().collect();
        assert_eq!(lines[0].text, "server.connected");
        assert_eq!(lines[0].style, LineStyle::Normal);
        assert_eq!(lines[1].style, LineStyle::Error);
        assert!(lines[1].text.starts_with("session.error {"));
        assert_eq!(lines[2].text, "event stream closed: connection reset");
        assert!(view.status().contains("restart"));
        assert_eq!(view.applied(), 3);
    }

    #[test]
    fn quit_message_and_keys_set_exit_reason_once() {
        let mut view = state();
        view.apply(Message::Quit);
        assert_eq!(view.handle_key(key(KeyCode::Char('q'))), KeyAction::Redraw);
        assert_eq!(view.exit_reason(), Some(ExitReason::QuitRequested));

        let mut view = state();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        view.handle_key(ctrl_c);
        assert_eq!(view.exit_reason(), Some(ExitReason::UserQuit));
    }

    #[test]
    fn scrolling_is_clamped_to_log_length() {
        let mut view = state();
        assert_eq!(view.handle_key(key(KeyCode::Up)), KeyAction::Ignored);
        for i in 0..3 {
            view.apply(Message::StreamFailed(i.to_string()));
        }
        assert_eq!(view.handle_key(key(KeyCode::PageUp)), KeyAction::Redraw);
        assert_eq!(view.handle_key(key(KeyCode::Up)), KeyAction::Ignored);
        assert_eq!(view.handle_key(key(KeyCode::PageDown)), KeyAction::Redraw);
        assert_eq!(view.handle_key(key(KeyCode::Down)), KeyAction::Ignored);
    }

    #[test]
    fn copy_key_targets_latest_line() {
        let mut view = state();
        assert_eq!(view.handle_key(key(KeyCode::Char('y'))), KeyAction::CopyLatest);
        assert_eq!(view.latest_line(), None);
        view.apply(Message::Event(Event::SessionIdle(serde_json::Value::Null)));
        assert_eq!(view.latest_line(), Some("session.idle"));
    }

    #[test]
    fn render_fills_the_screen_with_header_log_and_prompt() {
        let launch = LaunchOptions {
            prompt: Some("draft".into()),
            model: Some("anthropic/claude-sonnet".into()),
            ..LaunchOptions::default()
        };
        let mut view = ViewState::new(snapshot(), launch);
        for i in 0..20 {
            view.apply(Message::StreamFailed(format!("e{i}")));
        }

        let lines = view.render(80, 12);
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0].text, "ken8n v1.1.5 · devbox · /work/project");
        assert!(lines[1].text.contains("[build]"), "got: {}", lines[1].text);
        assert!(lines[1].text.contains("model: anthropic/claude-sonnet"));
        // Six body rows showing the newest entries.
        assert_eq!(lines[3].text, "event stream closed: e14");
        assert_eq!(lines[8].text, "event stream closed: e19");
        assert_eq!(lines[11].text, "> draft");
        assert!(lines.iter().all(|l| l.text.chars().count() <= 80));
    }

    #[test]
    fn long_lines_are_truncated_to_width() {
        assert_eq!(truncate_chars("abcdef", 4), "abc…");
        assert_eq!(truncate_chars("a\nb", 4), "a b");
    }

    #[test]
    fn log_is_bounded() {
        let mut view = state();
        for i in 0..(MAX_LOG_LINES + 5) {
            view.apply(Message::StreamFailed(i.to_string()));
        }
        assert_eq!(view.log().count(), MAX_LOG_LINES);
        assert_eq!(view.log().next().unwrap().text, "event stream closed: 5");
    }

    #[test]
    fn handle_feeds_the_viewer_inbox() {
        let mut viewer = Viewer::new(snapshot(), LaunchOptions::default(), ClipboardState::default());
        let handle = viewer.handle();
        handle.inject(Message::Event(Event::SessionIdle(serde_json::Value::Null)));
        handle.quit();
        for message in viewer.inbox.drain() {
            viewer.state.apply(message);
        }
        assert_eq!(viewer.state.exit_reason(), Some(ExitReason::QuitRequested));
        assert!(!viewer.cleanup().is_done());
    }

    #[derive(Default)]
    struct Calls {
        acquired: AtomicUsize,
        released: AtomicUsize,
    }

    struct RecordingBackend(Arc<Calls>);

    impl TerminalBackend for RecordingBackend {
        fn acquire(&mut self) -> io::Result<()> {
            self.0.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn release(&mut self) {
            self.0.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn recording_viewer() -> (Viewer, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let viewer = Viewer::with_backend(
            snapshot(),
            LaunchOptions::default(),
            ClipboardState::default(),
            Box::new(RecordingBackend(Arc::clone(&calls))),
        );
        (viewer, calls)
    }

    #[test]
    fn release_before_run_keeps_terminal_untouched() {
        let (mut viewer, calls) = recording_viewer();
        let handle = viewer.handle();
        // Signal path: release, then quit.
        assert!(viewer.cleanup().run());
        handle.quit();

        let summary = viewer.run().expect("run");

        assert_eq!(summary.reason, ExitReason::Released);
        assert_eq!(calls.acquired.load(Ordering::SeqCst), 0);
        assert_eq!(calls.released.load(Ordering::SeqCst), 0);
        assert!(!viewer.cleanup().run());
    }

    #[test]
    fn release_after_acquire_restores_exactly_once() {
        let (viewer, calls) = recording_viewer();
        assert!(lock_screen(&viewer.screen).acquire().expect("acquire"));

        let latch = viewer.cleanup();
        let racer = latch.clone();
        let other = std::thread::spawn(move || racer.run());
        let here = latch.run();
        let there = other.join().expect("join");

        assert!(here ^ there);
        assert_eq!(calls.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(calls.released.load(Ordering::SeqCst), 1);
        assert!(!lock_screen(&viewer.screen).acquire().expect("reacquire"));
    }

    #[test]
    fn drawing_after_release_writes_nothing() {
        let (viewer, _calls) = recording_viewer();
        viewer.cleanup().run();
        let mut out = Vec::new();
        viewer.draw(&mut out).expect("draw");
        assert!(out.is_empty());
    }
}
