//! TUI for the labelling session
//!
//! Features:
//! - Image mode: candidate panes, override editors, example preview
//! - Conversation mode: message-by-message add/skip/undo/end
//! - Single-key dispatch, suppressed while an override editor has focus
//! - Stats polling on a fixed interval
//! - In-app log pane
//!
//! All network I/O runs in spawned tasks; results come back over an mpsc
//! channel tagged with the controller's epoch/seq guards.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use unicode_width::UnicodeWidthChar;

use crate::api::LabelClient;
use crate::candidates::Role;
use crate::convo::{ConvoAction, ConvoEffect, ConvoEvent, ConvoSession};
use crate::session::{Effect, LabelSession, Phase, SessionEvent, Side, SubmitAction};

// ═══════════════════════════════════════════════════════════════
// IMAGE MODE
// ═══════════════════════════════════════════════════════════════

/// Which candidate pane the list cursor lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    User,
    Assistant,
}

impl Pane {
    fn role(self) -> Role {
        match self {
            Pane::User => Role::User,
            Pane::Assistant => Role::Assistant,
        }
    }
}

/// Purely presentational state: cursors, editor focus, log lines.
struct ImageUi {
    pane: Pane,
    user_cursor: usize,
    assistant_cursor: usize,
    /// While set, the override editor for this role has keyboard focus
    /// and every key goes into the text, never to a command.
    editing: Option<Role>,
    log: Vec<String>,
    tick: usize,
}

impl ImageUi {
    fn new() -> Self {
        Self {
            pane: Pane::User,
            user_cursor: 0,
            assistant_cursor: 0,
            editing: None,
            log: Vec::new(),
            tick: 0,
        }
    }

    fn cursor(&self, pane: Pane) -> usize {
        match pane {
            Pane::User => self.user_cursor,
            Pane::Assistant => self.assistant_cursor,
        }
    }

    fn cursor_mut(&mut self, pane: Pane) -> &mut usize {
        match pane {
            Pane::User => &mut self.user_cursor,
            Pane::Assistant => &mut self.assistant_cursor,
        }
    }

    fn log(&mut self, msg: impl Into<String>) {
        let now = chrono::Local::now().format("%H:%M:%S");
        self.log.push(format!("[{}] {}", now, msg.into()));
    }
}

/// Run the image-mode labelling TUI against `client`.
pub async fn run_image_mode(client: LabelClient, stats_poll_secs: u64) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = image_loop(&mut terminal, client, stats_poll_secs).await;
    restore_terminal(terminal)?;
    result
}

async fn image_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    client: LabelClient,
    stats_poll_secs: u64,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<SessionEvent>(64);
    let mut ui = ImageUi::new();
    ui.log(format!("Connected to {}", client.base_url()));

    let (mut session, effects) = LabelSession::start();
    for effect in effects {
        spawn_image_effect(&client, &tx, effect);
    }

    let poll_interval = Duration::from_secs(stats_poll_secs.max(1));
    let mut last_stats = Instant::now();

    loop {
        ui.tick += 1;

        // Stats poller: independent of the labelling cycle.
        if last_stats.elapsed() >= poll_interval {
            spawn_image_effect(&client, &tx, session.poll_stats());
            last_stats = Instant::now();
        }

        // Apply network results
        while let Ok(msg) = rx.try_recv() {
            match &msg {
                SessionEvent::Window { result: Ok(w), .. } => {
                    ui.log(format!(
                        "Window loaded: {} preceding, {} following",
                        w.preceding.len(),
                        w.following.len()
                    ));
                    ui.user_cursor = 0;
                    ui.assistant_cursor = 0;
                    ui.editing = None;
                }
                SessionEvent::Window { result: Err(e), .. } => {
                    ui.log(format!("Window fetch: {}", e));
                }
                SessionEvent::Submitted {
                    action,
                    result: Ok(_),
                    ..
                } => {
                    ui.log(format!("{} ok", action.name()));
                    ui.editing = None;
                }
                SessionEvent::Submitted {
                    action,
                    result: Err(e),
                    ..
                } => {
                    ui.log(format!("{} failed: {}", action.name(), e));
                }
                SessionEvent::Stats { result: Err(e), .. } => {
                    // Logged, never surfaced: stats are display-only.
                    ui.log(format!("stats fetch failed: {}", e));
                }
                _ => {}
            }
            for effect in session.handle(msg) {
                spawn_image_effect(&client, &tx, effect);
            }
        }

        clamp_cursors(&session, &mut ui);
        terminal.draw(|f| render_image_mode(f, &session, &ui))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Override editor focus suppresses all command keys.
                if let Some(role) = ui.editing {
                    match key.code {
                        KeyCode::Enter => ui.editing = None,
                        KeyCode::Esc => {
                            session.toggle_override(role);
                            ui.editing = None;
                        }
                        KeyCode::Backspace => session.selection.pop_override_char(role),
                        KeyCode::Char(c) => session.selection.push_override_char(role, c),
                        _ => {}
                    }
                    continue;
                }

                match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => break,
                    KeyCode::Tab => {
                        ui.pane = match ui.pane {
                            Pane::User => Pane::Assistant,
                            Pane::Assistant => Pane::User,
                        };
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        let cursor = ui.cursor_mut(ui.pane);
                        *cursor = cursor.saturating_sub(1);
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        let len = session.candidates(ui.pane.role()).len();
                        let cursor = ui.cursor_mut(ui.pane);
                        *cursor = (*cursor + 1).min(len.saturating_sub(1));
                    }
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        let role = ui.pane.role();
                        session.select_candidate(role, ui.cursor(ui.pane));
                    }
                    KeyCode::Char(c @ '1'..='9') => {
                        let idx = (c as usize) - ('1' as usize);
                        session.select_candidate(ui.pane.role(), idx);
                    }
                    KeyCode::Char('e') => {
                        let role = ui.pane.role();
                        if session.toggle_override(role) {
                            ui.editing = Some(role);
                        }
                    }
                    KeyCode::Char('a') => {
                        if let Some(effect) = session.accept() {
                            ui.log("accepting example");
                            spawn_image_effect(&client, &tx, effect);
                        }
                    }
                    KeyCode::Char('s') => {
                        if let Some(effect) = session.skip() {
                            ui.log("skipping image");
                            spawn_image_effect(&client, &tx, effect);
                        }
                    }
                    KeyCode::Char('u') => {
                        if let Some(effect) = session.undo() {
                            ui.log("requesting undo");
                            spawn_image_effect(&client, &tx, effect);
                        }
                    }
                    KeyCode::Char('[') => {
                        if let Some(effect) = session.load_more(Side::Before) {
                            spawn_image_effect(&client, &tx, effect);
                        }
                    }
                    KeyCode::Char(']') => {
                        if let Some(effect) = session.load_more(Side::After) {
                            spawn_image_effect(&client, &tx, effect);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

fn clamp_cursors(session: &LabelSession, ui: &mut ImageUi) {
    let user_len = session.candidates(Role::User).len();
    let assistant_len = session.candidates(Role::Assistant).len();
    ui.user_cursor = ui.user_cursor.min(user_len.saturating_sub(1));
    ui.assistant_cursor = ui.assistant_cursor.min(assistant_len.saturating_sub(1));
}

/// Run one controller effect as a background task; the result comes back
/// over the channel tagged with the epoch/seq it belongs to.
fn spawn_image_effect(client: &LabelClient, tx: &mpsc::Sender<SessionEvent>, effect: Effect) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        match effect {
            Effect::FetchWindow { epoch } => {
                let result = client.context_window().await;
                let _ = tx.send(SessionEvent::Window { epoch, result }).await;
            }
            Effect::SaveExample { epoch, request } => {
                let result = client.save_example(&request).await;
                let _ = tx
                    .send(SessionEvent::Submitted {
                        epoch,
                        action: SubmitAction::Accept,
                        result,
                    })
                    .await;
            }
            Effect::SkipImage { epoch } => {
                let result = client.skip_image().await;
                let _ = tx
                    .send(SessionEvent::Submitted {
                        epoch,
                        action: SubmitAction::Skip,
                        result,
                    })
                    .await;
            }
            Effect::Undo { epoch } => {
                let result = client.undo_example().await;
                let _ = tx
                    .send(SessionEvent::Submitted {
                        epoch,
                        action: SubmitAction::Undo,
                        result,
                    })
                    .await;
            }
            Effect::FetchStats { seq } => {
                let result = client.stats().await;
                let _ = tx.send(SessionEvent::Stats { seq, result }).await;
            }
            Effect::LoadMore { epoch, side } => {
                let result = match side {
                    Side::Before => client.load_more_before().await,
                    Side::After => client.load_more_after().await,
                };
                let _ = tx
                    .send(SessionEvent::Widened {
                        epoch,
                        side,
                        result,
                    })
                    .await;
            }
        }
    });
}

fn render_image_mode(f: &mut Frame, session: &LabelSession, ui: &ImageUi) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Candidate panes + preview
            Constraint::Length(1), // Status / message line
            Constraint::Length(6), // Log
        ])
        .split(f.size());

    render_header(f, session, ui, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(chunks[1]);

    render_candidate_pane(f, session, ui, Pane::User, columns[0]);
    render_preview(f, session, columns[1]);
    render_candidate_pane(f, session, ui, Pane::Assistant, columns[2]);

    render_status_line(f, session, ui, chunks[2]);
    render_log(f, &ui.log, chunks[3]);
}

fn render_header(f: &mut Frame, session: &LabelSession, ui: &ImageUi, area: Rect) {
    let (index, total) = session.progress();
    let progress = match (index, total) {
        (Some(i), Some(t)) => format!("{}/{}", i, t),
        (Some(i), None) => format!("{}", i),
        _ => "-".to_string(),
    };
    let labeled = session
        .stats()
        .map(|s| s.labeled_conversations.to_string())
        .unwrap_or_else(|| "-".to_string());
    let persona = session
        .stats()
        .and_then(|s| s.persona.clone())
        .unwrap_or_else(|| "?".to_string());

    let phase = match session.phase() {
        Phase::Loading => format!("{} loading", spinner_char(ui.tick)),
        Phase::Ready => "ready".to_string(),
        Phase::Submitting(a) => format!("{} {}", spinner_char(ui.tick), a.name()),
        Phase::Completed => "done".to_string(),
    };

    let header = Paragraph::new(format!(
        "persona: {} | image {} | labeled: {} | {}",
        persona, progress, labeled, phase
    ))
    .block(Block::default().borders(Borders::ALL).title("labelcli"));
    f.render_widget(header, area);
}

fn render_candidate_pane(f: &mut Frame, session: &LabelSession, ui: &ImageUi, pane: Pane, area: Rect) {
    let role = pane.role();
    let candidates = session.candidates(role);
    let choice = session.selection.choice(role);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let width = (parts[0].width as usize).saturating_sub(8);
    let items: Vec<ListItem> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let marker = if choice.selected() == Some(i) { "✓" } else { " " };
            ListItem::new(format!(
                "{}{:>2}. {}",
                marker,
                i + 1,
                truncate_to_width(&c.text, width)
            ))
        })
        .collect();

    let focused = ui.pane == pane && ui.editing.is_none();
    let title = match role {
        Role::User => format!("Preceding / user ({})", candidates.len()),
        Role::Assistant => format!("Following / assistant ({})", candidates.len()),
    };
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !candidates.is_empty() {
        state.select(Some(ui.cursor(pane)));
    }
    f.render_stateful_widget(list, parts[0], &mut state);

    // Override editor
    let editing = ui.editing == Some(role);
    let override_title = if choice.override_on() {
        if editing {
            "Override (typing - Enter to keep, Esc to drop)"
        } else {
            "Override (e to drop)"
        }
    } else {
        "Override (e to type your own)"
    };
    let override_style = if editing {
        Style::default().fg(Color::Yellow)
    } else if choice.override_on() {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let editor = Paragraph::new(choice.override_text())
        .style(override_style)
        .block(Block::default().borders(Borders::ALL).title(override_title));
    f.render_widget(editor, parts[1]);
}

fn render_preview(f: &mut Frame, session: &LabelSession, area: Rect) {
    let draft = session.draft();

    let mut lines: Vec<String> = Vec::new();
    if session.phase() == Phase::Completed {
        lines.push("All items labeled.".into());
        if let Some(stats) = session.stats() {
            lines.push(String::new());
            lines.push(format!("Labeled examples: {}", stats.labeled_conversations));
            if let Some(total) = stats.total() {
                lines.push(format!("Total items: {}", total));
            }
        }
    } else if draft.is_empty() {
        lines.push("Nothing chosen yet.".into());
        lines.push(String::new());
        lines.push("Pick a user turn on the left and an".into());
        lines.push("assistant turn on the right, or type".into());
        lines.push("an override with 'e'.".into());
    } else {
        match &draft.user_text {
            Some(t) => lines.push(format!("user: {}", t)),
            None => lines.push("user: (not chosen)".into()),
        }
        lines.push(String::new());
        match (&draft.anchor_image, &draft.anchor_text) {
            (Some(img), Some(txt)) => lines.push(format!("[image: {}] {}", img, txt)),
            (Some(img), None) => lines.push(format!("[image: {}]", img)),
            (None, Some(txt)) => lines.push(format!("[anchor] {}", txt)),
            (None, None) => lines.push("[anchor: empty]".into()),
        }
        lines.push(String::new());
        match &draft.assistant_text {
            Some(t) => lines.push(format!("assistant: {}", t)),
            None => lines.push("assistant: (not chosen)".into()),
        }
    }

    let title = if draft.is_complete() {
        "Example (complete - 'a' to accept)"
    } else {
        "Example"
    };
    let preview = Paragraph::new(lines.join("\n"))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(preview, area);
}

fn render_status_line(f: &mut Frame, session: &LabelSession, ui: &ImageUi, area: Rect) {
    let (text, style) = if let Some(msg) = session.status() {
        (msg.to_string(), Style::default().fg(Color::Yellow))
    } else if ui.editing.is_some() {
        (
            " typing override | Enter: keep | Esc: drop".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (
            " a:accept s:skip u:undo e:override [/]:more context Tab:pane Esc:quit".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    };
    f.render_widget(Paragraph::new(text).style(style), area);
}

fn render_log(f: &mut Frame, log: &[String], area: Rect) {
    let text: String = log
        .iter()
        .rev()
        .take(area.height.saturating_sub(2) as usize)
        .rev()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let para = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Log"));
    f.render_widget(para, area);
}

// ═══════════════════════════════════════════════════════════════
// CONVERSATION MODE
// ═══════════════════════════════════════════════════════════════

struct ConvoUi {
    log: Vec<String>,
    tick: usize,
}

impl ConvoUi {
    fn log(&mut self, msg: impl Into<String>) {
        let now = chrono::Local::now().format("%H:%M:%S");
        self.log.push(format!("[{}] {}", now, msg.into()));
    }
}

/// Run the conversation-mode labelling TUI against `client`.
pub async fn run_convo_mode(client: LabelClient, stats_poll_secs: u64) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = convo_loop(&mut terminal, client, stats_poll_secs).await;
    restore_terminal(terminal)?;
    result
}

async fn convo_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    client: LabelClient,
    stats_poll_secs: u64,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<ConvoEvent>(64);
    let mut ui = ConvoUi {
        log: Vec::new(),
        tick: 0,
    };
    ui.log(format!("Connected to {}", client.base_url()));

    let (mut session, effects) = ConvoSession::start();
    for effect in effects {
        spawn_convo_effect(&client, &tx, effect);
    }

    let poll_interval = Duration::from_secs(stats_poll_secs.max(1));
    let mut last_stats = Instant::now();

    loop {
        ui.tick += 1;

        if last_stats.elapsed() >= poll_interval {
            spawn_convo_effect(&client, &tx, session.poll_stats());
            last_stats = Instant::now();
        }

        while let Ok(msg) = rx.try_recv() {
            match &msg {
                ConvoEvent::Submitted {
                    action,
                    result: Ok(_),
                    ..
                } => ui.log(format!("{} ok", action.name())),
                ConvoEvent::Submitted {
                    action,
                    result: Err(e),
                    ..
                } => ui.log(format!("{} failed: {}", action.name(), e)),
                ConvoEvent::Stats { result: Err(e), .. } => {
                    ui.log(format!("stats fetch failed: {}", e))
                }
                _ => {}
            }
            for effect in session.handle(msg) {
                spawn_convo_effect(&client, &tx, effect);
            }
        }

        terminal.draw(|f| render_convo_mode(f, &session, &ui))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let effect = match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => break,
                    KeyCode::Char('a') => session.add(),
                    KeyCode::Char('s') => session.skip(),
                    KeyCode::Char('u') => session.undo(),
                    KeyCode::Char('e') => session.end(),
                    _ => None,
                };
                if let Some(effect) = effect {
                    spawn_convo_effect(&client, &tx, effect);
                }
            }
        }
    }

    Ok(())
}

fn spawn_convo_effect(client: &LabelClient, tx: &mpsc::Sender<ConvoEvent>, effect: ConvoEffect) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        match effect {
            ConvoEffect::FetchNext { epoch } => {
                let result = client.next_message().await;
                let _ = tx.send(ConvoEvent::Next { epoch, result }).await;
            }
            ConvoEffect::Submit { epoch, action } => {
                let result = match action {
                    ConvoAction::Add => client.add_to_conversation().await,
                    ConvoAction::Skip => client.skip_message().await,
                    ConvoAction::Undo => client.undo_message().await,
                    ConvoAction::End => client.end_conversation().await,
                };
                let _ = tx
                    .send(ConvoEvent::Submitted {
                        epoch,
                        action,
                        result,
                    })
                    .await;
            }
            ConvoEffect::FetchStats { seq } => {
                let result = client.stats().await;
                let _ = tx.send(ConvoEvent::Stats { seq, result }).await;
            }
        }
    });
}

fn render_convo_mode(f: &mut Frame, session: &ConvoSession, ui: &ConvoUi) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(6),    // Current message
            Constraint::Length(1), // Status line
            Constraint::Length(6), // Log
        ])
        .split(f.size());

    let (index, total) = match session.current() {
        Some(n) => (n.index, n.total),
        None => (None, None),
    };
    let progress = match (index, total) {
        (Some(i), Some(t)) => format!("{}/{}", i, t),
        _ => "-".to_string(),
    };
    let labeled = session
        .stats()
        .map(|s| s.labeled_conversations.to_string())
        .unwrap_or_else(|| "-".to_string());
    let phase = match session.phase() {
        Phase::Loading => format!("{} loading", spinner_char(ui.tick)),
        Phase::Ready => "ready".to_string(),
        Phase::Submitting(a) => format!("{} {}", spinner_char(ui.tick), a.name()),
        Phase::Completed => "done".to_string(),
    };
    let header = Paragraph::new(format!(
        "message {} | conversation: {} msgs | labeled: {} | {}",
        progress,
        session.conversation_size(),
        labeled,
        phase
    ))
    .block(Block::default().borders(Borders::ALL).title("labelcli (conversation)"));
    f.render_widget(header, chunks[0]);

    let mut lines: Vec<String> = Vec::new();
    if session.phase() == Phase::Completed {
        lines.push("All messages labeled.".into());
        if let Some(n) = session.current() {
            if let Some(total) = n.total_labeled {
                lines.push(format!("Conversations saved: {}", total));
            }
        }
    } else if let Some(body) = session.current_message() {
        if let Some(sender) = &body.sender {
            let ts = match &body.timestamp {
                serde_json::Value::String(s) => s.clone(),
                v => v.to_string(),
            };
            lines.push(format!("{} @ {}", sender, ts));
        }
        lines.push(String::new());
        lines.push(body.content.clone().unwrap_or_default());
    } else {
        lines.push("Loading...".into());
    }
    let message = Paragraph::new(lines.join("\n"))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Current message"));
    f.render_widget(message, chunks[1]);

    let (text, style) = if let Some(msg) = session.status() {
        (msg.to_string(), Style::default().fg(Color::Yellow))
    } else {
        (
            " a:add s:skip u:undo e:end conversation Esc:quit".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    };
    f.render_widget(Paragraph::new(text).style(style), chunks[2]);

    render_log(f, &ui.log, chunks[3]);
}

// ═══════════════════════════════════════════════════════════════
// SHARED HELPERS
// ═══════════════════════════════════════════════════════════════

fn spinner_char(tick: usize) -> char {
    const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
    SPINNER[tick % SPINNER.len()]
}

/// Truncate to a display width, appending an ellipsis when cut.
fn truncate_to_width(s: &str, max: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max.saturating_sub(1) {
            out.push('…');
            return out;
        }
        width += w;
        out.push(c);
    }
    out
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 20), "short");
        assert_eq!(truncate_to_width("a longer candidate line", 10), "a longer …");
    }
}
