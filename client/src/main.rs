/// CargoLink chat - interactive terminal messenger for the marketplace
use cargolink_client::composer::Composer;
use cargolink_client::messenger::Messenger;
use cargolink_client::notify;
use cargolink_client::poll::PollHandle;
use cargolink_client::scroll::ScrollAnchor;
use cargolink_client::timefmt;
use cargolink_client::types::{Conversation, Message, PeerUser};
use cargolink_client::Config;

use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Rows from the bottom within which the view keeps following new messages
const FOLLOW_ROWS: u64 = 3;

struct ThreadView {
    peer: PeerUser,
    trip_id: Option<String>,
    handle: PollHandle,
    messages: Vec<Message>,
    composer: Composer,
    anchor: ScrollAnchor,
    scroll_top: u64,
    viewport: u64,
}

impl ThreadView {
    fn content_height(&self) -> u64 {
        self.messages.len() as u64
    }

    fn scroll_by(&mut self, delta: i64) {
        let max_top = self.content_height().saturating_sub(self.viewport);
        let next = self.scroll_top as i64 + delta;
        self.scroll_top = next.clamp(0, max_top as i64) as u64;
        self.anchor
            .observe(self.scroll_top, self.viewport, self.content_height());
    }

    fn jump_to_bottom(&mut self) {
        self.scroll_top = self.content_height().saturating_sub(self.viewport);
    }
}

struct App {
    messenger: Messenger,
    conversations: PollHandle,
    rows: Vec<Conversation>,
    selected: usize,
    thread: Option<ThreadView>,
    status: Option<String>,
}

impl App {
    fn new(messenger: Messenger) -> Self {
        let conversations = messenger.watch_conversations_page();
        Self {
            messenger,
            conversations,
            rows: Vec::new(),
            selected: 0,
            thread: None,
            status: None,
        }
    }

    fn drain_snapshots(&mut self) {
        if self.conversations.has_changed() {
            let snapshot = self.conversations.snapshot();
            if let Some(list) = snapshot.conversations() {
                self.rows = list.to_vec();
                if self.selected >= self.rows.len() {
                    self.selected = self.rows.len().saturating_sub(1);
                }
            }
        }

        if let Some(view) = &mut self.thread {
            if view.handle.has_changed() {
                let snapshot = view.handle.snapshot();
                if let Some(thread) = snapshot.thread() {
                    let grew = thread.messages.len() > view.messages.len();
                    view.messages = thread.messages.clone();
                    view.peer = thread.other_user.clone();
                    if grew && view.anchor.should_follow() {
                        view.jump_to_bottom();
                    }
                }
                if let Some(err) = snapshot.error {
                    self.status = Some(err);
                }
            }
        }
    }

    fn open_selected(&mut self) {
        let Some(conversation) = self.rows.get(self.selected) else {
            return;
        };
        let handle = self.messenger.watch_thread(&conversation.other_user.id);
        self.thread = Some(ThreadView {
            peer: conversation.other_user.clone(),
            trip_id: conversation.trip_id.clone(),
            handle,
            messages: Vec::new(),
            composer: Composer::new(),
            anchor: ScrollAnchor::with_threshold(FOLLOW_ROWS),
            scroll_top: 0,
            viewport: 0,
        });
        self.status = None;
    }

    async fn send(&mut self) {
        let Some(view) = &mut self.thread else {
            return;
        };
        let recipient = view.peer.id.clone();
        let trip = view.trip_id.clone();
        let result = self
            .messenger
            .send_from_composer(
                &recipient,
                trip.as_deref(),
                &mut view.composer,
                &mut view.anchor,
            )
            .await;
        match result {
            Ok(Some(_)) => {
                view.jump_to_bottom();
                self.status = None;
            }
            Ok(None) => {}
            Err(err) => self.status = Some(format!("Send failed: {}", err)),
        }
    }

    async fn mark_all_read(&mut self) {
        let feed = notify::aggregate(&self.rows);
        if let Err(err) = self.messenger.mark_all_read(&feed).await {
            self.status = Some(format!("Mark read failed: {}", err));
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CARGOLINK_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = Config::from_args(&args)?;
    let messenger = Messenger::new(config);

    if messenger.session().token()?.is_none() {
        eprintln!("Not logged in. Run: cli login <email>");
        std::process::exit(1);
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, App::new(messenger)).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        eprintln!("TUI error: {e}");
    }
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> std::io::Result<()> {
    loop {
        app.drain_snapshots();
        terminal.draw(|f| draw(f, &mut app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(());
        }

        if app.thread.is_some() {
            match key.code {
                KeyCode::Esc => {
                    app.thread = None;
                    app.status = None;
                }
                KeyCode::Enter => app.send().await,
                KeyCode::Backspace => {
                    if let Some(view) = &mut app.thread {
                        view.composer.pop_char();
                    }
                }
                KeyCode::PageUp => {
                    if let Some(view) = &mut app.thread {
                        view.scroll_by(-5);
                    }
                }
                KeyCode::PageDown => {
                    if let Some(view) = &mut app.thread {
                        view.scroll_by(5);
                    }
                }
                KeyCode::Char(ch) => {
                    if let Some(view) = &mut app.thread {
                        view.composer.push_char(ch);
                    }
                }
                _ => {}
            }
        } else {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Up => app.selected = app.selected.saturating_sub(1),
                KeyCode::Down => {
                    if app.selected + 1 < app.rows.len() {
                        app.selected += 1;
                    }
                }
                KeyCode::Enter => app.open_selected(),
                KeyCode::Char('m') => app.mark_all_read().await,
                _ => {}
            }
        }
    }
}

fn draw(f: &mut ratatui::Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(38), Constraint::Min(30)].as_ref())
        .split(f.size());

    draw_sidebar(f, app, chunks[0]);
    match &mut app.thread {
        Some(view) => draw_thread(f, view, chunks[1]),
        None => draw_overview(f, app, chunks[1]),
    }

    if let Some(status) = &app.status {
        let area = f.size();
        if area.height > 0 {
            let line = Paragraph::new(Line::from(Span::styled(
                status.clone(),
                Style::default().fg(Color::Red),
            )));
            let bottom = ratatui::layout::Rect::new(0, area.height - 1, area.width, 1);
            f.render_widget(line, bottom);
        }
    }
}

fn draw_sidebar(f: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let now = Utc::now();
    let feed = notify::aggregate(&app.rows);
    let total = notify::total_unread(&feed);
    let title = if total > 0 {
        format!("Messages ({})", notify::badge_label(total))
    } else {
        "Messages".to_string()
    };

    let mut lines = Vec::new();
    if app.rows.is_empty() {
        lines.push(Line::from(Span::styled(
            "No conversations yet",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (i, conversation) in app.rows.iter().enumerate() {
        let marker = if i == app.selected { "> " } else { "  " };
        let mut name_style = Style::default();
        if conversation.unread_count > 0 {
            name_style = name_style.add_modifier(Modifier::BOLD);
        }
        let mut spans = vec![
            Span::raw(marker.to_string()),
            Span::styled(conversation.other_user.name.clone(), name_style),
        ];
        if conversation.unread_count > 0 {
            spans.push(Span::styled(
                format!(" ({})", conversation.unread_count),
                Style::default().fg(Color::Blue),
            ));
        }
        spans.push(Span::styled(
            format!(
                "  {}",
                timefmt::humanize_event_time(&conversation.last_message_time, now)
            ),
            Style::default().fg(Color::DarkGray),
        ));
        lines.push(Line::from(spans));
        lines.push(Line::from(Span::styled(
            format!(
                "    {}",
                notify::list_preview(conversation.last_message.as_deref())
            ),
            Style::default().fg(Color::Gray),
        )));
    }

    let para =
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(para, area);
}

fn draw_overview(f: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let stats = notify::stats(&app.rows);
    let lines = vec![
        Line::from(Span::styled(
            "CargoLink Messages",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Active conversations: {}", stats.active)),
        Line::from(format!("Unread messages:      {}", stats.unread)),
        Line::from(format!("Trip-related chats:   {}", stats.trip_related)),
        Line::from(""),
        Line::from(Span::styled(
            "Up/Down select - Enter open - m mark all read - q quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let para =
        Paragraph::new(lines).block(Block::default().title("Overview").borders(Borders::ALL));
    f.render_widget(para, area);
}

fn draw_thread(f: &mut ratatui::Frame, view: &mut ThreadView, area: ratatui::layout::Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)].as_ref())
        .split(area);

    let now = Utc::now();
    let message_area = chunks[0];
    view.viewport = message_area.height.saturating_sub(2) as u64;
    if view.anchor.should_follow() {
        view.jump_to_bottom();
    }

    let lines: Vec<Line> = view
        .messages
        .iter()
        .map(|message| {
            let who = if message.is_mine {
                Span::styled("me", Style::default().fg(Color::Cyan))
            } else {
                Span::styled(view.peer.name.clone(), Style::default().fg(Color::Green))
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", timefmt::humanize_message_time(&message.created_at, now)),
                    Style::default().fg(Color::DarkGray),
                ),
                who,
                Span::raw(": "),
                Span::raw(message.message.clone()),
            ])
        })
        .collect();

    let para = Paragraph::new(lines)
        .scroll((view.scroll_top as u16, 0))
        .block(
            Block::default()
                .title(format!("Chat with {}", view.peer.name))
                .borders(Borders::ALL),
        );
    f.render_widget(para, message_area);

    let hint = if view.composer.is_sending() {
        "sending...".to_string()
    } else {
        format!(
            "{}/{} - Enter send, Esc back",
            view.composer.draft().chars().count(),
            cargolink_client::composer::MAX_MESSAGE_CHARS
        )
    };
    let input = Paragraph::new(vec![
        Line::from(view.composer.draft().to_string()),
        Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
    ])
    .block(Block::default().title("Message").borders(Borders::ALL));
    f.render_widget(input, chunks[1]);
}
