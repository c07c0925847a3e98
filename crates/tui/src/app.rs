use std::{
    collections::HashSet,
    io, mem,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc, task};
use tracing::{debug, error, info, warn};
use wikibingo_core::{
    config::BOARD_SIZES,
    session::{NOT_FOUND_MESSAGE, NO_MATCHES_MESSAGE},
    AppConfig, ArticleTokenizer, Cancellation, Cell, Difficulty, GameOptions, GameSession,
    Leaderboard, LeaderboardEntry, Position, TokenizeError, WikipediaTokenizer, WinDetector,
    WordPool,
};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_INPUT_LEN: usize = 128;
const LEADERBOARD_ROWS: usize = 10;
const QUIT_COMMAND: &str = "\\q";
const MENU_ITEMS: usize = 4;
const FILL_BANDS: u32 = 3;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    cool: Color,
    success: Color,
    warning: Color,
    danger: Color,
    on_accent: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            cool: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            on_accent: Color::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Play,
}

/// Single-line editor used for article titles and the winner's name.
#[derive(Debug, Clone, Default)]
struct TextInput {
    input: String,
    /// Byte offset, always on a char boundary.
    cursor: usize,
}

impl TextInput {
    fn value(&self) -> &str {
        &self.input
    }

    fn move_left(&mut self) {
        if let Some(ch) = self.input[..self.cursor].chars().next_back() {
            self.cursor -= ch.len_utf8();
        }
    }

    fn move_right(&mut self) {
        if let Some(ch) = self.input[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.input.len();
    }

    fn insert(&mut self, ch: char) {
        if ch.is_control() || self.input.chars().count() >= MAX_INPUT_LEN {
            return;
        }
        self.input.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn backspace(&mut self) {
        if let Some(ch) = self.input[..self.cursor].chars().next_back() {
            self.cursor -= ch.len_utf8();
            self.input.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }

    fn take(&mut self) -> String {
        self.cursor = 0;
        mem::take(&mut self.input)
    }

    fn clear(&mut self) {
        self.take();
    }

    fn cursor_column(&self) -> u16 {
        self.input[..self.cursor].chars().count() as u16
    }
}

enum AppEvent {
    Input(Event),
    Tick,
    ArticleFetched {
        id: u64,
        title: String,
        result: Result<Vec<String>, TokenizeError>,
    },
}

struct PendingFetch {
    id: u64,
    title: String,
    cancellation: Cancellation,
    started: Instant,
}

struct PlayState {
    session: GameSession,
    input: TextInput,
    pending: Option<PendingFetch>,
    last_hits: HashSet<Position>,
}

impl PlayState {
    fn new(session: GameSession) -> Self {
        Self {
            session,
            input: TextInput::default(),
            pending: None,
            last_hits: HashSet::new(),
        }
    }

    fn cancel_pending(&mut self) -> Option<PendingFetch> {
        let pending = self.pending.take()?;
        pending.cancellation.cancel();
        Some(pending)
    }
}

/// Top-level state for the Wiki Bingo terminal UI.
pub struct WikiBingoApp {
    pool: Arc<WordPool>,
    tokenizer: Arc<WikipediaTokenizer>,
    leaderboard: Leaderboard,
    fetch_timeout: Duration,
    state: UiState,
    screen: Screen,
    play_state: Option<PlayState>,
    top_scores: Vec<LeaderboardEntry>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    next_fetch_id: u64,
    theme: Theme,
}

impl WikiBingoApp {
    pub fn new(
        pool: Arc<WordPool>,
        tokenizer: Arc<WikipediaTokenizer>,
        leaderboard: Leaderboard,
        config: &AppConfig,
    ) -> Self {
        Self {
            pool,
            tokenizer,
            leaderboard,
            fetch_timeout: config.fetch_timeout(),
            state: UiState::new(config.game_options()),
            screen: Screen::Menu,
            play_state: None,
            top_scores: Vec::new(),
            event_tx: None,
            next_fetch_id: 0,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.state
            .set_status(format!("Loaded {} words", self.pool.len()));
        self.refresh_leaderboard();

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
        }

        if let Some(state) = self.play_state.as_mut() {
            state.cancel_pending();
        }
        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    error!(?err, "Input handling failed");
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            Some(AppEvent::ArticleFetched { id, title, result }) => {
                self.handle_article_fetched(id, title, result);
                true
            }
            None => false,
        }
    }

    fn handle_tick(&mut self) {
        let pending = self
            .play_state
            .as_ref()
            .and_then(|state| state.pending.as_ref());
        if let Some(pending) = pending {
            self.state.set_status(format!(
                "Fetching '{}'… {}s (Esc cancels)",
                pending.title,
                pending.started.elapsed().as_secs()
            ));
        }
    }

    fn handle_article_fetched(
        &mut self,
        id: u64,
        title: String,
        result: Result<Vec<String>, TokenizeError>,
    ) {
        let Some(state) = self.play_state.as_mut() else {
            return;
        };
        if state.pending.as_ref().map(|pending| pending.id) != Some(id) {
            debug!(id, title = %title, "Dropping stale article");
            return;
        }
        state.pending = None;
        self.record_article(&title, result);
    }

    fn record_article(&mut self, title: &str, result: Result<Vec<String>, TokenizeError>) {
        let Some(state) = self.play_state.as_mut() else {
            return;
        };
        match state.session.record(title, result) {
            Ok(outcome) => {
                state.last_hits = outcome.events.iter().map(|event| event.position).collect();
                if outcome.won {
                    state.input.clear();
                    self.state.set_status(format!(
                        "Bingo in {} submissions! Enter your name for the leaderboard",
                        state.session.score()
                    ));
                } else if let Some(err) = outcome.fetch_error {
                    self.state.set_status(format!("{title}: {err}"));
                } else {
                    self.state.set_status(format!(
                        "{title}: {} board word(s) matched",
                        outcome.events.len()
                    ));
                }
            }
            Err(err) => {
                warn!(%err, title, "Submission rejected");
                self.state.set_status(err.to_string());
            }
        }
    }

    fn refresh_leaderboard(&mut self) {
        match self.leaderboard.top(LEADERBOARD_ROWS) {
            Ok(entries) => self.top_scores = entries,
            Err(err) => {
                warn!(?err, path = %self.leaderboard.path().display(), "Failed to read leaderboard");
                self.state
                    .set_status(format!("Failed to load leaderboard: {err}"));
            }
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => match self.screen {
                Screen::Menu => self.handle_menu_key(key),
                Screen::Play => self.handle_play_key(key),
            },
            Event::Key(_) => Ok(()),
            Event::Resize(_, _) => Ok(()),
            Event::Mouse(_) => Ok(()),
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => Ok(()),
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.state.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.move_menu_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_menu_cursor(-1),
            KeyCode::Char('h') | KeyCode::Left => self.state.cycle_option(-1),
            KeyCode::Char('l') | KeyCode::Right => self.state.cycle_option(1),
            KeyCode::Enter => match self.state.menu_cursor {
                0 | 1 => self.state.cycle_option(1),
                2 => self.start_game(),
                3 => self.state.should_quit = true,
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn start_game(&mut self) {
        let options = self.state.game_options();
        match GameSession::new(Arc::clone(&self.pool), options) {
            Ok(session) => {
                info!(
                    size = options.board_size,
                    limit = options.limit,
                    "Game started"
                );
                self.play_state = Some(PlayState::new(session));
                self.screen = Screen::Play;
                self.state
                    .set_status("Type an article title and press Enter".to_string());
            }
            Err(err) => {
                error!(%err, "Failed to start game");
                self.state.set_status(format!("Cannot start game: {err}"));
            }
        }
    }

    fn handle_play_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers == KeyModifiers::CONTROL {
            match key.code {
                KeyCode::Char('q') => {
                    self.leave_game("Returned to menu");
                    return Ok(());
                }
                KeyCode::Char('r') => {
                    self.restart_game();
                    return Ok(());
                }
                _ => {}
            }
        }

        match key.code {
            KeyCode::Esc => self.handle_play_escape(),
            KeyCode::Enter => self.submit_input()?,
            _ => {
                if let Some(state) = self.play_state.as_mut() {
                    edit_input(&mut state.input, key);
                }
            }
        }
        Ok(())
    }

    fn handle_play_escape(&mut self) {
        let Some(state) = self.play_state.as_mut() else {
            self.screen = Screen::Menu;
            return;
        };
        if let Some(pending) = state.cancel_pending() {
            info!(title = %pending.title, "Fetch cancelled");
            self.record_article(&pending.title, Err(TokenizeError::Cancelled));
        } else if state.session.is_won() {
            self.leave_game("Score discarded");
        } else {
            self.state
                .set_status("Ctrl-Q or \\q returns to the menu".to_string());
        }
    }

    fn submit_input(&mut self) -> Result<()> {
        let Some(state) = self.play_state.as_mut() else {
            return Ok(());
        };
        if state.input.value().trim() == QUIT_COMMAND {
            self.leave_game("Returned to menu");
            return Ok(());
        }
        if state.pending.is_some() {
            self.state
                .set_status("Still fetching the previous article (Esc cancels)".to_string());
            return Ok(());
        }

        let won = state.session.is_won();
        let text = state.input.take().trim().to_string();
        if won {
            self.record_winner(&text);
        } else if text.is_empty() {
            self.record_article(&text, Err(TokenizeError::NotFound(text.clone())));
        } else {
            self.start_fetch(text);
        }
        Ok(())
    }

    fn start_fetch(&mut self, title: String) {
        let Some(event_tx) = self.event_tx.clone() else {
            return;
        };
        let Some(state) = self.play_state.as_mut() else {
            return;
        };

        self.next_fetch_id += 1;
        let id = self.next_fetch_id;
        let cancellation = Cancellation::with_timeout(self.fetch_timeout);
        state.pending = Some(PendingFetch {
            id,
            title: title.clone(),
            cancellation: cancellation.clone(),
            started: Instant::now(),
        });
        self.state.set_status(format!("Fetching '{title}'…"));
        info!(id, title = %title, "Fetching article");

        let tokenizer = Arc::clone(&self.tokenizer);
        spawn(async move {
            let lookup = title.clone();
            let result =
                task::spawn_blocking(move || tokenizer.fetch_and_tokenize(&lookup, &cancellation))
                    .await
                    .unwrap_or_else(|err| Err(TokenizeError::Fetch(err.to_string())));
            if event_tx
                .send(AppEvent::ArticleFetched { id, title, result })
                .await
                .is_err()
            {
                debug!(id, "Article arrived after the UI shut down");
            }
        });
    }

    fn record_winner(&mut self, name: &str) {
        let Some(score) = self
            .play_state
            .as_ref()
            .map(|state| state.session.score())
        else {
            return;
        };
        match self.leaderboard.record(score, name) {
            Ok(rank) => {
                self.refresh_leaderboard();
                self.leave_game(&format!("{name} placed #{rank} with a score of {score}"));
            }
            Err(err) => {
                warn!(?err, "Leaderboard update failed");
                self.state
                    .set_status(format!("Could not record score: {err}"));
            }
        }
    }

    fn restart_game(&mut self) {
        let Some(state) = self.play_state.as_mut() else {
            return;
        };
        state.cancel_pending();
        match state.session.restart() {
            Ok(()) => {
                state.input.clear();
                state.last_hits.clear();
                self.state.set_status("New board dealt".to_string());
            }
            Err(err) => {
                error!(%err, "Restart failed");
                self.state.set_status(format!("Restart failed: {err}"));
            }
        }
    }

    fn leave_game(&mut self, message: &str) {
        if let Some(mut state) = self.play_state.take() {
            state.cancel_pending();
        }
        self.screen = Screen::Menu;
        self.state.set_status(message.to_string());
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Menu => self.draw_menu(frame),
            Screen::Play => self.draw_play(frame),
        }
    }

    fn draw_menu(&self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        let banner = Paragraph::new(Line::from(Span::styled(
            "W I K I   B I N G O",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(banner, layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[1]);

        let size = self.state.board_size();
        let labels = [
            format!("Board size  ◀ {size}×{size} ▶"),
            format!("Difficulty  ◀ {} ▶", self.state.difficulty),
            "Start".to_string(),
            "Quit".to_string(),
        ];
        let menu_lines: Vec<Line> = labels
            .into_iter()
            .enumerate()
            .flat_map(|(idx, label)| {
                let item = if idx == self.state.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {label}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {label}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                };
                [item, Line::from("")]
            })
            .collect();
        let menu_height = (menu_lines.len() as u16).saturating_add(2);
        let menu_area = centered_rect(34, menu_height, body[0]);
        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Left);
        frame.render_widget(menu, menu_area);

        self.render_leaderboard(frame, body[1]);
        self.render_status(frame, layout[2]);
    }

    fn render_leaderboard(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Leaderboard");
        let lines: Vec<Line> = if self.top_scores.is_empty() {
            vec![Line::from(Span::styled(
                "No wins yet",
                Style::default().fg(self.theme.muted),
            ))]
        } else {
            self.top_scores
                .iter()
                .enumerate()
                .map(|(idx, entry)| {
                    Line::from(vec![
                        Span::styled(
                            format!("{:>2}. ", idx + 1),
                            Style::default().fg(self.theme.muted),
                        ),
                        Span::styled(
                            format!("{:>4}  ", entry.score),
                            Style::default()
                                .fg(self.theme.accent)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(entry.name.clone()),
                    ])
                })
                .collect()
        };
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_play(&self, frame: &mut Frame) {
        let area = frame.size();
        let Some(state) = self.play_state.as_ref() else {
            let paragraph = Paragraph::new("No game in progress")
                .block(Block::default().borders(Borders::ALL).title("Play"))
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
            return;
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(6),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(38)])
            .split(rows[0]);

        self.render_board(frame, top[0], state);
        self.render_sidebar(frame, top[1], state);
        self.render_input(frame, rows[1], state);
        self.render_status(frame, rows[2]);
    }

    fn render_board(&self, frame: &mut Frame, area: Rect, state: &PlayState) {
        let board = state.session.board();
        let size = board.size();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Board {size}×{size}"));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if size == 0 {
            return;
        }

        let lines = WinDetector::winning_lines(board);
        let bordered = usize::from(inner.height) / size >= 4;
        let ratios = vec![Constraint::Ratio(1, size as u32); size];
        let row_areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(ratios.clone())
            .split(inner);

        for (row, cells) in board.rows().enumerate() {
            let col_areas = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(ratios.clone())
                .split(row_areas[row]);
            for (col, cell) in cells.iter().enumerate() {
                let position = Position::new(row, col);
                let winning = lines.iter().any(|line| line.contains(position));
                let style = cell_style(&self.theme, cell, winning, state.last_hits.contains(&position));
                let mut paragraph = Paragraph::new(vec![
                    Line::from(cell.word.to_string()),
                    Line::from(format!("{}/{}", cell.count, cell.limit)),
                ])
                .style(style)
                .alignment(Alignment::Center);
                if bordered {
                    paragraph = paragraph.block(Block::default().borders(Borders::ALL));
                }
                frame.render_widget(paragraph, col_areas[col]);
            }
        }
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect, state: &PlayState) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(3)])
            .split(area);

        let session = &state.session;
        let options = session.options();
        let difficulty = options
            .difficulty()
            .map(|difficulty| difficulty.label())
            .unwrap_or("Custom");
        let key = Style::default().add_modifier(Modifier::BOLD);
        let mut info = vec![
            Line::from(vec![
                Span::styled("Score ", key),
                Span::styled(
                    session.score().to_string(),
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(format!(
                "Board {0}×{0}  {difficulty} (limit {1})",
                options.board_size, options.limit
            )),
            Line::from(format!("Vocabulary {} words", self.pool.len())),
        ];
        if session.is_won() {
            info.push(Line::from(Span::styled(
                "BINGO!",
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        info.push(Line::from(""));
        info.push(Line::from(vec![
            Span::styled("Enter", key),
            Span::raw(" submit  "),
            Span::styled("Esc", key),
            Span::raw(" cancel"),
        ]));
        info.push(Line::from(vec![
            Span::styled("Ctrl-R", key),
            Span::raw(" restart  "),
            Span::styled("Ctrl-Q", key),
            Span::raw(" menu"),
        ]));
        let paragraph = Paragraph::new(info)
            .block(Block::default().borders(Borders::ALL).title("Game"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, sections[0]);

        let messages: Vec<Line> = session
            .messages()
            .iter()
            .enumerate()
            .map(|(idx, message)| {
                let style = if idx == 0 {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else if message == NOT_FOUND_MESSAGE {
                    Style::default().fg(self.theme.danger)
                } else if message == NO_MATCHES_MESSAGE {
                    Style::default().fg(self.theme.muted)
                } else if message.trim_start().starts_with("OVERFLOW") {
                    Style::default().fg(self.theme.warning)
                } else {
                    Style::default().fg(self.theme.primary_fg)
                };
                Line::from(Span::styled(message.clone(), style))
            })
            .collect();
        let paragraph = Paragraph::new(messages)
            .block(Block::default().borders(Borders::ALL).title("Last article"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, sections[1]);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect, state: &PlayState) {
        let title = if state.session.is_won() {
            "Your name"
        } else if state.pending.is_some() {
            "Fetching…"
        } else {
            "Article title"
        };
        let line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(state.input.value().to_string()),
        ]);
        let paragraph =
            Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);

        let cursor_x = (area.x + 3 + state.input.cursor_column())
            .min(area.x + area.width.saturating_sub(2));
        frame.set_cursor(cursor_x, area.y + 1);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let line = Line::from(vec![
            Span::styled(
                Local::now().format("%H:%M:%S ").to_string(),
                Style::default().fg(self.theme.muted),
            ),
            Span::raw(self.state.status.clone()),
        ]);
        let paragraph = Paragraph::new(line).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn edit_input(input: &mut TextInput, key: KeyEvent) {
    match key.code {
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Char(ch) => {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                input.insert(ch);
            }
        }
        _ => {}
    }
}

fn cell_style(theme: &Theme, cell: &Cell, winning: bool, hit: bool) -> Style {
    let mut style = if winning {
        Style::default().bg(theme.success).fg(theme.on_accent)
    } else {
        match fill_color(theme, cell) {
            Some(color) => Style::default().bg(color).fg(theme.on_accent),
            None => Style::default().fg(theme.primary_fg),
        }
    };
    if hit {
        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    }
    style
}

/// Tint for a cell by how close it is to overflowing; untouched cells stay plain.
fn fill_color(theme: &Theme, cell: &Cell) -> Option<Color> {
    if cell.count == 0 {
        return None;
    }
    Some(match cell.fill_band(FILL_BANDS) {
        0 => theme.cool,
        1 => theme.warning,
        _ => theme.danger,
    })
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    status: String,
    should_quit: bool,
    menu_cursor: usize,
    size_index: usize,
    difficulty: Difficulty,
}

impl UiState {
    fn new(options: GameOptions) -> Self {
        let size_index = BOARD_SIZES
            .iter()
            .position(|&size| size == options.board_size)
            .unwrap_or(BOARD_SIZES.len() / 2);
        Self {
            status: "Ready".to_string(),
            should_quit: false,
            menu_cursor: 0,
            size_index,
            difficulty: options.difficulty().unwrap_or_default(),
        }
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn move_menu_cursor(&mut self, delta: isize) {
        let options = MENU_ITEMS as isize;
        let mut idx = self.menu_cursor as isize + delta;
        if idx < 0 {
            idx = 0;
        } else if idx >= options {
            idx = options - 1;
        }
        self.menu_cursor = idx as usize;
    }

    /// Step the option under the cursor, wrapping at either end.
    fn cycle_option(&mut self, delta: isize) {
        match self.menu_cursor {
            0 => self.size_index = wrap_index(self.size_index, delta, BOARD_SIZES.len()),
            1 => {
                let current = Difficulty::ALL
                    .iter()
                    .position(|&difficulty| difficulty == self.difficulty)
                    .unwrap_or_default();
                self.difficulty = Difficulty::ALL[wrap_index(current, delta, Difficulty::ALL.len())];
            }
            _ => {}
        }
    }

    fn board_size(&self) -> usize {
        BOARD_SIZES[self.size_index]
    }

    fn game_options(&self) -> GameOptions {
        GameOptions::new(self.board_size(), self.difficulty)
    }
}

fn wrap_index(index: usize, delta: isize, len: usize) -> usize {
    (index as isize + delta).rem_euclid(len as isize) as usize
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wikibingo_core::Word;

    fn app_with_game(leaderboard: Leaderboard) -> WikiBingoApp {
        let pool = WordPool::from_words((0..40).map(|n| format!("word{n}"))).expect("pool");
        let config = AppConfig {
            board_size: 3,
            ..AppConfig::default()
        };
        let mut app = WikiBingoApp::new(
            Arc::new(pool),
            Arc::new(WikipediaTokenizer::default()),
            leaderboard,
            &config,
        );
        app.start_game();
        app
    }

    #[test]
    fn empty_title_counts_as_a_missing_article() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_with_game(Leaderboard::new(dir.path().join("leaderboard.csv")));
        assert_eq!(app.screen, Screen::Play);

        app.submit_input()?;

        let state = app.play_state.as_ref().expect("game in progress");
        assert!(state.pending.is_none());
        assert_eq!(state.session.score(), 1);
        assert_eq!(state.session.messages(), &[":", NOT_FOUND_MESSAGE, NO_MATCHES_MESSAGE]);
        Ok(())
    }

    #[test]
    fn text_input_edits_multibyte_titles() {
        let mut input = TextInput::default();
        for ch in "Zürich".chars() {
            input.insert(ch);
        }
        input.move_left();
        input.move_left();
        input.move_left();
        input.move_left();
        input.backspace();
        assert_eq!(input.value(), "Zrich");
        assert_eq!(input.cursor_column(), 1);

        input.insert('ü');
        input.move_end();
        input.insert('\n');
        assert_eq!(input.take(), "Zürich");
        assert_eq!(input.value(), "");
        assert_eq!(input.cursor_column(), 0);
    }

    #[test]
    fn menu_options_wrap_around() {
        let mut state = UiState::new(GameOptions::new(7, Difficulty::Hard));
        assert_eq!(state.board_size(), 7);

        state.cycle_option(1);
        assert_eq!(state.board_size(), 3);

        state.move_menu_cursor(1);
        state.cycle_option(1);
        assert_eq!(state.difficulty, Difficulty::Easy);
        assert_eq!(state.game_options(), GameOptions::new(3, Difficulty::Easy));

        state.move_menu_cursor(10);
        assert_eq!(state.menu_cursor, MENU_ITEMS - 1);
    }

    #[test]
    fn unknown_sizes_fall_back_to_the_middle_option() {
        let state = UiState::new(GameOptions { board_size: 4, limit: 4 });
        assert_eq!(state.board_size(), 5);
        assert_eq!(state.difficulty, Difficulty::Medium);
    }

    #[test]
    fn cells_are_tinted_by_fill_band() {
        let theme = Theme::default();
        let cell = |count| Cell {
            word: Word::new("cat").expect("word"),
            count,
            limit: 3,
        };
        assert_eq!(fill_color(&theme, &cell(0)), None);
        assert_eq!(fill_color(&theme, &cell(1)), Some(theme.warning));
        assert_eq!(fill_color(&theme, &cell(2)), Some(theme.danger));
        assert_eq!(
            cell_style(&theme, &cell(0), true, false).bg,
            Some(theme.success)
        );
    }
}
