use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tracing::info;

use rinkboard::auth;
use rinkboard::config;
use rinkboard::lifecycle::MatchAction;
use rinkboard::logging;
use rinkboard::model::{MatchId, MatchStatus, Position, ScoreboardRow, TeamId};
use rinkboard::provider::spawn_league_provider;
use rinkboard::state::{
    AppState, Delta, GoalField, GoalForm, LoginField, LoginForm, Modal, ProviderCommand, Screen,
    ScoreForm, apply_delta,
};
use rinkboard::store::Store;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    watched: Option<MatchId>,
    goal_players_for: Option<(MatchId, TeamId)>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
            watched: None,
            goal_players_for: None,
        }
    }

    fn send(&mut self, cmd: ProviderCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log("[WARN] League worker stopped");
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.modal.is_some() {
            self.on_modal_key(key);
            return;
        }
        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.state.help_overlay = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('b') | KeyCode::Esc => self.state.screen = Screen::Scoreboard,
            KeyCode::Enter => self.open_roster(true),
            KeyCode::Tab => self.open_roster(false),
            KeyCode::Char('R') => self.send(ProviderCommand::Refresh),
            KeyCode::Char('a') => {
                if !self.state.is_admin() {
                    self.state.modal = Some(Modal::Login(LoginForm {
                        username: config::get().admin_user.clone(),
                        password: String::new(),
                        focus: LoginField::Password,
                    }));
                }
            }
            KeyCode::Char('o') => {
                if self.state.is_admin() {
                    self.send(ProviderCommand::Logout);
                }
            }
            KeyCode::Char('s') => self.transition(MatchAction::Start),
            KeyCode::Char('p') => self.transition(MatchAction::Pause),
            KeyCode::Char('r') => self.transition(MatchAction::Resume),
            KeyCode::Char('f') => self.transition(MatchAction::Finish),
            KeyCode::Char('c') => {
                if self.on_scoreboard()
                    && self.state.can(MatchAction::Score)
                    && let Some(row) = self.state.selected_match()
                {
                    self.state.modal = Some(Modal::Score(ScoreForm {
                        match_id: row.game.id,
                        score1: row.game.score1.to_string(),
                        score2: row.game.score2.to_string(),
                        second: false,
                    }));
                }
            }
            KeyCode::Char('g') => {
                if self.on_scoreboard()
                    && self.state.can(MatchAction::Goal)
                    && let Some(row) = self.state.selected_match()
                {
                    let match_id = row.game.id;
                    let form = GoalForm::new(match_id, row.game.period);
                    self.state.modal = Some(Modal::Goal(form));
                    self.goal_players_for = None;
                    self.send(ProviderCommand::FetchGoalTeams { match_id });
                }
            }
            KeyCode::Char('x') => {
                if self.on_scoreboard()
                    && self.state.can(MatchAction::Delete)
                    && let Some(match_id) = self.state.selected_match_id()
                {
                    self.state.modal = Some(Modal::ConfirmDelete { match_id });
                }
            }
            _ => {}
        }
    }

    fn on_scoreboard(&self) -> bool {
        self.state.screen == Screen::Scoreboard
    }

    fn transition(&mut self, action: MatchAction) {
        if !self.on_scoreboard() {
            return;
        }
        if let Some(transition) = self.state.transition_for(action)
            && let Some(match_id) = self.state.selected_match_id()
        {
            self.send(ProviderCommand::Transition {
                match_id,
                transition,
            });
        }
    }

    fn open_roster(&mut self, home: bool) {
        if !self.on_scoreboard() {
            return;
        }
        let Some(row) = self.state.selected_match() else {
            return;
        };
        let (team_id, team_name) = if home {
            (row.game.team1_id, row.team1_label())
        } else {
            (row.game.team2_id, row.team2_label())
        };
        self.state.screen = Screen::Roster;
        self.state.roster.clear();
        self.state.roster_team = Some(team_name.clone());
        self.send(ProviderCommand::FetchRoster { team_id, team_name });
    }

    fn on_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.state.modal.as_mut() else {
            return;
        };
        if key.code == KeyCode::Esc {
            self.state.modal = None;
            return;
        }

        let mut submit = None;
        let mut close = false;
        match modal {
            Modal::Login(form) => match key.code {
                KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
                    form.focus = match form.focus {
                        LoginField::Username => LoginField::Password,
                        LoginField::Password => LoginField::Username,
                    };
                }
                KeyCode::Backspace => {
                    focused_login_text(form).pop();
                }
                KeyCode::Char(ch) => focused_login_text(form).push(ch),
                KeyCode::Enter => {
                    submit = Some(ProviderCommand::Login {
                        username: form.username.clone(),
                        password: form.password.clone(),
                    });
                }
                _ => {}
            },
            Modal::Score(form) => match key.code {
                KeyCode::Tab | KeyCode::Left | KeyCode::Right => form.second = !form.second,
                KeyCode::Backspace => {
                    form.focused_mut().pop();
                }
                KeyCode::Char(ch) if ch.is_ascii_digit() => form.focused_mut().push(ch),
                KeyCode::Enter => {
                    if let Some((score1, score2)) = form.parsed() {
                        submit = Some(ProviderCommand::UpdateScore {
                            match_id: form.match_id,
                            score1,
                            score2,
                        });
                        close = true;
                    }
                }
                _ => {}
            },
            Modal::Goal(form) => match key.code {
                KeyCode::Tab => form.focus = form.focus.next(),
                KeyCode::Up | KeyCode::Left => form.step(false),
                KeyCode::Down | KeyCode::Right => form.step(true),
                KeyCode::Backspace => {
                    if let Some(text) = form.focused_text_mut() {
                        text.pop();
                    }
                }
                KeyCode::Char(ch) if ch.is_ascii_digit() || ch == ':' => {
                    if let Some(text) = form.focused_text_mut() {
                        text.push(ch);
                    }
                }
                KeyCode::Enter => {
                    if let Some(goal) = form.submission() {
                        submit = Some(ProviderCommand::RecordGoal(goal));
                        close = true;
                    }
                }
                _ => {}
            },
            Modal::ConfirmDelete { match_id } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    submit = Some(ProviderCommand::DeleteMatch {
                        match_id: *match_id,
                    });
                    close = true;
                }
                KeyCode::Char('n') => close = true,
                _ => {}
            },
        }

        if close {
            self.state.modal = None;
        }
        if let Some(cmd) = submit {
            self.send(cmd);
        } else if key.code == KeyCode::Enter
            && matches!(self.state.modal, Some(Modal::Score(_) | Modal::Goal(_)))
        {
            self.state.push_log("[WARN] Form is incomplete");
        }
    }

    /// Keeps the worker watching the selected match for its goal log.
    fn sync_watch(&mut self) {
        let selected = self.state.selected_match_id();
        if selected != self.watched {
            self.watched = selected;
            if let Some(match_id) = selected {
                self.send(ProviderCommand::Watch { match_id });
            }
        }
    }

    /// Loads the goal modal's player list once its team is known.
    fn sync_goal_players(&mut self) {
        let Some(Modal::Goal(form)) = self.state.modal.as_ref() else {
            self.goal_players_for = None;
            return;
        };
        let Some(team) = form.team() else {
            return;
        };
        let key = (form.match_id, team.id);
        if form.players.is_empty() && self.goal_players_for != Some(key) {
            let team_id = team.id;
            self.goal_players_for = Some(key);
            self.send(ProviderCommand::FetchGoalPlayers { team_id });
        }
    }
}

fn focused_login_text(form: &mut LoginForm) -> &mut String {
    match form.focus {
        LoginField::Username => &mut form.username,
        LoginField::Password => &mut form.password,
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = config::get();
    if let Some(path) = cfg.log_file.as_deref() {
        logging::init_file(path)?;
    }
    let db_path = parse_db_path_arg().unwrap_or_else(|| cfg.db_path.clone());
    let store = Store::open(&db_path)?;
    if let Some(password) = cfg.admin_password.as_deref() {
        auth::ensure_admin(&store, &cfg.admin_user, password)
            .context("seed admin account")?;
    }
    info!(db = %db_path.display(), "terminal.start");

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_league_provider(store, cfg.transition_policy, cfg.refresh, tx, cmd_rx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--db=") {
            return Some(PathBuf::from(value));
        }
        if arg == "--db" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.sync_watch();
        app.sync_goal_players();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Scoreboard => render_scoreboard(frame, chunks[1], &app.state),
        Screen::Roster => render_roster(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if let Some(modal) = app.state.modal.as_ref() {
        render_modal(frame, frame.size(), modal);
    } else if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = match state.screen {
        Screen::Scoreboard => format!("RINKBOARD | {} matches", state.matches.len()),
        Screen::Roster => format!(
            "RINKBOARD ROSTER | {}",
            state.roster_team.as_deref().unwrap_or("-")
        ),
    };
    let session = match state.admin.as_deref() {
        Some(user) => format!("admin: {user}"),
        None => "read-only".to_string(),
    };
    format!("  ___  {title}\n |___| {session}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Scoreboard => {
            let mut keys = vec!["j/k Move", "Enter/Tab Roster", "R Reload"];
            if state.is_admin() {
                let admin_keys = [
                    (MatchAction::Start, "s Start"),
                    (MatchAction::Pause, "p Pause"),
                    (MatchAction::Resume, "r Resume"),
                    (MatchAction::Finish, "f Finish"),
                    (MatchAction::Score, "c Score"),
                    (MatchAction::Goal, "g Goal"),
                    (MatchAction::Delete, "x Delete"),
                ];
                keys.extend(
                    admin_keys
                        .iter()
                        .filter(|(action, _)| state.can(*action))
                        .map(|(_, label)| *label),
                );
                keys.push("o Logout");
            } else {
                keys.push("a Login");
            }
            keys.extend(["? Help", "q Quit"]);
            keys.join(" | ")
        }
        Screen::Roster => "b/Esc Back | j/k Move | ? Help | q Quit".to_string(),
    }
}

fn render_scoreboard(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);

    render_match_list(frame, columns[0], state);

    let detail = Paragraph::new(match_detail_text(state))
        .block(Block::default().title("Match").borders(Borders::ALL));
    frame.render_widget(detail, columns[1]);
}

fn match_columns() -> [Constraint; 5] {
    [
        Constraint::Length(14),
        Constraint::Min(20),
        Constraint::Length(9),
        Constraint::Length(17),
        Constraint::Length(4),
    ]
}

fn render_match_list(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = match_columns();
    let header_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(sections[0]);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    for (col, label) in header_cols.iter().zip(["Status", "Match", "Score", "Date", "P"]) {
        render_cell_text(frame, *col, label, bold);
    }

    let list_area = sections[1];
    if state.matches.is_empty() {
        let msg = if state.loaded {
            "No matches yet"
        } else {
            "Loading scoreboard..."
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    const ROW_HEIGHT: u16 = 3;
    if list_area.height < ROW_HEIGHT {
        let empty = Paragraph::new("Scoreboard needs more height")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let visible = (list_area.height / ROW_HEIGHT) as usize;
    let (start, end) = visible_range(state.selected, state.matches.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + (i as u16) * ROW_HEIGHT,
            width: list_area.width,
            height: ROW_HEIGHT,
        };

        let selected = idx == state.selected;
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let row = &state.matches[idx];
        let status_style = row_style.fg(status_color(row));
        let name = format!("{} vs {}", row.team1_label(), row.team2_label());
        let score = format!("{} : {}", row.game.score1, row.game.score2);
        let period = if row.game.status.shows_period() {
            row.game.period.to_string()
        } else {
            String::new()
        };

        render_cell_text(frame, cols[0], row.game.status.label(), status_style);
        render_cell_text(frame, cols[1], &name, row_style);
        render_cell_text(frame, cols[2], &score, row_style);
        render_cell_text(frame, cols[3], &format_date(&row.game.date_time), row_style);
        render_cell_text(frame, cols[4], &period, row_style);
    }
}

fn status_color(row: &ScoreboardRow) -> Color {
    match row.game.status {
        MatchStatus::Scheduled => Color::Gray,
        MatchStatus::Live => Color::Green,
        MatchStatus::Intermission => Color::Yellow,
        MatchStatus::Finished => Color::Blue,
    }
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, text_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn match_detail_text(state: &AppState) -> String {
    let Some(row) = state.selected_match() else {
        return "No match selected".to_string();
    };
    let game = &row.game;
    let mut lines = vec![
        format!(
            "{} ({})",
            row.team1_label(),
            row.team1_city.as_deref().unwrap_or("-")
        ),
        format!(
            "{} ({})",
            row.team2_label(),
            row.team2_city.as_deref().unwrap_or("-")
        ),
        String::new(),
        format!("{}   {} : {}", game.status.label(), game.score1, game.score2),
        format!("Date: {}", format_date(&game.date_time)),
    ];
    if game.status.shows_period() {
        lines.push(format!("Period: {}", game.period));
    }
    lines.push(String::new());
    lines.push("Goals:".to_string());

    if state.goals_match_id != Some(game.id) {
        lines.push("  loading...".to_string());
    } else if state.goals.is_empty() {
        lines.push("  none".to_string());
    } else {
        for entry in &state.goals {
            let team = if entry.goal.team_id == game.team1_id {
                row.team1_label()
            } else if entry.goal.team_id == game.team2_id {
                row.team2_label()
            } else {
                format!("Team #{}", entry.goal.team_id)
            };
            let scorer = match (entry.player_number, entry.player_name.as_deref()) {
                (Some(number), Some(name)) => format!("#{number} {name}"),
                (None, Some(name)) => name.to_string(),
                _ => format!("Player #{}", entry.goal.player_id),
            };
            lines.push(format!(
                "  P{} {}  {} - {}",
                entry.goal.period, entry.goal.time, team, scorer
            ));
        }
    }
    lines.join("\n")
}

fn render_roster(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = state.roster_team.as_deref().unwrap_or("Roster");
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.roster.is_empty() {
        let empty = Paragraph::new("No players").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let header = format!("{:>4}  {:<28} {:<11} {:>5} {:>5}", "No", "Name", "Position", "G", "A");
    frame.render_widget(Paragraph::new(header).style(bold), sections[0]);

    let list_area = sections[1];
    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.roster_selected, state.roster.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let player = &state.roster[idx];
        let style = if idx == state.roster_selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        let line = format!(
            "{:>4}  {:<28} {:<11} {:>5} {:>5}",
            player.number,
            player.name,
            player.position.map_or("-", Position::as_str),
            player.goals,
            player.assists
        );
        let line_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        frame.render_widget(Paragraph::new(line).style(style), line_area);
    }
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_date(raw: &str) -> String {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return "TBD".to_string();
    }
    if let Some(dt) = parse_date(cleaned) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    cleaned.chars().take(16).collect::<String>().replace('T', " ")
}

fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];

    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_local())
}

fn render_modal(frame: &mut Frame, area: Rect, modal: &Modal) {
    let popup_area = centered_rect(50, 40, area);
    frame.render_widget(Clear, popup_area);

    let (title, text) = match modal {
        Modal::Login(form) => {
            let mark = |field: LoginField| if form.focus == field { ">" } else { " " };
            (
                "Admin login",
                format!(
                    "{} Username: {}\n{} Password: {}\n\nTab switch | Enter login | Esc cancel",
                    mark(LoginField::Username),
                    form.username,
                    mark(LoginField::Password),
                    "*".repeat(form.password.chars().count()),
                ),
            )
        }
        Modal::Score(form) => (
            "Set score",
            format!(
                "Match #{}\n\n{} Home: {}\n{} Away: {}\n\nTab switch | Enter save | Esc cancel",
                form.match_id,
                if form.second { " " } else { ">" },
                form.score1,
                if form.second { ">" } else { " " },
                form.score2,
            ),
        ),
        Modal::Goal(form) => ("Record goal", goal_form_text(form)),
        Modal::ConfirmDelete { match_id } => (
            "Delete match",
            format!("Delete match #{match_id}?\n\ny/Enter delete | n/Esc keep"),
        ),
    };

    let popup = Paragraph::new(text).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(popup, popup_area);
}

fn goal_form_text(form: &GoalForm) -> String {
    let mark = |field: GoalField| if form.focus == field { ">" } else { " " };
    let team = if form.teams.is_empty() {
        "loading...".to_string()
    } else {
        form.team().map(|t| t.name.clone()).unwrap_or_default()
    };
    let player = match form.player() {
        Some(p) => format!(
            "#{} {} ({})",
            p.number,
            p.name,
            p.position.map_or("?", Position::short)
        ),
        None if form.team().is_some() => "no players".to_string(),
        None => "-".to_string(),
    };
    format!(
        "Match #{}\n\n{} Team:   {}\n{} Player: {}\n{} Period: {}\n{} Time:   {}\n\nTab field | ↑/↓ pick | Enter save | Esc cancel",
        form.match_id,
        mark(GoalField::Team),
        team,
        mark(GoalField::Player),
        player,
        mark(GoalField::Period),
        form.period,
        mark(GoalField::Time),
        if form.time.is_empty() { "00:00" } else { form.time.as_str() },
    )
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Rinkboard - Help",
        "",
        "Scoreboard:",
        "  j/k or ↑/↓   Move",
        "  Enter / Tab  Home / away roster",
        "  b / Esc      Back",
        "  R            Reload",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Admin:",
        "  a / o        Login / logout",
        "  s p r f      Start, pause, resume, finish",
        "  c            Set score",
        "  g            Record goal",
        "  x            Delete match",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_range_keeps_selection_centered() {
        assert_eq!(visible_range(0, 0, 5), (0, 0));
        assert_eq!(visible_range(2, 3, 5), (0, 3));
        assert_eq!(visible_range(10, 20, 5), (8, 13));
        assert_eq!(visible_range(19, 20, 5), (15, 20));
    }

    #[test]
    fn dates_render_in_minutes() {
        assert_eq!(format_date("2024-03-01T19:30"), "2024-03-01 19:30");
        assert_eq!(format_date("2024-03-01 19:30:00"), "2024-03-01 19:30");
        assert_eq!(format_date(""), "TBD");
        assert_eq!(format_date("next friday"), "next friday");
    }

    fn live_row(period: u32) -> ScoreboardRow {
        ScoreboardRow {
            game: rinkboard::model::Match {
                id: 4,
                team1_id: 1,
                team2_id: 2,
                score1: 1,
                score2: 0,
                status: MatchStatus::Live,
                period,
                date_time: "2024-03-01T19:30".to_string(),
                created_at: String::new(),
            },
            team1_name: Some("Bears".to_string()),
            team1_city: None,
            team2_name: Some("Wolves".to_string()),
            team2_city: None,
        }
    }

    #[test]
    fn match_keys_open_forms_only_for_admins() {
        let (tx, rx) = mpsc::channel();
        let mut app = App::new(tx);
        apply_delta(&mut app.state, Delta::SetScoreboard(vec![live_row(2)]));

        for key in ['c', 'g', 'x'] {
            app.on_key(KeyEvent::from(KeyCode::Char(key)));
            assert!(app.state.modal.is_none());
        }

        apply_delta(&mut app.state, Delta::AdminChanged(Some("admin".to_string())));
        app.on_key(KeyEvent::from(KeyCode::Char('g')));
        match &app.state.modal {
            Some(Modal::Goal(form)) => {
                assert_eq!(form.match_id, 4);
                assert_eq!(form.period, "2");
            }
            other => panic!("expected goal form, got {other:?}"),
        }
        assert!(matches!(
            rx.try_recv(),
            Ok(ProviderCommand::FetchGoalTeams { match_id: 4 })
        ));

        app.state.modal = None;
        app.on_key(KeyEvent::from(KeyCode::Char('x')));
        assert!(matches!(
            app.state.modal,
            Some(Modal::ConfirmDelete { match_id: 4 })
        ));
    }
}
