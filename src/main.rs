pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use quickdraw::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    palette::ActiveColor,
    results::{leaderboard, LeaderboardEntry, ResultsStore, SqliteResultsStore, UnavailableStore},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    session::TICK_INTERVAL_MS,
    settings::FieldMut,
    GameKind, GameSession, Outcome, Phase, SessionError,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};

const LEADERBOARD_SIZE: usize = 10;

/// reaction and attention mini-games for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed reaction and attention mini-games in the terminal: hunt the highlighted circle, beat the Stroop effect and follow the card. Every finished session is saved so you can chase your personal best and compare on the leaderboard."
)]
pub struct Cli {
    /// game to play
    #[clap(value_enum, default_value_t = GameKind::ItemHunt)]
    game: GameKind,

    /// display name of the player
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// email the results are filed under
    #[clap(short = 'e', long)]
    email: Option<String>,

    /// game time in seconds (timed games)
    #[clap(short = 'd', long)]
    duration: Option<u32>,

    /// seconds the circle takes to reach full size (growing-hunt)
    #[clap(short = 'g', long, value_parser = parse_growth)]
    growth: Option<f64>,

    /// color of the active circle (hunt games)
    #[clap(short = 'c', long, value_enum)]
    color: Option<ActiveColor>,

    /// number of cards on the table (monte)
    #[clap(long)]
    cards: Option<u32>,

    /// number of rounds to play (monte)
    #[clap(long)]
    rounds: Option<u32>,

    /// shuffles per round (monte)
    #[clap(long)]
    shuffles: Option<u32>,

    /// seed the random generator for a repeatable session
    #[clap(long)]
    seed: Option<u64>,

    /// print the leaderboard for the game and exit
    #[clap(short = 'l', long)]
    leaderboard: bool,

    /// rows to show on the leaderboard
    #[clap(long, default_value_t = LEADERBOARD_SIZE)]
    limit: usize,

    /// results database to use instead of the default location
    #[clap(long)]
    db: Option<PathBuf>,
}

fn parse_growth(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("'{raw}' is not a finite number of seconds >= 0"));
    }
    Ok(secs)
}

impl Cli {
    /// Fold command line overrides into the stored defaults
    fn apply_to(&self, config: &mut Config) {
        if let Some(name) = &self.name {
            config.player_name = name.clone();
        }
        if let Some(email) = &self.email {
            config.player_email = email.clone();
        }
        if let Some(secs) = self.duration {
            match self.game {
                GameKind::ItemHunt => config.hunt_secs = secs,
                GameKind::GrowingHunt => config.growing_secs = secs,
                GameKind::Stroop => config.stroop_secs = secs,
                GameKind::Monte => {}
            }
        }
        if let Some(growth) = self.growth {
            config.growing_growth_secs = growth;
        }
        if let Some(color) = self.color {
            match self.game {
                GameKind::ItemHunt => config.hunt_color = color,
                GameKind::GrowingHunt => config.growing_color = color,
                _ => {}
            }
        }
        if let Some(cards) = self.cards {
            config.monte_cards = cards;
        }
        if let Some(rounds) = self.rounds {
            config.monte_rounds = rounds;
        }
        if let Some(shuffles) = self.shuffles {
            config.monte_shuffles = shuffles;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Game,
    Leaderboard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub struct App {
    pub session: GameSession,
    pub state: AppState,
    pub selected_field: usize,
    pub message: Option<String>,
    pub last_outcome: Outcome,
    pub leaderboard_game: GameKind,
    pub leaderboard: Vec<LeaderboardEntry>,
    store: Rc<dyn ResultsStore>,
    config: Config,
    config_store: Box<dyn ConfigStore>,
    seed: Option<u64>,
}

impl App {
    pub fn new(
        game: GameKind,
        config: Config,
        config_store: Box<dyn ConfigStore>,
        store: Rc<dyn ResultsStore>,
        seed: Option<u64>,
    ) -> Self {
        let session = Self::new_session(&config, game, store.clone(), seed);
        Self {
            session,
            state: AppState::Game,
            selected_field: 0,
            message: None,
            last_outcome: Outcome::Unchanged,
            leaderboard_game: game,
            leaderboard: Vec::new(),
            store,
            config,
            config_store,
            seed,
        }
    }

    fn new_session(
        config: &Config,
        game: GameKind,
        store: Rc<dyn ResultsStore>,
        seed: Option<u64>,
    ) -> GameSession {
        let settings = config.settings_for(game);
        match seed {
            Some(seed) => GameSession::with_seed(config.profile(), settings, store, seed),
            None => GameSession::new(config.profile(), settings, store),
        }
    }

    /// Swap to another game. Only possible between runs.
    pub fn switch_game(&mut self, game: GameKind) {
        if self.session.phase() != Phase::Idle {
            return;
        }
        self.session = Self::new_session(&self.config, game, self.store.clone(), self.seed);
        self.selected_field = 0;
        self.leaderboard_game = game;
    }

    fn cycle_game(&mut self, forward: bool) -> GameKind {
        let current = match self.state {
            AppState::Game => self.session.game(),
            AppState::Leaderboard => self.leaderboard_game,
        };
        let idx = GameKind::ALL.iter().position(|g| *g == current).unwrap_or(0);
        let len = GameKind::ALL.len();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        GameKind::ALL[next]
    }

    pub fn show_leaderboard(&mut self, game: GameKind) {
        self.leaderboard_game = game;
        self.leaderboard = match leaderboard(self.store.as_ref(), game, LEADERBOARD_SIZE) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("leaderboard unavailable: {e}");
                self.message = Some(format!("leaderboard unavailable: {e}"));
                Vec::new()
            }
        };
        self.state = AppState::Leaderboard;
    }

    pub fn on_tick(&mut self) {
        match self.session.tick() {
            Ok(Outcome::Unchanged) => {}
            Ok(outcome) => self.last_outcome = outcome,
            Err(e) => {
                log::error!("session tick failed: {e}");
                self.message = Some(e.to_string());
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        let result = match self.state {
            AppState::Leaderboard => Ok(self.on_leaderboard_key(key)),
            AppState::Game => match self.session.phase() {
                Phase::Idle => self.on_setup_key(key),
                Phase::Countdown => self.on_countdown_key(key),
                Phase::Active => self.on_play_key(key),
                Phase::Finished => self.on_summary_key(key),
            },
        };

        match result {
            Ok(action) => action,
            Err(e) => {
                self.message = Some(e.to_string());
                KeyAction::Continue
            }
        }
    }

    fn start(&mut self) -> Result<KeyAction, SessionError> {
        self.message = None;
        self.last_outcome = self.session.start()?;
        self.config.remember(self.session.settings());
        if let Err(e) = self.config_store.save(&self.config) {
            log::warn!("could not save config: {e}");
        }
        Ok(KeyAction::Continue)
    }

    fn on_setup_key(&mut self, key: KeyEvent) -> Result<KeyAction, SessionError> {
        let field_count = self.session.settings().field_labels().len();
        match key.code {
            KeyCode::Esc => return Ok(KeyAction::Quit),
            KeyCode::Enter => return self.start(),
            KeyCode::Tab => {
                let game = self.cycle_game(true);
                self.switch_game(game);
            }
            KeyCode::BackTab => {
                let game = self.cycle_game(false);
                self.switch_game(game);
            }
            KeyCode::Up => self.selected_field = self.selected_field.saturating_sub(1),
            KeyCode::Down => {
                self.selected_field = (self.selected_field + 1).min(field_count.saturating_sub(1))
            }
            KeyCode::Char('l') => self.show_leaderboard(self.session.game()),
            code => {
                let idx = self.selected_field;
                match (self.session.settings_mut()?.field_mut(idx), code) {
                    (Some(FieldMut::Text(text)), KeyCode::Char(c))
                        if c.is_ascii_digit() || c == '.' || c == '-' =>
                    {
                        text.push(c)
                    }
                    (Some(FieldMut::Text(text)), KeyCode::Backspace) => {
                        text.pop();
                    }
                    (Some(FieldMut::Color(color)), KeyCode::Right | KeyCode::Char(' ')) => {
                        *color = color.next()
                    }
                    (Some(FieldMut::Color(color)), KeyCode::Left) => *color = color.prev(),
                    _ => {}
                }
                self.message = None;
            }
        }
        Ok(KeyAction::Continue)
    }

    fn on_countdown_key(&mut self, key: KeyEvent) -> Result<KeyAction, SessionError> {
        if key.code == KeyCode::Esc {
            self.last_outcome = self.session.end()?;
        }
        Ok(KeyAction::Continue)
    }

    fn on_play_key(&mut self, key: KeyEvent) -> Result<KeyAction, SessionError> {
        self.last_outcome = match key.code {
            KeyCode::Esc => self.session.end()?,
            KeyCode::Char(' ') => self.session.begin_shuffle()?,
            KeyCode::Enter => self.session.next_round()?,
            KeyCode::Char(c) => {
                let idx = self.session.round().and_then(|r| ui::key_to_index(r, c));
                match idx {
                    Some(idx) => self.session.tap(idx)?,
                    None => return Ok(KeyAction::Continue),
                }
            }
            _ => return Ok(KeyAction::Continue),
        };
        Ok(KeyAction::Continue)
    }

    fn on_summary_key(&mut self, key: KeyEvent) -> Result<KeyAction, SessionError> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Ok(KeyAction::Quit),
            KeyCode::Enter | KeyCode::Char('r') => return self.start(),
            KeyCode::Char('b') | KeyCode::Backspace => {
                self.last_outcome = self.session.return_to_idle()?;
            }
            KeyCode::Char('l') => self.show_leaderboard(self.session.game()),
            _ => {}
        }
        Ok(KeyAction::Continue)
    }

    fn on_leaderboard_key(&mut self, key: KeyEvent) -> KeyAction {
        match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                self.state = AppState::Game;
                self.message = None;
            }
            KeyCode::Tab => {
                let game = self.cycle_game(true);
                self.show_leaderboard(game);
            }
            KeyCode::BackTab => {
                let game = self.cycle_game(false);
                self.show_leaderboard(game);
            }
            _ => {}
        }
        KeyAction::Continue
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply_to(&mut config);
    let store = open_store(cli.db.as_deref());

    if cli.leaderboard {
        let mut out = io::stdout().lock();
        print_leaderboard(store.as_ref(), cli.game, cli.limit, &mut out)?;
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(cli.game, config, Box::new(config_store), store, cli.seed);
    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    res
}

/// Logs go to a file in the state dir so they never garble the TUI.
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

/// Open the results database, degrading to an always-failing store so the
/// games stay playable without one.
fn open_store(db: Option<&Path>) -> Rc<dyn ResultsStore> {
    let opened = match db {
        Some(path) => SqliteResultsStore::open(path),
        None => SqliteResultsStore::open_default(),
    };
    match opened {
        Ok(store) => Rc::new(store),
        Err(e) => {
            log::warn!("results will not be saved: {e}");
            Rc::new(UnavailableStore::new(e.to_string()))
        }
    }
}

fn print_leaderboard<W: Write>(
    store: &dyn ResultsStore,
    game: GameKind,
    limit: usize,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let entries = leaderboard(store, game, limit)?;
    let direction = match game.polarity() {
        quickdraw::game::Polarity::LowerIsBetter => "lower",
        quickdraw::game::Polarity::HigherIsBetter => "higher",
    };
    writeln!(
        out,
        "{} leaderboard ({}, {} is better)",
        game.title(),
        game.derived_label().to_lowercase(),
        direction
    )?;

    if entries.is_empty() {
        writeln!(out, "no results yet")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:>3}  {:<30} {:>10} {:>10} {:>8}  last played",
        "#", "player", "best", "mean", "sessions"
    )?;
    for (rank, entry) in entries.iter().enumerate() {
        writeln!(
            out,
            "{:>3}  {:<30} {:>10.2} {:>10.2} {:>8}  {}",
            rank + 1,
            entry.player_id,
            entry.best,
            entry.mean,
            entry.sessions,
            entry.last_played.format("%Y-%m-%d %H:%M")
        )?;
    }
    Ok(())
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_INTERVAL_MS as u64)),
    );

    loop {
        terminal.draw(|f| ui::ui(app, f))?;

        match runner.step() {
            GameEvent::Tick => app.on_tick(),
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                if app.on_key(key) == KeyAction::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}
