mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
    time::Duration,
};

use quik::{
    celebration::CelebrationAnimation,
    config::{Config, ConfigStore, FileConfigStore},
    metrics::ScorePolicy,
    prompt::{BundledPromptSource, PromptSource, QuestionPack},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    score_store::{ScoreRecord, ScoreStore, ScoreSubmission},
    session::{Session, SessionPhase},
    TICK_RATE_MS,
};

/// timed trivia typing tui with a local leaderboard
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Answer trivia questions by typing them as fast and as accurately as you can. Scores land in a local leaderboard shared by everyone playing on this machine."
)]
pub struct Cli {
    /// player name scores are recorded under
    #[clap(short = 'p', long)]
    player: Option<String>,

    /// number of questions per session
    #[clap(short = 'q', long)]
    questions: Option<usize>,

    /// question pack to draw from
    #[clap(short = 'c', long, value_enum)]
    pack: Option<QuestionPack>,

    /// how many leaderboard rows to show
    #[clap(short = 'r', long)]
    ranking_limit: Option<usize>,

    /// scoring formula
    #[clap(long, value_enum)]
    score_policy: Option<ScorePolicy>,

    /// score database path (defaults to the user state directory)
    #[clap(long)]
    db: Option<PathBuf>,

    /// write this player's score history to a csv file and exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,
}

/// Effective per-run settings: config file values overridden by CLI flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub player: String,
    pub pack: QuestionPack,
    pub questions: usize,
    pub ranking_limit: usize,
    pub score_policy: ScorePolicy,
}

impl Settings {
    fn resolve(cli: &Cli, cfg: &Config) -> Self {
        Self {
            player: cli.player.clone().unwrap_or_else(|| cfg.player.clone()),
            pack: cli.pack.unwrap_or_else(|| cfg.question_pack()),
            questions: cli.questions.unwrap_or(cfg.questions_per_session).max(1),
            ranking_limit: cli.ranking_limit.unwrap_or(cfg.ranking_limit).max(1),
            score_policy: cli.score_policy.unwrap_or(cfg.score_policy),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Menu,
    Typing,
    Results,
    History,
}

pub struct App {
    pub settings: Settings,
    pub session: Session,
    pub store: Option<ScoreStore>,
    pub ranking: Vec<ScoreRecord>,
    pub history: Vec<ScoreRecord>,
    pub state: AppState,
    pub notice: Option<String>,
    pub celebration: CelebrationAnimation,
    pub submitted: bool,
}

impl App {
    pub fn new(settings: Settings, store: Option<ScoreStore>, store_notice: Option<String>) -> Self {
        let mut app = Self {
            session: Session::new(settings.score_policy),
            settings,
            store,
            ranking: Vec::new(),
            history: Vec::new(),
            state: AppState::Menu,
            notice: store_notice,
            celebration: CelebrationAnimation::new(),
            submitted: false,
        };
        app.refresh_ranking();
        app
    }

    /// Start command: fetch a prompt set and hand it to a fresh session.
    /// Any failure or an empty set lands back on the menu with a notice.
    pub fn start_session(&mut self) {
        self.session = Session::new(self.settings.score_policy);
        self.submitted = false;
        self.session.begin_loading();

        let source = BundledPromptSource::new(self.settings.pack, self.settings.questions);
        match source.fetch_prompts() {
            Ok(prompts) => self.session.prompts_ready(prompts),
            Err(e) => self.session.load_failed(&e.to_string()),
        }

        if self.session.phase() == SessionPhase::Active {
            self.notice = None;
            self.state = AppState::Typing;
        } else {
            self.state = AppState::Menu;
        }
    }

    pub fn on_tick(&mut self, width: u16, height: u16) {
        self.session.on_tick();
        self.celebration.tick(TICK_RATE_MS as f64 / 1000.0);

        if self.state == AppState::Typing && self.session.phase() == SessionPhase::Ended {
            self.finish_session(width, height);
        }
    }

    /// The session just ended: persist the summary, refresh the leaderboard,
    /// and move to the results screen. A store failure only costs the record.
    fn finish_session(&mut self, width: u16, height: u16) {
        let Some(summary) = self.session.summary().copied() else {
            self.state = AppState::Menu;
            return;
        };

        if !self.submitted {
            self.submitted = true;
            let submission = ScoreSubmission::new(summary.score, summary.wpm, summary.accuracy);
            match &self.store {
                Some(store) => {
                    match store.submit_score(&self.settings.player, submission) {
                        Ok(_) => self.refresh_ranking(),
                        Err(e) => self.notice = Some(e.to_string()),
                    }
                }
                None => self.notice = Some("score store unavailable, result not saved".into()),
            }

            if summary.accuracy == 100.0 && summary.total_chars > 0 {
                self.celebration.start(width, height);
            }
        }

        self.state = AppState::Results;
    }

    fn refresh_ranking(&mut self) {
        if let Some(store) = &self.store {
            match store.ranking(self.settings.ranking_limit) {
                Ok(ranking) => self.ranking = ranking,
                Err(e) => self.notice = Some(e.to_string()),
            }
        }
    }

    fn load_history(&mut self) {
        if let Some(store) = &self.store {
            match store.history(&self.settings.player) {
                Ok(history) => self.history = history,
                Err(e) => self.notice = Some(e.to_string()),
            }
        }
        self.state = AppState::History;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = FileConfigStore::new().load();
    let settings = Settings::resolve(&cli, &config);

    if let Some(path) = cli.export_history.as_deref() {
        return export_history(&settings, cli.db.as_deref(), path);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let (store, store_notice) = match open_store(cli.db.as_deref()) {
        Ok(store) => (Some(store), None),
        Err(e) => (None, Some(e.to_string())),
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings, store, store_notice);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn open_store(db: Option<&Path>) -> Result<ScoreStore, quik::score_store::StoreError> {
    match db {
        Some(path) => ScoreStore::open(path),
        None => ScoreStore::open_default(),
    }
}

fn export_history(
    settings: &Settings,
    db: Option<&Path>,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let store = open_store(db)?;
    let records = store.history(&settings.player)?;

    let mut writer = csv::Writer::from_path(path)?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    println!(
        "exported {} records for {} to {}",
        records.len(),
        settings.player,
        path.display()
    );
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            AppEvent::Tick => {
                let size = terminal.size().unwrap_or_default();
                app.on_tick(size.width, size.height);
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if handle_key(app, key) == Flow::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> Flow {
    // ctrl+c quits from anywhere
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }

    match app.state {
        AppState::Menu => match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Enter => app.start_session(),
            KeyCode::Char('h') => app.load_history(),
            _ => {}
        },
        AppState::Typing => match key.code {
            KeyCode::Esc => {
                app.session.abandon();
                app.state = AppState::Menu;
            }
            KeyCode::Backspace => app.session.backspace(),
            KeyCode::Tab => app.session.skip(),
            KeyCode::Char(c) => app.session.type_char(c),
            _ => {}
        },
        AppState::Results => match key.code {
            KeyCode::Esc => app.state = AppState::Menu,
            KeyCode::Enter | KeyCode::Char('r') => app.start_session(),
            KeyCode::Char('h') => app.load_history(),
            KeyCode::Char('t') => {
                if webbrowser::Browser::is_available() {
                    if let Some(summary) = app.session.summary() {
                        webbrowser::open(&format!(
                            "https://twitter.com/intent/tweet?text={:.0}%20wpm%20%2F%20{:.1}%25%20acc%20on%20quik",
                            summary.wpm, summary.accuracy
                        ))
                        .unwrap_or_default();
                    }
                }
            }
            _ => {}
        },
        AppState::History => match key.code {
            KeyCode::Esc => app.state = AppState::Menu,
            KeyCode::Char('b') | KeyCode::Backspace => {
                app.state = if app.session.summary().is_some() {
                    AppState::Results
                } else {
                    AppState::Menu
                };
            }
            _ => {}
        },
    }

    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        let settings = Settings {
            player: "ada".into(),
            pack: QuestionPack::General,
            questions: 2,
            ranking_limit: 10,
            score_policy: ScorePolicy::AccuracyWeighted,
        };
        let store = ScoreStore::open_in_memory().unwrap();
        App::new(settings, Some(store), None)
    }

    #[test]
    fn settings_prefer_cli_over_config() {
        let cli = Cli::parse_from(["quik", "-p", "grace", "-q", "5"]);
        let cfg = Config::default();
        let settings = Settings::resolve(&cli, &cfg);

        assert_eq!(settings.player, "grace");
        assert_eq!(settings.questions, 5);
        assert_eq!(settings.pack, QuestionPack::General);
        assert_eq!(settings.ranking_limit, cfg.ranking_limit);
    }

    #[test]
    fn settings_fall_back_to_config() {
        let cli = Cli::parse_from(["quik"]);
        let cfg = Config {
            player: "turing".into(),
            pack: "history".into(),
            questions_per_session: 7,
            ..Config::default()
        };
        let settings = Settings::resolve(&cli, &cfg);

        assert_eq!(settings.player, "turing");
        assert_eq!(settings.pack, QuestionPack::History);
        assert_eq!(settings.questions, 7);
    }

    #[test]
    fn start_session_moves_to_typing() {
        let mut app = test_app();
        app.start_session();

        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.session.phase(), SessionPhase::Active);
    }

    #[test]
    fn enter_starts_a_session_from_the_menu() {
        let mut app = test_app();
        let flow = handle_key(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        assert_eq!(flow, Flow::Continue);
        assert_eq!(app.state, AppState::Typing);
    }

    #[test]
    fn escape_abandons_an_active_session() {
        let mut app = test_app();
        app.start_session();
        handle_key(&mut app, KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));

        assert_eq!(app.state, AppState::Menu);
        assert_eq!(app.session.phase(), SessionPhase::Idle);
        assert!(app.session.summary().is_none());
    }

    #[test]
    fn ctrl_c_quits_from_any_state() {
        let mut app = test_app();
        let flow = handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert_eq!(flow, Flow::Quit);
    }

    #[test]
    fn finished_session_is_submitted_once() {
        let mut app = test_app();
        app.start_session();

        // Solve every prompt, letting the advance delay elapse in between.
        while app.session.phase() == SessionPhase::Active {
            let answer = app.session.current_prompt().unwrap().answer.clone();
            for c in answer.chars() {
                app.session.type_char(c);
            }
            std::thread::sleep(Duration::from_millis(
                quik::session::SOLVE_ADVANCE_MS + 50,
            ));
            app.session.on_tick();
        }

        app.on_tick(80, 24);
        assert_eq!(app.state, AppState::Results);

        // A second tick in Results must not submit again.
        app.on_tick(80, 24);
        let history = app.store.as_ref().unwrap().history("ada").unwrap();
        assert_eq!(history.len(), 1);
        assert!(!app.ranking.is_empty());
    }

    #[test]
    fn missing_store_still_shows_results() {
        let settings = Settings {
            player: "ada".into(),
            pack: QuestionPack::General,
            questions: 1,
            ranking_limit: 10,
            score_policy: ScorePolicy::AccuracyWeighted,
        };
        let mut app = App::new(settings, None, Some("score store unavailable".into()));
        app.start_session();

        while app.session.phase() == SessionPhase::Active {
            let answer = app.session.current_prompt().unwrap().answer.clone();
            for c in answer.chars() {
                app.session.type_char(c);
            }
            std::thread::sleep(Duration::from_millis(
                quik::session::SOLVE_ADVANCE_MS + 50,
            ));
            app.session.on_tick();
        }
        app.on_tick(80, 24);

        assert_eq!(app.state, AppState::Results);
        assert!(app.notice.is_some());
    }
}
