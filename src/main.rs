pub mod ui;

use std::{
    collections::HashMap,
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
};

use arithmo::{
    app_dirs::AppDirs,
    attempt::{parse_answer, Attempt},
    error::SessionError,
    problem::{Difficulty, Operator, OperatorSet},
    records::JsonRecordStore,
    runtime::{AppEvent, Runner},
    settings::{FileSettingsStore, Settings, SettingsStore},
    stats::StatsReport,
    trainer::Trainer,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ARITHMO_LOG";
const DEFAULT_LOG_FILTER: &str = "arithmo=info";
const MAX_INPUT_LEN: usize = 12;

/// mental arithmetic trainer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practise arithmetic in the terminal: free practice with navigable history, timed challenges, and statistics over your recent days."
)]
pub struct Cli {
    /// difficulty of generated problems
    #[clap(short, long, value_enum)]
    difficulty: Option<Difficulty>,

    /// operators to practise, comma separated (e.g. `+,-` or `mul,div`)
    #[clap(short, long, value_delimiter = ',')]
    operations: Option<Vec<Operator>>,

    /// seconds allowed for a timed challenge
    #[clap(short = 's', long)]
    time_limit: Option<u64>,

    /// number of questions in a timed challenge
    #[clap(short = 'n', long)]
    question_count: Option<usize>,

    /// start straight into a timed challenge
    #[clap(short, long)]
    timed: bool,

    /// whose settings to load and save
    #[clap(short, long, default_value = "guest")]
    user: String,

    /// directory for records, settings and the log (default: ~/.local/state/arithmo)
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// days of history shown on the stats screen
    #[clap(long, default_value_t = 7)]
    stats_days: u32,
}

impl Cli {
    /// Command line values win over persisted ones.
    fn apply(&self, settings: &mut Settings) {
        if let Some(difficulty) = self.difficulty {
            settings.difficulty = difficulty;
        }
        if let Some(ops) = &self.operations {
            settings.set_operators(&OperatorSet::from_selection_or_default(
                ops.iter().copied(),
            ));
        }
        if let Some(secs) = self.time_limit {
            settings.timed_mode.time_limit = secs;
        }
        if let Some(count) = self.question_count {
            settings.timed_mode.question_count = count;
        }
    }

    fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(AppDirs::data_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Practice,
    PracticeSummary,
    Challenge,
    ChallengeResults,
    Stats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect { correct_answer: i64 },
    NotANumber,
    Notice(String),
}

impl Feedback {
    fn for_attempt(attempt: &Attempt) -> Option<Self> {
        match attempt.is_correct? {
            true => Some(Feedback::Correct),
            false => Some(Feedback::Incorrect {
                correct_answer: attempt.problem.correct_answer,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Operator,
    Attempts,
    Accuracy,
    AvgTime,
}

#[derive(Debug)]
pub struct StatsState {
    pub report: StatsReport,
    pub scroll_offset: usize,
    pub sort_by: SortBy,
    pub sort_ascending: bool,
}

impl Default for StatsState {
    fn default() -> Self {
        Self {
            report: StatsReport::default(),
            scroll_offset: 0,
            sort_by: SortBy::Operator,
            sort_ascending: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

pub struct App {
    pub trainer: Trainer,
    pub state: AppState,
    pub input: String,
    pub feedback: Option<Feedback>,
    pub stats_state: StatsState,
    store: JsonRecordStore,
    stats_days: u32,
    return_state: AppState,
    drafts: HashMap<usize, String>,
}

impl App {
    pub fn new(trainer: Trainer, store: JsonRecordStore, stats_days: u32, timed: bool) -> Self {
        let mut app = Self {
            trainer,
            state: AppState::Practice,
            input: String::new(),
            feedback: None,
            stats_state: StatsState::default(),
            store,
            stats_days,
            return_state: AppState::Practice,
            drafts: HashMap::new(),
        };

        app.trainer.start_practice();
        if timed {
            app.start_challenge();
        }
        app
    }

    pub fn into_settings(self) -> Settings {
        self.trainer.into_settings()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Action::Quit;
        }

        match self.state {
            AppState::Practice => self.on_practice_key(key),
            AppState::PracticeSummary => self.on_summary_key(key),
            AppState::Challenge => self.on_challenge_key(key),
            AppState::ChallengeResults => self.on_results_key(key),
            AppState::Stats => self.on_stats_key(key),
        }
        Action::Continue
    }

    /// Polls the challenge deadline. Returns true when the screen needs a redraw.
    pub fn on_tick(&mut self) -> bool {
        if self.state != AppState::Challenge {
            return false;
        }

        self.trainer.tick();
        if !self.trainer.challenge().is_running() {
            self.input.clear();
            self.feedback = Some(Feedback::Notice("Time is up".to_string()));
            self.state = AppState::ChallengeResults;
        }
        true
    }

    fn on_practice_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) if is_answer_char(c) => self.push_input(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => self.submit_practice(),
            KeyCode::Right => {
                self.stash_draft();
                self.trainer.next_problem();
                self.restore_draft();
            }
            KeyCode::Left => self.previous_problem(),
            KeyCode::Tab => self.state = AppState::PracticeSummary,
            KeyCode::Char('s') => self.open_stats(),
            _ => {}
        }
    }

    fn on_summary_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('b') => {
                self.state = AppState::Practice
            }
            KeyCode::Char('n') => {
                self.drafts.clear();
                self.input.clear();
                self.feedback = None;
                self.trainer.start_practice();
                self.state = AppState::Practice;
            }
            KeyCode::Char('c') => self.start_challenge(),
            KeyCode::Char('s') => self.open_stats(),
            KeyCode::Char('1') => self.trainer.set_difficulty(Difficulty::Easy),
            KeyCode::Char('2') => self.trainer.set_difficulty(Difficulty::Medium),
            KeyCode::Char('3') => self.trainer.set_difficulty(Difficulty::Hard),
            KeyCode::Char(c) => {
                if let Ok(op) = c.to_string().parse::<Operator>() {
                    if !self.trainer.toggle_operator(op) {
                        self.feedback = Some(Feedback::Notice(
                            "At least one operator must stay selected".to_string(),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    fn on_challenge_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) if is_answer_char(c) => self.push_input(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => self.submit_challenge(),
            _ => {}
        }
    }

    fn on_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') => self.start_challenge(),
            KeyCode::Char('s') => self.open_stats(),
            KeyCode::Enter | KeyCode::Char('p') => {
                self.feedback = None;
                self.restore_draft();
                self.state = AppState::Practice;
            }
            _ => {}
        }
    }

    fn on_stats_key(&mut self, key: KeyEvent) {
        let stats = &mut self.stats_state;
        match key.code {
            KeyCode::Char('b') | KeyCode::Backspace => self.state = self.return_state,
            KeyCode::Up => stats.scroll_offset = stats.scroll_offset.saturating_sub(1),
            KeyCode::Down => stats.scroll_offset += 1,
            KeyCode::PageUp => stats.scroll_offset = stats.scroll_offset.saturating_sub(10),
            KeyCode::PageDown => stats.scroll_offset += 10,
            KeyCode::Home => stats.scroll_offset = 0,
            KeyCode::Char('1') => stats.sort(SortBy::Operator),
            KeyCode::Char('2') => stats.sort(SortBy::Attempts),
            KeyCode::Char('3') => stats.sort(SortBy::Accuracy),
            KeyCode::Char('4') => stats.sort(SortBy::AvgTime),
            KeyCode::Char(' ') => {
                stats.sort_ascending = !stats.sort_ascending;
                stats.scroll_offset = 0;
            }
            KeyCode::Char('r') => stats.report = StatsReport::load(&self.store, self.stats_days),
            _ => {}
        }
    }

    fn push_input(&mut self, c: char) {
        if c == '-' && !self.input.is_empty() {
            return;
        }
        if self.input.len() < MAX_INPUT_LEN {
            self.input.push(c);
        }
    }

    fn submit_practice(&mut self) {
        if self.input.is_empty() {
            return;
        }
        self.feedback = Some(match self.trainer.submit_practice(&self.input) {
            Ok(submission) if submission.is_correct => Feedback::Correct,
            Ok(submission) => Feedback::Incorrect {
                correct_answer: submission.correct_answer,
            },
            Err(SessionError::Format(_)) => Feedback::NotANumber,
            Err(err) => Feedback::Notice(err.to_string()),
        });
    }

    fn previous_problem(&mut self) {
        self.stash_draft();
        match self.trainer.previous_problem() {
            Ok(_) => self.restore_draft(),
            Err(err) => {
                self.restore_draft();
                self.feedback = Some(Feedback::Notice(err.to_string()));
            }
        }
    }

    /// Keeps unsent input with the problem it was typed for.
    fn stash_draft(&mut self) {
        if let Some(cursor) = self.trainer.practice().cursor() {
            let draft = std::mem::take(&mut self.input);
            if draft.is_empty() {
                self.drafts.remove(&cursor);
            } else {
                self.drafts.insert(cursor, draft);
            }
        }
    }

    fn restore_draft(&mut self) {
        let practice = self.trainer.practice();
        let (Some(cursor), Some(attempt)) = (practice.cursor(), practice.current()) else {
            return;
        };
        self.feedback = Feedback::for_attempt(attempt);
        self.input = self
            .drafts
            .remove(&cursor)
            .or_else(|| attempt.submitted_answer.map(|a| a.to_string()))
            .unwrap_or_default();
    }

    fn start_challenge(&mut self) {
        if self.state == AppState::Practice {
            self.stash_draft();
        }
        self.input.clear();
        self.feedback = None;
        self.trainer.start_challenge();
        self.state = AppState::Challenge;
    }

    fn submit_challenge(&mut self) {
        if self.input.is_empty() {
            return;
        }
        if parse_answer(&self.input).is_err() {
            self.feedback = Some(Feedback::NotANumber);
            return;
        }

        let attempted_before = self.trainer.challenge().results().attempted;
        let outcome = self.trainer.check_challenge(&self.input);
        self.input.clear();

        self.feedback = Some(
            match (
                self.trainer.challenge().results().attempted > attempted_before,
                outcome.correct_answer,
            ) {
                (false, _) => Feedback::Notice("Time is up".to_string()),
                (true, _) if outcome.is_correct => Feedback::Correct,
                (true, Some(correct_answer)) => Feedback::Incorrect { correct_answer },
                (true, None) => Feedback::Notice("Answer recorded".to_string()),
            },
        );
        if outcome.is_finished {
            self.state = AppState::ChallengeResults;
        }
    }

    fn open_stats(&mut self) {
        if self.state == AppState::Practice {
            self.stash_draft();
            self.restore_draft();
        }
        self.stats_state = StatsState {
            report: StatsReport::load(&self.store, self.stats_days),
            ..StatsState::default()
        };
        self.return_state = self.state;
        self.state = AppState::Stats;
    }
}

impl StatsState {
    fn sort(&mut self, sort_by: SortBy) {
        self.sort_by = sort_by;
        self.scroll_offset = 0;
    }
}

fn is_answer_char(c: char) -> bool {
    c.is_ascii_digit() || c == '-'
}

fn init_logging(data_dir: &Path) {
    if fs::create_dir_all(data_dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(AppDirs::log_path(data_dir))
    else {
        return;
    };

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let data_dir = cli.resolve_data_dir();
    init_logging(&data_dir);

    let settings_store = FileSettingsStore::for_user(&data_dir, &cli.user);
    let mut settings = settings_store.load();
    cli.apply(&mut settings);
    tracing::info!(user = %cli.user, difficulty = %settings.difficulty, "starting");

    let store = JsonRecordStore::new(AppDirs::records_dir(&data_dir));
    let trainer = Trainer::live(settings, Box::new(store.clone()));
    let mut app = App::new(trainer, store, cli.stats_days, cli.timed);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::terminal();
    let outcome = run_app(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if let Err(err) = settings_store.save(&app.into_settings()) {
        tracing::warn!(error = %err, "failed to save settings");
    }
    tracing::info!("exiting");

    outcome
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.next_event() {
            AppEvent::Tick => {
                if app.on_tick() {
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Key(key) => {
                if app.handle_key(key) == Action::Quit {
                    break;
                }
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Closed => {
                tracing::warn!("terminal input closed");
                break;
            }
        }
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    match app.state {
        AppState::Stats => ui::operator_stats::render_stats(app, f),
        _ => f.render_widget(&*app, f.area()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arithmo::clock::ManualClock;
    use arithmo::generator::{ProblemGenerator, ScriptedRandom};
    use arithmo::records::Record;
    use assert_matches::assert_matches;
    use ratatui::backend::TestBackend;
    use std::rc::Rc;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    /// Addition only; every problem is `a + b` for consecutive pairs of `operands`.
    fn test_app(operands: &[i64], settings: Settings) -> (App, Rc<ManualClock>, TempDir) {
        let mut script = Vec::new();
        for pair in operands.chunks(2) {
            script.push(0);
            script.extend_from_slice(pair);
        }
        let dir = tempdir().unwrap();
        let store = JsonRecordStore::new(dir.path());
        let clock = Rc::new(ManualClock::new());
        let trainer = Trainer::new(
            settings,
            ProblemGenerator::new(Box::new(ScriptedRandom::new(script.clone()))),
            ProblemGenerator::new(Box::new(ScriptedRandom::new(script))),
            clock.clone(),
            Box::new(store.clone()),
        );
        (App::new(trainer, store, 7, false), clock, dir)
    }

    fn addition_settings() -> Settings {
        Settings {
            difficulty: Difficulty::Easy,
            operations: vec![Operator::Add],
            ..Settings::default()
        }
    }

    fn screen_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| ui(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["arithmo"]);

        assert_eq!(cli.difficulty, None);
        assert!(cli.operations.is_none());
        assert_eq!(cli.time_limit, None);
        assert_eq!(cli.question_count, None);
        assert!(!cli.timed);
        assert_eq!(cli.user, "guest");
        assert_eq!(cli.stats_days, 7);
    }

    #[test]
    fn test_cli_overrides_settings() {
        let cli = Cli::parse_from([
            "arithmo", "-d", "hard", "-o", "+,mul", "-s", "45", "-n", "5", "-t", "-u", "alice",
        ]);
        let mut settings = Settings::default();
        cli.apply(&mut settings);

        assert!(cli.timed);
        assert_eq!(cli.user, "alice");
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.operations, vec![Operator::Add, Operator::Mul]);
        assert_eq!(settings.timed_mode.time_limit, 45);
        assert_eq!(settings.timed_mode.question_count, 5);
    }

    #[test]
    fn test_cli_leaves_unset_values_alone() {
        let cli = Cli::parse_from(["arithmo", "-n", "3"]);
        let mut settings = Settings {
            difficulty: Difficulty::Easy,
            ..Settings::default()
        };
        cli.apply(&mut settings);
        assert_eq!(settings.difficulty, Difficulty::Easy);
        assert_eq!(settings.timed_mode.question_count, 3);
        assert_eq!(settings.timed_mode.time_limit, 60);
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(Cli::try_parse_from(["arithmo", "-o", "%"]).is_err());
        assert!(Cli::try_parse_from(["arithmo", "-d", "impossible"]).is_err());
    }

    #[test]
    fn test_data_dir_override() {
        let cli = Cli::parse_from(["arithmo", "--data-dir", "/tmp/arithmo-test"]);
        assert_eq!(cli.resolve_data_dir(), PathBuf::from("/tmp/arithmo-test"));
    }

    #[test]
    fn test_practice_answer_flow() {
        let (mut app, _, _dir) = test_app(&[3, 4, 5, 5], addition_settings());
        assert_eq!(app.state, AppState::Practice);

        type_str(&mut app, "7");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.feedback, Some(Feedback::Correct));

        type_str(&mut app, "1");
        assert_eq!(app.input, "71");
        app.handle_key(key(KeyCode::Backspace));
        app.handle_key(key(KeyCode::Backspace));
        type_str(&mut app, "8");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            app.feedback,
            Some(Feedback::Incorrect { correct_answer: 7 })
        );
        assert_eq!(app.trainer.practice().summary().correct, 1);
    }

    #[test]
    fn test_malformed_answer_feedback() {
        let (mut app, _, _dir) = test_app(&[3, 4], addition_settings());
        type_str(&mut app, "-");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.feedback, Some(Feedback::NotANumber));
        assert_eq!(app.trainer.practice().summary().total_answered, 1);
    }

    #[test]
    fn test_minus_only_leads() {
        let (mut app, _, _dir) = test_app(&[3, 4], addition_settings());
        type_str(&mut app, "-1-2");
        assert_eq!(app.input, "-12");
    }

    #[test]
    fn test_navigation_keeps_drafts_and_answers() {
        let (mut app, _, _dir) = test_app(&[3, 4, 5, 5, 1, 1], addition_settings());
        type_str(&mut app, "7");
        app.handle_key(key(KeyCode::Enter));

        app.handle_key(key(KeyCode::Right));
        assert!(app.input.is_empty());
        assert_eq!(app.feedback, None);
        type_str(&mut app, "9");

        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.input, "7");
        assert_eq!(app.feedback, Some(Feedback::Correct));

        app.handle_key(key(KeyCode::Left));
        assert_matches!(app.feedback, Some(Feedback::Notice(_)));
        assert_eq!(app.input, "7");

        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.input, "9");
        assert_eq!(app.trainer.practice().attempts().len(), 2);
    }

    #[test]
    fn test_summary_adjusts_settings() {
        let (mut app, _, _dir) = test_app(&[3, 4], addition_settings());
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.state, AppState::PracticeSummary);

        app.handle_key(key(KeyCode::Char('3')));
        app.handle_key(key(KeyCode::Char('*')));
        app.handle_key(key(KeyCode::Char('+')));
        assert_eq!(app.trainer.settings().difficulty, Difficulty::Hard);
        assert_eq!(app.trainer.settings().operations, vec![Operator::Mul]);

        app.handle_key(key(KeyCode::Char('*')));
        assert_matches!(app.feedback, Some(Feedback::Notice(_)));
        assert_eq!(app.trainer.settings().operations, vec![Operator::Mul]);

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.state, AppState::Practice);
    }

    #[test]
    fn test_challenge_runs_to_results() {
        let mut settings = addition_settings();
        settings.timed_mode.question_count = 2;
        let (mut app, clock, dir) = test_app(&[1, 1, 2, 2], settings);

        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Char('c')));
        assert_eq!(app.state, AppState::Challenge);

        clock.advance(1.0);
        assert!(app.on_tick());
        type_str(&mut app, "2");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.feedback, Some(Feedback::Correct));
        assert_eq!(app.state, AppState::Challenge);

        type_str(&mut app, "5");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            app.feedback,
            Some(Feedback::Incorrect { correct_answer: 4 })
        );
        assert_eq!(app.state, AppState::ChallengeResults);

        let store = JsonRecordStore::new(dir.path());
        let history = store.challenge_history(1);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].correct, 1);
    }

    #[test]
    fn test_challenge_times_out_on_tick() {
        let mut settings = addition_settings();
        settings.timed_mode = arithmo::settings::TimedModeSettings {
            time_limit: 5,
            question_count: 3,
        };
        let (mut app, clock, _dir) = test_app(&[1, 1, 1, 1, 1, 1], settings);
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Char('c')));

        type_str(&mut app, "2");
        app.handle_key(key(KeyCode::Enter));
        clock.advance(6.0);
        app.on_tick();

        assert_eq!(app.state, AppState::ChallengeResults);
        let results = app.trainer.challenge().results();
        assert_eq!(results.attempted, 1);
        assert_eq!(results.time_taken, 5.0);
        assert!(!app.on_tick());
    }

    #[test]
    fn test_challenge_ignores_bare_minus() {
        let (mut app, _, _dir) = test_app(&[1, 1, 1, 1], addition_settings());
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Char('c')));
        type_str(&mut app, "-");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.feedback, Some(Feedback::NotANumber));
        assert_eq!(app.trainer.challenge().results().attempted, 0);
    }

    #[test]
    fn test_stats_screen_reads_history() {
        let (mut app, _, _dir) = test_app(&[3, 4, 5, 5], addition_settings());
        type_str(&mut app, "7");
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Right));
        type_str(&mut app, "1");
        app.handle_key(key(KeyCode::Enter));

        app.handle_key(key(KeyCode::Char('s')));
        assert_eq!(app.state, AppState::Stats);
        let report = &app.stats_state.report;
        assert_eq!(report.practice.total_questions, 2);
        assert_eq!(report.practice.correct_answers, 1);
        assert_eq!(report.operators.len(), 1);

        app.handle_key(key(KeyCode::Char('3')));
        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.stats_state.sort_by, SortBy::Accuracy);
        assert!(!app.stats_state.sort_ascending);

        app.handle_key(key(KeyCode::Char('b')));
        assert_eq!(app.state, AppState::Practice);
        assert_eq!(app.input, "1");
    }

    #[test]
    fn test_escape_quits_from_every_screen() {
        let (mut app, _, _dir) = test_app(&[3, 4], addition_settings());
        for state in [
            AppState::Practice,
            AppState::PracticeSummary,
            AppState::Challenge,
            AppState::ChallengeResults,
            AppState::Stats,
        ] {
            app.state = state;
            assert_eq!(app.handle_key(key(KeyCode::Esc)), Action::Quit);
        }
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.handle_key(ctrl_c), Action::Quit);
    }

    #[test]
    fn test_timed_flag_starts_in_challenge() {
        let dir = tempdir().unwrap();
        let store = JsonRecordStore::new(dir.path());
        let trainer = Trainer::live(addition_settings(), Box::new(Vec::<Record>::new()));
        let app = App::new(trainer, store, 7, true);
        assert_eq!(app.state, AppState::Challenge);
        assert!(app.trainer.challenge().is_running());
    }

    #[test]
    fn test_ui_practice_screen() {
        let (mut app, _, _dir) = test_app(&[3, 4], addition_settings());
        type_str(&mut app, "12");
        let text = screen_text(&mut app);
        assert!(text.contains("3 + 4 = ?"));
        assert!(text.contains("12"));
    }

    #[test]
    fn test_ui_every_screen_renders() {
        let (mut app, _, _dir) = test_app(&[3, 4, 1, 1], addition_settings());
        type_str(&mut app, "7");
        app.handle_key(key(KeyCode::Enter));

        app.handle_key(key(KeyCode::Tab));
        assert!(screen_text(&mut app).contains("Summary"));

        app.handle_key(key(KeyCode::Char('c')));
        assert!(screen_text(&mut app).contains("Challenge"));

        app.handle_key(key(KeyCode::Char('s')));
        assert_eq!(app.state, AppState::Challenge);

        app.state = AppState::ChallengeResults;
        assert!(screen_text(&mut app).contains("Results"));

        app.handle_key(key(KeyCode::Char('s')));
        assert!(screen_text(&mut app).contains("Statistics"));
    }

    #[test]
    fn test_run_app_until_escape() {
        let (mut app, _, _dir) = test_app(&[3, 4], addition_settings());
        let (tx, rx) = mpsc::channel();
        for code in [KeyCode::Char('7'), KeyCode::Enter, KeyCode::Esc] {
            tx.send(AppEvent::Key(key(code))).unwrap();
        }
        let runner = Runner::from_channel(rx).with_tick_rate(Duration::from_millis(5));
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        run_app(&mut terminal, &mut app, &runner).unwrap();

        assert_eq!(app.feedback, Some(Feedback::Correct));
        let settings = app.into_settings();
        assert_eq!(settings.operations, vec![Operator::Add]);
    }

    #[test]
    fn test_run_app_stops_when_input_closes() {
        let (mut app, _, _dir) = test_app(&[3, 4], addition_settings());
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Key(key(KeyCode::Char('7')))).unwrap();
        drop(tx);
        let runner = Runner::from_channel(rx).with_tick_rate(Duration::from_millis(5));
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        run_app(&mut terminal, &mut app, &runner).unwrap();

        assert_eq!(app.input, "7");
    }
}
