mod ui;
mod widgets;

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::bank::QuestionBank;
use crate::error::QuizError;
use crate::kv::SqliteStore;
use crate::models::{accuracy_percent, CategoryStats, GameStats, Question};
use crate::session::{GameSession, DEFAULT_GAME_LENGTH};
use crate::stats::StatsStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Categories,
    Quiz,
    Summary,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Categories,
            View::Categories => View::Quiz,
            View::Quiz => View::Dashboard,
            View::Summary => View::Dashboard,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Quiz,
            View::Categories => View::Dashboard,
            View::Quiz => View::Categories,
            View::Summary => View::Quiz,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

// The question on screen and, once answered, whether it was right
pub struct CurrentQuestion {
    pub question: Question,
    pub options: StatefulList<String>,
    pub answered: Option<bool>,
}

pub struct GameSummary {
    pub correct: u32,
    pub answered: u32,
    pub accuracy: u32,
    pub previous_best: u32,
    pub categories: Vec<CategoryStats>,
    pub totals: GameStats,
}

pub struct App {
    bank: QuestionBank,
    stats_store: StatsStore<SqliteStore>,
    pub view: View,
    pub stats: GameStats,
    pub categories: StatefulList<String>,
    pub game_length: u32,
    pub session: Option<GameSession>,
    pub current: Option<CurrentQuestion>,
    pub summary: Option<GameSummary>,
    pub status: Option<String>,
    store_errors: Rc<RefCell<Vec<String>>>,
    pub should_quit: bool,
}

impl App {
    pub fn new(bank: QuestionBank, stats_store: StatsStore<SqliteStore>) -> Self {
        let store_errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&store_errors);
        let stats_store =
            stats_store.with_error_hook(move |e| sink.borrow_mut().push(e.to_string()));

        let stats = stats_store.get_stats();
        let categories = StatefulList::with_items(bank.get_categories().to_vec());

        let mut app = Self {
            bank,
            stats_store,
            view: View::Dashboard,
            stats,
            categories,
            game_length: DEFAULT_GAME_LENGTH,
            session: None,
            current: None,
            summary: None,
            status: None,
            store_errors,
            should_quit: false,
        };
        app.take_store_errors();
        app
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.bank.selected_category()
    }

    pub fn question_count(&self, category: &str) -> usize {
        self.bank.get_questions_by_category(category).len()
    }

    pub fn refresh_data(&mut self) {
        self.stats = self.stats_store.get_stats();
        self.take_store_errors();
    }

    // Surface the most recent recovered persistence fault in the status bar
    fn take_store_errors(&mut self) {
        if let Some(last) = self.store_errors.borrow_mut().drain(..).last() {
            self.status = Some(format!("Warning: {}", last));
        }
    }

    fn apply_category(&mut self) {
        if let Some(category) = self.categories.selected_item().cloned() {
            self.bank.set_category(Some(&category));
            self.status = Some(format!("Playing category: {}", category));
        }
    }

    fn clear_category(&mut self) {
        self.bank.set_category(None);
        self.status = Some("Playing all categories".to_string());
    }

    fn start_game(&mut self) -> Result<(), QuizError> {
        self.summary = None;
        self.session = Some(GameSession::new(self.game_length));
        self.view = View::Quiz;
        self.draw_question()
    }

    fn draw_question(&mut self) -> Result<(), QuizError> {
        let Some(session) = &self.session else {
            return Ok(());
        };
        let question = session.next_question(&self.bank)?.clone();
        let options = StatefulList::with_items(question.options.clone());
        self.current = Some(CurrentQuestion {
            question,
            options,
            answered: None,
        });
        Ok(())
    }

    fn submit_answer(&mut self, index: Option<usize>) {
        let (Some(session), Some(current)) = (&mut self.session, &mut self.current) else {
            return;
        };
        if current.answered.is_some() {
            return;
        }
        if let Some(i) = index {
            if i >= current.options.items.len() {
                return;
            }
            current.options.selected = Some(i);
        }
        if let Some(choice) = current.options.selected_item() {
            let correct = session.answer(&current.question, choice);
            current.answered = Some(correct);
        }
    }

    fn advance(&mut self) -> Result<(), QuizError> {
        let over = match &self.session {
            Some(session) => session.is_over(),
            None => return self.start_game(),
        };
        if over {
            self.finish_game()
        } else {
            self.draw_question()
        }
    }

    fn finish_game(&mut self) -> Result<(), QuizError> {
        self.current = None;
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        if session.answered() == 0 {
            self.view = View::Quiz;
            self.status = Some("Game abandoned".to_string());
            return Ok(());
        }

        let previous_best = self.stats_store.get_stats().best_accuracy;
        let totals = session.finish(&self.stats_store)?;
        self.summary = Some(GameSummary {
            correct: session.correct(),
            answered: session.answered(),
            accuracy: accuracy_percent(session.correct().into(), session.answered().into()),
            previous_best,
            categories: session
                .category_stats(&self.bank)
                .into_iter()
                .filter(|c| c.total > 0)
                .collect(),
            totals: totals.clone(),
        });
        self.stats = totals;
        self.view = View::Summary;
        self.take_store_errors();
        Ok(())
    }

    fn clear_stats(&mut self) {
        self.stats_store.clear_stats();
        self.refresh_data();
        self.status = Some("Statistics cleared".to_string());
    }

    fn handle_quiz_key(&mut self, key: KeyCode) -> Result<(), QuizError> {
        let answered = self.current.as_ref().map(|c| c.answered.is_some());
        match (key, answered) {
            (KeyCode::Enter | KeyCode::Char('n'), None) => self.start_game()?,
            (KeyCode::Enter | KeyCode::Char('n'), Some(true)) => self.advance()?,
            (KeyCode::Enter, Some(false)) => self.submit_answer(None),
            (KeyCode::Char(c), Some(false)) if c.is_ascii_digit() && c != '0' => {
                let index = c as usize - '1' as usize;
                self.submit_answer(Some(index));
            }
            (KeyCode::Char('j') | KeyCode::Down, Some(false)) => {
                if let Some(current) = &mut self.current {
                    current.options.next();
                }
            }
            (KeyCode::Char('k') | KeyCode::Up, Some(false)) => {
                if let Some(current) = &mut self.current {
                    current.options.previous();
                }
            }
            (KeyCode::Esc, Some(_)) => self.finish_game()?,
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<(), QuizError> {
        self.status = None;

        if key == KeyCode::Char('q') {
            self.should_quit = true;
            return Ok(());
        }

        if key == KeyCode::Char('r') && modifiers.contains(KeyModifiers::CONTROL) {
            self.refresh_data();
            return Ok(());
        }

        match self.view {
            View::Quiz => match key {
                KeyCode::Tab => self.view = self.view.next(),
                KeyCode::BackTab => self.view = self.view.prev(),
                KeyCode::Char('h') | KeyCode::Left if self.current.is_none() => {
                    self.view = self.view.prev()
                }
                KeyCode::Char('l') | KeyCode::Right if self.current.is_none() => {
                    self.view = self.view.next()
                }
                _ => self.handle_quiz_key(key)?,
            },

            View::Summary => match key {
                KeyCode::Enter | KeyCode::Esc => {
                    self.summary = None;
                    self.view = View::Quiz;
                }
                KeyCode::Char('n') => self.start_game()?,
                KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
                    self.view = self.view.prev()
                }
                KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
                    self.view = self.view.next()
                }
                _ => {}
            },

            View::Categories => match key {
                KeyCode::Char('j') | KeyCode::Down => self.categories.next(),
                KeyCode::Char('k') | KeyCode::Up => self.categories.previous(),
                KeyCode::Char('g') if !self.categories.items.is_empty() => {
                    self.categories.selected = Some(0);
                }
                KeyCode::Char('G') if !self.categories.items.is_empty() => {
                    self.categories.selected = Some(self.categories.items.len() - 1);
                }
                KeyCode::Enter => self.apply_category(),
                KeyCode::Esc => self.clear_category(),
                KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
                    self.view = self.view.prev()
                }
                KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
                    self.view = self.view.next()
                }
                _ => {}
            },

            View::Dashboard => match key {
                KeyCode::Char('X') => self.clear_stats(),
                KeyCode::Char('+') => self.game_length = (self.game_length + 1).min(50),
                KeyCode::Char('-') => self.game_length = self.game_length.saturating_sub(1).max(1),
                KeyCode::Enter => self.start_game()?,
                KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
                    self.view = self.view.prev()
                }
                KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
                    self.view = self.view.next()
                }
                _ => {}
            },
        }
        Ok(())
    }
}

pub fn run(
    bank: QuestionBank,
    stats_store: StatsStore<SqliteStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(bank, stats_store);

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
