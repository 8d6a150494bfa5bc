mod bank;
mod error;
mod kv;
mod models;
mod session;
mod stats;
mod tui;

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use bank::QuestionBank;
use kv::{KeyValueStore, MemoryStore, SqliteStore};
use models::{JsonOutput, Question};
use session::{GameSession, DEFAULT_GAME_LENGTH};
use stats::StatsStore;

const DEFAULT_DB_NAME: &str = "knowledge_gap.db";

#[derive(Parser)]
#[command(name = "knowledge-gap")]
#[command(about = "A trivia quiz that finds the gaps in what you know")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Question set to load instead of the built-in one
    #[arg(long, global = true, env = "KNOWLEDGE_GAP_QUESTIONS")]
    questions: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List question categories
    Categories,

    /// List questions
    Questions {
        /// Filter by category (exact match)
        #[arg(long, short)]
        category: Option<String>,

        /// Filter by difficulty level
        #[arg(long, short)]
        difficulty: Option<i32>,
    },

    /// Show a question by ID
    Show {
        /// Question ID
        id: i64,
    },

    /// Draw a random question
    Next {
        /// Preferred category
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Play a round in the terminal
    Play {
        /// Number of questions
        #[arg(long, short = 'n', default_value_t = DEFAULT_GAME_LENGTH)]
        count: u32,

        /// Preferred category
        #[arg(long, short)]
        category: Option<String>,

        /// Play without recording statistics
        #[arg(long)]
        no_save: bool,
    },

    /// Show cumulative statistics
    Stats,

    /// Erase all saved statistics
    Reset,

    /// Launch interactive terminal UI
    Tui,
}

fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("KNOWLEDGE_GAP_DB") {
        return PathBuf::from(path);
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("knowledge-gap");

    std::fs::create_dir_all(&config_dir).ok();
    config_dir.join(DEFAULT_DB_NAME)
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("knowledge_gap=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut bank = match &cli.questions {
        Some(path) => QuestionBank::from_path(path)?,
        None => QuestionBank::builtin()?,
    };

    match cli.command {
        Commands::Categories => {
            let categories = bank.get_categories();
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(categories))?);
            } else if categories.is_empty() {
                println!("No categories found.");
            } else {
                println!("{:<20} QUESTIONS", "CATEGORY");
                println!("{}", "-".repeat(32));
                for category in categories {
                    println!(
                        "{:<20} {}",
                        truncate(category, 18),
                        bank.get_questions_by_category(category).len()
                    );
                }
            }
        }

        Commands::Questions {
            category,
            difficulty,
        } => {
            let questions: Vec<&Question> = match (category.as_deref(), difficulty) {
                (Some(c), Some(level)) => bank
                    .get_questions_by_category(c)
                    .into_iter()
                    .filter(|q| q.difficulty == level)
                    .collect(),
                (Some(c), None) => bank.get_questions_by_category(c),
                (None, Some(level)) => bank.get_questions_by_difficulty(level),
                (None, None) => bank.get_all_questions().iter().collect(),
            };

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&questions))?);
            } else if questions.is_empty() {
                println!("No questions found.");
            } else {
                println!("{:<5} {:<14} {:<8} TEXT", "ID", "CATEGORY", "LEVEL");
                println!("{}", "-".repeat(78));
                for q in questions {
                    println!(
                        "{:<5} {:<14} {:<8} {}",
                        q.id,
                        truncate(&q.category, 12),
                        q.difficulty_label(),
                        truncate(&q.text, 48)
                    );
                }
            }
        }

        Commands::Show { id } => match bank.get_question(id) {
            Some(question) => {
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(question))?);
                } else {
                    print_question(&mut io::stdout(), question)?;
                    println!();
                    println!("Answer: {}", question.correct_answer);
                }
            }
            None if cli.json => {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::<()>::err("Question not found"))?
                );
            }
            None => println!("Question not found."),
        },

        Commands::Next { category } => {
            let (question, fallback) = draw_next(&mut bank, category.as_deref())?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(NextQuestion { question, fallback }))?
                );
            } else {
                if fallback {
                    println!("No questions in that category; drawing from all categories.");
                    println!();
                }
                print_question(&mut io::stdout(), question)?;
            }
        }

        Commands::Play {
            count,
            category,
            no_save,
        } => {
            bank.set_category(category.as_deref());
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            if no_save {
                let stats = StatsStore::new(MemoryStore::new());
                play(&bank, &stats, count, &mut input, &mut output)?;
            } else {
                let stats = open_stats()?;
                play(&bank, &stats, count, &mut input, &mut output)?;
            }
        }

        Commands::Stats => {
            let stats = open_stats()?.get_stats();
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "gamesPlayed": stats.games_played,
                        "totalCorrect": stats.total_correct,
                        "totalQuestions": stats.total_questions,
                        "bestAccuracy": stats.best_accuracy,
                        "overallAccuracy": stats.overall_accuracy(),
                        "lastPlayed": stats.last_played,
                        "categoryStats": stats.category_stats,
                    })))?
                );
            } else {
                println!("=== Play Statistics ===");
                println!("Games played: {}", stats.games_played);
                println!(
                    "Questions answered: {} ({} correct)",
                    stats.total_questions, stats.total_correct
                );
                println!("Overall accuracy: {}%", stats.overall_accuracy());
                println!("Best game: {}%", stats.best_accuracy);
                if stats.games_played > 0 {
                    println!("Last played: {}", stats.last_played.format("%Y-%m-%d %H:%M"));
                }

                let by_category = stats.category_accuracy();
                if !by_category.is_empty() {
                    println!();
                    println!("{:<20} {:>8} {:>8} {:>9}", "CATEGORY", "PLAYED", "CORRECT", "ACCURACY");
                    println!("{}", "-".repeat(48));
                    for c in by_category {
                        println!(
                            "{:<20} {:>8} {:>8} {:>8}%",
                            truncate(&c.category, 18),
                            c.total,
                            c.correct,
                            c.accuracy
                        );
                    }
                }
            }
        }

        Commands::Reset => {
            open_stats()?.clear_stats();
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Statistics cleared.");
            }
        }

        Commands::Tui => {
            tui::run(bank, open_stats()?)?;
        }
    }

    Ok(())
}

fn open_stats() -> Result<StatsStore<SqliteStore>, Box<dyn std::error::Error>> {
    let store = SqliteStore::open(get_db_path())?;
    Ok(StatsStore::new(store))
}

fn print_question<W: Write>(out: &mut W, question: &Question) -> io::Result<()> {
    writeln!(
        out,
        "[{} / {}] {}",
        question.category,
        question.difficulty_label(),
        question.text
    )?;
    for (i, option) in question.options.iter().enumerate() {
        writeln!(out, "  {}) {}", i + 1, option)?;
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct NextQuestion<'a> {
    question: &'a Question,
    fallback: bool,
}

/// Draw under `category`. The flag is set when the category matched nothing
/// and the draw came from every question.
fn draw_next<'a>(
    bank: &'a mut QuestionBank,
    category: Option<&str>,
) -> Result<(&'a Question, bool), error::QuizError> {
    bank.set_category(category);
    let fallback = category.is_some() && !bank.filter_matches();
    let question = bank.get_random_question()?;
    Ok((question, fallback))
}

/// Map a typed answer to one of the options, by text or by number.
/// Option text is matched first.
fn resolve_choice<'a>(question: &'a Question, input: &str) -> Option<&'a str> {
    let input = input.trim();
    // Option text wins over option number: "1" may itself be an option
    let by_text = question
        .options
        .iter()
        .find(|o| o.as_str() == input)
        .or_else(|| question.options.iter().find(|o| o.eq_ignore_ascii_case(input)));
    if let Some(option) = by_text {
        return Some(option.as_str());
    }
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| question.options.get(i))
        .map(String::as_str)
}

fn play<S: KeyValueStore, R: BufRead, W: Write>(
    bank: &QuestionBank,
    stats: &StatsStore<S>,
    count: u32,
    input: &mut R,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = GameSession::new(count);

    while !session.is_over() {
        let question = session.next_question(bank)?;
        writeln!(out)?;
        writeln!(out, "Question {}/{}", session.answered() + 1, session.length())?;
        print_question(out, question)?;

        let choice = loop {
            write!(out, "> ")?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                // Input closed mid-game; keep whatever was answered
                break None;
            }
            match resolve_choice(question, &line) {
                Some(choice) => break Some(choice),
                None => writeln!(out, "Pick 1-{} or type an option.", question.options.len())?,
            }
        };

        let Some(choice) = choice else { break };
        if session.answer(question, choice) {
            writeln!(out, "Correct!")?;
        } else {
            writeln!(out, "Wrong. The answer was: {}", question.correct_answer)?;
        }
    }

    if session.answered() == 0 {
        writeln!(out, "No questions answered; nothing saved.")?;
        return Ok(());
    }

    let record = session.finish(stats)?;

    writeln!(out)?;
    writeln!(
        out,
        "=== Game Over: {}/{} correct ({}%) ===",
        session.correct(),
        session.answered(),
        models::accuracy_percent(session.correct().into(), session.answered().into())
    )?;
    for c in session.category_stats(bank).iter().filter(|c| c.total > 0) {
        writeln!(out, "  {:<18} {}/{} ({}%)", c.category, c.correct, c.total, c.accuracy)?;
    }
    writeln!(
        out,
        "Games played: {}  Best: {}%",
        record.games_played, record.best_accuracy
    )?;
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
