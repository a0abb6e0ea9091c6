//! Quizball - Main Binary
//!
//! Terminal front end: interactive play, single headless simulations and
//! parallel batches.

use anyhow::Context;
use clap::{Parser, Subcommand};
use quizball::{
    batch::{run_batch, BatchOptions},
    core::{FieldSlot, Side},
    game::{
        dice::seeded, ActionKind, ActionOutcome, MatchRunner, MatchView, OutputFormat,
        PossessionEngine, RandomController, VerbosityLevel,
    },
    loader::{Difficulty, MatchConfig, Preferences, QuestionBank, QuestionRecord},
    remote::{format_category_name, LocalSessionService, QuizFacade, RemoteSync},
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Verbosity level for match output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Parser)]
#[command(name = "quizball")]
#[command(about = "Quizball - quiz-gated five-a-side football", long_about = None)]
struct Cli {
    /// Match configuration file (JSON)
    #[arg(long, global = true, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Question bank file (JSON); the fixed fallback question is used without one
    #[arg(long, global = true, value_name = "QUESTIONS_FILE")]
    questions: Option<PathBuf>,

    /// Match length preset
    #[arg(long, global = true, default_value = "regular")]
    difficulty: Difficulty,

    /// Set random seed for deterministic runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Verbosity level for match output (0=silent, 1=minimal, 2=normal, 3=verbose)
    #[arg(long, global = true, default_value = "normal", short = 'v')]
    verbosity: VerbosityArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a match from the terminal
    Play {
        /// Wait real time for shot suspense, celebrations and opponent turns
        #[arg(long)]
        realtime: bool,

        /// Preferences file (language and categories)
        #[arg(long, default_value = "quizball_prefs.json")]
        prefs: PathBuf,

        /// Question language (en, de, el); saved to the preferences file
        #[arg(long)]
        language: Option<String>,

        /// Comma separated categories; saved to the preferences file
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
    },

    /// Run one headless match with a random player
    Sim {
        /// Probability the simulated player answers correctly
        #[arg(long, default_value = "0.6")]
        accuracy: f64,

        /// Print the result and the match log as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run many headless matches in parallel and print statistics
    Batch {
        /// Number of matches
        #[arg(long, short = 'n', default_value = "1000")]
        matches: usize,

        /// Probability the simulated player answers correctly
        #[arg(long, default_value = "0.6")]
        accuracy: f64,
    },
}

/// Settings shared by every subcommand
struct Common {
    config: MatchConfig,
    questions: Option<Vec<QuestionRecord>>,
    difficulty: Difficulty,
    seed: u64,
    verbosity: VerbosityLevel,
}

impl Common {
    fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => MatchConfig::load_from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => MatchConfig::default(),
        };
        let seed = cli.seed.or(config.seed).unwrap_or_else(rand::random);
        config = config.with_seed(seed);

        let questions = match &cli.questions {
            Some(path) => Some(load_records(path)?),
            None => None,
        };
        Ok(Common {
            config,
            questions,
            difficulty: cli.difficulty,
            seed,
            verbosity: cli.verbosity.into(),
        })
    }

    fn quiz(&self) -> anyhow::Result<QuizFacade> {
        Ok(match &self.questions {
            Some(records) => {
                QuizFacade::new(Box::new(QuestionBank::from_records(records.clone(), self.seed)?))
            }
            None => QuizFacade::offline(),
        })
    }
}

fn load_records(path: &Path) -> anyhow::Result<Vec<QuestionRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading question bank {}", path.display()))?;
    let records: Vec<QuestionRecord> = serde_json::from_str(&content)
        .with_context(|| format!("parsing question bank {}", path.display()))?;
    // Validate once up front so per-match construction cannot fail
    QuestionBank::from_records(records.clone(), 0)?;
    Ok(records)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let common = Common::from_cli(&cli)?;

    match cli.command {
        Commands::Play {
            realtime,
            prefs,
            language,
            categories,
        } => run_play(common, realtime, &prefs, language, categories).await?,
        Commands::Sim { accuracy, json } => run_sim(common, accuracy, json)?,
        Commands::Batch { matches, accuracy } => {
            println!("=== Quizball - Batch Mode ===\n");
            println!("Running {matches} matches (seed {}, accuracy {accuracy:.2})", common.seed);
            let options = BatchOptions {
                matches,
                seed: common.seed,
                accuracy,
                difficulty: common.difficulty,
                config: common.config,
                questions: common.questions,
            };
            let stats = tokio::task::spawn_blocking(move || run_batch(&options)).await?;
            println!("\n{stats}");
        }
    }

    Ok(())
}

fn run_sim(common: Common, accuracy: f64, json: bool) -> anyhow::Result<()> {
    let mut sync = RemoteSync::new(Box::new(LocalSessionService::new(common.seed)), common.seed);
    let session = sync.start_match(common.difficulty);
    let quiz = common.quiz()?;

    let mut engine = PossessionEngine::seeded(common.config, &session);
    engine.subscribe(Box::new(sync));
    engine.set_event_outbox(false);
    if json {
        engine.logger.set_output_format(OutputFormat::Json);
    }

    let mut controller = RandomController::new(common.seed.wrapping_add(1), accuracy);
    let result = MatchRunner::new(&mut engine)
        .with_quiz(quiz)
        .with_verbosity(common.verbosity)
        .run_match(&mut controller)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "\nSession {}: Home {} - Away {} ({} actions, {:.1}s of match time)",
            session.session_id,
            result.home_score,
            result.away_score,
            result.actions,
            result.elapsed_ms as f64 / 1000.0
        );
    }
    Ok(())
}

async fn run_play(
    common: Common,
    realtime: bool,
    prefs_path: &Path,
    language: Option<String>,
    categories: Vec<String>,
) -> anyhow::Result<()> {
    let mut quiz = common.quiz()?;
    let available = quiz.categories();

    let mut prefs = Preferences::load(prefs_path)?;
    let mut changed = false;
    if let Some(code) = language {
        anyhow::ensure!(prefs.set_language(&code), "unsupported language '{code}'");
        changed = true;
    }
    if !categories.is_empty() {
        prefs.categories = categories;
        changed = true;
    }
    prefs.reconcile(&available);
    if changed {
        prefs.save(prefs_path)?;
    }

    let mut sync = RemoteSync::new(Box::new(LocalSessionService::new(common.seed)), common.seed);
    let session = sync.start_match(common.difficulty);
    let mut engine = PossessionEngine::seeded(common.config, &session);
    engine.subscribe(Box::new(sync));
    engine.set_event_outbox(false);
    engine.logger.set_verbosity(common.verbosity);
    let mut quiz_rng = seeded(common.seed.wrapping_add(1));

    println!("=== Quizball ===");
    println!(
        "First to {} goals. Language: {}. Categories: {}",
        engine.state().scoring.max_score().unwrap_or(session.max_score),
        prefs.language,
        prefs
            .categories
            .iter()
            .map(|c| format_category_name(c))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut last_message: Option<String> = None;

    loop {
        let message = engine.view().message().map(str::to_string);
        if message != last_message {
            if let Some(text) = &message {
                println!(">> {text}");
            }
            last_message = message;
        }

        if engine.state().is_over() {
            engine.run_until_idle()?;
            break;
        }

        let view = engine.view();
        let mut offered = view.available_actions();
        if offered.is_empty() && !view.is_busy() && engine.is_idle() {
            offered.extend_from_slice(&[ActionKind::Pass, ActionKind::Dribble, ActionKind::Shoot]);
        }
        if offered.is_empty() {
            wait_for_next(&mut engine, realtime).await;
            continue;
        }

        render(&engine.view());
        let choice = prompt_action(&mut input, &offered).await?;
        let kind = match choice {
            Prompt::Quit => break,
            Prompt::Wait => {
                wait_for_next(&mut engine, realtime).await;
                continue;
            }
            Prompt::Action(kind) => kind,
        };

        let question = quiz.next_question(&prefs, &mut quiz_rng);
        println!("\n[{}] {}", format_category_name(&question.category), question.prompt);
        for (i, choice) in question.choices.iter().enumerate() {
            println!("  {}. {}", i + 1, choice);
        }
        let answer = prompt_answer(&mut input).await?;
        let correct = question.is_correct(answer);
        println!(
            "{}",
            if correct {
                "Correct!".to_string()
            } else {
                format!("Wrong, the answer was {}", question.choices[question.correct_index])
            }
        );

        match engine.resolve_action(kind, correct) {
            ActionOutcome::Rejected(reason) => println!("Not now: {reason}"),
            ActionOutcome::Illegal => println!("Nothing happens."),
            ActionOutcome::Resolved { success: true } => println!("{kind} succeeded"),
            ActionOutcome::Resolved { success: false } => println!("{kind} failed"),
            ActionOutcome::ShotPending | ActionOutcome::MatchEnded => {}
        }
    }

    let state = engine.state();
    println!(
        "\nFinal score: Blue {} - Red {}",
        state.score(Side::Home),
        state.score(Side::Away)
    );
    Ok(())
}

/// Run the next queued continuation, sleeping until it is due in realtime mode
async fn wait_for_next(engine: &mut PossessionEngine, realtime: bool) {
    if realtime {
        if let Some(due) = engine.next_due() {
            let wait = due.saturating_sub(engine.now());
            tokio::time::sleep(Duration::from_millis(wait)).await;
        }
    }
    engine.step();
}

enum Prompt {
    Action(ActionKind),
    Wait,
    Quit,
}

async fn read_line(input: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<Option<String>> {
    Ok(input.next_line().await?.map(|line| line.trim().to_string()))
}

async fn prompt_action(
    input: &mut Lines<BufReader<Stdin>>,
    offered: &[ActionKind],
) -> anyhow::Result<Prompt> {
    let names: Vec<&str> = offered.iter().map(|k| k.as_str()).collect();
    loop {
        println!("\nAction [{}] (enter to wait, q to quit):", names.join("/"));
        let Some(line) = read_line(input).await? else {
            return Ok(Prompt::Quit);
        };
        match line.as_str() {
            "" => return Ok(Prompt::Wait),
            "q" | "quit" => return Ok(Prompt::Quit),
            other => match other.parse::<ActionKind>() {
                Ok(kind) if offered.contains(&kind) => return Ok(Prompt::Action(kind)),
                Ok(kind) => println!("{kind} is not available right now"),
                Err(err) => println!("{err}"),
            },
        }
    }
}

async fn prompt_answer(input: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<usize> {
    loop {
        println!("Answer (1-4):");
        let Some(line) = read_line(input).await? else {
            anyhow::bail!("input closed");
        };
        match line.parse::<usize>() {
            Ok(n) if (1..=4).contains(&n) => return Ok(n - 1),
            _ => println!("Please enter a number from 1 to 4"),
        }
    }
}

/// One line per lane: slot, occupant, ball marker
fn render(view: &MatchView) {
    let state = view.state();
    println!(
        "\nBlue {} - Red {}   (actions {})",
        view.score(Side::Home),
        view.score(Side::Away),
        view.action_count()
    );
    for slot in FieldSlot::MIN..=FieldSlot::MAX {
        let slot = FieldSlot::of(slot);
        let Some(who) = state.pitch.occupant(slot) else {
            continue;
        };
        let player = state.pitch.player(who);
        let team = match who.side {
            Side::Home => "Blue",
            Side::Away => "Red ",
        };
        println!(
            "  {:>2} {} {:<4} {:<10}{}",
            slot.get(),
            team,
            who.role.short_name(),
            player.stance.to_string(),
            if player.has_ball { " (ball)" } else { "" }
        );
    }
}
