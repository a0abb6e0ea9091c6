//! Batch mode: run many headless matches in parallel and collect statistics
//!
//! Each match gets its own seed derived from the batch seed, so a batch is
//! reproducible regardless of how rayon schedules the work.

use crate::core::Side;
use crate::game::{
    MatchEndReason, MatchOutcome, MatchRunner, OverReason, PossessionEngine, RandomController,
    VerbosityLevel,
};
use crate::loader::{Difficulty, MatchConfig, QuestionBank, QuestionRecord};
use crate::remote::{LocalSessionService, QuizFacade, RemoteSync};
use crate::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// What to run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub matches: usize,
    pub seed: u64,
    /// Probability the simulated player answers correctly
    pub accuracy: f64,
    pub difficulty: Difficulty,
    pub config: MatchConfig,
    /// Local question bank; the fixed fallback question is used without one
    pub questions: Option<Vec<QuestionRecord>>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            matches: 100,
            seed: 42,
            accuracy: 0.6,
            difficulty: Difficulty::Regular,
            config: MatchConfig::default(),
            questions: None,
        }
    }
}

/// Aggregate over all completed matches
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    pub matches: usize,
    pub home_wins: usize,
    pub away_wins: usize,
    pub draws: usize,
    pub home_goals: u64,
    pub away_goals: u64,
    pub actions: u64,
    /// Matches ended by the score limit
    pub score_endings: usize,
    /// Matches ended by the action cap
    pub action_cap_endings: usize,
    pub failed: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl BatchStats {
    fn merge(mut self, other: BatchStats) -> BatchStats {
        self.matches += other.matches;
        self.home_wins += other.home_wins;
        self.away_wins += other.away_wins;
        self.draws += other.draws;
        self.home_goals += other.home_goals;
        self.away_goals += other.away_goals;
        self.actions += other.actions;
        self.score_endings += other.score_endings;
        self.action_cap_endings += other.action_cap_endings;
        self.failed += other.failed;
        self
    }

    fn rate(&self, count: usize) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.matches as f64
        }
    }

    pub fn home_win_rate(&self) -> f64 {
        self.rate(self.home_wins)
    }

    pub fn average_actions(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.actions as f64 / self.matches as f64
        }
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Batch Complete ===")?;
        writeln!(f, "Matches played: {}", self.matches)?;
        if self.failed > 0 {
            writeln!(f, "Matches failed: {}", self.failed)?;
        }
        let secs = self.elapsed.as_secs_f64();
        writeln!(f, "Elapsed time: {secs:.2}s")?;
        if secs > 0.0 {
            writeln!(f, "Matches per second: {:.2}", self.matches as f64 / secs)?;
        }
        writeln!(f)?;
        writeln!(f, "Home wins: {} ({:.1}%)", self.home_wins, self.rate(self.home_wins))?;
        writeln!(f, "Away wins: {} ({:.1}%)", self.away_wins, self.rate(self.away_wins))?;
        writeln!(f, "Draws: {} ({:.1}%)", self.draws, self.rate(self.draws))?;
        writeln!(f, "Goals: home {} / away {}", self.home_goals, self.away_goals)?;
        writeln!(f, "Average actions: {:.1}", self.average_actions())?;
        write!(
            f,
            "Ended by score limit: {} / by action cap: {}",
            self.score_endings, self.action_cap_endings
        )
    }
}

/// Seed for match `index`, spread so neighbouring matches diverge
fn match_seed(batch_seed: u64, index: usize) -> u64 {
    batch_seed.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Play one headless match with a random controller
fn run_single(options: &BatchOptions, index: usize) -> Result<BatchStats> {
    let seed = match_seed(options.seed, index);

    let mut sync = RemoteSync::new(Box::new(LocalSessionService::new(seed)), seed);
    let session = sync.start_match(options.difficulty);

    let config = options.config.clone().with_seed(seed);
    let mut engine = PossessionEngine::seeded(config, &session);
    engine.set_event_outbox(false);
    engine.subscribe(Box::new(sync));

    let quiz = match &options.questions {
        Some(records) => QuizFacade::new(Box::new(QuestionBank::from_records(records.clone(), seed)?)),
        None => QuizFacade::offline(),
    };
    let mut controller = RandomController::new(seed.wrapping_add(0x1234_5678), options.accuracy);
    let result = MatchRunner::new(&mut engine)
        .with_quiz(quiz)
        .with_verbosity(VerbosityLevel::Silent)
        .run_match(&mut controller)?;

    let mut stats = BatchStats {
        matches: 1,
        home_goals: result.home_score as u64,
        away_goals: result.away_score as u64,
        actions: result.actions as u64,
        ..BatchStats::default()
    };
    match result.outcome {
        MatchOutcome::Winner(Side::Home) => stats.home_wins = 1,
        MatchOutcome::Winner(Side::Away) => stats.away_wins = 1,
        MatchOutcome::Draw => stats.draws = 1,
    }
    match result.end_reason {
        MatchEndReason::Finished(OverReason::MaxScore { .. }) => stats.score_endings = 1,
        MatchEndReason::Finished(OverReason::MaxActions { .. }) => stats.action_cap_endings = 1,
        MatchEndReason::RequestLimit | MatchEndReason::ControllerStopped => {}
    }
    Ok(stats)
}

/// Run the batch in parallel; failed matches are counted, not fatal
pub fn run_batch(options: &BatchOptions) -> BatchStats {
    let start = Instant::now();
    let mut stats = (0..options.matches)
        .into_par_iter()
        .map(|index| match run_single(options, index) {
            Ok(stats) => stats,
            Err(err) => {
                log::warn!("match {index} failed: {err}");
                BatchStats {
                    failed: 1,
                    ..BatchStats::default()
                }
            }
        })
        .reduce(BatchStats::default, BatchStats::merge);
    stats.elapsed = start.elapsed();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_counts_add_up() {
        let options = BatchOptions {
            matches: 12,
            seed: 3,
            config: MatchConfig::default().with_max_actions(30),
            ..BatchOptions::default()
        };
        let stats = run_batch(&options);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.matches, 12);
        assert_eq!(stats.home_wins + stats.away_wins + stats.draws, 12);
        assert_eq!(stats.score_endings + stats.action_cap_endings, 12);
        assert!(stats.actions <= 12 * 30);
    }

    #[test]
    fn test_batch_is_reproducible() {
        let options = BatchOptions {
            matches: 8,
            seed: 77,
            ..BatchOptions::default()
        };
        let mut a = run_batch(&options);
        let mut b = run_batch(&options);
        a.elapsed = Duration::ZERO;
        b.elapsed = Duration::ZERO;
        assert_eq!(a, b);
    }
}
