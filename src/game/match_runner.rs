//! Match runner
//!
//! Drives one match to completion: asks the controller for an action, gates
//! it behind a quiz question, hands the result to the engine and advances
//! the virtual clock whenever the engine is busy or the opponent is thinking.

use crate::game::controller::PlayerController;
use crate::game::dice::{seeded, RandomSource};
use crate::game::engine::PossessionEngine;
use crate::game::scoring::{MatchOutcome, OverReason};
use crate::game::{ActionKind, ActionOutcome, VerbosityLevel};
use crate::loader::config::Preferences;
use crate::remote::QuizFacade;
use crate::{QuizballError, Result};
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use smallvec::SmallVec;

/// Actions offered when nothing is legal, so a wasted action can be spent
const NON_TACKLE: [ActionKind; 3] = [ActionKind::Pass, ActionKind::Dribble, ActionKind::Shoot];

/// Result of running a match to completion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub home_score: u32,
    pub away_score: u32,
    pub outcome: MatchOutcome,
    /// Charged actions
    pub actions: u32,
    /// Requests made by the controller, rejected ones included
    pub requests: u32,
    /// Virtual time the match took
    pub elapsed_ms: u64,
    pub end_reason: MatchEndReason,
}

/// Reason the runner stopped
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum MatchEndReason {
    /// The engine declared the match over
    Finished(OverReason),
    /// The runner's request limit was hit first
    RequestLimit,
    /// The controller stopped choosing while nothing was queued
    ControllerStopped,
}

/// Runs matches on an engine
pub struct MatchRunner<'a, R: RandomSource> {
    pub engine: &'a mut PossessionEngine<R>,
    quiz: QuizFacade,
    prefs: Preferences,
    quiz_rng: ChaCha12Rng,
    max_requests: u32,
}

impl<'a, R: RandomSource> MatchRunner<'a, R> {
    pub fn new(engine: &'a mut PossessionEngine<R>) -> Self {
        let seed = engine.config().seed.unwrap_or(0).wrapping_add(1);
        MatchRunner {
            engine,
            quiz: QuizFacade::offline(),
            prefs: Preferences::default(),
            quiz_rng: seeded(seed),
            max_requests: 10_000,
        }
    }

    pub fn with_quiz(mut self, quiz: QuizFacade) -> Self {
        self.quiz = quiz;
        self
    }

    /// Language and categories used to draw questions
    pub fn with_preferences(mut self, prefs: Preferences) -> Self {
        self.prefs = prefs;
        self
    }

    pub fn with_verbosity(self, verbosity: VerbosityLevel) -> Self {
        self.engine.logger.set_verbosity(verbosity);
        self
    }

    /// Stop after this many controller requests
    pub fn with_max_requests(mut self, max_requests: u32) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Play until the match is over, the controller stops or the request
    /// limit is reached
    pub fn run_match(&mut self, controller: &mut dyn PlayerController) -> Result<MatchResult> {
        let mut requests = 0u32;
        let end_reason = loop {
            if let Some(reason) = self.engine.state().over_reason() {
                // Let the celebration finish before reporting
                self.engine.run_until_idle()?;
                break MatchEndReason::Finished(reason);
            }
            if requests >= self.max_requests {
                break MatchEndReason::RequestLimit;
            }

            let view = self.engine.view();
            let mut offered: SmallVec<[ActionKind; 4]> = view.available_actions();
            if offered.is_empty() && !view.is_busy() && self.engine.is_idle() {
                // Holder has no legal transition; any action is charged as illegal
                offered.extend_from_slice(&NON_TACKLE);
            }
            let choice = if offered.is_empty() {
                None
            } else {
                controller.choose_action(&view, &offered)
            };

            let Some(kind) = choice else {
                if !self.engine.step() {
                    break MatchEndReason::ControllerStopped;
                }
                continue;
            };
            #[cfg(feature = "verbose-logging")]
            self.engine
                .logger
                .controller_choice(controller.name(), &format!("chooses {kind} from {offered:?}"));

            let question = self.quiz.next_question(&self.prefs, &mut self.quiz_rng);
            let answer = controller.answer(&self.engine.view(), &question);
            let correct = question.is_correct(answer);
            requests += 1;

            let outcome = self.engine.resolve_action(kind, correct);
            if let ActionOutcome::Rejected(reason) = outcome {
                log::debug!("request {requests} ({kind}) rejected: {reason}");
                if !self.engine.step() {
                    return Err(QuizballError::SchedulerStalled(requests as usize));
                }
            }
        };

        let state = self.engine.state();
        let result = MatchResult {
            home_score: state.score(crate::core::Side::Home),
            away_score: state.score(crate::core::Side::Away),
            outcome: state.scoring.outcome(),
            actions: state.action_count(),
            requests,
            elapsed_ms: self.engine.now(),
            end_reason,
        };
        controller.on_match_end(&self.engine.view(), result.outcome);
        self.engine.logger.minimal(&format!(
            "Final score: Home {} - Away {} after {} actions ({:?})",
            result.home_score, result.away_score, result.actions, result.end_reason
        ));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::random_controller::RandomController;
    use crate::game::scripted_controller::ScriptedController;
    use crate::loader::config::MatchConfig;
    use crate::remote::SessionInfo;

    fn session() -> SessionInfo {
        SessionInfo {
            session_id: "runner".to_string(),
            max_score: 3,
            max_actions_hint: 50,
        }
    }

    #[test]
    fn test_random_match_finishes() {
        let config = MatchConfig::default().with_seed(5).with_max_actions(40);
        let mut engine = PossessionEngine::seeded(config, &session());
        let mut controller = RandomController::new(5, 0.6);
        let result = MatchRunner::new(&mut engine)
            .with_verbosity(VerbosityLevel::Silent)
            .run_match(&mut controller)
            .unwrap();

        assert!(matches!(result.end_reason, MatchEndReason::Finished(_)));
        assert!(result.actions <= 40);
        assert!(result.home_score <= 3 && result.away_score <= 3);
    }

    #[test]
    fn test_scripted_controller_runs_out() {
        let config = MatchConfig::default().with_seed(1);
        let mut engine = PossessionEngine::seeded(config, &session());
        let mut controller = ScriptedController::new([(ActionKind::Shoot, true)]);
        let result = MatchRunner::new(&mut engine)
            .with_verbosity(VerbosityLevel::Silent)
            .run_match(&mut controller)
            .unwrap();

        // Shooting from midfield is charged as illegal, then the script ends
        assert_eq!(result.end_reason, MatchEndReason::ControllerStopped);
        assert_eq!(result.actions, 1);
        assert_eq!(result.requests, 1);
    }

    #[test]
    fn test_request_limit() {
        let config = MatchConfig::default().with_seed(2);
        let mut engine = PossessionEngine::seeded(config, &session());
        let mut controller = RandomController::new(2, 0.5);
        let result = MatchRunner::new(&mut engine)
            .with_verbosity(VerbosityLevel::Silent)
            .with_max_requests(3)
            .run_match(&mut controller)
            .unwrap();
        assert!(result.requests <= 3);
    }
}
