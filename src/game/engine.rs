//! Possession engine
//!
//! Owns the match state and is the only code that mutates it. Human actions
//! enter through [`PossessionEngine::resolve_action`]; staged transitions and
//! opponent turns are queued on the scheduler and run when the caller drives
//! the clock with [`advance`](PossessionEngine::advance),
//! [`step`](PossessionEngine::step) or
//! [`run_until_idle`](PossessionEngine::run_until_idle).
//!
//! Every entry point ends in a settle: consistency checks on the ball flags,
//! then buffered events go out to subscribers and the outbox.

/// Log at Verbose level only when the feature is enabled
///
/// Without the verbose-logging feature no message is formatted at all.
macro_rules! log_if_verbose {
    ($self:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $self.logger.verbose(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$self;
        }
    };
}

use crate::core::{FieldSlot, PlayerRef, Role, Side, Stance};
use crate::game::controller::MatchView;
use crate::game::dice::{seeded, RandomSource};
use crate::game::events::{EventSink, MatchEvent};
use crate::game::opponent::{self, OpponentMove};
use crate::game::probability::shot_on_target;
use crate::game::rules;
use crate::game::scheduler::{Continuation, Scheduled, Scheduler};
use crate::game::scoring::{OverReason, ScoringController};
use crate::game::state::{MatchState, Transition};
use crate::game::{ActionKind, ActionOutcome, GameLogger, RejectReason};
use crate::loader::config::MatchConfig;
use crate::remote::SessionInfo;
use crate::{QuizballError, Result};
use rand_chacha::ChaCha12Rng;

/// Upper bound on continuations run by one `run_until_idle` call
pub const MAX_IDLE_STEPS: usize = 10_000;

/// The possession/action state machine for one match at a time
pub struct PossessionEngine<R: RandomSource = ChaCha12Rng> {
    state: MatchState,
    config: MatchConfig,
    scheduler: Scheduler,
    rng: R,

    /// Per-match log of settled transitions
    pub logger: GameLogger,

    /// Events raised since the last settle
    pending: Vec<MatchEvent>,
    outbox: Vec<MatchEvent>,
    keep_outbox: bool,
    sinks: Vec<Box<dyn EventSink>>,
}

impl PossessionEngine<ChaCha12Rng> {
    /// Engine driven by a ChaCha RNG seeded from the config (0 when unset)
    pub fn seeded(config: MatchConfig, session: &SessionInfo) -> Self {
        let rng = seeded(config.seed.unwrap_or(0));
        Self::new(config, rng, session)
    }
}

impl<R: RandomSource> PossessionEngine<R> {
    /// Create an engine and kick off the first match
    pub fn new(config: MatchConfig, rng: R, session: &SessionInfo) -> Self {
        let placeholder = MatchState::kickoff(
            Role::Midfielder1,
            ScoringController::new(None, config.max_actions),
            String::new(),
            0,
        );
        let mut engine = PossessionEngine {
            state: placeholder,
            config,
            scheduler: Scheduler::new(),
            rng,
            logger: GameLogger::new(),
            pending: Vec::new(),
            outbox: Vec::new(),
            keep_outbox: true,
            sinks: Vec::new(),
        };
        engine.new_match(session);
        engine
    }

    /// Discard the current match and kick off a new one
    ///
    /// Everything still queued from the old match becomes inert.
    pub fn new_match(&mut self, session: &SessionInfo) {
        self.scheduler.bump_epoch();
        self.pending.clear();

        let max_score = self.config.max_score.or(Some(session.max_score));
        let max_actions = if self.config.enforce_duration_hint {
            session.max_actions_hint.max(1)
        } else {
            self.config.max_actions
        };
        let starter = Role::MIDFIELDERS[self.rng.pick_index(Role::MIDFIELDERS.len())];
        self.state = MatchState::kickoff(
            starter,
            ScoringController::new(max_score, max_actions),
            session.session_id.clone(),
            session.max_actions_hint,
        );

        let holder = self.state.ball_holder;
        log_if_verbose!(
            self,
            "Kick-off: {} starts with the ball (session {}, max score {:?}, max actions {})",
            holder,
            session.session_id,
            max_score,
            max_actions
        );
        self.emit(MatchEvent::KickOff { holder, max_score });
        self.settle();
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Read-only view for controllers and renderers
    pub fn view(&self) -> MatchView<'_> {
        MatchView::new(&self.state)
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// Due time of the next queued continuation
    pub fn next_due(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    /// No state-changing continuation is queued for this match
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Adjust a base probability at runtime
    pub fn set_probability(&mut self, kind: ActionKind, probability: f64) -> Result<()> {
        self.config.probabilities.set(kind, probability)
    }

    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Keep settled events for `drain_events` (on by default)
    pub fn set_event_outbox(&mut self, enabled: bool) {
        self.keep_outbox = enabled;
        if !enabled {
            self.outbox.clear();
        }
    }

    /// Take every event settled since the last drain
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Put the ball on a player directly, outside the rules
    ///
    /// Intended for setting up scenarios. Positions and counters are left
    /// alone; any in-flight transition is dropped.
    pub fn force_ball(&mut self, to: PlayerRef, stance: Stance) {
        let from = self.state.ball_holder;
        self.state.pitch.give_ball(to, stance);
        self.state.pitch.settle_stances(to);
        self.state.set_holder(to);
        self.state.past_defender = false;
        self.state.transition = None;
        self.emit(MatchEvent::BallMoved { from, to });
        if to.side == Side::Away {
            self.schedule_opponent_turn(self.config.timings.opponent_thinking_ms);
        } else {
            self.end_opponent_window();
        }
        self.settle();
    }

    // ---------------------------------------------------------------------
    // Human actions
    // ---------------------------------------------------------------------

    /// Perform a human action whose quiz question was answered `question_correct`
    pub fn resolve_action(&mut self, kind: ActionKind, question_correct: bool) -> ActionOutcome {
        let outcome = self.dispatch_action(kind, question_correct);
        let action_count = self.state.action_count();
        match outcome {
            ActionOutcome::Rejected(reason) => log::debug!("{kind} rejected: {reason}"),
            _ => {
                self.logger.normal(&format!(
                    "Action {}: {} ({} answer) -> {:?}",
                    action_count,
                    kind,
                    if question_correct { "correct" } else { "wrong" },
                    outcome
                ));
            }
        }
        self.emit(MatchEvent::ActionResolved {
            kind,
            question_correct,
            outcome,
            action_count,
        });
        self.settle();
        outcome
    }

    fn dispatch_action(&mut self, kind: ActionKind, question_correct: bool) -> ActionOutcome {
        if self.state.is_over() {
            return ActionOutcome::Rejected(RejectReason::MatchOver);
        }
        if self.state.is_busy() {
            return ActionOutcome::Rejected(RejectReason::Busy);
        }
        if self.state.possession == Side::Away && kind != ActionKind::Tackle {
            return ActionOutcome::Rejected(RejectReason::OpponentTurn);
        }

        if let Some(reason) = self.state.scoring.record_action() {
            self.finish_match(reason);
            return ActionOutcome::MatchEnded;
        }

        match kind {
            ActionKind::Pass => self.human_pass(question_correct),
            ActionKind::Dribble => self.human_dribble(question_correct),
            ActionKind::Shoot => self.human_shoot(question_correct),
            ActionKind::Tackle => self.human_tackle(question_correct),
        }
    }

    fn adjusted(&self, kind: ActionKind, question_correct: bool) -> f64 {
        self.config
            .modifier
            .adjust(self.config.probabilities.get(kind), question_correct)
    }

    fn human_pass(&mut self, question_correct: bool) -> ActionOutcome {
        let holder = self.state.ball_holder;
        let receivers = rules::reachable_receivers(&self.state.pitch, holder);
        if receivers.is_empty() {
            log_if_verbose!(
                self,
                "No pass available from slot {}",
                self.state.pitch.slot_of(holder)
            );
            return ActionOutcome::Illegal;
        }

        let probability = self.adjusted(ActionKind::Pass, question_correct);
        if !self.rng.chance(probability) {
            self.logger.normal("Pass intercepted");
            self.transfer_possession(Side::Away, None);
            return ActionOutcome::Resolved { success: false };
        }

        let receiver = if receivers.len() > 1 {
            receivers[self.rng.pick_index(receivers.len())]
        } else {
            receivers[0]
        };
        self.complete_pass(holder, receiver);
        ActionOutcome::Resolved { success: true }
    }

    fn human_dribble(&mut self, question_correct: bool) -> ActionOutcome {
        let holder = self.state.ball_holder;
        let Some((target, beaten)) = rules::dribble_move(&self.state.pitch, holder) else {
            log_if_verbose!(
                self,
                "No dribble available from slot {}",
                self.state.pitch.slot_of(holder)
            );
            return ActionOutcome::Illegal;
        };

        let probability = self.adjusted(ActionKind::Dribble, question_correct);
        if !self.rng.chance(probability) {
            self.logger.normal(&format!("Dribble stopped by {beaten}"));
            self.transfer_possession(Side::Away, None);
            return ActionOutcome::Resolved { success: false };
        }

        self.start_dribble(holder, target);
        ActionOutcome::Resolved { success: true }
    }

    fn human_shoot(&mut self, question_correct: bool) -> ActionOutcome {
        if !self.state.can_shoot {
            log_if_verbose!(
                self,
                "No shot available from slot {}",
                self.state.pitch.slot_of(self.state.ball_holder)
            );
            return ActionOutcome::Illegal;
        }
        if !question_correct {
            self.logger.normal("Shot fluffed, ball lost");
            self.transfer_possession(Side::Away, None);
            return ActionOutcome::Resolved { success: false };
        }
        self.start_shot(self.state.ball_holder);
        ActionOutcome::ShotPending
    }

    fn human_tackle(&mut self, question_correct: bool) -> ActionOutcome {
        if self.state.possession != Side::Away {
            log_if_verbose!(self, "Nothing to tackle, home side has the ball");
            return ActionOutcome::Illegal;
        }

        // Whatever the outcome, the pending decision window is superseded
        self.end_opponent_window();

        let probability = self.adjusted(ActionKind::Tackle, question_correct);
        if self.rng.chance(probability) {
            self.logger.normal("Tackle won");
            self.transfer_possession(Side::Home, Some(Stance::Passing));
            return ActionOutcome::Resolved { success: true };
        }

        let holder = self.state.ball_holder;
        self.logger.normal(&format!("Tackle missed, {holder} responds"));
        match opponent::tackle_response(&self.state.pitch, holder, &mut self.rng) {
            Some(mv) => self.apply_opponent_move(holder, mv),
            None => self.schedule_opponent_turn(self.config.timings.opponent_thinking_ms),
        }
        ActionOutcome::Resolved { success: false }
    }

    // ---------------------------------------------------------------------
    // Shared transitions
    // ---------------------------------------------------------------------

    /// Move the ball within a side; the passer drops back to defending
    fn complete_pass(&mut self, from: PlayerRef, to: PlayerRef) {
        let pitch = &mut self.state.pitch;
        pitch.give_ball(to, Stance::Passing);
        pitch.settle_stances(to);
        if from != to {
            pitch.player_mut(from).stance = Stance::Defending;
        }
        self.state.set_holder(to);
        log_if_verbose!(self, "{} passes to {}", from, to);
        self.emit(MatchEvent::BallMoved { from, to });
    }

    /// Turnover: a random midfielder of `to_side` gets the ball where they stand
    ///
    /// Slots exchanged by earlier dribbles stay exchanged.
    fn transfer_possession(&mut self, to_side: Side, fixed_stance: Option<Stance>) {
        let from = self.state.ball_holder;
        self.state.pitch.clear_ball();

        let role = Role::MIDFIELDERS[self.rng.pick_index(Role::MIDFIELDERS.len())];
        let stance = match fixed_stance {
            Some(stance) => stance,
            None if self.rng.chance(0.5) => Stance::Passing,
            None => Stance::Dribbling,
        };
        let receiver = PlayerRef::new(to_side, role);

        let pitch = &mut self.state.pitch;
        pitch.give_ball(receiver, stance);
        pitch.settle_stances(receiver);
        if from != receiver {
            pitch.player_mut(from).stance = Stance::Defending;
        }
        let changed = self.state.possession != to_side;
        self.state.set_holder(receiver);
        self.state.past_defender = false;
        self.state.transition = None;

        self.logger
            .normal(&format!("Possession: {} ({})", receiver, stance));
        if changed {
            self.emit(MatchEvent::PossessionChanged { side: to_side });
        }
        self.emit(MatchEvent::BallMoved { from, to: receiver });

        if to_side == Side::Away {
            self.schedule_opponent_turn(self.config.timings.opponent_thinking_ms);
        } else {
            self.end_opponent_window();
        }
    }

    fn start_dribble(&mut self, dribbler: PlayerRef, target: FieldSlot) {
        self.state.pitch.give_ball(dribbler, Stance::Dribbling);
        self.state.past_defender = true;
        self.state.transition = Some(Transition::Dribbling);
        log_if_verbose!(self, "{} dribbles toward slot {}", dribbler, target);
        self.scheduler.schedule(
            self.config.timings.dribble_swap_ms,
            Continuation::DribbleSwap { dribbler, target },
        );
    }

    fn start_shot(&mut self, shooter: PlayerRef) {
        let slot = self.state.pitch.slot_of(shooter);
        self.state.transition = Some(Transition::Shooting);
        let text = match shooter.side {
            Side::Home => "Shooting...",
            Side::Away => "Opponent shooting...",
        };
        self.set_message(text, false);
        self.logger.normal(&format!("{shooter} shoots from slot {slot}"));
        self.emit(MatchEvent::ShotTaken { shooter, slot });
        self.scheduler.schedule(
            self.config.timings.shot_suspense_ms,
            Continuation::ResolveShot { shooter },
        );
    }

    /// Ball to a keeper at kickoff positions, distribution queued
    fn restart_from_keeper(&mut self, keeper: PlayerRef) {
        let from = self.state.ball_holder;
        self.state.pitch.reset_positions();
        self.emit(MatchEvent::PositionsReset);

        let pitch = &mut self.state.pitch;
        pitch.give_ball(keeper, Stance::Passing);
        pitch.settle_stances(keeper);
        let changed = self.state.possession != keeper.side;
        self.state.set_holder(keeper);
        self.state.past_defender = false;
        self.state.transition = Some(Transition::KeeperRestart);

        if changed {
            self.emit(MatchEvent::PossessionChanged { side: keeper.side });
        }
        self.emit(MatchEvent::BallMoved { from, to: keeper });

        let delay = self.config.timings.keeper_distribution_ms;
        match keeper.side {
            Side::Home => {
                self.end_opponent_window();
                self.scheduler
                    .schedule(delay, Continuation::KeeperDistribution { side: Side::Home });
            }
            Side::Away => self.schedule_opponent_turn(delay),
        }
    }

    fn schedule_opponent_turn(&mut self, delay_ms: u64) {
        self.state.turn_token += 1;
        self.state.opponent_turn_pending = true;
        self.scheduler.schedule(
            delay_ms,
            Continuation::OpponentTurn {
                token: self.state.turn_token,
            },
        );
        self.emit(MatchEvent::OpponentThinking);
    }

    /// Invalidate any queued opponent decision
    fn end_opponent_window(&mut self) {
        self.state.turn_token += 1;
        self.state.opponent_turn_pending = false;
    }

    fn set_message(&mut self, text: &str, transient: bool) {
        self.state.message_id += 1;
        self.state.message = Some(text.to_string());
        self.emit(MatchEvent::Message {
            text: Some(text.to_string()),
        });
        if transient {
            self.scheduler.schedule(
                self.config.timings.message_clear_ms,
                Continuation::ClearMessage {
                    message_id: self.state.message_id,
                },
            );
        }
    }

    fn clear_message(&mut self) {
        if self.state.message.is_none() {
            return;
        }
        self.state.message_id += 1;
        self.state.message = None;
        self.emit(MatchEvent::Message { text: None });
    }

    fn finish_match(&mut self, reason: OverReason) {
        self.state.opponent_turn_pending = false;
        self.set_message(&format!("Game Over! {reason}"), false);
        self.logger.minimal(&format!(
            "Game over: {} (home {} - away {})",
            reason,
            self.state.score(Side::Home),
            self.state.score(Side::Away)
        ));
        self.emit(MatchEvent::MatchOver { reason });
    }

    // ---------------------------------------------------------------------
    // Opponent
    // ---------------------------------------------------------------------

    fn run_opponent_turn(&mut self, token: u64) {
        if token != self.state.turn_token {
            log_if_verbose!(self, "Opponent turn {} superseded", token);
            return;
        }
        self.state.opponent_turn_pending = false;
        if self.state.possession != Side::Away {
            return;
        }
        match self.state.transition {
            Some(Transition::KeeperRestart) => self.state.transition = None,
            Some(_) => {
                // Never drop the loop: try again once the transition is done
                log_if_verbose!(self, "Opponent waits for the current transition");
                self.schedule_opponent_turn(self.config.timings.opponent_thinking_ms);
                return;
            }
            None => {}
        }

        let holder = self.state.ball_holder;
        let mv = opponent::decide(
            &self.state.pitch,
            holder,
            self.config.opponent_distance_dribble,
            &mut self.rng,
        );
        self.apply_opponent_move(holder, mv);
    }

    fn apply_opponent_move(&mut self, holder: PlayerRef, mv: OpponentMove) {
        #[cfg(feature = "verbose-logging")]
        self.logger.categorized(
            crate::game::VerbosityLevel::Verbose,
            "opponent",
            &format!("{holder} at slot {}: {mv:?}", self.state.pitch.slot_of(holder)),
        );
        self.emit(MatchEvent::OpponentMoved { holder, mv });
        let thinking = self.config.timings.opponent_thinking_ms;
        match mv {
            OpponentMove::KeeperPass { to } | OpponentMove::Pass { to } => {
                let receiver = PlayerRef::new(holder.side, to);
                self.complete_pass(holder, receiver);
                if holder.role == Role::Goalkeeper {
                    self.state.pitch.player_mut(holder).rest();
                }
                self.schedule_opponent_turn(thinking);
            }
            OpponentMove::Dribble { target } => {
                match self.state.pitch.occupant(target) {
                    Some(occupant) if occupant.side != holder.side => {
                        self.start_dribble(holder, target)
                    }
                    _ => self.schedule_opponent_turn(thinking),
                }
            }
            OpponentMove::Shoot => self.start_shot(holder),
        }
    }

    // ---------------------------------------------------------------------
    // Continuations
    // ---------------------------------------------------------------------

    /// Advance the clock by `ms`, running everything that falls due
    ///
    /// Returns the number of continuations taken off the queue.
    pub fn advance(&mut self, ms: u64) -> usize {
        let deadline = self.scheduler.now().saturating_add(ms);
        let mut ran = 0;
        while let Some(entry) = self.scheduler.pop_due(deadline) {
            self.run_continuation(entry);
            ran += 1;
        }
        self.scheduler.advance_clock_to(deadline);
        ran
    }

    /// Jump to and run the next queued continuation
    pub fn step(&mut self) -> bool {
        match self.scheduler.pop_next() {
            Some(entry) => {
                self.run_continuation(entry);
                true
            }
            None => false,
        }
    }

    /// Run continuations until nothing state-changing is queued
    ///
    /// For a home-side match this returns once the human can act again or
    /// the match is over.
    pub fn run_until_idle(&mut self) -> Result<usize> {
        let mut ran = 0;
        while !self.scheduler.is_idle() {
            if ran >= MAX_IDLE_STEPS {
                return Err(QuizballError::SchedulerStalled(ran));
            }
            if !self.step() {
                break;
            }
            ran += 1;
        }
        Ok(ran)
    }

    fn run_continuation(&mut self, entry: Scheduled) {
        if entry.epoch != self.scheduler.epoch() {
            log_if_verbose!(self, "Dropping continuation from a finished match");
            return;
        }
        if self.state.is_over()
            && !matches!(
                entry.task,
                Continuation::CelebrationEnd { .. } | Continuation::ClearMessage { .. }
            )
        {
            return;
        }

        match entry.task {
            Continuation::DribbleSwap { dribbler, target } => self.dribble_swap(dribbler, target),
            Continuation::DribbleSettle { dribbler } => self.dribble_settle(dribbler),
            Continuation::ResolveShot { shooter } => self.resolve_shot(shooter),
            Continuation::SaveRestart { saving } => {
                self.clear_message();
                self.state.pitch.reset_positions();
                self.emit(MatchEvent::PositionsReset);
                self.transfer_possession(saving, None);
            }
            Continuation::CelebrationEnd { scoring } => self.celebration_end(scoring),
            Continuation::KeeperDistribution { side } => self.keeper_distribution(side),
            Continuation::OpponentTurn { token } => self.run_opponent_turn(token),
            Continuation::ClearMessage { message_id } => {
                if message_id == self.state.message_id && !self.state.is_over() {
                    self.clear_message();
                }
            }
        }
        self.settle();
    }

    fn dribble_swap(&mut self, dribbler: PlayerRef, target: FieldSlot) {
        if self.state.ball_holder != dribbler {
            return;
        }
        let from_slot = self.state.pitch.slot_of(dribbler);
        if let Some(beaten) = self.state.pitch.occupant(target) {
            self.state.pitch.swap_slots(dribbler, beaten);
            self.state.refresh_can_shoot();
            log_if_verbose!(
                self,
                "{} beats {}: slot {} <-> {}",
                dribbler,
                beaten,
                from_slot,
                target
            );
            self.emit(MatchEvent::SlotsSwapped {
                dribbler,
                dribbler_slot: target,
                beaten,
                beaten_slot: from_slot,
            });
        }
        self.scheduler.schedule(
            self.config.timings.dribble_settle_ms,
            Continuation::DribbleSettle { dribbler },
        );
    }

    fn dribble_settle(&mut self, dribbler: PlayerRef) {
        if self.state.ball_holder != dribbler {
            return;
        }
        self.state.pitch.settle_stances(dribbler);
        self.state.pitch.player_mut(dribbler).stance = Stance::Dribbling;
        self.state.transition = None;
        self.state.refresh_can_shoot();
        self.logger.normal(&format!(
            "{} dribbled to slot {}",
            dribbler,
            self.state.pitch.slot_of(dribbler)
        ));
        if self.state.possession == Side::Away {
            self.schedule_opponent_turn(self.config.timings.opponent_thinking_ms);
        }
    }

    fn resolve_shot(&mut self, shooter: PlayerRef) {
        if self.state.ball_holder != shooter {
            return;
        }
        let side = shooter.side;
        let slot = self.state.pitch.slot_of(shooter);
        let keeper = PlayerRef::new(side.opponent(), Role::Goalkeeper);
        let on_target = shot_on_target(
            side,
            slot,
            self.config.probabilities.shoot,
            self.config.distance_on_target,
        );

        if !self.rng.chance(on_target) {
            let text = match side {
                Side::Home => "Shot off target!",
                Side::Away => "Opponent shot off target!",
            };
            self.set_message(text, true);
            self.logger.normal(text);
            self.emit(MatchEvent::ShotOffTarget { shooter });
            self.restart_from_keeper(keeper);
            return;
        }

        if self.rng.chance(self.config.keeper_save) {
            self.state.pitch.player_mut(keeper).stance = Stance::Blocking;
            let text = match side {
                Side::Home => "Goalkeeper blocked!",
                Side::Away => "Goalkeeper saves!",
            };
            self.set_message(text, false);
            self.logger.normal(text);
            self.state.transition = Some(Transition::SaveRestart);
            self.emit(MatchEvent::ShotSaved { keeper });
            self.scheduler.schedule(
                self.config.timings.save_restart_ms,
                Continuation::SaveRestart {
                    saving: keeper.side,
                },
            );
            return;
        }

        let newly_over = self.state.scoring.record_goal(side);
        let text = match side {
            Side::Home => "Goal!",
            Side::Away => "GOAL! Red team scores!",
        };
        self.set_message(text, false);
        self.state
            .pitch
            .roster_mut(side)
            .set_all_stances(Stance::Celebration);
        self.state.transition = Some(Transition::Celebrating);

        let (home_score, away_score) = (self.state.score(Side::Home), self.state.score(Side::Away));
        self.logger.minimal(&format!(
            "GOAL for {side}! Home {home_score} - Away {away_score}"
        ));
        self.emit(MatchEvent::Goal {
            side,
            home_score,
            away_score,
        });
        self.scheduler.schedule(
            self.config.timings.celebration_ms,
            Continuation::CelebrationEnd { scoring: side },
        );
        if let Some(reason) = newly_over {
            self.finish_match(reason);
        }
    }

    fn celebration_end(&mut self, scoring: Side) {
        if self.state.transition != Some(Transition::Celebrating) {
            return;
        }
        let holder = self.state.ball_holder;
        self.state.pitch.settle_stances(holder);
        self.state.pitch.player_mut(holder).rest();
        self.state.transition = None;
        self.emit(MatchEvent::CelebrationEnded { side: scoring });

        if self.state.is_over() {
            return;
        }
        self.clear_message();
        self.restart_from_keeper(PlayerRef::new(scoring.opponent(), Role::Goalkeeper));
    }

    fn keeper_distribution(&mut self, side: Side) {
        let keeper = PlayerRef::new(side, Role::Goalkeeper);
        if self.state.ball_holder != keeper {
            return;
        }
        let role = Role::MIDFIELDERS[self.rng.pick_index(Role::MIDFIELDERS.len())];
        self.complete_pass(keeper, PlayerRef::new(side, role));
        self.state.pitch.player_mut(keeper).rest();
        self.state.transition = None;
        if side == Side::Away {
            self.schedule_opponent_turn(self.config.timings.opponent_thinking_ms);
        }
    }

    // ---------------------------------------------------------------------
    // Settling
    // ---------------------------------------------------------------------

    fn emit(&mut self, event: MatchEvent) {
        self.pending.push(event);
    }

    /// Check consistency, then publish buffered events
    fn settle(&mut self) {
        let problem = self.state.consistency_error();
        debug_assert!(problem.is_none(), "match state inconsistent: {problem:?}");
        if let Some(problem) = problem {
            self.repair(&problem);
        }

        let events = std::mem::take(&mut self.pending);
        for event in &events {
            for sink in self.sinks.iter_mut() {
                sink.on_event(event);
            }
        }
        if self.keep_outbox {
            self.outbox.extend(events);
        }
    }

    /// Deterministic repair: the recorded holder keeps the only ball
    fn repair(&mut self, problem: &str) {
        log::error!("repairing match state: {problem}");
        self.logger
            .minimal(&format!("Inconsistent match state repaired: {problem}"));
        if !self.state.pitch.slots_are_distinct() {
            self.state.pitch.reset_positions();
        }
        let holder = self.state.ball_holder;
        let stance = self.state.pitch.player(holder).stance;
        self.state.pitch.give_ball(holder, stance);
        self.state.set_holder(holder);
        self.pending.push(MatchEvent::InvariantRepaired { holder });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::dice::ScriptedDice;
    use crate::game::logger::VerbosityLevel;

    fn session() -> SessionInfo {
        SessionInfo {
            session_id: "unit".to_string(),
            max_score: 5,
            max_actions_hint: 70,
        }
    }

    fn engine(draws: &[f64]) -> PossessionEngine<ScriptedDice> {
        let mut engine =
            PossessionEngine::new(MatchConfig::default(), ScriptedDice::new(draws.to_vec()), &session());
        engine.logger.set_verbosity(VerbosityLevel::Silent);
        engine
    }

    #[test]
    fn test_kickoff_gives_ball_to_home_midfielder() {
        let mut engine = engine(&[0.9]);
        let state = engine.state();
        assert_eq!(state.ball_holder, PlayerRef::new(Side::Home, Role::Midfielder2));
        assert_eq!(state.holder_stance(), Stance::Passing);
        assert_eq!(state.scoring.max_score(), Some(5));
        let events = engine.drain_events();
        assert!(matches!(events[0], MatchEvent::KickOff { .. }));
    }

    #[test]
    fn test_busy_rejects_without_charging() {
        // kickoff mid1, dribble success
        let mut engine = engine(&[0.0, 0.0]);
        let outcome = engine.resolve_action(ActionKind::Dribble, true);
        assert_eq!(outcome, ActionOutcome::Resolved { success: true });
        assert_eq!(engine.state().transition, Some(Transition::Dribbling));

        let outcome = engine.resolve_action(ActionKind::Pass, true);
        assert_eq!(outcome, ActionOutcome::Rejected(RejectReason::Busy));
        assert_eq!(engine.state().action_count(), 1);

        engine.advance(16 + 50);
        assert_eq!(engine.state().transition, None);
    }

    #[test]
    fn test_new_match_makes_queue_inert() {
        let mut engine = engine(&[0.0, 0.0, 0.0]);
        engine.resolve_action(ActionKind::Dribble, true);
        engine.new_match(&session());
        let before = engine.state().clone();
        assert_eq!(engine.advance(10_000), 1);
        assert_eq!(engine.state(), &before);
        assert!(engine.is_idle());
    }

    #[test]
    fn test_superseded_opponent_turn_is_inert() {
        let mut engine = engine(&[0.0]);
        let away_mid = PlayerRef::new(Side::Away, Role::Midfielder1);
        engine.force_ball(away_mid, Stance::Passing);
        assert!(engine.state().opponent_turn_pending);

        // back to home before the thinking window closes
        engine.force_ball(PlayerRef::new(Side::Home, Role::Midfielder1), Stance::Passing);
        assert!(!engine.state().opponent_turn_pending);
        engine.advance(1000);
        assert_eq!(engine.state().possession, Side::Home);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "match state inconsistent")]
    fn test_inconsistency_fails_loudly_in_debug() {
        let mut engine = engine(&[0.0]);
        engine
            .state
            .pitch
            .player_mut(PlayerRef::new(Side::Away, Role::Attacker))
            .has_ball = true;
        engine.settle();
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_inconsistency_repaired_in_release() {
        let mut engine = engine(&[0.0]);
        let holder = engine.state().ball_holder;
        engine
            .state
            .pitch
            .player_mut(PlayerRef::new(Side::Away, Role::Attacker))
            .has_ball = true;
        engine.settle();
        assert_eq!(engine.state().pitch.ball_holders().as_slice(), &[holder]);
        assert!(engine
            .drain_events()
            .iter()
            .any(|e| matches!(e, MatchEvent::InvariantRepaired { .. })));
    }
}
